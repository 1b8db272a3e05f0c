// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use super::option::{
    ChartOption, LegendLayout, PieLabel, PieRadius, SeriesData, SeriesOption, SeriesType,
    SeriesVisual,
};
use super::shaping::build_pie;
use super::style::PieStyle;
use super::{colors, legend, title, BuildContext, CompiledChart};
use crate::chart_registry::Role;
use crate::error::CompileResult;
fn radius(rose: bool) -> PieRadius {
    if rose {
        PieRadius::Ring(["20%".to_string(), "70%".to_string()])
    } else {
        PieRadius::Outer("50%".to_string())
    }
}
/// One pie series over the category totals; the long tail folds into "Other"
/// past the configured top-N. No grid and no axes.
pub(crate) fn build_pie_chart(
    ctx: &BuildContext<'_>,
    style: &PieStyle,
) -> CompileResult<CompiledChart> {
    let category = ctx.required(Role::Category)?;
    let value = ctx.required(Role::Value)?;
    let built = build_pie(ctx.rows, &category.key, &value.key, ctx.config.pie_top_n);
    let common = &style.common;
    let series = SeriesOption {
        name: category.name.clone(),
        series_type: SeriesType::Pie,
        data: SeriesData::Slices(built.slices),
        visual: SeriesVisual {
            show_label: common.show_label,
            rose_type: style.rose_type.then(|| "radius".to_string()),
            radius: Some(radius(style.rose_type)),
            label_content: Some(if style.show_percent {
                PieLabel::Percent
            } else {
                PieLabel::ValueAndPercent
            }),
            ..SeriesVisual::default()
        },
    };
    Ok(CompiledChart {
        option: ChartOption {
            colors: colors(common),
            title: title(common),
            legend: legend(common, LegendLayout::Vertical),
            grid: None,
            x_axis: None,
            y_axis: None,
            series: vec![series],
            radar: None,
        },
        ignored_count: built.ignored,
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_registry::{ChartKind, ChartRegistry, Mapping};
    use crate::compiler::{ChartStyle, OptionCompiler, PieSlice};
    use crate::config::CompileConfig;
    use crate::dataset::{Field, FieldType};
    use crate::value::{row_from_json, Row};
    use serde_json::json;
    fn fixture() -> (Vec<Field>, Vec<Row>, Mapping) {
        let fields = vec![
            Field::new("product", FieldType::String).with_name("Product"),
            Field::new("units", FieldType::Number),
        ];
        let rows = ["a", "b", "c", "d", "e"]
            .into_iter()
            .zip([10, 20, 30, 40, 50])
            .filter_map(|(p, u)| row_from_json(json!({"product": p, "units": u})))
            .collect();
        let mapping = Mapping::new()
            .with(Role::Category, "product")
            .with(Role::Value, "units");
        (fields, rows, mapping)
    }
    #[test]
    fn top_n_keeps_head_and_sums_tail() {
        let (fields, rows, mapping) = fixture();
        let config = CompileConfig {
            pie_top_n: 3,
            ..CompileConfig::default()
        };
        let compiler = OptionCompiler::new(ChartRegistry::builtin(), config);
        let compiled = compiler
            .compile(
                ChartKind::Pie,
                &fields,
                &rows,
                &mapping,
                &ChartStyle::default_for(ChartKind::Pie),
            )
            .unwrap();
        let option = compiled.option;
        assert!(option.grid.is_none() && option.x_axis.is_none());
        assert_eq!(option.legend.layout, LegendLayout::Vertical);
        assert_eq!(
            option.series[0].data,
            SeriesData::Slices(vec![
                PieSlice { name: "e".into(), value: 50.0 },
                PieSlice { name: "d".into(), value: 40.0 },
                PieSlice { name: "Other".into(), value: 60.0 },
            ])
        );
        assert_eq!(option.series[0].name, "Product");
    }
    #[test]
    fn rose_mode_uses_a_ring() {
        let (fields, rows, mapping) = fixture();
        let style = PieStyle {
            rose_type: true,
            show_percent: true,
            ..PieStyle::default()
        };
        let compiled = OptionCompiler::builtin()
            .compile(ChartKind::Pie, &fields, &rows, &mapping, &ChartStyle::Pie(style))
            .unwrap();
        let visual = &compiled.option.series[0].visual;
        assert_eq!(visual.rose_type.as_deref(), Some("radius"));
        assert_eq!(visual.radius, Some(radius(true)));
        assert_eq!(visual.label_content, Some(PieLabel::Percent));
    }
}

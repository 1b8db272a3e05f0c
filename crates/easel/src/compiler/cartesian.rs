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
    AxisOption, AxisType, BarWidth, ChartOption, LegendLayout, SeriesData, SeriesOption,
    SeriesType, SeriesVisual,
};
use super::shaping::{build_xy_series, NamedValues};
use super::style::{AreaStyle, BarStyle, CommonStyle, LabelRotation, LineStyle};
use super::{colors, grid, legend, title, BuildContext, CompiledChart};
use crate::chart_registry::Role;
use crate::error::CompileResult;
const STACK_GROUP: &str = "total";
struct Shaped {
    x_axis: AxisOption,
    series: Vec<NamedValues>,
    ignored: usize,
}
/// Shapes rows for the line, bar and area builders.
fn shape(ctx: &BuildContext<'_>, common: &CommonStyle) -> CompileResult<Shaped> {
    let x = ctx.required(Role::X)?;
    let y = ctx.required(Role::Y)?;
    let series = ctx.optional(Role::Series)?;
    let mut built = build_xy_series(ctx.rows, &x.key, &y.key, series.map(|f| f.key.as_str()));
    if series.is_none() {
        for s in &mut built.series {
            s.name.clone_from(&y.name);
        }
    }
    let rotation = match common.x_label_rotate {
        LabelRotation::Degrees(deg) => deg,
        LabelRotation::Auto if built.categories.len() > ctx.config.label_rotation_threshold => 45.0,
        LabelRotation::Auto => 0.0,
    };
    Ok(Shaped {
        x_axis: AxisOption {
            axis_type: AxisType::for_field(x.field_type),
            name: None,
            categories: built.categories,
            label_rotation: Some(rotation),
        },
        series: built.series,
        ignored: built.ignored,
    })
}
fn stack(stacked: bool) -> Option<String> {
    stacked.then(|| STACK_GROUP.to_string())
}
fn assemble(
    common: &CommonStyle,
    shaped: Shaped,
    layout: LegendLayout,
    series_type: SeriesType,
    visual: &SeriesVisual,
) -> CompiledChart {
    let series = shaped
        .series
        .into_iter()
        .map(|s| SeriesOption {
            name: s.name,
            series_type,
            data: SeriesData::Values(s.values),
            visual: visual.clone(),
        })
        .collect();
    CompiledChart {
        option: ChartOption {
            colors: colors(common),
            title: title(common),
            legend: legend(common, layout),
            grid: Some(grid(common)),
            x_axis: Some(shaped.x_axis),
            y_axis: Some(AxisOption::value()),
            series,
            radar: None,
        },
        ignored_count: shaped.ignored,
    }
}
fn crowded_legend(ctx: &BuildContext<'_>, series: usize) -> LegendLayout {
    if series > ctx.config.scroll_legend_after {
        LegendLayout::Scroll
    } else {
        LegendLayout::Horizontal
    }
}
pub(crate) fn build_line(
    ctx: &BuildContext<'_>,
    style: &LineStyle,
) -> CompileResult<CompiledChart> {
    let shaped = shape(ctx, &style.common)?;
    let layout = crowded_legend(ctx, shaped.series.len());
    let visual = SeriesVisual {
        show_label: style.common.show_label,
        stack: stack(style.stacked),
        smooth: Some(style.smooth),
        show_symbol: Some(style.show_symbol),
        line_width: Some(style.line_width),
        ..SeriesVisual::default()
    };
    Ok(assemble(&style.common, shaped, layout, SeriesType::Line, &visual))
}
pub(crate) fn build_bar(ctx: &BuildContext<'_>, style: &BarStyle) -> CompileResult<CompiledChart> {
    let shaped = shape(ctx, &style.common)?;
    let layout = crowded_legend(ctx, shaped.series.len());
    let visual = SeriesVisual {
        show_label: style.common.show_label,
        stack: stack(style.stacked),
        bar_width: Some(BarWidth::from_setting(style.bar_width)),
        ..SeriesVisual::default()
    };
    Ok(assemble(&style.common, shaped, layout, SeriesType::Bar, &visual))
}
/// Area charts are filled line series; the legend always scrolls.
pub(crate) fn build_area(
    ctx: &BuildContext<'_>,
    style: &AreaStyle,
) -> CompileResult<CompiledChart> {
    let shaped = shape(ctx, &style.common)?;
    let visual = SeriesVisual {
        show_label: style.common.show_label,
        stack: stack(style.stacked),
        smooth: Some(style.smooth),
        show_symbol: Some(style.show_symbol),
        line_width: Some(style.line_width),
        area_opacity: Some(style.opacity),
        ..SeriesVisual::default()
    };
    Ok(assemble(
        &style.common,
        shaped,
        LegendLayout::Scroll,
        SeriesType::Line,
        &visual,
    ))
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_registry::{ChartKind, Mapping};
    use crate::compiler::{ChartStyle, OptionCompiler};
    use crate::dataset::{Field, FieldType};
    use crate::value::{row_from_json, Row};
    use serde_json::json;
    fn fixture() -> (Vec<Field>, Vec<Row>) {
        let fields = vec![
            Field::new("m", FieldType::String).with_name("Month"),
            Field::new("region", FieldType::String),
            Field::new("sales", FieldType::Number).with_name("Sales"),
        ];
        let rows = [
            json!({"m": "Jan", "region": "E", "sales": 100}),
            json!({"m": "Jan", "region": "W", "sales": 50}),
            json!({"m": "Feb", "region": "E", "sales": 80}),
        ]
        .into_iter()
        .filter_map(row_from_json)
        .collect();
        (fields, rows)
    }
    #[test]
    fn bar_with_series_matches_worked_example() {
        let (fields, rows) = fixture();
        let mapping = Mapping::new()
            .with(Role::X, "m")
            .with(Role::Y, "sales")
            .with(Role::Series, "region");
        let compiled = OptionCompiler::builtin()
            .compile(
                ChartKind::Bar,
                &fields,
                &rows,
                &mapping,
                &ChartStyle::default_for(ChartKind::Bar),
            )
            .unwrap();
        let option = compiled.option;
        let x_axis = option.x_axis.unwrap();
        assert_eq!(x_axis.categories, vec!["Feb", "Jan"]);
        assert_eq!(x_axis.axis_type, AxisType::Category);
        assert_eq!(x_axis.label_rotation, Some(0.0));
        assert_eq!(option.series[0].data, SeriesData::Values(vec![80.0, 100.0]));
        assert_eq!(option.series[1].data, SeriesData::Values(vec![0.0, 50.0]));
        assert_eq!(
            option.series[0].visual.bar_width,
            Some(BarWidth::Percent("60%".into()))
        );
        assert_eq!(option.legend.layout, LegendLayout::Horizontal);
        assert_eq!(option.grid.unwrap().margins.top, 80.0);
        assert_eq!(compiled.ignored_count, 0);
    }
    #[test]
    fn single_line_is_named_after_y_field() {
        let (fields, rows) = fixture();
        let mapping = Mapping::new().with(Role::X, "Month").with(Role::Y, "sales");
        let mut style = LineStyle::default();
        style.smooth = true;
        style.common.show_legend = false;
        style.common.x_label_rotate = LabelRotation::Degrees(30.0);
        let compiled = OptionCompiler::builtin()
            .compile(ChartKind::Line, &fields, &rows, &mapping, &ChartStyle::Line(style))
            .unwrap();
        let option = compiled.option;
        assert_eq!(option.series_names(), vec!["Sales"]);
        assert_eq!(option.series[0].data, SeriesData::Values(vec![80.0, 150.0]));
        assert_eq!(option.series[0].visual.smooth, Some(true));
        assert_eq!(option.x_axis.unwrap().label_rotation, Some(30.0));
        assert_eq!(option.grid.unwrap().margins.top, 60.0);
        assert!(!option.legend.visible);
    }
    #[test]
    fn area_is_a_filled_line_with_scrolling_legend() {
        let (fields, rows) = fixture();
        let mapping = Mapping::new().with(Role::X, "m").with(Role::Y, "sales");
        let mut style = AreaStyle::default();
        style.stacked = true;
        style.common.colors = vec!["#111111".into()];
        let compiled = OptionCompiler::builtin()
            .compile(ChartKind::Area, &fields, &rows, &mapping, &ChartStyle::Area(style))
            .unwrap();
        let option = compiled.option;
        assert_eq!(option.series[0].series_type, SeriesType::Line);
        assert_eq!(option.series[0].visual.area_opacity, Some(0.7));
        assert_eq!(option.series[0].visual.stack.as_deref(), Some("total"));
        assert_eq!(option.legend.layout, LegendLayout::Scroll);
        assert_eq!(option.colors, vec!["#111111"]);
    }
    #[test]
    fn many_categories_rotate_labels() {
        let fields = vec![
            Field::new("i", FieldType::Number),
            Field::new("v", FieldType::Number),
        ];
        let rows: Vec<Row> = (0..120)
            .filter_map(|i| row_from_json(json!({"i": i, "v": "n/a"})))
            .chain((0..120).filter_map(|i| row_from_json(json!({"i": i, "v": i}))))
            .collect();
        let mapping = Mapping::new().with(Role::X, "i").with(Role::Y, "v");
        let compiled = OptionCompiler::builtin()
            .compile(
                ChartKind::Line,
                &fields,
                &rows,
                &mapping,
                &ChartStyle::default_for(ChartKind::Line),
            )
            .unwrap();
        let x_axis = compiled.option.x_axis.unwrap();
        assert_eq!(x_axis.axis_type, AxisType::Value);
        assert_eq!(x_axis.label_rotation, Some(45.0));
        assert_eq!(x_axis.categories[..3], ["0", "1", "2"]);
        assert_eq!(compiled.ignored_count, 120);
    }
}

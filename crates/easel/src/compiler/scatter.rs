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
    AxisOption, ChartOption, LegendLayout, SeriesData, SeriesOption, SeriesType, SeriesVisual,
};
use super::shaping::build_scatter;
use super::style::ScatterStyle;
use super::{colors, grid, legend, title, BuildContext, CompiledChart};
use crate::chart_registry::Role;
use crate::error::CompileResult;
pub(crate) fn build_scatter_chart(
    ctx: &BuildContext<'_>,
    style: &ScatterStyle,
) -> CompileResult<CompiledChart> {
    let x = ctx.required(Role::X)?;
    let y = ctx.required(Role::Y)?;
    let series = ctx.optional(Role::Series)?;
    let built = build_scatter(ctx.rows, &x.key, &y.key, series.map(|f| f.key.as_str()));
    let visual = SeriesVisual {
        show_label: style.common.show_label,
        symbol_size: Some(style.symbol_size),
        ..SeriesVisual::default()
    };
    let named_axis = |name: &str| AxisOption {
        name: Some(name.to_string()),
        ..AxisOption::value()
    };
    let common = &style.common;
    Ok(CompiledChart {
        option: ChartOption {
            colors: colors(common),
            title: title(common),
            legend: legend(common, LegendLayout::Horizontal),
            grid: Some(grid(common)),
            x_axis: Some(named_axis(&x.name)),
            y_axis: Some(named_axis(&y.name)),
            series: built
                .groups
                .into_iter()
                .map(|g| SeriesOption {
                    name: g.name,
                    series_type: SeriesType::Scatter,
                    data: SeriesData::Points(g.points),
                    visual: visual.clone(),
                })
                .collect(),
            radar: None,
        },
        ignored_count: built.ignored,
    })
}

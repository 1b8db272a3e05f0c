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
    ChartOption, LegendLayout, RadarOption, SeriesData, SeriesOption, SeriesType, SeriesVisual,
};
use super::shaping::{build_radar, SINGLE_GROUP};
use super::style::RadarStyle;
use super::{colors, legend, title, BuildContext, CompiledChart};
use crate::chart_registry::Role;
use crate::error::CompileResult;
pub(crate) fn build_radar_chart(
    ctx: &BuildContext<'_>,
    style: &RadarStyle,
) -> CompileResult<CompiledChart> {
    let dimension = ctx.required(Role::Dimension)?;
    let value = ctx.required(Role::Value)?;
    let series = ctx.optional(Role::Series)?;
    let built = build_radar(
        ctx.rows,
        &dimension.key,
        &value.key,
        series.map(|f| f.key.as_str()),
    );
    let common = &style.common;
    Ok(CompiledChart {
        option: ChartOption {
            colors: colors(common),
            title: title(common),
            legend: legend(common, LegendLayout::Horizontal),
            grid: None,
            x_axis: None,
            y_axis: None,
            series: vec![SeriesOption {
                name: SINGLE_GROUP.to_string(),
                series_type: SeriesType::Radar,
                data: SeriesData::Vectors(built.vectors),
                visual: SeriesVisual {
                    show_label: common.show_label,
                    show_area: Some(style.show_area),
                    show_line: Some(style.show_line),
                    ..SeriesVisual::default()
                },
            }],
            radar: Some(RadarOption {
                indicators: built.indicators,
                radius: format!("{}%", (style.radius * 100.0).round()),
            }),
        },
        ignored_count: built.ignored,
    })
}

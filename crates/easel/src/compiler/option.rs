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

//! Renderer-agnostic chart description produced by the compiler.
//!
//! Serialises with camelCase keys and leaves out absent members, so
//! `serde_json::to_value(&option)` is the hand-off format for renderers.
use crate::dataset::FieldType;
use serde::{Deserialize, Serialize};
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOption {
    pub colors: Vec<String>,
    pub title: TitleOption,
    pub legend: LegendOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<AxisOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisOption>,
    pub series: Vec<SeriesOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radar: Option<RadarOption>,
}
impl ChartOption {
    pub fn series_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitlePosition {
    Left,
    #[default]
    Center,
    Right,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleOption {
    pub text: String,
    pub position: TitlePosition,
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendLayout {
    #[default]
    Horizontal,
    Vertical,
    Scroll,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendOption {
    pub visible: bool,
    pub layout: LegendLayout,
}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOption {
    pub margins: Margins,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Category,
    Time,
    Value,
}
impl AxisType {
    /// Dates read as a time axis, numbers as a value axis, the rest as categories.
    pub fn for_field(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Date => AxisType::Time,
            FieldType::Number => AxisType::Value,
            FieldType::String | FieldType::Boolean => AxisType::Category,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOption {
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_rotation: Option<f64>,
}
impl AxisOption {
    pub fn value() -> Self {
        Self {
            axis_type: AxisType::Value,
            name: None,
            categories: Vec::new(),
            label_rotation: None,
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Line,
    Bar,
    Scatter,
    Pie,
    Radar,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarVector {
    pub name: String,
    pub value: Vec<f64>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesData {
    Values(Vec<f64>),
    Points(Vec<[f64; 2]>),
    Slices(Vec<PieSlice>),
    Vectors(Vec<RadarVector>),
}
impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Values(v) => v.len(),
            SeriesData::Points(p) => p.len(),
            SeriesData::Slices(s) => s.len(),
            SeriesData::Vectors(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn values(&self) -> Option<&[f64]> {
        match self {
            SeriesData::Values(v) => Some(v),
            _ => None,
        }
    }
}
/// Percentages below or at 1.0 are relative widths; larger numbers are pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarWidth {
    Percent(String),
    Pixels(f64),
}
impl BarWidth {
    pub fn from_setting(width: f64) -> Self {
        if width <= 1.0 {
            BarWidth::Percent(format!("{}%", (width * 100.0).round()))
        } else {
            BarWidth::Pixels(width)
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PieRadius {
    Outer(String),
    Ring([String; 2]),
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PieLabel {
    /// Name and share only.
    Percent,
    /// Name, raw value and share.
    ValueAndPercent,
}
/// Visual hints carried per series; only the ones a kind uses are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesVisual {
    pub show_label: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_symbol: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_width: Option<BarWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rose_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<PieRadius>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_content: Option<PieLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_area: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_line: Option<bool>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOption {
    pub name: String,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    pub data: SeriesData,
    #[serde(flatten)]
    pub visual: SeriesVisual,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarIndicator {
    pub name: String,
    pub max: f64,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarOption {
    pub indicators: Vec<RadarIndicator>,
    pub radius: String,
}

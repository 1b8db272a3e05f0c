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

//! Per-kind style records.
//!
//! Each kind gets its own struct carrying only the options that kind
//! understands, with the shared options flattened in from [`CommonStyle`].
//! Defaults match the builtin registry's style schema.
use super::palette::Palette;
use crate::chart_registry::{ChartKind, ChartSpec, StyleValue};
use crate::error::{CompileError, CompileResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
fn yes() -> bool {
    true
}
fn default_grid_margin() -> f64 {
    60.0
}
fn default_line_width() -> f64 {
    2.0
}
fn default_bar_width() -> f64 {
    0.6
}
fn default_opacity() -> f64 {
    0.7
}
fn default_symbol_size() -> f64 {
    8.0
}
fn default_radius() -> f64 {
    0.7
}
/// X label rotation: chosen from the category count, or fixed in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LabelRotation {
    #[default]
    Auto,
    Degrees(f64),
}
impl LabelRotation {
    pub fn to_style_value(self) -> StyleValue {
        match self {
            LabelRotation::Auto => StyleValue::Text("auto".to_string()),
            LabelRotation::Degrees(deg) => StyleValue::Number(deg),
        }
    }
}
impl Serialize for LabelRotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_style_value().serialize(serializer)
    }
}
impl<'de> Deserialize<'de> for LabelRotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<StyleValue>::deserialize(deserializer)? {
            None => Ok(LabelRotation::Auto),
            Some(StyleValue::Number(deg)) => Ok(LabelRotation::Degrees(deg)),
            Some(StyleValue::Text(text)) if text.trim().eq_ignore_ascii_case("auto") => {
                Ok(LabelRotation::Auto)
            }
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected 'auto' or degrees, found {other}"
            ))),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "yes")]
    pub show_legend: bool,
    #[serde(default, alias = "showDataLabels")]
    pub show_label: bool,
    #[serde(default)]
    pub color_scheme: Palette,
    /// Custom colours; when non-empty they replace the palette entirely.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default = "default_grid_margin")]
    pub grid_margin: f64,
    #[serde(default)]
    pub x_label_rotate: LabelRotation,
}
impl Default for CommonStyle {
    fn default() -> Self {
        Self {
            title: None,
            show_legend: true,
            show_label: false,
            color_scheme: Palette::Default,
            colors: Vec::new(),
            grid_margin: default_grid_margin(),
            x_label_rotate: LabelRotation::Auto,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    #[serde(flatten)]
    pub common: CommonStyle,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default = "yes")]
    pub show_symbol: bool,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default)]
    pub stacked: bool,
}
impl Default for LineStyle {
    fn default() -> Self {
        Self {
            common: CommonStyle::default(),
            smooth: false,
            show_symbol: true,
            line_width: default_line_width(),
            stacked: false,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarStyle {
    #[serde(flatten)]
    pub common: CommonStyle,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default = "default_bar_width")]
    pub bar_width: f64,
}
impl Default for BarStyle {
    fn default() -> Self {
        Self {
            common: CommonStyle::default(),
            stacked: false,
            bar_width: default_bar_width(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaStyle {
    #[serde(flatten)]
    pub common: CommonStyle,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "yes")]
    pub show_symbol: bool,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
}
impl Default for AreaStyle {
    fn default() -> Self {
        Self {
            common: CommonStyle::default(),
            smooth: false,
            stacked: false,
            opacity: default_opacity(),
            show_symbol: true,
            line_width: default_line_width(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterStyle {
    #[serde(flatten)]
    pub common: CommonStyle,
    #[serde(default = "default_symbol_size")]
    pub symbol_size: f64,
}
impl Default for ScatterStyle {
    fn default() -> Self {
        Self {
            common: CommonStyle::default(),
            symbol_size: default_symbol_size(),
        }
    }
}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieStyle {
    #[serde(flatten)]
    pub common: CommonStyle,
    #[serde(default)]
    pub rose_type: bool,
    #[serde(default)]
    pub show_percent: bool,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarStyle {
    #[serde(flatten)]
    pub common: CommonStyle,
    #[serde(default)]
    pub show_area: bool,
    #[serde(default = "yes")]
    pub show_line: bool,
    #[serde(default = "default_radius")]
    pub radius: f64,
}
impl Default for RadarStyle {
    fn default() -> Self {
        Self {
            common: CommonStyle::default(),
            show_area: false,
            show_line: true,
            radius: default_radius(),
        }
    }
}
/// Style for one chart, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartStyle {
    Line(LineStyle),
    Bar(BarStyle),
    Area(AreaStyle),
    Scatter(ScatterStyle),
    Pie(PieStyle),
    Radar(RadarStyle),
}
impl ChartStyle {
    pub fn default_for(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Line => ChartStyle::Line(LineStyle::default()),
            ChartKind::Bar => ChartStyle::Bar(BarStyle::default()),
            ChartKind::Area => ChartStyle::Area(AreaStyle::default()),
            ChartKind::Scatter => ChartStyle::Scatter(ScatterStyle::default()),
            ChartKind::Pie => ChartStyle::Pie(PieStyle::default()),
            ChartKind::Radar => ChartStyle::Radar(RadarStyle::default()),
        }
    }
    /// Reads a style object for `kind`. The `kind` tag may be omitted.
    pub fn from_json(kind: ChartKind, value: serde_json::Value) -> CompileResult<Self> {
        let mut object = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return Ok(Self::default_for(kind)),
            other => {
                return Err(CompileError::InvalidStyle {
                    key: "style".to_string(),
                    reason: format!("expected an object, found {other}"),
                })
            }
        };
        object
            .entry("kind")
            .or_insert_with(|| serde_json::Value::String(kind.as_str().to_string()));
        let style: ChartStyle =
            serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
                CompileError::InvalidStyle {
                    key: "style".to_string(),
                    reason: e.to_string(),
                }
            })?;
        if style.kind() != kind {
            return Err(CompileError::StyleKindMismatch {
                expected: kind,
                found: style.kind(),
            });
        }
        Ok(style)
    }
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartStyle::Line(_) => ChartKind::Line,
            ChartStyle::Bar(_) => ChartKind::Bar,
            ChartStyle::Area(_) => ChartKind::Area,
            ChartStyle::Scatter(_) => ChartKind::Scatter,
            ChartStyle::Pie(_) => ChartKind::Pie,
            ChartStyle::Radar(_) => ChartKind::Radar,
        }
    }
    pub fn common(&self) -> &CommonStyle {
        match self {
            ChartStyle::Line(s) => &s.common,
            ChartStyle::Bar(s) => &s.common,
            ChartStyle::Area(s) => &s.common,
            ChartStyle::Scatter(s) => &s.common,
            ChartStyle::Pie(s) => &s.common,
            ChartStyle::Radar(s) => &s.common,
        }
    }
    pub fn common_mut(&mut self) -> &mut CommonStyle {
        match self {
            ChartStyle::Line(s) => &mut s.common,
            ChartStyle::Bar(s) => &mut s.common,
            ChartStyle::Area(s) => &mut s.common,
            ChartStyle::Scatter(s) => &mut s.common,
            ChartStyle::Pie(s) => &mut s.common,
            ChartStyle::Radar(s) => &mut s.common,
        }
    }
    /// Current value of a schema option, by its schema key.
    pub fn option_value(&self, key: &str) -> Option<StyleValue> {
        let common = self.common();
        let shared = match key {
            "showLegend" => Some(StyleValue::Bool(common.show_legend)),
            "showLabel" => Some(StyleValue::Bool(common.show_label)),
            "colorScheme" => Some(StyleValue::Text(common.color_scheme.name().to_string())),
            "gridMargin" => Some(StyleValue::Number(common.grid_margin)),
            "xLabelRotate" => Some(common.x_label_rotate.to_style_value()),
            _ => None,
        };
        if shared.is_some() {
            return shared;
        }
        let b = |v: bool| Some(StyleValue::Bool(v));
        let n = |v: f64| Some(StyleValue::Number(v));
        match (self, key) {
            (ChartStyle::Line(s), "smooth") => b(s.smooth),
            (ChartStyle::Line(s), "showSymbol") => b(s.show_symbol),
            (ChartStyle::Line(s), "lineWidth") => n(s.line_width),
            (ChartStyle::Line(s), "stacked") => b(s.stacked),
            (ChartStyle::Bar(s), "stacked") => b(s.stacked),
            (ChartStyle::Bar(s), "barWidth") => n(s.bar_width),
            (ChartStyle::Area(s), "smooth") => b(s.smooth),
            (ChartStyle::Area(s), "stacked") => b(s.stacked),
            (ChartStyle::Area(s), "opacity") => n(s.opacity),
            (ChartStyle::Area(s), "showSymbol") => b(s.show_symbol),
            (ChartStyle::Area(s), "lineWidth") => n(s.line_width),
            (ChartStyle::Scatter(s), "symbolSize") => n(s.symbol_size),
            (ChartStyle::Pie(s), "roseType") => b(s.rose_type),
            (ChartStyle::Pie(s), "showPercent") => b(s.show_percent),
            (ChartStyle::Radar(s), "showArea") => b(s.show_area),
            (ChartStyle::Radar(s), "showLine") => b(s.show_line),
            (ChartStyle::Radar(s), "radius") => n(s.radius),
            _ => None,
        }
    }
    /// Checks every value the kind's style schema declares against its bounds.
    pub fn validate(&self, spec: &ChartSpec) -> CompileResult<()> {
        if self.kind() != spec.kind {
            return Err(CompileError::StyleKindMismatch {
                expected: spec.kind,
                found: self.kind(),
            });
        }
        for option in &spec.style_schema {
            if let Some(value) = self.option_value(&option.key) {
                option.check(&value).map_err(|reason| CompileError::InvalidStyle {
                    key: option.key.clone(),
                    reason,
                })?;
            }
        }
        if let Some(blank) = self.common().colors.iter().position(|c| c.trim().is_empty()) {
            return Err(CompileError::InvalidStyle {
                key: "colors".to_string(),
                reason: format!("entry {blank} is blank"),
            });
        }
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_registry::ChartRegistry;
    use serde_json::json;
    #[test]
    fn defaults_agree_with_builtin_schema() {
        let registry = ChartRegistry::builtin();
        for spec in registry.specs() {
            let style = ChartStyle::default_for(spec.kind);
            for option in &spec.style_schema {
                assert_eq!(
                    style.option_value(&option.key).as_ref(),
                    Some(&option.default),
                    "{}:{}",
                    spec.kind,
                    option.key
                );
            }
            assert!(style.validate(spec).is_ok());
        }
    }
    #[test]
    fn reads_partial_json_without_tag() {
        let style = ChartStyle::from_json(
            ChartKind::Bar,
            json!({"stacked": true, "xLabelRotate": 30, "colorScheme": "warm"}),
        )
        .unwrap();
        let ChartStyle::Bar(bar) = &style else {
            panic!("expected bar style, got {style:?}");
        };
        assert!(bar.stacked);
        assert_eq!(bar.bar_width, 0.6);
        assert_eq!(bar.common.x_label_rotate, LabelRotation::Degrees(30.0));
        assert_eq!(bar.common.color_scheme, Palette::Warm);
        assert!(bar.common.show_legend);
    }
    #[test]
    fn kind_mismatch_is_rejected() {
        let err = ChartStyle::from_json(ChartKind::Pie, json!({"kind": "line"})).unwrap_err();
        assert_eq!(
            err,
            CompileError::StyleKindMismatch {
                expected: ChartKind::Pie,
                found: ChartKind::Line
            }
        );
    }
    #[test]
    fn out_of_range_values_fail_validation() {
        let registry = ChartRegistry::builtin();
        let spec = registry.spec(ChartKind::Radar).unwrap();
        let mut style = RadarStyle::default();
        style.radius = 1.5;
        let err = ChartStyle::Radar(style).validate(spec).unwrap_err();
        assert!(matches!(err, CompileError::InvalidStyle { ref key, .. } if key == "radius"));
    }
}

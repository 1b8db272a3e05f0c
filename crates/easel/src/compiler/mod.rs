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

//! Turns rows, a role mapping and a style into a [`ChartOption`].
//!
//! One builder per chart kind; dispatch is a total match over the style
//! variants, which carry the kind.
pub mod cartesian;
pub mod option;
pub mod palette;
pub mod pie;
pub mod radar;
pub mod scatter;
pub mod shaping;
pub mod style;
pub use option::{
    AxisOption, AxisType, BarWidth, ChartOption, GridOption, LegendLayout, LegendOption, Margins,
    PieLabel, PieRadius, PieSlice, RadarIndicator, RadarOption, RadarVector, SeriesData,
    SeriesOption, SeriesType, SeriesVisual, TitleOption, TitlePosition,
};
pub use palette::{resolve_colors, Palette};
pub use shaping::{build_pie, build_radar, build_scatter, build_xy_series};
pub use style::{
    AreaStyle, BarStyle, ChartStyle, CommonStyle, LabelRotation, LineStyle, PieStyle, RadarStyle,
    ScatterStyle,
};
use crate::chart_registry::{ChartKind, ChartRegistry, Mapping, Role};
use crate::config::CompileConfig;
use crate::dataset::{find_field, Field};
use crate::error::{CompileError, CompileResult};
use crate::value::Row;
use serde::Serialize;
use tracing::{debug, warn};
/// A compiled option plus the number of rows shaping had to drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledChart {
    pub option: ChartOption,
    pub ignored_count: usize,
}
/// Inputs shared by every builder for a single compile call.
pub(crate) struct BuildContext<'a> {
    pub kind: ChartKind,
    pub fields: &'a [Field],
    pub rows: &'a [Row],
    pub mapping: &'a Mapping,
    pub config: &'a CompileConfig,
}
impl<'a> BuildContext<'a> {
    pub fn required(&self, role: Role) -> CompileResult<&'a Field> {
        self.optional(role)?
            .ok_or(CompileError::MissingRole {
                kind: self.kind,
                role,
            })
    }
    pub fn optional(&self, role: Role) -> CompileResult<Option<&'a Field>> {
        let Some(key) = self.mapping.get(role) else {
            return Ok(None);
        };
        find_field(self.fields, key)
            .map(Some)
            .ok_or_else(|| CompileError::FieldNotFound {
                role,
                key: key.to_string(),
            })
    }
}
pub(crate) fn title(common: &CommonStyle) -> TitleOption {
    TitleOption {
        text: common.title.clone().unwrap_or_default(),
        position: TitlePosition::Center,
    }
}
pub(crate) fn legend(common: &CommonStyle, layout: LegendLayout) -> LegendOption {
    LegendOption {
        visible: common.show_legend,
        layout,
    }
}
/// Margins around the plot; the top leaves room for a visible legend.
pub(crate) fn grid(common: &CommonStyle) -> GridOption {
    let margin = common.grid_margin;
    GridOption {
        margins: Margins {
            top: if common.show_legend { 80.0 } else { 60.0 },
            right: margin,
            bottom: margin,
            left: margin,
        },
    }
}
pub(crate) fn colors(common: &CommonStyle) -> Vec<String> {
    resolve_colors(&common.colors, common.color_scheme)
}
/// Chart compiler bound to a registry and compile settings.
#[derive(Debug, Clone)]
pub struct OptionCompiler<'r> {
    registry: &'r ChartRegistry,
    config: CompileConfig,
}
impl OptionCompiler<'static> {
    pub fn builtin() -> Self {
        Self::new(ChartRegistry::builtin(), CompileConfig::default())
    }
}
impl<'r> OptionCompiler<'r> {
    pub fn new(registry: &'r ChartRegistry, config: CompileConfig) -> Self {
        Self { registry, config }
    }
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }
    pub fn registry(&self) -> &'r ChartRegistry {
        self.registry
    }
    /// Compiles one chart. Rows are expected to be transformed already.
    ///
    /// Fails when the kind is not registered, the style belongs to another
    /// kind, or a required role is unmapped or points at no field. Malformed
    /// cells never fail the call; they are counted in `ignored_count`.
    pub fn compile(
        &self,
        kind: ChartKind,
        fields: &[Field],
        rows: &[Row],
        mapping: &Mapping,
        style: &ChartStyle,
    ) -> CompileResult<CompiledChart> {
        let spec = self.registry.spec(kind)?;
        if style.kind() != kind {
            return Err(CompileError::StyleKindMismatch {
                expected: kind,
                found: style.kind(),
            });
        }
        if let Some(role) = spec.required_roles().find(|r| !mapping.contains(*r)) {
            return Err(CompileError::MissingRole { kind, role });
        }
        let ctx = BuildContext {
            kind,
            fields,
            rows,
            mapping,
            config: &self.config,
        };
        let compiled = match style {
            ChartStyle::Line(s) => cartesian::build_line(&ctx, s)?,
            ChartStyle::Bar(s) => cartesian::build_bar(&ctx, s)?,
            ChartStyle::Area(s) => cartesian::build_area(&ctx, s)?,
            ChartStyle::Scatter(s) => scatter::build_scatter_chart(&ctx, s)?,
            ChartStyle::Pie(s) => pie::build_pie_chart(&ctx, s)?,
            ChartStyle::Radar(s) => radar::build_radar_chart(&ctx, s)?,
        };
        debug!(
            kind = %kind,
            rows = rows.len(),
            series = compiled.option.series.len(),
            ignored = compiled.ignored_count,
            "Compiled chart option"
        );
        if compiled.ignored_count > 0 {
            warn!(
                kind = %kind,
                ignored = compiled.ignored_count,
                "Dropped rows with non-numeric values while shaping"
            );
        }
        Ok(compiled)
    }
    /// Parses `kind` first; unknown names fail with [`CompileError::UnknownKind`].
    /// A missing style means the kind's defaults.
    pub fn compile_named(
        &self,
        kind: &str,
        fields: &[Field],
        rows: &[Row],
        mapping: &Mapping,
        style: Option<&ChartStyle>,
    ) -> CompileResult<CompiledChart> {
        let kind: ChartKind = kind.parse()?;
        match style {
            Some(style) => self.compile(kind, fields, rows, mapping, style),
            None => self.compile(kind, fields, rows, mapping, &ChartStyle::default_for(kind)),
        }
    }
}
/// Compiles against the builtin registry with default settings.
pub fn compile(
    fields: &[Field],
    rows: &[Row],
    mapping: &Mapping,
    style: &ChartStyle,
) -> CompileResult<CompiledChart> {
    OptionCompiler::builtin().compile(style.kind(), fields, rows, mapping, style)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FieldType;
    fn fields() -> Vec<Field> {
        vec![
            Field::new("m", FieldType::String),
            Field::new("sales", FieldType::Number),
        ]
    }
    #[test]
    fn unknown_kind_is_an_error() {
        let err = OptionCompiler::builtin()
            .compile_named("sunburst", &fields(), &[], &Mapping::new(), None)
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownKind {
                kind: "sunburst".to_string()
            }
        );
    }
    #[test]
    fn missing_required_role_is_fatal() {
        let mapping = Mapping::new().with(Role::X, "m");
        let err = compile(&fields(), &[], &mapping, &ChartStyle::default_for(ChartKind::Bar))
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingRole {
                kind: ChartKind::Bar,
                role: Role::Y
            }
        );
    }
    #[test]
    fn unknown_field_is_fatal() {
        let mapping = Mapping::new()
            .with(Role::Category, "m")
            .with(Role::Value, "revenue");
        let err = compile(&fields(), &[], &mapping, &ChartStyle::default_for(ChartKind::Pie))
            .unwrap_err();
        assert!(matches!(err, CompileError::FieldNotFound { role: Role::Value, .. }));
    }
    #[test]
    fn style_must_match_kind() {
        let mapping = Mapping::new().with(Role::X, "m").with(Role::Y, "sales");
        let err = OptionCompiler::builtin()
            .compile(
                ChartKind::Line,
                &fields(),
                &[],
                &mapping,
                &ChartStyle::default_for(ChartKind::Bar),
            )
            .unwrap_err();
        assert!(matches!(err, CompileError::StyleKindMismatch { .. }));
    }
}

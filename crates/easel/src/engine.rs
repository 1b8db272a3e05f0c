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

use crate::chart_advisor::{
    explain_charts, rank_charts, suggest_charts_with, ChartExplanation, ChartSuggestion,
    DEFAULT_SUGGESTION_LIMIT,
};
use crate::chart_registry::{default_mapping, ChartKind, ChartRegistry, Mapping};
use crate::compiler::{ChartOption, ChartStyle, OptionCompiler};
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::{CompileError, CompileResult, ConfigResult, Result, SchemaError};
use crate::transform::{apply_transform, TransformConfig};
use crate::validator::{validate_mapping, MappingReport};
use crate::value::{row_from_json, Row};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info, warn};
use uuid::Uuid;
fn new_chart_id() -> String {
    Uuid::new_v4().to_string()
}
/// One chart the caller wants drawn from a dataset.
///
/// On the wire `style` may omit its `kind` tag; it is read against `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawChartConfig")]
pub struct ChartConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub mapping: Mapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ChartStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformConfig>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChartConfig {
    #[serde(default = "new_chart_id")]
    id: String,
    #[serde(rename = "type", alias = "kind")]
    kind: ChartKind,
    #[serde(default)]
    title: String,
    #[serde(default)]
    mapping: Mapping,
    #[serde(default)]
    style: Option<serde_json::Value>,
    #[serde(default)]
    transform: Option<TransformConfig>,
}
impl TryFrom<RawChartConfig> for ChartConfig {
    type Error = CompileError;
    fn try_from(raw: RawChartConfig) -> std::result::Result<Self, Self::Error> {
        let style = raw
            .style
            .map(|value| ChartStyle::from_json(raw.kind, value))
            .transpose()?;
        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            title: raw.title,
            mapping: raw.mapping,
            style,
            transform: raw.transform,
        })
    }
}
impl ChartConfig {
    pub fn new(kind: ChartKind, title: impl Into<String>, mapping: Mapping) -> Self {
        Self {
            id: new_chart_id(),
            kind,
            title: title.into(),
            mapping,
            style: None,
            transform: None,
        }
    }
    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = Some(style);
        self
    }
    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = Some(transform);
        self
    }
    /// The style to draw with: the configured one or the kind's defaults, with
    /// the chart title filled in when the style carries none.
    pub fn effective_style(&self) -> ChartStyle {
        let mut style = self
            .style
            .clone()
            .unwrap_or_else(|| ChartStyle::default_for(self.kind));
        let common = style.common_mut();
        if common.title.as_deref().map_or(true, |t| t.trim().is_empty()) && !self.title.is_empty() {
            common.title = Some(self.title.clone());
        }
        style
    }
}
/// Ignored-record counts for one render, per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub filter_ignored: usize,
    pub aggregate_ignored: usize,
    pub shaping_ignored: usize,
}
impl Diagnostics {
    pub fn ignored_count(&self) -> usize {
        self.filter_ignored + self.aggregate_ignored + self.shaping_ignored
    }
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub option: ChartOption,
    pub diagnostics: Diagnostics,
}
impl RenderOutcome {
    pub fn ignored_count(&self) -> usize {
        self.diagnostics.ignored_count()
    }
}
/// Ties ingestion, suggestion, validation, transformation and compilation
/// together over one registry and one configuration.
pub struct ChartEngine<'r> {
    config: EngineConfig,
    registry: &'r ChartRegistry,
}
impl ChartEngine<'static> {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            registry: ChartRegistry::builtin(),
        }
    }
    pub fn with_config(config: EngineConfig) -> ConfigResult<Self> {
        Self::with_registry(config, ChartRegistry::builtin())
    }
}
impl Default for ChartEngine<'static> {
    fn default() -> Self {
        Self::new()
    }
}
impl<'r> ChartEngine<'r> {
    pub fn with_registry(config: EngineConfig, registry: &'r ChartRegistry) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    pub fn registry(&self) -> &'r ChartRegistry {
        self.registry
    }
    pub fn load_dataset(&self, name: &str, rows: Vec<Row>) -> Result<Dataset> {
        Ok(Dataset::from_rows(name, rows, &self.config)?)
    }
    /// Reads a JSON array of objects. Entries that are not objects are skipped.
    pub fn load_json(&self, name: &str, json: serde_json::Value) -> Result<Dataset> {
        let serde_json::Value::Array(items) = json else {
            return Err(SchemaError::NoColumns.into());
        };
        let total = items.len();
        let rows: Vec<Row> = items.into_iter().filter_map(row_from_json).collect();
        if rows.len() < total {
            warn!(
                dataset = name,
                skipped = total - rows.len(),
                "skipped JSON entries that are not objects"
            );
        }
        self.load_dataset(name, rows)
    }
    pub fn rank(&self, dataset: &Dataset) -> Vec<ChartSuggestion> {
        rank_charts(&dataset.fields, self.registry)
    }
    pub fn suggest(&self, dataset: &Dataset) -> Vec<ChartKind> {
        suggest_charts_with(&dataset.fields, self.registry, DEFAULT_SUGGESTION_LIMIT)
    }
    pub fn explain(&self, dataset: &Dataset) -> Vec<ChartExplanation> {
        explain_charts(&dataset.fields, self.registry)
    }
    pub fn default_mapping(&self, kind: ChartKind, dataset: &Dataset) -> CompileResult<Mapping> {
        let spec = self.registry.spec(kind)?;
        Ok(default_mapping(spec, &dataset.fields))
    }
    /// A fresh chart with the default mapping, default style and a
    /// "<chart name> - <dataset name>" title.
    pub fn new_chart(&self, kind: ChartKind, dataset: &Dataset) -> CompileResult<ChartConfig> {
        let spec = self.registry.spec(kind)?;
        let title = format!("{} - {}", spec.name, dataset.name);
        Ok(ChartConfig::new(kind, title, default_mapping(spec, &dataset.fields))
            .with_style(ChartStyle::default_for(kind)))
    }
    pub fn validate(&self, chart: &ChartConfig, dataset: &Dataset) -> CompileResult<MappingReport> {
        let spec = self.registry.spec(chart.kind)?;
        Ok(validate_mapping(spec, &chart.mapping, &dataset.fields))
    }
    /// Validates, transforms and compiles one chart.
    ///
    /// An invalid mapping fails with the full issue list before any row is read.
    pub fn render(&self, chart: &ChartConfig, dataset: &Dataset) -> Result<RenderOutcome> {
        let spec = self.registry.spec(chart.kind)?;
        validate_mapping(spec, &chart.mapping, &dataset.fields).into_result()?;
        let style = chart.effective_style();
        style.validate(spec)?;
        let mut diagnostics = Diagnostics::default();
        let rows: Cow<'_, [Row]> = match chart.transform.as_ref().filter(|t| !t.is_empty()) {
            Some(transform) => {
                let outcome = apply_transform(&dataset.rows, transform)?;
                diagnostics.filter_ignored = outcome.diagnostics.filter_ignored;
                diagnostics.aggregate_ignored = outcome.diagnostics.aggregate_ignored;
                Cow::Owned(outcome.rows)
            }
            None => Cow::Borrowed(&dataset.rows),
        };
        debug!(chart = %chart.id, rows = rows.len(), "rows ready for compilation");
        let compiler = OptionCompiler::new(self.registry, self.config.compile.clone());
        let compiled =
            compiler.compile(chart.kind, &dataset.fields, &rows, &chart.mapping, &style)?;
        diagnostics.shaping_ignored = compiled.ignored_count;
        info!(
            chart = %chart.id,
            kind = %chart.kind,
            series = compiled.option.series.len(),
            ignored = diagnostics.ignored_count(),
            "chart rendered"
        );
        Ok(RenderOutcome {
            option: compiled.option,
            diagnostics,
        })
    }
}

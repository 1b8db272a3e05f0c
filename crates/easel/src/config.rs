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

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub sample_size: usize,
    /// A type wins a column when its share of non-missing samples exceeds this.
    pub type_threshold: f64,
    pub serial_date_share: f64,
    pub serial_date_min: f64,
    pub serial_date_max: f64,
    pub max_sample_values: usize,
    /// Extra chrono layouts tried after the built-in date literals.
    pub date_formats: Vec<String>,
}
impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            type_threshold: 0.7,
            serial_date_share: 0.8,
            serial_date_min: 20000.0,
            serial_date_max: 60000.0,
            max_sample_values: 5,
            date_formats: crate::value::DEFAULT_DATETIME_FORMATS
                .iter()
                .map(|f| (*f).to_string())
                .collect(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub pie_top_n: usize,
    /// Category axes with more labels than this rotate them by 45 degrees.
    pub label_rotation_threshold: usize,
    pub scroll_legend_after: usize,
}
impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            pie_top_n: 12,
            label_rotation_threshold: 100,
            scroll_legend_after: 8,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub inference: InferenceConfig,
    pub compile: CompileConfig,
    /// Rows beyond this are dropped at ingestion.
    pub max_rows: usize,
}
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            compile: CompileConfig::default(),
            max_rows: Self::DEFAULT_MAX_ROWS,
        }
    }
}
impl EngineConfig {
    pub const DEFAULT_MAX_ROWS: usize = 100_000;
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> ConfigResult<()> {
        let inference = &self.inference;
        if inference.sample_size == 0 {
            return Err(out_of_range("inference.sample_size", inference.sample_size));
        }
        if !(inference.type_threshold > 0.0 && inference.type_threshold < 1.0) {
            return Err(out_of_range(
                "inference.type_threshold",
                inference.type_threshold,
            ));
        }
        if !(inference.serial_date_share > 0.0 && inference.serial_date_share <= 1.0) {
            return Err(out_of_range(
                "inference.serial_date_share",
                inference.serial_date_share,
            ));
        }
        if inference.serial_date_min >= inference.serial_date_max {
            return Err(ConfigError::ConflictingOptions {
                details: format!(
                    "serial_date_min ({}) must be below serial_date_max ({})",
                    inference.serial_date_min, inference.serial_date_max
                ),
            });
        }
        if self.compile.pie_top_n < 2 {
            return Err(out_of_range("compile.pie_top_n", self.compile.pie_top_n));
        }
        if self.max_rows == 0 {
            return Err(out_of_range("max_rows", self.max_rows));
        }
        if self.max_rows < inference.sample_size {
            tracing::debug!(
                max_rows = self.max_rows,
                sample_size = inference.sample_size,
                "sample size exceeds row cap; inference will see at most max_rows rows"
            );
        }
        Ok(())
    }
    /// Keeps more of the tail visible: bigger samples and pies, later legend scrolling.
    pub fn for_exploration() -> Self {
        Self {
            inference: InferenceConfig {
                sample_size: 5000,
                ..InferenceConfig::default()
            },
            compile: CompileConfig {
                pie_top_n: 20,
                label_rotation_threshold: 60,
                scroll_legend_after: 12,
            },
            ..Self::new()
        }
    }
    /// Tighter charts for slides and reports.
    pub fn for_presentation() -> Self {
        Self {
            compile: CompileConfig {
                pie_top_n: 6,
                label_rotation_threshold: 30,
                scroll_legend_after: 6,
            },
            ..Self::new()
        }
    }
}
fn out_of_range(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        field: field.to_string(),
        value: value.to_string(),
    }
}

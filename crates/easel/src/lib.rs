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

//! Chart-spec engine: infers a schema from loosely typed rows, checks role
//! mappings against a chart registry, reshapes rows and compiles a
//! renderer-agnostic chart option.
pub mod chart_advisor;
pub mod chart_registry;
pub mod compiler;
pub mod config;
pub mod data_profiler;
pub mod data_quality;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod samples;
pub mod transform;
pub mod validator;
pub mod value;

pub use chart_advisor::{
    explain_charts, rank_charts, suggest_charts_for_dataset, ChartExplanation, ChartSuggestion,
};
pub use chart_registry::{
    default_mapping, ChartKind, ChartRegistry, ChartSpec, Mapping, Role, RoleRule, StyleOption,
    StyleValue,
};
pub use compiler::{compile, ChartOption, ChartStyle, CompiledChart, OptionCompiler, Palette};
pub use config::{CompileConfig, EngineConfig, InferenceConfig};
pub use data_profiler::{field_stats, infer, FieldStats, TypeInferencer};
pub use data_quality::{check_data_quality, DataQualityReport, FieldQuality, QualityIssue};
pub use dataset::{Dataset, DatasetId, DatasetSummary, Field, FieldType};
pub use engine::{ChartConfig, ChartEngine, Diagnostics, RenderOutcome};
pub use error::{
    CompileError, ConfigError, EaselError, MappingError, RegistryError, Result, SchemaError,
    TransformError,
};
pub use transform::{
    apply_transform, group_stats, pivot_table, smart_sort, Aggregation, GroupStats, PivotTable,
    TransformConfig, TransformOutcome,
};
pub use validator::{validate_mapping, MappingIssue, MappingReport};
pub use value::{Row, Value};

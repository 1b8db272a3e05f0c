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

use crate::chart_registry::{ChartKind, Role};
use crate::validator::MappingIssue;
use thiserror::Error;
#[derive(Error, Debug)]
pub enum EaselError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {source}")]
    Serialisation {
        #[from]
        source: serde_json::Error,
    },
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Empty dataset provided for inference")]
    EmptyDataset,
    #[error("Dataset rows carry no columns")]
    NoColumns,
    #[error("Duplicate field key '{key}'")]
    DuplicateField { key: String },
    #[error("Inference sample size must be at least 1, got {size}")]
    InvalidSampleSize { size: usize },
}
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("Mapping rejected with {} issue(s): {}", .issues.len(), join_issues(.issues))]
    Invalid { issues: Vec<MappingIssue> },
}
fn join_issues(issues: &[MappingIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Filter clause {index} has an empty field")]
    EmptyClauseField { index: usize },
    #[error("Filter on '{field}' with '{operator}' expects a list operand")]
    ExpectedList { field: String, operator: String },
    #[error("Filter on '{field}' with '{operator}' expects a single operand")]
    ExpectedScalar { field: String, operator: String },
    #[error("Range filter on '{field}' is missing its upper bound")]
    MissingSecondOperand { field: String },
    #[error("Sort clause {index} has an empty field")]
    EmptySortField { index: usize },
    #[error("Aggregation needs a target field")]
    MissingAggregateField,
    #[error("Aggregation group-by entry {index} is empty")]
    EmptyGroupField { index: usize },
    #[error("Aggregation {index} has an empty field")]
    EmptyAggregationField { index: usize },
    #[error("Aggregation output column '{name}' is produced more than once")]
    DuplicateAggregateOutput { name: String },
}
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unknown chart kind '{kind}'")]
    UnknownKind { kind: String },
    #[error("Chart kind '{kind}' is not registered")]
    KindNotRegistered { kind: ChartKind },
    #[error("Chart '{kind}' needs the '{role}' role mapped")]
    MissingRole { kind: ChartKind, role: Role },
    #[error("Field '{key}' mapped to role '{role}' does not exist")]
    FieldNotFound { role: Role, key: String },
    #[error("Style is for '{found}' but the chart is '{expected}'")]
    StyleKindMismatch { expected: ChartKind, found: ChartKind },
    #[error("Style option '{key}' is invalid: {reason}")]
    InvalidStyle { key: String, reason: String },
}
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to parse YAML registry: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Registry contains no chart kinds")]
    Empty,
    #[error("Duplicate chart kind found: '{kind}'")]
    DuplicateKind { kind: ChartKind },
    #[error("Chart '{kind}' declares role '{role}' more than once")]
    DuplicateRole { kind: ChartKind, role: Role },
    #[error("Chart '{kind}' role '{role}' allows no field types")]
    NoAllowedTypes { kind: ChartKind, role: Role },
    #[error("Chart '{kind}' default mapping names undeclared role '{role}'")]
    UndeclaredDefaultRole { kind: ChartKind, role: Role },
    #[error("Chart '{kind}' style option '{key}': {reason}")]
    InvalidStyleOption {
        kind: ChartKind,
        key: String,
        reason: String,
    },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {field} = {value}")]
    OutOfRange { field: String, value: String },
    #[error("Conflicting configuration options: {details}")]
    ConflictingOptions { details: String },
}
pub type Result<T> = std::result::Result<T, EaselError>;
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
pub type MappingResult<T> = std::result::Result<T, MappingError>;
pub type TransformResult<T> = std::result::Result<T, TransformError>;
pub type CompileResult<T> = std::result::Result<T, CompileError>;
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl EaselError {
    /// Errors a caller can fix by editing the chart rather than the data or setup.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EaselError::Mapping(_)
                | EaselError::Transform(_)
                | EaselError::Compile(CompileError::InvalidStyle { .. })
                | EaselError::Compile(CompileError::StyleKindMismatch { .. })
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            EaselError::Schema(_) => "Schema",
            EaselError::Mapping(_) => "Mapping",
            EaselError::Transform(_) => "Transform",
            EaselError::Compile(_) => "Compile",
            EaselError::Registry(_) => "Registry",
            EaselError::Config(_) => "Configuration",
            EaselError::Serialisation { .. } => "Serialisation",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            EaselError::Mapping(MappingError::Invalid { issues }) => {
                let mut hints = Vec::new();
                if issues.iter().any(|i| matches!(i, MappingIssue::MissingRole { .. })) {
                    hints.push("Map every required role before rendering".to_string());
                }
                if issues
                    .iter()
                    .any(|i| matches!(i, MappingIssue::TypeNotSupported { .. }))
                {
                    hints.push("Pick a field whose type the role accepts".to_string());
                }
                if hints.is_empty() {
                    hints.push("Check the field keys in the mapping".to_string());
                }
                hints
            }
            EaselError::Schema(SchemaError::EmptyDataset) => vec![
                "Provide at least one row".to_string(),
                "Check that the source file parsed as a list of records".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            EaselError::Schema(SchemaError::EmptyDataset) => {
                "The dataset appears to be empty. Please provide data with at least one row."
                    .to_string()
            }
            EaselError::Mapping(MappingError::Invalid { issues }) => format!(
                "The chart mapping needs attention ({} issue(s)).",
                issues.len()
            ),
            EaselError::Compile(CompileError::UnknownKind { kind }) => {
                format!("'{kind}' is not a chart type this engine can draw.")
            }
            _ => self.to_string(),
        }
    }
}

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

use crate::config::EngineConfig;
use crate::data_profiler::TypeInferencer;
use crate::data_quality::{check_data_quality, DataQualityReport};
use crate::error::{SchemaError, SchemaResult};
use crate::value::{Row, Value};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
}
impl FieldType {
    pub const ALL: [FieldType; 4] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Date,
        FieldType::Boolean,
    ];
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }
}
impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_values: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<Value>,
}
impl Field {
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            field_type,
            unique_values: None,
            sample_values: Vec::new(),
        }
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
    pub fn with_unique_values(mut self, count: usize) -> Self {
        self.unique_values = Some(count);
        self
    }
}
/// Looks a field up by key, then by display name.
pub fn find_field<'a>(fields: &'a [Field], key_or_name: &str) -> Option<&'a Field> {
    fields
        .iter()
        .find(|f| f.key == key_or_name)
        .or_else(|| fields.iter().find(|f| f.name == key_or_name))
}
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(String);
impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn from_string(id: String) -> Self {
        Self(id)
    }
}
impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
/// Serialises with a derived `rowCount`; the count is ignored when read back.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub fields: Vec<Field>,
    pub rows: Vec<Row>,
    pub created_at: DateTime<Utc>,
}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub row_count: usize,
    pub field_count: usize,
    pub string_fields: usize,
    pub number_fields: usize,
    pub date_fields: usize,
    pub boolean_fields: usize,
}
impl Dataset {
    /// Wraps already-typed fields and rows. Field keys must be unique.
    pub fn new(name: impl Into<String>, fields: Vec<Field>, rows: Vec<Row>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateField {
                    key: field.key.clone(),
                });
            }
        }
        Ok(Self {
            id: DatasetId::new(),
            name: name.into(),
            fields,
            rows,
            created_at: Utc::now(),
        })
    }
    /// Ingests raw rows: caps the row count, rewrites serial-date columns as
    /// ISO dates and infers the schema.
    pub fn from_rows(
        name: impl Into<String>,
        mut rows: Vec<Row>,
        config: &EngineConfig,
    ) -> SchemaResult<Self> {
        let name = name.into();
        if rows.len() > config.max_rows {
            warn!(
                dataset = %name,
                rows = rows.len(),
                max_rows = config.max_rows,
                "dataset truncated to row cap"
            );
            rows.truncate(config.max_rows);
        }
        let inferencer = TypeInferencer::new(config.inference.clone());
        let serial_columns = inferencer.serial_date_columns(&rows);
        if !serial_columns.is_empty() {
            info!(columns = ?serial_columns, "converting spreadsheet serial dates");
            inferencer.convert_serial_dates(&mut rows, &serial_columns);
        }
        let fields = inferencer.infer(&rows)?;
        info!(
            dataset = %name,
            rows = rows.len(),
            fields = fields.len(),
            "dataset ingested"
        );
        Self::new(name, fields, rows)
    }
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
    pub fn field(&self, key_or_name: &str) -> Option<&Field> {
        find_field(&self.fields, key_or_name)
    }
    pub fn fields_of_type(&self, field_type: FieldType) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.field_type == field_type)
    }
    pub fn quality_report(&self) -> DataQualityReport {
        check_data_quality(&self.rows)
    }
    pub fn summary(&self) -> DatasetSummary {
        let count = |t| self.fields_of_type(t).count();
        DatasetSummary {
            row_count: self.rows.len(),
            field_count: self.fields.len(),
            string_fields: count(FieldType::String),
            number_fields: count(FieldType::Number),
            date_fields: count(FieldType::Date),
            boolean_fields: count(FieldType::Boolean),
        }
    }
}
impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Dataset", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("fields", &self.fields)?;
        state.serialize_field("rows", &self.rows)?;
        state.serialize_field("rowCount", &self.row_count())?;
        state.serialize_field("createdAt", &self.created_at)?;
        state.end()
    }
}

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

//! Per-cell data-quality findings: blank cells and numbers stored as text.
use crate::value::{Row, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityIssueKind {
    /// Null, or text that is blank after trimming.
    EmptyValue,
    /// Text holding a finite number that could be stored as one.
    NumericText,
}
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    /// 1-based row position.
    pub row: usize,
    pub field: String,
    pub kind: QualityIssueKind,
    pub value: Value,
}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldQuality {
    pub key: String,
    /// Rows where the cell is null or absent.
    pub null_count: usize,
    pub empty_count: usize,
    pub numeric_text_count: usize,
    /// Distinct non-null values.
    pub unique_values: usize,
}
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityReport {
    pub total_rows: usize,
    pub issues: Vec<QualityIssue>,
    pub fields: Vec<FieldQuality>,
}
impl DataQualityReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
    pub fn field(&self, key: &str) -> Option<&FieldQuality> {
        self.fields.iter().find(|f| f.key == key)
    }
}
/// Scans every present cell in row order. Columns are reported in first-seen
/// order across all rows; a column a row lacks counts as null for that row.
pub fn check_data_quality(rows: &[Row]) -> DataQualityReport {
    let mut issues = Vec::new();
    let mut fields: IndexMap<&str, (FieldQuality, HashSet<(u8, String)>)> = IndexMap::new();
    for (index, row) in rows.iter().enumerate() {
        for (key, value) in row {
            let (quality, seen) = fields.entry(key.as_str()).or_insert_with(|| {
                let quality = FieldQuality {
                    key: key.clone(),
                    // Rows before this one lacked the column.
                    null_count: index,
                    ..FieldQuality::default()
                };
                (quality, HashSet::new())
            });
            if value.is_null() {
                quality.null_count += 1;
            } else {
                seen.insert(value.identity_key());
            }
            let kind = if value.is_missing() {
                quality.empty_count += 1;
                QualityIssueKind::EmptyValue
            } else if matches!(value, Value::Text(_)) && value.to_finite_number().is_some() {
                quality.numeric_text_count += 1;
                QualityIssueKind::NumericText
            } else {
                continue;
            };
            issues.push(QualityIssue {
                row: index + 1,
                field: key.clone(),
                kind,
                value: value.clone(),
            });
        }
        for (key, (quality, _)) in fields.iter_mut() {
            if !row.contains_key(*key) {
                quality.null_count += 1;
            }
        }
    }
    let fields: Vec<FieldQuality> = fields
        .into_values()
        .map(|(mut quality, seen)| {
            quality.unique_values = seen.len();
            quality
        })
        .collect();
    debug!(
        rows = rows.len(),
        fields = fields.len(),
        issues = issues.len(),
        "data quality checked"
    );
    DataQualityReport {
        total_rows: rows.len(),
        issues,
        fields,
    }
}

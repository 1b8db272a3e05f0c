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

//! Column type inference over sampled rows.

use crate::config::InferenceConfig;
use crate::dataset::{Field, FieldType};
use crate::error::{SchemaError, SchemaResult};
use crate::value::{is_numeric_literal, locale_cmp, parse_date_text_with, Row, Value};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
const BOOLEAN_LITERALS: &[&str] = &["true", "false", "1", "0", "yes", "no", "是", "否"];
#[derive(Debug, Clone, Default)]
pub struct TypeInferencer {
    config: InferenceConfig,
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TypeTally {
    boolean: usize,
    date: usize,
    number: usize,
    string: usize,
}
impl TypeTally {
    fn total(&self) -> usize {
        self.boolean + self.date + self.number + self.string
    }
}
impl TypeInferencer {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
    /// Infers one [`Field`] per column seen in the first `sample_size` rows.
    ///
    /// Column order follows the first row, then columns first seen later.
    /// Serial-date columns are judged on their converted values.
    pub fn infer(&self, rows: &[Row]) -> SchemaResult<Vec<Field>> {
        if self.config.sample_size == 0 {
            return Err(SchemaError::InvalidSampleSize { size: 0 });
        }
        if rows.is_empty() {
            return Err(SchemaError::EmptyDataset);
        }
        let sample = &rows[..rows.len().min(self.config.sample_size)];
        let columns = column_order(sample);
        if columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }
        let serial: HashSet<String> = self.serial_date_columns(sample).into_iter().collect();
        let fields = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let values: Vec<Value> = sample
                    .iter()
                    .filter_map(|row| row.get(column.as_str()))
                    .filter(|v| !v.is_missing())
                    .map(|v| {
                        if serial.contains(column.as_str()) {
                            self.convert_serial_value(v)
                        } else {
                            v.clone()
                        }
                    })
                    .collect();
                self.describe_column(index, column, &values)
            })
            .collect::<Vec<_>>();
        debug!(
            rows = rows.len(),
            sampled = sample.len(),
            columns = fields.len(),
            "schema inferred"
        );
        Ok(fields)
    }
    fn describe_column(&self, index: usize, column: &str, values: &[Value]) -> Field {
        let field_type = self.infer_column_type(values);
        let unique = values
            .iter()
            .map(Value::identity_key)
            .collect::<HashSet<_>>()
            .len();
        let name = if column.trim().is_empty() {
            format!("Field {}", index + 1)
        } else {
            column.to_string()
        };
        debug!(column, %field_type, unique, "column classified");
        Field {
            key: column.to_string(),
            name,
            field_type,
            unique_values: Some(unique),
            sample_values: values
                .iter()
                .take(self.config.max_sample_values)
                .cloned()
                .collect(),
        }
    }
    /// Classifies non-missing values; a share strictly above the threshold
    /// wins, checked boolean, date, number. Otherwise string.
    pub fn infer_column_type(&self, values: &[Value]) -> FieldType {
        let tally = values
            .iter()
            .filter(|v| !v.is_missing())
            .fold(TypeTally::default(), |mut tally, value| {
                match self.classify(value) {
                    FieldType::Boolean => tally.boolean += 1,
                    FieldType::Date => tally.date += 1,
                    FieldType::Number => tally.number += 1,
                    FieldType::String => tally.string += 1,
                }
                tally
            });
        let total = tally.total();
        if total == 0 {
            return FieldType::String;
        }
        #[allow(clippy::cast_precision_loss)]
        let share = |count: usize| count as f64 / total as f64;
        let threshold = self.config.type_threshold;
        if share(tally.boolean) > threshold {
            FieldType::Boolean
        } else if share(tally.date) > threshold {
            FieldType::Date
        } else if share(tally.number) > threshold {
            FieldType::Number
        } else {
            FieldType::String
        }
    }
    /// The first matching class for a single value, in priority order.
    pub fn classify(&self, value: &Value) -> FieldType {
        if is_boolean_like(value) {
            FieldType::Boolean
        } else if self.is_date_like(value) {
            FieldType::Date
        } else if is_number_like(value) {
            FieldType::Number
        } else {
            FieldType::String
        }
    }
    fn is_date_like(&self, value: &Value) -> bool {
        match value {
            Value::Date(_) => true,
            Value::Text(s) => {
                parse_date_text_with(s, self.config.date_formats.iter().map(String::as_str))
                    .is_some()
            }
            _ => false,
        }
    }
    /// Columns whose numeric values mostly fall in the spreadsheet serial-date range.
    pub fn serial_date_columns(&self, rows: &[Row]) -> Vec<String> {
        let sample = &rows[..rows.len().min(self.config.sample_size)];
        column_order(sample)
            .into_iter()
            .filter(|column| {
                let numbers: Vec<f64> = sample
                    .iter()
                    .filter_map(|row| match row.get(column.as_str()) {
                        Some(Value::Number(n)) if n.is_finite() => Some(*n),
                        _ => None,
                    })
                    .collect();
                if numbers.is_empty() {
                    return false;
                }
                let in_range = numbers.iter().filter(|n| self.in_serial_range(**n)).count();
                #[allow(clippy::cast_precision_loss)]
                let share = in_range as f64 / numbers.len() as f64;
                share >= self.config.serial_date_share
            })
            .collect()
    }
    /// Rewrites in-range serial numbers in the given columns as `YYYY-MM-DD` text.
    pub fn convert_serial_dates(&self, rows: &mut [Row], columns: &[String]) {
        for row in rows.iter_mut() {
            for column in columns {
                if let Some(cell) = row.get_mut(column.as_str()) {
                    *cell = self.convert_serial_value(cell);
                }
            }
        }
    }
    fn in_serial_range(&self, n: f64) -> bool {
        n >= self.config.serial_date_min && n <= self.config.serial_date_max
    }
    fn convert_serial_value(&self, value: &Value) -> Value {
        match value {
            Value::Number(n) if self.in_serial_range(*n) => serial_to_date(*n)
                .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
                .unwrap_or_else(|| value.clone()),
            other => other.clone(),
        }
    }
}
/// Spreadsheet serial day number to calendar date, 1899-12-30 epoch.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    #[allow(clippy::cast_possible_truncation)]
    let days = serial.floor() as i64;
    epoch.checked_add_signed(Duration::days(days))
}
/// Infers with default settings apart from the sample size, which must be positive.
pub fn infer(rows: &[Row], sample_size: usize) -> SchemaResult<Vec<Field>> {
    TypeInferencer::new(InferenceConfig {
        sample_size,
        ..InferenceConfig::default()
    })
    .infer(rows)
}
fn column_order(rows: &[Row]) -> Vec<String> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for row in rows {
        for key in row.keys() {
            seen.entry(key.as_str()).or_insert(());
        }
    }
    seen.into_keys().map(str::to_string).collect()
}
fn is_boolean_like(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => *n == 0.0 || *n == 1.0,
        Value::Text(s) => {
            let lowered = s.trim().to_lowercase();
            BOOLEAN_LITERALS.contains(&lowered.as_str())
        }
        _ => false,
    }
}
fn is_number_like(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_finite(),
        Value::Text(s) => is_numeric_literal(s),
        _ => false,
    }
}
/// Per-type summary statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldStats {
    Number {
        min: f64,
        max: f64,
        avg: f64,
        count: usize,
    },
    Date {
        min: NaiveDateTime,
        max: NaiveDateTime,
        count: usize,
    },
    Boolean {
        true_count: usize,
        false_count: usize,
        count: usize,
    },
    String {
        unique_values: usize,
        most_common: Vec<(String, usize)>,
        count: usize,
    },
}
/// Summarises the non-missing values of `field` across all rows.
///
/// Values that do not coerce to the field's type are skipped; `None` means
/// nothing usable was found.
pub fn field_stats(rows: &[Row], field: &Field) -> Option<FieldStats> {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.get(field.key.as_str()))
        .filter(|v| !v.is_missing())
        .collect();
    match field.field_type {
        FieldType::Number => {
            let numbers: Vec<f64> = values.iter().filter_map(|v| v.to_finite_number()).collect();
            if numbers.is_empty() {
                return None;
            }
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            #[allow(clippy::cast_precision_loss)]
            let avg = numbers.iter().sum::<f64>() / numbers.len() as f64;
            Some(FieldStats::Number {
                min,
                max,
                avg,
                count: numbers.len(),
            })
        }
        FieldType::Date => {
            let instants: Vec<NaiveDateTime> =
                values.iter().filter_map(|v| v.to_instant()).collect();
            let min = instants.iter().min().copied()?;
            let max = instants.iter().max().copied()?;
            Some(FieldStats::Date {
                min,
                max,
                count: instants.len(),
            })
        }
        FieldType::Boolean => {
            if values.is_empty() {
                return None;
            }
            let true_count = values.iter().filter(|v| is_truthy(v)).count();
            Some(FieldStats::Boolean {
                true_count,
                false_count: values.len() - true_count,
                count: values.len(),
            })
        }
        FieldType::String => {
            if values.is_empty() {
                return None;
            }
            let mut counts: IndexMap<String, (usize, &Value)> = IndexMap::new();
            for value in &values {
                counts.entry(value.to_category()).or_insert((0, value)).0 += 1;
            }
            let unique_values = counts.len();
            let mut ranked: Vec<(String, usize, &Value)> = counts
                .into_iter()
                .map(|(label, (count, value))| (label, count, value))
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| locale_cmp(&a.0, &b.0)));
            Some(FieldStats::String {
                unique_values,
                most_common: ranked
                    .into_iter()
                    .take(5)
                    .map(|(label, count, _)| (label, count))
                    .collect(),
                count: values.len(),
            })
        }
    }
}
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::Text(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "是"
        ),
        _ => false,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn column(values: &[Value]) -> Vec<Row> {
        values
            .iter()
            .map(|v| Row::from([("c".to_string(), v.clone())]))
            .collect()
    }
    fn texts(values: &[&str]) -> Vec<Row> {
        column(&values.iter().map(|s| Value::from(*s)).collect::<Vec<_>>())
    }
    #[test]
    fn boolean_literals_win_with_unique_count() {
        let fields = TypeInferencer::default()
            .infer(&texts(&["true", "false", "true", "1"]))
            .unwrap();
        assert_eq!(fields[0].field_type, FieldType::Boolean);
        assert_eq!(fields[0].unique_values, Some(3));
        assert_eq!(fields[0].sample_values.len(), 4);
    }
    #[test]
    fn threshold_is_strict() {
        let inferencer = TypeInferencer::default();
        let mut values: Vec<Value> = (2..9).map(|n| Value::Number(f64::from(n))).collect();
        values.extend(["a", "b", "c"].iter().map(|s| Value::from(*s)));
        assert_eq!(inferencer.infer_column_type(&values), FieldType::String);
        values.push(Value::Number(42.0));
        assert_eq!(inferencer.infer_column_type(&values), FieldType::Number);
    }
    #[test]
    fn dates_beat_numbers_and_missing_is_ignored() {
        let rows = texts(&["2024-01-01", "2024-02-01", "", "03/01/2024"]);
        let fields = infer(&rows, 1000).unwrap();
        assert_eq!(fields[0].field_type, FieldType::Date);
        assert_eq!(fields[0].unique_values, Some(3));
    }
    #[test]
    fn all_missing_column_is_string() {
        let fields = infer(&column(&[Value::Null, Value::from("  ")]), 10).unwrap();
        assert_eq!(fields[0].field_type, FieldType::String);
        assert_eq!(fields[0].unique_values, Some(0));
    }
    #[test]
    fn sample_size_bounds_inspection() {
        let mut rows = texts(&["x", "y"]);
        rows.extend(texts(&["1.5"; 10]));
        assert_eq!(infer(&rows, 2).unwrap()[0].field_type, FieldType::String);
        assert_eq!(infer(&rows, 12).unwrap()[0].field_type, FieldType::Number);
    }
    #[test]
    fn zero_sample_size_is_rejected() {
        let rows = texts(&["1", "2"]);
        assert_eq!(
            infer(&rows, 0).unwrap_err(),
            SchemaError::InvalidSampleSize { size: 0 }
        );
        assert!(infer(&rows, 1).is_ok());
    }
    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(infer(&[], 10).unwrap_err(), SchemaError::EmptyDataset);
        assert_eq!(infer(&[Row::new()], 10).unwrap_err(), SchemaError::NoColumns);
    }
    #[test]
    fn serial_numbers_become_dates() {
        let inferencer = TypeInferencer::default();
        let mut rows = column(&[
            Value::Number(45292.0),
            Value::Number(45323.0),
            Value::Number(45352.0),
            Value::Number(45383.0),
            Value::Number(7.0),
        ]);
        let columns = inferencer.serial_date_columns(&rows);
        assert_eq!(columns, vec!["c".to_string()]);
        inferencer.convert_serial_dates(&mut rows, &columns);
        assert_eq!(rows[1]["c"], Value::from("2024-02-01"));
        assert_eq!(rows[4]["c"], Value::Number(7.0));
        assert_eq!(inferencer.infer(&rows).unwrap()[0].field_type, FieldType::Date);
    }
    #[test]
    fn serial_share_below_cutoff_leaves_numbers() {
        let rows = column(&[
            Value::Number(45292.0),
            Value::Number(3.0),
            Value::Number(4.0),
        ]);
        assert!(TypeInferencer::default().serial_date_columns(&rows).is_empty());
    }
    #[test]
    fn blank_column_names_get_positional_labels() {
        let rows = vec![Row::from([
            ("a".to_string(), Value::from(1)),
            (String::new(), Value::from("x")),
        ])];
        let fields = infer(&rows, 10).unwrap();
        assert_eq!(fields[1].name, "Field 2");
        assert_eq!(fields[1].key, "");
    }
    #[test]
    fn stats_follow_field_type() {
        let rows = texts(&["10", "20", "oops", "30"]);
        let field = Field::new("c", FieldType::Number);
        match field_stats(&rows, &field) {
            Some(FieldStats::Number { min, max, avg, count }) => {
                assert_eq!((min, max, avg, count), (10.0, 30.0, 20.0, 3));
            }
            other => panic!("unexpected stats {other:?}"),
        }
        let rows = texts(&["b", "a", "b", "c", "b", "a"]);
        let field = Field::new("c", FieldType::String);
        match field_stats(&rows, &field) {
            Some(FieldStats::String { unique_values, most_common, .. }) => {
                assert_eq!(unique_values, 3);
                assert_eq!(most_common[0], ("b".to_string(), 3));
                assert_eq!(most_common[1], ("a".to_string(), 2));
            }
            other => panic!("unexpected stats {other:?}"),
        }
    }
}

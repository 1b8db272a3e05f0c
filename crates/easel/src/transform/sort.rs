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

use crate::dataset::{Field, FieldType};
use crate::error::{TransformError, TransformResult};
use crate::value::{ColumnOrdering, Row, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}
impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    #[serde(default, alias = "direction")]
    pub order: SortOrder,
    /// Compares display strings with digit runs read as numbers.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub natural: bool,
}
impl SortClause {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
            natural: false,
        }
    }
    pub fn natural(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            natural: true,
            ..Self::new(field, order)
        }
    }
}
pub fn check_sort(clauses: &[SortClause]) -> TransformResult<()> {
    match clauses.iter().position(|c| c.field.trim().is_empty()) {
        Some(index) => Err(TransformError::EmptySortField { index }),
        None => Ok(()),
    }
}
fn cell<'r>(row: &'r Row, field: &str) -> &'r Value {
    const NULL: &Value = &Value::Null;
    row.get(field).unwrap_or(NULL)
}
/// A sort key resolved against the rows it will order.
#[derive(Debug, Clone, Copy)]
pub struct SortKey<'c> {
    pub clause: &'c SortClause,
    pub ordering: ColumnOrdering,
}
pub fn resolve_keys<'c>(rows: &[&Row], clauses: &'c [SortClause]) -> Vec<SortKey<'c>> {
    clauses
        .iter()
        .map(|clause| SortKey {
            clause,
            ordering: if clause.natural {
                ColumnOrdering::Natural
            } else {
                ColumnOrdering::of(rows.iter().map(|r| cell(r, &clause.field)))
            },
        })
        .collect()
}
/// Multi-key comparison; `Desc` reverses that key's result only.
pub fn compare_rows(a: &Row, b: &Row, keys: &[SortKey<'_>]) -> Ordering {
    keys.iter()
        .map(|key| {
            let field = key.clause.field.as_str();
            let ordering = key.ordering.compare(cell(a, field), cell(b, field));
            match key.clause.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
/// Stable sort; full ties keep their input order. Columns mixing value kinds
/// compare as text.
pub fn apply_sort(rows: &mut [&Row], clauses: &[SortClause]) {
    if clauses.is_empty() {
        return;
    }
    let keys = resolve_keys(rows, clauses);
    rows.sort_by(|a, b| compare_rows(a, b, &keys));
}
/// Newest date first, then largest number, then text A to Z.
pub fn sort_suggestions(fields: &[Field]) -> Vec<SortClause> {
    [
        (FieldType::Date, SortOrder::Desc),
        (FieldType::Number, SortOrder::Desc),
        (FieldType::String, SortOrder::Asc),
    ]
    .into_iter()
    .filter_map(|(field_type, order)| {
        fields
            .iter()
            .find(|f| f.field_type == field_type)
            .map(|f| SortClause::new(f.key.clone(), order))
    })
    .collect()
}
/// Sorts by [`sort_suggestions`] for the given fields; no suggestion leaves
/// the order untouched.
pub fn smart_sort(rows: &mut [&Row], fields: &[Field]) {
    apply_sort(rows, &sort_suggestions(fields));
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::row_from_json;
    use serde_json::json;
    fn rows(values: serde_json::Value) -> Vec<Row> {
        values
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(row_from_json)
            .collect()
    }
    #[test]
    fn full_ties_keep_input_order() {
        let data = rows(json!([{"a": 1, "b": 1}, {"a": 1, "b": 2}]));
        let mut view: Vec<&Row> = data.iter().collect();
        apply_sort(&mut view, &[SortClause::new("a", SortOrder::Asc)]);
        assert_eq!(view[0]["b"], Value::Number(1.0));
        apply_sort(&mut view, &[SortClause::new("a", SortOrder::Desc)]);
        assert_eq!(view[0]["b"], Value::Number(1.0));
    }
    #[test]
    fn later_keys_break_ties() {
        let data = rows(json!([
            {"g": "b", "v": 1},
            {"g": "a", "v": 2},
            {"g": "b", "v": 3},
            {"g": null, "v": 4}
        ]));
        let mut view: Vec<&Row> = data.iter().collect();
        apply_sort(
            &mut view,
            &[
                SortClause::new("g", SortOrder::Asc),
                SortClause::new("v", SortOrder::Desc),
            ],
        );
        let order: Vec<f64> = view.iter().filter_map(|r| r["v"].to_finite_number()).collect();
        assert_eq!(order, vec![4.0, 2.0, 3.0, 1.0]);
    }
    #[test]
    fn missing_columns_sort_first() {
        let data = rows(json!([{"v": 2}, {"w": 1}, {"v": 1}]));
        let mut view: Vec<&Row> = data.iter().collect();
        apply_sort(&mut view, &[SortClause::new("v", SortOrder::Asc)]);
        assert!(view[0].get("v").is_none());
    }
    #[test]
    fn mixed_columns_compare_as_text() {
        let data = rows(json!([{"v": 9}, {"v": "10"}, {"v": 10}, {"v": null}]));
        let mut view: Vec<&Row> = data.iter().collect();
        apply_sort(&mut view, &[SortClause::new("v", SortOrder::Asc)]);
        let labels: Vec<String> = view.iter().map(|r| r["v"].to_category()).collect();
        assert_eq!(labels, vec!["", "10", "10", "9"]);
        assert_eq!(view[1]["v"], Value::from("10"));
    }
    #[test]
    fn direction_alias_and_blank_field() {
        let clause: SortClause =
            serde_json::from_value(json!({"field": "v", "direction": "desc"})).unwrap();
        assert_eq!(clause.order, SortOrder::Desc);
        assert_eq!(
            check_sort(&[clause, SortClause::new("", SortOrder::Asc)]).unwrap_err(),
            TransformError::EmptySortField { index: 1 }
        );
    }
    #[test]
    fn natural_keys_read_embedded_numbers() {
        let data = rows(json!([
            {"file": "v10.txt"},
            {"file": "v9.txt"},
            {"file": null},
            {"file": "v9.txt", "n": 2},
            {"file": 1}
        ]));
        let mut view: Vec<&Row> = data.iter().collect();
        apply_sort(&mut view, &[SortClause::natural("file", SortOrder::Asc)]);
        let files: Vec<String> = view.iter().map(|r| r["file"].to_category()).collect();
        assert_eq!(files, vec!["", "1", "v9.txt", "v9.txt", "v10.txt"]);
        assert!(view[3].contains_key("n"));
        apply_sort(&mut view, &[SortClause::new("file", SortOrder::Asc)]);
        assert_eq!(view[4]["file"], Value::from("v9.txt"));
        let clause: SortClause =
            serde_json::from_value(json!({"field": "file", "natural": true})).unwrap();
        assert_eq!(clause, SortClause::natural("file", SortOrder::Asc));
    }
    #[test]
    fn smart_sort_uses_suggestions() {
        let data = rows(json!([
            {"name": "b", "amount": 1},
            {"name": "a", "amount": 5},
            {"name": "c", "amount": 5}
        ]));
        let fields = vec![
            Field::new("name", FieldType::String),
            Field::new("amount", FieldType::Number),
        ];
        let mut view: Vec<&Row> = data.iter().collect();
        smart_sort(&mut view, &fields);
        let names: Vec<String> = view.iter().map(|r| r["name"].to_category()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }
    #[test]
    fn suggestions_follow_type_priority() {
        let fields = vec![
            Field::new("name", FieldType::String),
            Field::new("amount", FieldType::Number),
            Field::new("day", FieldType::Date),
        ];
        let keys: Vec<(String, SortOrder)> = sort_suggestions(&fields)
            .into_iter()
            .map(|c| (c.field, c.order))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("day".to_string(), SortOrder::Desc),
                ("amount".to_string(), SortOrder::Desc),
                ("name".to_string(), SortOrder::Asc)
            ]
        );
    }
}

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

use crate::error::{TransformError, TransformResult};
use crate::value::{locale_cmp, loose_eq, sort_values, Row, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
/// Wire operators. UI spellings are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[serde(alias = "equals", alias = "==")]
    Eq,
    #[serde(alias = "not_equals", alias = "notEquals", alias = "!=")]
    Ne,
    #[serde(alias = "greater_than", alias = "greaterThan", alias = ">")]
    Gt,
    #[serde(alias = "less_than", alias = "lessThan", alias = "<")]
    Lt,
    #[serde(alias = "greater_equal", alias = "greaterEqual", alias = ">=")]
    Ge,
    #[serde(alias = "less_equal", alias = "lessEqual", alias = "<=")]
    Le,
    In,
    #[serde(alias = "not_in", alias = "notIn")]
    NotIn,
    Contains,
    #[serde(alias = "not_contains", alias = "notContains")]
    NotContains,
    Between,
}
impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Ge => "ge",
            FilterOperator::Le => "le",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notin",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notcontains",
            FilterOperator::Between => "between",
        };
        f.write_str(name)
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterOperand {
    List(Vec<Value>),
    Scalar(Value),
}
impl Default for FilterOperand {
    fn default() -> Self {
        FilterOperand::Scalar(Value::Null)
    }
}
impl From<Value> for FilterOperand {
    fn from(value: Value) -> Self {
        FilterOperand::Scalar(value)
    }
}
impl From<Vec<Value>> for FilterOperand {
    fn from(values: Vec<Value>) -> Self {
        FilterOperand::List(values)
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: FilterOperand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
}
impl FilterClause {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: FilterOperand::Scalar(value.into()),
            value2: None,
        }
    }
    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Between,
            value: FilterOperand::Scalar(low.into()),
            value2: Some(high.into()),
        }
    }
    pub fn one_of(field: impl Into<String>, values: Vec<Value>, exclude: bool) -> Self {
        Self {
            field: field.into(),
            operator: if exclude {
                FilterOperator::NotIn
            } else {
                FilterOperator::In
            },
            value: FilterOperand::List(values),
            value2: None,
        }
    }
    /// Lowers the clause onto the core predicate set.
    pub fn compile(&self, index: usize) -> TransformResult<CompiledPredicate> {
        if self.field.trim().is_empty() {
            return Err(TransformError::EmptyClauseField { index });
        }
        let field = self.field.clone();
        let scalar = || match &self.value {
            FilterOperand::Scalar(v) => Ok(v.clone()),
            FilterOperand::List(_) => Err(TransformError::ExpectedScalar {
                field: self.field.clone(),
                operator: self.operator.to_string(),
            }),
        };
        let predicate = match self.operator {
            FilterOperator::Eq | FilterOperator::Ne => CompiledPredicate::Equals {
                field,
                operand: scalar()?,
                negated: self.operator == FilterOperator::Ne,
            },
            FilterOperator::Gt => CompiledPredicate::range(field, RangeOp::Gt, scalar()?),
            FilterOperator::Lt => CompiledPredicate::range(field, RangeOp::Lt, scalar()?),
            FilterOperator::Ge => CompiledPredicate::range(field, RangeOp::Ge, scalar()?),
            FilterOperator::Le => CompiledPredicate::range(field, RangeOp::Le, scalar()?),
            FilterOperator::In | FilterOperator::NotIn => match &self.value {
                FilterOperand::List(values) => CompiledPredicate::Member {
                    field,
                    set: values.clone(),
                    negated: self.operator == FilterOperator::NotIn,
                },
                FilterOperand::Scalar(_) => {
                    return Err(TransformError::ExpectedList {
                        field,
                        operator: self.operator.to_string(),
                    })
                }
            },
            FilterOperator::Contains | FilterOperator::NotContains => CompiledPredicate::Contains {
                field,
                needle: scalar()?.to_category(),
                negated: self.operator == FilterOperator::NotContains,
            },
            FilterOperator::Between => {
                let high = self
                    .value2
                    .clone()
                    .filter(|v| !v.is_null())
                    .ok_or_else(|| TransformError::MissingSecondOperand {
                        field: field.clone(),
                    })?;
                let low = scalar()?;
                CompiledPredicate::And(
                    Box::new(CompiledPredicate::range(field.clone(), RangeOp::Ge, low)),
                    Box::new(CompiledPredicate::range(field, RangeOp::Le, high)),
                )
            }
        };
        Ok(predicate)
    }
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    #[serde(alias = "AND")]
    And,
    #[serde(alias = "OR")]
    Or,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Lt,
    Ge,
    Le,
}
impl RangeOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            RangeOp::Gt => ordering == Ordering::Greater,
            RangeOp::Lt => ordering == Ordering::Less,
            RangeOp::Ge => ordering != Ordering::Less,
            RangeOp::Le => ordering != Ordering::Greater,
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOutcome {
    Pass,
    Fail,
    /// The cell could not be coerced for the comparison.
    Malformed,
}
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledPredicate {
    Equals {
        field: String,
        operand: Value,
        negated: bool,
    },
    Range {
        field: String,
        op: RangeOp,
        operand: Value,
    },
    Member {
        field: String,
        set: Vec<Value>,
        negated: bool,
    },
    Contains {
        field: String,
        needle: String,
        negated: bool,
    },
    And(Box<CompiledPredicate>, Box<CompiledPredicate>),
}
fn verdict(passed: bool) -> PredicateOutcome {
    if passed {
        PredicateOutcome::Pass
    } else {
        PredicateOutcome::Fail
    }
}
impl CompiledPredicate {
    fn range(field: String, op: RangeOp, operand: Value) -> Self {
        CompiledPredicate::Range { field, op, operand }
    }
    /// A null or absent cell fails positive and range predicates and passes
    /// the negated ones; it is never malformed.
    pub fn evaluate(&self, row: &Row) -> PredicateOutcome {
        let cell = |field: &str| row.get(field).filter(|v| !v.is_null());
        match self {
            CompiledPredicate::Equals {
                field,
                operand,
                negated,
            } => match cell(field.as_str()) {
                Some(v) => verdict(loose_eq(v, operand) != *negated),
                None => verdict(*negated),
            },
            CompiledPredicate::Range { field, op, operand } => match cell(field.as_str()) {
                Some(v) => compare_range(v, *op, operand),
                None => PredicateOutcome::Fail,
            },
            CompiledPredicate::Member {
                field,
                set,
                negated,
            } => match cell(field.as_str()) {
                Some(v) => verdict(set.iter().any(|candidate| loose_eq(v, candidate)) != *negated),
                None => verdict(*negated),
            },
            CompiledPredicate::Contains {
                field,
                needle,
                negated,
            } => match cell(field.as_str()) {
                Some(v) => verdict(v.to_category().contains(needle.as_str()) != *negated),
                None => verdict(*negated),
            },
            CompiledPredicate::And(left, right) => {
                match (left.evaluate(row), right.evaluate(row)) {
                    (PredicateOutcome::Malformed, _) | (_, PredicateOutcome::Malformed) => {
                        PredicateOutcome::Malformed
                    }
                    (PredicateOutcome::Pass, PredicateOutcome::Pass) => PredicateOutcome::Pass,
                    _ => PredicateOutcome::Fail,
                }
            }
        }
    }
}
/// Numeric when the operand reads as a number, by instant when it reads as a
/// date, else textual. A cell that cannot follow a numeric or date operand
/// is malformed.
fn compare_range(cell: &Value, op: RangeOp, operand: &Value) -> PredicateOutcome {
    let ordering = if let Some(target) = operand.to_finite_number() {
        match cell.to_finite_number() {
            Some(v) => v.total_cmp(&target),
            None => return PredicateOutcome::Malformed,
        }
    } else if let Some(target) = operand.to_instant() {
        match cell.to_instant() {
            Some(v) => v.cmp(&target),
            None => return PredicateOutcome::Malformed,
        }
    } else {
        locale_cmp(&cell.to_category(), &operand.to_category())
    };
    if op.holds(ordering) {
        PredicateOutcome::Pass
    } else {
        PredicateOutcome::Fail
    }
}
pub fn compile_filters(clauses: &[FilterClause]) -> TransformResult<Vec<CompiledPredicate>> {
    clauses
        .iter()
        .enumerate()
        .map(|(index, clause)| clause.compile(index))
        .collect()
}
/// Keeps matching rows in order. Rows dropped because a cell could not be
/// coerced are counted once each.
pub fn apply_filter<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    predicates: &[CompiledPredicate],
    logic: LogicalOperator,
) -> (Vec<&'a Row>, usize) {
    let mut ignored = 0;
    let mut kept = Vec::new();
    for row in rows {
        if predicates.is_empty() {
            kept.push(row);
            continue;
        }
        let outcomes: Vec<PredicateOutcome> = predicates.iter().map(|p| p.evaluate(row)).collect();
        let passed = match logic {
            LogicalOperator::And => outcomes.iter().all(|o| *o == PredicateOutcome::Pass),
            LogicalOperator::Or => outcomes.iter().any(|o| *o == PredicateOutcome::Pass),
        };
        if passed {
            kept.push(row);
        } else if outcomes.contains(&PredicateOutcome::Malformed) {
            ignored += 1;
        }
    }
    (kept, ignored)
}
pub fn text_search_filter(field: impl Into<String>, text: impl Into<String>) -> FilterClause {
    FilterClause::new(field, FilterOperator::Contains, Value::Text(text.into()))
}
pub fn range_filter(field: &str, min: Option<f64>, max: Option<f64>) -> Vec<FilterClause> {
    let mut clauses = Vec::new();
    if let Some(min) = min {
        clauses.push(FilterClause::new(field, FilterOperator::Ge, min));
    }
    if let Some(max) = max {
        clauses.push(FilterClause::new(field, FilterOperator::Le, max));
    }
    clauses
}
pub fn date_range_filter(
    field: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<FilterClause> {
    let mut clauses = Vec::new();
    if let Some(start) = start {
        clauses.push(FilterClause::new(field, FilterOperator::Ge, start));
    }
    if let Some(end) = end {
        clauses.push(FilterClause::new(field, FilterOperator::Le, end));
    }
    clauses
}
/// Distinct non-null values of a column, sorted, for building filter choices.
pub fn distinct_values(rows: &[Row], field: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut values: Vec<Value> = rows
        .iter()
        .filter_map(|row| row.get(field))
        .filter(|v| !v.is_null())
        .filter(|v| seen.insert(v.identity_key()))
        .cloned()
        .collect();
    sort_values(&mut values);
    values
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::row_from_json;
    use serde_json::json;
    fn rows() -> Vec<Row> {
        [
            json!({"m": "Jan", "region": "E", "sales": 100}),
            json!({"m": "Jan", "region": "W", "sales": 50}),
            json!({"m": "Feb", "region": "E", "sales": 80}),
            json!({"m": "Mar", "region": "W", "sales": "n/a"}),
            json!({"m": "Mar", "region": null, "sales": 70}),
        ]
        .into_iter()
        .filter_map(row_from_json)
        .collect()
    }
    fn run(clauses: &[FilterClause], logic: LogicalOperator) -> (Vec<String>, usize) {
        let data = rows();
        let predicates = compile_filters(clauses).unwrap();
        let (kept, ignored) = apply_filter(&data, &predicates, logic);
        let labels = kept
            .iter()
            .map(|r| format!("{}/{}", r["m"].to_category(), r["region"].to_category()))
            .collect();
        (labels, ignored)
    }
    #[test]
    fn greater_than_counts_uncoercible_cells() {
        let (kept, ignored) = run(
            &[FilterClause::new("sales", FilterOperator::Gt, 60)],
            LogicalOperator::And,
        );
        assert_eq!(kept, vec!["Jan/E", "Feb/E", "Mar/"]);
        assert_eq!(ignored, 1);
    }
    #[test]
    fn wire_synonyms_deserialise() {
        let wire = json!({"field": "sales", "operator": "greater_than", "value": 60});
        let clause: FilterClause = serde_json::from_value(wire).unwrap();
        assert_eq!(clause.operator, FilterOperator::Gt);
        let clause: FilterClause =
            serde_json::from_value(json!({"field": "m", "operator": "not_in", "value": ["Jan"]}))
                .unwrap();
        assert_eq!(clause.value, FilterOperand::List(vec![Value::from("Jan")]));
    }
    #[test]
    fn between_is_inclusive_and_needs_upper_bound() {
        let (kept, _) = run(&[FilterClause::between("sales", 50, 80)], LogicalOperator::And);
        assert_eq!(kept, vec!["Jan/W", "Feb/E", "Mar/"]);
        let mut open = FilterClause::between("sales", 50, 80);
        open.value2 = None;
        assert_eq!(
            open.compile(0).unwrap_err(),
            TransformError::MissingSecondOperand {
                field: "sales".into()
            }
        );
    }
    #[test]
    fn membership_requires_a_list() {
        let clause = FilterClause::new("m", FilterOperator::In, "Jan");
        assert!(matches!(
            clause.compile(0),
            Err(TransformError::ExpectedList { .. })
        ));
        let (kept, _) = run(
            &[FilterClause::one_of("m", vec!["Feb".into(), "Mar".into()], true)],
            LogicalOperator::And,
        );
        assert_eq!(kept, vec!["Jan/E", "Jan/W"]);
    }
    #[test]
    fn null_cells_pass_only_negated_operators() {
        let (kept, ignored) = run(
            &[FilterClause::new("region", FilterOperator::Ne, "E")],
            LogicalOperator::And,
        );
        assert_eq!(kept, vec!["Jan/W", "Mar/W", "Mar/"]);
        assert_eq!(ignored, 0);
        let (kept, _) = run(
            &[FilterClause::one_of("region", vec!["E".into()], true)],
            LogicalOperator::And,
        );
        assert_eq!(kept, vec!["Jan/W", "Mar/W", "Mar/"]);
        let (kept, _) = run(
            &[FilterClause::new("region", FilterOperator::NotContains, "W")],
            LogicalOperator::And,
        );
        assert_eq!(kept, vec!["Jan/E", "Feb/E", "Mar/"]);
        let (kept, ignored) = run(
            &[FilterClause::new("region", FilterOperator::Eq, "W")],
            LogicalOperator::And,
        );
        assert_eq!(kept, vec!["Jan/W", "Mar/W"]);
        assert_eq!(ignored, 0);
        let (kept, _) = run(
            &[FilterClause::new("region", FilterOperator::Contains, "")],
            LogicalOperator::And,
        );
        assert_eq!(kept.len(), 4);
        let (kept, _) = run(
            &[FilterClause::new("missing", FilterOperator::Ne, 1)],
            LogicalOperator::And,
        );
        assert_eq!(kept.len(), 5);
    }
    #[test]
    fn or_logic_keeps_any_match() {
        let (kept, ignored) = run(
            &[
                FilterClause::new("m", FilterOperator::Eq, "Feb"),
                text_search_filter("region", "W"),
            ],
            LogicalOperator::Or,
        );
        assert_eq!(kept, vec!["Jan/W", "Feb/E", "Mar/W"]);
        assert_eq!(ignored, 0);
    }
    #[test]
    fn empty_field_is_rejected() {
        let clause = FilterClause::new(" ", FilterOperator::Eq, 1);
        assert_eq!(
            compile_filters(&[clause]).unwrap_err(),
            TransformError::EmptyClauseField { index: 0 }
        );
    }
    #[test]
    fn date_ranges_compare_instants() {
        let data: Vec<Row> = ["2024-01-15", "2024-03-01", "soon"]
            .into_iter()
            .map(|d| Row::from([("d".to_string(), Value::from(d))]))
            .collect();
        let clauses = date_range_filter("d", NaiveDate::from_ymd_opt(2024, 2, 1), None);
        let predicates = compile_filters(&clauses).unwrap();
        let (kept, ignored) = apply_filter(&data, &predicates, LogicalOperator::And);
        assert_eq!(kept.len(), 1);
        assert_eq!(ignored, 1);
    }
    #[test]
    fn distinct_values_are_sorted() {
        let values = distinct_values(&rows(), "region");
        assert_eq!(values, vec![Value::from("E"), Value::from("W")]);
    }
}

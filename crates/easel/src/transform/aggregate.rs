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
use crate::value::{Row, Value};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
/// Joins group-key parts; a unit separator does not occur in tabular text.
const KEY_SEPARATOR: char = '\u{1f}';
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    #[default]
    Sum,
    #[serde(alias = "average", alias = "mean")]
    Avg,
    Min,
    Max,
    Count,
    First,
    Last,
}
impl AggregateFunction {
    /// Functions that read the cell as a number and ignore what does not coerce.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            AggregateFunction::Sum
                | AggregateFunction::Avg
                | AggregateFunction::Min
                | AggregateFunction::Max
        )
    }
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Count => "count",
            AggregateFunction::First => "first",
            AggregateFunction::Last => "last",
        }
    }
}
impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
/// One extra output column of a grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub field: String,
    #[serde(default, alias = "function")]
    pub op: AggregateFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}
impl Aggregation {
    pub fn new(field: impl Into<String>, op: AggregateFunction) -> Self {
        Self {
            field: field.into(),
            op,
            alias: None,
        }
    }
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
    /// The alias, else `<op>_<field>`.
    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.op, self.field))
    }
}
/// Group-by settings.
///
/// The single-measure form (`field`, `op`, `alias`) writes its result under
/// the field's own name; `aggregations` adds further columns next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateConfig {
    #[serde(default, alias = "groupFields", skip_serializing_if = "Vec::is_empty")]
    pub by: Vec<String>,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub op: AggregateFunction,
    /// Output column name; the aggregated field's own name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<Aggregation>,
    /// Adds a column with the number of rows in each group under this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_as: Option<String>,
}
/// A resolved output column.
struct Measure<'c> {
    name: String,
    field: &'c str,
    op: AggregateFunction,
}
impl AggregateConfig {
    pub fn sum(field: impl Into<String>, by: Vec<String>) -> Self {
        Self {
            by,
            field: field.into(),
            op: AggregateFunction::Sum,
            alias: None,
            aggregations: Vec::new(),
            count_as: None,
        }
    }
    /// Several measures per group and no single-measure column.
    pub fn multi(by: Vec<String>, aggregations: Vec<Aggregation>) -> Self {
        Self {
            aggregations,
            ..Self::sum(String::new(), by)
        }
    }
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }
    pub fn with_count(mut self, name: impl Into<String>) -> Self {
        self.count_as = Some(name.into());
        self
    }
    pub fn check(&self) -> TransformResult<()> {
        if self.field.trim().is_empty() && self.aggregations.is_empty() {
            return Err(TransformError::MissingAggregateField);
        }
        if let Some(index) = self.by.iter().position(|k| k.trim().is_empty()) {
            return Err(TransformError::EmptyGroupField { index });
        }
        if let Some(index) = self
            .aggregations
            .iter()
            .position(|a| a.field.trim().is_empty())
        {
            return Err(TransformError::EmptyAggregationField { index });
        }
        let mut names: IndexSet<String> = self.by.iter().cloned().collect();
        let produced = self
            .measures()
            .into_iter()
            .map(|m| m.name)
            .chain(self.count_as.clone());
        for name in produced {
            if !names.insert(name.clone()) {
                return Err(TransformError::DuplicateAggregateOutput { name });
            }
        }
        Ok(())
    }
    /// Column written by the single-measure form.
    pub fn output_field(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }
    /// Every output column name after the group values, in order.
    pub fn output_columns(&self) -> Vec<String> {
        self.measures()
            .into_iter()
            .map(|m| m.name)
            .chain(self.count_as.clone())
            .collect()
    }
    fn measures(&self) -> Vec<Measure<'_>> {
        let primary = (!self.field.trim().is_empty()).then(|| Measure {
            name: self.output_field().to_string(),
            field: self.field.as_str(),
            op: self.op,
        });
        primary
            .into_iter()
            .chain(self.aggregations.iter().map(|a| Measure {
                name: a.output_name(),
                field: a.field.as_str(),
                op: a.op,
            }))
            .collect()
    }
}
#[derive(Debug, Clone, Default)]
pub(crate) struct Accumulator {
    sum: f64,
    numeric: usize,
    min: Option<f64>,
    max: Option<f64>,
    present: usize,
    first: Option<Value>,
    last: Option<Value>,
}
impl Accumulator {
    /// Returns false when a numeric function could not use the cell.
    pub(crate) fn push(&mut self, op: AggregateFunction, cell: Option<&Value>) -> bool {
        let cell = cell.filter(|v| !v.is_missing());
        if let Some(value) = cell {
            self.present += 1;
            if self.first.is_none() {
                self.first = Some(value.clone());
            }
            if op == AggregateFunction::Last {
                self.last = Some(value.clone());
            }
        }
        if !op.is_numeric() {
            return true;
        }
        match cell.and_then(Value::to_finite_number) {
            Some(n) => {
                self.sum += n;
                self.numeric += 1;
                self.min = Some(self.min.map_or(n, |m| m.min(n)));
                self.max = Some(self.max.map_or(n, |m| m.max(n)));
                true
            }
            None => false,
        }
    }
    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> Option<f64> {
        (self.numeric > 0).then(|| self.sum / self.numeric as f64)
    }
    pub(crate) fn finish(self, op: AggregateFunction) -> Value {
        match op {
            AggregateFunction::Sum => Value::Number(self.sum),
            AggregateFunction::Avg => self.mean().map_or(Value::Null, Value::Number),
            AggregateFunction::Min => self.min.map_or(Value::Null, Value::Number),
            AggregateFunction::Max => self.max.map_or(Value::Null, Value::Number),
            #[allow(clippy::cast_precision_loss)]
            AggregateFunction::Count => Value::Number(self.present as f64),
            AggregateFunction::First => self.first.unwrap_or_default(),
            AggregateFunction::Last => self.last.unwrap_or_default(),
        }
    }
}
struct Group {
    by_values: Vec<Value>,
    accs: Vec<Accumulator>,
    rows: usize,
}
pub(crate) fn group_key(row: &Row, by: &[String]) -> String {
    let mut key = String::new();
    for (i, field) in by.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&row.get(field.as_str()).map(Value::to_category).unwrap_or_default());
    }
    key
}
/// One output row per group in first-seen order, carrying the group's
/// original values and then every measure. Returns the rows and the number
/// of rows that had at least one cell a numeric measure could not use.
pub fn apply_aggregate<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    config: &AggregateConfig,
) -> (Vec<Row>, usize) {
    let measures = config.measures();
    let fresh = |by_values: Vec<Value>| Group {
        by_values,
        accs: vec![Accumulator::default(); measures.len()],
        rows: 0,
    };
    let mut ignored = 0;
    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for row in rows {
        let group = groups
            .entry(group_key(row, &config.by))
            .or_insert_with(|| {
                fresh(
                    config
                        .by
                        .iter()
                        .map(|k| row.get(k.as_str()).cloned().unwrap_or_default())
                        .collect(),
                )
            });
        group.rows += 1;
        let mut usable = true;
        for (acc, measure) in group.accs.iter_mut().zip(&measures) {
            usable &= acc.push(measure.op, row.get(measure.field));
        }
        if !usable {
            ignored += 1;
        }
    }
    if groups.is_empty() && config.by.is_empty() {
        groups.insert(String::new(), fresh(Vec::new()));
    }
    let rows = groups
        .into_values()
        .map(|group| {
            let mut out: Row = config
                .by
                .iter()
                .cloned()
                .zip(group.by_values)
                .collect();
            for (acc, measure) in group.accs.into_iter().zip(&measures) {
                out.insert(measure.name.clone(), acc.finish(measure.op));
            }
            if let Some(name) = &config.count_as {
                #[allow(clippy::cast_precision_loss)]
                out.insert(name.clone(), Value::Number(group.rows as f64));
            }
            out
        })
        .collect();
    (rows, ignored)
}
/// Summary of one value column within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub group: Value,
    /// Rows in the group, usable or not.
    pub count: usize,
    pub sum: f64,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Rows whose value did not read as a finite number.
    pub ignored: usize,
}
/// Count, sum, mean and extremes of `value_field` per distinct `group_field`,
/// in first-seen group order.
pub fn group_stats(rows: &[Row], group_field: &str, value_field: &str) -> Vec<GroupStats> {
    let by = [group_field.to_string()];
    let mut groups: IndexMap<String, (Value, usize, usize, Accumulator)> = IndexMap::new();
    for row in rows {
        let (_, count, ignored, acc) = groups.entry(group_key(row, &by)).or_insert_with(|| {
            (
                row.get(group_field).cloned().unwrap_or_default(),
                0,
                0,
                Accumulator::default(),
            )
        });
        *count += 1;
        if !acc.push(AggregateFunction::Sum, row.get(value_field)) {
            *ignored += 1;
        }
    }
    groups
        .into_values()
        .map(|(group, count, ignored, acc)| GroupStats {
            group,
            count,
            sum: acc.sum,
            avg: acc.mean(),
            min: acc.min,
            max: acc.max,
            ignored,
        })
        .collect()
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
            json!({"m": "Feb", "region": "E", "sales": "bad"}),
        ]
        .into_iter()
        .filter_map(row_from_json)
        .collect()
    }
    #[test]
    fn sums_per_group_and_counts_ignored() {
        let data = rows();
        let (out, ignored) =
            apply_aggregate(&data, &AggregateConfig::sum("sales", vec!["region".into()]));
        assert_eq!(ignored, 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["region"], Value::from("E"));
        assert_eq!(out[0]["sales"], Value::Number(180.0));
        assert_eq!(out[1]["sales"], Value::Number(50.0));
        assert_eq!(out[0].keys().collect::<Vec<_>>(), vec!["region", "sales"]);
    }
    #[test]
    fn no_grouping_yields_single_row() {
        let data = rows();
        let (out, _) = apply_aggregate(&data, &AggregateConfig::sum("sales", Vec::new()));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0]["sales"], Value::Number(230.0));
        let (empty, _) = apply_aggregate(
            Vec::<Row>::new().iter(),
            &AggregateConfig::sum("sales", Vec::new()),
        );
        assert_eq!(empty[0]["sales"], Value::Number(0.0));
    }
    #[test]
    fn other_functions() {
        let data = rows();
        let config = |op| AggregateConfig {
            op,
            ..AggregateConfig::sum("sales", vec!["m".into()])
        };
        let (avg, _) = apply_aggregate(&data, &config(AggregateFunction::Avg));
        assert_eq!(avg[0]["sales"], Value::Number(75.0));
        let (count, ignored) = apply_aggregate(&data, &config(AggregateFunction::Count));
        assert_eq!(count[1]["sales"], Value::Number(2.0));
        assert_eq!(ignored, 0);
        let (last, _) = apply_aggregate(&data, &config(AggregateFunction::Last));
        assert_eq!(last[1]["sales"], Value::from("bad"));
        let (max, _) = apply_aggregate(&data, &config(AggregateFunction::Max));
        assert_eq!(max[1]["sales"], Value::Number(80.0));
    }
    #[test]
    fn multi_key_groups_keep_typed_values() {
        let data: Vec<Row> = [
            json!({"y": 2024, "q": 1, "v": 1}),
            json!({"y": 2024, "q": 1, "v": 2}),
            json!({"y": 2024, "q": 2, "v": 3}),
        ]
        .into_iter()
        .filter_map(row_from_json)
        .collect();
        let mut config = AggregateConfig::sum("v", vec!["y".into(), "q".into()]);
        config.alias = Some("total".into());
        let (out, _) = apply_aggregate(&data, &config);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["y"], Value::Number(2024.0));
        assert_eq!(out[0]["total"], Value::Number(3.0));
    }
    #[test]
    fn several_measures_share_one_pass() {
        let data = rows();
        let config = AggregateConfig::multi(
            vec!["m".into()],
            vec![
                Aggregation::new("sales", AggregateFunction::Sum),
                Aggregation::new("sales", AggregateFunction::Max),
                Aggregation::new("region", AggregateFunction::First).with_alias("lead"),
            ],
        )
        .with_count("rows");
        assert!(config.check().is_ok());
        assert_eq!(
            config.output_columns(),
            vec!["sum_sales", "max_sales", "lead", "rows"]
        );
        let (out, ignored) = apply_aggregate(&data, &config);
        assert_eq!(ignored, 1);
        assert_eq!(
            out[1].keys().collect::<Vec<_>>(),
            vec!["m", "sum_sales", "max_sales", "lead", "rows"]
        );
        assert_eq!(out[0]["sum_sales"], Value::Number(150.0));
        assert_eq!(out[1]["max_sales"], Value::Number(80.0));
        assert_eq!(out[1]["lead"], Value::from("E"));
        assert_eq!(out[1]["rows"], Value::Number(2.0));
    }
    #[test]
    fn single_measure_stays_first_when_extended() {
        let data = rows();
        let config = AggregateConfig::sum("sales", vec!["region".into()])
            .with_aggregation(Aggregation::new("sales", AggregateFunction::Avg));
        let (out, _) = apply_aggregate(&data, &config);
        assert_eq!(out[0]["sales"], Value::Number(180.0));
        assert_eq!(out[0]["avg_sales"], Value::Number(90.0));
    }
    #[test]
    fn wire_shape_accepts_aggregation_lists() {
        let config: AggregateConfig = serde_json::from_value(json!({
            "groupFields": ["m"],
            "aggregations": [{"field": "sales", "function": "avg"}],
            "countAs": "n"
        }))
        .unwrap();
        assert_eq!(config.by, vec!["m"]);
        assert_eq!(config.aggregations[0].op, AggregateFunction::Avg);
        assert_eq!(config.output_columns(), vec!["avg_sales", "n"]);
    }
    #[test]
    fn missing_target_is_rejected() {
        let config = AggregateConfig::sum("", Vec::new());
        assert_eq!(config.check().unwrap_err(), TransformError::MissingAggregateField);
        let config =
            AggregateConfig::multi(Vec::new(), vec![Aggregation::new(" ", AggregateFunction::Sum)]);
        assert_eq!(
            config.check().unwrap_err(),
            TransformError::EmptyAggregationField { index: 0 }
        );
    }
    #[test]
    fn clashing_output_columns_are_rejected() {
        let config = AggregateConfig::sum("sales", vec!["m".into()]).with_count("m");
        assert_eq!(
            config.check().unwrap_err(),
            TransformError::DuplicateAggregateOutput { name: "m".into() }
        );
        let twice = AggregateConfig::multi(
            Vec::new(),
            vec![
                Aggregation::new("sales", AggregateFunction::Sum),
                Aggregation::new("sales", AggregateFunction::Sum),
            ],
        );
        assert!(matches!(
            twice.check(),
            Err(TransformError::DuplicateAggregateOutput { .. })
        ));
    }
    #[test]
    fn group_stats_summarise_each_group() {
        let stats = group_stats(&rows(), "region", "sales");
        assert_eq!(stats.len(), 2);
        let east = &stats[0];
        assert_eq!(east.group, Value::from("E"));
        assert_eq!(east.count, 3);
        assert_eq!(east.ignored, 1);
        assert_eq!(east.sum, 180.0);
        assert_eq!(east.avg, Some(90.0));
        assert_eq!((east.min, east.max), (Some(80.0), Some(100.0)));
        assert_eq!(stats[1].avg, Some(50.0));
    }
}

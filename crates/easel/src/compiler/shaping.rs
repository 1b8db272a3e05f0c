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

//! Row shaping shared by the per-kind builders.
//!
//! Every routine reads cells through the total coercions on [`Value`] and
//! counts the rows it had to drop instead of failing.
use super::option::{PieSlice, RadarIndicator, RadarVector};
use crate::value::{ColumnOrdering, Row, Value};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
/// Name given to rows whose series cell is missing.
pub const DEFAULT_SERIES: &str = "Default";
/// Name of the only group when no series field is mapped.
pub const SINGLE_GROUP: &str = "Data";
pub const OTHER_CATEGORY: &str = "Other";
pub const BLANK_CATEGORY: &str = "(blank)";
fn number(row: &Row, field: &str) -> Option<f64> {
    row.get(field).and_then(Value::to_finite_number)
}
fn label(row: &Row, field: &str) -> String {
    row.get(field).map(Value::to_category).unwrap_or_default()
}
fn series_label(row: &Row, field: &str) -> String {
    match row.get(field) {
        Some(v) if !v.is_missing() => v.to_category(),
        _ => DEFAULT_SERIES.to_string(),
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValues {
    pub name: String,
    pub values: Vec<f64>,
}
#[derive(Debug, Clone, PartialEq)]
pub struct XySeries {
    pub categories: Vec<String>,
    pub series: Vec<NamedValues>,
    pub ignored: usize,
}
/// Sorts axis labels by the values they came from.
///
/// All-date labels go chronologically and all-number labels numerically;
/// anything else uses the column ordering of the representative values.
fn order_categories(reps: IndexMap<String, Value>) -> Vec<String> {
    let mut entries: Vec<(String, Value)> = reps.into_iter().collect();
    let instants: Option<Vec<_>> = entries.iter().map(|(_, v)| v.to_instant()).collect();
    if let Some(instants) = instants {
        let mut keyed: Vec<_> = instants.into_iter().zip(entries).collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1 .0.cmp(&b.1 .0)));
        return keyed.into_iter().map(|(_, (name, _))| name).collect();
    }
    let numbers: Option<Vec<f64>> = entries.iter().map(|(_, v)| v.to_finite_number()).collect();
    if let Some(numbers) = numbers {
        let mut keyed: Vec<_> = numbers.into_iter().zip(entries).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1 .0.cmp(&b.1 .0)));
        return keyed.into_iter().map(|(_, (name, _))| name).collect();
    }
    let ordering = ColumnOrdering::of(entries.iter().map(|(_, v)| v));
    entries.sort_by(|a, b| ordering.compare(&a.1, &b.1).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter().map(|(name, _)| name).collect()
}
/// Sums `y` per distinct `x`, split by `series` when given.
///
/// Every series is aligned to the same sorted category list; a series with
/// nothing at some category gets 0 there. Without a series field the single
/// series is named after `y`.
pub fn build_xy_series(rows: &[Row], x: &str, y: &str, series: Option<&str>) -> XySeries {
    let mut ignored = 0;
    let mut reps: IndexMap<String, Value> = IndexMap::new();
    let mut groups: IndexMap<String, HashMap<String, f64>> = IndexMap::new();
    if series.is_none() {
        groups.insert(y.to_string(), HashMap::new());
    }
    for row in rows {
        let Some(amount) = number(row, y) else {
            ignored += 1;
            continue;
        };
        let category = label(row, x);
        reps.entry(category.clone())
            .or_insert_with(|| row.get(x).cloned().unwrap_or_default());
        let group = match series {
            Some(field) => series_label(row, field),
            None => y.to_string(),
        };
        *groups
            .entry(group)
            .or_default()
            .entry(category)
            .or_insert(0.0) += amount;
    }
    let categories = order_categories(reps);
    let series = groups
        .into_iter()
        .map(|(name, sums)| NamedValues {
            values: categories
                .iter()
                .map(|c| sums.get(c).copied().unwrap_or(0.0))
                .collect(),
            name,
        })
        .collect();
    XySeries {
        categories,
        series,
        ignored,
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct PieData {
    pub slices: Vec<PieSlice>,
    pub ignored: usize,
}
/// Sums `value` per category, largest first.
///
/// More than `top_n` categories keeps the leading `top_n - 1` and folds the
/// rest into one [`OTHER_CATEGORY`] slice holding their total.
pub fn build_pie(rows: &[Row], category: &str, value: &str, top_n: usize) -> PieData {
    let mut ignored = 0;
    let mut sums: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        let Some(amount) = number(row, value) else {
            ignored += 1;
            continue;
        };
        let name = match row.get(category) {
            Some(v) if !v.is_missing() => v.to_category(),
            _ => BLANK_CATEGORY.to_string(),
        };
        *sums.entry(name).or_insert(0.0) += amount;
    }
    let mut slices: Vec<PieSlice> = sums
        .into_iter()
        .map(|(name, value)| PieSlice { name, value })
        .collect();
    slices.sort_by(|a, b| b.value.total_cmp(&a.value));
    if slices.len() > top_n {
        let rest = slices.split_off(top_n.saturating_sub(1));
        slices.push(PieSlice {
            name: OTHER_CATEGORY.to_string(),
            value: rest.iter().map(|s| s.value).sum(),
        });
    }
    PieData { slices, ignored }
}
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterGroup {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub groups: Vec<ScatterGroup>,
    pub ignored: usize,
}
/// Coordinate pairs per series; a row missing either coordinate is dropped.
pub fn build_scatter(rows: &[Row], x: &str, y: &str, series: Option<&str>) -> ScatterData {
    let mut ignored = 0;
    let mut groups: IndexMap<String, Vec<[f64; 2]>> = IndexMap::new();
    if series.is_none() {
        groups.insert(SINGLE_GROUP.to_string(), Vec::new());
    }
    for row in rows {
        let (Some(px), Some(py)) = (number(row, x), number(row, y)) else {
            ignored += 1;
            continue;
        };
        let name = series.map_or_else(|| SINGLE_GROUP.to_string(), |f| series_label(row, f));
        groups.entry(name).or_default().push([px, py]);
    }
    ScatterData {
        groups: groups
            .into_iter()
            .map(|(name, points)| ScatterGroup { name, points })
            .collect(),
        ignored,
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct RadarData {
    pub indicators: Vec<RadarIndicator>,
    pub vectors: Vec<RadarVector>,
    pub ignored: usize,
}
/// One vector per series over the union of dimensions, in first-seen order.
/// Absent pairs are 0 and duplicates add up. Each indicator's `max` is the
/// largest value observed on that dimension.
pub fn build_radar(rows: &[Row], dimension: &str, value: &str, series: Option<&str>) -> RadarData {
    let mut ignored = 0;
    let mut dimensions: IndexSet<String> = IndexSet::new();
    let mut groups: IndexMap<String, HashMap<String, f64>> = IndexMap::new();
    if series.is_none() {
        groups.insert(SINGLE_GROUP.to_string(), HashMap::new());
    }
    for row in rows {
        let Some(amount) = number(row, value) else {
            ignored += 1;
            continue;
        };
        let dim = label(row, dimension);
        dimensions.insert(dim.clone());
        let name = series.map_or_else(|| SINGLE_GROUP.to_string(), |f| series_label(row, f));
        *groups
            .entry(name)
            .or_default()
            .entry(dim)
            .or_insert(0.0) += amount;
    }
    let vectors: Vec<RadarVector> = groups
        .into_iter()
        .map(|(name, sums)| RadarVector {
            value: dimensions
                .iter()
                .map(|d| sums.get(d).copied().unwrap_or(0.0))
                .collect(),
            name,
        })
        .collect();
    let indicators = dimensions
        .into_iter()
        .enumerate()
        .map(|(i, name)| RadarIndicator {
            max: vectors
                .iter()
                .filter_map(|v| v.value.get(i).copied())
                .fold(0.0, f64::max),
            name,
        })
        .collect();
    RadarData {
        indicators,
        vectors,
        ignored,
    }
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
    fn xy_series_align_on_sorted_union() {
        let data = rows(json!([
            {"m": "Jan", "region": "E", "sales": 100},
            {"m": "Jan", "region": "W", "sales": 50},
            {"m": "Feb", "region": "E", "sales": 80}
        ]));
        let built = build_xy_series(&data, "m", "sales", Some("region"));
        assert_eq!(built.categories, vec!["Feb", "Jan"]);
        assert_eq!(built.series[0].name, "E");
        assert_eq!(built.series[0].values, vec![80.0, 100.0]);
        assert_eq!(built.series[1].values, vec![0.0, 50.0]);
        assert_eq!(built.ignored, 0);
    }
    #[test]
    fn xy_sums_duplicates_and_drops_bad_y() {
        let data = rows(json!([
            {"x": 10, "y": 1},
            {"x": 9, "y": 2},
            {"x": 10, "y": 3},
            {"x": 2, "y": "oops"},
            {"x": 2}
        ]));
        let built = build_xy_series(&data, "x", "y", None);
        assert_eq!(built.categories, vec!["9", "10"]);
        assert_eq!(built.series.len(), 1);
        assert_eq!(built.series[0].name, "y");
        assert_eq!(built.series[0].values, vec![2.0, 4.0]);
        assert_eq!(built.ignored, 2);
    }
    #[test]
    fn date_categories_sort_chronologically() {
        let data = rows(json!([
            {"d": "12/01/2024", "v": 1},
            {"d": "02/01/2024", "v": 1},
            {"d": "11/15/2023", "v": 1}
        ]));
        let built = build_xy_series(&data, "d", "v", None);
        assert_eq!(built.categories, vec!["11/15/2023", "02/01/2024", "12/01/2024"]);
    }
    #[test]
    fn missing_series_cells_use_default_name() {
        let data = rows(json!([{"x": "a", "y": 1, "s": null}, {"x": "a", "y": 2, "s": "k"}]));
        let built = build_xy_series(&data, "x", "y", Some("s"));
        let names: Vec<&str> = built.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![DEFAULT_SERIES, "k"]);
    }
    #[test]
    fn pie_collapses_long_tail() {
        let data = rows(json!([
            {"c": "a", "v": 10},
            {"c": "b", "v": 20},
            {"c": "c", "v": 30},
            {"c": "d", "v": 40},
            {"c": "e", "v": 50}
        ]));
        let pie = build_pie(&data, "c", "v", 3);
        let values: Vec<f64> = pie.slices.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![50.0, 40.0, 60.0]);
        assert_eq!(pie.slices[2].name, OTHER_CATEGORY);
        let whole = build_pie(&data, "c", "v", 5);
        assert_eq!(whole.slices.len(), 5);
    }
    #[test]
    fn scatter_needs_both_coordinates() {
        let data = rows(json!([
            {"a": 1, "b": 2},
            {"a": "x", "b": 2},
            {"a": 3, "b": 4.5}
        ]));
        let built = build_scatter(&data, "a", "b", None);
        assert_eq!(built.groups.len(), 1);
        assert_eq!(built.groups[0].name, SINGLE_GROUP);
        assert_eq!(built.groups[0].points, vec![[1.0, 2.0], [3.0, 4.5]]);
        assert_eq!(built.ignored, 1);
    }
    #[test]
    fn radar_fills_gaps_and_tracks_maxima() {
        let data = rows(json!([
            {"dim": "speed", "v": 3, "who": "A"},
            {"dim": "power", "v": 5, "who": "A"},
            {"dim": "speed", "v": 4, "who": "B"},
            {"dim": "speed", "v": 1, "who": "B"}
        ]));
        let built = build_radar(&data, "dim", "v", Some("who"));
        let names: Vec<&str> = built.indicators.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["speed", "power"]);
        assert_eq!(built.vectors[0].value, vec![3.0, 5.0]);
        assert_eq!(built.vectors[1].value, vec![5.0, 0.0]);
        assert_eq!(built.indicators[0].max, 5.0);
        assert_eq!(built.indicators[1].max, 5.0);
    }
}

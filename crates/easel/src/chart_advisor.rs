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

use crate::chart_registry::{is_dataset_suitable, ChartKind, ChartRegistry, ChartSpec};
use crate::dataset::{Field, FieldType};
use serde::Serialize;
use tracing::debug;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSuggestion {
    pub kind: ChartKind,
    pub score: u32,
    pub reasons: Vec<String>,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartExplanation {
    pub kind: ChartKind,
    pub can_render: bool,
    pub missing_requirements: Vec<String>,
    pub available_mappings: Vec<String>,
}
/// Field-type counts the scoring table reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldHistogram {
    pub string: usize,
    pub number: usize,
    pub date: usize,
    pub boolean: usize,
    /// Smallest distinct-value count among string fields that report one.
    pub min_string_cardinality: Option<usize>,
}
impl FieldHistogram {
    pub fn from_fields(fields: &[Field]) -> Self {
        fields.iter().fold(Self::default(), |mut h, field| {
            match field.field_type {
                FieldType::String => {
                    h.string += 1;
                    if let Some(unique) = field.unique_values {
                        h.min_string_cardinality =
                            Some(h.min_string_cardinality.map_or(unique, |m| m.min(unique)));
                    }
                }
                FieldType::Number => h.number += 1,
                FieldType::Date => h.date += 1,
                FieldType::Boolean => h.boolean += 1,
            }
            h
        })
    }
    /// Some string field has at most `limit` distinct values. Without
    /// cardinality data the number of string fields stands in.
    pub fn strings_within(&self, limit: usize) -> bool {
        match self.min_string_cardinality {
            Some(unique) => unique <= limit,
            None => self.string <= limit,
        }
    }
}
struct Scorer {
    score: u32,
    reasons: Vec<String>,
}
impl Scorer {
    fn new() -> Self {
        Self {
            score: 0,
            reasons: Vec::new(),
        }
    }
    fn award(&mut self, condition: bool, points: u32, reason: &str) -> &mut Self {
        if condition {
            self.score += points;
            self.reasons.push(reason.to_string());
        }
        self
    }
}
fn score_kind(kind: ChartKind, h: &FieldHistogram) -> Scorer {
    let mut s = Scorer::new();
    let has_string = h.string > 0;
    let has_number = h.number > 0;
    match kind {
        ChartKind::Line => {
            s.award(h.date > 0 && has_number, 10, "dates with numeric measures suit a trend line")
                .award(has_string, 5, "text fields can split lines into series");
        }
        ChartKind::Bar => {
            s.award(
                has_string && has_number,
                10,
                "categories with numeric measures compare well as bars",
            )
            .award(h.strings_within(30), 5, "category count fits on a bar axis");
        }
        ChartKind::Area => {
            s.award(
                h.date > 0 && has_number,
                8,
                "dates with numeric measures show cumulative change",
            )
            .award(has_string, 3, "text fields can stack areas");
        }
        ChartKind::Scatter => {
            s.award(h.number >= 2, 10, "two or more numeric fields can be correlated")
                .award(has_string, 3, "text fields can group points");
        }
        ChartKind::Pie => {
            s.award(has_string && has_number, 8, "categories with a measure form parts of a whole")
                .award(h.strings_within(12), 5, "few enough categories for readable slices");
        }
        ChartKind::Radar => {
            s.award(has_string && has_number, 6, "categories with a measure can span radar spokes")
                .award(h.strings_within(15), 4, "dimension count fits a radar");
        }
    }
    s
}
/// Scores every satisfiable kind; unsatisfiable or zero-score kinds are dropped.
///
/// Sorted by score, ties kept in registry declaration order.
pub fn rank_charts(fields: &[Field], registry: &ChartRegistry) -> Vec<ChartSuggestion> {
    let histogram = FieldHistogram::from_fields(fields);
    let mut ranked: Vec<ChartSuggestion> = registry
        .specs()
        .iter()
        .filter(|spec| is_dataset_suitable(spec, fields))
        .filter_map(|spec| {
            let scored = score_kind(spec.kind, &histogram);
            (scored.score > 0).then(|| ChartSuggestion {
                kind: spec.kind,
                score: scored.score,
                reasons: scored.reasons,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    debug!(
        candidates = ranked.len(),
        top = ?ranked.first().map(|s| s.kind),
        "charts ranked"
    );
    ranked
}
pub fn suggest_charts_with(
    fields: &[Field],
    registry: &ChartRegistry,
    limit: usize,
) -> Vec<ChartKind> {
    rank_charts(fields, registry)
        .into_iter()
        .take(limit)
        .map(|s| s.kind)
        .collect()
}
/// Top three kinds for the dataset against the built-in catalogue.
pub fn suggest_charts_for_dataset(fields: &[Field]) -> Vec<ChartKind> {
    suggest_charts_with(fields, ChartRegistry::builtin(), DEFAULT_SUGGESTION_LIMIT)
}
pub fn explain_charts(fields: &[Field], registry: &ChartRegistry) -> Vec<ChartExplanation> {
    registry
        .specs()
        .iter()
        .map(|spec| explain_single_chart(spec, fields))
        .collect()
}
fn explain_single_chart(spec: &ChartSpec, fields: &[Field]) -> ChartExplanation {
    let mut missing_requirements = Vec::new();
    let mut available_mappings = Vec::new();
    for rule in spec.roles.iter().filter(|r| r.required) {
        let compatible: Vec<&str> = fields
            .iter()
            .filter(|f| rule.accepts(f.field_type))
            .map(|f| f.name.as_str())
            .collect();
        if compatible.is_empty() {
            let types: Vec<&str> = rule.allowed_types.iter().map(|t| t.as_str()).collect();
            missing_requirements.push(format!(
                "No compatible field for required role '{}' (needs {})",
                rule.role,
                types.join(" or ")
            ));
        } else {
            available_mappings.push(format!(
                "'{}' can map to: {}",
                rule.role,
                compatible.join(", ")
            ));
        }
    }
    ChartExplanation {
        kind: spec.kind,
        can_render: missing_requirements.is_empty(),
        missing_requirements,
        available_mappings,
    }
}

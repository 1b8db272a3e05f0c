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

//! Row reshaping applied ahead of compilation: filter, then sort, then
//! aggregate. Stages never reorder and never touch their input.
pub mod aggregate;
pub mod filter;
pub mod pivot;
pub mod sort;
pub use aggregate::{
    apply_aggregate, group_stats, AggregateConfig, AggregateFunction, Aggregation, GroupStats,
};
pub use filter::{
    apply_filter, compile_filters, date_range_filter, distinct_values, range_filter,
    text_search_filter, CompiledPredicate, FilterClause, FilterOperand, FilterOperator,
    LogicalOperator, PredicateOutcome,
};
pub use pivot::{pivot_table, PivotTable};
pub use sort::{
    apply_sort, check_sort, compare_rows, resolve_keys, smart_sort, sort_suggestions, SortClause,
    SortKey, SortOrder,
};
use crate::error::TransformResult;
use crate::value::Row;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterClause>,
    #[serde(default, alias = "logic")]
    pub filter_logic: LogicalOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateConfig>,
}
impl TransformConfig {
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.sort.is_empty() && self.aggregate.is_none()
    }
    pub fn with_filter(mut self, clause: FilterClause) -> Self {
        self.filter.push(clause);
        self
    }
    pub fn with_sort(mut self, clause: SortClause) -> Self {
        self.sort.push(clause);
        self
    }
    pub fn with_aggregate(mut self, aggregate: AggregateConfig) -> Self {
        self.aggregate = Some(aggregate);
        self
    }
    /// Structural checks only; no rows are read.
    pub fn validate(&self) -> TransformResult<()> {
        compile_filters(&self.filter)?;
        check_sort(&self.sort)?;
        if let Some(aggregate) = &self.aggregate {
            aggregate.check()?;
        }
        Ok(())
    }
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformDiagnostics {
    pub filter_ignored: usize,
    pub aggregate_ignored: usize,
}
impl TransformDiagnostics {
    pub fn total(&self) -> usize {
        self.filter_ignored + self.aggregate_ignored
    }
}
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    pub rows: Vec<Row>,
    pub diagnostics: TransformDiagnostics,
}
/// Runs the pipeline over `rows` and returns fresh rows plus ignored counts.
pub fn apply_transform(
    rows: &[Row],
    config: &TransformConfig,
) -> TransformResult<TransformOutcome> {
    let predicates = compile_filters(&config.filter)?;
    check_sort(&config.sort)?;
    if let Some(aggregate) = &config.aggregate {
        aggregate.check()?;
    }
    let mut diagnostics = TransformDiagnostics::default();
    let (mut kept, filter_ignored) = apply_filter(rows, &predicates, config.filter_logic);
    diagnostics.filter_ignored = filter_ignored;
    apply_sort(&mut kept, &config.sort);
    let rows = match &config.aggregate {
        Some(aggregate) => {
            let (grouped, ignored) = apply_aggregate(kept.iter().copied(), aggregate);
            diagnostics.aggregate_ignored = ignored;
            grouped
        }
        None => kept.into_iter().cloned().collect(),
    };
    debug!(
        output = rows.len(),
        filters = predicates.len(),
        sort_keys = config.sort.len(),
        aggregated = config.aggregate.is_some(),
        "Transform pipeline finished"
    );
    if diagnostics.total() > 0 {
        warn!(
            filter_ignored = diagnostics.filter_ignored,
            aggregate_ignored = diagnostics.aggregate_ignored,
            "Transform ignored malformed records"
        );
    }
    Ok(TransformOutcome { rows, diagnostics })
}

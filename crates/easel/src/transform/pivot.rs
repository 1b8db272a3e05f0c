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

//! Cross-tabulation of one value column over two category columns.
use super::aggregate::{Accumulator, AggregateFunction};
use super::filter::distinct_values;
use crate::value::{Row, Value};
use serde::Serialize;
use std::collections::HashMap;
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable {
    pub row_headers: Vec<Value>,
    pub col_headers: Vec<Value>,
    /// `cells[r][c]`, `None` where no row carries that header pair.
    pub cells: Vec<Vec<Option<Value>>>,
    pub ignored: usize,
}
impl PivotTable {
    pub fn cell(&self, row: &Value, col: &Value) -> Option<&Value> {
        let r = self.row_headers.iter().position(|h| h == row)?;
        let c = self.col_headers.iter().position(|h| h == col)?;
        self.cells.get(r)?.get(c)?.as_ref()
    }
}
/// Headers are the sorted distinct non-null values of `row_field` and
/// `col_field`; rows missing either are left out. Each cell aggregates
/// `value_field` with `op` over the rows of its pair.
pub fn pivot_table(
    rows: &[Row],
    row_field: &str,
    col_field: &str,
    value_field: &str,
    op: AggregateFunction,
) -> PivotTable {
    let row_headers = distinct_values(rows, row_field);
    let col_headers = distinct_values(rows, col_field);
    let index = |headers: &[Value]| -> HashMap<(u8, String), usize> {
        headers
            .iter()
            .enumerate()
            .map(|(i, v)| (v.identity_key(), i))
            .collect()
    };
    let (row_index, col_index) = (index(&row_headers), index(&col_headers));
    let position = |row: &Row, field: &str, lookup: &HashMap<(u8, String), usize>| {
        row.get(field)
            .filter(|v| !v.is_null())
            .and_then(|v| lookup.get(&v.identity_key()).copied())
    };
    let mut ignored = 0;
    let mut accs: HashMap<(usize, usize), Accumulator> = HashMap::new();
    for row in rows {
        let (Some(r), Some(c)) = (
            position(row, row_field, &row_index),
            position(row, col_field, &col_index),
        ) else {
            continue;
        };
        if !accs.entry((r, c)).or_default().push(op, row.get(value_field)) {
            ignored += 1;
        }
    }
    let cells = (0..row_headers.len())
        .map(|r| {
            (0..col_headers.len())
                .map(|c| accs.remove(&(r, c)).map(|acc| acc.finish(op)))
                .collect()
        })
        .collect();
    PivotTable {
        row_headers,
        col_headers,
        cells,
        ignored,
    }
}

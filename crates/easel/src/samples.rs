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

//! Small built-in datasets for demos and tests.
use crate::value::{Row, Value};
const PRODUCTS: [(&str, f64); 4] = [
    ("Laptop", 120.0),
    ("Phone", 200.0),
    ("Tablet", 80.0),
    ("Watch", 150.0),
];
const REGIONS: [(&str, f64); 3] = [("East", 1.2), ("South", 1.0), ("North", 0.9)];
/// Summer months sell more, and so does the turn of the year.
fn seasonal_factor(month0: u32) -> f64 {
    match month0 {
        5..=8 => 1.3,
        0 | 1 | 11 => 1.2,
        _ => 1.0,
    }
}
/// Monthly 2024 sales for four products across three regions (144 rows).
///
/// Columns: `date` (ISO text, first of month), `product`, `region`, `sales`,
/// `quantity`, `profit`. Deterministic.
pub fn sales_rows() -> Vec<Row> {
    let mut rows = Vec::with_capacity(PRODUCTS.len() * REGIONS.len() * 12);
    for (product, base) in PRODUCTS {
        for (region, region_factor) in REGIONS {
            for month0 in 0..12u32 {
                let sales = (base * region_factor * seasonal_factor(month0)).round();
                let mut row = Row::new();
                row.insert(
                    "date".to_string(),
                    Value::Text(format!("2024-{:02}-01", month0 + 1)),
                );
                row.insert("product".to_string(), Value::from(product));
                row.insert("region".to_string(), Value::from(region));
                row.insert("sales".to_string(), Value::Number(sales));
                row.insert("quantity".to_string(), Value::Number((sales / 2.5).round()));
                row.insert("profit".to_string(), Value::Number((sales * 0.2).round()));
                rows.push(row);
            }
        }
    }
    rows
}
/// Product totals, one row per product; suited to pie charts.
pub fn product_rows() -> Vec<Row> {
    [
        ("Laptop", 1250.0),
        ("Phone", 2100.0),
        ("Tablet", 800.0),
        ("Watch", 600.0),
        ("Headphones", 950.0),
        ("Accessories", 400.0),
    ]
    .into_iter()
    .map(|(product, sales)| {
        let mut row = Row::new();
        row.insert("product".to_string(), Value::from(product));
        row.insert("sales".to_string(), Value::Number(sales));
        row
    })
    .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn sales_sample_shape() {
        let rows = sales_rows();
        assert_eq!(rows.len(), 144);
        assert_eq!(rows[0]["date"], Value::from("2024-01-01"));
        assert_eq!(rows[0]["sales"], Value::Number(173.0));
        assert_eq!(rows[5]["sales"], Value::Number(187.0));
        assert_eq!(rows[0]["quantity"], Value::Number(69.0));
        assert_eq!(rows, sales_rows());
    }
}

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

use easel::compiler::build_pie;
use easel::transform::{apply_aggregate, apply_sort, AggregateConfig, SortClause, SortOrder};
use easel::{infer, Row, Value};
use proptest::prelude::*;

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::Text),
        prop_oneof![Just("true"), Just("no"), Just("2024-03-01"), Just("3.5")]
            .prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn inference_is_deterministic(cells in prop::collection::vec((cell(), cell()), 1..60)) {
        let rows: Vec<Row> = cells
            .into_iter()
            .map(|(a, b)| row(&[("a", a), ("b", b)]))
            .collect();
        let first = infer(&rows, 1000).unwrap();
        let second = infer(&rows, 1000).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn sort_is_stable(keys in prop::collection::vec(0i64..4, 0..40)) {
        let rows: Vec<Row> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| row(&[("k", Value::from(*k)), ("i", Value::from(i as i64))]))
            .collect();
        let mut view: Vec<&Row> = rows.iter().collect();
        apply_sort(&mut view, &[SortClause::new("k", SortOrder::Desc)]);
        for pair in view.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (ka, kb) = (a["k"].to_finite_number(), b["k"].to_finite_number());
            prop_assert!(ka >= kb);
            if ka == kb {
                prop_assert!(a["i"].to_finite_number() < b["i"].to_finite_number());
            }
        }
    }

    #[test]
    fn aggregate_conserves_sum(
        entries in prop::collection::vec((0usize..5, -500i64..500), 0..50),
        grouped in any::<bool>(),
    ) {
        let rows: Vec<Row> = entries
            .iter()
            .map(|(g, v)| row(&[("g", Value::from(*g as i64)), ("v", Value::from(*v))]))
            .collect();
        let by = if grouped { vec!["g".to_string()] } else { Vec::new() };
        let (out, ignored) = apply_aggregate(&rows, &AggregateConfig::sum("v", by));
        prop_assert_eq!(ignored, 0);
        let expected: i64 = entries.iter().map(|(_, v)| *v).sum();
        let total: f64 = out.iter().filter_map(|r| r["v"].to_finite_number()).sum();
        prop_assert!((total - expected as f64).abs() < 1e-6);
    }

    #[test]
    fn pie_conserves_total(
        values in prop::collection::vec(0u32..1000, 1..30),
        top_n in 2usize..15,
    ) {
        let rows: Vec<Row> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                row(&[
                    ("c", Value::from(format!("c{i}"))),
                    ("v", Value::from(i64::from(*v))),
                ])
            })
            .collect();
        let pie = build_pie(&rows, "c", "v", top_n);
        prop_assert!(pie.slices.len() <= top_n);
        let expected: f64 = values.iter().map(|v| f64::from(*v)).sum();
        let total: f64 = pie.slices.iter().map(|s| s.value).sum();
        prop_assert!((total - expected).abs() < 1e-6);
    }
}

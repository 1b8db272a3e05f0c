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

use anyhow::Result;
use easel::compiler::{build_pie, SeriesData};
use easel::transform::{apply_sort, FilterClause, FilterOperator, SortClause, SortOrder};
use easel::value::row_from_json;
use easel::{
    apply_transform, infer, suggest_charts_for_dataset, validate_mapping, ChartConfig,
    ChartEngine, ChartKind, ChartRegistry, Dataset, Field, FieldType, Mapping, Role, Row,
    TransformConfig, Value,
};
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

fn monthly_sales() -> Vec<Row> {
    rows(json!([
        {"m": "Jan", "region": "E", "sales": 100},
        {"m": "Jan", "region": "W", "sales": 50},
        {"m": "Feb", "region": "E", "sales": 80}
    ]))
}

#[test]
fn test_bar_chart_aligns_series_on_sorted_months() -> Result<()> {
    let engine = ChartEngine::new();
    let dataset = engine.load_dataset("monthly", monthly_sales())?;
    let chart = ChartConfig::new(
        ChartKind::Bar,
        "Sales by month",
        Mapping::new()
            .with(Role::X, "m")
            .with(Role::Y, "sales")
            .with(Role::Series, "region"),
    );
    let outcome = engine.render(&chart, &dataset)?;
    let option = serde_json::to_value(&outcome.option)?;
    assert_eq!(option["xAxis"]["categories"], json!(["Feb", "Jan"]));
    assert_eq!(option["xAxis"]["type"], json!("category"));
    assert_eq!(option["series"][0]["name"], json!("E"));
    assert_eq!(option["series"][0]["data"], json!([80.0, 100.0]));
    assert_eq!(option["series"][1]["name"], json!("W"));
    assert_eq!(option["series"][1]["data"], json!([0.0, 50.0]));
    assert_eq!(option["title"]["text"], json!("Sales by month"));
    assert_eq!(outcome.ignored_count(), 0);
    Ok(())
}

#[test]
fn test_greater_than_filter_keeps_two_rows() -> Result<()> {
    let config = TransformConfig::default()
        .with_filter(FilterClause::new("sales", FilterOperator::Gt, 60));
    let outcome = apply_transform(&monthly_sales(), &config)?;
    let kept: Vec<(String, f64)> = outcome
        .rows
        .iter()
        .map(|r| (r["region"].to_category(), r["sales"].to_finite_number().unwrap_or(-1.0)))
        .collect();
    assert_eq!(kept, vec![("E".to_string(), 100.0), ("E".to_string(), 80.0)]);
    assert_eq!(outcome.rows[0]["m"], Value::from("Jan"));
    assert_eq!(outcome.rows[1]["m"], Value::from("Feb"));
    Ok(())
}

#[test]
fn test_boolean_column_with_numeric_literal() -> Result<()> {
    let fields = infer(
        &rows(json!([{"flag": "true"}, {"flag": "false"}, {"flag": "true"}, {"flag": "1"}])),
        1000,
    )?;
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field_type, FieldType::Boolean);
    assert_eq!(fields[0].unique_values, Some(3));
    Ok(())
}

#[test]
fn test_boolean_wins_over_numeric_when_both_fit() -> Result<()> {
    let column = rows(json!([{"v": "1"}, {"v": "0"}, {"v": "1"}, {"v": "0"}, {"v": "1"}]));
    let fields = infer(&column, 1000)?;
    assert_eq!(fields[0].field_type, FieldType::Boolean);
    Ok(())
}

#[test]
fn test_empty_rows_fail_inference() {
    assert!(infer(&[], 1000).is_err());
}

#[test]
fn test_pie_top_n_conservation() -> Result<()> {
    let data = rows(json!([
        {"c": "a", "v": 10},
        {"c": "b", "v": 20},
        {"c": "c", "v": 30},
        {"c": "d", "v": 40},
        {"c": "e", "v": 50}
    ]));
    let pie = build_pie(&data, "c", "v", 3);
    let slices = serde_json::to_value(&pie.slices)?;
    assert_eq!(
        slices,
        json!([
            {"name": "e", "value": 50.0},
            {"name": "d", "value": 40.0},
            {"name": "Other", "value": 60.0}
        ])
    );
    Ok(())
}

#[test]
fn test_sort_keeps_ties_stable() {
    let data = rows(json!([{"a": 1, "b": 1}, {"a": 1, "b": 2}]));
    let mut view: Vec<&Row> = data.iter().collect();
    apply_sort(&mut view, &[SortClause::new("a", SortOrder::Asc)]);
    assert_eq!(view[0]["b"], Value::Number(1.0));
    assert_eq!(view[1]["b"], Value::Number(2.0));
}

#[test]
fn test_validator_is_pure() -> Result<()> {
    let registry = ChartRegistry::builtin();
    let spec = registry.spec(ChartKind::Line)?;
    let fields = vec![
        Field::new("day", FieldType::Date),
        Field::new("amount", FieldType::Number),
    ];
    let good = Mapping::new().with(Role::X, "day").with(Role::Y, "amount");
    let first = validate_mapping(spec, &good, &fields);
    let second = validate_mapping(spec, &good, &fields);
    assert!(first.ok);
    assert_eq!(first, second);

    let bad = Mapping::new().with(Role::Y, "day");
    let report = validate_mapping(spec, &bad, &fields);
    assert!(!report.ok);
    assert_eq!(report.missing_roles, vec![Role::X]);
    assert_eq!(report, validate_mapping(spec, &bad, &fields));
    Ok(())
}

#[test]
fn test_sales_sample_end_to_end() -> Result<()> {
    let engine = ChartEngine::new();
    let dataset = engine.load_dataset("Sales 2024", easel::samples::sales_rows())?;
    assert_eq!(dataset.row_count(), 144);
    assert_eq!(dataset.field("date").map(|f| f.field_type), Some(FieldType::Date));
    assert_eq!(dataset.summary().number_fields, 3);
    assert_eq!(
        suggest_charts_for_dataset(&dataset.fields),
        vec![ChartKind::Line, ChartKind::Bar, ChartKind::Scatter]
    );
    for kind in ChartKind::ALL {
        let chart = engine.new_chart(kind, &dataset)?;
        let report = engine.validate(&chart, &dataset)?;
        assert!(report.ok, "{kind}: {:?}", report.errors);
        let outcome = engine.render(&chart, &dataset)?;
        assert!(!outcome.option.series.is_empty(), "{kind} produced no series");
        assert_eq!(outcome.ignored_count(), 0);
    }
    Ok(())
}

#[test]
fn test_transform_then_pie() -> Result<()> {
    let engine = ChartEngine::new();
    let dataset = engine.load_dataset("Sales", easel::samples::sales_rows())?;
    let chart: ChartConfig = serde_json::from_value(json!({
        "type": "pie",
        "title": "East share",
        "mapping": {"category": "product", "value": "sales"},
        "style": {"showPercent": true},
        "transform": {
            "filter": [{"field": "region", "operator": "equals", "value": "East"}],
            "aggregate": {"by": ["product"], "field": "sales"}
        }
    }))?;
    let outcome = engine.render(&chart, &dataset)?;
    let SeriesData::Slices(slices) = &outcome.option.series[0].data else {
        anyhow::bail!("pie should carry slices");
    };
    let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Phone", "Watch", "Laptop", "Tablet"]);
    Ok(())
}

#[test]
fn test_dataset_rejects_duplicate_keys() {
    let fields = vec![
        Field::new("a", FieldType::Number),
        Field::new("a", FieldType::String),
    ];
    assert!(Dataset::new("dup", fields, Vec::new()).is_err());
}

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

use anyhow::{bail, Context, Result};
use clap::Parser;
use easel::samples::sales_rows;
use easel::{ChartEngine, ChartKind, Dataset, EngineConfig, Palette};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "easel-chart-demo")]
#[command(about = "Infers a schema, suggests charts and prints a compiled chart option")]
struct Args {
    /// JSON array of row objects. Uses the built-in sales sample when absent.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// YAML engine configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chart kind to render. Defaults to the top suggestion.
    #[arg(short, long)]
    kind: Option<ChartKind>,

    #[arg(short, long, default_value = "default")]
    palette: Palette,

    /// How many ranked suggestions to print.
    #[arg(short, long, default_value_t = 3)]
    top: usize,

    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Ok(EngineConfig::from_yaml_str(&text)?)
}

fn load_dataset(engine: &ChartEngine<'_>, path: Option<&PathBuf>) -> Result<Dataset> {
    let Some(path) = path else {
        info!("no data file given, using the sales sample");
        return Ok(engine.load_dataset("sales", sales_rows())?);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading data {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let name = path
        .file_stem()
        .map_or_else(|| "data".to_string(), |s| s.to_string_lossy().into_owned());
    Ok(engine.load_json(&name, json)?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let engine = ChartEngine::with_config(load_config(args.config.as_ref())?)?;
    let dataset = load_dataset(&engine, args.data.as_ref())?;

    println!("\n=== Schema: {} ===", dataset.name);
    for field in &dataset.fields {
        println!(
            "  {:<16} {:<8} unique={:<5} samples={}",
            field.key,
            field.field_type.as_str(),
            field.unique_values.map_or_else(|| "-".to_string(), |n| n.to_string()),
            serde_json::to_string(&field.sample_values)?
        );
    }
    let quality = dataset.quality_report();
    if quality.has_issues() {
        println!("  ({} data quality issue(s))", quality.issue_count());
    }

    let ranked = engine.rank(&dataset);
    println!("\n=== Suggestions ===");
    for suggestion in ranked.iter().take(args.top) {
        println!(
            "  {:<8} score={:<3} {}",
            suggestion.kind,
            suggestion.score,
            suggestion.reasons.join("; ")
        );
    }

    let kind = match args.kind.or_else(|| ranked.first().map(|s| s.kind)) {
        Some(kind) => kind,
        None => bail!("no chart kind fits dataset '{}'", dataset.name),
    };
    let mut chart = engine.new_chart(kind, &dataset)?;
    let mut style = chart.effective_style();
    style.common_mut().color_scheme = args.palette;
    chart = chart.with_style(style);

    let report = engine.validate(&chart, &dataset)?;
    println!("\n=== Mapping for {kind} ===");
    for (role, key) in chart.mapping.iter() {
        println!("  {role:<9} -> {key}");
    }
    for issue in &report.errors {
        println!("  error:   {issue}");
    }
    for issue in &report.warnings {
        println!("  warning: {issue}");
    }
    if !report.ok {
        bail!("mapping for {kind} is invalid");
    }

    let outcome = engine.render(&chart, &dataset)?;
    if outcome.ignored_count() > 0 {
        warn!(ignored = outcome.ignored_count(), "some records were left out of the chart");
    }
    println!("\n=== Option ===");
    println!("{}", serde_json::to_string_pretty(&outcome.option)?);
    println!("\nignored records: {}", outcome.ignored_count());
    Ok(())
}

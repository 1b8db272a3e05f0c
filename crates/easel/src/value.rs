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

//! Dynamically typed cell values and the coercion rules shared by inference,
//! the transform pipeline and the option compiler.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// One row of a dataset, keyed by column name in ingestion order.
pub type Row = IndexMap<String, Value>;

/// Date-time layouts tried after the literal patterns, in order.
pub const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

static DATE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^\d{4}-\d{2}-\d{2}$", "%Y-%m-%d"),
        (r"^\d{2}/\d{2}/\d{4}$", "%m/%d/%Y"),
        (r"^\d{2}-\d{2}-\d{4}$", "%m-%d-%Y"),
        (r"^\d{4}/\d{2}/\d{2}$", "%Y/%m/%d"),
        (r"^\d{8}$", "%Y%m%d"),
        (r"^\d{1,2}/\d{1,2}/\d{4}$", "%m/%d/%Y"),
        (r"^\d{1,2}/\d{1,2}/\d{2}$", "%m/%d/%y"),
    ]
    .into_iter()
    .map(|(pattern, format)| (Regex::new(pattern).expect("date literal pattern"), format))
    .collect()
});

static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d*\.?\d+$").expect("numeric literal pattern"));

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, or text that is empty after trimming.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Finite numeric reading of the value.
    ///
    /// Numbers pass through when finite, text is trimmed and parsed, booleans
    /// read as 1/0. Dates and nulls have no numeric reading.
    pub fn to_finite_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) | Value::Null | Value::Date(_) => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }

    /// Instant reading of the value. Numbers are never treated as instants.
    pub fn to_instant(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::Text(s) => parse_date_text(s),
            _ => None,
        }
    }

    /// Display string used for categories, group keys and text comparison.
    pub fn to_category(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Key for distinct counting; values of different variants never collide.
    pub fn identity_key(&self) -> (u8, String) {
        let tag = match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Date(_) => 4,
        };
        (tag, self.to_category())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(dt) => write!(f, "{}", format_instant(dt)),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

fn format_instant(dt: &NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// True when the text has the shape of a plain decimal literal and parses finite.
pub fn is_numeric_literal(text: &str) -> bool {
    let trimmed = text.trim();
    NUMERIC_LITERAL.is_match(trimmed) && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Matches the date literal layouts and validates them through chrono.
pub fn parse_date_literal(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    DATE_PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(trimmed))
        .find_map(|(_, format)| NaiveDate::parse_from_str(trimmed, format).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Literal patterns, then RFC 3339, then the default date-time layouts.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    parse_date_text_with(text, DEFAULT_DATETIME_FORMATS.iter().copied())
}

pub fn parse_date_text_with<'f>(
    text: &str,
    formats: impl IntoIterator<Item = &'f str>,
) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(dt) = parse_date_literal(trimmed) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    formats.into_iter().find_map(|format| {
        NaiveDateTime::parse_from_str(trimmed, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    })
}

fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Locale-style ordering: accents and case are ignored first, then the raw
/// strings break the tie.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Splits text into alternating runs of ASCII digits and everything else.
fn natural_chunks(s: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if in_digits.is_some_and(|d| d != digit) {
            chunks.push(&s[start..i]);
            start = i;
        }
        in_digits = Some(digit);
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }
    chunks
}

fn digit_run_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Natural ordering: digit runs compare by value, the text between them with
/// [`locale_cmp`], so `item2` sorts before `item10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (left, right) = (natural_chunks(a), natural_chunks(b));
    let is_digits = |chunk: &str| chunk.starts_with(|c: char| c.is_ascii_digit());
    left.iter()
        .zip(right.iter())
        .map(|(&x, &y)| {
            if is_digits(x) && is_digits(y) {
                digit_run_cmp(x, y)
            } else {
                locale_cmp(x, y)
            }
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| left.len().cmp(&right.len()))
}

/// Sort comparator.
///
/// Nulls come first, numbers compare numerically, dates by instant, text by
/// [`locale_cmp`], booleans false before true. Mixed variants compare their
/// display strings.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => locale_cmp(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => locale_cmp(&a.to_category(), &b.to_category()),
    }
}

/// How a whole column orders its cells.
///
/// A column whose non-null cells share one variant compares them typed;
/// anything mixed falls back to comparing display strings, so a sort over
/// the column stays a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrdering {
    Typed,
    Textual,
    /// Display strings under [`natural_cmp`]; only chosen on request.
    Natural,
}
impl ColumnOrdering {
    pub fn of<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut variant = None;
        for value in values {
            if value.is_null() {
                continue;
            }
            let tag = value.identity_key().0;
            match variant {
                None => variant = Some(tag),
                Some(seen) if seen != tag => return ColumnOrdering::Textual,
                Some(_) => {}
            }
        }
        ColumnOrdering::Typed
    }
    pub fn compare(self, a: &Value, b: &Value) -> Ordering {
        match self {
            ColumnOrdering::Typed => compare_values(a, b),
            ColumnOrdering::Textual | ColumnOrdering::Natural => {
                match (a.is_null(), b.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) if self == ColumnOrdering::Natural => {
                        natural_cmp(&a.to_category(), &b.to_category())
                    }
                    (false, false) => locale_cmp(&a.to_category(), &b.to_category()),
                }
            }
        }
    }
}

/// Sorts values in place under the ordering their mix calls for.
pub fn sort_values(values: &mut [Value]) {
    let ordering = ColumnOrdering::of(values.iter());
    values.sort_by(|a, b| ordering.compare(a, b));
}

/// Equality used by `eq`, `ne`, `in` and `notin` filters: numeric when both
/// sides read as numbers, by instant when both read as dates, else textual.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.to_finite_number(), b.to_finite_number()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.to_instant(), b.to_instant()) {
        return x == y;
    }
    a.to_category() == b.to_category()
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value.and_time(NaiveTime::MIN))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(dt) => serializer.serialize_str(&format_instant(dt)),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Builds a [`Row`] from a JSON object; anything else yields `None`.
pub fn row_from_json(value: serde_json::Value) -> Option<Row> {
    match value {
        serde_json::Value::Object(map) => {
            Some(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
        }
        _ => None,
    }
}

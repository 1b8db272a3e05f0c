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

//! Declarative catalogue of chart kinds: the roles each kind needs, the field
//! types those roles accept, and the style options each kind exposes.

use crate::compiler::palette::Palette;
use crate::dataset::{find_field, Field, FieldType};
use crate::error::{CompileError, CompileResult, RegistryError, RegistryResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ChartKind {
    Line,
    Bar,
    Area,
    Scatter,
    Pie,
    Radar,
}
impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Area,
        ChartKind::Scatter,
        ChartKind::Pie,
        ChartKind::Radar,
    ];
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Radar => "radar",
        }
    }
    /// Kinds drawn on an x/y grid.
    pub fn is_cartesian(self) -> bool {
        matches!(
            self,
            ChartKind::Line | ChartKind::Bar | ChartKind::Area | ChartKind::Scatter
        )
    }
}
impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for ChartKind {
    type Err = CompileError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| CompileError::UnknownKind {
                kind: s.to_string(),
            })
    }
}
impl TryFrom<String> for ChartKind {
    type Error = CompileError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    X,
    Y,
    Series,
    Category,
    Value,
    Dimension,
}
impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Series => "series",
            Role::Category => "category",
            Role::Value => "value",
            Role::Dimension => "dimension",
        }
    }
}
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
/// Partial assignment of field keys to roles. Blank keys count as unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping(BTreeMap<Role, String>);
impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, role: Role, key: impl Into<String>) -> Self {
        self.insert(role, key);
        self
    }
    pub fn insert(&mut self, role: Role, key: impl Into<String>) {
        self.0.insert(role, key.into());
    }
    pub fn remove(&mut self, role: Role) -> Option<String> {
        self.0.remove(&role)
    }
    pub fn get(&self, role: Role) -> Option<&str> {
        self.0
            .get(&role)
            .map(String::as_str)
            .filter(|key| !key.trim().is_empty())
    }
    pub fn contains(&self, role: Role) -> bool {
        self.get(role).is_some()
    }
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.0
            .iter()
            .filter(|(_, key)| !key.trim().is_empty())
            .map(|(role, key)| (*role, key.as_str()))
    }
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
impl FromIterator<(Role, String)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Role, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRule {
    pub role: Role,
    pub allowed_types: Vec<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
impl RoleRule {
    pub fn accepts(&self, field_type: FieldType) -> bool {
        self.allowed_types.contains(&field_type)
    }
    pub fn label(&self) -> &str {
        if self.label.is_empty() {
            self.role.as_str()
        } else {
            &self.label
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Bool(bool),
    Number(f64),
    Text(String),
}
impl StyleValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StyleValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}
impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Bool(b) => write!(f, "{b}"),
            StyleValue::Number(n) => write!(f, "{n}"),
            StyleValue::Text(s) => write!(f, "{s}"),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: StyleValue,
    pub label: String,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StyleOptionKind {
    Boolean,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Select {
        options: Vec<SelectOption>,
    },
    Color,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleOption {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: StyleOptionKind,
    pub default: StyleValue,
}
impl StyleOption {
    /// Checks a candidate value against this option's type and bounds.
    pub fn check(&self, value: &StyleValue) -> Result<(), String> {
        match (&self.kind, value) {
            (StyleOptionKind::Boolean, StyleValue::Bool(_)) => Ok(()),
            (StyleOptionKind::Number { min, max, .. }, StyleValue::Number(n)) => {
                if !n.is_finite() {
                    return Err(format!("{n} is not a finite number"));
                }
                if let Some(min) = min.filter(|min| n < min) {
                    return Err(format!("{n} is below the minimum {min}"));
                }
                if let Some(max) = max.filter(|max| n > max) {
                    return Err(format!("{n} is above the maximum {max}"));
                }
                Ok(())
            }
            (StyleOptionKind::Select { options }, v) => {
                if options.iter().any(|o| &o.value == v) {
                    Ok(())
                } else {
                    Err(format!("{v} is not one of the listed choices"))
                }
            }
            (StyleOptionKind::Color, StyleValue::Text(s)) if !s.trim().is_empty() => Ok(()),
            (kind, v) => Err(format!("{v} does not fit a {} option", kind_name(kind))),
        }
    }
}
fn kind_name(kind: &StyleOptionKind) -> &'static str {
    match kind {
        StyleOptionKind::Boolean => "boolean",
        StyleOptionKind::Number { .. } => "number",
        StyleOptionKind::Select { .. } => "select",
        StyleOptionKind::Color => "color",
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub roles: Vec<RoleRule>,
    #[serde(default)]
    pub default_mapping: Mapping,
    #[serde(default)]
    pub style_schema: Vec<StyleOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_series: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_categories: Option<usize>,
}
impl ChartSpec {
    pub fn role_rule(&self, role: Role) -> Option<&RoleRule> {
        self.roles.iter().find(|r| r.role == role)
    }
    pub fn required_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().filter(|r| r.required).map(|r| r.role)
    }
    pub fn optional_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().filter(|r| !r.required).map(|r| r.role)
    }
    pub fn style_option(&self, key: &str) -> Option<&StyleOption> {
        self.style_schema.iter().find(|o| o.key == key)
    }
    fn check(&self) -> RegistryResult<()> {
        let mut roles = HashSet::new();
        for rule in &self.roles {
            if !roles.insert(rule.role) {
                return Err(RegistryError::DuplicateRole {
                    kind: self.kind,
                    role: rule.role,
                });
            }
            if rule.allowed_types.is_empty() {
                return Err(RegistryError::NoAllowedTypes {
                    kind: self.kind,
                    role: rule.role,
                });
            }
        }
        if let Some((role, _)) = self
            .default_mapping
            .iter()
            .find(|(role, _)| !roles.contains(role))
        {
            return Err(RegistryError::UndeclaredDefaultRole {
                kind: self.kind,
                role,
            });
        }
        let mut keys = HashSet::new();
        for option in &self.style_schema {
            let invalid = |reason: String| RegistryError::InvalidStyleOption {
                kind: self.kind,
                key: option.key.clone(),
                reason,
            };
            if !keys.insert(option.key.as_str()) {
                return Err(invalid("declared more than once".to_string()));
            }
            if let StyleOptionKind::Number {
                min: Some(min),
                max: Some(max),
                ..
            } = option.kind
            {
                if min > max {
                    return Err(invalid(format!("minimum {min} exceeds maximum {max}")));
                }
            }
            option.check(&option.default).map_err(invalid)?;
        }
        Ok(())
    }
}
/// Every required role has at least one field of an accepted type.
pub fn is_dataset_suitable(spec: &ChartSpec, fields: &[Field]) -> bool {
    spec.roles
        .iter()
        .filter(|rule| rule.required)
        .all(|rule| fields.iter().any(|f| rule.accepts(f.field_type)))
}
/// Fields a role accepts, paired with whether another role already uses them.
pub fn candidate_fields<'a>(
    spec: &ChartSpec,
    role: Role,
    mapping: &Mapping,
    fields: &'a [Field],
) -> Vec<(&'a Field, bool)> {
    let Some(rule) = spec.role_rule(role) else {
        return Vec::new();
    };
    let taken: HashSet<&str> = mapping
        .iter()
        .filter(|(r, _)| *r != role)
        .map(|(_, key)| key)
        .collect();
    fields
        .iter()
        .filter(|f| rule.accepts(f.field_type))
        .map(|f| (f, taken.contains(f.key.as_str())))
        .collect()
}
/// Declared defaults whose fields exist, then each still-open required role
/// gets the first unused field of an accepted type.
pub fn default_mapping(spec: &ChartSpec, fields: &[Field]) -> Mapping {
    let mut mapping = Mapping::new();
    let mut used: HashSet<String> = HashSet::new();
    for (role, key) in spec.default_mapping.iter() {
        if let Some(field) = find_field(fields, key) {
            mapping.insert(role, field.key.clone());
            used.insert(field.key.clone());
        }
    }
    for rule in spec.roles.iter().filter(|r| r.required) {
        if mapping.contains(rule.role) {
            continue;
        }
        if let Some(field) = fields
            .iter()
            .find(|f| rule.accepts(f.field_type) && !used.contains(&f.key))
        {
            mapping.insert(rule.role, field.key.clone());
            used.insert(field.key.clone());
        }
    }
    debug!(kind = %spec.kind, roles = mapping.iter().count(), "default mapping built");
    mapping
}
#[derive(Debug, Deserialize)]
struct RegistryFile {
    charts: Vec<ChartSpec>,
}
#[derive(Debug, Clone)]
pub struct ChartRegistry {
    specs: Vec<ChartSpec>,
    by_kind: HashMap<ChartKind, usize>,
}
static BUILTIN: Lazy<ChartRegistry> = Lazy::new(|| ChartRegistry::index(builtin_specs()));
impl ChartRegistry {
    /// The built-in catalogue, built once per process.
    pub fn builtin() -> &'static ChartRegistry {
        &BUILTIN
    }
    pub fn from_specs(specs: Vec<ChartSpec>) -> RegistryResult<Self> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.kind) {
                return Err(RegistryError::DuplicateKind { kind: spec.kind });
            }
            spec.check()?;
        }
        Ok(Self::index(specs))
    }
    pub fn from_yaml_str(yaml: &str) -> RegistryResult<Self> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        let registry = Self::from_specs(file.charts)?;
        debug!(kinds = registry.specs.len(), "chart registry loaded");
        Ok(registry)
    }
    fn index(specs: Vec<ChartSpec>) -> Self {
        let by_kind = specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| (spec.kind, idx))
            .collect();
        Self { specs, by_kind }
    }
    pub fn get(&self, kind: ChartKind) -> Option<&ChartSpec> {
        self.by_kind.get(&kind).map(|&idx| &self.specs[idx])
    }
    pub fn spec(&self, kind: ChartKind) -> CompileResult<&ChartSpec> {
        self.get(kind)
            .ok_or(CompileError::KindNotRegistered { kind })
    }
    pub fn specs(&self) -> &[ChartSpec] {
        &self.specs
    }
    pub fn kinds(&self) -> Vec<ChartKind> {
        self.specs.iter().map(|s| s.kind).collect()
    }
    /// Declaration order, used to break score ties.
    pub fn position(&self, kind: ChartKind) -> Option<usize> {
        self.by_kind.get(&kind).copied()
    }
    pub fn check(&self) -> RegistryResult<()> {
        self.specs.iter().try_for_each(ChartSpec::check)
    }
}
fn rule(role: Role, types: &[FieldType], required: bool, label: &str) -> RoleRule {
    RoleRule {
        role,
        allowed_types: types.to_vec(),
        required,
        max_count: None,
        label: label.to_string(),
        description: None,
    }
}
fn capped(mut rule: RoleRule, max: Option<usize>) -> RoleRule {
    rule.max_count = max;
    rule
}
fn described(mut rule: RoleRule, text: &str) -> RoleRule {
    rule.description = Some(text.to_string());
    rule
}
fn boolean(key: &str, label: &str, default: bool) -> StyleOption {
    StyleOption {
        key: key.to_string(),
        label: label.to_string(),
        kind: StyleOptionKind::Boolean,
        default: StyleValue::Bool(default),
    }
}
fn number(key: &str, label: &str, default: f64, min: f64, max: f64, step: f64) -> StyleOption {
    StyleOption {
        key: key.to_string(),
        label: label.to_string(),
        kind: StyleOptionKind::Number {
            min: Some(min),
            max: Some(max),
            step: Some(step),
        },
        default: StyleValue::Number(default),
    }
}
fn common_options(cartesian: bool) -> Vec<StyleOption> {
    let mut options = vec![
        boolean("showLegend", "Show legend", true),
        boolean("showLabel", "Show data labels", false),
        StyleOption {
            key: "colorScheme".to_string(),
            label: "Color scheme".to_string(),
            kind: StyleOptionKind::Select {
                options: Palette::ALL
                    .iter()
                    .map(|p| SelectOption {
                        value: StyleValue::Text(p.name().to_string()),
                        label: p.label().to_string(),
                    })
                    .collect(),
            },
            default: StyleValue::Text(Palette::Default.name().to_string()),
        },
    ];
    if cartesian {
        options.push(number("gridMargin", "Grid margin", 60.0, 0.0, 200.0, 5.0));
        let mut rotations = vec![SelectOption {
            value: StyleValue::Text("auto".to_string()),
            label: "Automatic".to_string(),
        }];
        rotations.extend([0.0, 30.0, 45.0, 60.0, 90.0].into_iter().map(|deg| SelectOption {
            value: StyleValue::Number(deg),
            label: format!("{deg}°"),
        }));
        options.push(StyleOption {
            key: "xLabelRotate".to_string(),
            label: "X label rotation".to_string(),
            kind: StyleOptionKind::Select { options: rotations },
            default: StyleValue::Text("auto".to_string()),
        });
    }
    options
}
fn with_common(cartesian: bool, kind_options: Vec<StyleOption>) -> Vec<StyleOption> {
    let mut options = common_options(cartesian);
    options.extend(kind_options);
    options
}
fn xy_roles(max_categories: usize, max_series: usize) -> Vec<RoleRule> {
    use FieldType as T;
    vec![
        capped(
            described(
                rule(Role::X, &[T::String, T::Date, T::Number], true, "X axis"),
                "Category or time axis",
            ),
            Some(max_categories),
        ),
        described(rule(Role::Y, &[T::Number], true, "Y axis"), "Measured value"),
        capped(
            described(
                rule(Role::Series, &[T::String], false, "Series"),
                "Splits the data into lines",
            ),
            Some(max_series),
        ),
    ]
}
fn builtin_specs() -> Vec<ChartSpec> {
    use FieldType as T;
    vec![
        ChartSpec {
            kind: ChartKind::Line,
            name: "Line chart".to_string(),
            description: "Shows how values change over time or across categories".to_string(),
            roles: xy_roles(50, 10),
            default_mapping: Mapping::new().with(Role::X, "date"),
            style_schema: with_common(
                true,
                vec![
                    boolean("smooth", "Smooth lines", false),
                    boolean("showSymbol", "Show points", true),
                    number("lineWidth", "Line width", 2.0, 1.0, 10.0, 1.0),
                    boolean("stacked", "Stacked", false),
                ],
            ),
            max_series: Some(10),
            max_categories: Some(50),
        },
        ChartSpec {
            kind: ChartKind::Bar,
            name: "Bar chart".to_string(),
            description: "Compares values across categories".to_string(),
            roles: xy_roles(30, 8),
            default_mapping: Mapping::new().with(Role::X, "category"),
            style_schema: with_common(
                true,
                vec![
                    boolean("stacked", "Stacked", false),
                    number("barWidth", "Bar width", 0.6, 0.0, 1.0, 0.05),
                ],
            ),
            max_series: Some(8),
            max_categories: Some(30),
        },
        ChartSpec {
            kind: ChartKind::Area,
            name: "Area chart".to_string(),
            description: "Shows how cumulative quantities change".to_string(),
            roles: xy_roles(40, 6),
            default_mapping: Mapping::new().with(Role::X, "date"),
            style_schema: with_common(
                true,
                vec![
                    boolean("smooth", "Smooth lines", false),
                    boolean("stacked", "Stacked", false),
                    number("opacity", "Fill opacity", 0.7, 0.0, 1.0, 0.05),
                    boolean("showSymbol", "Show points", true),
                    number("lineWidth", "Line width", 2.0, 1.0, 10.0, 1.0),
                ],
            ),
            max_series: Some(6),
            max_categories: Some(40),
        },
        ChartSpec {
            kind: ChartKind::Scatter,
            name: "Scatter plot".to_string(),
            description: "Shows the relationship between two numeric variables".to_string(),
            roles: vec![
                rule(Role::X, &[T::Number], true, "X value"),
                rule(Role::Y, &[T::Number], true, "Y value"),
                capped(
                    described(
                        rule(Role::Series, &[T::String], false, "Group"),
                        "Colours points by group",
                    ),
                    Some(8),
                ),
            ],
            default_mapping: Mapping::new(),
            style_schema: with_common(
                true,
                vec![number("symbolSize", "Point size", 8.0, 2.0, 40.0, 1.0)],
            ),
            max_series: Some(8),
            max_categories: Some(100),
        },
        ChartSpec {
            kind: ChartKind::Pie,
            name: "Pie chart".to_string(),
            description: "Shows parts of a whole".to_string(),
            roles: vec![
                capped(
                    described(
                        rule(Role::Category, &[T::String], true, "Category"),
                        "One slice per value",
                    ),
                    Some(12),
                ),
                described(rule(Role::Value, &[T::Number], true, "Value"), "Slice size"),
            ],
            default_mapping: Mapping::new()
                .with(Role::Category, "category")
                .with(Role::Value, "value"),
            style_schema: with_common(
                false,
                vec![
                    boolean("roseType", "Rose chart", false),
                    boolean("showPercent", "Show percentages", false),
                ],
            ),
            max_series: None,
            max_categories: Some(12),
        },
        ChartSpec {
            kind: ChartKind::Radar,
            name: "Radar chart".to_string(),
            description: "Compares values across several dimensions".to_string(),
            roles: vec![
                capped(
                    described(
                        rule(Role::Dimension, &[T::String], true, "Dimension"),
                        "One spoke per value",
                    ),
                    Some(15),
                ),
                rule(Role::Value, &[T::Number], true, "Value"),
                capped(rule(Role::Series, &[T::String], false, "Series"), Some(5)),
            ],
            default_mapping: Mapping::new(),
            style_schema: with_common(
                false,
                vec![
                    boolean("showArea", "Fill area", false),
                    boolean("showLine", "Show outline", true),
                    number("radius", "Radius", 0.7, 0.1, 1.0, 0.05),
                ],
            ),
            max_series: Some(5),
            max_categories: Some(15),
        },
    ]
}

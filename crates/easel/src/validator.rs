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

use crate::chart_registry::{ChartSpec, Mapping, Role};
use crate::dataset::{find_field, Field, FieldType};
use crate::error::{MappingError, MappingResult};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum MappingIssue {
    MissingRole {
        role: Role,
    },
    FieldNotFound {
        role: Role,
        key: String,
    },
    TypeNotSupported {
        role: Role,
        key: String,
        field_type: FieldType,
        allowed: Vec<FieldType>,
    },
    /// The mapping fills a role this chart kind never declares.
    RoleNotUsed {
        role: Role,
    },
    TooManyValues {
        role: Role,
        key: String,
        unique_values: usize,
        max: usize,
    },
    DuplicateField {
        key: String,
        roles: Vec<Role>,
    },
}
impl MappingIssue {
    pub fn role(&self) -> Option<Role> {
        match self {
            MappingIssue::MissingRole { role }
            | MappingIssue::FieldNotFound { role, .. }
            | MappingIssue::TypeNotSupported { role, .. }
            | MappingIssue::RoleNotUsed { role }
            | MappingIssue::TooManyValues { role, .. } => Some(*role),
            MappingIssue::DuplicateField { .. } => None,
        }
    }
}
impl fmt::Display for MappingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingIssue::MissingRole { role } => write!(f, "required role '{role}' is not mapped"),
            MappingIssue::FieldNotFound { role, key } => {
                write!(f, "field '{key}' for role '{role}' not found")
            }
            MappingIssue::TypeNotSupported {
                role,
                key,
                field_type,
                allowed,
            } => {
                let allowed: Vec<&str> = allowed.iter().map(|t| t.as_str()).collect();
                write!(
                    f,
                    "role '{role}' does not support {field_type} field '{key}' (accepts {})",
                    allowed.join("/")
                )
            }
            MappingIssue::RoleNotUsed { role } => {
                write!(f, "role '{role}' is not used by this chart")
            }
            MappingIssue::TooManyValues {
                role,
                key,
                unique_values,
                max,
            } => write!(
                f,
                "field '{key}' has {unique_values} distinct values; \
                 role '{role}' reads well up to {max}"
            ),
            MappingIssue::DuplicateField { key, roles } => {
                let roles: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "field '{key}' fills several roles ({})", roles.join(", "))
            }
        }
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    pub ok: bool,
    pub missing_roles: Vec<Role>,
    pub errors: Vec<MappingIssue>,
    pub warnings: Vec<MappingIssue>,
}
impl MappingReport {
    pub fn into_result(self) -> MappingResult<()> {
        if self.ok {
            Ok(())
        } else {
            Err(MappingError::Invalid {
                issues: self.errors,
            })
        }
    }
}
/// Checks a role mapping against a chart spec and the dataset's fields.
///
/// Every problem is reported, not just the first. Warnings never affect `ok`.
pub fn validate_mapping(spec: &ChartSpec, mapping: &Mapping, fields: &[Field]) -> MappingReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let missing_roles: Vec<Role> = spec
        .required_roles()
        .filter(|role| !mapping.contains(*role))
        .collect();
    errors.extend(
        missing_roles
            .iter()
            .map(|&role| MappingIssue::MissingRole { role }),
    );
    let mut roles_by_field: IndexMap<&str, Vec<Role>> = IndexMap::new();
    for (role, key) in mapping.iter() {
        let Some(rule) = spec.role_rule(role) else {
            errors.push(MappingIssue::RoleNotUsed { role });
            continue;
        };
        let Some(field) = find_field(fields, key) else {
            errors.push(MappingIssue::FieldNotFound {
                role,
                key: key.to_string(),
            });
            continue;
        };
        roles_by_field.entry(field.key.as_str()).or_default().push(role);
        if !rule.accepts(field.field_type) {
            errors.push(MappingIssue::TypeNotSupported {
                role,
                key: key.to_string(),
                field_type: field.field_type,
                allowed: rule.allowed_types.clone(),
            });
            continue;
        }
        if let (Some(max), Some(unique)) = (rule.max_count, field.unique_values) {
            if unique > max {
                warnings.push(MappingIssue::TooManyValues {
                    role,
                    key: key.to_string(),
                    unique_values: unique,
                    max,
                });
            }
        }
    }
    warnings.extend(
        roles_by_field
            .into_iter()
            .filter(|(_, roles)| roles.len() > 1)
            .map(|(key, roles)| MappingIssue::DuplicateField {
                key: key.to_string(),
                roles,
            }),
    );
    MappingReport {
        ok: errors.is_empty(),
        missing_roles,
        errors,
        warnings,
    }
}

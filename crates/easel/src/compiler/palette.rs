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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
/// Named colour schemes a chart can draw its series colours from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    #[default]
    Default,
    Business,
    Nature,
    Warm,
    Cool,
    Grayscale,
    Pastel,
}
impl Palette {
    pub const ALL: [Palette; 7] = [
        Palette::Default,
        Palette::Business,
        Palette::Nature,
        Palette::Warm,
        Palette::Cool,
        Palette::Grayscale,
        Palette::Pastel,
    ];
    pub fn name(self) -> &'static str {
        match self {
            Palette::Default => "default",
            Palette::Business => "business",
            Palette::Nature => "nature",
            Palette::Warm => "warm",
            Palette::Cool => "cool",
            Palette::Grayscale => "grayscale",
            Palette::Pastel => "pastel",
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            Palette::Default => "Default",
            Palette::Business => "Business",
            Palette::Nature => "Nature",
            Palette::Warm => "Warm",
            Palette::Cool => "Cool",
            Palette::Grayscale => "Grayscale",
            Palette::Pastel => "Pastel",
        }
    }
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Palette::Default => &[
                "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452",
                "#9a60b4", "#ea7ccc", "#ff9f7f",
            ],
            Palette::Business => &[
                "#2E86AB", "#A23B72", "#F18F01", "#C73E1D", "#592E83", "#3A86FF", "#8338EC",
                "#FF006E", "#FB5607", "#FFBE0B",
            ],
            Palette::Nature => &[
                "#2D5016", "#4A7C59", "#8FBC94", "#C3E8BD", "#F4F1DE", "#6B4423", "#8B7355",
                "#A67B5B", "#C19A6B", "#D4AF37",
            ],
            Palette::Warm => &[
                "#FF6B6B", "#FF8E53", "#FFA726", "#FFB74D", "#FFCC02", "#FF9800", "#FF5722",
                "#E64A19", "#D84315", "#BF360C",
            ],
            Palette::Cool => &[
                "#2196F3", "#03A9F4", "#00BCD4", "#009688", "#4CAF50", "#8BC34A", "#CDDC39",
                "#FFEB3B", "#FFC107", "#FF9800",
            ],
            Palette::Grayscale => &[
                "#212121", "#424242", "#616161", "#757575", "#9E9E9E", "#BDBDBD", "#E0E0E0",
                "#EEEEEE", "#F5F5F5", "#FAFAFA",
            ],
            Palette::Pastel => &[
                "#A8DADC", "#F4A261", "#E9C46A", "#B5E48C", "#CDB4DB", "#FFC8DD", "#BDE0FE",
                "#A2D2FF", "#FFAFCC", "#D8E2DC",
            ],
        }
    }
}
impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for Palette {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Palette::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown colour scheme '{wanted}'"))
    }
}
/// A non-empty custom list wins outright; otherwise the palette's colours.
pub fn resolve_colors(custom: &[String], palette: Palette) -> Vec<String> {
    let custom: Vec<String> = custom
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if custom.is_empty() {
        palette.colors().iter().map(|c| (*c).to_string()).collect()
    } else {
        custom
    }
}

//! Static metric catalog.
//!
//! The catalog is display metadata only: labels, units and colors are read by
//! the report and TUI layers, never by the pipeline math.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One of the three measured quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKey {
    Speed,
    Energy,
    Mass,
}

/// Display metadata for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricMeta {
    pub label: &'static str,
    pub unit: &'static str,
    /// `#rrggbb` display color.
    pub color: &'static str,
}

const SPEED_META: MetricMeta = MetricMeta {
    label: "Speed",
    unit: "km/h",
    color: "#06b6d4",
};

const ENERGY_META: MetricMeta = MetricMeta {
    label: "Energy",
    unit: "kWh",
    color: "#a78bfa",
};

const MASS_META: MetricMeta = MetricMeta {
    label: "Lifted mass",
    unit: "kg",
    color: "#22c55e",
};

impl MetricKey {
    pub const ALL: [MetricKey; 3] = [MetricKey::Speed, MetricKey::Energy, MetricKey::Mass];

    pub fn meta(self) -> &'static MetricMeta {
        match self {
            MetricKey::Speed => &SPEED_META,
            MetricKey::Energy => &ENERGY_META,
            MetricKey::Mass => &MASS_META,
        }
    }

    /// Lowercase key as used on the CLI and in exports.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::Speed => "speed",
            MetricKey::Energy => "energy",
            MetricKey::Mass => "mass",
        }
    }

    pub fn next(self) -> Self {
        match self {
            MetricKey::Speed => MetricKey::Energy,
            MetricKey::Energy => MetricKey::Mass,
            MetricKey::Mass => MetricKey::Speed,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            MetricKey::Speed => MetricKey::Mass,
            MetricKey::Energy => MetricKey::Speed,
            MetricKey::Mass => MetricKey::Energy,
        }
    }
}

impl MetricMeta {
    /// Decode the display color into RGB components.
    ///
    /// Falls back to white when the color is not a `#rrggbb` literal.
    pub fn rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(self.color).unwrap_or((255, 255, 255))
    }
}

fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some((r, g, b))
}

//! Palette registry and the scalar → RGB mapper.
//! - Single source for supported names
//! - Palette data is matplotlib's 256-entry float tables (`scarlet`)
//! - Lookup is by bin, not interpolation: `idx = min(floor(t * N), N - 1)`
//! - Channels are scaled by 255 and truncated
//! - Mapping is pure: tables load once, safe to run per frame on any thread

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use depthview_types::Rgb;
use scarlet::colormap::ListedColorMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full scale of a raw scanline sample.
pub const SCALE: f64 = 255.0;

/// Built-in colormap names (case-sensitive).
pub const SUPPORTED: [&str; 5] = ["viridis", "plasma", "inferno", "magma", "cividis"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown colormap '{name}'. Supported: {}", SUPPORTED.join(", "))]
pub struct UnknownColormap {
    pub name: String,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
}

impl Colormap {
    pub const ALL: [Colormap; 5] = [
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Inferno,
        Colormap::Magma,
        Colormap::Cividis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Viridis => "viridis",
            Colormap::Plasma => "plasma",
            Colormap::Inferno => "inferno",
            Colormap::Magma => "magma",
            Colormap::Cividis => "cividis",
        }
    }

    fn listed(self) -> ListedColorMap {
        match self {
            Colormap::Viridis => ListedColorMap::viridis(),
            Colormap::Plasma => ListedColorMap::plasma(),
            Colormap::Inferno => ListedColorMap::inferno(),
            Colormap::Magma => ListedColorMap::magma(),
            Colormap::Cividis => ListedColorMap::cividis(),
        }
    }

    /// RGB float table of this palette, indexed in `ALL` order.
    fn table(self) -> &'static [[f64; 3]] {
        static TABLES: OnceLock<Vec<Vec<[f64; 3]>>> = OnceLock::new();
        let tables = TABLES.get_or_init(|| Colormap::ALL.iter().map(|c| c.listed().vals).collect());
        &tables[self as usize]
    }

    /// Evaluate the palette at `t` in `[0, 1]`. Values outside are clamped, NaN reads as 0.
    pub fn eval(self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let lut = self.table();
        let idx = ((t * lut.len() as f64) as usize).min(lut.len() - 1);
        let [r, g, b] = lut[idx];
        [to_channel(r), to_channel(g), to_channel(b)]
    }

    /// Map one raw sample (nominally `0..=255`) to a color.
    pub fn map_value(self, value: f64) -> Rgb {
        self.eval(value / SCALE)
    }
}

fn to_channel(c: f64) -> u8 {
    (c * SCALE) as u8
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = UnknownColormap;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colormap::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownColormap { name: s.to_string() })
    }
}

/// Colormap a single scanline, one triple per sample.
pub fn map_frame(values: &[f64], colormap: Colormap) -> Vec<Rgb> {
    values.iter().map(|&v| colormap.map_value(v)).collect()
}

/// Colormap a batch of scanlines with one palette.
pub fn map_frames<'a, I>(frames: I, colormap: Colormap) -> Vec<Vec<Rgb>>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    frames
        .into_iter()
        .map(|values| map_frame(values, colormap))
        .collect()
}

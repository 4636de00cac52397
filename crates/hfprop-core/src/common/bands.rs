//! Named amateur bands and their nominal probe frequencies.
//!
//! The table is an ordinary value so alternate regional band plans can be
//! supplied at construction time instead of patching a global.

use serde::Serialize;

pub const ENGINE_MIN_FREQUENCY_MHZ: f64 = 2.0;
pub const ENGINE_MAX_FREQUENCY_MHZ: f64 = 30.0;
pub const BAND_MATCH_TOLERANCE_MHZ: f64 = 1.0;

const AMATEUR_HF_BANDS: [(&str, f64); 11] = [
    ("160m", 1.9),
    ("80m", 3.6),
    ("60m", 5.3),
    ("40m", 7.1),
    ("30m", 10.1),
    ("20m", 14.1),
    ("17m", 18.1),
    ("15m", 21.1),
    ("12m", 24.9),
    ("10m", 28.1),
    ("6m", 50.1),
];

pub fn within_engine_range(frequency_mhz: f64) -> bool {
    frequency_mhz.is_finite()
        && (ENGINE_MIN_FREQUENCY_MHZ..=ENGINE_MAX_FREQUENCY_MHZ).contains(&frequency_mhz)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub name: String,
    pub frequency_mhz: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    bands: Vec<Band>,
}

impl BandTable {
    /// Builds a table ordered by ascending nominal frequency.
    pub fn new<N>(bands: impl IntoIterator<Item = (N, f64)>) -> Self
    where
        N: Into<String>,
    {
        let mut bands = bands
            .into_iter()
            .map(|(name, frequency_mhz)| Band {
                name: name.into(),
                frequency_mhz,
            })
            .collect::<Vec<_>>();
        bands.sort_by(|a, b| a.frequency_mhz.total_cmp(&b.frequency_mhz));
        Self { bands }
    }

    pub fn amateur_hf() -> Self {
        Self::new(AMATEUR_HF_BANDS)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Band> {
        self.bands.iter()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Frequencies to probe when a request names none.
    ///
    /// A band just under the engine floor (160m) is probed at the floor,
    /// which stays inside its match tolerance. Bands above the ceiling (6m)
    /// are skipped.
    pub fn probe_frequencies(&self) -> Vec<f64> {
        self.bands
            .iter()
            .filter_map(|band| probe_for(band.frequency_mhz))
            .collect()
    }
}

fn probe_for(nominal_mhz: f64) -> Option<f64> {
    if within_engine_range(nominal_mhz) {
        Some(nominal_mhz)
    } else if nominal_mhz < ENGINE_MIN_FREQUENCY_MHZ
        && ENGINE_MIN_FREQUENCY_MHZ - nominal_mhz < BAND_MATCH_TOLERANCE_MHZ
    {
        Some(ENGINE_MIN_FREQUENCY_MHZ)
    } else {
        None
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self::amateur_hf()
    }
}

impl<'a> IntoIterator for &'a BandTable {
    type Item = &'a Band;
    type IntoIter = std::slice::Iter<'a, Band>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

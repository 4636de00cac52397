use crate::common::{BAND_MATCH_TOLERANCE_MHZ, BandTable};
use crate::domain::{BandEntry, BandResult, BandStatus, PredictionResult};

/// Projects engine rows onto named bands.
///
/// Each band takes the first row within tolerance of its nominal frequency.
/// Bands without a matching row are left out.
pub fn map_bands(result: &PredictionResult, table: &BandTable) -> BandResult {
    let bands = table
        .iter()
        .filter_map(|band| {
            result
                .frequencies
                .iter()
                .find(|line| (line.frequency - band.frequency_mhz).abs() < BAND_MATCH_TOLERANCE_MHZ)
                .map(|line| BandEntry {
                    band: band.name.clone(),
                    nominal_frequency: band.frequency_mhz,
                    line: *line,
                    status: BandStatus::from_reliability(line.reliability),
                })
        })
        .collect::<Vec<_>>();

    let best_band = bands
        .iter()
        .filter(|entry| entry.line.reliability.is_finite())
        .max_by(|a, b| a.line.reliability.total_cmp(&b.line.reliability))
        .map(|entry| entry.band.clone());

    BandResult {
        muf: result.muf,
        bands,
        best_band,
        error: result.error.clone(),
        engine_warning: result.engine_warning.clone(),
    }
}

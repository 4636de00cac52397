//! Engine input deck generation.
//!
//! The engine reads a flat `key value` file whose grammar is fixed; numeric
//! precision here is part of the contract.

use super::serialization::directory_argument;
use crate::domain::PredictionRequest;
use std::fmt::Write as _;
use std::path::Path;

pub const BANDWIDTH_HZ: f64 = 3000.0;
pub const ANTENNA_GAIN_DBI: f64 = 0.0;
pub const ANTENNA_MODEL: &str = "ISOTROPIC";
pub const MODULATION: &str = "ANALOG";
pub const PATH_KIND: &str = "SHORTPATH";
pub const REPORT_COLUMNS: &str = "RPT_PR | RPT_SNR | RPT_BCR";

/// Directories the engine needs to know about, passed as absolute paths.
#[derive(Debug, Clone, Copy)]
pub struct EngineLayout<'a> {
    pub data_dir: &'a Path,
    pub report_dir: &'a Path,
}

/// Watts to dBkW, rounded to one decimal.
pub fn tx_power_dbkw(watts: f64) -> f64 {
    let dbkw = (10.0 * (watts / 1000.0).log10() * 10.0).round() / 10.0;
    // -0.0 would render as "-0.0"
    if dbkw == 0.0 { 0.0 } else { dbkw }
}

pub fn serialize_request(request: &PredictionRequest, layout: &EngineLayout<'_>) -> String {
    let frequencies = request
        .frequencies_mhz
        .iter()
        .map(|frequency| format!("{frequency:.3}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut deck = String::new();
    let mut line = |key: &str, value: String| {
        let _ = writeln!(deck, "{key} {value}");
    };

    line("PathName", quoted("HF Path Prediction"));
    line("PathTXName", quoted("TX"));
    line("Path.L_tx.lat", format!("{:.4}", request.tx.lat));
    line("Path.L_tx.lng", format!("{:.4}", request.tx.lon));
    line("PathRXName", quoted("RX"));
    line("Path.L_rx.lat", format!("{:.4}", request.rx.lat));
    line("Path.L_rx.lng", format!("{:.4}", request.rx.lon));
    line("TXAntFilePath", quoted(ANTENNA_MODEL));
    line("TXGOS", format!("{ANTENNA_GAIN_DBI:.1}"));
    line("RXAntFilePath", quoted(ANTENNA_MODEL));
    line("RXGOS", format!("{ANTENNA_GAIN_DBI:.1}"));
    line("Path.year", request.year.to_string());
    line("Path.month", request.month.to_string());
    line("Path.hour", request.engine_hour().to_string());
    line("Path.SSN", request.ssn.to_string());
    line("Path.frequency", frequencies);
    line("Path.txpower", format!("{:.1}", tx_power_dbkw(request.tx_power_watts)));
    line("Path.BW", format!("{BANDWIDTH_HZ:.1}"));
    line("Path.SNRr", format!("{:.1}", request.required_snr_db));
    line("Path.SNRXXp", request.required_reliability.to_string());
    line("Path.ManMadeNoise", quoted(request.noise.as_str()));
    line("Path.Modulation", quoted(MODULATION));
    line("Path.SorL", quoted(PATH_KIND));
    line("RptFileFormat", quoted(REPORT_COLUMNS));
    // single-point prediction: the area box collapses onto the receiver
    for corner in ["LL", "LR", "UL", "UR"] {
        line(&format!("{corner}.lat"), format!("{:.4}", request.rx.lat));
        line(&format!("{corner}.lng"), format!("{:.4}", request.rx.lon));
    }
    line("DataFilePath", quoted(&directory_argument(layout.data_dir)));
    line("RptFilePath", quoted(&directory_argument(layout.report_dir)));

    deck
}

fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

#[cfg(test)]
mod tests {
    use super::{EngineLayout, serialize_request, tx_power_dbkw};
    use crate::domain::{Coordinates, NoiseEnvironment, PredictionRequest};
    use std::path::Path;

    fn request(hour: u32) -> PredictionRequest {
        PredictionRequest {
            tx: Coordinates::new(40.7128, -74.006),
            rx: Coordinates::new(51.5074, -0.1278),
            year: 2024,
            month: 6,
            hour,
            ssn: 85,
            tx_power_watts: 100.0,
            frequencies_mhz: vec![7.1, 14.1, 21.0],
            noise: NoiseEnvironment::Rural,
            required_reliability: 90,
            required_snr_db: 10.0,
        }
    }

    fn layout() -> EngineLayout<'static> {
        EngineLayout {
            data_dir: Path::new("/opt/engine/data"),
            report_dir: Path::new("/tmp/hfprop"),
        }
    }

    fn value_of<'a>(deck: &'a str, key: &str) -> &'a str {
        deck.lines()
            .find_map(|line| line.strip_prefix(key).and_then(|rest| rest.strip_prefix(' ')))
            .unwrap_or_else(|| panic!("key {key} missing from deck"))
    }

    #[test]
    fn hour_zero_serializes_as_twenty_four() {
        assert_eq!(value_of(&serialize_request(&request(0), &layout()), "Path.hour"), "24");
        for hour in 1..24 {
            let deck = serialize_request(&request(hour), &layout());
            assert_eq!(value_of(&deck, "Path.hour"), hour.to_string());
        }
    }

    #[test]
    fn tx_power_converts_watts_to_dbkw() {
        assert_eq!(tx_power_dbkw(100.0), -10.0);
        assert_eq!(tx_power_dbkw(1000.0), 0.0);
        assert_eq!(tx_power_dbkw(1500.0), 1.8);
        assert_eq!(tx_power_dbkw(5.0), -23.0);
        assert_eq!(format!("{:.1}", tx_power_dbkw(999.0)), "0.0");

        let deck = serialize_request(&request(12), &layout());
        assert_eq!(value_of(&deck, "Path.txpower"), "-10.0");
    }

    #[test]
    fn deck_matches_engine_grammar() {
        let deck = serialize_request(&request(12), &layout());
        let expected = "\
PathName \"HF Path Prediction\"
PathTXName \"TX\"
Path.L_tx.lat 40.7128
Path.L_tx.lng -74.0060
PathRXName \"RX\"
Path.L_rx.lat 51.5074
Path.L_rx.lng -0.1278
TXAntFilePath \"ISOTROPIC\"
TXGOS 0.0
RXAntFilePath \"ISOTROPIC\"
RXGOS 0.0
Path.year 2024
Path.month 6
Path.hour 12
Path.SSN 85
Path.frequency 7.100, 14.100, 21.000
Path.txpower -10.0
Path.BW 3000.0
Path.SNRr 10.0
Path.SNRXXp 90
Path.ManMadeNoise \"RURAL\"
Path.Modulation \"ANALOG\"
Path.SorL \"SHORTPATH\"
RptFileFormat \"RPT_PR | RPT_SNR | RPT_BCR\"
LL.lat 51.5074
LL.lng -0.1278
LR.lat 51.5074
LR.lng -0.1278
UL.lat 51.5074
UL.lng -0.1278
UR.lat 51.5074
UR.lng -0.1278
DataFilePath \"/opt/engine/data/\"
RptFilePath \"/tmp/hfprop/\"
";
        assert_eq!(deck, expected);
    }

    #[test]
    fn serialization_is_deterministic() {
        let first = serialize_request(&request(3), &layout());
        let second = serialize_request(&request(3), &layout());
        assert_eq!(first, second);
    }
}

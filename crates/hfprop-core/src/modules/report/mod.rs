//! Engine report scanning.

mod parser;

pub use parser::{
    MIN_ROW_FIELDS, ParsedReport, SECTION_END, SECTION_START, TableState, extract_muf,
    parse_data_row, parse_report,
};

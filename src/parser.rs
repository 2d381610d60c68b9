//! Line-oriented parsing of the semicolon-delimited registry dataset.
//!
//! Malformed lines (blank, or fewer than five fields) are skipped silently;
//! a skip never aborts parsing of subsequent lines.

use crate::models::Municipality;
use tracing::debug;

/// Outcome of a full parse pass.
pub struct ParseOutcome {
    pub municipalities: Vec<Municipality>,
    pub lines_skipped: u64,
}

/// Trims and strips control characters and the BOM from one raw field.
fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && *c != '\u{feff}')
        .collect();
    cleaned.trim().to_string()
}

/// Parses one data line into a [`Municipality`].
///
/// Returns `None` for blank lines and lines with fewer than five fields.
/// The UF field is uppercased; all five fields are sanitized.
pub fn parse_line(line: &str) -> Option<Municipality> {
    if line.trim().is_empty() {
        return None;
    }
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() < 5 {
        return None;
    }
    Some(Municipality {
        tom: sanitize(parts[0]),
        ibge: sanitize(parts[1]),
        name_tom: sanitize(parts[2]),
        name_ibge: sanitize(parts[3]),
        uf: sanitize(parts[4]).to_uppercase(),
    })
}

/// True when the line looks like the dataset header rather than data.
///
/// The upstream CSV ships with an optional header mentioning the IBGE label.
fn is_header(line: &str) -> bool {
    line.to_uppercase().contains("IBGE")
}

/// Parses the full dataset, skipping an optional leading header line.
pub fn parse_lines(lines: &[String]) -> ParseOutcome {
    let start = match lines.first() {
        Some(first) if is_header(first) => 1,
        _ => 0,
    };

    let mut municipalities = Vec::with_capacity(lines.len().saturating_sub(start));
    let mut lines_skipped = 0u64;

    for (i, line) in lines.iter().enumerate().skip(start) {
        match parse_line(line) {
            Some(m) => municipalities.push(m),
            None => {
                if !line.trim().is_empty() {
                    debug!(line_number = i + 1, "Skipping malformed line");
                }
                lines_skipped += 1;
            }
        }
    }

    ParseOutcome {
        municipalities,
        lines_skipped,
    }
}

//! Parser for operator-pasted ranking data.
//!
//! The operator copies rows out of whatever spreadsheet or chat window the
//! tournament software produced, so the layout is unknown: tab-separated
//! columns, comma-separated, whitespace-separated, or one "Round N" line
//! followed by a member-id line. Malformed rows are skipped, never fatal;
//! the parse returns whatever subset validated and the caller decides
//! whether the result is too small to apply.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// One accepted ranking entry. `position` is dense arrival order, not any
/// rank column from the input (there is none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRow {
    pub round: u32,
    pub position: u32,
    pub member_id: String,
    pub name: Option<String>,
    pub credit: Option<String>,
    pub last_bet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Columnar,
    LineByLine,
    Auto,
}

fn round_anywhere() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)round\s*(\d+)").unwrap())
}

fn round_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^round\s+\d+$").unwrap())
}

fn all_digits_longer_than_2(s: &str) -> bool {
    s.len() > 2 && s.chars().all(|c| c.is_ascii_digit())
}

/// Header rows like "ROUND  MB  NAME  CREDIT". A data row such as
/// "Round 1\t60050" also starts with "round", so a row only counts as a
/// header when it carries no digits at all.
fn is_header_row(row: &str) -> bool {
    const HEADER_TOKENS: [&str; 4] = ["round", "mb", "name", "credit"];
    if row.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    row.split_whitespace()
        .next()
        .map(|first| HEADER_TOKENS.contains(&first.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn split_columns(row: &str) -> Vec<&str> {
    let cols: Vec<&str> = if row.contains('\t') {
        row.split('\t').collect()
    } else if row.contains(',') {
        row.split(',').collect()
    } else {
        row.split_whitespace().collect()
    };
    cols.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).collect()
}

/// Columnar detection: the row has a tab, or mentions "round" and splits
/// into at least two tokens, and the token in member position is purely
/// numeric and longer than two digits.
fn row_looks_columnar(row: &str) -> bool {
    if !(row.contains('\t') || (row.to_lowercase().contains("round") && row.split_whitespace().count() >= 2)) {
        return false;
    }
    let parts: Vec<&str> = if row.contains('\t') {
        row.split('\t').map(str::trim).collect()
    } else {
        row.split_whitespace().collect()
    };
    if parts.len() < 2 {
        return false;
    }
    let (round_part, member_part) = if parts.len() >= 3 {
        (format!("{} {}", parts[0], parts[1]), parts[2])
    } else {
        (parts[0].to_string(), parts[1])
    };
    round_anywhere().is_match(&round_part) && all_digits_longer_than_2(member_part)
}

/// Checked in precedence order: columnar, then line-by-line, then the
/// tolerant fallback.
pub fn detect_format(clean_rows: &[&str]) -> DataFormat {
    if clean_rows.iter().take(5).any(|row| row_looks_columnar(row)) {
        return DataFormat::Columnar;
    }

    if clean_rows.len() >= 2 {
        let mut consecutive_pairs = 0;
        let mut i = 0;
        while i + 1 < clean_rows.len().min(10) {
            let marker = clean_rows[i];
            let member = clean_rows[i + 1];
            if round_line().is_match(marker) && all_digits_longer_than_2(member) {
                consecutive_pairs += 1;
            } else {
                break;
            }
            i += 2;
        }
        if consecutive_pairs >= 2 {
            return DataFormat::LineByLine;
        }
    }

    DataFormat::Auto
}

/// Extracted but not yet validated pair, plus trailing columns if any.
struct RawEntry {
    round_marker: String,
    member_value: String,
    name: Option<String>,
    credit: Option<String>,
    last_bet: Option<String>,
}

fn extract_columnar(row: &str) -> Option<RawEntry> {
    let cols = split_columns(row);
    if cols.len() < 2 {
        return None;
    }
    // "Round 1  60050  alice" splits the marker across two tokens
    let joint_marker = cols.len() >= 3
        && cols[0].eq_ignore_ascii_case("round")
        && cols[1].chars().all(|c| c.is_ascii_digit());
    let (marker, rest) = if joint_marker {
        (format!("{} {}", cols[0], cols[1]), &cols[2..])
    } else {
        (cols[0].to_string(), &cols[1..])
    };
    Some(RawEntry {
        round_marker: marker,
        member_value: rest.first()?.to_string(),
        name: rest.get(1).map(|s| s.to_string()),
        credit: rest.get(2).map(|s| s.to_string()),
        last_bet: rest.get(3).map(|s| s.to_string()),
    })
}

/// Takes the integer after "round"; the member id keeps its leading digit
/// run when it starts with one, otherwise the raw token.
fn validate(entry: RawEntry, round_number: &mut Option<u32>, accepted: usize) -> Option<RankingRow> {
    let caps = round_anywhere().captures(&entry.round_marker)?;
    let round: u32 = caps.get(1)?.as_str().parse().ok()?;

    match round_number {
        None => *round_number = Some(round),
        Some(fixed) if *fixed != round => {
            debug!(expected = *fixed, got = round, "dropping row from different round");
            return None;
        }
        Some(_) => {}
    }

    let member_value = entry.member_value.trim();
    if member_value.is_empty() {
        return None;
    }
    let digits: String = member_value.chars().take_while(|c| c.is_ascii_digit()).collect();
    let member_id = if digits.is_empty() { member_value.to_string() } else { digits };

    Some(RankingRow {
        round,
        position: accepted as u32 + 1,
        member_id,
        name: entry.name,
        credit: entry.credit,
        last_bet: entry.last_bet,
    })
}

/// Parses raw pasted text into ordered ranking rows. Empty input or total
/// failure yields an empty vec; rows disagreeing with the first accepted
/// row's round are dropped individually.
pub fn parse_ranking_data(raw: &str) -> Vec<RankingRow> {
    let clean_rows: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .filter(|row| !is_header_row(row))
        .collect();

    if clean_rows.is_empty() {
        return Vec::new();
    }

    let format = detect_format(&clean_rows);
    debug!(?format, rows = clean_rows.len(), "parsing pasted ranking data");

    let mut rows = Vec::new();
    let mut round_number: Option<u32> = None;

    match format {
        DataFormat::Columnar | DataFormat::Auto => {
            for row in &clean_rows {
                if let Some(entry) = extract_columnar(row) {
                    if let Some(parsed) = validate(entry, &mut round_number, rows.len()) {
                        rows.push(parsed);
                    }
                }
            }
        }
        DataFormat::LineByLine => {
            let mut i = 0;
            while i + 1 < clean_rows.len() {
                let marker = clean_rows[i];
                let member = clean_rows[i + 1];
                i += 2;
                if !round_anywhere().is_match(marker) {
                    continue;
                }
                if !member.chars().all(|c| c.is_ascii_digit()) || member.is_empty() {
                    continue;
                }
                let entry = RawEntry {
                    round_marker: marker.to_string(),
                    member_value: member.to_string(),
                    name: None,
                    credit: None,
                    last_bet: None,
                };
                if let Some(parsed) = validate(entry, &mut round_number, rows.len()) {
                    rows.push(parsed);
                }
            }
        }
    }

    rows
}

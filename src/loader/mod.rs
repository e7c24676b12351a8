//! Input-file discovery and the filename → (year, month) convention.
//!
//! Every later stage depends on the chronological ordering established
//! here. Filenames that do not match a convention are excluded from
//! processing, never treated as errors.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const RAW_PREFIX: &str = "Consolidated_list_for_";
pub const RAW_SUFFIX: &str = "_Read_Only";
pub const MONTHLY_PREFIX: &str = "fund_price_scheme_";

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ── File dates ────────────────────────────────────────────────────────────────

/// Chronological key recovered from a source filename. Years are always
/// 2000 + the two-digit suffix; dates outside 2000–2099 are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileDate {
    pub year: i32,
    pub month: u32,
}

impl FileDate {
    /// Canonical `YYYY-MM` month key.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// A discovered input file with its parsed date.
#[derive(Debug, Clone)]
pub struct DatedFile {
    pub path: PathBuf,
    pub date: FileDate,
}

// ── Filename parsing ──────────────────────────────────────────────────────────

// Exact-case: only the prefix, suffix and extension match loosely.
fn month_number(abbrev: &str) -> Option<u32> {
    MONTH_ABBREVS
        .iter()
        .position(|m| *m == abbrev)
        .map(|i| i as u32 + 1)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() < suffix.len() {
        return None;
    }
    let split = s.len() - suffix.len();
    let tail = s.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        s.get(..split)
    } else {
        None
    }
}

/// `Consolidated_list_for_<Mon>_<YY>_Read_Only` → FileDate.
fn parse_consolidated_stem(stem: &str) -> Option<FileDate> {
    let rest = strip_prefix_ignore_case(stem, RAW_PREFIX)?;
    let middle = strip_suffix_ignore_case(rest, RAW_SUFFIX)?;
    let (mon, yy) = middle.split_once('_')?;
    let month = month_number(mon)?;
    if yy.is_empty() || yy.len() > 2 || !yy.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = 2000 + yy.parse::<i32>().ok()?;
    Some(FileDate { year, month })
}

/// Parse `Consolidated_list_for_Dec_25_Read_Only.xls(x)`.
pub fn parse_raw_filename(name: &str) -> Option<FileDate> {
    parse_consolidated_stem(strip_workbook_ext(name)?)
}

/// Parse `Consolidated_list_for_Dec_25_Read_Only.json` (per-month dump).
pub fn parse_consolidated_filename(name: &str) -> Option<FileDate> {
    parse_consolidated_stem(strip_suffix_ignore_case(name, ".json")?)
}

/// Parse `fund_price_scheme_2025-12.json` (monthly snapshot).
pub fn parse_monthly_filename(name: &str) -> Option<FileDate> {
    let key = strip_suffix_ignore_case(name.strip_prefix(MONTHLY_PREFIX)?, ".json")?;
    let (y, m) = key.split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    if !y.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(FileDate {
        year: y.parse().ok()?,
        month: m.parse().ok()?,
    })
}

fn strip_workbook_ext(name: &str) -> Option<&str> {
    strip_suffix_ignore_case(name, ".xlsx").or_else(|| strip_suffix_ignore_case(name, ".xls"))
}

/// Workbook filename without its `.xls`/`.xlsx` extension, for naming the
/// JSON dump.
pub fn json_base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_workbook_ext(&name).map(str::to_string).unwrap_or(name)
}

// ── Discovery ─────────────────────────────────────────────────────────────────

fn dated_entries(dir: &Path, parse: fn(&str) -> Option<FileDate>) -> Result<Vec<DatedFile>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Could not list directory {:?}", dir))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date) = parse(name) {
            out.push(DatedFile { path, date });
        }
    }
    // Stable: ties on (year, month) keep directory-listing order.
    out.sort_by_key(|f| f.date);
    Ok(out)
}

/// All raw workbooks in `dir`, ascending by (year, month).
pub fn discover_raw_files(dir: &Path) -> Result<Vec<DatedFile>> {
    dated_entries(dir, parse_raw_filename)
}

/// All `fund_price_scheme_YYYY-MM.json` snapshots, ascending by (year, month).
pub fn discover_monthly_snapshots(dir: &Path) -> Result<Vec<DatedFile>> {
    dated_entries(dir, parse_monthly_filename)
}

/// The most recent per-month consolidated dump, if any.
pub fn latest_consolidated_dump(dir: &Path) -> Result<Option<DatedFile>> {
    Ok(dated_entries(dir, parse_consolidated_filename)?.pop())
}

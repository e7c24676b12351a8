//! Sheet extraction: workbook bytes → ordered [`SheetRow`]s.
//!
//! The consolidated sheet is positionally fixed: a title/header block of
//! [`SKIP_ROWS`] rows, then five columns (trustee, scheme, fund, unit
//! price, notes). A row is data iff its unit-price cell is a finite
//! number; the row immediately below it carries the Chinese labels. The
//! pairing must stay exact — an off-by-one silently corrupts every
//! Chinese label in the file.

use crate::models::SheetRow;
use calamine::{
    open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets, XlsError, XlsxError,
};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Title + header rows before data starts.
pub const SKIP_ROWS: usize = 5;

/// Fixed password Excel applies when a workbook is saved with read-only
/// protection (SheetJS #2963).
pub const WORKBOOK_PASSWORD: &str = "VelvetSweatshop";

const COL_TRUSTEE: usize = 0;
const COL_SCHEME: usize = 1;
const COL_FUND: usize = 2;
const COL_UNIT_PRICE: usize = 3;
const COL_NOTES: usize = 4;

/// Per-file extraction failures. `Protected` is kept distinct so the
/// batch loop can tell "unprotect this file manually" from a code bug.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(
        "workbook encryption is unsupported (the standard read-only password \
         \"VelvetSweatshop\" did not unlock it); re-save the file without \
         protection and re-run"
    )]
    Protected,
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("failed to read workbook file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
}

#[derive(Debug)]
pub struct ExtractedSheet {
    pub sheet_name: String,
    pub rows: Vec<SheetRow>,
}

fn is_password_error(err: &calamine::Error) -> bool {
    matches!(
        err,
        calamine::Error::Xls(XlsError::Password) | calamine::Error::Xlsx(XlsxError::Password)
    )
}

/// Read the first sheet of a workbook into data rows. Workbooks with the
/// intended sheet elsewhere are unsupported.
pub fn extract_workbook(path: &Path) -> Result<ExtractedSheet, ExtractError> {
    match open_workbook_auto(path) {
        Ok(mut workbook) => read_first_sheet(&mut workbook),
        Err(e) if is_password_error(&e) => extract_protected(path),
        Err(e) => Err(ExtractError::Workbook(e)),
    }
}

/// Read-only protected workbooks carry standard Office encryption under
/// the fixed password. Decrypt in memory and re-open the plaintext;
/// only encryption schemes the decrypter cannot handle surface as
/// `Protected`.
fn extract_protected(path: &Path) -> Result<ExtractedSheet, ExtractError> {
    let raw = std::fs::read(path)?;
    let plain = office_crypto::decrypt_from_bytes(raw, WORKBOOK_PASSWORD)
        .map_err(|_| ExtractError::Protected)?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(plain))?;
    read_first_sheet(&mut workbook)
}

fn read_first_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
) -> Result<ExtractedSheet, ExtractError> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ExtractError::NoSheets)?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let grid: Vec<&[Data]> = range.rows().collect();

    Ok(ExtractedSheet {
        sheet_name,
        rows: rows_from_grid(&grid),
    })
}

/// The core scan: skip the header block, keep numeric-price rows, read
/// Chinese labels from each kept row's immediate successor.
pub fn rows_from_grid(grid: &[&[Data]]) -> Vec<SheetRow> {
    let rows = grid.get(SKIP_ROWS..).unwrap_or(&[]);
    let mut out = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let Some(unit_price) = numeric_cell(row.get(COL_UNIT_PRICE)) else {
            continue;
        };
        let next = rows.get(i + 1);

        let trustee_en = cell_str(row.get(COL_TRUSTEE));
        let scheme_en = cell_str(row.get(COL_SCHEME));

        out.push(SheetRow {
            trustee_en: trustee_en.clone(),
            trustee_zh: next.and_then(|r| cell_str(r.get(COL_TRUSTEE))),
            scheme_en: scheme_en.clone(),
            scheme_zh: next.and_then(|r| cell_str(r.get(COL_SCHEME))),
            trustee: trustee_en,
            scheme: scheme_en,
            fund: cell_str(row.get(COL_FUND)),
            fund_zh: next.and_then(|r| cell_str(r.get(COL_FUND))),
            unit_price,
            notes: cell_str(row.get(COL_NOTES)),
        });
    }

    out
}

/// The data/label discriminant: only finite numeric cells qualify.
fn numeric_cell(cell: Option<&Data>) -> Option<f64> {
    match cell {
        Some(Data::Float(f)) if f.is_finite() => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        _ => None,
    }
}

/// Label cell as text; blank and whitespace-only cells are absent.
fn cell_str(cell: Option<&Data>) -> Option<String> {
    match cell {
        Some(Data::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Data::Float(f)) => Some(f.to_string()),
        Some(Data::Int(i)) => Some(i.to_string()),
        _ => None,
    }
}

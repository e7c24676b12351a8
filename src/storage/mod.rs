//! JSON artifact persistence.
//!
//! Every artifact is pretty-printed UTF-8 (the files are diffed by
//! humans) and written atomically — temp file in the target directory,
//! then rename — so a crash mid-write never leaves a torn file where the
//! site expects valid JSON.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const TRUSTEES_SCHEMES_FILE: &str = "trustees_schemes.json";
pub const FUND_PRICE_SCHEME_FILE: &str = "fund_price_scheme.json";
pub const TOP_FUNDS_FILE: &str = "top10_funds_this_month.json";

/// Per-month (trustee, scheme) index filename.
pub fn monthly_pairs_file(month_key: &str) -> String {
    format!("trustees_schemes_{month_key}.json")
}

/// Per-month scheme/fund price snapshot filename.
pub fn monthly_snapshot_file(month_key: &str) -> String {
    format!("fund_price_scheme_{month_key}.json")
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize pretty-printed and write atomically, creating parent
/// directories as needed.
pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Could not create dir {:?}", parent))?;
    }

    let text = serde_json::to_string_pretty(payload).context("Failed to serialize artifact")?;
    let tmp = tmp_path(path);
    fs::write(&tmp, text.as_bytes()).with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move artifact into {:?}", path))?;
    Ok(())
}

/// Read and deserialize one artifact, with the file path in any error.
/// A payload missing an expected field (e.g. its `data` array) fails here.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Malformed artifact {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PricePoint, TopFundsPayload};

    #[test]
    fn test_write_read_round_trip_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        let payload = vec![
            PricePoint { month: "2025-11".into(), price: Some(10.5) },
            PricePoint { month: "2025-12".into(), price: None },
        ];
        write_json(&path, &payload).unwrap();

        let back: Vec<PricePoint> = read_json(&path).unwrap();
        assert_eq!(back, payload);

        // No temp file left behind.
        let names: Vec<String> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["out.json"]);
    }

    #[test]
    fn test_output_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &vec![PricePoint { month: "2025-11".into(), price: Some(1.0) }])
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {"));
        assert!(text.contains("\"month\": \"2025-11\""));
    }

    #[test]
    fn test_read_rejects_payload_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, br#"{"generatedAt":"now"}"#).unwrap();

        let err = read_json::<TopFundsPayload>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(monthly_pairs_file("2025-12"), "trustees_schemes_2025-12.json");
        assert_eq!(monthly_snapshot_file("2025-12"), "fund_price_scheme_2025-12.json");
    }
}

//! Pipeline orchestrator: workbooks → per-month artifacts → canonical
//! split → multi-month merge → leaderboard.
//!
//! ## Run modes
//!
//! `run()` — the full batch:
//!   1. Every raw workbook, ascending by (year, month): extract, fill,
//!      validate, then write that month's consolidated dump, trustee/scheme
//!      index and price snapshot. A failing file is logged and skipped; the
//!      batch continues.
//!   2. Split the latest consolidated dump into the canonical
//!      `trustees_schemes.json` + `fund_price_scheme.json`.
//!   3. Merge all monthly snapshots into the multi-month artifact.
//!   4. Regenerate the top-movers leaderboard.
//!
//! `convert()` — step 1 with raw (unfilled) dumps only, for inspecting a
//! new workbook before committing downstream artifacts.
//!
//! Processing is strictly sequential; there is no retry logic. A failed
//! file needs a corrected source before a re-run.

use crate::config::AppConfig;
use crate::extract;
use crate::loader::{self, DatedFile};
use crate::merge::{self, MonthSnapshot};
use crate::models::{
    ConsolidatedPayload, FundPricePayload, MergedPayload, TrusteesSchemesPayload,
};
use crate::report;
use crate::storage::{self, FUND_PRICE_SCHEME_FILE, TOP_FUNDS_FILE, TRUSTEES_SCHEMES_FILE};
use crate::transform;
use crate::utils;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct Pipeline {
    config: AppConfig,
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub months_written: usize,
    pub files_skipped: usize,
    pub rows_exported: usize,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    fn json_dir(&self) -> &Path {
        &self.config.paths.json_dir
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.config.paths.json_dir.join(name)
    }

    fn public_path(&self, name: &str) -> PathBuf {
        self.config.paths.public_data_dir.join(name)
    }

    fn discover_raw(&self) -> Result<Vec<DatedFile>> {
        let raw_dir = &self.config.paths.raw_dir;
        let files = loader::discover_raw_files(raw_dir)?;
        if files.is_empty() {
            bail!(
                "no workbooks matching Consolidated_list_for_<Mon>_<YY>_Read_Only.xls(x) in {:?}",
                raw_dir
            );
        }
        Ok(files)
    }

    // ── Full batch ────────────────────────────────────────────────────────────

    pub fn run(&self) -> Result<PipelineStats> {
        let files = self.discover_raw()?;
        info!("=== Step 1: {} workbook(s) → per-month artifacts ===", files.len());

        let mut stats = PipelineStats::default();
        let mut skipped: Vec<String> = Vec::new();

        for file in &files {
            let month_key = file.date.month_key();
            match self.process_month(file) {
                Ok(rows) => {
                    stats.months_written += 1;
                    stats.rows_exported += rows;
                }
                Err(e) => {
                    warn!("{} ({:?}): skip — {:#}", month_key, file.path.file_name(), e);
                    stats.files_skipped += 1;
                    skipped.push(month_key);
                }
            }
        }

        info!(
            "{}/{} month(s) written.{}",
            stats.months_written,
            files.len(),
            if skipped.is_empty() {
                String::new()
            } else {
                format!(" Skipped: {}", skipped.join(", "))
            }
        );

        info!("=== Step 2: canonical split (latest month) ===");
        self.split_latest()?;

        info!("=== Step 3: multi-month merge ===");
        self.merge_all()?;

        info!("=== Step 4: leaderboard ===");
        self.leaderboard()?;

        Ok(stats)
    }

    /// One workbook → that month's three artifacts. Any failure unwinds to
    /// the caller's per-file boundary; nothing is written for a failed file.
    fn process_month(&self, file: &DatedFile) -> Result<usize> {
        let extracted = extract::extract_workbook(&file.path)?;
        let filled = transform::forward_fill(extracted.rows);
        transform::ensure_labelled(&filled)?;

        let pairs = transform::unique_pairs(&filled);
        let groups = transform::group_by_scheme(&filled);

        let month_key = file.date.month_key();
        let base = loader::json_base_name(&file.path);
        let source_file = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        storage::write_json(
            &self.json_path(&format!("{base}.json")),
            &ConsolidatedPayload {
                source: source_file,
                sheet: extracted.sheet_name,
                exported_at: utils::now_iso(),
                row_count: filled.len(),
                data: filled.clone(),
            },
        )?;

        storage::write_json(
            &self.json_path(&storage::monthly_pairs_file(&month_key)),
            &TrusteesSchemesPayload {
                source: format!("{base}.json"),
                month_key: Some(month_key.clone()),
                exported_at: utils::now_iso(),
                count: pairs.len(),
                data: pairs,
            },
        )?;

        storage::write_json(
            &self.json_path(&storage::monthly_snapshot_file(&month_key)),
            &FundPricePayload {
                source: format!("{base}.json"),
                month_key: Some(month_key.clone()),
                exported_at: utils::now_iso(),
                count: groups.len(),
                data: groups,
            },
        )?;

        info!("{}: {} rows exported", month_key, filled.len());
        Ok(filled.len())
    }

    // ── Convert only ──────────────────────────────────────────────────────────

    /// Raw workbooks → consolidated dumps with unfilled rows. Same per-file
    /// failure isolation as `run`.
    pub fn convert(&self) -> Result<PipelineStats> {
        let files = self.discover_raw()?;
        let mut stats = PipelineStats::default();
        let mut skipped: Vec<String> = Vec::new();

        for file in &files {
            let base = loader::json_base_name(&file.path);
            match self.convert_one(file, &base) {
                Ok(()) => {
                    stats.months_written += 1;
                    info!("Wrote {base}.json");
                }
                Err(e) => {
                    warn!("Skip {:?}: {:#}", file.path.file_name(), e);
                    stats.files_skipped += 1;
                    skipped.push(file.date.month_key());
                }
            }
        }

        info!(
            "Done. {}/{} file(s) converted.{}",
            stats.months_written,
            files.len(),
            if skipped.is_empty() {
                String::new()
            } else {
                format!(" Skipped: {}", skipped.join(", "))
            }
        );
        Ok(stats)
    }

    fn convert_one(&self, file: &DatedFile, base: &str) -> Result<()> {
        let extracted = extract::extract_workbook(&file.path)?;
        storage::write_json(
            &self.json_path(&format!("{base}.json")),
            &ConsolidatedPayload {
                source: file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                sheet: extracted.sheet_name,
                exported_at: utils::now_iso(),
                row_count: extracted.rows.len(),
                data: extracted.rows,
            },
        )
    }

    // ── Canonical split ───────────────────────────────────────────────────────

    /// Latest consolidated dump → canonical `trustees_schemes.json` +
    /// scalar `fund_price_scheme.json`, and the dump itself rewritten with
    /// forward-filled rows.
    pub fn split_latest(&self) -> Result<()> {
        let latest = loader::latest_consolidated_dump(self.json_dir())?
            .with_context(|| format!("no Consolidated_list_*.json dumps in {:?}", self.json_dir()))?;
        let source_name = latest
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut payload: ConsolidatedPayload = storage::read_json(&latest.path)?;
        let filled = transform::forward_fill(payload.data);
        transform::ensure_labelled(&filled)?;

        let pairs = transform::unique_pairs(&filled);
        let groups = transform::group_by_scheme(&filled);

        storage::write_json(
            &self.json_path(TRUSTEES_SCHEMES_FILE),
            &TrusteesSchemesPayload {
                source: source_name.clone(),
                month_key: None,
                exported_at: utils::now_iso(),
                count: pairs.len(),
                data: pairs,
            },
        )?;

        let scheme_count = groups.len();
        let total_funds: usize = groups.iter().map(|g| g.funds.len()).sum();
        storage::write_json(
            &self.json_path(FUND_PRICE_SCHEME_FILE),
            &FundPricePayload {
                source: source_name.clone(),
                month_key: None,
                exported_at: utils::now_iso(),
                count: scheme_count,
                data: groups,
            },
        )?;
        info!("Wrote {} schemes, {} fund prices from {}", scheme_count, total_funds, source_name);

        // Keep the dump itself forward-filled.
        payload.data = filled;
        payload.row_count = payload.data.len();
        payload.exported_at = utils::now_iso();
        storage::write_json(&latest.path, &payload)?;

        Ok(())
    }

    // ── Merge ─────────────────────────────────────────────────────────────────

    pub fn merge_all(&self) -> Result<()> {
        let snapshots = loader::discover_monthly_snapshots(self.json_dir())?;
        if snapshots.is_empty() {
            bail!(
                "no fund_price_scheme_YYYY-MM.json snapshots in {:?}",
                self.json_dir()
            );
        }

        let canonical_path = self.json_path(FUND_PRICE_SCHEME_FILE);
        if !canonical_path.exists() {
            bail!(
                "missing {:?} — run `mpf-etl split` first",
                canonical_path
            );
        }
        let current: FundPricePayload = storage::read_json(&canonical_path)?;

        let months: Vec<MonthSnapshot> = snapshots
            .iter()
            .map(|s| {
                let payload: FundPricePayload = storage::read_json(&s.path)?;
                Ok(MonthSnapshot {
                    month_key: s.date.month_key(),
                    data: payload.data,
                })
            })
            .collect::<Result<_>>()?;

        let month_keys: Vec<String> = months.iter().map(|m| m.month_key.clone()).collect();
        let merged = merge::merge_months(&current.data, &months);

        let payload = MergedPayload {
            source: current.source,
            exported_at: utils::now_iso(),
            months: month_keys.clone(),
            count: merged.len(),
            data: merged,
        };
        storage::write_json(&canonical_path, &payload)?;
        if self.config.export.mirror_to_public {
            storage::write_json(&self.public_path(FUND_PRICE_SCHEME_FILE), &payload)?;
        }

        info!(
            "Merged {} month(s): {} into {}",
            month_keys.len(),
            month_keys.join(", "),
            FUND_PRICE_SCHEME_FILE
        );
        Ok(())
    }

    // ── Leaderboard ───────────────────────────────────────────────────────────

    pub fn leaderboard(&self) -> Result<()> {
        let payload: MergedPayload = storage::read_json(&self.merged_input_path()?)?;
        let top = report::top_movers(&payload, self.config.export.top_n)?;

        storage::write_json(&self.json_path(TOP_FUNDS_FILE), &top)?;
        if self.config.export.mirror_to_public {
            storage::write_json(&self.public_path(TOP_FUNDS_FILE), &top)?;
        }

        info!(
            "Wrote top {} funds ({} vs {})",
            top.top10.len(),
            top.this_month,
            top.last_month
        );
        Ok(())
    }

    /// Merged artifact location: the artifact dir, falling back to the
    /// public data dir.
    pub fn merged_input_path(&self) -> Result<PathBuf> {
        let in_json = self.json_path(FUND_PRICE_SCHEME_FILE);
        if in_json.exists() {
            return Ok(in_json);
        }
        let in_public = self.public_path(FUND_PRICE_SCHEME_FILE);
        if in_public.exists() {
            return Ok(in_public);
        }
        bail!(
            "{} not found in {:?} or {:?}",
            FUND_PRICE_SCHEME_FILE,
            self.config.paths.json_dir,
            self.config.paths.public_data_dir
        );
    }
}

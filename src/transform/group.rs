//! Grouping and deduplication of filled rows.
//!
//! Both outputs share the same composite key — the raw (untrimmed)
//! English labels, absent treated as empty — but are computed
//! independently from the filled sequence.

use crate::models::{
    FundEntry, SchemeGroup, SchemeInfo, SheetRow, TrusteeInfo, TrusteeSchemePair, UnitPrice,
};
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};

fn group_key(row: &SheetRow) -> (String, String) {
    (
        row.trustee_en.clone().unwrap_or_default(),
        row.scheme_en.clone().unwrap_or_default(),
    )
}

/// Post-fill structural check: every fund row must be traceable to a
/// trustee and scheme. A violation means the sheet had a fund row before
/// any trustee label — malformed input, fatal for that file.
pub fn ensure_labelled(rows: &[SheetRow]) -> Result<()> {
    let bad: Vec<&SheetRow> = rows
        .iter()
        .filter(|r| r.trustee_en.is_none() || r.scheme_en.is_none())
        .collect();

    if !bad.is_empty() {
        let sample: Vec<String> = bad
            .iter()
            .take(3)
            .map(|r| {
                format!(
                    "trustee={:?} scheme={:?} fund={:?}",
                    r.trustee_en, r.scheme_en, r.fund
                )
            })
            .collect();
        bail!(
            "{} row(s) still missing a trustee or scheme label after fill; sample: {}",
            bad.len(),
            sample.join("; ")
        );
    }

    Ok(())
}

/// Unique (trustee, scheme) pairs in first-seen order.
pub fn unique_pairs(rows: &[SheetRow]) -> Vec<TrusteeSchemePair> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut pairs = Vec::new();

    for row in rows {
        if !seen.insert(group_key(row)) {
            continue;
        }
        pairs.push(TrusteeSchemePair {
            trustee: TrusteeInfo::from_row(row),
            scheme: SchemeInfo::from_row(row),
        });
    }

    pairs
}

/// Group rows into schemes, first-seen order. Labels (including Chinese)
/// are frozen at the first row per key and never reconciled against later
/// rows that disagree.
pub fn group_by_scheme(rows: &[SheetRow]) -> Vec<SchemeGroup> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<SchemeGroup> = Vec::new();

    for row in rows {
        let slot = match index.get(&group_key(row)) {
            Some(&i) => i,
            None => {
                groups.push(SchemeGroup {
                    trustee: TrusteeInfo::from_row(row),
                    scheme: SchemeInfo::from_row(row),
                    funds: Vec::new(),
                });
                index.insert(group_key(row), groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[slot].funds.push(FundEntry {
            fund: row.fund.clone(),
            zh: row.fund_zh.clone(),
            unit_price: UnitPrice::Scalar(row.unit_price),
            notes: row.notes.clone(),
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(trustee: &str, trustee_zh: &str, scheme: &str, fund: &str, price: f64) -> SheetRow {
        SheetRow {
            trustee_en: Some(trustee.to_string()),
            trustee_zh: Some(trustee_zh.to_string()),
            scheme_en: Some(scheme.to_string()),
            scheme_zh: Some(format!("{}-zh", scheme)),
            trustee: Some(trustee.to_string()),
            scheme: Some(scheme.to_string()),
            fund: Some(fund.to_string()),
            fund_zh: None,
            unit_price: price,
            notes: None,
        }
    }

    #[test]
    fn test_unique_pairs_keep_first_seen_order() {
        let rows = vec![
            row("T2", "乙", "S1", "F1", 1.0),
            row("T1", "甲", "S1", "F2", 2.0),
            row("T2", "乙", "S1", "F3", 3.0),
            row("T2", "乙", "S2", "F4", 4.0),
        ];

        let pairs = unique_pairs(&rows);
        let keys: Vec<(Option<&str>, Option<&str>)> = pairs
            .iter()
            .map(|p| (p.trustee.en.as_deref(), p.scheme.en.as_deref()))
            .collect();
        assert_eq!(
            keys,
            [
                (Some("T2"), Some("S1")),
                (Some("T1"), Some("S1")),
                (Some("T2"), Some("S2")),
            ]
        );
    }

    #[test]
    fn test_group_labels_frozen_at_first_row() {
        let mut second = row("T1", "舊", "S1", "F2", 2.0);
        second.trustee_zh = Some("新".into());

        let groups = group_by_scheme(&[row("T1", "舊", "S1", "F1", 1.0), second]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].trustee.zh.as_deref(), Some("舊"));
        assert_eq!(groups[0].funds.len(), 2);
        assert_eq!(groups[0].trustee.name, groups[0].trustee.en);
    }

    #[test]
    fn test_groups_hold_scalar_prices_in_row_order() {
        let groups = group_by_scheme(&[
            row("T1", "甲", "S1", "F1", 10.5),
            row("T1", "甲", "S2", "F2", 20.0),
            row("T1", "甲", "S1", "F3", 30.0),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].funds.len(), 2);
        assert_eq!(groups[0].funds[0].unit_price, UnitPrice::Scalar(10.5));
        assert_eq!(groups[0].funds[1].fund.as_deref(), Some("F3"));
        assert_eq!(groups[1].funds[0].fund.as_deref(), Some("F2"));
    }

    #[test]
    fn test_ensure_labelled_rejects_unfilled_rows() {
        let mut orphan = row("T1", "甲", "S1", "F1", 1.0);
        orphan.trustee_en = None;

        let err = ensure_labelled(&[orphan]).unwrap_err();
        assert!(err.to_string().contains("1 row(s)"));

        assert!(ensure_labelled(&[row("T1", "甲", "S1", "F1", 1.0)]).is_ok());
    }
}

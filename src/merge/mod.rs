//! Multi-month merge: one canonical scheme→fund structure plus N monthly
//! snapshots → per-fund price series.
//!
//! The canonical structure's fund set is authoritative: funds it does not
//! know about are dropped even if a monthly snapshot prices them. New
//! funds only appear after the canonical structure is regenerated from a
//! month that contains them.

use crate::models::{FundEntry, PricePoint, SchemeGroup, SchemeInfo, TrusteeInfo, UnitPrice};
use std::collections::HashMap;

/// One month's scheme→fund snapshot, keyed by the month of the file it
/// was read from.
#[derive(Debug)]
pub struct MonthSnapshot {
    pub month_key: String,
    pub data: Vec<SchemeGroup>,
}

/// Join identity: trimmed (trustee, scheme, fund) names. Exact string
/// match after trimming only — no case or punctuation normalization.
type FundKey = (String, String, String);

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_string()
}

fn fund_key(trustee: &TrusteeInfo, scheme: &SchemeInfo, fund: &FundEntry) -> FundKey {
    (trimmed(&trustee.name), trimmed(&scheme.name), trimmed(&fund.fund))
}

/// Fund → scalar price for one month. Non-scalar prices map to None.
fn build_price_map(data: &[SchemeGroup]) -> HashMap<FundKey, Option<f64>> {
    let mut map = HashMap::new();
    for entry in data {
        for fund in &entry.funds {
            map.insert(
                fund_key(&entry.trustee, &entry.scheme, fund),
                fund.unit_price.as_scalar(),
            );
        }
    }
    map
}

/// Rewrite the canonical structure so every fund's price becomes one
/// `{month, price|null}` point per snapshot, in the order given (callers
/// pass snapshots ascending by month). Absent months yield null, never an
/// omitted point.
pub fn merge_months(base: &[SchemeGroup], months: &[MonthSnapshot]) -> Vec<SchemeGroup> {
    let maps: Vec<(&str, HashMap<FundKey, Option<f64>>)> = months
        .iter()
        .map(|m| (m.month_key.as_str(), build_price_map(&m.data)))
        .collect();

    base.iter()
        .map(|entry| SchemeGroup {
            trustee: entry.trustee.clone(),
            scheme: entry.scheme.clone(),
            funds: entry
                .funds
                .iter()
                .map(|fund| {
                    let key = fund_key(&entry.trustee, &entry.scheme, fund);
                    let series = maps
                        .iter()
                        .map(|(month_key, map)| PricePoint {
                            month: (*month_key).to_string(),
                            price: map.get(&key).copied().flatten(),
                        })
                        .collect();
                    FundEntry {
                        fund: fund.fund.clone(),
                        zh: fund.zh.clone(),
                        unit_price: UnitPrice::Series(series),
                        notes: fund.notes.clone(),
                    }
                })
                .collect(),
        })
        .collect()
}

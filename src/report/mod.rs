//! Top-movers leaderboard: compare the two most recent merged months per
//! fund and rank by percent change.

use crate::models::{MergedPayload, SchemeGroup, TopFundEntry, TopFundsPayload};
use crate::utils;
use anyhow::{bail, Result};
use std::cmp::Ordering;

/// Why a fund was left out of the ranking. Exclusions never appear in the
/// leaderboard output; tests assert on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    MissingThisMonth,
    MissingLastMonth,
    /// Last month's price is exactly zero — no denominator.
    ZeroBaseline,
}

#[derive(Debug)]
struct Mover {
    fund: String,
    fund_zh: Option<String>,
    trustee: String,
    scheme: String,
    price_this_month: f64,
    price_last_month: f64,
    change_percent: f64,
}

#[derive(Debug, Default)]
struct MoverScan {
    movers: Vec<Mover>,
    excluded: Vec<Exclusion>,
}

/// Walk schemes then funds (encounter order is the tie-break order later)
/// and split into rankable movers and named exclusions.
fn scan_movers(data: &[SchemeGroup], this_month: &str, last_month: &str) -> MoverScan {
    let mut scan = MoverScan::default();

    for entry in data {
        let trustee = entry.trustee.display_name();
        let scheme = entry.scheme.display_name();

        for fund in &entry.funds {
            let price_this = fund.unit_price.price_for_month(this_month);
            let price_last = fund.unit_price.price_for_month(last_month);

            let (price_this_month, price_last_month) = match (price_this, price_last) {
                (None, _) => {
                    scan.excluded.push(Exclusion::MissingThisMonth);
                    continue;
                }
                (_, None) => {
                    scan.excluded.push(Exclusion::MissingLastMonth);
                    continue;
                }
                (Some(_), Some(l)) if l == 0.0 => {
                    scan.excluded.push(Exclusion::ZeroBaseline);
                    continue;
                }
                (Some(t), Some(l)) => (t, l),
            };

            scan.movers.push(Mover {
                fund: fund.fund.clone().unwrap_or_default(),
                fund_zh: fund.zh.clone(),
                trustee: trustee.clone(),
                scheme: scheme.clone(),
                price_this_month,
                price_last_month,
                change_percent: (price_this_month - price_last_month) / price_last_month * 100.0,
            });
        }
    }

    scan
}

/// Build the leaderboard from the merged artifact. Requires at least two
/// merged months; fails fast otherwise so no partial leaderboard is ever
/// written.
pub fn top_movers(payload: &MergedPayload, top_n: usize) -> Result<TopFundsPayload> {
    if payload.months.len() < 2 {
        bail!(
            "need at least 2 merged months to rank movers, got {}",
            payload.months.len()
        );
    }

    let this_month = &payload.months[payload.months.len() - 1];
    let last_month = &payload.months[payload.months.len() - 2];

    let mut scan = scan_movers(&payload.data, this_month, last_month);

    // Stable sort: ties keep scheme-then-fund encounter order.
    scan.movers.sort_by(|a, b| {
        b.change_percent
            .partial_cmp(&a.change_percent)
            .unwrap_or(Ordering::Equal)
    });

    let top10 = scan
        .movers
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, m)| TopFundEntry {
            rank: i + 1,
            fund: m.fund,
            fund_zh: m.fund_zh,
            trustee: m.trustee,
            scheme: m.scheme,
            price_this_month: m.price_this_month,
            price_last_month: m.price_last_month,
            change_percent: m.change_percent,
        })
        .collect();

    Ok(TopFundsPayload {
        generated_at: utils::now_iso(),
        this_month: this_month.clone(),
        last_month: last_month.clone(),
        top10,
    })
}

use serde::{Deserialize, Serialize};

// ── Sheet rows ────────────────────────────────────────────────────────────────

/// One data row from the consolidated unit-price sheet. A row qualifies as
/// data iff its unit-price cell is a finite number; the Chinese labels come
/// from the row immediately below it in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub trustee_en: Option<String>,
    pub trustee_zh: Option<String>,
    pub scheme_en: Option<String>,
    pub scheme_zh: Option<String>,
    /// Flat legacy labels, mirroring the (filled) English values.
    pub trustee: Option<String>,
    pub scheme: Option<String>,
    pub fund: Option<String>,
    pub fund_zh: Option<String>,
    pub unit_price: f64,
    pub notes: Option<String>,
}

// ── Trustee / scheme identity ─────────────────────────────────────────────────

/// Bilingual trustee label. `name` duplicates `en` (legacy flat-name field);
/// identity is the English label, never a generated id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrusteeInfo {
    pub name: Option<String>,
    pub en: Option<String>,
    pub zh: Option<String>,
}

impl TrusteeInfo {
    pub fn from_row(row: &SheetRow) -> Self {
        Self {
            name: row.trustee_en.clone(),
            en: row.trustee_en.clone(),
            zh: row.trustee_zh.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.en.clone())
            .unwrap_or_default()
    }
}

/// Bilingual scheme label, same conventions as [`TrusteeInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeInfo {
    pub name: Option<String>,
    pub en: Option<String>,
    pub zh: Option<String>,
}

impl SchemeInfo {
    pub fn from_row(row: &SheetRow) -> Self {
        Self {
            name: row.scheme_en.clone(),
            en: row.scheme_en.clone(),
            zh: row.scheme_zh.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.en.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrusteeSchemePair {
    pub trustee: TrusteeInfo,
    pub scheme: SchemeInfo,
}

// ── Funds ─────────────────────────────────────────────────────────────────────

/// A fund's unit price: a single number in one-month snapshots, or one
/// `{month, price}` point per merged month. Consumers match on the variant;
/// the wire shape stays what the site has always read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitPrice {
    Scalar(f64),
    Series(Vec<PricePoint>),
}

impl UnitPrice {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            UnitPrice::Scalar(p) => Some(*p),
            UnitPrice::Series(_) => None,
        }
    }

    /// Price for one month key, by linear scan of the series.
    /// A scalar price carries no month information and never matches.
    pub fn price_for_month(&self, month_key: &str) -> Option<f64> {
        match self {
            UnitPrice::Scalar(_) => None,
            UnitPrice::Series(points) => points
                .iter()
                .find(|p| p.month == month_key)
                .and_then(|p| p.price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub month: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundEntry {
    pub fund: Option<String>,
    pub zh: Option<String>,
    pub unit_price: UnitPrice,
    pub notes: Option<String>,
}

/// One trustee's scheme with its funds, in first-seen row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeGroup {
    pub trustee: TrusteeInfo,
    pub scheme: SchemeInfo,
    pub funds: Vec<FundEntry>,
}

// ── Persisted payloads ────────────────────────────────────────────────────────

/// Per-month consolidated dump: `Consolidated_list_for_<Mon>_<YY>_Read_Only.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedPayload {
    pub source: String,
    pub sheet: String,
    pub exported_at: String,
    pub row_count: usize,
    pub data: Vec<SheetRow>,
}

/// Unique (trustee, scheme) index. `monthKey` is present on the per-month
/// artifacts and absent on the canonical `trustees_schemes.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrusteesSchemesPayload {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_key: Option<String>,
    pub exported_at: String,
    pub count: usize,
    pub data: Vec<TrusteeSchemePair>,
}

/// Scheme → fund price structure with scalar prices (one month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundPricePayload {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_key: Option<String>,
    pub exported_at: String,
    pub count: usize,
    pub data: Vec<SchemeGroup>,
}

/// The merged multi-month artifact (`fund_price_scheme.json` after merge):
/// every fund price is a `{month, price|null}` series, one point per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedPayload {
    pub source: String,
    pub exported_at: String,
    #[serde(default)]
    pub months: Vec<String>,
    pub count: usize,
    pub data: Vec<SchemeGroup>,
}

// ── Leaderboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopFundEntry {
    pub rank: usize,
    pub fund: String,
    pub fund_zh: Option<String>,
    pub trustee: String,
    pub scheme: String,
    pub price_this_month: f64,
    pub price_last_month: f64,
    pub change_percent: f64,
}

/// `top10_funds_this_month.json` — fully regenerated on every run, never a
/// source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopFundsPayload {
    pub generated_at: String,
    pub this_month: String,
    pub last_month: String,
    #[serde(rename = "top10")]
    pub top10: Vec<TopFundEntry>,
}

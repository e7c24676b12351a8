//! Forward fill of trustee/scheme labels down merged-cell gaps.

use crate::models::SheetRow;

/// Last non-blank value seen for each filled column. The four cursors are
/// independent: a row may inherit its trustee from several rows back while
/// carrying its own scheme label.
#[derive(Debug, Default)]
struct FillCursor {
    trustee_en: Option<String>,
    trustee_zh: Option<String>,
    scheme_en: Option<String>,
    scheme_zh: Option<String>,
}

impl FillCursor {
    fn observe(&mut self, row: &SheetRow) {
        if let Some(v) = non_blank(&row.trustee_en) {
            self.trustee_en = Some(v);
        }
        if let Some(v) = non_blank(&row.trustee_zh) {
            self.trustee_zh = Some(v);
        }
        if let Some(v) = non_blank(&row.scheme_en) {
            self.scheme_en = Some(v);
        }
        if let Some(v) = non_blank(&row.scheme_zh) {
            self.scheme_zh = Some(v);
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Replace each blank trustee/scheme label with the most recent non-blank
/// value at or before that row. Strictly sequential — the cursor state is
/// the whole point. Idempotent, and never fills backwards.
pub fn forward_fill(rows: Vec<SheetRow>) -> Vec<SheetRow> {
    let mut cursor = FillCursor::default();

    rows.into_iter()
        .map(|mut row| {
            cursor.observe(&row);

            if non_blank(&row.trustee_en).is_none() {
                row.trustee_en = cursor.trustee_en.clone();
            }
            if non_blank(&row.trustee_zh).is_none() {
                row.trustee_zh = cursor.trustee_zh.clone();
            }
            if non_blank(&row.scheme_en).is_none() {
                row.scheme_en = cursor.scheme_en.clone();
            }
            if non_blank(&row.scheme_zh).is_none() {
                row.scheme_zh = cursor.scheme_zh.clone();
            }

            // Flat labels prefer the row's own (now filled) English value.
            if non_blank(&row.trustee).is_none() {
                row.trustee = row.trustee_en.clone();
            }
            if non_blank(&row.scheme).is_none() {
                row.scheme = row.scheme_en.clone();
            }

            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(trustee_en: Option<&str>, scheme_en: Option<&str>) -> SheetRow {
        SheetRow {
            trustee_en: trustee_en.map(str::to_string),
            scheme_en: scheme_en.map(str::to_string),
            unit_price: 1.0,
            ..SheetRow::default()
        }
    }

    fn trustees(rows: &[SheetRow]) -> Vec<Option<&str>> {
        rows.iter().map(|r| r.trustee_en.as_deref()).collect()
    }

    #[test]
    fn test_fills_forward_over_gaps() {
        let filled = forward_fill(vec![
            row(Some("A"), Some("S1")),
            row(None, None),
            row(None, Some("S2")),
        ]);

        assert_eq!(trustees(&filled), [Some("A"), Some("A"), Some("A")]);
        assert_eq!(filled[1].scheme_en.as_deref(), Some("S1"));
        assert_eq!(filled[2].scheme_en.as_deref(), Some("S2"));
        // Flat labels mirror the filled English values.
        assert_eq!(filled[1].trustee.as_deref(), Some("A"));
        assert_eq!(filled[2].scheme.as_deref(), Some("S2"));
    }

    #[test]
    fn test_never_fills_backwards() {
        let filled = forward_fill(vec![row(None, Some("S")), row(Some("A"), Some("S"))]);
        assert_eq!(trustees(&filled), [None, Some("A")]);
    }

    #[test]
    fn test_empty_string_is_treated_as_absent() {
        let filled = forward_fill(vec![row(Some("A"), Some("S")), row(Some(""), Some("   "))]);
        assert_eq!(filled[1].trustee_en.as_deref(), Some("A"));
        assert_eq!(filled[1].scheme_en.as_deref(), Some("S"));
    }

    #[test]
    fn test_cursors_are_independent_per_field() {
        let mut first = row(Some("A"), Some("S1"));
        first.trustee_zh = Some("甲".into());
        let mut second = row(None, Some("S2"));
        second.scheme_zh = Some("計劃乙".into());
        let third = row(None, None);

        let filled = forward_fill(vec![first, second, third]);

        // Third row inherits trustee from two rows back, scheme from one.
        assert_eq!(filled[2].trustee_en.as_deref(), Some("A"));
        assert_eq!(filled[2].trustee_zh.as_deref(), Some("甲"));
        assert_eq!(filled[2].scheme_en.as_deref(), Some("S2"));
        assert_eq!(filled[2].scheme_zh.as_deref(), Some("計劃乙"));
    }

    #[test]
    fn test_fill_is_idempotent() {
        let once = forward_fill(vec![
            row(Some("A"), Some("S1")),
            row(None, None),
            row(Some("B"), None),
        ]);
        let twice = forward_fill(once.clone());
        assert_eq!(once, twice);
    }
}

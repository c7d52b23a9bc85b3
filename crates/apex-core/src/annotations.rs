//! # Customer Annotations
//!
//! Typed view of the annotations the legacy schema keeps inside the
//! customer `notes` free-text field.
//!
//! ## Marker Format (backend-compatibility shim)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  notes:                                                                 │
//! │                                                                         │
//! │    OUTSTANDING:1500                  ← running balance, whole units    │
//! │    Prefers morning delivery          ← ordinary free text, preserved   │
//! │    CHEQUE_DUE:2026-03-01|SALE:42     ← cheque due date + sale link     │
//! │    CHEQUE_DUE:2026-04-15             ← due date without a sale link    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In-process code works with [`CustomerAnnotations`]; the marker strings
//! exist only at the persistence boundary because the backend schema
//! cannot change. Upsert semantics: setting the outstanding replaces the
//! marker (rendered first, rounded to a whole unit), adding a cheque due
//! appends with de-duplication, and every unrecognized line survives a
//! parse/render round trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{round_money, sanitize};
use crate::types::Customer;
use crate::validation::is_cheque_date_format;

// =============================================================================
// Constants
// =============================================================================

/// Line prefix for the outstanding-balance marker.
pub const OUTSTANDING_PREFIX: &str = "OUTSTANDING:";

/// Line prefix for cheque due-date markers.
pub const CHEQUE_DUE_PREFIX: &str = "CHEQUE_DUE:";

/// A cheque-due alert fires when the due date is exactly this many days
/// away - an exact match, not a threshold. A cheque due tomorrow or in
/// three days produces no alert.
pub const CHEQUE_ALERT_LEAD_DAYS: i64 = 2;

// =============================================================================
// Typed Annotations
// =============================================================================

/// A recorded cheque due date, optionally linked to the sale that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChequeDue {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub sale_id: Option<i64>,
}

impl ChequeDue {
    fn marker(&self) -> String {
        match self.sale_id {
            Some(id) => format!("{}{}|SALE:{}", CHEQUE_DUE_PREFIX, self.date, id),
            None => format!("{}{}", CHEQUE_DUE_PREFIX, self.date),
        }
    }
}

/// One line of the notes blob, in original order.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteLine {
    ChequeDue(ChequeDue),
    /// Ordinary free text (including malformed markers), kept verbatim.
    Other(String),
}

/// Structured view of a customer's notes: the outstanding balance plus
/// zero or more typed annotations, with unknown lines preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerAnnotations {
    /// Running outstanding balance recorded in the notes (>= 0).
    pub outstanding: f64,
    /// Remaining note lines in their original order.
    pub lines: Vec<NoteLine>,
}

impl CustomerAnnotations {
    /// Parses a notes blob. Never fails; anything unrecognized lands in
    /// [`NoteLine::Other`].
    pub fn parse(notes: &str) -> Self {
        let mut outstanding = None;
        let mut lines = Vec::new();

        for raw in notes.split('\n') {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let upper = line.to_uppercase();
            if upper.starts_with(OUTSTANDING_PREFIX) {
                // First marker wins; duplicates are dropped, matching the
                // legacy upsert which rewrites a single marker line.
                if outstanding.is_none() {
                    let value = line[OUTSTANDING_PREFIX.len()..].trim().parse::<f64>();
                    outstanding = Some(value.map(|v| sanitize(v).max(0.0)).unwrap_or(0.0));
                }
                continue;
            }
            if upper.starts_with(CHEQUE_DUE_PREFIX) {
                if let Some(due) = parse_cheque_due(&line[CHEQUE_DUE_PREFIX.len()..]) {
                    lines.push(NoteLine::ChequeDue(due));
                    continue;
                }
            }
            lines.push(NoteLine::Other(line.to_string()));
        }

        CustomerAnnotations {
            outstanding: outstanding.unwrap_or(0.0),
            lines,
        }
    }

    /// Renders back to the marker-string notes format: the outstanding
    /// marker first (whole-unit rounded), then every other line in order.
    pub fn render(&self) -> String {
        let mut out = vec![format!(
            "{}{}",
            OUTSTANDING_PREFIX,
            round_money(self.outstanding.max(0.0))
        )];
        for line in &self.lines {
            match line {
                NoteLine::ChequeDue(due) => out.push(due.marker()),
                NoteLine::Other(text) => out.push(text.clone()),
            }
        }
        out.join("\n")
    }

    /// Replaces the outstanding balance (clamped at zero).
    pub fn set_outstanding(&mut self, value: f64) {
        self.outstanding = sanitize(value).max(0.0);
    }

    /// Appends a cheque due marker unless an identical one exists.
    ///
    /// Returns `false` (and records nothing) for a malformed date.
    pub fn add_cheque_due(&mut self, date: &str, sale_id: Option<i64>) -> bool {
        let date = date.trim();
        if !is_cheque_date_format(date) {
            return false;
        }
        let due = ChequeDue {
            date: date.to_string(),
            sale_id,
        };
        if self.lines.iter().any(|l| matches!(l, NoteLine::ChequeDue(d) if *d == due)) {
            return false;
        }
        self.lines.push(NoteLine::ChequeDue(due));
        true
    }

    /// The recorded cheque due dates, in note order.
    pub fn cheque_dues(&self) -> impl Iterator<Item = &ChequeDue> {
        self.lines.iter().filter_map(|l| match l {
            NoteLine::ChequeDue(due) => Some(due),
            NoteLine::Other(_) => None,
        })
    }
}

fn parse_cheque_due(rest: &str) -> Option<ChequeDue> {
    let mut parts = rest.trim().split('|');
    let date = parts.next()?.trim();
    if !is_cheque_date_format(date) {
        return None;
    }
    let sale_id = parts
        .find_map(|p| p.trim().strip_prefix("SALE:"))
        .and_then(|id| id.trim().parse::<i64>().ok());
    Some(ChequeDue {
        date: date.to_string(),
        sale_id,
    })
}

// =============================================================================
// Outstanding Reconciliation
// =============================================================================

/// Reconciles the backend's outstanding report row with the notes marker
/// by taking the larger of the two.
///
/// The two sources can drift (a marker update may have failed after a
/// sale, or the report may lag); the larger figure is the safe one to
/// show before adding a new sale's remainder.
pub fn effective_outstanding(reported: f64, annotations: &CustomerAnnotations) -> f64 {
    sanitize(reported).max(annotations.outstanding.max(0.0))
}

// =============================================================================
// Cheque Due Alerts
// =============================================================================

/// An alert for a cheque due exactly [`CHEQUE_ALERT_LEAD_DAYS`] from
/// `today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChequeAlert {
    pub customer_id: Option<i64>,
    pub customer_name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
}

/// Whole days from `today` until a `YYYY-MM-DD` date (negative when
/// past). `None` when the text is not a real calendar date.
pub fn days_until(date: &str, today: NaiveDate) -> Option<i64> {
    if !is_cheque_date_format(date.trim()) {
        return None;
    }
    let target = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    Some((target - today).num_days())
}

/// Scans customers' notes for cheques due exactly two days from `today`,
/// sorted by customer name.
///
/// `today` is passed in rather than read from the clock so the rule stays
/// pure and testable.
pub fn cheque_alerts(customers: &[Customer], today: NaiveDate) -> Vec<ChequeAlert> {
    let mut alerts = Vec::new();
    for customer in customers {
        let notes = customer.notes.as_deref().unwrap_or("");
        let annotations = CustomerAnnotations::parse(notes);
        for due in annotations.cheque_dues() {
            if days_until(&due.date, today) == Some(CHEQUE_ALERT_LEAD_DAYS) {
                alerts.push(ChequeAlert {
                    customer_id: customer.id,
                    customer_name: if customer.name.is_empty() {
                        "Customer".to_string()
                    } else {
                        customer.name.clone()
                    },
                    date: due.date.clone(),
                });
            }
        }
    }
    alerts.sort_by(|a, b| a.customer_name.cmp(&b.customer_name));
    alerts
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_outstanding_and_dues() {
        let annotations = CustomerAnnotations::parse(
            "OUTSTANDING:1500\nPrefers morning delivery\nCHEQUE_DUE:2026-03-01|SALE:42\nCHEQUE_DUE:2026-04-15",
        );
        assert_eq!(annotations.outstanding, 1500.0);
        let dues: Vec<_> = annotations.cheque_dues().collect();
        assert_eq!(dues.len(), 2);
        assert_eq!(dues[0].date, "2026-03-01");
        assert_eq!(dues[0].sale_id, Some(42));
        assert_eq!(dues[1].sale_id, None);
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(CustomerAnnotations::parse("").outstanding, 0.0);
        assert_eq!(CustomerAnnotations::parse("OUTSTANDING:junk").outstanding, 0.0);
        assert_eq!(CustomerAnnotations::parse("OUTSTANDING:-500").outstanding, 0.0);
        // Malformed due markers survive as plain text.
        let annotations = CustomerAnnotations::parse("CHEQUE_DUE:tomorrow");
        assert_eq!(annotations.cheque_dues().count(), 0);
        assert_eq!(
            annotations.lines,
            vec![NoteLine::Other("CHEQUE_DUE:tomorrow".to_string())]
        );
    }

    #[test]
    fn test_render_round_trip_preserves_unknown_lines() {
        let source = "OUTSTANDING:1500\nPrefers morning delivery\nCHEQUE_DUE:2026-03-01|SALE:42";
        let annotations = CustomerAnnotations::parse(source);
        assert_eq!(annotations.render(), source);
    }

    #[test]
    fn test_set_outstanding_upserts_single_marker() {
        let mut annotations = CustomerAnnotations::parse("OUTSTANDING:100\nnote");
        annotations.set_outstanding(950.4);
        let rendered = annotations.render();
        assert_eq!(rendered, "OUTSTANDING:950\nnote");
        assert_eq!(rendered.matches(OUTSTANDING_PREFIX).count(), 1);
    }

    #[test]
    fn test_add_cheque_due_dedups() {
        let mut annotations = CustomerAnnotations::default();
        assert!(annotations.add_cheque_due("2026-03-01", Some(42)));
        assert!(!annotations.add_cheque_due("2026-03-01", Some(42)));
        assert!(!annotations.add_cheque_due("soon", None));
        assert_eq!(annotations.cheque_dues().count(), 1);
    }

    #[test]
    fn test_effective_outstanding_takes_max() {
        let annotations = CustomerAnnotations::parse("OUTSTANDING:800");
        assert_eq!(effective_outstanding(650.0, &annotations), 800.0);
        assert_eq!(effective_outstanding(1200.0, &annotations), 1200.0);
        assert_eq!(effective_outstanding(-10.0, &CustomerAnnotations::default()), 0.0);
    }

    #[test]
    fn test_days_until() {
        let today = date(2026, 3, 1);
        assert_eq!(days_until("2026-03-03", today), Some(2));
        assert_eq!(days_until("2026-02-27", today), Some(-2));
        assert_eq!(days_until("2026-13-40", today), None);
        assert_eq!(days_until("soon", today), None);
    }

    fn customer(id: i64, name: &str, notes: &str) -> Customer {
        Customer {
            id: Some(id),
            name: name.to_string(),
            notes: Some(notes.to_string()),
            ..Customer::default()
        }
    }

    #[test]
    fn test_alert_fires_at_exactly_two_days() {
        let today = date(2026, 3, 1);
        let customers = vec![
            customer(1, "Bandara", "CHEQUE_DUE:2026-03-03"), // 2 days → alert
            customer(2, "Amara", "CHEQUE_DUE:2026-03-02"),   // 1 day → no alert
            customer(3, "Chamari", "CHEQUE_DUE:2026-03-04"), // 3 days → no alert
        ];
        let alerts = cheque_alerts(&customers, today);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].customer_name, "Bandara");
        assert_eq!(alerts[0].date, "2026-03-03");
    }

    #[test]
    fn test_alerts_sorted_by_customer_name() {
        let today = date(2026, 3, 1);
        let customers = vec![
            customer(1, "Zoysa", "CHEQUE_DUE:2026-03-03"),
            customer(2, "Amara", "CHEQUE_DUE:2026-03-03"),
        ];
        let alerts = cheque_alerts(&customers, today);
        assert_eq!(alerts[0].customer_name, "Amara");
        assert_eq!(alerts[1].customer_name, "Zoysa");
    }
}

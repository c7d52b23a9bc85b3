//! # Pending Sale Lifecycle (pure part)
//!
//! The state machine for a cashier's sale request, and the payload
//! round-trip that lets a pending request be edited later without losing
//! fidelity.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pending Sale Lifecycle                              │
//! │                                                                         │
//! │   draft (client-only)                                                  │
//! │     │ cashier submits                                                  │
//! │     ▼                                                                  │
//! │   pending ──── edit / re-submit (any number of times) ────┐            │
//! │     │  ▲                                                  │            │
//! │     │  └──────────────────────────────────────────────────┘            │
//! │     │                                                                  │
//! │     ├── admin approves ──► approved   (terminal, immutable)            │
//! │     └── admin deletes ───► deleted    (terminal, immutable)            │
//! │                                                                         │
//! │  Every mutation first passes ensure_pending(); operating on a          │
//! │  terminal record is a distinct "not pending" error, never a no-op.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Network transitions (create/update/approve/delete against the backend)
//! live in apex-billing; this module owns what can be decided without I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::de;
use crate::types::{
    Cart, CartLine, CustomerRef, PaymentMethod, PendingStatus, Product, SaleRequest,
    SaleRequestItem,
};

// =============================================================================
// Pending Sale Record
// =============================================================================

/// A cashier-submitted sale request awaiting admin action.
///
/// One-to-zero-or-one with the sale it eventually produces; the link is
/// recorded at approval time when the sale id is known.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PendingSaleRecord {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,

    #[serde(default)]
    pub status: PendingStatus,

    pub payload: SaleRequest,

    /// Username of the cashier who submitted the request.
    #[serde(default)]
    pub requested_by: Option<String>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PendingSaleRecord {
    /// Guards every mutating transition: edit, approve and delete are
    /// legal only while the record is still pending.
    pub fn ensure_pending(&self) -> CoreResult<()> {
        if self.status != PendingStatus::Pending {
            return Err(CoreError::NotPending {
                id: self.id.unwrap_or_default(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// A payload with no items cannot be approved or finalized.
    pub fn ensure_payload_usable(&self) -> CoreResult<()> {
        if self.payload.items.is_empty() {
            return Err(CoreError::InvalidPendingPayload);
        }
        Ok(())
    }
}

// =============================================================================
// Payload Serialization
// =============================================================================

impl SaleRequest {
    /// Serializes a cart into the submission payload.
    ///
    /// Only the identifying fields travel per item; price and stock are
    /// deliberately left out so rehydration must price from the current
    /// catalog.
    pub fn from_cart(
        cart: &Cart,
        customer: Option<CustomerRef>,
        cash_received: &str,
        cheque_date: Option<String>,
    ) -> SaleRequest {
        SaleRequest {
            items: cart
                .lines
                .iter()
                .map(|line| SaleRequestItem {
                    barcode: line.barcode.clone(),
                    qty: line.qty,
                    free_qty: line.free_qty,
                    item_discount_type: line.item_discount_type,
                    item_discount_value: line.item_discount_value,
                    name: None,
                    price: None,
                    stock: None,
                })
                .collect(),
            payment_method: cart.payment_method,
            discount_type: cart.discount_type,
            discount_value: cart.discount_value,
            cash_received: cash_received.to_string(),
            cheque_date: if cart.payment_method == PaymentMethod::Cheque {
                cheque_date
            } else {
                None
            },
            customer,
        }
    }
}

// =============================================================================
// Rehydration
// =============================================================================

/// Reconstructs a full cart from a stored payload by re-joining each item
/// against a current catalog snapshot.
///
/// This re-join is a required step, not an optimization: prices may have
/// changed since the request was submitted, so price and stock always
/// come from the current catalog. Stale `name`/`price`/`stock` echoes in
/// the payload are used only when the product has disappeared from the
/// catalog entirely (so the record can at least be displayed). Items with
/// an empty barcode are dropped; quantities are floored at 1 paid / 0
/// free, matching what the legacy surfaces accepted.
pub fn rehydrate_cart(payload: &SaleRequest, catalog: &[Product]) -> Cart {
    let mut lines = Vec::new();

    for item in &payload.items {
        let barcode = item.barcode.trim();
        if barcode.is_empty() {
            continue;
        }
        let product = catalog.iter().find(|p| p.barcode == barcode);
        lines.push(CartLine {
            barcode: barcode.to_string(),
            name: product
                .map(|p| p.name.clone())
                .or_else(|| item.name.clone())
                .unwrap_or_else(|| barcode.to_string()),
            unit_price: product
                .map(|p| p.price)
                .or(item.price)
                .unwrap_or(0.0),
            qty: item.qty.max(1),
            free_qty: item.free_qty.max(0),
            item_discount_type: item.item_discount_type,
            item_discount_value: item.item_discount_value,
            stock_at_add: product
                .map(|p| p.stock)
                .or(item.stock)
                .unwrap_or(0),
        });
    }

    Cart {
        lines,
        discount_type: payload.discount_type,
        discount_value: payload.discount_value,
        payment_method: payload.payment_method,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountKind;

    fn product(barcode: &str, name: &str, price: f64, stock: i64) -> Product {
        Product {
            id: Some(1),
            barcode: barcode.to_string(),
            name: name.to_string(),
            price,
            stock,
            default_discount_percent: 0.0,
        }
    }

    fn pending_record(status: PendingStatus) -> PendingSaleRecord {
        PendingSaleRecord {
            id: Some(7),
            status,
            payload: SaleRequest {
                items: vec![SaleRequestItem {
                    barcode: "111".to_string(),
                    qty: 1,
                    ..SaleRequestItem::default()
                }],
                ..SaleRequest::default()
            },
            requested_by: Some("kasun".to_string()),
            updated_at: None,
        }
    }

    #[test]
    fn test_ensure_pending_blocks_terminal_states() {
        assert!(pending_record(PendingStatus::Pending).ensure_pending().is_ok());

        let err = pending_record(PendingStatus::Approved)
            .ensure_pending()
            .unwrap_err();
        assert_eq!(err.to_string(), "Pending sale 7 is approved, not pending");

        assert!(pending_record(PendingStatus::Deleted).ensure_pending().is_err());
    }

    #[test]
    fn test_empty_payload_is_unusable() {
        let mut record = pending_record(PendingStatus::Pending);
        record.payload.items.clear();
        assert_eq!(
            record.ensure_payload_usable().unwrap_err().to_string(),
            "Pending sale payload is invalid"
        );
    }

    #[test]
    fn test_from_cart_omits_price_echoes() {
        let cart = Cart {
            lines: vec![CartLine {
                barcode: "111".to_string(),
                name: "Rice 5kg".to_string(),
                unit_price: 1200.0,
                qty: 2,
                free_qty: 1,
                item_discount_type: DiscountKind::Percent,
                item_discount_value: 10.0,
                stock_at_add: 40,
            }],
            discount_type: DiscountKind::Amount,
            discount_value: 50.0,
            payment_method: PaymentMethod::Cash,
        };

        let request = SaleRequest::from_cart(&cart, None, "5000", None);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].barcode, "111");
        assert_eq!(request.items[0].qty, 2);
        assert_eq!(request.items[0].free_qty, 1);
        assert!(request.items[0].price.is_none());
        assert!(request.items[0].stock.is_none());
        assert_eq!(request.cash_received, "5000");
    }

    #[test]
    fn test_cheque_date_only_travels_for_cheques() {
        let mut cart = Cart::new();
        cart.lines.push(CartLine {
            barcode: "111".to_string(),
            qty: 1,
            ..CartLine::default()
        });

        cart.payment_method = PaymentMethod::Cash;
        let request = SaleRequest::from_cart(&cart, None, "", Some("2026-03-01".to_string()));
        assert_eq!(request.cheque_date, None);

        cart.payment_method = PaymentMethod::Cheque;
        let request = SaleRequest::from_cart(&cart, None, "", Some("2026-03-01".to_string()));
        assert_eq!(request.cheque_date.as_deref(), Some("2026-03-01"));
    }

    #[test]
    fn test_rehydrate_prices_from_current_catalog() {
        // The stored payload carries a stale price echo; the catalog has
        // since repriced the product. The catalog wins.
        let payload = SaleRequest {
            items: vec![SaleRequestItem {
                barcode: "111".to_string(),
                qty: 2,
                free_qty: 1,
                item_discount_type: DiscountKind::Percent,
                item_discount_value: 10.0,
                price: Some(900.0),
                stock: Some(10),
                ..SaleRequestItem::default()
            }],
            discount_type: DiscountKind::Amount,
            discount_value: 50.0,
            payment_method: PaymentMethod::Credit,
            ..SaleRequest::default()
        };
        let catalog = vec![product("111", "Rice 5kg", 1250.0, 35)];

        let cart = rehydrate_cart(&payload, &catalog);
        assert_eq!(cart.lines.len(), 1);
        let line = &cart.lines[0];
        assert_eq!(line.unit_price, 1250.0);
        assert_eq!(line.stock_at_add, 35);
        assert_eq!(line.name, "Rice 5kg");
        assert_eq!(line.qty, 2);
        assert_eq!(line.free_qty, 1);
        assert_eq!(cart.discount_type, DiscountKind::Amount);
        assert_eq!(cart.payment_method, PaymentMethod::Credit);
    }

    #[test]
    fn test_rehydrate_falls_back_for_vanished_products() {
        let payload = SaleRequest {
            items: vec![SaleRequestItem {
                barcode: "gone".to_string(),
                qty: 0, // floored to 1
                name: Some("Old Item".to_string()),
                price: Some(75.0),
                ..SaleRequestItem::default()
            }],
            ..SaleRequest::default()
        };

        let cart = rehydrate_cart(&payload, &[]);
        let line = &cart.lines[0];
        assert_eq!(line.name, "Old Item");
        assert_eq!(line.unit_price, 75.0);
        assert_eq!(line.qty, 1);
    }

    #[test]
    fn test_rehydrate_drops_blank_barcodes() {
        let payload = SaleRequest {
            items: vec![
                SaleRequestItem {
                    barcode: "  ".to_string(),
                    qty: 1,
                    ..SaleRequestItem::default()
                },
                SaleRequestItem {
                    barcode: "111".to_string(),
                    qty: 1,
                    ..SaleRequestItem::default()
                },
            ],
            ..SaleRequest::default()
        };
        let cart = rehydrate_cart(&payload, &[]);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].barcode, "111");
    }

    #[test]
    fn test_round_trip_preserves_cart_semantics() {
        // Serialize a cart, rehydrate against the same catalog snapshot:
        // barcodes, quantities and discount specs survive unchanged.
        let catalog = vec![
            product("111", "Rice 5kg", 1200.0, 40),
            product("222", "Flour 1kg", 350.0, 15),
        ];
        let cart = Cart {
            lines: vec![
                CartLine::from_product(&catalog[0], 2),
                CartLine {
                    item_discount_type: DiscountKind::Amount,
                    item_discount_value: 25.0,
                    free_qty: 3,
                    ..CartLine::from_product(&catalog[1], 4)
                },
            ],
            discount_type: DiscountKind::Percent,
            discount_value: 5.0,
            payment_method: PaymentMethod::Cheque,
        };

        let request = SaleRequest::from_cart(&cart, None, "", Some("2026-03-01".to_string()));
        let json = serde_json::to_string(&request).unwrap();
        let stored: SaleRequest = serde_json::from_str(&json).unwrap();
        let rehydrated = rehydrate_cart(&stored, &catalog);

        assert_eq!(rehydrated.lines.len(), cart.lines.len());
        for (original, restored) in cart.lines.iter().zip(rehydrated.lines.iter()) {
            assert_eq!(original.barcode, restored.barcode);
            assert_eq!(original.qty, restored.qty);
            assert_eq!(original.free_qty, restored.free_qty);
            assert_eq!(original.item_discount_type, restored.item_discount_type);
            assert_eq!(original.item_discount_value, restored.item_discount_value);
            assert_eq!(original.unit_price, restored.unit_price);
        }
        assert_eq!(rehydrated.discount_type, cart.discount_type);
        assert_eq!(rehydrated.discount_value, cart.discount_value);
        assert_eq!(rehydrated.payment_method, cart.payment_method);
    }
}

//! # Checkout
//!
//! Turns a billing session into either a finalized sale or a pending
//! approval request, depending on the operator's authority.
//!
//! ## Routing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        complete_sale                                    │
//! │                                                                         │
//! │  prepare_checkout (pure)                                                │
//! │    cart not empty → payment valid → customer name/phone valid          │
//! │         │                                                               │
//! │         ├── cashier ──► POST /pending-sales          (new request)      │
//! │         │              PUT  /pending-sales/:id       (editing one)      │
//! │         │                                                               │
//! │         └── admin ────► POST /sales                  (authoritative)    │
//! │                         POST /pending-sales/:id/approve  (if editing)   │
//! │                         PUT  /customers/:id          (best effort)      │
//! │                                                                         │
//! │  The session is cleared only after the backend accepted the submit;    │
//! │  every failure leaves the cart and fields untouched for a retry.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{info, warn};

use apex_client::{CustomerUpdate, FinalizedSale, PosClient};
use apex_core::annotations::{effective_outstanding, CustomerAnnotations};
use apex_core::payment::{compute_payment, PaymentBreakdown};
use apex_core::pricing::CartTotals;
use apex_core::types::{CartLine, Customer, CustomerRef, PaymentMethod, SessionContext};
use apex_core::validation::{
    validate_cart_not_empty, validate_customer_name, validate_customer_phone,
};
use apex_core::SaleRequest;

use crate::error::BillingResult;
use crate::session::BillingSession;

// =============================================================================
// Prepared Checkout
// =============================================================================

/// A fully validated submission, ready to travel.
#[derive(Debug, Clone)]
pub struct PreparedCheckout {
    pub request: SaleRequest,
    pub totals: CartTotals,
    pub payment: PaymentBreakdown,
}

/// Validates the session and builds the submission payload.
///
/// Checks run in the order the operator sees them: cart contents, then
/// the tender (cash sufficiency / cheque date), then the customer fields.
/// Nothing is mutated; a failed check surfaces its message and the
/// operator corrects the form.
pub fn prepare_checkout(
    session: &BillingSession,
    prior_outstanding: f64,
) -> BillingResult<PreparedCheckout> {
    validate_cart_not_empty(session.lines())?;

    let totals = session.totals();
    let payment = compute_payment(
        totals.grand_total,
        session.payment_method(),
        session.cash_received(),
        Some(session.cheque_date()),
        prior_outstanding,
    )?;

    let name = validate_customer_name(session.customer_name())?;
    let phone = validate_customer_phone(session.customer_phone())?;
    let address = session.customer_address().trim();
    let customer = CustomerRef {
        id: session.customer_id(),
        name,
        phone,
        address: if address.is_empty() {
            None
        } else {
            Some(address.to_string())
        },
    };

    let request = SaleRequest::from_cart(
        session.cart(),
        Some(customer),
        session.cash_received(),
        Some(session.cheque_date().trim().to_string()),
    );

    Ok(PreparedCheckout {
        request,
        totals,
        payment,
    })
}

// =============================================================================
// Receipt Summary
// =============================================================================

/// Everything the receipt renderer needs, snapshotted before the session
/// is cleared.
///
/// Timestamps come from the backend's sale row; when it omits one the UI
/// falls back to its local clock (this engine never reads the clock).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub sale_id: Option<i64>,
    pub date_text: Option<String>,
    pub staff_name: String,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<CartLine>,
    pub totals: CartTotals,
    pub payment_method: PaymentMethod,
    pub payment: PaymentBreakdown,
    pub cheque_date: Option<String>,
}

/// Builds the receipt snapshot from the session and the finalized sale
/// row.
pub fn receipt_summary(
    session: &BillingSession,
    prepared: &PreparedCheckout,
    sale: &FinalizedSale,
    ctx: &SessionContext,
) -> ReceiptSummary {
    ReceiptSummary {
        sale_id: sale.id,
        date_text: sale.created_at.clone(),
        staff_name: sale
            .created_by
            .as_ref()
            .and_then(|u| u.username.clone())
            .unwrap_or_else(|| ctx.username.clone()),
        customer_id: sale.customer_id.or(session.customer_id()),
        customer_name: session.customer_name().to_string(),
        customer_phone: session.customer_phone().to_string(),
        customer_address: session.customer_address().to_string(),
        items: session.lines().to_vec(),
        totals: prepared.totals.clone(),
        payment_method: session.payment_method(),
        payment: prepared.payment,
        cheque_date: prepared.request.cheque_date.clone(),
    }
}

// =============================================================================
// Checkout Outcome
// =============================================================================

/// What a successful submit produced.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Cashier path: a new pending request was created.
    PendingCreated,
    /// Cashier path: the loaded pending request was overwritten.
    PendingUpdated(i64),
    /// Admin path: the sale was finalized (approving the loaded pending
    /// request first, when there was one).
    Finalized {
        receipt: ReceiptSummary,
        approved_pending: Option<i64>,
    },
}

impl CheckoutOutcome {
    /// The confirmation text the legacy surfaces show.
    pub fn message(&self) -> &'static str {
        match self {
            CheckoutOutcome::PendingCreated => "Sale request sent for admin approval",
            CheckoutOutcome::PendingUpdated(_) => "Pending sale request updated",
            CheckoutOutcome::Finalized {
                approved_pending: Some(_),
                ..
            } => "Pending sale approved and completed",
            CheckoutOutcome::Finalized { .. } => "Sale completed",
        }
    }
}

// =============================================================================
// Outstanding Persistence
// =============================================================================

/// Reconciles the outstanding balance before a sale: the larger of the
/// backend report row and the customer's notes marker (the two sources
/// can drift when a notes update was lost after an earlier sale).
pub fn reconciled_outstanding(customer: Option<&Customer>, reported: f64) -> f64 {
    match customer {
        Some(c) => effective_outstanding(
            reported,
            &CustomerAnnotations::parse(c.notes.as_deref().unwrap_or("")),
        ),
        None => reported.max(0.0),
    }
}

/// Builds the customer update recording the post-sale outstanding and,
/// for cheque sales, the due-date marker.
pub fn outstanding_update(
    customer: &Customer,
    new_outstanding: f64,
    cheque: Option<(&str, Option<i64>)>,
) -> CustomerUpdate {
    let mut annotations = CustomerAnnotations::parse(customer.notes.as_deref().unwrap_or(""));
    annotations.set_outstanding(new_outstanding);
    if let Some((date, sale_id)) = cheque {
        annotations.add_cheque_due(date, sale_id);
    }
    CustomerUpdate {
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        address: customer.address.clone(),
        notes: annotations.render(),
    }
}

/// Persists the customer's new outstanding balance, best effort.
///
/// The sale already succeeded; a failed notes update must not undo that,
/// so the failure is logged and swallowed.
pub async fn persist_customer_outstanding(
    client: &PosClient,
    customer: &Customer,
    new_outstanding: f64,
    cheque: Option<(&str, Option<i64>)>,
) {
    let Some(id) = customer.id else {
        return;
    };
    let update = outstanding_update(customer, new_outstanding, cheque);
    if let Err(error) = client.update_customer(id, &update).await {
        warn!(%error, customer_id = id, "customer outstanding update failed after sale");
    }
}

// =============================================================================
// Complete Sale
// =============================================================================

/// Validates the session and submits it.
///
/// Cashiers create (or re-submit) a pending request; admins finalize
/// against `POST /sales` directly, approving the loaded pending request
/// when the session was editing one. `customer_record` is the full row of
/// the picked customer, used to persist the new outstanding balance;
/// `prior_outstanding` is the reconciled balance before this sale (see
/// [`apex_core::annotations::effective_outstanding`]).
///
/// On any backend rejection the session is left untouched so the operator
/// can correct and retry; the cart is cleared only after success.
pub async fn complete_sale(
    client: &PosClient,
    ctx: &SessionContext,
    session: &mut BillingSession,
    customer_record: Option<&Customer>,
    prior_outstanding: f64,
) -> BillingResult<CheckoutOutcome> {
    let prepared = prepare_checkout(session, prior_outstanding)?;

    if !ctx.role.can_finalize() {
        let outcome = match session.selected_pending() {
            Some(id) => {
                client.update_pending_sale(id, &prepared.request).await?;
                info!(pending_id = id, requested_by = %ctx.username, "pending sale re-submitted");
                CheckoutOutcome::PendingUpdated(id)
            }
            None => {
                client.create_pending_sale(&prepared.request).await?;
                info!(requested_by = %ctx.username, "pending sale submitted");
                CheckoutOutcome::PendingCreated
            }
        };
        session.clear();
        return Ok(outcome);
    }

    let sale = client.create_sale(&prepared.request).await?;

    let approved_pending = session.selected_pending();
    if let Some(pending_id) = approved_pending {
        client.approve_pending_sale(pending_id, sale.id).await?;
    }

    if let Some(customer) = customer_record {
        let cheque = prepared.request.cheque_date.as_deref().map(|d| (d, sale.id));
        persist_customer_outstanding(
            client,
            customer,
            prepared.payment.new_customer_outstanding,
            cheque,
        )
        .await;
    }

    let receipt = receipt_summary(session, &prepared, &sale, ctx);
    session.clear();

    info!(
        sale_id = ?sale.id,
        approved_pending = ?approved_pending,
        by = %ctx.username,
        "sale finalized"
    );

    Ok(CheckoutOutcome::Finalized {
        receipt,
        approved_pending,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use apex_core::types::{DiscountKind, Product};

    fn session_with(price: f64, qty: i64, stock: i64) -> BillingSession {
        let mut session = BillingSession::new();
        let product = Product {
            id: Some(1),
            barcode: "111".to_string(),
            name: "Rice 5kg".to_string(),
            price,
            stock,
            default_discount_percent: 0.0,
        };
        session.add_product(&product, qty).unwrap();
        session.set_customer_name("Nimal Perera");
        session
    }

    #[test]
    fn test_prepare_rejects_empty_cart() {
        let session = BillingSession::new();
        let err = prepare_checkout(&session, 0.0).unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn test_prepare_validates_tender_before_customer() {
        // The cart has items and no customer name; the cash check still
        // runs first, as on the legacy cashier form.
        let mut session = session_with(100.0, 5, 10);
        session.set_customer_name("");
        session.set_cash_received("499.99");
        let err = prepare_checkout(&session, 0.0).unwrap_err();
        assert_eq!(err.to_string(), "Cash received is not enough");

        session.set_cash_received("500");
        let err = prepare_checkout(&session, 0.0).unwrap_err();
        assert_eq!(err.to_string(), "Customer name is required");
    }

    #[test]
    fn test_prepare_cash_exact_tender() {
        let mut session = session_with(100.0, 5, 10);
        session.set_cash_received("500");
        let prepared = prepare_checkout(&session, 0.0).unwrap();
        assert_eq!(prepared.payment.balance, 0.0);
        assert_eq!(prepared.payment.sale_outstanding, 0.0);
        assert_eq!(prepared.totals.grand_total, 500.0);
    }

    #[test]
    fn test_prepare_credit_builds_outstanding_delta() {
        let mut session = session_with(250.0, 3, 10);
        session.set_payment_method(PaymentMethod::Credit);
        let prepared = prepare_checkout(&session, 200.0).unwrap();
        assert_eq!(prepared.payment.sale_outstanding, 750.0);
        assert_eq!(prepared.payment.new_customer_outstanding, 950.0);
        assert_eq!(prepared.request.payment_method, PaymentMethod::Credit);
    }

    #[test]
    fn test_prepare_cheque_needs_date() {
        let mut session = session_with(100.0, 1, 10);
        session.set_payment_method(PaymentMethod::Cheque);
        let err = prepare_checkout(&session, 0.0).unwrap_err();
        assert_eq!(err.to_string(), "Cheque date is required (YYYY-MM-DD)");

        session.set_cheque_date("2026-09-01");
        let prepared = prepare_checkout(&session, 0.0).unwrap();
        assert_eq!(prepared.request.cheque_date.as_deref(), Some("2026-09-01"));
    }

    #[test]
    fn test_prepare_normalizes_customer_fields() {
        let mut session = session_with(100.0, 1, 10);
        session.set_customer_name("  Nimal Perera ");
        session.set_customer_phone("077-065 4279");
        session.set_customer_address("   ");
        session.set_cash_received("100");

        let customer = prepare_checkout(&session, 0.0)
            .unwrap()
            .request
            .customer
            .unwrap();
        assert_eq!(customer.name, "Nimal Perera");
        assert_eq!(customer.phone.as_deref(), Some("0770654279"));
        assert_eq!(customer.address, None);
    }

    #[test]
    fn test_prepare_request_carries_discount_spec() {
        let mut session = session_with(100.0, 4, 10);
        session
            .set_item_discount_type("111", DiscountKind::Percent)
            .unwrap();
        session.set_item_discount_value("111", 10.0).unwrap();
        session.set_cart_discount_type(DiscountKind::Amount);
        session.set_cart_discount_value(60.0);
        session.set_cash_received("300");

        let prepared = prepare_checkout(&session, 0.0).unwrap();
        // 400 base - 40 item discount - 60 cart discount
        assert_eq!(prepared.totals.grand_total, 300.0);
        assert_eq!(prepared.request.items[0].item_discount_value, 10.0);
        assert_eq!(prepared.request.discount_value, 60.0);
    }

    #[test]
    fn test_reconciled_outstanding_prefers_larger_source() {
        let customer = Customer {
            id: Some(4),
            name: "Nimal".to_string(),
            notes: Some("OUTSTANDING:800".to_string()),
            ..Customer::default()
        };
        assert_eq!(reconciled_outstanding(Some(&customer), 650.0), 800.0);
        assert_eq!(reconciled_outstanding(Some(&customer), 1200.0), 1200.0);
        assert_eq!(reconciled_outstanding(None, -10.0), 0.0);
    }

    #[test]
    fn test_outstanding_update_upserts_and_marks_cheque() {
        let customer = Customer {
            id: Some(4),
            name: "Nimal".to_string(),
            phone: Some("0770654279".to_string()),
            address: None,
            notes: Some("OUTSTANDING:200\nPrefers morning delivery".to_string()),
        };

        let update = outstanding_update(&customer, 950.0, Some(("2026-09-01", Some(42))));
        assert_eq!(
            update.notes,
            "OUTSTANDING:950\nPrefers morning delivery\nCHEQUE_DUE:2026-09-01|SALE:42"
        );
        assert_eq!(update.name, "Nimal");

        // Cash sales rewrite only the balance marker.
        let update = outstanding_update(&customer, 0.0, None);
        assert_eq!(update.notes, "OUTSTANDING:0\nPrefers morning delivery");
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            CheckoutOutcome::PendingCreated.message(),
            "Sale request sent for admin approval"
        );
        assert_eq!(
            CheckoutOutcome::PendingUpdated(7).message(),
            "Pending sale request updated"
        );
    }
}

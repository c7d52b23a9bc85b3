//! # Billing Session
//!
//! The state of one in-progress sale: the cart, the selected customer,
//! payment fields and a product-catalog cache for availability checks.
//!
//! ## Session Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Billing Session                                    │
//! │                                                                         │
//! │  UI Action                 Session Method            Guarded By         │
//! │  ─────────────             ──────────────            ─────────────      │
//! │  Scan barcode ───────────► add_product()           check_add           │
//! │  Edit quantity ──────────► change_qty()            check_qty_edit      │
//! │  Edit free qty ──────────► set_free_qty()          check_free_qty      │
//! │  Pick discount ──────────► set_item_discount_*()   (clamped at price)  │
//! │  Remove / Clear ─────────► remove_line()/clear()                       │
//! │  Any of the above ───────► totals()   recomputed fresh, every time     │
//! │                                                                         │
//! │  One session per cashier UI; all mutations are synchronous. Network    │
//! │  lookups feed the catalog cache between mutations, never during one.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A second stock source of truth is deliberately absent: `stock_for`
//! answers from the freshest catalog entry, falling back to the stock
//! snapshot frozen on the cart line, and the backend re-checks everything
//! at finalization anyway.

use std::collections::HashMap;

use tracing::debug;

use apex_core::money::clamp;
use apex_core::pricing::CartTotals;
use apex_core::stock;
use apex_core::types::{
    Cart, CartLine, Customer, DiscountKind, DraftPayload, PaymentMethod, Product,
};
use apex_core::{
    compute_cart, money::parse_money, rehydrate_cart, CoreError, CoreResult, PendingSaleRecord,
};

/// A session only auto-drafts when abandoning it would lose real work:
/// two or more cart lines.
pub const AUTO_DRAFT_MIN_LINES: usize = 2;

// =============================================================================
// Billing Session
// =============================================================================

/// One cashier's in-progress sale.
#[derive(Debug, Default)]
pub struct BillingSession {
    cart: Cart,
    /// Latest known product rows, merged from searches and lookups.
    catalog: HashMap<String, Product>,
    customer_id: Option<i64>,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    /// Raw cash-received field text; parsed only at computation time so
    /// an empty field stays distinguishable from a tender of zero.
    cash_received: String,
    cheque_date: String,
    /// Set while the session is editing a loaded pending request.
    selected_pending: Option<i64>,
    /// Monotonic token for discarding stale product-search responses.
    search_seq: u64,
}

impl BillingSession {
    pub fn new() -> Self {
        BillingSession::default()
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.cart.lines
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.cart.payment_method
    }

    pub fn cash_received(&self) -> &str {
        &self.cash_received
    }

    pub fn cheque_date(&self) -> &str {
        &self.cheque_date
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.customer_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    pub fn customer_address(&self) -> &str {
        &self.customer_address
    }

    pub fn selected_pending(&self) -> Option<i64> {
        self.selected_pending
    }

    /// Recomputes cart totals from the full line list.
    pub fn totals(&self) -> CartTotals {
        compute_cart(
            &self.cart.lines,
            self.cart.discount_type,
            self.cart.discount_value,
        )
    }

    /// Live balance/change display for a cash tender; 0 for every other
    /// method, where it is not meaningful. Negative means "not enough".
    pub fn balance(&self) -> f64 {
        if self.cart.payment_method != PaymentMethod::Cash {
            return 0.0;
        }
        parse_money(&self.cash_received) - self.totals().grand_total
    }

    // =========================================================================
    // Catalog Cache
    // =========================================================================

    /// Merges a product row into the cache (newest wins).
    pub fn cache_product(&mut self, product: Product) {
        if !product.barcode.is_empty() {
            self.catalog.insert(product.barcode.clone(), product);
        }
    }

    pub fn cache_products(&mut self, products: impl IntoIterator<Item = Product>) {
        for product in products {
            self.cache_product(product);
        }
    }

    /// Freshest known stock for a barcode: catalog cache first, then the
    /// snapshot frozen on the cart line, else 0.
    pub fn stock_for(&self, barcode: &str) -> i64 {
        self.catalog
            .get(barcode)
            .map(|p| p.stock)
            .or_else(|| self.cart.line(barcode).map(|l| l.stock_at_add))
            .unwrap_or(0)
    }

    /// Units of a product still addable given the current cart.
    pub fn remaining_for_display(&self, barcode: &str) -> i64 {
        stock::remaining_for_display(self.stock_for(barcode), &self.cart.lines, barcode)
    }

    /// Whether a picker candidate may still be added at all.
    pub fn is_addable(&self, product: &Product) -> bool {
        stock::remaining_for_display(product.stock, &self.cart.lines, &product.barcode) > 0
    }

    // =========================================================================
    // Search Staleness
    // =========================================================================

    /// Starts a new product search, invalidating all in-flight ones.
    pub fn begin_search(&mut self) -> u64 {
        self.search_seq += 1;
        self.search_seq
    }

    /// Applies a search response unless a newer query was issued since
    /// the token was taken. Returns whether the results were applied.
    pub fn apply_search_results(&mut self, token: u64, results: Vec<Product>) -> bool {
        if token != self.search_seq {
            debug!(token, current = self.search_seq, "discarding stale search results");
            return false;
        }
        self.cache_products(results);
        true
    }

    // =========================================================================
    // Cart Mutations
    // =========================================================================

    /// Adds `qty` paid units of a freshly fetched product, merging into
    /// an existing line for the same barcode.
    ///
    /// New lines pick up the product's default discount percent, when it
    /// has one, as an initial percent item discount.
    pub fn add_product(&mut self, product: &Product, qty: i64) -> CoreResult<()> {
        let qty = qty.max(1);
        stock::check_add(product.stock, &self.cart.lines, &product.barcode, qty)?;
        self.cache_product(product.clone());

        if let Some(line) = self.cart.line_mut(&product.barcode) {
            line.qty += qty;
            line.stock_at_add = product.stock;
            return Ok(());
        }

        let mut line = CartLine::from_product(product, qty);
        let auto_pct = clamp(product.default_discount_percent, 0.0, 100.0);
        if auto_pct > 0.0 {
            line.item_discount_type = DiscountKind::Percent;
            line.item_discount_value = auto_pct;
        }
        self.cart.lines.push(line);
        Ok(())
    }

    /// Sets a line's paid quantity. Values below 1 are ignored (the UI
    /// steppers clamp there); values above the edit ceiling are rejected
    /// with the exact available count.
    pub fn change_qty(&mut self, barcode: &str, new_qty: i64) -> CoreResult<()> {
        if new_qty < 1 {
            return Ok(());
        }
        let current = match self.cart.line(barcode) {
            Some(line) => line.qty,
            None => return Err(CoreError::LineNotFound(barcode.to_string())),
        };
        stock::check_qty_edit(
            self.stock_for(barcode),
            &self.cart.lines,
            barcode,
            new_qty,
            current,
        )?;
        if let Some(line) = self.cart.line_mut(barcode) {
            line.qty = new_qty;
        }
        Ok(())
    }

    /// Sets a line's free-issue quantity. Requires an existing paid line
    /// and caps at stock net of paid units.
    pub fn set_free_qty(&mut self, barcode: &str, free_qty: i64) -> CoreResult<()> {
        if free_qty < 0 {
            return Ok(());
        }
        if self.cart.line(barcode).is_none() {
            return Err(CoreError::FreeIssueWithoutPaidLine {
                barcode: barcode.to_string(),
            });
        }
        stock::check_free_qty(self.stock_for(barcode), &self.cart.lines, barcode, free_qty)?;
        if let Some(line) = self.cart.line_mut(barcode) {
            line.free_qty = free_qty;
        }
        Ok(())
    }

    /// Changes a line's discount kind, resetting the value.
    pub fn set_item_discount_type(&mut self, barcode: &str, kind: DiscountKind) -> CoreResult<()> {
        let line = self
            .cart
            .line_mut(barcode)
            .ok_or_else(|| CoreError::LineNotFound(barcode.to_string()))?;
        line.item_discount_type = kind;
        line.item_discount_value = 0.0;
        Ok(())
    }

    pub fn set_item_discount_value(&mut self, barcode: &str, value: f64) -> CoreResult<()> {
        let line = self
            .cart
            .line_mut(barcode)
            .ok_or_else(|| CoreError::LineNotFound(barcode.to_string()))?;
        line.item_discount_value = value;
        Ok(())
    }

    pub fn remove_line(&mut self, barcode: &str) -> bool {
        self.cart.remove_line(barcode)
    }

    // =========================================================================
    // Discount & Payment Fields
    // =========================================================================

    /// Changes the cart-level discount kind, resetting the value.
    pub fn set_cart_discount_type(&mut self, kind: DiscountKind) {
        self.cart.discount_type = kind;
        self.cart.discount_value = 0.0;
    }

    pub fn set_cart_discount_value(&mut self, value: f64) {
        self.cart.discount_value = value;
    }

    /// Selects the payment method, clearing the tender fields as every
    /// legacy surface does on a method change.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.cart.payment_method = method;
        self.cash_received.clear();
        if method != PaymentMethod::Cheque {
            self.cheque_date.clear();
        }
    }

    pub fn set_cash_received(&mut self, raw: impl Into<String>) {
        self.cash_received = raw.into();
    }

    pub fn set_cheque_date(&mut self, raw: impl Into<String>) {
        self.cheque_date = raw.into();
    }

    // =========================================================================
    // Customer Fields
    // =========================================================================

    /// Fills the customer fields from a picked record.
    pub fn choose_customer(&mut self, customer: &Customer) {
        self.customer_id = customer.id;
        self.customer_name = customer.name.clone();
        self.customer_phone = customer.phone.clone().unwrap_or_default();
        self.customer_address = customer.address.clone().unwrap_or_default();
    }

    /// Manual name edits detach the session from any picked customer id.
    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
        self.customer_id = None;
    }

    pub fn set_customer_phone(&mut self, phone: impl Into<String>) {
        self.customer_phone = phone.into();
    }

    pub fn set_customer_address(&mut self, address: impl Into<String>) {
        self.customer_address = address.into();
    }

    // =========================================================================
    // Pending / Draft Round-Trips
    // =========================================================================

    /// Loads a pending record for editing: caches the current catalog,
    /// rehydrates the cart against it (current prices, current stock)
    /// and restores the payment/customer fields from the payload.
    pub fn apply_pending(&mut self, record: &PendingSaleRecord, catalog: &[Product]) {
        self.cache_products(catalog.iter().cloned());
        self.cart = rehydrate_cart(&record.payload, catalog);

        let customer = record.payload.customer.clone().unwrap_or_default();
        self.customer_id = customer.id;
        self.customer_name = customer.name;
        self.customer_phone = customer.phone.unwrap_or_default();
        self.customer_address = customer.address.unwrap_or_default();

        self.cash_received = record.payload.cash_received.clone();
        self.cheque_date = record.payload.cheque_date.clone().unwrap_or_default();
        self.selected_pending = record.id;
    }

    /// Clears the link to a loaded pending request without touching the
    /// cart, so the next submit creates a new request.
    pub fn clear_selected_pending(&mut self) {
        self.selected_pending = None;
    }

    /// Restores a saved draft verbatim - full cart lines included, no
    /// catalog re-join. Drafts are the operator's own snapshot; pending
    /// payloads are the ones that must re-price (see `apply_pending`).
    pub fn apply_draft(&mut self, payload: &DraftPayload) {
        self.cart = Cart {
            lines: payload.cart.clone(),
            discount_type: payload.discount_type,
            discount_value: payload.discount_value,
            payment_method: payload.payment_method,
        };
        self.customer_id = payload.customer_id;
        self.customer_name = payload.customer_name.clone();
        self.customer_phone = payload.customer_phone.clone();
        self.customer_address = payload.customer_address.clone();
        self.cash_received = payload.cash_received.clone();
        self.cheque_date = payload.cheque_date.clone();
        self.selected_pending = None;
    }

    /// Snapshots the session into a draft payload.
    pub fn to_draft_payload(&self, name: Option<String>) -> DraftPayload {
        DraftPayload {
            name,
            cart: self.cart.lines.clone(),
            customer_enabled: true,
            customer_id: self.customer_id,
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            customer_address: self.customer_address.clone(),
            discount_type: self.cart.discount_type,
            discount_value: self.cart.discount_value,
            payment_method: self.cart.payment_method,
            cash_received: self.cash_received.clone(),
            cheque_date: self.cheque_date.clone(),
        }
    }

    /// Whether abandoning this session should persist an auto-draft.
    pub fn should_auto_draft(&self) -> bool {
        self.cart.lines.len() >= AUTO_DRAFT_MIN_LINES
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Resets everything except the catalog cache (which is just data
    /// about products, not about this sale).
    pub fn clear(&mut self) {
        self.cart.clear();
        self.customer_id = None;
        self.customer_name.clear();
        self.customer_phone.clear();
        self.customer_address.clear();
        self.cash_received.clear();
        self.cheque_date.clear();
        self.selected_pending = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Pending Sale Lifecycle (network side)
//!
//! List, edit-load, approve and delete operations against the pending
//! store, plus the auto-draft safety net. The state machine itself lives
//! in [`apex_core::pending`]; this module drives it over the backend.
//!
//! ## Failure Policy
//! List refreshes are read-only background work: a failure degrades to an
//! empty list with a warning, never a user-blocking error. The primary
//! approve/delete actions propagate the backend's message verbatim and
//! leave local state unchanged so the operator can retry.

use tracing::{debug, info, warn};

use apex_client::{PosClient, SaleDetail};
use apex_core::{CoreError, PendingSaleRecord, PendingStatus};

use crate::error::BillingResult;
use crate::session::BillingSession;

// =============================================================================
// Listing
// =============================================================================

/// Fetches the requests still awaiting action.
///
/// Terminal rows are filtered out; a failed refresh answers an empty list.
pub async fn pending_requests(client: &PosClient) -> Vec<PendingSaleRecord> {
    match client.pending_sales().await {
        Ok(rows) => rows
            .into_iter()
            .filter(|r| r.status == PendingStatus::Pending)
            .collect(),
        Err(error) => {
            warn!(%error, "pending-sales refresh failed");
            Vec::new()
        }
    }
}

// =============================================================================
// Edit Loading
// =============================================================================

/// Loads a pending request into the session for editing.
///
/// Fetches the record, verifies it is still pending, then fetches the
/// current product catalog and rehydrates the cart against it. The
/// catalog re-join is what re-prices every line; the stored payload's
/// price echoes are never billed from.
pub async fn load_for_edit(
    client: &PosClient,
    session: &mut BillingSession,
    id: i64,
) -> BillingResult<()> {
    let record = client.pending_sale(id).await?;
    record.ensure_pending()?;
    record.ensure_payload_usable()?;

    let catalog = client.products().await?;
    session.apply_pending(&record, &catalog);

    info!(pending_id = id, lines = session.lines().len(), "pending sale loaded for edit");
    Ok(())
}

// =============================================================================
// Approval
// =============================================================================

/// What an approval produced.
#[derive(Debug)]
pub struct ApprovalOutcome {
    pub pending_id: i64,
    /// The finalized sale's id, when the backend reported one.
    pub sale_id: Option<i64>,
    /// Full sale row for the receipt preview; `None` when that fetch
    /// failed (the approval itself still succeeded).
    pub preview: Option<SaleDetail>,
}

impl ApprovalOutcome {
    /// The confirmation text the approval screen shows.
    pub fn message(&self) -> String {
        match self.sale_id {
            Some(sale_id) => format!(
                "Approved pending sale #{} -> Sale #{}",
                self.pending_id, sale_id
            ),
            None => format!("Approved pending sale #{}", self.pending_id),
        }
    }
}

/// Finalizes a pending request: posts its stored payload to `/sales`,
/// then transitions the record to approved, linking the created sale.
///
/// The sale id may legitimately be unknown when the backend's response
/// omits it; approval proceeds without the link. The follow-up sale-detail
/// fetch for the receipt preview is best effort.
pub async fn approve(
    client: &PosClient,
    record: &PendingSaleRecord,
) -> BillingResult<ApprovalOutcome> {
    record.ensure_pending()?;
    record.ensure_payload_usable()?;
    let pending_id = record.id.ok_or(CoreError::InvalidPendingPayload)?;

    let sale = client.create_sale(&record.payload).await?;
    client.approve_pending_sale(pending_id, sale.id).await?;

    let preview = match sale.id {
        Some(sale_id) => match client.sale_detail(sale_id).await {
            Ok(detail) => Some(detail),
            Err(error) => {
                warn!(%error, sale_id, "receipt preview fetch failed after approval");
                None
            }
        },
        None => None,
    };

    info!(pending_id, sale_id = ?sale.id, "pending sale approved");
    Ok(ApprovalOutcome {
        pending_id,
        sale_id: sale.id,
        preview,
    })
}

// =============================================================================
// Deletion
// =============================================================================

/// Deletes a still-pending request. Irreversible.
pub async fn delete_request(client: &PosClient, record: &PendingSaleRecord) -> BillingResult<()> {
    record.ensure_pending()?;
    let pending_id = record.id.ok_or(CoreError::InvalidPendingPayload)?;

    client.delete_pending_sale(pending_id).await?;
    info!(pending_id, "pending sale deleted");
    Ok(())
}

// =============================================================================
// Auto-Draft Safety Net
// =============================================================================

/// Persists an abandoned session as an anonymous draft, fire-and-forget.
///
/// Called when the operator navigates away or the app closes with real
/// work in the cart. No retry, no user-visible failure; the spawned task
/// just logs at debug if the save is lost.
pub fn auto_draft_on_leave(client: &PosClient, session: &BillingSession) {
    if !session.should_auto_draft() {
        return;
    }
    let payload = session.to_draft_payload(None);
    let client = client.clone();
    tokio::spawn(async move {
        if let Err(error) = client.create_draft(&payload).await {
            debug!(%error, "auto-draft save failed");
        }
    });
}

// =============================================================================
// Unit Tests
// =============================================================================

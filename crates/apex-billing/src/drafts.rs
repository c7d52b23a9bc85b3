//! # Drafts
//!
//! Named billing-session snapshots the operator can park and resume.
//!
//! A draft restores verbatim - full cart lines, prices and all - with no
//! catalog re-join, because it is the operator's own work in progress
//! rather than a request awaiting someone else's approval (contrast
//! [`crate::lifecycle::load_for_edit`]). The navigate-away auto-draft of
//! [`crate::lifecycle::auto_draft_on_leave`] writes the same payload with
//! a `None` name.

use tracing::{info, warn};

use apex_client::{DraftRow, PosClient};

use crate::error::BillingResult;
use crate::session::BillingSession;

/// Normalizes an operator-typed draft name: trimmed, empty becomes
/// anonymous.
pub fn normalize_draft_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Saves the session as a draft under the given name.
pub async fn save_draft(
    client: &PosClient,
    session: &BillingSession,
    name: &str,
) -> BillingResult<()> {
    let payload = session.to_draft_payload(normalize_draft_name(name));
    client.create_draft(&payload).await?;
    info!(name = %payload.name.as_deref().unwrap_or("(unnamed)"), lines = payload.cart.len(), "draft saved");
    Ok(())
}

/// Fetches the saved drafts. A failed refresh answers an empty list.
pub async fn drafts(client: &PosClient) -> Vec<DraftRow> {
    match client.drafts().await {
        Ok(rows) => rows,
        Err(error) => {
            warn!(%error, "drafts refresh failed");
            Vec::new()
        }
    }
}

/// Loads a draft into the session, replacing its current contents.
pub async fn load_draft(
    client: &PosClient,
    session: &mut BillingSession,
    id: i64,
) -> BillingResult<()> {
    let row = client.draft(id).await?;
    let payload = row.data.unwrap_or_default();
    session.apply_draft(&payload);
    info!(draft_id = id, lines = session.lines().len(), "draft loaded");
    Ok(())
}

/// Deletes a saved draft.
pub async fn delete_draft(client: &PosClient, id: i64) -> BillingResult<()> {
    client.delete_draft(id).await?;
    info!(draft_id = id, "draft deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_draft_name() {
        assert_eq!(normalize_draft_name("  counter one "), Some("counter one".to_string()));
        assert_eq!(normalize_draft_name("   "), None);
        assert_eq!(normalize_draft_name(""), None);
    }
}

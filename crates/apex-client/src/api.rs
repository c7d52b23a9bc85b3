//! Typed endpoint wrappers for the POS backend.
//!
//! Wire DTOs live here and convert into apex-core types at the boundary.
//! The backend predates this engine, so the DTOs absorb its quirks:
//! list endpoints that answer either a bare array or `{items: [...]}`,
//! products whose effective price is `billingPrice ?? price`, pending
//! rows that nest status/payload under a `pending` object, and numeric
//! fields that may arrive as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use apex_core::money::de;
use apex_core::{Customer, DraftPayload, PendingSaleRecord, PendingStatus, Product, SaleRequest};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub price: f64,
    /// Preferred billing price when the backend distinguishes it from the
    /// list price.
    #[serde(default, deserialize_with = "de::flexible_opt_money")]
    pub billing_price: Option<f64>,
    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub stock: i64,
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub default_discount_percent: f64,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Product {
            id: dto.id,
            barcode: dto.barcode,
            name: dto.name,
            price: dto.billing_price.unwrap_or(dto.price),
            stock: dto.stock,
            default_discount_percent: dto.default_discount_percent,
        }
    }
}

/// Product list endpoints answer either a bare array or `{items: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductListDto {
    Plain(Vec<ProductDto>),
    Wrapped { items: Vec<ProductDto> },
}

impl ProductListDto {
    fn into_products(self) -> Vec<Product> {
        let list = match self {
            ProductListDto::Plain(list) => list,
            ProductListDto::Wrapped { items } => items,
        };
        list.into_iter().map(Product::from).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutstandingRowDto {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    customer_id: Option<i64>,
    #[serde(default, deserialize_with = "de::flexible_money")]
    outstanding: f64,
}

#[derive(Debug, Deserialize)]
struct OutstandingReportDto {
    #[serde(default)]
    rows: Vec<OutstandingRowDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRefDto {
    #[serde(default)]
    pub username: Option<String>,
}

/// The sale row returned by `POST /sales`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSale {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub created_by: Option<UserRefDto>,
}

/// `POST /sales` answers `{sale: {...}}` on some deployments and the bare
/// sale row on others. Wrapped must be tried first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SaleEnvelope {
    Wrapped { sale: FinalizedSale },
    Plain(FinalizedSale),
}

impl SaleEnvelope {
    fn into_sale(self) -> FinalizedSale {
        match self {
            SaleEnvelope::Wrapped { sale } => sale,
            SaleEnvelope::Plain(sale) => sale,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailItem {
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub qty: i64,
    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub free_qty: i64,
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub price: f64,
    #[serde(default)]
    pub product: Option<SaleDetailProduct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailProduct {
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The full sale row fetched for a receipt preview after approval.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub discount_value: f64,
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub total: f64,
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub cash_received: f64,
    #[serde(default)]
    pub created_by: Option<UserRefDto>,
    #[serde(default)]
    pub sale_items: Vec<SaleDetailItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingInfoDto {
    #[serde(default)]
    status: PendingStatus,
    #[serde(default)]
    payload: Option<SaleRequest>,
    #[serde(default)]
    requested_by: Option<UserRefDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadHolderDto {
    #[serde(default)]
    payload: Option<SaleRequest>,
}

/// A pending-sale row as the backend ships it: id and timestamp at the
/// top, everything else under `pending` (with older deployments putting
/// the payload under `data` or at the top level).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingRowDto {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    id: Option<i64>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    pending: Option<PendingInfoDto>,
    #[serde(default)]
    data: Option<PayloadHolderDto>,
    #[serde(default)]
    payload: Option<SaleRequest>,
}

impl PendingRowDto {
    fn into_record(self) -> ClientResult<PendingSaleRecord> {
        let info = self.pending.unwrap_or_default();
        let payload = info
            .payload
            .or(self.data.and_then(|d| d.payload))
            .or(self.payload)
            .ok_or_else(|| ClientError::InvalidResponse("Pending sale payload missing".into()))?;

        Ok(PendingSaleRecord {
            id: self.id,
            status: info.status,
            payload,
            requested_by: info.requested_by.and_then(|u| u.username),
            updated_at: parse_timestamp(self.updated_at.as_deref()),
        })
    }
}

/// A saved draft row. List responses may omit `data`; the single-draft
/// endpoint includes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRow {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub data: Option<DraftPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveBody {
    sale_id: Option<i64>,
}

/// Body for `PUT /customers/:id`: the annotation-bearing notes blob plus
/// the fields the backend requires on every update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: String,
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Percent-encodes a path segment (barcodes can carry slashes or spaces).
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

// =============================================================================
// Client
// =============================================================================

/// Typed client for every backend contract the billing engine consumes.
#[derive(Debug, Clone)]
pub struct PosClient {
    http: HttpClient,
}

impl PosClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(PosClient {
            http: HttpClient::new(config)?,
        })
    }

    /// Builds a client from `APEX_API_*` environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(&ClientConfig::from_env())
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        PosClient {
            http: self.http.with_token(token),
        }
    }

    // ========== Products ==========

    /// `GET /products/:barcode` - live stock/price lookup.
    pub async fn product_by_barcode(&self, barcode: &str) -> ClientResult<Product> {
        let dto: ProductDto = self
            .http
            .get(&format!("/products/{}", encode_path_segment(barcode.trim())))
            .await?;
        Ok(dto.into())
    }

    /// `GET /products` - full catalog snapshot.
    pub async fn products(&self) -> ClientResult<Vec<Product>> {
        let list: ProductListDto = self.http.get("/products").await?;
        Ok(list.into_products())
    }

    /// `GET /products/search?q=` - picker candidates.
    pub async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>> {
        let list: ProductListDto = self
            .http
            .get_query("/products/search", &[("q", query)])
            .await?;
        Ok(list.into_products())
    }

    // ========== Customers ==========

    /// `GET /customers` (optionally filtered with `?q=`).
    pub async fn customers(&self, query: Option<&str>) -> ClientResult<Vec<Customer>> {
        match query {
            Some(q) => self.http.get_query("/customers", &[("q", q)]).await,
            None => self.http.get("/customers").await,
        }
    }

    /// `GET /reports/customer-outstanding` - outstanding balances keyed
    /// by customer id.
    pub async fn customer_outstanding(&self) -> ClientResult<HashMap<i64, f64>> {
        let report: OutstandingReportDto = self.http.get("/reports/customer-outstanding").await?;
        Ok(report
            .rows
            .into_iter()
            .filter_map(|row| row.customer_id.map(|id| (id, row.outstanding)))
            .collect())
    }

    /// `PUT /customers/:id` - persists the updated notes/outstanding.
    pub async fn update_customer(&self, id: i64, update: &CustomerUpdate) -> ClientResult<Customer> {
        self.http.put(&format!("/customers/{id}"), update).await
    }

    // ========== Sales ==========

    /// `POST /sales` - authoritative sale finalization. Backend
    /// rejections (stock, payment) surface verbatim and are never
    /// retried here.
    pub async fn create_sale(&self, request: &SaleRequest) -> ClientResult<FinalizedSale> {
        let envelope: SaleEnvelope = self.http.post("/sales", request).await?;
        let sale = envelope.into_sale();
        debug!(sale_id = ?sale.id, "sale finalized");
        Ok(sale)
    }

    /// `GET /sales/:id` - full sale row for receipt preview.
    pub async fn sale_detail(&self, id: i64) -> ClientResult<SaleDetail> {
        self.http.get(&format!("/sales/{id}")).await
    }

    // ========== Pending Sales ==========

    /// `GET /pending-sales` - all pending-sale rows.
    pub async fn pending_sales(&self) -> ClientResult<Vec<PendingSaleRecord>> {
        let rows: Vec<PendingRowDto> = self.http.get("/pending-sales").await?;
        rows.into_iter().map(PendingRowDto::into_record).collect()
    }

    /// `GET /pending-sales/:id`.
    pub async fn pending_sale(&self, id: i64) -> ClientResult<PendingSaleRecord> {
        let row: PendingRowDto = self.http.get(&format!("/pending-sales/{id}")).await?;
        row.into_record()
    }

    /// `POST /pending-sales` - submit a new request.
    pub async fn create_pending_sale(&self, request: &SaleRequest) -> ClientResult<()> {
        let _: serde_json::Value = self.http.post("/pending-sales", request).await?;
        Ok(())
    }

    /// `PUT /pending-sales/:id` - overwrite a still-pending request.
    pub async fn update_pending_sale(&self, id: i64, request: &SaleRequest) -> ClientResult<()> {
        let _: serde_json::Value = self
            .http
            .put(&format!("/pending-sales/{id}"), request)
            .await?;
        Ok(())
    }

    /// `POST /pending-sales/:id/approve` - transition to approved,
    /// optionally recording the sale the request became. The sale id may
    /// legitimately be unknown at call time.
    pub async fn approve_pending_sale(&self, id: i64, sale_id: Option<i64>) -> ClientResult<()> {
        let _: serde_json::Value = self
            .http
            .post(&format!("/pending-sales/{id}/approve"), &ApproveBody { sale_id })
            .await?;
        Ok(())
    }

    /// `DELETE /pending-sales/:id` - irreversible.
    pub async fn delete_pending_sale(&self, id: i64) -> ClientResult<()> {
        let _: serde_json::Value = self.http.delete(&format!("/pending-sales/{id}")).await?;
        Ok(())
    }

    // ========== Drafts ==========

    /// `GET /drafts`.
    pub async fn drafts(&self) -> ClientResult<Vec<DraftRow>> {
        self.http.get("/drafts").await
    }

    /// `GET /drafts/:id`.
    pub async fn draft(&self, id: i64) -> ClientResult<DraftRow> {
        self.http.get(&format!("/drafts/{id}")).await
    }

    /// `POST /drafts`.
    pub async fn create_draft(&self, payload: &DraftPayload) -> ClientResult<()> {
        let _: serde_json::Value = self.http.post("/drafts", payload).await?;
        Ok(())
    }

    /// `DELETE /drafts/:id`.
    pub async fn delete_draft(&self, id: i64) -> ClientResult<()> {
        let _: serde_json::Value = self.http.delete(&format!("/drafts/{id}")).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_billing_price_fallback() {
        let dto: ProductDto = serde_json::from_str(
            r#"{"barcode":"111","name":"Rice","price":1200,"billingPrice":1150,"stock":"40"}"#,
        )
        .unwrap();
        let product: Product = dto.into();
        assert_eq!(product.price, 1150.0);
        assert_eq!(product.stock, 40);

        let dto: ProductDto =
            serde_json::from_str(r#"{"barcode":"111","price":"1,200"}"#).unwrap();
        let product: Product = dto.into();
        assert_eq!(product.price, 1200.0);
    }

    #[test]
    fn test_product_list_accepts_both_shapes() {
        let plain: ProductListDto =
            serde_json::from_str(r#"[{"barcode":"111","price":10}]"#).unwrap();
        assert_eq!(plain.into_products().len(), 1);

        let wrapped: ProductListDto =
            serde_json::from_str(r#"{"items":[{"barcode":"111","price":10}]}"#).unwrap();
        assert_eq!(wrapped.into_products().len(), 1);
    }

    #[test]
    fn test_sale_envelope_both_shapes() {
        let wrapped: SaleEnvelope = serde_json::from_str(r#"{"sale":{"id":12}}"#).unwrap();
        assert_eq!(wrapped.into_sale().id, Some(12));

        let plain: SaleEnvelope = serde_json::from_str(r#"{"id":12}"#).unwrap();
        assert_eq!(plain.into_sale().id, Some(12));
    }

    #[test]
    fn test_pending_row_flattens_nested_shape() {
        let row: PendingRowDto = serde_json::from_str(
            r#"{
                "id": 7,
                "updatedAt": "2026-08-01T09:30:00Z",
                "pending": {
                    "status": "pending",
                    "payload": {"items":[{"barcode":"111","qty":2}],"paymentMethod":"cash"},
                    "requestedBy": {"username": "kasun"}
                }
            }"#,
        )
        .unwrap();
        let record = row.into_record().unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.status, PendingStatus::Pending);
        assert_eq!(record.requested_by.as_deref(), Some("kasun"));
        assert_eq!(record.payload.items[0].qty, 2);
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn test_pending_row_payload_fallbacks() {
        // Older deployments put the payload under `data` or at top level.
        let row: PendingRowDto = serde_json::from_str(
            r#"{"id": 3, "data": {"payload": {"items":[{"barcode":"111","qty":1}]}}}"#,
        )
        .unwrap();
        assert!(row.into_record().is_ok());

        let row: PendingRowDto =
            serde_json::from_str(r#"{"id": 4, "payload": {"items":[]}}"#).unwrap();
        assert!(row.into_record().is_ok());

        let row: PendingRowDto = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        let err = row.into_record().unwrap_err();
        assert_eq!(err.to_string(), "Invalid response: Pending sale payload missing");
    }

    #[test]
    fn test_missing_status_defaults_to_pending() {
        let row: PendingRowDto = serde_json::from_str(
            r#"{"id": 7, "pending": {"payload": {"items":[{"barcode":"1","qty":1}]}}}"#,
        )
        .unwrap();
        assert_eq!(row.into_record().unwrap().status, PendingStatus::Pending);
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("4796001234"), "4796001234");
        assert_eq!(encode_path_segment("AB 12/3"), "AB%2012%2F3");
    }
}

//! # apex-client: REST Boundary for Apex POS
//!
//! Typed client for the black-box REST backend. The backend owns
//! persistence, authentication and the authoritative stock and payment
//! checks; this crate owns getting there and back with types intact.
//!
//! ## Contract Notes
//! - Backend error bodies (`{"error": "..."}`) surface verbatim - a
//!   stock or payment rejection from `POST /sales` reaches the operator
//!   exactly as the backend phrased it, and is never silently retried.
//! - The wire is camelCase JSON with the legacy clients' loose number
//!   encoding; DTOs in [`api`] absorb that and hand apex-core clean
//!   types.
//!
//! ## Example
//! ```rust,no_run
//! use apex_client::{ClientConfig, PosClient};
//!
//! # async fn demo() -> Result<(), apex_client::ClientError> {
//! let client = PosClient::new(&ClientConfig::new("http://localhost:4000"))?;
//! let product = client.product_by_barcode("4796001234").await?;
//! println!("{} in stock: {}", product.name, product.stock);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use api::{CustomerUpdate, DraftRow, FinalizedSale, PosClient, SaleDetail, SaleDetailItem};
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

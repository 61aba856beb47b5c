//! # Pallas Test
//!
//! In-memory testing for Pallas applications. Requests go through the
//! complete pipeline of a built [`Mvc`](pallas::Mvc) without a server or
//! network connection.
//!
//! ## Key Features
//!
//! - **Action Addressing**: Requests name the action id and route values directly
//! - **Request Builder**: Headers, raw, JSON and form bodies, cancellation tokens
//! - **Response Assertions**: Status, headers, JSON fields and model-state errors
//! - **Errors Preserved**: `try_send` returns the application's `PallasError`
//!
//! ## Example
//!
//! ```ignore
//! use pallas_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_order() {
//!     let client = TestClient::new(mvc());
//!
//!     let response = client
//!         .post("Orders.Create", "/orders")
//!         .json(&json!({"Quantity": 50}))
//!         .send()
//!         .await;
//!
//!     response.assert_status(http::StatusCode::BAD_REQUEST);
//!     assert_eq!(
//!         response.model_errors("Quantity"),
//!         ["The field Quantity must be between 1 and 10."]
//!     );
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/pallas-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;

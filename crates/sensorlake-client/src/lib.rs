//! # Sensorlake Client
//!
//! HTTP transport and client facade for the sensorlake time-series service.
//! The model types live in `sensorlake-core` and are re-exported here.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Device and data operations |
//! | [`executor`] | Request dispatch and envelope classification |
//! | [`pager`] | Segment source that re-issues requests with a continuation token |
//! | [`http_client`] | Transport seam and the reqwest implementation |
//! | [`retry`] | Backoff and retry policy for idempotent requests |
//! | [`config`] | Client configuration and `SENSORLAKE_*` environment lookup |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensorlake_client::{Client, ClientConfig, Selection, Selector};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new("https://lake.example.com").with_api_key("key"));
//! let envelope = client
//!     .list_devices(Selection::devices(Selector::attribute("building", "hq")))
//!     .await?;
//!
//! if let Some(cursor) = envelope.into_value() {
//!     for device in cursor.collect_all().await? {
//!         println!("{}", device.key);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod executor;
pub mod http_client;
pub mod pager;
pub mod retry;

pub use client::Client;
pub use config::ClientConfig;
pub use executor::{Executor, REQUEST_ID_HEADER};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use pager::ExecutorPager;
pub use retry::{AttemptOutcome, Backoff, RetryConfig};

pub use sensorlake_core::*;

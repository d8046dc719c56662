//! # Sensorlake Core
//!
//! Transport-free contracts for the sensorlake time-series client.
//!
//! ## Overview
//!
//! - **Selector tree**: boolean expressions naming devices or sensors
//! - **Selection / Search / Query**: the request payload handed to the executor
//! - **Result envelope**: success, partial success with per-item status, or failure
//! - **Segment / Cursor**: lazily advancing pagination over remote pages
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`selector`] | Selector expression tree |
//! | [`selection`] | Per-resource-kind selector scope |
//! | [`query`] | Search, operation and query builders |
//! | [`pipeline`] | Opaque read transform descriptors |
//! | [`envelope`] | Result envelope and multi-status |
//! | [`cursor`] | Segments, continuation tokens and the cursor |
//! | [`domain`] | Device, sensor and data point records |
//! | [`error`] | Core error types |
//!
//! ## Quick Start
//!
//! ```rust
//! use sensorlake_core::{Query, Search, Selection, Selector, Timestamp};
//!
//! let selection = Selection::devices(Selector::and([
//!     Selector::attribute("building", "hq"),
//!     Selector::attribute_key("calibrated"),
//! ]));
//! let start = Timestamp::parse("2024-01-01T00:00:00Z")?;
//! let stop = Timestamp::parse("2024-01-02T00:00:00Z")?;
//! let query = Query::read(Search::devices(selection), start, stop, None)?;
//! assert_eq!(query.operation.name(), "read");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cursor;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod selection;
pub mod selector;

pub use cursor::{ContinuationToken, Cursor, CursorState, FetchFuture, Segment, SegmentSource};
pub use domain::{
    Attributed, DataPoint, DeleteSummary, Device, Row, Sensor, Timestamp, WritePoint, WriteSummary,
};
pub use envelope::{is_success_status, Envelope, ItemStatus, MultiStatus, ResultCode, MULTI_STATUS};
pub use error::{ClientError, DecodeError, InvalidRangeError, ValidationError};
pub use pipeline::{Fold, Interpolation, Pipeline, PipelineFunction};
pub use query::{validate_range, DeleteOp, FindOp, Operation, Query, ReadOp, Search, WriteOp};
pub use selection::{ResourceKind, Selection};
pub use selector::Selector;

//! # Domain Records
//!
//! Plain serializable records exchanged with the service. They carry no
//! behavior beyond construction-time validation.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Device`] | Device with attributes and sensors |
//! | [`Sensor`] | Sensor with attributes |
//! | [`DataPoint`] | Timestamped value |
//! | [`WritePoint`] | Batch write item addressed by device/sensor |
//! | [`Row`] | Values read at one instant |
//! | [`Timestamp`] | Offset-aware RFC3339 instant |

mod datapoint;
mod device;
mod timestamp;

pub use datapoint::{DataPoint, DeleteSummary, Row, WritePoint, WriteSummary};
pub use device::{Attributed, Device, Sensor};
pub use timestamp::Timestamp;

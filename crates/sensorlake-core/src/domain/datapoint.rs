use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::device::validate_key;
use crate::{Timestamp, ValidationError};

/// A single timestamped value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub ts: Timestamp,
    pub value: f64,
}

impl DataPoint {
    pub fn new(ts: Timestamp, value: f64) -> Result<Self, ValidationError> {
        validate_finite("value", value)?;
        Ok(Self { ts, value })
    }
}

/// One item of a batch write, addressed by device and sensor key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritePoint {
    pub device: String,
    pub sensor: String,
    pub ts: Timestamp,
    pub value: f64,
}

impl WritePoint {
    pub fn new(
        device: impl Into<String>,
        sensor: impl Into<String>,
        point: DataPoint,
    ) -> Result<Self, ValidationError> {
        validate_finite("value", point.value)?;
        Ok(Self {
            device: validate_key("device key", device.into())?,
            sensor: validate_key("sensor key", sensor.into())?,
            ts: point.ts,
            value: point.value,
        })
    }
}

/// Values read at one instant, keyed by device then sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub ts: Timestamp,
    #[serde(default)]
    pub values: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Row {
    pub fn new(ts: Timestamp) -> Self {
        Self {
            ts,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, device: impl Into<String>, sensor: impl Into<String>, value: f64) -> Self {
        self.values
            .entry(device.into())
            .or_default()
            .insert(sensor.into(), value);
        self
    }

    pub fn get(&self, device: &str, sensor: &str) -> Option<f64> {
        self.values.get(device)?.get(sensor).copied()
    }
}

/// Count of resources or points removed by a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub deleted: u64,
}

/// Outcome accounting for a batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub submitted: usize,
    pub rejected: usize,
}

impl WriteSummary {
    pub const fn accepted(self) -> usize {
        self.submitted.saturating_sub(self.rejected)
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        Timestamp::parse("2024-03-01T00:00:00Z").expect("valid timestamp")
    }

    #[test]
    fn rejects_non_finite_point() {
        let err = DataPoint::new(ts(), f64::NAN).expect_err("must fail");
        assert_eq!(err, ValidationError::NonFiniteValue { field: "value" });
    }

    #[test]
    fn write_point_requires_sensor_key() {
        let point = DataPoint::new(ts(), 1.5).expect("valid point");
        let err = WritePoint::new("device-1", "", point).expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::EmptyKey {
                field: "sensor key"
            }
        );
    }

    #[test]
    fn row_lookup_by_device_and_sensor() {
        let row = Row::new(ts())
            .with_value("d1", "temp", 21.5)
            .with_value("d1", "humidity", 40.0);

        assert_eq!(row.get("d1", "temp"), Some(21.5));
        assert_eq!(row.get("d2", "temp"), None);
    }
}

//! Result envelope and per-item batch status.
//!
//! An [`Envelope`] is a read-only snapshot of one request's outcome:
//!
//! | Code | Value | Meaning |
//! |------|-------|---------|
//! | [`ResultCode::Success`] | present | transport ok, every batch item ok |
//! | [`ResultCode::PartialSuccess`] | present | some batch items failed; consult `multi_status` |
//! | [`ResultCode::Failure`] | absent | transport error, non-2xx, or every item rejected |

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Cursor, DecodeError, Segment, SegmentSource};

/// HTTP 207, used by the service for batch outcomes.
pub const MULTI_STATUS: u16 = 207;

/// Overall outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    Success,
    PartialSuccess,
    Failure,
}

impl ResultCode {
    /// Derives the overall code from the transport status and item outcomes.
    ///
    /// Non-2xx is a failure. With items, none failing is a success, all
    /// failing is a failure, anything in between is a partial success.
    pub fn classify(status: u16, multi_status: Option<&MultiStatus>) -> Self {
        if !is_success_status(status) {
            return Self::Failure;
        }

        let Some(multi_status) = multi_status.filter(|statuses| !statuses.is_empty()) else {
            return Self::Success;
        };

        match multi_status.failure_count() {
            0 => Self::Success,
            failed if failed == multi_status.len() => Self::Failure,
            _ => Self::PartialSuccess,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failure => "failure",
        }
    }
}

/// Outcome of one submitted batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatus {
    /// Position of the item in the submitted batch.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ItemStatus {
    pub fn ok(index: usize) -> Self {
        Self {
            index,
            key: None,
            status: 200,
            message: None,
        }
    }

    pub fn failed(index: usize, status: u16, message: impl Into<String>) -> Self {
        Self {
            index,
            key: None,
            status,
            message: Some(message.into()),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub const fn is_success(&self) -> bool {
        is_success_status(self.status)
    }
}

/// Ordered per-item outcomes for a batch request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiStatus(Vec<ItemStatus>);

impl MultiStatus {
    pub fn new(statuses: Vec<ItemStatus>) -> Self {
        Self(statuses)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemStatus> {
        self.0.iter()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemStatus> {
        self.0.iter().filter(|status| !status.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn success_count(&self) -> usize {
        self.len() - self.failure_count()
    }

    /// Accounts for every one of `submitted` items, in index order.
    ///
    /// Items the service did not report are recorded as implicit successes.
    /// An index past the batch or reported twice is a decode error.
    pub fn reconcile(self, submitted: usize) -> Result<Self, DecodeError> {
        let mut reported = BTreeMap::new();
        for status in self.0 {
            if status.index >= submitted {
                return Err(DecodeError::new(
                    "multi-status",
                    format!(
                        "item index {} is outside a batch of {submitted}",
                        status.index
                    ),
                ));
            }
            let index = status.index;
            if reported.insert(index, status).is_some() {
                return Err(DecodeError::new(
                    "multi-status",
                    format!("item index {index} is reported more than once"),
                ));
            }
        }

        let statuses = (0..submitted)
            .map(|index| reported.remove(&index).unwrap_or_else(|| ItemStatus::ok(index)))
            .collect();
        Ok(Self(statuses))
    }
}

impl IntoIterator for MultiStatus {
    type Item = ItemStatus;
    type IntoIter = std::vec::IntoIter<ItemStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Outcome of one request.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    value: Option<T>,
    code: ResultCode,
    status: u16,
    message: String,
    multi_status: Option<MultiStatus>,
}

impl<T> Envelope<T> {
    pub fn success(status: u16, value: T) -> Self {
        Self {
            value: Some(value),
            code: ResultCode::Success,
            status,
            message: String::from("success"),
            multi_status: None,
        }
    }

    pub fn failure(
        status: u16,
        message: impl Into<String>,
        multi_status: Option<MultiStatus>,
    ) -> Self {
        Self {
            value: None,
            code: ResultCode::Failure,
            status,
            message: message.into(),
            multi_status,
        }
    }

    /// Builds an envelope whose code follows [`ResultCode::classify`]. The
    /// value is dropped when the outcome is a failure.
    pub fn classified(status: u16, value: T, multi_status: Option<MultiStatus>) -> Self {
        let code = ResultCode::classify(status, multi_status.as_ref());
        let (failed, total) = multi_status
            .as_ref()
            .map(|statuses| (statuses.failure_count(), statuses.len()))
            .unwrap_or((0, 0));

        let message = match code {
            ResultCode::Success => String::from("success"),
            ResultCode::PartialSuccess => format!("{failed} of {total} items failed"),
            ResultCode::Failure if total > 0 => format!("all {total} items failed"),
            ResultCode::Failure => format!("request failed with status {status}"),
        };

        Self {
            value: (code != ResultCode::Failure).then_some(value),
            code,
            status,
            message,
            multi_status,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub const fn code(&self) -> ResultCode {
        self.code
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn multi_status(&self) -> Option<&MultiStatus> {
        self.multi_status.as_ref()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemStatus> {
        self.multi_status.iter().flat_map(MultiStatus::failures)
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }

    pub fn is_partial(&self) -> bool {
        self.code == ResultCode::PartialSuccess
    }

    pub fn is_failure(&self) -> bool {
        self.code == ResultCode::Failure
    }

    /// Transforms the value while keeping code, status, message and items.
    pub fn map<U, F>(self, f: F) -> Envelope<U>
    where
        F: FnOnce(T) -> U,
    {
        Envelope {
            value: self.value.map(f),
            code: self.code,
            status: self.status,
            message: self.message,
            multi_status: self.multi_status,
        }
    }
}

impl<T: Send + 'static> Envelope<Segment<T>> {
    /// Adapts a first page into a cursor that can fetch the rest.
    ///
    /// A failed or value-less envelope yields an empty, exhausted cursor, so
    /// the adapted envelope always carries a cursor. Code, message and items
    /// are preserved either way.
    pub fn into_cursor(self, source: Arc<dyn SegmentSource<T>>) -> Envelope<Cursor<T>> {
        let Envelope {
            value,
            code,
            status,
            message,
            multi_status,
        } = self;

        let cursor = match value {
            Some(segment) if code != ResultCode::Failure => Cursor::new(segment, Some(source)),
            _ => Cursor::empty(),
        };

        Envelope {
            value: Some(cursor),
            code,
            status,
            message,
            multi_status,
        }
    }
}

pub const fn is_success_status(status: u16) -> bool {
    status >= 200 && status < 300
}

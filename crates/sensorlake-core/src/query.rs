//! Search, operation and query builders.
//!
//! A [`Query`] pairs a [`Search`] (which resources) with an [`Operation`]
//! (what to do with them). Builders are pure: the only check they make is
//! that a read window is ordered.
//!
//! ```text
//! {"search": {"type": "device", "selection": {...}}, "read": {"start": ..., "stop": ...}}
//! ```

use serde::{Deserialize, Serialize};

use crate::{InvalidRangeError, Pipeline, ResourceKind, Selection, Timestamp, WritePoint};

/// A selection evaluated for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub selection: Selection,
}

impl Search {
    pub fn new(kind: ResourceKind, selection: Selection) -> Self {
        Self { kind, selection }
    }

    pub fn devices(selection: Selection) -> Self {
        Self::new(ResourceKind::Device, selection)
    }

    pub fn sensors(selection: Selection) -> Self {
        Self::new(ResourceKind::Sensor, selection)
    }
}

/// Lists matching resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOp {
    /// Page-size hint for the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Reads points in `[start, stop]`, optionally through a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReadOpWire")]
pub struct ReadOp {
    start: Timestamp,
    stop: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<Pipeline>,
}

impl ReadOp {
    pub fn new(
        start: Timestamp,
        stop: Timestamp,
        pipeline: Option<Pipeline>,
    ) -> Result<Self, InvalidRangeError> {
        validate_range(start, stop)?;
        Ok(Self {
            start,
            stop,
            pipeline,
        })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn stop(&self) -> Timestamp {
        self.stop
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }
}

#[derive(Deserialize)]
struct ReadOpWire {
    start: Timestamp,
    stop: Timestamp,
    #[serde(default)]
    pipeline: Option<Pipeline>,
}

impl TryFrom<ReadOpWire> for ReadOp {
    type Error = InvalidRangeError;

    fn try_from(wire: ReadOpWire) -> Result<Self, Self::Error> {
        Self::new(wire.start, wire.stop, wire.pipeline)
    }
}

/// Writes a batch of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteOp {
    pub points: Vec<WritePoint>,
}

/// Deletes matching resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOp {}

/// Action applied to the resources a search matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Find(FindOp),
    Read(ReadOp),
    Write(WriteOp),
    Delete(DeleteOp),
}

impl Operation {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Find(_) => "find",
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::Delete(_) => "delete",
        }
    }
}

/// The unit sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub search: Search,
    #[serde(flatten)]
    pub operation: Operation,
}

impl Query {
    pub fn new(search: Search, operation: Operation) -> Self {
        Self { search, operation }
    }

    pub fn find(search: Search) -> Self {
        Self::new(search, Operation::Find(FindOp::default()))
    }

    pub fn find_with_limit(search: Search, limit: usize) -> Self {
        Self::new(search, Operation::Find(FindOp { limit: Some(limit) }))
    }

    pub fn read(
        search: Search,
        start: Timestamp,
        stop: Timestamp,
        pipeline: Option<Pipeline>,
    ) -> Result<Self, InvalidRangeError> {
        let read = ReadOp::new(start, stop, pipeline)?;
        Ok(Self::new(search, Operation::Read(read)))
    }

    pub fn write(search: Search, points: Vec<WritePoint>) -> Self {
        Self::new(search, Operation::Write(WriteOp { points }))
    }

    pub fn delete(search: Search) -> Self {
        Self::new(search, Operation::Delete(DeleteOp {}))
    }
}

/// Fails when `start` lies after `stop`; an empty window is allowed.
pub fn validate_range(start: Timestamp, stop: Timestamp) -> Result<(), InvalidRangeError> {
    if start > stop {
        return Err(InvalidRangeError { start, stop });
    }
    Ok(())
}

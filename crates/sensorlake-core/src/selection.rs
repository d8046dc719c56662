use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Selector, ValidationError};

/// Kind of resource a selector or search applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Device,
    Sensor,
}

impl ResourceKind {
    pub const ALL: [Self; 2] = [Self::Device, Self::Sensor];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Sensor => "sensor",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "device" | "devices" => Ok(Self::Device),
            "sensor" | "sensors" => Ok(Self::Sensor),
            other => Err(ValidationError::InvalidResourceKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Per-kind selector scope; at most one selector per [`ResourceKind`].
///
/// An empty selection still encodes as `{}` so the service can tell "no
/// constraint" apart from "no selection sent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<ResourceKind, Selector>);

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the selector for `kind`, replacing any earlier one.
    pub fn add(mut self, kind: ResourceKind, selector: Selector) -> Self {
        self.0.insert(kind, selector);
        self
    }

    pub fn devices(selector: Selector) -> Self {
        Self::empty().add(ResourceKind::Device, selector)
    }

    pub fn sensors(selector: Selector) -> Self {
        Self::empty().add(ResourceKind::Sensor, selector)
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Selector> {
        self.0.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &Selector)> {
        self.0.iter().map(|(kind, selector)| (*kind, selector))
    }
}

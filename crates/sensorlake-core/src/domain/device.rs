use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A record that selectors can be evaluated against.
pub trait Attributed {
    fn key(&self) -> &str;
    fn attributes(&self) -> &BTreeMap<String, String>;
}

/// A device and the sensors it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

impl Device {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            key: validate_key("device key", key.into())?,
            name: String::new(),
            attributes: BTreeMap::new(),
            sensors: Vec::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.sensors.push(sensor);
        self
    }

    pub fn sensor(&self, key: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|sensor| sensor.key == key)
    }
}

impl Attributed for Device {
    fn key(&self) -> &str {
        &self.key
    }

    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// A named series on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Sensor {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            key: validate_key("sensor key", key.into())?,
            name: String::new(),
            attributes: BTreeMap::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Attributed for Sensor {
    fn key(&self) -> &str {
        &self.key
    }

    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

pub(crate) fn validate_key(field: &'static str, key: String) -> Result<String, ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::EmptyKey { field });
    }
    Ok(key)
}

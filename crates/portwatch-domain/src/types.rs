use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A single value inside a feature's `properties` or an observation's
/// `metadata` map. Modelled explicitly instead of as raw JSON so that the
/// accepted shapes are visible in the type and round-trip losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Map(BTreeMap<String, PropertyValue>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Free-form key/value map attached to features, readings and observations.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Identifier of an external observation source. The declared order here is
/// the fixed reporting order used by the cross-source aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Nasa,
    Esa,
    Lima,
}

impl SourceId {
    /// All external sources in declared reporting order.
    pub const ALL: [SourceId; 3] = [SourceId::Nasa, SourceId::Esa, SourceId::Lima];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Nasa => "nasa",
            SourceId::Esa => "esa",
            SourceId::Lima => "lima",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nasa" => Ok(SourceId::Nasa),
            "esa" => Ok(SourceId::Esa),
            "lima" => Ok(SourceId::Lima),
            other => Err(DomainError::InvalidPayload(format!(
                "unknown observation source: {}",
                other
            ))),
        }
    }
}

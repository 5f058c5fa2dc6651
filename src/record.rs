//! Instance record and endpoint data structures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One database instance as described by the directory API.
///
/// The record keeps the provider's nested key/value shape (`DBInstanceIdentifier`,
/// `Endpoint.Address`, `DBSubnetGroup.Subnets`, ...) rather than a fixed struct, so
/// partially populated responses never fail to load. Typed projections live in
/// [`Attributes`](crate::Attributes).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceRecord(Map<String, Value>);

impl InstanceRecord {
    /// Wraps a JSON object. Returns `None` for any other JSON value.
    ///
    /// # Example
    ///
    /// ```
    /// use rds_qa::InstanceRecord;
    /// use serde_json::json;
    ///
    /// let record = InstanceRecord::from_value(json!({"DBInstanceIdentifier": "qa"})).unwrap();
    /// assert_eq!(record.identifier(), Some("qa"));
    ///
    /// assert!(InstanceRecord::from_value(json!(["qa"])).is_none());
    /// ```
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the `DBInstanceIdentifier` field.
    pub fn identifier(&self) -> Option<&str> {
        self.get("DBInstanceIdentifier").and_then(Value::as_str)
    }

    /// Returns a top-level field. JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Follows a path of object keys. Any missing or `null` hop yields `None`.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(first)?;
        for key in rest {
            current = current.as_object()?.get(*key).filter(|v| !v.is_null())?;
        }
        Some(current)
    }
}

impl From<Map<String, Value>> for InstanceRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Network address at which the instance accepts connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointInfo {
    /// DNS name of the instance
    pub address: String,
    /// Listener port
    pub port: u16,
}

impl EndpointInfo {
    /// Projects `Endpoint.Address` and `Endpoint.Port` out of a record.
    ///
    /// Both fields are required; there is no default port.
    pub fn from_record(record: &InstanceRecord) -> Option<Self> {
        let address = record.lookup(&["Endpoint", "Address"])?.as_str()?;
        let port = record.lookup(&["Endpoint", "Port"])?.as_u64()?;

        Some(Self {
            address: address.to_string(),
            port: u16::try_from(port).ok()?,
        })
    }
}

impl fmt::Display for EndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned supplier identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(String);

impl SupplierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifiers are opaque, but an empty one can never name a loaded supplier.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SupplierId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Supplier record as known to the remote store. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    #[serde(default)]
    pub name: String,
}

impl Supplier {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: SupplierId::new(id),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_decodes_without_name() {
        let supplier: Supplier = serde_json::from_str(r#"{"id":"S1"}"#).unwrap();
        assert_eq!(supplier.id, SupplierId::from("S1"));
        assert_eq!(supplier.name, "");
    }

    #[test]
    fn blank_identifier_is_empty() {
        assert!(SupplierId::new("  ").is_empty());
        assert!(!SupplierId::new("S1").is_empty());
    }
}

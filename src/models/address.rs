use serde::{Deserialize, Serialize};

/// How a datum is expected at the destination output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum DatumPolicy {
    None,
    /// Hex blake2b-256 hash of a datum supplied elsewhere.
    Hash(String),
    /// Hex CBOR of the datum itself.
    Inline(String),
}

impl DatumPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            DatumPolicy::None => "NONE",
            DatumPolicy::Hash(_) => "HASH",
            DatumPolicy::Inline(_) => "INLINE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationAddress {
    pub address: String,
    pub datum: DatumPolicy,
}

impl DestinationAddress {
    pub fn new(address: &str, datum: DatumPolicy) -> Self {
        Self {
            address: address.to_string(),
            datum,
        }
    }

    pub fn without_datum(address: &str) -> Self {
        Self::new(address, DatumPolicy::None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddresses {
    pub destination: DestinationAddress,
    #[serde(default)]
    pub alternate: Option<String>,
}

impl OrderAddresses {
    pub fn new(destination: DestinationAddress) -> Self {
        Self {
            destination,
            alternate: None,
        }
    }

    pub fn with_alternate(&self, alternate: &str) -> Self {
        Self {
            destination: self.destination.clone(),
            alternate: Some(alternate.to_string()),
        }
    }
}

//! Transaction metadata values attached next to orders.
use std::collections::BTreeMap;

use ciborium_ll::{Encoder, Header};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{Result, SdkError};

/// Longest text or byte string the ledger accepts inside metadata.
pub const MAX_METADATUM_CHUNK: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadatum {
    Int(BigInt),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

impl Metadatum {
    /// A text value, split into a list of strings when longer than the ledger allows.
    pub fn text(value: &str) -> Self {
        if value.len() <= MAX_METADATUM_CHUNK {
            return Metadatum::Text(value.to_string());
        }
        let mut chunks = Vec::new();
        let mut current = String::new();
        for c in value.chars() {
            if current.len() + c.len_utf8() > MAX_METADATUM_CHUNK {
                chunks.push(Metadatum::Text(std::mem::take(&mut current)));
            }
            current.push(c);
        }
        if !current.is_empty() {
            chunks.push(Metadatum::Text(current));
        }
        Metadatum::List(chunks)
    }

    /// Bytes split into `chunk`-sized pieces.
    pub fn chunked_bytes(bytes: &[u8], chunk: usize) -> Self {
        Metadatum::List(
            bytes
                .chunks(chunk.clamp(1, MAX_METADATUM_CHUNK))
                .map(|c| Metadatum::Bytes(c.to_vec()))
                .collect(),
        )
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = Encoder::from(&mut buf);
            encode(&mut encoder, self).map_err(|e| SdkError::Cbor(e.to_string()))?;
        }
        Ok(buf)
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Metadatum::Int(i) => match i.to_i64() {
                Some(n) => json!(n),
                None => json!(i.to_string()),
            },
            Metadatum::Bytes(b) => json!(format!("0x{}", hex::encode(b))),
            Metadatum::Text(t) => json!(t),
            Metadatum::List(items) => json!(items.iter().map(|i| i.to_json()).collect::<Vec<_>>()),
            Metadatum::Map(entries) => json!(entries
                .iter()
                .map(|(k, v)| json!({ "k": k.to_json(), "v": v.to_json() }))
                .collect::<Vec<_>>()),
        }
    }
}

fn encode(encoder: &mut Encoder<&mut Vec<u8>>, value: &Metadatum) -> std::io::Result<()> {
    match value {
        Metadatum::Int(i) => match (i.to_u64(), (-i - 1i32).to_u64()) {
            (Some(n), _) => encoder.push(Header::Positive(n)),
            (None, Some(n)) => encoder.push(Header::Negative(n)),
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("metadata integer {} does not fit 64 bits", i),
            )),
        },
        Metadatum::Bytes(b) => encoder.bytes(b, None),
        Metadatum::Text(t) => encoder.text(t, None),
        Metadatum::List(items) => {
            encoder.push(Header::Array(Some(items.len())))?;
            for item in items {
                encode(encoder, item)?;
            }
            Ok(())
        }
        Metadatum::Map(entries) => {
            encoder.push(Header::Map(Some(entries.len())))?;
            for (k, v) in entries {
                encode(encoder, k)?;
                encode(encoder, v)?;
            }
            Ok(())
        }
    }
}

/// Metadata entries keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMetadata(BTreeMap<u64, Metadatum>);

impl TransactionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: u64, value: Metadatum) {
        self.0.insert(label, value);
    }

    pub fn get(&self, label: u64) -> Option<&Metadatum> {
        self.0.get(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries of `other` win on label clashes.
    pub fn merge(&mut self, other: TransactionMetadata) {
        self.0.extend(other.0);
    }

    pub fn labels(&self) -> impl Iterator<Item = &u64> {
        self.0.keys()
    }

    /// JSON object keyed by label, with each value's CBOR in hex next to its JSON view.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (label, value) in &self.0 {
            out.insert(
                label.to_string(),
                serde_json::json!({
                    "json": value.to_json(),
                    "cbor": hex::encode(value.to_cbor()?),
                }),
            );
        }
        Ok(serde_json::Value::Object(out))
    }
}

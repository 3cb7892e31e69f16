//! Plutus data values and their canonical CBOR form.
//!
//! Encoding follows the layout Cardano tooling produces for datums:
//! constructors are CBOR tags (121..=127 for alternatives 0..=6, 1280..=1400 for 7..=127,
//! tag 102 with `[alternative, fields]` beyond that), non-empty lists are indefinite-length,
//! empty lists are `0x80`, byte strings longer than 64 bytes are chunked, and integers that
//! do not fit 64 bits use the bignum tags 2 and 3.
use ciborium::value::Value;
use ciborium_ll::{Encoder, Header};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};
use serde::{Serialize, Serializer};

use crate::error::{Result, SdkError};

const BYTES_CHUNK: usize = 64;
const TAG_BIG_POS: u64 = 2;
const TAG_BIG_NEG: u64 = 3;
const TAG_CONSTR_GENERAL: u64 = 102;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Constr { alternative: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(BigInt),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(alternative: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { alternative, fields }
    }

    /// `Constr 0 []`, the unit value.
    pub fn void() -> Self {
        Self::constr(0, vec![])
    }

    pub fn some(value: PlutusData) -> Self {
        Self::constr(0, vec![value])
    }

    pub fn none() -> Self {
        Self::constr(1, vec![])
    }

    pub fn option(value: Option<PlutusData>) -> Self {
        match value {
            Some(v) => Self::some(v),
            None => Self::none(),
        }
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes(value.into())
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        PlutusData::Integer(value.into())
    }

    pub fn uint(value: &BigUint) -> Self {
        PlutusData::Integer(BigInt::from(value.clone()))
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = Encoder::from(&mut buf);
            encode(&mut encoder, self).map_err(|e| SdkError::Cbor(e.to_string()))?;
        }
        Ok(buf)
    }

    pub fn to_cbor_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_cbor()?))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|e| SdkError::Cbor(format!("decode error: {}", e)))?;
        from_value(&value)
    }

    pub fn from_cbor_hex(cbor_hex: &str) -> Result<Self> {
        let bytes = hex::decode(cbor_hex)
            .map_err(|e| SdkError::Cbor(format!("datum is not hex: {}", e)))?;
        Self::from_cbor(&bytes)
    }

    /// Fields of a constructor, whatever its alternative.
    pub fn constr_fields(&self) -> Result<&[PlutusData]> {
        match self {
            PlutusData::Constr { fields, .. } => Ok(fields),
            other => Err(SdkError::Cbor(format!("expected constr, got {}", other.kind()))),
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        match self {
            PlutusData::Integer(i) => i
                .to_u64()
                .ok_or_else(|| SdkError::Cbor(format!("integer {} does not fit u64", i))),
            other => Err(SdkError::Cbor(format!("expected integer, got {}", other.kind()))),
        }
    }

    /// Bytes as a lowercase hex string.
    pub fn as_hex(&self) -> Result<String> {
        match self {
            PlutusData::Bytes(b) => Ok(hex::encode(b)),
            other => Err(SdkError::Cbor(format!("expected bytes, got {}", other.kind()))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PlutusData::Constr { .. } => "constr",
            PlutusData::Map(_) => "map",
            PlutusData::List(_) => "list",
            PlutusData::Integer(_) => "integer",
            PlutusData::Bytes(_) => "bytes",
        }
    }

    /// Cardano's detailed JSON schema for datums.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            PlutusData::Constr { alternative, fields } => json!({
                "constructor": alternative,
                "fields": fields.iter().map(|f| f.to_json()).collect::<Vec<_>>(),
            }),
            PlutusData::Map(entries) => json!({
                "map": entries
                    .iter()
                    .map(|(k, v)| json!({ "k": k.to_json(), "v": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
            PlutusData::List(items) => json!({
                "list": items.iter().map(|i| i.to_json()).collect::<Vec<_>>(),
            }),
            PlutusData::Integer(i) => match (i.to_i64(), i.to_u64()) {
                (Some(n), _) => json!({ "int": n }),
                (None, Some(n)) => json!({ "int": n }),
                _ => json!({ "int": i.to_string() }),
            },
            PlutusData::Bytes(b) => json!({ "bytes": hex::encode(b) }),
        }
    }
}

impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// blake2b-256 of `bytes`, hex encoded.
pub fn blake2b_256_hex(bytes: &[u8]) -> String {
    let hash = blake2b_simd::Params::new().hash_length(32).hash(bytes);
    hex::encode(hash.as_bytes())
}

fn encode(encoder: &mut Encoder<&mut Vec<u8>>, data: &PlutusData) -> std::io::Result<()> {
    match data {
        PlutusData::Constr { alternative, fields } => {
            match *alternative {
                alt @ 0..=6 => encoder.push(Header::Tag(121 + alt))?,
                alt @ 7..=127 => encoder.push(Header::Tag(1280 + alt - 7))?,
                alt => {
                    encoder.push(Header::Tag(TAG_CONSTR_GENERAL))?;
                    encoder.push(Header::Array(Some(2)))?;
                    encoder.push(Header::Positive(alt))?;
                }
            }
            encode_list(encoder, fields)
        }
        PlutusData::List(items) => encode_list(encoder, items),
        PlutusData::Map(entries) => {
            encoder.push(Header::Map(Some(entries.len())))?;
            for (k, v) in entries {
                encode(encoder, k)?;
                encode(encoder, v)?;
            }
            Ok(())
        }
        PlutusData::Integer(i) => encode_integer(encoder, i),
        PlutusData::Bytes(b) => encoder.bytes(b, Some(BYTES_CHUNK)),
    }
}

fn encode_list(encoder: &mut Encoder<&mut Vec<u8>>, items: &[PlutusData]) -> std::io::Result<()> {
    if items.is_empty() {
        return encoder.push(Header::Array(Some(0)));
    }
    encoder.push(Header::Array(None))?;
    for item in items {
        encode(encoder, item)?;
    }
    encoder.push(Header::Break)
}

fn encode_integer(encoder: &mut Encoder<&mut Vec<u8>>, value: &BigInt) -> std::io::Result<()> {
    if value.sign() != Sign::Minus {
        if let Some(n) = value.to_u64() {
            return encoder.push(Header::Positive(n));
        }
        encoder.push(Header::Tag(TAG_BIG_POS))?;
        return encoder.bytes(&value.magnitude().to_bytes_be(), Some(BYTES_CHUNK));
    }
    // CBOR stores a negative n as -1 - n.
    let offset: BigUint = value.magnitude() - 1u32;
    if let Some(n) = offset.to_u64() {
        return encoder.push(Header::Negative(n));
    }
    encoder.push(Header::Tag(TAG_BIG_NEG))?;
    encoder.bytes(&offset.to_bytes_be(), Some(BYTES_CHUNK))
}

fn from_value(v: &Value) -> Result<PlutusData> {
    match v {
        Value::Tag(tag, inner) => match *tag {
            121..=127 => Ok(PlutusData::constr(tag - 121, list_items(inner)?)),
            1280..=1400 => Ok(PlutusData::constr(tag - 1280 + 7, list_items(inner)?)),
            TAG_CONSTR_GENERAL => match inner.as_ref() {
                Value::Array(pair) if pair.len() == 2 => {
                    let alternative = from_value(&pair[0])?.as_u64()?;
                    Ok(PlutusData::constr(alternative, list_items(&pair[1])?))
                }
                _ => Err(SdkError::Cbor("tag 102 must wrap [alternative, fields]".to_string())),
            },
            TAG_BIG_POS | TAG_BIG_NEG => match inner.as_ref() {
                Value::Bytes(b) => {
                    let magnitude = BigInt::from(BigUint::from_bytes_be(b));
                    if *tag == TAG_BIG_POS {
                        Ok(PlutusData::Integer(magnitude))
                    } else {
                        Ok(PlutusData::Integer(-magnitude - 1))
                    }
                }
                _ => Err(SdkError::Cbor("bignum tag must wrap bytes".to_string())),
            },
            other => Err(SdkError::Cbor(format!("unexpected CBOR tag {}", other))),
        },
        Value::Array(items) => Ok(PlutusData::List(
            items.iter().map(from_value).collect::<Result<Vec<_>>>()?,
        )),
        Value::Map(entries) => Ok(PlutusData::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((from_value(k)?, from_value(v)?)))
                .collect::<Result<Vec<_>>>()?,
        )),
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            Ok(PlutusData::Integer(BigInt::from(n)))
        }
        Value::Bytes(b) => Ok(PlutusData::Bytes(b.clone())),
        other => Err(SdkError::Cbor(format!("not plutus data: {:?}", other))),
    }
}

fn list_items(v: &Value) -> Result<Vec<PlutusData>> {
    match v {
        Value::Array(items) => items.iter().map(from_value).collect(),
        _ => Err(SdkError::Cbor("expected array inside constr tag".to_string())),
    }
}

impl From<u64> for PlutusData {
    fn from(n: u64) -> Self {
        PlutusData::Integer(BigInt::from(n))
    }
}

impl From<Vec<u8>> for PlutusData {
    fn from(b: Vec<u8>) -> Self {
        PlutusData::Bytes(b)
    }
}

impl Default for PlutusData {
    fn default() -> Self {
        PlutusData::Integer(BigInt::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hex_of(data: &PlutusData) -> String {
        data.to_cbor_hex().unwrap()
    }

    #[test]
    fn test_constructor_tags() {
        assert_eq!(hex_of(&PlutusData::void()), "d87980");
        assert_eq!(hex_of(&PlutusData::none()), "d87a80");
        assert_eq!(hex_of(&PlutusData::constr(6, vec![])), "d87f80");
        assert_eq!(hex_of(&PlutusData::constr(7, vec![])), "d9050080");
        assert_eq!(hex_of(&PlutusData::constr(127, vec![])), "d9057880");
        assert_eq!(hex_of(&PlutusData::constr(128, vec![])), "d866821880 80".replace(' ', ""));
    }

    #[test]
    fn test_non_empty_fields_are_indefinite() {
        let data = PlutusData::some(PlutusData::int(100u64));
        assert_eq!(hex_of(&data), "d8799f1864ff");
        let list = PlutusData::List(vec![PlutusData::bytes(vec![]), 1u64.into()]);
        assert_eq!(hex_of(&list), "9f4001ff");
    }

    #[test]
    fn test_integers() {
        assert_eq!(hex_of(&PlutusData::int(1_000_000u64)), "1a000f4240");
        assert_eq!(hex_of(&PlutusData::int(-1i64)), "20");
        assert_eq!(hex_of(&PlutusData::int(-500i64)), "3901f3");
        let big: BigInt = BigInt::from(u64::MAX) + 1;
        assert_eq!(hex_of(&PlutusData::Integer(big.clone())), "c249010000000000000000");
        assert_eq!(hex_of(&PlutusData::Integer(-big - 1)), "c349010000000000000000");
    }

    #[test]
    fn test_long_bytes_are_chunked() {
        let data = PlutusData::bytes(vec![0xab; 65]);
        let encoded = hex_of(&data);
        assert!(encoded.starts_with("5f5840"));
        assert!(encoded.ends_with("41abff"));
        assert_eq!(hex_of(&PlutusData::bytes(vec![0xab; 64])).len(), 2 * (2 + 64));
    }

    #[test]
    fn test_decode_matches_encode() {
        let data = PlutusData::constr(
            0,
            vec![
                PlutusData::some(PlutusData::bytes(vec![1, 2, 3])),
                PlutusData::List(vec![PlutusData::int(-7i64), PlutusData::bytes(vec![0xcd; 70])]),
                PlutusData::Map(vec![(1u64.into(), PlutusData::void())]),
                PlutusData::constr(9, vec![PlutusData::none()]),
                PlutusData::Integer(BigInt::from(u64::MAX) * 4),
            ],
        );
        let decoded = PlutusData::from_cbor(&data.to_cbor().unwrap()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_decode_rejects_non_plutus_values() {
        assert!(PlutusData::from_cbor_hex("f5").is_err());
        assert!(PlutusData::from_cbor_hex("zz").is_err());
        assert!(PlutusData::from_cbor_hex("d8799f").is_err());
    }

    #[test]
    fn test_blake2b_256() {
        assert_eq!(
            blake2b_256_hex(&hex::decode("d87980").unwrap()),
            "923918e403bf43c34b4ef6b48eb2ee04babed17320d8d1b9ff9ad086e86f44ec"
        );
    }

    #[test]
    fn test_json_schema() {
        let data = PlutusData::constr(1, vec![PlutusData::bytes(vec![0xab]), 5u64.into()]);
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            serde_json::json!({"constructor": 1, "fields": [{"bytes": "ab"}, {"int": 5}]})
        );
    }
}

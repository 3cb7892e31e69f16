//! Shelley address parsing and resolution of order addresses into credentials.
//!
//! Header byte layout: the high nibble is the address type, the low nibble the network id.
//!
//! | type | payment | stake   |
//! |------|---------|---------|
//! | 0    | key     | key     |
//! | 1    | script  | key     |
//! | 2    | key     | script  |
//! | 3    | script  | script  |
//! | 4/5  | key/script | pointer |
//! | 6/7  | key/script | none    |
use std::fmt;

use crate::datum::cbor::PlutusData;
use crate::error::{Result, SdkError};
use crate::models::{ContractVersion, DatumPolicy, OrderAddresses};
use crate::params::Network;

pub const CREDENTIAL_LENGTH: usize = 28;
pub const DATUM_HASH_LENGTH: usize = 32;

/// A payment or staking credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    KeyHash(Vec<u8>),
    ScriptHash(Vec<u8>),
}

impl Credential {
    pub fn hash(&self) -> &[u8] {
        match self {
            Credential::KeyHash(h) | Credential::ScriptHash(h) => h,
        }
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::ScriptHash(_))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::KeyHash(h) => write!(f, "key:{}", hex::encode(h)),
            Credential::ScriptHash(h) => write!(f, "script:{}", hex::encode(h)),
        }
    }
}

/// Location of a stake registration certificate, carried by pointer addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakePointer {
    pub slot: u64,
    pub tx_index: u64,
    pub cert_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub bech32: String,
    pub network_id: u8,
    pub payment: Credential,
    /// `None` for enterprise and pointer addresses.
    pub stake: Option<Credential>,
    pub pointer: Option<StakePointer>,
}

impl ParsedAddress {
    /// Staking credential when present, payment credential otherwise.
    pub fn stake_or_payment(&self) -> &Credential {
        self.stake.as_ref().unwrap_or(&self.payment)
    }
}

fn invalid(address: &str, reason: impl Into<String>) -> SdkError {
    SdkError::InvalidAddress {
        address: address.to_string(),
        reason: reason.into(),
    }
}

/// One variable-length natural: 7 bits per byte, high bit set on every byte but the last.
fn read_varint(bytes: &[u8]) -> Option<(u64, &[u8])> {
    let mut value: u64 = 0;
    for (i, b) in bytes.iter().enumerate() {
        value = value.checked_mul(128)? | u64::from(b & 0x7f);
        if b & 0x80 == 0 {
            return Some((value, &bytes[i + 1..]));
        }
    }
    None
}

/// Exactly three varints and nothing after them.
fn read_pointer(bytes: &[u8]) -> Option<StakePointer> {
    let (slot, rest) = read_varint(bytes)?;
    let (tx_index, rest) = read_varint(rest)?;
    let (cert_index, rest) = read_varint(rest)?;
    rest.is_empty().then_some(StakePointer {
        slot,
        tx_index,
        cert_index,
    })
}

/// Decode a bech32 payment address and check it belongs to `network`.
pub fn parse_address(address: &str, network: Network) -> Result<ParsedAddress> {
    let (hrp, bytes) = bech32::decode(address).map_err(|e| invalid(address, e.to_string()))?;
    let hrp = hrp.to_string().to_lowercase();
    if hrp != network.address_hrp() {
        return Err(invalid(
            address,
            format!("prefix '{}' does not match network prefix '{}'", hrp, network.address_hrp()),
        ));
    }
    let header = *bytes.first().ok_or_else(|| invalid(address, "empty payload"))?;
    let network_id = header & 0x0f;
    if network_id != network.network_id() {
        return Err(invalid(
            address,
            format!("network id {} does not match {:?}", network_id, network),
        ));
    }

    let kind = header >> 4;
    let body = &bytes[1..];
    let credential = |script: bool, raw: &[u8]| {
        if script {
            Credential::ScriptHash(raw.to_vec())
        } else {
            Credential::KeyHash(raw.to_vec())
        }
    };
    let (expected_len, exact) = match kind {
        0..=3 => (2 * CREDENTIAL_LENGTH, true),
        4 | 5 => (CREDENTIAL_LENGTH, false),
        6 | 7 => (CREDENTIAL_LENGTH, true),
        14 | 15 => return Err(invalid(address, "reward addresses cannot receive orders")),
        other => return Err(invalid(address, format!("unsupported address type {}", other))),
    };
    if body.len() < expected_len || (exact && body.len() != expected_len) {
        return Err(invalid(
            address,
            format!("payload of {} bytes for address type {}", body.len(), kind),
        ));
    }

    let payment = credential(kind & 1 == 1, &body[..CREDENTIAL_LENGTH]);
    let stake = match kind {
        0..=3 => Some(credential(kind & 2 == 2, &body[CREDENTIAL_LENGTH..])),
        _ => None,
    };
    let pointer = match kind {
        4 | 5 => Some(
            read_pointer(&body[CREDENTIAL_LENGTH..])
                .ok_or_else(|| invalid(address, "malformed stake pointer"))?,
        ),
        _ => None,
    };
    Ok(ParsedAddress {
        bech32: address.to_string(),
        network_id,
        payment,
        stake,
        pointer,
    })
}

/// Encode a base or enterprise address from credentials.
pub fn build_address(network: Network, payment: &Credential, stake: Option<&Credential>) -> Result<String> {
    for c in std::iter::once(payment).chain(stake) {
        if c.hash().len() != CREDENTIAL_LENGTH {
            return Err(invalid(
                &c.to_string(),
                format!("credential must be {} bytes", CREDENTIAL_LENGTH),
            ));
        }
    }
    let kind: u8 = match (payment.is_script(), stake.map(Credential::is_script)) {
        (false, Some(false)) => 0,
        (true, Some(false)) => 1,
        (false, Some(true)) => 2,
        (true, Some(true)) => 3,
        (false, None) => 6,
        (true, None) => 7,
    };
    let mut payload = Vec::with_capacity(1 + 2 * CREDENTIAL_LENGTH);
    payload.push((kind << 4) | network.network_id());
    payload.extend_from_slice(payment.hash());
    if let Some(stake) = stake {
        payload.extend_from_slice(stake.hash());
    }
    let hrp = bech32::Hrp::parse(network.address_hrp())
        .map_err(|e| invalid(network.address_hrp(), format!("bech32 HRP error: {}", e)))?;
    bech32::encode::<bech32::Bech32>(hrp, &payload)
        .map_err(|e| invalid(&hex::encode(&payload), format!("bech32 encode error: {}", e)))
}

/// Datum expected at a destination, decoded from its [`DatumPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDatum {
    None,
    Hash(Vec<u8>),
    Inline(PlutusData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub address: ParsedAddress,
    pub datum: ResolvedDatum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddresses {
    pub destination: ResolvedDestination,
    pub alternate: Option<ParsedAddress>,
}

impl ResolvedAddresses {
    /// Credential carried for the alternate address: its staking part, else its payment part.
    pub fn alternate_credential(&self) -> Option<&Credential> {
        self.alternate.as_ref().map(ParsedAddress::stake_or_payment)
    }
}

fn resolve_datum(policy: &DatumPolicy, version: ContractVersion) -> Result<ResolvedDatum> {
    match policy {
        DatumPolicy::None => Ok(ResolvedDatum::None),
        DatumPolicy::Hash(value) => {
            let hash = hex::decode(value)
                .map_err(|e| SdkError::InvalidDatum(format!("datum hash {} is not hex: {}", value, e)))?;
            if hash.len() != DATUM_HASH_LENGTH {
                return Err(SdkError::InvalidDatum(format!(
                    "datum hash must be {} bytes, got {}",
                    DATUM_HASH_LENGTH,
                    hash.len()
                )));
            }
            Ok(ResolvedDatum::Hash(hash))
        }
        DatumPolicy::Inline(_) if version == ContractVersion::V1 => {
            Err(SdkError::UnsupportedDatumPolicy {
                version,
                policy: policy.name().to_string(),
            })
        }
        DatumPolicy::Inline(value) => Ok(ResolvedDatum::Inline(PlutusData::from_cbor_hex(value)
            .map_err(|e| SdkError::InvalidDatum(format!("inline datum: {}", e)))?)),
    }
}

/// Resolve the destination and alternate addresses of an order for `version` on `network`.
pub fn resolve(
    addresses: &OrderAddresses,
    network: Network,
    version: ContractVersion,
) -> Result<ResolvedAddresses> {
    let address = parse_address(&addresses.destination.address, network)?;
    let alternate = addresses
        .alternate
        .as_deref()
        .map(|a| parse_address(a, network))
        .transpose()?;
    let destination = ResolvedDestination {
        address,
        datum: resolve_datum(&addresses.destination.datum, version)?,
    };
    Ok(ResolvedAddresses {
        destination,
        alternate,
    })
}

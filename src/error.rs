use thiserror::Error;

use crate::models::ContractVersion;

/// Message carried by every pool ident validation failure, for any contract version.
/// Exposed so callers can match on it without depending on [`SdkError`].
pub const INVALID_POOL_IDENT: &str =
    "You supplied a pool ident of an invalid length! The will prevent the scooper from processing this order.";

/// Message carried by an inline datum request against a V1 destination.
pub const V1_INLINE_DATUM_UNSUPPORTED: &str =
    "Inline datum types are not supported in V1 contracts! Convert this to a hash.";

/// Message carried by a malformed referral fee payment.
pub const INVALID_FEE_AMOUNT: &str =
    "The referral fee payment must be a non-negative integer amount of a known asset.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("{}", INVALID_POOL_IDENT)]
    InvalidPoolIdent { version: ContractVersion, ident: String },

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{}", unsupported_policy_message(.version, .policy))]
    UnsupportedDatumPolicy { version: ContractVersion, policy: String },

    #[error("{}", INVALID_FEE_AMOUNT)]
    InvalidFeeAmount { detail: String },

    #[error("invalid datum value: {0}")]
    InvalidDatum(String),

    #[error("invalid asset id {asset_id}: {reason}")]
    InvalidAsset { asset_id: String, reason: String },

    #[error("asset {asset_id} is not part of pool {ident}")]
    UnknownPoolAsset { asset_id: String, ident: String },

    #[error("invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),

    #[error("CBOR error: {0}")]
    Cbor(String),

    #[error("invalid order configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    #[error("query provider error: {0}")]
    Provider(String),
}

fn unsupported_policy_message(version: &ContractVersion, policy: &str) -> String {
    match version {
        ContractVersion::V1 => V1_INLINE_DATUM_UNSUPPORTED.to_string(),
        ContractVersion::V3 => format!("datum policy {} is not supported by V3 contracts", policy),
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;

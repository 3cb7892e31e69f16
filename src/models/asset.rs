use std::cmp::Ordering;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

/// Identifier used for ADA in asset metadata.
pub const ADA_ASSET_ID: &str = "ada.lovelace";
pub const ADA_DECIMALS: u8 = 6;

/// Hex length of a minting policy id.
pub const POLICY_ID_LENGTH: usize = 56;
/// Longest asset name, in hex characters.
pub const MAX_ASSET_NAME_LENGTH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub policy_id: String,
    pub name_hex: String,
    pub decimals: u8,
}

impl Asset {
    pub fn new(policy_id: &str, name_hex: &str, decimals: u8) -> Self {
        Self {
            policy_id: policy_id.to_string(),
            name_hex: name_hex.to_string(),
            decimals,
        }
    }

    /// Splits `policy[.]name` into its parts. The id must be ASCII hex: a 56 character policy
    /// followed by an even-length name of at most 32 bytes.
    pub fn from_identifier(id: &str, decimals: u8) -> Result<Asset> {
        let joined = id.replace('.', "");
        let invalid = |reason: &str| SdkError::InvalidAsset {
            asset_id: id.to_string(),
            reason: reason.to_string(),
        };
        if !joined.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("not hex"));
        }
        let (policy, name) = match (joined.get(..POLICY_ID_LENGTH), joined.get(POLICY_ID_LENGTH..)) {
            (Some(policy), Some(name)) => (policy, name),
            _ => return Err(invalid("policy id is shorter than 56 characters")),
        };
        if name.len() % 2 != 0 || name.len() > MAX_ASSET_NAME_LENGTH {
            return Err(invalid("asset name must be an even number of hex characters, at most 64"));
        }
        Ok(Asset::new(policy, name, decimals))
    }

    pub fn identifier(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.policy_id, delimiter, self.name_hex)
    }

    pub fn asset_name(&self) -> String {
        String::from_utf8_lossy(&hex::decode(&self.name_hex).unwrap_or_default()).to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Token {
    Lovelace,
    Asset(Asset),
}

impl Token {
    pub fn is_lovelace(&self) -> bool {
        matches!(self, Token::Lovelace)
    }

    /// On-chain `(policy, name)` byte pair. ADA is the empty pair.
    pub fn asset_class(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        match self {
            Token::Lovelace => Ok((Vec::new(), Vec::new())),
            Token::Asset(a) => {
                let policy = hex::decode(&a.policy_id).map_err(|e| {
                    SdkError::InvalidDatum(format!("policy id {} is not hex: {}", a.policy_id, e))
                })?;
                let name = hex::decode(&a.name_hex).map_err(|e| {
                    SdkError::InvalidDatum(format!("asset name {} is not hex: {}", a.name_hex, e))
                })?;
                Ok((policy, name))
            }
        }
    }
}

/// Only `""`, `lovelace` and `ada.lovelace` name ADA; anything else must be a well-formed
/// native asset id.
pub fn from_identifier(id: &str, decimals: u8) -> Result<Token> {
    match id {
        "" | "lovelace" | ADA_ASSET_ID => Ok(Token::Lovelace),
        _ => Asset::from_identifier(id, decimals).map(Token::Asset),
    }
}

pub fn token_name(token: &Token) -> String {
    match token {
        Token::Lovelace => "ADA".to_string(),
        Token::Asset(a) => a.asset_name(),
    }
}

pub fn token_identifier(token: &Token) -> String {
    match token {
        Token::Lovelace => "lovelace".to_string(),
        Token::Asset(a) => a.identifier(""),
    }
}

/// Identity of an asset as callers describe it: `policy.name` (or `ada.lovelace`) plus the
/// number of decimals used for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub asset_id: String,
    pub decimals: u8,
}

impl AssetMetadata {
    pub fn new(asset_id: &str, decimals: u8) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            decimals,
        }
    }

    pub fn ada() -> Self {
        Self::new(ADA_ASSET_ID, ADA_DECIMALS)
    }

    pub fn is_ada(&self) -> bool {
        self.token().map(|t| t.is_lovelace()).unwrap_or(false)
    }

    pub fn token(&self) -> Result<Token> {
        from_identifier(&self.asset_id, self.decimals)
    }

    /// Identifier without the policy/name delimiter, as it appears in a UTxO value.
    pub fn unit(&self) -> Result<String> {
        Ok(token_identifier(&self.token()?))
    }

    /// Whether two metadata records name the same asset, ignoring delimiters and decimals.
    /// A malformed id matches nothing, itself included.
    pub fn same_asset(&self, other: &AssetMetadata) -> bool {
        match (self.asset_class(), other.asset_class()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// On-chain `(policy, name)` bytes of this asset.
    pub fn asset_class(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        self.token()?.asset_class()
    }

    /// Ordering used by pools for their two assets: ADA first, then by policy then name bytes.
    pub fn canonical_cmp(&self, other: &AssetMetadata) -> Result<Ordering> {
        Ok(self.asset_class()?.cmp(&other.asset_class()?))
    }

    /// Asset name for display; a malformed id is shown as given.
    pub fn display_name(&self) -> String {
        match self.token() {
            Ok(token) => token_name(&token),
            Err(_) => self.asset_id.clone(),
        }
    }
}

/// An integer quantity of an asset. Arithmetic returns new values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetAmount {
    #[serde(with = "crate::utils::quantity")]
    pub amount: BigUint,
    pub metadata: AssetMetadata,
}

impl AssetAmount {
    pub fn new(amount: impl Into<BigUint>, metadata: AssetMetadata) -> Self {
        Self {
            amount: amount.into(),
            metadata,
        }
    }

    pub fn lovelace(amount: impl Into<BigUint>) -> Self {
        Self::new(amount, AssetMetadata::ada())
    }

    pub fn zero(metadata: AssetMetadata) -> Self {
        Self::new(BigUint::zero(), metadata)
    }

    pub fn with_amount(&self, amount: impl Into<BigUint>) -> Self {
        Self::new(amount, self.metadata.clone())
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Sum of two amounts of the same asset; `None` when the assets differ.
    pub fn checked_add(&self, other: &AssetAmount) -> Option<AssetAmount> {
        if !self.metadata.same_asset(&other.metadata) {
            return None;
        }
        Some(self.with_amount(&self.amount + &other.amount))
    }

    /// Quantity in display units, e.g. `1500000` lovelace is `"1.5"`.
    pub fn display_value(&self) -> String {
        let digits = self.amount.to_string();
        let decimals = self.metadata.decimals as usize;
        if decimals == 0 {
            return digits;
        }
        let padded = format!("{:0>width$}", digits, width = decimals + 1);
        let (whole, frac) = padded.split_at(padded.len() - decimals);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, frac)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINDY: &str = "fa3eff2047fdf9293c5feef4dc85ce58097ea1c6da4845a351535183.74494e4459";

    #[test]
    fn test_ada_identifiers_resolve_to_lovelace() {
        assert!(AssetMetadata::ada().is_ada());
        assert!(AssetMetadata::new("lovelace", 6).is_ada());
        assert!(!AssetMetadata::new(TINDY, 0).is_ada());
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        let short = AssetMetadata::new("deadbeef.cafe", 0);
        let not_hex = AssetMetadata::new(&format!("{}.zz", "g".repeat(56)), 0);
        let odd_name = AssetMetadata::new(&format!("{}.abc", "a".repeat(56)), 0);
        let non_ascii = AssetMetadata::new(&"€".repeat(19), 0);
        for bad in [&short, &not_hex, &odd_name, &non_ascii] {
            assert!(matches!(bad.token(), Err(SdkError::InvalidAsset { .. })), "{}", bad.asset_id);
            assert!(!bad.is_ada());
            assert!(!bad.same_asset(&AssetMetadata::ada()));
            assert!(!bad.same_asset(bad));
            assert!(bad.canonical_cmp(&AssetMetadata::ada()).is_err());
        }
        assert_eq!(non_ascii.display_name(), non_ascii.asset_id);
    }

    #[test]
    fn test_asset_class_bytes() {
        let (policy, name) = AssetMetadata::new(TINDY, 0).asset_class().unwrap();
        assert_eq!(hex::encode(policy), "fa3eff2047fdf9293c5feef4dc85ce58097ea1c6da4845a351535183");
        assert_eq!(name, b"tINDY".to_vec());
        let (policy, name) = AssetMetadata::ada().asset_class().unwrap();
        assert!(policy.is_empty() && name.is_empty());
    }

    #[test]
    fn test_canonical_order_puts_ada_first() {
        let usdc = AssetMetadata::new(
            "99b071ce8580d6a3a11b4902145adb8bfd0d2a03935af8cf66403e15.55534443",
            6,
        );
        assert_eq!(AssetMetadata::ada().canonical_cmp(&usdc).unwrap(), Ordering::Less);
        assert_eq!(usdc.canonical_cmp(&AssetMetadata::new(TINDY, 0)).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_same_asset_ignores_delimiter() {
        let dotted = AssetMetadata::new(TINDY, 0);
        let joined = AssetMetadata::new(&TINDY.replace('.', ""), 4);
        assert!(dotted.same_asset(&joined));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(AssetAmount::lovelace(1_500_000u64).display_value(), "1.5");
        assert_eq!(AssetAmount::lovelace(2_000_000u64).display_value(), "2");
        assert_eq!(AssetAmount::lovelace(15u64).display_value(), "0.000015");
        assert_eq!(AssetAmount::new(42u64, AssetMetadata::new(TINDY, 0)).display_value(), "42");
    }

    #[test]
    fn test_checked_add_rejects_mixed_assets() {
        let ada = AssetAmount::lovelace(1u64);
        let tindy = AssetAmount::new(1u64, AssetMetadata::new(TINDY, 0));
        assert!(ada.checked_add(&tindy).is_none());
        assert_eq!(ada.checked_add(&ada).unwrap().amount, BigUint::from(2u64));
    }
}

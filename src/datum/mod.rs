//! Order datum codecs, one per contract version.
use num_bigint::BigUint;
use serde::Serialize;

use crate::address::{ParsedAddress, ResolvedAddresses};
use crate::error::{Result, SdkError};
use crate::models::{AssetAmount, AssetMetadata, ContractVersion, PoolCoin};

pub mod cbor;
pub mod v1;
pub mod v3;

use cbor::{blake2b_256_hex, PlutusData};
pub use v1::V1DatumBuilder;
pub use v3::V3DatumBuilder;

/// A serialized datum with its hash and the value it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatumResult {
    /// Hex CBOR, attached inline or supplied as a witness.
    pub inline: String,
    /// Hex blake2b-256 of the CBOR bytes.
    pub hash: String,
    pub schema: PlutusData,
}

impl DatumResult {
    pub fn from_schema(schema: PlutusData) -> Result<Self> {
        let bytes = schema.to_cbor()?;
        Ok(Self {
            inline: hex::encode(&bytes),
            hash: blake2b_256_hex(&bytes),
            schema,
        })
    }

    pub fn inline_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.inline).map_err(|e| SdkError::Cbor(e.to_string()))
    }

    pub fn hash_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.hash).map_err(|e| SdkError::Cbor(e.to_string()))
    }
}

/// Inputs shared by every order kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderArgs<P> {
    pub ident: String,
    pub addresses: ResolvedAddresses,
    /// Address whose key may cancel the order. Only V3 records it; defaults to the destination.
    pub owner: Option<ParsedAddress>,
    pub scooper_fee: BigUint,
    pub payload: P,
}

impl<P> OrderArgs<P> {
    pub fn owner(&self) -> &ParsedAddress {
        self.owner.as_ref().unwrap_or(&self.addresses.destination.address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPayload {
    /// The pool's `(assetA, assetB)`, used to find the side being supplied.
    pub pool_assets: (AssetMetadata, AssetMetadata),
    pub supplied: AssetAmount,
    pub min_receivable: Option<AssetAmount>,
}

impl SwapPayload {
    pub fn supplied_coin(&self, ident: &str) -> Result<PoolCoin> {
        let (a, b) = &self.pool_assets;
        if self.supplied.metadata.same_asset(a) {
            Ok(PoolCoin::A)
        } else if self.supplied.metadata.same_asset(b) {
            Ok(PoolCoin::B)
        } else {
            Err(SdkError::UnknownPoolAsset {
                asset_id: self.supplied.metadata.asset_id.clone(),
                ident: ident.to_string(),
            })
        }
    }

    pub fn received_asset(&self, ident: &str) -> Result<&AssetMetadata> {
        Ok(match self.supplied_coin(ident)? {
            PoolCoin::A => &self.pool_assets.1,
            PoolCoin::B => &self.pool_assets.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPayload {
    /// Either order; codecs sort them.
    pub assets: (AssetAmount, AssetAmount),
}

impl DepositPayload {
    /// The two amounts in pool order: ADA first, then by policy and name bytes.
    pub fn canonical(&self) -> Result<(&AssetAmount, &AssetAmount)> {
        let (x, y) = (&self.assets.0, &self.assets.1);
        if x.metadata.same_asset(&y.metadata) {
            return Err(SdkError::InvalidDatum(format!(
                "deposit supplies {} twice",
                x.metadata.asset_id
            )));
        }
        match x.metadata.canonical_cmp(&y.metadata)? {
            std::cmp::Ordering::Greater => Ok((y, x)),
            _ => Ok((x, y)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawPayload {
    pub lp: AssetAmount,
}

pub type SwapArgs = OrderArgs<SwapPayload>;
pub type DepositArgs = OrderArgs<DepositPayload>;
pub type WithdrawArgs = OrderArgs<WithdrawPayload>;

/// Checks an ident against `version`'s bound and returns its bytes.
pub fn validate_pool_ident(ident: &str, version: ContractVersion) -> Result<Vec<u8>> {
    let fail = || SdkError::InvalidPoolIdent {
        version,
        ident: ident.to_string(),
    };
    if ident.len() > version.max_pool_ident_length() {
        return Err(fail());
    }
    hex::decode(ident).map_err(|_| fail())
}

/// Datum operations every contract version provides.
pub trait DatumBuilder {
    fn version(&self) -> ContractVersion;

    fn build_swap_datum(&self, args: &SwapArgs) -> Result<DatumResult>;

    fn build_deposit_datum(&self, args: &DepositArgs) -> Result<DatumResult>;

    fn build_withdraw_datum(&self, args: &WithdrawArgs) -> Result<DatumResult>;

    /// The version's encoding of destination, alternate and destination datum.
    fn build_order_addresses_datum(&self, addresses: &ResolvedAddresses) -> Result<DatumResult>;
}

/// Codec selected by contract version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatumCodec {
    V1(V1DatumBuilder),
    V3(V3DatumBuilder),
}

impl DatumCodec {
    pub fn for_version(version: ContractVersion) -> Self {
        match version {
            ContractVersion::V1 => DatumCodec::V1(V1DatumBuilder),
            ContractVersion::V3 => DatumCodec::V3(V3DatumBuilder),
        }
    }

    fn inner(&self) -> &dyn DatumBuilder {
        match self {
            DatumCodec::V1(b) => b,
            DatumCodec::V3(b) => b,
        }
    }

    fn logged(&self, kind: &str, result: Result<DatumResult>) -> Result<DatumResult> {
        if let Ok(datum) = &result {
            log::debug!("built {} {} datum {}", self.version(), kind, datum.hash);
        }
        result
    }
}

impl DatumBuilder for DatumCodec {
    fn version(&self) -> ContractVersion {
        self.inner().version()
    }

    fn build_swap_datum(&self, args: &SwapArgs) -> Result<DatumResult> {
        self.logged("swap", self.inner().build_swap_datum(args))
    }

    fn build_deposit_datum(&self, args: &DepositArgs) -> Result<DatumResult> {
        self.logged("deposit", self.inner().build_deposit_datum(args))
    }

    fn build_withdraw_datum(&self, args: &WithdrawArgs) -> Result<DatumResult> {
        self.logged("withdraw", self.inner().build_withdraw_datum(args))
    }

    fn build_order_addresses_datum(&self, addresses: &ResolvedAddresses) -> Result<DatumResult> {
        self.logged("addresses", self.inner().build_order_addresses_datum(addresses))
    }
}

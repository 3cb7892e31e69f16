//! Pool and protocol data for order building.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use num_bigint::BigUint;

use crate::datum::cbor::PlutusData;
use crate::error::SdkError;
use crate::kupo::KupoApi;
use crate::models::{AssetMetadata, ContractVersion, Fraction, PoolData, PoolLiquidity, Utxo};
use crate::params::{Network, ProtocolParameters};

pub const MAINNET_V1_POOL_POLICY: &str = "0029cb7c88c7567b63d1a512c0ed626aa169688ec980730c0473b913";
pub const MAINNET_V3_POOL_POLICY: &str = "e0302560ced2fdcbfcb2602697df970cd0d6a38f94b32703f51c312b";
pub const PREVIEW_V1_POOL_POLICY: &str = "4086577ed57c514f8e29b78f42ef4f379363355a3b65b9a032ee30c9";
pub const PREVIEW_V3_POOL_POLICY: &str = "633a136877ed6ad0ab33e69a22611319673474c8bd0a79a4c76d9289";

/// Asset name prefixes under the pool policy: `(pool NFT, LP token)`.
fn name_prefixes(version: ContractVersion) -> (&'static str, &'static str) {
    match version {
        ContractVersion::V1 => ("7020", "6c7020"),
        ContractVersion::V3 => ("000de140", "0014df10"),
    }
}

#[async_trait]
pub trait QueryProvider: Send + Sync {
    async fn find_pool_data(&self, ident: &str, version: ContractVersion) -> Result<PoolData, SdkError>;

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, SdkError>;
}

pub struct KupoQueryProvider {
    kupo: KupoApi,
    params: ProtocolParameters,
    v1_pool_policy: String,
    v3_pool_policy: String,
}

impl KupoQueryProvider {
    /// Provider for the deployment `params` describes, with that network's known pool policies.
    pub fn new(kupo: KupoApi, params: ProtocolParameters) -> Self {
        let (v1, v3) = match params.network {
            Network::Mainnet => (MAINNET_V1_POOL_POLICY, MAINNET_V3_POOL_POLICY),
            Network::Preview => (PREVIEW_V1_POOL_POLICY, PREVIEW_V3_POOL_POLICY),
        };
        Self::with_pool_policies(kupo, params, v1, v3)
    }

    pub fn with_pool_policies(
        kupo: KupoApi,
        params: ProtocolParameters,
        v1_pool_policy: &str,
        v3_pool_policy: &str,
    ) -> Self {
        Self {
            kupo,
            params,
            v1_pool_policy: v1_pool_policy.to_string(),
            v3_pool_policy: v3_pool_policy.to_string(),
        }
    }

    fn pool_policy(&self, version: ContractVersion) -> &str {
        match version {
            ContractVersion::V1 => &self.v1_pool_policy,
            ContractVersion::V3 => &self.v3_pool_policy,
        }
    }

    async fn fetch_pool(&self, ident: &str, version: ContractVersion) -> Result<PoolData> {
        let policy = self.pool_policy(version);
        let (nft_prefix, _) = name_prefixes(version);
        let utxos = self
            .kupo
            .get(&format!("{}.{}{}", policy, nft_prefix, ident), true)
            .await?;
        let utxo = utxos
            .first()
            .ok_or_else(|| anyhow!("No {} pool found with ident {}", version, ident))?;
        let hash = utxo
            .data_hash
            .as_deref()
            .ok_or_else(|| anyhow!("Pool output {}#{} has no datum", utxo.tx_hash, utxo.output_index))?;
        let datum = self.kupo.datum(hash).await?;
        pool_from_utxo(utxo, &datum, version, policy)
    }
}

#[async_trait]
impl QueryProvider for KupoQueryProvider {
    async fn find_pool_data(&self, ident: &str, version: ContractVersion) -> Result<PoolData, SdkError> {
        self.fetch_pool(ident, version)
            .await
            .map_err(|e| SdkError::Provider(e.to_string()))
    }

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, SdkError> {
        Ok(self.params.clone())
    }
}

/// Pool fields read from a V1 or V3 pool datum.
///
/// V1, constructor 0:
///   [0]: Constr0[Constr0[policyA, nameA], Constr0[policyB, nameB]]
///   [1]: bytes: ident
///   [2]: int: total LP
///   [3]: Constr0[numerator, denominator]: fee
///
/// V3, constructor 0:
///   [0]: bytes: ident
///   [1]: list: [[policyA, nameA], [policyB, nameB]]
///   [2]: int: total LP
///   [3]: int: bid fee, basis points
///   [4]: int: ask fee, basis points
///   [7]: int: protocol fees held in lovelace
struct PoolDatum {
    ident: String,
    assets: (AssetMetadata, AssetMetadata),
    lp_total: BigUint,
    fee: Fraction,
    lovelace_deduction: u64,
}

fn asset_from_class(policy: &PlutusData, name: &PlutusData) -> Result<AssetMetadata> {
    let policy = policy.as_hex()?;
    if policy.is_empty() {
        return Ok(AssetMetadata::ada());
    }
    Ok(AssetMetadata::new(&format!("{}.{}", policy, name.as_hex()?), 0))
}

fn class_parts(class: &PlutusData) -> Result<(&PlutusData, &PlutusData)> {
    let parts = match class {
        PlutusData::List(items) => items.as_slice(),
        other => other.constr_fields()?,
    };
    match parts {
        [policy, name] => Ok((policy, name)),
        _ => Err(anyhow!("asset class: expected 2 fields, got {}", parts.len())),
    }
}

fn asset_pair(pair: &[PlutusData]) -> Result<(AssetMetadata, AssetMetadata)> {
    match pair {
        [a, b] => {
            let (policy_a, name_a) = class_parts(a)?;
            let (policy_b, name_b) = class_parts(b)?;
            Ok((asset_from_class(policy_a, name_a)?, asset_from_class(policy_b, name_b)?))
        }
        _ => Err(anyhow!("asset pair: expected 2 assets, got {}", pair.len())),
    }
}

fn as_biguint(value: &PlutusData) -> Result<BigUint> {
    match value {
        PlutusData::Integer(i) => i
            .to_biguint()
            .ok_or_else(|| anyhow!("expected a non-negative integer, got {}", i)),
        other => Err(anyhow!("expected an integer, got {:?}", other)),
    }
}

fn parse_pool_datum(cbor_hex: &str, version: ContractVersion) -> Result<PoolDatum> {
    let value = PlutusData::from_cbor_hex(cbor_hex)?;
    let fields = value.constr_fields()?;

    match version {
        ContractVersion::V1 => {
            if fields.len() < 4 {
                return Err(anyhow!("SundaeSwap V1 datum: expected >=4 fields, got {}", fields.len()));
            }
            let fee = fields[3].constr_fields()?;
            if fee.len() != 2 {
                return Err(anyhow!("SundaeSwap V1 datum: malformed fee"));
            }
            Ok(PoolDatum {
                ident: fields[1].as_hex()?,
                assets: asset_pair(fields[0].constr_fields()?)?,
                lp_total: as_biguint(&fields[2])?,
                fee: Fraction::new(fee[0].as_u64()?, fee[1].as_u64()?),
                lovelace_deduction: 0,
            })
        }
        ContractVersion::V3 => {
            if fields.len() < 8 {
                return Err(anyhow!("SundaeSwap V3 datum: expected >=8 fields, got {}", fields.len()));
            }
            let pair = match &fields[1] {
                PlutusData::List(items) => items.as_slice(),
                other => return Err(anyhow!("SundaeSwap V3 datum: expected asset list, got {:?}", other)),
            };
            Ok(PoolDatum {
                ident: fields[0].as_hex()?,
                assets: asset_pair(pair)?,
                lp_total: as_biguint(&fields[2])?,
                fee: Fraction::new(fields[4].as_u64()?, 10_000),
                lovelace_deduction: fields[7].as_u64()?,
            })
        }
    }
}

fn reserve(utxo: &Utxo, asset: &AssetMetadata) -> Result<BigUint> {
    let unit = asset.unit()?;
    let found = utxo
        .get_asset(&unit)
        .ok_or_else(|| anyhow!("Pool output {}#{} holds no {}", utxo.tx_hash, utxo.output_index, unit))?;
    Ok(found.quantity.parse::<BigUint>()?)
}

/// Build [`PoolData`] from a pool output and its datum.
pub fn pool_from_utxo(
    utxo: &Utxo,
    datum_cbor: &str,
    version: ContractVersion,
    pool_policy: &str,
) -> Result<PoolData> {
    let datum = parse_pool_datum(datum_cbor, version)?;
    let (asset_a, asset_b) = datum.assets;

    let mut a_reserve = reserve(utxo, &asset_a)?;
    if asset_a.is_ada() {
        let deduction = BigUint::from(datum.lovelace_deduction);
        a_reserve = if a_reserve > deduction { a_reserve - deduction } else { BigUint::default() };
    }
    let b_reserve = reserve(utxo, &asset_b)?;

    let (_, lp_prefix) = name_prefixes(version);
    let pool = PoolData {
        asset_lp: AssetMetadata::new(&format!("{}.{}{}", pool_policy, lp_prefix, datum.ident), 0),
        ident: datum.ident,
        asset_a,
        asset_b,
        liquidity: PoolLiquidity {
            a_reserve,
            b_reserve,
            lp_total: datum.lp_total,
        },
        current_fee: datum.fee,
        version,
    };
    log::debug!("found pool {} at {}#{}", pool.uuid(), utxo.tx_hash, utxo.output_index);
    Ok(pool)
}

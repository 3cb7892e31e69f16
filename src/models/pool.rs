use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};
use crate::models::{AssetMetadata, Fraction};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContractVersion {
    V1,
    V3,
}

impl ContractVersion {
    /// Longest pool ident, in hex characters, each version's validator accepts.
    pub fn max_pool_ident_length(&self) -> usize {
        match self {
            ContractVersion::V1 => V1_MAX_POOL_IDENT_LENGTH,
            ContractVersion::V3 => V3_MAX_POOL_IDENT_LENGTH,
        }
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractVersion::V1 => write!(f, "V1"),
            ContractVersion::V3 => write!(f, "V3"),
        }
    }
}

pub const V1_MAX_POOL_IDENT_LENGTH: usize = 8;
pub const V3_MAX_POOL_IDENT_LENGTH: usize = 56;

/// Which of the pool's two assets an order supplies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PoolCoin {
    A,
    B,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolLiquidity {
    #[serde(with = "crate::utils::quantity")]
    pub a_reserve: BigUint,
    #[serde(with = "crate::utils::quantity")]
    pub b_reserve: BigUint,
    #[serde(with = "crate::utils::quantity")]
    pub lp_total: BigUint,
}

/// A liquidity pool as the query layer reports it. Read-only input to order building.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolData {
    pub ident: String,
    pub asset_a: AssetMetadata,
    pub asset_b: AssetMetadata,
    #[serde(rename = "assetLP")]
    pub asset_lp: AssetMetadata,
    pub liquidity: PoolLiquidity,
    /// Fraction of the input the pool keeps, e.g. `1/100`.
    pub current_fee: Fraction,
    pub version: ContractVersion,
}

impl PoolData {
    pub fn pair(&self) -> String {
        format!("{}/{}", self.asset_a.display_name(), self.asset_b.display_name())
    }

    pub fn uuid(&self) -> String {
        format!("{}.{}.{}", self.version, self.pair(), self.ident)
    }

    /// Side of the pool holding `asset`, compared by identifier.
    pub fn coin_of(&self, asset: &AssetMetadata) -> Result<PoolCoin> {
        if asset.same_asset(&self.asset_a) {
            Ok(PoolCoin::A)
        } else if asset.same_asset(&self.asset_b) {
            Ok(PoolCoin::B)
        } else {
            Err(SdkError::UnknownPoolAsset {
                asset_id: asset.asset_id.clone(),
                ident: self.ident.clone(),
            })
        }
    }

    /// The asset received when supplying `coin`.
    pub fn opposite(&self, coin: PoolCoin) -> &AssetMetadata {
        match coin {
            PoolCoin::A => &self.asset_b,
            PoolCoin::B => &self.asset_a,
        }
    }

    /// `(supplied reserve, received reserve)` for an order supplying `coin`.
    pub fn reserves_for(&self, coin: PoolCoin) -> (&BigUint, &BigUint) {
        match coin {
            PoolCoin::A => (&self.liquidity.a_reserve, &self.liquidity.b_reserve),
            PoolCoin::B => (&self.liquidity.b_reserve, &self.liquidity.a_reserve),
        }
    }
}

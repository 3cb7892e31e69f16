//! Preview network fixtures shared by unit tests.
use num_bigint::BigUint;

use crate::models::{
    AssetMetadata, ContractVersion, DestinationAddress, Fraction, OrderAddresses, PoolData,
    PoolLiquidity,
};

pub const CURRENT_ADDRESS: &str = "addr_test1qrp8nglm8d8x9w783c5g0qa4spzaft5z5xyx0kp495p8wksjrlfzuz6h4ssxlm78v0utlgrhryvl2gvtgp53a6j9zngqtjfk6s";
pub const ALTERNATE_ADDRESS: &str = "addr_test1qqpxt8wyqmsa28pxjk7z893txpy8608tn9d7kyaknpgfcmcjrlfzuz6h4ssxlm78v0utlgrhryvl2gvtgp53a6j9zngqllv3yr";
pub const CURRENT_PAYMENT_HASH: &str = "c279a3fb3b4e62bbc78e288783b58045d4ae82a18867d8352d02775a";
pub const OWNER_STAKE_HASH: &str = "121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0";

pub const V3_POOL_IDENT: &str = "8bf66e915c450ad94866abb02802821b599e32f43536a42470b21ea2";
pub const TINDY_ID: &str = "fa3eff2047fdf9293c5feef4dc85ce58097ea1c6da4845a351535183.74494e4459";
pub const IBTC_ID: &str = "2fe3c3364b443194b10954771c95819b8d6ed464033c21f03f8facb5.69425443";

pub fn tindy() -> AssetMetadata {
    AssetMetadata::new(TINDY_ID, 0)
}

pub fn ibtc() -> AssetMetadata {
    AssetMetadata::new(IBTC_ID, 0)
}

pub fn current_addresses() -> OrderAddresses {
    OrderAddresses::new(DestinationAddress::without_datum(CURRENT_ADDRESS))
}

fn liquidity(a: u64, b: u64, lp: u64) -> PoolLiquidity {
    PoolLiquidity {
        a_reserve: BigUint::from(a),
        b_reserve: BigUint::from(b),
        lp_total: BigUint::from(lp),
    }
}

pub fn preview_pool_v1() -> PoolData {
    PoolData {
        ident: "06".to_string(),
        asset_a: AssetMetadata::ada(),
        asset_b: tindy(),
        asset_lp: AssetMetadata::new(
            "4086577ed57c514f8e29b78f42ef4f379363355a3b65b9a032ee30c9.6c702006",
            0,
        ),
        liquidity: liquidity(1_000_000_000, 1_000_000_000, 1_000_000_000),
        current_fee: Fraction::new(1, 100),
        version: ContractVersion::V1,
    }
}

/// V1 ADA/iBTC pool used as the second leg of routed swaps.
pub fn route_pool_v1() -> PoolData {
    PoolData {
        ident: "04".to_string(),
        asset_a: AssetMetadata::ada(),
        asset_b: ibtc(),
        asset_lp: AssetMetadata::new(
            "4086577ed57c514f8e29b78f42ef4f379363355a3b65b9a032ee30c9.6c702004",
            0,
        ),
        liquidity: liquidity(500_000_000, 250_000_000, 353_553_390),
        current_fee: Fraction::new(1, 100),
        version: ContractVersion::V1,
    }
}

pub fn preview_pool_v3() -> PoolData {
    PoolData {
        ident: V3_POOL_IDENT.to_string(),
        asset_a: AssetMetadata::ada(),
        asset_b: tindy(),
        asset_lp: AssetMetadata::new(
            "633a136877ed6ad0ab33e69a22611319673474c8bd0a79a4c76d9289.0014df10a933477ea168013e2b5af4a9e029e36d26738eb6dfe382e1f3eab3e2",
            0,
        ),
        liquidity: liquidity(1_018_800_000, 992_067_448, 1_005_344_904),
        current_fee: Fraction::new(5, 100),
        version: ContractVersion::V3,
    }
}

/// V3 ADA/iBTC pool with the same reserves, second leg of V3 routed swaps.
pub fn route_pool_v3() -> PoolData {
    PoolData {
        asset_b: ibtc(),
        ..preview_pool_v3()
    }
}

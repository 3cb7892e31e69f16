//! Two-leg routed swaps.
//!
//! Leg A is sent to the protocol with leg B's order as the datum of its output, so the scoopers
//! settle leg A straight into a new leg B order instead of paying the user.
use serde::Serialize;

use crate::address::{parse_address, resolve};
use crate::config::OrderRouteSwapConfig;
use crate::datum::{
    validate_pool_ident, DatumBuilder, DatumCodec, DatumResult, OrderArgs, SwapPayload,
};
use crate::error::Result;
use crate::fees::{aggregate, current_scooper_fee, order_deposit, referral_fee, referral_metadata};
use crate::metadata::{Metadatum, TransactionMetadata};
use crate::models::{
    AssetAmount, ContractVersion, DatumPolicy, DestinationAddress, FeeSummary, OrderAddresses,
};
use crate::params::ProtocolParameters;

/// Metadata label V1 scoopers read continuation datums from.
pub const LEGACY_ROUTING_METADATA_LABEL: u64 = 103251;
/// Chunk size of datum bytes under [`LEGACY_ROUTING_METADATA_LABEL`].
pub const LEGACY_ROUTING_CHUNK: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedSwap {
    /// Datum of the leg A order output.
    pub datum: DatumResult,
    /// Leg B order, carried inside or referenced by `datum`.
    pub continuation: DatumResult,
    pub order_address: String,
    pub supplied: AssetAmount,
    pub fees: FeeSummary,
    #[serde(skip)]
    pub metadata: TransactionMetadata,
}

/// Builds the leg A datum of a routed swap together with the aggregated fees.
///
/// Leg B swaps exactly leg A's minimum output and pays `order_addresses`; leg A pays leg B's
/// order address, with the continuation inline when both legs are V3 and by hash otherwise.
pub fn build_routed_swap(
    config: &OrderRouteSwapConfig,
    params: &ProtocolParameters,
    at: u64,
) -> Result<RoutedSwap> {
    let (leg_a, leg_b, supplied, addresses) = config.legs()?;
    let (version_a, version_b) = (leg_a.pool.version, leg_b.pool.version);
    validate_pool_ident(&leg_a.pool.ident, version_a)?;
    validate_pool_ident(&leg_b.pool.ident, version_b)?;

    let owner = match &config.owner_address {
        Some(owner) => parse_address(owner, params.network)?,
        None => parse_address(&addresses.destination.address, params.network)?,
    };
    let fee_a = current_scooper_fee(&params.for_version(version_a).scooper_fee, at)?;
    let fee_b = current_scooper_fee(&params.for_version(version_b).scooper_fee, at)?;

    let intermediate = leg_a.swap_type.min_receivable(&leg_a.pool, supplied)?;
    let min_b = leg_b.swap_type.min_receivable(&leg_b.pool, &intermediate)?;
    let continuation = DatumCodec::for_version(version_b).build_swap_datum(&OrderArgs {
        ident: leg_b.pool.ident.clone(),
        addresses: resolve(addresses, params.network, version_b)?,
        owner: Some(owner.clone()),
        scooper_fee: fee_b.clone(),
        payload: SwapPayload {
            pool_assets: (leg_b.pool.asset_a.clone(), leg_b.pool.asset_b.clone()),
            supplied: intermediate.clone(),
            min_receivable: Some(min_b),
        },
    })?;

    let policy = match (version_a, version_b) {
        (ContractVersion::V3, ContractVersion::V3) => {
            DatumPolicy::Inline(continuation.inline.clone())
        }
        _ => DatumPolicy::Hash(continuation.hash.clone()),
    };
    let leg_a_destination = OrderAddresses {
        destination: DestinationAddress::new(&params.order_address_for(version_b, &owner)?, policy),
        alternate: addresses.alternate.clone(),
    };
    let datum = DatumCodec::for_version(version_a).build_swap_datum(&OrderArgs {
        ident: leg_a.pool.ident.clone(),
        addresses: resolve(&leg_a_destination, params.network, version_a)?,
        owner: Some(owner.clone()),
        scooper_fee: fee_a.clone(),
        payload: SwapPayload {
            pool_assets: (leg_a.pool.asset_a.clone(), leg_a.pool.asset_b.clone()),
            supplied: supplied.clone(),
            min_receivable: Some(intermediate),
        },
    })?;

    let mut metadata = TransactionMetadata::new();
    if version_b == ContractVersion::V1 {
        metadata.insert(
            LEGACY_ROUTING_METADATA_LABEL,
            Metadatum::Map(vec![(
                Metadatum::Bytes(continuation.hash_bytes()?),
                Metadatum::chunked_bytes(&continuation.inline_bytes()?, LEGACY_ROUTING_CHUNK),
            )]),
        );
    }

    let referral = config.referral_fee.as_ref().map(referral_fee).transpose()?;
    if let Some(extra) = referral.as_ref().and_then(referral_metadata) {
        metadata.merge(extra);
    }
    let fees = aggregate(&[
        FeeSummary::new(order_deposit(params, version_a), AssetAmount::lovelace(fee_a))
            .with_referral(referral.map(|r| r.payment)),
        FeeSummary::new(order_deposit(params, version_b), AssetAmount::lovelace(fee_b)),
    ])?;
    log::debug!(
        "routed {} -> {} swap, leg A datum {}, leg B datum {}",
        leg_a.pool.ident,
        leg_b.pool.ident,
        datum.hash,
        continuation.hash
    );

    Ok(RoutedSwap {
        datum,
        continuation,
        order_address: params.order_address_for(version_a, &owner)?,
        supplied: supplied.clone(),
        fees,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RouteLeg, SwapType};
    use crate::error::{SdkError, INVALID_POOL_IDENT};
    use crate::models::ReferralFee;
    use crate::testing::{
        current_addresses, preview_pool_v3, route_pool_v1, route_pool_v3, tindy, CURRENT_ADDRESS,
    };
    use num_bigint::BigUint;
    use pretty_assertions::assert_eq;

    const V3_TO_V3_DATUM: &str = "d8799fd8799f581c8bf66e915c450ad94866abb02802821b599e32f43536a42470b21ea2ffd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ff1a000f4240d8799fd8799fd87a9f581c484969d936f484c45f143d911f81636fe925048e205048ee1fe412aaffd8799fd8799fd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ffffffffd87b9fd8799fd8799f581c8bf66e915c450ad94866abb02802821b599e32f43536a42470b21ea2ffd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ff1a000f4240d8799fd8799fd8799f581cc279a3fb3b4e62bbc78e288783b58045d4ae82a18867d8352d02775affd8799fd8799fd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ffffffffd87980ffd87a9f9f40401a011b5ec7ff9f581c2fe3c3364b443194b10954771c95819b8d6ed464033c21f03f8facb544694254431a00f9f216ffff43d87980ffffffd87a9f9f581cfa3eff2047fdf9293c5feef4dc85ce58097ea1c6da4845a3515351834574494e44591a01312d00ff9f40401a011b5ec7ffff43d87980ff";

    const V3_TO_V1_DATUM: &str = "d8799fd8799f581c8bf66e915c450ad94866abb02802821b599e32f43536a42470b21ea2ffd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ff1a000f4240d8799fd8799fd87a9f581c730e7d146ad7427a23a885d2141b245d3f8ccd416b5322a31719977effd87a80ffd87a9f58208d35dd309d5025e51844f3c8b6d6f4e93ec55bf4a85b5c3610860500efc1e9fbffffd87a9f9f581cfa3eff2047fdf9293c5feef4dc85ce58097ea1c6da4845a3515351834574494e44591a01312d00ff9f40401a011b5ec7ffff43d87980ff";

    const V3_TO_V1_METADATA: &str = "a158208d35dd309d5025e51844f3c8b6d6f4e93ec55bf4a85b5c3610860500efc1e9fb85581fd8799f4104d8799fd8799fd8799fd8799f581cc279a3fb3b4e62bbc78e2887581f83b58045d4ae82a18867d8352d02775affd8799fd8799fd8799f581c121fd2581f2e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ffffffffd87a581f80ffd87a80ff1a002625a0d8799fd879801a011b5ec7d8799f1a00833c12ff42ffff";

    fn route(leg_b: crate::models::PoolData) -> OrderRouteSwapConfig {
        OrderRouteSwapConfig::new()
            .with_swap_a(RouteLeg {
                pool: preview_pool_v3(),
                swap_type: SwapType::default(),
            })
            .with_swap_b(RouteLeg {
                pool: leg_b,
                swap_type: SwapType::default(),
            })
            .with_supplied_asset(AssetAmount::new(20_000_000u64, tindy()))
            .with_order_addresses(current_addresses())
    }

    fn owner_order_address(params: &ProtocolParameters, version: ContractVersion) -> String {
        let owner = parse_address(CURRENT_ADDRESS, params.network).unwrap();
        params.order_address_for(version, &owner).unwrap()
    }

    #[test]
    fn test_v3_to_v3_route_golden() {
        let params = ProtocolParameters::preview();
        let routed = build_routed_swap(&route(route_pool_v3()), &params, 0).unwrap();
        assert_eq!(routed.datum.inline, V3_TO_V3_DATUM);
        assert!(routed.metadata.is_empty());
        assert_eq!(routed.continuation.schema.constr_fields().unwrap().len(), 6);
    }

    #[test]
    fn test_v3_to_v1_route_golden() {
        let params = ProtocolParameters::preview();
        let routed = build_routed_swap(&route(route_pool_v1()), &params, 0).unwrap();
        assert_eq!(
            routed.continuation.hash,
            "8d35dd309d5025e51844f3c8b6d6f4e93ec55bf4a85b5c3610860500efc1e9fb"
        );
        assert_eq!(routed.datum.inline, V3_TO_V1_DATUM);
        assert_eq!(
            routed.metadata.labels().collect::<Vec<_>>(),
            vec![&LEGACY_ROUTING_METADATA_LABEL]
        );
        let metadata = routed.metadata.get(LEGACY_ROUTING_METADATA_LABEL).unwrap();
        assert_eq!(hex::encode(metadata.to_cbor().unwrap()), V3_TO_V1_METADATA);
    }

    #[test]
    fn test_route_fees_add_up() {
        let params = ProtocolParameters::preview();
        let routed = build_routed_swap(&route(route_pool_v1()), &params, 0).unwrap();
        assert_eq!(routed.fees.scooper_fee.amount, BigUint::from(3_500_000u64));
        assert_eq!(routed.fees.deposit.amount, BigUint::from(4_000_000u64));
        assert_eq!(routed.order_address, owner_order_address(&params, ContractVersion::V3));
    }

    #[test]
    fn test_v3_to_v3_route_fees_and_inline_continuation() {
        let params = ProtocolParameters::preview();
        let routed = build_routed_swap(&route(route_pool_v3()), &params, 0).unwrap();
        assert_eq!(routed.fees.scooper_fee, AssetAmount::lovelace(2_000_000u64));
        assert_eq!(routed.fees.deposit, AssetAmount::lovelace(4_000_000u64));
        assert_eq!(routed.fees.referral, None);
        assert!(routed
            .datum
            .inline
            .contains(&format!("d87b9f{}ff", routed.continuation.inline)));
        assert!(routed.metadata.get(LEGACY_ROUTING_METADATA_LABEL).is_none());
        assert!(routed.metadata.is_empty());
        assert_eq!(routed.order_address, owner_order_address(&params, ContractVersion::V3));
    }

    #[test]
    fn test_route_referral_counts_once() {
        let config = route(route_pool_v3()).with_referral_fee(ReferralFee {
            destination: CURRENT_ADDRESS.to_string(),
            payment: AssetAmount::lovelace(1_500_000u64),
            fee_label: Some("Test Label".to_string()),
        });
        let routed = build_routed_swap(&config, &ProtocolParameters::preview(), 0).unwrap();
        assert_eq!(routed.fees.referral, Some(AssetAmount::lovelace(1_500_000u64)));
        assert_eq!(
            routed.metadata.get(crate::fees::REFERRAL_METADATA_LABEL),
            Some(&Metadatum::Text("Test Label: 1.5 ADA".to_string()))
        );
    }

    #[test]
    fn test_invalid_leg_ident_propagates() {
        let mut bad = route_pool_v1();
        bad.ident = "000000000".to_string();
        let err = build_routed_swap(&route(bad), &ProtocolParameters::preview(), 0).unwrap_err();
        assert_eq!(err.to_string(), INVALID_POOL_IDENT);
        assert!(matches!(err, SdkError::InvalidPoolIdent { version: ContractVersion::V1, .. }));
    }
}

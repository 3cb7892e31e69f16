//! V1 order datums.
//!
//! ```text
//! OrderDatum     = Constr0[ident, OrderAddresses, scooperFee, action]
//! OrderAddresses = Constr0[Destination, Option<alternate credential hash>]
//! Destination    = Constr0[Constr0[paymentKey, Option<Constr0[stakingKey]>], Option<datum hash>]
//! ```
use crate::address::{Credential, ResolvedAddresses, ResolvedDatum};
use crate::datum::cbor::PlutusData;
use crate::datum::{
    validate_pool_ident, DatumBuilder, DatumResult, DepositArgs, OrderArgs, SwapArgs, WithdrawArgs,
};
use crate::error::{Result, SdkError};
use crate::models::{ContractVersion, PoolCoin};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct V1DatumBuilder;

/// `KeyHash` or `ScriptHash` over `hash`, tagged after `kind`.
fn key(kind: &Credential, hash: &[u8]) -> PlutusData {
    let alternative = if kind.is_script() { 1 } else { 0 };
    PlutusData::constr(alternative, vec![PlutusData::bytes(hash)])
}

fn destination(addresses: &ResolvedAddresses) -> Result<PlutusData> {
    let parsed = &addresses.destination.address;
    // The staking key reuses the payment part's tag.
    let stake = parsed
        .stake
        .as_ref()
        .map(|s| PlutusData::constr(0, vec![key(&parsed.payment, s.hash())]));
    let credentials = PlutusData::constr(
        0,
        vec![key(&parsed.payment, parsed.payment.hash()), PlutusData::option(stake)],
    );
    let datum = match &addresses.destination.datum {
        ResolvedDatum::None => None,
        ResolvedDatum::Hash(hash) => Some(PlutusData::bytes(hash.clone())),
        ResolvedDatum::Inline(_) => {
            return Err(SdkError::UnsupportedDatumPolicy {
                version: ContractVersion::V1,
                policy: "INLINE".to_string(),
            })
        }
    };
    Ok(PlutusData::constr(0, vec![credentials, PlutusData::option(datum)]))
}

fn order_addresses(addresses: &ResolvedAddresses) -> Result<PlutusData> {
    let alternate = addresses
        .alternate_credential()
        .map(|c| PlutusData::bytes(c.hash()));
    Ok(PlutusData::constr(
        0,
        vec![destination(addresses)?, PlutusData::option(alternate)],
    ))
}

fn order_datum<P>(args: &OrderArgs<P>, action: PlutusData) -> Result<DatumResult> {
    let ident = validate_pool_ident(&args.ident, ContractVersion::V1)?;
    DatumResult::from_schema(PlutusData::constr(
        0,
        vec![
            PlutusData::bytes(ident),
            order_addresses(&args.addresses)?,
            PlutusData::uint(&args.scooper_fee),
            action,
        ],
    ))
}

impl DatumBuilder for V1DatumBuilder {
    fn version(&self) -> ContractVersion {
        ContractVersion::V1
    }

    fn build_swap_datum(&self, args: &SwapArgs) -> Result<DatumResult> {
        validate_pool_ident(&args.ident, ContractVersion::V1)?;
        let direction = match args.payload.supplied_coin(&args.ident)? {
            PoolCoin::A => 0,
            PoolCoin::B => 1,
        };
        let min = args
            .payload
            .min_receivable
            .as_ref()
            .map(|m| PlutusData::uint(&m.amount));
        let action = PlutusData::constr(
            0,
            vec![
                PlutusData::constr(direction, vec![]),
                PlutusData::uint(&args.payload.supplied.amount),
                PlutusData::option(min),
            ],
        );
        order_datum(args, action)
    }

    fn build_deposit_datum(&self, args: &DepositArgs) -> Result<DatumResult> {
        validate_pool_ident(&args.ident, ContractVersion::V1)?;
        let (a, b) = args.payload.canonical()?;
        let pair = PlutusData::constr(0, vec![PlutusData::uint(&a.amount), PlutusData::uint(&b.amount)]);
        let action = PlutusData::constr(2, vec![PlutusData::constr(1, vec![pair])]);
        order_datum(args, action)
    }

    fn build_withdraw_datum(&self, args: &WithdrawArgs) -> Result<DatumResult> {
        validate_pool_ident(&args.ident, ContractVersion::V1)?;
        let action = PlutusData::constr(1, vec![PlutusData::uint(&args.payload.lp.amount)]);
        order_datum(args, action)
    }

    fn build_order_addresses_datum(&self, addresses: &ResolvedAddresses) -> Result<DatumResult> {
        DatumResult::from_schema(order_addresses(addresses)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::resolve;
    use crate::datum::{DepositPayload, SwapPayload, WithdrawPayload};
    use crate::error::INVALID_POOL_IDENT;
    use crate::models::{AssetAmount, AssetMetadata, DatumPolicy, DestinationAddress, OrderAddresses};
    use crate::params::Network;
    use crate::testing::{current_addresses, preview_pool_v1, tindy, ALTERNATE_ADDRESS, CURRENT_ADDRESS};
    use num_bigint::BigUint;
    use pretty_assertions::assert_eq;

    const SWAP_10M_INLINE: &str = "d8799f4106d8799fd8799fd8799fd8799f581cc279a3fb3b4e62bbc78e288783b58045d4ae82a18867d8352d02775affd8799fd8799fd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ffffffffd87a80ffd87a80ff1a000f4240d8799fd879801a00989680d8799f1864ffffff";

    fn swap_args(addresses: &OrderAddresses, supplied: AssetAmount, min: Option<u64>) -> SwapArgs {
        let pool = preview_pool_v1();
        let received = pool.opposite(pool.coin_of(&supplied.metadata).unwrap()).clone();
        OrderArgs {
            ident: pool.ident.clone(),
            addresses: resolve(addresses, Network::Preview, ContractVersion::V1).unwrap(),
            owner: None,
            scooper_fee: BigUint::from(1_000_000u64),
            payload: SwapPayload {
                pool_assets: (pool.asset_a, pool.asset_b),
                supplied,
                min_receivable: min.map(|m| AssetAmount::new(m, received)),
            },
        }
    }

    #[test]
    fn test_swap_datum_golden() {
        let args = swap_args(&current_addresses(), AssetAmount::lovelace(10_000_000u64), Some(100));
        let result = V1DatumBuilder.build_swap_datum(&args).unwrap();
        assert_eq!(result.inline, SWAP_10M_INLINE);
        assert_eq!(result.hash, "a05ea9ede761983134b23116cc28ab676dbd417077f0b2e1ce47ff01a9d32933");
    }

    #[test]
    fn test_swap_datum_without_min_receivable() {
        let args = swap_args(&current_addresses(), AssetAmount::lovelace(20_000_000u64), None);
        let result = V1DatumBuilder.build_swap_datum(&args).unwrap();
        assert_eq!(
            result.inline,
            "d8799f4106d8799fd8799fd8799fd8799f581cc279a3fb3b4e62bbc78e288783b58045d4ae82a18867d8352d02775affd8799fd8799fd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ffffffffd87a80ffd87a80ff1a000f4240d8799fd879801a01312d00d87a80ffff"
        );
        assert_eq!(result.hash, "fad4f9baed71fc0cf05feacd200f4c934d0475d351e7a8766bab554d39db93bc");
    }

    #[test]
    fn test_swap_datum_with_hash_and_coin_b() {
        let addresses = OrderAddresses::new(DestinationAddress::new(
            CURRENT_ADDRESS,
            DatumPolicy::Hash("801781d78d0a71944986666b6edd375c7ac039002a0ecbf55258c69bd6dcd7da".to_string()),
        ));
        let args = swap_args(&addresses, AssetAmount::new(100u64, tindy()), Some(10_000_000));
        let result = V1DatumBuilder.build_swap_datum(&args).unwrap();
        assert_eq!(result.hash, "ffd5dd8d7952afc1f6e890b7a5d648d3d74df05abc1997da1acaf94dc01f8a73");
    }

    #[test]
    fn test_swap_datum_is_deterministic() {
        let args = swap_args(&current_addresses(), AssetAmount::lovelace(10_000_000u64), Some(100));
        let first = V1DatumBuilder.build_swap_datum(&args).unwrap();
        V1DatumBuilder
            .build_withdraw_datum(&OrderArgs {
                ident: args.ident.clone(),
                addresses: args.addresses.clone(),
                owner: None,
                scooper_fee: args.scooper_fee.clone(),
                payload: WithdrawPayload { lp: AssetAmount::new(5u64, tindy()) },
            })
            .unwrap();
        assert_eq!(V1DatumBuilder.build_swap_datum(&args).unwrap(), first);
    }

    #[test]
    fn test_ident_over_bound_fails_with_static_message() {
        let mut args = swap_args(&current_addresses(), AssetAmount::lovelace(10_000_000u64), None);
        args.ident = "000000000".to_string();
        let err = V1DatumBuilder.build_swap_datum(&args).unwrap_err();
        assert_eq!(err.to_string(), INVALID_POOL_IDENT);
        assert!(matches!(err, SdkError::InvalidPoolIdent { .. }));
    }

    fn order_args<P>(ident: &str, payload: P) -> OrderArgs<P> {
        OrderArgs {
            ident: ident.to_string(),
            addresses: resolve(&current_addresses(), Network::Preview, ContractVersion::V1).unwrap(),
            owner: None,
            scooper_fee: BigUint::from(2_500_000u64),
            payload,
        }
    }

    fn build_every_kind(ident: &str) -> Vec<Result<DatumResult>> {
        let pool = preview_pool_v1();
        vec![
            V1DatumBuilder.build_swap_datum(&order_args(
                ident,
                SwapPayload {
                    pool_assets: (pool.asset_a.clone(), pool.asset_b.clone()),
                    supplied: AssetAmount::lovelace(10_000_000u64),
                    min_receivable: None,
                },
            )),
            V1DatumBuilder.build_deposit_datum(&order_args(
                ident,
                DepositPayload {
                    assets: (AssetAmount::lovelace(10u64), AssetAmount::new(10u64, tindy())),
                },
            )),
            V1DatumBuilder.build_withdraw_datum(&order_args(
                ident,
                WithdrawPayload {
                    lp: AssetAmount::new(10u64, pool.asset_lp.clone()),
                },
            )),
        ]
    }

    #[test]
    fn test_ident_bound_on_every_order_kind() {
        for result in build_every_kind("0000000a") {
            assert!(result.is_ok(), "{:?}", result);
        }
        for ident in ["0000000a0", "0000000a00"] {
            for result in build_every_kind(ident) {
                let err = result.unwrap_err();
                assert!(matches!(err, SdkError::InvalidPoolIdent { .. }));
                assert_eq!(err.to_string(), INVALID_POOL_IDENT);
            }
        }
    }

    #[test]
    fn test_malformed_supplied_asset_is_not_taken_for_ada() {
        for id in ["deadbeef.cafe", "lovelace0", "\u{20ac}".repeat(19).as_str()] {
            let mut args = swap_args(&current_addresses(), AssetAmount::lovelace(10u64), None);
            args.payload.supplied = AssetAmount::new(10u64, AssetMetadata::new(id, 0));
            assert!(matches!(
                V1DatumBuilder.build_swap_datum(&args),
                Err(SdkError::UnknownPoolAsset { .. })
            ));
        }
    }

    #[test]
    fn test_deposit_rejects_malformed_asset() {
        let result = V1DatumBuilder.build_deposit_datum(&order_args(
            "06",
            DepositPayload {
                assets: (
                    AssetAmount::lovelace(10u64),
                    AssetAmount::new(10u64, AssetMetadata::new("deadbeef.cafe", 0)),
                ),
            },
        ));
        assert!(matches!(result, Err(SdkError::InvalidAsset { .. })));
    }

    #[test]
    fn test_swap_rejects_asset_outside_pool() {
        let mut args = swap_args(&current_addresses(), AssetAmount::lovelace(10u64), None);
        args.payload.supplied = AssetAmount::new(
            10u64,
            AssetMetadata::new("99b071ce8580d6a3a11b4902145adb8bfd0d2a03935af8cf66403e15.55534443", 6),
        );
        assert!(matches!(
            V1DatumBuilder.build_swap_datum(&args),
            Err(SdkError::UnknownPoolAsset { .. })
        ));
    }

    #[test]
    fn test_deposit_order_does_not_matter() {
        let addresses = resolve(&current_addresses(), Network::Preview, ContractVersion::V1).unwrap();
        let ada = AssetAmount::lovelace(10_000_000u64);
        let indy = AssetAmount::new(10_000_000u64, tindy());
        let build = |assets| {
            V1DatumBuilder
                .build_deposit_datum(&OrderArgs {
                    ident: "06".to_string(),
                    addresses: addresses.clone(),
                    owner: None,
                    scooper_fee: BigUint::from(2_500_000u64),
                    payload: DepositPayload { assets },
                })
                .unwrap()
        };
        let forward = build((ada.clone(), indy.clone()));
        let backward = build((indy, ada));
        assert_eq!(forward.inline, backward.inline);
        assert!(forward.inline.ends_with("d87b9fd87a9fd8799f1a009896801a00989680ffffffff"));
    }

    #[test]
    fn test_withdraw_datum_action() {
        let addresses = resolve(&current_addresses(), Network::Preview, ContractVersion::V1).unwrap();
        let result = V1DatumBuilder
            .build_withdraw_datum(&OrderArgs {
                ident: "06".to_string(),
                addresses,
                owner: None,
                scooper_fee: BigUint::from(2_500_000u64),
                payload: WithdrawPayload { lp: AssetAmount::new(10_000_000u64, preview_pool_v1().asset_lp) },
            })
            .unwrap();
        assert!(result.inline.ends_with("1a002625a0d87a9f1a00989680ffff"));
    }

    #[test]
    fn test_order_addresses_with_alternate() {
        let addresses = resolve(
            &current_addresses().with_alternate(ALTERNATE_ADDRESS),
            Network::Preview,
            ContractVersion::V1,
        )
        .unwrap();
        let result = V1DatumBuilder.build_order_addresses_datum(&addresses).unwrap();
        assert!(result
            .inline
            .ends_with("d87a80ffd8799f581c121fd22e0b57ac206fefc763f8bfa0771919f5218b40691eea4514d0ffff"));
    }

    #[test]
    fn test_inline_destination_is_rejected() {
        let mut addresses = resolve(&current_addresses(), Network::Preview, ContractVersion::V1).unwrap();
        addresses.destination.datum = ResolvedDatum::Inline(PlutusData::void());
        let err = V1DatumBuilder.build_order_addresses_datum(&addresses).unwrap_err();
        assert_eq!(err.to_string(), crate::error::V1_INLINE_DATUM_UNSUPPORTED);
    }
}

//! V3 order datums.
//!
//! ```text
//! OrderDatum  = Constr0[Option<ident>, owner, maxProtocolFee, Destination, Order, extension]
//! Destination = Fixed Constr0[Address, Datum]
//! Address     = Constr0[paymentCredential, Option<Constr0[Inline(stakingCredential)]>]
//! ```
use crate::address::{Credential, ParsedAddress, ResolvedAddresses, ResolvedDatum, ResolvedDestination};
use crate::datum::cbor::PlutusData;
use crate::datum::{
    validate_pool_ident, DatumBuilder, DatumResult, DepositArgs, OrderArgs, SwapArgs, WithdrawArgs,
};
use crate::error::Result;
use crate::models::{AssetAmount, ContractVersion};

/// Payload of the extension field: the CBOR of `Constr0[]`.
const NO_EXTENSION: [u8; 3] = [0xd8, 0x79, 0x80];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct V3DatumBuilder;

fn credential(c: &Credential) -> PlutusData {
    let alternative = if c.is_script() { 1 } else { 0 };
    PlutusData::constr(alternative, vec![PlutusData::bytes(c.hash())])
}

fn address(parsed: &ParsedAddress) -> PlutusData {
    let stake = parsed
        .stake
        .as_ref()
        .map(|s| PlutusData::constr(0, vec![credential(s)]));
    PlutusData::constr(0, vec![credential(&parsed.payment), PlutusData::option(stake)])
}

fn destination(dest: &ResolvedDestination) -> PlutusData {
    let datum = match &dest.datum {
        ResolvedDatum::None => PlutusData::constr(0, vec![]),
        ResolvedDatum::Hash(hash) => PlutusData::constr(1, vec![PlutusData::bytes(hash.clone())]),
        ResolvedDatum::Inline(data) => PlutusData::constr(2, vec![data.clone()]),
    };
    PlutusData::constr(0, vec![address(&dest.address), datum])
}

/// `Signature` over the owner's staking key hash, or payment key hash without one.
fn owner(parsed: &ParsedAddress) -> PlutusData {
    PlutusData::constr(0, vec![PlutusData::bytes(parsed.stake_or_payment().hash())])
}

/// `[policy, name, amount]`, ADA being the empty policy and name.
fn singleton_value(amount: &AssetAmount) -> Result<PlutusData> {
    let (policy, name) = amount.metadata.asset_class()?;
    Ok(PlutusData::List(vec![
        PlutusData::bytes(policy),
        PlutusData::bytes(name),
        PlutusData::uint(&amount.amount),
    ]))
}

fn order_datum<P>(args: &OrderArgs<P>, order: PlutusData) -> Result<DatumResult> {
    let ident = validate_pool_ident(&args.ident, ContractVersion::V3)?;
    DatumResult::from_schema(PlutusData::constr(
        0,
        vec![
            PlutusData::some(PlutusData::bytes(ident)),
            owner(args.owner()),
            PlutusData::uint(&args.scooper_fee),
            destination(&args.addresses.destination),
            order,
            PlutusData::bytes(NO_EXTENSION.to_vec()),
        ],
    ))
}

impl V3DatumBuilder {
    /// Datum holding only the owner signature schema.
    pub fn build_owner_datum(&self, owner_address: &ParsedAddress) -> Result<DatumResult> {
        DatumResult::from_schema(owner(owner_address))
    }

    /// Datum holding a single `[policy, name, amount]` value.
    pub fn build_asset_amount_datum(&self, amount: &AssetAmount) -> Result<DatumResult> {
        DatumResult::from_schema(singleton_value(amount)?)
    }
}

impl DatumBuilder for V3DatumBuilder {
    fn version(&self) -> ContractVersion {
        ContractVersion::V3
    }

    fn build_swap_datum(&self, args: &SwapArgs) -> Result<DatumResult> {
        validate_pool_ident(&args.ident, ContractVersion::V3)?;
        let payload = &args.payload;
        let received = payload.received_asset(&args.ident)?;
        let min = match &payload.min_receivable {
            Some(min) => min.clone(),
            None => AssetAmount::zero(received.clone()),
        };
        let order = PlutusData::constr(
            1,
            vec![singleton_value(&payload.supplied)?, singleton_value(&min)?],
        );
        order_datum(args, order)
    }

    fn build_deposit_datum(&self, args: &DepositArgs) -> Result<DatumResult> {
        validate_pool_ident(&args.ident, ContractVersion::V3)?;
        let (a, b) = args.payload.canonical()?;
        let order = PlutusData::constr(
            2,
            vec![PlutusData::List(vec![singleton_value(a)?, singleton_value(b)?])],
        );
        order_datum(args, order)
    }

    fn build_withdraw_datum(&self, args: &WithdrawArgs) -> Result<DatumResult> {
        validate_pool_ident(&args.ident, ContractVersion::V3)?;
        let order = PlutusData::constr(3, vec![singleton_value(&args.payload.lp)?]);
        order_datum(args, order)
    }

    /// V3 records no alternate address; only the destination is encoded.
    fn build_order_addresses_datum(&self, addresses: &ResolvedAddresses) -> Result<DatumResult> {
        DatumResult::from_schema(destination(&addresses.destination))
    }
}

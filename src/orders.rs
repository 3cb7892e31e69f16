//! Entry point tying protocol parameters, configs, the fee engine and the datum codecs together.
use serde::Serialize;

use crate::address::parse_address;
use crate::config::{DepositConfig, OrderConfig, OrderRouteSwapConfig, SwapConfig, WithdrawConfig};
use crate::datum::{DatumBuilder, DatumCodec, DatumResult, OrderArgs};
use crate::error::Result;
use crate::fees::{order_deposit, referral_fee, referral_metadata};
use crate::metadata::TransactionMetadata;
use crate::models::{AssetAmount, ContractVersion, FeeSummary};
use crate::params::ProtocolParameters;
use crate::router::{build_routed_swap, RoutedSwap};

/// Everything a transaction builder needs to lock one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltOrder {
    pub version: ContractVersion,
    pub datum: DatumResult,
    pub order_address: String,
    /// Assets the order output must hold: supplied assets plus deposit and scooper fee.
    pub order_value: Vec<AssetAmount>,
    pub fees: FeeSummary,
    #[serde(skip)]
    pub metadata: TransactionMetadata,
}

/// Adds `amount` to the entry of the same asset, or appends it.
fn add_to_value(value: &mut Vec<AssetAmount>, amount: &AssetAmount) {
    match value.iter_mut().find(|v| v.metadata.same_asset(&amount.metadata)) {
        Some(existing) => existing.amount += &amount.amount,
        None => value.push(amount.clone()),
    }
}

/// Lovelace first, then the supplied assets.
pub fn order_value(supplied: &[&AssetAmount], fees: &FeeSummary) -> Vec<AssetAmount> {
    let mut value = vec![AssetAmount::lovelace(0u64)];
    add_to_value(&mut value, &fees.deposit);
    add_to_value(&mut value, &fees.scooper_fee);
    for amount in supplied {
        add_to_value(&mut value, amount);
    }
    value
}

#[derive(Debug, Clone)]
pub struct OrderBuilder {
    params: ProtocolParameters,
}

impl OrderBuilder {
    pub fn new(params: ProtocolParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ProtocolParameters {
        &self.params
    }

    /// Build a swap order as of `at`, in the unit of the scooper fee schedule.
    pub fn swap(&self, config: &SwapConfig, at: u64) -> Result<BuiltOrder> {
        let args = config.build_args(&self.params, at)?;
        let supplied = args.payload.supplied.clone();
        self.finish(&config.order, &args, &[&supplied], |codec| codec.build_swap_datum(&args))
    }

    pub fn deposit(&self, config: &DepositConfig, at: u64) -> Result<BuiltOrder> {
        let args = config.build_args(&self.params, at)?;
        let (a, b) = args.payload.assets.clone();
        self.finish(&config.order, &args, &[&a, &b], |codec| codec.build_deposit_datum(&args))
    }

    pub fn withdraw(&self, config: &WithdrawConfig, at: u64) -> Result<BuiltOrder> {
        let args = config.build_args(&self.params, at)?;
        let lp = args.payload.lp.clone();
        self.finish(&config.order, &args, &[&lp], |codec| codec.build_withdraw_datum(&args))
    }

    pub fn route(&self, config: &OrderRouteSwapConfig, at: u64) -> Result<RoutedSwap> {
        build_routed_swap(config, &self.params, at)
    }

    fn finish<P>(
        &self,
        config: &OrderConfig,
        args: &OrderArgs<P>,
        supplied: &[&AssetAmount],
        build: impl FnOnce(&DatumCodec) -> Result<DatumResult>,
    ) -> Result<BuiltOrder> {
        let version = config.pool()?.version;
        let datum = build(&DatumCodec::for_version(version))?;

        let referral = config.referral_fee.as_ref().map(referral_fee).transpose()?;
        let metadata = referral
            .as_ref()
            .and_then(referral_metadata)
            .unwrap_or_default();
        let fees = FeeSummary::new(
            order_deposit(&self.params, version),
            AssetAmount::lovelace(args.scooper_fee.clone()),
        )
        .with_referral(referral.map(|r| r.payment));

        let owner = match &config.owner_address {
            Some(owner) => parse_address(owner, self.params.network)?,
            None => args.addresses.destination.address.clone(),
        };
        Ok(BuiltOrder {
            version,
            order_address: self.params.order_address_for(version, &owner)?,
            order_value: order_value(supplied, &fees),
            datum,
            fees,
            metadata,
        })
    }
}

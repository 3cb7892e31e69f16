//! Order configurations.
//!
//! Configs are values: every `with_*` call returns a new config and leaves the receiver alone.
//! `validate` reports every problem at once instead of stopping at the first.
use std::fmt;

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::address::{parse_address, resolve, ParsedAddress};
use crate::datum::{DepositArgs, DepositPayload, OrderArgs, SwapArgs, SwapPayload, WithdrawArgs, WithdrawPayload};
use crate::error::{Result, SdkError};
use crate::fees::{current_scooper_fee, min_receivable, referral_fee};
use crate::models::{AssetAmount, Fraction, OrderAddresses, PoolData, ReferralFee};
use crate::params::ProtocolParameters;

/// Slippage tolerance used when a swap does not set one.
pub const DEFAULT_SLIPPAGE: Fraction = Fraction::new(3, 100);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SwapType {
    /// Minimum derived from the pool price and a slippage tolerance.
    Market { slippage: Fraction },
    /// Caller supplied minimum.
    #[serde(rename_all = "camelCase")]
    Limit { min_receivable: AssetAmount },
}

impl Default for SwapType {
    fn default() -> Self {
        SwapType::Market {
            slippage: DEFAULT_SLIPPAGE,
        }
    }
}

impl SwapType {
    /// Minimum output of supplying `supplied` to `pool`.
    pub fn min_receivable(&self, pool: &PoolData, supplied: &AssetAmount) -> Result<AssetAmount> {
        match self {
            SwapType::Market { slippage } => min_receivable(pool, supplied, *slippage),
            SwapType::Limit { min_receivable } => Ok(min_receivable.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    MissingPool,
    MissingOrderAddresses,
    MissingSuppliedAsset,
    ZeroAmount(String),
    AssetNotInPool { asset_id: String, ident: String },
    SlippageOutOfRange(String),
    LimitAssetMismatch { expected: String, got: String },
    LpAssetMismatch { expected: String, got: String },
    InvalidReferralFee(String),
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigViolation::MissingPool => write!(f, "no pool set; use with_pool()"),
            ConfigViolation::MissingOrderAddresses => {
                write!(f, "no order addresses set; use with_order_addresses()")
            }
            ConfigViolation::MissingSuppliedAsset => {
                write!(f, "no supplied asset set; use with_supplied_asset()")
            }
            ConfigViolation::ZeroAmount(asset) => write!(f, "supplied amount of {} is zero", asset),
            ConfigViolation::AssetNotInPool { asset_id, ident } => {
                write!(f, "asset {} is not part of pool {}", asset_id, ident)
            }
            ConfigViolation::SlippageOutOfRange(s) => write!(f, "slippage {} is outside [0, 1]", s),
            ConfigViolation::LimitAssetMismatch { expected, got } => {
                write!(f, "limit minimum is in {}, expected {}", got, expected)
            }
            ConfigViolation::LpAssetMismatch { expected, got } => {
                write!(f, "withdrawal supplies {}, pool LP token is {}", got, expected)
            }
            ConfigViolation::InvalidReferralFee(e) => write!(f, "invalid referral fee: {}", e),
        }
    }
}

fn into_error(violations: Vec<ConfigViolation>) -> SdkError {
    SdkError::Config(violations.iter().map(ToString::to_string).collect())
}

fn finish(violations: Vec<ConfigViolation>) -> std::result::Result<(), Vec<ConfigViolation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Settings every order kind carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderConfig {
    pub pool: Option<PoolData>,
    pub order_addresses: Option<OrderAddresses>,
    /// Owner recorded by V3 datums; the destination address when unset.
    pub owner_address: Option<String>,
    pub referral_fee: Option<ReferralFee>,
}

impl OrderConfig {
    fn check(&self, violations: &mut Vec<ConfigViolation>, needs_addresses: bool) {
        if self.pool.is_none() {
            violations.push(ConfigViolation::MissingPool);
        }
        if needs_addresses && self.order_addresses.is_none() {
            violations.push(ConfigViolation::MissingOrderAddresses);
        }
        if let Some(fee) = &self.referral_fee {
            if let Err(e) = referral_fee(fee) {
                violations.push(ConfigViolation::InvalidReferralFee(e.to_string()));
            }
        }
    }

    fn check_in_pool(&self, asset: &AssetAmount, violations: &mut Vec<ConfigViolation>) {
        if asset.is_zero() {
            violations.push(ConfigViolation::ZeroAmount(asset.metadata.asset_id.clone()));
        }
        if let Some(pool) = &self.pool {
            if pool.coin_of(&asset.metadata).is_err() {
                violations.push(ConfigViolation::AssetNotInPool {
                    asset_id: asset.metadata.asset_id.clone(),
                    ident: pool.ident.clone(),
                });
            }
        }
    }

    pub(crate) fn pool(&self) -> Result<&PoolData> {
        self.pool
            .as_ref()
            .ok_or_else(|| into_error(vec![ConfigViolation::MissingPool]))
    }

    /// Resolved addresses, owner and current scooper fee for the configured pool's version.
    fn order_args<P>(&self, params: &ProtocolParameters, at: u64, payload: P) -> Result<OrderArgs<P>> {
        let pool = self.pool()?;
        let addresses = self
            .order_addresses
            .as_ref()
            .ok_or_else(|| into_error(vec![ConfigViolation::MissingOrderAddresses]))?;
        let owner: Option<ParsedAddress> = self
            .owner_address
            .as_deref()
            .map(|a| parse_address(a, params.network))
            .transpose()?;
        Ok(OrderArgs {
            ident: pool.ident.clone(),
            addresses: resolve(addresses, params.network, pool.version)?,
            owner,
            scooper_fee: current_scooper_fee(&params.for_version(pool.version).scooper_fee, at)?,
            payload,
        })
    }
}

/// Builder methods shared by all order configs.
pub trait OrderConfigBuilder: Clone {
    fn order(&self) -> &OrderConfig;

    fn order_mut(&mut self) -> &mut OrderConfig;

    fn with_pool(&self, pool: PoolData) -> Self {
        let mut next = self.clone();
        next.order_mut().pool = Some(pool);
        next
    }

    fn with_order_addresses(&self, addresses: OrderAddresses) -> Self {
        let mut next = self.clone();
        next.order_mut().order_addresses = Some(addresses);
        next
    }

    fn with_owner_address(&self, owner: &str) -> Self {
        let mut next = self.clone();
        next.order_mut().owner_address = Some(owner.to_string());
        next
    }

    fn with_referral_fee(&self, fee: ReferralFee) -> Self {
        let mut next = self.clone();
        next.order_mut().referral_fee = Some(fee);
        next
    }
}

fn check_slippage(swap_type: &SwapType, violations: &mut Vec<ConfigViolation>) {
    if let SwapType::Market { slippage } = swap_type {
        let in_range = slippage
            .to_rational()
            .map(|s| s <= BigRational::one())
            .unwrap_or(false);
        if !in_range {
            violations.push(ConfigViolation::SlippageOutOfRange(format!(
                "{}/{}",
                slippage.numerator, slippage.denominator
            )));
        }
    }
}

fn check_limit(swap_type: &SwapType, pool: Option<&PoolData>, supplied: &AssetAmount, violations: &mut Vec<ConfigViolation>) {
    let (SwapType::Limit { min_receivable }, Some(pool)) = (swap_type, pool) else {
        return;
    };
    if let Ok(coin) = pool.coin_of(&supplied.metadata) {
        let expected = pool.opposite(coin);
        if !expected.same_asset(&min_receivable.metadata) {
            violations.push(ConfigViolation::LimitAssetMismatch {
                expected: expected.asset_id.clone(),
                got: min_receivable.metadata.asset_id.clone(),
            });
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapConfig {
    pub order: OrderConfig,
    pub supplied: Option<AssetAmount>,
    pub swap_type: SwapType,
}

impl OrderConfigBuilder for SwapConfig {
    fn order(&self) -> &OrderConfig {
        &self.order
    }

    fn order_mut(&mut self) -> &mut OrderConfig {
        &mut self.order
    }
}

impl SwapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supplied_asset(&self, supplied: AssetAmount) -> Self {
        Self {
            supplied: Some(supplied),
            ..self.clone()
        }
    }

    pub fn with_swap_type(&self, swap_type: SwapType) -> Self {
        Self {
            swap_type,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<ConfigViolation>> {
        let mut violations = Vec::new();
        self.order.check(&mut violations, true);
        match &self.supplied {
            Some(supplied) => {
                self.order.check_in_pool(supplied, &mut violations);
                check_limit(&self.swap_type, self.order.pool.as_ref(), supplied, &mut violations);
            }
            None => violations.push(ConfigViolation::MissingSuppliedAsset),
        }
        check_slippage(&self.swap_type, &mut violations);
        finish(violations)
    }

    pub fn build_args(&self, params: &ProtocolParameters, at: u64) -> Result<SwapArgs> {
        self.validate().map_err(into_error)?;
        let pool = self.order.pool()?;
        let supplied = self
            .supplied
            .clone()
            .ok_or_else(|| into_error(vec![ConfigViolation::MissingSuppliedAsset]))?;
        let min = self.swap_type.min_receivable(pool, &supplied)?;
        self.order.order_args(
            params,
            at,
            SwapPayload {
                pool_assets: (pool.asset_a.clone(), pool.asset_b.clone()),
                supplied,
                min_receivable: Some(min),
            },
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepositConfig {
    pub order: OrderConfig,
    pub supplied: Option<(AssetAmount, AssetAmount)>,
}

impl OrderConfigBuilder for DepositConfig {
    fn order(&self) -> &OrderConfig {
        &self.order
    }

    fn order_mut(&mut self) -> &mut OrderConfig {
        &mut self.order
    }
}

impl DepositConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supplied_assets(&self, a: AssetAmount, b: AssetAmount) -> Self {
        Self {
            supplied: Some((a, b)),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<ConfigViolation>> {
        let mut violations = Vec::new();
        self.order.check(&mut violations, true);
        match &self.supplied {
            Some((a, b)) => {
                self.order.check_in_pool(a, &mut violations);
                self.order.check_in_pool(b, &mut violations);
            }
            None => violations.push(ConfigViolation::MissingSuppliedAsset),
        }
        finish(violations)
    }

    pub fn build_args(&self, params: &ProtocolParameters, at: u64) -> Result<DepositArgs> {
        self.validate().map_err(into_error)?;
        let assets = self
            .supplied
            .clone()
            .ok_or_else(|| into_error(vec![ConfigViolation::MissingSuppliedAsset]))?;
        self.order.order_args(params, at, DepositPayload { assets })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawConfig {
    pub order: OrderConfig,
    pub supplied_lp: Option<AssetAmount>,
}

impl OrderConfigBuilder for WithdrawConfig {
    fn order(&self) -> &OrderConfig {
        &self.order
    }

    fn order_mut(&mut self) -> &mut OrderConfig {
        &mut self.order
    }
}

impl WithdrawConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supplied_lp(&self, lp: AssetAmount) -> Self {
        Self {
            supplied_lp: Some(lp),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<ConfigViolation>> {
        let mut violations = Vec::new();
        self.order.check(&mut violations, true);
        match (&self.supplied_lp, &self.order.pool) {
            (None, _) => violations.push(ConfigViolation::MissingSuppliedAsset),
            (Some(lp), pool) => {
                if lp.is_zero() {
                    violations.push(ConfigViolation::ZeroAmount(lp.metadata.asset_id.clone()));
                }
                if let Some(pool) = pool {
                    if !lp.metadata.same_asset(&pool.asset_lp) {
                        violations.push(ConfigViolation::LpAssetMismatch {
                            expected: pool.asset_lp.asset_id.clone(),
                            got: lp.metadata.asset_id.clone(),
                        });
                    }
                }
            }
        }
        finish(violations)
    }

    pub fn build_args(&self, params: &ProtocolParameters, at: u64) -> Result<WithdrawArgs> {
        self.validate().map_err(into_error)?;
        let lp = self
            .supplied_lp
            .clone()
            .ok_or_else(|| into_error(vec![ConfigViolation::MissingSuppliedAsset]))?;
        self.order.order_args(params, at, WithdrawPayload { lp })
    }
}

/// One pool of a routed swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub pool: PoolData,
    #[serde(default)]
    pub swap_type: SwapType,
}

/// Two chained swaps: `swap_a` receives into the protocol, `swap_b` pays out to the
/// order addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderRouteSwapConfig {
    pub swap_a: Option<RouteLeg>,
    pub swap_b: Option<RouteLeg>,
    pub supplied: Option<AssetAmount>,
    pub order_addresses: Option<OrderAddresses>,
    pub owner_address: Option<String>,
    pub referral_fee: Option<ReferralFee>,
}

impl OrderRouteSwapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_swap_a(&self, leg: RouteLeg) -> Self {
        Self {
            swap_a: Some(leg),
            ..self.clone()
        }
    }

    pub fn with_swap_b(&self, leg: RouteLeg) -> Self {
        Self {
            swap_b: Some(leg),
            ..self.clone()
        }
    }

    pub fn with_supplied_asset(&self, supplied: AssetAmount) -> Self {
        Self {
            supplied: Some(supplied),
            ..self.clone()
        }
    }

    pub fn with_order_addresses(&self, addresses: OrderAddresses) -> Self {
        Self {
            order_addresses: Some(addresses),
            ..self.clone()
        }
    }

    pub fn with_owner_address(&self, owner: &str) -> Self {
        Self {
            owner_address: Some(owner.to_string()),
            ..self.clone()
        }
    }

    pub fn with_referral_fee(&self, fee: ReferralFee) -> Self {
        Self {
            referral_fee: Some(fee),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<ConfigViolation>> {
        let mut violations = Vec::new();
        if self.swap_a.is_none() || self.swap_b.is_none() {
            violations.push(ConfigViolation::MissingPool);
        }
        if self.order_addresses.is_none() {
            violations.push(ConfigViolation::MissingOrderAddresses);
        }
        if let Some(fee) = &self.referral_fee {
            if let Err(e) = referral_fee(fee) {
                violations.push(ConfigViolation::InvalidReferralFee(e.to_string()));
            }
        }
        for leg in self.swap_a.iter().chain(self.swap_b.iter()) {
            check_slippage(&leg.swap_type, &mut violations);
        }
        let Some(supplied) = &self.supplied else {
            violations.push(ConfigViolation::MissingSuppliedAsset);
            return finish(violations);
        };
        if supplied.is_zero() {
            violations.push(ConfigViolation::ZeroAmount(supplied.metadata.asset_id.clone()));
        }
        if let Some(a) = &self.swap_a {
            match a.pool.coin_of(&supplied.metadata) {
                Ok(coin) => {
                    check_limit(&a.swap_type, Some(&a.pool), supplied, &mut violations);
                    let intermediate = a.pool.opposite(coin);
                    if let Some(b) = &self.swap_b {
                        if b.pool.coin_of(intermediate).is_err() {
                            violations.push(ConfigViolation::AssetNotInPool {
                                asset_id: intermediate.asset_id.clone(),
                                ident: b.pool.ident.clone(),
                            });
                        } else if let SwapType::Limit { .. } = b.swap_type {
                            let sample = AssetAmount::new(BigUint::one(), intermediate.clone());
                            check_limit(&b.swap_type, Some(&b.pool), &sample, &mut violations);
                        }
                    }
                }
                Err(_) => violations.push(ConfigViolation::AssetNotInPool {
                    asset_id: supplied.metadata.asset_id.clone(),
                    ident: a.pool.ident.clone(),
                }),
            }
        }
        finish(violations)
    }

    /// Validated legs and supplied amount.
    pub fn legs(&self) -> Result<(&RouteLeg, &RouteLeg, &AssetAmount, &OrderAddresses)> {
        self.validate().map_err(into_error)?;
        match (&self.swap_a, &self.swap_b, &self.supplied, &self.order_addresses) {
            (Some(a), Some(b), Some(s), Some(o)) => Ok((a, b, s, o)),
            _ => Err(into_error(vec![ConfigViolation::MissingPool])),
        }
    }
}

//! Scooper fee schedules, referral fees, fee aggregation and slippage protection.
//!
//! All arithmetic is exact: fee ratios and pool prices are `BigRational`s and only the final
//! integer amount is rounded.
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};
use crate::metadata::{Metadatum, TransactionMetadata};
use crate::models::{
    AssetAmount, AssetMetadata, CalculatedReferralFee, ContractVersion, FeeSummary, Fraction,
    PoolData, ReferralFee,
};
use crate::params::ProtocolParameters;

/// Transaction metadata label for human readable messages (CIP-20).
pub const REFERRAL_METADATA_LABEL: u64 = 674;

/// A fee moving linearly from `start_fee` to `end_fee` between two instants.
///
/// Instants are opaque: slots or POSIX milliseconds, as long as callers query with the same unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub start_fee: Fraction,
    pub end_fee: Fraction,
    pub start_time: u64,
    pub end_time: u64,
}

impl FeeSchedule {
    pub fn new(start_fee: Fraction, end_fee: Fraction, start_time: u64, end_time: u64) -> Result<Self> {
        let schedule = Self {
            start_fee,
            end_fee,
            start_time,
            end_time,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// A schedule that never changes.
    pub fn fixed(amount: u64) -> Self {
        Self {
            start_fee: Fraction::whole(amount),
            end_fee: Fraction::whole(amount),
            start_time: 0,
            end_time: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.start_fee.to_rational()?;
        self.end_fee.to_rational()?;
        if self.end_time < self.start_time {
            return Err(SdkError::InvalidFeeSchedule(format!(
                "end time {} is before start time {}",
                self.end_time, self.start_time
            )));
        }
        Ok(())
    }
}

/// Exact fee ratio in effect at `at`.
pub fn current_fee_ratio(schedule: &FeeSchedule, at: u64) -> Result<BigRational> {
    schedule.validate()?;
    let start = schedule.start_fee.to_rational()?;
    let end = schedule.end_fee.to_rational()?;
    if at <= schedule.start_time {
        return Ok(start);
    }
    if at >= schedule.end_time {
        return Ok(end);
    }
    let elapsed = BigRational::new(
        BigInt::from(at - schedule.start_time),
        BigInt::from(schedule.end_time - schedule.start_time),
    );
    let fee = &start + (&end - &start) * elapsed;
    log::trace!(
        "fee at {} within [{}, {}]: {}",
        at,
        schedule.start_time,
        schedule.end_time,
        fee
    );
    Ok(fee)
}

/// Scooper fee in lovelace at `at`, rounded down.
pub fn current_scooper_fee(schedule: &FeeSchedule, at: u64) -> Result<BigUint> {
    floor_to_uint(&current_fee_ratio(schedule, at)?)
}

/// Upper bound for the scooper fee when the processing time is not known yet.
pub fn max_scooper_fee(schedule: &FeeSchedule) -> Result<BigUint> {
    schedule.validate()?;
    let start = schedule.start_fee.to_rational()?;
    let end = schedule.end_fee.to_rational()?;
    floor_to_uint(if start > end { &start } else { &end })
}

fn floor_to_uint(value: &BigRational) -> Result<BigUint> {
    value
        .floor()
        .to_integer()
        .to_biguint()
        .ok_or_else(|| SdkError::InvalidFeeSchedule(format!("fee {} is negative", value)))
}

/// Parse a user supplied fee quantity. Only plain non-negative integers are accepted.
pub fn parse_fee_amount(raw: &str, metadata: AssetMetadata) -> Result<AssetAmount> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SdkError::InvalidFeeAmount {
            detail: format!("'{}' is not a non-negative integer", raw),
        });
    }
    let amount = trimmed
        .parse::<BigUint>()
        .map_err(|e| SdkError::InvalidFeeAmount {
            detail: format!("'{}': {}", raw, e),
        })?;
    Ok(AssetAmount::new(amount, metadata))
}

/// Validates a referral request and passes its payment through unchanged.
pub fn referral_fee(fee: &ReferralFee) -> Result<CalculatedReferralFee> {
    if fee.destination.trim().is_empty() {
        return Err(SdkError::InvalidFeeAmount {
            detail: "referral destination is empty".to_string(),
        });
    }
    fee.payment
        .metadata
        .asset_class()
        .map_err(|e| SdkError::InvalidFeeAmount {
            detail: e.to_string(),
        })?;
    Ok(CalculatedReferralFee {
        destination: fee.destination.clone(),
        payment: fee.payment.clone(),
        fee_label: fee.fee_label.clone(),
    })
}

/// Label 674 message describing a labelled referral fee, e.g. `"Test Label: 1.5 ADA"`.
pub fn referral_metadata(fee: &CalculatedReferralFee) -> Option<TransactionMetadata> {
    let label = fee.fee_label.as_ref()?;
    let text = format!(
        "{}: {} {}",
        label,
        fee.payment.display_value(),
        fee.payment.metadata.display_name()
    );
    let mut metadata = TransactionMetadata::new();
    metadata.insert(REFERRAL_METADATA_LABEL, Metadatum::text(&text));
    Some(metadata)
}

/// Deposit locked by an order of `version`.
pub fn order_deposit(params: &ProtocolParameters, version: ContractVersion) -> AssetAmount {
    params.for_version(version).order_deposit()
}

/// Combines the fees of the legs of one order.
///
/// Deposits and scooper fees add up. Liquidity and referral fees are only kept when exactly one
/// leg carries them. Ledger fees add up when known.
pub fn aggregate(legs: &[FeeSummary]) -> Result<FeeSummary> {
    let mut total = FeeSummary::new(AssetAmount::lovelace(0u64), AssetAmount::lovelace(0u64));
    for leg in legs {
        total.deposit = add_amounts(&total.deposit, &leg.deposit, "deposit")?;
        total.scooper_fee = add_amounts(&total.scooper_fee, &leg.scooper_fee, "scooper fee")?;
        total.cardano_tx_fee = match (&total.cardano_tx_fee, &leg.cardano_tx_fee) {
            (Some(a), Some(b)) => Some(add_amounts(a, b, "ledger fee")?),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
    }
    total.liquidity = exactly_one(legs.iter().map(|l| l.liquidity.as_ref()));
    total.referral = exactly_one(legs.iter().map(|l| l.referral.as_ref()));
    Ok(total)
}

fn add_amounts(a: &AssetAmount, b: &AssetAmount, what: &str) -> Result<AssetAmount> {
    a.checked_add(b).ok_or_else(|| SdkError::InvalidFeeAmount {
        detail: format!(
            "cannot add {} in {} to {}",
            what, b.metadata.asset_id, a.metadata.asset_id
        ),
    })
}

fn exactly_one<'a>(mut amounts: impl Iterator<Item = Option<&'a AssetAmount>>) -> Option<AssetAmount> {
    let mut present = amounts.by_ref().flatten();
    let first = present.next()?;
    match present.next() {
        Some(_) => None,
        None => Some(first.clone()),
    }
}

/// Constant product output of supplying `supplied` to `pool`, after the pool fee, rounded down.
pub fn expected_output(pool: &PoolData, supplied: &AssetAmount) -> Result<AssetAmount> {
    let coin = pool.coin_of(&supplied.metadata)?;
    let (reserve_in, reserve_out) = pool.reserves_for(coin);
    let fee = pool.current_fee.to_rational()?;
    let one = BigRational::one();
    if fee > one {
        return Err(SdkError::InvalidFeeSchedule(format!("pool fee {} exceeds 1", fee)));
    }
    let input = BigRational::from_integer(BigInt::from(supplied.amount.clone())) * (one - fee);
    let denominator = BigRational::from_integer(BigInt::from(reserve_in.clone())) + &input;
    let received = pool.opposite(coin).clone();
    if denominator.is_zero() {
        return Ok(AssetAmount::zero(received));
    }
    let out = BigRational::from_integer(BigInt::from(reserve_out.clone())) * input / denominator;
    Ok(AssetAmount::new(floor_to_uint(&out)?, received))
}

/// Smallest acceptable output for a market order with the given slippage tolerance.
pub fn min_receivable(pool: &PoolData, supplied: &AssetAmount, slippage: Fraction) -> Result<AssetAmount> {
    let tolerance = slippage.to_rational()?;
    if tolerance.is_negative() || tolerance > BigRational::one() {
        return Err(SdkError::InvalidFeeSchedule(format!(
            "slippage {} is outside [0, 1]",
            tolerance
        )));
    }
    let expected = expected_output(pool, supplied)?;
    let min = BigRational::from_integer(BigInt::from(expected.amount.clone()))
        * (BigRational::one() - tolerance);
    let min = min
        .ceil()
        .to_integer()
        .to_biguint()
        .unwrap_or_else(BigUint::zero);
    Ok(expected.with_amount(min))
}

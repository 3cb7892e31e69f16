//! # sundae-orders
//!
//! Builds SundaeSwap V1 and V3 order datums for Cardano: address resolution, the scooper/referral
//! fee engine, Plutus data encoding with blake2b-256 hashing, and two-leg routed swaps. Pool data
//! can be queried from Kupo.
//!
//! ## Versions
//!
//! | Version | Ident | Inline datum | Owner | Routing continuation |
//! |---------|-------|--------------|-------|----------------------|
//! | V1 | <= 8 hex chars | No | Payment credentials | Datum hash + metadata label 103251 |
//! | V3 | <= 56 hex chars | Yes | Staking key (payment key fallback) | Inline datum |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sundae_orders::{
//!     AssetAmount, DestinationAddress, KupoApi, KupoQueryProvider, OrderAddresses, OrderBuilder,
//!     OrderConfigBuilder, ProtocolParameters, QueryProvider, SwapConfig,
//! };
//! use sundae_orders::models::ContractVersion;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let params = ProtocolParameters::preview();
//!     let provider = KupoQueryProvider::new(KupoApi::new("http://localhost:1442")?, params.clone());
//!     let pool = provider
//!         .find_pool_data("8bf66e915c450ad94866abb02802821b599e32f43536a42470b21ea2", ContractVersion::V3)
//!         .await?;
//!
//!     let config = SwapConfig::new()
//!         .with_pool(pool)
//!         .with_order_addresses(OrderAddresses::new(DestinationAddress::without_datum("addr_test1...")))
//!         .with_supplied_asset(AssetAmount::lovelace(20_000_000u64));
//!     let order = OrderBuilder::new(params).swap(&config, 0)?;
//!     println!("{} -> {}", order.order_address, order.datum.inline);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Build a swap, deposit or withdraw order from a JSON request
//! cargo run --release -- build request.json
//!
//! # Build a routed swap
//! cargo run --release -- route route.json
//!
//! # Current scooper fee and order deposit of a contract version
//! cargo run --release -- fee --version v3
//!
//! # Decode a datum
//! cargo run --release -- decode d8799f...
//!
//! # Look up a pool through Kupo
//! cargo run --release -- pool --kupo http://localhost:1442 --version v1 06
//! ```

pub mod address;
pub mod config;
pub mod datum;
pub mod error;
pub mod fees;
pub mod kupo;
pub mod metadata;
pub mod models;
pub mod orders;
pub mod params;
pub mod provider;
pub mod router;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::{
    DepositConfig, OrderConfigBuilder, OrderRouteSwapConfig, RouteLeg, SwapConfig, SwapType,
    WithdrawConfig,
};
pub use datum::cbor::PlutusData;
pub use datum::{DatumBuilder, DatumCodec, DatumResult};
pub use error::{SdkError, INVALID_POOL_IDENT, V1_INLINE_DATUM_UNSUPPORTED};
pub use kupo::KupoApi;
pub use models::{
    AssetAmount, AssetMetadata, DatumPolicy, DestinationAddress, FeeSummary, Fraction,
    OrderAddresses, PoolData, ReferralFee,
};
pub use orders::{BuiltOrder, OrderBuilder};
pub use params::{Network, ProtocolParameters};
pub use provider::{KupoQueryProvider, QueryProvider};
pub use router::{build_routed_swap, RoutedSwap};

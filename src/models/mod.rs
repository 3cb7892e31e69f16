pub mod address;
pub mod asset;
pub mod fees;
pub mod pool;
pub mod utxo;

pub use address::{DatumPolicy, DestinationAddress, OrderAddresses};
pub use asset::{token_identifier, token_name, Asset, AssetAmount, AssetMetadata, Token};
pub use fees::{CalculatedReferralFee, FeeSummary, Fraction, ReferralFee};
pub use pool::{ContractVersion, PoolCoin, PoolData, PoolLiquidity};
pub use utxo::{Unit, Utxo};

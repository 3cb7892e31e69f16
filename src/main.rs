use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::json;

use sundae_orders::datum::cbor::blake2b_256_hex;
use sundae_orders::fees::{current_scooper_fee, max_scooper_fee, order_deposit};
use sundae_orders::metadata::TransactionMetadata;
use sundae_orders::models::{AssetAmount, ContractVersion, OrderAddresses, PoolData, ReferralFee};
use sundae_orders::{
    DepositConfig, KupoApi, KupoQueryProvider, OrderBuilder, OrderConfigBuilder,
    OrderRouteSwapConfig, PlutusData, ProtocolParameters, QueryProvider, RouteLeg, SwapConfig,
    SwapType, WithdrawConfig,
};

/// SundaeSwap order datum builder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "sundae-orders")]
struct Cli {
    /// Protocol parameters JSON file (preview defaults when absent)
    #[arg(long, global = true, env = "SUNDAE_PARAMS")]
    params: Option<PathBuf>,

    /// Instant the scooper fee is evaluated at, in the schedule's unit (defaults to now, in ms)
    #[arg(long, global = true)]
    at: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a swap, deposit or withdraw order from a JSON request
    Build { request: PathBuf },
    /// Build a two-leg routed swap from a JSON request
    Route { request: PathBuf },
    /// Show the scooper fee and order deposit of a contract version
    Fee {
        #[arg(long, value_enum)]
        version: Version,
    },
    /// Decode a hex CBOR datum to JSON
    Decode { cbor: String },
    /// Look up a pool through Kupo
    Pool {
        #[arg(long, env = "KUPO_URL")]
        kupo: String,
        #[arg(long, value_enum)]
        version: Version,
        ident: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Version {
    V1,
    V3,
}

impl From<Version> for ContractVersion {
    fn from(v: Version) -> Self {
        match v {
            Version::V1 => ContractVersion::V1,
            Version::V3 => ContractVersion::V3,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonRequest {
    pool: PoolData,
    order_addresses: OrderAddresses,
    #[serde(default)]
    owner_address: Option<String>,
    #[serde(default)]
    referral_fee: Option<ReferralFee>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum OrderRequest {
    #[serde(rename_all = "camelCase")]
    Swap {
        #[serde(flatten)]
        common: CommonRequest,
        supplied: AssetAmount,
        #[serde(default)]
        swap_type: SwapType,
    },
    Deposit {
        #[serde(flatten)]
        common: CommonRequest,
        assets: (AssetAmount, AssetAmount),
    },
    Withdraw {
        #[serde(flatten)]
        common: CommonRequest,
        lp: AssetAmount,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteRequest {
    swap_a: RouteLeg,
    swap_b: RouteLeg,
    supplied: AssetAmount,
    order_addresses: OrderAddresses,
    #[serde(default)]
    owner_address: Option<String>,
    #[serde(default)]
    referral_fee: Option<ReferralFee>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))
}

fn now_ms() -> Result<u64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_millis() as u64)
}

fn apply_common<C: OrderConfigBuilder>(config: C, common: CommonRequest) -> C {
    let mut config = config
        .with_pool(common.pool)
        .with_order_addresses(common.order_addresses);
    if let Some(owner) = common.owner_address {
        config = config.with_owner_address(&owner);
    }
    if let Some(fee) = common.referral_fee {
        config = config.with_referral_fee(fee);
    }
    config
}

fn with_metadata(mut value: serde_json::Value, metadata: &TransactionMetadata) -> Result<serde_json::Value> {
    if !metadata.is_empty() {
        value["metadata"] = metadata.to_json()?;
    }
    Ok(value)
}

fn build(builder: &OrderBuilder, request: OrderRequest, at: u64) -> Result<serde_json::Value> {
    let order = match request {
        OrderRequest::Swap { common, supplied, swap_type } => {
            let config = apply_common(SwapConfig::new(), common)
                .with_supplied_asset(supplied)
                .with_swap_type(swap_type);
            builder.swap(&config, at)?
        }
        OrderRequest::Deposit { common, assets: (a, b) } => {
            let config = apply_common(DepositConfig::new(), common).with_supplied_assets(a, b);
            builder.deposit(&config, at)?
        }
        OrderRequest::Withdraw { common, lp } => {
            let config = apply_common(WithdrawConfig::new(), common).with_supplied_lp(lp);
            builder.withdraw(&config, at)?
        }
    };
    log::info!("built {} order with datum hash {}", order.version, order.datum.hash);
    with_metadata(serde_json::to_value(&order)?, &order.metadata)
}

fn route(builder: &OrderBuilder, request: RouteRequest, at: u64) -> Result<serde_json::Value> {
    let mut config = OrderRouteSwapConfig::new()
        .with_swap_a(request.swap_a)
        .with_swap_b(request.swap_b)
        .with_supplied_asset(request.supplied)
        .with_order_addresses(request.order_addresses);
    if let Some(owner) = request.owner_address {
        config = config.with_owner_address(&owner);
    }
    if let Some(fee) = request.referral_fee {
        config = config.with_referral_fee(fee);
    }
    let routed = builder.route(&config, at)?;
    log::info!("built routed swap, leg A datum hash {}", routed.datum.hash);
    with_metadata(serde_json::to_value(&routed)?, &routed.metadata)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let params = match &cli.params {
        Some(path) => ProtocolParameters::from_file(path)?,
        None => ProtocolParameters::preview(),
    };
    let at = match cli.at {
        Some(at) => at,
        None => now_ms()?,
    };
    let builder = OrderBuilder::new(params.clone());

    let output = match cli.command {
        Command::Build { request } => build(&builder, read_json(&request)?, at)?,
        Command::Route { request } => route(&builder, read_json(&request)?, at)?,
        Command::Fee { version } => {
            let version = ContractVersion::from(version);
            let schedule = &params.for_version(version).scooper_fee;
            json!({
                "version": version,
                "scooperFee": current_scooper_fee(schedule, at)?.to_string(),
                "maxScooperFee": max_scooper_fee(schedule)?.to_string(),
                "deposit": order_deposit(&params, version),
            })
        }
        Command::Decode { cbor } => {
            let data = PlutusData::from_cbor_hex(&cbor)?;
            json!({ "hash": blake2b_256_hex(&hex::decode(&cbor)?), "datum": data.to_json() })
        }
        Command::Pool { kupo, version, ident } => {
            let provider = KupoQueryProvider::new(KupoApi::new(&kupo)?, params);
            let pool = provider.find_pool_data(&ident, version.into()).await?;
            eprintln!("Found pool {}", pool.uuid());
            serde_json::to_value(&pool)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

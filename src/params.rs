use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::address::{build_address, parse_address, ParsedAddress};
use crate::fees::FeeSchedule;
use crate::models::{AssetAmount, ContractVersion};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Preview,
}

impl Network {
    /// Human readable part of payment addresses.
    pub fn address_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "addr",
            Network::Preview => "addr_test",
        }
    }

    /// Network id carried in the low nibble of an address header.
    pub fn network_id(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Preview => 0,
        }
    }

    pub fn slot_config(&self) -> SlotConfig {
        match self {
            Network::Mainnet => SlotConfig {
                zero_time: 1_596_059_091_000,
                zero_slot: 4_492_800,
                slot_length: 1000,
            },
            Network::Preview => SlotConfig {
                zero_time: 1_666_656_000_000,
                zero_slot: 0,
                slot_length: 1000,
            },
        }
    }
}

impl std::str::FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "preview" => Ok(Network::Preview),
            other => Err(anyhow!("unknown network '{}'", other)),
        }
    }
}

/// Shelley-era slot clock of a network. Times are POSIX milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConfig {
    pub zero_time: u64,
    pub zero_slot: u64,
    pub slot_length: u64,
}

impl SlotConfig {
    /// Saturates at `u64::MAX` for slots far past the clock's range.
    pub fn slot_to_unix_ms(&self, slot: u64) -> u64 {
        let elapsed = slot.saturating_sub(self.zero_slot).saturating_mul(self.slot_length);
        self.zero_time.saturating_add(elapsed)
    }

    pub fn unix_ms_to_slot(&self, unix_ms: u64) -> u64 {
        let elapsed = unix_ms.saturating_sub(self.zero_time) / self.slot_length.max(1);
        self.zero_slot.saturating_add(elapsed)
    }
}

/// Settings of one deployed contract version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionParameters {
    pub scooper_fee: FeeSchedule,
    /// Lovelace locked with every order and returned on settlement.
    pub order_deposit: u64,
    /// Address orders are sent to and that the scoopers process from.
    pub order_address: String,
}

impl VersionParameters {
    pub fn order_deposit(&self) -> AssetAmount {
        AssetAmount::lovelace(self.order_deposit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParameters {
    pub network: Network,
    pub v1: VersionParameters,
    pub v3: VersionParameters,
}

pub const PREVIEW_V1_ESCROW_ADDRESS: &str =
    "addr_test1wpesulg5dtt5y73r4zzay9qmy3wnlrxdg944xg4rzuvewls7nrsf0";
pub const PREVIEW_V3_ORDER_ADDRESS: &str =
    "addr_test1wpyyj6wexm6gf3zlzs7ez8upvdh7jfgy3cs9qj8wrljp92su9hpfe";

impl ProtocolParameters {
    /// Preview testnet deployment.
    pub fn preview() -> Self {
        Self {
            network: Network::Preview,
            v1: VersionParameters {
                scooper_fee: FeeSchedule::fixed(2_500_000),
                order_deposit: 2_000_000,
                order_address: PREVIEW_V1_ESCROW_ADDRESS.to_string(),
            },
            v3: VersionParameters {
                scooper_fee: FeeSchedule::fixed(1_000_000),
                order_deposit: 2_000_000,
                order_address: PREVIEW_V3_ORDER_ADDRESS.to_string(),
            },
        }
    }

    pub fn for_version(&self, version: ContractVersion) -> &VersionParameters {
        match version {
            ContractVersion::V1 => &self.v1,
            ContractVersion::V3 => &self.v3,
        }
    }

    /// Address an order of `version` is sent to. V3 orders carry the owner's staking
    /// credential on the order script; V1 orders go to the escrow address unchanged.
    pub fn order_address_for(
        &self,
        version: ContractVersion,
        owner: &ParsedAddress,
    ) -> crate::error::Result<String> {
        let order_address = &self.for_version(version).order_address;
        match version {
            ContractVersion::V1 => Ok(order_address.clone()),
            ContractVersion::V3 => {
                let script = parse_address(order_address, self.network)?;
                build_address(self.network, &script.payment, owner.stake.as_ref())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow!("Failed to open parameters file {}: {}", path.display(), e))?;
        let params: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow!("Failed to parse parameters file {}: {}", path.display(), e))?;
        for version in [ContractVersion::V1, ContractVersion::V3] {
            params.for_version(version).scooper_fee.validate()?;
        }
        Ok(params)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| anyhow!("Failed to create parameters file {}: {}", path.display(), e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| anyhow!("Failed to write parameters to {}: {}", path.display(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fraction;

    #[test]
    fn test_slot_conversion() {
        let preview = Network::Preview.slot_config();
        assert_eq!(preview.slot_to_unix_ms(0), 1_666_656_000_000);
        assert_eq!(preview.unix_ms_to_slot(1_666_656_010_999), 10);

        let mainnet = Network::Mainnet.slot_config();
        assert_eq!(mainnet.slot_to_unix_ms(4_492_800), 1_596_059_091_000);
        let slot = 100_000_000;
        assert_eq!(mainnet.unix_ms_to_slot(mainnet.slot_to_unix_ms(slot)), slot);
    }

    #[test]
    fn test_slot_conversion_saturates() {
        let preview = Network::Preview.slot_config();
        assert_eq!(preview.slot_to_unix_ms(u64::MAX), u64::MAX);
        assert_eq!(preview.slot_to_unix_ms(u64::MAX / 1000 + 1), u64::MAX);
        let mainnet = Network::Mainnet.slot_config();
        assert_eq!(
            mainnet.unix_ms_to_slot(u64::MAX),
            4_492_800 + (u64::MAX - 1_596_059_091_000) / 1000
        );
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("Preview".parse::<Network>().unwrap(), Network::Preview);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("preprod".parse::<Network>().is_err());
    }

    #[test]
    fn test_params_file_round_trip() {
        let mut params = ProtocolParameters::preview();
        params.v3.scooper_fee =
            FeeSchedule::new(Fraction::whole(2_000_000), Fraction::whole(1_000_000), 10, 20).unwrap();
        let path = std::env::temp_dir().join(format!("sundae-params-{}.json", std::process::id()));
        params.to_file(&path).unwrap();
        let loaded = ProtocolParameters::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_order_address_for_owner() {
        let params = ProtocolParameters::preview();
        let owner = parse_address(crate::testing::CURRENT_ADDRESS, Network::Preview).unwrap();
        assert_eq!(
            params.order_address_for(ContractVersion::V1, &owner).unwrap(),
            PREVIEW_V1_ESCROW_ADDRESS
        );
        let v3 = parse_address(&params.order_address_for(ContractVersion::V3, &owner).unwrap(), Network::Preview)
            .unwrap();
        assert_eq!(v3.payment.hash_hex(), "484969d936f484c45f143d911f81636fe925048e205048ee1fe412aa");
        assert_eq!(v3.stake, owner.stake);
    }

    #[test]
    fn test_params_file_rejects_bad_schedule() {
        let path = std::env::temp_dir().join(format!("sundae-bad-{}.json", std::process::id()));
        let mut json = serde_json::to_value(ProtocolParameters::preview()).unwrap();
        json["v1"]["scooperFee"]["endFee"] = serde_json::json!([1, 0]);
        std::fs::write(&path, json.to_string()).unwrap();
        let err = ProtocolParameters::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("zero denominator"));
    }
}

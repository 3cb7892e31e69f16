use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub unit: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: String,
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Q {
        Str(String),
        Num(u64),
    }
    let q = Q::deserialize(deserializer)?;
    Ok(match q {
        Q::Str(s) => s,
        Q::Num(n) => n.to_string(),
    })
}

/// An unspent output as reported by Kupo, flattened into units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<Unit>,
    pub data_hash: Option<String>,
}

impl Utxo {
    pub fn get_asset(&self, unit: &str) -> Option<&Unit> {
        self.amount.iter().find(|u| u.unit == unit)
    }
}

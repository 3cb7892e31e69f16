use anyhow::{anyhow, Result};

use crate::models::{Unit, Utxo};

pub struct KupoApi {
    api_url: String,
    client: reqwest::Client,
}

fn quantity(v: Option<&serde_json::Value>) -> String {
    match v {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// Flatten one Kupo match into a [`Utxo`]; lovelace comes first.
fn utxo_from_match(v: &serde_json::Value) -> Utxo {
    let text = |key: &str| v.get(key).and_then(|a| a.as_str()).unwrap_or_default().to_string();
    let value = v.get("value").unwrap_or(&serde_json::Value::Null);

    let mut amount = vec![Unit {
        unit: "lovelace".to_string(),
        quantity: quantity(value.get("coins")),
    }];
    if let Some(assets) = value.get("assets").and_then(|a| a.as_object()) {
        for (unit, qty) in assets {
            amount.push(Unit {
                unit: unit.replace('.', ""),
                quantity: quantity(Some(qty)),
            });
        }
    }

    Utxo {
        address: text("address"),
        tx_hash: text("transaction_id"),
        output_index: v.get("output_index").and_then(|a| a.as_u64()).unwrap_or(0) as u32,
        amount,
        data_hash: v.get("datum_hash").and_then(|d| d.as_str()).map(String::from),
    }
}

impl KupoApi {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self::with_client(api_url, client))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
        }
    }

    fn build_matches_url(&self, match_pattern: &str, unspent: bool) -> String {
        let base = format!("{}/matches/{}", self.api_url, match_pattern);
        if unspent {
            format!("{}?unspent", base)
        } else {
            base
        }
    }

    fn build_datum_url(&self, hash: &str) -> String {
        format!("{}/datums/{}", self.api_url, hash)
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("rate_limited"));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Outputs matching a Kupo pattern: an address, `policy.*` or `policy.name`.
    pub async fn get(&self, match_pattern: &str, unspent: bool) -> Result<Vec<Utxo>> {
        let url = self.build_matches_url(match_pattern, unspent);
        crate::utils::retry(5, 500, || async {
            let parsed = self.fetch_json(&url).await?;
            Ok(match parsed.as_array() {
                Some(arr) => arr.iter().map(utxo_from_match).collect(),
                None => vec![utxo_from_match(&parsed)],
            })
        })
        .await
    }

    /// Hex CBOR of the datum with `hash`.
    pub async fn datum(&self, hash: &str) -> Result<String> {
        let url = self.build_datum_url(hash);
        crate::utils::retry(5, 500, || async {
            let response = self.fetch_json(&url).await?;
            let datum = response
                .get("datum")
                .and_then(|d| d.as_str())
                .ok_or_else(|| anyhow!("No datum found for {}", hash))?;
            Ok(datum.to_string())
        })
        .await
    }
}

pub fn remove_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url[..url.len() - 1].to_string()
    } else {
        url.to_string()
    }
}

/// Serde helpers for arbitrary-precision quantities. Written as decimal strings, read from
/// either strings or JSON numbers.
pub mod quantity {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Q {
            Str(String),
            Num(u64),
        }
        match Q::deserialize(deserializer)? {
            Q::Str(s) => s.trim().parse::<BigUint>().map_err(serde::de::Error::custom),
            Q::Num(n) => Ok(BigUint::from(n)),
        }
    }
}

pub async fn retry<T, E, F, Fut>(mut retries: u32, base_delay_ms: u64, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries == 0 => return Err(e),
            Err(e) => {
                // Exponential backoff: base_delay * 2^attempt, capped at 30s
                let delay = (base_delay_ms * (1u64 << attempt.min(5))).min(30_000);
                log::warn!("attempt {} failed ({:?}), retrying in {}ms", attempt + 1, e, delay);
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                retries -= 1;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapped {
        #[serde(with = "quantity")]
        q: BigUint,
    }

    #[test]
    fn test_quantity_accepts_strings_and_numbers() {
        let a: Wrapped = serde_json::from_str(r#"{"q":"340282366920938463463374607431768211456"}"#).unwrap();
        assert_eq!(a.q.to_string(), "340282366920938463463374607431768211456");
        let b: Wrapped = serde_json::from_str(r#"{"q":20000000}"#).unwrap();
        assert_eq!(b.q, BigUint::from(20_000_000u64));
        assert_eq!(serde_json::to_string(&b).unwrap(), r#"{"q":"20000000"}"#);
    }

    #[test]
    fn test_quantity_rejects_negative_and_fractional() {
        assert!(serde_json::from_str::<Wrapped>(r#"{"q":"-5"}"#).is_err());
        assert!(serde_json::from_str::<Wrapped>(r#"{"q":"1.5"}"#).is_err());
        assert!(serde_json::from_str::<Wrapped>(r#"{"q":-5}"#).is_err());
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(remove_trailing_slash("http://kupo:1442/"), "http://kupo:1442");
        assert_eq!(remove_trailing_slash("http://kupo:1442"), "http://kupo:1442");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_last_attempt() {
        let mut calls = 0;
        let result: Result<(), &str> = retry(2, 1, || {
            calls += 1;
            async { Err("down") }
        })
        .await;
        assert_eq!(result, Err("down"));
        assert_eq!(calls, 3);
    }
}

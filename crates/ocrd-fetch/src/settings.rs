use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction parameters for the HTTP client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSetting {
    /// Proxy URLs; `https://` proxies serve https requests, the rest http.
    pub proxies: Vec<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl ClientSetting {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Split proxies into `(https, http)`.
    pub fn partition_proxies(&self) -> (Vec<&str>, Vec<&str>) {
        self.proxies
            .iter()
            .map(String::as_str)
            .partition(|url| url.starts_with("https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxies_are_partitioned_by_scheme() {
        let setting = ClientSetting {
            proxies: vec![
                "https://secure.proxy:443".into(),
                "http://plain.proxy:8080".into(),
            ],
            ..Default::default()
        };
        let (secure, insecure) = setting.partition_proxies();
        assert_eq!(secure, vec!["https://secure.proxy:443"]);
        assert_eq!(insecure, vec!["http://plain.proxy:8080"]);
    }

    #[test]
    fn timeout_is_optional() {
        assert_eq!(ClientSetting::default().timeout(), None);
        let setting = ClientSetting {
            timeout_secs: Some(3),
            ..Default::default()
        };
        assert_eq!(setting.timeout(), Some(Duration::from_secs(3)));
    }
}

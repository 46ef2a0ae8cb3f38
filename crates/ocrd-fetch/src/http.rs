use crate::error::Result;

/// Blocking HTTP client abstraction.
///
/// This trait provides the minimal interface the resolver needs: fetch the
/// complete body of a URL or fail.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - [`crate::MockHttpClient`]: In-memory responses for tests
pub trait HttpClient: Send + Sync {
    /// Fetch the response body of `url`.
    ///
    /// # Errors
    ///
    /// - [`crate::FetchError::NotFound`] for a 404 response
    /// - [`crate::FetchError::Status`] for any other non-success status
    /// - [`crate::FetchError::Transport`] for DNS, connection and body read
    ///   failures
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        (**self).get(url)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::error::FetchError;
    use crate::settings::ClientSetting;
    use reqwest::StatusCode;
    use reqwest::blocking::{Client, ClientBuilder};
    use tracing::debug;

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self> {
            Self::from_setting(&ClientSetting::default())
        }

        pub fn from_setting(setting: &ClientSetting) -> Result<Self> {
            let mut cb: ClientBuilder = Client::builder();

            let (secure, insecure) = setting.partition_proxies();
            for url in secure {
                cb = cb.proxy(reqwest::Proxy::https(url).map_err(|e| FetchError::Proxy {
                    url: url.to_string(),
                    message: e.to_string(),
                })?);
            }
            for url in insecure {
                cb = cb.proxy(reqwest::Proxy::http(url).map_err(|e| FetchError::Proxy {
                    url: url.to_string(),
                    message: e.to_string(),
                })?);
            }

            if let Some(timeout) = setting.timeout() {
                cb = cb.timeout(timeout);
            }
            if let Some(user_agent) = &setting.user_agent {
                cb = cb.user_agent(user_agent.clone());
            }

            let client = cb.build().map_err(|e| FetchError::ClientBuild(e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        fn get(&self, url: &str) -> Result<Vec<u8>> {
            debug!(url, "GET");
            let response = self.client.get(url).send().map_err(|e| {
                if e.is_builder() {
                    FetchError::InvalidUrl(url.to_string())
                } else {
                    FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

            match response.status() {
                StatusCode::NOT_FOUND => Err(FetchError::NotFound { url: url.to_string() }),
                status if !status.is_success() => Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                }),
                _ => {
                    let body = response.bytes().map_err(|e| FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;
                    Ok(body.to_vec())
                }
            }
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;

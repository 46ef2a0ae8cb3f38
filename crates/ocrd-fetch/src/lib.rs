//! Blocking HTTP fetching for remote workspace resources.
//!
//! The resolver only needs "give me the bytes behind this URL, or tell me
//! why not". [`HttpClient`] is that seam; [`ReqwestClient`] is the
//! production implementation and [`MockHttpClient`] serves canned responses
//! in tests.

mod error;
mod http;
mod mock;
mod settings;

pub use error::{FetchError, Result};
pub use http::HttpClient;
pub use mock::MockHttpClient;
pub use settings::ClientSetting;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;

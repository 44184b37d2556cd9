//! Host APIs for network access.
//!
//! - [`http`] - The [`HttpTransport`](http::HttpTransport) seam and its reqwest client
//! - `scripted` - A scripted in-memory transport (tests and the `test-util` feature)

pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

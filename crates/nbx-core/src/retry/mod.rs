//! Retry and backoff policy.
//!
//! Error classification (timeouts, throttling, connection failures) and
//! exponential backoff decisions shared by the tarball downloader.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

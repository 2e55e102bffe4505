//! Google Analytics Admin API access.
//!
//! - `client`: authenticated REST handle over the v1alpha endpoints
//! - `error`: remote failure classification
//! - `retry`: bounded exponential backoff for transient failures
//! - `translate`: user-facing messages per failure kind

pub mod client;
pub mod error;
pub mod retry;
pub mod translate;

pub use client::{AdminClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ErrorKind};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES};
pub use translate::{friendly_message, message_for, translate, INIT_COMMAND};

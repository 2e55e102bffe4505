//! Per-invocation state handed to every command handler.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ga_cli_core::api::{AdminClient, ApiError, RetryPolicy};
use ga_cli_core::auth::ClientSession;
use ga_cli_core::config::CredentialStore;
use tracing::{debug, error};

use crate::error::{CliError, CliResult};

pub struct CommandContext {
    store: CredentialStore,
    session: Option<ClientSession>,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl CommandContext {
    pub fn new(
        store: CredentialStore,
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            session: None,
            base_url: base_url.into(),
            timeout,
            retry,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Bind the session to a specific credential file, replacing any
    /// session built from the configured path.
    pub fn use_credentials(&mut self, path: PathBuf) {
        self.session = Some(ClientSession::new(Some(path)).with_base_url(self.base_url.clone()));
    }

    fn session(&mut self) -> CliResult<&mut ClientSession> {
        if self.session.is_none() {
            let path = self.store.get_path()?;
            debug!(credentials = ?path, "Resolved credentials path");
            self.session = Some(ClientSession::new(path).with_base_url(self.base_url.clone()));
        }
        self.session
            .as_mut()
            .ok_or_else(|| CliError::failure(anyhow::anyhow!("client session unavailable")))
    }

    /// Run one remote operation with the shared client and the retry policy.
    ///
    /// Failures that survive retries are logged with their raw detail and
    /// returned as `CliError`s, which render the user-facing message.
    pub async fn call<T, F, Fut>(&mut self, label: &str, mut operation: F) -> CliResult<T>
    where
        F: FnMut(Arc<AdminClient>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let timeout = self.timeout;
        let client = self.session()?.get_client(timeout)?;

        debug!(operation = label, "Executing API call");
        self.retry
            .run(label, || operation(Arc::clone(&client)))
            .await
            .map_err(|err| {
                match err.kind() {
                    Some(kind) => error!(operation = label, kind = %kind, error = %err, "API call failed"),
                    None => error!(operation = label, error = %err, "Unexpected API error"),
                }
                CliError::from(err)
            })
    }
}

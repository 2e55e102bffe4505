use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::{AdminClient, DEFAULT_BASE_URL};

use super::{AuthError, Credentials};

/// Per-request timeout used when the caller has no preference
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Lazily built, cached Admin API handle for one command invocation.
///
/// The handle is created on the first `get_client` call and reused until the
/// session is cleared. The credential path is fixed at construction, so a
/// cached handle never outlives the credentials it was built from.
#[derive(Debug)]
pub struct ClientSession {
    credentials_path: Option<PathBuf>,
    base_url: String,
    client: Option<Arc<AdminClient>>,
}

impl ClientSession {
    /// Create a session. No I/O happens until a client is requested.
    pub fn new(credentials_path: Option<PathBuf>) -> Self {
        Self {
            credentials_path,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn credentials_path(&self) -> Option<&Path> {
        self.credentials_path.as_deref()
    }

    /// Get the cached client, building it on first use.
    ///
    /// `timeout` only applies when the client is built; later calls return
    /// the same handle whatever timeout they pass.
    pub fn get_client(&mut self, timeout: Duration) -> Result<Arc<AdminClient>, AuthError> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }

        let credentials = match &self.credentials_path {
            Some(path) => Credentials::from_file(path)?,
            None => Credentials::discover()?,
        };
        debug!(
            source = %credentials.source().display(),
            identity = %credentials.identity(),
            timeout_secs = timeout.as_secs(),
            "Building Admin API client"
        );

        let client = Arc::new(AdminClient::new(credentials, self.base_url.clone(), timeout)?);
        self.client = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Acquire the client for a block of work. The cached client is released
    /// when the guard drops, so the next use builds a fresh one.
    pub fn scoped(&mut self, timeout: Duration) -> Result<ScopedClient<'_>, AuthError> {
        let client = self.get_client(timeout)?;
        Ok(ScopedClient {
            session: self,
            client,
        })
    }

    /// Drop the cached client so the next request builds a fresh one
    pub fn clear(&mut self) {
        if self.client.take().is_some() {
            debug!("Released Admin API client");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

/// Guard returned by [`ClientSession::scoped`].
pub struct ScopedClient<'a> {
    session: &'a mut ClientSession,
    client: Arc<AdminClient>,
}

impl ScopedClient<'_> {
    pub fn client(&self) -> Arc<AdminClient> {
        Arc::clone(&self.client)
    }
}

impl Deref for ScopedClient<'_> {
    type Target = AdminClient;

    fn deref(&self) -> &AdminClient {
        &self.client
    }
}

impl Drop for ScopedClient<'_> {
    fn drop(&mut self) {
        self.session.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::tests::{write_authorized_user, EnvGuard};
    use crate::auth::CREDENTIALS_ENV;
    use tempfile::TempDir;

    fn session_with_credentials(dir: &TempDir) -> ClientSession {
        let path = write_authorized_user(dir, "http://127.0.0.1:1/token");
        ClientSession::new(Some(path))
    }

    #[test]
    fn test_new_does_no_io() {
        let session = ClientSession::new(Some(PathBuf::from("/missing/creds.json")));
        assert!(!session.is_connected());
        assert_eq!(
            session.credentials_path(),
            Some(Path::new("/missing/creds.json"))
        );
    }

    #[test]
    fn test_client_is_cached_across_timeouts() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_credentials(&dir);

        let first = session.get_client(DEFAULT_TIMEOUT).unwrap();
        let second = session.get_client(Duration::from_secs(5)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(session.is_connected());
    }

    #[test]
    fn test_clear_forces_rebuild() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_credentials(&dir);

        let first = session.get_client(DEFAULT_TIMEOUT).unwrap();
        session.clear();
        assert!(!session.is_connected());

        let second = session.get_client(DEFAULT_TIMEOUT).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_scope_exit_releases_client() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_credentials(&dir);

        let cached = session.get_client(DEFAULT_TIMEOUT).unwrap();
        let first = {
            let scope = session.scoped(DEFAULT_TIMEOUT).unwrap();
            assert!(Arc::ptr_eq(&scope.client(), &cached));
            scope.client()
        };
        assert!(!session.is_connected());

        let second = session.get_client(DEFAULT_TIMEOUT).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_scope_entry_builds_client() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with_credentials(&dir);

        {
            let scope = session.scoped(DEFAULT_TIMEOUT).unwrap();
            assert!(format!("{:?}", *scope).contains("client-123"));
        }
        assert!(!session.is_connected());
    }

    #[test]
    fn test_scope_entry_reports_bad_credentials() {
        let mut session = ClientSession::new(Some(PathBuf::from("/missing/creds.json")));
        let err = session.scoped(DEFAULT_TIMEOUT).err().unwrap();
        assert!(matches!(err, AuthError::Read { .. }));
    }

    #[test]
    fn test_without_path_uses_ambient_credentials() {
        let dir = TempDir::new().unwrap();
        let path = write_authorized_user(&dir, "http://127.0.0.1:1/token");
        let env = EnvGuard::new(&[CREDENTIALS_ENV, "CLOUDSDK_CONFIG"]);
        env.set(CREDENTIALS_ENV, &path);

        let mut session = ClientSession::new(None);
        let first = session.get_client(DEFAULT_TIMEOUT).unwrap();
        let second = session.get_client(DEFAULT_TIMEOUT).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(format!("{:?}", first).contains(&path.display().to_string()));
    }

    #[test]
    fn test_without_path_or_ambient_credentials() {
        let dir = TempDir::new().unwrap();
        let env = EnvGuard::new(&[CREDENTIALS_ENV, "CLOUDSDK_CONFIG"]);
        env.set("CLOUDSDK_CONFIG", dir.path());

        let mut session = ClientSession::new(None);
        let err = session.get_client(DEFAULT_TIMEOUT).unwrap_err();

        assert!(matches!(err, AuthError::NoCredentials));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_invalid_credential_file_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not-credentials.json");
        std::fs::write(&path, r#"{"hello": "world"}"#).unwrap();

        let mut session = ClientSession::new(Some(path));
        let err = session.get_client(DEFAULT_TIMEOUT).unwrap_err();

        assert!(matches!(err, AuthError::Parse { .. }));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_missing_credential_file_is_auth_error() {
        let mut session = ClientSession::new(Some(PathBuf::from("/missing/creds.json")));
        let err = session.get_client(DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, AuthError::Read { .. }));
    }
}

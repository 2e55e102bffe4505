//! Persisted configuration and credential path management.
//!
//! The configuration record holds the path to the credential file used to
//! authenticate against the Admin API. It is stored as TOML at
//! `~/.ga-cli/config.toml`:
//!
//! ```toml
//! [auth]
//! credentials_path = "/home/me/keys/analytics.json"
//! ```
//!
//! The directory is kept at mode 700 and the file at mode 600 after every
//! write, regardless of how loose the referenced credential file is.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Directory under the user's home holding config and logs
pub const APP_DIR: &str = ".ga-cli";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

const AUTH_SECTION: &str = "auth";
const CREDENTIALS_KEY: &str = "credentials_path";

#[cfg(unix)]
const DIR_MODE: u32 = 0o700;
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Rejection of a credential path before it is persisted.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Credentials file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Credentials path is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Could not inspect credentials file {}: {source}", path.display())]
    Inspect { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Advisory findings about a credential file. These never block usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialWarning {
    /// Group or other users can read or write the file
    Exposed { path: PathBuf, mode: u32 },
    /// The file belongs to a different user
    NotOwned { path: PathBuf, owner: u32 },
}

impl fmt::Display for CredentialWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exposed { path, mode } => write!(
                f,
                "Credentials file is accessible by other users (mode {:o}). Consider running: chmod 600 {}",
                mode,
                path.display()
            ),
            Self::NotOwned { path, owner } => write!(
                f,
                "Credentials file {} is not owned by current user (owner uid {})",
                path.display(),
                owner
            ),
        }
    }
}

/// Resolves, validates and persists the credential path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    config_dir: PathBuf,
    override_path: Option<PathBuf>,
}

impl CredentialStore {
    /// Create a store rooted at an explicit config directory
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            override_path: None,
        }
    }

    /// Create a store at the per-user location `~/.ga-cli`
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::new(home.join(APP_DIR)))
    }

    /// Set an explicit per-invocation override (e.g. a `--credentials` flag).
    /// Empty values are ignored.
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn override_path(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }

    /// Credential path to use for this invocation: the override if present,
    /// otherwise the persisted value.
    pub fn get_path(&self) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(path) = &self.override_path {
            return Ok(Some(path.clone()));
        }
        self.persisted_path()
    }

    /// Credential path stored in the configuration record, ignoring overrides
    pub fn persisted_path(&self) -> Result<Option<PathBuf>, ConfigError> {
        Ok(self
            .get(AUTH_SECTION, CREDENTIALS_KEY, None)?
            .filter(|value| !value.is_empty())
            .map(PathBuf::from))
    }

    /// Validate `path` and persist it as the configured credential file.
    ///
    /// A missing file is an error and leaves the configuration untouched.
    /// Loose permissions or foreign ownership are reported as warnings.
    pub fn set_path(&self, path: &Path) -> Result<Vec<CredentialWarning>, ValidationError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ValidationError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ValidationError::Inspect {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(path.to_path_buf()));
        }

        let warnings = inspect_credentials(path, &metadata);
        for warning in &warnings {
            warn!("{}", warning);
        }

        let mut sections = self.load()?;
        sections
            .entry(AUTH_SECTION.to_string())
            .or_default()
            .insert(
                CREDENTIALS_KEY.to_string(),
                path.to_string_lossy().into_owned(),
            );
        self.save(&sections)?;

        debug!(path = %path.display(), "Stored credentials path");
        Ok(warnings)
    }

    /// Read a single value. Always re-reads the file so external edits are seen.
    pub fn get(
        &self,
        section: &str,
        key: &str,
        fallback: Option<&str>,
    ) -> Result<Option<String>, ConfigError> {
        let sections = self.load()?;
        Ok(sections
            .get(section)
            .and_then(|values| values.get(key))
            .cloned()
            .or_else(|| fallback.map(str::to_string)))
    }

    fn load(&self) -> Result<Sections, ConfigError> {
        let path = self.config_file();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Sections::new()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    fn save(&self, sections: &Sections) -> Result<(), ConfigError> {
        self.ensure_config_dir()?;

        let path = self.config_file();
        let contents = toml::to_string(sections)?;

        // Readers never see a partially written record.
        let staging = path.with_extension("toml.tmp");
        write_private(&staging, &contents).map_err(|source| ConfigError::Write {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
        restrict_permissions(&path, false)
    }

    fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        ensure_private_dir(&self.config_dir)
    }
}

/// Write `contents` to a fresh file that only the current user can read
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Create `dir` if needed and restrict it to the current user
pub(crate) fn ensure_private_dir(dir: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    restrict_permissions(dir, true)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, is_dir: bool) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = if is_dir { DIR_MODE } else { FILE_MODE };
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|source| {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _is_dir: bool) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn inspect_credentials(path: &Path, metadata: &fs::Metadata) -> Vec<CredentialWarning> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let mut warnings = Vec::new();

    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o066 != 0 {
        warnings.push(CredentialWarning::Exposed {
            path: path.to_path_buf(),
            mode,
        });
    }

    let owner = metadata.uid();
    if owner != nix::unistd::Uid::current().as_raw() {
        warnings.push(CredentialWarning::NotOwned {
            path: path.to_path_buf(),
            owner,
        });
    }

    warnings
}

#[cfg(not(unix))]
fn inspect_credentials(_path: &Path, _metadata: &fs::Metadata) -> Vec<CredentialWarning> {
    Vec::new()
}

// ============================================================================
// Tests
// ============================================================================

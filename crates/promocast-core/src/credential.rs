use crate::error::CredentialError;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// An API key. Trimmed on construction and redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` when `raw` is blank after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// A source of API keys consulted before every remote call.
pub trait CredentialProvider: Send + Sync {
    fn name(&self) -> &str;
    fn api_key(&self) -> Result<Option<ApiKey>, CredentialError>;
}

/// In-memory tier; lives as long as the process.
#[derive(Default)]
pub struct SessionCache {
    key: RwLock<Option<ApiKey>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: ApiKey) {
        if let Ok(mut slot) = self.key.write() {
            *slot = Some(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.key.write() {
            *slot = None;
        }
    }
}

impl CredentialProvider for SessionCache {
    fn name(&self) -> &str {
        "session"
    }

    fn api_key(&self) -> Result<Option<ApiKey>, CredentialError> {
        Ok(self.key.read().ok().and_then(|slot| slot.clone()))
    }
}

/// Durable tier: a single-line file holding the key.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, key: &ApiKey) -> Result<(), CredentialError> {
        let write_err = |source: std::io::Error| CredentialError::StoreWrite {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // Only applies when the file is created
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        file.write_all(key.expose().as_bytes()).map_err(write_err)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialError::StoreWrite {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}

impl CredentialProvider for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn api_key(&self) -> Result<Option<ApiKey>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(ApiKey::new(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialError::StoreRead {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}

/// Read-only tier backed by an environment variable.
pub struct EnvProvider {
    var: String,
}

impl EnvProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn api_key(&self) -> Result<Option<ApiKey>, CredentialError> {
        Ok(std::env::var(&self.var).ok().and_then(|v| ApiKey::new(&v)))
    }
}

/// Layered lookup: session cache, then durable store, then environment.
pub struct Credentials {
    session: SessionCache,
    durable: FileStore,
    env: Option<EnvProvider>,
}

impl Credentials {
    pub fn new(durable: FileStore, env: Option<EnvProvider>) -> Self {
        Self {
            session: SessionCache::new(),
            durable,
            env,
        }
    }

    /// Stores `raw` in the session and durable tiers. Blank input is ignored
    /// and reported as `Ok(false)`.
    pub fn set(&self, raw: &str) -> Result<bool, CredentialError> {
        let Some(key) = ApiKey::new(raw) else {
            return Ok(false);
        };
        self.durable.store(&key)?;
        self.session.set(key);
        tracing::info!(store = %self.durable.path().display(), "API key saved");
        Ok(true)
    }

    pub fn get(&self) -> Result<Option<ApiKey>, CredentialError> {
        if let Some(key) = self.session.api_key()? {
            return Ok(Some(key));
        }
        if let Some(key) = self.durable.api_key()? {
            self.session.set(key.clone());
            return Ok(Some(key));
        }
        match &self.env {
            Some(env) => env.api_key(),
            None => Ok(None),
        }
    }

    pub fn has(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }

    /// Clears the session and durable tiers. The environment is left alone.
    pub fn clear(&self) -> Result<(), CredentialError> {
        self.session.clear();
        self.durable.clear()?;
        tracing::info!("API key cleared");
        Ok(())
    }
}

impl CredentialProvider for Credentials {
    fn name(&self) -> &str {
        "layered"
    }

    fn api_key(&self) -> Result<Option<ApiKey>, CredentialError> {
        self.get()
    }
}

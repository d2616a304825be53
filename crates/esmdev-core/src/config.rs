use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional configuration file in the project root.
pub const CONFIG_FILE: &str = "esmdev.json";

/// Dev server configuration.
///
/// Constructed once at startup and handed to [`crate::DevServer`]; nothing in
/// the request path reads configuration from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DevConfig {
    /// Project root. Request paths are resolved against it.
    pub root: PathBuf,

    /// Dependency store holding installed packages (relative to `root` unless absolute).
    pub deps_dir: PathBuf,

    /// Entry HTML document served at `/` (relative to `root` unless absolute).
    pub entry: PathBuf,

    /// Environment name exposed to the browser as `process.env.NODE_ENV`.
    pub mode: String,

    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            deps_dir: PathBuf::from("node_modules"),
            entry: PathBuf::from("index.html"),
            mode: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl DevConfig {
    /// Create a config rooted at the given directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    /// Load `esmdev.json` (or an explicit config file) and root it at `root`.
    ///
    /// A missing auto-discovered file yields the defaults. An explicitly named
    /// file must exist.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, Error> {
        let path = match explicit {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => root.join(p),
            None => {
                let candidate = root.join(CONFIG_FILE);
                if !candidate.exists() {
                    return Ok(Self::new(root.to_path_buf()));
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&text).map_err(|source| Error::ConfigParse { path, source })?;
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Absolute location of the dependency store.
    #[must_use]
    pub fn deps_path(&self) -> PathBuf {
        self.root.join(&self.deps_dir)
    }

    /// Absolute location of the entry document.
    #[must_use]
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry)
    }

    #[must_use]
    pub fn with_deps_dir(mut self, deps_dir: PathBuf) -> Self {
        self.deps_dir = deps_dir;
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry: PathBuf) -> Self {
        self.entry = entry;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

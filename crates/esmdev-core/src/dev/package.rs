//! Serving packages from the dependency store at `/@modules/<name>`.
//!
//! The package's manifest must name its ES module entry in the `module`
//! field. There is no fallback to `main` or `exports`: a browser cannot run
//! CommonJS, so a package without an ESM entry is a resolution failure.

use crate::dev::read_source;
use crate::dev::rewrite::{rewrite_imports, MODULES_PREFIX};
use crate::error::Error;
use esmdev_util::fs::join_within;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// The subset of `package.json` the resolver reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    /// ES module entry, relative to the manifest's directory.
    pub module: Option<String>,
}

/// Resolves `/@modules/<name>` requests against the dependency store.
#[derive(Debug, Clone)]
pub struct PackageResolver {
    deps_dir: PathBuf,
}

impl PackageResolver {
    #[must_use]
    pub fn new(deps_dir: PathBuf) -> Self {
        Self { deps_dir }
    }

    /// Locate the ES module entry file of package `name`.
    pub async fn resolve_entry(&self, name: &str) -> Result<PathBuf, Error> {
        let package_root = join_within(&self.deps_dir, name)
            .ok_or_else(|| Error::resolution(name, "invalid package name"))?;

        let manifest_path = package_root.join("package.json");
        let text = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::resolution(name, "package.json not found"));
            }
            Err(e) => return Err(Error::from_read(&manifest_path, e)),
        };

        let manifest: PackageManifest = serde_json::from_str(&text)
            .map_err(|e| Error::resolution(name, format!("invalid package.json: {e}")))?;
        let module = manifest
            .module
            .ok_or_else(|| Error::resolution(name, "package.json has no \"module\" field"))?;

        join_within(&package_root, &module).ok_or_else(|| {
            Error::resolution(name, format!("\"module\" field points outside the package: {module}"))
        })
    }

    /// Load the entry of package `name` with its own bare imports rewritten.
    ///
    /// Nested packages are not inlined: their imports become further
    /// `/@modules/` requests.
    pub async fn load(&self, name: &str) -> Result<String, Error> {
        let entry = self.resolve_entry(name).await?;
        debug!(package = name, entry = %entry.display(), "resolved package entry");

        let source = read_source(&entry).await?;
        rewrite_imports(&source, &entry.display().to_string())
    }

    /// Load the package addressed by a `/@modules/<name>` request path.
    pub async fn load_request(&self, request_path: &str) -> Result<String, Error> {
        let name = request_path
            .strip_prefix(MODULES_PREFIX)
            .ok_or_else(|| Error::resolution(request_path, "not a /@modules/ path"))?;
        self.load(name).await
    }
}

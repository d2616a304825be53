//! Parsed component descriptors shared between the two compilation phases.
//!
//! Entries are keyed by file path and carry the fingerprint of the source they
//! were parsed from. A lookup with a different fingerprint reparses and
//! replaces the entry, so an edited file is never served from a stale parse.

use super::descriptor::{parse_descriptor, SfcDescriptor};
use crate::error::Error;
use esmdev_util::hash::fingerprint;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

#[derive(Debug, Clone)]
struct Entry {
    fingerprint: String,
    descriptor: Arc<SfcDescriptor>,
}

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub descriptor: Arc<SfcDescriptor>,
    pub fingerprint: String,
    /// Whether the descriptor came from the cache.
    pub hit: bool,
}

#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<PathBuf, Entry>>,
    /// Fingerprint of the source whose logic module was last served, per file.
    served: RwLock<HashMap<PathBuf, String>>,
}

impl DescriptorCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor for `source`, parsing it unless the cached entry matches.
    pub fn descriptor(&self, file: &Path, source: &str) -> Result<Lookup, Error> {
        let fp = fingerprint(source.as_bytes());

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(file) {
                if entry.fingerprint == fp {
                    trace!(file = %file.display(), "descriptor cache hit");
                    return Ok(Lookup {
                        descriptor: Arc::clone(&entry.descriptor),
                        fingerprint: fp,
                        hit: true,
                    });
                }
            }
        }

        let descriptor = Arc::new(parse_descriptor(source, &file.display().to_string())?);
        trace!(file = %file.display(), "descriptor cache miss");

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            file.to_path_buf(),
            Entry {
                fingerprint: fp.clone(),
                descriptor: Arc::clone(&descriptor),
            },
        );

        Ok(Lookup {
            descriptor,
            fingerprint: fp,
            hit: false,
        })
    }

    /// Record that the logic module for `file` was built from source `fp`.
    pub fn mark_script_served(&self, file: &Path, fp: &str) {
        let mut served = self.served.write().unwrap_or_else(PoisonError::into_inner);
        served.insert(file.to_path_buf(), fp.to_string());
    }

    /// Whether the template being compiled from source `fp` differs from the
    /// source the logic module was served from.
    ///
    /// Files whose logic module was never served are not considered skewed.
    #[must_use]
    pub fn is_skewed(&self, file: &Path, fp: &str) -> bool {
        let served = self.served.read().unwrap_or_else(PoisonError::into_inner);
        served.get(file).is_some_and(|served_fp| served_fp != fp)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

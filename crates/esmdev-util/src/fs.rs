use std::path::{Component, Path, PathBuf};

/// Join a URL-style path (`/src/main.js`, `vue`, `@vue/shared`) onto a base directory.
///
/// Returns `None` when the path would escape `base`: parent (`..`) segments,
/// drive prefixes, or an empty path. Leading and repeated `/` are ignored.
#[must_use]
pub fn join_within(base: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = url_path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let mut joined = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if joined == base {
        return None;
    }
    Some(joined)
}

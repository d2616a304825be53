//! On-demand ES module dev server.
//!
//! Each request is matched against an ordered route table and served by one
//! transform, read fresh from disk:
//!
//! ```text
//! GET /                       → entry document + env shim      (text/html)
//! GET /<path>.js              → import rewrite                 (application/javascript)
//! GET /@modules/<name>        → package entry + import rewrite (application/javascript)
//! GET /<path>.vue             → component logic module         (application/javascript)
//! GET /<path>.vue?type=template → component render module      (application/javascript)
//! GET /<path>.css             → style-injecting module         (application/javascript)
//! ```
//!
//! The first matching route wins, so `/@modules/chart.js` is served as a
//! project script, not as a package.

pub mod entry;
pub mod package;
pub mod rewrite;
pub mod stylesheet;

pub use entry::inject_env_shim;
pub use package::PackageResolver;
pub use rewrite::{rewrite_imports, MODULES_PREFIX};
pub use stylesheet::wrap_stylesheet;

use crate::config::DevConfig;
use crate::error::Error;
use crate::sfc::{ComponentCompiler, TEMPLATE_QUERY};
use esmdev_util::fs::join_within;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

pub const JS_CONTENT_TYPE: &str = "application/javascript";
pub const HTML_CONTENT_TYPE: &str = "text/html";
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Read a source file as text. A missing file is a resolution error.
pub(crate) async fn read_source(path: &Path) -> Result<String, Error> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::from_read(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// An incoming request: URL path plus decoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Request {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Build a request from a path-and-query string such as `/App.vue?type=template`.
    ///
    /// Dot segments are normalized away the same way a browser would.
    #[must_use]
    pub fn from_uri(uri: &str) -> Self {
        let parsed = Url::parse("http://localhost/").and_then(|base| base.join(uri));
        match parsed {
            Ok(url) => Self {
                path: url.path().to_string(),
                query: url.query_pairs().into_owned().collect(),
            },
            Err(_) => Self::new(uri.split('?').next().unwrap_or(uri)),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// A response body with its status and content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ModuleResponse {
    #[must_use]
    pub fn js(body: String) -> Self {
        Self {
            status: 200,
            content_type: JS_CONTENT_TYPE,
            body,
        }
    }

    #[must_use]
    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: HTML_CONTENT_TYPE,
            body,
        }
    }

    #[must_use]
    pub fn text(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: TEXT_CONTENT_TYPE,
            body,
        }
    }

    /// Error response. Module routes answer with a script that reports the
    /// failure in the browser console; everything else gets plain text.
    #[must_use]
    pub fn error(route: Option<Route>, error: &Error) -> Self {
        let status = error.status();
        match route {
            Some(route) if route.serves_module() && !matches!(error, Error::RouteNotFound { .. }) => {
                let message = crate::js::string_literal(&format!("[esmdev] {error}"));
                Self {
                    status,
                    content_type: JS_CONTENT_TYPE,
                    body: format!("console.error({message});\n"),
                }
            }
            _ => Self::text(status, format!("{error}\n")),
        }
    }
}

/// Dispatcher routes, in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Entry,
    Script,
    Package,
    Component,
    Stylesheet,
}

impl Route {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Route::Entry => "entry",
            Route::Script => "script",
            Route::Package => "package",
            Route::Component => "component",
            Route::Stylesheet => "stylesheet",
        }
    }

    /// Whether the route answers with a JavaScript module.
    #[must_use]
    pub fn serves_module(self) -> bool {
        !matches!(self, Route::Entry)
    }
}

fn is_entry(path: &str) -> bool {
    path == "/"
}

fn is_script(path: &str) -> bool {
    path.ends_with(".js")
}

fn is_package(path: &str) -> bool {
    path.starts_with(MODULES_PREFIX)
}

fn is_component(path: &str) -> bool {
    path.contains(".vue")
}

fn is_stylesheet(path: &str) -> bool {
    path.ends_with(".css")
}

const ROUTES: &[(Route, fn(&str) -> bool)] = &[
    (Route::Entry, is_entry),
    (Route::Script, is_script),
    (Route::Package, is_package),
    (Route::Component, is_component),
    (Route::Stylesheet, is_stylesheet),
];

/// The first route whose predicate accepts `path`.
#[must_use]
pub fn route_for(path: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(_, matches)| matches(path))
        .map(|(route, _)| *route)
}

/// The request dispatcher. Holds configuration and the component compiler's
/// descriptor cache; everything else is read per request.
#[derive(Debug)]
pub struct DevServer {
    config: DevConfig,
    packages: PackageResolver,
    components: ComponentCompiler,
}

impl DevServer {
    #[must_use]
    pub fn new(config: DevConfig) -> Self {
        let packages = PackageResolver::new(config.deps_path());
        Self {
            config,
            packages,
            components: ComponentCompiler::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    #[must_use]
    pub fn components(&self) -> &ComponentCompiler {
        &self.components
    }

    /// Serve `request`, mapping any failure to an error response.
    pub async fn respond(&self, request: &Request) -> ModuleResponse {
        match self.handle(request).await {
            Ok(response) => response,
            Err(error) => {
                let route = route_for(&request.path);
                if error.status() >= 500 {
                    warn!(path = %request.path, kind = error.kind(), "{error}");
                } else {
                    debug!(path = %request.path, kind = error.kind(), "{error}");
                }
                ModuleResponse::error(route, &error)
            }
        }
    }

    /// Serve `request`.
    pub async fn handle(&self, request: &Request) -> Result<ModuleResponse, Error> {
        let not_found = || Error::RouteNotFound {
            path: request.path.clone(),
        };
        let route = route_for(&request.path).ok_or_else(not_found)?;
        debug!(route = route.name(), path = %request.path, "dispatch");

        match route {
            Route::Entry => {
                let html = read_source(&self.config.entry_path()).await?;
                Ok(ModuleResponse::html(inject_env_shim(&html, &self.config.mode)))
            }
            Route::Script => {
                let file = self.source_path(&request.path)?;
                let code = read_source(&file).await?;
                Ok(ModuleResponse::js(rewrite_imports(
                    &code,
                    &file.display().to_string(),
                )?))
            }
            Route::Package => Ok(ModuleResponse::js(
                self.packages.load_request(&request.path).await?,
            )),
            Route::Component => {
                let phase = request.query("type");
                if phase.is_some_and(|p| p != TEMPLATE_QUERY) {
                    return Err(not_found());
                }
                let file = self.source_path(&request.path)?;
                let source = read_source(&file).await?;
                let code = match phase {
                    Some(_) => self.components.compile_template_phase(&file, &source)?,
                    None => self
                        .components
                        .compile_script_phase(&request.path, &file, &source)?,
                };
                Ok(ModuleResponse::js(code))
            }
            Route::Stylesheet => {
                let file = self.source_path(&request.path)?;
                let css = read_source(&file).await?;
                Ok(ModuleResponse::js(wrap_stylesheet(&css)))
            }
        }
    }

    /// Map a URL path onto a file under the project root.
    fn source_path(&self, url_path: &str) -> Result<PathBuf, Error> {
        join_within(&self.config.root, url_path)
            .ok_or_else(|| Error::resolution(url_path, "path is outside the project root"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_order() {
        assert_eq!(route_for("/"), Some(Route::Entry));
        assert_eq!(route_for("/src/main.js"), Some(Route::Script));
        assert_eq!(route_for("/@modules/vue"), Some(Route::Package));
        assert_eq!(route_for("/@modules/chart.js"), Some(Route::Script));
        assert_eq!(route_for("/App.vue"), Some(Route::Component));
        assert_eq!(route_for("/style.css"), Some(Route::Stylesheet));
        assert_eq!(route_for("/@modules/some.css"), Some(Route::Package));
        assert_eq!(route_for("/logo.png"), None);
        assert_eq!(route_for("/index.html"), None);
    }

    #[test]
    fn test_request_from_uri() {
        let req = Request::from_uri("/src/App.vue?type=template&t=1");
        assert_eq!(req.path, "/src/App.vue");
        assert_eq!(req.query("type"), Some("template"));
        assert_eq!(req.query("t"), Some("1"));

        assert_eq!(Request::from_uri("/a/../b.js").path, "/b.js");
        assert_eq!(Request::from_uri("/"), Request::new("/"));
        assert_eq!(
            Request::new("/App.vue").with_query("type", "template"),
            Request::from_uri("/App.vue?type=template")
        );
    }

    #[test]
    fn test_server_keeps_config() {
        let config = DevConfig::new(PathBuf::from("/project")).with_mode("test");
        let server = DevServer::new(config.clone());
        assert_eq!(server.config(), &config);
        assert_eq!(server.config().deps_path(), PathBuf::from("/project/node_modules"));
    }

    #[test]
    fn test_error_response_shapes() {
        let parse = Error::parse("App.vue", "unclosed <template> block");
        let js = ModuleResponse::error(Some(Route::Component), &parse);
        assert_eq!(js.status, 500);
        assert_eq!(js.content_type, JS_CONTENT_TYPE);
        assert!(js.body.starts_with("console.error(\"[esmdev] Failed to parse App.vue"));

        let missing = Error::RouteNotFound {
            path: "/x.png".into(),
        };
        let text = ModuleResponse::error(None, &missing);
        assert_eq!(text.status, 404);
        assert_eq!(text.content_type, TEXT_CONTENT_TYPE);
    }
}

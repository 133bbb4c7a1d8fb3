use rocket::fs::NamedFile;
use rocket::http::Header;
use rocket::http::uri::Segments;
use rocket::http::uri::fmt::Path as UriPath;
use rocket::{Responder, State, routes};
use std::path::PathBuf;
use tracing::{debug, warn};

const ASSET_CACHE_POLICY: &str = "public, max-age=86400";

/// Directory that `/static/<path..>` is served from.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves request segments to a regular file inside the root.
    ///
    /// Containment is checked on the canonical path, after `..`, symlinks and
    /// absolute segments have been resolved.
    pub async fn resolve<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Option<PathBuf> {
        let root = match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "static root is not accessible");
                return None;
            }
        };

        let mut candidate = root.clone();
        for segment in segments {
            candidate.push(segment);
        }

        let resolved = tokio::fs::canonicalize(&candidate).await.ok()?;
        if !resolved.starts_with(&root) {
            debug!(requested = %candidate.display(), "static path escapes root");
            return None;
        }

        let metadata = tokio::fs::metadata(&resolved).await.ok()?;
        metadata.is_file().then_some(resolved)
    }
}

#[derive(Responder)]
pub struct StaticAsset {
    file: NamedFile,
    cache_control: Header<'static>,
}

#[rocket::get("/static/<path..>")]
pub async fn asset(path: Segments<'_, UriPath>, files: &State<StaticFiles>) -> Option<StaticAsset> {
    let resolved = files.resolve(path).await?;
    let file = NamedFile::open(&resolved).await.ok()?;

    Some(StaticAsset {
        file,
        cache_control: Header::new("Cache-Control", ASSET_CACHE_POLICY),
    })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![asset]
}

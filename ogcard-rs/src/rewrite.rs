//! Server-context rewriting of remote references into conversion indirections.
//!
//! Rewriting is synchronous and performs no I/O: a remote WebP reference is
//! replaced by a URL pointing at the conversion endpoint, carrying the original
//! URL as a query parameter. The endpoint resolves the indirection on the
//! renderer's first fetch.

use crate::reference::{classify, needs_conversion, ImageRef};
use log::warn;

/// Environment variable consulted by [`RewriteConfig::from_env`].
pub const BASE_ORIGIN_ENV: &str = "OGCARD_PUBLIC_URL";

/// Path of the conversion endpoint, relative to the configured origin.
pub const CONVERT_PATH: &str = "/convert";

/// Origin configuration for building conversion indirections.
///
/// The origin is threaded explicitly into the rewriter rather than read from
/// process-global state at rewrite time; [`RewriteConfig::from_env`] exists for
/// binary entry points only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Absolute origin the conversion endpoint is reachable at,
    /// e.g. `https://cards.example.com`.
    pub base_origin: Option<String>,
}

impl RewriteConfig {
    pub fn new(base_origin: Option<String>) -> Self {
        Self { base_origin }
    }

    /// Read the origin from `OGCARD_PUBLIC_URL`, if set and non-empty.
    pub fn from_env() -> Self {
        let base_origin = std::env::var(BASE_ORIGIN_ENV)
            .ok()
            .filter(|value| !value.is_empty());
        Self { base_origin }
    }

    /// Effective origin for a rewrite: a per-request origin wins over the
    /// statically configured one.
    fn effective_origin<'a>(&'a self, request_origin: Option<&'a str>) -> Option<&'a str> {
        request_origin.or(self.base_origin.as_deref())
    }
}

/// Rewrite a single leaf value for the server context.
///
/// Inline references and values that need no conversion are left unchanged
/// (`None`). A remote WebP reference becomes an indirection through the
/// conversion endpoint. When no origin is available the original value is also
/// kept: the proxy cannot be addressed, so the reference passes through
/// unconverted (degraded mode, logged).
pub fn rewrite_reference(
    value: &str,
    config: &RewriteConfig,
    request_origin: Option<&str>,
) -> Option<String> {
    let reference = classify(value)?;
    if !needs_conversion(&reference) {
        return None;
    }
    let ImageRef::Remote { url } = reference else {
        // Inline payloads are converted in the interactive context, not proxied.
        return None;
    };

    let Some(origin) = config.effective_origin(request_origin) else {
        warn!("No conversion endpoint origin configured; leaving `{url}` unrewritten");
        return None;
    };

    let origin = origin.trim_end_matches('/');
    Some(format!(
        "{origin}{CONVERT_PATH}?url={}",
        urlencoding::encode(url)
    ))
}

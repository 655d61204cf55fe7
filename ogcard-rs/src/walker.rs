//! Template tree traversal.
//!
//! A single structural recursion over the parameter tree, parameterized by a
//! pluggable leaf capability: the interactive context converts inline payloads
//! in place, the server context rewrites remote references into conversion
//! indirections. Sibling subtrees are normalized concurrently; the result is
//! always reconstructed in input order.

use crate::convert::convert_inline_to_png;
use crate::error::NormalizeError;
use crate::reference::{classify, needs_conversion, ImageRef};
use crate::rewrite::{rewrite_reference, RewriteConfig};
use crate::template::Template;
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use serde_json::Value;

/// Leaf capability plugged into the traversal engine.
pub trait LeafNormalizer: Send + Sync {
    /// Normalize one leaf string. `Ok(None)` leaves the leaf unchanged.
    fn normalize_leaf<'a>(
        &'a self,
        value: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, NormalizeError>>;
}

/// Interactive-context normalizer: converts non-canonical inline payloads in
/// place. Remote references are left for the server path.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineConverter;

impl LeafNormalizer for InlineConverter {
    fn normalize_leaf<'a>(
        &'a self,
        value: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, NormalizeError>> {
        async move {
            match classify(value) {
                Some(reference @ ImageRef::Inline { .. }) if needs_conversion(&reference) => {
                    convert_inline_to_png(value).map(Some)
                }
                _ => Ok(None),
            }
        }
        .boxed()
    }
}

/// Server-context normalizer: rewrites non-canonical remote references into
/// conversion indirections. Synchronous rewriting, no I/O.
#[derive(Debug, Clone, Default)]
pub struct ProxyRewriter {
    config: RewriteConfig,
    request_origin: Option<String>,
}

impl ProxyRewriter {
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            config,
            request_origin: None,
        }
    }

    /// Prefer `origin` (e.g. the origin of the incoming render request) over
    /// the statically configured one.
    pub fn with_request_origin(mut self, origin: impl Into<String>) -> Self {
        self.request_origin = Some(origin.into());
        self
    }
}

impl LeafNormalizer for ProxyRewriter {
    fn normalize_leaf<'a>(
        &'a self,
        value: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, NormalizeError>> {
        let rewritten = rewrite_reference(value, &self.config, self.request_origin.as_deref());
        async move { Ok(rewritten) }.boxed()
    }
}

/// Normalize one node of a parameter tree.
///
/// Produces a new tree with identical shape: sequences keep their length and
/// order, mappings keep their key set and key order, non-string leaves are
/// copied verbatim. Sibling subtrees run concurrently and the first failure
/// fails the whole traversal; completion order never affects output order.
pub fn normalize_value<'a>(
    value: &'a Value,
    leaf: &'a dyn LeafNormalizer,
) -> BoxFuture<'a, Result<Value, NormalizeError>> {
    async move {
        match value {
            Value::String(text) => {
                let normalized = leaf.normalize_leaf(text).await?;
                Ok(Value::String(normalized.unwrap_or_else(|| text.clone())))
            }
            Value::Array(items) => {
                let children = items.iter().map(|item| normalize_value(item, leaf));
                Ok(Value::Array(try_join_all(children).await?))
            }
            Value::Object(entries) => {
                let children = entries.iter().map(|(key, child)| async move {
                    Ok::<_, NormalizeError>((key.clone(), normalize_value(child, leaf).await?))
                });
                Ok(Value::Object(try_join_all(children).await?.into_iter().collect()))
            }
            other => Ok(other.clone()),
        }
    }
    .boxed()
}

/// Normalize a template for the downstream layout engine.
///
/// The input template is never mutated; only the `params` tree of the returned
/// copy differs, and only in leaf strings that classified as image references.
pub async fn normalize_template(
    template: &Template,
    leaf: &dyn LeafNormalizer,
) -> Result<Template, NormalizeError> {
    let params = normalize_value(&template.params, leaf).await?;
    Ok(Template {
        params,
        ..template.clone()
    })
}

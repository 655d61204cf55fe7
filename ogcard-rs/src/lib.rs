#![doc = include_str!("../README.md")]

pub mod convert;
pub mod error;
pub mod reference;
pub mod rewrite;
pub mod template;
pub mod walker;

pub use error::NormalizeError;
pub use reference::{classify, needs_conversion, ImageMime, ImageRef};
pub use rewrite::{rewrite_reference, RewriteConfig};
pub use template::{Canvas, Template};
pub use walker::{normalize_template, normalize_value, InlineConverter, LeafNormalizer, ProxyRewriter};

pub use serde_json;

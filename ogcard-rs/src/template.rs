//! The card template data model.

use serde::{Deserialize, Serialize};

/// Output dimensions of the rendered card. Immutable once rendering starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Both dimensions must be positive before rendering may start.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A card template as submitted by its producer.
///
/// `params` is an arbitrary-depth tree of sequences, mappings, and primitive
/// leaves. Normalization preserves its shape exactly — node kinds, key sets and
/// key order, sequence lengths and order — and only rewrites leaf strings that
/// classify as image references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Identifier of the visual template component that renders this card.
    pub name: String,
    pub canvas: Canvas,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub params: serde_json::Value,
}

/// Failures produced while normalizing image references in a template tree.
///
/// The walker never swallows these: a failed branch fails the whole traversal
/// and the caller decides whether to degrade or abort the render.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A component was handed a reference shape it does not handle. This is an
    /// integration error, not a data error, and is surfaced rather than ignored.
    #[error("Unsupported input kind: `{0}`")]
    UnsupportedInputKind(String),

    /// The payload could not be interpreted as an image.
    #[error("Failed to decode image: `{0}`")]
    DecodeFailure(String),

    /// The decoded image could not be re-encoded as PNG.
    #[error("Failed to re-encode image as PNG: `{0}`")]
    ConversionFailure(String),
}

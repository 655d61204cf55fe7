//! Classification of leaf strings into image references.
//!
//! The classifier is a narrow filter: it only claims strings it can positively
//! identify as image references, so unrelated text fields sharing a leaf
//! position with image fields are never touched.

/// Prefix of an inline-encoded (self-contained) image reference.
pub const DATA_URL_PREFIX: &str = "data:";

/// Declared mime type of an image reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Svg,
    Webp,
    Other,
}

impl ImageMime {
    /// Map a declared mime string (case-insensitive) to a known format.
    pub fn from_declared(mime: &str) -> Self {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => ImageMime::Png,
            "image/jpeg" | "image/jpg" => ImageMime::Jpeg,
            "image/svg+xml" => ImageMime::Svg,
            "image/webp" => ImageMime::Webp,
            _ => ImageMime::Other,
        }
    }

    /// Formats the downstream layout engine accepts without conversion.
    pub fn is_renderer_native(self) -> bool {
        matches!(self, ImageMime::Png | ImageMime::Jpeg | ImageMime::Svg)
    }
}

/// A classified image reference. The tag is derived from the string at
/// classification time and never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef<'a> {
    /// Self-contained `data:` URL carrying the declared mime and the bytes.
    Inline { mime: ImageMime },
    /// Remote resource that must be fetched to obtain bytes.
    Remote { url: &'a str },
}

/// Classify a leaf string.
///
/// A string is inline-encoded iff it starts with the `data:` prefix. A
/// non-inline string is treated as a remote image reference only when its URL
/// path ends with `.webp` (case-insensitive, query and fragment ignored) —
/// remote references in renderer-native formats need no handling and pass
/// through unclassified. Returns `None` for everything else.
pub fn classify(value: &str) -> Option<ImageRef<'_>> {
    if let Some(rest) = value.strip_prefix(DATA_URL_PREFIX) {
        let declared = rest.split([';', ',']).next().unwrap_or("");
        return Some(ImageRef::Inline {
            mime: ImageMime::from_declared(declared),
        });
    }
    if has_webp_path(value) {
        return Some(ImageRef::Remote { url: value });
    }
    None
}

/// Decide whether a classified reference must be converted before the layout
/// engine sees it. Conversion is expensive (decode + encode, or a network
/// round trip) and runs only on WebP; PNG, JPEG, and SVG are renderer-native.
pub fn needs_conversion(reference: &ImageRef<'_>) -> bool {
    match reference {
        ImageRef::Inline { mime } => *mime == ImageMime::Webp,
        // Remote references are only ever classified when they indicate WebP.
        ImageRef::Remote { .. } => true,
    }
}

fn has_webp_path(value: &str) -> bool {
    let path = value.split(['?', '#']).next().unwrap_or(value);
    path.to_ascii_lowercase().ends_with(".webp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("data:image/png;base64,iVBORw0K", ImageMime::Png)]
    #[case("data:image/jpeg;base64,/9j/4AAQ", ImageMime::Jpeg)]
    #[case("data:image/jpg;base64,/9j/4AAQ", ImageMime::Jpeg)]
    #[case("data:image/svg+xml,%3Csvg%3E%3C/svg%3E", ImageMime::Svg)]
    #[case("data:image/webp;base64,UklGRg", ImageMime::Webp)]
    #[case("data:IMAGE/WEBP;base64,UklGRg", ImageMime::Webp)]
    #[case("data:text/plain,hello", ImageMime::Other)]
    fn test_inline_classification(#[case] value: &str, #[case] expected: ImageMime) {
        assert_eq!(classify(value), Some(ImageRef::Inline { mime: expected }));
    }

    #[rstest]
    #[case("https://cdn.example.com/logo.webp")]
    #[case("https://cdn.example.com/LOGO.WEBP")]
    #[case("https://cdn.example.com/logo.webp?v=2")]
    #[case("https://cdn.example.com/logo.webp#cover")]
    fn test_remote_webp_classification(#[case] value: &str) {
        assert_eq!(classify(value), Some(ImageRef::Remote { url: value }));
    }

    #[rstest]
    #[case("hello world")]
    #[case("")]
    #[case("https://cdn.example.com/logo.png")]
    #[case("https://cdn.example.com/photo.jpg")]
    #[case("https://example.com/guide-to-webp.html")]
    #[case("https://cdn.example.com/archive.webp.txt")]
    fn test_not_an_image_reference(#[case] value: &str) {
        assert_eq!(classify(value), None);
    }

    #[rstest]
    #[case(ImageMime::Png, true)]
    #[case(ImageMime::Jpeg, true)]
    #[case(ImageMime::Svg, true)]
    #[case(ImageMime::Webp, false)]
    #[case(ImageMime::Other, false)]
    fn test_renderer_native_formats(#[case] mime: ImageMime, #[case] expected: bool) {
        assert_eq!(mime.is_renderer_native(), expected);
    }

    #[rstest]
    #[case("data:image/png;base64,iVBORw0K", false)]
    #[case("data:image/jpeg;base64,/9j/4AAQ", false)]
    #[case("data:image/svg+xml,%3Csvg%3E%3C/svg%3E", false)]
    #[case("data:image/webp;base64,UklGRg", true)]
    #[case("data:application/octet-stream;base64,AAAA", false)]
    #[case("https://cdn.example.com/logo.webp", true)]
    fn test_needs_conversion(#[case] value: &str, #[case] expected: bool) {
        let reference = classify(value).expect("expected an image reference");
        assert_eq!(needs_conversion(&reference), expected);
    }
}

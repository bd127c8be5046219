use std::path::Path;

/// Base64 prefixes of the image signatures the model backend accepts.
///
/// Matching happens on the encoded text rather than raw bytes because parts
/// are carried base64-encoded end to end; the prefixes below are the encodings
/// of the usual magic numbers (JPEG `FF D8 FF`, PNG `89 50 4E 47`, ...).
const IMAGE_SIGNATURES: &[(&str, &str)] = &[
    ("/9j/", "image/jpeg"),
    ("iVBOR", "image/png"),
    ("R0lG", "image/gif"),
    ("UklG", "image/webp"),
    ("Qk", "image/bmp"),
];

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Sniff an image MIME type from a base64 payload. Unrecognized payloads fall
/// back to JPEG, which is what unlabeled thumbnail CDNs overwhelmingly serve.
#[must_use]
pub fn sniff_image_mime(encoded: &str) -> &'static str {
    IMAGE_SIGNATURES
        .iter()
        .find(|(prefix, _)| encoded.starts_with(prefix))
        .map_or(DEFAULT_IMAGE_MIME, |(_, mime)| mime)
}

/// True only when the payload starts with a known image signature.
///
/// Used to reject HTML error pages masquerading as images; `sniff_image_mime`
/// alone cannot tell those apart because of its JPEG fallback.
#[must_use]
pub fn is_known_image(encoded: &str) -> bool {
    IMAGE_SIGNATURES
        .iter()
        .any(|(prefix, _)| encoded.starts_with(prefix))
}

/// MIME type for a local video file, by extension. Local videos come from the
/// device camera roll, so no signature check is applied.
#[must_use]
pub fn video_mime_for_path(path: &Path) -> &'static str {
    let is_quicktime = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mov"));
    if is_quicktime {
        "video/quicktime"
    } else {
        "video/mp4"
    }
}

#[cfg(test)]
mod tests {
    use super::{is_known_image, sniff_image_mime, video_mime_for_path};
    use base64::Engine;
    use std::path::Path;

    #[test]
    fn sniff_recognizes_jpeg_prefix() {
        assert_eq!(sniff_image_mime("/9j/4AAQSkZJRg=="), "image/jpeg");
    }

    #[test]
    fn sniff_recognizes_png_prefix() {
        assert_eq!(sniff_image_mime("iVBORw0KGgoAAAA="), "image/png");
    }

    #[test]
    fn sniff_recognizes_remaining_formats() {
        assert_eq!(sniff_image_mime("R0lGODlh"), "image/gif");
        assert_eq!(sniff_image_mime("UklGRiQA"), "image/webp");
        assert_eq!(sniff_image_mime("Qk02AAAA"), "image/bmp");
    }

    #[test]
    fn sniff_defaults_unrecognized_to_jpeg() {
        assert_eq!(sniff_image_mime("PGh0bWw+"), "image/jpeg");
        assert_eq!(sniff_image_mime(""), "image/jpeg");
    }

    #[test]
    fn encoded_magic_bytes_match_table() {
        let engine = base64::engine::general_purpose::STANDARD;
        let jpeg = engine.encode([0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(jpeg.starts_with("/9j/"));
        let png = engine.encode([0x89, b'P', b'N', b'G', 0x0D, 0x0A]);
        assert!(png.starts_with("iVBOR"));
        let bmp = engine.encode([b'B', b'M', 0x36, 0x00]);
        assert!(bmp.starts_with("Qk"));
    }

    #[test]
    fn is_known_image_rejects_html_page() {
        let engine = base64::engine::general_purpose::STANDARD;
        let html = engine.encode(b"<html><body>404 Not Found</body></html>");
        assert!(!is_known_image(&html));
        assert!(is_known_image("/9j/4AAQ"));
    }

    #[test]
    fn video_mime_by_extension() {
        assert_eq!(
            video_mime_for_path(Path::new("/videos/clip.mov")),
            "video/quicktime"
        );
        assert_eq!(
            video_mime_for_path(Path::new("/videos/clip.MOV")),
            "video/quicktime"
        );
        assert_eq!(video_mime_for_path(Path::new("/videos/clip.mp4")), "video/mp4");
        assert_eq!(video_mime_for_path(Path::new("/videos/clip")), "video/mp4");
    }
}

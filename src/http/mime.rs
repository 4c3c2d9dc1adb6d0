//! Content type detection from file extensions.

/// Content type used when the extension is missing or unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of error pages.
pub const ERROR_CONTENT_TYPE: &str = "text/html; charset=iso-8859-1";

/// Content type of generated directory listings.
pub const LISTING_CONTENT_TYPE: &str = "text/html";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("ogv", "video/ogg"),
    ("ogg", "video/ogg"),
    ("oga", "audio/ogg"),
    ("webm", "video/webm"),
    ("wav", "audio/x-wav"),
    ("html", "text/html; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Looks up the content type for `path` by its extension.
///
/// The extension is everything after the last `.`, compared
/// case-insensitively.
///
/// # Example
///
/// ```
/// # use mediaserve::http::mime::content_type_for;
/// assert_eq!(content_type_for("media/clip.WEBM"), "video/webm");
/// assert_eq!(content_type_for("README"), "application/octet-stream");
/// ```
pub fn content_type_for(path: &str) -> &'static str {
    let Some((_, extension)) = path.rsplit_once('.') else {
        return DEFAULT_CONTENT_TYPE;
    };

    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

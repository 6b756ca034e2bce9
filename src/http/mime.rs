// https://developer.mozilla.org/en-US/docs/Web/HTTP/Basics_of_HTTP/MIME_types/Common_types

use std::path::Path;

macro_rules! mime {
    ($a:ident, $b:literal) => {
        pub const $a: &str = $b;
    };
}

mime!(TEXT_PLAIN, "text/plain");
mime!(TEXT_HTML, "text/html");
mime!(TEXT_CSS, "text/css");

mime!(IMAGE_JPEG, "image/jpeg");
mime!(IMAGE_GIF, "image/gif");
mime!(IMAGE_PNG, "image/png");
mime!(IMAGE_ICON, "image/x-icon");
mime!(IMAGE_SVG, "image/svg+xml");
mime!(IMAGE_WEBP, "image/webp");

mime!(FONT_WOFF, "font/woff");
mime!(FONT_WOFF2, "font/woff2");
mime!(FONT_TTF, "font/ttf");

mime!(APPLICATION_JSON, "application/json");
mime!(APPLICATION_JAVASCRIPT, "application/javascript");
mime!(APPLICATION_XML, "application/xml");
mime!(APPLICATION_PDF, "application/pdf");
mime!(APPLICATION_EOT, "application/vnd.ms-fontobject");
mime!(APPLICATION_OCTET_STREAM, "application/octet-stream");

/// Extension (lowercase, without dot) to content type
const EXTENSIONS: [(&str, &str); 18] = [
    ("html", TEXT_HTML),
    ("css", TEXT_CSS),
    ("js", APPLICATION_JAVASCRIPT),
    ("json", APPLICATION_JSON),
    ("png", IMAGE_PNG),
    ("jpg", IMAGE_JPEG),
    ("jpeg", IMAGE_JPEG),
    ("gif", IMAGE_GIF),
    ("svg", IMAGE_SVG),
    ("ico", IMAGE_ICON),
    ("txt", TEXT_PLAIN),
    ("pdf", APPLICATION_PDF),
    ("woff", FONT_WOFF),
    ("woff2", FONT_WOFF2),
    ("ttf", FONT_TTF),
    ("eot", APPLICATION_EOT),
    ("xml", APPLICATION_XML),
    ("webp", IMAGE_WEBP),
];

/// Content type for a file path, `application/octet-stream` when unknown
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return APPLICATION_OCTET_STREAM;
    };
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(APPLICATION_OCTET_STREAM)
}

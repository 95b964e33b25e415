//! Content types of served files.

use std::path::Path;

/// Types registered on top of the `mime_guess` database, keyed by extension.
const EXTRA_TYPES: &[(&str, &str)] = &[
    ("woff2", "application/font-woff2"),
    ("woff", "application/font-woff"),
    ("ttf", "font/ttf"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("json", "application/json"),
];

const FALLBACK: &str = "application/octet-stream";

/// Returns the `Content-Type` for `path`.
pub fn content_type(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = extension.as_deref()
        && let Some((_, mime)) = EXTRA_TYPES.iter().find(|(e, _)| *e == ext)
    {
        return (*mime).to_string();
    }

    let guess = mime_guess::from_path(path).first_raw().unwrap_or(FALLBACK);

    if guess.starts_with("text/") {
        format!("{}; charset=utf-8", guess)
    } else {
        guess.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_types() {
        assert_eq!(content_type("fonts/inter.woff2"), "application/font-woff2");
        assert_eq!(content_type("fonts/inter.TTF"), "font/ttf");
        assert_eq!(content_type("api/openapi.yml"), "application/yaml");
        assert_eq!(content_type("data.json"), "application/json");
    }

    #[test]
    fn test_guessed_types() {
        assert_eq!(content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("css/site.css"), "text/css; charset=utf-8");
        assert_eq!(content_type("logo.png"), "image/png");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type("LICENSE"), FALLBACK);
        assert_eq!(content_type("archive.unknownext"), FALLBACK);
    }
}

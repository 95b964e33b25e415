//! HTML listing of directories without an index page.

use std::fmt::Write;

use pages_git::FileInfo;

/// Renders `entries` as a minimal HTML listing.
///
/// Links are relative, so the listing must be served from a path ending in
/// `/`.
pub fn render(entries: &[FileInfo]) -> String {
    let mut html = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");

    for entry in entries {
        let suffix = if entry.is_dir() { "/" } else { "" };
        let _ = writeln!(
            html,
            "<a href=\"{}{}\">{}{}</a>",
            urlencoding::encode(entry.name()),
            suffix,
            escape(entry.name()),
            suffix
        );
    }

    html.push_str("</pre>\n");
    html
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn test_render() {
        let entries = vec![
            FileInfo::new("css", 0, SystemTime::now(), true),
            FileInfo::new("a <b>.html", 3, SystemTime::now(), false),
        ];

        let html = render(&entries);
        assert!(html.contains("<a href=\"css/\">css/</a>"));
        assert!(html.contains("<a href=\"a%20%3Cb%3E.html\">a &lt;b&gt;.html</a>"));
    }
}

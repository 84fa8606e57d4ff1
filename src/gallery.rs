//! HTML pages for the upload form and the drill-down galleries
//!
//! Pure functions of their input; the handlers generate the images first.

use crate::primitive::Mode;

/// One generated thumbnail on a gallery page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Stored filename of the generated image
    pub image: String,
    pub mode: Mode,
    pub shapes: u32,
}

/// Escape text for use in HTML content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            margin: 0 auto;
            max-width: 1200px;
            padding: 20px;
        }}
        .choices a {{
            display: inline-block;
            width: 20%;
            margin: 8px;
            text-align: center;
            color: #333;
            text-decoration: none;
        }}
        .choices img {{
            width: 100%;
        }}
    </style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// Upload form posting the `image` field to `/upload`
pub fn upload_form() -> String {
    page(
        "Upload an image",
        r#"<form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="image/*">
    <button type="submit">Upload Image</button>
</form>"#,
    )
}

/// Hrefs are emitted verbatim; callers escape the parts they interpolate
fn render_choices<F>(
    title: &str,
    thumbnails: &[Thumbnail],
    href: F,
    caption: fn(&Thumbnail) -> String,
) -> String
where
    F: Fn(&Thumbnail) -> String,
{
    let mut body = String::from("<div class=\"choices\">\n");
    for thumb in thumbnails {
        let label = escape_html(&caption(thumb));
        body.push_str(&format!(
            "<a href=\"{}\">\n    <img src=\"/img/{}\" alt=\"{label}\">\n    <div>{label}</div>\n</a>\n",
            href(thumb),
            escape_html(&thumb.image),
        ));
    }
    body.push_str("</div>");
    page(title, &body)
}

/// First drill-down page: one thumbnail per shape mode
///
/// Each link leads back to `/modify/{source}` with the mode chosen.
pub fn render_mode_choices(source: &str, thumbnails: &[Thumbnail]) -> String {
    let source = escape_html(source);
    render_choices(
        "Choose a shape",
        thumbnails,
        |t| format!("/modify/{source}?mode={}", t.mode),
        |t| t.mode.name().to_string(),
    )
}

/// Second drill-down page: one thumbnail per shape count for a fixed mode
pub fn render_count_choices(source: &str, mode: Mode, thumbnails: &[Thumbnail]) -> String {
    let source = escape_html(source);
    render_choices(
        &format!("Choose how many {} shapes", mode.name()),
        thumbnails,
        |t| format!("/modify/{source}?mode={}&n={}", t.mode, t.shapes),
        |t| format!("{} shapes", t.shapes),
    )
}

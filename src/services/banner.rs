use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::models::{post::PostAttrs, settings::DisplaySettings};

/// Explicit placement marker editors put in content or templates.
pub const MARKER: &str = "[breaking_news]";

/// Base styles for the banner container, appended once per page with a banner.
pub const BANNER_CSS: &str = "<style type=\"text/css\">\
.breaking_news_container{margin:0;padding:10px;display:inline-block;width:100%;\
clear:both;font-size:22px;text-align:center;}</style>";

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#([A-Fa-f0-9]{3}){1,2}$").unwrap();
}

/// Where the banner ended up in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Marker,
    Header,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Marker => "marker",
            Placement::Header => "header",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub html: String,
    pub placement: Option<Placement>,
}

/// `#rgb` or `#rrggbb`, otherwise `None`.
pub fn sanitize_hex_color(value: &str) -> Option<&str> {
    let value = value.trim();
    HEX_COLOR.is_match(value).then_some(value)
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) and site-relative URLs survive; anything else becomes empty.
pub fn escape_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('/') && !raw.starts_with("//") {
        if raw.chars().any(char::is_whitespace) {
            return String::new();
        }
        return escape_html(raw);
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => escape_html(url.as_str()),
        _ => String::new(),
    }
}

/// Banner markup for the selected post.
pub fn render_banner(settings: &DisplaySettings, selected: &PostAttrs, permalink: &str) -> String {
    let container_style = sanitize_hex_color(&settings.bg_color)
        .map(|c| format!(" style=\"background-color: {c}\""))
        .unwrap_or_default();
    let text_style = sanitize_hex_color(&settings.text_color)
        .map(|c| format!(" style=\"color: {c}\""))
        .unwrap_or_default();

    format!(
        "<div id=\"breaking_news\" class=\"breaking_news_container\"{container_style}>\
         <div id=\"breaking_news_title\" class=\"breaking_news_title\"{text_style}>\
         {area}: <a href=\"{href}\" id=\"breaking_news_title_link\" class=\"breaking_news_title_link\"{text_style}>{title}</a>\
         </div></div>",
        area = escape_html(&settings.area_title),
        href = escape_url(permalink),
        title = escape_html(selected.display_title()),
    )
}

/// Place `banner` in `page` at most once.
///
/// The first [`MARKER`] is replaced and any further markers are removed. With
/// no marker and `autoinsert` on, the banner goes at the bottom of the first
/// `<header>` element. A page that already carries the banner is left alone
/// apart from marker removal.
pub fn inject(page: &str, banner: Option<&str>, autoinsert: bool) -> Injection {
    let banner = match banner {
        Some(b) if !page.contains("id=\"breaking_news\"") => b,
        _ => {
            return Injection {
                html: page.replace(MARKER, ""),
                placement: None,
            }
        }
    };

    if let Some(at) = page.find(MARKER) {
        let mut html = String::with_capacity(page.len() + banner.len() + BANNER_CSS.len());
        html.push_str(&page[..at]);
        html.push_str(banner);
        html.push_str(&page[at + MARKER.len()..].replace(MARKER, ""));
        return Injection {
            html: append_styles(html),
            placement: Some(Placement::Marker),
        };
    }

    if autoinsert {
        if let Some(at) = header_close(page) {
            let mut html = String::with_capacity(page.len() + banner.len() + BANNER_CSS.len());
            html.push_str(&page[..at]);
            html.push_str(banner);
            html.push_str(&page[at..]);
            return Injection {
                html: append_styles(html),
                placement: Some(Placement::Header),
            };
        }
    }

    Injection {
        html: page.to_string(),
        placement: None,
    }
}

const HEADER_OPEN: &str = "<header";
const HEADER_CLOSE: &str = "</header>";

/// Byte offset of the `</header>` closing the first `<header>` element.
/// Nested headers are counted so the outer element's close tag is found.
fn header_close(page: &str) -> Option<usize> {
    let lower = page.to_ascii_lowercase();
    let mut depth = 0usize;
    let mut from = 0;
    loop {
        let rest = &lower[from..];
        let open = rest.find(HEADER_OPEN).map(|at| from + at);
        let close = rest.find(HEADER_CLOSE).map(|at| from + at);
        match (open, close) {
            (Some(at), close) if close.map_or(true, |close| at < close) => {
                if is_tag_end(lower.as_bytes().get(at + HEADER_OPEN.len())) {
                    depth += 1;
                }
                from = at + HEADER_OPEN.len();
            }
            (_, Some(at)) => {
                if depth == 1 {
                    return Some(at);
                }
                depth = depth.saturating_sub(1);
                from = at + HEADER_CLOSE.len();
            }
            (_, None) => return None,
        }
    }
}

fn is_tag_end(byte: Option<&u8>) -> bool {
    matches!(byte, Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/'))
}

fn append_styles(mut html: String) -> String {
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => html.insert_str(at, BANNER_CSS),
        None => html.push_str(BANNER_CSS),
    }
    html
}

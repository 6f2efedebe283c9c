use maud::{Markup, PreEscaped};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};

/// Shown in place of an article body that is empty
pub const EMPTY_CONTENT_PLACEHOLDER: &str = "*(本文がありません)*";

/// Check if a URL uses a dangerous protocol that could execute code
fn is_dangerous_url(url: &str) -> bool {
    let url_lower = url.trim().to_lowercase();
    url_lower.starts_with("javascript:")
        || url_lower.starts_with("vbscript:")
        || url_lower.starts_with("data:")
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_dangerous_url(&url) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Render article markdown into HTML
///
/// Raw HTML in the source is shown as text, and links or images using a
/// scripting or `data:` URL point to `#` instead.
pub fn render_markdown(content: &str) -> Markup {
    let content = if content.trim().is_empty() {
        EMPTY_CONTENT_PLACEHOLDER
    } else {
        content
    };

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(content, options).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        event => event,
    });

    let mut out = String::with_capacity(content.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, parser);
    PreEscaped(out)
}

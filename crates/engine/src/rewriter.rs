use crate::attrs::AnchorAttributes;
use autolink_segmenter::{Span, ENGINE_MARKER_ATTR};

/// One link to splice into the document at an exact byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedLink {
    pub span: Span,
    pub href: String,
    pub attrs: AnchorAttributes,
}

/// Splice anchors into the original markup.
///
/// Every byte outside the inserted tags is copied through unchanged;
/// whitespace, entities and attribute quoting in the source are never
/// reformatted. Links must be non-overlapping, which the allocator
/// guarantees; they are spliced in ascending byte order regardless of
/// input order. Each anchor carries the engine marker attribute so a
/// later render treats it as protected.
#[must_use]
pub fn rewrite(markup: &str, links: &[InsertedLink]) -> String {
    if links.is_empty() {
        return markup.to_string();
    }

    let mut ordered: Vec<&InsertedLink> = links.iter().collect();
    ordered.sort_by_key(|l| l.span.start);

    let mut out = String::with_capacity(markup.len() + links.len() * 64);
    let mut cursor = 0;

    for link in ordered {
        out.push_str(&markup[cursor..link.span.start]);
        open_tag(&mut out, link);
        out.push_str(&markup[link.span.start..link.span.end]);
        out.push_str("</a>");
        cursor = link.span.end;
    }
    out.push_str(&markup[cursor..]);
    out
}

fn open_tag(out: &mut String, link: &InsertedLink) {
    out.push_str("<a href=\"");
    push_escaped(out, &link.href);
    out.push('"');
    if let Some(title) = &link.attrs.title {
        out.push_str(" title=\"");
        push_escaped(out, title);
        out.push('"');
    }
    if let Some(rel) = &link.attrs.rel {
        out.push_str(" rel=\"");
        push_escaped(out, rel);
        out.push('"');
    }
    if let Some(target) = &link.attrs.target {
        out.push_str(" target=\"");
        push_escaped(out, target);
        out.push('"');
    }
    out.push(' ');
    out.push_str(ENGINE_MARKER_ATTR);
    out.push_str("=\"1\">");
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link(start: usize, end: usize, href: &str) -> InsertedLink {
        InsertedLink {
            span: Span::new(start, end),
            href: href.to_string(),
            attrs: AnchorAttributes::default(),
        }
    }

    #[test]
    fn test_no_links_returns_input_verbatim() {
        let markup = "<p>untouched   &amp; <em>kept</em></p>";
        assert_eq!(rewrite(markup, &[]), markup);
    }

    #[test]
    fn test_single_link_wraps_exact_span() {
        let markup = "<p>Learn seo today</p>";
        let out = rewrite(markup, &[link(9, 12, "/guide")]);
        assert_eq!(
            out,
            "<p>Learn <a href=\"/guide\" data-autolink=\"1\">seo</a> today</p>"
        );
    }

    #[test]
    fn test_multiple_links_preserve_surrounding_bytes() {
        let markup = "<p>a seo b seo c</p>";
        let out = rewrite(markup, &[link(5, 8, "/1"), link(11, 14, "/2")]);
        assert_eq!(
            out,
            "<p>a <a href=\"/1\" data-autolink=\"1\">seo</a> b \
             <a href=\"/2\" data-autolink=\"1\">seo</a> c</p>"
        );
    }

    #[test]
    fn test_links_spliced_by_byte_position_regardless_of_input_order() {
        let markup = "<p>a seo b seo c</p>";
        let out = rewrite(markup, &[link(11, 14, "/2"), link(5, 8, "/1")]);
        assert_eq!(
            out,
            "<p>a <a href=\"/1\" data-autolink=\"1\">seo</a> b \
             <a href=\"/2\" data-autolink=\"1\">seo</a> c</p>"
        );
    }

    #[test]
    fn test_optional_attributes_rendered_in_order() {
        let markup = "<p>seo</p>";
        let out = rewrite(
            markup,
            &[InsertedLink {
                span: Span::new(3, 6),
                href: "/g".to_string(),
                attrs: AnchorAttributes {
                    title: Some("Guide".to_string()),
                    rel: Some("nofollow noopener".to_string()),
                    target: Some("_blank".to_string()),
                },
            }],
        );
        assert_eq!(
            out,
            "<p><a href=\"/g\" title=\"Guide\" rel=\"nofollow noopener\" \
             target=\"_blank\" data-autolink=\"1\">seo</a></p>"
        );
    }

    #[test]
    fn test_attribute_values_escaped() {
        let markup = "<p>seo</p>";
        let out = rewrite(
            markup,
            &[InsertedLink {
                span: Span::new(3, 6),
                href: "/g?a=1&b=2".to_string(),
                attrs: AnchorAttributes {
                    title: Some("a < \"b\"".to_string()),
                    ..AnchorAttributes::default()
                },
            }],
        );
        assert!(out.contains("href=\"/g?a=1&amp;b=2\""));
        assert!(out.contains("title=\"a &lt; &quot;b&quot;\""));
    }
}

use autolink_model::{ContentLookup, Destination, RenderContext, Rule};
use std::collections::HashMap;

/// A rule destination resolved to a concrete URL, classified for UTM
/// `apply_to` handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub url: String,
    pub internal: bool,
}

/// Resolve every candidate rule's destination up front.
///
/// All `InternalContent` ids are looked up in one batch call so a
/// render performs a single lookup regardless of match count. Rules
/// whose content no longer resolves are absent from the result; the
/// caller drops their matches for this render (a data-consistency
/// warning, not a failure).
#[must_use]
pub fn resolve_destinations(
    rules: &[&Rule],
    lookup: &dyn ContentLookup,
    ctx: &RenderContext,
) -> HashMap<u64, ResolvedDestination> {
    let internal_ids: Vec<u64> = rules
        .iter()
        .filter_map(|r| match &r.destination {
            Destination::InternalContent { content_id } => Some(*content_id),
            Destination::ExternalUrl { .. } => None,
        })
        .collect();
    let resolved = lookup.resolve_batch(&internal_ids);

    let mut destinations = HashMap::new();
    for rule in rules {
        match &rule.destination {
            Destination::InternalContent { content_id } => match resolved.get(content_id) {
                Some(content) => {
                    destinations.insert(
                        rule.id,
                        ResolvedDestination {
                            url: content.url.clone(),
                            internal: true,
                        },
                    );
                }
                None => {
                    log::warn!(
                        "Rule {}: internal content {} not found; dropping for this render",
                        rule.id,
                        content_id
                    );
                }
            },
            Destination::ExternalUrl { url } => {
                let normalized = normalize_external_url(url);
                let internal = is_internal_url(&normalized, ctx.site_host.as_deref());
                destinations.insert(
                    rule.id,
                    ResolvedDestination {
                        url: normalized,
                        internal,
                    },
                );
            }
        }
    }
    destinations
}

/// Lowercase the scheme and host of an absolute URL; path and query
/// are never touched
#[must_use]
pub fn normalize_external_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let scheme = &url[..scheme_end];
    if !scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return url.to_string();
    }

    let rest = &url[scheme_end + 3..];
    let host_end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let host = &rest[..host_end];
    let tail = &rest[host_end..];

    format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase(),
        tail
    )
}

/// A URL is internal when it is relative or its host matches the
/// render context's site host
fn is_internal_url(url: &str, site_host: Option<&str>) -> bool {
    let Some(scheme_end) = url.find("://") else {
        // Relative path, anchor, or schemeless URL
        return !url.starts_with("//");
    };
    let Some(site_host) = site_host else {
        return false;
    };
    let rest = &url[scheme_end + 3..];
    let host_end = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    rest[..host_end].eq_ignore_ascii_case(site_host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolink_model::StaticContentLookup;
    use pretty_assertions::assert_eq;

    fn rule(id: u64, destination: Destination) -> Rule {
        Rule::new(id, format!("rule {id}"), vec!["kw".to_string()], destination)
    }

    #[test]
    fn test_normalize_lowercases_scheme_and_host_only() {
        assert_eq!(
            normalize_external_url("HTTPS://Example.COM/Path?Q=UPPER"),
            "https://example.com/Path?Q=UPPER"
        );
    }

    #[test]
    fn test_normalize_leaves_relative_urls() {
        assert_eq!(normalize_external_url("/guide/seo"), "/guide/seo");
    }

    #[test]
    fn test_internal_classification() {
        assert!(is_internal_url("/guide", None));
        assert!(is_internal_url(
            "https://example.com/guide",
            Some("example.com")
        ));
        assert!(!is_internal_url(
            "https://other.com/guide",
            Some("example.com")
        ));
        assert!(!is_internal_url("https://example.com/x", None));
    }

    #[test]
    fn test_unresolvable_internal_destination_dropped() {
        let mut lookup = StaticContentLookup::new();
        lookup.insert(10, "/found", "Found", "post");

        let found = rule(1, Destination::InternalContent { content_id: 10 });
        let missing = rule(2, Destination::InternalContent { content_id: 11 });
        let rules = vec![&found, &missing];

        let ctx = RenderContext::for_markup("post", "/x");
        let destinations = resolve_destinations(&rules, &lookup, &ctx);

        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[&1].url, "/found");
        assert!(destinations[&1].internal);
        assert!(!destinations.contains_key(&2));
    }

    #[test]
    fn test_external_destination_classified_against_site_host() {
        let external = rule(
            1,
            Destination::ExternalUrl {
                url: "https://Example.com/page".to_string(),
            },
        );
        let rules = vec![&external];
        let lookup = StaticContentLookup::new();

        let ctx = RenderContext::for_markup("post", "/x").site_host("example.com");
        let destinations = resolve_destinations(&rules, &lookup, &ctx);
        assert!(destinations[&1].internal);
        assert_eq!(destinations[&1].url, "https://example.com/page");
    }
}

use autolink_model::{AppendMode, ApplyTo, RenderContext, Rule, RuleSnapshot, UtmRef, UtmTemplate};

/// Resolve the template effective for one rule: an explicit reference
/// wins, `Inherit` falls back to the category default, `None` means no
/// tracking at all
#[must_use]
pub fn effective_template<'s>(rule: &Rule, snapshot: &'s RuleSnapshot) -> Option<&'s UtmTemplate> {
    match &rule.utm_ref {
        UtmRef::Template(id) => snapshot.template(*id),
        UtmRef::Inherit => rule
            .category_id
            .and_then(|cid| snapshot.category(cid))
            .and_then(|category| category.default_utm_ref)
            .and_then(|tid| snapshot.template(tid)),
        UtmRef::None => None,
    }
}

/// Expand a template against the render context plus per-match tokens
/// and merge the resulting `utm_*` parameters into the URL's query
/// string per the template's append mode.
///
/// Returns the URL unchanged when `apply_to` excludes this destination
/// class.
#[must_use]
pub fn apply_template(
    url: &str,
    template: &UtmTemplate,
    ctx: &RenderContext,
    keyword: &str,
    rule_id: u64,
    internal: bool,
) -> String {
    let applies = match template.apply_to {
        ApplyTo::Internal => internal,
        ApplyTo::External => !internal,
        ApplyTo::Both => true,
    };
    if !applies {
        return url.to_string();
    }

    let params: Vec<(&'static str, String)> = template
        .fields
        .entries()
        .into_iter()
        .map(|(name, raw)| (name, expand_tokens(raw, ctx, keyword, rule_id)))
        .collect();

    merge_query(url, &params, template.append_mode)
}

/// Replace `{token}` placeholders; unknown tokens are left verbatim
fn expand_tokens(raw: &str, ctx: &RenderContext, keyword: &str, rule_id: u64) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let token = &rest[open + 1..open + close];
        match lookup_token(token, ctx, keyword, rule_id) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[open..=open + close]),
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup_token(token: &str, ctx: &RenderContext, keyword: &str, rule_id: u64) -> Option<String> {
    let value = match token {
        "post_id" => ctx.content_id.map(|id| id.to_string()).unwrap_or_default(),
        "post_type" => ctx.content_type.clone(),
        "post_title" => ctx.tokens.post_title.clone(),
        "post_slug" => ctx.tokens.post_slug.clone(),
        "primary_term" => ctx.tokens.primary_term.clone(),
        "author" => ctx.tokens.author.clone(),
        "site_name" => ctx.tokens.site_name.clone(),
        "date" => ctx.tokens.date.clone(),
        "keyword" => keyword.to_string(),
        "rule_id" => rule_id.to_string(),
        _ => return None,
    };
    Some(value)
}

/// Merge parameters into a URL query string, preserving everything
/// already there and keeping the fragment at the end
fn merge_query(url: &str, params: &[(&'static str, String)], mode: AppendMode) -> String {
    if mode == AppendMode::Never {
        // Adds nothing if any of the relevant parameters already exist
        let existing = existing_keys(url);
        if params.iter().any(|(name, _)| existing.contains(&(*name).to_string())) {
            return url.to_string();
        }
    }

    let (base, fragment) = match url.find('#') {
        Some(i) => (&url[..i], &url[i..]),
        None => (url, ""),
    };
    let (path, query) = match base.find('?') {
        Some(i) => (&base[..i], &base[i + 1..]),
        None => (base, ""),
    };

    let mut pairs: Vec<(String, Option<String>)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.find('=') {
            Some(i) => (p[..i].to_string(), Some(p[i + 1..].to_string())),
            None => (p.to_string(), None),
        })
        .collect();

    for (name, value) in params {
        let encoded = percent_encode(value);
        match pairs.iter_mut().find(|(k, _)| k == name) {
            Some(pair) => {
                if mode == AppendMode::AlwaysOverwrite {
                    pair.1 = Some(encoded);
                }
                // AppendIfMissing leaves the existing value alone
            }
            None => pairs.push(((*name).to_string(), Some(encoded))),
        }
    }

    if pairs.is_empty() {
        return format!("{path}{fragment}");
    }
    let joined: Vec<String> = pairs
        .into_iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{k}={v}"),
            None => k,
        })
        .collect();
    format!("{path}?{}{fragment}", joined.join("&"))
}

fn existing_keys(url: &str) -> Vec<String> {
    let base = url.split('#').next().unwrap_or(url);
    let Some(i) = base.find('?') else {
        return Vec::new();
    };
    base[i + 1..]
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| p.split('=').next().unwrap_or(p).to_string())
        .collect()
}

/// Minimal query-component encoding: unreserved characters pass
/// through, everything else becomes %XX
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolink_model::{Category, Destination, SnapshotVersion, UtmFields};
    use pretty_assertions::assert_eq;

    fn template(id: u64, campaign: &str, apply_to: ApplyTo, mode: AppendMode) -> UtmTemplate {
        UtmTemplate {
            id,
            name: format!("template {id}"),
            fields: UtmFields {
                source: "site".to_string(),
                medium: "autolink".to_string(),
                campaign: campaign.to_string(),
                term: None,
                content: None,
            },
            apply_to,
            append_mode: mode,
        }
    }

    fn ctx() -> RenderContext {
        RenderContext::for_content(7, "post", "/blog/a")
    }

    #[test]
    fn test_token_substitution() {
        let t = template(1, "{post_type}-{rule_id}", ApplyTo::Both, AppendMode::AppendIfMissing);
        let url = apply_template("/guide", &t, &ctx(), "seo", 42, true);
        assert_eq!(
            url,
            "/guide?utm_source=site&utm_medium=autolink&utm_campaign=post-42"
        );
    }

    #[test]
    fn test_keyword_and_unknown_tokens() {
        let t = template(1, "{keyword}-{nope}", ApplyTo::Both, AppendMode::AppendIfMissing);
        let url = apply_template("/guide", &t, &ctx(), "seo audit", 1, true);
        // Known tokens expand (and encode), unknown ones stay verbatim
        assert!(url.contains("utm_campaign=seo%20audit-%7Bnope%7D"));
    }

    #[test]
    fn test_apply_to_excludes_wrong_class() {
        let t = template(1, "c", ApplyTo::Internal, AppendMode::AppendIfMissing);
        let untouched = apply_template("https://other.com/x", &t, &ctx(), "kw", 1, false);
        assert_eq!(untouched, "https://other.com/x");
    }

    #[test]
    fn test_append_if_missing_keeps_existing_value() {
        let t = template(1, "new", ApplyTo::Both, AppendMode::AppendIfMissing);
        let url = apply_template("/x?utm_campaign=old", &t, &ctx(), "kw", 1, true);
        assert!(url.contains("utm_campaign=old"));
        assert!(!url.contains("utm_campaign=new"));
        assert!(url.contains("utm_source=site"));
    }

    #[test]
    fn test_always_overwrite_replaces_value() {
        let t = template(1, "new", ApplyTo::Both, AppendMode::AlwaysOverwrite);
        let url = apply_template("/x?utm_campaign=old&keep=1", &t, &ctx(), "kw", 1, true);
        assert!(url.contains("utm_campaign=new"));
        assert!(url.contains("keep=1"));
        assert!(!url.contains("utm_campaign=old"));
    }

    #[test]
    fn test_never_mode_backs_off_entirely() {
        let t = template(1, "c", ApplyTo::Both, AppendMode::Never);
        let untouched = apply_template("/x?utm_source=existing", &t, &ctx(), "kw", 1, true);
        assert_eq!(untouched, "/x?utm_source=existing");

        let applied = apply_template("/x?other=1", &t, &ctx(), "kw", 1, true);
        assert!(applied.contains("utm_source=site"));
    }

    #[test]
    fn test_fragment_stays_last() {
        let t = template(1, "c", ApplyTo::Both, AppendMode::AppendIfMissing);
        let url = apply_template("/x#section", &t, &ctx(), "kw", 1, true);
        assert!(url.ends_with("#section"));
        assert!(url.contains("?utm_source=site"));
    }

    #[test]
    fn test_effective_template_resolution() {
        let t1 = template(1, "explicit", ApplyTo::Both, AppendMode::AppendIfMissing);
        let t2 = template(2, "inherited", ApplyTo::Both, AppendMode::AppendIfMissing);
        let category = Category::new(5, "C").default_utm(2);
        let snapshot = RuleSnapshot::new(vec![], vec![category], vec![t1, t2], SnapshotVersion(1));

        let base = Rule::new(
            1,
            "r",
            vec!["kw".to_string()],
            Destination::ExternalUrl {
                url: "https://x.com".to_string(),
            },
        );

        let explicit = base.clone().utm_ref(UtmRef::Template(1));
        assert_eq!(effective_template(&explicit, &snapshot).unwrap().id, 1);

        let inherited = base.clone().category(5).utm_ref(UtmRef::Inherit);
        assert_eq!(effective_template(&inherited, &snapshot).unwrap().id, 2);

        let inherit_no_category = base.clone().utm_ref(UtmRef::Inherit);
        assert!(effective_template(&inherit_no_category, &snapshot).is_none());

        let none = base.utm_ref(UtmRef::None);
        assert!(effective_template(&none, &snapshot).is_none());
    }
}

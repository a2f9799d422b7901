use autolink_model::Rule;

/// The optional attributes an inserted anchor carries besides `href`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorAttributes {
    pub title: Option<String>,
    pub rel: Option<String>,
    pub target: Option<String>,
}

/// Derive anchor attributes from a rule's settings.
///
/// The title falls back to the rule title unless suppressed; `new_tab`
/// implies both `target="_blank"` and `rel="noopener"`.
#[must_use]
pub fn build_attributes(rule: &Rule) -> AnchorAttributes {
    let title = if rule.attributes.suppress_title {
        None
    } else {
        Some(
            rule.attributes
                .title_text
                .clone()
                .unwrap_or_else(|| rule.title.clone()),
        )
    };

    let mut rel_parts = Vec::new();
    if rule.attributes.nofollow {
        rel_parts.push("nofollow");
    }
    if rule.attributes.new_tab {
        rel_parts.push("noopener");
    }
    let rel = if rel_parts.is_empty() {
        None
    } else {
        Some(rel_parts.join(" "))
    };

    let target = rule.attributes.new_tab.then(|| "_blank".to_string());

    AnchorAttributes { title, rel, target }
}

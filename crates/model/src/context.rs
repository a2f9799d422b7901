use serde::{Deserialize, Serialize};

/// The render context for one document: identity, routing, and the
/// token bindings available to UTM templates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderContext {
    /// Content id when rendering stored content; `None` for raw markup
    pub content_id: Option<u64>,

    /// Content type used by scope filtering (post, page, ...)
    pub content_type: String,

    /// Path of the page being rendered, used by whitelist/blacklist scope
    pub page_path: String,

    /// Host of the site, used to classify destination URLs as internal
    pub site_host: Option<String>,

    /// Token values for UTM field expansion
    #[serde(default)]
    pub tokens: TokenBindings,
}

impl RenderContext {
    /// Create a context for stored content
    pub fn for_content(
        content_id: u64,
        content_type: impl Into<String>,
        page_path: impl Into<String>,
    ) -> Self {
        Self {
            content_id: Some(content_id),
            content_type: content_type.into(),
            page_path: page_path.into(),
            site_host: None,
            tokens: TokenBindings::default(),
        }
    }

    /// Create a context for raw markup (previews against arbitrary input)
    pub fn for_markup(content_type: impl Into<String>, page_path: impl Into<String>) -> Self {
        Self {
            content_id: None,
            content_type: content_type.into(),
            page_path: page_path.into(),
            site_host: None,
            tokens: TokenBindings::default(),
        }
    }

    /// Builder: set the site host
    #[must_use]
    pub fn site_host(mut self, host: impl Into<String>) -> Self {
        self.site_host = Some(host.into());
        self
    }

    /// Builder: set the token bindings
    #[must_use]
    pub fn tokens(mut self, tokens: TokenBindings) -> Self {
        self.tokens = tokens;
        self
    }
}

/// Document-level token values; per-match tokens (matched keyword,
/// rule id) are bound by the UTM applier
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBindings {
    pub post_title: String,
    pub post_slug: String,
    pub primary_term: String,
    pub author: String,
    pub site_name: String,
    pub date: String,
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single linking rule: keyword phrases mapped to one destination,
/// with caps, placement restrictions and scope filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    /// Unique rule id
    pub id: u64,

    /// Human-readable rule title (also the default anchor title)
    pub title: String,

    /// Weak reference to a category; the category may no longer exist
    pub category_id: Option<u64>,

    /// Keyword phrases this rule links; order is preserved
    pub keywords: Vec<String>,

    /// Where accepted matches link to
    pub destination: Destination,

    /// Anchor attribute settings
    #[serde(default)]
    pub attributes: RuleAttributes,

    /// Per-page and per-block caps
    #[serde(default)]
    pub limits: RuleLimits,

    /// Which block types this rule may link inside
    #[serde(default)]
    pub placement: PlacementPolicy,

    /// Content-type and path filters
    #[serde(default)]
    pub scope: RuleScope,

    /// UTM template reference
    #[serde(default)]
    pub utm_ref: UtmRef,

    /// Higher priority wins contested slots and overlap ties
    #[serde(default)]
    pub priority: i32,

    /// Only active rules are ever candidates
    #[serde(default)]
    pub status: RuleStatus,

    /// Creation timestamp, informational only
    #[serde(default)]
    pub created_at: String,
}

impl Rule {
    /// Create a rule with default attributes, limits, placement and scope
    pub fn new(
        id: u64,
        title: impl Into<String>,
        keywords: Vec<String>,
        destination: Destination,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            category_id: None,
            keywords,
            destination,
            attributes: RuleAttributes::default(),
            limits: RuleLimits::default(),
            placement: PlacementPolicy::default(),
            scope: RuleScope::default(),
            utm_ref: UtmRef::default(),
            priority: 0,
            status: RuleStatus::Active,
            created_at: String::new(),
        }
    }

    /// Builder: set the category
    #[must_use]
    pub const fn category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Builder: set the priority
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set the per-page cap
    #[must_use]
    pub const fn max_per_page(mut self, cap: u32) -> Self {
        self.limits.max_per_page = Some(cap);
        self
    }

    /// Builder: set the per-block cap
    #[must_use]
    pub const fn max_per_block(mut self, cap: u32) -> Self {
        self.limits.max_per_block = Some(cap);
        self
    }

    /// Builder: set the placement policy
    #[must_use]
    pub fn placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    /// Builder: set the scope
    #[must_use]
    pub fn scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: set the UTM reference
    #[must_use]
    pub fn utm_ref(mut self, utm_ref: UtmRef) -> Self {
        self.utm_ref = utm_ref;
        self
    }

    /// Builder: set anchor attributes
    #[must_use]
    pub fn attributes(mut self, attributes: RuleAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder: mark the rule inactive
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.status = RuleStatus::Inactive;
        self
    }

    /// Whether the rule is active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }
}

/// Link destination: exactly one of an internal content reference
/// or a literal external URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Destination {
    /// Resolved through the content-lookup collaborator at render time
    InternalContent { content_id: u64 },
    /// Passed through verbatim (scheme/host lowercased)
    ExternalUrl { url: String },
}

/// Anchor attribute settings for a rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleAttributes {
    /// Explicit title attribute; falls back to the rule title when unset
    pub title_text: Option<String>,

    /// Omit the title attribute entirely
    #[serde(default)]
    pub suppress_title: bool,

    /// Add rel="nofollow"
    #[serde(default)]
    pub nofollow: bool,

    /// Open in a new tab (target="_blank" + rel="noopener")
    #[serde(default)]
    pub new_tab: bool,
}

/// Per-document and per-block caps for one rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleLimits {
    /// Maximum accepted links for this rule per document
    pub max_per_page: Option<u32>,

    /// Maximum accepted links for this rule per block
    pub max_per_block: Option<u32>,
}

/// Which block types a rule may link inside
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementPolicy {
    /// Heading placement: none, selected levels, or all levels
    pub headings: HeadingPlacement,
    pub paragraphs: bool,
    pub lists: bool,
    pub captions: bool,
    pub widgets: bool,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            headings: HeadingPlacement::None,
            paragraphs: true,
            lists: true,
            captions: false,
            widgets: false,
        }
    }
}

impl PlacementPolicy {
    /// Allow every block type at every heading level
    #[must_use]
    pub fn everywhere() -> Self {
        Self {
            headings: HeadingPlacement::All,
            paragraphs: true,
            lists: true,
            captions: true,
            widgets: true,
        }
    }

    /// Whether a heading at `level` (1..=6) is allowed
    #[must_use]
    pub fn allows_heading(&self, level: u8) -> bool {
        match &self.headings {
            HeadingPlacement::None => false,
            HeadingPlacement::All => true,
            HeadingPlacement::Selected(levels) => levels.contains(&level),
        }
    }
}

/// Heading placement policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HeadingPlacement {
    /// Never link inside headings
    None,
    /// Link only inside the listed levels (1..=6); must be non-empty
    Selected(BTreeSet<u8>),
    /// Link inside any heading
    All,
}

/// Content-type and path filters for one rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleScope {
    /// Content types this rule applies to; empty means all
    #[serde(default)]
    pub content_types: BTreeSet<String>,

    /// Exclusive allow-list of path fragments; when non-empty the
    /// blacklist is ignored
    #[serde(default)]
    pub whitelist_paths: Vec<String>,

    /// Path fragments this rule never applies to
    #[serde(default)]
    pub blacklist_paths: Vec<String>,
}

impl RuleScope {
    /// Whether the scope places no restriction on content type
    #[must_use]
    pub fn any_content_type(&self) -> bool {
        self.content_types.is_empty()
    }
}

/// How a rule references a UTM template
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum UtmRef {
    /// Use the category's default template, if any
    #[default]
    Inherit,
    /// Use this template
    Template(u64),
    /// Never apply tracking parameters
    None,
}

/// Rule activation status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

/// A rule category with an optional aggregate link cap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,

    /// Default UTM template for member rules with `UtmRef::Inherit`
    pub default_utm_ref: Option<u64>,

    /// Ceiling on accepted links across all member rules, per document
    pub category_cap: Option<u32>,
}

impl Category {
    /// Create a category with no default template and no cap
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: String::new(),
            description: String::new(),
            default_utm_ref: None,
            category_cap: None,
        }
    }

    /// Builder: set the aggregate cap
    #[must_use]
    pub const fn cap(mut self, cap: u32) -> Self {
        self.category_cap = Some(cap);
        self
    }

    /// Builder: set the default UTM template
    #[must_use]
    pub const fn default_utm(mut self, template_id: u64) -> Self {
        self.default_utm_ref = Some(template_id);
        self
    }
}

/// A named set of tracking-parameter field templates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UtmTemplate {
    pub id: u64,
    pub name: String,
    pub fields: UtmFields,
    pub apply_to: ApplyTo,
    pub append_mode: AppendMode,
}

/// UTM field templates; values may contain `{token}` placeholders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UtmFields {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl UtmFields {
    /// The `utm_*` parameter names and raw field templates, in order
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = vec![
            ("utm_source", self.source.as_str()),
            ("utm_medium", self.medium.as_str()),
            ("utm_campaign", self.campaign.as_str()),
        ];
        if let Some(term) = &self.term {
            entries.push(("utm_term", term.as_str()));
        }
        if let Some(content) = &self.content {
            entries.push(("utm_content", content.as_str()));
        }
        entries
    }
}

/// Which destination class a template applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplyTo {
    Internal,
    External,
    Both,
}

/// How UTM parameters merge into an existing query string
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppendMode {
    /// Only add parameters absent from the URL
    AppendIfMissing,
    /// Replace any existing value
    AlwaysOverwrite,
    /// Add nothing if any relevant parameter already exists
    Never,
}

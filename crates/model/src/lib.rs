//! Shared data model for the linking engine: rules, categories, UTM
//! templates, the versioned rule-set snapshot, the render context, and
//! the collaborator traits for rule persistence and content lookup.

mod context;
mod error;
mod lookup;
mod snapshot;
mod types;

pub use context::{RenderContext, TokenBindings};
pub use error::{ModelError, Result};
pub use lookup::{ContentLookup, ResolvedContent, RuleRepository, StaticContentLookup};
pub use snapshot::{IssueKind, RuleSnapshot, SnapshotIssue, SnapshotVersion};
pub use types::{
    AppendMode, ApplyTo, Category, Destination, HeadingPlacement, PlacementPolicy, Rule,
    RuleAttributes, RuleLimits, RuleScope, RuleStatus, UtmFields, UtmRef, UtmTemplate,
};

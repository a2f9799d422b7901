//! The internal linking rule engine.
//!
//! Ties the pipeline together: scope filtering, block segmentation,
//! multi-pattern matching, cap allocation, destination resolution, UTM
//! parameter injection, attribute building and byte-faithful rewriting.
//! Rendering is a pure transformation over an immutable rule-set
//! snapshot: the same snapshot version and input always produce the
//! same output, and re-rendering already-rewritten markup is a no-op.

mod attrs;
mod cache;
mod config;
mod engine;
mod error;
mod preview;
mod resolve;
mod rewriter;
mod scope;
mod utm;

pub use attrs::{build_attributes, AnchorAttributes};
pub use cache::RenderCache;
pub use config::EngineConfig;
pub use engine::{LinkEngine, RenderOutcome};
pub use error::{EngineError, Result};
pub use preview::{AcceptedLink, PreviewReport, RejectedMatch};
pub use resolve::{normalize_external_url, resolve_destinations, ResolvedDestination};
pub use rewriter::{rewrite, InsertedLink};
pub use scope::candidates;
pub use utm::{apply_template, effective_template};

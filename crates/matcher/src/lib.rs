//! Multi-pattern keyword matching and link allocation.
//!
//! One combined aho-corasick automaton over every candidate rule's
//! keyword phrases keeps per-block scanning single-pass regardless of
//! how many rules are configured. Scanning produces raw overlapping
//! candidates; overlap resolution applies longest-match / priority /
//! rule-id precedence, and the allocator enforces rule, category and
//! document caps deterministically.

mod allocator;
mod error;
mod normalize;
mod phrases;
mod scan;

pub use allocator::{Allocation, Allocator, RejectReason, RejectedCandidate};
pub use error::{MatchError, Result};
pub use normalize::{FoldOptions, FoldedRun};
pub use phrases::PhraseSet;
pub use scan::{placement_allows, MatchCandidate, ScanSettings, Scanner};

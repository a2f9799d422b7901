use crate::attrs::build_attributes;
use crate::cache::RenderCache;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::preview::{AcceptedLink, PreviewReport, RejectedMatch};
use crate::resolve::resolve_destinations;
use crate::rewriter::{rewrite, InsertedLink};
use crate::scope;
use crate::utm::{apply_template, effective_template};
use autolink_matcher::{Allocator, MatchCandidate, Scanner};
use autolink_model::{
    ContentLookup, RenderContext, RuleRepository, RuleSnapshot, SnapshotIssue, SnapshotVersion,
};
use autolink_segmenter::{segment, Block};

/// The result of rendering one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    /// The rewritten document, or the input verbatim when nothing was
    /// inserted or the pipeline failed closed
    pub html: String,

    /// How many links this render inserted
    pub links_added: usize,

    /// Whether the output came from the render cache
    pub from_cache: bool,

    /// Set when the pipeline failed and the document was passed
    /// through unchanged
    pub diagnostic: Option<String>,
}

impl RenderOutcome {
    fn passthrough(markup: &str, diagnostic: String) -> Self {
        Self {
            html: markup.to_string(),
            links_added: 0,
            from_cache: false,
            diagnostic: Some(diagnostic),
        }
    }
}

/// The linking engine: one immutable rule-set snapshot, a content
/// lookup, and an output cache.
///
/// `render` never fails from the caller's perspective: any pipeline
/// error degrades to returning the input unchanged with a diagnostic.
/// Swapping in a new snapshot bumps the cache key, so stale renderings
/// are never served.
pub struct LinkEngine<L: ContentLookup> {
    config: EngineConfig,
    snapshot: RuleSnapshot,
    issues: Vec<SnapshotIssue>,
    lookup: L,
    cache: Option<RenderCache>,
}

impl<L: ContentLookup> LinkEngine<L> {
    /// Create an engine over a validated snapshot
    pub fn new(config: EngineConfig, snapshot: RuleSnapshot, lookup: L) -> Result<Self> {
        config.validate()?;
        let issues = snapshot.validate();
        let cache = config
            .cache_enabled
            .then(|| RenderCache::new(config.cache_capacity));
        Ok(Self {
            config,
            snapshot,
            issues,
            lookup,
            cache,
        })
    }

    /// Create an engine from a repository, capturing a fresh snapshot
    pub fn from_repository<R: RuleRepository>(
        config: EngineConfig,
        repository: &R,
        lookup: L,
    ) -> Result<Self> {
        let snapshot = repository.load_snapshot()?;
        Self::new(config, snapshot, lookup)
    }

    /// The version of the snapshot currently in use
    #[must_use]
    pub fn current_version(&self) -> SnapshotVersion {
        self.snapshot.version
    }

    /// Swap in a new snapshot. Cached renderings keyed by the old
    /// version become unreachable and age out.
    pub fn replace_snapshot(&mut self, snapshot: RuleSnapshot) {
        self.issues = snapshot.validate();
        self.snapshot = snapshot;
        log::info!("Engine snapshot replaced ({})", self.snapshot.version);
    }

    /// Render one document, consulting and filling the cache.
    ///
    /// A pipeline failure (malformed markup, automaton build error)
    /// returns the input unchanged with a diagnostic; it is never a
    /// hard error for the caller.
    pub fn render(&mut self, content_id: u64, markup: &str, ctx: &RenderContext) -> RenderOutcome {
        let version = self.snapshot.version;
        if let Some(cache) = &mut self.cache {
            if let Some(html) = cache.get(content_id, version) {
                log::debug!("Render cache hit for content {content_id} at {version}");
                return RenderOutcome {
                    html: html.clone(),
                    links_added: 0,
                    from_cache: true,
                    diagnostic: None,
                };
            }
        }

        let outcome = self.render_markup(markup, ctx);
        if outcome.diagnostic.is_none() {
            if let Some(cache) = &mut self.cache {
                cache.put(content_id, version, outcome.html.clone());
            }
        }
        outcome
    }

    /// Render markup without cache involvement (no stable content id)
    pub fn render_markup(&self, markup: &str, ctx: &RenderContext) -> RenderOutcome {
        match self.run_pipeline(markup, ctx) {
            Ok((html, accepted, _rejected)) => RenderOutcome {
                links_added: accepted.len(),
                html,
                from_cache: false,
                diagnostic: None,
            },
            Err(err) => {
                log::warn!("Render failed, returning document unchanged: {err}");
                RenderOutcome::passthrough(markup, err.to_string())
            }
        }
    }

    /// Dry run: report what a render would do without producing output.
    /// Unlike `render`, pipeline errors surface to the caller here.
    pub fn preview(&self, markup: &str, ctx: &RenderContext) -> Result<PreviewReport> {
        let (_, accepted, rejected) = self.run_pipeline(markup, ctx)?;
        Ok(PreviewReport { accepted, rejected })
    }

    fn run_pipeline(
        &self,
        markup: &str,
        ctx: &RenderContext,
    ) -> Result<(String, Vec<AcceptedLink>, Vec<RejectedMatch>)> {
        let candidates = scope::candidates(&self.snapshot, &self.issues, ctx);
        if candidates.is_empty() {
            return Ok((markup.to_string(), Vec::new(), Vec::new()));
        }

        let blocks = segment(markup)?;
        let scanner = Scanner::new(candidates.clone(), self.config.scan_settings())?;

        let raw = self.scan(&scanner, markup, &blocks);
        let resolved = scanner.resolve_overlaps(raw);

        let allocator = Allocator::new(
            &candidates,
            &self.snapshot.categories,
            self.config.default_page_cap,
        );
        let allocation = allocator.allocate(resolved, &blocks);

        let destinations = resolve_destinations(&candidates, &self.lookup, ctx);

        let mut links = Vec::with_capacity(allocation.accepted.len());
        let mut accepted = Vec::with_capacity(allocation.accepted.len());
        let mut rejected: Vec<RejectedMatch> = allocation
            .rejected
            .into_iter()
            .map(|r| RejectedMatch {
                rule_id: r.candidate.rule_id,
                block_id: r.candidate.block_id,
                matched_text: r.candidate.matched_text,
                reason: r.reason.as_str().to_string(),
            })
            .collect();

        for candidate in allocation.accepted {
            let Some(rule) = self.snapshot.rule(candidate.rule_id) else {
                continue;
            };
            let Some(destination) = destinations.get(&candidate.rule_id) else {
                rejected.push(RejectedMatch {
                    rule_id: candidate.rule_id,
                    block_id: candidate.block_id,
                    matched_text: candidate.matched_text,
                    reason: "destination_unresolved".to_string(),
                });
                continue;
            };

            let url = match effective_template(rule, &self.snapshot) {
                Some(template) => apply_template(
                    &destination.url,
                    template,
                    ctx,
                    &candidate.matched_text,
                    rule.id,
                    destination.internal,
                ),
                None => destination.url.clone(),
            };

            accepted.push(AcceptedLink {
                rule_id: candidate.rule_id,
                block_id: candidate.block_id,
                matched_text: candidate.matched_text.clone(),
                url: url.clone(),
            });
            links.push(InsertedLink {
                span: candidate.span,
                href: url,
                attrs: build_attributes(rule),
            });
        }

        let html = rewrite(markup, &links);
        log::debug!(
            "Render inserted {} links ({} rejected) at {}",
            accepted.len(),
            rejected.len(),
            self.snapshot.version
        );
        Ok((html, accepted, rejected))
    }

    /// Scan blocks, optionally in bounded-size chunks. Chunking keeps
    /// scan state per chunk but output is identical since matching is
    /// per-run anyway.
    fn scan(&self, scanner: &Scanner<'_>, markup: &str, blocks: &[Block]) -> Vec<MatchCandidate> {
        if !self.config.chunking || blocks.len() <= self.config.chunk_block_limit {
            return scanner.scan_blocks(markup, blocks);
        }

        let mut candidates = Vec::new();
        for chunk in blocks.chunks(self.config.chunk_block_limit) {
            candidates.extend(scanner.scan_blocks(markup, chunk));
        }
        candidates
    }
}

impl<L: ContentLookup> std::fmt::Debug for LinkEngine<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkEngine")
            .field("version", &self.snapshot.version)
            .field("rules", &self.snapshot.rules.len())
            .field("issues", &self.issues.len())
            .field("cache", &self.cache)
            .finish()
    }
}

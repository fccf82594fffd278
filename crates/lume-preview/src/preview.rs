//! The render pipeline and its scheduling.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use lume_cache::{CacheBucket, FifoCache, NullCache};
use lume_config::Config;
use lume_diagrams::consts::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_WIDTH, DEFAULT_TIMEOUT,
};
use lume_diagrams::{
    DiagramEngine, DiagramRenderer, KrokiEngine, LazyEngine, MermaidEngine,
    PlaceholderProcessor, Theme, extract_placeholders,
};
use lume_renderer::{HtmlBackend, MarkdownRenderer};
use lume_sanitize::Sanitizer;

use crate::document::{ConvertedMarkup, DiagramEvent, RenderedDocument};
use crate::fence::GenerationFence;
use crate::live::LiveDocument;

/// Default pause between display and the diagram pass.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default number of converted documents kept in memory.
pub const DEFAULT_RENDER_CACHE_CAPACITY: usize = lume_cache::DEFAULT_CAPACITY;

type RenderCache = Box<dyn CacheBucket<String, Arc<ConvertedMarkup>>>;

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub gfm: bool,
    pub math: bool,
    /// Keep converted documents keyed by their source.
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub settle_delay: Duration,
    pub max_concurrent: usize,
    pub diagram_cache_capacity: usize,
    pub max_width: u32,
    /// Render through Kroki instead of the in-process Mermaid engine.
    pub kroki_url: Option<String>,
    pub kroki_timeout: Duration,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            math: true,
            cache_enabled: true,
            cache_capacity: DEFAULT_RENDER_CACHE_CAPACITY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            diagram_cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_width: DEFAULT_MAX_WIDTH,
            kroki_url: None,
            kroki_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl From<&Config> for PreviewOptions {
    fn from(config: &Config) -> Self {
        Self {
            gfm: config.render.gfm,
            math: config.render.math,
            cache_enabled: config.cache.enabled,
            cache_capacity: config.cache.capacity,
            settle_delay: config.scheduler.settle_delay(),
            max_concurrent: config.diagrams.max_concurrent,
            diagram_cache_capacity: config.diagrams.cache_capacity,
            max_width: config.diagrams.max_width,
            kroki_url: config.diagrams.kroki_url.clone(),
            kroki_timeout: config.diagrams.timeout(),
        }
    }
}

impl PreviewOptions {
    /// Engine slot for these options. Nothing is constructed until the first
    /// diagram needs it.
    #[must_use]
    pub fn engine(&self) -> LazyEngine {
        match self.kroki_url.clone() {
            Some(url) => {
                let timeout = self.kroki_timeout;
                LazyEngine::new(move || {
                    Ok(Arc::new(KrokiEngine::new(url.clone()).with_timeout(timeout))
                        as Arc<dyn DiagramEngine>)
                })
            }
            None => LazyEngine::new(|| Ok(Arc::new(MermaidEngine::new()) as Arc<dyn DiagramEngine>)),
        }
    }
}

/// Markdown preview pipeline.
///
/// [`render`](Self::render) converts synchronously and returns a document
/// that can be shown at once; [`fill_diagrams`](Self::fill_diagrams) renders
/// its diagrams afterwards. Each call to `render` starts a new generation
/// and makes the diagram passes of all earlier ones stale.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use lume_preview::{Preview, PreviewOptions};
/// use lume_diagrams::Theme;
///
/// # async fn run() {
/// let preview = Preview::new(PreviewOptions::default());
/// let mut live = preview.live_document();
///
/// let doc = preview.render("# Title\n\n```diagram\nA --> B\n```");
/// live.show(doc.clone());
///
/// let mut events = preview.fill_diagrams(&doc, Theme::Light);
/// while let Some(event) = events.next().await {
///     live.apply(&event);
/// }
/// let html = live.to_html();
/// # }
/// ```
pub struct Preview {
    options: PreviewOptions,
    cache: RenderCache,
    sanitizer: Sanitizer,
    renderer: Arc<DiagramRenderer>,
    fence: Arc<GenerationFence>,
}

impl Preview {
    /// Create a pipeline with the engine chosen by `options`.
    #[must_use]
    pub fn new(options: PreviewOptions) -> Self {
        let engine = options.engine();
        Self::with_engine(options, engine)
    }

    /// Create a pipeline rendering diagrams through `engine`.
    #[must_use]
    pub fn with_engine(options: PreviewOptions, engine: LazyEngine) -> Self {
        let cache: RenderCache = if options.cache_enabled {
            Box::new(FifoCache::new(options.cache_capacity))
        } else {
            Box::new(NullCache)
        };
        let renderer = DiagramRenderer::new(engine)
            .with_max_concurrent(options.max_concurrent)
            .with_max_width(options.max_width)
            .with_cache_capacity(options.diagram_cache_capacity);

        Self {
            options,
            cache,
            sanitizer: Sanitizer::new(),
            renderer: Arc::new(renderer),
            fence: Arc::new(GenerationFence::new()),
        }
    }

    /// Replace the converted-markup cache.
    #[must_use]
    pub fn with_render_cache<C>(mut self, cache: C) -> Self
    where
        C: CacheBucket<String, Arc<ConvertedMarkup>> + 'static,
    {
        self.cache = Box::new(cache);
        self
    }

    #[must_use]
    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    #[must_use]
    pub fn diagram_renderer(&self) -> &DiagramRenderer {
        &self.renderer
    }

    /// Latest issued generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.fence.current()
    }

    /// An empty visible document fenced by this pipeline.
    #[must_use]
    pub fn live_document(&self) -> LiveDocument {
        LiveDocument::new(Arc::clone(&self.fence))
    }

    /// Convert `source` into a displayable document.
    ///
    /// Starts a new generation. Never suspends; diagram blocks are left as
    /// placeholders for [`fill_diagrams`](Self::fill_diagrams).
    pub fn render(&self, source: &str) -> RenderedDocument {
        let generation = self.fence.advance();

        let key = source.to_owned();
        let converted = if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(generation, "Render cache hit");
            hit
        } else {
            let converted = Arc::new(self.convert(source, generation));
            self.cache.put(key, Arc::clone(&converted));
            converted
        };

        let extraction = extract_placeholders(&converted.markup, generation);
        tracing::debug!(
            generation,
            diagrams = extraction.placeholders.len(),
            "Rendered document"
        );

        RenderedDocument {
            generation,
            markup: extraction.markup,
            outline: converted.outline.clone(),
            placeholders: extraction.placeholders,
        }
    }

    fn convert(&self, source: &str, generation: u64) -> ConvertedMarkup {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_gfm(self.options.gfm)
            .with_math(self.options.math)
            .with_processor(PlaceholderProcessor::new())
            .render_markdown(source);

        for warning in &result.warnings {
            tracing::debug!(generation, warning = %warning, "Conversion warning");
        }

        ConvertedMarkup {
            markup: self.sanitizer.sanitize(&result.html),
            outline: result.toc,
        }
    }

    /// Render the pending diagrams of `doc`.
    ///
    /// The returned stream does nothing until polled. It waits the settling
    /// delay, then renders placeholders in document order with at most
    /// `max_concurrent` in flight, yielding each result as it completes.
    /// Once `doc` is no longer the latest generation the stream ends and
    /// any unfinished results are dropped.
    pub fn fill_diagrams(&self, doc: &RenderedDocument, theme: Theme) -> DiagramStream {
        let generation = doc.generation;
        let mut jobs: Vec<_> = doc.pending().cloned().collect();
        if jobs.is_empty() {
            return DiagramStream::empty();
        }

        let settle_delay = self.options.settle_delay;
        let concurrency = self.renderer.max_concurrent();
        let renderer = Arc::clone(&self.renderer);
        let start_fence = Arc::clone(&self.fence);
        let job_fence = Arc::clone(&self.fence);
        let yield_fence = Arc::clone(&self.fence);

        let queued = stream::once(tokio::time::sleep(settle_delay))
            .map(move |()| {
                if start_fence.is_current(generation) {
                    stream::iter(std::mem::take(&mut jobs))
                } else {
                    tracing::debug!(generation, "Diagram pass superseded before start");
                    stream::iter(Vec::new())
                }
            })
            .flatten();

        let events = queued
            .map(move |placeholder| {
                let renderer = Arc::clone(&renderer);
                let fence = Arc::clone(&job_fence);
                async move {
                    if !fence.is_current(generation) {
                        return None;
                    }
                    Some(renderer.render(placeholder, theme).await)
                }
            })
            .buffer_unordered(concurrency)
            .take_while(move |result| {
                let fresh = result.is_some() && yield_fence.is_current(generation);
                if !fresh {
                    tracing::debug!(generation, "Discarding stale diagram results");
                }
                future::ready(fresh)
            })
            .filter_map(move |result| {
                future::ready(result.map(|placeholder| DiagramEvent::new(generation, placeholder)))
            });

        DiagramStream {
            inner: events.boxed(),
        }
    }

    /// Purge cached diagrams rendered for the theme other than `theme`.
    pub fn invalidate_theme_cache(&self, theme: Theme) -> usize {
        self.renderer.invalidate_theme(theme)
    }
}

/// Results of one diagram pass, in completion order.
///
/// Lazy: nothing is rendered until the stream is polled. Finite and not
/// restartable.
pub struct DiagramStream {
    inner: BoxStream<'static, DiagramEvent>,
}

impl DiagramStream {
    fn empty() -> Self {
        Self {
            inner: stream::empty().boxed(),
        }
    }
}

impl Stream for DiagramStream {
    type Item = DiagramEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for DiagramStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lume_diagrams::{DiagramRequest, DiagramState, EngineError, SkipReason};
    use pretty_assertions::assert_eq;

    use super::*;

    fn options() -> PreviewOptions {
        PreviewOptions {
            settle_delay: Duration::from_millis(50),
            ..PreviewOptions::default()
        }
    }

    fn preview() -> Preview {
        Preview::new(options())
    }

    /// Replace every placeholder id in the markup with a fixed token.
    fn without_ids(doc: &RenderedDocument) -> String {
        doc.placeholders
            .iter()
            .fold(doc.markup.clone(), |markup, p| markup.replace(&p.id, "ID"))
    }

    fn fence(lang: &str, body: &str) -> String {
        format!("```{lang}\n{body}\n```\n")
    }

    async fn collect(stream: DiagramStream) -> Vec<DiagramEvent> {
        stream.collect().await
    }

    struct CountingCache {
        inner: FifoCache<String, Arc<ConvertedMarkup>>,
        puts: Arc<AtomicUsize>,
    }

    impl CacheBucket<String, Arc<ConvertedMarkup>> for CountingCache {
        fn get(&self, key: &String) -> Option<Arc<ConvertedMarkup>> {
            self.inner.get(key)
        }

        fn put(&self, key: String, value: Arc<ConvertedMarkup>) {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value);
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let preview = preview();
        let source = format!("# Title\n\nText *here*.\n\n{}", fence("diagram", "A-->B"));
        let a = preview.render(&source);
        let b = preview.render(&source);
        assert_eq!(without_ids(&a), without_ids(&b));
        assert_eq!(a.outline, b.outline);
        assert_ne!(a.placeholders[0].id, b.placeholders[0].id);
    }

    #[test]
    fn test_generations_increase() {
        let preview = preview();
        assert_eq!(preview.generation(), 0);
        assert_eq!(preview.render("a").generation, 1);
        assert_eq!(preview.render("a").generation, 2);
        assert_eq!(preview.generation(), 2);
    }

    #[test]
    fn test_cache_hit_skips_conversion() {
        let puts = Arc::new(AtomicUsize::new(0));
        let cache = CountingCache {
            inner: FifoCache::new(10),
            puts: Arc::clone(&puts),
        };
        let preview = preview().with_render_cache(cache);

        preview.render("# One");
        preview.render("# One");
        assert_eq!(puts.load(Ordering::SeqCst), 1);
        preview.render("# One ");
        assert_eq!(puts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_disabled_still_renders() {
        let preview = Preview::new(PreviewOptions {
            cache_enabled: false,
            ..options()
        });
        let a = preview.render("**bold**");
        let b = preview.render("**bold**");
        assert_eq!(a.markup, "<p><strong>bold</strong></p>");
        assert_eq!(a.markup, b.markup);
    }

    #[test]
    fn test_render_sanitizes() {
        let preview = preview();
        let doc = preview.render(
            "<img src=x onerror=alert(1)>\n\n[click](javascript:alert(1))\n\n<script>alert(1)</script>",
        );
        assert!(!doc.markup.contains("onerror"));
        assert!(!doc.markup.contains("javascript:"));
        assert!(!doc.markup.contains("<script"));
        assert!(doc.markup.contains("click"));
    }

    #[test]
    fn test_render_drops_raw_text_elements() {
        let preview = preview();
        for tag in ["xmp", "noembed", "noframes", "title"] {
            let doc = preview.render(&format!(
                "Before\n\n<{tag}>\n<img src=x onerror=alert(1)>\n</{tag}>\n\nAfter"
            ));
            assert!(!doc.markup.contains("onerror"), "tag: {tag}");
            assert!(!doc.markup.contains("<img"), "tag: {tag}");
            assert!(doc.markup.contains("After"), "tag: {tag}");

            let mut live = preview.live_document();
            live.show(doc);
            assert!(!live.to_html().contains("onerror"), "tag: {tag}");
        }

        let doc = preview.render("Before\n\n<plaintext><img src=x onerror=alert(1)>");
        assert!(doc.markup.starts_with("<p>Before</p>"));
        assert!(!doc.markup.contains("onerror"));
    }

    #[test]
    fn test_render_outline() {
        let doc = preview().render("# Title\n\n## Section\n");
        let titles: Vec<_> = doc.outline.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Title", "Section"]);
    }

    #[test]
    fn test_validation_marks_skipped() {
        let source = [
            fence("mermaid", ""),
            fence("diagram", ".foo { color: red; }"),
            fence("diagram", "A-->B"),
        ]
        .concat();
        let doc = preview().render(&source);

        let states: Vec<_> = doc.placeholders.iter().map(|p| p.state()).collect();
        assert_eq!(
            states,
            vec![DiagramState::Skipped, DiagramState::Skipped, DiagramState::Pending]
        );
        assert_eq!(doc.placeholders[0].skip_reason(), Some(SkipReason::Empty));
        assert_eq!(
            doc.placeholders[1].skip_reason(),
            Some(SkipReason::StylesheetFragment)
        );
        assert_eq!(doc.pending().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_single_diagram() {
        let preview = preview();
        let doc = preview.render("# Title\n\n```diagram\nA-->B\n```");

        assert!(doc.markup.contains(r#"<h1 id="title">Title</h1>"#));
        assert_eq!(doc.placeholders.len(), 1);
        assert!(doc.markup.contains(r#"class="lume-diagram""#));

        let events = collect(preview.fill_diagrams(&doc, Theme::Light)).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state(), DiagramState::Rendered);
        assert_eq!(events[0].generation, doc.generation);
        assert_eq!(events[0].placeholder_id, doc.placeholders[0].id);
        assert!(!events[0].markup().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_is_waited() {
        let preview = preview();
        let doc = preview.render(&fence("diagram", "A-->B"));

        let start = tokio::time::Instant::now();
        let events = collect(preview.fill_diagrams(&doc, Theme::Light)).await;
        assert_eq!(events.len(), 1);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_isolation() {
        let preview = preview();
        let source = [
            fence("diagram", "A-->B"),
            fence("diagram", "A -->"),
            fence("diagram", "C-->D"),
        ]
        .concat();
        let doc = preview.render(&source);

        let events = collect(preview.fill_diagrams(&doc, Theme::Light)).await;
        let mut by_index: Vec<_> = events
            .iter()
            .map(|e| (e.placeholder.index, e.state()))
            .collect();
        by_index.sort_by_key(|(index, _)| *index);
        assert_eq!(
            by_index,
            vec![
                (0, DiagramState::Rendered),
                (1, DiagramState::Failed),
                (2, DiagramState::Rendered),
            ]
        );
        let failed = events.iter().find(|e| e.state() == DiagramState::Failed).unwrap();
        assert!(failed.error_message().unwrap().contains("line 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rendered_diagrams_are_constrained() {
        let preview = preview();
        let source = [
            fence("diagram", "A-->B"),
            fence("flowchart", "graph LR\nA-->B-->C-->D-->E-->F-->G-->H-->I-->J-->K"),
        ]
        .concat();
        let doc = preview.render(&source);

        for event in collect(preview.fill_diagrams(&doc, Theme::Dark)).await {
            let markup = event.markup().unwrap();
            assert!(markup.contains("display:block;margin:0 auto;max-width:"));
            let width: u32 = markup
                .split("max-width:")
                .nth(1)
                .and_then(|rest| rest.split("px").next())
                .and_then(|n| n.parse().ok())
                .unwrap();
            assert!(width <= 800, "{width}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_pass_yields_nothing() {
        let preview = preview();
        let first = preview.render(&fence("diagram", "A-->B"));
        let stream = preview.fill_diagrams(&first, Theme::Light);

        let second = preview.render(&fence("diagram", "A-->C"));
        assert!(collect(stream).await.is_empty());

        let events = collect(preview.fill_diagrams(&second, Theme::Light)).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_mid_pass_stops() {
        let preview = Preview::new(PreviewOptions {
            max_concurrent: 1,
            ..options()
        });
        let source = [fence("diagram", "A-->B"), fence("diagram", "C-->D")].concat();
        let doc = preview.render(&source);

        let mut stream = preview.fill_diagrams(&doc, Theme::Light);
        let first = stream.next().await.unwrap();
        assert_eq!(first.placeholder.index, 0);

        preview.render("changed");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pending_is_empty() {
        let preview = preview();
        let doc = preview.render(&fence("diagram", "   "));
        assert!(collect(preview.fill_diagrams(&doc, Theme::Light)).await.is_empty());
    }

    struct Counting(Arc<AtomicUsize>);

    impl DiagramEngine for Counting {
        fn render(&self, request: &DiagramRequest) -> Result<String, EngineError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!(r#"<svg viewBox="0 0 10 10"><text>{}</text></svg>"#, request.theme))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_theme_cache_invalidation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let preview = Preview::with_engine(
            options(),
            LazyEngine::ready(Arc::new(Counting(Arc::clone(&calls)))),
        );
        let source = fence("mermaid", "graph TD\nA-->B");

        let doc = preview.render(&source);
        let light = collect(preview.fill_diagrams(&doc, Theme::Light)).await;
        assert!(light[0].markup().unwrap().contains("light"));

        let doc = preview.render(&source);
        let dark = collect(preview.fill_diagrams(&doc, Theme::Dark)).await;
        assert!(dark[0].markup().unwrap().contains("dark"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert_eq!(preview.invalidate_theme_cache(Theme::Dark), 1);

        let doc = preview.render(&source);
        collect(preview.fill_diagrams(&doc, Theme::Dark)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_engine_not_loaded_without_diagrams() {
        let preview = preview();
        let doc = preview.render("no diagrams here");
        collect(preview.fill_diagrams(&doc, Theme::Light)).await;
        assert!(!preview.diagram_renderer().engine_loaded());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.render.math = false;
        config.cache.enabled = false;
        config.diagrams.max_concurrent = 5;
        config.diagrams.kroki_url = Some("https://kroki.io".to_owned());
        config.scheduler.settle_delay_ms = 10;

        let options = PreviewOptions::from(&config);
        assert!(options.gfm);
        assert!(!options.math);
        assert!(!options.cache_enabled);
        assert_eq!(options.max_concurrent, 5);
        assert_eq!(options.kroki_url.as_deref(), Some("https://kroki.io"));
        assert_eq!(options.settle_delay, Duration::from_millis(10));
        assert_eq!(options.max_width, 800);
    }
}

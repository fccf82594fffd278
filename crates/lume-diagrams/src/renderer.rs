//! Asynchronous, per-placeholder diagram rendering.

use std::sync::Arc;

use lume_sanitize::Sanitizer;
use tokio::sync::Semaphore;

use crate::cache::{DiagramCache, DiagramKey};
use crate::consts::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_WIDTH};
use crate::embed::{constrain_svg, error_figure};
use crate::engine::{DiagramRequest, EngineError, LazyEngine};
use crate::language::DiagramLanguage;
use crate::placeholder::{DiagramPlaceholder, DiagramState};
use crate::theme::Theme;

/// Renders diagram placeholders through a lazily loaded engine.
///
/// Every render runs on tokio's blocking pool, so an engine error or panic
/// only fails its own placeholder. A semaphore bounds the number of engine
/// calls in flight across all callers sharing the renderer, and finished
/// figures are kept in a [`DiagramCache`] owned by this renderer.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use lume_diagrams::{DiagramEngine, DiagramPlaceholder, DiagramRenderer, LazyEngine, MermaidEngine, Theme};
///
/// # async fn run() {
/// let renderer = DiagramRenderer::new(LazyEngine::new(|| {
///     Ok(Arc::new(MermaidEngine::new()) as Arc<dyn DiagramEngine>)
/// }));
/// let placeholder = DiagramPlaceholder::new("d1", 0, "diagram", "A --> B");
/// let done = renderer.render(placeholder, Theme::Light).await;
/// assert!(done.rendered_markup().is_some());
/// # }
/// ```
pub struct DiagramRenderer {
    engine: Arc<LazyEngine>,
    cache: DiagramCache,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    sanitizer: Sanitizer,
    max_width: u32,
}

impl DiagramRenderer {
    #[must_use]
    pub fn new(engine: LazyEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            cache: DiagramCache::new(DEFAULT_CACHE_CAPACITY),
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            sanitizer: Sanitizer::for_diagrams(),
            max_width: DEFAULT_MAX_WIDTH,
        }
    }

    /// Set the number of engine calls allowed in flight (at least 1).
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        self.permits = Arc::new(Semaphore::new(max_concurrent));
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the display width cap in pixels, clamped to `1..=800`.
    #[must_use]
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width.clamp(1, DEFAULT_MAX_WIDTH);
        self
    }

    /// Replace the diagram cache with an empty one of `capacity` entries.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = DiagramCache::new(capacity);
        self
    }

    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    #[must_use]
    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    #[must_use]
    pub fn cache(&self) -> &DiagramCache {
        &self.cache
    }

    /// Whether the engine has been loaded yet.
    #[must_use]
    pub fn engine_loaded(&self) -> bool {
        self.engine.is_loaded()
    }

    /// Drop cached figures rendered for any theme other than `active`.
    pub fn invalidate_theme(&self, active: Theme) -> usize {
        self.cache.invalidate_theme(active)
    }

    /// Render one placeholder.
    ///
    /// Returns the placeholder `Rendered` or `Failed`. Placeholders that are
    /// not `Pending` are returned unchanged.
    pub async fn render(
        &self,
        mut placeholder: DiagramPlaceholder,
        theme: Theme,
    ) -> DiagramPlaceholder {
        if placeholder.state() != DiagramState::Pending || placeholder.start_rendering().is_err() {
            return placeholder;
        }

        let result = match DiagramLanguage::parse(&placeholder.language) {
            Some(language) => self.render_cached(language, &placeholder.source, theme).await,
            None => Err(EngineError::Unsupported(format!(
                "unknown diagram language '{}'",
                placeholder.language
            ))),
        };

        // Rendering → Rendered/Failed cannot be rejected.
        let _ = match result {
            Ok(markup) => placeholder.complete(markup),
            Err(e) => {
                tracing::warn!(
                    placeholder = %placeholder.id,
                    language = %placeholder.language,
                    error = %e,
                    "Diagram rendering failed"
                );
                let message = e.to_string();
                let figure = error_figure(&message);
                placeholder.fail(message, figure)
            }
        };
        placeholder
    }

    async fn render_cached(
        &self,
        language: DiagramLanguage,
        source: &str,
        theme: Theme,
    ) -> Result<String, EngineError> {
        let key = DiagramKey {
            source,
            language: language.as_str(),
            theme,
        };
        if let Some(markup) = self.cache.get(&key) {
            tracing::debug!(language = language.as_str(), %theme, "Diagram cache hit");
            return Ok(markup);
        }

        let markup = self.render_uncached(language, source, theme).await?;
        self.cache.put(&key, markup.clone());
        Ok(markup)
    }

    async fn render_uncached(
        &self,
        language: DiagramLanguage,
        source: &str,
        theme: Theme,
    ) -> Result<String, EngineError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| EngineError::Load(e.to_string()))?;

        let engine = self.engine.get().await?;
        let request = DiagramRequest::new(language, source, theme);
        // The permit lives as long as the engine call, even if this future is dropped.
        let svg = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.render(&request)
        })
        .await
        .map_err(|e| EngineError::Crashed(e.to_string()))??;

        let clean = self.sanitizer.sanitize(&svg);
        constrain_svg(&clean, self.max_width)
    }
}

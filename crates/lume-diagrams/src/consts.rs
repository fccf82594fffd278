//! Constants shared by placeholder extraction and rendering.

use std::time::Duration;

/// Class marking a diagram placeholder element.
pub const PLACEHOLDER_CLASS: &str = "lume-diagram";

/// Attribute carrying the diagram language on a placeholder.
pub const LANGUAGE_ATTR: &str = "data-diagram-lang";

/// Attribute carrying the placeholder id (mirrors `id`).
pub const ID_ATTR: &str = "data-diagram-id";

/// Default number of diagrams rendered at the same time.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default number of rendered diagrams kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Default and upper bound for the displayed diagram width, in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 800;

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

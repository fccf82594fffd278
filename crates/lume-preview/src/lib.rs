//! Live preview scheduling.
//!
//! [`Preview`] turns markdown into sanitized markup synchronously, then fills
//! diagram placeholders in a second, asynchronous pass. Every render gets a
//! new generation from a shared [`GenerationFence`]; results of a superseded
//! generation are never applied to the [`LiveDocument`].

mod document;
mod fence;
mod live;
mod preview;

pub use document::{ConvertedMarkup, DiagramEvent, RenderedDocument};
pub use fence::GenerationFence;
pub use live::LiveDocument;
pub use preview::{
    DEFAULT_RENDER_CACHE_CAPACITY, DEFAULT_SETTLE_DELAY, DiagramStream, Preview, PreviewOptions,
};

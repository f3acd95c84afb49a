//! # scrollscrub-core
//!
//! Scroll-scrubbed image-sequence animation engine.
//!
//! As the page scrolls through a tall container, a bounded frame index
//! advances with scroll progress and the matching still is drawn to a canvas,
//! so the sequence plays like a video scrubbed by the scrollbar.
//!
//! This crate provides platform-agnostic logic for:
//! - Mapping scroll geometry to a frame index
//! - Resolving per-device frame asset paths
//! - Caching and preloading frames around the current position
//! - Sizing the canvas for the device pixel ratio and fitting frames into it
//! - Coalescing scroll events into one redraw per display refresh
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for configuration
//! - `toml` - Load [`ScrubConfig`] from TOML
//! - `web` - Enable the browser backend (canvas, image loading, scroll listeners)
//!
//! ## Example
//!
//! ```rust
//! use scrollscrub_core::{map_to_frame, FrameRange, ScrollGeometry};
//!
//! // 281 frames, animation starts at frame 2; container is 5620px tall.
//! let range = FrameRange::new(2, 281);
//! let geometry = ScrollGeometry::new(2360.0, 0.0, 5620.0, 900.0);
//! assert_eq!(map_to_frame(&geometry, range), 142);
//! ```

mod cache;
mod color;
mod config;
mod device;
mod engine;
mod path;
mod pump;
pub mod render;
mod scrub;
mod sizing;

#[cfg(feature = "web")]
pub mod web;

pub use cache::{
    CacheStats, Completion, FetchRequest, FrameCache, FrameFetcher, LoadState, LoadTicket,
    RecordingFetcher,
};
pub use color::{parse_color, Rgb};
pub use config::{ConfigError, ScrubConfig};
pub use device::{DeviceClass, DeviceDetector, DeviceProfile, MOBILE_BREAKPOINT};
pub use engine::{FrameEngine, RenderState};
pub use path::{resolve as resolve_frame_path, FRAME_EXTENSION, FRAME_NUMBER_WIDTH};
pub use pump::{PumpState, ScrollPump};
pub use render::{DrawOutcome, RenderConfig};
pub use scrub::{map_to_frame, FrameRange, OverlayFade, ScrollGeometry};
pub use sizing::{CanvasMetrics, FitPolicy, Placement};

#[cfg(feature = "web")]
pub use web::Scrubber;

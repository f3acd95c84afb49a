//! Scroll position to frame index mapping.

/// Scroll and layout measurements sampled for a single recomputation.
///
/// All values are in logical (CSS) pixels. Geometry is never cached: scroll
/// and resize invalidate it continuously.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollGeometry {
    /// Current vertical scroll offset of the page
    pub scroll_y: f64,
    /// Document-relative top edge of the scrub container
    pub container_top: f64,
    /// Full height of the scrub container
    pub container_height: f64,
    /// Height of the viewport (and of the pinned stage)
    pub viewport_height: f64,
}

impl ScrollGeometry {
    pub fn new(
        scroll_y: f64,
        container_top: f64,
        container_height: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            scroll_y,
            container_top,
            container_height,
            viewport_height,
        }
    }

    /// Distance over which the full frame range is scrubbed.
    #[inline]
    pub fn travel(&self) -> f64 {
        self.container_height - self.viewport_height
    }

    /// Scroll progress through the container, clamped to `[0, 1]`.
    ///
    /// A container no taller than the viewport has no travel; progress
    /// saturates to 1 instead of dividing by a non-positive number. Geometry
    /// that is not a number yields 0.
    pub fn progress(&self) -> f64 {
        let travel = self.travel();
        if travel.is_nan() {
            return 0.0;
        }
        if travel <= 0.0 {
            return 1.0;
        }
        let progress = (self.scroll_y - self.container_top) / travel;
        if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        }
    }
}

/// Inclusive range of animatable frame indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    min: u32,
    total: u32,
}

impl FrameRange {
    /// Create a range. `min` is clamped so it never exceeds `total`.
    pub fn new(min: u32, total: u32) -> Self {
        Self {
            min: min.min(total),
            total,
        }
    }

    /// First animatable frame.
    #[inline]
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Last frame (and the frame count of the sequence).
    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of frames in the range.
    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.total - self.min + 1
    }

    #[inline]
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.min && frame <= self.total
    }

    /// Clamp an arbitrary frame number into the range.
    #[inline]
    pub fn clamp(&self, frame: u32) -> u32 {
        frame.clamp(self.min, self.total)
    }

    /// Frame shown at `progress` (0.0 - 1.0) through the range.
    pub fn frame_at(&self, progress: f64) -> u32 {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        let span = (self.total - self.min) as f64;
        let frame = (self.min as f64 + progress * span).round();
        // `as` saturates, the clamp keeps the result inside the range.
        self.clamp(frame as u32)
    }

    /// Progress (0.0 - 1.0) at which `frame` is first shown.
    pub fn progress_of(&self, frame: u32) -> f64 {
        if self.total <= self.min {
            return 0.0;
        }
        let frame = self.clamp(frame);
        (frame - self.min) as f64 / (self.total - self.min) as f64
    }

    /// Symmetric window of `radius` frames around `center`, clamped to the range.
    pub fn window(&self, center: u32, radius: u32) -> (u32, u32) {
        let center = self.clamp(center);
        let lo = center.saturating_sub(radius).max(self.min);
        let hi = center.saturating_add(radius).min(self.total);
        (lo, hi)
    }

    /// Window of `size` frames past the first animatable frame, used before
    /// the user has scrolled.
    pub fn leading_window(&self, size: u32) -> (u32, u32) {
        (self.min, self.min.saturating_add(size).min(self.total))
    }
}

/// Map scroll geometry to a clamped frame index.
///
/// ## Example
///
/// ```rust
/// use scrollscrub_core::{map_to_frame, FrameRange, ScrollGeometry};
///
/// let range = FrameRange::new(2, 281);
/// // Container at y=1000, 5620px tall, 800px viewport: travel is 4820px.
/// let halfway = ScrollGeometry::new(1000.0 + 2410.0, 1000.0, 5620.0, 800.0);
/// assert_eq!(map_to_frame(&halfway, range), 142);
/// ```
#[inline]
pub fn map_to_frame(geometry: &ScrollGeometry, range: FrameRange) -> u32 {
    range.frame_at(geometry.progress())
}

/// Fade-in of an element layered over the final frames of the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlayFade {
    /// Frame at which the overlay starts to appear
    pub start_frame: u32,
    /// Number of frames over which opacity goes from 0 to 1
    pub fade_frames: u32,
}

impl OverlayFade {
    pub fn new(start_frame: u32, fade_frames: u32) -> Self {
        Self {
            start_frame,
            fade_frames,
        }
    }

    /// Overlay opacity (0.0 - 1.0) while `frame` is displayed.
    pub fn opacity(&self, frame: u32) -> f64 {
        if self.fade_frames == 0 {
            return if frame >= self.start_frame { 1.0 } else { 0.0 };
        }
        let delta = frame as f64 - self.start_frame as f64;
        (delta / self.fade_frames as f64).clamp(0.0, 1.0)
    }

    /// Whether the overlay should receive pointer events.
    #[inline]
    pub fn is_interactive(&self, frame: u32) -> bool {
        frame >= self.start_frame
    }
}

//! The scroll-scrub engine: scroll events in, canvas draws and preload
//! requests out.

use log::{debug, trace, warn};

use crate::render::{self, DrawOutcome, FrameImage, RenderConfig, Surface};
use crate::{
    map_to_frame, CacheStats, Completion, ConfigError, DeviceClass, DeviceDetector, DeviceProfile,
    FitPolicy, FrameCache, FrameFetcher, FrameRange, LoadTicket, OverlayFade, ScrollGeometry,
    ScrollPump, ScrubConfig,
};

/// The frame the engine wants on screen and the frame actually painted.
///
/// `last_drawn` lags `current_frame` while the target is still loading and a
/// neighbour (or nothing) is shown instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderState {
    pub current_frame: u32,
    pub last_drawn: Option<u32>,
}

/// Scroll-driven image-sequence player.
///
/// Owns the frame cache, the current frame and the scroll pump. Every
/// mutation goes through one of the `on_*` entry points, which the host calls
/// from its event handlers on a single thread:
///
/// - [`on_scroll`](Self::on_scroll) from the scroll listener; schedule an
///   animation frame when it returns `true`
/// - [`on_animation_frame`](Self::on_animation_frame) from that frame
/// - [`on_resize`](Self::on_resize) after resizing the surface
/// - [`cancel_tick`](Self::cancel_tick) when the animation frame could not be
///   scheduled
/// - [`on_frame_loaded`](Self::on_frame_loaded) /
///   [`on_frame_failed`](Self::on_frame_failed) when a fetch settles
///
/// After [`teardown`](Self::teardown) every entry point is a no-op.
///
/// ## Example
///
/// ```rust
/// use scrollscrub_core::render::{FrameImage, RecordingSurface};
/// use scrollscrub_core::{CanvasMetrics, FrameEngine, RecordingFetcher, ScrollGeometry, ScrubConfig};
///
/// #[derive(Clone)]
/// struct Still;
/// impl FrameImage for Still {
///     fn natural_size(&self) -> (f64, f64) { (1920.0, 1080.0) }
/// }
///
/// let config = ScrubConfig::default();
/// let mut engine: FrameEngine<Still, _> =
///     FrameEngine::new(config, RecordingFetcher::new(), 1280.0).unwrap();
/// let mut surface = RecordingSurface::new(CanvasMetrics::new(1280.0, 800.0, 1.0));
///
/// let top = ScrollGeometry::new(0.0, 0.0, 5620.0, 800.0);
/// engine.mount(&top, &mut surface);
/// assert_eq!(engine.current_frame(), 2);
/// assert!(!engine.fetcher().requests.is_empty());
///
/// if engine.on_scroll() {
///     // ...requestAnimationFrame, then:
///     let halfway = ScrollGeometry { scroll_y: 2410.0, ..top };
///     engine.on_animation_frame(&halfway, &mut surface);
/// }
/// assert_eq!(engine.current_frame(), 142);
/// ```
#[derive(Debug)]
pub struct FrameEngine<I, F> {
    config: ScrubConfig,
    range: FrameRange,
    render: RenderConfig,
    detector: DeviceDetector,
    cache: FrameCache<I>,
    fetcher: F,
    pump: ScrollPump,
    state: RenderState,
    alive: bool,
}

impl<I, F> FrameEngine<I, F>
where
    I: FrameImage,
    F: FrameFetcher,
{
    /// Create an engine for a viewport `viewport_width` logical pixels wide.
    pub fn new(config: ScrubConfig, fetcher: F, viewport_width: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        let render = config.render_config()?;
        let range = config.frame_range();
        let detector = DeviceDetector::new(viewport_width);
        debug!(
            "frame engine: frames {}..={} on {}",
            range.min(),
            range.total(),
            detector.current()
        );
        Ok(Self {
            cache: FrameCache::new(config.notify_radius),
            config,
            range,
            render,
            detector,
            fetcher,
            pump: ScrollPump::new(),
            state: RenderState {
                current_frame: range.min(),
                last_drawn: None,
            },
            alive: true,
        })
    }

    /// First paint: request the leading frames and the window around the
    /// frame for the current scroll position, then draw whatever is ready.
    pub fn mount<S: Surface<I> + ?Sized>(
        &mut self,
        geometry: &ScrollGeometry,
        surface: &mut S,
    ) -> DrawOutcome {
        if !self.alive {
            return DrawOutcome::Skipped;
        }
        let (lo, hi) = self.range.leading_window(self.config.initial_window);
        self.request(lo, hi);

        self.state.current_frame = map_to_frame(geometry, self.range);
        self.preload_around(self.state.current_frame);
        self.draw(surface)
    }

    /// Record a scroll event. Returns `true` when the host must schedule an
    /// animation frame; further events are coalesced until it runs.
    pub fn on_scroll(&mut self) -> bool {
        self.alive && self.pump.on_scroll()
    }

    /// Run the scheduled recomputation.
    ///
    /// Returns `None` when no tick was pending or the frame did not change.
    pub fn on_animation_frame<S: Surface<I> + ?Sized>(
        &mut self,
        geometry: &ScrollGeometry,
        surface: &mut S,
    ) -> Option<DrawOutcome> {
        if !self.alive || !self.pump.begin_tick() {
            return None;
        }
        self.update(geometry, surface)
    }

    /// Map the geometry to a frame; on change, preload around it and draw
    /// immediately within this call.
    pub fn update<S: Surface<I> + ?Sized>(
        &mut self,
        geometry: &ScrollGeometry,
        surface: &mut S,
    ) -> Option<DrawOutcome> {
        if !self.alive {
            return None;
        }
        let frame = map_to_frame(geometry, self.range);
        if frame == self.state.current_frame {
            return None;
        }
        trace!("frame {} -> {}", self.state.current_frame, frame);
        self.state.current_frame = frame;
        self.preload_around(frame);
        Some(self.draw(surface))
    }

    /// Handle a viewport resize. Call after the surface has been resized;
    /// `surface_cleared` says whether that wiped the backing store.
    ///
    /// Crossing the mobile breakpoint drops every cached frame (the asset
    /// sets are disjoint) and requests the window around the current frame
    /// from the new set. The current frame is then redrawn.
    pub fn on_resize<S: Surface<I> + ?Sized>(
        &mut self,
        viewport_width: f64,
        surface_cleared: bool,
        surface: &mut S,
    ) -> DrawOutcome {
        if !self.alive {
            return DrawOutcome::Skipped;
        }
        if surface_cleared {
            self.state.last_drawn = None;
        }
        if let Some(class) = self.detector.update(viewport_width) {
            debug!("device class is now {class}; dropping cached frames");
            self.cache.invalidate();
            self.preload_around(self.state.current_frame);
        }
        self.draw(surface)
    }

    /// Store a finished load and repaint if it is close to the target.
    pub fn on_frame_loaded<S: Surface<I> + ?Sized>(
        &mut self,
        ticket: LoadTicket,
        image: I,
        surface: &mut S,
    ) -> Option<DrawOutcome> {
        if !self.alive {
            return None;
        }
        match self.cache.complete(ticket, image, self.state.current_frame) {
            Completion::Repaint => Some(self.draw(surface)),
            Completion::Stored | Completion::Stale => None,
        }
    }

    /// Record a failed load. Returns `false` when the ticket was stale.
    pub fn on_frame_failed(&mut self, ticket: LoadTicket) -> bool {
        self.alive && self.cache.fail(ticket)
    }

    /// Draw the current frame again (e.g. after the host cleared the canvas).
    pub fn redraw<S: Surface<I> + ?Sized>(&mut self, surface: &mut S) -> DrawOutcome {
        if !self.alive {
            return DrawOutcome::Skipped;
        }
        self.draw(surface)
    }

    /// Drop a scheduled tick that the host could not deliver, so the next
    /// scroll event schedules again.
    pub fn cancel_tick(&mut self) {
        self.pump.cancel();
    }

    /// Stop reacting to anything. Loads that settle afterwards are ignored.
    pub fn teardown(&mut self) {
        if self.alive {
            debug!(
                "frame engine torn down at frame {} ({} frames requested)",
                self.state.current_frame,
                self.cache.stats().requested()
            );
        }
        self.alive = false;
        self.pump.stop();
    }

    fn request(&mut self, lo: u32, hi: u32) -> usize {
        debug_assert!(self.range.contains(lo) && self.range.contains(hi));
        let profile = self.config.profile(self.detector.current());
        self.cache.ensure_range(lo, hi, profile, &mut self.fetcher)
    }

    fn preload_around(&mut self, frame: u32) -> usize {
        let (lo, hi) = self.range.window(frame, self.config.preload_radius);
        self.request(lo, hi)
    }

    fn draw<S: Surface<I> + ?Sized>(&mut self, surface: &mut S) -> DrawOutcome {
        let fit = FitPolicy::from(self.config.profile(self.detector.current()));
        let target = self.state.current_frame;
        match render::draw_frame(surface, &self.cache, target, &fit, &self.render) {
            Ok(outcome) => {
                if let Some(drawn) = outcome.drawn_frame() {
                    self.state.last_drawn = Some(drawn);
                }
                outcome
            }
            Err(err) => {
                warn!("failed to draw frame {target}: {err}");
                DrawOutcome::Skipped
            }
        }
    }
}

impl<I, F> FrameEngine<I, F> {
    #[inline]
    pub fn current_frame(&self) -> u32 {
        self.state.current_frame
    }

    #[inline]
    pub fn render_state(&self) -> RenderState {
        self.state
    }

    #[inline]
    pub fn device_class(&self) -> DeviceClass {
        self.detector.current()
    }

    /// Profile of the current device class.
    pub fn profile(&self) -> &DeviceProfile {
        self.config.profile(self.detector.current())
    }

    #[inline]
    pub fn frame_range(&self) -> FrameRange {
        self.range
    }

    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }

    pub fn cache(&self) -> &FrameCache<I> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn pump(&self) -> &ScrollPump {
        &self.pump
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Opacity and interactivity of the end-of-sequence overlay, when one is
    /// configured.
    pub fn overlay_state(&self) -> Option<(f64, bool)> {
        let fade = self.config.overlay?;
        let frame = self.state.current_frame;
        Some((fade.opacity(frame), fade.is_interactive(frame)))
    }

    /// Replace the end-of-sequence overlay fade.
    pub fn set_overlay(&mut self, fade: Option<OverlayFade>) {
        self.config.overlay = fade;
    }

    /// Text for the debug overlay.
    pub fn diagnostics_label(&self) -> String {
        format!("Frame: {} / {}", self.state.current_frame, self.range.total())
    }
}

//! Frame drawing: nearest-available resolution, background fill and
//! contain-fit placement.
//!
//! [`plan_draw`] is a pure function producing a [`DrawPlan`] that any
//! backend can execute; [`draw_frame`] executes it against a [`Surface`].
//! The `web` feature provides a surface for `HtmlCanvasElement`.

use crate::{CanvasMetrics, FitPolicy, FrameCache, Placement, Rgb};

/// Default number of frames searched on each side of a missing target.
pub const DEFAULT_FALLBACK_RADIUS: u32 = 6;

/// A decoded frame image with known intrinsic dimensions.
pub trait FrameImage {
    /// Intrinsic `(width, height)` in image pixels.
    fn natural_size(&self) -> (f64, f64);
}

/// A drawing target working in logical pixels.
pub trait Surface<I> {
    /// Current size of the surface.
    fn metrics(&self) -> CanvasMetrics;

    /// Fill the whole logical area with a solid colour.
    fn fill(&mut self, color: Rgb) -> Result<(), String>;

    /// Draw `image` scaled into `placement`.
    fn draw_image(&mut self, image: &I, placement: Placement) -> Result<(), String>;
}

/// Configuration for drawing frames.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Colour painted behind every frame
    pub background: Rgb,
    /// How far (in frames) to look for a substitute when the target is not loaded
    pub fallback_radius: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Rgb::PAGE_BACKGROUND,
            fallback_radius: DEFAULT_FALLBACK_RADIUS,
        }
    }
}

/// What a single draw will paint.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawPlan<'a, I> {
    /// Frame that was asked for
    pub target: u32,
    /// Frame actually painted (equals `target` unless substituted)
    pub frame: u32,
    pub image: &'a I,
    pub background: Rgb,
    pub placement: Placement,
}

impl<I> DrawPlan<'_, I> {
    #[inline]
    pub fn is_substitute(&self) -> bool {
        self.frame != self.target
    }

    pub fn outcome(&self) -> DrawOutcome {
        if self.is_substitute() {
            DrawOutcome::Substitute {
                target: self.target,
                drawn: self.frame,
            }
        } else {
            DrawOutcome::Exact(self.frame)
        }
    }
}

/// Result of a draw request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The target frame itself was painted
    Exact(u32),
    /// A nearby loaded frame stood in for the target
    Substitute { target: u32, drawn: u32 },
    /// Nothing suitable was loaded (or the surface is empty); canvas untouched
    Skipped,
}

impl DrawOutcome {
    /// The frame now visible because of this draw, if any.
    pub fn drawn_frame(&self) -> Option<u32> {
        match *self {
            DrawOutcome::Exact(frame) => Some(frame),
            DrawOutcome::Substitute { drawn, .. } => Some(drawn),
            DrawOutcome::Skipped => None,
        }
    }
}

/// Work out what to paint for `target`.
///
/// Returns `None` when the surface has no area, when neither the target nor
/// any frame within `config.fallback_radius` is loaded, or when the chosen
/// image has no intrinsic size.
///
/// ## Example
///
/// ```rust
/// use scrollscrub_core::render::{plan_draw, FrameImage, RenderConfig};
/// use scrollscrub_core::{CanvasMetrics, FitPolicy, FrameCache};
///
/// struct Still;
/// impl FrameImage for Still {
///     fn natural_size(&self) -> (f64, f64) { (1600.0, 900.0) }
/// }
///
/// let cache: FrameCache<Still> = FrameCache::new(2);
/// let metrics = CanvasMetrics::new(800.0, 600.0, 2.0);
/// // Nothing loaded: nothing to paint.
/// assert!(plan_draw(&cache, 42, &metrics, &FitPolicy::default(), &RenderConfig::default()).is_none());
/// ```
pub fn plan_draw<'a, I: FrameImage>(
    cache: &'a FrameCache<I>,
    target: u32,
    metrics: &CanvasMetrics,
    fit: &FitPolicy,
    config: &RenderConfig,
) -> Option<DrawPlan<'a, I>> {
    if !metrics.is_drawable() {
        return None;
    }
    let (frame, image) = cache.nearest_loaded(target, config.fallback_radius)?;
    let (image_width, image_height) = image.natural_size();
    let placement = fit.place(
        metrics.logical_width(),
        metrics.logical_height(),
        image_width,
        image_height,
    )?;
    Some(DrawPlan {
        target,
        frame,
        image,
        background: config.background,
        placement,
    })
}

/// Draw `target` (or its nearest loaded neighbour) onto `surface`.
///
/// Touches nothing but the surface's pixels. When nothing can be painted the
/// previous contents are left in place rather than cleared.
pub fn draw_frame<I, S>(
    surface: &mut S,
    cache: &FrameCache<I>,
    target: u32,
    fit: &FitPolicy,
    config: &RenderConfig,
) -> Result<DrawOutcome, String>
where
    I: FrameImage,
    S: Surface<I> + ?Sized,
{
    let metrics = surface.metrics();
    let Some(plan) = plan_draw(cache, target, &metrics, fit, config) else {
        return Ok(DrawOutcome::Skipped);
    };

    // Fill first so differently sized stills never leave transparent edges.
    surface.fill(plan.background)?;
    surface.draw_image(plan.image, plan.placement)?;
    Ok(plan.outcome())
}

/// A draw operation captured by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp<I> {
    Fill(Rgb),
    Image { image: I, placement: Placement },
}

/// In-memory surface that records draw operations.
///
/// Useful for headless hosts and tests; the recorded operations stand in for
/// the canvas pixel buffer.
#[derive(Clone, Debug)]
pub struct RecordingSurface<I> {
    pub metrics: CanvasMetrics,
    pub ops: Vec<DrawOp<I>>,
}

impl<I> RecordingSurface<I> {
    pub fn new(metrics: CanvasMetrics) -> Self {
        Self {
            metrics,
            ops: Vec::new(),
        }
    }

    /// The most recently drawn image, i.e. what the canvas currently shows.
    pub fn last_image(&self) -> Option<&I> {
        self.ops.iter().rev().find_map(|op| match op {
            DrawOp::Image { image, .. } => Some(image),
            DrawOp::Fill(_) => None,
        })
    }
}

impl<I: Clone> Surface<I> for RecordingSurface<I> {
    fn metrics(&self) -> CanvasMetrics {
        self.metrics
    }

    fn fill(&mut self, color: Rgb) -> Result<(), String> {
        self.ops.push(DrawOp::Fill(color));
        Ok(())
    }

    fn draw_image(&mut self, image: &I, placement: Placement) -> Result<(), String> {
        self.ops.push(DrawOp::Image {
            image: image.clone(),
            placement,
        });
        Ok(())
    }
}

/// Web-specific rendering implementation.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

    impl FrameImage for HtmlImageElement {
        fn natural_size(&self) -> (f64, f64) {
            (self.natural_width() as f64, self.natural_height() as f64)
        }
    }

    /// Get the 2D context of a canvas.
    pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, String> {
        canvas
            .get_context("2d")
            .map_err(|_| "Failed to get 2d context")?
            .ok_or("No 2d context available")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "Failed to cast to CanvasRenderingContext2d".to_string())
    }

    /// An on-page canvas whose backing store tracks the device pixel ratio.
    #[derive(Clone, Debug)]
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        metrics: CanvasMetrics,
    }

    impl CanvasSurface {
        /// Wrap a canvas. Call [`resize`](Self::resize) before the first draw.
        pub fn new(canvas: HtmlCanvasElement) -> Result<Self, String> {
            let ctx = context_2d(&canvas)?;
            Ok(Self {
                canvas,
                ctx,
                metrics: CanvasMetrics::default(),
            })
        }

        pub fn canvas(&self) -> &HtmlCanvasElement {
            &self.canvas
        }

        /// Size the backing store to `logical × dpr`, keep the displayed
        /// size logical and re-apply the scale transform.
        ///
        /// Changing the canvas width/height clears it and resets context
        /// state, so the backing store is only touched when its pixel size or
        /// the DPR changed. Returns `true` when it was recreated (and the
        /// canvas is therefore blank).
        pub fn resize(&mut self, metrics: CanvasMetrics) -> Result<bool, String> {
            let recreate = self.metrics.needs_resize(&metrics);
            if !recreate && self.metrics == metrics {
                return Ok(false);
            }
            self.metrics = metrics;

            let style = self.canvas.style();
            style
                .set_property("width", &metrics.css_width())
                .map_err(|_| "Failed to set canvas width")?;
            style
                .set_property("height", &metrics.css_height())
                .map_err(|_| "Failed to set canvas height")?;
            if !recreate {
                return Ok(false);
            }

            self.canvas.set_width(metrics.backing_width());
            self.canvas.set_height(metrics.backing_height());
            let [a, b, c, d, e, f] = metrics.transform();
            self.ctx
                .set_transform(a, b, c, d, e, f)
                .map_err(|_| "Failed to set transform")?;
            self.ctx.set_image_smoothing_enabled(true);
            // Not exposed by web-sys; Firefox ignores it.
            js_sys::Reflect::set(
                &self.ctx,
                &JsValue::from_str("imageSmoothingQuality"),
                &JsValue::from_str("high"),
            )
            .map_err(|_| "Failed to set smoothing quality")?;
            Ok(true)
        }
    }

    impl Surface<HtmlImageElement> for CanvasSurface {
        fn metrics(&self) -> CanvasMetrics {
            self.metrics
        }

        fn fill(&mut self, color: Rgb) -> Result<(), String> {
            self.ctx.set_fill_style_str(&color.css());
            self.ctx.fill_rect(
                0.0,
                0.0,
                self.metrics.logical_width(),
                self.metrics.logical_height(),
            );
            Ok(())
        }

        fn draw_image(
            &mut self,
            image: &HtmlImageElement,
            placement: Placement,
        ) -> Result<(), String> {
            self.ctx
                .draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    placement.x,
                    placement.y,
                    placement.width,
                    placement.height,
                )
                .map_err(|_| "Failed to draw frame image".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceProfile, LoadTicket, RecordingFetcher};

    fn fit() -> FitPolicy {
        FitPolicy::default()
    }

    fn plain() -> RenderConfig {
        RenderConfig::default()
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Still(u32);

    impl FrameImage for Still {
        fn natural_size(&self) -> (f64, f64) {
            (400.0, 200.0)
        }
    }

    fn cache_with(loaded: &[u32]) -> FrameCache<Still> {
        let mut cache = FrameCache::new(2);
        let mut fetcher = RecordingFetcher::new();
        cache.ensure_range(0, 300, &DeviceProfile::new("/f"), &mut fetcher);
        for &index in loaded {
            let ticket = LoadTicket {
                generation: cache.generation(),
                index,
            };
            cache.complete(ticket, Still(index), index);
        }
        cache
    }

    fn surface() -> RecordingSurface<Still> {
        RecordingSurface::new(CanvasMetrics::new(800.0, 600.0, 2.0))
    }

    #[test]
    fn exact_frame_fills_then_draws() {
        let cache = cache_with(&[142]);
        let mut surface = surface();
        let outcome = draw_frame(&mut surface, &cache, 142, &fit(), &plain()).unwrap();

        assert_eq!(outcome, DrawOutcome::Exact(142));
        assert_eq!(surface.ops.len(), 2);
        assert_eq!(surface.ops[0], DrawOp::Fill(Rgb::PAGE_BACKGROUND));
        assert_eq!(
            surface.ops[1],
            DrawOp::Image {
                image: Still(142),
                placement: Placement {
                    x: 0.0,
                    y: 100.0,
                    width: 800.0,
                    height: 400.0
                }
            }
        );
    }

    #[test]
    fn substitutes_nearest_within_radius() {
        let cache = cache_with(&[136, 150]);
        let mut surface = surface();
        let config = RenderConfig::default();

        let outcome = draw_frame(&mut surface, &cache, 142, &fit(), &config).unwrap();
        assert_eq!(outcome, DrawOutcome::Substitute { target: 142, drawn: 136 });
        assert_eq!(surface.last_image(), Some(&Still(136)));
    }

    #[test]
    fn never_paints_beyond_radius() {
        let cache = cache_with(&[135, 149]);
        let mut surface = surface();
        let outcome = draw_frame(&mut surface, &cache, 142, &fit(), &plain()).unwrap();
        assert_eq!(outcome, DrawOutcome::Skipped);
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn empty_cache_leaves_canvas_untouched() {
        let drawn = cache_with(&[10]);
        let empty = cache_with(&[]);
        let mut surface = surface();
        draw_frame(&mut surface, &drawn, 10, &fit(), &plain()).unwrap();
        let before = surface.ops.clone();

        let outcome = draw_frame(&mut surface, &empty, 10, &fit(), &plain()).unwrap();
        assert_eq!(outcome, DrawOutcome::Skipped);
        assert_eq!(surface.ops, before);
    }

    #[test]
    fn zero_sized_surface_is_a_no_op() {
        let cache = cache_with(&[1]);
        let mut surface = RecordingSurface::new(CanvasMetrics::new(0.0, 600.0, 2.0));
        let outcome = draw_frame(&mut surface, &cache, 1, &fit(), &plain()).unwrap();
        assert_eq!(outcome, DrawOutcome::Skipped);
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn custom_background_and_fit() {
        let cache = cache_with(&[5]);
        let mut surface = surface();
        let config = RenderConfig {
            background: Rgb::new(0, 0, 0),
            fallback_radius: 0,
        };
        let fit = FitPolicy {
            magnification: 2.0,
            vertical_offset: 10.0,
        };
        let plan = plan_draw(&cache, 5, &surface.metrics(), &fit, &config).unwrap();
        assert_eq!(plan.background, Rgb::new(0, 0, 0));
        assert_eq!(plan.placement.width, 1600.0);
        assert_eq!(plan.placement.x, -400.0);
        assert_eq!(plan.placement.y, -100.0 + 10.0);

        // Radius zero means only the exact frame qualifies.
        assert!(plan_draw(&cache, 6, &surface.metrics(), &fit, &config).is_none());
        let _ = draw_frame(&mut surface, &cache, 5, &fit, &config);
        assert_eq!(surface.ops.len(), 2);
    }

    #[test]
    fn outcome_reports_visible_frame() {
        assert_eq!(DrawOutcome::Exact(3).drawn_frame(), Some(3));
        assert_eq!(DrawOutcome::Substitute { target: 3, drawn: 1 }.drawn_frame(), Some(1));
        assert_eq!(DrawOutcome::Skipped.drawn_frame(), None);
    }
}

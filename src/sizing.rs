//! Canvas backing-store sizing and contain-fit placement.

use crate::DeviceProfile;

/// Logical size and device pixel ratio of the drawing surface.
///
/// The backing store is `logical × dpr` physical pixels; drawing happens in
/// logical pixels through a `dpr` scale transform so images stay sharp on
/// high-density displays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasMetrics {
    logical_width: f64,
    logical_height: f64,
    device_pixel_ratio: f64,
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl CanvasMetrics {
    /// Create metrics from the container's logical size and the display's
    /// device pixel ratio.
    ///
    /// Non-finite or negative sizes become zero. A ratio that is not a
    /// positive finite number falls back to 1.
    pub fn new(logical_width: f64, logical_height: f64, device_pixel_ratio: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            logical_width: sanitize(logical_width),
            logical_height: sanitize(logical_height),
            device_pixel_ratio: dpr,
        }
    }

    #[inline]
    pub fn logical_width(&self) -> f64 {
        self.logical_width
    }

    #[inline]
    pub fn logical_height(&self) -> f64 {
        self.logical_height
    }

    #[inline]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Backing-store width in physical pixels.
    #[inline]
    pub fn backing_width(&self) -> u32 {
        (self.logical_width * self.device_pixel_ratio).round() as u32
    }

    /// Backing-store height in physical pixels.
    #[inline]
    pub fn backing_height(&self) -> u32 {
        (self.logical_height * self.device_pixel_ratio).round() as u32
    }

    /// Whether anything can be drawn. Draws against a zero-sized canvas are
    /// skipped.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.backing_width() > 0 && self.backing_height() > 0
    }

    /// Whether the backing store must be recreated to match `other`.
    pub fn needs_resize(&self, other: &CanvasMetrics) -> bool {
        self.backing_width() != other.backing_width()
            || self.backing_height() != other.backing_height()
            || self.device_pixel_ratio != other.device_pixel_ratio
    }

    /// CSS width string for the displayed canvas (e.g. `"1280px"`).
    pub fn css_width(&self) -> String {
        format!("{}px", self.logical_width)
    }

    /// CSS height string for the displayed canvas.
    pub fn css_height(&self) -> String {
        format!("{}px", self.logical_height)
    }

    /// Transform `(a, b, c, d, e, f)` mapping logical to physical pixels.
    #[inline]
    pub fn transform(&self) -> [f64; 6] {
        let dpr = self.device_pixel_ratio;
        [dpr, 0.0, 0.0, dpr, 0.0, 0.0]
    }
}

/// Destination rectangle for an image, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Contain-fit policy with device-specific overscan and vertical nudge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitPolicy {
    /// Multiplier applied to the contain scale (>1 overscans)
    pub magnification: f64,
    /// Logical pixels added to the centered y position
    pub vertical_offset: f64,
}

impl Default for FitPolicy {
    fn default() -> Self {
        Self {
            magnification: 1.0,
            vertical_offset: 0.0,
        }
    }
}

impl From<&DeviceProfile> for FitPolicy {
    fn from(profile: &DeviceProfile) -> Self {
        Self {
            magnification: profile.magnification,
            vertical_offset: profile.vertical_offset,
        }
    }
}

impl FitPolicy {
    /// Scale that fits an `image_width × image_height` image inside the
    /// canvas, including magnification.
    ///
    /// Returns `None` when either rectangle is empty.
    pub fn scale(
        &self,
        canvas_width: f64,
        canvas_height: f64,
        image_width: f64,
        image_height: f64,
    ) -> Option<f64> {
        if !(canvas_width > 0.0 && canvas_height > 0.0 && image_width > 0.0 && image_height > 0.0) {
            return None;
        }

        // The smaller ratio keeps both dimensions inside the canvas.
        let fit = (canvas_width / image_width).min(canvas_height / image_height);
        let scale = fit * self.magnification;
        scale.is_finite().then_some(scale)
    }

    /// Centered placement of the image on the canvas.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use scrollscrub_core::FitPolicy;
    ///
    /// // A 1600x900 still on an 800x600 canvas fits by width.
    /// let placement = FitPolicy::default().place(800.0, 600.0, 1600.0, 900.0).unwrap();
    /// assert_eq!(placement.width, 800.0);
    /// assert_eq!(placement.height, 450.0);
    /// assert_eq!((placement.x, placement.y), (0.0, 75.0));
    /// ```
    pub fn place(
        &self,
        canvas_width: f64,
        canvas_height: f64,
        image_width: f64,
        image_height: f64,
    ) -> Option<Placement> {
        let scale = self.scale(canvas_width, canvas_height, image_width, image_height)?;
        let width = image_width * scale;
        let height = image_height * scale;
        Some(Placement {
            x: (canvas_width - width) / 2.0,
            y: (canvas_height - height) / 2.0 + self.vertical_offset,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_store_scales_with_dpr() {
        let metrics = CanvasMetrics::new(1280.0, 720.0, 2.0);
        assert_eq!(metrics.backing_width(), 2560);
        assert_eq!(metrics.backing_height(), 1440);
        assert_eq!(metrics.css_width(), "1280px");
        assert_eq!(metrics.css_height(), "720px");
        assert_eq!(metrics.transform(), [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn subpixel_layout_changes_keep_the_backing_store() {
        let before = CanvasMetrics::new(800.0, 600.0, 1.0);
        let after = CanvasMetrics::new(800.2, 600.0, 1.0);
        assert_ne!(before, after);
        assert!(!before.needs_resize(&after));
        assert_eq!(after.css_width(), "800.2px");
    }

    #[test]
    fn fractional_dpr_rounds() {
        let metrics = CanvasMetrics::new(375.0, 667.0, 1.5);
        assert_eq!(metrics.backing_width(), 563);
        assert_eq!(metrics.backing_height(), 1001);
    }

    #[test]
    fn bad_inputs_are_sanitized() {
        let metrics = CanvasMetrics::new(f64::NAN, -10.0, 0.0);
        assert_eq!(metrics.logical_width(), 0.0);
        assert_eq!(metrics.logical_height(), 0.0);
        assert_eq!(metrics.device_pixel_ratio(), 1.0);
        assert!(!metrics.is_drawable());
        assert!(!CanvasMetrics::default().is_drawable());
    }

    #[test]
    fn resize_detection() {
        let a = CanvasMetrics::new(800.0, 600.0, 1.0);
        assert!(!a.needs_resize(&CanvasMetrics::new(800.0, 600.0, 1.0)));
        assert!(a.needs_resize(&CanvasMetrics::new(800.0, 600.0, 2.0)));
        assert!(a.needs_resize(&CanvasMetrics::new(801.0, 600.0, 1.0)));
    }

    #[test]
    fn contain_fit_by_height() {
        let placement = FitPolicy::default().place(1000.0, 500.0, 400.0, 400.0).unwrap();
        assert_eq!(placement.width, 500.0);
        assert_eq!(placement.height, 500.0);
        assert_eq!(placement.x, 250.0);
        assert_eq!(placement.y, 0.0);
    }

    #[test]
    fn magnification_and_offset() {
        let policy = FitPolicy {
            magnification: 1.5,
            vertical_offset: -0.5,
        };
        let placement = policy.place(1000.0, 500.0, 400.0, 400.0).unwrap();
        assert_eq!(placement.width, 750.0);
        assert_eq!(placement.height, 750.0);
        assert_eq!(placement.x, 125.0);
        assert_eq!(placement.y, -125.5);
    }

    #[test]
    fn empty_rectangles_do_not_place() {
        let policy = FitPolicy::default();
        assert_eq!(policy.place(0.0, 500.0, 400.0, 400.0), None);
        assert_eq!(policy.place(500.0, 500.0, 0.0, 400.0), None);
        assert_eq!(policy.place(500.0, f64::NAN, 400.0, 400.0), None);
    }

    #[test]
    fn policy_from_profile() {
        let profile = DeviceProfile::new("/m").with_magnification(1.1).with_vertical_offset(4.0);
        let policy = FitPolicy::from(&profile);
        assert_eq!(policy.magnification, 1.1);
        assert_eq!(policy.vertical_offset, 4.0);
    }
}

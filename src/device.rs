//! Device classification and per-device rendering profiles.

use std::fmt;

/// Viewports narrower than this many logical pixels are treated as mobile.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// Partition of the asset set and rendering parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    /// Classify a viewport by its logical width.
    ///
    /// A width that is not a number classifies as desktop.
    ///
    /// ```rust
    /// use scrollscrub_core::DeviceClass;
    ///
    /// assert_eq!(DeviceClass::classify(390.0), DeviceClass::Mobile);
    /// assert_eq!(DeviceClass::classify(768.0), DeviceClass::Desktop);
    /// ```
    pub fn classify(viewport_width: f64) -> Self {
        if viewport_width < MOBILE_BREAKPOINT {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Desktop => f.write_str("desktop"),
            DeviceClass::Mobile => f.write_str("mobile"),
        }
    }
}

/// Everything that differs between device classes, selected once per
/// classification and passed explicitly to path resolution and drawing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceProfile {
    /// Directory holding this class's numbered frame images
    pub base_path: String,
    /// Multiplier applied on top of the contain-fit scale (1.0 = exact fit)
    #[cfg_attr(feature = "serde", serde(default = "default_magnification"))]
    pub magnification: f64,
    /// Vertical shift in logical pixels applied after centering
    #[cfg_attr(feature = "serde", serde(default = "default_vertical_offset"))]
    pub vertical_offset: f64,
}

fn default_magnification() -> f64 {
    1.0
}

fn default_vertical_offset() -> f64 {
    -0.5
}

impl DeviceProfile {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            magnification: default_magnification(),
            vertical_offset: default_vertical_offset(),
        }
    }

    pub fn with_magnification(mut self, magnification: f64) -> Self {
        self.magnification = magnification;
        self
    }

    pub fn with_vertical_offset(mut self, vertical_offset: f64) -> Self {
        self.vertical_offset = vertical_offset;
        self
    }
}

/// Tracks the current device class and reports transitions.
#[derive(Clone, Debug)]
pub struct DeviceDetector {
    current: DeviceClass,
}

impl DeviceDetector {
    /// Create a detector seeded from the initial viewport width.
    pub fn new(viewport_width: f64) -> Self {
        Self {
            current: DeviceClass::classify(viewport_width),
        }
    }

    #[inline]
    pub fn current(&self) -> DeviceClass {
        self.current
    }

    /// Reclassify after a resize.
    ///
    /// Returns the new class only when it differs from the previous one.
    pub fn update(&mut self, viewport_width: f64) -> Option<DeviceClass> {
        let class = DeviceClass::classify(viewport_width);
        if class == self.current {
            return None;
        }
        self.current = class;
        Some(class)
    }
}

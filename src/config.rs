use crate::color::parse_color;
use crate::render::{RenderConfig, DEFAULT_FALLBACK_RADIUS};
use crate::{DeviceClass, DeviceProfile, FrameRange, OverlayFade, Rgb};

/// Errors found while validating a [`ScrubConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("total_frames must be at least 1")]
    NoFrames,
    #[error("min_frame {min_frame} exceeds total_frames {total_frames}")]
    MinFrameOutOfRange { min_frame: u32, total_frames: u32 },
    #[error("pixels_per_frame must be a positive number, got {0}")]
    InvalidPixelsPerFrame(f64),
    #[error("{class} base path is empty")]
    EmptyBasePath { class: DeviceClass },
    #[error("desktop and mobile frames share the base path `{0}`")]
    SharedBasePath(String),
    #[error("{class} magnification must be a positive number, got {value}")]
    InvalidMagnification { class: DeviceClass, value: f64 },
    #[error("{class} vertical offset must be finite, got {value}")]
    InvalidVerticalOffset { class: DeviceClass, value: f64 },
    #[error("invalid background colour `{0}`")]
    InvalidColor(String),
    #[cfg(feature = "toml")]
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Engine configuration.
///
/// `Default` reproduces the hero animation the engine was built for: 281
/// frames starting at frame 2, 20px of scroll per frame, `#F5F1E8`
/// background.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrubConfig {
    /// Last frame of the sequence
    pub total_frames: u32,
    /// First animatable frame
    pub min_frame: u32,
    /// Container height contributed by each frame, in logical pixels
    pub pixels_per_frame: f64,
    /// Frames requested on each side of the target after it changes
    pub preload_radius: u32,
    /// Frames requested past `min_frame` at mount
    pub initial_window: u32,
    /// Completed loads this close to the target trigger a repaint
    pub notify_radius: u32,
    /// How far to look for a substitute when the target is not loaded
    pub fallback_radius: u32,
    /// Canvas fill colour (`#RRGGBB`, `#RGB` or a basic colour name)
    pub background: String,
    pub desktop: DeviceProfile,
    pub mobile: DeviceProfile,
    /// Optional element faded in over the final frames
    pub overlay: Option<OverlayFade>,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            total_frames: 281,
            min_frame: 2,
            pixels_per_frame: 20.0,
            preload_radius: 8,
            initial_window: 10,
            notify_radius: 2,
            fallback_radius: DEFAULT_FALLBACK_RADIUS,
            background: "#F5F1E8".to_string(),
            desktop: DeviceProfile::new("/adaline_frames"),
            mobile: DeviceProfile::new("/adaline_frames_3x5"),
            overlay: None,
        }
    }
}

impl ScrubConfig {
    /// Configuration for `total_frames` desktop frames under `frame_base_path`.
    ///
    /// The mobile set is expected next to it, in `{frame_base_path}_3x5`.
    pub fn new(total_frames: u32, frame_base_path: impl Into<String>) -> Self {
        let base_path = frame_base_path.into();
        let mobile_path = format!("{}_3x5", base_path.trim_end_matches('/'));
        Self {
            total_frames,
            min_frame: 2.min(total_frames),
            desktop: DeviceProfile::new(base_path),
            mobile: DeviceProfile::new(mobile_path),
            ..Self::default()
        }
    }

    /// Parse a TOML configuration. Missing keys keep their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if self.min_frame > self.total_frames {
            return Err(ConfigError::MinFrameOutOfRange {
                min_frame: self.min_frame,
                total_frames: self.total_frames,
            });
        }
        if !(self.pixels_per_frame.is_finite() && self.pixels_per_frame > 0.0) {
            return Err(ConfigError::InvalidPixelsPerFrame(self.pixels_per_frame));
        }
        for class in [DeviceClass::Desktop, DeviceClass::Mobile] {
            let profile = self.profile(class);
            if profile.base_path.trim_end_matches('/').is_empty() {
                return Err(ConfigError::EmptyBasePath { class });
            }
            if !(profile.magnification.is_finite() && profile.magnification > 0.0) {
                return Err(ConfigError::InvalidMagnification {
                    class,
                    value: profile.magnification,
                });
            }
            if !profile.vertical_offset.is_finite() {
                return Err(ConfigError::InvalidVerticalOffset {
                    class,
                    value: profile.vertical_offset,
                });
            }
        }
        let desktop = self.desktop.base_path.trim_end_matches('/');
        if desktop == self.mobile.base_path.trim_end_matches('/') {
            return Err(ConfigError::SharedBasePath(self.desktop.base_path.clone()));
        }
        self.background_color()?;
        Ok(())
    }

    /// Parsed background colour.
    pub fn background_color(&self) -> Result<Rgb, ConfigError> {
        parse_color(&self.background)
            .ok_or_else(|| ConfigError::InvalidColor(self.background.clone()))
    }

    #[inline]
    pub fn frame_range(&self) -> FrameRange {
        FrameRange::new(self.min_frame, self.total_frames)
    }

    /// Profile for a device class.
    pub fn profile(&self, class: DeviceClass) -> &DeviceProfile {
        match class {
            DeviceClass::Desktop => &self.desktop,
            DeviceClass::Mobile => &self.mobile,
        }
    }

    /// Height the scrub container must have so scroll travel is
    /// proportional to the frame count.
    pub fn container_height(&self) -> f64 {
        self.total_frames as f64 * self.pixels_per_frame
    }

    /// Render settings derived from this configuration.
    pub fn render_config(&self) -> Result<RenderConfig, ConfigError> {
        Ok(RenderConfig {
            background: self.background_color()?,
            fallback_radius: self.fallback_radius,
        })
    }
}

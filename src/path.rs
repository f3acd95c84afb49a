//! Frame asset locators.
//!
//! Each device class owns a directory of sequentially numbered stills named
//! `NNN.jpg`. The resolver is a pure function of the profile and the frame
//! number, so two classes never share a locator as long as their base paths
//! differ.

use crate::DeviceProfile;

/// Number of digits frame numbers are zero-padded to.
pub const FRAME_NUMBER_WIDTH: usize = 3;

/// File extension shared by every frame asset.
pub const FRAME_EXTENSION: &str = "jpg";

/// Build the locator for `frame` under the profile's base path.
///
/// ## Example
///
/// ```rust
/// use scrollscrub_core::{resolve_frame_path, DeviceProfile};
///
/// let desktop = DeviceProfile::new("/adaline_frames");
/// assert_eq!(resolve_frame_path(&desktop, 7), "/adaline_frames/007.jpg");
/// assert_eq!(resolve_frame_path(&desktop, 142), "/adaline_frames/142.jpg");
/// ```
pub fn resolve(profile: &DeviceProfile, frame: u32) -> String {
    let base = profile.base_path.trim_end_matches('/');
    format!(
        "{base}/{frame:0width$}.{FRAME_EXTENSION}",
        width = FRAME_NUMBER_WIDTH
    )
}

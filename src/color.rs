//! Background colour parsing for the render pipeline.

use std::fmt;

/// An opaque RGB colour used to fill the canvas before each draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Warm off-white page background the frame sequence is shot against.
    pub const PAGE_BACKGROUND: Rgb = Rgb::new(0xF5, 0xF1, 0xE8);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the colour as a lowercase CSS hex string (`#rrggbb`).
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::PAGE_BACKGROUND
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse a colour string into an [`Rgb`].
///
/// Supports:
/// - Hex: `#RGB` (expanded to `#RRGGBB`) and `#RRGGBB`
/// - A handful of named colours: black, white, gray/grey, beige, ivory
/// - Case-insensitive, trims whitespace
pub fn parse_color(s: &str) -> Option<Rgb> {
    let s = s.trim();
    match s.strip_prefix('#') {
        Some(hex) => parse_hex(hex),
        None => parse_named(s),
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match hex.len() {
        3 => Some(Rgb::new(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        6 => Some(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        _ => None,
    }
}

fn parse_named(s: &str) -> Option<Rgb> {
    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Rgb::new(0, 0, 0)),
        "white" => Some(Rgb::new(255, 255, 255)),
        "gray" | "grey" => Some(Rgb::new(128, 128, 128)),
        "beige" => Some(Rgb::new(245, 245, 220)),
        "ivory" => Some(Rgb::new(255, 255, 240)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_background_hex() {
        assert_eq!(parse_color("#F5F1E8"), Some(Rgb::PAGE_BACKGROUND));
        assert_eq!(Rgb::PAGE_BACKGROUND.css(), "#f5f1e8");
    }

    #[test]
    fn shorthand_hex() {
        assert_eq!(parse_color("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(parse_color("#abc"), Some(Rgb::new(170, 187, 204)));
    }

    #[test]
    fn named_and_whitespace() {
        assert_eq!(parse_color("  Black "), Some(Rgb::new(0, 0, 0)));
        assert_eq!(parse_color("GREY"), Some(Rgb::new(128, 128, 128)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("#"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#+12"), None);
        assert_eq!(parse_color("#ééé"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }
}

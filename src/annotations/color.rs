//! Highlight color classification

/// Emoji markers for the eight highlighter colors the Zotero reader offers.
/// Magenta shares the purple marker.
const COLOR_EMOJI: [(&str, &str); 8] = [
    ("#ffd400", "\u{1F7E1}"), // yellow
    ("#ff6666", "\u{1F534}"), // red
    ("#5fb236", "\u{1F7E2}"), // green
    ("#2ea8e5", "\u{1F535}"), // blue
    ("#a28ae5", "\u{1F7E3}"), // purple
    ("#e56eee", "\u{1F7E3}"), // magenta
    ("#f19837", "\u{1F7E0}"), // orange
    ("#aaaaaa", "\u{26AA}"),  // gray
];

/// Fallback for annotations without a recognized color
pub const DEFAULT_COLOR: &str = "#ffd400";
pub const DEFAULT_EMOJI: &str = "\u{1F7E1}";

/// Map a hex color to its emoji marker, case-insensitively.
/// Absent and unknown colors both classify as yellow.
pub fn color_emoji(hex: Option<&str>) -> &'static str {
    let Some(hex) = hex else {
        return DEFAULT_EMOJI;
    };
    let normalized = hex.to_ascii_lowercase();
    COLOR_EMOJI
        .iter()
        .find(|(color, _)| *color == normalized)
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_EMOJI)
}

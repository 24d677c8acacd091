use ulid::Ulid;

use crate::model::CalendarEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub background: &'static str,
    pub hover: &'static str,
}

const fn color(background: &'static str, hover: &'static str) -> PaletteColor {
    PaletteColor { background, hover }
}

pub const PALETTE: [PaletteColor; 8] = [
    color("rgba(65, 105, 225, 0.8)", "rgba(65, 105, 225, 1)"),
    color("rgba(80, 200, 120, 0.8)", "rgba(80, 200, 120, 1)"),
    color("rgba(255, 107, 107, 0.8)", "rgba(255, 107, 107, 1)"),
    color("rgba(147, 112, 219, 0.8)", "rgba(147, 112, 219, 1)"),
    color("rgba(32, 178, 170, 0.8)", "rgba(32, 178, 170, 1)"),
    color("rgba(255, 140, 0, 0.8)", "rgba(255, 140, 0, 1)"),
    color("rgba(186, 85, 211, 0.8)", "rgba(186, 85, 211, 1)"),
    color("rgba(70, 130, 180, 0.8)", "rgba(70, 130, 180, 1)"),
];

/// Stable palette entry for an event id.
pub fn color_for(id: Ulid) -> PaletteColor {
    PALETTE[(id.0 % PALETTE.len() as u128) as usize]
}

/// The event's own color, else its palette background.
pub fn display_color(event: &CalendarEvent) -> &str {
    event
        .color
        .as_deref()
        .unwrap_or(color_for(event.id).background)
}

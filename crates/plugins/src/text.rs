use shared::geometry::Size;

const GLYPH_WIDTH: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;

/// Rough extent of `text` set at `font_size`, for hit testing without a font rasteriser.
pub(crate) fn extent(text: &str, font_size: f64) -> Size {
    let lines = text.lines().count().max(1);
    let widest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
    Size::new(
        widest as f64 * font_size * GLYPH_WIDTH,
        lines as f64 * font_size * LINE_HEIGHT,
    )
}

/// Parses a stored number, falling back to `default` on anything unreadable.
pub(crate) fn parse_or<T: std::str::FromStr>(value: Option<&String>, default: T) -> T {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

use crate::category::Category;
use ratatui::style::Color;

/// Linear RGB triple in 0.0-1.0
pub type Rgb = [f32; 3];

/// Background color of the canvas, also used as the fade target
pub const BACKGROUND: Rgb = [0.039, 0.039, 0.059];

const HIGHLIGHT: Rgb = [1.0, 1.0, 1.0];
const STAR: Rgb = [0.55, 0.55, 0.65];

/// Base color for each category (0x667eea, 0x764ba2, 0x48bb78)
pub fn category_rgb(category: Category) -> Rgb {
    match category {
        Category::A => [0.400, 0.494, 0.918],
        Category::B => [0.463, 0.294, 0.635],
        Category::C => [0.282, 0.733, 0.471],
    }
}

pub fn highlight_rgb() -> Rgb {
    HIGHLIGHT
}

pub fn star_rgb() -> Rgb {
    STAR
}

/// Blend from the background toward `color` by `t` (clamped to 0-1)
pub fn fade(color: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    [
        BACKGROUND[0] + (color[0] - BACKGROUND[0]) * t,
        BACKGROUND[1] + (color[1] - BACKGROUND[1]) * t,
        BACKGROUND[2] + (color[2] - BACKGROUND[2]) * t,
    ]
}

/// Average of two colors (edge between two categories)
pub fn mix(a: Rgb, b: Rgb) -> Rgb {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5, (a[2] + b[2]) * 0.5]
}

pub fn to_bytes(color: Rgb) -> [u8; 3] {
    [
        (color[0].clamp(0.0, 1.0) * 255.0) as u8,
        (color[1].clamp(0.0, 1.0) * 255.0) as u8,
        (color[2].clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

pub fn to_terminal(color: Rgb) -> Color {
    let [r, g, b] = to_bytes(color);
    Color::Rgb(r, g, b)
}

use crate::camera::Camera;
use crate::color::{category_rgb, fade, highlight_rgb, mix, star_rgb, to_terminal, Rgb};
use crate::simulation::FrameView;
use glam::Vec2;
use rand::Rng;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Edges are dim by design; this lifts them off the background
const EDGE_GAIN: f32 = 2.5;
const STAR_WEIGHT: f32 = 0.05;

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

#[derive(Clone, Copy)]
struct Dot {
    color: Rgb,
    weight: f32,
}

/// Dot raster shared by the terminal and image renderers.
/// Each dot keeps the heaviest color plotted onto it.
pub struct DotCanvas {
    width: usize,
    height: usize,
    dots: Vec<Option<Dot>>,
}

impl DotCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<(Rgb, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.dots[y * self.width + x].map(|d| (d.color, d.weight))
    }

    pub fn plot(&mut self, x: i32, y: i32, color: Rgb, weight: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let slot = &mut self.dots[y as usize * self.width + x as usize];
        match slot {
            Some(dot) if dot.weight >= weight => {}
            _ => *slot = Some(Dot { color, weight }),
        }
    }

    /// Bresenham line between two dot coordinates
    pub fn line(&mut self, from: Vec2, to: Vec2, color: Rgb, weight: f32) {
        let (mut x0, mut y0) = (from.x.round() as i32, from.y.round() as i32);
        let (x1, y1) = (to.x.round() as i32, to.y.round() as i32);
        // Endpoints far off-canvas would make the walk needlessly long
        let limit = (self.width + self.height) as i32 * 4;
        if [x0, y0, x1, y1].iter().any(|c| c.abs() > limit) {
            return;
        }

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x0, y0, color, weight);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Filled disk; radius below one dot plots a single dot
    pub fn disk(&mut self, center: Vec2, radius: f32, color: Rgb, weight: f32) {
        let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
        let r = radius.max(0.0);
        let reach = r.ceil() as i32;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if (dx * dx + dy * dy) as f32 <= r * r + 0.25 {
                    self.plot(cx + dx, cy + dy, color, weight);
                }
            }
        }
    }

    /// Pack the dots into Braille cells, one color per cell
    pub fn to_cells(&self) -> Vec<BrailleCell> {
        let cols = self.width.div_ceil(2);
        let rows = self.height.div_ceil(4);
        let mut cells = Vec::new();

        for cy in 0..rows {
            for cx in 0..cols {
                let mut pattern: u8 = 0;
                let mut best: Option<(Rgb, f32)> = None;

                for dx in 0..2 {
                    for dy in 0..4 {
                        if let Some((color, weight)) = self.get(cx * 2 + dx, cy * 4 + dy) {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            if best.map_or(true, |(_, w)| weight > w) {
                                best = Some((color, weight));
                            }
                        }
                    }
                }

                if let Some((color, _)) = best {
                    cells.push(BrailleCell {
                        x: cx as u16,
                        y: cy as u16,
                        char: char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' '),
                        color: to_terminal(color),
                    });
                }
            }
        }

        cells
    }
}

/// Sizing of particles on a raster
#[derive(Debug, Clone, Copy)]
pub struct DrawStyle {
    /// Dots per (size unit * pixel-per-world-unit)
    pub particle_scale: f32,
    pub max_radius: f32,
    pub show_stars: bool,
}

impl DrawStyle {
    pub fn terminal() -> Self {
        Self {
            particle_scale: 0.08,
            max_radius: 2.0,
            show_stars: true,
        }
    }
}

/// Background stars in normalized canvas coordinates
pub fn star_field(count: usize, rng: &mut impl Rng) -> Vec<Vec2> {
    (0..count)
        .map(|_| Vec2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect()
}

/// Rasterize a frame: stars, then edges, then particles on top
pub fn draw_frame(canvas: &mut DotCanvas, frame: &FrameView<'_>, camera: &Camera, stars: &[Vec2], style: DrawStyle) {
    let viewport = Vec2::new(canvas.width() as f32, canvas.height() as f32);
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return;
    }

    if style.show_stars {
        for star in stars {
            let p = *star * viewport;
            canvas.plot(p.x as i32, p.y as i32, fade(star_rgb(), 0.6), STAR_WEIGHT);
        }
    }

    let view_projection = camera.view_projection();
    let model = frame.transform.matrix();
    let projected: Vec<_> = frame
        .positions
        .iter()
        .map(|local| camera.project(model.transform_point3(*local), &view_projection, viewport))
        .collect();

    for edge in frame.edges {
        let (Some(a), Some(b)) = (projected[edge.a], projected[edge.b]) else {
            continue;
        };
        let color = mix(
            category_rgb(frame.categories[edge.a]),
            category_rgb(frame.categories[edge.b]),
        );
        let brightness = (edge.brightness * EDGE_GAIN).min(1.0);
        canvas.line(
            Vec2::new(a.x, a.y),
            Vec2::new(b.x, b.y),
            fade(color, brightness),
            edge.brightness,
        );
    }

    for (i, point) in projected.iter().enumerate() {
        let Some(point) = point else {
            continue;
        };
        let base = category_rgb(frame.categories[i]);
        let highlighted = frame.highlighted.get(i).copied().unwrap_or(false);
        let (color, weight) = if frame.hovered == Some(i) {
            (highlight_rgb(), 3.0)
        } else if highlighted {
            (mix(base, highlight_rgb()), 2.0)
        } else {
            (fade(base, 0.9), 1.0)
        };

        let size = frame.render_sizes.get(i).copied().unwrap_or(1.0);
        let radius = (size * frame.transform.scale * camera.pixels_per_unit(point.depth, viewport) * style.particle_scale)
            .min(style.max_radius);
        canvas.disk(Vec2::new(point.x, point.y), radius, color, weight);
    }
}

/// Render the frame to Braille cells for a canvas of `canvas_width` x
/// `canvas_height` terminal cells
pub fn render_to_braille(
    frame: &FrameView<'_>,
    camera: &Camera,
    stars: &[Vec2],
    canvas_width: u16,
    canvas_height: u16,
) -> Vec<BrailleCell> {
    let size = calculate_viewport(canvas_width, canvas_height);
    let mut canvas = DotCanvas::new(size.x as usize, size.y as usize);
    draw_frame(&mut canvas, frame, camera, stars, DrawStyle::terminal());
    canvas.to_cells()
}

/// Dot resolution of a canvas measured in terminal cells
pub fn calculate_viewport(canvas_width: u16, canvas_height: u16) -> Vec2 {
    // Braille gives 2x4 resolution per character
    Vec2::new(canvas_width as f32 * 2.0, canvas_height as f32 * 4.0)
}

/// Center dot of a terminal cell, relative to the canvas origin
pub fn cell_to_dot(col: u16, row: u16) -> Vec2 {
    Vec2::new(col as f32 * 2.0 + 1.0, row as f32 * 4.0 + 2.0)
}

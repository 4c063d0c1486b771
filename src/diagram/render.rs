use crate::diagram::model::{Color, DrawMode, Point, Stroke};
use image::imageops::{self, FilterType};
use image::RgbaImage;

const DASH_LENGTH_FACTOR: f64 = 2.0;
const GAP_LENGTH_FACTOR: f64 = 1.5;
const TRIGGER_ARM_FACTOR: f64 = 1.5;
const MIN_RADIUS: f64 = 0.5;

/// Sample position in `f64`. Samples far outside the surface keep sub-pixel
/// precision once their segment is clipped.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `None` for NaN or infinite samples.
    fn from_point(point: Point) -> Option<Self> {
        (point.x.is_finite() && point.y.is_finite())
            .then(|| Self::new(f64::from(point.x), f64::from(point.y)))
    }

    fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    fn distance_sq(self, other: Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    fn distance(self, other: Vec2) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

/// The surface rectangle grown by `pad` on every side.
#[derive(Debug, Clone, Copy)]
struct Clip {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Clip {
    fn padded(width: u32, height: u32, pad: f64) -> Self {
        Self {
            min_x: -pad,
            min_y: -pad,
            max_x: f64::from(width) + pad,
            max_y: f64::from(height) + pad,
        }
    }

    /// Parameter range `[t0, t1]` of `start..end` that lies inside the clip
    /// (Liang-Barsky), or `None` when the segment misses it entirely.
    fn segment_range(&self, start: Vec2, end: Vec2) -> Option<(f64, f64)> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        let edges = [
            (-dx, start.x - self.min_x),
            (dx, self.max_x - start.x),
            (-dy, start.y - self.min_y),
            (dy, self.max_y - start.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((t0, t1))
    }
}

/// Longest meaningful brush radius for a surface: a disc of this radius
/// covers the whole surface from any point on it.
fn max_radius(width: u32, height: u32) -> f64 {
    let (w, h) = (f64::from(width), f64::from(height));
    (w * w + h * h).sqrt().max(MIN_RADIUS)
}

fn clamp_radius(radius: f64, width: u32, height: u32) -> f64 {
    if radius.is_nan() {
        return MIN_RADIUS;
    }
    radius.clamp(MIN_RADIUS, max_radius(width, height))
}

/// Rasterises `stroke` onto `raster` in place. Returns whether any pixel of
/// the surface was painted.
///
/// Only the stroke itself is drawn; whatever the raster already holds (base
/// image plus earlier strokes) is left as the backdrop, so the cost depends on
/// the stroke alone. Samples outside the surface are clipped.
pub fn render_stroke(raster: &mut RgbaImage, stroke: &Stroke) -> bool {
    let (surface_w, surface_h) = raster.dimensions();
    // Wider than twice the diagonal changes nothing on the surface.
    let width = f64::from(stroke.style.width).min(2.0 * max_radius(surface_w, surface_h));
    let color = stroke.style.color;
    let Some(first) = stroke.points.first().copied() else {
        return false;
    };
    match stroke.mode() {
        DrawMode::FreehandPain => polyline(raster, &stroke.points, width, color),
        DrawMode::FreehandRestriction => dashed_polyline(raster, &stroke.points, width, color),
        DrawMode::Point => match Vec2::from_point(first) {
            Some(center) => draw_capsule(raster, center, center, width / 2.0, color),
            None => false,
        },
        DrawMode::TriggerPoint => trigger_mark(raster, first, width, color),
    }
}

/// Continuous line with round caps and joins; a single sample becomes a dot.
pub fn draw_polyline(raster: &mut RgbaImage, points: &[Point], width: f32, color: Color) -> bool {
    polyline(raster, points, f64::from(width), color)
}

/// Same geometry as [`draw_polyline`] but only the "on" intervals of the
/// dash pattern are painted. The pattern carries over polyline joints.
pub fn draw_dashed_polyline(
    raster: &mut RgbaImage,
    points: &[Point],
    width: f32,
    color: Color,
) -> bool {
    dashed_polyline(raster, points, f64::from(width), color)
}

/// Filled circle of the given radius.
pub fn draw_disc(raster: &mut RgbaImage, center: Point, radius: f32, color: Color) -> bool {
    match Vec2::from_point(center) {
        Some(center) => draw_capsule(raster, center, center, f64::from(radius), color),
        None => false,
    }
}

/// Two crossing diagonals, each `1.5 × width` long, drawn `width / 2` wide.
pub fn draw_trigger_mark(raster: &mut RgbaImage, center: Point, width: f32, color: Color) -> bool {
    trigger_mark(raster, center, f64::from(width), color)
}

fn finite_samples(points: &[Point]) -> Vec<Vec2> {
    points.iter().copied().filter_map(Vec2::from_point).collect()
}

fn polyline(raster: &mut RgbaImage, points: &[Point], width: f64, color: Color) -> bool {
    let samples = finite_samples(points);
    let radius = width / 2.0;
    match samples.as_slice() {
        [] => false,
        [only] => draw_capsule(raster, *only, *only, radius, color),
        _ => samples.windows(2).fold(false, |painted, segment| {
            draw_capsule(raster, segment[0], segment[1], radius, color) | painted
        }),
    }
}

fn dashed_polyline(raster: &mut RgbaImage, points: &[Point], width: f64, color: Color) -> bool {
    let samples = finite_samples(points);
    let Some(first) = samples.first().copied() else {
        return false;
    };
    let radius = width / 2.0;
    let total: f64 = samples
        .windows(2)
        .map(|segment| segment[0].distance(segment[1]))
        .sum();
    if total <= f64::EPSILON {
        return draw_capsule(raster, first, first, radius, color);
    }

    let (surface_w, surface_h) = raster.dimensions();
    let clip = Clip::padded(
        surface_w,
        surface_h,
        clamp_radius(radius, surface_w, surface_h) + 1.0,
    );
    let dash = (width * DASH_LENGTH_FACTOR).max(1.0);
    let gap = (width * GAP_LENGTH_FACTOR).max(1.0);
    let period = dash + gap;
    let mut offset = 0.0_f64;
    let mut painted = false;

    for segment in samples.windows(2) {
        let (start, end) = (segment[0], segment[1]);
        let length = start.distance(end);
        if length <= f64::EPSILON {
            continue;
        }
        // Only the part near the surface is walked; the dash phase at its
        // entry point follows from the distance travelled so far.
        if let Some((t0, t1)) = clip.segment_range(start, end) {
            let enter = start.lerp(end, t0);
            let exit = start.lerp(end, t1);
            let visible = enter.distance(exit);
            let mut phase = (offset + t0 * length).rem_euclid(period);
            let mut walked = 0.0_f64;
            while walked < visible {
                let on = phase < dash;
                let span = if on { dash - phase } else { period - phase };
                let next = (walked + span).min(visible);
                if on && visible > 0.0 {
                    let a = enter.lerp(exit, walked / visible);
                    let b = enter.lerp(exit, next / visible);
                    painted |= draw_capsule(raster, a, b, radius, color);
                }
                walked += span;
                phase = if on { dash } else { 0.0 };
            }
        }
        offset += length;
    }
    painted
}

fn trigger_mark(raster: &mut RgbaImage, center: Point, width: f64, color: Color) -> bool {
    let Some(center) = Vec2::from_point(center) else {
        return false;
    };
    let half = width * TRIGGER_ARM_FACTOR / 2.0;
    let offset = half / std::f64::consts::SQRT_2;
    let radius = width / 4.0;
    let first = draw_capsule(
        raster,
        Vec2::new(center.x - offset, center.y - offset),
        Vec2::new(center.x + offset, center.y + offset),
        radius,
        color,
    );
    let second = draw_capsule(
        raster,
        Vec2::new(center.x - offset, center.y + offset),
        Vec2::new(center.x + offset, center.y - offset),
        radius,
        color,
    );
    first | second
}

/// Paints every pixel whose centre lies within `radius` of the segment. The
/// segment is clipped to the surface first, so only surface pixels are
/// visited no matter how far outside the samples lie.
fn draw_capsule(raster: &mut RgbaImage, start: Vec2, end: Vec2, radius: f64, color: Color) -> bool {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return false;
    }
    let radius = clamp_radius(radius, width, height);
    let clip = Clip::padded(width, height, radius + 1.0);
    let Some((t0, t1)) = clip.segment_range(start, end) else {
        return false;
    };
    let (a, b) = (start.lerp(end, t0), start.lerp(end, t1));

    // Bounds are clamped to the surface in f64 before converting, so the
    // casts never wrap.
    let x0 = (a.x.min(b.x) - radius).floor().max(0.0) as u32;
    let y0 = (a.y.min(b.y) - radius).floor().max(0.0) as u32;
    let x1 = (a.x.max(b.x) + radius).ceil().min(f64::from(width)).max(0.0) as u32;
    let y1 = (a.y.max(b.y) + radius).ceil().min(f64::from(height)).max(0.0) as u32;

    let radius_sq = radius * radius;
    let rgba = color.to_rgba();
    let mut painted = false;
    for y in y0..y1 {
        for x in x0..x1 {
            let center = Vec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if point_segment_distance_sq(center, a, b) <= radius_sq {
                raster.put_pixel(x, y, rgba);
                painted = true;
            }
        }
    }
    painted
}

fn point_segment_distance_sq(point: Vec2, start: Vec2, end: Vec2) -> f64 {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f64::EPSILON {
        return point.distance_sq(start);
    }
    let wx = point.x - start.x;
    let wy = point.y - start.y;
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    point.distance_sq(Vec2::new(start.x + vx * t, start.y + vy * t))
}

/// The base image fitted to a surface of `size`.
pub fn base_surface(base: &RgbaImage, size: (u32, u32)) -> RgbaImage {
    if base.dimensions() == size {
        base.clone()
    } else {
        imageops::resize(base, size.0, size.1, FilterType::Triangle)
    }
}

/// Re-derives a surface of `size` from the base image and the current raster,
/// both scaled to the new size, with the raster composited over the base.
pub fn rescale(base: &RgbaImage, current: &RgbaImage, size: (u32, u32)) -> RgbaImage {
    let mut surface = base_surface(base, size);
    if current.dimensions() == size {
        imageops::overlay(&mut surface, current, 0, 0);
    } else {
        let scaled = imageops::resize(current, size.0, size.1, FilterType::Triangle);
        imageops::overlay(&mut surface, &scaled, 0, 0);
    }
    surface
}

/// Returns `raster` unchanged when it already matches `size`, otherwise the
/// rescaled surface.
pub fn fit_to_surface(base: &RgbaImage, raster: RgbaImage, size: (u32, u32)) -> RgbaImage {
    if raster.dimensions() == size {
        raster
    } else {
        rescale(base, &raster, size)
    }
}

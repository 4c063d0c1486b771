use crate::diagram::model::{Color, Point, ViewId};
use crate::diagram::render::{draw_disc, draw_polyline};
use crate::error::UnknownViewError;
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

const OUTLINE_COLOR: Color = Color::rgb(120, 120, 120);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Shared, immutable handle to a view's silhouette.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseImageRef(Arc<RgbaImage>);

impl BaseImageRef {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn same_image(&self, other: &BaseImageRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for BaseImageRef {
    type Target = RgbaImage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    images: BTreeMap<ViewId, BaseImageRef>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, view: ViewId, image: RgbaImage) {
        self.images.insert(view, BaseImageRef::new(image));
    }

    /// Plain outline silhouettes for every view, drawn at `width` x `height`.
    pub fn builtin(width: u32, height: u32) -> Self {
        let mut registry = Self::new();
        for view in ViewId::ALL {
            registry.register(view, draw_silhouette(view, width.max(1), height.max(1)));
        }
        registry
    }

    /// Loads `<view>.png` (e.g. `left-lateral.png`) for every view from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        for view in ViewId::ALL {
            let path = dir.join(format!("{}.png", view.as_str()));
            let image = image::open(&path)
                .with_context(|| format!("load base image {}", path.display()))?
                .to_rgba8();
            registry.register(view, image);
        }
        Ok(registry)
    }

    pub fn resolve(&self, view: ViewId) -> Result<BaseImageRef, UnknownViewError> {
        self.images
            .get(&view)
            .cloned()
            .ok_or_else(|| UnknownViewError::new(view.as_str()))
    }

    pub fn resolve_name(&self, name: &str) -> Result<(ViewId, BaseImageRef), UnknownViewError> {
        let view: ViewId = name.parse()?;
        Ok((view, self.resolve(view)?))
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.images.contains_key(&view)
    }

    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.images.keys().copied()
    }
}

#[derive(Clone, Copy)]
enum Facing {
    Front,
    Left,
    Right,
}

fn draw_silhouette(view: ViewId, width: u32, height: u32) -> RgbaImage {
    let mut raster = RgbaImage::from_pixel(width, height, BACKGROUND);
    let w = width as f32;
    let h = height as f32;
    let line = (w.min(h) / 150.0).max(2.0);
    let facing = match view {
        ViewId::Anterior | ViewId::Posterior => Facing::Front,
        ViewId::LeftLateral => Facing::Left,
        ViewId::RightLateral => Facing::Right,
    };

    let cx = w / 2.0;
    let head_radius = h * 0.065;
    let head = Point::new(cx, h * 0.1);
    draw_polyline(&mut raster, &ring(head, head_radius, 48), line, OUTLINE_COLOR);

    let half_torso = match facing {
        Facing::Front => w * 0.14,
        Facing::Left | Facing::Right => w * 0.08,
    };
    let shoulder_y = h * 0.2;
    let hip_y = h * 0.52;
    let waist = half_torso * 0.8;
    let torso = [
        Point::new(cx - half_torso, shoulder_y),
        Point::new(cx + half_torso, shoulder_y),
        Point::new(cx + waist, hip_y),
        Point::new(cx - waist, hip_y),
        Point::new(cx - half_torso, shoulder_y),
    ];
    draw_polyline(&mut raster, &torso, line, OUTLINE_COLOR);
    draw_polyline(
        &mut raster,
        &[
            Point::new(cx, head.y + head_radius),
            Point::new(cx, shoulder_y),
        ],
        line,
        OUTLINE_COLOR,
    );

    let foot_y = h * 0.95;
    match facing {
        Facing::Front => {
            for side in [-1.0_f32, 1.0] {
                let shoulder = Point::new(cx + side * half_torso, shoulder_y);
                let hand = Point::new(cx + side * half_torso * 1.6, h * 0.5);
                draw_polyline(&mut raster, &[shoulder, hand], line, OUTLINE_COLOR);
                let hip = Point::new(cx + side * waist * 0.6, hip_y);
                let foot = Point::new(cx + side * waist * 0.8, foot_y);
                draw_polyline(&mut raster, &[hip, foot], line, OUTLINE_COLOR);
            }
        }
        Facing::Left | Facing::Right => {
            let toward = if matches!(facing, Facing::Left) { -1.0 } else { 1.0 };
            let nose = Point::new(head.x + toward * head_radius * 1.25, head.y);
            draw_polyline(
                &mut raster,
                &[
                    Point::new(head.x + toward * head_radius, head.y - head_radius * 0.2),
                    nose,
                    Point::new(head.x + toward * head_radius, head.y + head_radius * 0.2),
                ],
                line,
                OUTLINE_COLOR,
            );
            let shoulder = Point::new(cx, shoulder_y + line);
            let hand = Point::new(cx + toward * half_torso * 0.5, h * 0.5);
            draw_polyline(&mut raster, &[shoulder, hand], line, OUTLINE_COLOR);
            let hip = Point::new(cx, hip_y);
            let foot = Point::new(cx, foot_y);
            let toe = Point::new(cx + toward * half_torso, foot_y);
            draw_polyline(&mut raster, &[hip, foot, toe], line, OUTLINE_COLOR);
        }
    }

    match view {
        ViewId::Anterior => {
            draw_disc(
                &mut raster,
                Point::new(cx, h * 0.42),
                line,
                OUTLINE_COLOR,
            );
        }
        ViewId::Posterior => {
            draw_polyline(
                &mut raster,
                &[Point::new(cx, shoulder_y), Point::new(cx, hip_y)],
                line / 2.0,
                OUTLINE_COLOR,
            );
        }
        ViewId::LeftLateral | ViewId::RightLateral => {}
    }

    raster
}

fn ring(center: Point, radius: f32, steps: usize) -> Vec<Point> {
    (0..=steps)
        .map(|step| {
            let t = step as f32 / steps as f32 * std::f32::consts::TAU;
            Point::new(center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .collect()
}

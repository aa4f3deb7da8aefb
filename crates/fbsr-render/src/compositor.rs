//! Turns an unordered list of draw operations plus border panels into one
//! scaled, layered raster.
//!
//! Layout is computed up front by [`Layout::compute`], which is pure and
//! testable without painting. [`compose`] then paints in a fixed order:
//! background, grid lattice, shadow buffer and draw operations (sorted),
//! grid numerals, panels, and finally the severity outline.

use std::cmp::Ordering;

use fbsr_core::diagnostics::{Level, Reporting};
use fbsr_core::geometry::{Bounds, Position};
use image::{Rgba, RgbaImage};

use crate::canvas::{Canvas, Transform, halve_alpha, rgb};
use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::panel::{BorderPanels, PanelSide};
use crate::renderer::{Layer, Renderer};

pub const TILE_SIZE: f64 = 32.0;
/// Upper bound on content pixels before the scale is halved.
pub const MAX_WORLD_RENDER_PIXELS: i64 = 10000 * 10000;

pub const GROUND_COLOR: [u8; 3] = [40, 40, 40];
pub const GRID_COLOR: [u8; 3] = [60, 60, 60];
pub const GRID_STROKE: f64 = 3.0 / TILE_SIZE;
const DEBUG_BOUNDS_STROKE: f64 = 1.0 / TILE_SIZE;
const NUMERAL_FONT: f64 = 0.6;

/// Union of all draw-operation bounds, or an empty box at the origin.
pub fn content_bounds(renderers: &[Box<dyn Renderer>]) -> Bounds {
    renderers
        .iter()
        .map(|r| r.bounds())
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default()
}

/// Snap content bounds outward to whole tiles, plus a one-tile margin.
pub fn grid_bounds(content: Bounds) -> Bounds {
    Bounds::from_diagonal(
        (content.min_x() + 0.4).floor() - 1.0,
        (content.min_y() + 0.4).floor() - 1.0,
        (content.max_x() - 0.4).ceil() + 1.0,
        (content.max_y() - 0.4).ceil() + 1.0,
    )
}

/// Panel border thickness per side, in panel units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Borders {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Everything the painter needs to know about sizes and placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Whole-tile grid box around the content.
    pub world: Bounds,
    /// World box grown to fit the panels' minimum extents.
    pub center: Bounds,
    /// Content scale; panel units stay at scale one.
    pub scale: f64,
    pub borders: Borders,
    /// Center plus borders, in world units.
    pub total: Bounds,
    pub image_width: u32,
    pub image_height: u32,
    /// Offset of each East panel from the center's top-right corner, in
    /// panel units.
    pub east_slots: Vec<(f64, f64)>,
}

impl Layout {
    pub fn compute(content: Bounds, panels: &BorderPanels, max_width: Option<u32>, max_height: Option<u32>) -> Layout {
        let world = grid_bounds(content);

        let mut center = world;
        for panel in panels.side(PanelSide::North).iter().chain(panels.side(PanelSide::South)) {
            center.width = center.width.max(panel.min_width());
        }
        for panel in panels.side(PanelSide::East).iter().chain(panels.side(PanelSide::West)) {
            center.height = center.height.max(panel.min_height());
        }

        let mut scale = 1.0_f64;
        while ((center.width * scale * TILE_SIZE) as i64) * ((center.height * scale * TILE_SIZE) as i64)
            > MAX_WORLD_RENDER_PIXELS
        {
            scale /= 2.0;
        }

        let mut borders = Borders::default();
        for panel in panels.side(PanelSide::North) {
            borders.top += panel.min_height();
        }
        for panel in panels.side(PanelSide::South) {
            borders.bottom += panel.min_height();
        }
        for panel in panels.side(PanelSide::West) {
            borders.left += panel.min_width();
        }

        // East panels stack in columns as wide as their widest panel; a
        // panel that would overflow the center height starts a new column.
        let mut east_slots = Vec::new();
        let mut budget = 0.0;
        let mut column_x = 0.0;
        let mut column_width = 0.0_f64;
        for panel in panels.side(PanelSide::East) {
            if budget > 0.0 && budget + panel.min_height() > center.height {
                column_x += column_width;
                column_width = 0.0;
                budget = 0.0;
            }
            column_width = column_width.max(panel.min_width());
            east_slots.push((column_x, budget));
            budget += panel.min_height();
        }
        borders.right = column_x + column_width;

        let min_scale = 1.0 / TILE_SIZE;
        if let Some(max_width) = max_width {
            let width = ((center.width + (borders.left + borders.right) / scale) * scale * TILE_SIZE) as i64;
            if width > max_width as i64 {
                scale = (max_width as f64 - TILE_SIZE * (borders.left + borders.right))
                    / (center.width * TILE_SIZE);
                scale = scale.max(min_scale);
                log::debug!("scale limited by max-width {max_width}: {scale}");
            }
        }
        if let Some(max_height) = max_height {
            let height = ((center.height + (borders.top + borders.bottom) / scale) * scale * TILE_SIZE) as i64;
            if height > max_height as i64 {
                scale = (max_height as f64 - TILE_SIZE * (borders.top + borders.bottom))
                    / (center.height * TILE_SIZE);
                scale = scale.max(min_scale);
                log::debug!("scale limited by max-height {max_height}: {scale}");
            }
        }

        let total = Bounds::from_diagonal(
            center.min_x() - borders.left / scale,
            center.min_y() - borders.top / scale,
            center.max_x() + borders.right / scale,
            center.max_y() + borders.bottom / scale,
        );
        let image_width = (total.width * scale * TILE_SIZE) as u32;
        let image_height = (total.height * scale * TILE_SIZE) as u32;

        Layout {
            world,
            center,
            scale,
            borders,
            total,
            image_width,
            image_height,
            east_slots,
        }
    }

    /// World-to-pixel transform for the computed image.
    pub fn world_transform(&self) -> Transform {
        let sx = self.image_width as f64 / self.total.width;
        let sy = self.image_height as f64 / self.total.height;
        Transform::new(sx, sy, -self.total.min_x() * sx, -self.total.min_y() * sy)
    }
}

/// Paint order: layer, then top edge, then left edge, then layer again.
fn paint_order(a: &dyn Renderer, b: &dyn Renderer) -> Ordering {
    let (ba, bb) = (a.bounds(), b.bounds());
    a.layer()
        .cmp(&b.layer())
        .then_with(|| ba.min_y().total_cmp(&bb.min_y()))
        .then_with(|| ba.min_x().total_cmp(&bb.min_x()))
        .then_with(|| a.layer().cmp(&b.layer()))
}

/// Accumulated shadows of every operation, composited as one operation.
struct ShadowBuffer {
    image: RgbaImage,
    bounds: Bounds,
}

impl Renderer for ShadowBuffer {
    fn layer(&self) -> Layer {
        Layer::ShadowBuffer
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn render(&self, canvas: &mut Canvas) -> Result<(), RenderError> {
        canvas.composite(&self.image);
        Ok(())
    }
}

fn paint_grid(canvas: &mut Canvas, world: Bounds) {
    let color = rgb(GRID_COLOR);
    let mut x = world.min_x().round();
    while x <= world.max_x() {
        canvas.line(Position::new(x, world.min_y()), Position::new(x, world.max_y()), GRID_STROKE, color);
        x += 1.0;
    }
    let mut y = world.min_y().round();
    while y <= world.max_y() {
        canvas.line(Position::new(world.min_x(), y), Position::new(world.max_x(), y), GRID_STROKE, color);
        y += 1.0;
    }
}

fn paint_numerals(canvas: &mut Canvas, world: Bounds) {
    let color = rgb(GRID_COLOR);
    let mut x = world.min_x().round() + 1.0;
    let mut i = 1u32;
    while x <= world.max_x() - 2.0 {
        let label = format!("{:02}", i % 100);
        canvas.text(Position::new(x + 0.2, world.max_y() - 1.0 + 0.65), NUMERAL_FONT, &label, color);
        canvas.text(Position::new(x + 0.2, world.min_y() + 0.65), NUMERAL_FONT, &label, color);
        x += 1.0;
        i += 1;
    }
    let mut y = world.min_y().round() + 1.0;
    let mut i = 1u32;
    while y <= world.max_y() - 2.0 {
        let label = format!("{:02}", i % 100);
        canvas.text(Position::new(world.max_x() - 1.0 + 0.2, y + 0.65), NUMERAL_FONT, &label, color);
        canvas.text(Position::new(world.min_x() + 0.2, y + 0.65), NUMERAL_FONT, &label, color);
        y += 1.0;
        i += 1;
    }
}

fn paint_panels(
    canvas: &mut Canvas,
    layout: &Layout,
    panels: &BorderPanels,
    reporting: &mut Reporting,
) {
    let base = layout.world_transform();
    let center = layout.center;
    let s = layout.scale;
    let inv = 1.0 / s;
    let mut paint = |canvas: &mut Canvas, origin: Position, panel: &dyn crate::panel::BorderPanel, w: f64, h: f64| {
        canvas.set_transform(base.translated(origin.x, origin.y).scaled(inv));
        if let Err(e) = panel.render(canvas, w, h) {
            reporting.add_exception(&RenderError::painting("panel", e));
        }
    };

    let mut y = center.min_y();
    for panel in panels.side(PanelSide::North) {
        y -= panel.min_height() / s;
        paint(canvas, Position::new(center.min_x(), y), panel.as_ref(), center.width * s, panel.min_height());
    }

    for (panel, (dx, dy)) in panels.side(PanelSide::East).iter().zip(&layout.east_slots) {
        let origin = Position::new(center.max_x() + dx / s, center.min_y() + dy / s);
        paint(canvas, origin, panel.as_ref(), panel.min_width(), panel.min_height());
    }

    let mut y = center.max_y();
    for panel in panels.side(PanelSide::South) {
        paint(canvas, Position::new(center.min_x(), y), panel.as_ref(), center.width * s, panel.min_height());
        y += panel.min_height() / s;
    }

    let mut x = center.min_x();
    for panel in panels.side(PanelSide::West) {
        x -= panel.min_width() / s;
        paint(canvas, Position::new(x, center.min_y()), panel.as_ref(), panel.min_width(), center.height * s);
    }

    canvas.set_transform(base);
}

/// Composite draw operations and panels into one image.
///
/// Failures of individual operations and panels are recorded in
/// `reporting` and painting carries on.
pub fn compose(
    mut renderers: Vec<Box<dyn Renderer>>,
    panels: &BorderPanels,
    options: &RenderOptions,
    reporting: &mut Reporting,
) -> Result<RgbaImage, RenderError> {
    let layout = Layout::compute(
        content_bounds(&renderers),
        panels,
        options.effective_max_width(),
        options.effective_max_height(),
    );
    log::info!("image {}x{} (scale {})", layout.image_width, layout.image_height, layout.scale);
    if layout.image_width == 0 || layout.image_height == 0 {
        return Err(RenderError::EmptyCanvas {
            width: layout.image_width,
            height: layout.image_height,
        });
    }

    let transform = layout.world_transform();
    let mut canvas = Canvas::new(layout.image_width, layout.image_height, rgb(GROUND_COLOR));
    canvas.set_transform(transform);
    paint_grid(&mut canvas, layout.world);

    let mut shadows = Canvas::new(layout.image_width, layout.image_height, Rgba([0, 0, 0, 0]));
    shadows.set_transform(transform);
    for r in &renderers {
        if let Err(e) = r.render_shadows(&mut shadows) {
            reporting.add_exception(&RenderError::painting(format!("{:?} shadow", r.layer()), e));
        }
    }
    let mut shadow_image = shadows.into_image();
    halve_alpha(&mut shadow_image);
    renderers.push(Box::new(ShadowBuffer {
        image: shadow_image,
        bounds: layout.world,
    }));

    renderers.sort_by(|a, b| paint_order(a.as_ref(), b.as_ref()));
    for r in &renderers {
        if let Err(e) = r.render(&mut canvas) {
            reporting.add_exception(&RenderError::painting(format!("{:?} operation", r.layer()), e));
            continue;
        }
        if options.debug_bounds {
            canvas.stroke_rect(r.bounds(), DEBUG_BOUNDS_STROKE, Rgba([255, 0, 255, 255]));
        }
    }
    canvas.set_transform(transform);

    paint_numerals(&mut canvas, layout.world);
    paint_panels(&mut canvas, &layout, panels, reporting);

    let level = reporting.level();
    if level != Level::Info {
        canvas.stroke_rect(layout.center, GRID_STROKE, rgb(level.outline_color()));
    }

    Ok(canvas.into_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::BorderPanel;
    use crate::renderer::{BoxRenderer, draw_fn};

    struct Fixed(f64, f64);

    impl BorderPanel for Fixed {
        fn min_width(&self) -> f64 {
            self.0
        }

        fn min_height(&self) -> f64 {
            self.1
        }

        fn render(&self, canvas: &mut Canvas, w: f64, h: f64) -> Result<(), RenderError> {
            canvas.fill_rect(Bounds::new(0.0, 0.0, w, h), Rgba([0, 0, 255, 255]));
            Ok(())
        }
    }

    struct Failing;

    impl BorderPanel for Failing {
        fn min_width(&self) -> f64 {
            1.0
        }

        fn min_height(&self) -> f64 {
            1.0
        }

        fn render(&self, _: &mut Canvas, _: f64, _: f64) -> Result<(), RenderError> {
            Err(RenderError::EmptyCanvas { width: 0, height: 0 })
        }
    }

    fn content_10x10() -> Bounds {
        Bounds::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn grid_box_adds_one_tile_margin() {
        let world = grid_bounds(content_10x10());
        assert_eq!(world, Bounds::new(-1.0, -1.0, 12.0, 12.0));
        // near-integer edges snap inward before the margin is added
        let world = grid_bounds(Bounds::new(0.3, 0.3, 9.4, 9.4));
        assert_eq!(world, Bounds::new(-1.0, -1.0, 12.0, 12.0));
    }

    #[test]
    fn north_and_east_panels_extend_canvas() {
        let mut panels = BorderPanels::new();
        panels.add(PanelSide::North, Box::new(Fixed(0.0, 2.0)));
        panels.add(PanelSide::East, Box::new(Fixed(3.0, 4.0)));
        let layout = Layout::compute(content_10x10(), &panels, None, None);
        assert_eq!(layout.scale, 1.0);
        assert_eq!(layout.center, Bounds::new(-1.0, -1.0, 12.0, 12.0));
        assert_eq!(layout.borders.top, 2.0);
        assert_eq!(layout.borders.right, 3.0);
        assert_eq!((layout.image_width, layout.image_height), (480, 448));
    }

    #[test]
    fn east_panels_wrap_into_columns() {
        let mut panels = BorderPanels::new();
        for _ in 0..3 {
            panels.add(PanelSide::East, Box::new(Fixed(3.0, 5.0)));
        }
        let layout = Layout::compute(content_10x10(), &panels, None, None);
        assert_eq!(layout.borders.right, 6.0);
        assert_eq!(layout.east_slots, vec![(0.0, 0.0), (0.0, 5.0), (3.0, 0.0)]);
    }

    #[test]
    fn wide_panels_widen_the_center() {
        let mut panels = BorderPanels::new();
        panels.add(PanelSide::South, Box::new(Fixed(20.0, 0.5)));
        let layout = Layout::compute(content_10x10(), &panels, None, None);
        assert_eq!(layout.center.width, 20.0);
        assert_eq!(layout.image_width, 640);
        assert_eq!(layout.image_height, 400);
    }

    #[test]
    fn huge_content_halves_scale_within_budget() {
        let layout = Layout::compute(Bounds::new(0.0, 0.0, 1000.0, 1000.0), &BorderPanels::new(), None, None);
        let w = layout.center.width * layout.scale * TILE_SIZE;
        let h = layout.center.height * layout.scale * TILE_SIZE;
        assert!((w as i64) * (h as i64) <= MAX_WORLD_RENDER_PIXELS);
        assert_eq!(layout.scale, 0.25);
    }

    #[test]
    fn max_width_shrinks_content_only() {
        let mut panels = BorderPanels::new();
        panels.add(PanelSide::East, Box::new(Fixed(3.0, 4.0)));
        let layout = Layout::compute(content_10x10(), &panels, Some(192), None);
        // 192 px minus 96 px of panel leaves 96 px for 12 tiles
        assert!((layout.scale - 0.25).abs() < 1e-9);
        assert_eq!(layout.image_width, 192);
    }

    #[test]
    fn scale_never_drops_below_one_pixel_per_tile() {
        let mut panels = BorderPanels::new();
        panels.add(PanelSide::East, Box::new(Fixed(3.0, 4.0)));
        let layout = Layout::compute(content_10x10(), &panels, Some(10), None);
        assert_eq!(layout.scale, 1.0 / TILE_SIZE);
    }

    #[test]
    fn same_layer_paints_in_row_order() {
        // Inserted bottom row first; the top row must still paint first so
        // the lower one ends up on top where they overlap.
        let renderers: Vec<Box<dyn Renderer>> = vec![
            Box::new(BoxRenderer {
                layer: Layer::Entity,
                bounds: Bounds::new(0.0, 0.5, 1.0, 1.0),
                fill: Rgba([255, 0, 0, 255]),
                outline: None,
            }),
            Box::new(BoxRenderer {
                layer: Layer::Entity,
                bounds: Bounds::new(0.0, 0.0, 1.0, 1.0),
                fill: Rgba([0, 255, 0, 255]),
                outline: None,
            }),
        ];
        let mut reporting = Reporting::new();
        let options = RenderOptions {
            show_info_panels: false,
            ..RenderOptions::default()
        };
        let image = compose(renderers, &BorderPanels::new(), &options, &mut reporting).unwrap();
        // world box starts at -1, so world (0.5, 0.75) is pixel (48, 56)
        assert_eq!(*image.get_pixel(48, 56), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(48, 40), Rgba([0, 255, 0, 255]));
        assert!(reporting.is_empty());
    }

    #[test]
    fn failing_operations_are_reported_and_skipped() {
        let renderers: Vec<Box<dyn Renderer>> = vec![
            draw_fn(Layer::Entity, Bounds::new(0.0, 0.0, 1.0, 1.0), |_| {
                Err(RenderError::EmptySprite {
                    entity: "broken".into(),
                    sprite: "0".into(),
                })
            }),
            Box::new(BoxRenderer {
                layer: Layer::Entity,
                bounds: Bounds::new(1.0, 0.0, 1.0, 1.0),
                fill: Rgba([0, 255, 0, 255]),
                outline: None,
            }),
        ];
        let mut panels = BorderPanels::new();
        panels.add(PanelSide::West, Box::new(Failing));
        let mut reporting = Reporting::new();
        let image = compose(renderers, &panels, &RenderOptions::default(), &mut reporting).unwrap();
        assert_eq!(reporting.entries().len(), 2);
        assert_eq!(reporting.level(), Level::Error);
        // the west panel shifts the image right by one tile
        assert_eq!(*image.get_pixel(32 + 48 + 16, 48), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn warning_level_draws_outline() {
        let renderers: Vec<Box<dyn Renderer>> = vec![Box::new(BoxRenderer {
            layer: Layer::Entity,
            bounds: Bounds::new(0.0, 0.0, 1.0, 1.0),
            fill: Rgba([0, 255, 0, 255]),
            outline: None,
        })];
        let mut reporting = Reporting::new();
        reporting.add_warning("something odd");
        let image = compose(renderers, &BorderPanels::new(), &RenderOptions::default(), &mut reporting).unwrap();
        assert_eq!(*image.get_pixel(0, 40), rgb(Level::Warning.outline_color()));
    }
}

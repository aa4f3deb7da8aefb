//! Draw operations: layer-tagged, bounded paint actions.

use std::fmt;

use fbsr_core::geometry::{Bounds, Position};
use fbsr_data::Sprite;
use image::Rgba;

use crate::canvas::Canvas;
use crate::error::RenderError;

/// Paint layer. Declaration order is paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Tile,
    TileOverlay,
    ShadowBuffer,
    Rail,
    Entity,
    EntityAbove,
    Overlay,
    LogisticsWarp,
    LogisticsMove,
    LogisticsRailIo,
    EntityInfoIcon,
    Wire,
    Debug,
    DebugRailIncoming,
    DebugRailOutgoing,
    DebugLogistic,
    DebugPlacement,
}

/// One draw operation consumed by the compositor.
pub trait Renderer {
    fn layer(&self) -> Layer;

    /// World-space bounds, used for the canvas extent and paint ordering.
    fn bounds(&self) -> Bounds;

    fn render(&self, canvas: &mut Canvas) -> Result<(), RenderError>;

    /// Paint into the shared shadow buffer. Most operations cast none.
    fn render_shadows(&self, _canvas: &mut Canvas) -> Result<(), RenderError> {
        Ok(())
    }
}

impl fmt::Debug for dyn Renderer + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("layer", &self.layer())
            .field("bounds", &self.bounds())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Sprites
// ---------------------------------------------------------------------------

/// Draws a list of sprites at an entity position. Sprites flagged as
/// shadows go to the shadow buffer instead.
#[derive(Debug, Clone)]
pub struct SpriteRenderer {
    layer: Layer,
    owner: String,
    position: Position,
    sprites: Vec<Sprite>,
    shadows: Vec<Sprite>,
    bounds: Bounds,
}

impl SpriteRenderer {
    pub fn new(layer: Layer, owner: &str, position: Position, sprites: Vec<Sprite>) -> Self {
        let (shadows, sprites): (Vec<_>, Vec<_>) = sprites.into_iter().partition(|s| s.shadow);
        let bounds = sprites
            .iter()
            .map(|s| s.bounds.translated(position))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Bounds::point(position));
        Self {
            layer,
            owner: owner.to_string(),
            position,
            sprites,
            shadows,
            bounds,
        }
    }

    fn paint(&self, canvas: &mut Canvas, sprites: &[Sprite]) -> Result<(), RenderError> {
        for (i, sprite) in sprites.iter().enumerate() {
            let src = sprite.source_rect();
            if src[2] == 0 || src[3] == 0 {
                return Err(RenderError::EmptySprite {
                    entity: self.owner.clone(),
                    sprite: i.to_string(),
                });
            }
            canvas.draw_image(&sprite.image, src, sprite.bounds.translated(self.position), 1.0);
        }
        Ok(())
    }
}

impl Renderer for SpriteRenderer {
    fn layer(&self) -> Layer {
        self.layer
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn render(&self, canvas: &mut Canvas) -> Result<(), RenderError> {
        self.paint(canvas, &self.sprites)
    }

    fn render_shadows(&self, canvas: &mut Canvas) -> Result<(), RenderError> {
        self.paint(canvas, &self.shadows)
    }
}

// ---------------------------------------------------------------------------
// Plain shapes
// ---------------------------------------------------------------------------

/// A filled rectangle with an optional outline. Used for tiles and as the
/// stand-in for entities whose prototype has no sprites.
#[derive(Debug, Clone, Copy)]
pub struct BoxRenderer {
    pub layer: Layer,
    pub bounds: Bounds,
    pub fill: Rgba<u8>,
    pub outline: Option<Rgba<u8>>,
}

impl Renderer for BoxRenderer {
    fn layer(&self) -> Layer {
        self.layer
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn render(&self, canvas: &mut Canvas) -> Result<(), RenderError> {
        canvas.fill_rect(self.bounds, self.fill);
        if let Some(outline) = self.outline {
            canvas.stroke_rect(self.bounds, 1.0 / 32.0, outline);
        }
        Ok(())
    }
}

/// A draw operation backed by a closure.
pub struct FnRenderer<F> {
    layer: Layer,
    bounds: Bounds,
    paint: F,
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&mut Canvas) -> Result<(), RenderError>,
{
    fn layer(&self) -> Layer {
        self.layer
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn render(&self, canvas: &mut Canvas) -> Result<(), RenderError> {
        (self.paint)(canvas)
    }
}

/// Box a closure as a draw operation.
pub fn draw_fn<F>(layer: Layer, bounds: Bounds, paint: F) -> Box<dyn Renderer>
where
    F: Fn(&mut Canvas) -> Result<(), RenderError> + 'static,
{
    Box::new(FnRenderer { layer, bounds, paint })
}

/// A straight wire-like line between two points.
pub fn line_renderer(layer: Layer, a: Position, b: Position, width: f64, color: Rgba<u8>) -> Box<dyn Renderer> {
    let bounds = Bounds::from_diagonal(a.x, a.y, b.x, b.y);
    draw_fn(layer, bounds, move |canvas| {
        canvas.line(a, b, width, color);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::RgbaImage;

    use super::*;

    fn sprite(shadow: bool, region: Option<[u32; 4]>) -> Sprite {
        Sprite {
            image: Arc::new(RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255]))),
            region,
            bounds: Bounds::new(-0.5, -0.5, 1.0, 1.0),
            shadow,
        }
    }

    #[test]
    fn layers_paint_in_declaration_order() {
        assert!(Layer::Tile < Layer::ShadowBuffer);
        assert!(Layer::ShadowBuffer < Layer::Entity);
        assert!(Layer::Entity < Layer::Wire);
        assert!(Layer::Wire < Layer::DebugPlacement);
    }

    #[test]
    fn sprite_bounds_exclude_shadows() {
        let mut shadow = sprite(true, None);
        shadow.bounds = Bounds::new(0.0, 0.0, 5.0, 5.0);
        let r = SpriteRenderer::new(Layer::Entity, "chest", Position::new(2.0, 2.0), vec![sprite(false, None), shadow]);
        assert_eq!(r.bounds(), Bounds::new(1.5, 1.5, 1.0, 1.0));
    }

    #[test]
    fn empty_region_is_an_error() {
        let r = SpriteRenderer::new(Layer::Entity, "chest", Position::new(0.0, 0.0), vec![sprite(false, Some([4, 4, 2, 2]))]);
        let mut canvas = Canvas::new(4, 4, Rgba([0, 0, 0, 255]));
        assert!(matches!(r.render(&mut canvas), Err(RenderError::EmptySprite { .. })));
    }

    #[test]
    fn shadows_paint_separately() {
        let r = SpriteRenderer::new(Layer::Entity, "chest", Position::new(0.5, 0.5), vec![sprite(true, None)]);
        let mut canvas = Canvas::new(2, 2, Rgba([0, 0, 0, 0]));
        r.render(&mut canvas).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Rgba([0, 0, 0, 0])));
        r.render_shadows(&mut canvas).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Rgba([200, 0, 0, 255])));
    }
}

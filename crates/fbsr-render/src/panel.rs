//! Border panels: fixed-minimum-size informational boxes attached to the
//! sides of the rendered content.
//!
//! Panels draw in their own units, one unit per tile at a content scale of
//! one, so their text stays legible however far the content is shrunk.

use std::collections::BTreeMap;
use std::sync::Arc;

use fbsr_core::geometry::{Bounds, Position};
use fbsr_data::GameData;
use fbsr_data::raw::RAW_TIME;
use image::{Rgba, RgbaImage};

use crate::canvas::{Canvas, brighter, rgb};
use crate::compositor::{GRID_COLOR, GRID_STROKE};
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelSide {
    North,
    East,
    South,
    West,
}

pub trait BorderPanel {
    fn min_width(&self) -> f64;
    fn min_height(&self) -> f64;

    /// Paint into a `width` × `height` box whose origin is the canvas
    /// transform origin.
    fn render(&self, canvas: &mut Canvas, width: f64, height: f64) -> Result<(), RenderError>;
}

/// Panels queued per side, in insertion order.
#[derive(Default)]
pub struct BorderPanels {
    north: Vec<Box<dyn BorderPanel>>,
    east: Vec<Box<dyn BorderPanel>>,
    south: Vec<Box<dyn BorderPanel>>,
    west: Vec<Box<dyn BorderPanel>>,
}

impl BorderPanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, side: PanelSide, panel: Box<dyn BorderPanel>) {
        match side {
            PanelSide::North => self.north.push(panel),
            PanelSide::East => self.east.push(panel),
            PanelSide::South => self.south.push(panel),
            PanelSide::West => self.west.push(panel),
        }
    }

    pub fn side(&self, side: PanelSide) -> &[Box<dyn BorderPanel>] {
        match side {
            PanelSide::North => &self.north,
            PanelSide::East => &self.east,
            PanelSide::South => &self.south,
            PanelSide::West => &self.west,
        }
    }

    pub fn len(&self) -> usize {
        self.north.len() + self.east.len() + self.south.len() + self.west.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Header / footer
// ---------------------------------------------------------------------------

/// Blueprint label along the top.
#[derive(Debug, Clone)]
pub struct HeaderPanel {
    label: String,
}

impl HeaderPanel {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

impl BorderPanel for HeaderPanel {
    fn min_width(&self) -> f64 {
        0.0
    }

    fn min_height(&self) -> f64 {
        0.75
    }

    fn render(&self, canvas: &mut Canvas, _width: f64, height: f64) -> Result<(), RenderError> {
        canvas.text(
            Position::new(0.21, height - 0.21),
            0.5,
            &self.label,
            brighter(rgb(GRID_COLOR)),
        );
        Ok(())
    }
}

/// Attribution line along the bottom.
#[derive(Debug, Clone)]
pub struct FooterPanel {
    version: String,
}

impl FooterPanel {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }

    pub fn message(&self, width: f64) -> String {
        if width > 5.5 {
            format!("Made by BlueprintBot - Factorio {}", self.version)
        } else {
            "BlueprintBot".to_string()
        }
    }
}

impl BorderPanel for FooterPanel {
    fn min_width(&self) -> f64 {
        0.0
    }

    fn min_height(&self) -> f64 {
        0.5
    }

    fn render(&self, canvas: &mut Canvas, width: f64, height: f64) -> Result<(), RenderError> {
        canvas.text(
            Position::new(0.11, height - 0.11),
            0.4,
            &self.message(width),
            rgb(GRID_COLOR),
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Item list
// ---------------------------------------------------------------------------

const LIST_HEADER: f64 = 0.8;
const LIST_SPACING: f64 = 0.7;
const LIST_FOOTER: f64 = 0.2;
const ICON_SIZE: f64 = 0.6;
const LIST_FONT: f64 = 0.6;

#[derive(Debug, Clone)]
struct ListEntry {
    name: String,
    amount: f64,
    icon: Option<Arc<RgbaImage>>,
    color: [u8; 3],
}

/// A titled list of item amounts with icons, sorted by item name.
#[derive(Debug, Clone)]
pub struct ItemListPanel {
    title: String,
    entries: Vec<ListEntry>,
}

impl ItemListPanel {
    pub fn new(title: &str, items: &BTreeMap<String, f64>, data: &GameData) -> Self {
        let entries = items
            .iter()
            .map(|(name, amount)| {
                let icon = if name == RAW_TIME {
                    None
                } else {
                    data.item(name).and_then(|i| i.icon.clone())
                };
                ListEntry {
                    name: name.clone(),
                    amount: *amount,
                    icon,
                    color: data.item_color(name),
                }
            })
            .collect();
        Self {
            title: title.to_string(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Amount as shown in an item list: whole numbers, then thousands, then
/// millions, always rounded up.
pub fn format_amount(amount: f64) -> String {
    if amount < 99999.0 {
        format!("{}", amount.ceil())
    } else if amount < 9_999_999.0 {
        format!("{}k", (amount / 1000.0).ceil())
    } else {
        format!("{}M", (amount / 1_000_000.0).ceil())
    }
}

fn amount_color(amount: f64) -> Rgba<u8> {
    let grid = rgb(GRID_COLOR);
    if amount < 99999.0 {
        grid
    } else if amount < 9_999_999.0 {
        brighter(grid)
    } else {
        brighter(brighter(grid))
    }
}

fn draw_clock(canvas: &mut Canvas, bounds: Bounds) {
    let center = bounds.center();
    let r = bounds.width / 2.0;
    canvas.fill_circle(center, r, Rgba([220, 220, 220, 255]));
    canvas.fill_circle(center, r * 0.8, Rgba([70, 70, 70, 255]));
    let hand = Rgba([220, 220, 220, 255]);
    canvas.line(center, Position::new(center.x, center.y - r * 0.6), r * 0.15, hand);
    canvas.line(center, Position::new(center.x + r * 0.45, center.y), r * 0.15, hand);
}

impl BorderPanel for ItemListPanel {
    fn min_width(&self) -> f64 {
        3.0
    }

    fn min_height(&self) -> f64 {
        LIST_HEADER + self.entries.len() as f64 * LIST_SPACING + LIST_FOOTER
    }

    fn render(&self, canvas: &mut Canvas, width: f64, height: f64) -> Result<(), RenderError> {
        let grid = rgb(GRID_COLOR);
        canvas.stroke_rect(Bounds::new(0.0, 0.0, width, height), GRID_STROKE, grid);
        canvas.text(Position::new(0.3, 0.65), LIST_FONT, &self.title, grid);

        let start_x = 0.6;
        let mut y = LIST_HEADER + LIST_SPACING / 2.0;
        for entry in &self.entries {
            let icon_box = Bounds::centered(Position::new(start_x, y), ICON_SIZE, ICON_SIZE);
            match &entry.icon {
                Some(icon) => {
                    let (w, h) = icon.dimensions();
                    canvas.draw_image(icon, [0, 0, w, h], icon_box, 1.0);
                }
                None if entry.name == RAW_TIME => draw_clock(canvas, icon_box),
                None => canvas.fill_rect(icon_box, rgb(entry.color)),
            }
            canvas.text(
                Position::new(start_x + 0.5, y + 0.18),
                LIST_FONT,
                &format_amount(entry.amount),
                amount_color(entry.amount),
            );
            y += LIST_SPACING;
        }
        Ok(())
    }
}

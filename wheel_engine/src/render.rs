use serde::Serialize;

use crate::geometry::{self, WheelLayout};
use crate::menu::MenuSnapshot;
use crate::paginate::Slot;

/// Angular floor: fewer than three sectors degenerates into half-rings, so
/// the wheel always divides the circle at least three ways.
pub const MIN_SECTORS: usize = 3;

const MORE_ICON: &str = "ellipsis";
const MORE_LABEL: &str = "More";

/// How an item's `icon` string should be sourced: a URL-like path loads as
/// an image, anything else names a symbolic glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IconRef {
    Image(String),
    Glyph(String),
}

impl IconRef {
    pub fn from_raw(raw: &str) -> Self {
        let path_like = raw.contains("://")
            || raw.contains('/')
            || raw.ends_with(".png")
            || raw.ends_with(".svg")
            || raw.ends_with(".webp");
        if path_like {
            IconRef::Image(raw.to_string())
        } else {
            IconRef::Glyph(raw.to_string())
        }
    }
}

/// Glyph shown on the center control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterGlyph {
    Close,
    Back,
}

/// Draw commands for one sector.
#[derive(Debug, Clone, Serialize)]
pub struct SectorDraw {
    pub path: String,
    pub icon: IconRef,
    pub icon_anchor: geometry::Point,
    pub label_lines: Vec<String>,
    pub label_anchor: geometry::Point,
    pub is_more: bool,
}

/// Full draw list for one frame. Pure function of the controller snapshot
/// and the layout; carries no state of its own.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub visible: bool,
    pub page: usize,
    pub sector_count: usize,
    pub sectors: Vec<SectorDraw>,
    pub center: CenterGlyph,
}

pub fn render(snapshot: &MenuSnapshot, layout: &WheelLayout) -> RenderFrame {
    let sector_count = snapshot.slots.len().max(MIN_SECTORS);
    let step = 360.0 / sector_count as f32;

    let sectors = snapshot
        .slots
        .iter()
        .enumerate()
        .map(|(position, slot)| {
            let start = position as f32 * step;
            let end = start + step;
            let mid = start + step / 2.0;
            let (icon, label, is_more) = match slot {
                Slot::Item { item, .. } => {
                    (IconRef::from_raw(&item.icon), item.label.as_str(), false)
                }
                Slot::More => (IconRef::Glyph(MORE_ICON.to_string()), MORE_LABEL, true),
            };
            SectorDraw {
                path: geometry::sector_path(layout, start, end),
                icon,
                icon_anchor: layout.icon_anchor(mid),
                label_lines: geometry::wrap_label(label, layout.max_label_len),
                label_anchor: layout.label_anchor(mid),
                is_more,
            }
        })
        .collect();

    let center = if snapshot.page == 1 && !snapshot.is_sub_menu {
        CenterGlyph::Close
    } else {
        CenterGlyph::Back
    };

    RenderFrame {
        visible: snapshot.visible,
        page: snapshot.page,
        sector_count,
        sectors,
        center,
    }
}

use macroquad::color::{Color, WHITE};
use macroquad::math::{vec2, Rect, Vec2};
use macroquad::shapes::draw_rectangle;
use macroquad::text::{draw_text, measure_text};
use macroquad::texture::{draw_texture_ex, DrawTextureParams};

use crate::assets::AssetPipeline;
use crate::config::RefSize;
use crate::render::layout::{AnchorPos, StageLayout};

/// A 2D element on the overlay surface. Positions and sizes are in reference
/// pixels; the stage layout maps them to the screen at draw time.
#[derive(Debug, Clone)]
pub enum OverlayNode {
    Sprite {
        image: String,
        pos: AnchorPos,
        size: Vec2,
        visible: bool,
    },
    Label {
        text: String,
        pos: AnchorPos,
        font_size: f32,
        color: Color,
        visible: bool,
    },
    Bar {
        pos: AnchorPos,
        size: Vec2,
        progress: f32,
        background: Color,
        fill: Color,
        visible: bool,
    },
    Button {
        label: String,
        pos: AnchorPos,
        size: Vec2,
        color: Color,
        label_color: Color,
        visible: bool,
    },
}

impl OverlayNode {
    pub fn is_visible(&self) -> bool {
        match self {
            OverlayNode::Sprite { visible, .. }
            | OverlayNode::Label { visible, .. }
            | OverlayNode::Bar { visible, .. }
            | OverlayNode::Button { visible, .. } => *visible,
        }
    }

    pub fn set_visible(&mut self, value: bool) {
        match self {
            OverlayNode::Sprite { visible, .. }
            | OverlayNode::Label { visible, .. }
            | OverlayNode::Bar { visible, .. }
            | OverlayNode::Button { visible, .. } => *visible = value,
        }
    }

    fn anchor(&self) -> &AnchorPos {
        match self {
            OverlayNode::Sprite { pos, .. }
            | OverlayNode::Label { pos, .. }
            | OverlayNode::Bar { pos, .. }
            | OverlayNode::Button { pos, .. } => pos,
        }
    }

    /// Extent used for anchoring and hit testing. Labels anchor on their
    /// center point and measure themselves at draw time.
    fn size_hint(&self) -> Vec2 {
        match self {
            OverlayNode::Sprite { size, .. }
            | OverlayNode::Bar { size, .. }
            | OverlayNode::Button { size, .. } => *size,
            OverlayNode::Label { .. } => Vec2::ZERO,
        }
    }
}

/// Insert-ordered 2D display list. Later entries draw on top, and hit tests
/// walk the list back to front.
pub struct Overlay {
    nodes: Vec<(String, OverlayNode)>,
    base: RefSize,
}

impl Overlay {
    pub fn new(base: RefSize) -> Overlay {
        Overlay {
            nodes: Vec::new(),
            base,
        }
    }

    /// Swap the reference resolution, as when the orientation flips. Nodes
    /// keep their anchors and re-resolve against the new base.
    pub fn set_base(&mut self, base: RefSize) {
        self.base = base;
    }

    pub fn base(&self) -> RefSize {
        self.base
    }

    /// Add a node, or replace one in place keeping its draw order.
    pub fn insert(&mut self, id: &str, node: OverlayNode) {
        if let Some(slot) = self.nodes.iter_mut().find(|(existing, _)| existing == id) {
            slot.1 = node;
        } else {
            self.nodes.push((id.to_string(), node));
        }
    }

    pub fn get(&self, id: &str) -> Option<&OverlayNode> {
        self.nodes
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut OverlayNode> {
        self.nodes
            .iter_mut()
            .find(|(existing, _)| existing == id)
            .map(|(_, node)| node)
    }

    pub fn remove(&mut self, id: &str) -> Option<OverlayNode> {
        let index = self.nodes.iter().position(|(existing, _)| existing == id)?;
        Some(self.nodes.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_visible(&mut self, id: &str, value: bool) {
        if let Some(node) = self.get_mut(id) {
            node.set_visible(value);
        }
    }

    pub fn set_progress(&mut self, id: &str, value: f32) {
        if let Some(OverlayNode::Bar { progress, .. }) = self.get_mut(id) {
            *progress = value.clamp(0.0, 1.0);
        }
    }

    pub fn set_text(&mut self, id: &str, value: &str) {
        match self.get_mut(id) {
            Some(OverlayNode::Label { text, .. }) | Some(OverlayNode::Button { label: text, .. }) => {
                *text = value.to_string();
            }
            _ => {}
        }
    }

    /// Bounding rect of a sized node in reference pixels. Labels have no
    /// rect.
    pub fn node_rect(&self, id: &str) -> Option<Rect> {
        let node = self.get(id)?;
        let size = node.size_hint();
        if size == Vec2::ZERO {
            return None;
        }
        let container = vec2(self.base.width, self.base.height);
        let corner = node.anchor().resolve(container, size);
        Some(Rect::new(corner.x, corner.y, size.x, size.y))
    }

    /// Topmost visible button under a screen-space point.
    pub fn hit_test(&self, layout: &StageLayout, screen: Vec2) -> Option<&str> {
        let stage = layout.to_stage(screen);
        let container = vec2(self.base.width, self.base.height);
        for (id, node) in self.nodes.iter().rev() {
            if !node.is_visible() {
                continue;
            }
            if let OverlayNode::Button { pos, size, .. } = node {
                let corner = pos.resolve(container, *size);
                let rect = Rect::new(corner.x, corner.y, size.x, size.y);
                if rect.contains(stage) {
                    return Some(id.as_str());
                }
            }
        }
        None
    }

    pub fn draw(&mut self, layout: &StageLayout, assets: &mut AssetPipeline) {
        let container = vec2(self.base.width, self.base.height);
        for (_, node) in self.nodes.iter_mut() {
            if !node.is_visible() {
                continue;
            }
            match node {
                OverlayNode::Sprite {
                    image, pos, size, ..
                } => {
                    let corner = layout.to_screen(pos.resolve(container, *size));
                    let dest = *size * layout.scale;
                    match assets.image_mut(image) {
                        Some(asset) => draw_texture_ex(
                            asset.texture(),
                            corner.x,
                            corner.y,
                            WHITE,
                            DrawTextureParams {
                                dest_size: Some(dest),
                                ..Default::default()
                            },
                        ),
                        // Missing art degrades to a flat placeholder.
                        None => draw_rectangle(
                            corner.x,
                            corner.y,
                            dest.x,
                            dest.y,
                            Color::new(0.5, 0.5, 0.5, 0.6),
                        ),
                    }
                }
                OverlayNode::Label {
                    text,
                    pos,
                    font_size,
                    color,
                    ..
                } => {
                    let center = layout.to_screen(pos.resolve(container, Vec2::ZERO));
                    let scaled = *font_size * layout.scale;
                    let dims = measure_text(&*text, None, scaled as u16, 1.0);
                    draw_text(
                        text,
                        center.x - dims.width / 2.0,
                        center.y + dims.offset_y / 2.0,
                        scaled,
                        *color,
                    );
                }
                OverlayNode::Bar {
                    pos,
                    size,
                    progress,
                    background,
                    fill,
                    ..
                } => {
                    let corner = layout.to_screen(pos.resolve(container, *size));
                    let dest = *size * layout.scale;
                    draw_rectangle(corner.x, corner.y, dest.x, dest.y, *background);
                    draw_rectangle(corner.x, corner.y, dest.x * *progress, dest.y, *fill);
                }
                OverlayNode::Button {
                    label,
                    pos,
                    size,
                    color,
                    label_color,
                    ..
                } => {
                    let corner = layout.to_screen(pos.resolve(container, *size));
                    let dest = *size * layout.scale;
                    draw_rectangle(corner.x, corner.y, dest.x, dest.y, *color);
                    let scaled = size.y * 0.5 * layout.scale;
                    let dims = measure_text(&*label, None, scaled as u16, 1.0);
                    draw_text(
                        label,
                        corner.x + (dest.x - dims.width) / 2.0,
                        corner.y + (dest.y + dims.offset_y) / 2.0,
                        scaled,
                        *label_color,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::{HAlign, VAlign};
    use macroquad::color::{BLACK, DARKGREEN, GREEN};

    const BASE: RefSize = RefSize {
        width: 1920.0,
        height: 1080.0,
    };

    fn button(visible: bool) -> OverlayNode {
        OverlayNode::Button {
            label: "Go".into(),
            pos: AnchorPos::center(),
            size: vec2(400.0, 120.0),
            color: GREEN,
            label_color: BLACK,
            visible,
        }
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert("a", button(true));
        overlay.insert("b", button(true));
        overlay.insert(
            "a",
            OverlayNode::Label {
                text: "hi".into(),
                pos: AnchorPos::center(),
                font_size: 32.0,
                color: BLACK,
                visible: true,
            },
        );
        assert_eq!(overlay.len(), 2);
        assert!(matches!(overlay.get("a"), Some(OverlayNode::Label { .. })));
    }

    #[test]
    fn progress_is_clamped() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert(
            "bar",
            OverlayNode::Bar {
                pos: AnchorPos::center(),
                size: vec2(600.0, 40.0),
                progress: 0.0,
                background: BLACK,
                fill: DARKGREEN,
                visible: true,
            },
        );
        overlay.set_progress("bar", 1.7);
        match overlay.get("bar") {
            Some(OverlayNode::Bar { progress, .. }) => assert_eq!(*progress, 1.0),
            other => panic!("unexpected node: {:?}", other),
        }
        overlay.set_progress("bar", -0.3);
        match overlay.get("bar") {
            Some(OverlayNode::Bar { progress, .. }) => assert_eq!(*progress, 0.0),
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn hit_test_finds_centered_button() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert("start", button(true));
        let layout = StageLayout::compute(1920.0, 1080.0, BASE);
        assert_eq!(overlay.hit_test(&layout, vec2(960.0, 540.0)), Some("start"));
        assert_eq!(overlay.hit_test(&layout, vec2(10.0, 10.0)), None);
    }

    #[test]
    fn hit_test_tracks_stage_scale() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert("start", button(true));
        // Half-size viewport: the stage center is now (480, 270).
        let layout = StageLayout::compute(960.0, 540.0, BASE);
        assert_eq!(overlay.hit_test(&layout, vec2(480.0, 270.0)), Some("start"));
        assert_eq!(overlay.hit_test(&layout, vec2(960.0, 540.0)), None);
    }

    #[test]
    fn hit_test_skips_hidden_and_prefers_topmost() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert("below", button(true));
        overlay.insert("hidden", button(false));
        let layout = StageLayout::compute(1920.0, 1080.0, BASE);
        assert_eq!(overlay.hit_test(&layout, vec2(960.0, 540.0)), Some("below"));
        overlay.insert("top", button(true));
        assert_eq!(overlay.hit_test(&layout, vec2(960.0, 540.0)), Some("top"));
    }

    #[test]
    fn node_rect_resolves_anchors() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert(
            "corner",
            OverlayNode::Sprite {
                image: "logo".into(),
                pos: AnchorPos::new(HAlign::Right, VAlign::Top).offset(-20.0, 20.0),
                size: vec2(100.0, 50.0),
                visible: true,
            },
        );
        let rect = overlay.node_rect("corner").unwrap();
        assert_eq!(rect, Rect::new(1800.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn set_text_updates_labels_and_buttons() {
        let mut overlay = Overlay::new(BASE);
        overlay.insert("go", button(true));
        overlay.set_text("go", "Restart");
        match overlay.get("go") {
            Some(OverlayNode::Button { label, .. }) => assert_eq!(label, "Restart"),
            other => panic!("unexpected node: {:?}", other),
        }
    }
}

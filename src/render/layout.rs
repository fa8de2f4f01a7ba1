use macroquad::math::{vec2, Vec2};

use crate::config::{Orientation, RefSize};

/// Relative width/height difference below which the orientation keeps its
/// previous value. Stops near-square windows from flapping between the
/// landscape and portrait stage on every one-pixel resize.
pub const ORIENTATION_DEADBAND: f32 = 0.02;

/// Decide the orientation for a viewport, with hysteresis around square.
pub fn classify_orientation(width: f32, height: f32, previous: Option<Orientation>) -> Orientation {
    if let Some(previous) = previous {
        if (width - height).abs() <= ORIENTATION_DEADBAND * width.max(height) {
            return previous;
        }
    }
    if width >= height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Letterbox mapping from a fixed reference resolution onto the real
/// viewport. Uniform scale, centered, never cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLayout {
    /// Screen point the stage pivot lands on, in real pixels.
    pub position: Vec2,
    /// Stage point held at `position`, in reference pixels.
    pub pivot: Vec2,
    /// Uniform reference-to-screen scale factor.
    pub scale: f32,
}

impl Default for StageLayout {
    fn default() -> Self {
        StageLayout {
            position: Vec2::ZERO,
            pivot: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl StageLayout {
    pub fn compute(width: f32, height: f32, base: RefSize) -> StageLayout {
        let scale = (width / base.width).min(height / base.height);
        StageLayout {
            position: vec2(width / 2.0, height / 2.0),
            pivot: vec2(base.width / 2.0, base.height / 2.0),
            scale,
        }
    }

    pub fn to_screen(&self, point: Vec2) -> Vec2 {
        self.position + (point - self.pivot) * self.scale
    }

    pub fn to_stage(&self, screen: Vec2) -> Vec2 {
        (screen - self.position) / self.scale + self.pivot
    }
}

/// Horizontal anchor inside a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical anchor inside a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Anchored position for an overlay element: an alignment pair plus a pixel
/// offset, resolved against the reference resolution so elements stay glued
/// to edges and corners across resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPos {
    pub h: HAlign,
    pub v: VAlign,
    pub offset: Vec2,
}

impl AnchorPos {
    pub fn new(h: HAlign, v: VAlign) -> AnchorPos {
        AnchorPos {
            h,
            v,
            offset: Vec2::ZERO,
        }
    }

    pub fn center() -> AnchorPos {
        AnchorPos::new(HAlign::Center, VAlign::Center)
    }

    pub fn offset(mut self, dx: f32, dy: f32) -> AnchorPos {
        self.offset = vec2(dx, dy);
        self
    }

    /// Top-left corner of an element of `size` placed in `container`.
    pub fn resolve(&self, container: Vec2, size: Vec2) -> Vec2 {
        let x = match self.h {
            HAlign::Left => 0.0,
            HAlign::Center => (container.x - size.x) / 2.0,
            HAlign::Right => container.x - size.x,
        };
        let y = match self.v {
            VAlign::Top => 0.0,
            VAlign::Center => (container.y - size.y) / 2.0,
            VAlign::Bottom => container.y - size.y,
        };
        vec2(x, y) + self.offset
    }
}

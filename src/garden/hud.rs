//! Overlay node ids and builders for the garden screens. Everything here is
//! pure overlay bookkeeping; drawing happens in the compositor.

use macroquad::color::{Color, BLACK, WHITE};
use macroquad::math::vec2;

use crate::render::{AnchorPos, HAlign, Overlay, OverlayNode, VAlign};

pub const LOADING_BAR: &str = "hud:loading-bar";
pub const LOADING_LABEL: &str = "hud:loading-label";
pub const LOGO: &str = "hud:logo";
pub const START_BUTTON: &str = "hud:start";

pub const LEVEL_LABEL: &str = "hud:level";
pub const GOAL_BAR: &str = "hud:goal";
pub const SCORE_LABEL: &str = "hud:score";

pub const WIN_LABEL: &str = "hud:win";
pub const RESTART_BUTTON: &str = "hud:restart";

const BAR_BACKGROUND: Color = Color::new(0.12, 0.12, 0.12, 0.85);
const BAR_FILL: Color = Color::new(0.30, 0.72, 0.33, 1.0);
const BUTTON_COLOR: Color = Color::new(0.96, 0.62, 0.14, 1.0);

pub fn install_loading_screen(overlay: &mut Overlay) {
    overlay.insert(
        LOGO,
        OverlayNode::Sprite {
            image: "logo".to_string(),
            pos: AnchorPos::new(HAlign::Center, VAlign::Top).offset(0.0, 120.0),
            size: vec2(480.0, 240.0),
            visible: true,
        },
    );
    overlay.insert(
        LOADING_BAR,
        OverlayNode::Bar {
            pos: AnchorPos::new(HAlign::Center, VAlign::Center).offset(0.0, 180.0),
            size: vec2(640.0, 36.0),
            progress: 0.0,
            background: BAR_BACKGROUND,
            fill: BAR_FILL,
            visible: true,
        },
    );
    overlay.insert(
        LOADING_LABEL,
        OverlayNode::Label {
            text: "Loading...".to_string(),
            pos: AnchorPos::new(HAlign::Center, VAlign::Center).offset(0.0, 120.0),
            font_size: 36.0,
            color: WHITE,
            visible: true,
        },
    );
    // Revealed once loading finishes.
    overlay.insert(
        START_BUTTON,
        OverlayNode::Button {
            label: "Play".to_string(),
            pos: AnchorPos::new(HAlign::Center, VAlign::Center).offset(0.0, 300.0),
            size: vec2(360.0, 110.0),
            color: BUTTON_COLOR,
            label_color: BLACK,
            visible: false,
        },
    );
}

pub fn remove_loading_screen(overlay: &mut Overlay) {
    overlay.remove(LOGO);
    overlay.remove(LOADING_BAR);
    overlay.remove(LOADING_LABEL);
    overlay.remove(START_BUTTON);
}

pub fn install_hud(overlay: &mut Overlay, title: &str) {
    overlay.insert(
        LEVEL_LABEL,
        OverlayNode::Label {
            text: title.to_string(),
            pos: AnchorPos::new(HAlign::Center, VAlign::Top).offset(0.0, 60.0),
            font_size: 44.0,
            color: WHITE,
            visible: true,
        },
    );
    overlay.insert(
        GOAL_BAR,
        OverlayNode::Bar {
            pos: AnchorPos::new(HAlign::Center, VAlign::Top).offset(0.0, 110.0),
            size: vec2(420.0, 22.0),
            progress: 0.0,
            background: BAR_BACKGROUND,
            fill: BAR_FILL,
            visible: true,
        },
    );
    overlay.insert(
        SCORE_LABEL,
        OverlayNode::Label {
            text: "0".to_string(),
            pos: AnchorPos::new(HAlign::Right, VAlign::Top).offset(-80.0, 60.0),
            font_size: 40.0,
            color: WHITE,
            visible: true,
        },
    );
}

pub fn set_goal_progress(overlay: &mut Overlay, placed: usize, goal: usize) {
    let progress = if goal == 0 {
        1.0
    } else {
        placed as f32 / goal as f32
    };
    overlay.set_progress(GOAL_BAR, progress);
}

pub fn set_score(overlay: &mut Overlay, score: u32) {
    overlay.set_text(SCORE_LABEL, &score.to_string());
}

pub fn install_win_screen(overlay: &mut Overlay) {
    overlay.insert(
        WIN_LABEL,
        OverlayNode::Label {
            text: "Garden complete!".to_string(),
            pos: AnchorPos::new(HAlign::Center, VAlign::Center).offset(0.0, -120.0),
            font_size: 64.0,
            color: WHITE,
            visible: true,
        },
    );
    overlay.insert(
        RESTART_BUTTON,
        OverlayNode::Button {
            label: "Play again".to_string(),
            pos: AnchorPos::new(HAlign::Center, VAlign::Center).offset(0.0, 60.0),
            size: vec2(420.0, 110.0),
            color: BUTTON_COLOR,
            label_color: BLACK,
            visible: true,
        },
    );
}

pub fn remove_win_screen(overlay: &mut Overlay) {
    overlay.remove(WIN_LABEL);
    overlay.remove(RESTART_BUTTON);
}

//! TERRARIUM: a playable-ad style game runtime
//!
//! A thin orchestration layer for small 3D building games:
//! - String-named event bus decoupling every subsystem
//! - Typed asset pipeline with aggregate load progress
//! - One drawing context compositing a 3D scene under a 2D overlay
//! - Flat phase machine with async phase entry
//! - Fixed-step application loop
//!
//! Ships with the garden makeover demo game.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod assets;
mod audio;
mod bus;
mod config;
mod game;
mod garden;
mod phase;
mod render;

use macroquad::prelude::*;

use app::App;
use config::Config;
use garden::GardenGame;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("TERRARIUM v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        // Start windowed on all platforms (WASM: browser handles sizing)
        #[cfg(not(target_arch = "wasm32"))]
        fullscreen: false,
        ..Default::default()
    }
}

async fn load_config() -> Config {
    match load_string("assets/config.ron").await {
        Ok(text) => match Config::from_ron(&text) {
            Ok(config) => {
                println!("Loaded assets/config.ron");
                config
            }
            Err(e) => {
                eprintln!("Bad config, using defaults: {}", e);
                Config::default()
            }
        },
        Err(_) => {
            println!("No assets/config.ron, using defaults");
            Config::default()
        }
    }
}

/// Structural failure screen. Loops forever; there is nothing to recover.
async fn fatal(message: String) {
    eprintln!("Fatal: {}", message);
    loop {
        clear_background(BLACK);
        let size = 32.0;
        let dims = measure_text(&message, None, size as u16, 1.0);
        draw_text(
            &message,
            (screen_width() - dims.width) / 2.0,
            screen_height() / 2.0,
            size,
            RED,
        );
        next_frame().await;
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let config = load_config().await;
    println!("Starting {} at {} fps", config.name, config.target_fps);

    let mut app = App::new(config, screen_width(), screen_height());
    let game = GardenGame::new(&app.core.bus);
    if let Err(e) = app.run_game(Box::new(game)).await {
        app.dispose();
        fatal(format!("{}", e)).await;
    }

    loop {
        app.frame().await;
        next_frame().await;
    }
}

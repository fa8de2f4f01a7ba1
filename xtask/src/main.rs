//! Build automation tasks for Terrarium
//!
//! Usage:
//!   cargo xtask build-web       # Build WASM for web deployment
//!   cargo xtask package-ad      # Create single zip for ad network upload
//!   cargo xtask init-config     # Write a default assets/config.ron

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for Terrarium")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build WASM for web deployment
    BuildWeb {
        /// Mark as dev build (adds DEV banner to index.html)
        #[arg(long)]
        dev: bool,
    },
    /// Create a single zip ready for playable-ad upload
    PackageAd,
    /// Write a default assets/config.ron if none exists
    InitConfig {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildWeb { dev } => build_web(dev),
        Commands::PackageAd => package_ad(),
        Commands::InitConfig { force } => init_config(force),
    }
}

/// Get the project root directory
fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Run a command and check for success
fn run_cmd(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().context("Failed to execute command")?;
    if !status.success() {
        anyhow::bail!("Command failed with status: {}", status);
    }
    Ok(())
}

/// Download a file from URL to destination
fn download_file(url: &str, dest: &Path) -> Result<()> {
    println!("Downloading {}...", url);
    run_cmd(
        Command::new("curl")
            .args(["-L", "-o"])
            .arg(dest)
            .arg(url),
    )
}

/// Copy directory recursively
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Build WASM for web deployment
fn build_web(dev: bool) -> Result<()> {
    let root = project_root();
    let dist = root.join("dist/web");

    println!("Building WASM...");
    run_cmd(
        Command::new("cargo")
            .current_dir(&root)
            .args(["build", "--release", "--target", "wasm32-unknown-unknown"]),
    )?;

    // Clean and create dist folder
    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    // Copy WASM binary
    println!("Copying files to dist/web...");
    std::fs::copy(
        root.join("target/wasm32-unknown-unknown/release/terrarium.wasm"),
        dist.join("terrarium.wasm"),
    )?;

    // Copy web files from docs/
    let docs = root.join("docs");
    for file in ["index.html", "favicon-16.png", "favicon-32.png"] {
        let src = docs.join(file);
        if src.exists() {
            std::fs::copy(&src, dist.join(file))?;
        }
    }

    // Download macroquad JS bundle
    let mq_js = dist.join("mq_js_bundle.js");
    if !mq_js.exists() {
        download_file(
            "https://raw.githubusercontent.com/not-fl3/macroquad/v0.4.14/js/mq_js_bundle.js",
            &mq_js,
        )?;
    }

    // Copy assets
    copy_dir_recursive(&root.join("assets"), &dist.join("assets"))?;

    // Apply dev modifications if requested
    if dev {
        println!("Applying DEV build modifications...");
        let index_path = dist.join("index.html");
        if index_path.exists() {
            let index = std::fs::read_to_string(&index_path)?;
            let index = index
                .replace("Loading Terrarium", "Loading Terrarium (DEV)")
                .replace("<title>Terrarium", "<title>[DEV] Terrarium");
            std::fs::write(&index_path, index)?;
        }
    }

    println!("Web build complete: dist/web/");
    Ok(())
}

/// Create zip for ad network upload
fn package_ad() -> Result<()> {
    // First build web
    build_web(false)?;

    let root = project_root();
    let dist = root.join("dist");
    let zip_path = dist.join("terrarium-ad.zip");

    // Remove old zip if exists
    if zip_path.exists() {
        std::fs::remove_file(&zip_path)?;
    }

    println!("Creating playable-ad zip...");
    run_cmd(
        Command::new("zip")
            .current_dir(dist.join("web"))
            .args(["-r", "../terrarium-ad.zip", "."]),
    )?;

    println!("Ad package ready: dist/terrarium-ad.zip");
    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"(
    name: "Terrarium",
    target_fps: 60.0,
    screen: (
        landscape: (width: 1920.0, height: 1080.0),
        portrait: (width: 1080.0, height: 1920.0),
    ),
    camera: (
        fov_y: 70.0,
        position: (0.0, 10.0, 20.0),
        target: (0.0, 0.0, 0.0),
    ),
    audio: (
        master_volume: 1.0,
        music_volume: 0.7,
        sfx_volume: 1.0,
    ),
    renderer: (
        clear_color: (0.0, 0.0, 0.0),
    ),
)
"#;

/// Write a default assets/config.ron
fn init_config(force: bool) -> Result<()> {
    let root = project_root();
    let path = root.join("assets/config.ron");

    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::create_dir_all(root.join("assets"))?;
    std::fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Wrote {}", path.display());
    Ok(())
}

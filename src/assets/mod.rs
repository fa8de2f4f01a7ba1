//! Asset pipeline
//!
//! Loads typed resources (glTF models, 2D images, sound clips, looping
//! music tracks) with per-resource state tracking and aggregate progress.
//! Loaded resources are cached for the lifetime of the pipeline; the same
//! key always returns the cached value, never a second transfer.

mod manifest;
mod model;
mod pipeline;
mod source;

pub use manifest::{AssetManifest, ClipEntry, ImageEntry};
pub use model::{Model3d, NamedNode};
pub use pipeline::{
    AssetPipeline, AudioClip, ImageAsset, LoadReport, LoadState, ProgressLedger,
};
pub use source::{FileSource, HostSource, MemorySource};

/// Error type for asset operations
#[derive(Debug)]
pub enum AssetError {
    /// Transfer failed (file missing, network error)
    Io(String),
    /// Bytes arrived but could not be decoded
    Decode(String),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(msg) => write!(f, "I/O error: {}", msg),
            AssetError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for AssetError {}

#[cfg(test)]
pub(crate) mod testutil {
    /// Minimal valid glTF JSON with the given node names (empty name = unnamed)
    pub(crate) fn gltf_with_nodes(names: &[&str]) -> Vec<u8> {
        let nodes: Vec<String> = names
            .iter()
            .map(|n| {
                if n.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{\"name\":\"{}\"}}", n)
                }
            })
            .collect();
        let roots: Vec<String> = (0..names.len()).map(|i| i.to_string()).collect();
        format!(
            "{{\"asset\":{{\"version\":\"2.0\"}},\"scene\":0,\"scenes\":[{{\"nodes\":[{}]}}],\"nodes\":[{}]}}",
            roots.join(","),
            nodes.join(",")
        )
        .into_bytes()
    }

    /// A tiny valid PNG
    pub(crate) fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }
}

//! Renderer configuration.
//!
//! `RendererConfig` controls the window, the logical drawing size and which
//! backend the [`Renderer`](crate::render::Renderer) is created with. It
//! provides defaults via [`Default`], a fluent [`RendererConfig::builder()`]
//! with validation, and can be loaded from a JSON file. Missing fields in the
//! file fall back to their defaults.
//!
//! # Examples
//!
//! ```rust
//! use gosub_render2d::{BackendKind, RendererConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = RendererConfig::builder()
//!     .title("Layers")
//!     .window_size(1024, 768)
//!     .backend(BackendKind::Null)
//!     .build()?;
//! assert_eq!(cfg.logical_width, 800);
//! # Ok(()) }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Draws nothing, journals calls.
    Null,
    /// CPU rasteriser.
    #[default]
    Software,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Drawing coordinates are in logical pixels, independent of the window size.
    pub logical_width: u32,
    pub logical_height: u32,
    pub backend: BackendKind,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            title: "Gosub".to_string(),
            window_width: 800,
            window_height: 600,
            logical_width: 800,
            logical_height: 600,
            backend: BackendKind::default(),
            fullscreen: false,
            vsync: false,
        }
    }
}

impl RendererConfig {
    pub fn builder() -> RendererConfigBuilder {
        RendererConfigBuilder::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let cfg: RendererConfig = serde_json::from_str(json).context("cannot parse renderer config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read renderer config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid renderer config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::ZeroWindow {
                width: self.window_width,
                height: self.window_height,
            });
        }
        if self.logical_width == 0 || self.logical_height == 0 {
            return Err(ConfigError::ZeroLogical {
                width: self.logical_width,
                height: self.logical_height,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RendererConfigBuilder {
    inner: RendererConfig,
}

impl RendererConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut RendererConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn title<S: Into<String>>(self, title: S) -> Self { self.map(|c| c.title = title.into()) }
    pub fn window_size(self, width: u32, height: u32) -> Self {
        self.map(|c| {
            c.window_width = width;
            c.window_height = height;
        })
    }
    pub fn logical_size(self, width: u32, height: u32) -> Self {
        self.map(|c| {
            c.logical_width = width;
            c.logical_height = height;
        })
    }
    pub fn backend(self, kind: BackendKind) -> Self { self.map(|c| c.backend = kind) }
    pub fn fullscreen(self, on: bool) -> Self { self.map(|c| c.fullscreen = on) }
    pub fn vsync(self, on: bool) -> Self { self.map(|c| c.vsync = on) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<RendererConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("window size {width}x{height} must be non-zero")]
    ZeroWindow { width: u32, height: u32 },
    #[error("logical size {width}x{height} must be non-zero")]
    ZeroLogical { width: u32, height: u32 },
}

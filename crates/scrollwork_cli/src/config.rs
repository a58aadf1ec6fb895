//! Page descriptor and script file handling

use anyhow::{bail, Context, Result};
use scrollwork_animation::PageDescriptor;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Load and parse a page descriptor (page.toml)
pub fn load_page(path: &Path) -> Result<PageDescriptor> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read page descriptor {}", path.display()))?;
    PageDescriptor::from_toml(&content)
        .with_context(|| format!("Failed to parse page descriptor {}", path.display()))
}

/// A scripted input session (script.toml)
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Frame length used to slice `advance` steps
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f32,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_frame_ms() -> f32 {
    16.0
}

impl Default for Script {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            steps: Vec::new(),
        }
    }
}

/// One scripted input, written as a single-key inline table
///
/// ```toml
/// steps = [
///     { scroll = 1210 },
///     { advance = 800 },
///     { pointer = [640, 400] },
///     { theme = "toggle" },
///     { teardown = "about" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Scroll the document to this offset
    Scroll(f32),
    /// Let this many milliseconds pass, one frame at a time
    Advance(f32),
    /// Move the pointer to a document position
    Pointer([f32; 2]),
    /// Pointer leaves the named region
    Leave(String),
    /// Pointer leaves the window
    Exit(bool),
    /// `true` presses a pointer button, `false` releases it
    Press(bool),
    /// Resize the viewport
    Viewport([f32; 2]),
    /// `light`, `dark` or `toggle`
    Theme(String),
    /// Tear down the named section
    Teardown(String),
}

/// Shortest frame a simulation may slice time into
pub const MIN_FRAME_MS: f32 = 1.0;

/// Longest single `advance` step, one hour of simulated time
pub const MAX_ADVANCE_MS: f32 = 3_600_000.0;

impl Step {
    /// Reject values the simulation cannot make progress on
    pub fn validate(&self) -> Result<()> {
        match self {
            Step::Scroll(y) if !y.is_finite() => bail!("scroll offset must be finite, got {y}"),
            Step::Advance(ms) if !ms.is_finite() || *ms < 0.0 || *ms > MAX_ADVANCE_MS => {
                bail!("advance must be between 0 and {MAX_ADVANCE_MS} ms, got {ms}")
            }
            Step::Pointer([x, y]) if !x.is_finite() || !y.is_finite() => {
                bail!("pointer position must be finite, got [{x}, {y}]")
            }
            Step::Viewport([w, h]) if !(w.is_finite() && h.is_finite() && *w > 0.0 && *h > 0.0) => {
                bail!("viewport must be a positive size, got [{w}, {h}]")
            }
            _ => Ok(()),
        }
    }
}

impl Script {
    pub fn from_toml(content: &str) -> Result<Self> {
        let script: Script = toml::from_str(content).context("Failed to parse script")?;
        if !(script.frame_ms.is_finite() && script.frame_ms >= MIN_FRAME_MS) {
            bail!("frame_ms must be at least {MIN_FRAME_MS}, got {}", script.frame_ms);
        }
        for (index, step) in script.steps.iter().enumerate() {
            step.validate()
                .with_context(|| format!("Invalid script step {}", index + 1))?;
        }
        Ok(script)
    }
}

/// Load and parse a script file
pub fn load_script(path: &Path) -> Result<Script> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    Script::from_toml(&content).with_context(|| format!("Invalid script {}", path.display()))
}

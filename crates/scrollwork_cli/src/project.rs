//! Sample page scaffolding

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Create `page.toml` and `script.toml` in `path`
pub fn create_page(path: &Path, force: bool) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;

    let files = [("page.toml", SAMPLE_PAGE), ("script.toml", SAMPLE_SCRIPT)];

    if !force {
        for (name, _) in &files {
            let target = path.join(name);
            if target.exists() {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }
        }
    }

    for (name, content) in &files {
        let target = path.join(name);
        fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }

    tracing::info!("Created sample page in {}", path.display());
    println!();
    println!("  scrollwork check {}", path.join("page.toml").display());
    println!(
        "  scrollwork simulate {} --script {}",
        path.join("page.toml").display(),
        path.join("script.toml").display()
    );
    println!();

    Ok(())
}

pub const SAMPLE_PAGE: &str = r#"# Scrollwork page descriptor
#
# Nodes are named rectangles in document space: rect = [x, y, width, height].
# Sections own the animations registered for them and can be torn down as a unit.

[viewport]
width = 1280
height = 800

[[nodes]]
name = "hero"
rect = [0, 0, 1280, 800]

[[nodes]]
name = "hero-heading"
parent = "hero"
rect = [160, 240, 960, 120]

[[nodes]]
name = "hero-tagline"
parent = "hero"
rect = [160, 380, 960, 60]

[[nodes]]
name = "hero-card"
parent = "hero"
rect = [440, 480, 400, 240]

[[nodes]]
name = "about"
rect = [0, 1000, 1280, 600]

[[nodes]]
name = "about-title"
parent = "about"
rect = [80, 1040, 600, 80]

[[nodes]]
name = "about-text"
parent = "about"
rect = [80, 1140, 600, 200]

[[nodes]]
name = "skills"
rect = [0, 1700, 1280, 500]

[[nodes]]
name = "skill-bar"
parent = "skills"
rect = [80, 1800, 800, 24]

# Hero: plays on load, card follows the pointer
[[sections]]
name = "hero"

[[sections.timelines]]
targets = ["hero-heading", "hero-tagline"]
preset = "fade-up"
duration_ms = 1000
easing = "power3.out"
stagger_ms = 200

[[sections.parallax]]
region = "hero"
targets = ["hero-card"]
tilt = 20
smoothing_ms = 500

[[sections.flags]]
name = "scrolled"
threshold_px = 20

# About: revealed when the section top reaches 80% of the viewport
[[sections]]
name = "about"

[[sections.timelines]]
targets = ["about-title", "about-text"]
preset = "fade-up"
duration_ms = 800
easing = "power3.out"
stagger_ms = 100
trigger = { node = "about", start = "top 80%", actions = "play none none reverse" }

# Skills: bar grows once, never reverses
[[sections]]
name = "skills"

[[sections.timelines]]
targets = ["skill-bar"]
preset = "grow-width"
to = { width_pct = 85 }
duration_ms = 1500
easing = "power2.out"
trigger = { node = "skills", start = "top 70%", reversible = false }
"#;

pub const SAMPLE_SCRIPT: &str = r#"# Scrollwork input script
frame_ms = 16

steps = [
    { advance = 1500 },
    { pointer = [640, 400] },
    { pointer = [1000, 200] },
    { advance = 600 },
    { scroll = 600 },
    { advance = 1000 },
    { scroll = 1400 },
    { advance = 1600 },
    { scroll = 0 },
    { advance = 1000 },
    { theme = "toggle" },
]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_page, load_script};
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scrollwork-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_create_page_writes_loadable_files() {
        let dir = scratch_dir("init");
        create_page(&dir, false).unwrap();

        let page = load_page(&dir.join("page.toml")).unwrap();
        assert_eq!(page.sections.len(), 3);
        let script = load_script(&dir.join("script.toml")).unwrap();
        assert_eq!(script.frame_ms, 16.0);
        assert!(!script.steps.is_empty());

        assert!(create_page(&dir, false).is_err());
        create_page(&dir, true).unwrap();

        fs::remove_dir_all(&dir).unwrap();
    }
}

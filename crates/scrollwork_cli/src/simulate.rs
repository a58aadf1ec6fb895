//! Headless page simulation
//!
//! Mounts a page descriptor on a fresh scheduler, replays scripted input and
//! reports the resulting node styles.

use anyhow::{bail, Context, Result};
use scrollwork_animation::{AnimationScheduler, MountedPage, PageDescriptor};
use scrollwork_theme::{ColorScheme, ThemeState};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Step, MIN_FRAME_MS};

pub struct Simulation {
    scheduler: AnimationScheduler,
    page: MountedPage,
    theme: Arc<ThemeState>,
    frame_ms: f32,
}

impl Simulation {
    pub fn new(descriptor: &PageDescriptor, scheme: ColorScheme, frame_ms: f32) -> Result<Self> {
        if !(frame_ms.is_finite() && frame_ms >= MIN_FRAME_MS) {
            bail!("frame length must be at least {MIN_FRAME_MS} ms, got {frame_ms}");
        }
        let viewport = descriptor.viewport;
        let mut scheduler = AnimationScheduler::new(viewport.width, viewport.height);
        let page = descriptor
            .mount(&mut scheduler)
            .context("Failed to mount page")?;
        for name in &page.missing {
            tracing::warn!("page references unknown node {name:?}; skipped");
        }

        let theme = Arc::new(ThemeState::new(scheme));
        theme.subscribe(|scheme| tracing::info!("color scheme changed to {scheme}"));

        Ok(Self {
            scheduler,
            page,
            theme,
            frame_ms,
        })
    }

    pub fn run(&mut self, steps: &[Step]) -> Result<()> {
        for (index, step) in steps.iter().enumerate() {
            step.validate()
                .and_then(|()| self.apply(step))
                .with_context(|| format!("Script step {} ({step:?}) failed", index + 1))?;
        }
        Ok(())
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        let writes = match step {
            Step::Scroll(y) => self.scheduler.scroll_to(*y),
            Step::Advance(ms) => self.advance(*ms),
            Step::Pointer([x, y]) => self.scheduler.pointer_at(*x, *y),
            Step::Leave(name) => {
                let region = self
                    .page
                    .node(name)
                    .with_context(|| format!("unknown node {name:?}"))?;
                self.scheduler.pointer_leave(region)
            }
            Step::Exit(true) => self.scheduler.pointer_exit(),
            Step::Exit(false) => 0,
            Step::Press(true) => self.scheduler.pointer_down(),
            Step::Press(false) => self.scheduler.pointer_up(),
            Step::Viewport([width, height]) => {
                self.scheduler.set_viewport(*width, *height);
                0
            }
            Step::Theme(value) => {
                if value == "toggle" {
                    self.theme.toggle();
                } else {
                    self.theme.set_scheme(value.parse()?);
                }
                0
            }
            Step::Teardown(name) => {
                let section = self
                    .scheduler
                    .find_section(name)
                    .with_context(|| format!("section {name:?}"))?;
                self.scheduler.teardown(section);
                0
            }
        };
        tracing::debug!(?step, writes, "step applied");
        Ok(())
    }

    /// Advance in whole frames, with a shorter final frame if needed
    fn advance(&mut self, total_ms: f32) -> usize {
        let full_frames = (total_ms / self.frame_ms).floor() as u64;
        let rest = total_ms - full_frames as f32 * self.frame_ms;
        let mut writes = 0;
        for _ in 0..full_frames {
            writes += self.scheduler.advance(self.frame_ms);
        }
        if rest > 0.0 {
            writes += self.scheduler.advance(rest);
        }
        writes
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn page(&self) -> &MountedPage {
        &self.page
    }

    pub fn report(&self) -> Report {
        let nodes = self.scheduler.nodes();
        Report {
            scroll_y: self.scheduler.scroll_y(),
            theme: self.theme.scheme(),
            total_writes: nodes.total_writes(),
            nodes: self
                .page
                .nodes()
                .filter_map(|(name, id)| {
                    let style = nodes.style(id)?;
                    Some(NodeReport {
                        name: name.to_string(),
                        opacity: style.opacity,
                        translate_x: style.translate_x,
                        translate_y: style.translate_y,
                        translate_z: style.translate_z,
                        scale: style.scale,
                        rotate: style.rotate,
                        rotate_x: style.rotate_x,
                        rotate_y: style.rotate_y,
                        width_pct: style.width_pct,
                        background_y_pct: style.background_y_pct,
                        writes: nodes.write_count(id),
                    })
                })
                .collect(),
            sections: self
                .page
                .sections()
                .map(|(name, id)| SectionReport {
                    name: name.to_string(),
                    mounted: self.scheduler.is_mounted(id),
                    timelines: self.scheduler.timeline_count(id),
                    binders: self.scheduler.binder_count(id),
                    listeners: self.scheduler.listener_count(id),
                    active_tweens: self.scheduler.active_tween_count(id),
                })
                .collect(),
            flags: self
                .page
                .flags()
                .map(|(name, id)| FlagReport {
                    name: name.to_string(),
                    scrolled: self.scheduler.flag(id),
                })
                .collect(),
            missing: self.page.missing.clone(),
        }
    }
}

/// Final state after a simulation
#[derive(Debug, Serialize)]
pub struct Report {
    pub scroll_y: f32,
    pub theme: ColorScheme,
    pub total_writes: u64,
    pub nodes: Vec<NodeReport>,
    pub sections: Vec<SectionReport>,
    pub flags: Vec<FlagReport>,
    pub missing: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub opacity: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub translate_z: f32,
    pub scale: f32,
    pub rotate: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub width_pct: f32,
    pub background_y_pct: f32,
    pub writes: u64,
}

#[derive(Debug, Serialize)]
pub struct SectionReport {
    pub name: String,
    pub mounted: bool,
    pub timelines: usize,
    pub binders: usize,
    pub listeners: usize,
    pub active_tweens: usize,
}

#[derive(Debug, Serialize)]
pub struct FlagReport {
    pub name: String,
    /// `None` once the owning section is torn down
    pub scrolled: Option<bool>,
}

impl Report {
    pub fn print_table(&self) {
        println!(
            "scroll_y = {:.1}  theme = {}  style writes = {}",
            self.scroll_y, self.theme, self.total_writes
        );
        println!();
        println!(
            "{:<20} {:>7} {:>8} {:>8} {:>8} {:>6} {:>7} {:>7} {:>7} {:>7} {:>6}",
            "node", "opacity", "x", "y", "z", "scale", "rot", "rot_x", "rot_y", "width%", "writes"
        );
        for node in &self.nodes {
            println!(
                "{:<20} {:>7.3} {:>8.2} {:>8.2} {:>8.2} {:>6.3} {:>7.2} {:>7.2} {:>7.2} {:>7.1} {:>6}",
                node.name,
                node.opacity,
                node.translate_x,
                node.translate_y,
                node.translate_z,
                node.scale,
                node.rotate,
                node.rotate_x,
                node.rotate_y,
                node.width_pct,
                node.writes
            );
        }
        println!();
        println!(
            "{:<20} {:>8} {:>9} {:>7} {:>9} {:>7}",
            "section", "mounted", "timelines", "binders", "listeners", "active"
        );
        for section in &self.sections {
            println!(
                "{:<20} {:>8} {:>9} {:>7} {:>9} {:>7}",
                section.name,
                section.mounted,
                section.timelines,
                section.binders,
                section.listeners,
                section.active_tweens
            );
        }
        if !self.flags.is_empty() {
            println!();
            for flag in &self.flags {
                let value = flag
                    .scrolled
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "released".to_string());
                println!("flag {:<15} {}", flag.name, value);
            }
        }
        if !self.missing.is_empty() {
            println!();
            println!("missing nodes: {}", self.missing.join(", "));
        }
    }
}

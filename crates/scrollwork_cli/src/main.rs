//! Scrollwork CLI
//!
//! Validate page animation descriptors and replay scripted scroll and
//! pointer input against them without a browser.

mod config;
mod project;
mod simulate;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use scrollwork_animation::AnimationScheduler;
use scrollwork_theme::ColorScheme;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::simulate::Simulation;

#[derive(Parser)]
#[command(name = "scrollwork")]
#[command(author, version, about = "Scroll-linked page animation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and mount a page descriptor, reporting what registered
    Check {
        /// Path to page.toml
        page: PathBuf,

        /// Fail when the page references nodes that do not exist
        #[arg(long)]
        strict: bool,
    },
    /// Replay a script of scroll, pointer and time steps against a page
    Simulate {
        /// Path to page.toml
        page: PathBuf,

        /// Path to script.toml; without it the page is only mounted
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,

        /// Frame length in milliseconds (overrides the script)
        #[arg(long)]
        frame_ms: Option<f32>,

        /// Initial color scheme
        #[arg(long, default_value = "light")]
        theme: ColorScheme,
    },
    /// Write a sample page and script to get started
    Init {
        /// Directory to create the files in
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { page, strict } => cmd_check(page, strict),
        Commands::Simulate {
            page,
            script,
            json,
            frame_ms,
            theme,
        } => cmd_simulate(page, script, json, frame_ms, theme),
        Commands::Init { path, force } => project::create_page(&path, force),
    }
}

fn cmd_check(page_path: PathBuf, strict: bool) -> Result<()> {
    let descriptor = config::load_page(&page_path)?;
    let viewport = descriptor.viewport;
    let mut scheduler = AnimationScheduler::new(viewport.width, viewport.height);
    let page = descriptor.mount(&mut scheduler)?;

    println!("{}", page_path.display());
    println!("  nodes:     {}", scheduler.nodes().len());
    println!("  sections:  {}", page.sections().count());
    println!("  timelines: {}", page.timelines);
    println!("  binders:   {}", page.binders);
    println!("  listeners: {}", scheduler.total_listener_count());
    for (name, section) in page.sections() {
        println!(
            "    {:<16} {} timelines, {} binders, {} listeners",
            name,
            scheduler.timeline_count(section),
            scheduler.binder_count(section),
            scheduler.listener_count(section)
        );
    }

    if !page.missing.is_empty() {
        for name in &page.missing {
            tracing::warn!("unknown node {name:?}");
        }
        if strict {
            bail!(
                "{} references {} unknown node(s)",
                page_path.display(),
                page.missing.len()
            );
        }
    }
    Ok(())
}

fn cmd_simulate(
    page_path: PathBuf,
    script_path: Option<PathBuf>,
    json: bool,
    frame_ms: Option<f32>,
    theme: ColorScheme,
) -> Result<()> {
    let descriptor = config::load_page(&page_path)?;
    let script = match &script_path {
        Some(path) => config::load_script(path)?,
        None => config::Script::default(),
    };
    let frame_ms = frame_ms.unwrap_or(script.frame_ms);

    tracing::info!(
        "Simulating {} ({} steps, {frame_ms} ms frames)",
        page_path.display(),
        script.steps.len()
    );

    let mut simulation = Simulation::new(&descriptor, theme, frame_ms)?;
    simulation.run(&script.steps)?;

    let report = simulation.report();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_table();
    }
    Ok(())
}

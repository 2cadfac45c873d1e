use std::{path::PathBuf, rc::Rc, time::Duration};

use clap::{Parser, Subcommand};
use portfolio_core::{
    host::ElementRect, render_document, reveal_manifest, AssetStore, PageModel, PortfolioError,
    SimulatedHost, SiteConfig, SiteContent,
};
use tracing_subscriber::EnvFilter;

fn main() -> portfolio_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            content,
            config,
            out,
            assets,
        } => run_build(content, config, &out, assets),
        Commands::Check { content, assets } => run_check(content, assets),
        Commands::Preview {
            content,
            config,
            seconds,
            scroll,
            viewport,
            trace,
        } => run_preview(content, config, seconds, &scroll, viewport, trace),
    }
}

fn load_content(path: Option<PathBuf>) -> portfolio_core::Result<SiteContent> {
    match path {
        Some(path) => SiteContent::load(path),
        None => SiteContent::builtin(),
    }
}

fn load_config(path: Option<PathBuf>) -> portfolio_core::Result<SiteConfig> {
    match path {
        Some(path) => SiteConfig::load(path),
        None => Ok(SiteConfig::default()),
    }
}

fn check_assets(content: &SiteContent, assets: Option<PathBuf>) -> portfolio_core::Result<()> {
    if let Some(dir) = assets {
        let store = AssetStore::from_dir(&dir)?;
        for missing in store.missing(content) {
            tracing::warn!(asset = %missing, "asset not found");
        }
        store.resolve_content_assets(content)?;
    }
    Ok(())
}

fn run_build(
    content: Option<PathBuf>,
    config: Option<PathBuf>,
    out: &PathBuf,
    assets: Option<PathBuf>,
) -> portfolio_core::Result<()> {
    tracing::info!(?content, ?config, ?out, "building static page");

    let content = load_content(content)?;
    check_assets(&content, assets)?;
    let model = PageModel::new(content, load_config(config)?);

    std::fs::create_dir_all(out)?;
    std::fs::write(out.join("index.html"), render_document(&model))?;
    std::fs::write(out.join("reveal-manifest.json"), reveal_manifest(&model)?)?;

    tracing::info!(
        reveal_groups = model.reveal_groups().len(),
        "wrote index.html and reveal-manifest.json"
    );
    Ok(())
}

fn run_check(content: Option<PathBuf>, assets: Option<PathBuf>) -> portfolio_core::Result<()> {
    let content = load_content(content)?;
    check_assets(&content, assets)?;
    tracing::info!(
        testimonials = content.reviews.testimonials.len(),
        assets = content.asset_refs().len(),
        "content is valid"
    );
    Ok(())
}

fn run_preview(
    content: Option<PathBuf>,
    config: Option<PathBuf>,
    seconds: f32,
    scroll: &[f32],
    viewport: f32,
    trace: Option<PathBuf>,
) -> portfolio_core::Result<()> {
    let model = PageModel::new(load_content(content)?, load_config(config)?);
    let host = Rc::new(SimulatedHost::new(viewport));

    // Stack reveal containers one screen apart below the hero.
    for (index, group) in model.reveal_groups().iter().enumerate() {
        host.set_layout(
            group.container.clone(),
            ElementRect {
                top: viewport * (index as f32 + 1.0),
                height: viewport * 0.6,
            },
        );
    }

    let page = model.mount(host.clone())?;

    let total = Duration::try_from_secs_f32(seconds).map_err(|_| {
        PortfolioError::InvalidInput("--seconds must be a finite, non-negative number")
    })?;
    let step = total / (scroll.len() as u32 + 1);
    host.advance(step);
    for &y in scroll {
        host.scroll_to(y);
        host.advance(step);
    }

    let started = host.take_started();
    for (at, animation) in &started {
        tracing::info!(
            at = ?at,
            source = %animation.source,
            target = %animation.target,
            offset = ?animation.offset,
            direction = ?animation.direction,
            "animation"
        );
    }

    if let Some(path) = trace {
        let entries: Vec<_> = started
            .iter()
            .map(|(at, animation)| {
                serde_json::json!({ "at": at.as_secs_f64(), "animation": animation })
            })
            .collect();
        std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
        tracing::info!(path = %path.display(), "wrote animation trace");
    }

    tracing::info!(
        animations = started.len(),
        review = page.reviews().cursor(),
        background_frames = page.background().map_or(0, |driver| driver.frames_drawn()),
        "preview finished"
    );

    page.unmount();
    tracing::debug!(
        timers = host.active_timers(),
        observers = host.active_observers(),
        "host registrations after unmount"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Portfolio site builder and behavior preview",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the static page and its behavior manifest.
    Build {
        /// Content file; the bundled content is used when omitted.
        #[arg(long)]
        content: Option<PathBuf>,
        /// Site configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory for `index.html` and `reveal-manifest.json`.
        #[arg(long)]
        out: PathBuf,
        /// Public asset directory to verify image references against.
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Validate content without writing anything.
    Check {
        #[arg(long)]
        content: Option<PathBuf>,
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Mount the page on a simulated host and log every animation it starts.
    Preview {
        #[arg(long)]
        content: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Virtual time to run for, split evenly around the scroll steps.
        #[arg(long, default_value_t = 10.0)]
        seconds: f32,
        /// Scroll positions to visit in order, e.g. `900,1800,0`.
        #[arg(long, value_delimiter = ',')]
        scroll: Vec<f32>,
        /// Viewport height in pixels.
        #[arg(long, default_value_t = 900.0)]
        viewport: f32,
        /// Also write every started animation as JSON to this file.
        #[arg(long)]
        trace: Option<PathBuf>,
    },
}

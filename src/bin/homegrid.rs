use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use homegrid::common::config::{Config, config_file};
use homegrid::common::log;
use homegrid::layout_engine::gesture::classify_pointer_down;
use homegrid::layout_engine::{
    CommitOutcome, GridSpec, LoadReport, PlacementEngine, PlacementError, PointerEvent,
    PointerResponse, WidgetFrame,
};
use homegrid::model::{GestureKind, PixelPoint, WidgetId};
use homegrid::sys::canvas::FixedCanvas;
use homegrid::sys::host::{ProviderEntry, ProviderRegistry};
use homegrid::sys::store::PrefsLayoutStore;
use serde::Serialize;
use tracing::{debug, warn};

type Engine = PlacementEngine<PrefsLayoutStore, ProviderRegistry>;

#[derive(Parser)]
#[command(name = "homegrid")]
#[command(about = "Lay out home-screen widgets on a fixed grid")]
struct Cli {
    /// Config file to use instead of ~/.homegrid.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding layout.ron and providers.ron
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Lay out for the rotated (landscape) canvas
    #[arg(long, global = true)]
    landscape: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List placed widgets
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Bind a new widget to a provider and place it
    Add {
        #[arg(long)]
        provider: String,
        /// Minimum content width in dp
        #[arg(long, default_value_t = 0.0)]
        min_width: f64,
        /// Minimum content height in dp
        #[arg(long, default_value_t = 0.0)]
        min_height: f64,
    },
    /// Delete a widget and its provider binding
    Remove { id: WidgetId },
    /// Drop only the provider binding, as if its app was uninstalled
    Uninstall { id: WidgetId },
    /// Drag a widget by a pixel offset
    Drag {
        id: WidgetId,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        dx: f64,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        dy: f64,
    },
    /// Resize a widget from its bottom-right handle by a pixel offset
    Resize {
        id: WidgetId,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        dx: f64,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        dy: f64,
    },
    /// Print the grid geometry for the configured canvas
    Grid {
        #[arg(long)]
        json: bool,
    },
    /// Check the configuration and the stored layout
    Validate,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    grid: &'a GridSpec,
    edit_mode: bool,
    widgets: Vec<WidgetFrame>,
    load: &'a LoadReport,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = Parser::parse();
    log::init_logging();

    let config_path = cli.config.clone().unwrap_or_else(config_file);
    let mut config = Config::read_or_default(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }

    let issues = config.validate();
    let fixes = config.auto_fix_values();
    if fixes > 0 {
        warn!(fixes, "repaired invalid configuration values");
    }

    let canvas = if cli.landscape { config.canvas().rotated() } else { config.canvas() };
    let (mut engine, report) = open_engine(&config, &canvas)?;
    engine.set_edit_mode(config.interaction.start_in_edit_mode);

    match cli.command {
        Commands::Show { json } => show(&engine, &report, json)?,
        Commands::Add { provider, min_width, min_height } => {
            let id = engine.host_mut().allocate(ProviderEntry {
                provider,
                min_width_dp: min_width,
                min_height_dp: min_height,
            })?;
            match engine.add_widget(id) {
                Ok(outcome) => println!("{}", describe(&outcome)),
                Err(err) => {
                    engine.host_mut().unregister(id)?;
                    return Err(err.into());
                }
            }
        }
        Commands::Remove { id } => {
            engine.remove_widget(id)?;
            engine.host_mut().unregister(id)?;
            println!("removed widget {id}");
        }
        Commands::Uninstall { id } => {
            if !engine.host_mut().unregister(id)? {
                bail!("widget {id} has no provider binding");
            }
            println!("unbound widget {id}; its layout entry is dropped after the next change");
        }
        Commands::Drag { id, dx, dy } => {
            let outcome = simulate(&mut engine, id, GestureKind::Dragging, dx, dy)?;
            println!("{}", describe(&outcome));
        }
        Commands::Resize { id, dx, dy } => {
            let outcome = simulate(&mut engine, id, GestureKind::Resizing, dx, dy)?;
            println!("{}", describe(&outcome));
        }
        Commands::Grid { json } => {
            let grid = engine.grid();
            if json {
                println!("{}", serde_json::to_string_pretty(grid)?);
            } else {
                println!(
                    "{}x{} cells of {:.1}x{:.1} px at ({:.1}, {:.1}), canvas {}x{}",
                    grid.columns,
                    grid.rows,
                    grid.cell.width,
                    grid.cell.height,
                    grid.origin.x,
                    grid.origin.y,
                    grid.canvas.width,
                    grid.canvas.height
                );
            }
        }
        Commands::Validate => validate(&engine, &report, issues)?,
    }

    Ok(())
}

fn open_engine(config: &Config, canvas: &FixedCanvas) -> anyhow::Result<(Engine, LoadReport)> {
    let store = PrefsLayoutStore::open(config.layout_file())?;
    let registry = ProviderRegistry::open(config.providers_file(), config.display.density)?;
    let mut engine = PlacementEngine::new(store, registry, config.engine_settings(), canvas);
    let report = engine.load()?;
    debug!(?report, "loaded layout");
    Ok((engine, report))
}

fn show(engine: &Engine, report: &LoadReport, json: bool) -> anyhow::Result<()> {
    let frames = engine.frames();
    if json {
        let output = ShowOutput {
            grid: engine.grid(),
            edit_mode: engine.is_edit_mode(),
            widgets: frames,
            load: report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if frames.is_empty() {
        println!("no widgets");
    }
    for frame in frames {
        let provider = engine.host().get(frame.id).map_or("?", |entry| entry.provider.as_str());
        println!(
            "{:>4}  {:<14} {:>7.1},{:<7.1} {:>6.1}x{:<6.1}  {}",
            frame.id.get(),
            frame.cell.to_string(),
            frame.rect.x,
            frame.rect.y,
            frame.rect.width,
            frame.rect.height,
            provider
        );
    }
    for id in &report.dropped {
        println!("dropped {id}: provider unavailable");
    }
    for id in &report.skipped {
        println!("skipped {id}: no free row");
    }
    Ok(())
}

/// Runs a full down/move/up sequence in edit mode.
fn simulate(
    engine: &mut Engine,
    id: WidgetId,
    kind: GestureKind,
    dx: f64,
    dy: f64,
) -> anyhow::Result<CommitOutcome> {
    let rect = engine.pixel_rect(id).ok_or(PlacementError::UnknownWidget(id))?;
    let start = match kind {
        GestureKind::Resizing => PixelPoint::new(rect.right() - 1.0, rect.bottom() - 1.0),
        _ => PixelPoint::new(rect.x + 1.0, rect.y + 1.0),
    };
    let handle = engine.settings().resize_handle_size;
    if classify_pointer_down(&rect, start, handle) != kind {
        bail!("cannot start {kind} on widget {id} with a {handle}px resize handle");
    }

    engine.set_edit_mode(true);
    engine.handle_pointer(id, PointerEvent::down(start))?;
    engine.handle_pointer(id, PointerEvent::moved(PixelPoint::new(start.x + dx, start.y + dy)))?;
    match engine.handle_pointer(id, PointerEvent::Up)? {
        PointerResponse::Finished(outcome) => Ok(outcome),
        PointerResponse::Forward | PointerResponse::Handled => {
            bail!("gesture on widget {id} did not finish")
        }
    }
}

fn describe(outcome: &CommitOutcome) -> String {
    match outcome {
        CommitOutcome::Committed { id, rect } => format!("widget {id} placed at {rect}"),
        CommitOutcome::Unsaved { id, rect, error } => {
            format!("widget {id} placed at {rect} but not saved: {error}")
        }
        CommitOutcome::Reverted { id, .. } => format!("widget {id} overlaps another widget; reverted"),
    }
}

/// Reports config issues and anything the load had to repair.
fn validate(engine: &Engine, report: &LoadReport, mut issues: Vec<String>) -> anyhow::Result<()> {
    issues.extend(engine.validate());
    issues.extend(report.clamped.iter().map(|id| format!("widget {id} had an out-of-range placement")));
    issues.extend(report.relocated.iter().map(|id| format!("widget {id} overlapped and was moved")));
    issues.extend(report.skipped.iter().map(|id| format!("widget {id} has no free row")));
    issues.extend(report.dropped.iter().map(|id| format!("widget {id} has no content provider")));

    if issues.is_empty() {
        println!("ok: {} widgets", report.loaded.len());
        return Ok(());
    }
    for issue in &issues {
        println!("{issue}");
    }
    bail!("{} issue(s) found", issues.len())
}

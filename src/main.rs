use anyhow::{anyhow, Context, Result};
use body_chart::chart::{BodyChart, ChartId, ChartService, JsonDirStore};
use body_chart::diagram::model::{Color, DrawMode, Point};
use body_chart::diagram::{EditingSession, ViewId, ViewRegistry};
use body_chart::settings::ChartSettings;
use body_chart::{logging, settings_store};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "body-chart")]
#[command(about = "Body diagram charts: list, inspect, export and delete saved charts")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    /// Chart folder, overriding the settings file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved charts, most recent first
    List {
        /// Only charts linked to this patient
        #[arg(long)]
        patient: Option<String>,
    },
    /// Show one chart's metadata and stored views
    Show { id: String },
    /// Write one PNG per stored view into a folder
    Export { id: String, out_dir: PathBuf },
    /// Delete a chart
    Delete { id: String },
    /// Draw a sample chart on the anterior view and save it
    Demo {
        #[arg(long, default_value = "Demo chart")]
        title: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => settings_store::default_settings_path()?,
    };
    let mut settings = settings_store::load_from_path(&settings_path)?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = Some(dir.clone());
    }
    let _log_guard = logging::init(
        cli.debug || settings.debug_logging,
        settings.log_file.clone(),
    );

    let data_dir = settings
        .resolved_data_dir()
        .ok_or_else(|| anyhow!("no chart folder configured and no platform data directory"))?;
    tracing::debug!(data_dir = %data_dir.display(), "using chart folder");
    let service = ChartService::new(Arc::new(JsonDirStore::new(data_dir)));

    match cli.command {
        Commands::List { patient } => {
            let charts = match &patient {
                Some(patient_id) => service.list_for_patient(patient_id)?,
                None => service.list()?,
            };
            if charts.is_empty() {
                println!("No charts found.");
            }
            for chart in charts {
                println!("{}", summary_line(&chart));
            }
        }
        Commands::Show { id } => {
            let chart = load_existing(&service, &id)?;
            println!("{}", summary_line(&chart));
            if let Some(updated) = chart.updated_at {
                println!("Updated: {}", updated.to_rfc3339());
            }
            if !chart.notes.is_empty() {
                println!("Notes: {}", chart.notes);
            }
            for view in chart.views.keys() {
                println!("  - {} ({})", view.label(), view);
            }
        }
        Commands::Export { id, out_dir } => {
            let chart = load_existing(&service, &id)?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("create export folder {}", out_dir.display()))?;
            for (view, snapshot) in &chart.views {
                let bytes = match snapshot.png_bytes() {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        eprintln!("Skipping {view}: {err}");
                        continue;
                    }
                };
                let path = out_dir.join(format!("{view}.png"));
                std::fs::write(&path, bytes)
                    .with_context(|| format!("write {}", path.display()))?;
                println!("Wrote {}", path.display());
            }
        }
        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            if service.delete(&id)? {
                println!("Deleted {id}");
            } else {
                println!("No chart with id {id}");
            }
        }
        Commands::Demo { title } => {
            let mut chart = BodyChart::new(title);
            let id = save_demo(&service, &settings, &mut chart)?;
            println!("Saved {id}");
        }
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<ChartId> {
    raw.parse()
        .with_context(|| format!("invalid chart id {raw:?}"))
}

fn load_existing(service: &ChartService, raw_id: &str) -> Result<BodyChart> {
    let id = parse_id(raw_id)?;
    service
        .load(&id)?
        .ok_or_else(|| anyhow!("no chart with id {id}"))
}

fn summary_line(chart: &BodyChart) -> String {
    let id = chart.id.map(|id| id.to_string()).unwrap_or_default();
    let date = chart
        .date
        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into());
    let views: Vec<&str> = chart.views.keys().map(|view| view.as_str()).collect();
    format!(
        "{id}  {date}  {}  patient: {}  views: [{}]",
        chart.title,
        chart.patient_id.as_deref().unwrap_or("-"),
        views.join(", ")
    )
}

fn save_demo(
    service: &ChartService,
    settings: &ChartSettings,
    chart: &mut BodyChart,
) -> Result<ChartId> {
    let registry = match &settings.asset_dir {
        Some(dir) => ViewRegistry::from_dir(dir)?,
        None => ViewRegistry::builtin(settings.canvas_width, settings.canvas_height),
    };
    let mut session = EditingSession::new(Arc::new(registry), settings.stroke_style())?;
    let (width, height) = session.surface_size();
    let (w, h) = (width as f32, height as f32);

    session.switch_view(ViewId::Anterior)?;
    session.begin_stroke(
        ViewId::Anterior,
        Point::new(w * 0.35, h * 0.30),
        DrawMode::FreehandPain,
        Color::RED,
        settings.default_width,
    )?;
    for step in 1..=8 {
        let t = step as f32 / 8.0;
        session.extend_stroke(Point::new(w * (0.35 + 0.3 * t), h * (0.30 + 0.05 * t)));
    }
    session.end_stroke()?;

    session.begin_stroke(
        ViewId::Anterior,
        Point::new(w * 0.5, h * 0.45),
        DrawMode::TriggerPoint,
        Color::BLUE,
        settings.default_width * 2.0,
    )?;
    session.end_stroke()?;

    Ok(service.save_session(chart, &session)?)
}

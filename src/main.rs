//! CLI entry point for the dengue dashboard.
//!
//! Locates the user, resolves their municipality and renders the last three
//! months of dengue surveillance data for it.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dengue_dashboard::analyzers::types::AggregateMode;
use dengue_dashboard::config::Config;
use dengue_dashboard::dashboard::{Dashboard, StderrAlert};
use dengue_dashboard::fetch::{BasicClient, WithHeader};
use dengue_dashboard::infra::{AwesomeCepClient, InfoDengueClient, IpLocateClient, NominatimClient};
use dengue_dashboard::output::{ColorScheme, print_json, print_text};
use dengue_dashboard::services::{CityIdentity, Coordinates, FixedLocation};
use dengue_dashboard::state::{DashboardState, PLACEHOLDER_CITY};
use std::ffi::OsStr;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "dengue_dashboard")]
#[command(about = "Dengue cases over the last 90 days for your city", long_about = None)]
struct Cli {
    /// JSON file with service endpoints and client settings
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate, resolve the city and render its dashboard
    Show {
        #[command(flatten)]
        position: PositionArgs,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Render the dashboard for a known municipality code
    City {
        /// Administrative (IBGE) municipality code, e.g. 3304557
        #[arg(short, long)]
        geocode: String,

        /// Name shown in the title
        #[arg(short, long, default_value = PLACEHOLDER_CITY)]
        name: String,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Resolve the current city and print it
    Locate {
        #[command(flatten)]
        position: PositionArgs,
    },
}

#[derive(Args)]
struct PositionArgs {
    /// Latitude to use instead of IP-based location
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude to use instead of IP-based location
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl PositionArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.lat?,
            longitude: self.lon?,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Args)]
struct RenderArgs {
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Take the summary from the newest week rather than the last record
    #[arg(long, default_value_t = false)]
    latest_by_week: bool,

    /// Derive chart colors from slice position instead of at random
    #[arg(long, default_value_t = false)]
    stable_colors: bool,

    /// Disable colored swatches in text output
    #[arg(long, default_value_t = false)]
    no_color: bool,
}

impl RenderArgs {
    fn mode(&self) -> AggregateMode {
        if self.latest_by_week {
            AggregateMode::LatestWeek
        } else {
            AggregateMode::LastRecord
        }
    }

    fn scheme(&self) -> ColorScheme {
        if self.stable_colors {
            ColorScheme::Stable
        } else {
            ColorScheme::Random
        }
    }

    fn render(&self, state: &DashboardState) -> Result<()> {
        match self.format {
            Format::Text => {
                let ansi = !self.no_color && std::io::stdout().is_terminal();
                print_text(state, self.scheme(), ansi);
            }
            Format::Json => print_json(state, self.scheme())?,
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/dengue_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("dengue_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Show { position, render } => {
            let mut dashboard = build_dashboard(&config, position.coordinates(), render.mode())?;
            let state = dashboard.run().await;
            render.render(&state)?;
        }
        Commands::City {
            geocode,
            name,
            render,
        } => {
            if geocode.trim().is_empty() {
                bail!("--geocode must not be empty");
            }
            let mut dashboard = build_dashboard(&config, None, render.mode())?;
            dashboard.apply_city(CityIdentity {
                name,
                code: geocode,
            });
            dashboard.settle().await;
            render.render(&dashboard.snapshot())?;
        }
        Commands::Locate { position } => {
            let dashboard = build_dashboard(&config, position.coordinates(), AggregateMode::default())?;
            if let Some(city) = dashboard.resolve_city().await {
                println!("{} ({})", city.name, city.code);
            }
        }
    }

    Ok(())
}

/// Defaults, then the optional file, then `DENGUE_*` variables.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_env()?;

    config.validate()?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

fn build_dashboard(
    config: &Config,
    coords: Option<Coordinates>,
    mode: AggregateMode,
) -> Result<Dashboard> {
    let geocoder = NominatimClient::new(
        WithHeader::user_agent(BasicClient::new(), &config.user_agent)?,
        config.nominatim_url.clone(),
    );
    let postal = AwesomeCepClient::new(BasicClient::new(), config.cep_url.clone());
    let surveillance = InfoDengueClient::new(BasicClient::new(), config.surveillance_url.clone());

    let dashboard = Dashboard::new(
        Arc::new(geocoder),
        Arc::new(postal),
        Arc::new(surveillance),
        Arc::new(StderrAlert),
    )
    .with_mode(mode);

    let dashboard = match coords {
        Some(coords) => {
            info!(?coords, "Using supplied coordinates");
            dashboard.with_location(Arc::new(FixedLocation(coords)))
        }
        None if !config.ip_locate_url.is_empty() => {
            let client = BasicClient::with_timeout(config.locate_timeout())?;
            dashboard.with_location(Arc::new(IpLocateClient::new(
                client,
                config.ip_locate_url.clone(),
            )))
        }
        None => dashboard,
    };

    Ok(dashboard)
}

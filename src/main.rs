use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use itertools::Itertools;
use tokio::signal;

use hue::colors::Rgb;
use hue::command::{self, Command};
use hue::error::HueResult;
use hue::store::StateStore;

use huetray::bridge::BridgeClient;
use huetray::config::{self, AppConfig, BridgeServer};
use huetray::controls::ControlView;
use huetray::error::{ApiError, ApiResult};
use huetray::session::{BridgeSession, LogSink};

/*
 * Formatter function to output in syslog format. This makes sense when running
 * as a service (where output might go to a log file, or the system journal)
 */
#[allow(clippy::match_same_arms)]
fn syslog_format(
    buf: &mut pretty_env_logger::env_logger::fmt::Formatter,
    record: &log::Record,
) -> std::io::Result<()> {
    writeln!(
        buf,
        "<{}>{}: {}",
        match record.level() {
            log::Level::Error => 3,
            log::Level::Warn => 4,
            log::Level::Info => 6,
            log::Level::Debug => 7,
            log::Level::Trace => 7,
        },
        record.target(),
        record.args()
    )
}

fn init_logging() -> ApiResult<()> {
    /* Try to provide reasonable default filters, when RUST_LOG is not specified */
    const DEFAULT_LOG_FILTERS: &[&str] = &["debug", "reqwest=info", "hyper_util=info"];

    let log_filters = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTERS.join(","));

    /* Detect if we need syslog or human-readable formatting */
    if std::env::var("SYSTEMD_EXEC_PID").is_ok_and(|pid| pid == std::process::id().to_string()) {
        Ok(pretty_env_logger::env_logger::builder()
            .format(syslog_format)
            .parse_filters(&log_filters)
            .try_init()?)
    } else {
        Ok(pretty_env_logger::formatted_timed_builder()
            .parse_filters(&log_filters)
            .try_init()?)
    }
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: Utf8PathBuf,

    #[command(subcommand)]
    action: Action,
}

#[derive(Args, Debug)]
struct Target {
    /// Bridge name from the config (defaults to the first one)
    #[arg(short, long)]
    bridge: Option<String>,

    /// Resource id of the light, room, zone or scene
    id: String,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Show combined group state, lights and scenes
    Status {
        #[arg(short, long)]
        bridge: Option<String>,
    },
    /// Follow the event streams of all bridges
    Watch,
    /// Turn a light or group on (or off, with --off)
    Switch {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        off: bool,
    },
    /// Set brightness (0-100)
    Dim {
        #[command(flatten)]
        target: Target,
        brightness: f64,
    },
    /// Set color, as #rrggbb
    Color {
        #[command(flatten)]
        target: Target,
        color: String,
    },
    /// Set color temperature in mirek
    Mirek {
        #[command(flatten)]
        target: Target,
        mirek: u16,
    },
    /// Set one point of a gradient light, as #rrggbb
    Gradient {
        #[command(flatten)]
        target: Target,
        point: u32,
        color: String,
    },
    /// Recall a scene
    Scene {
        #[command(flatten)]
        target: Target,
    },
}

fn parse_color(color: &str) -> ApiResult<Rgb> {
    Rgb::from_hex(color).ok_or_else(|| ApiError::InvalidColor(color.to_string()))
}

fn select_bridge<'a>(
    config: &'a AppConfig,
    name: Option<&str>,
) -> ApiResult<(&'a str, &'a BridgeServer)> {
    match name {
        Some(name) => config
            .bridges
            .get_key_value(name)
            .map(|(key, server)| (key.as_str(), server))
            .ok_or_else(|| ApiError::UnknownBridge(name.to_string())),
        None => config
            .bridges
            .iter()
            .next()
            .map(|(key, server)| (key.as_str(), server))
            .ok_or_else(|| ApiError::service_error("No bridges configured")),
    }
}

fn connect(config: &AppConfig, name: Option<&str>) -> ApiResult<BridgeClient> {
    let (key, server) = select_bridge(config, name)?;
    BridgeClient::new(server.display_name(key), server)
}

fn print_status(store: &StateStore) {
    let groups = store.bridge_home().into_iter().chain(store.rooms_and_zones());

    for group in groups {
        let Some(state) = store.combined_group_state(&group.id) else {
            continue;
        };
        let name = if group.name.is_empty() {
            "All lights"
        } else {
            group.name.as_str()
        };
        println!("{name:<28} {}", ControlView::render(&state, None).summary());

        for light in store.lights_in_group(&group.id) {
            println!(
                "  {:<26} {}",
                light.name,
                ControlView::render(light, None).summary()
            );
        }

        let scenes = store.scenes_for_group(&group.id);
        if !scenes.is_empty() {
            println!("  scenes: {}", scenes.iter().map(|scn| &scn.name).join(", "));
        }
    }
}

async fn status(config: &AppConfig, bridge: Option<&str>) -> ApiResult<()> {
    let client = connect(config, bridge)?;
    let store = StateStore::from_snapshot(&client.get_resources().await?);
    print_status(&store);
    Ok(())
}

async fn watch(config: &AppConfig) -> ApiResult<()> {
    if !config.has_bridges() {
        log::warn!("{}", "-".repeat(80));
        log::warn!("No bridges configured in config!");
        log::warn!(" ** Please configure at least one bridge to use huetray **");
        log::warn!("{}", "-".repeat(80));
        return Ok(());
    }

    let mut sessions = vec![];
    for (key, server) in &config.bridges {
        let name = server.display_name(key);
        let client = BridgeClient::new(name, server)?;
        sessions.push(BridgeSession::new(client, LogSink::new(name)).with_auto_bind(true));
    }

    /* each session reports its own failure; the others keep running */
    tokio::select! {
        _ = join_all(sessions.iter_mut().map(BridgeSession::run_logged)) => {
            log::error!("All bridge sessions have stopped");
        }
        res = signal::ctrl_c() => {
            res?;
            log::warn!("Ctrl-C pressed, exiting..");
            let _ = std::io::stderr().flush();
        }
    }

    Ok(())
}

async fn send(
    config: &AppConfig,
    target: &Target,
    build: impl FnOnce(&StateStore) -> HueResult<Vec<Command>>,
) -> ApiResult<()> {
    let client = connect(config, target.bridge.as_deref())?;
    let store = StateStore::from_snapshot(&client.get_resources().await?);

    let cmds = build(&store)?;
    let pacing = Duration::from_millis(config.huetray.command_pacing_ms);
    client.put_all(&cmds, pacing).await
}

async fn run() -> ApiResult<()> {
    init_logging()?;

    let cli = Cli::parse();

    let config = config::parse(&cli.config)?;
    log::debug!("Configuration loaded successfully");

    match cli.action {
        Action::Status { bridge } => status(&config, bridge.as_deref()).await,
        Action::Watch => watch(&config).await,
        Action::Switch { target, off } => {
            send(&config, &target, |store| command::switch(store, &target.id, !off)).await
        }
        Action::Dim { target, brightness } => {
            send(&config, &target, |store| command::dim(store, &target.id, brightness)).await
        }
        Action::Color { target, color } => {
            let color = parse_color(&color)?;
            send(&config, &target, |store| command::color(store, &target.id, color)).await
        }
        Action::Mirek { target, mirek } => {
            send(&config, &target, |store| command::mirek(store, &target.id, mirek)).await
        }
        Action::Gradient {
            target,
            point,
            color,
        } => {
            let color = parse_color(&color)?;
            send(&config, &target, |store| {
                Ok(vec![command::gradient_point(store, &target.id, point, color)?])
            })
            .await
        }
        Action::Scene { target } => {
            send(&config, &target, |store| {
                Ok(vec![command::recall_scene(store, &target.id)?])
            })
            .await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        log::error!("huetray error: {err}");
        log::error!("Fatal error encountered, cannot continue.");
    }
}

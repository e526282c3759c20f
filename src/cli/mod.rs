pub mod input;
pub mod render;
pub mod simulate;

use std::{io::IsTerminal, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use input::{parse_input, Input, HELP};
use render::Renderer;
use simulate::{process_simulate_command, SimulateCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, level_filters::LevelFilter, warn};

use crate::{
    config::DashboardConfig,
    dashboard::{
        command::DashboardCommand, shutdown::detect_shutdown, Dashboard, DashboardHandle,
    },
    metrics::sampler::RandomWalkSampler,
    session::format::format_hms,
    utils::{
        clock::DefaultClock, dir::application_default_path, logging::enable_logging,
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Workpulse", version, long_about = None)]
#[command(about = "Work session timer with a simulated system monitor", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Config file in TOML format")]
    config: Option<PathBuf>,
    #[arg(long = "log-console", global = true, help = "Also write logs to stderr")]
    log_console: bool,
    #[arg(long = "log-filter", global = true, help = "Log level. Falls back to RUST_LOG, then info")]
    log: Option<LevelFilter>,
    #[arg(long, global = true, help = "Directory for logs. By default $XDG_STATE_HOME/workpulse or $HOME/.local/state/workpulse")]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the dashboard. Commands are read from stdin")]
    Run {
        #[arg(short, long, help = "Project used when `start` is typed without one")]
        project: Option<String>,
        #[arg(long, help = "Print snapshots as JSON lines")]
        json: bool,
        #[arg(long, help = "Print every change instead of only command results")]
        follow: bool,
        #[arg(long, help = "Start a session right away")]
        start: bool,
    },
    #[command(about = "Format seconds as HH:MM:SS")]
    Format { seconds: u64 },
    #[command(about = "Run the metric sampler offline and print the resulting history")]
    Simulate {
        #[command(flatten)]
        command: SimulateCommand,
    },
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    match args.commands {
        Commands::Format { seconds } => {
            println!("{}", format_hms(seconds));
            Ok(())
        }
        Commands::Simulate { command } => process_simulate_command(command, &config),
        Commands::Run {
            project,
            json,
            follow,
            start,
        } => {
            let app_dir = args.dir.map_or_else(application_default_path, Ok)?;
            enable_logging(&app_dir.join("logs"), args.log, args.log_console)?;
            if let Some(project) = project {
                config.default_project = project.into();
            }
            let renderer = Renderer {
                json,
                colour: !json && std::io::stdout().is_terminal(),
            };

            let runtime = single_thread_runtime()?;
            let result = runtime.block_on(run_dashboard(config, renderer, follow, start));
            // Stdin is read on a blocking thread that can't be interrupted, don't wait on it.
            runtime.shutdown_timeout(Duration::from_millis(100));
            result
        }
    }
}

async fn run_dashboard(
    config: DashboardConfig,
    renderer: Renderer,
    follow: bool,
    start: bool,
) -> Result<()> {
    let handle = Dashboard::spawn(&config, RandomWalkSampler::from_entropy(), DefaultClock)?;
    let token = handle.shutdown_token();
    let signals = tokio::spawn(detect_shutdown(token.clone()));

    if !renderer.json {
        println!("{HELP}");
    }
    if start {
        let input = Input::Command(DashboardCommand::Start { project: None });
        execute(&handle, &config.projects, renderer, input).await?;
    } else {
        println!("{}", renderer.render(&handle.snapshot()));
    }

    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            changed = snapshots.changed(), if follow => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!("{}", renderer.render(&snapshot));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Stdin closed");
                    break;
                };
                match parse_input(&line) {
                    Ok(Some(Input::Quit)) => break,
                    Ok(Some(input)) => execute(&handle, &config.projects, renderer, input).await?,
                    Ok(None) => (),
                    Err(e) => eprintln!("{}", renderer.render_error(&e)),
                }
            }
        }
    }

    handle.shutdown().await?;
    if let Err(e) = signals.await {
        warn!("Signal watcher failed {e:?}");
    }
    Ok(())
}

async fn execute(
    handle: &DashboardHandle,
    projects: &[Arc<str>],
    renderer: Renderer,
    input: Input,
) -> Result<()> {
    match input {
        Input::Command(command) => match handle.send(command).await? {
            Ok(snapshot) => println!("{}", renderer.render(&snapshot)),
            Err(e) => eprintln!("{}", renderer.render_error(&e)),
        },
        Input::Status => println!("{}", renderer.render(&handle.snapshot())),
        Input::Projects => println!("{}", renderer.render_projects(projects, &handle.snapshot())),
        Input::Help => println!("{HELP}"),
        Input::Quit => (),
    }
    Ok(())
}

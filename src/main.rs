use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use cctv_console::{
    render, Backend, BackendClient, Config, Console, Submission, SyncEvent, VideoUpload, View,
};

fn cli() -> Command {
    Command::new("cctv-console")
        .version("0.1.0")
        .about("Operator console for the AI anomaly-detection CCTV backend")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to a TOML configuration file")
                .global(true)
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Backend base URL (overrides configuration)")
                .global(true)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(Command::new("status").about("Show the current system status"))
        .subcommand(Command::new("results").about("List processed clips and logs"))
        .subcommand(
            Command::new("fetch")
                .about("Download a processed clip or log")
                .arg(Arg::new("file").value_name("FILE").required(true))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Where to save the artifact (defaults to its name)")
                )
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a video for offline analysis")
                .arg(Arg::new("video").value_name("VIDEO").required(true))
        )
        .subcommand(
            Command::new("simulate")
                .about("Start a live simulation with SMS alerts")
                .arg(Arg::new("video").value_name("VIDEO").required(true))
                .arg(
                    Arg::new("phone")
                        .short('p')
                        .long("phone")
                        .value_name("NUMBER")
                        .help("Alert phone number with country code, e.g. +1234567890")
                )
                .arg(
                    Arg::new("follow")
                        .short('f')
                        .long("follow")
                        .help("Stay on the live view until Ctrl-C, then stop the simulation")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(Command::new("stop").about("Stop the live simulation"))
        .subcommand(Command::new("logs").about("Show the event log"))
        .subcommand(
            Command::new("chat")
                .about("Ask the assistant a question")
                .arg(
                    Arg::new("question")
                        .value_name("QUESTION")
                        .required(true)
                        .num_args(1..)
                )
        )
        .subcommand(
            Command::new("frame")
                .about("Save the current live-feed frame")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .default_value("frame.jpg")
                )
        )
        .subcommand(Command::new("watch").about("Stay in sync with the backend and print changes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    // Logging starts before the config is loaded; the configured level
    // replaces the default unless RUST_LOG or -v chose one.
    let verbose = matches.get_flag("verbose");
    let env_filter = EnvFilter::try_from_default_env().ok();
    let follow_config = !verbose && env_filter.is_none();
    let initial = if verbose {
        EnvFilter::new("debug")
    } else {
        env_filter.unwrap_or_else(|| EnvFilter::new(Config::default().console.log_directive()))
    };
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(verbose))
        .init();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.backend.base_url = base_url.clone();
    }

    if follow_config {
        if let Err(e) = filter_handle.reload(EnvFilter::new(config.console.log_directive())) {
            warn!("Could not apply log level {}: {}", config.console.log_level, e);
        }
    }

    config.validate().context("Invalid configuration")?;
    tracing::debug!("{}", config.summary());

    let client = Arc::new(BackendClient::new(&config.backend)?);
    let console = Console::new(client.clone(), &config);

    match matches.subcommand() {
        Some(("status", _)) => {
            match client.status().await? {
                Some(status) => println!("{}", render::status_line(&status)),
                None => println!("(backend reported no status)"),
            }
        }
        Some(("results", _)) => {
            let results = client.results().await?;
            println!("{}", render::results_panel(&results, |f| client.artifact_url(f)));
        }
        Some(("fetch", args)) => fetch_artifact(&client, args).await?,
        Some(("upload", args)) => {
            let video = load_video(args).await?;
            match console.upload(Some(video)).await {
                Submission::Sent(status) => println!("{}", render::status_line(&status)),
                Submission::Failed(status) => bail!("{}", status),
                _ => {}
            }
        }
        Some(("simulate", args)) => {
            let video = load_video(args).await?;
            let phone = args
                .get_one::<String>("phone")
                .cloned()
                .unwrap_or_else(|| config.console.default_phone_number.clone());

            match console.start_simulation(Some(video), &phone).await {
                Submission::Sent(_) => {
                    if args.get_flag("follow") {
                        watch(&console).await?;
                        if let Submission::Failed(_) = console.stop_realtime().await {
                            bail!("Could not stop the simulation");
                        }
                    } else {
                        let snapshot = console.state().snapshot().await;
                        println!("{}", render::realtime_view(&snapshot, &console.live_feed_url()));
                    }
                }
                Submission::Rejected(e) => bail!("{}", e),
                Submission::Failed(status) => bail!("{}", status),
                Submission::Ignored => {}
            }
        }
        Some(("stop", _)) => match console.stop_realtime().await {
            Submission::Sent(status) => println!("{}", render::status_line(&status)),
            _ => bail!("Could not stop the simulation"),
        },
        Some(("logs", _)) => {
            let (count, logs) = futures::try_join!(client.log_count(), client.all_logs())?;
            let logs = logs.unwrap_or_default();
            println!("{}", render::log_panel(&logs));
            println!("{} entries reported by the backend", count);
        }
        Some(("chat", args)) => {
            let question = args
                .get_many::<String>("question")
                .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();

            if console.ask(&question).await.is_some() {
                let snapshot = console.state().snapshot().await;
                println!("{}", render::chat_panel(&snapshot.transcript, snapshot.chat_loading));
            }
        }
        Some(("frame", args)) => {
            let output = args
                .get_one::<String>("output")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("frame.jpg"));
            let frame = client.video_frame(Utc::now().timestamp_millis()).await?;
            tokio::fs::write(&output, &frame).await?;
            info!("🖼️  Saved {} bytes to {}", frame.len(), output.display());
        }
        Some(("watch", _)) => watch(&console).await?,
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

async fn load_video(args: &ArgMatches) -> Result<VideoUpload> {
    let path = args
        .get_one::<String>("video")
        .map(PathBuf::from)
        .context("No video given")?;
    VideoUpload::from_path(&path)
        .await
        .with_context(|| format!("Failed to read video {}", path.display()))
}

async fn fetch_artifact(client: &BackendClient, args: &ArgMatches) -> Result<()> {
    let file = args.get_one::<String>("file").context("No file given")?;
    let output = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            Path::new(file)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("artifact"))
        });

    let bytes = client.result_artifact(file).await?;
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("💾 Saved {} ({} bytes) to {}", file, bytes.len(), output.display());
    Ok(())
}

async fn print_view(console: &Console) {
    let snapshot = console.state().snapshot().await;
    match snapshot.view {
        View::Main => println!("{}", render::main_view(&snapshot, |f| console.artifact_url(f))),
        View::Realtime => println!("{}", render::realtime_view(&snapshot, &console.live_feed_url())),
    }
}

/// Run the synchronizer until Ctrl-C, printing whatever changes
async fn watch(console: &Console) -> Result<()> {
    let mut events = console.hub().subscribe();
    let handle = console.mount().await;
    print_view(console).await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
            event = events.recv() => match event {
                Ok(SyncEvent::StatusChanged(change)) => {
                    if console.state().view().await == View::Realtime {
                        print_view(console).await;
                    } else {
                        println!("{}", render::status_line(&change.current));
                    }
                }
                Ok(SyncEvent::ResultsReplaced(results)) => {
                    println!("{}", render::results_panel(&results, |f| console.artifact_url(f)));
                }
                Ok(SyncEvent::LogsReplaced { entries, .. }) => {
                    println!("{}", render::log_panel(&entries));
                }
                Ok(SyncEvent::ViewChanged(_)) => print_view(console).await,
                Ok(SyncEvent::ChatAppended(message)) => println!("  › {}", message.text),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Skipped {} console updates", skipped);
                    print_view(console).await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.stop().await;
    Ok(())
}

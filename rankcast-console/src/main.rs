//! Rankcast operator console.
//!
//! Line-oriented control loop for the venue operator: publishes display
//! commands, watches status/heartbeat traffic and replays cached monitor
//! state after a switch. The replay waits for the display's `display_ready`
//! status and falls back to a fixed settle delay when it never arrives.

mod commander;
mod settings;
mod status;

use anyhow::{Context, Result};
use commander::{CommandSink, Commander};
use rankcast_core::config::{load_or_create_session, BrokerConfig};
use rankcast_core::identity::{ClientId, RuntimeIdentity};
use rankcast_core::liveness::{LinkStatus, CHECK_INTERVAL};
use rankcast_core::monitors::{ReplayStep, FULLSCREEN_DELAY, SETTLE_DELAY};
use rankcast_core::topics::TopicRegistry;
use rankcast_core::transport::{LinkEvent, LinkRole, MqttLink};
use settings::ConsoleSettings;
use status::StatusBoard;
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::interval;
use tracing::{error, info, warn};

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).unwrap_or_else(|_| default.to_string()).into()
}

const HELP: &str = "\
commands:
  open [monitor] [folder]   open the display window
  close                     close the display window
  switch <monitor>          move the window to another monitor
  fullscreen                toggle fullscreen
  show <id>                 show background 00/01/02
  rank                      paste ranking rows, finish with an empty line
  final <1st..5th>          show final results (five member ids)
  folder <path>             set the background folder
  ping                      round-trip check
  status                    liveness summary
  reconnect                 tear down and redial the broker
  quit";

/// Replay plan waiting for the remote window to come up.
struct PendingReplay {
    steps: Vec<ReplayStep>,
    deadline: tokio::time::Instant,
}

async fn run_replay<L: CommandSink>(commander: &Commander<L>, steps: Vec<ReplayStep>) {
    for step in steps {
        let sent = match step {
            ReplayStep::ShowBackground(bg) => commander.send_show_background(&bg).await,
            ReplayStep::ToggleFullscreen => {
                tokio::time::sleep(FULLSCREEN_DELAY).await;
                commander.send_toggle_fullscreen().await
            }
        };
        if let Err(e) = sent {
            error!("replay send failed: {e}");
            return;
        }
    }
    info!("monitor state replayed");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let session = load_or_create_session(&env_path("RANKCAST_SESSION_FILE", "rankcast_session.json"))
        .context("failed to load session id")?;
    let broker = BrokerConfig::load(&env_path("RANKCAST_BROKER_CONFIG", "rankcast_broker.json"));
    let settings_path = env_path("RANKCAST_CONSOLE_SETTINGS", "rankcast_console.json");
    let mut settings = ConsoleSettings::load(&settings_path);

    let identity = RuntimeIdentity::new(session, ClientId::from_hostname());
    info!(
        session = identity.session_id.as_str(),
        target = settings.target,
        "starting rankcast console"
    );

    let registry = TopicRegistry::new(&identity);
    let (link, mut events) = MqttLink::connect(&identity, &registry, &broker, LinkRole::Console);
    let mut commander = Commander::new(link, registry.clone(), settings.target.clone());

    let mut board = StatusBoard::new();
    let mut pending: Option<PendingReplay> = None;
    let mut rank_buffer: Option<Vec<String>> = None;
    let mut liveness_timer = interval(CHECK_INTERVAL);
    let mut last_reported = LinkStatus::Offline;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(LinkEvent::Message { topic, payload }) => {
                        let Some(kind) = registry.classify(&topic) else { continue };
                        if let Some(status) = board.on_message(kind, &payload, Instant::now()) {
                            match status.status.as_str() {
                                "display_ready" => {
                                    if let Some(p) = pending.take() {
                                        run_replay(&commander, p.steps).await;
                                    }
                                }
                                "pong" => println!("pong from {}", status.client_id),
                                "error" => println!("display error: {}", status.message),
                                _ => {}
                            }
                        }
                    }
                    Some(LinkEvent::Connected) => info!("broker link up"),
                    Some(LinkEvent::Disconnected) => warn!("broker link lost"),
                    None => {
                        // transport gave up after max retries; operator can
                        // still type `reconnect`
                        warn!("transport stopped, type `reconnect` to redial");
                    }
                }
            }
            _ = async {
                match &pending {
                    Some(p) => tokio::time::sleep_until(p.deadline).await,
                    None => std::future::pending().await,
                }
            } => {
                if let Some(p) = pending.take() {
                    warn!("no display_ready in time, replaying after settle delay");
                    run_replay(&commander, p.steps).await;
                }
            }
            _ = liveness_timer.tick() => {
                let now = board.check(Instant::now());
                if now != last_reported {
                    match now {
                        LinkStatus::Online => info!("display is online"),
                        LinkStatus::Timeout => warn!("display heartbeats stopped"),
                        LinkStatus::Offline => warn!("display reported offline"),
                    }
                    last_reported = now;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("stdin read failed")? else {
                    break; // EOF
                };

                // paste mode: collect until an empty line, then apply
                if let Some(mut buffer) = rank_buffer.take() {
                    if line.trim().is_empty() {
                        match commander.apply_ranking(&buffer.join("\n"), &settings).await {
                            Ok(n) => println!("ranking sent ({n} rows)"),
                            Err(e) => println!("ranking not sent: {e}"),
                        }
                    } else {
                        buffer.push(line);
                        rank_buffer = Some(buffer);
                    }
                    continue;
                }

                let mut parts = line.split_whitespace();
                let Some(verb) = parts.next() else { continue };
                let result: Result<()> = match verb {
                    "help" => { println!("{HELP}"); Ok(()) }
                    "open" => {
                        if let Some(m) = parts.next().and_then(|s| s.parse().ok()) {
                            settings.monitor_index = m;
                        }
                        if let Some(folder) = parts.next() {
                            settings.background_folder = folder.to_string();
                        }
                        let (monitor, folder) =
                            (settings.monitor_index, settings.background_folder.clone());
                        commander.open_display(monitor, &folder).await
                    }
                    "close" => commander.close_display().await,
                    "switch" => match parts.next().and_then(|s| s.parse().ok()) {
                        Some(monitor) => {
                            settings.monitor_index = monitor;
                            match commander.switch_monitor(monitor).await {
                                Ok(steps) if !steps.is_empty() => {
                                    pending = Some(PendingReplay {
                                        steps,
                                        deadline: tokio::time::Instant::now() + SETTLE_DELAY,
                                    });
                                    Ok(())
                                }
                                Ok(_) => Ok(()),
                                Err(e) => Err(e),
                            }
                        }
                        None => { println!("usage: switch <monitor>"); Ok(()) }
                    },
                    "fullscreen" => commander.toggle_fullscreen().await,
                    "show" => match parts.next() {
                        Some(id) => commander.show_background(id).await,
                        None => { println!("usage: show <id>"); Ok(()) }
                    },
                    "rank" => {
                        println!("paste ranking rows, finish with an empty line:");
                        rank_buffer = Some(Vec::new());
                        Ok(())
                    }
                    "final" => {
                        let ids: Vec<String> = parts.map(str::to_string).collect();
                        match <[String; 5]>::try_from(ids) {
                            Ok(places) => commander.apply_final(&places, &settings).await,
                            Err(_) => { println!("usage: final <1st> <2nd> <3rd> <4th> <5th>"); Ok(()) }
                        }
                    }
                    "folder" => match parts.next() {
                        Some(path) => {
                            settings.background_folder = path.to_string();
                            commander.set_background_folder(path).await
                        }
                        None => { println!("usage: folder <path>"); Ok(()) }
                    },
                    "ping" => commander.ping().await,
                    "status" => { println!("{}", board.describe()); Ok(()) }
                    "reconnect" => {
                        let (link, rx) =
                            MqttLink::connect(&identity, &registry, &broker, LinkRole::Console);
                        commander.set_link(link);
                        events = rx;
                        info!("redialing broker");
                        Ok(())
                    }
                    "quit" | "exit" => break,
                    other => { println!("unknown command `{other}`, try `help`"); Ok(()) }
                };
                if let Err(e) = result {
                    println!("command failed: {e}");
                }
            }
        }
    }

    if let Err(e) = settings.save(&settings_path) {
        warn!("could not persist settings: {e}");
    }
    Ok(())
}

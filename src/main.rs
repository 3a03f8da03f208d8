use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ambisonic_bridge::general::console::{self, ConsoleCommand};
use ambisonic_bridge::general::status;
use ambisonic_bridge::{BridgeConfig, ControlBoard, Peer, SceneNode};

/// Consumption tick: received OSC values are applied at this rate.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// OSC bridge between a spatial control board, a sound engine and a 3D scene
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Port to listen on for scene OSC messages (overrides the config file)
    #[arg(short = 'p', long)]
    listen_port: Option<u16>,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = init_logging(&args.log_level) {
        eprintln!("Error: {}", err);
        return;
    }
    if let Err(err) = run(args) {
        status::print_error(&format!("Error: {:#}", err));
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = BridgeConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    if let Some(port) = args.listen_port {
        config.scene.listen_port = Some(port);
    }
    config.validate().context("invalid configuration")?;

    let mut board = ControlBoard::new(&config).context("setting up control board")?;
    let mut scene = SceneNode::new(&config).context("setting up scene node")?;

    if let Some(port) = config.scene.listen_port {
        // A busy port is reported but the bridge keeps running without a listener.
        if let Err(err) = scene.listen(port) {
            warn!("OSC listener not started: {}", err);
        }
    }

    let (tx, rx) = channel::<ConsoleCommand>();
    // Detached: the reader stays blocked on stdin until the process ends.
    let _console = console::spawn_console(tx);

    status::print_startup(scene.listening_port());
    main_loop(&mut board, &mut scene, &rx);

    println!("Closing connections and exiting...");
    board.shutdown();
    scene.shutdown();
    info!("bridge shutdown complete");
    Ok(())
}

fn main_loop(board: &mut ControlBoard, scene: &mut SceneNode, rx: &Receiver<ConsoleCommand>) {
    loop {
        loop {
            match rx.try_recv() {
                Ok(ConsoleCommand::Exit) | Err(TryRecvError::Disconnected) => return,
                Ok(cmd) => handle_command(board, scene, cmd),
                Err(TryRecvError::Empty) => break,
            }
        }
        scene.tick();
        thread::sleep(TICK_INTERVAL);
    }
}

fn handle_command(board: &mut ControlBoard, scene: &mut SceneNode, cmd: ConsoleCommand) {
    let result = match cmd {
        ConsoleCommand::SetEndpoint(peer, raw) => {
            board.validate_and_set_endpoint(peer, &raw).map(drop)
        }
        ConsoleCommand::Hello(Some(peer)) => board.send_hello(peer).map(drop),
        ConsoleCommand::Hello(None) => board
            .send_hello(Peer::Audio)
            .and_then(|_| board.send_hello(Peer::Scene))
            .map(drop),
        ConsoleCommand::StopAll => board.send_stop_all().map(drop),
        ConsoleCommand::Midi(note) => board.send_midi(note).map(drop),
        ConsoleCommand::Axis(axis, value) => board.send_axis(axis, value).map(drop),
        ConsoleCommand::Drag(id, pos) => board.on_drag_update(&id, pos).map(drop),
        ConsoleCommand::Listen(raw) => scene.on_listen_port_changed(&raw).map(drop),
        ConsoleCommand::Relay { route, body } => board.relay_request(&route, &body).map(drop),
        ConsoleCommand::Reset => {
            scene.reset();
            board.reset_zones();
            println!("Scene state reset");
            Ok(())
        }
        ConsoleCommand::Verbose(on) => {
            board.set_verbose(on);
            scene.set_verbose(on);
            println!("Status echo {}", if on { "enabled" } else { "disabled" });
            Ok(())
        }
        ConsoleCommand::Help => {
            println!("{}", console::HELP);
            Ok(())
        }
        ConsoleCommand::Unknown(text) => {
            println!(
                "Unrecognized command: '{}'. Type 'help' for available commands.",
                text
            );
            Ok(())
        }
        ConsoleCommand::Exit => Ok(()),
    };

    if let Err(err) = result {
        status::print_error(&err.to_string());
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()
        .context("initializing logging")?;
    Ok(())
}

use std::io::stdin;
use std::sync::mpsc::Sender;
use std::thread;

use crate::general::axis::Axis;
use crate::general::spatial::Point;
use crate::remote::osc_sender::Peer;

#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleCommand {
    SetEndpoint(Peer, String),
    Hello(Option<Peer>),
    StopAll,
    Midi(i32),
    Axis(Axis, f32),
    Drag(String, Point),
    Listen(String),
    Relay { route: String, body: String },
    Reset,
    Verbose(bool),
    Help,
    Exit,
    Unknown(String),
}

pub const HELP: &str = "Commands:
  audio <ip:port>       - Set the audio engine destination (sends /hello)
  scene <ip:port>       - Set the 3D scene destination (sends /hello)
  hello [audio|scene]   - Send /hello again
  stop                  - Send /stopAll to the audio engine
  midi <note>           - Send /midi <note>
  x|y|z <value>         - Move a slider
  drag <id> <x> <y>     - Move a drag marker
  listen <port>         - Listen for OSC on <port>
  relay <route> <json>  - Relay a web request, e.g. relay /midi {\"data\": 60}
  reset                 - Reset scene and zone state
  verbose on/off        - Echo status lines
  help/h                - Show this help
  exit/quit/q           - Exit program";

fn parse_peer(s: &str) -> Option<Peer> {
    match s.to_ascii_lowercase().as_str() {
        "audio" | "sc" => Some(Peer::Audio),
        "scene" => Some(Peer::Scene),
        _ => None,
    }
}

/// Parse one console line. An empty line means exit.
pub fn parse_command(line: &str) -> ConsoleCommand {
    let cmd = line.trim();
    if cmd.is_empty() {
        return ConsoleCommand::Exit;
    }
    let unknown = || ConsoleCommand::Unknown(cmd.to_string());

    let (head, rest) = match cmd.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (cmd, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match head.to_ascii_lowercase().as_str() {
        "exit" | "quit" | "q" => ConsoleCommand::Exit,
        "help" | "h" => ConsoleCommand::Help,
        "stop" | "stopall" => ConsoleCommand::StopAll,
        "reset" => ConsoleCommand::Reset,
        "audio" | "sc" | "scene" if args.len() == 1 => match parse_peer(head) {
            Some(peer) => ConsoleCommand::SetEndpoint(peer, args[0].to_string()),
            None => unknown(),
        },
        "hello" => match args.as_slice() {
            [] => ConsoleCommand::Hello(None),
            [p] => parse_peer(p).map_or_else(unknown, |peer| ConsoleCommand::Hello(Some(peer))),
            _ => unknown(),
        },
        "midi" => match args.as_slice() {
            [n] => n.parse().map_or_else(|_| unknown(), ConsoleCommand::Midi),
            _ => unknown(),
        },
        "x" | "y" | "z" => match (head.parse::<Axis>(), args.as_slice()) {
            (Ok(axis), [v]) => v
                .parse()
                .map_or_else(|_| unknown(), |v| ConsoleCommand::Axis(axis, v)),
            _ => unknown(),
        },
        "drag" => match args.as_slice() {
            [id, x, y] => match (x.parse::<f32>(), y.parse::<f32>()) {
                (Ok(x), Ok(y)) => ConsoleCommand::Drag(id.to_string(), Point::new(x, y)),
                _ => unknown(),
            },
            _ => unknown(),
        },
        "listen" => match args.as_slice() {
            [port] => ConsoleCommand::Listen(port.to_string()),
            _ => unknown(),
        },
        "relay" => match rest.split_once(char::is_whitespace) {
            Some((route, body)) => ConsoleCommand::Relay {
                route: route.to_string(),
                body: body.trim().to_string(),
            },
            None if !rest.is_empty() => ConsoleCommand::Relay {
                route: rest.to_string(),
                body: "{}".to_string(),
            },
            None => unknown(),
        },
        "verbose" | "debug" => match args.as_slice() {
            ["on"] | ["enable"] => ConsoleCommand::Verbose(true),
            ["off"] | ["disable"] => ConsoleCommand::Verbose(false),
            _ => unknown(),
        },
        _ => unknown(),
    }
}

/// Spawn a thread that reads stdin lines and forwards parsed commands.
/// The thread ends after sending `Exit` or when stdin closes.
pub fn spawn_console(tx: Sender<ConsoleCommand>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = tx.send(ConsoleCommand::Exit);
                    break;
                }
                Ok(_) => {}
            }
            let cmd = parse_command(&line);
            let exit = cmd == ConsoleCommand::Exit;
            if tx.send(cmd).is_err() || exit {
                break;
            }
        }
    })
}

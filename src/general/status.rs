use std::fmt::Display;
use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::remote::osc_sender::Peer;

pub fn sent(value: impl Display, address: &str, endpoint: impl Display) -> String {
    format!("Message '{}' is sent at {} on {}", value, address, endpoint)
}

pub fn received(value: impl Display, address: &str, port: u16) -> String {
    format!(
        "Message '{}' is received at {} on port {}",
        value, address, port
    )
}

pub fn ambisonic(endpoint: impl Display, address: &str, distance: f32, azimuth: f32) -> String {
    format!(
        "Info is sent at {} on {} - Relative distance: {}|Azimuth: {}°",
        address,
        endpoint,
        round2(distance),
        round2(azimuth.to_degrees())
    )
}

pub fn exited(element_id: &str) -> String {
    format!("Element {} left the zone", element_id)
}

pub fn listening(port: u16) -> String {
    format!("Server is listening on port {}", port)
}

pub fn invalid_endpoint(peer: Peer) -> String {
    format!("Invalid input for IP:Port of the {}", peer)
}

pub fn invalid_port() -> String {
    "Invalid port (must be between 1 and 65535)".to_string()
}

pub fn dropped(address: &str, endpoint: impl Display) -> String {
    format!("{} busy, {} dropped", endpoint, address)
}

pub fn not_configured(peer: Peer) -> String {
    format!("No destination set for the {}", peer)
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Latest status message, echoed to the console when verbose.
#[derive(Debug, Default)]
pub struct StatusLine {
    text: String,
    verbose: bool,
}

impl StatusLine {
    pub fn new(verbose: bool) -> Self {
        StatusLine {
            text: String::new(),
            verbose,
        }
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if self.verbose && !self.text.is_empty() {
            println!("{}", self.text);
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }
}

fn print_colored(color: Color, line: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", line);
    let _ = stdout.reset();
}

pub fn print_quick_help() {
    print_colored(Color::Blue, "Type 'help' for commands, 'exit' to quit");
}

pub fn print_error(line: &str) {
    print_colored(Color::Red, line);
}

/// Startup banner: green when the listener is up, red otherwise.
pub fn print_startup(listen_port: Option<u16>) {
    match listen_port {
        Some(port) => print_colored(Color::Green, &format!("Bridge started | {}", listening(port))),
        None => print_colored(Color::Red, "Bridge started | no OSC listener running"),
    }
    print_quick_help();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::endpoint::validate;

    #[test]
    fn test_sent_line_names_value_address_endpoint() {
        let ep = validate("127.0.0.1:57120").unwrap();
        assert_eq!(
            sent(60, "/midi", ep),
            "Message '60' is sent at /midi on 127.0.0.1:57120"
        );
    }

    #[test]
    fn test_dropped_line_is_not_a_sent_line() {
        let ep = validate("127.0.0.1:57120").unwrap();
        let line = dropped("/ambisonic1", ep);
        assert_eq!(line, "127.0.0.1:57120 busy, /ambisonic1 dropped");
        assert!(!line.contains("is sent"));
    }

    #[test]
    fn test_received_line() {
        assert_eq!(
            received(0.5, "/x", 9000),
            "Message '0.5' is received at /x on port 9000"
        );
    }

    #[test]
    fn test_ambisonic_rounds_and_converts_to_degrees() {
        let line = ambisonic("10.0.0.2:57120", "/ambisonic1", 0.123_456, std::f32::consts::FRAC_PI_2);
        assert!(line.contains("Relative distance: 0.12|"), "{}", line);
        assert!(line.contains("Azimuth: 90°"), "{}", line);
    }

    #[test]
    fn test_status_line_keeps_latest() {
        let mut status = StatusLine::new(false);
        status.set("first");
        status.set("second");
        assert_eq!(status.text(), "second");
        status.clear();
        assert_eq!(status.text(), "");
    }
}

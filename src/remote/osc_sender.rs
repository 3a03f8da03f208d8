use std::fmt;
use std::io::ErrorKind;
use std::net::UdpSocket;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::general::endpoint::Endpoint;
use crate::remote::message::MessageEnvelope;

pub const HELLO_ADDRESS: &str = "/hello";
pub const STOP_ALL_ADDRESS: &str = "/stopAll";

/// Which remote program a relay talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Peer {
    /// The sound engine receiving /hello, /midi, /ambisonic<id> and /stopAll.
    Audio,
    /// The 3D scene receiving /hello and the /x /y /z sliders.
    Scene,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Audio => f.write_str("audio engine"),
            Peer::Scene => f.write_str("3D scene"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { bytes: usize },
    /// No destination configured yet; nothing was sent.
    Unconfigured,
    /// The socket could not take the datagram without blocking.
    Dropped,
}

struct Link {
    endpoint: Endpoint,
    socket: UdpSocket,
}

/// OSC client for one peer. Holds at most one destination at a time; changing
/// it tears the old socket down before a new one is opened.
///
/// The socket stays unconnected and every datagram is addressed with
/// `send_to`, so an ICMP port-unreachable from a peer that was down never
/// surfaces as an error on a later send.
pub struct OscRelay {
    peer: Peer,
    link: Option<Link>,
}

impl OscRelay {
    pub fn new(peer: Peer) -> Self {
        OscRelay { peer, link: None }
    }

    pub fn peer(&self) -> Peer {
        self.peer
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.link.as_ref().map(|l| l.endpoint)
    }

    pub fn is_configured(&self) -> bool {
        self.link.is_some()
    }

    pub fn set_endpoint(&mut self, endpoint: Endpoint) -> Result<()> {
        // Close the previous socket before opening the next one.
        self.link = None;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;

        if let Ok(local) = socket.local_addr() {
            info!("{} relay: local {} -> target {}", self.peer, local, endpoint);
        }
        self.link = Some(Link { endpoint, socket });
        Ok(())
    }

    pub fn clear_endpoint(&mut self) {
        if let Some(link) = self.link.take() {
            debug!("{} relay: closed link to {}", self.peer, link.endpoint);
        }
    }

    pub fn send(&self, envelope: &MessageEnvelope) -> Result<SendOutcome> {
        let Some(link) = &self.link else {
            debug!("{} relay not configured, skipping {}", self.peer, envelope.address);
            return Ok(SendOutcome::Unconfigured);
        };

        let buf = envelope.encode()?;
        match link.socket.send_to(&buf, link.endpoint.socket_addr()) {
            Ok(bytes) => {
                debug!(
                    "[OSC] Sent {} bytes to {}: {} [{}]",
                    bytes,
                    link.endpoint,
                    envelope.address,
                    envelope.value_text()
                );
                Ok(SendOutcome::Sent { bytes })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                warn!("[OSC] {} busy, dropped {}", link.endpoint, envelope.address);
                Ok(SendOutcome::Dropped)
            }
            Err(e) => {
                warn!("[OSC] Failed to send to {}: {}", link.endpoint, e);
                Err(e.into())
            }
        }
    }

    pub fn send_hello(&self, text: &str) -> Result<SendOutcome> {
        self.send(&MessageEnvelope::new(HELLO_ADDRESS).string(text))
    }

    pub fn send_stop_all(&self) -> Result<SendOutcome> {
        self.send(&MessageEnvelope::new(STOP_ALL_ADDRESS))
    }
}

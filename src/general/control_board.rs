//! Operations the control surface invokes: endpoint setup, buttons, sliders
//! and drag events. Each one leaves a status line behind.

use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::general::axis::Axis;
use crate::general::endpoint::validate;
use crate::general::spatial::{Point, SpatialEvent, SpatialTracker};
use crate::general::status::{self, StatusLine};
use crate::remote::message::MessageEnvelope;
use crate::remote::osc_sender::{OscRelay, Peer, SendOutcome, HELLO_ADDRESS, STOP_ALL_ADDRESS};
use crate::remote::relay::{self, RelayAction, WEB_HELLO};

pub const MIDI_ADDRESS: &str = "/midi";

pub struct ControlBoard {
    audio: OscRelay,
    scene: OscRelay,
    zones: SpatialTracker,
    center: Point,
    radius: f32,
    hello: String,
    pub status: StatusLine,
}

impl ControlBoard {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        let mut board = ControlBoard {
            audio: OscRelay::new(Peer::Audio),
            scene: OscRelay::new(Peer::Scene),
            zones: SpatialTracker::with_elements(config.zone.elements.iter().cloned())?,
            center: config.zone.center,
            radius: config.zone.radius,
            hello: config.hello_message.clone(),
            status: StatusLine::new(config.verbose),
        };
        if let Some(ep) = config.audio_endpoint()? {
            board.audio.set_endpoint(ep)?;
        }
        if let Some(ep) = config.scene_endpoint()? {
            board.scene.set_endpoint(ep)?;
        }
        Ok(board)
    }

    pub fn relay(&self, peer: Peer) -> &OscRelay {
        match peer {
            Peer::Audio => &self.audio,
            Peer::Scene => &self.scene,
        }
    }

    fn relay_mut(&mut self, peer: Peer) -> &mut OscRelay {
        match peer {
            Peer::Audio => &mut self.audio,
            Peer::Scene => &mut self.scene,
        }
    }

    /// Validate "ip:port", point the peer's relay at it and greet it.
    /// Nothing is sent when validation fails.
    pub fn validate_and_set_endpoint(&mut self, peer: Peer, raw: &str) -> Result<SendOutcome> {
        self.status.clear();
        let endpoint = match validate(raw) {
            Ok(ep) => ep,
            Err(err) => {
                self.status.set(status::invalid_endpoint(peer));
                return Err(err);
            }
        };
        self.relay_mut(peer).set_endpoint(endpoint)?;
        info!("{} destination set to {}", peer, endpoint);
        self.send_hello(peer)
    }

    pub fn send_hello(&mut self, peer: Peer) -> Result<SendOutcome> {
        let envelope = MessageEnvelope::new(HELLO_ADDRESS)
            .string(self.hello.clone());
        self.send_reporting(peer, &envelope)
    }

    pub fn send_stop_all(&mut self) -> Result<SendOutcome> {
        let envelope = MessageEnvelope::new(STOP_ALL_ADDRESS);
        self.send_reporting(Peer::Audio, &envelope)
    }

    /// Slider moved: forward the absolute value; the scene integrates deltas.
    pub fn send_axis(&mut self, axis: Axis, value: f32) -> Result<SendOutcome> {
        let envelope = MessageEnvelope::new(axis.address()).float(value);
        self.send_reporting(Peer::Scene, &envelope)
    }

    /// Key pressed. The keyboard spans notes 52..=63, but any note is passed on.
    pub fn send_midi(&mut self, note: i32) -> Result<SendOutcome> {
        let envelope = MessageEnvelope::new(MIDI_ADDRESS).int(note);
        self.send_reporting(Peer::Audio, &envelope)
    }

    /// Drag marker moved to `pos`. Sends polar coordinates while inside the
    /// zone and a single bare message when it leaves. An exit that fails to
    /// go out is rearmed so the next sample outside retries it.
    pub fn on_drag_update(&mut self, element_id: &str, pos: Point) -> Result<SpatialEvent> {
        let event = self
            .zones
            .update(element_id, pos, self.center, self.radius)?;

        let Some(envelope) = event.to_envelope(element_id) else {
            self.status.clear();
            return Ok(event);
        };
        let sent = self.audio.send(&envelope);
        if event == SpatialEvent::Exit && matches!(sent, Err(_) | Ok(SendOutcome::Dropped)) {
            self.zones.rearm_exit(element_id);
        }
        let outcome = sent?;

        match (event, &outcome, self.audio.endpoint()) {
            (
                SpatialEvent::Inside {
                    relative_distance,
                    azimuth,
                },
                SendOutcome::Sent { .. },
                Some(ep),
            ) => self.status.set(status::ambisonic(
                ep,
                &envelope.address,
                relative_distance,
                azimuth,
            )),
            (_, SendOutcome::Dropped, Some(ep)) => {
                self.status.set(status::dropped(&envelope.address, ep))
            }
            (SpatialEvent::Exit, _, _) => self.status.set(status::exited(element_id)),
            _ => {}
        }
        Ok(event)
    }

    /// Handle a relay request from the web control board. `None` when the
    /// request translated to nothing to send.
    pub fn relay_request(&mut self, route: &str, body: &str) -> Result<Option<SendOutcome>> {
        let action = relay::translate(route, body)?;
        let outcome = relay::forward(&mut self.audio, &action, WEB_HELLO)?;
        let line = match (&action, &outcome, self.audio.endpoint()) {
            (RelayAction::Send(envelope), Some(SendOutcome::Sent { .. }), Some(ep)) => {
                status::sent(envelope.value_text(), &envelope.address, ep)
            }
            (RelayAction::Send(envelope), Some(SendOutcome::Dropped), Some(ep)) => {
                status::dropped(&envelope.address, ep)
            }
            (RelayAction::Configure(ep), Some(SendOutcome::Sent { .. }), _) => {
                status::sent(WEB_HELLO, HELLO_ADDRESS, ep)
            }
            (RelayAction::Configure(ep), Some(SendOutcome::Dropped), _) => {
                status::dropped(HELLO_ADDRESS, ep)
            }
            (RelayAction::Send(_), Some(SendOutcome::Unconfigured), _) => {
                status::not_configured(Peer::Audio)
            }
            _ => return Ok(outcome),
        };
        self.status.set(line);
        Ok(outcome)
    }

    /// Mark every drag element as outside the zone again.
    pub fn reset_zones(&mut self) {
        self.zones.reset();
        self.status.clear();
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.status.set_verbose(verbose);
    }

    /// Best-effort stop notification on the way out. Never fails.
    pub fn shutdown(&mut self) {
        match self.audio.send_stop_all() {
            Ok(SendOutcome::Sent { .. }) => info!("stopAll sent to audio engine"),
            Ok(_) => {}
            Err(err) => warn!("stopAll on shutdown failed: {}", err),
        }
        self.audio.clear_endpoint();
        self.scene.clear_endpoint();
    }

    fn send_reporting(&mut self, peer: Peer, envelope: &MessageEnvelope) -> Result<SendOutcome> {
        let relay = self.relay(peer);
        let outcome = relay.send(envelope)?;
        let line = match (&outcome, relay.endpoint()) {
            (SendOutcome::Sent { .. }, Some(ep)) => {
                status::sent(envelope.value_text(), &envelope.address, ep)
            }
            (SendOutcome::Dropped, Some(ep)) => status::dropped(&envelope.address, ep),
            _ => status::not_configured(peer),
        };
        self.status.set(line);
        Ok(outcome)
    }
}


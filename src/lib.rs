//! OSC bridge between a spatial control board, a sound engine and a 3D scene.
//!
//! The control board side ([`ControlBoard`]) validates destinations and turns
//! button, slider and drag events into OSC messages. The scene side
//! ([`SceneNode`]) listens for OSC, decodes on the network thread and applies
//! the values on its own tick.

pub mod config;
pub mod error;
pub mod general;
pub mod remote;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use general::control_board::ControlBoard;
pub use general::endpoint::{validate, Endpoint};
pub use general::scene::SceneNode;
pub use general::spatial::{Point, SpatialEvent, SpatialTracker};
pub use remote::dispatcher::{Dispatcher, RouteOutcome};
pub use remote::message::{MessageEnvelope, OscArg};
pub use remote::osc_sender::{OscRelay, Peer, SendOutcome};

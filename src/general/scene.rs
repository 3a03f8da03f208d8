//! The 3D scene side: listens for slider and hello messages and applies them
//! to scene state once per tick.

use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::general::axis::{Axis, SceneState};
use crate::general::endpoint::validate_port;
use crate::general::status::{self, StatusLine};
use crate::remote::dispatcher::{decode_float, decode_string, Dispatcher};
use crate::remote::message::OscArg;
use crate::remote::osc_sender::HELLO_ADDRESS;

/// What the apply handlers see on the consumption tick.
#[derive(Debug)]
pub struct SceneView {
    pub scene: SceneState,
    pub status: StatusLine,
    pub port: Option<u16>,
}

pub struct SceneNode {
    dispatcher: Dispatcher<SceneView>,
    view: SceneView,
}

impl SceneNode {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let mut dispatcher = Dispatcher::new(config.queue_capacity);
        register_handlers(&mut dispatcher)?;
        Ok(SceneNode {
            dispatcher,
            view: SceneView {
                scene: SceneState::new(config.scene.objects, config.scene.axis_step),
                status: StatusLine::new(config.verbose),
                port: None,
            },
        })
    }

    pub fn view(&self) -> &SceneView {
        &self.view
    }

    pub fn dispatcher(&self) -> &Dispatcher<SceneView> {
        &self.dispatcher
    }

    /// Port typed by the user. Invalid input leaves the current listener alone.
    pub fn on_listen_port_changed(&mut self, raw: &str) -> Result<u16> {
        let port = match validate_port(raw) {
            Ok(p) => p,
            Err(err) => {
                self.view.status.set(status::invalid_port());
                return Err(err);
            }
        };
        self.listen(port)
    }

    pub fn listen(&mut self, port: u16) -> Result<u16> {
        match self.dispatcher.rebind(port as i64) {
            Ok(p) => {
                self.view.port = Some(p);
                self.view.status.set(status::listening(p));
                Ok(p)
            }
            Err(err) => {
                let line = match &err {
                    BridgeError::PortInUse(p) => format!("Port {} is already in use", p),
                    BridgeError::PortOutOfRange(_) => status::invalid_port(),
                    other => other.to_string(),
                };
                warn!("{}", line);
                self.view.status.set(line);
                Err(err)
            }
        }
    }

    pub fn listening_port(&self) -> Option<u16> {
        self.dispatcher.listening_port()
    }

    /// Consumption tick: apply everything received since the last tick.
    pub fn tick(&mut self) -> usize {
        self.dispatcher.drain(&mut self.view)
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.view.status.set_verbose(verbose);
    }

    /// Forget slider history and object offsets.
    pub fn reset(&mut self) {
        self.view.scene.reset();
    }

    pub fn shutdown(&mut self) {
        self.dispatcher.shutdown();
        if let Some(port) = self.view.port.take() {
            info!("stopped listening on port {}", port);
        }
    }
}

fn register_handlers(dispatcher: &mut Dispatcher<SceneView>) -> Result<()> {
    for axis in Axis::ALL {
        dispatcher.register(axis.address(), decode_float, move |view: &mut SceneView, value: &OscArg| {
            let Some(v) = value.as_f32() else { return };
            view.scene.apply_axis(axis, v);
            report(view, value, axis.address());
        })?;
    }
    dispatcher.register(HELLO_ADDRESS, decode_string, |view: &mut SceneView, value: &OscArg| {
        view.scene.last_hello = value.as_str().map(str::to_string);
        report(view, value, HELLO_ADDRESS);
    })?;
    Ok(())
}

fn report(view: &mut SceneView, value: &OscArg, address: &str) {
    if let Some(port) = view.port {
        view.status.set(status::received(value, address, port));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::message::MessageEnvelope;

    fn node() -> SceneNode {
        let mut config = BridgeConfig::default();
        config.verbose = false;
        config.scene.objects = 2;
        SceneNode::new(&config).unwrap()
    }

    fn feed(node: &SceneNode, env: MessageEnvelope) {
        node.dispatcher()
            .on_datagram_received(&env.encode().unwrap());
    }

    #[test]
    fn test_handlers_registered() {
        let n = node();
        for addr in ["/x", "/y", "/z", "/hello"] {
            assert!(n.dispatcher().is_registered(addr), "{}", addr);
        }
    }

    #[test]
    fn test_axis_moves_objects_by_delta() {
        let mut n = node();
        feed(&n, MessageEnvelope::new("/x").float(5.0));
        feed(&n, MessageEnvelope::new("/x").float(8.0));
        assert_eq!(n.tick(), 2);
        for obj in &n.view().scene.objects {
            assert!((obj[0] - 0.8).abs() < 1e-5);
        }

        feed(&n, MessageEnvelope::new("/x").float(8.0));
        n.tick();
        assert!((n.view().scene.objects[0][0] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_nothing_applied_before_tick() {
        let n = node();
        feed(&n, MessageEnvelope::new("/y").float(3.0));
        assert_eq!(n.view().scene.objects[0][1], 0.0);
    }

    #[test]
    fn test_hello_is_stored() {
        let mut n = node();
        feed(&n, MessageEnvelope::new("/hello").string("Hello from control board!"));
        n.tick();
        assert_eq!(
            n.view().scene.last_hello.as_deref(),
            Some("Hello from control board!")
        );
    }

    #[test]
    fn test_invalid_listen_port_reports() {
        let mut n = node();
        assert!(n.on_listen_port_changed("0").is_err());
        assert!(n.on_listen_port_changed("port").is_err());
        assert_eq!(n.view().status.text(), status::invalid_port());
        assert_eq!(n.listening_port(), None);
    }

    #[test]
    fn test_reset_clears_scene() {
        let mut n = node();
        feed(&n, MessageEnvelope::new("/z").float(2.0));
        n.tick();
        n.reset();
        assert_eq!(n.view().scene.objects[0], [0.0; 3]);
    }
}

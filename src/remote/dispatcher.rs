//! Address-routed dispatch of inbound OSC messages.
//!
//! Decoding happens on whichever thread receives the datagram. The decoded
//! value is queued and only applied when the owning context calls
//! [`Dispatcher::drain`], so scene state is never touched from the network
//! thread.

use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rosc::{decoder, OscPacket, OscType};
use tracing::{debug, info, trace, warn};

use crate::error::{BridgeError, Result};
use crate::remote::message::OscArg;
use crate::remote::osc_listener::OscListener;

pub type DecodeFn = Box<dyn Fn(&[OscType]) -> Result<OscArg> + Send + Sync>;
pub type ApplyFn<S> = Box<dyn FnMut(&mut S, &OscArg) + Send>;

struct Route {
    decode: DecodeFn,
    last_good: Mutex<Option<OscArg>>,
}

type RouteTable = Arc<RwLock<HashMap<String, Route>>>;

/// A decoded value waiting for the consumption tick.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingApply {
    pub address: String,
    pub value: OscArg,
}

#[derive(Debug, PartialEq)]
pub enum RouteOutcome {
    Scheduled,
    /// Decode failed and no earlier value exists to re-apply.
    Ignored,
    /// No handler is registered for the address.
    Unrouted,
    /// Queue full; the update was dropped to keep the receive path moving.
    Dropped,
    /// Bundles or undecodable bytes.
    Malformed,
}

/// Receive-side handle: shares the route table and feeds the apply queue.
#[derive(Clone)]
pub struct DatagramRouter {
    routes: RouteTable,
    queue: SyncSender<PendingApply>,
}

impl DatagramRouter {
    pub fn on_datagram_received(&self, raw: &[u8]) -> RouteOutcome {
        match decoder::decode_udp(raw) {
            Ok((_, OscPacket::Message(msg))) => self.route(&msg.addr, &msg.args),
            Ok((_, OscPacket::Bundle(_))) => {
                debug!("OSC bundle dropped (bundles are not supported)");
                RouteOutcome::Malformed
            }
            Err(err) => {
                warn!("OSC decode error: {}", err);
                RouteOutcome::Malformed
            }
        }
    }

    pub fn route(&self, address: &str, args: &[OscType]) -> RouteOutcome {
        let routes = self.routes.read();
        let Some(route) = routes.get(address) else {
            trace!("unrouted OSC address {}", address);
            return RouteOutcome::Unrouted;
        };

        let value = {
            let mut last_good = route.last_good.lock();
            match (route.decode)(args) {
                Ok(v) => *last_good = Some(v),
                Err(err) => debug!("{}: {}", address, err),
            }
            match last_good.clone() {
                Some(v) => v,
                None => return RouteOutcome::Ignored,
            }
        };

        let pending = PendingApply {
            address: address.to_string(),
            value,
        };
        match self.queue.try_send(pending) {
            Ok(()) => RouteOutcome::Scheduled,
            Err(TrySendError::Full(p)) => {
                warn!("apply queue full, dropped update for {}", p.address);
                RouteOutcome::Dropped
            }
            // Consumer gone: the process is shutting down.
            Err(TrySendError::Disconnected(_)) => RouteOutcome::Dropped,
        }
    }
}

/// Owns the handler registry, the apply queue and the listening socket.
/// `S` is the state the apply handlers mutate on the consumption context.
pub struct Dispatcher<S> {
    router: DatagramRouter,
    appliers: HashMap<String, ApplyFn<S>>,
    pending: Receiver<PendingApply>,
    listener: Option<OscListener>,
}

impl<S> Dispatcher<S> {
    pub fn new(queue_capacity: usize) -> Self {
        let (tx, rx) = sync_channel(queue_capacity.max(1));
        Dispatcher {
            router: DatagramRouter {
                routes: Arc::new(RwLock::new(HashMap::new())),
                queue: tx,
            },
            appliers: HashMap::new(),
            pending: rx,
            listener: None,
        }
    }

    /// Register (or replace) the decode/apply pair for a literal address.
    pub fn register(
        &mut self,
        pattern: &str,
        decode: impl Fn(&[OscType]) -> Result<OscArg> + Send + Sync + 'static,
        apply: impl FnMut(&mut S, &OscArg) + Send + 'static,
    ) -> Result<()> {
        if !pattern.starts_with('/') {
            return Err(BridgeError::InvalidAddress(pattern.to_string()));
        }
        let route = Route {
            decode: Box::new(decode),
            last_good: Mutex::new(None),
        };
        if self
            .router
            .routes
            .write()
            .insert(pattern.to_string(), route)
            .is_some()
        {
            debug!("handler for {} replaced", pattern);
        }
        self.appliers.insert(pattern.to_string(), Box::new(apply));
        Ok(())
    }

    pub fn is_registered(&self, pattern: &str) -> bool {
        self.router.routes.read().contains_key(pattern)
    }

    pub fn on_datagram_received(&self, raw: &[u8]) -> RouteOutcome {
        self.router.on_datagram_received(raw)
    }

    /// Run every queued apply against `state`. Returns how many ran.
    pub fn drain(&mut self, state: &mut S) -> usize {
        let mut applied = 0;
        while let Ok(p) = self.pending.try_recv() {
            if let Some(apply) = self.appliers.get_mut(&p.address) {
                apply(state, &p.value);
                applied += 1;
            }
        }
        applied
    }

    pub fn listening_port(&self) -> Option<u16> {
        self.listener.as_ref().map(OscListener::port)
    }

    /// Move the listener to `port`. The new socket is bound before the old
    /// one is released; on failure the current listener keeps running.
    pub fn rebind(&mut self, port: i64) -> Result<u16> {
        if !(1..=65535).contains(&port) {
            return Err(BridgeError::PortOutOfRange(port));
        }
        let port = port as u16;
        if self.listening_port() == Some(port) {
            return Ok(port);
        }

        let listener = OscListener::spawn(port, self.router.clone())?;
        if let Some(old) = self.listener.replace(listener) {
            let old_port = old.port();
            old.stop();
            info!("OSC listener moved from port {} to {}", old_port, port);
        }
        Ok(port)
    }

    pub fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
    }
}

impl<S> Drop for Dispatcher<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn first_arg<'a>(args: &'a [OscType], expected: &str) -> Result<&'a OscType> {
    args.first()
        .ok_or_else(|| BridgeError::mismatch(expected, "message has no arguments"))
}

/// First argument as float32. int32 is widened: the relay sends slider values
/// as integers.
pub fn decode_float(args: &[OscType]) -> Result<OscArg> {
    match first_arg(args, "float")? {
        OscType::Float(v) => Ok(OscArg::Float(*v)),
        OscType::Int(v) => Ok(OscArg::Float(*v as f32)),
        other => Err(BridgeError::mismatch("float", format!("got {:?}", other))),
    }
}

pub fn decode_int(args: &[OscType]) -> Result<OscArg> {
    match first_arg(args, "int")? {
        OscType::Int(v) => Ok(OscArg::Int(*v)),
        other => Err(BridgeError::mismatch("int", format!("got {:?}", other))),
    }
}

pub fn decode_string(args: &[OscType]) -> Result<OscArg> {
    match first_arg(args, "string")? {
        OscType::String(s) => Ok(OscArg::Str(s.clone())),
        other => Err(BridgeError::mismatch("string", format!("got {:?}", other))),
    }
}

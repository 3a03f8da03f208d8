use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{BridgeError, Result};
use crate::remote::dispatcher::DatagramRouter;

/// How often the receive loop wakes up to check its stop flag.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// A bound UDP socket plus the thread that reads it and feeds the router.
pub struct OscListener {
    port: u16,
    stop_flag: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OscListener {
    /// Bind `0.0.0.0:port` and start receiving. Binding happens on the
    /// calling thread so failures are reported to the caller.
    pub fn spawn(port: u16, router: DatagramRouter) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).map_err(|err| match err.kind() {
            ErrorKind::AddrInUse => BridgeError::PortInUse(port),
            _ => BridgeError::Io(err),
        })?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop = stop_flag.clone();
        let handle = thread::Builder::new()
            .name(format!("osc-listener-{}", port))
            .spawn(move || receive_loop(socket, router, stop))?;

        info!("OSC listener bound on port {}", port);
        Ok(OscListener {
            port,
            stop_flag,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the receive thread and wait for it; the socket closes with it.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("OSC listener thread on port {} panicked", self.port);
            }
        }
    }
}

impl Drop for OscListener {
    fn drop(&mut self) {
        self.halt();
    }
}

fn receive_loop(socket: UdpSocket, router: DatagramRouter, stop: Arc<AtomicBool>) {
    let mut buf = [0u8; rosc::decoder::MTU];

    while !stop.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((size, peer_addr)) => {
                let outcome = router.on_datagram_received(&buf[..size]);
                debug!("{} bytes from {}: {:?}", size, peer_addr, outcome);
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                continue;
            }
            Err(err) => {
                warn!("OSC recv error: {}", err);
            }
        }
    }

    debug!("OSC listener exiting");
}

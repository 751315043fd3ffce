//! Online/offline detection.
//!
//! The repository asks a `Connectivity` before every request. A `true`
//! answer is best effort: the request that follows can still fail and fall
//! back to the cache.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

/// How long a probe answer is reused before probing again
pub const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(5);

pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity flag flipped by hand (offline mode, tests).
#[derive(Debug)]
pub struct ManualConnectivity {
    online: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Reports online when a TCP connection to `addr` can be opened.
///
/// A fresh probe blocks the calling thread for at most `timeout` per
/// resolved address. Answers are reused for `ttl`, so a burst of requests
/// probes once.
#[derive(Debug)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
    ttl: Duration,
    last: Mutex<Option<(Instant, bool)>>,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            ttl: DEFAULT_PROBE_TTL,
            last: Mutex::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn resolve(&self) -> Vec<SocketAddr> {
        match self.addr.to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                debug!(addr = %self.addr, error = %e, "Probe address did not resolve");
                Vec::new()
            }
        }
    }
}

impl Connectivity for TcpProbe {
    fn is_online(&self) -> bool {
        if let Some((at, online)) = *self.last.lock() {
            if at.elapsed() < self.ttl {
                return online;
            }
        }

        let online = self
            .resolve()
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok());
        debug!(addr = %self.addr, online, "Connectivity probe");
        *self.last.lock() = Some((Instant::now(), online));
        online
    }
}

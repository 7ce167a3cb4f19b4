use crate::application::ports::clock::Clock;
use crate::application::ports::remote_store::RemoteStore;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Tracks remote reachability. The scheduler and reconciler consult the
/// online flag before acting and no-op while offline; the flag only changes
/// through `probe_once`.
pub struct ConnectivityMonitor {
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    online: AtomicBool,
    last_probe_at: RwLock<Option<DateTime<Utc>>>,
}

impl ConnectivityMonitor {
    pub fn new(remote: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            remote,
            clock,
            online: AtomicBool::new(false),
            last_probe_at: RwLock::new(None),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn last_probe_at(&self) -> Option<DateTime<Utc>> {
        *self.last_probe_at.read().expect("probe lock poisoned")
    }

    /// Online iff the probe succeeds; any probe error flips to offline.
    pub async fn probe_once(&self) -> bool {
        let online = match self.remote.ping().await {
            Ok(()) => true,
            Err(err) => {
                debug!(target: "sync::connectivity", error = %err, "reachability probe failed");
                false
            }
        };

        let was_online = self.online.swap(online, Ordering::SeqCst);
        *self.last_probe_at.write().expect("probe lock poisoned") = Some(self.clock.now());

        if online != was_online {
            if online {
                tracing::info!(target: "sync::connectivity", "remote store reachable, going online");
            } else {
                warn!(target: "sync::connectivity", "remote store unreachable, going offline");
            }
        }

        online
    }
}

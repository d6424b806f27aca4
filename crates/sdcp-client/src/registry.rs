//! Session registry
//!
//! The registry is the only owner of sessions. Dialing and the handshake
//! happen outside the map lock: the id is first reserved with an `Opening`
//! slot, so a second registration of the same id is rejected at once while
//! lookups and registrations of other ids carry on.

use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::SessionConfig;
use crate::error::{ClientError, Result};
use crate::session::Session;

enum Slot {
    /// Dial or handshake in progress
    Opening,
    Live(Arc<Session>),
    /// Being stopped by `unregister`
    Closing,
}

/// The set of live sessions, keyed by mainboard id
pub struct Registry {
    config: SessionConfig,
    sessions: RwLock<HashMap<String, Slot>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Registry {
    /// Create a registry whose sessions all use `config`
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a session to the printer at `address` and store it under `id`
    pub async fn register(&self, id: &str, address: &str) -> Result<Arc<Session>> {
        self.register_with_cancel(id, address, &CancellationToken::new())
            .await
    }

    /// Like [`Registry::register`], giving up when `cancel` fires
    pub async fn register_with_cancel(
        &self,
        id: &str,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<Session>> {
        let reservation = self.reserve(id)?;

        let session = Session::open(id, address, self.config.clone(), cancel).await?;
        let session = Arc::new(session);

        let stored = {
            let mut sessions = self.sessions.write();
            let opening = matches!(sessions.get(id), Some(Slot::Opening));
            if opening {
                sessions.insert(id.to_string(), Slot::Live(session.clone()));
            }
            opening
        };
        reservation.disarm();

        // close_all ran while we were dialing
        if !stored {
            session.stop().await;
            return Err(ClientError::SessionClosed);
        }

        info!(id = %id, address = %address, "Printer registered");
        Ok(session)
    }

    fn reserve(&self, id: &str) -> Result<Release<'_>> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(id) {
            return Err(ClientError::AlreadyRegistered(id.to_string()));
        }
        sessions.insert(id.to_string(), Slot::Opening);

        Ok(Release::new(self, id, Phase::Opening))
    }

    /// Stop and remove the session for `id`. Returns false if there was none.
    ///
    /// The id is released even if this future is dropped before the stop completes.
    pub async fn unregister(&self, id: &str) -> bool {
        let (session, release) = {
            let mut sessions = self.sessions.write();
            let session = match sessions.get(id) {
                Some(Slot::Live(session)) => session.clone(),
                _ => return false,
            };
            sessions.insert(id.to_string(), Slot::Closing);
            (session, Release::new(self, id, Phase::Closing))
        };

        session.stop().await;
        release.finish();

        info!(id = %id, "Printer unregistered");
        true
    }

    /// Look up a live session
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        match self.sessions.read().get(id) {
            Some(Slot::Live(session)) => Some(session.clone()),
            _ => None,
        }
    }

    /// Like [`Registry::get`], with a not-found error
    pub fn lookup(&self, id: &str) -> Result<Arc<Session>> {
        self.get(id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    /// Ids of all live sessions
    pub fn ids(&self) -> Vec<String> {
        self.sessions
            .read()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Live(_)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every session and empty the registry
    pub async fn close_all(&self) {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .write()
            .drain()
            .filter_map(|(_, slot)| match slot {
                Slot::Live(session) => Some(session),
                _ => None,
            })
            .collect();

        debug!("Closing {} sessions", sessions.len());
        join_all(sessions.iter().map(|session| session.stop())).await;
        info!("All sessions closed");
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Opening,
    Closing,
}

/// Removes a transitional slot when dropped.
///
/// Registration disarms it once the session is stored. Unregistration always
/// lets it run, so a dropped `unregister` cannot leave its id behind.
struct Release<'a> {
    registry: &'a Registry,
    id: String,
    phase: Phase,
    armed: bool,
    finished: bool,
}

impl<'a> Release<'a> {
    fn new(registry: &'a Registry, id: &str, phase: Phase) -> Self {
        Self {
            registry,
            id: id.to_string(),
            phase,
            armed: true,
            finished: false,
        }
    }

    /// Keep the slot as it is now
    fn disarm(mut self) {
        self.armed = false;
    }

    /// Remove the slot after the transition completed normally
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut sessions = self.registry.sessions.write();
        let held = matches!(
            (sessions.get(&self.id), self.phase),
            (Some(Slot::Opening), Phase::Opening) | (Some(Slot::Closing), Phase::Closing)
        );
        if !held {
            return;
        }
        sessions.remove(&self.id);

        if !self.finished {
            match self.phase {
                Phase::Opening => warn!(id = %self.id, "Registration abandoned"),
                Phase::Closing => warn!(id = %self.id, "Unregister abandoned before the session stopped"),
            }
        }
    }
}

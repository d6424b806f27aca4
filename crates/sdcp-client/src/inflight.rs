//! In-flight request table

use dashmap::DashMap;
use sdcp_core::Response;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::{ClientError, Result};

struct Entry {
    tx: Option<oneshot::Sender<Response<Value>>>,
}

/// Outstanding requests keyed by `RequestID`
#[derive(Default)]
pub(crate) struct InFlight {
    entries: DashMap<String, Entry>,
}

impl InFlight {
    /// Reserve a fresh request id. The entry lives as long as the returned guard.
    pub fn register(&self) -> Pending<'_> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let (tx, rx) = oneshot::channel();
        self.entries.insert(id.clone(), Entry { tx: Some(tx) });
        Pending {
            table: self,
            id,
            rx,
        }
    }

    /// Hand a response to its waiter. Returns false for unknown ids.
    pub fn complete(&self, response: Response<Value>) -> bool {
        let Some(mut entry) = self.entries.get_mut(response.request_id()) else {
            return false;
        };
        match entry.tx.take() {
            Some(tx) => {
                // The waiter may have just given up; its guard removes the entry.
                let _ = tx.send(response);
            }
            None => warn!(request = %entry.key(), "Duplicate response dropped"),
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A registered request waiting for its response
pub(crate) struct Pending<'a> {
    table: &'a InFlight,
    id: String,
    rx: oneshot::Receiver<Response<Value>>,
}

impl Pending<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn response(&mut self) -> Result<Response<Value>> {
        (&mut self.rx).await.map_err(|_| ClientError::SessionClosed)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.table.entries.remove(&self.id);
    }
}

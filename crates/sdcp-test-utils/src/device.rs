//! Printer simulator

use parking_lot::Mutex;
use sdcp_core::{
    encode, Attributes, AttributesMessage, CommandCode, Request, Response, ResponseData, Status,
    StatusMessage, Topics,
};
use sdcp_transport::{
    FrameListener, FrameReceiver, FrameSender, TransportEvent, WebSocketSender, WebSocketServer,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::eventually;

struct State {
    topics: Topics,
    id: String,
    status: Mutex<Status>,
    attributes: Mutex<Attributes>,
    replies: Mutex<HashMap<CommandCode, Value>>,
    requests: Mutex<Vec<Request<Value>>>,
    connections: Mutex<Vec<Arc<WebSocketSender>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Neither answer nor push
    silent: AtomicBool,
    /// Answer but never push
    no_pushes: AtomicBool,
    /// Responses are held until this many are queued, then sent newest first
    reorder: AtomicUsize,
}

/// An SDCP printer on `127.0.0.1:<ephemeral>`.
///
/// By default every request is acknowledged with `{"Ack": 0}`, and a status
/// or attributes refresh is followed by a push of the configured snapshot.
pub struct FakeDevice {
    port: u16,
    state: Arc<State>,
    handle: Option<JoinHandle<()>>,
}

impl FakeDevice {
    /// Start a simulator for the printer with mainboard id `id`
    pub async fn start(id: &str) -> Self {
        let server = WebSocketServer::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let attributes = Attributes {
            name: "Fake Saturn".to_string(),
            model: "Saturn 4 Ultra".to_string(),
            brand_name: "ELEGOO".to_string(),
            mainboard_ip: "127.0.0.1".to_string(),
            mainboard_id: id.to_string(),
            maximum_video_stream_allowed: 1,
            ..Default::default()
        };

        let state = Arc::new(State {
            topics: Topics::new(id),
            id: id.to_string(),
            status: Mutex::new(Status::default()),
            attributes: Mutex::new(attributes),
            replies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            connections: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            silent: AtomicBool::new(false),
            no_pushes: AtomicBool::new(false),
            reorder: AtomicUsize::new(1),
        });

        let handle = tokio::spawn(accept_loop(server, state.clone()));

        Self {
            port,
            state,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    /// Snapshot pushed after every status refresh
    pub fn set_status(&self, status: Status) {
        *self.state.status.lock() = status;
    }

    /// Snapshot pushed after every attributes refresh
    pub fn set_attributes(&self, attributes: Attributes) {
        *self.state.attributes.lock() = attributes;
    }

    /// Answer `cmd` with `payload` instead of a bare ack
    pub fn set_reply(&self, cmd: CommandCode, payload: Value) {
        self.state.replies.lock().insert(cmd, payload);
    }

    /// Stop answering and pushing altogether
    pub fn set_silent(&self, silent: bool) {
        self.state.silent.store(silent, Ordering::SeqCst);
    }

    /// Keep acknowledging refreshes but never push the snapshot
    pub fn set_pushes(&self, enabled: bool) {
        self.state.no_pushes.store(!enabled, Ordering::SeqCst);
    }

    /// Hold responses until `batch` are queued, then send them in reverse order
    pub fn reorder_responses(&self, batch: usize) {
        self.state.reorder.store(batch.max(1), Ordering::SeqCst);
    }

    /// Push a status snapshot to every connected session right now
    pub async fn push_status(&self, status: Status) {
        self.set_status(status);
        for sender in self.senders() {
            push_status(&self.state, &sender).await;
        }
    }

    /// Push an arbitrary frame to every connected session
    pub async fn push_raw(&self, frame: &str) {
        for sender in self.senders() {
            let _ = sender.send(frame.to_string().into()).await;
        }
    }

    /// Close every connection
    pub async fn disconnect(&self) {
        let senders: Vec<_> = self.state.connections.lock().drain(..).collect();
        for sender in senders {
            let _ = sender.close().await;
        }
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<Request<Value>> {
        self.state.requests.lock().clone()
    }

    /// Number of received requests with command `cmd`
    pub fn count(&self, cmd: CommandCode) -> usize {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.data.cmd == cmd)
            .count()
    }

    /// Number of open connections
    pub fn connections(&self) -> usize {
        self.state
            .connections
            .lock()
            .iter()
            .filter(|s| s.is_open())
            .count()
    }

    /// Wait until at least `n` requests with command `cmd` have arrived
    pub async fn wait_for_requests(&self, cmd: CommandCode, n: usize, max_wait: Duration) -> bool {
        eventually(max_wait, || self.count(cmd) >= n).await
    }

    fn senders(&self) -> Vec<Arc<WebSocketSender>> {
        self.state.connections.lock().clone()
    }

    /// Stop the simulator explicitly (also happens on drop)
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        for task in self.state.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(mut server: WebSocketServer, state: Arc<State>) {
    loop {
        match server.accept().await {
            Ok((sender, receiver, addr)) => {
                debug!("Fake printer {} accepted {}", state.id, addr);
                let sender = Arc::new(sender);
                state.connections.lock().push(sender.clone());
                let task = tokio::spawn(serve(state.clone(), sender, receiver));
                state.tasks.lock().push(task);
            }
            Err(e) => warn!("Fake printer accept failed: {}", e),
        }
    }
}

async fn serve<R: FrameReceiver>(state: Arc<State>, sender: Arc<WebSocketSender>, mut receiver: R) {
    let mut held = Vec::new();

    while let Some(event) = receiver.recv().await {
        let data = match event {
            TransportEvent::Frame(data) => data,
            TransportEvent::Closed { .. } => break,
            _ => continue,
        };

        let request: Request<Value> = match serde_json::from_slice(&data) {
            Ok(request) => request,
            Err(e) => {
                warn!("Fake printer got an unreadable request: {}", e);
                continue;
            }
        };
        state.requests.lock().push(request.clone());

        if state.silent.load(Ordering::SeqCst) {
            continue;
        }

        let cmd = request.data.cmd;
        let payload = state
            .replies
            .lock()
            .get(&cmd)
            .cloned()
            .unwrap_or_else(|| default_reply(cmd));

        let response = Response {
            topic: state.topics.response.clone(),
            id: request.id.clone(),
            data: ResponseData {
                cmd,
                data: payload,
                request_id: request.data.request_id.clone(),
                mainboard_id: state.id.clone(),
                timestamp: sdcp_core::time::now(),
            },
        };
        held.push(encode(&response).unwrap());

        if held.len() >= state.reorder.load(Ordering::SeqCst) {
            for frame in held.drain(..).rev() {
                let _ = sender.send(frame).await;
            }
        }

        if state.no_pushes.load(Ordering::SeqCst) {
            continue;
        }

        match cmd {
            CommandCode::StatusRefresh => push_status(&state, &sender).await,
            CommandCode::Attributes => push_attributes(&state, &sender).await,
            _ => {}
        }
    }
}

fn default_reply(cmd: CommandCode) -> Value {
    match cmd {
        CommandCode::VideoStream => json!({"Ack": 0, "VideoUrl": "rtsp://127.0.0.1:554/video"}),
        CommandCode::RetrieveHistoricalTasks => json!({"Ack": 0, "HistoryData": []}),
        _ => json!({"Ack": 0}),
    }
}

async fn push_status(state: &State, sender: &WebSocketSender) {
    let message = StatusMessage {
        topic: state.topics.status.clone(),
        status: state.status.lock().clone(),
        mainboard_id: state.id.clone(),
        timestamp: sdcp_core::time::now(),
    };
    let _ = sender.send(encode(&message).unwrap()).await;
}

async fn push_attributes(state: &State, sender: &WebSocketSender) {
    let message = AttributesMessage {
        topic: state.topics.attributes.clone(),
        attributes: state.attributes.lock().clone(),
        mainboard_id: state.id.clone(),
        timestamp: sdcp_core::time::now(),
    };
    let _ = sender.send(encode(&message).unwrap()).await;
}

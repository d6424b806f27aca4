//! One printer, one WebSocket
//!
//! A session runs two background tasks for as long as its connection is
//! open: the dispatcher, the single reader of the connection, and the
//! refresher, which asks for fresh status and attributes on a timer. Both
//! live under the session's cancellation token and are joined by [`Session::stop`].

use parking_lot::Mutex;
use sdcp_core::{
    decode_inbound, encode, AckResponse, Attributes, AttributesRefreshRequest,
    ChangePrinterNameRequest, Command, FilePath, Inbound, PausePrintRequest, Request,
    RequestData, ResumePrintRequest, RetrieveFileListRequest, RetrieveFileListResponse,
    RetrieveHistoricalTasksRequest, RetrieveTaskDetailsRequest, Source, StartPrintRequest,
    StartPrintResponse, Status, StatusRefreshRequest, StopPrintRequest, TaskDetails,
    TimeLapseRequest, Topics, VideoStreamRequest, VideoStreamResponse, CLIENT_IDENTIFIER,
};
use sdcp_transport::{
    FrameReceiver, FrameSender, TransportEvent, WebSocketReceiver, WebSocketSender,
    WebSocketTransport,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::builder::{SessionBuilder, SessionConfig};
use crate::cache::StateCache;
use crate::error::{ClientError, Result};
use crate::inflight::InFlight;

/// State shared between the session handle and its background tasks
struct Shared {
    id: String,
    topics: Topics,
    sender: WebSocketSender,
    inflight: InFlight,
    status: StateCache<Status>,
    attributes: StateCache<Attributes>,
    /// Cancelled by `stop`, or by the dispatcher when the connection fails
    shutdown: CancellationToken,
}

/// A live connection to one printer
pub struct Session {
    shared: Arc<Shared>,
    address: String,
    endpoint: String,
    config: SessionConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("address", &self.address)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a builder
    pub fn builder(id: &str, address: &str) -> SessionBuilder {
        SessionBuilder::new(id, address)
    }

    /// Dial the printer, start dispatching, then handshake status and attributes
    pub(crate) async fn open(
        id: &str,
        address: &str,
        config: SessionConfig,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let endpoint = config.endpoint(address);

        let (sender, receiver) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            dialed = WebSocketTransport::connect_with_config(&endpoint, &config.websocket) => {
                dialed.map_err(|e| ClientError::Dial {
                    url: endpoint.clone(),
                    reason: e.to_string(),
                })?
            }
        };

        let shared = Arc::new(Shared {
            id: id.to_string(),
            topics: Topics::new(id),
            sender,
            inflight: InFlight::default(),
            status: StateCache::new(),
            attributes: StateCache::new(),
            shutdown: CancellationToken::new(),
        });

        // Dispatch must be running before the first request goes out
        let dispatcher = tokio::spawn(dispatch(shared.clone(), receiver));

        let session = Self {
            shared,
            address: address.to_string(),
            endpoint,
            tasks: Mutex::new(vec![dispatcher]),
            config,
        };

        let limit = session.config.handshake_timeout;

        if let Err(e) = bounded(limit, session.refresh_status_and_wait(cancel)).await {
            warn!(id = %id, "Status handshake failed: {}", e);
            session.stop().await;
            return Err(ClientError::StatusHandshake(Box::new(e)));
        }

        if let Err(e) = bounded(limit, session.refresh_attributes_and_wait(cancel)).await {
            warn!(id = %id, "Attributes handshake failed: {}", e);
            session.stop().await;
            return Err(ClientError::AttributesHandshake(Box::new(e)));
        }

        let refresher = tokio::spawn(refresh(
            session.shared.clone(),
            session.config.refresh_interval,
        ));
        session.tasks.lock().push(refresher);

        info!(id = %id, endpoint = %session.endpoint, "Session established");
        Ok(session)
    }

    /// Mainboard id
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Address the session was opened with
    pub fn address(&self) -> &str {
        &self.address
    }

    /// WebSocket URL the session is connected to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether the connection is still usable.
    ///
    /// Turns false after `stop` or once the dispatcher has lost the connection.
    pub fn is_alive(&self) -> bool {
        !self.shared.shutdown.is_cancelled()
    }

    /// Resolves once the session has stopped or lost its connection
    pub async fn closed(&self) {
        self.shared.shutdown.cancelled().await
    }

    /// Number of requests still waiting for a response
    pub fn pending_requests(&self) -> usize {
        self.shared.inflight.len()
    }

    /// Send a command and wait for its response
    pub async fn call<C: Command>(
        &self,
        request: C,
        cancel: &CancellationToken,
    ) -> Result<C::Response> {
        self.shared.call(request, cancel).await
    }

    /// Ask for a status push. Only the acknowledgement is returned.
    pub async fn status_refresh(&self, cancel: &CancellationToken) -> Result<AckResponse> {
        self.call(StatusRefreshRequest {}, cancel).await
    }

    /// Ask for an attributes push. Only the acknowledgement is returned.
    pub async fn attributes_refresh(&self, cancel: &CancellationToken) -> Result<AckResponse> {
        self.call(AttributesRefreshRequest {}, cancel).await
    }

    /// Request a status push and return it once it arrives
    pub async fn refresh_status_and_wait(&self, cancel: &CancellationToken) -> Result<Status> {
        self.shared
            .refresh_and_wait(StatusRefreshRequest {}, &self.shared.status, cancel)
            .await
    }

    /// Request an attributes push and return it once it arrives
    pub async fn refresh_attributes_and_wait(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Attributes> {
        self.shared
            .refresh_and_wait(AttributesRefreshRequest {}, &self.shared.attributes, cancel)
            .await
    }

    /// Last pushed status
    pub fn current_status(&self) -> Status {
        self.shared.status.current()
    }

    /// Last pushed attributes
    pub fn current_attributes(&self) -> Attributes {
        self.shared.attributes.current()
    }

    /// Follow status pushes as they arrive
    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.shared.status.subscribe()
    }

    /// Follow attributes pushes as they arrive
    pub fn subscribe_attributes(&self) -> watch::Receiver<Attributes> {
        self.shared.attributes.subscribe()
    }

    /// Enable or disable the camera stream
    pub async fn set_video_stream(
        &self,
        enable: bool,
        cancel: &CancellationToken,
    ) -> Result<VideoStreamResponse> {
        self.call(VideoStreamRequest { enable: enable.into() }, cancel)
            .await
    }

    /// Enable or disable time-lapse recording
    pub async fn set_time_lapse(
        &self,
        enable: bool,
        cancel: &CancellationToken,
    ) -> Result<AckResponse> {
        self.call(TimeLapseRequest { enable: enable.into() }, cancel)
            .await
    }

    /// Start printing `filename` from `start_layer`
    pub async fn start_print(
        &self,
        filename: &str,
        start_layer: u32,
        cancel: &CancellationToken,
    ) -> Result<StartPrintResponse> {
        let request = StartPrintRequest {
            filename: filename.to_string(),
            start_layer,
        };
        self.call(request, cancel).await
    }

    pub async fn pause_print(&self, cancel: &CancellationToken) -> Result<AckResponse> {
        self.call(PausePrintRequest {}, cancel).await
    }

    pub async fn resume_print(&self, cancel: &CancellationToken) -> Result<AckResponse> {
        self.call(ResumePrintRequest {}, cancel).await
    }

    pub async fn stop_print(&self, cancel: &CancellationToken) -> Result<AckResponse> {
        self.call(StopPrintRequest {}, cancel).await
    }

    /// Change the name shown on the printer
    pub async fn rename(&self, name: &str, cancel: &CancellationToken) -> Result<AckResponse> {
        let request = ChangePrinterNameRequest {
            name: name.to_string(),
        };
        self.call(request, cancel).await
    }

    /// List a folder on one of the printer's volumes
    pub async fn file_list(
        &self,
        path: &FilePath,
        cancel: &CancellationToken,
    ) -> Result<RetrieveFileListResponse> {
        let request = RetrieveFileListRequest { url: path.clone() };
        self.call(request, cancel).await
    }

    /// Ids of past print tasks
    pub async fn history(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let response = self.call(RetrieveHistoricalTasksRequest {}, cancel).await?;
        Ok(response.history_data)
    }

    /// Details of the given past print tasks
    pub async fn task_details(
        &self,
        ids: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<TaskDetails>> {
        let response = self
            .call(RetrieveTaskDetailsRequest { id: ids }, cancel)
            .await?;
        Ok(response.history_detail_list)
    }

    /// Cancel both background tasks, close the connection and wait for the tasks to exit
    pub async fn stop(&self) {
        self.shared.shutdown.cancel();
        let _ = self.shared.sender.close().await;

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(id = %self.shared.id, "Session task panicked: {}", e);
                }
            }
        }

        debug!(id = %self.shared.id, "Session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl Shared {
    async fn call<C: Command>(&self, request: C, cancel: &CancellationToken) -> Result<C::Response> {
        // Registered before the write so a fast reply always finds its entry
        let mut pending = self.inflight.register();
        let request_id = pending.id().to_string();

        let frame = Request {
            topic: self.topics.request.clone(),
            id: CLIENT_IDENTIFIER.to_string(),
            data: RequestData {
                cmd: C::CODE,
                data: request,
                request_id: request_id.clone(),
                mainboard_id: self.id.clone(),
                timestamp: sdcp_core::time::now(),
                from: Source::LocalPc,
            },
        };
        let bytes = encode(&frame).map_err(|e| ClientError::SendFailed(e.to_string()))?;

        debug!(id = %self.id, request = %request_id, cmd = ?C::CODE, "Sending request");

        let exchange = async {
            self.sender
                .send(bytes)
                .await
                .map_err(|e| ClientError::SendFailed(e.to_string()))?;
            pending.response().await
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            _ = self.shutdown.cancelled() => Err(ClientError::SessionClosed),
            response = exchange => response,
        }?;

        Ok(response.into_payload()?)
    }

    async fn refresh_and_wait<C, T>(
        &self,
        request: C,
        cache: &StateCache<T>,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        C: Command<Response = AckResponse>,
        T: Clone,
    {
        // Subscribe first: the push may beat the response
        let mut updates = cache.subscribe();

        let ack = self.call(request, cancel).await?;
        if !ack.is_ok() {
            warn!(id = %self.id, ack = ack.ack, cmd = ?C::CODE, "Refresh not acknowledged");
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            _ = self.shutdown.cancelled() => Err(ClientError::SessionClosed),
            changed = updates.changed() => match changed {
                Ok(()) => Ok(updates.borrow_and_update().clone()),
                Err(_) => Err(ClientError::SessionClosed),
            },
        }
    }

    fn handle(&self, inbound: Inbound) {
        match inbound {
            Inbound::Response(response) => {
                let request_id = response.request_id().to_string();
                debug!(id = %self.id, request = %request_id, cmd = ?response.data.cmd, "Response received");
                if !self.inflight.complete(response) {
                    warn!(id = %self.id, request = %request_id, "Response for unknown request dropped");
                }
            }
            Inbound::Status(message) => {
                if !message.mainboard_id.is_empty() && message.mainboard_id != self.id {
                    debug!(id = %self.id, board = %message.mainboard_id, "Status push names another board");
                }
                debug!(id = %self.id, "Status updated");
                self.status.publish(message.status);
            }
            Inbound::Attributes(message) => {
                debug!(id = %self.id, "Attributes updated");
                self.attributes.publish(message.attributes);
            }
            Inbound::Error(message) => {
                warn!(id = %self.id, code = ?message.data.data.error_code, "Printer reported an error");
            }
            Inbound::Notice(message) => {
                let notice = message.data.data;
                info!(id = %self.id, kind = ?notice.kind, "Printer notice: {}", notice.message);
            }
            Inbound::Other(topic) if topic == self.topics.request => {}
            Inbound::Other(topic) => {
                warn!(id = %self.id, topic = %topic, "Message on unknown topic dropped");
            }
        }
    }
}

/// Bound a handshake step
async fn bounded<T>(limit: Duration, step: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, step)
        .await
        .unwrap_or(Err(ClientError::Timeout(limit)))
}

/// Single reader of the connection. Ends the session when the stream breaks.
async fn dispatch(shared: Arc<Shared>, mut receiver: WebSocketReceiver) {
    loop {
        let event = tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            event = receiver.recv() => event,
        };

        match event {
            Some(TransportEvent::Frame(data)) => match decode_inbound(&shared.topics, &data) {
                Ok(inbound) => shared.handle(inbound),
                Err(e) if e.is_envelope() => {
                    error!(id = %shared.id, "Unreadable frame, closing session: {}", e);
                    break;
                }
                Err(e) => warn!(id = %shared.id, "Dropping malformed message: {}", e),
            },
            Some(TransportEvent::Closed { reason }) => {
                error!(id = %shared.id, "Connection lost: {:?}", reason);
                break;
            }
            Some(TransportEvent::Error(e)) => {
                error!(id = %shared.id, "Connection error: {}", e);
            }
            Some(TransportEvent::Opened) => {}
            None => {
                error!(id = %shared.id, "Connection lost");
                break;
            }
        }
    }

    // Wake every pending call and stop the refresher
    shared.shutdown.cancel();
}

/// Periodic status and attributes refresh; failures are only logged
async fn refresh(shared: Arc<Shared>, every: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let never = CancellationToken::new();

    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        debug!(id = %shared.id, "Periodic refresh");

        match tokio::time::timeout(every, shared.call(StatusRefreshRequest {}, &never)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(id = %shared.id, "Periodic status refresh failed: {}", e),
            Err(_) => warn!(id = %shared.id, "Periodic status refresh timed out"),
        }

        match tokio::time::timeout(every, shared.call(AttributesRefreshRequest {}, &never)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(id = %shared.id, "Periodic attributes refresh failed: {}", e),
            Err(_) => warn!(id = %shared.id, "Periodic attributes refresh timed out"),
        }
    }
}

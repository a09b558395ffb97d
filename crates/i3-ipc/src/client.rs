//! i3 IPC client implementation
//!
//! This module provides the `I3Client` for communicating with the i3 window
//! manager. The client handles socket discovery, the request/reply exchange
//! and the ordering of events that arrive while a reply is pending.

use std::ffi::OsString;
use std::io;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ErrorKind, I3Error};
use crate::events::{Callback, CallbackRegistry, Event, EventCategory, EventQueue, QueueItem};
use crate::message::{read_frame, write_frame, MessageType};
use crate::parser::{parse_event, parse_reply, Reply};
use crate::types::{
    BarConfig, BindingEvent, ModeEvent, Node, Output, OutputEvent, ShutdownEvent, TickEvent,
    Version, WindowEvent, Workspace, WorkspaceEvent,
};

/// Environment variable name for the i3 socket path
const I3SOCK_ENV: &str = "I3SOCK";

/// Discover the i3 IPC socket path
///
/// Uses `$I3SOCK` when it is set and non-empty, otherwise asks the `i3`
/// binary via `i3 --get-socketpath`. The resulting path must exist.
///
/// # Errors
///
/// Returns `I3Error::SocketPathUnavailable` if neither source yields a path.
/// Returns `I3Error::SocketNotFound` if the path doesn't exist.
pub async fn get_socket_path() -> Result<PathBuf, I3Error> {
    let socket_path = match std::env::var_os(I3SOCK_ENV).filter(|value| !value.is_empty()) {
        Some(value) => PathBuf::from(value),
        None => query_socket_path().await?,
    };

    if !socket_path.exists() {
        return Err(I3Error::SocketNotFound { path: socket_path });
    }

    Ok(socket_path)
}

async fn query_socket_path() -> Result<PathBuf, I3Error> {
    let output = Command::new("i3")
        .arg("--get-socketpath")
        .output()
        .await
        .map_err(|e| I3Error::SocketPathUnavailable {
            reason: format!("failed to run `i3 --get-socketpath`: {}", e),
        })?;

    if !output.status.success() {
        return Err(I3Error::SocketPathUnavailable {
            reason: format!("`i3 --get-socketpath` exited with {}", output.status),
        });
    }

    let mut stdout = output.stdout;
    while stdout.last() == Some(&b'\n') {
        stdout.pop();
    }
    if stdout.is_empty() {
        return Err(I3Error::SocketPathUnavailable {
            reason: "`i3 --get-socketpath` printed nothing".to_string(),
        });
    }

    Ok(PathBuf::from(OsString::from_vec(stdout)))
}

/// Client for communicating with i3 via IPC
///
/// Requests and events share one connection. Events that arrive while a
/// request or subscription is waiting for its reply are queued and handed out
/// later by [`handle_next_event`](Self::handle_next_event), in the order i3
/// sent them.
///
/// # Cancellation
///
/// Bound waits by wrapping calls in `tokio::time::timeout` or similar. A
/// call dropped while a message exchange is unfinished leaves the connection
/// out of step with i3: the rest of a frame, or a stale reply, may still be
/// on its way. Every later operation then fails with `I3Error::ReceiveFailed`
/// of kind `Interrupted` until the client is reconnected.
///
/// # Example
///
/// ```ignore
/// let mut client = I3Client::connect().await?;
/// client.on_tick_event(|tick| println!("tick: {:?}", tick.payload)).await?;
/// client.send_tick(Some("hello")).await?;
/// loop {
///     client.handle_next_event().await?;
/// }
/// ```
#[derive(Debug)]
pub struct I3Client<S = UnixStream> {
    /// The connection, `None` once closed
    stream: Option<S>,
    /// The socket path, if the client was connected by path
    socket_path: Option<PathBuf>,
    queue: EventQueue,
    callbacks: CallbackRegistry,
    /// Set while a frame exchange is unfinished, still set if it was dropped
    in_flight: bool,
}

impl I3Client<UnixStream> {
    /// Discover the i3 socket and connect to it
    ///
    /// # Errors
    ///
    /// Returns the discovery errors of [`get_socket_path`].
    /// Returns `I3Error::ConnectionFailed` if the connection fails.
    pub async fn connect() -> Result<Self, I3Error> {
        let socket_path = get_socket_path().await?;
        Self::connect_to(socket_path).await
    }

    /// Connect to the i3 socket at `path`
    pub async fn connect_to(path: impl AsRef<Path>) -> Result<Self, I3Error> {
        let socket_path = path.as_ref().to_path_buf();
        let stream = open(&socket_path).await?;

        debug!(path = %socket_path.display(), "Connected to i3");

        Ok(Self {
            stream: Some(stream),
            socket_path: Some(socket_path),
            queue: EventQueue::default(),
            callbacks: CallbackRegistry::default(),
            in_flight: false,
        })
    }

    /// Replace the connection with a fresh one to `path`
    ///
    /// Queued events and installed callbacks belong to the old connection and
    /// are dropped. On failure the client keeps its previous state.
    pub async fn reconnect(&mut self, path: impl AsRef<Path>) -> Result<(), I3Error> {
        let socket_path = path.as_ref().to_path_buf();
        let stream = open(&socket_path).await?;

        if let Err(e) = self.close().await {
            debug!(error = %e, "Failed to shut down previous i3 connection");
        }
        self.stream = Some(stream);
        self.socket_path = Some(socket_path);
        self.queue.clear();
        self.callbacks = CallbackRegistry::default();
        self.in_flight = false;

        debug!(path = ?self.socket_path, "Reconnected to i3");
        Ok(())
    }
}

async fn open(socket_path: &Path) -> Result<UnixStream, I3Error> {
    UnixStream::connect(socket_path)
        .await
        .map_err(|e| I3Error::ConnectionFailed {
            path: socket_path.to_path_buf(),
            source: e,
        })
}

impl<S> I3Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already open connection
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream: Some(stream),
            socket_path: None,
            queue: EventQueue::default(),
            callbacks: CallbackRegistry::default(),
            in_flight: false,
        }
    }

    /// Path of the socket, `None` for clients built from a raw stream
    pub fn socket_path(&self) -> Option<&Path> {
        self.socket_path.as_deref()
    }

    /// Shut the connection down
    ///
    /// Calling this more than once is fine. Every later operation fails with
    /// a transport error.
    pub async fn close(&mut self) -> Result<(), I3Error> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await.map_err(I3Error::SendFailed)?;
            debug!("Closed i3 connection");
        }
        Ok(())
    }

    /// Refuse to touch a connection left mid-exchange by a cancelled call
    fn check_in_step(&self) -> Result<(), I3Error> {
        if self.in_flight {
            return Err(I3Error::ReceiveFailed(io::Error::new(
                io::ErrorKind::Interrupted,
                "a previous call was cancelled during a message exchange; reconnect to continue",
            )));
        }
        Ok(())
    }

    fn stream(&mut self) -> Result<&mut S, I3Error> {
        self.stream
            .as_mut()
            .ok_or_else(|| I3Error::SendFailed(io::ErrorKind::NotConnected.into()))
    }

    /// Send a request and wait for its reply
    ///
    /// Events read while waiting are queued. An event with an unsupported
    /// value is queued as its error, to be reported by `handle_next_event`;
    /// any other decoding failure is returned right away.
    async fn request(
        &mut self,
        message_type: MessageType,
        payload: &[u8],
    ) -> Result<Reply, I3Error> {
        self.check_in_step()?;
        self.in_flight = true;
        write_frame(self.stream()?, message_type, payload).await?;

        loop {
            let frame = read_frame(self.stream()?).await?;

            if frame.message_type == message_type {
                self.in_flight = false;
                return parse_reply(message_type, &frame.payload);
            }

            let Some(category) = frame.message_type.event_category() else {
                return Err(I3Error::bad_message(format!(
                    "Received reply of type {} while waiting for type {}",
                    frame.message_type.code(),
                    message_type.code()
                )));
            };

            match parse_event(category, &frame.payload) {
                Ok(event) => self.queue.push(QueueItem::Event(Ok(event))),
                Err(err) if err.kind() == ErrorKind::Unsupported => {
                    warn!(%category, error = %err, "Deferring undecodable i3 event");
                    self.queue.push(QueueItem::Event(Err(err)));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Subscribe to the callback's category and install it from this point on
    ///
    /// The subscription request is sent even when the category is already
    /// subscribed. Events that arrived before i3 acknowledged it still go to
    /// the callback that was installed before.
    ///
    /// # Errors
    ///
    /// Returns `I3Error::InvalidArgument` if i3 declines the subscription; the
    /// callback is not installed then.
    pub async fn subscribe(&mut self, callback: Callback) -> Result<(), I3Error> {
        let category = callback.category();
        let payload = serde_json::json!([category.subscription_name()]).to_string();

        match self
            .request(MessageType::Subscribe, payload.as_bytes())
            .await?
        {
            Reply::Subscribed => {
                debug!(%category, "Subscription acknowledged");
                self.queue.push(QueueItem::Install(callback));
                Ok(())
            }
            other => Err(unexpected_reply("subscribe", &other)),
        }
    }

    /// Handle workspace events with `f` from now on
    pub async fn on_workspace_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&WorkspaceEvent) + Send + 'static,
    {
        self.subscribe(Callback::workspace(f)).await
    }

    /// Handle output events with `f` from now on
    pub async fn on_output_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&OutputEvent) + Send + 'static,
    {
        self.subscribe(Callback::output(f)).await
    }

    /// Handle binding mode changes with `f` from now on
    pub async fn on_mode_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&ModeEvent) + Send + 'static,
    {
        self.subscribe(Callback::mode(f)).await
    }

    /// Handle window events with `f` from now on
    pub async fn on_window_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&WindowEvent) + Send + 'static,
    {
        self.subscribe(Callback::window(f)).await
    }

    /// Handle bar configuration updates with `f` from now on
    pub async fn on_bar_config_update_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&BarConfig) + Send + 'static,
    {
        self.subscribe(Callback::bar_config_update(f)).await
    }

    /// Handle triggered bindings with `f` from now on
    pub async fn on_binding_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&BindingEvent) + Send + 'static,
    {
        self.subscribe(Callback::binding(f)).await
    }

    /// Handle i3 restarting or exiting with `f` from now on
    pub async fn on_shutdown_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&ShutdownEvent) + Send + 'static,
    {
        self.subscribe(Callback::shutdown(f)).await
    }

    /// Handle tick events with `f` from now on
    pub async fn on_tick_event<F>(&mut self, f: F) -> Result<(), I3Error>
    where
        F: FnMut(&TickEvent) + Send + 'static,
    {
        self.subscribe(Callback::tick(f)).await
    }

    /// Deliver the next event to its callback
    ///
    /// Queued events come first, in arrival order; once the queue is empty
    /// this waits for the next event from i3. Returns the category of the
    /// event that was handled.
    ///
    /// # Errors
    ///
    /// Returns the deferred `I3Error::Unsupported` of a queued event when it
    /// is reached, `I3Error::BadMessage` for an event nobody subscribed to or
    /// a reply nobody asked for, and transport errors from the socket.
    pub async fn handle_next_event(&mut self) -> Result<EventCategory, I3Error> {
        loop {
            let event = match self.queue.pop() {
                Some(QueueItem::Install(callback)) => {
                    self.callbacks.install(callback);
                    continue;
                }
                Some(QueueItem::Event(event)) => event?,
                None => self.read_event().await?,
            };

            return self.dispatch(&event);
        }
    }

    async fn read_event(&mut self) -> Result<Event, I3Error> {
        self.check_in_step()?;
        self.in_flight = true;
        let frame = read_frame(self.stream()?).await?;
        self.in_flight = false;

        match frame.message_type.event_category() {
            Some(category) => parse_event(category, &frame.payload),
            None => Err(I3Error::bad_message(format!(
                "Received reply of type {} without a pending request",
                frame.message_type.code()
            ))),
        }
    }

    fn dispatch(&mut self, event: &Event) -> Result<EventCategory, I3Error> {
        let category = event.category();

        // An event that beat the very first acknowledgment of its category
        // goes to the callback that acknowledgment installs
        if !self.callbacks.is_installed(category) {
            if let Some(callback) = self.queue.take_install(category) {
                self.callbacks.install(callback);
            }
        }

        self.callbacks.dispatch(event)
    }

    /// Run one or more `;`-separated i3 commands
    ///
    /// An empty command string is a no-op and does not touch the socket.
    ///
    /// # Errors
    ///
    /// Returns `I3Error::InvalidArgument` describing the first command i3
    /// rejected.
    pub async fn run_command(&mut self, command: &str) -> Result<(), I3Error> {
        if command.is_empty() {
            return Ok(());
        }

        match self
            .request(MessageType::RunCommand, command.as_bytes())
            .await?
        {
            Reply::Command => Ok(()),
            other => Err(unexpected_reply("run_command", &other)),
        }
    }

    /// Query all workspaces
    pub async fn get_workspaces(&mut self) -> Result<Vec<Workspace>, I3Error> {
        match self.request(MessageType::GetWorkspaces, b"").await? {
            Reply::Workspaces(workspaces) => Ok(workspaces),
            other => Err(unexpected_reply("get_workspaces", &other)),
        }
    }

    /// Query all outputs, including inactive ones
    pub async fn get_outputs(&mut self) -> Result<Vec<Output>, I3Error> {
        match self.request(MessageType::GetOutputs, b"").await? {
            Reply::Outputs(outputs) => Ok(outputs),
            other => Err(unexpected_reply("get_outputs", &other)),
        }
    }

    /// Query the whole layout tree, rooted at the X11 root container
    pub async fn get_tree(&mut self) -> Result<Node, I3Error> {
        match self.request(MessageType::GetTree, b"").await? {
            Reply::Tree(tree) => Ok(tree),
            other => Err(unexpected_reply("get_tree", &other)),
        }
    }

    /// Query every mark set on any container
    pub async fn get_marks(&mut self) -> Result<Vec<String>, I3Error> {
        match self.request(MessageType::GetMarks, b"").await? {
            Reply::Marks(marks) => Ok(marks),
            other => Err(unexpected_reply("get_marks", &other)),
        }
    }

    /// List the ids of all configured bars
    pub async fn get_bar_ids(&mut self) -> Result<Vec<String>, I3Error> {
        match self.request(MessageType::GetBarConfig, b"").await? {
            Reply::BarIds(ids) => Ok(ids),
            other => Err(unexpected_reply("get_bar_ids", &other)),
        }
    }

    /// Query the configuration of the bar with the given id
    ///
    /// # Errors
    ///
    /// Returns `I3Error::InvalidArgument` naming `id` if i3 has no such bar.
    pub async fn get_bar_config(&mut self, id: &str) -> Result<BarConfig, I3Error> {
        let reply = self
            .request(MessageType::GetBarConfig, id.as_bytes())
            .await
            .map_err(|err| match err {
                I3Error::InvalidArgument { .. } => {
                    I3Error::invalid_argument(format!("i3 has no bar with ID \"{}\"", id))
                }
                other => other,
            })?;

        match reply {
            Reply::BarConfig(config) => Ok(config),
            other => Err(unexpected_reply("get_bar_config", &other)),
        }
    }

    /// Query the running i3 version
    pub async fn get_version(&mut self) -> Result<Version, I3Error> {
        match self.request(MessageType::GetVersion, b"").await? {
            Reply::Version(version) => Ok(version),
            other => Err(unexpected_reply("get_version", &other)),
        }
    }

    /// Query the names of all configured binding modes
    pub async fn get_binding_modes(&mut self) -> Result<Vec<String>, I3Error> {
        match self.request(MessageType::GetBindingModes, b"").await? {
            Reply::BindingModes(modes) => Ok(modes),
            other => Err(unexpected_reply("get_binding_modes", &other)),
        }
    }

    /// Query the text of the last loaded configuration file
    pub async fn get_config(&mut self) -> Result<String, I3Error> {
        match self.request(MessageType::GetConfig, b"").await? {
            Reply::Config(config) => Ok(config),
            other => Err(unexpected_reply("get_config", &other)),
        }
    }

    /// Broadcast a tick event to every client subscribed to ticks
    pub async fn send_tick(&mut self, payload: Option<&str>) -> Result<(), I3Error> {
        let payload = payload.unwrap_or_default();
        match self
            .request(MessageType::SendTick, payload.as_bytes())
            .await?
        {
            Reply::Tick => Ok(()),
            other => Err(unexpected_reply("send_tick", &other)),
        }
    }

    /// Ask i3 to send a sync client message with `random` to `window`
    pub async fn sync(&mut self, window: u32, random: u32) -> Result<(), I3Error> {
        let payload = serde_json::json!({ "window": window, "rnd": random }).to_string();
        match self.request(MessageType::Sync, payload.as_bytes()).await? {
            Reply::Sync => Ok(()),
            other => Err(unexpected_reply("sync", &other)),
        }
    }
}

/// A reply of the right type code but the wrong shape
fn unexpected_reply(request: &str, reply: &Reply) -> I3Error {
    I3Error::bad_message(format!(
        "Unexpected reply to {}: {} reply",
        request,
        reply.name()
    ))
}

// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Single-writer reconnecting TCP transport (§4.G).
//!
//! `OutboundSink` is the non-blocking producer side: pipelines, the
//! dispatcher, and the syslog sink all hold a clone and `try_send`
//! formatted wire lines or blobs onto a bounded channel. Exactly one task
//! — [`Transport::run`] — ever owns the socket, matching §5 "single
//! writer"; a sibling read loop only ever talks to the dispatcher via a
//! channel, never touches the write half.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hds_agent_domain::entities::Blob;
use hds_agent_domain::repositories::BlobSink;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use hds_agent_bootstrap::shutdown::CancellationToken;

use crate::infrastructure::dispatcher::CommandDispatcher;
use crate::infrastructure::state::AgentState;

/// Destination parsed from `-destination` (already validated by the CLI
/// layer into `(host, port)`); `None` means no network output.
pub type Destination = Option<(String, u16)>;

/// Non-blocking producer handle. Cheaply cloneable; every pipeline,
/// the dispatcher, and the syslog sink hold one.
#[derive(Clone)]
pub struct OutboundSink {
    tx: mpsc::Sender<String>,
    mirror_stdout: Arc<AtomicBool>,
}

impl OutboundSink {
    /// Enqueues a raw wire line (without trailing `\n`, which the writer
    /// adds). Drops on a full channel (§4.G "non-blocking send",
    /// §8 invariant 7) and mirrors to stdout if enabled, independent of
    /// transport state (§4.G "stdout mirror").
    pub fn try_send_line(&self, line: impl Into<String>) -> bool {
        let line = line.into();
        if self.mirror_stdout.load(Ordering::Relaxed) {
            println!("{line}");
        }
        self.tx.try_send(line).is_ok()
    }
}

impl OutboundSink {
    /// A sink with no `Transport` behind it, paired with the receiving
    /// half. Used by `-dry-run` (§4.I), which inspects the lines itself
    /// instead of writing them to a socket.
    pub fn detached(capacity: usize, mirror_stdout: bool) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                mirror_stdout: Arc::new(AtomicBool::new(mirror_stdout)),
            },
            rx,
        )
    }
}

#[cfg(test)]
impl OutboundSink {
    /// Test-only alias of [`OutboundSink::detached`] with stdout mirroring
    /// disabled, kept separate so call sites read as test setup.
    pub(crate) fn for_test(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        Self::detached(capacity, false)
    }
}

impl BlobSink for OutboundSink {
    fn try_send_blob(&self, blob: Blob) -> bool {
        match blob.to_wire_line() {
            Ok(line) => self.try_send_line(line),
            Err(err) => {
                tracing::warn!(error = %err, blob_type = %blob.type_tag, "failed to encode blob, dropping");
                false
            }
        }
    }
}

/// Capacity of the outbound channel: sized to the number of built-in
/// inventory collectors so one full sweep cannot be fully dropped under
/// steady state (§4.G). `inventory_collector_count` is the caller's
/// current registry size at startup.
pub fn channel_capacity(inventory_collector_count: usize) -> usize {
    inventory_collector_count.max(16)
}

pub struct Transport {
    destination: Destination,
    retrywait: Duration,
    drain_grace: Duration,
    rx: mpsc::Receiver<String>,
    sink: OutboundSink,
    state: Arc<AgentState>,
    dispatcher: Arc<CommandDispatcher>,
    shutdown: CancellationToken,
    pending: Option<String>,
}

impl Transport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        destination: Destination,
        retrywait: Duration,
        capacity: usize,
        mirror_stdout: bool,
        state: Arc<AgentState>,
        dispatcher: Arc<CommandDispatcher>,
        shutdown: CancellationToken,
        drain_grace: Duration,
    ) -> (Self, OutboundSink) {
        let (tx, rx) = mpsc::channel(capacity);
        let sink = OutboundSink {
            tx,
            mirror_stdout: Arc::new(AtomicBool::new(mirror_stdout)),
        };
        (
            Self {
                destination,
                retrywait,
                drain_grace,
                rx,
                sink: sink.clone(),
                state,
                dispatcher,
                shutdown,
                pending: None,
            },
            sink,
        )
    }

    /// Drives the DISCONNECTED → CONNECTING → HANDSHAKE → STREAMING state
    /// machine until the shutdown token fires. With no destination
    /// configured, this just drains (and optionally mirrors) the channel
    /// forever so producers never block on a full queue.
    pub async fn run(mut self) {
        let Some((host, port)) = self.destination.clone() else {
            self.drain_only().await;
            return;
        };

        loop {
            if self.shutdown.is_cancelled() {
                return;
            }

            match TcpStream::connect((host.as_str(), port)).await {
                Ok(stream) => {
                    tracing::info!(%host, port, "connected");
                    if self.stream_until_error(stream).await {
                        return;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "connection error");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.retrywait) => {}
                _ = self.shutdown.cancelled() => return,
            }
        }
    }

    async fn drain_only(&mut self) {
        loop {
            tokio::select! {
                _ = self.rx.recv() => {}
                _ = self.shutdown.cancelled() => return,
            }
        }
    }

    /// Returns `true` if shutdown was requested and the caller should
    /// stop reconnecting.
    async fn stream_until_error(&mut self, stream: TcpStream) -> bool {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        if let Err(err) = self.handshake(&mut write_half).await {
            tracing::warn!(error = %err, "handshake failed");
            return false;
        }

        if let Some(pending) = self.pending.take() {
            if write_half.write_all(format!("{pending}\n").as_bytes()).await.is_err() {
                self.pending = Some(pending);
                return false;
            }
        }

        let mut line = String::new();
        loop {
            tokio::select! {
                outbound = self.rx.recv() => {
                    match outbound {
                        Some(payload) => {
                            if write_half.write_all(format!("{payload}\n").as_bytes()).await.is_err() {
                                self.pending = Some(payload);
                                return false;
                            }
                        }
                        None => return true,
                    }
                }
                read_result = reader.read_line(&mut line) => {
                    match read_result {
                        Ok(0) => return false,
                        Ok(_) => {
                            self.dispatcher.dispatch_frame(line.trim_end(), &self.sink);
                            line.clear();
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "read error");
                            return false;
                        }
                    }
                }
                _ = self.shutdown.cancelled() => {
                    self.drain_within_grace(&mut write_half).await;
                    return true;
                }
            }
        }
    }

    /// Best-effort flush of whatever is already sitting in the outbound
    /// channel when shutdown fires, bounded by `drain_grace` (§9 "signal
    /// handling" redesign note: drain before closing the socket).
    async fn drain_within_grace(&mut self, write_half: &mut tokio::net::tcp::OwnedWriteHalf) {
        let deadline = tokio::time::Instant::now() + self.drain_grace;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return;
            }
            match tokio::time::timeout(remaining, self.rx.recv()).await {
                Ok(Some(payload)) => {
                    if write_half.write_all(format!("{payload}\n").as_bytes()).await.is_err() {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    async fn handshake(&self, write_half: &mut tokio::net::tcp::OwnedWriteHalf) -> std::io::Result<()> {
        write_half.write_all(format!("!nodeID {}\n", self.state.node_id).as_bytes()).await?;

        if let Ok(metadata) = serde_json::to_string(&serde_json::json!({"HostType": "hds-agent"})) {
            write_half.write_all(format!("!metadata {metadata}\n").as_bytes()).await?;
        }

        for header_line in self.state.header_snapshot() {
            write_half.write_all(format!("{header_line}\n").as_bytes()).await?;
        }
        for metadata_line in self.state.metadata_snapshot() {
            write_half.write_all(format!("{metadata_line}\n").as_bytes()).await?;
        }
        Ok(())
    }
}

/// Resolves `node.id` in `chdir`, creating a fresh one if absent or
/// malformed content would otherwise be a fatal config error (§6
/// "Persisted state", §8 invariant 5).
pub fn load_or_create_node_id(chdir: &PathBuf) -> std::io::Result<hds_agent_domain::value_objects::NodeId> {
    let path = chdir.join("node.id");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match hds_agent_domain::value_objects::NodeId::parse(contents.trim()) {
            Ok(node_id) => Ok(node_id),
            Err(_) => Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "node.id is malformed")),
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let node_id = hds_agent_domain::value_objects::NodeId::generate();
            std::fs::write(&path, node_id.as_str())?;
            Ok(node_id)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_capacity_has_a_floor() {
        assert_eq!(channel_capacity(0), 16);
        assert_eq!(channel_capacity(40), 40);
    }

    #[test]
    fn load_or_create_node_id_persists_a_fresh_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let first = load_or_create_node_id(&path).unwrap();
        let second = load_or_create_node_id(&path).unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn load_or_create_node_id_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("node.id"), "not-hex!!").unwrap();
        assert!(load_or_create_node_id(&dir.path().to_path_buf()).is_err());
    }
}

// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Connection supervision: the read loop and the reconnect loop.
//!
//! **Design**:
//! - The write half lives behind one async mutex shared with request writers. The supervisor
//!   holds it for the whole reconnect, so a writer either uses the old connection before the
//!   swap or waits and uses the new one.
//! - A single read task consumes the read half and resolves pending calls by identifier.
//! - Failures are signalled to the supervisor tagged with the connection epoch they were
//!   observed on, so a late signal about a replaced connection is ignored.
//! - New read halves are handed to the read task over a channel after each swap.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use super::{
    connector::{Connector, MessageReader, MessageWriter, WsConnection},
    error::WsApiError,
    messages::correlation_id,
    pending::PendingRegistry,
};
use crate::{backoff::ExponentialBackoff, mode::ConnectionMode};

/// The currently installed write half and the epoch it belongs to.
pub(crate) struct ActiveConnection {
    pub(crate) writer: Option<MessageWriter>,
    pub(crate) epoch: u64,
}

/// State shared between the client façade and the background tasks.
#[derive(Clone)]
pub(crate) struct ConnectionShared {
    pub(crate) connection: Arc<Mutex<ActiveConnection>>,
    pub(crate) pending: PendingRegistry,
    pub(crate) mode: Arc<AtomicU8>,
    pub(crate) reconnect_count: Arc<AtomicU64>,
    pub(crate) cancel: CancellationToken,
    reconnect_tx: mpsc::UnboundedSender<u64>,
}

impl ConnectionShared {
    pub(crate) fn connection_mode(&self) -> ConnectionMode {
        ConnectionMode::from_atomic(&self.mode)
    }

    /// Asks the supervisor to replace the connection of `epoch`.
    pub(crate) fn signal_reconnect(&self, epoch: u64) {
        if self.cancel.is_cancelled() || self.connection_mode().is_terminal() {
            return;
        }

        if let Err(e) = self.reconnect_tx.send(epoch) {
            tracing::error!("Failed to signal reconnect: {e}");
        }
    }
}

/// Reconnect policy applied by the supervisor.
#[derive(Debug)]
pub(crate) struct ReconnectPolicy {
    pub(crate) backoff: ExponentialBackoff,
    pub(crate) connect_timeout: Duration,
    pub(crate) fail_pending_on_disconnect: bool,
}

/// Handles to the running background tasks.
pub(crate) struct SupervisorTasks {
    pub(crate) shared: ConnectionShared,
    pub(crate) supervisor_task: tokio::task::JoinHandle<()>,
    pub(crate) read_task: tokio::task::JoinHandle<()>,
}

/// Installs `connection` as epoch 0 and spawns the supervisor and read tasks.
pub(crate) fn start(
    connection: WsConnection,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
) -> SupervisorTasks {
    let WsConnection { writer, reader } = connection;

    let (reconnect_tx, reconnect_rx) = mpsc::unbounded_channel::<u64>();
    let (established_tx, established_rx) = mpsc::unbounded_channel::<(u64, MessageReader)>();

    let shared = ConnectionShared {
        connection: Arc::new(Mutex::new(ActiveConnection {
            writer: Some(writer),
            epoch: 0,
        })),
        pending: PendingRegistry::new(),
        mode: Arc::new(AtomicU8::new(ConnectionMode::Active.as_u8())),
        reconnect_count: Arc::new(AtomicU64::new(0)),
        cancel: CancellationToken::new(),
        reconnect_tx,
    };

    let supervisor = ConnectionSupervisor {
        shared: shared.clone(),
        connector,
        policy,
        reconnect_rx,
        established_tx,
    };

    let supervisor_task = tokio::spawn(supervisor.run());
    let read_task = tokio::spawn(run_read_loop(
        shared.clone(),
        Some((0, reader)),
        established_rx,
    ));

    SupervisorTasks {
        shared,
        supervisor_task,
        read_task,
    }
}

struct ConnectionSupervisor {
    shared: ConnectionShared,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    reconnect_rx: mpsc::UnboundedReceiver<u64>,
    established_tx: mpsc::UnboundedSender<(u64, MessageReader)>,
}

impl ConnectionSupervisor {
    async fn run(mut self) {
        tracing::debug!("Started task 'supervisor'");

        loop {
            let epoch = tokio::select! {
                biased;
                () = self.shared.cancel.cancelled() => break,
                signal = self.reconnect_rx.recv() => match signal {
                    Some(epoch) => epoch,
                    None => break,
                },
            };

            let shared_connection = Arc::clone(&self.shared.connection);
            let mut connection = shared_connection.lock().await;

            if epoch != connection.epoch {
                tracing::trace!(
                    "Ignoring reconnect signal for epoch {epoch}, current is {}",
                    connection.epoch
                );
                continue;
            }

            if !self.reconnect(&mut connection).await {
                break;
            }
        }

        tracing::debug!("Completed task 'supervisor'");
    }

    /// Replaces the connection, retrying with backoff until success or cancellation.
    ///
    /// Returns false if cancelled.
    async fn reconnect(&mut self, connection: &mut ActiveConnection) -> bool {
        if !ConnectionMode::transition(
            &self.shared.mode,
            ConnectionMode::Active,
            ConnectionMode::Reconnect,
        ) {
            tracing::debug!("Not reconnecting, mode is {}", self.shared.connection_mode());
            return false;
        }
        tracing::warn!("Connection lost (epoch {}), reconnecting", connection.epoch);

        if self.policy.fail_pending_on_disconnect {
            let failed = self.shared.pending.fail_all(&WsApiError::ConnectionClosed);
            if failed > 0 {
                tracing::debug!("Failed {failed} pending call(s) on disconnect");
            }
        }

        // The old socket is dead; dropping the write half releases it
        connection.writer = None;

        let cancel = self.shared.cancel.clone();

        loop {
            let attempt = self.shared.reconnect_count.fetch_add(1, Ordering::SeqCst) + 1;
            let timeout = self.policy.connect_timeout;

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                result = tokio::time::timeout(timeout, self.connector.connect()) => result,
            };

            match result {
                Ok(Ok(new_connection)) => {
                    self.install(connection, new_connection);
                    tracing::info!("Reconnected (attempt {attempt})");
                    return true;
                }
                Ok(Err(e)) => tracing::warn!("Reconnect attempt {attempt} failed: {e}"),
                Err(_) => tracing::warn!(
                    "Reconnect attempt {attempt} timed out after {}s",
                    timeout.as_secs_f64()
                ),
            }

            let delay = self.policy.backoff.next_duration();
            if !delay.is_zero() {
                tracing::warn!("Backing off for {}s...", delay.as_secs_f64());
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn install(&mut self, connection: &mut ActiveConnection, new_connection: WsConnection) {
        let WsConnection { writer, reader } = new_connection;

        self.policy.backoff.reset();
        connection.epoch += 1;
        connection.writer = Some(writer);

        if let Err(e) = self.established_tx.send((connection.epoch, reader)) {
            tracing::error!("Failed to hand new connection to read task: {e}");
        }

        if !ConnectionMode::transition(
            &self.shared.mode,
            ConnectionMode::Reconnect,
            ConnectionMode::Active,
        ) {
            tracing::debug!(
                "Connection installed while mode is {}",
                self.shared.connection_mode()
            );
        }
    }
}

enum ReadEvent {
    Shutdown,
    Established(u64, MessageReader),
    Frame(Option<Result<Message, tungstenite::Error>>),
}

async fn next_frame(
    reader: &mut Option<(u64, MessageReader)>,
) -> Option<Result<Message, tungstenite::Error>> {
    match reader {
        Some((_, stream)) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn run_read_loop(
    shared: ConnectionShared,
    mut reader: Option<(u64, MessageReader)>,
    mut established_rx: mpsc::UnboundedReceiver<(u64, MessageReader)>,
) {
    tracing::debug!("Started task 'read'");

    loop {
        let event = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => ReadEvent::Shutdown,
            established = established_rx.recv() => match established {
                Some((epoch, stream)) => ReadEvent::Established(epoch, stream),
                None => ReadEvent::Shutdown,
            },
            frame = next_frame(&mut reader) => ReadEvent::Frame(frame),
        };

        match event {
            ReadEvent::Shutdown => break,
            ReadEvent::Established(epoch, stream) => {
                tracing::debug!("Reading from connection epoch {epoch}");
                reader = Some((epoch, stream));
            }
            ReadEvent::Frame(frame) => {
                if let Some(failed_epoch) = handle_frame(&shared.pending, reader.as_ref(), frame) {
                    reader = None;
                    shared.signal_reconnect(failed_epoch);
                }
            }
        }
    }

    tracing::debug!("Completed task 'read'");
}

/// Processes one frame, returning the epoch of the connection if it has failed.
fn handle_frame(
    pending: &PendingRegistry,
    reader: Option<&(u64, MessageReader)>,
    frame: Option<Result<Message, tungstenite::Error>>,
) -> Option<u64> {
    let epoch = reader.map_or(0, |(epoch, _)| *epoch);

    match frame {
        Some(Ok(Message::Text(text))) => {
            tracing::trace!("Received message: {}", text.as_str());
            dispatch(pending, text.as_str());
            None
        }
        Some(Ok(Message::Binary(data))) => {
            tracing::trace!("Received message <binary> {} bytes", data.len());
            match std::str::from_utf8(&data) {
                Ok(text) => dispatch(pending, text),
                Err(e) => tracing::warn!("Dropping non UTF-8 binary frame: {e}"),
            }
            None
        }
        Some(Ok(Message::Ping(ping))) => {
            tracing::trace!("Received ping: {ping:?}");
            None
        }
        Some(Ok(Message::Pong(_))) => {
            tracing::trace!("Received pong");
            None
        }
        Some(Ok(Message::Frame(_))) => None,
        Some(Ok(Message::Close(frame))) => {
            tracing::debug!("Received close message: {frame:?}");
            Some(epoch)
        }
        Some(Err(e)) => {
            tracing::warn!("Read failed on connection epoch {epoch}: {e}");
            Some(epoch)
        }
        None => {
            tracing::debug!("Connection epoch {epoch} ended");
            Some(epoch)
        }
    }
}

fn dispatch(pending: &PendingRegistry, payload: &str) {
    match correlation_id(payload) {
        Ok(id) => {
            if !pending.resolve(&id, payload.to_string()) {
                tracing::debug!("Dropping response for unknown request {id}");
            }
        }
        Err(e) => tracing::warn!("Dropping frame without correlation id: {e}"),
    }
}

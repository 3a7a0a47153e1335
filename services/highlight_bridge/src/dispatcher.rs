//! Command Dispatcher
//!
//! Decouples the ingress loop from editor speed. `emit` never blocks: it
//! pushes onto a bounded queue drained by a single delivery task, and every
//! delivery is bounded by the send timeout.
//!
//! While the queue has room, commands are delivered exactly as emitted.
//! When it is full, the incoming command supersedes queued commands for its
//! own key first; if that frees nothing, the queue is compacted to the latest
//! command per key. Commands for other keys are never dropped to make room,
//! which holds as long as the capacity covers the valid key range (enforced
//! by configuration validation).

use crate::stats::BridgeStats;
use bridge_config::DispatcherConfig;
use message_sink::CommandSink;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use types::RenderCommand;

#[derive(Debug)]
struct Shared {
    queue: Mutex<VecDeque<RenderCommand>>,
    capacity: usize,
    wake: Notify,
    closed: AtomicBool,
    stats: Arc<BridgeStats>,
}

impl Shared {
    fn pop(&self) -> Option<RenderCommand> {
        self.queue.lock().pop_front()
    }
}

pub struct Dispatcher;

impl Dispatcher {
    /// Start the delivery task for `sink`
    pub fn spawn(
        sink: Arc<dyn CommandSink>,
        config: &DispatcherConfig,
        stats: Arc<BridgeStats>,
    ) -> DispatcherHandle {
        let capacity = config.queue_capacity.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            wake: Notify::new(),
            closed: AtomicBool::new(false),
            stats,
        });

        let task = tokio::spawn(deliver(shared.clone(), sink, config.send_timeout()));

        DispatcherHandle { shared, task }
    }
}

/// Producer side of the dispatcher, owned by the bridge task
#[derive(Debug)]
pub struct DispatcherHandle {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Queue a command for delivery without waiting
    pub fn emit(&self, command: RenderCommand) {
        if self.shared.closed.load(Ordering::Acquire) {
            debug!(%command, "Dispatcher closed, command discarded");
            return;
        }

        let superseded = {
            let mut queue = self.shared.queue.lock();
            let superseded = if queue.len() >= self.shared.capacity {
                make_room(&mut queue, &command, self.shared.capacity)
            } else {
                0
            };
            queue.push_back(command);
            superseded
        };

        self.shared.stats.record_enqueued();
        if superseded > 0 {
            self.shared.stats.record_superseded(superseded as u64);
            debug!(key = %command.key(), superseded, "Editor saturated, superseded queued commands");
        }
        self.shared.wake.notify_one();
    }

    /// Commands queued but not yet handed to the sink
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Stop delivery
    ///
    /// Queued commands are discarded, not flushed. An in-flight send finishes
    /// or times out first.
    pub async fn shutdown(self) {
        self.shared.closed.store(true, Ordering::Release);
        let discarded = {
            let mut queue = self.shared.queue.lock();
            let n = queue.len();
            queue.clear();
            n
        };
        if discarded > 0 {
            info!(discarded, "Discarding undelivered commands on shutdown");
        }
        self.shared.wake.notify_one();

        if let Err(e) = self.task.await {
            warn!("Dispatcher task ended abnormally: {}", e);
        }
    }
}

/// Free queue space for `incoming`, returning how many commands were dropped
fn make_room(queue: &mut VecDeque<RenderCommand>, incoming: &RenderCommand, capacity: usize) -> usize {
    let before = queue.len();
    let key = incoming.key();
    queue.retain(|queued| queued.key() != key);

    if queue.len() >= capacity {
        // Latest per key, keeping the relative order of the survivors
        let mut seen = HashSet::with_capacity(queue.len());
        let mut compacted: VecDeque<RenderCommand> = queue
            .drain(..)
            .rev()
            .filter(|queued| seen.insert(queued.key()))
            .collect();
        compacted.make_contiguous().reverse();
        *queue = compacted;
    }

    if queue.len() >= capacity {
        warn!(
            pending = queue.len(),
            capacity, "Dispatcher queue holds more distinct keys than its capacity"
        );
    }

    before - queue.len()
}

async fn deliver(shared: Arc<Shared>, sink: Arc<dyn CommandSink>, send_timeout: Duration) {
    let metadata = sink.metadata();
    info!(sink = %metadata.name, endpoint = ?metadata.endpoint, "Dispatcher started");

    if let Err(e) = sink.connect().await {
        warn!("Editor sink connect failed, will retry per command: {}", e);
    }

    loop {
        let Some(command) = shared.pop() else {
            if shared.closed.load(Ordering::Acquire) {
                break;
            }
            shared.wake.notified().await;
            continue;
        };

        if !sink.is_connected() {
            if let Err(e) = sink.connect().await {
                shared.stats.record_sink_error();
                warn!(%command, "Editor sink unavailable, command dropped: {}", e);
                continue;
            }
        }

        match timeout(send_timeout, sink.send(command)).await {
            Ok(Ok(())) => {
                shared.stats.record_delivered();
                debug!(%command, "Delivered");
            }
            Ok(Err(e)) => {
                shared.stats.record_sink_error();
                warn!(%command, "Editor sink send failed: {}", e);
                if !e.is_retryable() {
                    // Reconnect on the next command
                    if let Err(e) = sink.disconnect().await {
                        debug!("Editor sink disconnect failed: {}", e);
                    }
                }
            }
            Err(_) => {
                shared.stats.record_sink_error();
                warn!(
                    %command,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "Editor sink send timed out"
                );
            }
        }
    }

    if let Err(e) = sink.disconnect().await {
        debug!("Editor sink disconnect failed: {}", e);
    }
    info!("Dispatcher stopped");
}

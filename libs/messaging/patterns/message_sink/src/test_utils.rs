//! In-memory sinks for tests
//!
//! Compiled into the library so that downstream crates can drive the
//! dispatcher and bridge against a fake editor.

use crate::{CommandSink, ConnectionState, SendContext, SinkError, SinkMetadata};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Notify, Semaphore};
use types::RenderCommand;

/// A sink that just collects commands for testing with bounded storage
#[derive(Debug)]
pub struct CollectorSink {
    /// Bounded command queue to prevent memory leaks
    commands: Arc<Mutex<VecDeque<(Instant, RenderCommand)>>>,
    /// Maximum number of commands to store
    max_commands: usize,
    connected: AtomicBool,
    fail_on_send: AtomicBool,
    commands_sent: AtomicU64,
    commands_failed: AtomicU64,
    arrived: Notify,
}

impl CollectorSink {
    /// Create a new collector sink with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Create a new collector sink with specific capacity
    pub fn with_capacity(max_commands: usize) -> Self {
        Self {
            commands: Arc::new(Mutex::new(VecDeque::with_capacity(max_commands))),
            max_commands,
            connected: AtomicBool::new(false),
            fail_on_send: AtomicBool::new(false),
            commands_sent: AtomicU64::new(0),
            commands_failed: AtomicU64::new(0),
            arrived: Notify::new(),
        }
    }

    /// Create an already-connected collector
    pub fn connected() -> Self {
        let sink = Self::new();
        sink.force_connect();
        sink
    }

    /// Get all received commands
    pub fn received_commands(&self) -> Vec<RenderCommand> {
        self.commands.lock().iter().map(|(_, c)| *c).collect()
    }

    /// Received commands with the instant each was delivered
    pub fn received_with_times(&self) -> Vec<(Instant, RenderCommand)> {
        self.commands.lock().iter().cloned().collect()
    }

    /// Get the count of received commands
    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }

    /// Clear all received commands
    pub fn clear_commands(&self) {
        self.commands.lock().clear();
    }

    /// Wait until at least `count` commands have been received
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.command_count() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Configure to fail on next send
    pub fn fail_next_send(&self) {
        self.fail_on_send.store(true, Ordering::Relaxed);
    }

    /// Force connect state (for testing)
    pub fn force_connect(&self) {
        self.connected.store(true, Ordering::Relaxed);
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSink for CollectorSink {
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError> {
        if !self.is_connected() {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::send_failed(
                "Not connected",
                SendContext::for_command(&command),
            ));
        }

        if self.fail_on_send.swap(false, Ordering::Relaxed) {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::send_failed(
                "Simulated failure",
                SendContext::for_command(&command),
            ));
        }

        {
            let mut commands = self.commands.lock();
            if commands.len() >= self.max_commands {
                commands.pop_front();
            }
            commands.push_back((Instant::now(), command));
        }

        self.commands_sent.fetch_add(1, Ordering::Relaxed);
        self.arrived.notify_waiters();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn connect(&self) -> Result<(), SinkError> {
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SinkError> {
        self.connected.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new("test-collector", "collector")
            .with_endpoint("memory://test")
            .with_state(if self.is_connected() {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            })
            .with_counts(
                self.commands_sent.load(Ordering::Relaxed),
                self.commands_failed.load(Ordering::Relaxed),
            )
    }
}

/// A sink that always fails for testing error conditions
#[derive(Debug)]
pub struct FailingSink {
    error_message: String,
}

impl FailingSink {
    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
        }
    }
}

impl Default for FailingSink {
    fn default() -> Self {
        Self::new("Simulated failure")
    }
}

#[async_trait]
impl CommandSink for FailingSink {
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError> {
        Err(SinkError::send_failed(
            &self.error_message,
            SendContext::for_command(&command),
        ))
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn connect(&self) -> Result<(), SinkError> {
        Err(SinkError::connection_failed(&self.error_message))
    }

    async fn disconnect(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new("failing-sink", "test-failing").with_state(ConnectionState::Disconnected)
    }
}

/// A sink that simulates a slow editor
#[derive(Debug)]
pub struct SlowSink {
    delay_ms: u64,
    inner: CollectorSink,
}

impl SlowSink {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            inner: CollectorSink::connected(),
        }
    }

    pub fn received_commands(&self) -> Vec<RenderCommand> {
        self.inner.received_commands()
    }
}

#[async_trait]
impl CommandSink for SlowSink {
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError> {
        tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        self.inner.send(command).await
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new("slow-sink", "test-slow")
            .with_endpoint(format!("slow://{}ms", self.delay_ms))
            .with_state(ConnectionState::Connected)
    }
}

/// A sink whose every send blocks until the test releases it
///
/// Lets tests hold the editor "saturated" for as long as they need and then
/// observe exactly which commands were still queued.
#[derive(Debug)]
pub struct GatedSink {
    gate: Semaphore,
    entered: Notify,
    waiting: AtomicU64,
    inner: CollectorSink,
}

impl GatedSink {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            entered: Notify::new(),
            waiting: AtomicU64::new(0),
            inner: CollectorSink::connected(),
        }
    }

    /// Allow `n` more sends to complete
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until a send call is blocked on the gate
    pub async fn wait_blocked(&self) {
        loop {
            let entered = self.entered.notified();
            if self.waiting.load(Ordering::Acquire) > 0 {
                return;
            }
            entered.await;
        }
    }

    pub fn received_commands(&self) -> Vec<RenderCommand> {
        self.inner.received_commands()
    }

    pub async fn wait_for(&self, count: usize) {
        self.inner.wait_for(count).await
    }
}

impl Default for GatedSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSink for GatedSink {
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError> {
        self.waiting.fetch_add(1, Ordering::AcqRel);
        self.entered.notify_waiters();
        let permit = self.gate.acquire().await.map_err(|_| SinkError::Closed)?;
        permit.forget();
        self.waiting.fetch_sub(1, Ordering::AcqRel);
        self.inner.send(command).await
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SinkError> {
        self.gate.close();
        Ok(())
    }
}

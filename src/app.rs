//! Application controller: the single timeline that owns all mutable state.
//!
//! [`App`] owns the slot table, the selection cursor, and the latest
//! snapshot, and runs them on one task. Scheduler ticks and external UI
//! events are serialized through the same `select!` loop, so a broadcast can
//! never observe a half-updated assignment — there is no lock because there
//! is nothing to race.
//!
//! The scheduler has two phases: a one-shot warm-up delay that triggers the
//! first snapshot+broadcast cycle, then a steady fixed-period tick. Ticks
//! are awaited to completion on this task and a tick that overruns the
//! period delays the next one (`MissedTickBehavior::Delay`), so overlapping
//! ticks are impossible.

use crate::broadcast::Broadcaster;
use crate::config::AppConfig;
use crate::error::BatteryOscError;
use crate::registry::DeviceRegistry;
use crate::sender::ParameterSender;
use crate::slots::SlotController;
use crate::snapshot::{Device, Snapshot, SnapshotBuilder};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Capacity of the command channel between handles and the controller task.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// External user-interaction events driving the assignment state machine.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// A slot button was activated.
    SlotSelectionRequested(usize),
    /// A device was picked from the device list.
    DevicePicked(String),
}

enum Command {
    Ui(UiEvent),
    Devices(oneshot::Sender<Vec<Device>>),
    Shutdown,
}

/// Clonable handle for the UI collaborator and for shutdown.
#[derive(Clone)]
pub struct AppHandle {
    tx: mpsc::Sender<Command>,
}

impl AppHandle {
    /// A slot button was activated.
    pub async fn slot_selection_requested(&self, index: usize) {
        let _ = self.tx.send(Command::Ui(UiEvent::SlotSelectionRequested(index))).await;
    }

    /// A device was picked from the device list.
    pub async fn device_picked(&self, device_id: impl Into<String>) {
        let _ = self
            .tx
            .send(Command::Ui(UiEvent::DevicePicked(device_id.into())))
            .await;
    }

    /// Devices in the latest snapshot, for presentation.
    ///
    /// Empty after the controller has shut down.
    pub async fn devices(&self) -> Vec<Device> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Command::Devices(reply_tx)).await.is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Stop the controller and release its resources.
    ///
    /// Idempotent: calls after the controller has stopped are no-ops.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

/// The controller task state.
pub struct App {
    warm_up_delay: Duration,
    update_interval: Duration,
    slots: SlotController,
    snapshot: Snapshot,
    builder: SnapshotBuilder,
    broadcaster: Broadcaster,
    sender: Arc<dyn ParameterSender>,
    rx: mpsc::Receiver<Command>,
}

impl App {
    /// Build the controller and its handle from validated configuration and
    /// the two external collaborators.
    pub fn new(
        config: &AppConfig,
        registry: Arc<dyn DeviceRegistry>,
        sender: Arc<dyn ParameterSender>,
    ) -> (Self, AppHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let app = Self {
            warm_up_delay: config.warm_up_delay(),
            update_interval: config.update_interval(),
            slots: SlotController::new(config.slot_count),
            snapshot: Snapshot::default(),
            builder: SnapshotBuilder::new(registry),
            broadcaster: Broadcaster::new(sender.clone(), config.parameter_prefix.clone()),
            sender,
            rx,
        };
        (app, AppHandle { tx })
    }

    /// Run until shutdown, then release resources exactly once.
    pub async fn run(mut self) {
        if self.event_loop().await {
            info!("controller stopped");
        }
        self.release().await;
    }

    /// Warm-up phase followed by the steady tick loop.
    ///
    /// Returns `true` on an orderly shutdown request, `false` when every
    /// handle was dropped.
    async fn event_loop(&mut self) -> bool {
        // WarmUp: a single one-shot timer; events are still served while
        // waiting for it.
        let warmup = time::sleep(self.warm_up_delay);
        tokio::pin!(warmup);
        loop {
            tokio::select! {
                () = &mut warmup => {
                    self.tick().await;
                    break;
                }
                cmd = self.rx.recv() => {
                    if let ControlFlow::Break(orderly) = self.handle_command(cmd) {
                        return orderly;
                    }
                }
            }
        }

        // Steady: recurring ticks, first one a full period after warm-up.
        let mut ticker =
            time::interval_at(Instant::now() + self.update_interval, self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                cmd = self.rx.recv() => {
                    if let ControlFlow::Break(orderly) = self.handle_command(cmd) {
                        return orderly;
                    }
                }
            }
        }
    }

    /// One snapshot-then-broadcast cycle.
    async fn tick(&mut self) {
        let snapshot = self.builder.build().await;
        let sent = self.broadcaster.broadcast(self.slots.table(), &snapshot).await;
        debug!(devices = snapshot.len(), messages = sent, "tick complete");
        // Replace only after the broadcast so the cycle reads one coherent
        // snapshot end to end.
        self.snapshot = snapshot;
    }

    fn handle_command(&mut self, cmd: Option<Command>) -> ControlFlow<bool> {
        match cmd {
            Some(Command::Ui(UiEvent::SlotSelectionRequested(index))) => {
                self.slots.request_assignment(index);
                ControlFlow::Continue(())
            }
            Some(Command::Ui(UiEvent::DevicePicked(device_id))) => {
                self.slots.pick_device(device_id);
                ControlFlow::Continue(())
            }
            Some(Command::Devices(reply)) => {
                let _ = reply.send(self.snapshot.devices().to_vec());
                ControlFlow::Continue(())
            }
            Some(Command::Shutdown) => ControlFlow::Break(true),
            None => ControlFlow::Break(false),
        }
    }

    /// Release held resources. Failures are aggregated and logged, never
    /// retried; shutdown proceeds regardless.
    async fn release(&mut self) {
        let mut failures = Vec::new();
        if let Err(e) = self.sender.shutdown().await {
            failures.push(e);
        }
        if !failures.is_empty() {
            error!(error = %BatteryOscError::ShutdownFailed(failures), "resource release failed");
        }
    }
}

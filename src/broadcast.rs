//! Broadcast engine: slot table + snapshot → outbound parameter messages.
//!
//! One message per resolvable occupied slot, strictly in ascending slot
//! order within a tick. The wire value is depletion, not remaining charge:
//! the consumer convention is `1 - battery_fraction`.

use crate::sender::ParameterSender;
use crate::slots::SlotTable;
use crate::snapshot::Snapshot;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves occupied slots against the latest snapshot and emits one float
/// parameter per resolved slot.
pub struct Broadcaster {
    sender: Arc<dyn ParameterSender>,
    parameter_prefix: String,
}

impl Broadcaster {
    /// Create a broadcaster emitting through `sender` with the given
    /// parameter address prefix.
    pub fn new(sender: Arc<dyn ParameterSender>, parameter_prefix: impl Into<String>) -> Self {
        Self {
            sender,
            parameter_prefix: parameter_prefix.into(),
        }
    }

    /// Parameter address for a slot: prefix plus zero-padded 2-digit index.
    pub fn parameter_name(&self, slot: usize) -> String {
        format!("{}{:02}", self.parameter_prefix, slot)
    }

    /// Emit one message per resolvable occupied slot, ascending by index.
    ///
    /// - Empty slot: skipped silently.
    /// - Assigned but absent from the snapshot: skipped with a non-fatal
    ///   diagnostic. The device is unreachable this tick; the condition
    ///   self-heals once it reappears in a snapshot.
    /// - Send failure: logged, remaining slots still get their messages.
    ///
    /// Returns the number of messages actually sent.
    pub async fn broadcast(&self, slots: &SlotTable, snapshot: &Snapshot) -> usize {
        let mut sent = 0;
        for (index, assigned) in slots.iter() {
            let Some(device_id) = assigned else {
                continue;
            };
            let Some(device) = snapshot.get(device_id) else {
                debug!(
                    slot = index,
                    device_id,
                    "assigned device not in current snapshot; skipping"
                );
                continue;
            };

            let parameter = self.parameter_name(index);
            let value = 1.0 - device.battery_fraction;
            match self.sender.send_float(&parameter, value).await {
                Ok(()) => {
                    debug!(slot = index, %parameter, value, "broadcast slot battery");
                    sent += 1;
                }
                Err(e) => {
                    warn!(slot = index, %parameter, error = %e, "send failed; continuing");
                }
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingSender;
    use crate::slots::SlotController;
    use crate::snapshot::Device;

    fn snapshot_with(devices: &[(&str, f32)]) -> Snapshot {
        Snapshot::from_devices(
            devices
                .iter()
                .map(|(id, battery)| Device {
                    id: (*id).to_string(),
                    display_name: (*id).to_string(),
                    battery_fraction: *battery,
                })
                .collect(),
        )
    }

    fn assign(slots: &mut SlotController, index: usize, id: &str) {
        slots.request_assignment(index);
        slots.pick_device(id);
    }

    #[tokio::test]
    async fn test_emits_one_message_per_resolved_slot_in_order() {
        let sender = Arc::new(RecordingSender::default());
        let broadcaster = Broadcaster::new(sender.clone(), "/avatar/parameters/BatteryFloat");

        let mut slots = SlotController::new(6);
        assign(&mut slots, 4, "SN-B");
        assign(&mut slots, 1, "SN-A");

        let snapshot = snapshot_with(&[("SN-A", 0.9), ("SN-B", 0.4)]);
        let sent = broadcaster.broadcast(slots.table(), &snapshot).await;

        assert_eq!(sent, 2);
        let recorded = sender.sent();
        // Ascending slot order regardless of assignment order.
        assert_eq!(recorded[0].0, "/avatar/parameters/BatteryFloat01");
        assert_eq!(recorded[1].0, "/avatar/parameters/BatteryFloat04");
        assert!((recorded[0].1 - 0.1).abs() < 1e-6);
        assert!((recorded[1].1 - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_depletion_round_trip() {
        let sender = Arc::new(RecordingSender::default());
        let broadcaster = Broadcaster::new(sender.clone(), "/avatar/parameters/BatteryFloat");

        let mut slots = SlotController::new(6);
        assign(&mut slots, 2, "SN-D");

        let snapshot = snapshot_with(&[("SN-D", 0.73)]);
        broadcaster.broadcast(slots.table(), &snapshot).await;

        let recorded = sender.sent();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "/avatar/parameters/BatteryFloat02");
        assert!((recorded[0].1 - 0.27).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unresolved_slot_skipped_and_rest_continue() {
        let sender = Arc::new(RecordingSender::default());
        let broadcaster = Broadcaster::new(sender.clone(), "/avatar/parameters/BatteryFloat");

        let mut slots = SlotController::new(6);
        assign(&mut slots, 0, "SN-GONE");
        assign(&mut slots, 3, "SN-HERE");

        let snapshot = snapshot_with(&[("SN-HERE", 1.0)]);
        let sent = broadcaster.broadcast(slots.table(), &snapshot).await;

        assert_eq!(sent, 1);
        let recorded = sender.sent();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "/avatar/parameters/BatteryFloat03");
        assert!(recorded[0].1.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_table_emits_nothing() {
        let sender = Arc::new(RecordingSender::default());
        let broadcaster = Broadcaster::new(sender.clone(), "/p");
        let slots = SlotController::new(6);
        let sent = broadcaster
            .broadcast(slots.table(), &snapshot_with(&[("SN", 0.5)]))
            .await;
        assert_eq!(sent, 0);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_abort_tick() {
        let sender = Arc::new(RecordingSender::default());
        sender.fail_next_send();
        let broadcaster = Broadcaster::new(sender.clone(), "/p");

        let mut slots = SlotController::new(3);
        assign(&mut slots, 0, "SN-A");
        assign(&mut slots, 1, "SN-B");

        let snapshot = snapshot_with(&[("SN-A", 0.5), ("SN-B", 0.5)]);
        let sent = broadcaster.broadcast(slots.table(), &snapshot).await;

        // First send failed, second still went out.
        assert_eq!(sent, 1);
        assert_eq!(sender.sent().len(), 1);
        assert_eq!(sender.sent()[0].0, "/p01");
    }

    #[tokio::test]
    async fn test_same_device_feeds_two_slots() {
        let sender = Arc::new(RecordingSender::default());
        let broadcaster = Broadcaster::new(sender.clone(), "/p");

        let mut slots = SlotController::new(3);
        assign(&mut slots, 0, "SN-X");
        assign(&mut slots, 2, "SN-X");

        let sent = broadcaster
            .broadcast(slots.table(), &snapshot_with(&[("SN-X", 0.25)]))
            .await;
        assert_eq!(sent, 2);
        assert_eq!(sender.sent()[0].0, "/p00");
        assert_eq!(sender.sent()[1].0, "/p02");
    }
}

//! Mock implementations for testing
//!
//! This module provides mock implementations of the platform contracts
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use embassy_time::{Duration, Instant, Timer};

use crate::{HardwareDescription, OverlayGateway};

/// Configuration tree used by the mocks: just an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTree(pub u32);

/// Handle of an overlay applied by [`MockGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayId(pub u32);

/// Errors injected by [`MockGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockGatewayError {
    /// Apply was told to fail.
    ApplyRejected,
    /// Remove was told to fail.
    RemoveRejected,
    /// Remove was called with a handle that is not applied.
    UnknownOverlay,
}

/// One call made against [`MockGateway`], stamped when the call started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCall {
    /// `apply` of the given tree.
    Apply {
        /// Tree identifier
        tree: u32,
        /// Call start time
        at: Instant,
    },
    /// `remove` of the given overlay.
    Remove {
        /// Overlay identifier
        overlay: u32,
        /// Call start time
        at: Instant,
    },
}

/// Mock overlay service. Records all calls for test assertions.
pub struct MockGateway {
    next_id: u32,
    live: heapless::Vec<(OverlayId, MockTree), 16>,
    peak_live: usize,
    calls: heapless::Vec<GatewayCall, 64>,
    fail_next_apply: bool,
    fail_next_remove: bool,
    latency: Duration,
}

impl MockGateway {
    /// Create a gateway with nothing applied and no latency.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            live: heapless::Vec::new(),
            peak_live: 0,
            calls: heapless::Vec::new(),
            fail_next_apply: false,
            fail_next_remove: false,
            latency: Duration::from_ticks(0),
        }
    }

    /// Make every call take `latency` before completing.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `apply` call.
    pub fn fail_next_apply(&mut self) {
        self.fail_next_apply = true;
    }

    /// Fail the next `remove` call.
    pub fn fail_next_remove(&mut self) {
        self.fail_next_remove = true;
    }

    /// Trees of the overlays currently applied, oldest first.
    pub fn applied_trees(&self) -> impl Iterator<Item = MockTree> + '_ {
        self.live.iter().map(|(_, tree)| *tree)
    }

    /// Largest number of overlays that were ever applied at the same time.
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[GatewayCall] {
        &self.calls
    }

    /// Number of `apply` calls made so far.
    pub fn apply_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::Apply { .. }))
            .count()
    }

    /// Number of `remove` calls made so far.
    pub fn remove_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::Remove { .. }))
            .count()
    }

    fn record(&mut self, call: GatewayCall) {
        // Call log is bounded; later calls are dropped once it is full
        let _ = self.calls.push(call);
    }

    async fn settle(&self) {
        if self.latency > Duration::from_ticks(0) {
            Timer::after(self.latency).await;
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayGateway for MockGateway {
    type Tree = MockTree;
    type Handle = OverlayId;
    type Error = MockGatewayError;

    async fn apply(&mut self, tree: &MockTree) -> Result<OverlayId, MockGatewayError> {
        self.record(GatewayCall::Apply {
            tree: tree.0,
            at: Instant::now(),
        });
        self.settle().await;

        if core::mem::take(&mut self.fail_next_apply) {
            return Err(MockGatewayError::ApplyRejected);
        }

        let id = OverlayId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.live
            .push((id, *tree))
            .map_err(|_| MockGatewayError::ApplyRejected)?;
        self.peak_live = self.peak_live.max(self.live.len());
        Ok(id)
    }

    async fn remove(&mut self, handle: &OverlayId) -> Result<(), MockGatewayError> {
        self.record(GatewayCall::Remove {
            overlay: handle.0,
            at: Instant::now(),
        });
        self.settle().await;

        if core::mem::take(&mut self.fail_next_remove) {
            return Err(MockGatewayError::RemoveRejected);
        }

        let position = self
            .live
            .iter()
            .position(|(id, _)| id == handle)
            .ok_or(MockGatewayError::UnknownOverlay)?;
        self.live.remove(position);
        Ok(())
    }
}

/// In-memory hardware description node.
///
/// Holds up to 16 records and 4 properties of each kind; extras are dropped.
pub struct MockDescription {
    records: heapless::Vec<(&'static str, MockTree), 16>,
    strings: heapless::Vec<(&'static str, &'static str), 4>,
    numbers: heapless::Vec<(&'static str, u32), 4>,
}

impl MockDescription {
    /// Create an empty node.
    pub fn new() -> Self {
        Self {
            records: heapless::Vec::new(),
            strings: heapless::Vec::new(),
            numbers: heapless::Vec::new(),
        }
    }

    /// Add a child record with the given raw name.
    #[must_use]
    pub fn with_record(mut self, raw_name: &'static str, tree: MockTree) -> Self {
        let _ = self.records.push((raw_name, tree));
        self
    }

    /// Add one record per raw name, with trees numbered from 0.
    #[must_use]
    pub fn with_states(mut self, raw_names: &[&'static str]) -> Self {
        for (id, raw_name) in (0u32..).zip(raw_names.iter()) {
            self = self.with_record(raw_name, MockTree(id));
        }
        self
    }

    /// Set a string property.
    #[must_use]
    pub fn with_string(mut self, key: &'static str, value: &'static str) -> Self {
        let _ = self.strings.push((key, value));
        self
    }

    /// Set a `u32` property.
    #[must_use]
    pub fn with_u32(mut self, key: &'static str, value: u32) -> Self {
        let _ = self.numbers.push((key, value));
        self
    }
}

impl Default for MockDescription {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareDescription for MockDescription {
    type Tree = MockTree;

    fn entries(&self) -> impl Iterator<Item = (&str, MockTree)> + '_ {
        self.records.iter().map(|(name, tree)| (*name, *tree))
    }

    fn read_string(&self, key: &str) -> Option<&str> {
        self.strings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| *value)
    }

    fn read_u32(&self, key: &str) -> Option<u32> {
        self.numbers
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| *value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_STATE_PROPERTY, SWITCH_DELAY_PROPERTY};

    #[tokio::test]
    async fn test_mock_gateway_apply_remove() {
        let mut gateway = MockGateway::new();

        let first = gateway.apply(&MockTree(7)).await.unwrap();
        assert_eq!(gateway.applied_trees().collect::<Vec<_>>(), [MockTree(7)]);

        gateway.remove(&first).await.unwrap();
        assert_eq!(gateway.applied_trees().count(), 0);
        assert_eq!(gateway.apply_count(), 1);
        assert_eq!(gateway.remove_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_gateway_handles_are_unique() {
        let mut gateway = MockGateway::new();
        let a = gateway.apply(&MockTree(1)).await.unwrap();
        let b = gateway.apply(&MockTree(1)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(gateway.peak_live(), 2);
    }

    #[tokio::test]
    async fn test_mock_gateway_injected_failures_are_one_shot() {
        let mut gateway = MockGateway::new();

        gateway.fail_next_apply();
        assert_eq!(
            gateway.apply(&MockTree(1)).await,
            Err(MockGatewayError::ApplyRejected)
        );
        let handle = gateway.apply(&MockTree(1)).await.unwrap();

        gateway.fail_next_remove();
        assert_eq!(
            gateway.remove(&handle).await,
            Err(MockGatewayError::RemoveRejected)
        );
        // Overlay survived the failed removal
        assert_eq!(gateway.applied_trees().count(), 1);
        gateway.remove(&handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_gateway_rejects_unknown_handle() {
        let mut gateway = MockGateway::new();
        assert_eq!(
            gateway.remove(&OverlayId(99)).await,
            Err(MockGatewayError::UnknownOverlay)
        );
    }

    #[tokio::test]
    async fn test_mock_gateway_latency() {
        let mut gateway = MockGateway::new().with_latency(Duration::from_millis(5));
        let start = Instant::now();
        gateway.apply(&MockTree(0)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_mock_description_properties() {
        let node = MockDescription::new()
            .with_states(&["state-a", "other", "state-b"])
            .with_string(DEFAULT_STATE_PROPERTY, "b")
            .with_u32(SWITCH_DELAY_PROPERTY, 10);

        let names: Vec<_> = node.entries().map(|(name, _)| name).collect();
        assert_eq!(names, ["state-a", "other", "state-b"]);
        assert_eq!(node.read_string(DEFAULT_STATE_PROPERTY), Some("b"));
        assert_eq!(node.read_u32(SWITCH_DELAY_PROPERTY), Some(10));
        assert_eq!(node.read_u32("missing"), None);
    }
}

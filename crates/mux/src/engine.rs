//! Transition engine.
//!
//! [`Mux`] owns the catalog, the overlay gateway and the active
//! configuration. Every transition runs teardown → settle → apply → settle
//! while holding one async mutex, so transitions never interleave and two
//! overlays are never applied at once:
//!
//! ```text
//! switch_to(name)
//!   lock ──► lookup ──► same state? ──yes──► unlock, Ok
//!                           │ no
//!                           ▼
//!            remove(old) ──err──► unlock, Teardown   (old stays active)
//!                           │ ok
//!                           ▼
//!            active = none, sleep(pre_switch_delay)
//!                           │
//!            apply(new) ───err──► unlock, Apply      (nothing active)
//!                           │ ok
//!                           ▼
//!            active = new, sleep(post_switch_delay), unlock, Ok
//! ```
//!
//! Readers of the current state never take the lock: the active position is
//! mirrored into an atomic that is only written while the lock is held.

use core::sync::atomic::{AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use platform::config::{POST_SWITCH_DELAY_PROPERTY, SWITCH_DELAY_PROPERTY};
use platform::{HardwareDescription, OverlayGateway};

use crate::catalog::{ConfigurationState, StateCatalog};
use crate::control::ControlSurface;
use crate::error::TransitionError;
use crate::log::{log_debug, log_error};

/// Sentinel stored in the active-state mirror when nothing is applied.
const NO_STATE: usize = usize::MAX;

const NO_DELAY: Duration = Duration::from_ticks(0);

/// Settle delays around the apply step. Both default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningParameters {
    /// Wait between removing the old overlay and applying the new one.
    pub pre_switch_delay: Duration,
    /// Wait after a successful apply, before the lock is released.
    pub post_switch_delay: Duration,
}

impl TuningParameters {
    /// No settle delays.
    pub const fn none() -> Self {
        Self {
            pre_switch_delay: NO_DELAY,
            post_switch_delay: NO_DELAY,
        }
    }

    /// Delays given in milliseconds.
    pub const fn from_millis(pre_switch_ms: u32, post_switch_ms: u32) -> Self {
        Self {
            pre_switch_delay: Duration::from_millis(pre_switch_ms as u64),
            post_switch_delay: Duration::from_millis(post_switch_ms as u64),
        }
    }

    /// Read `switch-delay-ms` / `post-switch-delay-ms`; absent values are zero.
    pub fn from_description<S: HardwareDescription>(source: &S) -> Self {
        Self::from_millis(
            source.read_u32(SWITCH_DELAY_PROPERTY).unwrap_or(0),
            source.read_u32(POST_SWITCH_DELAY_PROPERTY).unwrap_or(0),
        )
    }
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self::none()
    }
}

/// Overlay currently applied and the catalog position of its state.
struct AppliedOverlay<H> {
    state: usize,
    handle: H,
}

/// Everything the transition lock protects.
struct Transitions<G: OverlayGateway> {
    gateway: G,
    // `Some` exactly while an overlay is applied
    applied: Option<AppliedOverlay<G::Handle>>,
}

/// A configuration multiplexer instance.
///
/// `M` selects the lock flavour: `NoopRawMutex` when all callers share one
/// executor, `CriticalSectionRawMutex` when callers run on different threads
/// or cores. `N` is the catalog capacity.
///
/// Dropping a `Mux` drops the catalog trees but does not remove the applied
/// overlay; call [`release`](Self::release) first.
pub struct Mux<M: RawMutex, G: OverlayGateway, const N: usize> {
    catalog: StateCatalog<G::Tree, N>,
    tuning: TuningParameters,
    current: AtomicUsize,
    transitions: Mutex<M, Transitions<G>>,
}

impl<M: RawMutex, G: OverlayGateway, const N: usize> Mux<M, G, N> {
    /// Create an instance with no state active.
    ///
    /// Most callers want [`crate::attach`], which also builds the catalog and
    /// activates the default state.
    pub fn new(catalog: StateCatalog<G::Tree, N>, gateway: G, tuning: TuningParameters) -> Self {
        Self {
            catalog,
            tuning,
            current: AtomicUsize::new(NO_STATE),
            transitions: Mutex::new(Transitions {
                gateway,
                applied: None,
            }),
        }
    }

    /// The immutable state catalog.
    pub fn catalog(&self) -> &StateCatalog<G::Tree, N> {
        &self.catalog
    }

    /// Settle delays in effect.
    pub fn tuning(&self) -> TuningParameters {
        self.tuning
    }

    /// Control surface borrowing this instance.
    pub fn control(&self) -> ControlSurface<'_, M, G, N> {
        ControlSurface::new(self)
    }

    /// Name of the active state, `None` when nothing is applied.
    ///
    /// Lock-free: during a transition this observes either the old value,
    /// `None`, or the new value.
    pub fn current(&self) -> Option<&str> {
        self.catalog
            .get(self.current.load(Ordering::Acquire))
            .map(ConfigurationState::name)
    }

    /// Returns `true` while a transition (or gateway access) holds the lock.
    pub fn is_switching(&self) -> bool {
        self.transitions.try_lock().is_err()
    }

    /// Make `name` the active state.
    ///
    /// Waits for any transition in flight, then runs the whole
    /// teardown-then-apply sequence including both settle delays before
    /// letting the next one start. Switching to the state that is already
    /// active does nothing.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::UnknownState`]: nothing changed.
    /// - [`TransitionError::Teardown`]: the previous state is still active.
    /// - [`TransitionError::Apply`]: no state is active. The previous state
    ///   is not reapplied; callers retry or switch back explicitly.
    pub async fn switch_to(&self, name: &str) -> Result<(), TransitionError<G::Error>> {
        let mut guard = self.transitions.lock().await;
        let transitions = &mut *guard;

        let Some((position, state)) = self
            .catalog
            .position(name)
            .and_then(|position| Some((position, self.catalog.get(position)?)))
        else {
            log_error!("no such state: {}", name);
            return Err(TransitionError::UnknownState);
        };

        if transitions
            .applied
            .as_ref()
            .is_some_and(|applied| applied.state == position)
        {
            log_debug!("nothing to do, state remains {}", state.name());
            return Ok(());
        }

        self.teardown(transitions).await?;

        settle(self.tuning.pre_switch_delay).await;

        log_debug!("adding overlay {}", state.name());
        let handle = match transitions.gateway.apply(state.tree()).await {
            Ok(handle) => handle,
            Err(err) => {
                log_error!("failed to apply overlay {}", state.name());
                return Err(TransitionError::Apply(err));
            }
        };
        transitions.applied = Some(AppliedOverlay {
            state: position,
            handle,
        });
        self.current.store(position, Ordering::Release);

        settle(self.tuning.post_switch_delay).await;
        Ok(())
    }

    /// Remove the applied overlay, leaving no state active.
    ///
    /// Call before dropping the instance. Does nothing when no state is
    /// active.
    ///
    /// # Errors
    ///
    /// [`TransitionError::Teardown`] when removal fails; the state stays
    /// active and the call may be retried.
    pub async fn release(&self) -> Result<(), TransitionError<G::Error>> {
        let mut guard = self.transitions.lock().await;
        self.teardown(&mut guard).await
    }

    /// Run `f` against the gateway while holding the transition lock.
    pub async fn with_gateway<R>(&self, f: impl FnOnce(&mut G) -> R) -> R {
        let mut guard = self.transitions.lock().await;
        f(&mut guard.gateway)
    }

    async fn teardown(
        &self,
        transitions: &mut Transitions<G>,
    ) -> Result<(), TransitionError<G::Error>> {
        let Some(applied) = &transitions.applied else {
            return Ok(());
        };

        log_debug!("removing overlay {}", self.state_name(applied.state));
        if let Err(err) = transitions.gateway.remove(&applied.handle).await {
            log_error!("failed to remove overlay {}", self.state_name(applied.state));
            return Err(TransitionError::Teardown(err));
        }

        transitions.applied = None;
        self.current.store(NO_STATE, Ordering::Release);
        Ok(())
    }

    #[cfg_attr(not(any(feature = "defmt", feature = "tracing")), allow(dead_code))]
    fn state_name(&self, position: usize) -> &str {
        self.catalog
            .get(position)
            .map_or("", ConfigurationState::name)
    }
}

async fn settle(delay: Duration) {
    if delay > NO_DELAY {
        Timer::after(delay).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::Instant;
    use platform::mocks::{GatewayCall, MockGateway, MockGatewayError, MockTree};

    type TestMux = Mux<NoopRawMutex, MockGateway, 4>;

    fn mux_with(names: &[&str], gateway: MockGateway, tuning: TuningParameters) -> TestMux {
        let mut catalog = StateCatalog::new();
        for (id, name) in (0u32..).zip(names) {
            catalog.insert(name, MockTree(id)).unwrap();
        }
        Mux::new(catalog, gateway, tuning)
    }

    fn mux(names: &[&str]) -> TestMux {
        mux_with(names, MockGateway::new(), TuningParameters::none())
    }

    #[tokio::test]
    async fn test_starts_with_nothing_active() {
        let mux = mux(&["a", "b"]);
        assert_eq!(mux.current(), None);
        assert!(!mux.is_switching());
    }

    #[tokio::test]
    async fn test_switch_reports_new_state() {
        let mux = mux(&["a", "b", "c"]);
        for name in ["a", "c", "b", "a"] {
            mux.switch_to(name).await.unwrap();
            assert_eq!(mux.current(), Some(name));
        }
        mux.with_gateway(|gateway| {
            assert_eq!(gateway.applied_trees().collect::<Vec<_>>(), [MockTree(0)]);
            assert_eq!(gateway.peak_live(), 1);
        })
        .await;
    }

    #[tokio::test]
    async fn test_first_switch_does_not_remove() {
        let mux = mux(&["a", "b"]);
        mux.switch_to("b").await.unwrap();
        let (applies, removes) = mux
            .with_gateway(|gateway| (gateway.apply_count(), gateway.remove_count()))
            .await;
        assert_eq!((applies, removes), (1, 0));
    }

    #[tokio::test]
    async fn test_switch_to_active_state_is_noop() {
        let mux = mux(&["a", "b"]);
        mux.switch_to("a").await.unwrap();
        mux.switch_to("a").await.unwrap();
        let calls = mux.with_gateway(|gateway| gateway.calls().len()).await;
        assert_eq!(calls, 1, "second switch must not touch the gateway");
        assert_eq!(mux.current(), Some("a"));
    }

    #[tokio::test]
    async fn test_unknown_state_changes_nothing() {
        let mux = mux(&["a", "b"]);
        mux.switch_to("a").await.unwrap();

        assert_eq!(
            mux.switch_to("nonexistent").await,
            Err(TransitionError::UnknownState)
        );
        assert_eq!(mux.current(), Some("a"));
        let calls = mux.with_gateway(|gateway| gateway.calls().len()).await;
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_teardown_failure_keeps_old_state() {
        let mux = mux(&["a", "b"]);
        mux.switch_to("a").await.unwrap();
        mux.with_gateway(MockGateway::fail_next_remove).await;

        assert_eq!(
            mux.switch_to("b").await,
            Err(TransitionError::Teardown(MockGatewayError::RemoveRejected))
        );
        assert_eq!(mux.current(), Some("a"));
        let apply_count = mux.with_gateway(|gateway| gateway.apply_count()).await;
        assert_eq!(apply_count, 1, "apply must not run after a failed teardown");

        // The old overlay is still held and a retry succeeds
        mux.switch_to("b").await.unwrap();
        assert_eq!(mux.current(), Some("b"));
    }

    #[tokio::test]
    async fn test_apply_failure_leaves_nothing_active() {
        let mux = mux(&["a", "b"]);
        mux.switch_to("a").await.unwrap();
        mux.with_gateway(MockGateway::fail_next_apply).await;

        assert_eq!(
            mux.switch_to("b").await,
            Err(TransitionError::Apply(MockGatewayError::ApplyRejected))
        );
        assert_eq!(mux.current(), None);
        mux.with_gateway(|gateway| {
            // No automatic rollback to "a"
            assert_eq!(gateway.applied_trees().count(), 0);
            assert_eq!(gateway.apply_count(), 2);
        })
        .await;

        // Switching back to the old state now performs a full apply
        mux.switch_to("a").await.unwrap();
        assert_eq!(mux.current(), Some("a"));
    }

    #[tokio::test]
    async fn test_settle_delays_are_part_of_the_switch() {
        let mux = mux_with(
            &["a", "b"],
            MockGateway::new(),
            TuningParameters::from_millis(10, 5),
        );
        mux.switch_to("a").await.unwrap();

        let start = Instant::now();
        mux.switch_to("b").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[tokio::test]
    async fn test_concurrent_switches_are_serialised() {
        let mux = mux_with(
            &["a", "b", "c"],
            MockGateway::new().with_latency(Duration::from_millis(2)),
            TuningParameters::from_millis(10, 5),
        );
        mux.switch_to("a").await.unwrap();

        let first = async {
            mux.switch_to("b").await.unwrap();
            Instant::now()
        };
        let second = async {
            // Let the first switch take the lock
            tokio::task::yield_now().await;
            assert!(mux.is_switching());
            mux.switch_to("c").await.unwrap();
        };
        let (first_done, ()) = tokio::join!(first, second);

        assert_eq!(mux.current(), Some("c"));
        let calls = mux.with_gateway(|gateway| gateway.calls().to_vec()).await;
        let kinds: Vec<_> = calls
            .iter()
            .map(|call| match call {
                GatewayCall::Apply { tree, .. } => ('+', *tree),
                GatewayCall::Remove { overlay, .. } => ('-', *overlay),
            })
            .collect();
        // Overlay ids are handed out in apply order: a=0, b=1, c=2
        assert_eq!(kinds, [('+', 0), ('-', 0), ('+', 1), ('-', 1), ('+', 2)]);

        let GatewayCall::Remove { at: second_teardown, .. } = calls[3] else {
            panic!("expected removal of b");
        };
        assert!(second_teardown >= first_done);
        let peak = mux.with_gateway(|gateway| gateway.peak_live()).await;
        assert_eq!(peak, 1);
    }

    #[tokio::test]
    async fn test_release_removes_active_overlay() {
        let mux = mux(&["a"]);
        mux.switch_to("a").await.unwrap();
        mux.release().await.unwrap();
        assert_eq!(mux.current(), None);
        // Nothing left to release
        mux.release().await.unwrap();
        let removes = mux.with_gateway(|gateway| gateway.remove_count()).await;
        assert_eq!(removes, 1);
    }

    #[tokio::test]
    async fn test_release_failure_keeps_state() {
        let mux = mux(&["a"]);
        mux.switch_to("a").await.unwrap();
        mux.with_gateway(MockGateway::fail_next_remove).await;
        assert!(mux.release().await.is_err());
        assert_eq!(mux.current(), Some("a"));
    }

    #[test]
    fn test_tuning_defaults_to_zero() {
        assert_eq!(TuningParameters::default(), TuningParameters::from_millis(0, 0));
    }
}

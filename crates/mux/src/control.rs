//! Control surface.
//!
//! The three operations exposed to the outside world: read the current
//! state, list the available states, request a switch. The `show_*` /
//! `store_*` helpers render them in the attribute-file format used by text
//! transports:
//!
//! | Attribute          | Read                       | Write          |
//! |--------------------|----------------------------|----------------|
//! | `state`            | `"<name>\n"` or `"\n"`     | `"<name>[\n]"` |
//! | `available_states` | `"<a> <b> <c> \n"`         | n/a            |

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use platform::OverlayGateway;

use crate::engine::Mux;
use crate::error::{ControlError, TransitionError};
use crate::log::log_warn;

/// Query/control operations on a [`Mux`].
///
/// Holds no state of its own; every mutation is delegated to
/// [`Mux::switch_to`].
pub struct ControlSurface<'a, M: RawMutex, G: OverlayGateway, const N: usize> {
    mux: &'a Mux<M, G, N>,
}

impl<'a, M: RawMutex, G: OverlayGateway, const N: usize> ControlSurface<'a, M, G, N> {
    /// Wrap a mux instance.
    pub fn new(mux: &'a Mux<M, G, N>) -> Self {
        Self { mux }
    }

    /// Name of the active state, `None` when nothing is applied.
    ///
    /// Never waits for a transition in flight.
    pub fn get_current(&self) -> Option<&'a str> {
        self.mux.current()
    }

    /// State names in discovery order.
    pub fn list_available(&self) -> impl ExactSizeIterator<Item = &'a str> + 'a {
        self.mux.catalog().list()
    }

    /// Switch to `name`, ignoring trailing line terminators.
    pub async fn request_switch(&self, name: &str) -> Result<(), TransitionError<G::Error>> {
        self.mux.switch_to(trim_line_terminators(name)).await
    }

    /// Render the `state` attribute.
    ///
    /// When `CAP` cannot hold the name and newline, the name is cut at a char
    /// boundary and the newline dropped if it no longer fits. An active state
    /// never renders as the bare `"\n"` of "nothing active".
    pub fn show_state<const CAP: usize>(&self) -> String<CAP> {
        let mut out = String::new();
        if let Some(name) = self.get_current() {
            let _ = out.push_str(truncate_to(name, CAP));
        }
        let _ = out.push('\n');
        out
    }

    /// Render the `available_states` attribute: every name followed by a
    /// space, then a newline.
    ///
    /// Names that no longer fit in `CAP` (together with their separator and
    /// the final newline) are left out.
    pub fn show_available_states<const CAP: usize>(&self) -> String<CAP> {
        let mut out = String::new();
        for name in self.list_available() {
            if out.len().saturating_add(name.len()).saturating_add(2) > CAP {
                break;
            }
            let _ = out.push_str(name);
            let _ = out.push(' ');
        }
        let _ = out.push('\n');
        out
    }

    /// Handle a write to the `state` attribute.
    ///
    /// Returns the number of bytes consumed (all of them) on success. Any
    /// transition failure is reported as [`ControlError::Failed`]; the
    /// specific error has already been logged by the engine.
    pub async fn store_state(&self, input: &[u8]) -> Result<usize, ControlError> {
        let name = core::str::from_utf8(input).map_err(|_| ControlError::InvalidInput)?;
        self.request_switch(name)
            .await
            .map(|()| input.len())
            .map_err(|err| transport_failure(&err))
    }
}

#[cfg_attr(not(any(feature = "defmt", feature = "tracing")), allow(unused_variables))]
fn transport_failure<E>(err: &TransitionError<E>) -> ControlError {
    log_warn!("state change request failed: {}", err.kind().as_str());
    ControlError::Failed
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a char.
fn truncate_to(text: &str, max: usize) -> &str {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    text.get(..end).unwrap_or_default()
}

fn trim_line_terminators(input: &str) -> &str {
    input.trim_end_matches(|c: char| c == '\n' || c == '\r')
}

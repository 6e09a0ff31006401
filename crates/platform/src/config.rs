//! Naming conventions and fixed limits
//!
//! Central configuration values shared by the platform contracts and the mux
//! core. Property names and the record prefix must match the hardware
//! description binding exactly.

/// Prefix a description record's raw name must carry to be a selectable state.
///
/// The logical state name is the remainder after the prefix
/// (`"state-headphones"` → `"headphones"`).
pub const STATE_PREFIX: &str = "state-";

/// Optional string property naming the state to activate at attach.
pub const DEFAULT_STATE_PROPERTY: &str = "default-state";

/// Optional `u32` property: settle delay (ms) between teardown and apply.
pub const SWITCH_DELAY_PROPERTY: &str = "switch-delay-ms";

/// Optional `u32` property: settle delay (ms) after a successful apply.
pub const POST_SWITCH_DELAY_PROPERTY: &str = "post-switch-delay-ms";

/// Maximum length in bytes of a logical state name.
pub const MAX_STATE_NAME_LEN: usize = 32;

/// Size of a transport text buffer (one page).
pub const PAGE_SIZE: usize = 4096;

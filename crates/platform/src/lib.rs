//! Platform contracts for the overlay multiplexer
//!
//! This crate provides the trait-based abstractions the mux core is written
//! against, enabling development and testing without the real overlay
//! machinery or a parsed hardware description.
//!
//! # Architecture Layers
//!
//! ```text
//! Control transport (sysfs-like attributes, shell, RPC)
//!         ↓
//! Mux core (mux crate - catalog, transition engine, control surface)
//!         ↓
//! Platform contracts (this crate - trait abstractions)
//!         ↓
//! Overlay service + hardware description parser
//! ```
//!
//! # Contracts
//!
//! - [`OverlayGateway`] - apply/remove a configuration tree
//! - [`HardwareDescription`] - discovered configuration records and tunables
//!
//! # Features
//!
//! - `std`: Expose the [`mocks`] module outside this crate's tests
//!
//! # Example
//!
//! ```no_run
//! use platform::OverlayGateway;
//!
//! async fn reapply<G: OverlayGateway>(gateway: &mut G, tree: &G::Tree) {
//!     if let Ok(handle) = gateway.apply(tree).await {
//!         let _ = gateway.remove(&handle).await;
//!     }
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::must_use_candidate)] // accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod config;
pub mod description;
pub mod mocks;
pub mod overlay;

pub use description::HardwareDescription;
pub use overlay::OverlayGateway;

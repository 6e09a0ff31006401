//! Overlay state multiplexer
//!
//! A device exposes a fixed set of named, mutually exclusive configuration
//! states. Exactly one may be applied at a time; switching tears down the
//! applied overlay and applies the new one, with optional settle delays for
//! signal debounce or rail stabilisation.
//!
//! # Architecture
//!
//! ```text
//! attach (init)  ──► StateCatalog (immutable, discovery order)
//!       │
//!       └──────────► Mux::switch_to ◄── ControlSurface ◄── transport
//!                         │
//!                         ▼
//!                  platform::OverlayGateway
//! ```
//!
//! # Features
//!
//! - `std` - `std::error::Error` impls
//! - `defmt` - log through defmt (hardware builds)
//! - `tracing` - log through tracing (desktop builds)
//!
//! # Example
//!
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use mux::Mux;
//! use platform::config::PAGE_SIZE;
//! use platform::{HardwareDescription, OverlayGateway};
//!
//! async fn bring_up<G, S>(node: &S, gateway: G)
//! where
//!     G: OverlayGateway,
//!     S: HardwareDescription<Tree = G::Tree>,
//! {
//!     let Ok(mux) = mux::attach::<NoopRawMutex, G, S, 8>(node, gateway).await else {
//!         return;
//!     };
//!     let control = mux.control();
//!     let _ = control.request_switch("headphones\n").await;
//!     let _state = control.show_state::<PAGE_SIZE>();
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
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod log;

pub mod catalog;
pub mod control;
pub mod engine;
pub mod error;
pub mod init;

pub use catalog::{CatalogError, ConfigurationState, StateCatalog};
pub use control::ControlSurface;
pub use engine::{Mux, TuningParameters};
pub use error::{ControlError, InitError, TransitionError, TransitionErrorKind};
pub use init::{attach, discover};

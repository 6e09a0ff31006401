//! Overlay service abstraction
//!
//! An overlay is the applied instance of a configuration tree. The service
//! that applies and removes overlays is external to the mux; this trait is the
//! whole of its contract.

/// Applies configuration trees and removes previously applied overlays.
///
/// Both operations may be slow and may fail. Implementations are trusted to
/// return; callers put no timeout around them.
pub trait OverlayGateway {
    /// Configuration tree accepted by [`apply`](Self::apply).
    type Tree;

    /// Opaque handle naming an applied overlay.
    type Handle;

    /// Error type
    type Error: core::fmt::Debug;

    /// Apply `tree`, returning the handle of the new overlay.
    fn apply(
        &mut self,
        tree: &Self::Tree,
    ) -> impl core::future::Future<Output = Result<Self::Handle, Self::Error>>;

    /// Remove the overlay named by `handle`.
    ///
    /// The handle is only borrowed: when removal fails the overlay is assumed
    /// to still be in place and the caller keeps the handle.
    fn remove(
        &mut self,
        handle: &Self::Handle,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

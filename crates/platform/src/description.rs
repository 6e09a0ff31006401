//! Hardware description abstraction
//!
//! The parser that walks the hardware description is external. At attach
//! time the mux only needs the child records of its own node and a few
//! scalar properties, which this trait exposes.

/// Pre-parsed, read-only view of the mux node in the hardware description.
pub trait HardwareDescription {
    /// Configuration tree carried by each child record.
    ///
    /// Yielded by value: whoever receives a tree owns it and releases it on
    /// drop.
    type Tree;

    /// Every child record as `(raw_name, tree)`, in description order.
    ///
    /// Records are not filtered; callers match the naming convention
    /// themselves (see [`crate::config::STATE_PREFIX`]).
    fn entries(&self) -> impl Iterator<Item = (&str, Self::Tree)> + '_;

    /// Read a string property, `None` if absent.
    fn read_string(&self, key: &str) -> Option<&str>;

    /// Read a `u32` property, `None` if absent or not a `u32`.
    fn read_u32(&self, key: &str) -> Option<u32>;
}

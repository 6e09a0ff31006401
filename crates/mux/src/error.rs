//! Error types for attach, transitions and the control transport.

/// Failure of a state transition.
///
/// `E` is the overlay gateway's error type, returned verbatim. The mux never
/// retries or rolls back on its own; see the variant docs for the state each
/// failure leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError<E> {
    /// The requested name is not in the catalog. Nothing was touched.
    UnknownState,
    /// Removing the active overlay failed. The old state is still reported
    /// as active.
    Teardown(E),
    /// Applying the requested state failed after the old overlay was
    /// removed. No state is active afterwards.
    Apply(E),
}

/// Payload-free discriminant of [`TransitionError`], for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionErrorKind {
    /// See [`TransitionError::UnknownState`].
    UnknownState,
    /// See [`TransitionError::Teardown`].
    Teardown,
    /// See [`TransitionError::Apply`].
    Apply,
}

impl TransitionErrorKind {
    /// Short human-readable description.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownState => "no such state",
            Self::Teardown => "failed to remove active overlay",
            Self::Apply => "failed to apply overlay",
        }
    }
}

impl<E> TransitionError<E> {
    /// The kind of failure, without the gateway payload.
    pub const fn kind(&self) -> TransitionErrorKind {
        match self {
            Self::UnknownState => TransitionErrorKind::UnknownState,
            Self::Teardown(_) => TransitionErrorKind::Teardown,
            Self::Apply(_) => TransitionErrorKind::Apply,
        }
    }

    /// The gateway error, if the failure came from the gateway.
    pub fn gateway_error(&self) -> Option<&E> {
        match self {
            Self::UnknownState => None,
            Self::Teardown(e) | Self::Apply(e) => Some(e),
        }
    }
}

impl<E> core::fmt::Display for TransitionError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for TransitionError<E> {}

/// Attach failures. The mux instance is not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// No description record carried the state prefix.
    EmptyCatalog,
    /// More states were discovered than the catalog can hold.
    CatalogFull,
    /// A state name exceeds [`platform::config::MAX_STATE_NAME_LEN`].
    NameTooLong,
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "no states found"),
            Self::CatalogFull => write!(f, "too many states for catalog capacity"),
            Self::NameTooLong => write!(f, "state name too long"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InitError {}

/// Failure reported back through the control transport.
///
/// The transport only carries a generic failure; the specific
/// [`TransitionError`] is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// The written bytes are not a UTF-8 state name.
    InvalidInput,
    /// The requested switch failed.
    Failed,
}

impl core::fmt::Display for ControlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid state name"),
            Self::Failed => write!(f, "state change failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ControlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_drops_payload() {
        let err: TransitionError<u8> = TransitionError::Apply(3);
        assert_eq!(err.kind(), TransitionErrorKind::Apply);
        assert_eq!(err.gateway_error(), Some(&3));
        assert_eq!(TransitionError::<u8>::UnknownState.gateway_error(), None);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            TransitionError::<u8>::Teardown(1).to_string(),
            "failed to remove active overlay"
        );
        assert_eq!(InitError::EmptyCatalog.to_string(), "no states found");
        assert_eq!(ControlError::Failed.to_string(), "state change failed");
    }
}

//! Attach: discover states, read tunables, activate the default state.

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::config::{DEFAULT_STATE_PROPERTY, STATE_PREFIX};
use platform::{HardwareDescription, OverlayGateway};

use crate::catalog::{CatalogError, StateCatalog};
use crate::engine::{Mux, TuningParameters};
use crate::error::InitError;
use crate::log::{log_debug, log_error, log_info, log_warn};

/// Build the catalog from every `state-<name>` record of `source`.
///
/// Records without the prefix are ignored. Records with an empty name or a
/// name already seen are skipped with a warning.
///
/// # Errors
///
/// - [`InitError::EmptyCatalog`] when no record carries the prefix.
/// - [`InitError::CatalogFull`] when more than `N` states are found.
/// - [`InitError::NameTooLong`] when a name does not fit.
pub fn discover<S: HardwareDescription, const N: usize>(
    source: &S,
) -> Result<StateCatalog<S::Tree, N>, InitError> {
    let mut catalog = StateCatalog::new();

    for (raw_name, tree) in source.entries() {
        let Some(name) = raw_name.strip_prefix(STATE_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            log_warn!("ignoring state record without a name");
            continue;
        }

        match catalog.insert(name, tree) {
            Ok(_) => log_debug!("discovered state {}", name),
            Err(CatalogError::Duplicate) => log_warn!("ignoring duplicate state {}", name),
            Err(CatalogError::Full) => {
                log_error!("too many states, capacity is {}", N);
                return Err(InitError::CatalogFull);
            }
            Err(CatalogError::NameTooLong) => {
                log_error!("state name too long: {}", name);
                return Err(InitError::NameTooLong);
            }
        }
    }

    if catalog.is_empty() {
        log_error!("no states found");
        return Err(InitError::EmptyCatalog);
    }
    Ok(catalog)
}

/// Create a mux instance from its hardware description.
///
/// Discovers the states, reads the settle delays, then switches to the
/// `default-state` (or the first state when that property is absent or names
/// no discovered state). Failing to activate the initial state is logged and
/// otherwise ignored: the instance starts with nothing active.
///
/// # Errors
///
/// Any [`discover`] error; no instance is created.
pub async fn attach<M, G, S, const N: usize>(
    source: &S,
    gateway: G,
) -> Result<Mux<M, G, N>, InitError>
where
    M: RawMutex,
    G: OverlayGateway,
    S: HardwareDescription<Tree = G::Tree>,
{
    let catalog = discover::<S, N>(source)?;
    let tuning = TuningParameters::from_description(source);
    log_info!(
        "{} states, switch delay {} ms, post-switch delay {} ms",
        catalog.len(),
        tuning.pre_switch_delay.as_millis(),
        tuning.post_switch_delay.as_millis()
    );

    let preferred = source.read_string(DEFAULT_STATE_PROPERTY);
    if preferred.is_some_and(|name| catalog.lookup(name).is_none()) {
        log_warn!(
            "default state {} not found, using first state",
            preferred.unwrap_or("")
        );
    }

    let mux = Mux::new(catalog, gateway, tuning);
    let initial = mux.catalog().default_or_first(preferred)?;
    if mux.switch_to(initial.name()).await.is_err() {
        log_error!("failed to set default state {}", initial.name());
    }
    Ok(mux)
}

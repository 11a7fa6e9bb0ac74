//! Correlates the mutually-incompatible Windows display enumeration
//! spaces into one canonical identity record per attached monitor.
//!
//! No single enumeration surface carries everything a caller needs: the
//! modern path/target object model knows display names and device ids,
//! the legacy device enumeration knows GDI adapter names, the handle
//! enumeration knows monitor handles and working areas, and the
//! display-configuration table links targets to sources. This crate joins
//! them — normalizing identifier strings, branching on per-path platform
//! capability, and degrading gracefully to partial records when one of
//! the optional joins cannot be made.
//!
//! The correlation engine is platform-neutral and runs against any
//! implementation of the traits in [`sources`]; only the live adapters
//! behind [`display_identities`] touch the operating system.

pub mod correlate;
pub mod error;
pub mod instance_id;
pub mod records;
pub mod resolve;
pub mod sources;
#[cfg(windows)]
mod win32;

pub use crate::error::Error;
pub use crate::records::UnifiedIdentity;

/// Enumerates the displays attached right now and yields one unified
/// identity per attached monitor, in the platform's path traversal order.
///
/// A fatal failure in one of the mandatory enumeration sources yields
/// exactly one `Err` item; per-display lookup failures degrade the
/// affected record instead.
#[cfg(windows)]
pub fn display_identities() -> impl Iterator<Item = Result<records::UnifiedIdentity, Error>> {
    win32::display_identities().map(|r| r.map_err(Into::into))
}

/// Enumerates (monitor handle, device) pairs through the legacy GDI
/// surfaces alone, without the modern path enumeration.
#[cfg(windows)]
pub fn display_device_monitor_pairs(
) -> impl Iterator<Item = Result<records::DeviceMonitorPair, Error>> {
    win32::display_device_monitor_pairs().map(|r| r.map_err(Into::into))
}

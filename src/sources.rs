//! Seams over the platform enumeration mechanisms.
//!
//! Each trait wraps one native enumeration surface so the correlation
//! engine can run against synthetic in-memory sources in tests and against
//! the live adapters in production. Implementations return plain record
//! snapshots; nothing behind these traits is cached between calls.

use crate::error::SourceError;
use crate::error::TableQueryError;
use crate::records::AdapterId;
use crate::records::LegacyDeviceRecord;
use crate::records::MonitorHandleRecord;
use crate::records::MonitorRecord;
use crate::records::PathRecord;

/// How the source id of a display path can be obtained on this platform.
///
/// This is a routing value, not an error: a path without the direct
/// accessor simply resolves through the table scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceIdCapability {
    /// The path object exposes the direct source-id accessor.
    Direct,
    /// Older platform; the source id must come from a path-table scan.
    TableScan,
}

/// One display path yielded by the modern enumeration.
pub trait PathProbe {
    /// The monitor attached to this path's target, if any. A path whose
    /// target has no attached monitor yields `None` and is skipped by the
    /// correlation engine.
    fn monitor(&self) -> Option<MonitorRecord>;

    /// Result of the capability probe, performed once per path object.
    fn source_id_capability(&self) -> SourceIdCapability;

    /// The direct source-id accessor. Only called when the capability
    /// probe reported [`SourceIdCapability::Direct`].
    fn direct_source_id(&self) -> Result<u32, SourceError>;
}

/// The modern path enumeration.
pub trait PathEnumeration {
    type Path: PathProbe;

    /// All currently active display paths, in platform traversal order.
    /// That order is implementation-defined but stable, and the engine
    /// preserves it in its output.
    fn active_paths(&self) -> Result<Vec<Self::Path>, SourceError>;
}

/// The legacy nested device enumeration (adapters, then monitors per
/// adapter).
pub trait LegacyDeviceEnumeration {
    fn legacy_devices(&self) -> Result<Vec<LegacyDeviceRecord>, SourceError>;
}

/// The monitor-handle enumeration.
pub trait MonitorHandleEnumeration {
    fn monitor_handles(&self) -> Result<Vec<MonitorHandleRecord>, SourceError>;
}

/// Snapshot query over the active-path configuration table.
///
/// Implementations hide the two-call size negotiation: a consistent table
/// comes back as one value, and a path count that changed between the two
/// calls comes back as [`TableQueryError::ConfigurationChanged`].
pub trait PathTableQuery {
    fn active_path_table(&self) -> Result<Vec<PathRecord>, TableQueryError>;
}

/// The single-record GDI source-name query, keyed by adapter id and
/// source id.
pub trait SourceNameQuery {
    fn gdi_device_name(&self, adapter_id: AdapterId, source_id: u32)
        -> Result<String, SourceError>;
}

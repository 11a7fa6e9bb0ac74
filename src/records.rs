//! Record types yielded by the individual enumeration spaces and the
//! unified identity assembled from them.
//!
//! Every record is an immutable snapshot scoped to a single enumeration
//! pass; nothing here carries identity across passes.

use serde::Deserialize;
use serde::Serialize;

/// An adapter LUID split into its high and low halves.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct AdapterId {
    pub high: i32,
    pub low: u32,
}

/// A rectangle in virtual-desktop coordinates.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// An opaque monitor handle as yielded by the handle enumeration.
///
/// Only valid for the lifetime of the enumeration snapshot it came from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MonitorHandle(pub isize);

/// Snapshot of one attached monitor from the modern path enumeration.
///
/// `target_id` is the adapter-relative id of the path's target and is the
/// key used to resolve the matching source id. Refresh rate and mode count
/// are read off the owning path object at enumeration time; either can be
/// unavailable on a given platform.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MonitorRecord {
    pub display_name: String,
    pub device_id: String,
    pub adapter_id: AdapterId,
    pub target_id: u32,
    pub refresh_rate: Option<f32>,
    pub mode_count: Option<u32>,
}

/// One (adapter device name, monitor device id) pair from the legacy
/// nested device enumeration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LegacyDeviceRecord {
    pub adapter_device_name: String,
    pub monitor_device_id: String,
}

/// A monitor handle plus the geometry carried by the handle enumeration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MonitorHandleRecord {
    pub adapter_device_name: String,
    pub handle: MonitorHandle,
    pub is_primary: bool,
    pub work_area: Rect,
}

/// One row of the active display-configuration path table, linking a
/// target id to the source id that drives it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PathRecord {
    pub adapter_id: AdapterId,
    pub source_id: u32,
    pub target_id: u32,
}

/// The unified identity of one physical display, joined across all
/// enumeration spaces.
///
/// `device_instance_id` is empty when the device id does not carry an
/// instance id. Every other field that depends on a cross-source join is
/// `None` when that join could not be made; a partial record is still a
/// valid record.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UnifiedIdentity {
    pub display_name: String,
    pub device_id: String,
    pub device_instance_id: String,
    pub gdi_device_name: Option<String>,
    pub monitor_handle: Option<MonitorHandle>,
    pub source_id: Option<u32>,
    pub refresh_rate: Option<f32>,
    pub mode_count: Option<u32>,
    pub is_primary: Option<bool>,
    pub working_area: Option<Rect>,
}

/// A legacy device entry paired with the monitor handle that shares its
/// adapter device name. Produced by the GDI-only join, which works without
/// the modern path enumeration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeviceMonitorPair {
    pub monitor_handle: MonitorHandle,
    pub adapter_device_name: String,
    pub device_id: String,
    pub device_instance_id: String,
}

//! The cross-source correlation engine.

use std::collections::HashMap;

use crate::error::SourceError;
use crate::instance_id::device_instance_id;
use crate::records::DeviceMonitorPair;
use crate::records::LegacyDeviceRecord;
use crate::records::MonitorHandleRecord;
use crate::records::UnifiedIdentity;
use crate::resolve::resolve_source_id;
use crate::sources::LegacyDeviceEnumeration;
use crate::sources::MonitorHandleEnumeration;
use crate::sources::PathEnumeration;
use crate::sources::PathProbe;
use crate::sources::PathTableQuery;
use crate::sources::SourceNameQuery;

/// Correlates every enumeration space into one identity per attached
/// monitor.
///
/// Records come back in the traversal order of the modern path
/// enumeration. A failure scoped to a single display degrades that one
/// record; a failing enumeration source aborts the whole pass.
pub fn unified_identities<S>(sources: &S) -> Result<Vec<UnifiedIdentity>, SourceError>
where
    S: PathEnumeration
        + LegacyDeviceEnumeration
        + MonitorHandleEnumeration
        + PathTableQuery
        + SourceNameQuery,
{
    let paths = sources.active_paths()?;
    let legacy = sources.legacy_devices()?;
    let handles = sources.monitor_handles()?;

    // Adapter device names are unique per active display pair within one
    // snapshot; if the platform ever repeats one, the first record in
    // enumeration order wins.
    let mut legacy_by_name: HashMap<&str, &LegacyDeviceRecord> = HashMap::new();
    for record in &legacy {
        legacy_by_name
            .entry(record.adapter_device_name.as_str())
            .or_insert(record);
    }
    let mut handles_by_name: HashMap<&str, &MonitorHandleRecord> = HashMap::new();
    for record in &handles {
        handles_by_name
            .entry(record.adapter_device_name.as_str())
            .or_insert(record);
    }

    let mut identities = Vec::with_capacity(paths.len());
    for probe in &paths {
        let Some(monitor) = probe.monitor() else {
            continue;
        };
        let device_instance_id = device_instance_id(&monitor.device_id);

        let source_id = match resolve_source_id(probe, sources, monitor.target_id) {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!(
                    target_id = monitor.target_id,
                    error = %error,
                    "source id resolution failed"
                );
                None
            }
        };

        let gdi_device_name = source_id.and_then(|id| {
            match sources.gdi_device_name(monitor.adapter_id, id) {
                Ok(name) => Some(name),
                Err(error) => {
                    tracing::warn!(source_id = id, error = %error, "GDI name query failed");
                    None
                }
            }
        });

        let mut monitor_handle = None;
        let mut is_primary = None;
        let mut working_area = None;
        if let Some(name) = gdi_device_name.as_deref() {
            if let Some(handle) = handles_by_name.get(name) {
                monitor_handle = Some(handle.handle);
                is_primary = Some(handle.is_primary);
                working_area = Some(handle.work_area);
            }
            if let Some(device) = legacy_by_name.get(name) {
                if device.monitor_device_id != monitor.device_id {
                    tracing::warn!(
                        gdi_device_name = name,
                        path_device_id = %monitor.device_id,
                        legacy_device_id = %device.monitor_device_id,
                        "device id differs between path and legacy enumerations"
                    );
                }
            }
        }

        identities.push(UnifiedIdentity {
            display_name: monitor.display_name,
            device_id: monitor.device_id,
            device_instance_id,
            gdi_device_name,
            monitor_handle,
            source_id,
            refresh_rate: monitor.refresh_rate,
            mode_count: monitor.mode_count,
            is_primary,
            working_area,
        });
    }
    Ok(identities)
}

/// Pairs every monitor handle with the legacy device entries sharing its
/// adapter device name.
///
/// This join never touches the modern path enumeration, so it works on any
/// platform version that has the two legacy surfaces.
pub fn device_monitor_pairs<S>(sources: &S) -> Result<Vec<DeviceMonitorPair>, SourceError>
where
    S: LegacyDeviceEnumeration + MonitorHandleEnumeration,
{
    let devices = sources.legacy_devices()?;
    let handles = sources.monitor_handles()?;

    let mut pairs = Vec::new();
    for handle in &handles {
        for device in devices
            .iter()
            .filter(|device| device.adapter_device_name == handle.adapter_device_name)
        {
            pairs.push(DeviceMonitorPair {
                monitor_handle: handle.handle,
                adapter_device_name: device.adapter_device_name.clone(),
                device_id: device.monitor_device_id.clone(),
                device_instance_id: device_instance_id(&device.monitor_device_id),
            });
        }
    }
    Ok(pairs)
}

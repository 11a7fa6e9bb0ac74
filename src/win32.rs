//! Live adapters over the Win32 and WinRT display enumeration surfaces.
//!
//! Everything in this module is a thin shim: it turns native calls into
//! the plain records consumed by the correlation engine and maps native
//! failures into [`SourceError`] values carrying the failing API name and
//! platform status code. No correlation logic lives here.

use std::ffi::OsString;
use std::iter::once;
use std::mem::size_of;
use std::os::windows::ffi::OsStringExt;
use std::ptr;

use itertools::Either;
use windows::core::Error as WinError;
use windows::core::Interface;
use windows::core::PCWSTR;
use windows::Devices::Display::Core::DisplayManager;
use windows::Devices::Display::Core::DisplayManagerOptions;
use windows::Devices::Display::Core::DisplayModeQueryOptions;
use windows::Devices::Display::Core::DisplayPath;
use windows::Devices::Display::Core::DisplayTarget;
use windows::Win32::Devices::Display::DisplayConfigGetDeviceInfo;
use windows::Win32::Devices::Display::GetDisplayConfigBufferSizes;
use windows::Win32::Devices::Display::QueryDisplayConfig;
use windows::Win32::Devices::Display::DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME;
use windows::Win32::Devices::Display::DISPLAYCONFIG_MODE_INFO;
use windows::Win32::Devices::Display::DISPLAYCONFIG_PATH_INFO;
use windows::Win32::Devices::Display::DISPLAYCONFIG_SOURCE_DEVICE_NAME;
use windows::Win32::Devices::Display::QDC_ONLY_ACTIVE_PATHS;
use windows::Win32::Foundation::BOOL;
use windows::Win32::Foundation::ERROR_INSUFFICIENT_BUFFER;
use windows::Win32::Foundation::ERROR_SUCCESS;
use windows::Win32::Foundation::LPARAM;
use windows::Win32::Foundation::LUID;
use windows::Win32::Foundation::RECT;
use windows::Win32::Foundation::WIN32_ERROR;
use windows::Win32::Graphics::Gdi::EnumDisplayDevicesW;
use windows::Win32::Graphics::Gdi::EnumDisplayMonitors;
use windows::Win32::Graphics::Gdi::GetMonitorInfoW;
use windows::Win32::Graphics::Gdi::DISPLAY_DEVICEW;
use windows::Win32::Graphics::Gdi::HDC;
use windows::Win32::Graphics::Gdi::HMONITOR;
use windows::Win32::Graphics::Gdi::MONITORINFO;
use windows::Win32::Graphics::Gdi::MONITORINFOEXW;
use windows::Win32::Graphics::Gdi::MONITORINFOF_PRIMARY;
use windows::Win32::System::WinRT::Display::IDisplayPathInterop;
use windows::Win32::UI::WindowsAndMessaging::EDD_GET_DEVICE_INTERFACE_NAME;

use crate::correlate::device_monitor_pairs;
use crate::correlate::unified_identities;
use crate::error::SourceError;
use crate::error::TableQueryError;
use crate::records::AdapterId;
use crate::records::DeviceMonitorPair;
use crate::records::LegacyDeviceRecord;
use crate::records::MonitorHandle;
use crate::records::MonitorHandleRecord;
use crate::records::MonitorRecord;
use crate::records::PathRecord;
use crate::records::Rect;
use crate::records::UnifiedIdentity;
use crate::sources::LegacyDeviceEnumeration;
use crate::sources::MonitorHandleEnumeration;
use crate::sources::PathEnumeration;
use crate::sources::PathProbe;
use crate::sources::PathTableQuery;
use crate::sources::SourceIdCapability;
use crate::sources::SourceNameQuery;

pub(crate) fn display_identities() -> impl Iterator<Item = Result<UnifiedIdentity, SourceError>> {
    match unified_identities(&LiveSources) {
        Ok(identities) => Either::Left(identities.into_iter().map(Ok)),
        Err(e) => Either::Right(once(Err(e))),
    }
}

pub(crate) fn display_device_monitor_pairs(
) -> impl Iterator<Item = Result<DeviceMonitorPair, SourceError>> {
    match device_monitor_pairs(&LiveSources) {
        Ok(pairs) => Either::Left(pairs.into_iter().map(Ok)),
        Err(e) => Either::Right(once(Err(e))),
    }
}

/// The live OS as a source set. Stateless; every trait call reads fresh
/// platform state.
struct LiveSources;

impl PathEnumeration for LiveSources {
    type Path = LivePath;

    fn active_paths(&self) -> Result<Vec<LivePath>, SourceError> {
        enum_display_paths()
    }
}

impl LegacyDeviceEnumeration for LiveSources {
    fn legacy_devices(&self) -> Result<Vec<LegacyDeviceRecord>, SourceError> {
        enum_legacy_devices()
    }
}

impl MonitorHandleEnumeration for LiveSources {
    fn monitor_handles(&self) -> Result<Vec<MonitorHandleRecord>, SourceError> {
        enum_monitor_handles()
    }
}

impl PathTableQuery for LiveSources {
    fn active_path_table(&self) -> Result<Vec<PathRecord>, TableQueryError> {
        query_active_path_table()
    }
}

impl SourceNameQuery for LiveSources {
    fn gdi_device_name(
        &self,
        adapter_id: AdapterId,
        source_id: u32,
    ) -> Result<String, SourceError> {
        query_gdi_device_name(adapter_id, source_id)
    }
}

/// One display path, with the interop capability probed at construction.
pub(crate) struct LivePath {
    monitor: Option<MonitorRecord>,
    interop: Option<IDisplayPathInterop>,
}

impl PathProbe for LivePath {
    fn monitor(&self) -> Option<MonitorRecord> {
        self.monitor.clone()
    }

    fn source_id_capability(&self) -> SourceIdCapability {
        if self.interop.is_some() {
            SourceIdCapability::Direct
        } else {
            SourceIdCapability::TableScan
        }
    }

    fn direct_source_id(&self) -> Result<u32, SourceError> {
        let interop = self.interop.as_ref().ok_or(SourceError::PlatformCall {
            api: "IDisplayPathInterop::GetSourceId",
            status: 0,
        })?;
        unsafe { interop.GetSourceId() }
            .map_err(|e| platform_error("IDisplayPathInterop::GetSourceId", &e))
    }
}

fn platform_error(api: &'static str, error: &WinError) -> SourceError {
    SourceError::PlatformCall {
        api,
        status: error.code().0,
    }
}

/// Walks the current display state, view by view and path by path, in the
/// platform's traversal order. The display manager is released before
/// returning, whether the walk succeeded or not.
fn enum_display_paths() -> Result<Vec<LivePath>, SourceError> {
    let manager = DisplayManager::Create(DisplayManagerOptions::None)
        .map_err(|e| platform_error("DisplayManager::Create", &e))?;
    let paths = walk_display_paths(&manager);
    let _ = manager.Close();
    paths
}

fn walk_display_paths(manager: &DisplayManager) -> Result<Vec<LivePath>, SourceError> {
    let state = manager
        .TryReadCurrentStateForAllTargets()
        .and_then(|result| result.State())
        .map_err(|e| platform_error("DisplayManager::TryReadCurrentStateForAllTargets", &e))?;
    let views = state
        .Views()
        .map_err(|e| platform_error("DisplayState::Views", &e))?;

    let mut paths = Vec::new();
    for view_index in 0..views.Size().map_err(|e| platform_error("DisplayState::Views", &e))? {
        let view = views
            .GetAt(view_index)
            .map_err(|e| platform_error("DisplayState::Views", &e))?;
        let view_paths = view
            .Paths()
            .map_err(|e| platform_error("DisplayView::Paths", &e))?;
        for path_index in
            0..view_paths.Size().map_err(|e| platform_error("DisplayView::Paths", &e))?
        {
            let path = view_paths
                .GetAt(path_index)
                .map_err(|e| platform_error("DisplayView::Paths", &e))?;
            paths.push(probe_path(&path));
        }
    }
    Ok(paths)
}

fn probe_path(path: &DisplayPath) -> LivePath {
    let monitor = path
        .Target()
        .ok()
        .and_then(|target| monitor_record(path, &target));
    let interop = path.cast::<IDisplayPathInterop>().ok();
    LivePath { monitor, interop }
}

/// `TryGetMonitor` yields nothing for a target with no attached monitor;
/// such paths carry no record and the engine skips them.
fn monitor_record(path: &DisplayPath, target: &DisplayTarget) -> Option<MonitorRecord> {
    let monitor = target.TryGetMonitor().ok()?;
    let adapter_id = monitor.DisplayAdapterId().ok()?;
    Some(MonitorRecord {
        display_name: monitor.DisplayName().ok()?.to_string(),
        device_id: monitor.DeviceId().ok()?.to_string(),
        adapter_id: AdapterId {
            high: adapter_id.HighPart,
            low: adapter_id.LowPart,
        },
        target_id: target.AdapterRelativeId().ok()?,
        refresh_rate: refresh_rate(path),
        mode_count: path
            .FindModes(DisplayModeQueryOptions::None)
            .ok()
            .and_then(|modes| modes.Size().ok()),
    })
}

fn refresh_rate(path: &DisplayPath) -> Option<f32> {
    let rate = path.PresentationRate().ok()?.Value().ok()?;
    let vsync = rate.VerticalSyncRate;
    (vsync.Denominator != 0).then(|| vsync.Numerator as f32 / vsync.Denominator as f32)
}

/// Nested legacy enumeration: adapters first, then the monitors attached
/// to each adapter. `EnumDisplayDevicesW` signals the end of a list by
/// returning false, so exhaustion is not an error.
fn enum_legacy_devices() -> Result<Vec<LegacyDeviceRecord>, SourceError> {
    let mut records = Vec::new();
    let adapters = unsafe { enum_display_devices(PCWSTR::null()) };
    for adapter in &adapters {
        let adapter_device_name = wchar_to_string(&adapter.DeviceName);
        let monitors = unsafe { enum_display_devices(PCWSTR(adapter.DeviceName.as_ptr())) };
        for monitor in &monitors {
            records.push(LegacyDeviceRecord {
                adapter_device_name: adapter_device_name.clone(),
                monitor_device_id: wchar_to_string(&monitor.DeviceID),
            });
        }
    }
    Ok(records)
}

unsafe fn enum_display_devices(device: PCWSTR) -> Vec<DISPLAY_DEVICEW> {
    (0..)
        .map_while(|device_number| {
            let mut device_info = DISPLAY_DEVICEW {
                cb: size_of::<DISPLAY_DEVICEW>() as u32,
                ..Default::default()
            };
            EnumDisplayDevicesW(
                device,
                device_number,
                &mut device_info,
                EDD_GET_DEVICE_INTERFACE_NAME,
            )
            .as_bool()
            .then_some(device_info)
        })
        .collect()
}

fn enum_monitor_handles() -> Result<Vec<MonitorHandleRecord>, SourceError> {
    unsafe extern "system" fn enum_monitors(
        handle: HMONITOR,
        _: HDC,
        _: *mut RECT,
        data: LPARAM,
    ) -> BOOL {
        let monitors = &mut *(data.0 as *mut Vec<HMONITOR>);
        monitors.push(handle);
        true.into()
    }

    unsafe {
        let mut hmonitors = Vec::<HMONITOR>::new();
        EnumDisplayMonitors(
            HDC::default(),
            Some(ptr::null_mut()),
            Some(enum_monitors),
            LPARAM(&mut hmonitors as *mut _ as isize),
        )
        .ok()
        .map_err(|e| platform_error("EnumDisplayMonitors", &e))?;

        let mut records = Vec::with_capacity(hmonitors.len());
        for hmonitor in hmonitors {
            let mut info = MONITORINFOEXW::default();
            info.monitorInfo.cbSize = size_of::<MONITORINFOEXW>() as u32;
            let info_ptr = &mut info as *mut _ as *mut MONITORINFO;
            GetMonitorInfoW(hmonitor, info_ptr)
                .ok()
                .map_err(|e| platform_error("GetMonitorInfoW", &e))?;
            records.push(MonitorHandleRecord {
                adapter_device_name: wchar_to_string(&info.szDevice),
                handle: MonitorHandle(hmonitor.0 as isize),
                is_primary: flag_set(info.monitorInfo.dwFlags, MONITORINFOF_PRIMARY),
                work_area: rect_from(info.monitorInfo.rcWork),
            });
        }
        Ok(records)
    }
}

/// Two-call size negotiation over the active-path table. A path count that
/// grows between the calls surfaces as `ConfigurationChanged`; the
/// resolver retries the whole snapshot.
fn query_active_path_table() -> Result<Vec<PathRecord>, TableQueryError> {
    unsafe {
        let mut path_count = 0;
        let mut mode_count = 0;
        GetDisplayConfigBufferSizes(QDC_ONLY_ACTIVE_PATHS, &mut path_count, &mut mode_count)
            .ok()
            .map_err(|e| {
                TableQueryError::Platform(platform_error("GetDisplayConfigBufferSizes", &e))
            })?;
        let mut display_paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
        let mut display_modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];
        QueryDisplayConfig(
            QDC_ONLY_ACTIVE_PATHS,
            &mut path_count,
            display_paths.as_mut_ptr(),
            &mut mode_count,
            display_modes.as_mut_ptr(),
            Some(ptr::null_mut()),
        )
        .ok()
        .map_err(|e| {
            if e.code() == ERROR_INSUFFICIENT_BUFFER.to_hresult() {
                TableQueryError::ConfigurationChanged
            } else {
                TableQueryError::Platform(platform_error("QueryDisplayConfig", &e))
            }
        })?;
        // The call may shrink the counts if paths went away mid-query.
        display_paths.truncate(path_count as usize);

        Ok(display_paths
            .iter()
            .map(|path| PathRecord {
                adapter_id: AdapterId {
                    high: path.targetInfo.adapterId.HighPart,
                    low: path.targetInfo.adapterId.LowPart,
                },
                source_id: path.sourceInfo.id,
                target_id: path.targetInfo.id,
            })
            .collect())
    }
}

fn query_gdi_device_name(adapter_id: AdapterId, source_id: u32) -> Result<String, SourceError> {
    unsafe {
        let mut request = DISPLAYCONFIG_SOURCE_DEVICE_NAME::default();
        request.header.size = size_of::<DISPLAYCONFIG_SOURCE_DEVICE_NAME>() as u32;
        request.header.adapterId = LUID {
            LowPart: adapter_id.low,
            HighPart: adapter_id.high,
        };
        request.header.id = source_id;
        request.header.r#type = DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME;

        match WIN32_ERROR(DisplayConfigGetDeviceInfo(&mut request.header) as u32) {
            ERROR_SUCCESS => Ok(wchar_to_string(&request.viewGdiDeviceName)),
            error => Err(SourceError::PlatformCall {
                api: "DisplayConfigGetDeviceInfo",
                status: error.0 as i32,
            }),
        }
    }
}

fn rect_from(rect: RECT) -> Rect {
    Rect {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

#[inline]
fn flag_set<T: std::ops::BitAnd<Output = T> + PartialEq + Copy>(t: T, flag: T) -> bool {
    t & flag == flag
}

fn wchar_to_string(s: &[u16]) -> String {
    let end = s.iter().position(|&x| x == 0).unwrap_or(s.len());
    let truncated = &s[0..end];
    OsString::from_wide(truncated).to_string_lossy().into()
}

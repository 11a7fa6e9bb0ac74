//! Source-id resolution for display targets.

use crate::error::ResolveError;
use crate::error::TableQueryError;
use crate::sources::PathProbe;
use crate::sources::PathTableQuery;
use crate::sources::SourceIdCapability;

/// Resolves the source id for the display path represented by `probe`.
///
/// Paths with the direct accessor resolve through it alone; the path table
/// is never queried for them. Older platforms fall back to scanning the
/// active-path table for the first entry whose target id matches
/// `target_id`. A table query that reports a configuration change is
/// retried once before the failure is surfaced.
pub fn resolve_source_id<P, T>(probe: &P, table: &T, target_id: u32) -> Result<u32, ResolveError>
where
    P: PathProbe,
    T: PathTableQuery + ?Sized,
{
    match probe.source_id_capability() {
        SourceIdCapability::Direct => Ok(probe.direct_source_id()?),
        SourceIdCapability::TableScan => scan_path_table(table, target_id),
    }
}

fn scan_path_table<T>(table: &T, target_id: u32) -> Result<u32, ResolveError>
where
    T: PathTableQuery + ?Sized,
{
    let records = match table.active_path_table() {
        Ok(records) => records,
        Err(TableQueryError::ConfigurationChanged) => {
            tracing::debug!("active path table changed mid-query, retrying once");
            match table.active_path_table() {
                Ok(records) => records,
                Err(TableQueryError::ConfigurationChanged) => {
                    return Err(ResolveError::ConfigurationChanged)
                }
                Err(TableQueryError::Platform(e)) => return Err(e.into()),
            }
        }
        Err(TableQueryError::Platform(e)) => return Err(e.into()),
    };
    records
        .iter()
        .find(|path| path.target_id == target_id)
        .map(|path| path.source_id)
        .ok_or(ResolveError::NoMatchingTarget { target_id })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::cell::RefCell;

    use crate::error::ResolveError;
    use crate::error::SourceError;
    use crate::error::TableQueryError;
    use crate::records::AdapterId;
    use crate::records::MonitorRecord;
    use crate::records::PathRecord;
    use crate::sources::PathProbe;
    use crate::sources::PathTableQuery;
    use crate::sources::SourceIdCapability;

    use super::resolve_source_id;

    struct Probe {
        capability: SourceIdCapability,
        direct: Result<u32, SourceError>,
        direct_calls: Cell<u32>,
    }

    impl Probe {
        fn direct(source_id: u32) -> Self {
            Self {
                capability: SourceIdCapability::Direct,
                direct: Ok(source_id),
                direct_calls: Cell::new(0),
            }
        }

        fn table_scan() -> Self {
            Self {
                capability: SourceIdCapability::TableScan,
                direct: Err(SourceError::PlatformCall {
                    api: "direct accessor",
                    status: -1,
                }),
                direct_calls: Cell::new(0),
            }
        }
    }

    impl PathProbe for Probe {
        fn monitor(&self) -> Option<MonitorRecord> {
            None
        }

        fn source_id_capability(&self) -> SourceIdCapability {
            self.capability
        }

        fn direct_source_id(&self) -> Result<u32, SourceError> {
            self.direct_calls.set(self.direct_calls.get() + 1);
            self.direct.clone()
        }
    }

    /// Replays a scripted sequence of query outcomes and counts calls.
    struct Table {
        outcomes: RefCell<Vec<Result<Vec<PathRecord>, TableQueryError>>>,
        calls: Cell<u32>,
    }

    impl Table {
        fn new(outcomes: Vec<Result<Vec<PathRecord>, TableQueryError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes),
                calls: Cell::new(0),
            }
        }
    }

    impl PathTableQuery for Table {
        fn active_path_table(&self) -> Result<Vec<PathRecord>, TableQueryError> {
            self.calls.set(self.calls.get() + 1);
            self.outcomes.borrow_mut().remove(0)
        }
    }

    fn path(target_id: u32, source_id: u32) -> PathRecord {
        PathRecord {
            adapter_id: AdapterId { high: 0, low: 9 },
            source_id,
            target_id,
        }
    }

    #[test]
    fn direct_capability_never_touches_the_table() {
        let probe = Probe::direct(3);
        let table = Table::new(vec![Ok(vec![path(7, 2)])]);

        assert_eq!(resolve_source_id(&probe, &table, 7), Ok(3));
        assert_eq!(probe.direct_calls.get(), 1);
        assert_eq!(table.calls.get(), 0);
    }

    #[test]
    fn fallback_scans_for_the_matching_target() {
        let probe = Probe::table_scan();
        let table = Table::new(vec![Ok(vec![path(3, 0), path(7, 2), path(7, 5)])]);

        // First match wins.
        assert_eq!(resolve_source_id(&probe, &table, 7), Ok(2));
        assert_eq!(probe.direct_calls.get(), 0);
        assert_eq!(table.calls.get(), 1);
    }

    #[test]
    fn fallback_without_a_matching_target_fails() {
        let probe = Probe::table_scan();
        let table = Table::new(vec![Ok(vec![path(3, 0)])]);

        assert_eq!(
            resolve_source_id(&probe, &table, 7),
            Err(ResolveError::NoMatchingTarget { target_id: 7 })
        );
    }

    #[test]
    fn configuration_change_is_retried_once() {
        let probe = Probe::table_scan();
        let table = Table::new(vec![
            Err(TableQueryError::ConfigurationChanged),
            Ok(vec![path(7, 2)]),
        ]);

        assert_eq!(resolve_source_id(&probe, &table, 7), Ok(2));
        assert_eq!(table.calls.get(), 2);
    }

    #[test]
    fn persistent_configuration_change_gives_up_after_one_retry() {
        let probe = Probe::table_scan();
        let table = Table::new(vec![
            Err(TableQueryError::ConfigurationChanged),
            Err(TableQueryError::ConfigurationChanged),
        ]);

        assert_eq!(
            resolve_source_id(&probe, &table, 7),
            Err(ResolveError::ConfigurationChanged)
        );
        assert_eq!(table.calls.get(), 2);
    }

    #[test]
    fn platform_failure_in_the_table_query_propagates() {
        let probe = Probe::table_scan();
        let error = SourceError::PlatformCall {
            api: "QueryDisplayConfig",
            status: 5,
        };
        let table = Table::new(vec![Err(TableQueryError::Platform(error.clone()))]);

        assert_eq!(
            resolve_source_id(&probe, &table, 7),
            Err(ResolveError::Platform(error))
        );
        assert_eq!(table.calls.get(), 1);
    }
}

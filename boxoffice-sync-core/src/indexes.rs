//! Query-supporting indexes on the synced collection.
//!
//! Index creation is best-effort: every index is attempted, failures are
//! collected as warnings and never abort the remaining ones.

use std::fmt;
use tracing::{info, warn};

use crate::contract::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDirection {
    Ascending,
    Descending,
}

impl IndexDirection {
    /// `1` or `-1`, as index key documents spell it.
    pub fn as_i32(self) -> i32 {
        match self {
            IndexDirection::Ascending => 1,
            IndexDirection::Descending => -1,
        }
    }
}

/// A single-field index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    /// Dotted path, e.g. `shows.movie_id`.
    pub field: &'static str,
    pub direction: IndexDirection,
}

impl IndexSpec {
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: IndexDirection::Ascending,
        }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: IndexDirection::Descending,
        }
    }

    /// Default server-side name (`<field>_<direction>`).
    pub fn name(&self) -> String {
        format!("{}_{}", self.field, self.direction.as_i32())
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Indexes maintained on the synced collection, in creation order.
pub const INDEXES: [IndexSpec; 9] = [
    IndexSpec::desc("date"),
    IndexSpec::desc("last_updated"),
    IndexSpec::desc("synced_at"),
    IndexSpec::asc("shows.movie_id"),
    IndexSpec::asc("shows.movie_name"),
    IndexSpec::asc("shows.venue"),
    IndexSpec::desc("shows.show_date"),
    IndexSpec::desc("shows.occupancy_percent"),
    IndexSpec::desc("shows.gross"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexWarning {
    pub index: IndexSpec,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Names of indexes confirmed to exist.
    pub ensured: Vec<String>,
    pub warnings: Vec<IndexWarning>,
}

impl IndexReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Ensures every index in [`INDEXES`] exists on the store's collection.
pub async fn ensure_indexes<S>(store: &S) -> IndexReport
where
    S: DocumentStore + ?Sized,
{
    info!(count = INDEXES.len(), "[SYNC][INDEX] Ensuring indexes");
    let mut report = IndexReport::default();

    for index in &INDEXES {
        match store.ensure_index(index).await {
            Ok(name) => {
                info!(index = %name, "[SYNC][INDEX] Index ensured");
                report.ensured.push(name);
            }
            Err(e) => {
                warn!(index = %index, error = %e, "[SYNC][INDEX] Index creation warning");
                report.warnings.push(IndexWarning {
                    index: *index,
                    message: e.to_string(),
                });
            }
        }
    }

    if report.is_complete() {
        info!(ensured = report.ensured.len(), "[SYNC][INDEX] All indexes ensured");
    } else {
        warn!(
            ensured = report.ensured.len(),
            failed = report.warnings.len(),
            "[SYNC][INDEX] Some indexes could not be ensured"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockDocumentStore;

    #[test]
    fn names_follow_field_and_direction() {
        assert_eq!(IndexSpec::desc("date").name(), "date_-1");
        assert_eq!(IndexSpec::asc("shows.movie_id").name(), "shows.movie_id_1");
    }

    #[test]
    fn index_set_is_fixed() {
        let names: Vec<String> = INDEXES.iter().map(IndexSpec::name).collect();
        assert_eq!(
            names,
            [
                "date_-1",
                "last_updated_-1",
                "synced_at_-1",
                "shows.movie_id_1",
                "shows.movie_name_1",
                "shows.venue_1",
                "shows.show_date_-1",
                "shows.occupancy_percent_-1",
                "shows.gross_-1",
            ]
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let mut store = MockDocumentStore::new();
        store
            .expect_ensure_index()
            .times(INDEXES.len())
            .returning(|index| {
                if index.field == "synced_at" {
                    Err("index build interrupted".into())
                } else {
                    Ok(index.name())
                }
            });

        let report = ensure_indexes(&store).await;
        assert_eq!(report.ensured.len(), INDEXES.len() - 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].index, IndexSpec::desc("synced_at"));
        assert!(report.warnings[0].message.contains("interrupted"));
        assert!(!report.is_complete());
    }
}

//! Per-table replication statistics reporting.

use crate::clients::ReplicationClient;
use crate::error::HarnessResult;
use crate::types::TableStatistics;

/// Fetches the task's per-table counters, sorted for deterministic output.
///
/// Rows are sorted ascending by `(schema_name, table_name)` lexicographically,
/// regardless of the order the control plane reports them in.
pub async fn table_statistics<R>(client: &R, task: &str) -> HarnessResult<Vec<TableStatistics>>
where
    R: ReplicationClient,
{
    let mut rows = client.table_statistics(task).await?;
    rows.sort_by(|a, b| {
        (a.schema_name.as_str(), a.table_name.as_str())
            .cmp(&(b.schema_name.as_str(), b.table_name.as_str()))
    });

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, HarnessResult};
    use crate::harness_error;
    use crate::types::{StartMode, TaskStatus};

    /// Control plane stub reporting statistics in a deliberately unsorted order.
    struct UnsortedStatistics;

    fn row(schema: &str, table: &str) -> TableStatistics {
        TableStatistics {
            schema_name: schema.to_string(),
            table_name: table.to_string(),
            full_load_rows: 0,
            inserts: 0,
            updates: 0,
            deletes: 0,
        }
    }

    impl ReplicationClient for UnsortedStatistics {
        async fn start_task(&self, _task: &str, _mode: StartMode) -> HarnessResult<TaskStatus> {
            Err(harness_error!(
                ErrorKind::ControlPlaneError,
                "not supported by this stub"
            ))
        }

        async fn stop_task(&self, _task: &str) -> HarnessResult<TaskStatus> {
            Err(harness_error!(
                ErrorKind::ControlPlaneError,
                "not supported by this stub"
            ))
        }

        async fn task_status(&self, _task: &str) -> HarnessResult<TaskStatus> {
            Err(harness_error!(
                ErrorKind::ControlPlaneError,
                "not supported by this stub"
            ))
        }

        async fn table_statistics(&self, _task: &str) -> HarnessResult<Vec<TableStatistics>> {
            Ok(vec![
                row("hr", "project"),
                row("finance", "ledger"),
                row("hr", "department"),
                row("hr", "employee"),
            ])
        }
    }

    #[tokio::test]
    async fn statistics_are_sorted_by_schema_then_table() {
        let rows = table_statistics(&UnsortedStatistics, "task").await.unwrap();

        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.schema_name.as_str(), row.table_name.as_str()))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("finance", "ledger"),
                ("hr", "department"),
                ("hr", "employee"),
                ("hr", "project"),
            ]
        );
    }
}

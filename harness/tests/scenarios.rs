//! End-to-end scenario runs against the in-memory pipeline emulation.

use bytes::Bytes;
use harness::fixtures;
use harness::test_utils::{
    TEST_CDC_TASK, TEST_FULL_LOAD_TASK, provisioned_pipeline, test_harness,
};
use harness::types::TaskStatus;

#[tokio::test]
async fn full_load_scenario_observes_sixteen_events() {
    let pipeline = provisioned_pipeline().await;
    let harness = test_harness(&pipeline).await;

    let report = harness.run_full_load().await.unwrap();

    assert_eq!(report.events.len(), fixtures::FULL_LOAD_EXPECTED_EVENTS);

    // The bulk load task terminates on its own.
    assert_eq!(
        pipeline.task_status(TEST_FULL_LOAD_TASK).await.unwrap(),
        TaskStatus::Stopped
    );

    // Statistics arrive sorted by (schema, table) with the fixture row counts.
    let tables: Vec<(&str, u64)> = report
        .statistics
        .iter()
        .map(|row| (row.table_name.as_str(), row.full_load_rows))
        .collect();
    assert_eq!(
        tables,
        vec![("department", 3), ("employee", 4), ("project", 3)]
    );
}

#[tokio::test]
async fn change_capture_scenario_observes_fifteen_events() {
    let pipeline = provisioned_pipeline().await;
    let harness = test_harness(&pipeline).await;

    let report = harness.run_change_capture().await.unwrap();

    assert_eq!(report.events.len(), fixtures::CDC_EXPECTED_EVENTS);

    // The capture task was explicitly stopped at the end of the scenario.
    assert_eq!(
        pipeline.task_status(TEST_CDC_TASK).await.unwrap(),
        TaskStatus::Stopped
    );

    // 1 + 3 inserts, 2 + 1 updates, 1 + 3 deletes across the two batches.
    let totals = report.statistics.iter().fold((0, 0, 0), |acc, row| {
        (
            acc.0 + row.inserts,
            acc.1 + row.updates,
            acc.2 + row.deletes,
        )
    });
    assert_eq!(totals, (4, 3, 4));
}

#[tokio::test]
async fn both_scenarios_run_sequentially_against_the_same_stream() {
    let pipeline = provisioned_pipeline().await;
    let harness = test_harness(&pipeline).await;

    harness.run().await.unwrap();

    // The stream retains the events of both scenarios; each scenario only
    // counted those after its own timestamp floor.
    let total = pipeline.records().await.len();
    assert_eq!(
        total,
        fixtures::FULL_LOAD_EXPECTED_EVENTS + fixtures::CDC_EXPECTED_EVENTS
    );
}

#[tokio::test]
async fn injected_files_are_stored_byte_identical() {
    let pipeline = provisioned_pipeline().await;
    let harness = test_harness(&pipeline).await;

    harness.run_full_load().await.unwrap();

    let stored = pipeline
        .object("source-bucket", "landing/hr/employee/LOAD001.csv")
        .await
        .unwrap();
    assert_eq!(stored, Bytes::from_static(fixtures::EMPLOYEE_SNAPSHOT.as_bytes()));

    let stored = pipeline
        .object("source-bucket", "landing/hr/department/LOAD002.csv")
        .await
        .unwrap();
    assert_eq!(
        stored,
        Bytes::from_static(fixtures::DEPARTMENT_SNAPSHOT.as_bytes())
    );
}

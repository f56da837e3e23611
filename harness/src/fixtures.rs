//! Fixed sample datasets injected into the source store.
//!
//! These fixtures are byte-identical across runs so that the expected event
//! counts stay deterministic. The full-load snapshots carry 4 + 3 + 3 rows;
//! with two control records per table the bulk load produces 16 stream events.
//! The change batches carry 4 + 7 operations; with one control record per
//! distinct table per batch (1 + 3) the change-capture run produces 15.

/// Full snapshot of the `hr.employee` table.
pub const EMPLOYEE_SNAPSHOT: &str = "101,Smith,Bob,2014-06-04,New York
102,Smith,Bob,2015-10-08,Los Angeles
103,Smith,Bob,2017-03-13,Dallas
104,Smith,Bob,2017-03-13,Dallas";

/// Full snapshot of the `hr.department` table.
pub const DEPARTMENT_SNAPSHOT: &str = "201,HR
202,IT
203,Finance";

/// Full snapshot of the `hr.project` table.
pub const PROJECT_SNAPSHOT: &str = "301,Project1,Description1
302,Project2,Description2
303,Project3,Description3";

/// First ordered change-event batch (employee lifecycle).
pub const CHANGE_BATCH_1: &str = "INSERT,employee,hr,101,Smith,Bob,2014-06-04,New York
UPDATE,employee,hr,101,Smith,Bob,2015-10-08,Los Angeles
UPDATE,employee,hr,101,Smith,Bob,2017-03-13,Dallas
DELETE,employee,hr,101,Smith,Bob,2017-03-13,Dallas";

/// Second ordered change-event batch (mixed tables).
pub const CHANGE_BATCH_2: &str = "INSERT,department,hr,204,Software
INSERT,employee,hr,101,Smith,Bob,2015-10-08,Los Angeles
INSERT,project,hr,101,Project1,Description1
DELETE,project,hr,101,Project1,Description1
DELETE,department,hr,301,Software
UPDATE,employee,hr,101,Smith,Bob,2017-03-13,Dallas
DELETE,employee,hr,101,Smith,Bob,2017-03-13,Dallas";

/// Snapshot injection paths, relative to the watched folder.
pub const EMPLOYEE_SNAPSHOT_PATH: &str = "hr/employee/LOAD001.csv";
pub const DEPARTMENT_SNAPSHOT_PATH: &str = "hr/department/LOAD002.csv";
pub const PROJECT_SNAPSHOT_PATH: &str = "hr/project/LOAD003.csv";

/// Change batch file names, relative to the change-data prefix.
pub const CHANGE_BATCH_1_FILE: &str = "cdc0000000001.csv";
pub const CHANGE_BATCH_2_FILE: &str = "cdc0000000002.csv";

/// Stream events the bulk load scenario must observe.
pub const FULL_LOAD_EXPECTED_EVENTS: usize = 16;

/// Stream events the change-capture scenario must observe.
pub const CDC_EXPECTED_EVENTS: usize = 15;

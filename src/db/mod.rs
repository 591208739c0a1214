pub mod approvals;
pub mod db_utils;
pub mod import_tasks;
pub mod initialize;
pub mod log;
pub mod master;
pub mod migrate;
pub mod pool;
pub mod timecards;
pub mod timerecords;
pub mod timesheets;

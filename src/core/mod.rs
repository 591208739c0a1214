pub mod approval;
pub mod calculator;
pub mod geocode;
pub mod import;
pub mod master;
pub mod policy;
pub mod punch;
pub mod rounding;
pub mod sync;
pub mod timecard;
pub mod timerecord;
pub mod timesheet;

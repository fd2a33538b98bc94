mod replay;
mod report;
mod runner;
mod suite;
mod test_run;


pub use replay::run_replay;
pub use report::TestReport;
pub use runner::{RunController, RunOutcome, RunSettings, RunState};
pub use suite::{SuiteEntry, prepare_suite, run_entries, run_suite};
pub use test_run::{PreparedTest, TestResult, run_test};

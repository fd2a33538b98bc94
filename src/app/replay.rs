use crate::args::ReplayArgs;
use crate::error::AppResult;
use crate::record::read_record;

use super::report::TestReport;

/// Prints the report of a recorded run followed by every request.
///
/// # Errors
///
/// Returns an error when the record cannot be read or decoded.
pub async fn run_replay(args: &ReplayArgs) -> AppResult<()> {
    let record = read_record(&args.file, args.format()).await?;
    let report = TestReport::from_record(record);
    print!("{}", report);
    print!("\nRequests:\n{}", report.request_details());
    Ok(())
}

use clap::Parser;

use crate::error::{AppError, AppResult};

use super::LodeArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<LodeArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    LodeArgs::try_parse_from(args).map_err(AppError::from)
}

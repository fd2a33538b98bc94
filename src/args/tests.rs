use std::path::PathBuf;
use std::time::Duration;

use super::test_support::parse_test_args;
use super::*;
use crate::error::{AppError, AppResult};
use crate::record::RecordFormat;

fn test_command(args: LodeArgs) -> AppResult<TestArgs> {
    match args.command {
        Command::Test(test) => Ok(test),
        other => Err(AppError::validation(format!(
            "Expected test command, got {:?}",
            other
        ))),
    }
}

#[test]
fn test_command_defaults() -> AppResult<()> {
    let args = parse_test_args(["lode", "test", "http://localhost"])?;
    if args.verbose || args.no_color {
        return Err(AppError::validation("Global flags should default to off"));
    }
    let params = test_command(args)?.to_params();

    let checks = [
        (params.url == "http://localhost", "Unexpected url"),
        (params.method == "GET", "Unexpected method"),
        (params.freq == 0, "Unexpected freq"),
        (params.delay == Duration::from_secs(1), "Unexpected delay"),
        (params.concurrency == 1, "Unexpected concurrency"),
        (params.max_requests == 0, "Unexpected max requests"),
        (params.max_time.is_zero(), "Unexpected max time"),
        (params.timeout == Duration::from_secs(5), "Unexpected timeout"),
        (params.headers.is_empty(), "Expected no headers"),
        (!params.fail_fast, "Expected fail fast off"),
        (!params.ignore_failures, "Expected ignore failures off"),
        (params.out_file.is_none(), "Expected no output file"),
        (params.out_format == RecordFormat::Json, "Unexpected format"),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(AppError::validation(message));
        }
    }
    Ok(())
}

#[test]
fn test_command_short_flags() -> AppResult<()> {
    let args = parse_test_args([
        "lode",
        "-v",
        "test",
        "http://localhost/api",
        "-m",
        "post",
        "-f",
        "20",
        "-d",
        "250ms",
        "-c",
        "4",
        "-n",
        "100",
        "-l",
        "1m30s",
        "-t",
        "2s",
        "-b",
        "{}",
        "-H",
        "Accept=application/json,X-Trace=1",
        "-H",
        "Authorization=Bearer a=b",
        "-i",
        "-o",
        "run.yml",
        "--fail-fast",
        "--no-color",
    ])?;
    if !args.verbose || !args.no_color {
        return Err(AppError::validation("Expected global flags to be set"));
    }
    let params = test_command(args)?.to_params();

    let expected_headers = vec![
        ("Accept".to_owned(), "application/json".to_owned()),
        ("X-Trace".to_owned(), "1".to_owned()),
        ("Authorization".to_owned(), "Bearer a=b".to_owned()),
    ];
    let checks = [
        (params.method == "post", "Method is normalized later"),
        (params.freq == 20, "Unexpected freq"),
        (params.delay == Duration::from_millis(250), "Unexpected delay"),
        (params.concurrency == 4, "Unexpected concurrency"),
        (params.max_requests == 100, "Unexpected max requests"),
        (params.max_time == Duration::from_secs(90), "Unexpected max time"),
        (params.timeout == Duration::from_secs(2), "Unexpected timeout"),
        (params.body.as_deref() == Some("{}"), "Unexpected body"),
        (params.headers == expected_headers, "Unexpected headers"),
        (params.interactive, "Expected interactive"),
        (params.fail_fast, "Expected fail fast"),
        (params.out_file == Some(PathBuf::from("run.yml")), "Unexpected out"),
        (params.out_format == RecordFormat::Yaml, "Format should follow the extension"),
        (params.capture(), "Expected capture"),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(AppError::validation(message));
        }
    }
    Ok(())
}

#[test]
fn explicit_out_format_wins() -> AppResult<()> {
    let args = parse_test_args([
        "lode",
        "test",
        "http://localhost",
        "--out",
        "run.yaml",
        "--out-format",
        "json",
    ])?;
    let params = test_command(args)?.to_params();
    if params.out_format != RecordFormat::Json {
        return Err(AppError::validation("Expected explicit json format"));
    }
    Ok(())
}

#[test]
fn invalid_values_are_rejected() -> Result<(), String> {
    let cases: [&[&str]; 4] = [
        &["lode", "test", "http://localhost", "-d", "fast"],
        &["lode", "test", "http://localhost", "-H", "NoEquals"],
        &["lode", "test", "http://localhost", "--out-format", "xml"],
        &["lode", "test"],
    ];
    for case in cases {
        if parse_test_args(case.iter().copied()).is_ok() {
            return Err(format!("Expected {:?} to fail", case));
        }
    }
    Ok(())
}

#[test]
fn time_command_sends_one_request() -> AppResult<()> {
    let args = parse_test_args(["lode", "time", "http://localhost", "-m", "HEAD"])?;
    let params = match args.command {
        Command::Time(time) => time.to_params(),
        other => {
            return Err(AppError::validation(format!(
                "Expected time command, got {:?}",
                other
            )));
        }
    };
    if params.concurrency != 1 || params.max_requests != 1 || params.method != "HEAD" {
        return Err(AppError::validation(format!("Unexpected params: {:?}", params)));
    }
    params.validate()?;
    Ok(())
}

#[test]
fn suite_and_replay_commands() -> AppResult<()> {
    let args = parse_test_args(["lode", "suite", "checks.yaml", "--dry-run"])?;
    match args.command {
        Command::Suite(suite) if suite.dry_run && suite.file == PathBuf::from("checks.yaml") => {}
        other => {
            return Err(AppError::validation(format!(
                "Unexpected suite command: {:?}",
                other
            )));
        }
    }

    let args = parse_test_args(["lode", "replay", "run.yml"])?;
    let replay = match args.command {
        Command::Replay(replay) => replay,
        other => {
            return Err(AppError::validation(format!(
                "Unexpected replay command: {:?}",
                other
            )));
        }
    };
    if replay.format() != RecordFormat::Yaml {
        return Err(AppError::validation("Replay format should follow the extension"));
    }

    let args = parse_test_args(["lode", "replay", "run.out", "--in-format", "yaml"])?;
    match args.command {
        Command::Replay(replay) if replay.format() == RecordFormat::Yaml => Ok(()),
        other => Err(AppError::validation(format!(
            "Unexpected replay command: {:?}",
            other
        ))),
    }
}

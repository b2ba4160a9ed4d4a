use calltrace_studio::commands::{execute_watch, validate_args, validate_results_file, WatchArgs};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_validate_args_defaults() {
    assert!(validate_args(&WatchArgs::default()).is_ok());
}

#[test]
fn test_validate_args_zero_capacity() {
    let args = WatchArgs {
        channel_capacity: 0,
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_missing_input() {
    let args = WatchArgs {
        input: Some(PathBuf::from("/definitely/not/here.log")),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_output_is_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let args = WatchArgs {
        output: Some(temp_dir.path().to_path_buf()),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_shared_outputs() {
    let args = WatchArgs {
        output: Some(PathBuf::from("same.txt")),
        orphans: PathBuf::from("same.txt"),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_pipeline_config_from_args() {
    let config = WatchArgs::default().pipeline_config();
    assert_eq!(config.channel_capacity, 100);
    assert_eq!(config.stop_token, "stop");
    assert_eq!(config.join_timeout, Some(Duration::from_secs(30)));

    let unbounded = WatchArgs {
        join_timeout_secs: 0,
        ..Default::default()
    };
    assert_eq!(unbounded.pipeline_config().join_timeout, None);
}

#[tokio::test]
async fn test_watch_writes_all_outputs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("trace.log");
    fs::write(
        &input,
        "2013-10-23T10:12:35.271Z 2013-10-23T10:12:35.471Z t1 svc null->a\n\
         broken line\n\
         2013-10-23T10:12:35.271Z 2013-10-23T10:12:35.471Z t2 other a->b\n",
    )
    .unwrap();

    let args = WatchArgs {
        input: Some(input),
        output: Some(temp_dir.path().join("out/traces.jsonl")),
        orphans: temp_dir.path().join("out/orphans.txt"),
        malformed: temp_dir.path().join("out/malformed.txt"),
        ..Default::default()
    };
    validate_args(&args).unwrap();
    execute_watch(args.clone()).await.unwrap();

    let completed = args.output.unwrap();
    let report = validate_results_file(completed).unwrap();
    assert_eq!(report.traces, 1);
    assert_eq!(report.calls, 1);

    let orphans = validate_results_file(args.orphans).unwrap();
    assert_eq!(orphans.traces, 1);

    assert_eq!(fs::read_to_string(args.malformed).unwrap(), "broken line\n");
}

#[test]
fn test_validate_results_rejects_garbage() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("bad.jsonl");
    fs::write(&path, "{\"id\": 1}\n").unwrap();

    assert!(validate_results_file(path).is_err());
}

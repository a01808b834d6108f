// tests/engine_end_to_end.rs
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use relaunch::config::ConfigFile;
use relaunch::engine::{Engine, EngineParts, EventCallback, EventHandle, StopHandle};
use relaunch::errors::{RelaunchError, Result as RelaunchResult};
use relaunch::fs::RealFileSystem;
use relaunch::process::platform_supervisor;
use relaunch_test_utils::{
    init_tracing, process_alive, read_lines, wait_until, with_timeout, ChannelWatchSource,
    ConfigFileBuilder, FailingWatchSource, RecordingSink, WatchFeed,
};
use tempfile::TempDir;
use tokio::task::JoinHandle;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SETTLE: Duration = Duration::from_secs(5);

struct Running {
    _dir: TempDir,
    feed: WatchFeed,
    sink: RecordingSink,
    stop: StopHandle,
    task: JoinHandle<RelaunchResult<()>>,
}

fn temp_root() -> (TempDir, PathBuf) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn engine_with(cfg: ConfigFile) -> (Engine, WatchFeed, RecordingSink) {
    let (source, feed) = ChannelWatchSource::new();
    let sink = RecordingSink::new();
    let engine = Engine::with_parts(
        cfg,
        EngineParts {
            source: Box::new(source),
            sink: Arc::new(sink.clone()),
            supervisor: platform_supervisor(),
            fs: Arc::new(RealFileSystem),
        },
    )
    .unwrap();
    (engine, feed, sink)
}

async fn launch(dir: TempDir, engine: Engine, feed: WatchFeed, sink: RecordingSink) -> Running {
    let stop = engine.stop_handle();
    let task = tokio::spawn(async move {
        let mut engine = engine;
        engine.start().await
    });
    assert!(wait_until(SETTLE, || feed.is_watching()).await);
    Running {
        _dir: dir,
        feed,
        sink,
        stop,
        task,
    }
}

fn app_pids(log: &Path) -> Vec<u32> {
    read_lines(log)
        .iter()
        .filter_map(|l| l.strip_prefix("app "))
        .filter_map(|pid| pid.trim().parse().ok())
        .collect()
}

fn builds(log: &Path) -> usize {
    read_lines(log).iter().filter(|l| *l == "build").count()
}

fn go_project(root: &Path, log: &Path) -> ConfigFileBuilder {
    ConfigFileBuilder::new(root)
        .debounce_ms(200)
        .watch_ext("*.go")
        .blocking(&format!("sh -c 'echo build >> {}'", log.display()))
        .primary(&format!(
            "sh -c 'echo app $$ >> {}; exec sleep 30'",
            log.display()
        ))
}

#[tokio::test]
async fn go_project_reloads_on_source_changes_only() -> TestResult {
    let (dir, root) = temp_root();
    let log = root.join("events.log");
    let (engine, feed, sink) = engine_with(go_project(&root, &log).build());
    let run = launch(dir, engine, feed, sink).await;

    // Initial generation.
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 1).await);
    let first_app = app_pids(&log)[0];
    assert_eq!(builds(&log), 1);

    // A Go source change: build, old app killed, new app started.
    run.feed.write("main.go");
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 2).await);
    assert_eq!(
        read_lines(&log),
        vec![
            "build".to_string(),
            format!("app {first_app}"),
            "build".to_string(),
            format!("app {}", app_pids(&log)[1]),
        ]
    );
    assert!(!process_alive(first_app));

    // Not allow-listed: nothing happens.
    run.feed.write("README.md");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(builds(&log), 2);

    // Two writes 50ms apart: one generation.
    run.feed.write("main.go");
    tokio::time::sleep(Duration::from_millis(50)).await;
    run.feed.write("main.go");
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 3).await);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(builds(&log), 3);
    assert_eq!(app_pids(&log).len(), 3);

    let current = app_pids(&log)[2];
    assert!(process_alive(current));

    run.stop.stop();
    let result = with_timeout(run.task).await?;
    assert!(result.is_ok(), "engine returned {result:?}");
    assert!(run.feed.is_stopped());
    assert!(wait_until(SETTLE, || !process_alive(current)).await);
    assert!(run.sink.has_notice("stopped"));
    Ok(())
}

#[tokio::test]
async fn stop_is_idempotent() -> TestResult {
    let (dir, root) = temp_root();
    let log = root.join("events.log");
    let (engine, feed, sink) = engine_with(go_project(&root, &log).build());
    let run = launch(dir, engine, feed, sink).await;
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 1).await);

    run.stop.stop();
    run.stop.stop();
    assert!(run.stop.is_stopped());

    let result = with_timeout(run.task).await?;
    assert!(result.is_ok());
    Ok(())
}

#[tokio::test]
async fn callback_can_force_and_suppress_reloads() -> TestResult {
    let (dir, root) = temp_root();
    let log = root.join("events.log");
    let (mut engine, feed, sink) = engine_with(go_project(&root, &log).build());
    engine.attach_callback(|event: &EventCallback| {
        if event.path == Path::new("templates/index.html") {
            EventHandle::Bypass
        } else if event.path.starts_with("generated") {
            EventHandle::Ignore
        } else {
            EventHandle::Continue
        }
    });
    let run = launch(dir, engine, feed, sink).await;
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 1).await);

    run.feed.write("generated/api.go");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(builds(&log), 1);

    run.feed.write("templates/index.html");
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 2).await);

    run.stop.stop();
    with_timeout(run.task).await??;
    Ok(())
}

#[tokio::test]
async fn failed_initial_generation_keeps_watching() -> TestResult {
    let (dir, root) = temp_root();
    let log = root.join("events.log");
    let ready = root.join("ready");
    let cfg = ConfigFileBuilder::new(&root)
        .blocking(&format!("test -f {}", ready.display()))
        .primary(&format!(
            "sh -c 'echo app $$ >> {}; exec sleep 30'",
            log.display()
        ))
        .build();
    let (engine, feed, sink) = engine_with(cfg);
    let run = launch(dir, engine, feed, sink).await;

    assert!(wait_until(SETTLE, || run.sink.has_notice("generation 1 failed")).await);
    assert!(app_pids(&log).is_empty());

    std::fs::write(&ready, "")?;
    run.feed.write("main.go");
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 1).await);

    run.stop.stop();
    with_timeout(run.task).await??;
    Ok(())
}

#[tokio::test]
async fn closed_event_stream_is_a_watch_error() -> TestResult {
    let (dir, root) = temp_root();
    let log = root.join("events.log");
    let (engine, feed, sink) = engine_with(go_project(&root, &log).build());
    let run = launch(dir, engine, feed, sink).await;
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 1).await);
    let app = app_pids(&log)[0];

    run.feed.close();
    let result = with_timeout(run.task).await?;
    assert!(matches!(result, Err(RelaunchError::WatchError(_))));
    assert!(wait_until(SETTLE, || !process_alive(app)).await);
    Ok(())
}

#[tokio::test]
async fn failing_subscription_returns_before_running_anything() -> TestResult {
    let (_dir, root) = temp_root();
    let log = root.join("events.log");
    let sink = RecordingSink::new();
    let mut engine = Engine::with_parts(
        go_project(&root, &log).build(),
        EngineParts {
            source: Box::new(FailingWatchSource),
            sink: Arc::new(sink.clone()),
            supervisor: platform_supervisor(),
            fs: Arc::new(RealFileSystem),
        },
    )?;

    let result = with_timeout(engine.start()).await;
    assert!(matches!(result, Err(RelaunchError::WatchError(_))));
    assert!(read_lines(&log).is_empty());
    Ok(())
}

#[test]
fn missing_root_is_a_config_error() {
    let (_dir, root) = temp_root();
    let cfg = ConfigFileBuilder::new(root.join("does-not-exist"))
        .primary("sleep 1")
        .build();

    match Engine::with_parts(cfg, EngineParts::default()) {
        Err(RelaunchError::ConfigError(msg)) => assert!(msg.contains("root_path")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[tokio::test]
async fn gitignore_rules_are_loaded_from_root() -> TestResult {
    let (dir, root) = temp_root();
    let log = root.join("events.log");
    std::fs::write(root.join(".gitignore"), "tmp/\n")?;
    let cfg = go_project(&root, &log).git(true).build();
    let (engine, feed, sink) = engine_with(cfg);
    let run = launch(dir, engine, feed, sink).await;
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 1).await);

    run.feed.write("tmp/scratch.go");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(builds(&log), 1);

    run.feed.write("cmd/main.go");
    assert!(wait_until(SETTLE, || app_pids(&log).len() == 2).await);

    run.stop.stop();
    with_timeout(run.task).await??;
    Ok(())
}

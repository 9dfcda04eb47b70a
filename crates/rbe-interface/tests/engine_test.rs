//! End-to-end tests against a stand-in engine
//!
//! `fake-rbe` is a shell script that picks its behaviour from the metric
//! argument and otherwise echoes each request line back.

#![cfg(unix)]

use rbe_interface::{
    ErrorRecovery, ProcessLauncher, RbeConfig, RbeError, StderrMode, TokenPolicy, start_process,
};
use rbe_transport::codec;
use std::time::Duration;

const FAKE_RBE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../rbe-transport/tests/fixtures/fake-rbe"
);

const EXPRESSION: [&str; 27] = [
    "(", "(", "4", "+", "2", ")", "^", "2", "+", "2", "^", "2", ")", "+", "(", "(", "4", "+",
    "2", ")", "^", "2", "+", "2", "^", "2", ")",
];

fn fake_config(metric: &str) -> RbeConfig {
    RbeConfig::builder()
        .binary(FAKE_RBE)
        .database_file("test2.rbe")
        .metric(metric)
        .direction("-1")
        .stderr(StderrMode::Discard)
        .build()
        .unwrap()
}

#[test]
fn test_reference_command_line_and_request() {
    let config = RbeConfig::builder()
        .database_files(["test2.rbe"])
        .metric("0")
        .direction("-1")
        .build()
        .unwrap();
    let launcher = ProcessLauncher::new(config).unwrap();
    assert_eq!(launcher.command_line(), vec!["./rbe", "0", "-1", "test2.rbe"]);

    assert_eq!(
        codec::encode_request(&EXPRESSION),
        b"( ( 4 + 2 ) ^ 2 + 2 ^ 2 ) + ( ( 4 + 2 ) ^ 2 + 2 ^ 2 )\n"
    );
}

#[tokio::test]
async fn test_reference_exchange_reaches_engine_intact() {
    let mut session = ProcessLauncher::new(fake_config("0"))
        .unwrap()
        .launch()
        .await
        .unwrap();

    let echoed = session.optimize_tokens(&EXPRESSION).await.unwrap();
    assert_eq!(echoed, "( ( 4 + 2 ) ^ 2 + 2 ^ 2 ) + ( ( 4 + 2 ) ^ 2 + 2 ^ 2 )");
    assert_eq!(session.exchange_count(), 1);

    let status = session.close().await.unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn test_engine_reads_exactly_one_line_per_request() {
    let mut session = ProcessLauncher::new(fake_config("raw"))
        .unwrap()
        .launch()
        .await
        .unwrap();

    // Brackets expose stray whitespace or a carriage return on the line
    let line = session.optimize_tokens(&EXPRESSION).await.unwrap();
    assert_eq!(line, "[( ( 4 + 2 ) ^ 2 + 2 ^ 2 ) + ( ( 4 + 2 ) ^ 2 + 2 ^ 2 )]");

    let line = session.optimize_tokens(&["x"]).await.unwrap();
    assert_eq!(line, "[x]");
}

#[tokio::test]
async fn test_default_policy_passes_whitespace_through() {
    let mut session = ProcessLauncher::new(fake_config("raw"))
        .unwrap()
        .launch()
        .await
        .unwrap();

    let line = session.optimize_tokens(&["a b", "c"]).await.unwrap();
    assert_eq!(line, "[a b c]");
}

#[tokio::test]
async fn test_engine_sees_arguments_in_order() {
    let config = RbeConfig::builder()
        .binary(FAKE_RBE)
        .database_files(["b.rbe", "a.rbe", "b.rbe"])
        .metric("args")
        .direction("1")
        .build()
        .unwrap();
    let mut session = ProcessLauncher::new(config).unwrap().launch().await.unwrap();

    let answer = session.optimize_tokens(&["x"]).await.unwrap();
    assert_eq!(answer, format!("{FAKE_RBE} args 1 b.rbe a.rbe b.rbe"));
}

#[tokio::test]
async fn test_answers_are_trimmed() {
    let mut session = ProcessLauncher::new(fake_config("padded"))
        .unwrap()
        .launch()
        .await
        .unwrap();
    assert_eq!(session.optimize_tokens(&["x", "*", "1"]).await.unwrap(), "x * 1");
}

#[tokio::test]
async fn test_sequential_requests_get_their_own_answers() {
    let mut session = ProcessLauncher::new(fake_config("count"))
        .unwrap()
        .launch()
        .await
        .unwrap();

    assert_eq!(session.optimize_tokens(&["a"]).await.unwrap(), "1: a");
    assert_eq!(session.optimize_tokens(&["b", "c"]).await.unwrap(), "2: b c");
    assert_eq!(session.optimize_tokens(&["d"]).await.unwrap(), "3: d");
    assert_eq!(session.exchange_count(), 3);
}

#[tokio::test]
async fn test_engine_exit_is_an_error_not_a_hang() {
    let mut session = ProcessLauncher::new(fake_config("exit"))
        .unwrap()
        .launch()
        .await
        .unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), session.optimize_tokens(&["x"]))
        .await
        .expect("exchange with an exited engine must not hang")
        .unwrap_err();
    assert!(matches!(err, RbeError::Transport(_)), "unexpected error: {err:?}");
    assert!(err.is_fatal_to_session());
    assert!(session.is_poisoned());
}

#[tokio::test]
async fn test_silent_engine_times_out() {
    let config = RbeConfig {
        response_timeout: Some(Duration::from_millis(100)),
        ..fake_config("mute")
    };
    let mut session = ProcessLauncher::new(config).unwrap().launch().await.unwrap();

    let err = session.optimize_tokens(&["x"]).await.unwrap_err();
    assert!(matches!(err, RbeError::Timeout(_)));
    assert!(matches!(
        session.optimize_tokens(&["y"]).await,
        Err(RbeError::SessionPoisoned)
    ));

    session.terminate().await.unwrap();
    let status = session.close().await.unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn test_strict_invalid_token_leaves_session_usable() {
    let config = RbeConfig {
        token_policy: TokenPolicy::Strict,
        ..fake_config("count")
    };
    let mut session = ProcessLauncher::new(config)
        .unwrap()
        .launch()
        .await
        .unwrap();

    let err = session.optimize_tokens(&["two words"]).await.unwrap_err();
    assert!(matches!(err, RbeError::InvalidToken { index: 0, .. }));

    // Nothing was written, so the engine's counter has not moved
    assert_eq!(session.optimize_tokens(&["ok"]).await.unwrap(), "1: ok");
}

#[tokio::test]
async fn test_independent_sessions_from_one_launcher() {
    let launcher = ProcessLauncher::new(fake_config("count")).unwrap();
    let mut first = launcher.launch().await.unwrap();
    let mut second = launcher.launch().await.unwrap();
    assert_ne!(first.id(), second.id());

    assert_eq!(first.optimize_tokens(&["a"]).await.unwrap(), "1: a");
    assert_eq!(first.optimize_tokens(&["b"]).await.unwrap(), "2: b");
    assert_eq!(second.optimize_tokens(&["c"]).await.unwrap(), "1: c");
}

#[tokio::test]
async fn test_start_process_uses_default_binary() {
    // Run from a directory with no ./rbe so the default path cannot resolve
    let err = start_process(&["test2.rbe"], "0", "-1").await.unwrap_err();
    match &err {
        RbeError::ProcessStart { binary, .. } => assert_eq!(binary, "./rbe"),
        other => panic!("expected ProcessStart, got {other:?}"),
    }
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn test_shutdown_stops_engine() {
    let mut session = ProcessLauncher::new(fake_config("mute"))
        .unwrap()
        .launch()
        .await
        .unwrap();
    assert!(session.is_alive());
    session.shutdown().await.unwrap();
    assert!(!session.is_alive());
    assert!(session.id().is_none());
}

use clirig::staging::{IncludeStyle, StagedScript};
use clirig::{ExecOptions, exec};

#[tokio::test]
async fn test_staged_inline_script_runs_and_cleans_up() {
    let script = StagedScript::inline("echo staged-ran\n")
        .runner("sh")
        .extension("sh");
    let probe = script.clone().materialize().expect("materialize probe");
    let probe_path = probe.path().to_path_buf();
    probe.cleanup().expect("probe cleanup");
    assert!(!probe_path.exists());

    let outcome = exec(ExecOptions::staged(script))
        .await
        .expect("staged script must succeed");
    assert!(outcome.output.contains("staged-ran"));
}

#[tokio::test]
async fn test_staged_script_receives_args() {
    let script = StagedScript::inline("echo \"args: $1 $2\"\n")
        .runner("sh")
        .extension("sh")
        .arg("first")
        .arg("second");
    let outcome = exec(ExecOptions::staged(script))
        .await
        .expect("staged script must succeed");
    assert!(outcome.output.contains("args: first second"));
}

#[tokio::test]
async fn test_staged_script_reads_scripted_inputs() {
    let script = StagedScript::inline("read answer; echo \"answer=$answer\"\n")
        .runner("sh")
        .extension("sh");
    let outcome = exec(
        ExecOptions::staged(script)
            .delay_between_inputs(std::time::Duration::from_millis(50))
            .input("yes\n"),
    )
    .await
    .expect("staged prompt must succeed");
    assert!(outcome.output.contains("answer=yes"));
}

#[tokio::test]
async fn test_failed_staged_run_keeps_the_driver_file() {
    let script = StagedScript::inline("exit 7\n").runner("sh").extension("sh");
    let staged = script.clone().materialize().expect("materialize");
    let path = staged.path().to_path_buf();
    // Run the already-staged command line directly so the path is known.
    let err = exec(ExecOptions::new(staged.command_line()))
        .await
        .expect_err("exit 7 must fail");
    assert_eq!(err.code(), 7);
    assert!(path.exists(), "driver must survive a failed run");
    std::fs::remove_file(path).expect("test cleanup");

    // The engine-owned path behaves the same: a failing staged run is an
    // error and the temp file is not removed by the engine.
    let err = exec(ExecOptions::staged(script))
        .await
        .expect_err("exit 7 must fail");
    assert_eq!(err.code(), 7);
}

#[test]
fn test_module_driver_texts_do_not_need_a_runner() {
    // Rendering is pure; these assertions hold without node installed.
    let require_driver = StagedScript::module("/repo/dist/cli.js")
        .mock("/repo/test/mock-env.js")
        .include_style(IncludeStyle::Require);
    let staged = require_driver.materialize().expect("materialize");
    let body = std::fs::read_to_string(staged.path()).expect("read driver");
    staged.cleanup().expect("cleanup");

    let mock_call = body.find("mock0();").expect("mock invocation");
    let target = body.find("require('/repo/dist/cli')").expect("target include");
    assert!(mock_call < target, "mocks must run before the target loads");

    let import_driver = StagedScript::module("/repo/dist/cli.mts").extension("mts");
    let staged = import_driver.materialize().expect("materialize");
    let body = std::fs::read_to_string(staged.path()).expect("read driver");
    staged.cleanup().expect("cleanup");
    assert!(body.contains("await import("));
}

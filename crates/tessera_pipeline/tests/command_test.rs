//! Shell command runner tests.

use std::path::Path;
use tessera_interface::CommandRunner;
use tessera_pipeline::ShellCommandRunner;

#[test]
fn test_render_substitutes_or_appends_the_file() {
    let file = Path::new("/tmp/out/logo.svg");
    assert_eq!(
        ShellCommandRunner::render("xmllint --noout {{file}}", file),
        "xmllint --noout '/tmp/out/logo.svg'"
    );
    assert_eq!(
        ShellCommandRunner::render("xmllint --noout {{ file }}", file),
        "xmllint --noout '/tmp/out/logo.svg'"
    );
    assert_eq!(
        ShellCommandRunner::render("wc -c", file),
        "wc -c '/tmp/out/logo.svg'"
    );
}

#[tokio::test]
async fn test_run_captures_output_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("slogan.txt");
    tokio::fs::write(&file, "Climb higher").await.unwrap();

    let runner = ShellCommandRunner::new();

    let output = runner.run("cat {{file}}", &file).await.unwrap();
    assert!(output.success());
    assert_eq!(output.stdout(), "Climb higher");

    let output = runner
        .run("grep -q Bakery {{file}} || { echo 'not a bakery slogan' >&2; exit 3; }", &file)
        .await
        .unwrap();
    assert!(!output.success());
    assert_eq!(*output.status(), 3);
    assert_eq!(output.diagnostics(), "not a bakery slogan");
}

#[tokio::test]
async fn test_missing_shell_is_an_error() {
    let runner = ShellCommandRunner::with_shell("/nonexistent/shell");
    assert!(runner.run("true", Path::new("/tmp/x")).await.is_err());
}

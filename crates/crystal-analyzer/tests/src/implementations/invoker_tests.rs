use super::*;

fn sample_request() -> ImplementationsRequest {
    ImplementationsRequest {
        file_path: PathBuf::from("/proj/src/app.cr"),
        line: 12,
        column: 5,
        main_file: PathBuf::from("/proj/src/main.cr"),
    }
}

#[test]
fn builds_the_exact_tool_command_line() {
    let args = tool_args(&sample_request());
    assert_eq!(
        args,
        vec![
            "tool",
            "implementations",
            "-c",
            "/proj/src/app.cr:12:5",
            "/proj/src/main.cr",
            "--no-color",
            "--error-trace",
            "-f",
            "json",
        ]
    );
}

#[test]
fn cursor_argument_keeps_one_based_coordinates() {
    let mut request = sample_request();
    request.line = 1;
    request.column = 1;
    let args = tool_args(&request);
    assert_eq!(args[3], "/proj/src/app.cr:1:1");
}

#[test]
fn spawn_error_display_names_the_compiler() {
    let error = ImplementationsError::SpawnFailed {
        compiler: "crystal".to_string(),
        reason: "No such file or directory".to_string(),
    };
    let rendered = error.to_string();
    assert!(rendered.contains("crystal"), "got: {rendered}");
    assert!(rendered.contains("No such file or directory"), "got: {rendered}");
}

#[tokio::test]
async fn missing_binary_is_a_spawn_failure() {
    let context = InvocationContext::new("/nonexistent/crystal-binary-for-tests");
    let result = run_tool(&context, &tool_args(&sample_request())).await;
    match result {
        Err(ImplementationsError::SpawnFailed { compiler, .. }) => {
            assert_eq!(compiler, "/nonexistent/crystal-binary-for-tests");
        }
        other => panic!("expected spawn failure, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn buffers_the_entire_stdout_stream() {
    let context = InvocationContext::new("echo");
    let args = vec!["-n".to_string(), "chunk-one chunk-two".to_string()];
    let raw = run_tool(&context, &args).await.expect("echo runs everywhere");
    assert_eq!(raw, "chunk-one chunk-two");
}

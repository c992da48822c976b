use super::*;

#[test]
fn parses_json_error_array() {
    let raw = r#"[{"file":"/app/src/foo.cr","line":2,"column":5,"size":3,"message":"undefined method 'bar'"}]"#;

    let problems = parse_problems(raw);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].file.as_deref(), Some("/app/src/foo.cr"));
    assert_eq!(problems[0].line, Some(2));
    assert_eq!(problems[0].column, Some(5));
    assert_eq!(problems[0].size, Some(3));
    assert_eq!(problems[0].message, "undefined method 'bar'");
}

#[test]
fn json_errors_can_come_without_a_location() {
    let raw = r#"[{"file":null,"line":null,"column":null,"size":null,"message":"can't infer the type"}]"#;

    let problems = parse_problems(raw);
    assert_eq!(problems.len(), 1);
    assert!(problems[0].file.is_none());

    let diagnostic = problems[0].clone().into_lsp_diagnostic();
    assert_eq!(diagnostic.range.start, Position::new(0, 0));
    assert_eq!(diagnostic.range.end, Position::new(0, 0));
}

#[test]
fn diagnostic_range_is_zero_based_and_widened_by_size() {
    let problem = CrystalProblem {
        file: Some("/app/src/foo.cr".to_string()),
        line: Some(2),
        column: Some(5),
        size: Some(3),
        message: "boom".to_string(),
    };

    let diagnostic = problem.into_lsp_diagnostic();
    assert_eq!(diagnostic.range.start, Position::new(1, 4));
    assert_eq!(diagnostic.range.end, Position::new(1, 7));
    assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
    assert_eq!(diagnostic.source.as_deref(), Some("crystal"));
}

#[test]
fn success_status_object_yields_no_problems() {
    let raw = r#"{"status":"ok","implementations":[{"line":5,"column":3,"filename":"/a.cr"}]}"#;
    assert!(parse_problems(raw).is_empty());
}

#[test]
fn plain_text_errors_fall_back_to_the_regex() {
    let raw = "Syntax error in /app/src/main.cr:3: unexpected token: end\n";

    let problems = parse_problems(raw);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].file.as_deref(), Some("/app/src/main.cr"));
    assert_eq!(problems[0].line, Some(3));
    assert_eq!(problems[0].message, "unexpected token: end");
}

#[test]
fn error_trace_lines_each_become_a_problem() {
    let raw = concat!(
        "Error in ./src/caller.cr:7: instantiating 'run'\n",
        "\n",
        "Error in ./src/callee.cr:12: undefined local variable or method 'x'\n",
    );

    let problems = parse_problems(raw);
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0].file.as_deref(), Some("./src/caller.cr"));
    assert_eq!(problems[1].line, Some(12));
}

#[test]
fn broken_json_array_falls_back_without_panicking() {
    assert!(parse_problems("[{\"file\": truncated").is_empty());
}

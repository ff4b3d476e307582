use crate::{Diagnostic, Related, Severity, Span};

#[test]
fn unknown_span_display() {
    assert_eq!(Span::default().to_string(), "<unknown>");
    assert_eq!(Span::at(3, 14).to_string(), "3:14");
}

#[test]
fn diagnostic_display_contains_every_part() {
    colored::control::set_override(false);

    let diagnostic = Diagnostic {
        span: Span::at(4, 2),
        message: "the where clause `n % 2 == 1` is not satisfied".to_string(),
        severity: Severity::Error,
        help_message: Some("pick an odd length".to_string()),
        related: vec![Related::new(Span::at(1, 9), "declared here".to_string())],
    };

    let rendered = diagnostic.to_string();

    assert!(rendered.starts_with("error: the where clause"));
    assert!(rendered.contains("--> 4:2"));
    assert!(rendered.contains("help: pick an odd length"));
    assert!(rendered.contains("note 1:9: declared here"));
}

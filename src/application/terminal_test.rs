use super::MultilineInput;
use super::CONTINUATION_PROMPT;
use super::PROMPT;

#[test]
fn it_submits_on_an_empty_line() {
    let mut input = MultilineInput::default();
    assert_eq!(input.prompt(), PROMPT);

    assert_eq!(input.push("fn main() {"), None);
    assert_eq!(input.prompt(), CONTINUATION_PROMPT);
    assert_eq!(input.push("}"), None);

    assert_eq!(input.push(""), Some("fn main() {\n}".to_string()));
    assert_eq!(input.prompt(), PROMPT);
}

#[test]
fn it_ignores_empty_lines_before_any_text() {
    let mut input = MultilineInput::default();
    assert_eq!(input.push(""), None);
    assert_eq!(input.push(""), None);
    assert_eq!(input.prompt(), PROMPT);

    assert_eq!(input.push("exit"), None);
    assert_eq!(input.push(""), Some("exit".to_string()));
}

#[test]
fn it_keeps_whitespace_only_lines() {
    let mut input = MultilineInput::default();
    assert_eq!(input.push("    indented"), None);
    assert_eq!(input.push("  "), None);
    assert_eq!(input.push(""), Some("    indented\n  ".to_string()));
}

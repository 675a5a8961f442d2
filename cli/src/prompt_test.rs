use std::path::Path;

use super::*;

#[test]
fn plain_lines_are_trimmed_values() {
    assert_eq!(Input::parse("  ada@example.com\n").unwrap(), Input::Value("ada@example.com".into()));
    assert_eq!(Input::parse("\n").unwrap(), Input::Value(String::new()));
}

#[test]
fn colon_words_are_commands() {
    assert_eq!(Input::parse(":back").unwrap(), Input::Back);
    assert_eq!(Input::parse(":b").unwrap(), Input::Back);
    assert_eq!(Input::parse(":code").unwrap(), Input::Code);
    assert_eq!(Input::parse(":forgot").unwrap(), Input::Forgot);
    assert_eq!(Input::parse(" :resend ").unwrap(), Input::Resend);
    assert_eq!(Input::parse(":q").unwrap(), Input::Quit);
}

#[test]
fn unknown_command_is_rejected() {
    assert!(matches!(Input::parse(":nope"), Err(CliError::InvalidArg(_))));
}

#[test]
fn yes_answers() {
    assert!(is_yes("y"));
    assert!(is_yes(" YES "));
    assert!(!is_yes(""));
    assert!(!is_yes("no"));
}

#[test]
fn content_type_follows_extension() {
    assert_eq!(image_content_type(Path::new("me.PNG")).unwrap(), "image/png");
    assert_eq!(image_content_type(Path::new("a/b/me.jpeg")).unwrap(), "image/jpeg");
    assert_eq!(image_content_type(Path::new("me.webp")).unwrap(), "image/webp");
    assert!(image_content_type(Path::new("notes.txt")).is_err());
    assert!(image_content_type(Path::new("noext")).is_err());
}

//! Turning an input line into classified commands.
//!
//! A line is split on `;` into [`Segment`]s. Each segment is then classified
//! in one pass by [`classify`]: blank, builtin, redirected or plain program,
//! or invalid.

use crate::builtin::{self, BuiltinVerdict};
use crate::command::{Command, RedirectMode, RedirectionSpec};
use crate::config::Policy;
use crate::error::ParseError;
use crate::lexer;
use std::path::PathBuf;

/// Separator between commands on one line.
pub const COMMAND_SEPARATOR: char = ';';

/// One `;`-delimited piece of an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Text of the segment, separator excluded.
    pub text: &'a str,
    /// Byte offset of `text` in the original line.
    pub offset: usize,
    /// Position of the segment in its line.
    pub index: usize,
    /// Number of segments the line was split into.
    pub count: usize,
}

impl<'a> Segment<'a> {
    /// A segment standing for a whole line with no separators.
    pub fn single(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            index: 0,
            count: 1,
        }
    }

    /// Whether the line held more than one command.
    pub fn is_multi_command(&self) -> bool {
        self.count > 1
    }
}

/// Split `line` on `;`.
///
/// A line with N separators always yields N+1 segments, empty ones included.
pub fn split_commands(line: &str) -> Vec<Segment<'_>> {
    let count = line.matches(COMMAND_SEPARATOR).count() + 1;
    let mut offset = 0;
    line.split(COMMAND_SEPARATOR)
        .enumerate()
        .map(|(index, text)| {
            let segment = Segment {
                text,
                offset,
                index,
                count,
            };
            offset += text.len() + COMMAND_SEPARATOR.len_utf8();
            segment
        })
        .collect()
}

/// Output redirection operators in the order they are tried.
const APPEND_OPERATOR: &str = ">+";
const OVERWRITE_OPERATOR: &str = ">";

/// A segment with its redirection taken apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirected<'a> {
    /// The text before the operator (the whole segment if there is none).
    pub command: &'a str,
    pub redirect: Option<RedirectionSpec>,
}

/// Byte position and kind of every redirection operator in `text`.
fn find_operators(text: &str) -> Vec<(usize, RedirectMode)> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find('>') {
        let at = pos + rel;
        if text[at..].starts_with(APPEND_OPERATOR) {
            found.push((at, RedirectMode::AppendPreserving));
            pos = at + APPEND_OPERATOR.len();
        } else {
            found.push((at, RedirectMode::Overwrite));
            pos = at + OVERWRITE_OPERATOR.len();
        }
    }
    found
}

/// Extract the redirection of a segment.
///
/// Only the first word after the operator names the target; anything after it
/// is dropped.
pub fn parse_redirection(text: &str) -> Result<Redirected<'_>, ParseError> {
    let operators = find_operators(text);
    let (at, mode) = match operators.as_slice() {
        [] => {
            return Ok(Redirected {
                command: text,
                redirect: None,
            });
        }
        [single] => *single,
        _ => return Err(ParseError::MultipleRedirection),
    };

    let operator_len = match mode {
        RedirectMode::AppendPreserving => APPEND_OPERATOR.len(),
        RedirectMode::Overwrite => OVERWRITE_OPERATOR.len(),
    };
    let command = &text[..at];
    let target = lexer::first_token(&text[at + operator_len..]);

    match (lexer::is_blank(command), target) {
        (true, None) => Err(ParseError::BareRedirection),
        (true, Some(_)) => Err(ParseError::MissingCommand),
        (false, None) => Err(ParseError::MissingTarget),
        (false, Some(target)) => Ok(Redirected {
            command,
            redirect: Some(RedirectionSpec {
                target: PathBuf::from(target),
                mode,
            }),
        }),
    }
}

/// Classify one segment.
///
/// Builtins are recognised by their first word only, so `echo cd` runs
/// `echo`. Argument rules are checked before the redirection ban; both end up
/// as [`Command::Invalid`].
pub fn classify(segment: &Segment<'_>, policy: &Policy) -> Command {
    if lexer::is_blank(segment.text) {
        return Command::Empty;
    }

    let Redirected { command, redirect } = match parse_redirection(segment.text) {
        Ok(parsed) => parsed,
        Err(err) => return Command::Invalid(err),
    };

    let words = lexer::split_into_tokens(command);
    let cd_exemption = policy.cd_multi_command_exemption && segment.is_multi_command();
    match builtin::judge(&words, cd_exemption) {
        BuiltinVerdict::NotBuiltin => {}
        BuiltinVerdict::BuiltinError(detail) => {
            return Command::Invalid(ParseError::BuiltinUsage(detail));
        }
        verdict => {
            if redirect.is_some() {
                let name = words
                    .first()
                    .and_then(|word| builtin::builtin_name(word))
                    .unwrap_or_default();
                return Command::Invalid(ParseError::BuiltinRedirection(name));
            }
            return Command::Builtin(verdict);
        }
    }

    let argv = words.into_iter().map(str::to_owned).collect();
    match redirect {
        Some(redirect) => Command::Redirected { argv, redirect },
        None => Command::Plain(argv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn classify_single(text: &str) -> Command {
        classify(&Segment::single(text), &Policy::default())
    }

    #[test]
    fn test_split_yields_separator_count_plus_one() {
        for line in ["", "ls", ";", "a;b", ";;", "pwd; cd /tmp; pwd\n", "a;;b;"] {
            let separators = line.matches(';').count();
            assert_eq!(split_commands(line).len(), separators + 1, "line {:?}", line);
        }
    }

    #[test]
    fn test_split_keeps_empty_segments_and_offsets() {
        let line = ";ls -l;;pwd\n";
        let segments = split_commands(line);
        let texts: Vec<&str> = segments.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["", "ls -l", "", "pwd\n"]);

        for segment in &segments {
            assert_eq!(segment.count, 4);
            assert_eq!(
                &line[segment.offset..segment.offset + segment.text.len()],
                segment.text
            );
        }
        assert_eq!(segments[3].offset, 8);
        assert_eq!(segments[3].index, 3);
    }

    #[test]
    fn test_split_without_separator_is_whole_line() {
        let segments = split_commands("echo hi\n");
        assert_eq!(segments, vec![Segment::single("echo hi\n")]);
        assert!(!segments[0].is_multi_command());
    }

    #[test]
    fn test_simple_redirection() {
        let parsed = parse_redirection("ls -l > out.txt\n").unwrap();
        assert_eq!(parsed.command, "ls -l ");
        assert_eq!(
            parsed.redirect,
            Some(RedirectionSpec {
                target: PathBuf::from("out.txt"),
                mode: RedirectMode::Overwrite,
            })
        );
    }

    #[test]
    fn test_advanced_redirection_without_spaces() {
        let parsed = parse_redirection("echo B>+f").unwrap();
        assert_eq!(parsed.command, "echo B");
        assert_eq!(
            parsed.redirect,
            Some(RedirectionSpec {
                target: PathBuf::from("f"),
                mode: RedirectMode::AppendPreserving,
            })
        );
    }

    #[test]
    fn test_only_first_target_word_is_used() {
        let parsed = parse_redirection("ls > a b c").unwrap();
        assert_eq!(parsed.redirect.unwrap().target, PathBuf::from("a"));
    }

    #[test]
    fn test_multiple_redirections_rejected() {
        for text in ["ls > a > b", "ls >> a", "ls >+ a > b", "ls >+ a >+ b"] {
            assert_eq!(
                parse_redirection(text),
                Err(ParseError::MultipleRedirection),
                "text {:?}",
                text
            );
        }
    }

    #[test]
    fn test_bare_and_incomplete_redirections() {
        assert_eq!(parse_redirection(" > \n"), Err(ParseError::BareRedirection));
        assert_eq!(parse_redirection(">+"), Err(ParseError::BareRedirection));
        assert_eq!(parse_redirection("ls >\n"), Err(ParseError::MissingTarget));
        assert_eq!(parse_redirection("  > out"), Err(ParseError::MissingCommand));
    }

    #[test]
    fn test_classify_empty_and_plain() {
        assert_eq!(classify_single(" \t\n"), Command::Empty);
        assert_eq!(classify_single(""), Command::Empty);
        assert_eq!(
            classify_single("  ls  -la\t/tmp\n"),
            Command::Plain(argv(&["ls", "-la", "/tmp"]))
        );
    }

    #[test]
    fn test_classify_redirected() {
        assert_eq!(
            classify_single("echo hi >+ log.txt trailing words\n"),
            Command::Redirected {
                argv: argv(&["echo", "hi"]),
                redirect: RedirectionSpec {
                    target: PathBuf::from("log.txt"),
                    mode: RedirectMode::AppendPreserving,
                },
            }
        );
    }

    #[test]
    fn test_classify_builtins() {
        assert_eq!(classify_single("exit\n"), Command::Builtin(BuiltinVerdict::Exit));
        assert_eq!(classify_single(" pwd "), Command::Builtin(BuiltinVerdict::Pwd));
        assert_eq!(
            classify_single("cd\n"),
            Command::Builtin(BuiltinVerdict::Cd(None))
        );
        assert_eq!(
            classify_single("echo cd pwd exit"),
            Command::Plain(argv(&["echo", "cd", "pwd", "exit"]))
        );
    }

    #[test]
    fn test_classify_builtin_usage_errors() {
        assert!(matches!(
            classify_single("exit now\n"),
            Command::Invalid(ParseError::BuiltinUsage(_))
        ));
        assert!(matches!(
            classify_single("pwd here"),
            Command::Invalid(ParseError::BuiltinUsage(_))
        ));
        assert!(matches!(
            classify_single("cd a b"),
            Command::Invalid(ParseError::BuiltinUsage(_))
        ));
    }

    #[test]
    fn test_classify_builtin_with_redirection() {
        assert_eq!(
            classify_single("cd / > out.txt"),
            Command::Invalid(ParseError::BuiltinRedirection("cd"))
        );
        assert_eq!(
            classify_single("pwd >+ out.txt"),
            Command::Invalid(ParseError::BuiltinRedirection("pwd"))
        );
        assert_eq!(
            classify_single("exit>x"),
            Command::Invalid(ParseError::BuiltinRedirection("exit"))
        );
    }

    #[test]
    fn test_cd_exemption_applies_to_multi_command_segments_only() {
        let line = "cd a b; pwd";
        let segments = split_commands(line);
        assert_eq!(
            classify(&segments[0], &Policy::default()),
            Command::Builtin(BuiltinVerdict::Cd(Some("a".to_string())))
        );

        let strict = Policy {
            cd_multi_command_exemption: false,
            ..Policy::default()
        };
        assert!(matches!(
            classify(&segments[0], &strict),
            Command::Invalid(ParseError::BuiltinUsage(_))
        ));

        // pwd and exit get no such exemption
        let segments = split_commands("pwd x; exit y");
        for segment in &segments {
            assert!(matches!(
                classify(segment, &Policy::default()),
                Command::Invalid(ParseError::BuiltinUsage(_))
            ));
        }
    }
}

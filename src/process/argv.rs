// src/process/argv.rs

//! Quote-aware splitting of a command string into an argument vector.
//!
//! Commands are executed directly (no intermediate shell), so the string from
//! the config has to be tokenized the way a POSIX shell would for the simple
//! cases people actually write:
//!
//! - runs of whitespace separate arguments
//! - `'single quotes'` keep everything literally
//! - `"double quotes"` keep whitespace; `\"`, `\\`, `\$` and `` \` `` are
//!   unescaped inside them
//! - a backslash outside quotes escapes the next character
//!
//! Variable expansion, globbing and operators (`|`, `&&`, `>`) are not
//! interpreted. Commands that need them should spell out `sh -c '...'`.

use crate::errors::{RelaunchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split `command` into program + arguments.
///
/// Returns a `ConfigError` for empty commands, unterminated quotes, and a
/// trailing lone backslash.
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    // Distinguishes `""` (an empty argument) from no argument at all.
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\' | '$' | '`')) => current.push(next),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => return Err(unterminated(command, "\"")),
                },
                other => current.push(other),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => match chars.next() {
                    Some(next) => {
                        current.push(next);
                        in_word = true;
                    }
                    None => {
                        return Err(RelaunchError::ConfigError(format!(
                            "command `{command}` ends with a dangling backslash"
                        )));
                    }
                },
                c if c.is_whitespace() => {
                    if in_word {
                        args.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                other => {
                    current.push(other);
                    in_word = true;
                }
            },
        }
    }

    match quote {
        Quote::Single => return Err(unterminated(command, "'")),
        Quote::Double => return Err(unterminated(command, "\"")),
        Quote::None => {}
    }

    if in_word {
        args.push(current);
    }

    if args.is_empty() {
        return Err(RelaunchError::ConfigError(
            "command must not be empty".to_string(),
        ));
    }

    Ok(args)
}

fn unterminated(command: &str, quote: &str) -> RelaunchError {
    RelaunchError::ConfigError(format!(
        "command `{command}` has an unterminated {quote} quote"
    ))
}

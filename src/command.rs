//! Command templates and invocations.
//!
//! A template such as `$SEMCONCMD read did:oyd:zQm... --json-output` is turned into
//! an explicit [`Invocation`]: a program, an argument list, and an optional stdin
//! buffer holding the input document. Plain templates are tokenized with
//! POSIX-shell quoting rules and variable expansion and run without a shell.
//! Templates that use pipes, redirections or other shell operators fall back to
//! `sh -c` according to [`ShellMode`]; the input document still travels over stdin
//! and its path is never spliced into the command string.

use std::path::PathBuf;

use crate::config::{HarnessConfig, ShellMode};
use crate::errors::{HarnessError, HarnessResult};

pub const SHELL: &str = "sh";

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Builds the invocation for a fixture: `template` run with `input` on stdin.
    ///
    /// A zero-length input document attaches no stdin at all.
    pub fn from_template(
        template: &str,
        input: &str,
        config: &HarnessConfig,
    ) -> HarnessResult<Self> {
        let env = config.child_env();
        let line = template.trim();
        if line.is_empty() {
            return Err(HarnessError::Template {
                message: "command template is empty".to_string(),
            });
        }

        let (program, args) = match config.shell_mode {
            ShellMode::Always => shell_argv(line),
            ShellMode::Auto | ShellMode::Never => {
                let lookup = |name: &str| {
                    env.iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                        .or_else(|| std::env::var(name).ok())
                };
                match split_words(line, lookup)? {
                    Words::Plain(mut words) => {
                        if words.is_empty() {
                            return Err(HarnessError::Template {
                                message: format!("`{line}` expands to an empty command"),
                            });
                        }
                        let program = words.remove(0);
                        (program, words)
                    }
                    Words::NeedsShell(_) if config.shell_mode == ShellMode::Auto => {
                        shell_argv(line)
                    }
                    Words::NeedsShell(op) => {
                        return Err(HarnessError::Template {
                            message: format!("`{line}` uses the shell operator `{op}`"),
                        });
                    }
                }
            }
        };

        let stdin = if input.is_empty() {
            None
        } else {
            Some(input.as_bytes().to_vec())
        };

        Ok(Self {
            program,
            args,
            stdin,
            env,
            cwd: None,
        })
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Human-readable command line for logs and failure reports.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote_for_display(&self.program));
        parts.extend(self.args.iter().map(|a| quote_for_display(a)));
        parts.join(" ")
    }

    pub fn uses_shell(&self) -> bool {
        self.program == SHELL && self.args.first().is_some_and(|a| a == "-c")
    }
}

fn shell_argv(line: &str) -> (String, Vec<String>) {
    (SHELL.to_string(), vec!["-c".to_string(), line.to_string()])
}

fn quote_for_display(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

// ============================================================================
// TOKENIZER
// ============================================================================

/// Result of scanning a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Words {
    /// The template is a plain command; these are its expanded words.
    Plain(Vec<String>),
    /// The template needs a shell; carries the first operator found.
    NeedsShell(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Splits `line` into words the way `sh` would, expanding `$NAME` and `${NAME}`.
///
/// Unquoted expansions are split on whitespace; expansions inside double quotes
/// are not. Unknown variables expand to nothing. Unterminated quotes and
/// malformed `${...}` are template errors.
///
/// Comments, bracket globs and a leading `NAME=value` assignment only mean
/// something to `sh`, so they are reported as [`Words::NeedsShell`].
pub fn split_words<F>(line: &str, lookup: F) -> HarnessResult<Words>
where
    F: Fn(&str) -> Option<String>,
{
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    // The current word so far is made of unquoted literal characters only.
    let mut literal = true;
    let mut quote = Quote::None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    word.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.peek().copied() {
                    Some(next @ ('$' | '`' | '"' | '\\')) => {
                        chars.next();
                        word.push(next);
                    }
                    Some('\n') => {
                        chars.next();
                    }
                    _ => word.push('\\'),
                },
                '`' => return Ok(Words::NeedsShell("`".to_string())),
                '$' => {
                    if chars.peek() == Some(&'(') {
                        return Ok(Words::NeedsShell("$(".to_string()));
                    }
                    match read_variable(&mut chars)? {
                        Some(name) => word.push_str(&lookup(&name).unwrap_or_default()),
                        None => word.push('$'),
                    }
                }
                _ => word.push(c),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                    literal = false;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                    literal = false;
                }
                '\\' => {
                    literal = false;
                    match chars.next() {
                        // Line continuation.
                        Some('\n') => {}
                        Some(next) => {
                            word.push(next);
                            in_word = true;
                        }
                        None => {
                            word.push('\\');
                            in_word = true;
                        }
                    }
                }
                '|' | ';' | '&' | '<' | '>' | '`' | '(' | ')' | '\n' | '*' | '?' | '[' => {
                    return Ok(Words::NeedsShell(c.to_string()));
                }
                '#' if !in_word => return Ok(Words::NeedsShell("#".to_string())),
                '=' if words.is_empty() && literal && is_valid_name(&word) => {
                    return Ok(Words::NeedsShell(format!("{word}=")));
                }
                '$' => {
                    if chars.peek() == Some(&'(') {
                        return Ok(Words::NeedsShell("$(".to_string()));
                    }
                    literal = false;
                    match read_variable(&mut chars)? {
                        Some(name) => {
                            // Field splitting on the unquoted expansion.
                            for v in lookup(&name).unwrap_or_default().chars() {
                                if v.is_whitespace() {
                                    if in_word {
                                        words.push(std::mem::take(&mut word));
                                        in_word = false;
                                    }
                                } else {
                                    word.push(v);
                                    in_word = true;
                                }
                            }
                        }
                        None => {
                            word.push('$');
                            in_word = true;
                        }
                    }
                }
                '~' if !in_word => return Ok(Words::NeedsShell("~".to_string())),
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut word));
                        in_word = false;
                    }
                    literal = true;
                }
                _ => {
                    word.push(c);
                    in_word = true;
                }
            },
        }
    }

    match quote {
        Quote::None => {}
        Quote::Single => {
            return Err(HarnessError::Template {
                message: format!("unterminated single quote in `{line}`"),
            })
        }
        Quote::Double => {
            return Err(HarnessError::Template {
                message: format!("unterminated double quote in `{line}`"),
            })
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(Words::Plain(words))
}

/// Reads a variable name after `$`. Returns `None` when `$` is literal.
fn read_variable<I>(chars: &mut std::iter::Peekable<I>) -> HarnessResult<Option<String>>
where
    I: Iterator<Item = char>,
{
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut name = String::new();
        for c in chars.by_ref() {
            if c == '}' {
                if !is_valid_name(&name) {
                    return Err(HarnessError::Template {
                        message: format!("bad substitution `${{{name}}}`"),
                    });
                }
                return Ok(Some(name));
            }
            name.push(c);
        }
        return Err(HarnessError::Template {
            message: "unterminated `${`".to_string(),
        });
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        let ok = if name.is_empty() {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        if !ok {
            break;
        }
        name.push(c);
        chars.next();
    }
    Ok(if name.is_empty() { None } else { Some(name) })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! Comment stripping for JSON-with-comments files
//!
//! Filter files are hand-edited and annotated with `//` and `/* */` comments.
//! [`strip_comments`] removes them with a single string-literal-aware scan, so
//! `//` inside a quoted value (a URL, say) survives.
//!
//! Newlines are always kept, including those inside block comments, so line
//! numbers in `serde_json` errors still point at the original file.

/// Scanner state while walking the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    String { escaped: bool },
    LineComment,
    BlockComment,
}

/// Remove `//` and `/* */` comments that occur outside string literals.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            State::Code => match c {
                '"' => {
                    out.push(c);
                    State::String { escaped: false }
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    State::LineComment
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    State::BlockComment
                }
                _ => {
                    out.push(c);
                    State::Code
                }
            },
            State::String { escaped } => {
                out.push(c);
                match c {
                    _ if escaped => State::String { escaped: false },
                    '\\' => State::String { escaped: true },
                    '"' => State::Code,
                    _ => State::String { escaped: false },
                }
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    State::Code
                } else {
                    State::LineComment
                }
            }
            State::BlockComment => match c {
                '*' if chars.peek() == Some(&'/') => {
                    chars.next();
                    State::Code
                }
                '\n' => {
                    out.push(c);
                    State::BlockComment
                }
                _ => State::BlockComment,
            },
        };
    }

    out
}

/// Strip comments and parse the result as JSON.
pub fn from_str<T: serde::de::DeserializeOwned>(input: &str) -> serde_json::Result<T> {
    serde_json::from_str(&strip_comments(input))
}

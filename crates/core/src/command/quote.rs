//! Quoting for the two shells activation composites run under

use std::borrow::Cow;

/// Quote one token for `/bin/bash -c`
pub fn posix_quote(token: &str) -> Cow<'_, str> {
    shell_words::quote(token)
}

pub fn posix_join<S: AsRef<str>>(tokens: &[S]) -> String {
    shell_words::join(tokens.iter().map(AsRef::as_ref))
}

/// Wrap `text` in double quotes, escaping what bash still expands inside them
pub fn posix_double_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote one argument so `CommandLineToArgvW` hands it back unchanged
pub fn windows_quote(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && !arg.contains([' ', '\t', '\n', '\u{0b}', '"']) {
        return Cow::Borrowed(arg);
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    // backslashes before the closing quote must not escape it
    out.extend(std::iter::repeat_n('\\', backslashes * 2));
    out.push('"');
    Cow::Owned(out)
}

pub fn windows_join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|token| windows_quote(token.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Argv-quote `tokens`, then caret-escape what `cmd.exe` would still act on.
///
/// `cmd.exe` reads the line before the program does. Every `"` toggles its quoting
/// and `\"` is no escape, so an embedded quote can leave `&` or `>` outside the
/// region cmd treats as quoted.
pub fn cmd_join<S: AsRef<str>>(tokens: &[S]) -> String {
    cmd_escape(&windows_join(tokens))
}

/// Prefix each cmd metacharacter that falls in cmd's unquoted state with `^`
pub fn cmd_escape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quoted = false;
    for c in line.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && is_cmd_metachar(c) {
            out.push('^');
        }
        out.push(c);
    }
    out
}

fn is_cmd_metachar(c: char) -> bool {
    matches!(c, '&' | '|' | '<' | '>' | '(' | ')' | '^' | '%')
}

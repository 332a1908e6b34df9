//! Terminal text sanitization.
//!
//! Service output and transport error text are untrusted: a response body can
//! carry escape sequences that move the cursor, rewrite the screen, set the
//! window title, or write to the clipboard (OSC 52). Everything that reaches
//! the terminal from the network goes through [`sanitize_terminal_text`].

use std::borrow::Cow;
use std::iter::Peekable;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const C1_CSI: char = '\u{009b}';

/// Strip escape sequences and control characters, keeping `\n`, `\t` and `\r`.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// ```
/// use devlens_types::sanitize_terminal_text;
///
/// assert_eq!(sanitize_terminal_text("plain"), "plain");
/// assert_eq!(sanitize_terminal_text("a\x1b[2Jb"), "ab");
/// ```
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_disallowed) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESC => skip_escape(&mut chars),
            C1_CSI => skip_csi(&mut chars),
            c if is_disallowed(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_disallowed(c: char) -> bool {
    let c0 = c <= '\x1f' && !matches!(c, '\n' | '\t' | '\r');
    let c1 = ('\u{0080}'..='\u{009f}').contains(&c);
    c0 || c1 || c == '\x7f'
}

fn skip_escape<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    match chars.peek().copied() {
        Some('[') => {
            chars.next();
            skip_csi(chars);
        }
        Some(']') => {
            chars.next();
            skip_string(chars, true);
        }
        Some('P' | '^' | '_' | 'X') => {
            chars.next();
            skip_string(chars, false);
        }
        // Charset designators take one argument character.
        Some('(' | ')' | '*' | '+' | '#' | ' ') => {
            chars.next();
            chars.next();
        }
        Some(c) if ('\x30'..='\x7e').contains(&c) => {
            chars.next();
        }
        _ => {}
    }
}

/// CSI: parameter/intermediate bytes (0x20-0x3F) up to one final byte (0x40-0x7E).
fn skip_csi<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x20'..='\x3f').contains(&c) {
            chars.next();
        } else {
            if ('\x40'..='\x7e').contains(&c) {
                chars.next();
            }
            return;
        }
    }
}

/// OSC/DCS/PM/APC bodies run until ST (`ESC \`), or BEL for OSC.
fn skip_string<I: Iterator<Item = char>>(chars: &mut Peekable<I>, bel_terminates: bool) {
    while let Some(c) = chars.next() {
        if c == BEL && bel_terminates {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

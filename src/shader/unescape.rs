use std::{iter::Peekable, str::CharIndices};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UnescapeError {
    #[error("truncated \\{escape} escape at byte {offset}: expected {expected} hex digits")]
    Truncated {
        escape: char,
        expected: usize,
        offset: usize,
    },
    #[error("escape at byte {offset} encodes {value:#x}, which is not a unicode scalar value")]
    InvalidCodePoint { value: u32, offset: usize },
    #[error("malformed \\N{{...}} escape at byte {offset}")]
    MalformedName { offset: usize },
    #[error("unknown unicode character name `{name}` at byte {offset}")]
    UnknownName { name: String, offset: usize },
    #[error("lone backslash at end of text")]
    TrailingBackslash,
}

/// Decodes string-literal escapes the way a `unicode_escape` codec does, but
/// on characters, so non-ASCII text passes through untouched.
///
/// Unknown escapes such as `\q` are kept verbatim, backslash included.
pub fn unescape(text: &str) -> Result<String, UnescapeError> {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }

        let Some((_, escape)) = chars.next() else {
            return Err(UnescapeError::TrailingBackslash);
        };

        match escape {
            // line continuation
            '\n' => {}
            '\\' => output.push('\\'),
            '\'' => output.push('\''),
            '"' => output.push('"'),
            'a' => output.push('\u{07}'),
            'b' => output.push('\u{08}'),
            'f' => output.push('\u{0C}'),
            'n' => output.push('\n'),
            'r' => output.push('\r'),
            't' => output.push('\t'),
            'v' => output.push('\u{0B}'),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.peek().and_then(|&(_, next)| next.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                output.push(scalar(value, offset)?);
            }
            'x' => output.push(hex_escape(&mut chars, escape, 2, offset)?),
            'u' => output.push(hex_escape(&mut chars, escape, 4, offset)?),
            'U' => output.push(hex_escape(&mut chars, escape, 8, offset)?),
            'N' => output.push(named_escape(&mut chars, offset)?),
            other => {
                output.push('\\');
                output.push(other);
            }
        }
    }

    Ok(output)
}

fn hex_escape(
    chars: &mut Peekable<CharIndices>,
    escape: char,
    digits: usize,
    offset: usize,
) -> Result<char, UnescapeError> {
    let mut value = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next_if(|(_, next)| next.is_ascii_hexdigit())
            .and_then(|(_, next)| next.to_digit(16))
            .ok_or(UnescapeError::Truncated {
                escape,
                expected: digits,
                offset,
            })?;
        value = value * 16 + digit;
    }
    scalar(value, offset)
}

/// `\N{NAME}`, looked up case-insensitively like the codec does.
fn named_escape(chars: &mut Peekable<CharIndices>, offset: usize) -> Result<char, UnescapeError> {
    if chars.next_if(|&(_, next)| next == '{').is_none() {
        return Err(UnescapeError::MalformedName { offset });
    }

    let mut name = String::new();
    loop {
        match chars.next() {
            Some((_, '}')) if !name.is_empty() => break,
            Some((_, '}')) | None => return Err(UnescapeError::MalformedName { offset }),
            Some((_, ch)) => name.push(ch),
        }
    }

    unicode_names2::character(&name.to_ascii_uppercase())
        .ok_or(UnescapeError::UnknownName { name, offset })
}

fn scalar(value: u32, offset: usize) -> Result<char, UnescapeError> {
    char::from_u32(value).ok_or(UnescapeError::InvalidCodePoint { value, offset })
}

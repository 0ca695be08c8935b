// literal.rs — Parser for list literals embedded in CSV cells.
//
// Recipe dumps store ingredient and direction lists as text such as
// `["1 c. flour", 'salt']`. Both quote styles and backslash escapes are
// accepted. Unquoted items must be numbers, True, False or None; a bare word
// such as `[flour, sugar]` makes the whole cell unparseable, so callers keep
// the raw text. Nested containers are not supported.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListParseError {
    /// The text does not start with `[` / end with `]`.
    NotAList,
    UnterminatedString,
    /// Something other than `,` or `]` followed an item.
    UnexpectedChar(char),
    /// Nested list, tuple or dict inside the literal.
    NestedContainer,
    /// Unquoted item that is not a number, True, False or None.
    BareWord(String),
    TrailingInput,
}

impl fmt::Display for ListParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListParseError::NotAList => write!(f, "not a list literal"),
            ListParseError::UnterminatedString => write!(f, "unterminated string"),
            ListParseError::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            ListParseError::NestedContainer => write!(f, "nested containers are not supported"),
            ListParseError::BareWord(w) => write!(f, "unquoted item {w:?} is not a literal"),
            ListParseError::TrailingInput => write!(f, "trailing input after list"),
        }
    }
}

impl std::error::Error for ListParseError {}

/// Parse a list literal into its items, each rendered as plain text.
pub fn try_parse_list(text: &str) -> Result<Vec<String>, ListParseError> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Err(ListParseError::NotAList);
    }

    let mut chars = trimmed.chars().peekable();
    chars.next(); // '['

    let mut items = Vec::new();
    loop {
        skip_ws(&mut chars);
        match chars.peek().copied() {
            None => return Err(ListParseError::NotAList),
            Some(']') => {
                chars.next();
                break;
            }
            Some(_) => {}
        }

        items.push(parse_item(&mut chars)?);

        skip_ws(&mut chars);
        match chars.next() {
            Some(',') => continue,
            Some(']') => break,
            Some(c) => return Err(ListParseError::UnexpectedChar(c)),
            None => return Err(ListParseError::NotAList),
        }
    }

    skip_ws(&mut chars);
    if chars.next().is_some() {
        return Err(ListParseError::TrailingInput);
    }
    Ok(items)
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_item(chars: &mut Peekable<Chars<'_>>) -> Result<String, ListParseError> {
    match chars.peek().copied() {
        Some(q @ ('\'' | '"')) => {
            chars.next();
            parse_quoted(chars, q)
        }
        Some('[' | '(' | '{') => Err(ListParseError::NestedContainer),
        _ => {
            let mut bare = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' || c == ']' {
                    break;
                }
                if c == '\'' || c == '"' || c == '[' {
                    return Err(ListParseError::UnexpectedChar(c));
                }
                bare.push(c);
                chars.next();
            }
            let bare = bare.trim_end().to_string();
            if bare.is_empty() {
                // `[,]` or `[1,,2]`
                return Err(ListParseError::UnexpectedChar(','));
            }
            if let Some(ws) = bare.chars().find(|c| c.is_whitespace()) {
                // `[1 2]`
                return Err(ListParseError::UnexpectedChar(ws));
            }
            if !is_scalar_literal(&bare) {
                return Err(ListParseError::BareWord(bare));
            }
            Ok(bare)
        }
    }
}

/// Numbers (optional sign, decimal point, exponent) and the three keyword constants.
fn is_scalar_literal(token: &str) -> bool {
    if matches!(token, "True" | "False" | "None") {
        return true;
    }
    let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
        None => (unsigned, None),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit() || b == b'_');
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !is_digits(int_part) || !is_digits(frac_part) {
        return false;
    }
    if int_part.starts_with('_') || frac_part.starts_with('_') {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Result<String, ListParseError> {
    let mut out = String::new();
    loop {
        let c = chars.next().ok_or(ListParseError::UnterminatedString)?;
        if c == quote {
            return Ok(out);
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let esc = chars.next().ok_or(ListParseError::UnterminatedString)?;
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' | '\'' | '"' => out.push(esc),
            'u' => match read_hex(chars, 4) {
                Some(ch) => out.push(ch),
                None => out.push_str("\\u"),
            },
            'x' => match read_hex(chars, 2) {
                Some(ch) => out.push(ch),
                None => out.push_str("\\x"),
            },
            other => {
                // Unknown escapes keep their backslash.
                out.push('\\');
                out.push(other);
            }
        }
    }
}

fn read_hex(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        let d = chars.peek()?.to_digit(16)?;
        chars.next();
        value = value * 16 + d;
    }
    char::from_u32(value)
}

//! Tokenizer for filter scripts

use crate::error::ScriptError;

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Integer(u64),
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Not,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

/// A token and the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split a script into tokens
///
/// Supported syntax:
/// - numbers: `42`, `3.5`, `1e3`; digit-only literals that fit a `u64` stay exact
/// - strings: `'single'` or `"double"` with `\\`, `\'`, `\"`, `\n`, `\t` escapes
/// - identifiers: `[A-Za-z_][A-Za-z0-9_]*`; `true`, `false`, `null` are keywords
/// - operators: `( ) [ ] . , ! && || == != < <= > >= + - * / %`
///
/// `===` and `!==` are accepted as spellings of `==` and `!=`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ScriptError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|(_, c)| *c);

    while i < chars.len() {
        let (position, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].1.is_ascii_digit() {
                i += 1;
            }
            if peek(i) == Some('.') && peek(i + 1).map_or(false, |d| d.is_ascii_digit()) {
                i += 1;
                while i < chars.len() && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
            }
            if matches!(peek(i), Some('e') | Some('E')) {
                let mut j = i + 1;
                if matches!(peek(j), Some('+') | Some('-')) {
                    j += 1;
                }
                if peek(j).map_or(false, |d| d.is_ascii_digit()) {
                    i = j;
                    while i < chars.len() && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().map(|(_, c)| *c).collect();
            let token = match text.parse::<u64>() {
                Ok(value) => Token::Integer(value),
                Err(_) => text
                    .parse::<f64>()
                    .map(Token::Number)
                    .map_err(|_| ScriptError::parse(position, format!("invalid number '{}'", text)))?,
            };
            tokens.push(Spanned { token, position });
        } else if c == '\'' || c == '"' {
            let quote = c;
            i += 1;
            let mut text = String::new();
            loop {
                match peek(i) {
                    None => return Err(ScriptError::parse(position, "unterminated string")),
                    Some(ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = match peek(i + 1) {
                            Some('n') => '\n',
                            Some('t') => '\t',
                            Some(other @ ('\\' | '\'' | '"')) => other,
                            Some(other) => {
                                return Err(ScriptError::parse(
                                    chars[i].0,
                                    format!("unknown escape '\\{}'", other),
                                ))
                            }
                            None => return Err(ScriptError::parse(position, "unterminated string")),
                        };
                        text.push(escaped);
                        i += 2;
                    }
                    Some(ch) => {
                        text.push(ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Spanned {
                token: Token::Str(text),
                position,
            });
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().map(|(_, c)| *c).collect();
            let token = match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned { token, position });
        } else {
            // Operators and punctuation
            let next = peek(i + 1);
            let (token, width) = match (c, next) {
                ('&', Some('&')) => (Token::AndAnd, 2),
                ('|', Some('|')) => (Token::OrOr, 2),
                ('=', Some('=')) => (Token::EqEq, if peek(i + 2) == Some('=') { 3 } else { 2 }),
                ('!', Some('=')) => (Token::NotEq, if peek(i + 2) == Some('=') { 3 } else { 2 }),
                ('<', Some('=')) => (Token::Le, 2),
                ('>', Some('=')) => (Token::Ge, 2),
                ('!', _) => (Token::Not, 1),
                ('<', _) => (Token::Lt, 1),
                ('>', _) => (Token::Gt, 1),
                ('(', _) => (Token::LParen, 1),
                (')', _) => (Token::RParen, 1),
                ('[', _) => (Token::LBracket, 1),
                (']', _) => (Token::RBracket, 1),
                ('.', _) => (Token::Dot, 1),
                (',', _) => (Token::Comma, 1),
                ('+', _) => (Token::Plus, 1),
                ('-', _) => (Token::Minus, 1),
                ('*', _) => (Token::Star, 1),
                ('/', _) => (Token::Slash, 1),
                ('%', _) => (Token::Percent, 1),
                _ => {
                    return Err(ScriptError::parse(
                        position,
                        format!("unexpected character '{}'", c),
                    ))
                }
            };
            i += width;
            tokens.push(Spanned { token, position });
        }
    }

    Ok(tokens)
}

//! Tokenizer for vector expressions.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Num(f64),
    Ident(String),
    /// An identifier immediately followed by a parenthesized argument,
    /// kept raw: `v(2:5)` or `sin(x + 1)`.
    Call {
        name: String,
        args: String,
    },
    /// `[script]`, evaluated by the host.
    Script(String),
    /// `"text"`, substituted by the host.
    Quoted(String),
    /// `{text}`, taken literally.
    Braced(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':' || c == '.'
}

// Index of the delimiter closing the group opened just before `start`.
fn closing(chars: &[char], start: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 1usize;
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if c == open && open != close {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn unterminated(what: &str) -> Error {
    Error::parse(format!("missing closing {what}"))
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let text = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if let Some(&next) = chars.get(i + 1) {
            let tok = match (c, next) {
                ('&', '&') => Some(Token::And),
                ('|', '|') => Some(Token::Or),
                ('=', '=') => Some(Token::Eq),
                ('!', '=') => Some(Token::Ne),
                ('<', '=') => Some(Token::Le),
                ('>', '=') => Some(Token::Ge),
                ('<', '<') => Some(Token::Shl),
                ('>', '>') => Some(Token::Shr),
                _ => None,
            };
            if let Some(t) = tok {
                tokens.push(t);
                i += 2;
                continue;
            }
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '^' => Some(Token::Caret),
            '<' => Some(Token::Lt),
            '>' => Some(Token::Gt),
            '!' => Some(Token::Not),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(t) = single {
            tokens.push(t);
            i += 1;
            continue;
        }

        match c {
            '[' => {
                let end = closing(&chars, i + 1, '[', ']').ok_or_else(|| unterminated("]"))?;
                tokens.push(Token::Script(text(i + 1, end)));
                i = end + 1;
            }
            '{' => {
                let end = closing(&chars, i + 1, '{', '}').ok_or_else(|| unterminated("}"))?;
                tokens.push(Token::Braced(text(i + 1, end)));
                i = end + 1;
            }
            '"' => {
                let end = closing(&chars, i + 1, '"', '"').ok_or_else(|| unterminated("quote"))?;
                tokens.push(Token::Quoted(text(i + 1, end)));
                i = end + 1;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_digit()
                        || chars[i] == '.'
                        || chars[i] == 'e'
                        || chars[i] == 'E'
                        || ((chars[i] == '+' || chars[i] == '-')
                            && i > start
                            && (chars[i - 1] == 'e' || chars[i - 1] == 'E')))
                {
                    i += 1;
                }
                let s = text(start, i);
                let n: f64 = s
                    .parse()
                    .map_err(|_| Error::parse(format!("invalid number \"{s}\"")))?;
                tokens.push(Token::Num(n));
            }
            _ if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let name = text(start, i);
                if chars.get(i) == Some(&'(') {
                    let end = closing(&chars, i + 1, '(', ')').ok_or_else(|| unterminated(")"))?;
                    tokens.push(Token::Call {
                        name,
                        args: text(i + 1, end),
                    });
                    i = end + 1;
                } else {
                    tokens.push(Token::Ident(name));
                }
            }
            _ => return Err(Error::parse(format!("unexpected character '{c}'"))),
        }
    }

    Ok(tokens)
}

use std::fmt;
use std::ops::Range;

use logos::Logos;

use super::error::ParseError;

/// Lexical tokens of the assignment language.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// Integer literal such as `42`. Literals that do not fit in `i64` fail to lex.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),
    /// Variable name such as `x` or `total_2`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("=")]
    Equals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{n}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::PlusPlus => f.write_str("++"),
            Token::MinusMinus => f.write_str("--"),
            Token::PlusAssign => f.write_str("+="),
            Token::MinusAssign => f.write_str("-="),
            Token::MulAssign => f.write_str("*="),
            Token::DivAssign => f.write_str("/="),
            Token::Equals => f.write_str("="),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

/// A token together with its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize a whole expression, failing on the first unrecognised input.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(next) = lexer.next() {
        let span = lexer.span();
        match next {
            Ok(token) => tokens.push(Spanned { token, span }),
            Err(()) => {
                return Err(ParseError::InvalidToken {
                    offset: span.start,
                    text: lexer.slice().to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

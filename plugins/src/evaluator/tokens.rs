use std::fmt;
use std::sync::OnceLock;

use calcflow_core::expr::EvalError;
use regex::Regex;

/// Lexeme of the regex evaluator. Steps are kept as their own token so the
/// simplifier can tell `i++ + j` from `i + ++j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    Number(String),
    Ident(String),
    /// `++` or `--`
    Step(&'static str),
    /// One of `+ - * /`
    Op(char),
    LParen,
    RParen,
}

impl Lexeme {
    pub fn is_ident(&self) -> bool {
        matches!(self, Lexeme::Ident(_))
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Number(n) => f.write_str(n),
            Lexeme::Ident(name) => f.write_str(name),
            Lexeme::Step(step) => f.write_str(step),
            Lexeme::Op(op) => write!(f, "{op}"),
            Lexeme::LParen => f.write_str("("),
            Lexeme::RParen => f.write_str(")"),
        }
    }
}

fn lexeme_regex() -> Result<&'static Regex, EvalError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(\+\+|--)|(\d+)|([A-Za-z_][A-Za-z0-9_]*)|([-+*/])|(\()|(\)))")
    })
    .as_ref()
    .map_err(|e| EvalError::Unsupported(format!("lexeme pattern: {e}")))
}

/// Split an arithmetic right-hand side into lexemes.
pub fn lex(source: &str) -> Result<Vec<Lexeme>, EvalError> {
    let re = lexeme_regex()?;
    let mut lexemes = Vec::new();
    let mut rest = source;

    while !rest.trim_start().is_empty() {
        let caps = re.captures(rest).ok_or_else(|| {
            EvalError::Unsupported(format!("unexpected input '{}'", rest.trim()))
        })?;

        let lexeme = if let Some(step) = caps.get(1) {
            Lexeme::Step(if step.as_str() == "++" { "++" } else { "--" })
        } else if let Some(number) = caps.get(2) {
            Lexeme::Number(number.as_str().to_string())
        } else if let Some(name) = caps.get(3) {
            Lexeme::Ident(name.as_str().to_string())
        } else if let Some(op) = caps.get(4) {
            Lexeme::Op(op.as_str().chars().next().unwrap_or('+'))
        } else if caps.get(5).is_some() {
            Lexeme::LParen
        } else {
            Lexeme::RParen
        };

        lexemes.push(lexeme);
        rest = &rest[caps.get(0).map_or(rest.len(), |m| m.end())..];
    }

    Ok(lexemes)
}

/// Render lexemes back to source text with conventional spacing.
pub fn render(lexemes: &[Lexeme]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Lexeme> = None;

    for lexeme in lexemes {
        let glue = match (previous, lexeme) {
            (None, _) | (Some(Lexeme::LParen), _) | (_, Lexeme::RParen) => false,
            // unary sign sticks to its operand
            (Some(Lexeme::Op(_)), _) => !is_unary_position(&out),
            _ => true,
        };
        if glue {
            out.push(' ');
        }
        out.push_str(&lexeme.to_string());
        previous = Some(lexeme);
    }

    out
}

/// True when the operator just written to `out` is a sign, not a binary operator.
fn is_unary_position(out: &str) -> bool {
    let mut chars = out.trim_end().chars().rev();
    chars.next();
    match chars.find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, '(' | '+' | '-' | '*' | '/'),
    }
}

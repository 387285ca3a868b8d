use super::ast::{AssignOp, BinaryOp, Expr, Fixity, Statement, Step, UnaryOp};
use super::error::ParseError;
use super::lexer::{tokenize, Spanned, Token};

/// Deepest AST a statement may produce. Parentheses, unary signs and every
/// operator of a binary chain count one level each.
pub const MAX_DEPTH: usize = 512;

/// Parse a single assignment statement.
///
/// Accepted forms are `x = e`, `x op= e` for `+ - * /`, and the standalone
/// steps `++x`, `x++`, `--x`, `x--`. The right-hand side supports integer
/// literals, variables, parentheses, unary `+`/`-`, the four binary
/// operators with the usual precedence, and embedded steps.
pub fn parse_statement(source: &str) -> Result<Statement, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::MissingTarget);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let statement = parser.statement()?;
    parser.expect_end()?;
    Ok(statement)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(spanned) => ParseError::UnexpectedToken {
                offset: spanned.span.start,
                found: spanned.token.to_string(),
                expected,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    /// Go one level deeper; the caller restores `depth` on success.
    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            let offset = self
                .tokens
                .get(self.pos)
                .or_else(|| self.tokens.last())
                .map_or(0, |s| s.span.start);
            return Err(ParseError::TooDeep { offset });
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.pos < self.tokens.len() {
            return Err(self.unexpected("end of expression"));
        }
        Ok(())
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("variable name")),
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        if let Some(step) = self.peek().and_then(step_of) {
            self.pos += 1;
            let target = self.identifier()?;
            return Ok(Statement::Step {
                target,
                step,
                fixity: Fixity::Prefix,
            });
        }

        let target = match self.peek() {
            Some(Token::Identifier(_)) => self.identifier()?,
            _ => return Err(ParseError::MissingTarget),
        };

        if let Some(step) = self.peek().and_then(step_of) {
            self.pos += 1;
            return Ok(Statement::Step {
                target,
                step,
                fixity: Fixity::Postfix,
            });
        }

        let op = match self.peek() {
            Some(Token::Equals) => AssignOp::Set,
            Some(Token::PlusAssign) => AssignOp::Compound(BinaryOp::Add),
            Some(Token::MinusAssign) => AssignOp::Compound(BinaryOp::Sub),
            Some(Token::MulAssign) => AssignOp::Compound(BinaryOp::Mul),
            Some(Token::DivAssign) => AssignOp::Compound(BinaryOp::Div),
            None => return Err(ParseError::MissingTarget),
            Some(_) => return Err(self.unexpected("assignment operator")),
        };
        self.pos += 1;

        let value = self.expr()?;
        Ok(Statement::Assign { target, op, value })
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => {
                    self.depth = entry;
                    return Ok(lhs);
                }
            };
            self.enter()?;
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => {
                    self.depth = entry;
                    return Ok(lhs);
                }
            };
            self.enter()?;
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.primary(),
        };
        self.enter()?;
        self.pos += 1;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if let Some(step) = self.peek().and_then(step_of) {
            self.pos += 1;
            let name = self.identifier()?;
            return Ok(Expr::Step {
                name,
                step,
                fixity: Fixity::Prefix,
            });
        }

        match self.peek() {
            Some(Token::Integer(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::LParen) => {
                self.enter()?;
                self.pos += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.unexpected("')'")),
                }
            }
            Some(Token::Identifier(_)) => {
                let name = self.identifier()?;
                match self.peek().and_then(step_of) {
                    Some(step) if !self.step_starts_operand() => {
                        self.pos += 1;
                        Ok(Expr::Step {
                            name,
                            step,
                            fixity: Fixity::Postfix,
                        })
                    }
                    _ => Ok(Expr::Variable(name)),
                }
            }
            _ => Err(self.unexpected("number, variable or '('")),
        }
    }

    /// A step token directly followed by a name (`y ++z`) is not a postfix
    /// step of the preceding variable; it ends up rejected as trailing input.
    fn step_starts_operand(&self) -> bool {
        matches!(self.peek_at(1), Some(Token::Identifier(_)))
    }
}

fn step_of(token: &Token) -> Option<Step> {
    match token {
        Token::PlusPlus => Some(Step::Increment),
        Token::MinusMinus => Some(Step::Decrement),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn test_parse_precedence() {
        let stmt = parse_statement("y = 1 + 2 * x").unwrap();
        assert_eq!(
            stmt,
            Statement::Assign {
                target: "y".into(),
                op: AssignOp::Set,
                value: Expr::Binary {
                    op: BinaryOp::Add,
                    lhs: Box::new(Expr::Number(1)),
                    rhs: Box::new(Expr::Binary {
                        op: BinaryOp::Mul,
                        lhs: Box::new(Expr::Number(2)),
                        rhs: Box::new(var("x")),
                    }),
                },
            }
        );
    }

    #[test]
    fn test_parse_parentheses() {
        let stmt = parse_statement("y = (5 + 3) * 10").unwrap();
        let Statement::Assign { value, .. } = stmt else {
            panic!("expected assignment");
        };
        assert_eq!(value.to_string(), "((5 + 3) * 10)");
    }

    #[test]
    fn test_parse_compound() {
        let stmt = parse_statement("x *= y - 1").unwrap();
        assert!(matches!(
            stmt,
            Statement::Assign {
                op: AssignOp::Compound(BinaryOp::Mul),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_standalone_steps() {
        assert_eq!(
            parse_statement("++i").unwrap(),
            Statement::Step {
                target: "i".into(),
                step: Step::Increment,
                fixity: Fixity::Prefix,
            }
        );
        assert_eq!(
            parse_statement("i--").unwrap(),
            Statement::Step {
                target: "i".into(),
                step: Step::Decrement,
                fixity: Fixity::Postfix,
            }
        );
    }

    #[test]
    fn test_parse_embedded_steps() {
        let stmt = parse_statement("x = i++ + ++j").unwrap();
        let Statement::Assign { value, .. } = stmt else {
            panic!("expected assignment");
        };
        assert_eq!(value.to_string(), "(i++ + ++j)");
    }

    #[test]
    fn test_parse_double_negation() {
        let stmt = parse_statement("x = a - -b").unwrap();
        let Statement::Assign { value, .. } = stmt else {
            panic!("expected assignment");
        };
        assert_eq!(value.to_string(), "(a - -b)");
    }

    #[test]
    fn test_missing_target() {
        assert_eq!(parse_statement("= 5"), Err(ParseError::MissingTarget));
        assert_eq!(parse_statement("   "), Err(ParseError::MissingTarget));
        assert_eq!(parse_statement("x"), Err(ParseError::MissingTarget));
        assert_eq!(parse_statement("5 + 3"), Err(ParseError::MissingTarget));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(parse_statement("x ="), Err(ParseError::UnexpectedEnd));
        assert!(matches!(
            parse_statement("x = (1 + 2"),
            Err(ParseError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse_statement("x = 1 2"),
            Err(ParseError::UnexpectedToken { offset: 6, .. })
        ));
        assert!(matches!(
            parse_statement("x + 1"),
            Err(ParseError::UnexpectedToken { offset: 2, .. })
        ));
        assert!(matches!(
            parse_statement("x = y ++z"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let n = 10_000;
        let parens = format!("x = {}1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(
            parse_statement(&parens),
            Err(ParseError::TooDeep { offset: 4 + MAX_DEPTH })
        );

        let signs = format!("x = {}1", "-".repeat(n));
        assert!(matches!(
            parse_statement(&signs),
            Err(ParseError::TooDeep { .. })
        ));

        let chain = format!("x = 1{}", " + 1".repeat(n));
        assert!(matches!(
            parse_statement(&chain),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_nesting_within_limit_parses() {
        let n = 200;
        let parens = format!("x = {}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse_statement(&parens).is_ok());

        let chain = format!("x = 1{}", " + 1".repeat(300));
        assert!(parse_statement(&chain).is_ok());
    }
}

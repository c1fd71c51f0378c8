//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, equality, comparison,
//! additive, multiplicative, unary.
//!
//! Source length and nesting depth are capped so hostile text fails with an
//! error instead of exhausting the stack.

use super::lexer::{Token, tokenize};
use super::{BinaryOp, Binding, Expr, FormulaError, MathFn, UnaryOp};

/// Longest formula text accepted, in bytes.
pub const MAX_SOURCE_LEN: usize = 1024;

/// Deepest nesting of parentheses, conditionals and unary operators.
pub const MAX_DEPTH: usize = 64;

pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    if source.len() > MAX_SOURCE_LEN {
        return Err(FormulaError::TooLong {
            len: source.len(),
            max: MAX_SOURCE_LEN,
        });
    }
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.conditional()?;
    parser.eat(&Token::Semicolon);
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FormulaError::UnexpectedToken {
            found: token.to_string(),
            expected: "end of formula",
        }),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), FormulaError> {
        let found = self.next()?;
        if found == token {
            Ok(())
        } else {
            Err(FormulaError::UnexpectedToken {
                found: found.to_string(),
                expected,
            })
        }
    }

    /// Runs `rule` one nesting level deeper.
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::TooDeep { max: MAX_DEPTH });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn conditional(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::conditional_inner)
    }

    fn conditional_inner(&mut self) -> Result<Expr, FormulaError> {
        let condition = self.binary(0)?;
        if self.eat(&Token::Question) {
            let then = self.conditional()?;
            self.expect(Token::Colon, "':'")?;
            let otherwise = self.conditional()?;
            return Ok(Expr::Conditional(
                Box::new(condition),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        Ok(condition)
    }

    /// Precedence climbing over the binary operator levels.
    fn binary(&mut self, level: usize) -> Result<Expr, FormulaError> {
        const LEVELS: usize = 6;
        if level == LEVELS {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self.peek().and_then(|t| binary_op(t, level)) {
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.pos += 1;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next()? {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::LParen => {
                let inner = self.conditional()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => self.identifier(name),
            other => Err(FormulaError::UnexpectedToken {
                found: other.to_string(),
                expected: "a value",
            }),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Expr, FormulaError> {
        match name.as_str() {
            "true" => Ok(Expr::Number(1.0)),
            "false" => Ok(Expr::Number(0.0)),
            "a" => self.property(Binding::Subject),
            "b" => self.property(Binding::Target),
            "v" => {
                self.expect(Token::LBracket, "'['")?;
                let index = self.conditional()?;
                self.expect(Token::RBracket, "']'")?;
                Ok(Expr::Variable(Box::new(index)))
            }
            "Math" => self.math_call(),
            _ => Err(FormulaError::UnknownIdentifier(name)),
        }
    }

    fn property(&mut self, binding: Binding) -> Result<Expr, FormulaError> {
        self.expect(Token::Dot, "'.'")?;
        match self.next()? {
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    // method calls like a.isStateAffected(4) are not part of the language
                    return Err(FormulaError::UnknownProperty {
                        binding: binding.as_str(),
                        name,
                    });
                }
                Ok(Expr::Property(binding, name))
            }
            other => Err(FormulaError::UnexpectedToken {
                found: other.to_string(),
                expected: "a property name",
            }),
        }
    }

    fn math_call(&mut self) -> Result<Expr, FormulaError> {
        self.expect(Token::Dot, "'.'")?;
        let name = match self.next()? {
            Token::Ident(name) => name,
            other => {
                return Err(FormulaError::UnexpectedToken {
                    found: other.to_string(),
                    expected: "a Math function",
                });
            }
        };
        let function: MathFn = name
            .parse()
            .map_err(|_| FormulaError::UnknownFunction(name.clone()))?;
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.conditional()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma, "',' or ')'")?;
            }
        }
        check_arity(function, args.len())?;
        Ok(Expr::Call(function, args))
    }
}

fn binary_op(token: &Token, level: usize) -> Option<BinaryOp> {
    let op = match (level, token) {
        (0, Token::OrOr) => BinaryOp::Or,
        (1, Token::AndAnd) => BinaryOp::And,
        (2, Token::EqEq) => BinaryOp::Eq,
        (2, Token::NotEq) => BinaryOp::Ne,
        (3, Token::Lt) => BinaryOp::Lt,
        (3, Token::Le) => BinaryOp::Le,
        (3, Token::Gt) => BinaryOp::Gt,
        (3, Token::Ge) => BinaryOp::Ge,
        (4, Token::Plus) => BinaryOp::Add,
        (4, Token::Minus) => BinaryOp::Sub,
        (5, Token::Star) => BinaryOp::Mul,
        (5, Token::Slash) => BinaryOp::Div,
        (5, Token::Percent) => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

fn check_arity(function: MathFn, found: usize) -> Result<(), FormulaError> {
    let (ok, expected) = match function {
        MathFn::Pow => (found == 2, "2"),
        MathFn::Min | MathFn::Max => (found >= 1, "at least 1"),
        _ => (found == 1, "1"),
    };
    if ok {
        Ok(())
    } else {
        Err(FormulaError::Arity {
            function,
            expected,
            found,
        })
    }
}

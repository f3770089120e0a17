//! Recursive-descent parser producing the expression tree.
//!
//! Precedence, loosest first: `||`, `&&`, `== !=`, `< > <= >=`, `<< >>`,
//! `+ -`, `* / %`, `^`, then unary `-` and `!`. Every binary level is
//! left-associative.

use super::functions::{FunctionTable, MathFunction};
use super::lexer::{tokenize, Token};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Pow,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
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
}

impl BinOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinOp::Pow => "^",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Number(f64),
    Vector(String),
    Indexed {
        name: String,
        index: String,
    },
    Script(String),
    Quoted(String),
    Braced(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call {
        name: String,
        function: MathFunction,
        arg: Box<Expr>,
    },
}

/// Deepest nesting of parentheses, calls and unary operators.
const MAX_NESTING: usize = 100;

/// Tallest expression tree, operator chains included.
const MAX_HEIGHT: usize = 1000;

fn too_deep() -> Error {
    Error::parse("expression nested too deeply")
}

// An expression and the height of its tree.
type Parsed = (Expr, usize);

fn leaf(expr: Expr) -> Result<Parsed> {
    Ok((expr, 1))
}

fn taller(height: usize) -> Result<usize> {
    let height = height + 1;
    if height > MAX_HEIGHT {
        return Err(too_deep());
    }
    Ok(height)
}

pub(crate) fn parse(input: &str, functions: &FunctionTable) -> Result<Expr> {
    parse_nested(input, functions, 0).map(|(expr, _)| expr)
}

fn parse_nested(input: &str, functions: &FunctionTable, nesting: usize) -> Result<Parsed> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(Error::parse("empty expression"));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        functions,
        nesting,
    };
    let parsed = parser.parse_or()?;
    match parser.peek() {
        None => Ok(parsed),
        Some(extra) => Err(Error::parse(format!("unexpected {extra:?} in \"{input}\""))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    functions: &'a FunctionTable,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(t) if t == expected => Ok(()),
            other => Err(Error::parse(format!("expected {expected:?}, got {other:?}"))),
        }
    }

    // One left-associative level: operands from `next`, operators mapped by `op`.
    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Parsed>,
        op: fn(&Token) -> Option<BinOp>,
    ) -> Result<Parsed> {
        let (mut lhs, mut height) = next(self)?;
        while let Some(bin) = self.peek().and_then(op) {
            self.advance();
            let (rhs, rhs_height) = next(self)?;
            height = taller(height.max(rhs_height))?;
            lhs = Expr::Binary(bin, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, height))
    }

    fn parse_or(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_and, |t| (*t == Token::Or).then_some(BinOp::Or))
    }

    fn parse_and(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_equality, |t| {
            (*t == Token::And).then_some(BinOp::And)
        })
    }

    fn parse_equality(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_relational, |t| match t {
            Token::Eq => Some(BinOp::Eq),
            Token::Ne => Some(BinOp::Ne),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_shift, |t| match t {
            Token::Lt => Some(BinOp::Lt),
            Token::Le => Some(BinOp::Le),
            Token::Gt => Some(BinOp::Gt),
            Token::Ge => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn parse_shift(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_additive, |t| match t {
            Token::Shl => Some(BinOp::Shl),
            Token::Shr => Some(BinOp::Shr),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_multiplicative, |t| match t {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_power, |t| match t {
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    fn parse_power(&mut self) -> Result<Parsed> {
        self.binary_level(Self::parse_unary, |t| {
            (*t == Token::Caret).then_some(BinOp::Pow)
        })
    }

    // Every operand passes through here, so this is where nesting is counted.
    fn parse_unary(&mut self) -> Result<Parsed> {
        if self.nesting >= MAX_NESTING {
            return Err(too_deep());
        }
        self.nesting += 1;
        let parsed = self.parse_unary_operand();
        self.nesting -= 1;
        parsed
    }

    fn parse_unary_operand(&mut self) -> Result<Parsed> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance();
        let (operand, height) = self.parse_unary()?;
        Ok((Expr::Unary(op, Box::new(operand)), taller(height)?))
    }

    fn parse_primary(&mut self) -> Result<Parsed> {
        match self.advance().cloned() {
            Some(Token::Num(n)) => leaf(Expr::Number(n)),
            Some(Token::LParen) => {
                let parsed = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(parsed)
            }
            Some(Token::Ident(name)) => match self.functions.get(&name) {
                Some(function) if self.peek() == Some(&Token::LParen) => {
                    self.advance();
                    let (arg, height) = self.parse_or()?;
                    self.expect(&Token::RParen)?;
                    let call = Expr::Call {
                        name,
                        function,
                        arg: Box::new(arg),
                    };
                    Ok((call, taller(height)?))
                }
                _ => leaf(Expr::Vector(name)),
            },
            Some(Token::Call { name, args }) => match self.functions.get(&name) {
                Some(function) => {
                    let (arg, height) = parse_nested(&args, self.functions, self.nesting)?;
                    let call = Expr::Call {
                        arg: Box::new(arg),
                        name,
                        function,
                    };
                    Ok((call, taller(height)?))
                }
                None => leaf(Expr::Indexed { name, index: args }),
            },
            Some(Token::Script(s)) => leaf(Expr::Script(s)),
            Some(Token::Quoted(s)) => leaf(Expr::Quoted(s)),
            Some(Token::Braced(s)) => leaf(Expr::Braced(s)),
            other => Err(Error::parse(format!("expected an operand, got {other:?}"))),
        }
    }
}

//! Recursive-descent parser producing the script expression tree
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr       := or
//! or         := and ( "||" and )*
//! and        := equality ( "&&" equality )*
//! equality   := comparison ( ( "==" | "!=" ) comparison )*
//! comparison := additive ( ( "<" | "<=" | ">" | ">=" ) additive )*
//! additive   := term ( ( "+" | "-" ) term )*
//! term       := unary ( ( "*" | "/" | "%" ) unary )*
//! unary      := ( "!" | "-" ) unary | postfix
//! postfix    := primary ( "." IDENT | "[" expr "]" )*
//! primary    := NUMBER | STRING | true | false | null | "annotation"
//!             | FUNCTION "(" ( expr ( "," expr )* )? ")" | "(" expr ")"
//! ```

use serde_json::Value;

use super::lexer::{tokenize, Spanned, Token};
use crate::error::ScriptError;

/// Name of the variable bound to the annotation under test
pub const INPUT_VARIABLE: &str = "annotation";

/// Tallest expression tree a script may compile to
///
/// Every node counts: parentheses, unary operators, each link of an
/// operator chain such as `a + b + c`, and each `.field` or `[index]` step.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Longest script accepted, in bytes
pub const MAX_SCRIPT_LENGTH: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Len,
    Contains,
    StartsWith,
    EndsWith,
    Lower,
    Upper,
    Exists,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "len" => Function::Len,
            "contains" => Function::Contains,
            "starts_with" => Function::StartsWith,
            "ends_with" => Function::EndsWith,
            "lower" => Function::Lower,
            "upper" => Function::Upper,
            "exists" => Function::Exists,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Function::Len => "len",
            Function::Contains => "contains",
            Function::StartsWith => "starts_with",
            Function::EndsWith => "ends_with",
            Function::Lower => "lower",
            Function::Upper => "upper",
            Function::Exists => "exists",
        }
    }

    fn arity(self) -> usize {
        match self {
            Function::Len | Function::Lower | Function::Upper | Function::Exists => 1,
            Function::Contains | Function::StartsWith | Function::EndsWith => 2,
        }
    }
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Input,
    Field(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    /// Height of the tree rooted here; a leaf is 1
    ///
    /// Only called on trees whose children already passed the height check,
    /// so recursion stays within `MAX_NESTING_DEPTH + 1`.
    fn height(&self) -> usize {
        1 + match self {
            Expr::Literal(_) | Expr::Input => 0,
            Expr::Field(base, _) | Expr::Unary(_, base) => base.height(),
            Expr::Index(a, b) | Expr::Binary(_, a, b) | Expr::And(a, b) | Expr::Or(a, b) => {
                a.height().max(b.height())
            }
            Expr::Call(_, args) => args.iter().map(Expr::height).max().unwrap_or(0),
        }
    }
}

/// Parse a complete script
pub(crate) fn parse(source: &str) -> Result<Expr, ScriptError> {
    if source.len() > MAX_SCRIPT_LENGTH {
        return Err(ScriptError::parse(
            MAX_SCRIPT_LENGTH,
            format!("script exceeds {} bytes", MAX_SCRIPT_LENGTH),
        ));
    }
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: source.len(),
    };
    if parser.tokens.is_empty() {
        return Err(ScriptError::parse(0, "empty script"));
    }
    let expr = parser.expr()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(ScriptError::parse(
            extra.position,
            format!("unexpected {:?} after expression", extra.token),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ScriptError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(ScriptError::parse(self.position(), format!("expected {}", what)))
        }
    }

    /// Admit a freshly built node if the tree stays within the height limit
    fn node(&self, expr: Expr, position: usize) -> Result<Expr, ScriptError> {
        if expr.height() > MAX_NESTING_DEPTH {
            return Err(ScriptError::parse(
                position,
                format!("expression nested deeper than {}", MAX_NESTING_DEPTH),
            ));
        }
        Ok(expr)
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ScriptError::parse(
                self.position(),
                format!("expression nested deeper than {}", MAX_NESTING_DEPTH),
            ));
        }
        let result = self.or();
        self.depth -= 1;
        result
    }

    fn or(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.and()?;
        loop {
            let position = self.position();
            if !self.eat(&Token::OrOr) {
                break;
            }
            let right = self.and()?;
            left = self.node(Expr::Or(Box::new(left), Box::new(right)), position)?;
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.equality()?;
        loop {
            let position = self.position();
            if !self.eat(&Token::AndAnd) {
                break;
            }
            let right = self.equality()?;
            left = self.node(Expr::And(Box::new(left), Box::new(right)), position)?;
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            let position = self.position();
            self.pos += 1;
            let right = self.comparison()?;
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)), position)?;
        }
    }

    fn comparison(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            let position = self.position();
            self.pos += 1;
            let right = self.additive()?;
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)), position)?;
        }
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            let position = self.position();
            self.pos += 1;
            let right = self.term()?;
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)), position)?;
        }
    }

    fn term(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            let position = self.position();
            self.pos += 1;
            let right = self.unary()?;
            left = self.node(Expr::Binary(op, Box::new(left), Box::new(right)), position)?;
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        let position = self.position();
        self.pos += 1;
        // Chains like `!!!!x` nest without passing through `expr`
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ScriptError::parse(
                self.position(),
                format!("expression nested deeper than {}", MAX_NESTING_DEPTH),
            ));
        }
        let operand = self.unary();
        self.depth -= 1;
        self.node(Expr::Unary(op, Box::new(operand?)), position)
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            let step = self.position();
            if self.eat(&Token::Dot) {
                let position = self.position();
                match self.advance() {
                    Some(Token::Ident(name)) => expr = self.node(Expr::Field(Box::new(expr), name), step)?,
                    _ => return Err(ScriptError::parse(position, "expected field name after '.'")),
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.expr()?;
                self.expect(Token::RBracket, "']'")?;
                expr = self.node(Expr::Index(Box::new(expr), Box::new(index)), step)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Integer(n)) => Ok(Expr::Literal(Value::from(n))),
            Some(Token::Number(n)) => serde_json::Number::from_f64(n)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| ScriptError::parse(position, "number out of range")),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    let function = Function::lookup(&name).ok_or_else(|| {
                        ScriptError::parse(position, format!("unknown function '{}'", name))
                    })?;
                    self.pos += 1;
                    let args = self.arguments()?;
                    if args.len() != function.arity() {
                        return Err(ScriptError::parse(
                            position,
                            format!(
                                "{}() takes {} argument(s), got {}",
                                function.name(),
                                function.arity(),
                                args.len()
                            ),
                        ));
                    }
                    self.node(Expr::Call(function, args), position)
                } else if name == INPUT_VARIABLE {
                    Ok(Expr::Input)
                } else {
                    Err(ScriptError::parse(
                        position,
                        format!("unknown identifier '{}'", name),
                    ))
                }
            }
            Some(other) => Err(ScriptError::parse(
                position,
                format!("unexpected {:?}", other),
            )),
            None => Err(ScriptError::parse(position, "unexpected end of script")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "',' or ')'")?;
            return Ok(args);
        }
    }
}

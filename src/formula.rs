//! Arithmetic formula grammar.
//!
//! A small, side-effect-free expression language: numeric literals,
//! `+ - * / % ^`, parentheses, named constants, and a fixed set of math
//! functions. The expression evaluator substitutes stat values into the
//! text first; whatever identifiers remain must be constants or function
//! names for evaluation to succeed.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := atom ('^' unary)?
//! atom    := number | ident | ident '(' args ')' | '(' expr ')'
//! ```

use crate::error::FormulaError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::Caret => "^".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

fn lex(input: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let mut end = pos;
            let mut seen_dot = false;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || (d == '.' && !seen_dot) {
                    seen_dot |= d == '.';
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let literal = &input[pos..end];
            let value = literal
                .parse::<f64>()
                .map_err(|_| FormulaError::UnexpectedToken(pos, literal.to_string()))?;
            tokens.push((pos, Token::Number(value)));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = pos;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((pos, Token::Ident(input[pos..end].to_string())));
            continue;
        }
        let token = match c {
            '+' => Token::Plus,
            '-' | '\u{2212}' => Token::Minus,
            '*' | '\u{00d7}' => Token::Star,
            '/' | '\u{00f7}' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            other => return Err(FormulaError::UnexpectedChar(pos, other)),
        };
        tokens.push((pos, token));
        chars.next();
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// Deepest nesting a formula may have. Parsing and evaluation recurse
/// once per level, so this bounds their stack use.
pub const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.next() {
            Some((_, ref t)) if *t == expected => Ok(()),
            Some((at, t)) => Err(FormulaError::UnexpectedToken(at, t.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    // Every operator in a left-associative chain nests the tree one level
    // deeper, so chains count against the depth limit too.
    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        let mut chained = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            chained += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        let mut chained = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            chained += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chained;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        let negate = match self.peek() {
            Some(Token::Minus) => true,
            Some(Token::Plus) => false,
            _ => return self.power(),
        };
        self.pos += 1;
        self.descend()?;
        let inner = self.unary()?;
        self.depth -= 1;
        Ok(if negate {
            Expr::Neg(Box::new(inner))
        } else {
            inner
        })
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    /// Arguments of a call, after its opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some((_, Token::Comma)) => continue,
                Some((_, Token::RParen)) => return Ok(args),
                Some((at, t)) => return Err(FormulaError::UnexpectedToken(at, t.describe())),
                None => return Err(FormulaError::UnexpectedEnd),
            }
        }
    }

    fn atom(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some((_, Token::Number(n))) => Ok(Expr::Number(n)),
            Some((_, Token::Ident(name))) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Expr::Ident(name));
                }
                self.pos += 1;
                self.descend()?;
                let args = self.arguments()?;
                self.depth -= 1;
                Ok(Expr::Call(name, args))
            }
            Some((_, Token::LParen)) => {
                self.descend()?;
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            Some((at, t)) => Err(FormulaError::UnexpectedToken(at, t.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

/// Parse a formula into an expression tree.
pub fn parse(input: &str) -> Result<Expr, FormulaError> {
    let mut parser = Parser {
        tokens: lex(input)?,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.next() {
        None => Ok(expr),
        Some((at, t)) => Err(FormulaError::UnexpectedToken(at, t.describe())),
    }
}

/// Parse and evaluate a formula in one step.
///
/// # Examples
///
/// ```rust
/// use charstat::formula::evaluate;
///
/// assert_eq!(evaluate("(10 + 2) * 1.5").unwrap(), 18.0);
/// assert_eq!(evaluate("floor(7 / 2) + max(1, 3)").unwrap(), 6.0);
/// assert!(evaluate("1 / 0").unwrap().is_nan());
/// assert!(evaluate("2d6 + 3").is_err());
/// ```
pub fn evaluate(input: &str) -> Result<f64, FormulaError> {
    parse(input)?.eval()
}

fn constant(name: &str) -> Option<f64> {
    match name.to_ascii_lowercase().as_str() {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "nan" => Some(f64::NAN),
        "inf" | "infinity" => Some(f64::INFINITY),
        _ => None,
    }
}

fn arity(name: &str, args: &[f64], expected: usize) -> Result<(), FormulaError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(FormulaError::Arity {
            name: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64, FormulaError> {
    let unary = |f: fn(f64) -> f64| -> Result<f64, FormulaError> {
        arity(name, args, 1)?;
        Ok(f(args[0]))
    };
    match name.to_ascii_lowercase().as_str() {
        "abs" => unary(f64::abs),
        "ceil" => unary(f64::ceil),
        "floor" => unary(f64::floor),
        "round" => unary(f64::round),
        "trunc" => unary(f64::trunc),
        "sqrt" => unary(f64::sqrt),
        "cbrt" => unary(f64::cbrt),
        "exp" => unary(f64::exp),
        "ln" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "sign" => unary(|x| if x == 0.0 || x.is_nan() { x } else { x.signum() }),
        "log" => match args.len() {
            1 => Ok(args[0].ln()),
            2 => Ok(args[0].log(args[1])),
            found => Err(FormulaError::Arity {
                name: name.to_string(),
                expected: 1,
                found,
            }),
        },
        "pow" => {
            arity(name, args, 2)?;
            Ok(args[0].powf(args[1]))
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(FormulaError::Arity {
                    name: name.to_string(),
                    expected: 1,
                    found: 0,
                });
            }
            let pick_min = name.eq_ignore_ascii_case("min");
            Ok(args.iter().copied().fold(args[0], |acc, x| {
                if x.is_nan() || acc.is_nan() {
                    f64::NAN
                } else if pick_min {
                    acc.min(x)
                } else {
                    acc.max(x)
                }
            }))
        }
        _ => Err(FormulaError::UnknownFunction(name.to_string())),
    }
}

impl Expr {
    /// Evaluate the tree. Division by zero yields `NaN`.
    pub fn eval(&self) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ident(name) => {
                constant(name).ok_or_else(|| FormulaError::UnresolvedIdentifier(name.clone()))
            }
            Expr::Neg(inner) => Ok(-inner.eval()?),
            Expr::Binary(op, lhs, rhs) => {
                let (l, r) = (lhs.eval()?, rhs.eval()?);
                Ok(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div if r == 0.0 => f64::NAN,
                    BinaryOp::Div => l / r,
                    BinaryOp::Rem => l % r,
                    BinaryOp::Pow => l.powf(r),
                })
            }
            Expr::Call(name, args) => {
                let values = args
                    .iter()
                    .map(Expr::eval)
                    .collect::<Result<Vec<_>, _>>()?;
                call(name, &values)
            }
        }
    }
}

//! Formula text to expression tree.
//!
//! The grammar, loosest binding first:
//!
//! ```text
//! expr    := expr ("+" | "-") expr
//!          | expr ("*" | "/") expr
//!          | ("-" | "+") expr
//!          | primary ("^" | "**") expr      (right associative)
//! primary := number | name | name "(" expr ("," expr)* ")" | "(" expr ")"
//! ```
//!
//! Unary minus binds looser than powers, so `-x**2` is `-(x**2)`.

use std::{collections::BTreeSet, fmt};

use super::FormulaError;

const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = u8::MAX;

/// Deepest expression tree the parser builds.
const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 4,
        }
    }

    fn is_right_assoc(self) -> bool {
        matches!(self, Self::Pow)
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Add => " + ",
            Self::Sub => " - ",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
        }
    }

    #[must_use]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Pow => a.powf(b),
        }
    }
}

/// Functions callable from formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Exp,
    Log,
    Sqrt,
    Abs,
    Tanh,
    Min,
    Max,
}

impl Function {
    /// Looks up a function by name, accepting `Abs`, `Min` and `Max` as aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "exp" => Self::Exp,
            "log" => Self::Log,
            "sqrt" => Self::Sqrt,
            "abs" | "Abs" => Self::Abs,
            "tanh" => Self::Tanh,
            "min" | "Min" => Self::Min,
            "max" | "Max" => Self::Max,
            _ => return None,
        })
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Tanh => "tanh",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// `min` and `max` take one or more arguments; the rest take exactly one.
    #[must_use]
    pub fn is_variadic(self) -> bool {
        matches!(self, Self::Min | Self::Max)
    }

    /// Applies a one-argument function.
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Sqrt => x.sqrt(),
            Self::Abs => x.abs(),
            Self::Tanh => x.tanh(),
            Self::Min | Self::Max => x,
        }
    }

    /// Folds two arguments of a variadic function.
    #[must_use]
    pub fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            _ => a,
        }
    }
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Symbol(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Parses formula text.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Parse`] with the byte position of the first
    /// offending token.
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let mut parser = Parser {
            tokens: tokenize(text)?,
            pos: 0,
            end: text.len(),
            depth: 0,
        };
        let expr = parser.expr(0)?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(FormulaError::parse(
                token.position,
                format!("unexpected {}", token.kind),
            )),
        }
    }

    /// The free symbols of the expression.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Number(_) => {}
            Self::Symbol(name) => {
                out.insert(name.clone());
            }
            Self::Neg(inner) => inner.collect_symbols(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Self::Call { args, .. } => args.iter().for_each(|arg| arg.collect_symbols(out)),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Number(value) if *value < 0.0 => UNARY_PRECEDENCE,
            Self::Neg(_) => UNARY_PRECEDENCE,
            Self::Binary { op, .. } => op.precedence(),
            Self::Number(_) | Self::Symbol(_) | Self::Call { .. } => ATOM_PRECEDENCE,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Symbol(name) => f.write_str(name),
            Self::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_operand(f, inner.precedence() < UNARY_PRECEDENCE)
            }
            Self::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let (lhs_prec, rhs_prec) = (lhs.precedence(), rhs.precedence());
                lhs.fmt_operand(f, lhs_prec < prec || (op.is_right_assoc() && lhs_prec == prec))?;
                f.write_str(op.symbol())?;
                rhs.fmt_operand(f, rhs_prec < prec || (!op.is_right_assoc() && rhs_prec == prec))
            }
            Self::Call { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Checks that every name can be used as a formula symbol.
///
/// # Errors
///
/// Returns [`FormulaError::InvalidName`] listing the names that are not
/// identifiers or that shadow a function.
pub fn check_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), FormulaError> {
    let names: Vec<String> = names
        .into_iter()
        .filter(|name| !is_identifier(name) || Function::from_name(name).is_some())
        .map(str::to_owned)
        .collect();
    if names.is_empty() {
        Ok(())
    } else {
        Err(FormulaError::InvalidName { names })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "number {value}"),
            Self::Ident(name) => write!(f, "name {name:?}"),
            Self::Op(op) => write!(f, "operator {:?}", op.symbol().trim()),
            Self::LParen => f.write_str("\"(\""),
            Self::RParen => f.write_str("\")\""),
            Self::Comma => f.write_str("\",\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let b = bytes[i];
        let kind = match b {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let literal = &text[start..i];
                let value = literal
                    .parse()
                    .map_err(|_| FormulaError::parse(start, format!("invalid number {literal:?}")))?;
                TokenKind::Number(value)
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                TokenKind::Ident(text[start..i].to_owned())
            }
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                TokenKind::Op(BinaryOp::Pow)
            }
            _ => {
                let kind = match b {
                    b'+' => TokenKind::Op(BinaryOp::Add),
                    b'-' => TokenKind::Op(BinaryOp::Sub),
                    b'*' => TokenKind::Op(BinaryOp::Mul),
                    b'/' => TokenKind::Op(BinaryOp::Div),
                    b'^' => TokenKind::Op(BinaryOp::Pow),
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b',' => TokenKind::Comma,
                    _ => {
                        let c = text[start..].chars().next().unwrap_or('?');
                        return Err(FormulaError::parse(start, format!("unexpected character {c:?}")));
                    }
                };
                i += 1;
                kind
            }
        };
        tokens.push(Token {
            kind,
            position: start,
        });
    }
    Ok(tokens)
}

/// Returns the end of the number literal starting at `start`.
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = digits(start);
    if bytes.get(i) == Some(&b'.') {
        i = digits(i + 1);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(i + 1), Some(b'+' | b'-')));
        if bytes.get(i + 1 + sign).is_some_and(u8::is_ascii_digit) {
            i = digits(i + 1 + sign);
        }
    }
    i
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_op(&self) -> Option<BinaryOp> {
        match self.peek()?.kind {
            TokenKind::Op(op) => Some(op),
            _ => None,
        }
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| FormulaError::parse(self.end, "unexpected end of formula"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), FormulaError> {
        let token = self.next()?;
        if token.kind == *kind {
            Ok(())
        } else {
            Err(FormulaError::parse(
                token.position,
                format!("expected {kind}, found {}", token.kind),
            ))
        }
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let position = self.peek().map_or(self.end, |t| t.position);
            return Err(FormulaError::parse(
                position,
                format!("formula nested deeper than {MAX_NESTING} levels"),
            ));
        }
        Ok(())
    }

    fn expr(&mut self, min_prec: u8) -> Result<Expr, FormulaError> {
        let outer = self.depth;
        let result = self.binary(min_prec);
        self.depth = outer;
        result
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr, FormulaError> {
        self.enter()?;
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            // Each operator in a chain nests the tree one level deeper.
            self.enter()?;
            let next_min = if op.is_right_assoc() { prec } else { prec + 1 };
            let rhs = self.expr(next_min)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek_op() {
            Some(BinaryOp::Sub) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.expr(UNARY_PRECEDENCE)?)))
            }
            Some(BinaryOp::Add) => {
                self.pos += 1;
                self.expr(UNARY_PRECEDENCE)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::Ident(name) => {
                if self.peek().is_some_and(|t| t.kind == TokenKind::LParen) {
                    self.call(&name, token.position)
                } else {
                    Ok(Expr::Symbol(name))
                }
            }
            TokenKind::LParen => {
                let inner = self.expr(0)?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(FormulaError::parse(
                token.position,
                format!("unexpected {other}"),
            )),
        }
    }

    fn call(&mut self, name: &str, position: usize) -> Result<Expr, FormulaError> {
        let func = Function::from_name(name)
            .ok_or_else(|| FormulaError::parse(position, format!("unknown function {name:?}")))?;
        self.expect(&TokenKind::LParen)?;

        let mut args = vec![self.expr(0)?];
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => args.push(self.expr(0)?),
                TokenKind::RParen => break,
                other => {
                    return Err(FormulaError::parse(
                        token.position,
                        format!("expected \",\" or \")\", found {other}"),
                    ));
                }
            }
        }

        if !func.is_variadic() && args.len() != 1 {
            return Err(FormulaError::parse(
                position,
                format!("{name} takes 1 argument, got {}", args.len()),
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Box<Expr> {
        Box::new(Expr::Symbol(name.to_owned()))
    }

    fn num(value: f64) -> Box<Expr> {
        Box::new(Expr::Number(value))
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            Expr::parse("a + b*c").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: sym("a"),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: sym("b"),
                    rhs: sym("c"),
                }),
            }
        );

        assert_eq!(
            Expr::parse("a ^ b ** c").unwrap(),
            Expr::Binary {
                op: BinaryOp::Pow,
                lhs: sym("a"),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    lhs: sym("b"),
                    rhs: sym("c"),
                }),
            }
        );

        assert_eq!(
            Expr::parse("-x**2").unwrap(),
            Expr::Neg(Box::new(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: sym("x"),
                rhs: num(2.0),
            }))
        );

        assert_eq!(
            Expr::parse("a - b - c").unwrap().to_string(),
            "a - b - c"
        );
        assert_eq!(Expr::parse("a - (b - c)").unwrap().to_string(), "a - (b - c)");
    }

    #[test]
    fn parses_numbers_and_functions() {
        let expr = Expr::parse("Vmax * oxy / (Km + oxy) * exp(-1.5e-2 * T)").unwrap();
        assert_eq!(
            expr.symbols().into_iter().collect::<Vec<_>>(),
            ["Km", "T", "Vmax", "oxy"]
        );

        assert_eq!(
            Expr::parse("Max(0, Min(h2s, 2.5))").unwrap().to_string(),
            "max(0, min(h2s, 2.5))"
        );
        assert_eq!(Expr::parse(".5 + 3.").unwrap().to_string(), "0.5 + 3");
    }

    #[test]
    fn display_reparses_to_the_same_tree() {
        for text in [
            "k*oxy*(1 - oxy/Ki)",
            "-(a + b)*c",
            "(-a)**b",
            "2**-x",
            "a/(b*c)",
            "abs(x - y)**0.5 + tanh(z)",
        ] {
            let expr = Expr::parse(text).unwrap();
            assert_eq!(Expr::parse(&expr.to_string()).unwrap(), expr, "{text}");
        }
    }

    #[test]
    fn reports_error_positions() {
        for (text, position) in [
            ("a +", 3),
            ("a + * b", 4),
            ("(a + b", 6),
            ("a $ b", 2),
            ("a b", 2),
            ("foo(a)", 0),
            ("exp(a, b)", 0),
            ("", 0),
            ("min()", 4),
        ] {
            match Expr::parse(text) {
                Err(FormulaError::Parse { position: found, .. }) => {
                    assert_eq!(found, position, "{text}");
                }
                other => panic!("{text}: expected a parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn limits_nesting_depth() {
        let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        assert!(Expr::parse(&nested(50)).is_ok());
        assert!(Expr::parse(&format!("a{}", "+a".repeat(100))).is_ok());

        for text in [
            nested(100_000),
            format!("a{}", "+a".repeat(100_000)),
            format!("{}a", "-".repeat(100_000)),
            format!("a{}", "**a".repeat(100_000)),
        ] {
            assert!(
                matches!(Expr::parse(&text), Err(FormulaError::Parse { .. })),
                "{}",
                &text[..10]
            );
        }
    }

    #[test]
    fn checks_names() {
        assert!(check_names(["oxy", "h2s", "_k1", "Vmax"]).is_ok());
        assert_eq!(
            check_names(["oxy", "1x", "a b", "exp", ""]),
            Err(FormulaError::InvalidName {
                names: vec!["1x".into(), "a b".into(), "exp".into(), String::new()]
            })
        );
    }
}

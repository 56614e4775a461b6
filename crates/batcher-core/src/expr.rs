//! Restricted arithmetic expressions for computed parameter candidates.
//!
//! Description files may write `"expr: range(1, 5)"` or `"expr: base * 2"`
//! where a literal value is expected. The language only knows numbers, the
//! variables declared in the description's `vars` table, the operators
//! `+ - * / % **`, parentheses and the functions `range`, `min` and `max`.

use std::collections::BTreeMap;

use crate::errors::{BatcherError, ErrorInfo};
use crate::value::ParamValue;

/// Prefix marking a string value as an expression.
pub const EXPR_PREFIX: &str = "expr:";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    fn into_value(self) -> ParamValue {
        match self {
            Num::Int(v) => ParamValue::Int(v),
            Num::Float(v) => ParamValue::Float(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Val {
    Num(Num),
    List(Vec<Num>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Num),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

fn error(code: &str, message: impl Into<String>, source: &str) -> BatcherError {
    BatcherError::Expr(ErrorInfo::new(code, message).with_context("expr", source))
}

fn lex(source: &str) -> Result<Vec<Token>, BatcherError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        let c = chars[idx];
        if c.is_whitespace() {
            idx += 1;
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(idx + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = idx;
            let mut is_float = false;
            while idx < chars.len() {
                let d = chars[idx];
                if d.is_ascii_digit() {
                    idx += 1;
                } else if d == '.' && !is_float {
                    is_float = true;
                    idx += 1;
                } else if (d == 'e' || d == 'E')
                    && chars
                        .get(idx + 1)
                        .is_some_and(|n| n.is_ascii_digit() || *n == '-' || *n == '+')
                {
                    is_float = true;
                    idx += 2;
                } else {
                    break;
                }
            }
            let text: String = chars[start..idx].iter().collect();
            let num = if is_float {
                text.parse::<f64>().map(Num::Float).ok()
            } else {
                text.parse::<i64>().map(Num::Int).ok()
            };
            match num {
                Some(num) => tokens.push(Token::Num(num)),
                None => {
                    return Err(error(
                        "expr.number",
                        format!("invalid number '{text}'"),
                        source,
                    ))
                }
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = idx;
            while idx < chars.len() && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '_') {
                idx += 1;
            }
            tokens.push(Token::Ident(chars[start..idx].iter().collect()));
        } else {
            let token = match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                '+' => Token::Op("+"),
                '-' => Token::Op("-"),
                '/' => Token::Op("/"),
                '%' => Token::Op("%"),
                '*' if chars.get(idx + 1) == Some(&'*') => {
                    idx += 1;
                    Token::Op("**")
                }
                '*' => Token::Op("*"),
                other => {
                    return Err(error(
                        "expr.unexpected_char",
                        format!("unexpected character '{other}'"),
                        source,
                    ))
                }
            };
            tokens.push(token);
            idx += 1;
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    vars: &'a BTreeMap<String, ParamValue>,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn err(&self, code: &str, message: impl Into<String>) -> BatcherError {
        error(code, message, self.source)
    }

    fn scalar(&self, value: Val) -> Result<Num, BatcherError> {
        match value {
            Val::Num(num) => Ok(num),
            Val::List(_) => Err(self.err("expr.type", "arithmetic on a list is not supported")),
        }
    }

    fn expr(&mut self) -> Result<Val, BatcherError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let rhs = self.term()?;
            lhs = Val::Num(self.binary(op, self.scalar(lhs)?, self.scalar(rhs)?)?);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Val, BatcherError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&["*", "/", "%"]) {
            let rhs = self.unary()?;
            lhs = Val::Num(self.binary(op, self.scalar(lhs)?, self.scalar(rhs)?)?);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Val, BatcherError> {
        match self.eat_op(&["-", "+"]) {
            Some("-") => {
                let value = self.unary()?;
                let num = match self.scalar(value)? {
                    Num::Int(v) => Num::Int(v.checked_neg().ok_or_else(|| self.overflow())?),
                    Num::Float(v) => Num::Float(-v),
                };
                Ok(Val::Num(num))
            }
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Val, BatcherError> {
        let base = self.atom()?;
        if self.eat_op(&["**"]).is_some() {
            let exp = self.unary()?;
            return Ok(Val::Num(self.binary("**", self.scalar(base)?, self.scalar(exp)?)?));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Val, BatcherError> {
        match self.next() {
            Some(Token::Num(num)) => Ok(Val::Num(num)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args()?;
                    self.call(&name, args)
                } else {
                    self.variable(&name)
                }
            }
            Some(other) => Err(self.err("expr.syntax", format!("unexpected token {other:?}"))),
            None => Err(self.err("expr.syntax", "unexpected end of expression")),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), BatcherError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(self.err("expr.syntax", "expected ')'")),
        }
    }

    fn args(&mut self) -> Result<Vec<Val>, BatcherError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(self.err("expr.syntax", "expected ',' or ')' in call")),
            }
        }
    }

    fn variable(&self, name: &str) -> Result<Val, BatcherError> {
        let value = self.vars.get(name).ok_or_else(|| {
            self.err("expr.unknown_var", format!("unknown variable '{name}'"))
                .with_var(name)
        })?;
        match value {
            ParamValue::Int(v) => Ok(Val::Num(Num::Int(*v))),
            ParamValue::Float(v) => Ok(Val::Num(Num::Float(*v))),
            _ => Err(self
                .err("expr.type", format!("variable '{name}' is not numeric"))
                .with_var(name)),
        }
    }

    fn call(&self, name: &str, args: Vec<Val>) -> Result<Val, BatcherError> {
        match name {
            "range" => {
                let ints = args
                    .into_iter()
                    .map(|arg| match self.scalar(arg)? {
                        Num::Int(v) => Ok(v),
                        Num::Float(_) => Err(self.err("expr.type", "range() takes integers")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let (start, stop, step) = match ints.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => return Err(self.err("expr.arity", "range() takes 1 to 3 arguments")),
                };
                if step == 0 {
                    return Err(self.err("expr.range_step", "range() step must not be zero"));
                }
                let mut out = Vec::new();
                let mut cur = start;
                while (step > 0 && cur < stop) || (step < 0 && cur > stop) {
                    out.push(Num::Int(cur));
                    cur = match cur.checked_add(step) {
                        Some(next) => next,
                        None => break,
                    };
                }
                Ok(Val::List(out))
            }
            "min" | "max" => {
                let mut nums = Vec::new();
                for arg in args {
                    match arg {
                        Val::Num(num) => nums.push(num),
                        Val::List(list) => nums.extend(list),
                    }
                }
                let pick = |a: Num, b: Num| {
                    let take_b = if name == "min" {
                        b.as_f64() < a.as_f64()
                    } else {
                        b.as_f64() > a.as_f64()
                    };
                    if take_b {
                        b
                    } else {
                        a
                    }
                };
                nums.into_iter()
                    .reduce(pick)
                    .map(Val::Num)
                    .ok_or_else(|| self.err("expr.arity", format!("{name}() needs arguments")))
            }
            other => Err(self.err("expr.unknown_fn", format!("unknown function '{other}'"))),
        }
    }

    fn overflow(&self) -> BatcherError {
        self.err("expr.overflow", "integer overflow")
    }

    fn binary(&self, op: &str, lhs: Num, rhs: Num) -> Result<Num, BatcherError> {
        if let (Num::Int(a), Num::Int(b)) = (lhs, rhs) {
            let result = match op {
                "+" => a.checked_add(b),
                "-" => a.checked_sub(b),
                "*" => a.checked_mul(b),
                "%" if b == 0 => return Err(self.err("expr.div_zero", "modulo by zero")),
                "%" => a.checked_rem_euclid(b),
                "**" if b >= 0 => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
                _ => None,
            };
            if let Some(value) = result {
                return Ok(Num::Int(value));
            }
            if matches!(op, "+" | "-" | "*" | "%") || (op == "**" && b >= 0) {
                return Err(self.overflow());
            }
        }
        let (a, b) = (lhs.as_f64(), rhs.as_f64());
        let value = match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" | "%" if b == 0.0 => return Err(self.err("expr.div_zero", "division by zero")),
            "/" => a / b,
            "%" => a.rem_euclid(b),
            "**" => a.powf(b),
            other => return Err(self.err("expr.syntax", format!("unknown operator '{other}'"))),
        };
        Ok(Num::Float(value))
    }
}

trait WithVar {
    fn with_var(self, name: &str) -> Self;
}

impl WithVar for BatcherError {
    fn with_var(self, name: &str) -> Self {
        match self {
            BatcherError::Expr(info) => BatcherError::Expr(info.with_context("var", name)),
            other => other,
        }
    }
}

/// Returns the expression body when `text` carries the [`EXPR_PREFIX`].
pub fn strip_expr(text: &str) -> Option<&str> {
    text.trim_start().strip_prefix(EXPR_PREFIX).map(str::trim)
}

/// Evaluates `source` against `vars`, returning the produced candidates.
///
/// Scalar results yield a single candidate; `range(..)` yields one per element.
pub fn evaluate(
    source: &str,
    vars: &BTreeMap<String, ParamValue>,
) -> Result<Vec<ParamValue>, BatcherError> {
    let mut parser = Parser {
        tokens: lex(source)?,
        pos: 0,
        vars,
        source,
    };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.err("expr.syntax", "trailing input after expression"));
    }
    Ok(match value {
        Val::Num(num) => vec![num.into_value()],
        Val::List(list) => list.into_iter().map(Num::into_value).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Result<Vec<ParamValue>, BatcherError> {
        let vars: BTreeMap<String, ParamValue> =
            [("base".to_string(), ParamValue::Int(4))].into_iter().collect();
        evaluate(src, &vars)
    }

    #[test]
    fn arithmetic_respects_precedence() {
        assert_eq!(eval("2 + base * 3").unwrap(), vec![ParamValue::Int(14)]);
        assert_eq!(eval("(2 + base) * 3").unwrap(), vec![ParamValue::Int(18)]);
        assert_eq!(eval("-2 ** 2").unwrap(), vec![ParamValue::Int(-4)]);
        assert_eq!(eval("7 / 2").unwrap(), vec![ParamValue::Float(3.5)]);
        assert_eq!(eval("7 % 3").unwrap(), vec![ParamValue::Int(1)]);
    }

    #[test]
    fn range_expands_to_candidates() {
        let values = eval("range(1, base)").unwrap();
        assert_eq!(
            values,
            vec![ParamValue::Int(1), ParamValue::Int(2), ParamValue::Int(3)]
        );
        assert_eq!(eval("range(6, 0, -3)").unwrap().len(), 2);
        assert_eq!(eval("max(range(5))").unwrap(), vec![ParamValue::Int(4)]);
    }

    #[test]
    fn rejects_unsafe_or_invalid_input() {
        assert_eq!(eval("open(1)").unwrap_err().info().code, "expr.unknown_fn");
        assert_eq!(eval("nope + 1").unwrap_err().info().code, "expr.unknown_var");
        assert_eq!(eval("1 / 0").unwrap_err().info().code, "expr.div_zero");
        assert_eq!(eval("range(1, 2, 0)").unwrap_err().info().code, "expr.range_step");
        assert_eq!(eval("1 +").unwrap_err().info().code, "expr.syntax");
        assert_eq!(eval("'a'").unwrap_err().info().code, "expr.unexpected_char");
    }

    #[test]
    fn strips_prefix() {
        assert_eq!(strip_expr("expr: 1 + 2"), Some("1 + 2"));
        assert_eq!(strip_expr("plain"), None);
    }
}

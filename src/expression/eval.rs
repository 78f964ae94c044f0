//! Constrained expression interpreter.
//!
//! Evaluates arithmetic and comparison expressions over already-rendered
//! template values for the `condition` and `math` connectors. This is a
//! deliberately small grammar (numbers, strings, booleans, `+ - * / %`,
//! comparisons, `&& || !`, parentheses) executed by a recursive-descent
//! interpreter; it is never a general-purpose code evaluator, so node
//! configs cannot run arbitrary code.

use serde_json::{json, Value};

/// Evaluate an expression string to a JSON value.
///
/// Integral results come back as JSON integers, everything else as the
/// nearest JSON type. Type errors (e.g. multiplying strings) and syntax
/// errors are reported as `Err` with a human-readable reason.
pub fn evaluate(expression: &str) -> Result<Value, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected trailing input at token {}", parser.pos));
    }
    Ok(value.into_json())
}

/// Evaluate an expression and coerce the result to a boolean.
///
/// Follows truthiness for non-boolean results: zero, empty string, and null
/// are false; everything else is true.
pub fn evaluate_bool(expression: &str) -> Result<bool, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected trailing input at token {}", parser.pos));
    }
    Ok(value.truthy())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Ev {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Ev {
    fn truthy(&self) -> bool {
        match self {
            Ev::Bool(b) => *b,
            Ev::Num(n) => *n != 0.0,
            Ev::Str(s) => !s.is_empty(),
            Ev::Null => false,
        }
    }

    fn into_json(self) -> Value {
        match self {
            Ev::Num(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    json!(n as i64)
                } else {
                    json!(n)
                }
            }
            Ev::Str(s) => Value::String(s),
            Ev::Bool(b) => Value::Bool(b),
            Ev::Null => Value::Null,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Ev::Num(_) => "number",
            Ev::Str(_) => "string",
            Ev::Bool(_) => "boolean",
            Ev::Null => "null",
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let bytes: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Eq);
                    i += 2;
                } else {
                    return Err("single '=' is not a valid operator".to_string());
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&'&') {
                    tokens.push(Token::And);
                    i += 2;
                } else {
                    return Err("single '&' is not a valid operator".to_string());
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&'|') {
                    tokens.push(Token::Or);
                    i += 2;
                } else {
                    return Err("single '|' is not a valid operator".to_string());
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                loop {
                    match bytes.get(i) {
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.') {
                    i += 1;
                }
                let text: String = bytes[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number: {text}"))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == '_') {
                    i += 1;
                }
                let word: String = bytes[start..i].iter().collect();
                match word.as_str() {
                    "true" => tokens.push(Token::Bool(true)),
                    "false" => tokens.push(Token::Bool(false)),
                    "null" => tokens.push(Token::Null),
                    other => return Err(format!("unknown identifier: {other}")),
                }
            }
            other => return Err(format!("unexpected character: {other}")),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Ev, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Ev::Bool(left.truthy() || right.truthy());
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Ev, String> {
        let mut left = self.parse_equality()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = Ev::Bool(left.truthy() && right.truthy());
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Ev, String> {
        let mut left = self.parse_comparison()?;
        loop {
            let negate = match self.peek() {
                Some(Token::Eq) => false,
                Some(Token::Ne) => true,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            let equal = match (&left, &right) {
                (Ev::Num(a), Ev::Num(b)) => a == b,
                (a, b) => a == b,
            };
            left = Ev::Bool(equal != negate);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Ev, String> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => Token::Lt,
                Some(Token::Le) => Token::Le,
                Some(Token::Gt) => Token::Gt,
                Some(Token::Ge) => Token::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Ev::Bool(compare(&left, &right, &op)?);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Ev, String> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Token::Plus,
                Some(Token::Minus) => Token::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = match op {
                Token::Plus => add(left, right)?,
                _ => numeric(left, right, "-", |a, b| a - b)?,
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Ev, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Token::Star,
                Some(Token::Slash) => Token::Slash,
                Some(Token::Percent) => Token::Percent,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = match op {
                Token::Star => numeric(left, right, "*", |a, b| a * b)?,
                Token::Slash => {
                    if matches!(right, Ev::Num(n) if n == 0.0) {
                        return Err("division by zero".to_string());
                    }
                    numeric(left, right, "/", |a, b| a / b)?
                }
                _ => {
                    if matches!(right, Ev::Num(n) if n == 0.0) {
                        return Err("division by zero".to_string());
                    }
                    numeric(left, right, "%", |a, b| a % b)?
                }
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Ev, String> {
        match self.peek() {
            Some(Token::Not) => {
                self.advance();
                let value = self.parse_unary()?;
                Ok(Ev::Bool(!value.truthy()))
            }
            Some(Token::Minus) => {
                self.advance();
                match self.parse_unary()? {
                    Ev::Num(n) => Ok(Ev::Num(-n)),
                    other => Err(format!("cannot negate {}", other.type_name())),
                }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Ev, String> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(Ev::Num(n)),
            Some(Token::Str(s)) => Ok(Ev::Str(s)),
            Some(Token::Bool(b)) => Ok(Ev::Bool(b)),
            Some(Token::Null) => Ok(Ev::Null),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected closing parenthesis".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token: {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn numeric(left: Ev, right: Ev, op: &str, f: impl Fn(f64, f64) -> f64) -> Result<Ev, String> {
    match (left, right) {
        (Ev::Num(a), Ev::Num(b)) => Ok(Ev::Num(f(a, b))),
        (a, b) => Err(format!(
            "operator '{op}' requires numbers, got {} and {}",
            a.type_name(),
            b.type_name()
        )),
    }
}

fn add(left: Ev, right: Ev) -> Result<Ev, String> {
    match (left, right) {
        (Ev::Num(a), Ev::Num(b)) => Ok(Ev::Num(a + b)),
        // String concatenation mirrors how template values get spliced in
        (Ev::Str(a), b) => Ok(Ev::Str(format!("{a}{}", display(&b)))),
        (a, Ev::Str(b)) => Ok(Ev::Str(format!("{}{b}", display(&a)))),
        (a, b) => Err(format!(
            "operator '+' requires numbers or strings, got {} and {}",
            a.type_name(),
            b.type_name()
        )),
    }
}

fn display(value: &Ev) -> String {
    match value {
        Ev::Num(n) => {
            if n.fract() == 0.0 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Ev::Str(s) => s.clone(),
        Ev::Bool(b) => b.to_string(),
        Ev::Null => "null".to_string(),
    }
}

fn compare(left: &Ev, right: &Ev, op: &Token) -> Result<bool, String> {
    let ordering = match (left, right) {
        (Ev::Num(a), Ev::Num(b)) => a.partial_cmp(b),
        (Ev::Str(a), Ev::Str(b)) => Some(a.cmp(b)),
        (a, b) => {
            return Err(format!(
                "cannot compare {} with {}",
                a.type_name(),
                b.type_name()
            ))
        }
    };
    let ordering = ordering.ok_or_else(|| "values are not comparable".to_string())?;
    Ok(match op {
        Token::Lt => ordering.is_lt(),
        Token::Le => ordering.is_le(),
        Token::Gt => ordering.is_gt(),
        Token::Ge => ordering.is_ge(),
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_with_precedence() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), json!(7));
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), json!(9));
        assert_eq!(evaluate("10 / 4").unwrap(), json!(2.5));
        assert_eq!(evaluate("10 % 3").unwrap(), json!(1));
        assert_eq!(evaluate("-4 + 6").unwrap(), json!(2));
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(evaluate("21 > 18").unwrap(), json!(true));
        assert_eq!(evaluate("3 <= 2").unwrap(), json!(false));
        assert_eq!(evaluate("1 < 2 && 2 < 3").unwrap(), json!(true));
        assert_eq!(evaluate("false || 5 == 5").unwrap(), json!(true));
        assert_eq!(evaluate("!true").unwrap(), json!(false));
    }

    #[test]
    fn string_equality_and_concat() {
        assert_eq!(evaluate("'active' == 'active'").unwrap(), json!(true));
        assert_eq!(evaluate("'a' != 'b'").unwrap(), json!(true));
        assert_eq!(evaluate("'n=' + 5").unwrap(), json!("n=5"));
    }

    #[test]
    fn truthiness_coercion() {
        assert!(evaluate_bool("1").unwrap());
        assert!(!evaluate_bool("0").unwrap());
        assert!(!evaluate_bool("''").unwrap());
        assert!(!evaluate_bool("null").unwrap());
        assert!(evaluate_bool("'x'").unwrap());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(evaluate("1 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 = 2").is_err());
        assert!(evaluate("foo(1)").is_err());
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn no_identifier_escape_hatch() {
        // Anything that is not a literal or operator is rejected outright,
        // so there is no path to evaluating arbitrary code.
        assert!(evaluate("process").is_err());
        assert!(evaluate("require").is_err());
        assert!(evaluate("os").is_err());
    }
}

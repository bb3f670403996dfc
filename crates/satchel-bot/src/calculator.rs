//! Button-driven calculator.
//!
//! The display is the running expression. `=` evaluates it with integer and
//! float arithmetic: integer operations stay integral, `/` always produces a
//! float, `//` floors and `**` raises to a power.

use thiserror::Error;

use satchel_types::api::{Button, CalcKey, CallbackData, Keyboard, Reply};

pub const INITIAL_DISPLAY: &str = "0";
pub const ERROR_DISPLAY: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("syntax error at position {0}")]
    Syntax(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result out of range")]
    Overflow,
}

/// Apply one key press to the display.
pub fn press(display: &str, key: CalcKey) -> String {
    match key {
        CalcKey::Clear => INITIAL_DISPLAY.to_string(),
        CalcKey::Backspace => {
            if display == ERROR_DISPLAY || display.chars().count() <= 1 {
                INITIAL_DISPLAY.to_string()
            } else {
                let mut chars = display.chars();
                chars.next_back();
                chars.as_str().to_string()
            }
        }
        CalcKey::Equals => match evaluate(display) {
            Ok(value) => value.to_string(),
            Err(_) => ERROR_DISPLAY.to_string(),
        },
        other => {
            if display == INITIAL_DISPLAY || display == ERROR_DISPLAY {
                other.symbol().to_string()
            } else {
                let mut next = display.to_string();
                next.push(other.symbol());
                next
            }
        }
    }
}

pub fn render(display: &str) -> Reply {
    Reply::text(format!("Calculator:\n{display}")).with_keyboard(keypad())
}

pub fn keypad() -> Keyboard {
    use CalcKey::*;

    let key = |k: CalcKey| Button::new(k.symbol().to_string(), CallbackData::Calc(k));
    Keyboard::new()
        .row([Digit(7), Digit(8), Digit(9), Divide].map(key))
        .row([Digit(4), Digit(5), Digit(6), Multiply].map(key))
        .row([Digit(1), Digit(2), Digit(3), Minus].map(key))
        .row([Digit(0), Dot, Equals, Plus].map(key))
        .row([Clear, Backspace].map(key))
}

// -- Evaluation --

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => {
                let magnitude = v.abs();
                if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
                    // 1.5e-05, 1e+16
                    let sci = format!("{v:e}");
                    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
                    let exp: i32 = exp.parse().unwrap_or(0);
                    let sign = if exp < 0 { '-' } else { '+' };
                    write!(f, "{mantissa}e{sign}{:02}", exp.abs())
                } else if v.fract() == 0.0 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    DoubleStar,
}

pub fn evaluate(expr: &str) -> Result<Number, CalcError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(CalcError::Syntax(parser.pos));
    }
    Ok(value)
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_literal(&literal, start)?));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::DoubleStar);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            _ => return Err(CalcError::Syntax(i)),
        }
    }

    Ok(tokens)
}

fn parse_literal(literal: &str, at: usize) -> Result<Number, CalcError> {
    match literal.matches('.').count() {
        // `07` is not a number, but `00` is zero
        0 if literal.starts_with('0') && literal.bytes().any(|b| b != b'0') => {
            Err(CalcError::Syntax(at))
        }
        0 => literal
            .parse::<i64>()
            .map(Number::Int)
            .map_err(|_| CalcError::Overflow),
        1 if literal != "." => literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| CalcError::Syntax(at)),
        _ => Err(CalcError::Syntax(at)),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut lhs = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/' | '//') unary)*
    fn term(&mut self) -> Result<Number, CalcError> {
        let mut lhs = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                match self.unary()? {
                    Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(CalcError::Overflow),
                    Number::Float(f) => Ok(Number::Float(-f)),
                }
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?
    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.unary()?;
            return binary(Token::DoubleStar, base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, CalcError> {
        let at = self.pos;
        match self.advance() {
            Some(Token::Num(n)) => Ok(n),
            _ => Err(CalcError::Syntax(at)),
        }
    }
}

fn binary(op: Token, lhs: Number, rhs: Number) -> Result<Number, CalcError> {
    use Number::{Float, Int};

    let result = match (op, lhs, rhs) {
        (Token::Plus, Int(a), Int(b)) => Int(a.checked_add(b).ok_or(CalcError::Overflow)?),
        (Token::Minus, Int(a), Int(b)) => Int(a.checked_sub(b).ok_or(CalcError::Overflow)?),
        (Token::Star, Int(a), Int(b)) => Int(a.checked_mul(b).ok_or(CalcError::Overflow)?),
        (Token::Plus, a, b) => Float(a.as_f64() + b.as_f64()),
        (Token::Minus, a, b) => Float(a.as_f64() - b.as_f64()),
        (Token::Star, a, b) => Float(a.as_f64() * b.as_f64()),
        (Token::Slash, a, b) => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            Float(a.as_f64() / b.as_f64())
        }
        (Token::DoubleSlash, a, b) => {
            if b.is_zero() {
                return Err(CalcError::DivisionByZero);
            }
            match (a, b) {
                (Int(a), Int(b)) => Int(floor_div(a, b)?),
                (a, b) => Float(float_floor_div(a.as_f64(), b.as_f64())),
            }
        }
        (Token::DoubleStar, a, b) => power(a, b)?,
        _ => unreachable!("not a binary operator"),
    };

    match result {
        Float(f) if !f.is_finite() => Err(CalcError::Overflow),
        other => Ok(other),
    }
}

fn floor_div(a: i64, b: i64) -> Result<i64, CalcError> {
    let q = a.checked_div(b).ok_or(CalcError::Overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Floor division on the exact remainder, so `1 // 0.1` is `9.0` rather
/// than the `10.0` that flooring the rounded quotient gives.
fn float_floor_div(a: f64, b: f64) -> f64 {
    let rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 && (b < 0.0) != (rem < 0.0) {
        div -= 1.0;
    }
    if div == 0.0 {
        return 0.0_f64.copysign(a / b);
    }
    let floored = div.floor();
    if div - floored > 0.5 {
        floored + 1.0
    } else {
        floored
    }
}

fn power(base: Number, exponent: Number) -> Result<Number, CalcError> {
    if base.is_zero() && exponent.as_f64() < 0.0 {
        return Err(CalcError::DivisionByZero);
    }
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| CalcError::Overflow)?;
            b.checked_pow(e).map(Number::Int).ok_or(CalcError::Overflow)
        }
        (b, e) => {
            let value = b.as_f64().powf(e.as_f64());
            if value.is_nan() {
                // negative base with a fractional exponent
                return Err(CalcError::Overflow);
            }
            Ok(Number::Float(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press_all(keys: &str) -> String {
        keys.chars().fold(INITIAL_DISPLAY.to_string(), |display, c| {
            let key = match c.to_string().parse::<CallbackData>() {
                Ok(CallbackData::Calc(key)) => key,
                other => panic!("not a calculator key: {c} ({other:?})"),
            };
            press(&display, key)
        })
    }

    #[test]
    fn seven_plus_eight() {
        assert_eq!(press_all("7+8="), "15");
    }

    #[test]
    fn clear_and_backspace_reset_to_zero() {
        assert_eq!(press_all("123C"), "0");
        assert_eq!(press_all("5⌫"), "0");
        assert_eq!(press_all("12⌫"), "1");
        assert_eq!(press_all("⌫"), "0");
    }

    #[test]
    fn zero_display_is_replaced() {
        assert_eq!(press_all("0"), "0");
        assert_eq!(press_all("07"), "7");
        assert_eq!(press_all("0+"), "+");
    }

    #[test]
    fn errors_show_error_and_recover() {
        assert_eq!(press_all("5+="), ERROR_DISPLAY);
        assert_eq!(press_all("1/0="), ERROR_DISPLAY);
        assert_eq!(press(ERROR_DISPLAY, CalcKey::Digit(4)), "4");
        assert_eq!(press(ERROR_DISPLAY, CalcKey::Backspace), "0");
    }

    #[test]
    fn division_always_yields_float() {
        assert_eq!(press_all("8/4="), "2.0");
        assert_eq!(press_all("7/2="), "3.5");
        assert_eq!(press_all("1.5*2="), "3.0");
    }

    #[test]
    fn precedence_and_unary_sign() {
        assert_eq!(evaluate("2+3*4").unwrap(), Number::Int(14));
        assert_eq!(evaluate("-2**2").unwrap(), Number::Int(-4));
        assert_eq!(evaluate("2**-1").unwrap(), Number::Float(0.5));
        assert_eq!(evaluate("2**3**2").unwrap(), Number::Int(512));
        assert_eq!(evaluate("5--3").unwrap(), Number::Int(8));
    }

    #[test]
    fn floor_division_rounds_down() {
        assert_eq!(evaluate("7//2").unwrap(), Number::Int(3));
        assert_eq!(evaluate("-7//2").unwrap(), Number::Int(-4));
        assert_eq!(evaluate("7//-2").unwrap(), Number::Int(-4));
        assert_eq!(evaluate("7.5//2").unwrap(), Number::Float(3.0));
        assert_eq!(evaluate("1//0.1").unwrap(), Number::Float(9.0));
        assert_eq!(evaluate("-7.5//2").unwrap(), Number::Float(-4.0));
        assert_eq!(evaluate("7.5//-2").unwrap(), Number::Float(-4.0));
    }

    #[test]
    fn malformed_numbers_are_syntax_errors() {
        assert!(matches!(evaluate("1.2.3"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("."), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("*3"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("1+07"), Err(CalcError::Syntax(_))));
        assert_eq!(evaluate("00+7").unwrap(), Number::Int(7));
        assert_eq!(evaluate("07.5").unwrap(), Number::Float(7.5));
        assert_eq!(evaluate(".5+1").unwrap(), Number::Float(1.5));
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(evaluate("9999999999*9999999999"), Err(CalcError::Overflow));
        assert_eq!(evaluate("0**-1"), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn floats_print_like_a_pocket_calculator() {
        assert_eq!(Number::Float(15.0).to_string(), "15.0");
        assert_eq!(Number::Float(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Number::Float(1e16).to_string(), "1e+16");
        assert_eq!(Number::Float(0.000015).to_string(), "1.5e-05");
    }

    #[test]
    fn keypad_has_every_key() {
        let pad = keypad();
        assert_eq!(pad.rows.len(), 5);
        assert_eq!(pad.buttons().count(), 18);
        assert!(pad.buttons().any(|b| b.data == "⌫"));
    }
}

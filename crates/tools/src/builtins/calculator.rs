//! Arithmetic evaluator for the `calculator` tool.
//!
//! Grammar (recursive descent, no `eval`):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := number | func '(' expr ')' | '(' expr ')'
//! func    := sqrt | sin | cos | tan | log | ln | abs
//! ```
//!
//! Trigonometric functions take degrees and `log` is base 10.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::types::{ToolContext, ToolError, TypedTool};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorArgs {
    pub expression: String,
    #[serde(default = "d_true")]
    pub show_steps: bool,
}

fn d_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationKind {
    Basic,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub step: String,
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    pub expression: String,
    pub result: f64,
    pub steps: Vec<CalculationStep>,
    #[serde(rename = "type")]
    pub kind: CalculationKind,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CalculatorTool;

#[async_trait::async_trait]
impl TypedTool for CalculatorTool {
    type Args = CalculatorArgs;
    type Output = CalculatorResult;

    async fn run(&self, _ctx: &ToolContext, args: CalculatorArgs) -> Result<CalculatorResult, ToolError> {
        let started = Instant::now();
        let expr = args.expression.trim().to_lowercase();
        let (value, kind) = evaluate(&expr).map_err(ToolError::Failed)?;

        let steps = if args.show_steps {
            match kind {
                CalculationKind::Basic => vec![
                    step("parse", &expr, "recognised basic arithmetic"),
                    step("result", &value.to_string(), &format!("{expr} = {value}")),
                ],
                CalculationKind::Advanced => vec![
                    step("parse", &expr, "recognised function expression"),
                    step("result", &value.to_string(), "final result"),
                ],
            }
        } else {
            Vec::new()
        };

        Ok(CalculatorResult {
            expression: args.expression,
            result: value,
            steps,
            kind,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn step(name: &str, value: &str, description: &str) -> CalculationStep {
    CalculationStep {
        step: name.into(),
        value: value.into(),
        description: description.into(),
    }
}

/// Evaluate an expression.  Function expressions are rounded to six
/// decimal places.
pub fn evaluate(expression: &str) -> Result<(f64, CalculationKind), String> {
    let mut parser = Parser {
        chars: expression.chars().collect(),
        pos: 0,
        used_function: false,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if let Some(c) = parser.peek() {
        return Err(format!("unexpected '{c}' at position {}", parser.pos));
    }
    if !value.is_finite() {
        return Err("result is not a finite number".into());
    }

    if parser.used_function {
        Ok(((value * 1e6).round() / 1e6, CalculationKind::Advanced))
    } else {
        Ok((value, CalculationKind::Basic))
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    used_function: bool,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut acc = self.term()?;
        loop {
            if self.eat('+') {
                acc += self.term()?;
            } else if self.eat('-') {
                acc -= self.term()?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut acc = self.unary()?;
        loop {
            if self.eat('*') {
                acc *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err("division by zero".into());
                }
                acc /= divisor;
            } else {
                return Ok(acc);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, String> {
        if self.eat('-') {
            return Ok(-self.unary()?);
        }
        if self.eat('+') {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, String> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if !self.eat(')') {
                    return Err("missing closing parenthesis".into());
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.function(),
            Some(c) => Err(format!("unexpected '{c}' at position {}", self.pos)),
            None => Err("unexpected end of expression".into()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("invalid number '{literal}'"))
    }

    fn function(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if !self.eat('(') {
            return Err(format!("expected '(' after {name}"));
        }
        let arg = self.expr()?;
        if !self.eat(')') {
            return Err("missing closing parenthesis".into());
        }
        self.used_function = true;

        match name.as_str() {
            "sqrt" => Ok(arg.sqrt()),
            "sin" => Ok(arg.to_radians().sin()),
            "cos" => Ok(arg.to_radians().cos()),
            "tan" => Ok(arg.to_radians().tan()),
            "log" => Ok(arg.log10()),
            "ln" => Ok(arg.ln()),
            "abs" => Ok(arg.abs()),
            other => Err(format!("unsupported function '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), (14.0, CalculationKind::Basic));
        assert_eq!(evaluate("(2 + 3) * 4").unwrap().0, 20.0);
        assert_eq!(evaluate("-3 + 10 / 4").unwrap().0, -0.5);
    }

    #[test]
    fn functions_are_advanced_and_rounded() {
        assert_eq!(evaluate("sqrt(16)").unwrap(), (4.0, CalculationKind::Advanced));
        assert_eq!(evaluate("sin(30)").unwrap().0, 0.5);
        assert_eq!(evaluate("log(1000)").unwrap().0, 3.0);
        assert_eq!(evaluate("abs(-2.5) * 2").unwrap().0, 5.0);
    }

    #[test]
    fn errors_are_reported() {
        assert_eq!(evaluate("1 / 0").unwrap_err(), "division by zero");
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("pow(2)").unwrap_err().contains("unsupported function"));
        assert!(evaluate("sqrt(-1)").unwrap_err().contains("finite"));
        assert!(evaluate("2 2").unwrap_err().contains("unexpected"));
    }

    #[tokio::test]
    async fn steps_follow_show_steps() {
        let ctx = ToolContext::new("c1", "calculator");
        let with = CalculatorTool
            .run(&ctx, CalculatorArgs { expression: "1+1".into(), show_steps: true })
            .await
            .unwrap();
        assert_eq!(with.steps.len(), 2);
        assert_eq!(with.steps[1].description, "1+1 = 2");

        let without = CalculatorTool
            .run(&ctx, CalculatorArgs { expression: "1+1".into(), show_steps: false })
            .await
            .unwrap();
        assert!(without.steps.is_empty());
        assert_eq!(without.result, 2.0);
    }
}

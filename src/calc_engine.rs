use crate::i18n::{Language, Text};
use log::{debug, warn};
use thiserror::Error;

/// Characters the direct evaluator accepts once whitespace is stripped.
pub const ALLOWED_CHARS: &str = "0123456789+-*/().";

const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operation::Add),
            '-' => Some(Operation::Subtract),
            '*' => Some(Operation::Multiply),
            '/' => Some(Operation::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
        }
    }

    /// No guard for division by zero: infinities and NaN pass straight through.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operation::Start => right,
            Operation::Add => left + right,
            Operation::Subtract => left - right,
            Operation::Multiply => left * right,
            Operation::Divide => left / right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(String),
    Op(Operation),
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Number(s) => s,
            Token::Op(op) => op.symbol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationStep {
    pub position: f64,
    pub operation: Operation,
    pub value: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("expression is empty")]
    Empty,
    #[error("invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
    #[error("unexpected '{found}' at position {index}")]
    UnexpectedToken { found: String, index: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("missing closing parenthesis")]
    MissingClosingParen,
    #[error("parentheses nested deeper than {0} levels")]
    TooDeep(usize),
}

pub fn clean_expression(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/')
}

/// Splits a whitespace-free expression into operands and binary operators.
///
/// A `-` at the very start, or right after another operator, is a sign and
/// stays with the operand that follows it. Parentheses are not special here:
/// they end up inside operand text.
pub fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pending = String::new();
    let mut prev: Option<char> = None;

    for c in expr.chars() {
        match Operation::from_symbol(c) {
            Some(op) => {
                let is_sign = c == '-' && prev.map_or(true, is_operator_char);
                if is_sign {
                    pending.push(c);
                } else {
                    if !pending.is_empty() {
                        tokens.push(Token::Number(std::mem::take(&mut pending)));
                    }
                    tokens.push(Token::Op(op));
                }
            }
            None => pending.push(c),
        }
        prev = Some(c);
    }

    if !pending.is_empty() {
        tokens.push(Token::Number(pending));
    }
    tokens
}

/// Reads the longest leading numeral (`[-+]digits[.digits]`) of `text`,
/// ignoring whatever follows it.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let mut digits = 0;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if digits == 0 {
        return None;
    }
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Left-to-right pairwise reduction of the token list into steps.
///
/// Returns no steps when the list is empty or does not open with a number.
/// A pair whose operator or operand slot is missing (or holds the wrong kind
/// of token) is skipped.
pub fn derive_steps(tokens: &[Token], language: Language) -> Vec<CalculationStep> {
    let mut steps = Vec::new();

    let first = match tokens.first() {
        Some(Token::Number(text)) => match parse_leading_number(text) {
            Some(n) => n,
            None => return steps,
        },
        _ => return steps,
    };

    steps.push(CalculationStep {
        position: first,
        operation: Operation::Start,
        value: first,
        description: language.describe_start(first),
    });

    let mut current = first;
    let mut i = 1;
    while i < tokens.len() {
        let pair = (tokens.get(i), tokens.get(i + 1));
        i += 2;

        let (op, operand) = match pair {
            (Some(Token::Op(op)), Some(Token::Number(text))) => (*op, text),
            _ => continue,
        };

        let value = parse_leading_number(operand).unwrap_or(f64::NAN);
        let position = op.apply(current, value);
        steps.push(CalculationStep {
            position,
            operation: op,
            value,
            description: language.describe_operation(op, value, position),
        });
        current = position;
    }

    steps
}

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

impl ExprToken {
    fn describe(&self) -> String {
        match self {
            ExprToken::Num(n) => format_number(*n),
            ExprToken::Plus => "+".to_string(),
            ExprToken::Minus => "-".to_string(),
            ExprToken::Star => "*".to_string(),
            ExprToken::Slash => "/".to_string(),
            ExprToken::Pow => "**".to_string(),
            ExprToken::LParen => "(".to_string(),
            ExprToken::RParen => ")".to_string(),
        }
    }
}

fn lex(expr: &str) -> Result<Vec<(usize, ExprToken)>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(index, c)) = chars.peek() {
        let token = match c {
            '(' => ExprToken::LParen,
            ')' => ExprToken::RParen,
            '+' => ExprToken::Plus,
            '-' => ExprToken::Minus,
            '/' => ExprToken::Slash,
            '*' => {
                chars.next();
                if let Some(&(_, '*')) = chars.peek() {
                    chars.next();
                    tokens.push((index, ExprToken::Pow));
                } else {
                    tokens.push((index, ExprToken::Star));
                }
                continue;
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        num_str.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let dots = num_str.matches('.').count();
                if dots > 1 || num_str == "." {
                    return Err(EvalError::MalformedNumber(num_str));
                }
                let n = num_str
                    .parse::<f64>()
                    .map_err(|_| EvalError::MalformedNumber(num_str.clone()))?;
                tokens.push((index, ExprToken::Num(n)));
                continue;
            }
            _ => return Err(EvalError::InvalidCharacter { ch: c, index }),
        };
        tokens.push((index, token));
        chars.next();
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, ExprToken)>,
    current: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<(usize, ExprToken)>) -> Self {
        Parser { tokens, current: 0, depth: 0 }
    }

    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.current).map(|(_, t)| t)
    }

    fn unexpected(&self) -> EvalError {
        match self.tokens.get(self.current) {
            Some((index, token)) => EvalError::UnexpectedToken {
                found: token.describe(),
                index: *index,
            },
            None => EvalError::UnexpectedEnd,
        }
    }

    fn parse(&mut self) -> Result<f64, EvalError> {
        let result = self.expr()?;
        if self.current < self.tokens.len() {
            return Err(self.unexpected());
        }
        Ok(result)
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut left = self.term()?;

        loop {
            match self.peek() {
                Some(ExprToken::Plus) => {
                    self.current += 1;
                    left += self.term()?;
                }
                Some(ExprToken::Minus) => {
                    self.current += 1;
                    left -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut left = self.unary()?;

        loop {
            match self.peek() {
                Some(ExprToken::Star) => {
                    self.current += 1;
                    left *= self.unary()?;
                }
                Some(ExprToken::Slash) => {
                    self.current += 1;
                    left /= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(ExprToken::Plus) => {
                self.current += 1;
                self.nested(|p| p.unary())
            }
            Some(ExprToken::Minus) => {
                self.current += 1;
                self.nested(|p| p.unary()).map(|v| -v)
            }
            _ => self.power(),
        }
    }

    // `**` связывает справа налево: 2**3**2 = 2**9
    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.primary()?;

        if let Some(ExprToken::Pow) = self.peek() {
            self.current += 1;
            let exponent = self.nested(|p| p.unary())?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(ExprToken::Num(n)) => {
                let n = *n;
                self.current += 1;
                Ok(n)
            }
            Some(ExprToken::LParen) => {
                self.current += 1;
                let value = self.nested(|p| p.expr())?;
                match self.peek() {
                    Some(ExprToken::RParen) => {
                        self.current += 1;
                        Ok(value)
                    }
                    None => Err(EvalError::MissingClosingParen),
                    Some(_) => Err(self.unexpected()),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<f64, EvalError>) -> Result<f64, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Evaluates a whitespace-free expression with normal precedence and
/// parentheses. Anything outside [`ALLOWED_CHARS`] is rejected up front.
pub fn evaluate(expr: &str) -> Result<f64, EvalError> {
    if let Some((index, ch)) = expr.char_indices().find(|(_, c)| !ALLOWED_CHARS.contains(*c)) {
        return Err(EvalError::InvalidCharacter { ch, index });
    }
    if expr.is_empty() {
        return Err(EvalError::Empty);
    }
    let tokens = lex(expr)?;
    Parser::new(tokens).parse()
}

/// Everything the front-ends show for one submitted expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub expression: String,
    pub result: Option<f64>,
    pub summary: Vec<String>,
    pub steps: Vec<CalculationStep>,
    pub error: Option<EvalError>,
}

impl Solution {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// True when the precedence-aware result and the left-to-right steps
    /// end on different values.
    pub fn diverges(&self) -> bool {
        let (Some(result), Some(last)) = (self.result, self.steps.last()) else {
            return false;
        };
        let end = last.position;
        if result.is_nan() || end.is_nan() {
            return result.is_nan() != end.is_nan();
        }
        if result.is_infinite() || end.is_infinite() {
            return result != end;
        }
        let scale = result.abs().max(end.abs()).max(1.0);
        (result - end).abs() > 1e-9 * scale
    }

    /// Plain-text rendering for the non-interactive front-ends.
    pub fn report(&self, language: Language) -> Vec<String> {
        let mut lines = self.summary.clone();
        if !self.steps.is_empty() {
            lines.push(format!("{}:", language.text(Text::Steps)));
            for (i, step) in self.steps.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, step.description));
            }
        }
        if self.diverges() {
            lines.push(language.text(Text::Divergence).to_string());
        }
        lines
    }
}

pub fn solve(raw: &str, language: Language) -> Solution {
    let expression = clean_expression(raw);

    let result = match evaluate(&expression) {
        Ok(value) => value,
        Err(e) => {
            warn!("rejected expression {:?}: {}", expression, e);
            return Solution {
                expression,
                result: None,
                summary: vec![language.text(Text::InvalidExpression).to_string()],
                steps: Vec::new(),
                error: Some(e),
            };
        }
    };

    let tokens = tokenize(&expression);
    debug!(
        "tokens for {:?}: {:?}",
        expression,
        tokens.iter().map(Token::text).collect::<Vec<_>>()
    );
    let steps = derive_steps(&tokens, language);
    debug!("result {} with {} steps", result, steps.len());

    let summary = vec![
        format!("{}: {}", language.text(Text::Expression), expression),
        format!("{}: {}", language.text(Text::Result), format_number(result)),
    ];

    Solution {
        expression,
        result: Some(result),
        summary,
        steps,
        error: None,
    }
}

pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x.abs() > 1e10 || x.abs() < 1e-5 {
        format!("{:.6e}", x)
    } else {
        let s = format!("{:.6}", x);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" { "0".to_string() } else { s.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::text).collect()
    }

    #[test]
    fn tokenize_binary_operators() {
        assert_eq!(texts(&tokenize("5+3")), vec!["5", "+", "3"]);
        assert_eq!(texts(&tokenize("12.5*4/2")), vec!["12.5", "*", "4", "/", "2"]);
    }

    #[test]
    fn tokenize_leading_minus_is_a_sign() {
        assert_eq!(texts(&tokenize("-5+3")), vec!["-5", "+", "3"]);
    }

    #[test]
    fn tokenize_minus_after_operator_is_a_sign() {
        assert_eq!(texts(&tokenize("5+-3")), vec!["5", "+", "-3"]);
        assert_eq!(texts(&tokenize("5--3")), vec!["5", "-", "-3"]);
    }

    #[test]
    fn tokenize_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_keeps_parentheses_inside_operands() {
        assert_eq!(texts(&tokenize("2*(3+4)")), vec!["2", "*", "(3", "+", "4)"]);
    }

    #[test]
    fn leading_number_prefix() {
        assert_eq!(parse_leading_number("42"), Some(42.0));
        assert_eq!(parse_leading_number("-3.5"), Some(-3.5));
        assert_eq!(parse_leading_number("4)"), Some(4.0));
        assert_eq!(parse_leading_number("5."), Some(5.0));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("1.2.3"), Some(1.2));
        assert_eq!(parse_leading_number("(3"), None);
        assert_eq!(parse_leading_number("-"), None);
    }

    #[test]
    fn steps_for_addition() {
        let steps = derive_steps(&tokenize("5+3"), Language::En);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].operation, Operation::Start);
        assert_eq!(steps[0].position, 5.0);
        assert_eq!(steps[0].value, 5.0);
        assert_eq!(steps[0].description, "Start: 5");
        assert_eq!(steps[1].operation, Operation::Add);
        assert_eq!(steps[1].position, 8.0);
        assert_eq!(steps[1].value, 3.0);
        assert_eq!(steps[1].description, "Add 3 → 8");
    }

    #[test]
    fn steps_for_subtraction() {
        let steps = derive_steps(&tokenize("10-4"), Language::En);
        let positions: Vec<f64> = steps.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![10.0, 6.0]);
        assert_eq!(steps[1].operation.symbol(), "-");
        assert_eq!(steps[1].value, 4.0);
    }

    #[test]
    fn steps_are_described_in_urdu() {
        let steps = derive_steps(&tokenize("6*2/4"), Language::Ur);
        assert_eq!(steps[0].description, "شروع: 6");
        assert_eq!(steps[1].description, "2 سے ضرب دیں → 12");
        assert_eq!(steps[2].description, "4 سے تقسیم کریں → 3");
    }

    #[test]
    fn steps_need_a_leading_number() {
        assert!(derive_steps(&[], Language::En).is_empty());
        assert!(derive_steps(&tokenize("(2+3)"), Language::En).is_empty());
        assert!(derive_steps(&tokenize("*3"), Language::En).is_empty());
    }

    #[test]
    fn dangling_operator_is_skipped() {
        let steps = derive_steps(&tokenize("5+3-"), Language::En);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].position, 8.0);
    }

    #[test]
    fn operator_in_operand_slot_is_skipped() {
        let tokens = tokenize("5++3");
        assert_eq!(texts(&tokens), vec!["5", "+", "+", "3"]);
        let steps = derive_steps(&tokens, Language::En);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].position, 5.0);

        let solution = solve("5++3", Language::En);
        assert_eq!(solution.result, Some(8.0));
        assert!(solution.diverges());

        let steps = derive_steps(&tokenize("5--3"), Language::En);
        assert_eq!(steps.iter().map(|s| s.position).collect::<Vec<_>>(), vec![5.0, 8.0]);
    }

    #[test]
    fn division_by_zero_passes_through() {
        let steps = derive_steps(&tokenize("5/0+1"), Language::En);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].position, f64::INFINITY);
        assert_eq!(steps[2].position, f64::INFINITY);
        assert_eq!(steps[1].description, "Divide by 0 → Infinity");
    }

    #[test]
    fn evaluator_respects_precedence_and_parentheses() {
        assert_eq!(evaluate("2+3*4"), Ok(14.0));
        assert_eq!(evaluate("(2+3)*4"), Ok(20.0));
        assert_eq!(evaluate("-5+3"), Ok(-2.0));
        assert_eq!(evaluate("5+-3"), Ok(2.0));
        assert_eq!(evaluate("2**3**2"), Ok(512.0));
        assert_eq!(evaluate(".5+5."), Ok(5.5));
    }

    #[test]
    fn evaluator_rejects_foreign_characters() {
        assert_eq!(
            evaluate("5+a"),
            Err(EvalError::InvalidCharacter { ch: 'a', index: 2 })
        );
        assert!(matches!(evaluate("2^3"), Err(EvalError::InvalidCharacter { ch: '^', .. })));
    }

    #[test]
    fn evaluator_rejects_structural_errors() {
        assert_eq!(evaluate(""), Err(EvalError::Empty));
        assert_eq!(evaluate("(1+2"), Err(EvalError::MissingClosingParen));
        assert_eq!(evaluate("1+"), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("1.2.3"), Err(EvalError::MalformedNumber("1.2.3".into())));
        assert!(matches!(evaluate("()"), Err(EvalError::UnexpectedToken { .. })));
        assert!(matches!(evaluate("5(3)"), Err(EvalError::UnexpectedToken { index: 1, .. })));
        assert!(matches!(evaluate("1)"), Err(EvalError::UnexpectedToken { .. })));
    }

    #[test]
    fn evaluator_limits_nesting() {
        let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(evaluate(&deep), Err(EvalError::TooDeep(MAX_NESTING)));
    }

    #[test]
    fn evaluator_division_by_zero_is_not_an_error() {
        assert_eq!(evaluate("1/0"), Ok(f64::INFINITY));
        assert!(evaluate("0/0").unwrap().is_nan());
    }

    #[test]
    fn solve_valid_expression() {
        let solution = solve("5 + 3", Language::En);
        assert!(solution.is_valid());
        assert_eq!(solution.expression, "5+3");
        assert_eq!(solution.result, Some(8.0));
        assert_eq!(solution.summary, vec!["Expression: 5+3", "Result: 8"]);
        assert_eq!(solution.steps.len(), 2);
        assert!(!solution.diverges());
    }

    #[test]
    fn solve_invalid_expression() {
        let solution = solve("5 + a", Language::En);
        assert_eq!(solution.result, None);
        assert!(solution.steps.is_empty());
        assert_eq!(solution.summary, vec!["Invalid expression"]);
        assert!(matches!(solution.error, Some(EvalError::InvalidCharacter { ch: 'a', .. })));

        let solution = solve("5 + a", Language::Ur);
        assert_eq!(solution.summary, vec!["غلط اظہار"]);
    }

    #[test]
    fn solve_flags_precedence_divergence() {
        let solution = solve("2+3*4", Language::En);
        assert_eq!(solution.result, Some(14.0));
        assert_eq!(solution.steps.last().map(|s| s.position), Some(20.0));
        assert!(solution.diverges());
    }

    #[test]
    fn report_lists_steps() {
        let report = solve("10 - 4", Language::En).report(Language::En);
        assert_eq!(
            report,
            vec![
                "Expression: 10-4",
                "Result: 6",
                "Steps:",
                "  1. Start: 10",
                "  2. Subtract 4 → 6",
            ]
        );

        let report = solve("2+3*4", Language::En).report(Language::En);
        assert_eq!(report.last().map(String::as_str), Some(Language::En.text(Text::Divergence)));
    }

    #[test]
    fn solve_is_repeatable() {
        assert_eq!(solve("15 - 7", Language::En), solve("15 - 7", Language::En));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(2e11), "2.000000e11");
    }

    fn op_strategy() -> impl Strategy<Value = char> {
        prop::sample::select(vec!['+', '-', '*', '/'])
    }

    proptest! {
        #[test]
        fn steps_fold_left_to_right(
            first in 0u32..1000,
            rest in prop::collection::vec((op_strategy(), 0u32..1000), 0..8),
        ) {
            let mut expr = first.to_string();
            let mut expected = first as f64;
            for (op, n) in &rest {
                expr.push(*op);
                expr.push_str(&n.to_string());
                expected = Operation::from_symbol(*op).unwrap().apply(expected, *n as f64);
            }

            let steps = derive_steps(&tokenize(&expr), Language::En);
            prop_assert_eq!(steps.len(), rest.len() + 1);
            let last = steps.last().unwrap().position;
            prop_assert!(last == expected || (last.is_nan() && expected.is_nan()));
        }

        #[test]
        fn additive_chains_agree_with_evaluator(
            first in 0u32..1000,
            rest in prop::collection::vec((prop::sample::select(vec!['+', '-']), 0u32..1000), 0..8),
        ) {
            let mut expr = first.to_string();
            for (op, n) in &rest {
                expr.push(*op);
                expr.push_str(&n.to_string());
            }
            let solution = solve(&expr, Language::En);
            prop_assert!(!solution.diverges());
        }
    }
}

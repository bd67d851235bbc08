//! Formula parser
//!
//! A recursive descent parser for cell formulas with proper operator precedence.
//! Raw cell input that does not start with `=` never reaches the expression
//! grammar: [`parse_input`] classifies it as a number or text literal.

use crate::ast::{BinaryOperator, FormulaExpr, References, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions;
use regex::Regex;
use sheetcalc_core::{CellAddress, CellError, CellRange, CellValue, MAX_ROWS};
use std::sync::OnceLock;

/// Maximum nesting of parentheses, calls, unary operators and operator chains
pub const MAX_DEPTH: usize = 256;

/// Raw cell input after classification
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// Blank input; the cell does not exist
    Empty,
    /// Constant number or text, shown as-is
    Literal(CellValue),
    /// Expression to evaluate
    Formula(FormulaExpr),
}

impl CellInput {
    /// Check if this input is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellInput::Formula(_))
    }

    /// Precedents of this input; literals reference nothing
    pub fn references(&self) -> References {
        match self {
            CellInput::Formula(expr) => expr.references(),
            CellInput::Empty | CellInput::Literal(_) => References::default(),
        }
    }
}

fn numeric_pattern() -> &'static Regex {
    static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();
    NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex")
    })
}

/// Parse text that is entirely a decimal number (surrounding whitespace allowed)
///
/// Words such as `inf` or `NaN` are not numbers, and neither is anything that
/// would overflow to infinity.
///
/// ```
/// use sheetcalc_formula::parser::parse_number;
///
/// assert_eq!(parse_number(" 2.5 "), Some(2.5));
/// assert_eq!(parse_number("-1e3"), Some(-1000.0));
/// assert_eq!(parse_number("12abc"), None);
/// assert_eq!(parse_number("inf"), None);
/// ```
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !numeric_pattern().is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Classify and parse a cell's raw input
///
/// Input beginning with `=` is parsed as a formula. Anything else is a literal:
/// a number when the whole text is numeric, otherwise the text unchanged.
pub fn parse_input(raw: &str) -> FormulaResult<CellInput> {
    if raw.trim().is_empty() {
        return Ok(CellInput::Empty);
    }

    if raw.trim_start().starts_with('=') {
        return parse_formula(raw).map(CellInput::Formula);
    }

    let literal = match parse_number(raw) {
        Some(n) => CellValue::Number(n),
        None => CellValue::Text(raw.to_string()),
    };
    Ok(CellInput::Literal(literal))
}

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use sheetcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();

    // Formula must start with '='
    let formula = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    if formula.trim().is_empty() {
        return Err(FormulaError::Parse("Empty formula".into()));
    }

    let mut parser = FormulaParser::new(formula)?;
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if *parser.current_token() != Token::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String), // Function name or bare word
    Reference(String),  // Address-shaped token like A1, $B$2, a01

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

/// Error tokens recognised inside formulas, longest first
const ERROR_LITERALS: [CellError; 5] = [
    CellError::Div0,
    CellError::Value,
    CellError::Cycle,
    CellError::Ref,
    CellError::Eval,
];

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
        };
        parser.current_token = parser.scan_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '#' {
            return self.scan_error();
        }

        // Identifier, cell reference, or boolean
        if c.is_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        Err(FormulaError::Parse(format!(
            "Unexpected character '{}' at position {}",
            c, self.pos
        )))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    // Check for escaped quote ("")
                    if self.peek_char() == Some('"') {
                        s.push('"');
                        self.advance();
                    } else {
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(FormulaError::Parse(format!(
                        "Unterminated string starting at position {}",
                        start
                    )))
                }
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part, only when digits actually follow
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let has_exponent = match self.peek_char_at(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_char_at(2).map_or(false, |c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.advance();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    fn scan_error(&mut self) -> FormulaResult<Token> {
        let rest = &self.input[self.pos..];

        for err in ERROR_LITERALS {
            let literal = err.as_str();
            if rest
                .get(..literal.len())
                .map_or(false, |head| head.eq_ignore_ascii_case(literal))
            {
                self.pos += literal.len();
                return Ok(Token::Error(err));
            }
        }

        Err(FormulaError::Parse(format!(
            "Unknown error literal at position {}",
            self.pos
        )))
    }

    fn scan_identifier_or_ref(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Scan identifier/reference
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Followed by '(' it's a function call (e.g. LOG10(100) is a call, not a cell)
        if self.peek_char() == Some('(') {
            return Ok(Token::Identifier(text.to_string()));
        }

        let upper = text.to_uppercase();
        if upper == "TRUE" {
            return Ok(Token::Boolean(true));
        }
        if upper == "FALSE" {
            return Ok(Token::Boolean(false));
        }

        if Self::is_cell_reference(text) {
            return Ok(Token::Reference(text.to_string()));
        }

        if text.contains('$') {
            return Err(FormulaError::Parse(format!(
                "Malformed reference '{}'",
                text
            )));
        }

        // Otherwise it's a bare word
        Ok(Token::Identifier(text.to_string()))
    }

    /// Letters then digits, each optionally preceded by `$`
    fn is_cell_reference(text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        // Skip leading $
        if chars.get(i) == Some(&'$') {
            i += 1;
        }

        // Must have letters
        let letter_start = i;
        while i < chars.len() && chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == letter_start {
            return false;
        }

        // Skip optional $
        if chars.get(i) == Some(&'$') {
            i += 1;
        }

        // Must have digits
        let digit_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == digit_start {
            return false;
        }

        // Must have consumed everything
        i == chars.len()
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let next = self.scan_token()?;
        Ok(std::mem::replace(&mut self.current_token, next))
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^ (right associative)
    // 6. Unary: -, +, postfix %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses
    //
    // Left-associative chains grow the tree only along its left spine, which
    // the evaluator walks in a loop, so they do not count against MAX_DEPTH.
    // Parentheses, calls, prefix operators and `^` chains do.

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current_token(), Token::Ampersand) {
            self.consume()?;
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let mut operands = vec![self.parse_unary()?];

        while matches!(self.current_token(), Token::Caret) {
            self.consume()?;
            self.enter()?;
            operands.push(self.parse_unary()?);
        }
        self.leave(operands.len() - 1);

        // Fold from the right: 2^3^2 is 2^(3^2)
        let mut expr = operands
            .pop()
            .ok_or_else(|| FormulaError::Parse("Missing operand".into()))?;
        while let Some(base) = operands.pop() {
            expr = binary(BinaryOperator::Power, base, expr);
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        self.enter()?;

        let expr = match self.current_token() {
            // Prefix unary minus
            Token::Minus => {
                self.consume()?;
                let operand = self.parse_unary()?;
                FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                }
            }

            // Prefix plus (no-op)
            Token::Plus => {
                self.consume()?;
                self.parse_unary()?
            }

            // Parse primary, then check for postfix percent
            _ => {
                let mut expr = self.parse_range()?;

                while matches!(self.current_token(), Token::Percent) {
                    self.consume()?;
                    expr = FormulaExpr::UnaryOp {
                        op: UnaryOperator::Percent,
                        operand: Box::new(expr),
                    };
                }

                expr
            }
        };

        self.leave(1);
        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }

        self.consume()?;
        let right = self.parse_primary()?;

        match (&left, &right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                Ok(FormulaExpr::RangeRef(CellRange::new(*start, *end)))
            }
            _ => match (reference_text(&left), reference_text(&right)) {
                // At least one endpoint is outside the addressable space
                (Some(start), Some(end)) => {
                    Ok(FormulaExpr::InvalidRef(format!("{}:{}", start, end)))
                }
                _ => Err(FormulaError::Parse(
                    "Range operator requires cell references on both sides".into(),
                )),
            },
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume()? {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),
            Token::String(s) => Ok(FormulaExpr::String(s)),
            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),
            Token::Error(e) => Ok(FormulaExpr::Error(e)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Reference(text) => Ok(reference_expr(&text)),

            Token::Identifier(name) => {
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(&name)
                } else {
                    // A bare word stands for itself
                    Ok(FormulaExpr::String(name))
                }
            }

            token => Err(FormulaError::Parse(format!("Unexpected token: {:?}", token))),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<FormulaExpr> {
        let upper = name.to_uppercase();
        if functions::registry().get(&upper).is_none() {
            return Err(FormulaError::UnknownFunction(name.to_string()));
        }

        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function { name: upper, args })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Turn an address-shaped token into a reference node
///
/// Formula text is case-insensitive and tolerates `$` markers and leading
/// zeros in the row; anything outside the addressable space becomes an
/// invalid reference rather than a parse error.
fn reference_expr(text: &str) -> FormulaExpr {
    match decode_reference(text) {
        Some(addr) => FormulaExpr::CellRef(addr),
        None => FormulaExpr::InvalidRef(text.replace('$', "").to_ascii_uppercase()),
    }
}

fn decode_reference(text: &str) -> Option<CellAddress> {
    let clean = text.replace('$', "").to_ascii_uppercase();
    let split = clean.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = clean.split_at(split);

    let col = CellAddress::letters_to_column(letters).ok()?;
    let row: u64 = digits.parse().ok()?;
    if row == 0 || row > u64::from(MAX_ROWS) {
        return None;
    }

    Some(CellAddress::new(u32::try_from(row - 1).ok()?, col))
}

fn reference_text(expr: &FormulaExpr) -> Option<String> {
    match expr {
        FormulaExpr::CellRef(addr) => Some(addr.to_string()),
        FormulaExpr::InvalidRef(text) => Some(text.clone()),
        _ => None,
    }
}

//! Text syntax for screener filters.
//!
//! Grammar:
//!
//! ```text
//! filter     := field comparison number
//!             | field "in" item ("," item)*
//! comparison := ">=" | "<=" | ">" | "<"
//! item       := '"' text '"' | bare text up to the next comma
//! ```
//!
//! Errors carry the byte offset where parsing stopped.

use crate::domain::error::ParseError;
use crate::domain::screener::{Comparison, ScreenerFilter};

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn found(&self) -> String {
        self.peek()
            .map(|c| format!("'{}'", c))
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_alphabetic() || ch == '_' => {}
            _ => return Err(self.error(format!("expected field name, found {}", self.found()))),
        }
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// `Ok(None)` means the `in` keyword.
    fn parse_operator(&mut self) -> Result<Option<Comparison>, ParseError> {
        self.skip_whitespace();
        let remaining = self.remaining();

        for symbol in [">=", "<=", ">", "<"] {
            if remaining.starts_with(symbol) {
                self.pos += symbol.len();
                return Ok(Comparison::from_symbol(symbol));
            }
        }

        let keyword_end = remaining
            .char_indices()
            .find(|(_, c)| !c.is_alphanumeric())
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        if remaining[..keyword_end].eq_ignore_ascii_case("in") {
            self.pos += keyword_end;
            return Ok(None);
        }

        Err(self.error(format!(
            "expected one of '>=', '<=', '>', '<', 'in', found {}",
            self.found()
        )))
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        self.input[start..self.pos].parse().map_err(|_| ParseError {
            message: "invalid number".to_string(),
            position: start,
        })
    }

    fn parse_item(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        if self.peek() == Some('"') {
            self.advance();
            let start = self.pos;
            while let Some(ch) = self.peek() {
                if ch == '"' {
                    let item = self.input[start..self.pos].to_string();
                    self.advance();
                    return Ok(item);
                }
                self.advance();
            }
            return Err(self.error("unterminated quoted value"));
        }

        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == ',' {
                break;
            }
            self.advance();
        }
        let item = self.input[start..self.pos].trim();
        if item.is_empty() {
            return Err(ParseError {
                message: "expected value".to_string(),
                position: start,
            });
        }
        Ok(item.to_string())
    }

    fn parse_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut items = vec![self.parse_item()?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some(',') {
                break;
            }
            self.advance();
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(format!("unexpected trailing input {}", self.found())));
        }
        Ok(())
    }

    fn parse_filter(&mut self) -> Result<ScreenerFilter, ParseError> {
        let field = self.parse_identifier()?;
        let filter = match self.parse_operator()? {
            Some(operator) => ScreenerFilter::Numeric {
                field,
                operator,
                threshold: self.parse_number()?,
            },
            None => ScreenerFilter::Inclusion {
                field,
                allowed: self.parse_list()?,
            },
        };
        self.expect_end()?;
        Ok(filter)
    }
}

pub fn parse_filter(input: &str) -> Result<ScreenerFilter, ParseError> {
    Parser::new(input).parse_filter()
}

pub fn parse_filters<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<ScreenerFilter>, ParseError> {
    inputs.iter().map(|s| parse_filter(s.as_ref())).collect()
}

//! Prompt tokenizer: words, numbers with their unit suffixes, and punctuation.

use promptcad_core::Unit;

/// Length units people write that the pipeline does not convert.
const UNSUPPORTED_UNITS: [&str; 16] = [
    "km",
    "kilometer",
    "kilometers",
    "dm",
    "decimeter",
    "decimeters",
    "um",
    "µm",
    "micron",
    "microns",
    "nm",
    "nanometer",
    "nanometers",
    "mi",
    "mil",
    "mils",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Quantity {
    pub value: f64,
    pub unit: Option<Unit>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Word(String),
    Number(Quantity),
    /// `:` or `=` between a keyword and its value.
    Connector,
    Break,
}

impl Token {
    pub fn is_word(&self, text: &str) -> bool {
        matches!(self, Token::Word(word) if word == text)
    }
}

/// Attached suffix naming a length unit outside the supported table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnsupportedSuffix(pub String);

pub(crate) struct Scanner<'a> {
    source: &'a str,
    index: usize,
    previous: Option<char>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            index: 0,
            previous: None,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, UnsupportedSuffix> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else if self.at_number_start(ch) {
                let opener = self.previous;
                let negative = ch == '-';
                if negative {
                    self.advance_char();
                }
                if let Some(quantity) = self.lex_number(negative, opener)? {
                    tokens.push(Token::Number(quantity));
                }
            } else if ch.is_alphabetic() {
                tokens.push(Token::Word(self.lex_word()));
            } else {
                self.advance_char();
                tokens.push(if ch == ':' || ch == '=' {
                    Token::Connector
                } else {
                    Token::Break
                });
            }
        }

        Ok(tokens)
    }

    fn at_number_start(&self, ch: char) -> bool {
        let digit_follows = |offset: usize| {
            let mut rest = self.source[self.index..].chars().skip(offset);
            match rest.next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('.') => rest.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            }
        };
        match ch {
            '0'..='9' => true,
            '.' => digit_follows(0),
            // `3-5` is a range, not a negative five.
            '-' => {
                !self.previous.is_some_and(|p| p.is_alphanumeric()) && digit_follows(1)
            }
            _ => false,
        }
    }

    /// Lexes digits and an optional fraction, then the unit suffix.
    ///
    /// Returns `None` when an unrelated alphabetic suffix (`3D`, `2nd`) means
    /// the number is not a dimension. A `'` or `"` closing the same mark that
    /// opened the number (`'10'`) is a quote, not feet or inches.
    fn lex_number(
        &mut self,
        negative: bool,
        opener: Option<char>,
    ) -> Result<Option<Quantity>, UnsupportedSuffix> {
        let start = self.index;
        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_second_char().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance_char();
            self.skip_digits();
        }

        let Ok(magnitude) = self.source[start..self.index].parse::<f64>() else {
            return Ok(None);
        };
        let value = if negative { -magnitude } else { magnitude };

        match self.peek_char() {
            Some('"') if opener != Some('"') => {
                self.advance_char();
                Ok(Some(Quantity {
                    value,
                    unit: Some(Unit::In),
                }))
            }
            Some('\'') if opener != Some('\'') => {
                self.advance_char();
                Ok(Some(Quantity {
                    value,
                    unit: Some(Unit::Ft),
                }))
            }
            Some(c) if c.is_alphabetic() => {
                let suffix = self.lex_word();
                if suffix == "x" {
                    return Ok(Some(Quantity { value, unit: None }));
                }
                if let Some(unit) = Unit::from_token(&suffix) {
                    return Ok(Some(Quantity {
                        value,
                        unit: Some(unit),
                    }));
                }
                if UNSUPPORTED_UNITS.contains(&suffix.as_str()) {
                    return Err(UnsupportedSuffix(suffix));
                }
                Ok(None)
            }
            _ => Ok(Some(Quantity {
                value,
                unit: self.spaced_unit(),
            })),
        }
    }

    /// Consumes a unit written as a separate word (`10 mm`). A spaced `in`
    /// stays a preposition.
    fn spaced_unit(&mut self) -> Option<Unit> {
        let rest = &self.source[self.index..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if trimmed.len() == rest.len() {
            return None;
        }
        let word_len = trimmed
            .char_indices()
            .find(|(_, c)| !c.is_alphabetic())
            .map_or(trimmed.len(), |(i, _)| i);
        let word = &trimmed[..word_len];
        if word.eq_ignore_ascii_case("in") {
            return None;
        }
        let unit = Unit::from_token(word)?;
        let skip = rest.len() - trimmed.len() + word_len;
        for _ in rest[..skip].chars() {
            self.advance_char();
        }
        Some(unit)
    }

    fn lex_word(&mut self) -> String {
        let start = self.index;
        while self.peek_char().is_some_and(char::is_alphabetic) {
            self.advance_char();
        }
        self.source[start..self.index].to_lowercase()
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut chars = self.source[self.index..].chars();
        chars.next()?;
        chars.next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.index += ch.len_utf8();
        self.previous = Some(ch);
        Some(ch)
    }
}

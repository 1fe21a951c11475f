//! Transitions inside string, number and keyword literals.

use super::{Flow, Scanner, Step};
use crate::error::{ScanError, ScanErrorKind};
use crate::lexeme::LexemeKind;

impl Scanner {
    pub(super) fn in_string(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'"' => self.close_string(),
            b'\\' => {
                self.step = Step::InStringEscape;
                Ok(Flow::Next)
            }
            c if c < 0x20 => Err(self.error(ScanErrorKind::ControlCharacter { found: c })),
            _ => Ok(Flow::Next),
        }
    }

    /// Strings serve both object keys and values; the open event decides which closes.
    fn close_string(&mut self) -> Result<Flow, ScanError> {
        let end = self.index + 1;
        match self.top() {
            Some(LexemeKind::ObjectKeyBegin) => {
                self.end(LexemeKind::ObjectKeyEnd, end);
                self.step = Step::AfterKey;
            }
            Some(LexemeKind::LiteralBegin) => {
                self.end(LexemeKind::LiteralEnd, end);
                self.step = self.after_value();
            }
            other => panic!("scanner defect: string closed inside {other:?}"),
        }
        Ok(Flow::Next)
    }

    pub(super) fn in_string_escape(&mut self, c: u8) -> Result<Flow, ScanError> {
        self.step = match c {
            b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => Step::InString,
            b'u' => Step::InStringUnicode(4),
            _ => return Err(self.error(ScanErrorKind::InvalidEscape { found: c })),
        };
        Ok(Flow::Next)
    }

    pub(super) fn in_string_unicode(&mut self, c: u8, left: u8) -> Result<Flow, ScanError> {
        if !c.is_ascii_hexdigit() {
            return Err(self.unexpected(c, "in \\u hexadecimal character escape"));
        }
        self.step = if left <= 1 {
            Step::InString
        } else {
            Step::InStringUnicode(left - 1)
        };
        Ok(Flow::Next)
    }

    pub(super) fn neg(&mut self, c: u8) -> Result<Flow, ScanError> {
        self.step = match c {
            b'0' => Step::Zero,
            b'1'..=b'9' => Step::Int,
            _ => return Err(self.unexpected(c, "in numeric literal")),
        };
        Ok(Flow::Next)
    }

    pub(super) fn zero(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'.' => self.advance(Step::Dot),
            b'e' | b'E' => self.advance(Step::Exp),
            b'0'..=b'9' => Err(self.error(ScanErrorKind::LeadingZero)),
            _ => self.end_number(),
        }
    }

    pub(super) fn int(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'0'..=b'9' => Ok(Flow::Next),
            b'.' => self.advance(Step::Dot),
            b'e' | b'E' => self.advance(Step::Exp),
            _ => self.end_number(),
        }
    }

    pub(super) fn dot(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'0'..=b'9' => self.advance(Step::DotDigits),
            _ => Err(self.unexpected(c, "after decimal point in numeric literal")),
        }
    }

    pub(super) fn dot_digits(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'0'..=b'9' => Ok(Flow::Next),
            b'e' | b'E' => self.advance(Step::Exp),
            _ => self.end_number(),
        }
    }

    pub(super) fn exp(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'+' | b'-' => self.advance(Step::ExpSign),
            b'0'..=b'9' => self.advance(Step::ExpDigits),
            _ => Err(self.unexpected(c, "in exponent of numeric literal")),
        }
    }

    pub(super) fn exp_sign(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'0'..=b'9' => self.advance(Step::ExpDigits),
            _ => Err(self.unexpected(c, "in exponent of numeric literal")),
        }
    }

    pub(super) fn exp_digits(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'0'..=b'9' => Ok(Flow::Next),
            _ => self.end_number(),
        }
    }

    pub(super) fn keyword(&mut self, c: u8, rest: &'static [u8]) -> Result<Flow, ScanError> {
        match rest.split_first() {
            Some((&expected, tail)) if expected == c => {
                if tail.is_empty() {
                    self.end(LexemeKind::LiteralEnd, self.index + 1);
                    self.step = self.after_value();
                } else {
                    self.step = Step::Keyword(tail);
                }
                Ok(Flow::Next)
            }
            _ => Err(self.unexpected(c, "in literal true, false or null")),
        }
    }

    fn advance(&mut self, step: Step) -> Result<Flow, ScanError> {
        self.step = step;
        Ok(Flow::Next)
    }

    /// Numbers have no closing byte; the first byte that can't extend one is reprocessed.
    fn end_number(&mut self) -> Result<Flow, ScanError> {
        self.end(LexemeKind::LiteralEnd, self.index);
        self.step = self.after_value();
        Ok(Flow::Again)
    }
}

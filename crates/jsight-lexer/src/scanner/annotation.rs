//! Transitions inside `// ...` and `/* ... */` annotations.
//!
//! An annotation carries an optional rule block (an object literal written in
//! the relaxed annotation syntax) and an optional free-text comment, separated
//! by `-` when both are present.

use super::{Flow, ScanMode, Scanner, Step};
use crate::error::{ScanError, ScanErrorKind};
use crate::lexeme::LexemeKind;

impl Scanner {
    /// Handles the first `/` of a possible annotation. `resume` is the state
    /// to return to once the annotation closes.
    pub(super) fn annotation_start(
        &mut self,
        c: u8,
        allowed: bool,
        resume: Step,
    ) -> Result<Flow, ScanError> {
        if !allowed {
            return Err(match self.mode {
                ScanMode::Schema if !self.in_annotation => {
                    self.error(ScanErrorKind::AnnotationNotAllowed)
                }
                _ => self.unexpected(c, "where an annotation is not allowed"),
            });
        }
        self.resume = Some(resume);
        self.step = Step::AnnotationSlash;
        Ok(Flow::Next)
    }

    pub(super) fn annotation_slash(&mut self, c: u8) -> Result<Flow, ScanError> {
        let at = self.index - 1;
        match c {
            b'/' => {
                self.begin(LexemeKind::InlineAnnotationBegin, at);
                self.step = Step::InlineStart;
            }
            b'*' => {
                self.begin(LexemeKind::MultiLineAnnotationBegin, at);
                self.step = Step::MultiStart;
            }
            _ => return Err(self.unexpected(c, "after '/', expecting '//' or '/*'")),
        }
        self.in_annotation = true;
        Ok(Flow::Next)
    }

    // =========================================================================
    // Inline
    // =========================================================================

    pub(super) fn inline_start(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' => Ok(Flow::Next),
            b'\n' | b'\r' => {
                self.end_inline_annotation(self.index);
                Ok(Flow::Again)
            }
            b'{' => {
                self.begin(LexemeKind::ObjectBegin, self.index);
                self.step = Step::BeginKeyOrEmpty { annotation: false };
                Ok(Flow::Next)
            }
            b'-' => {
                self.step = Step::InlineDash;
                Ok(Flow::Next)
            }
            _ => {
                self.begin(LexemeKind::InlineAnnotationTextBegin, self.index);
                self.step = Step::InlineText;
                Ok(Flow::Next)
            }
        }
    }

    pub(super) fn inline_after_rules(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' => Ok(Flow::Next),
            b'\n' | b'\r' => {
                self.end_inline_annotation(self.index);
                Ok(Flow::Again)
            }
            b'-' => {
                self.step = Step::InlineDash;
                Ok(Flow::Next)
            }
            _ => Err(self.unexpected(c, "after annotation rules, expecting '-' before the comment")),
        }
    }

    pub(super) fn inline_dash(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' => Ok(Flow::Next),
            b'\n' | b'\r' => {
                self.end_inline_annotation(self.index);
                Ok(Flow::Again)
            }
            _ => {
                self.begin(LexemeKind::InlineAnnotationTextBegin, self.index);
                self.step = Step::InlineText;
                Ok(Flow::Next)
            }
        }
    }

    pub(super) fn inline_text(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b'\n' | b'\r' => {
                self.end(LexemeKind::InlineAnnotationTextEnd, self.index);
                self.end_inline_annotation(self.index);
                Ok(Flow::Again)
            }
            _ => Ok(Flow::Next),
        }
    }

    pub(super) fn end_inline_annotation(&mut self, at: usize) {
        self.end(LexemeKind::InlineAnnotationEnd, at);
        self.leave_annotation();
    }

    // =========================================================================
    // Multi-line
    // =========================================================================

    pub(super) fn multi_start(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => Ok(Flow::Next),
            b'{' => {
                self.begin(LexemeKind::ObjectBegin, self.index);
                self.step = Step::BeginKeyOrEmpty { annotation: false };
                Ok(Flow::Next)
            }
            b'-' => {
                self.step = Step::MultiDash;
                Ok(Flow::Next)
            }
            b'*' => {
                self.step = Step::MultiStar { text: false };
                Ok(Flow::Next)
            }
            _ => {
                self.begin(LexemeKind::MultiLineAnnotationTextBegin, self.index);
                self.step = Step::MultiText;
                Ok(Flow::Next)
            }
        }
    }

    pub(super) fn multi_after_rules(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => Ok(Flow::Next),
            b'-' => {
                self.step = Step::MultiDash;
                Ok(Flow::Next)
            }
            b'*' => {
                self.step = Step::MultiStar { text: false };
                Ok(Flow::Next)
            }
            _ => Err(self.unexpected(c, "after annotation rules, expecting '-' before the comment")),
        }
    }

    pub(super) fn multi_dash(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => Ok(Flow::Next),
            b'*' => {
                self.step = Step::MultiStar { text: false };
                Ok(Flow::Next)
            }
            _ => {
                self.begin(LexemeKind::MultiLineAnnotationTextBegin, self.index);
                self.step = Step::MultiText;
                Ok(Flow::Next)
            }
        }
    }

    pub(super) fn multi_text(&mut self, c: u8) -> Result<Flow, ScanError> {
        if c == b'*' {
            self.step = Step::MultiStar { text: true };
        }
        Ok(Flow::Next)
    }

    /// After a `*`: either the closing `*/` or a star that belongs to the text.
    pub(super) fn multi_star(&mut self, c: u8, text: bool) -> Result<Flow, ScanError> {
        let star = self.index - 1;
        if c == b'/' {
            if text {
                self.end(LexemeKind::MultiLineAnnotationTextEnd, star);
            }
            self.end(LexemeKind::MultiLineAnnotationEnd, self.index + 1);
            self.leave_annotation();
            return Ok(Flow::Next);
        }
        if !text {
            self.begin(LexemeKind::MultiLineAnnotationTextBegin, star);
        }
        self.step = Step::MultiText;
        Ok(Flow::Again)
    }

    fn leave_annotation(&mut self) {
        self.in_annotation = false;
        match self.resume.take() {
            Some(step) => self.step = step,
            None => panic!("scanner defect: annotation closed without a resume state"),
        }
    }
}

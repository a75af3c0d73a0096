//! Trajectory text decoding.
//!
//! Model answers end with a trajectory line such as
//! `[(0.05,2.91), (0.13,5.84), ...]`. The decoder takes the last
//! newline-delimited segment of the answer and parses it with a narrow
//! grammar instead of a general literal evaluator:
//!
//! ```text
//! trajectory := ws open row (ws "," ws row)* [ws ","] ws close ws
//! row        := open number (ws "," ws number)* [ws ","] ws close
//! open       := "[" | "("        close := the matching "]" | ")"
//! number     := ["+" | "-"] digits ["." digits] [("e" | "E") ["+" | "-"] digits]
//! ws         := (" " | "\t" | "\r")*
//! ```
//!
//! Empty sequences are allowed by the grammar and rejected by the shape
//! check. Decode failures are recoverable: the caller marks the sample
//! invalid and moves on.

use crate::error::{ReasoningError, Result};
use crate::math::Point2;
use crate::record::FUTURE_STEPS;

/// How strictly the decoded shape is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Any number of `(x,y)` rows.
    Lenient,
    /// Exactly six `(x,y)` rows.
    #[default]
    Strict,
}

/// Last newline-delimited segment of a text block.
#[must_use]
pub fn last_segment(text: &str) -> &str {
    text.rsplit('\n').next().unwrap_or(text)
}

/// Parse a literal sequence of numeric tuples.
///
/// # Errors
///
/// Returns [`ReasoningError::Parse`] with the byte offset of the first
/// offending character.
pub fn parse_rows(segment: &str) -> Result<Vec<Vec<f64>>> {
    let mut cursor = Cursor::new(segment);
    cursor.skip_ws();
    let rows = cursor.sequence(|c| c.sequence(Cursor::number))?;
    cursor.skip_ws();
    if cursor.pos < segment.len() {
        return Err(cursor.error("trailing characters after trajectory"));
    }
    Ok(rows)
}

/// Decode the trajectory at the end of a model answer.
///
/// # Errors
///
/// Returns [`ReasoningError::Parse`] when the last line is not a literal
/// sequence of tuples and [`ReasoningError::ShapeMismatch`] when a row is not
/// a pair or, in [`DecodeMode::Strict`], the row count is not six.
///
/// # Example
///
/// ```
/// use drive_reasoning::{decode_trajectory, DecodeMode};
///
/// let answer = "Meta Action: STOP\nTrajectory:\n[(0.00,0.10), (0.00,0.20)]";
/// let points = decode_trajectory(answer, DecodeMode::Lenient)?;
/// assert_eq!(points.len(), 2);
/// assert!(decode_trajectory(answer, DecodeMode::Strict).is_err());
/// # Ok::<(), drive_reasoning::ReasoningError>(())
/// ```
pub fn decode_trajectory(text: &str, mode: DecodeMode) -> Result<Vec<Point2>> {
    let rows = parse_rows(last_segment(text))?;
    check_shape(&rows, mode)?;
    Ok(rows.iter().map(|r| Point2::new(r[0], r[1])).collect())
}

fn check_shape(rows: &[Vec<f64>], mode: DecodeMode) -> Result<()> {
    let bad_row = rows.iter().find(|r| r.len() != 2);
    let rows_ok = match mode {
        DecodeMode::Lenient => true,
        DecodeMode::Strict => rows.len() == FUTURE_STEPS,
    };
    if bad_row.is_none() && rows_ok {
        return Ok(());
    }
    let expected_rows = match mode {
        DecodeMode::Lenient => rows.len(),
        DecodeMode::Strict => FUTURE_STEPS,
    };
    let actual_cols = bad_row.or(rows.first()).map_or(0, Vec::len);
    Err(ReasoningError::shape_mismatch(
        (expected_rows, 2),
        (rows.len(), actual_cols),
    ))
}

struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r')) {
            self.pos += 1;
        }
    }

    fn error(&self, msg: &str) -> ReasoningError {
        let found = match self.peek() {
            Some(b) if b.is_ascii_graphic() => format!("'{}'", b as char),
            Some(b) => format!("byte 0x{b:02x}"),
            None => "end of input".to_string(),
        };
        ReasoningError::parse(format!("{msg}, found {found}"), self.pos)
    }

    /// `open item (, item)* [,] close`, where `open` is `[` or `(`.
    fn sequence<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let close = match self.peek() {
            Some(b'[') => b']',
            Some(b'(') => b')',
            _ => return Err(self.error("expected '[' or '('")),
        };
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(item(self)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.error("expected ',' or closing bracket")),
            }
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let int_digits = self.digits();
        let mut frac_digits = 0;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            frac_digits = self.digits();
        }
        if int_digits + frac_digits == 0 {
            self.pos = start;
            return Err(self.error("expected a number"));
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(self.error("expected exponent digits"));
            }
        }
        // the scanned range is ASCII by construction
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| ReasoningError::parse("invalid number", start))?;
        text.parse::<f64>()
            .map_err(|e| ReasoningError::parse(format!("invalid number {text:?}: {e}"), start))
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }
}

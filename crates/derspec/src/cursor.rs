//! Forward byte cursor over a borrowed DER input.

use crate::error::{ContextPolicy, DecodeError, ErrorKind};

/// Per-call decode configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// How much schema path failing decodes report.
    pub context_policy: ContextPolicy,
    /// Accept BIT STRING values whose unused-bit count exceeds the
    /// total bit count instead of failing with `InvalidBitString`.
    pub ignore_bit_string_invalid_unused_count: bool,
    /// Recursion budget for recursive schema references. `None` means
    /// unlimited.
    pub max_recursion_depth: Option<usize>,
}

/// A read-only view over the input bytes, advanced as TLVs are consumed.
///
/// The cursor borrows the input for the duration of a decode call; nested
/// decoders receive it by mutable reference and return with the cursor
/// positioned past what they consumed.
#[derive(Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    depth: Option<usize>,
    opts: DecodeOptions,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor over `data` with default options.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    /// Creates a cursor with explicit decode options.
    pub fn with_options(data: &'a [u8], opts: DecodeOptions) -> Self {
        Self {
            data,
            pos: 0,
            depth: opts.max_recursion_depth,
            opts,
        }
    }

    /// The whole input buffer this cursor reads from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current byte offset into the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true once every input byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Looks at the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn take(&mut self) -> Result<u8, DecodeError> {
        let b = self
            .data
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.error(ErrorKind::Truncated, "unexpected end of input"))?;
        self.pos += 1;
        Ok(b)
    }

    pub(crate) fn take_slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(self.error(ErrorKind::Truncated, "unexpected end of input"));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn advance(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take_slice(n).map(|_| ())
    }

    /// Moves the cursor back to an earlier position. Used only by the ANY
    /// decoder, which re-reads a header it has already parsed.
    pub(crate) fn rewind_to(&mut self, pos: usize) {
        debug_assert!(pos <= self.pos);
        self.pos = pos;
    }

    pub(crate) fn options(&self) -> &DecodeOptions {
        &self.opts
    }

    pub(crate) fn error(&self, kind: ErrorKind, message: &'static str) -> DecodeError {
        DecodeError::new(kind, message, self.opts.context_policy)
    }

    /// Takes one unit of recursion budget; restored by
    /// [`exit_recursion`](Self::exit_recursion).
    pub(crate) fn enter_recursion(&mut self) -> Result<(), DecodeError> {
        match self.depth {
            None => Ok(()),
            Some(0) => Err(self.error(
                ErrorKind::RecursionDepthExceeded,
                "too deep recursion",
            )),
            Some(depth) => {
                self.depth = Some(depth - 1);
                Ok(())
            }
        }
    }

    pub(crate) fn exit_recursion(&mut self) {
        if let Some(depth) = &mut self.depth {
            *depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let data = [0x02, 0x01, 0x05];
        let cur = Cursor::new(&data);
        assert_eq!(cur.peek(), Some(0x02));
        assert_eq!(cur.position(), 0);
        assert_eq!(cur.remaining(), 3);
    }

    #[test]
    fn test_take_and_take_slice_advance() {
        let data = [0x02, 0x01, 0x05];
        let mut cur = Cursor::new(&data);
        assert_eq!(cur.take().unwrap(), 0x02);
        assert_eq!(cur.take_slice(2).unwrap(), &[0x01, 0x05]);
        assert!(cur.is_empty());
    }

    #[test]
    fn test_take_past_end_is_truncated() {
        let data = [0x01];
        let mut cur = Cursor::new(&data);
        cur.take().unwrap();
        let err = cur.take().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
        let err = cur.take_slice(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn test_rewind() {
        let data = [0xA0, 0x03, 0x02, 0x01, 0x02];
        let mut cur = Cursor::new(&data);
        cur.advance(3).unwrap();
        cur.rewind_to(0);
        assert_eq!(cur.peek(), Some(0xA0));
    }

    #[test]
    fn test_recursion_budget() {
        let opts = DecodeOptions {
            max_recursion_depth: Some(1),
            ..DecodeOptions::default()
        };
        let data = [];
        let mut cur = Cursor::with_options(&data, opts);
        cur.enter_recursion().unwrap();
        let err = cur.enter_recursion().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursionDepthExceeded);
        cur.exit_recursion();
        cur.enter_recursion().unwrap();
    }

    #[test]
    fn test_unlimited_recursion_by_default() {
        let data = [];
        let mut cur = Cursor::new(&data);
        for _ in 0..1000 {
            cur.enter_recursion().unwrap();
        }
    }
}

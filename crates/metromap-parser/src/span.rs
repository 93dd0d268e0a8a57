//! Byte ranges into the network source text.

use std::ops::Range;

/// A half-open byte range `start..end` in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Creates a span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both spans.
    pub fn union(self, other: Span) -> Span {
        Span::new(self.start.min(other.start)..self.end.max(other.end))
    }

    /// Shifts the span right by `offset` bytes.
    pub fn offset(self, offset: usize) -> Span {
        Span::new(self.start + offset..self.end + offset)
    }
}

/// A value paired with the span it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = Span::new(4..10);
        let b = Span::new(12..20);
        assert_eq!(a.union(b), Span::new(4..20));
        assert_eq!(b.union(a), Span::new(4..20));
    }

    #[test]
    fn test_len_and_offset() {
        let span = Span::new(3..8).offset(10);
        assert_eq!(span.start(), 13);
        assert_eq!(span.len(), 5);
        assert!(Span::new(5..5).is_empty());
    }
}

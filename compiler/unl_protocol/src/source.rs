//! Canonical wrappers for the two built-in source kinds.
//!
//! [`ArrayEnumerable`] owns a shared contiguous array and has no external
//! lifetime. [`NativeEnumerable`] borrows a caller-owned buffer; the borrow
//! checker keeps the buffer alive for as long as any wrapper, view or
//! enumerator derived from it exists.

use std::sync::Arc;

use crate::{EnumeratorState, RefEnumerable, RefEnumerator, SourceCaps};

// ── Index cursor ────────────────────────────────────────────────────

/// Forward cursor over a known length, shared by both wrappers.
#[derive(Clone, Copy, Debug, Default)]
struct IndexCursor {
    index: usize,
    state: EnumeratorState,
}

impl IndexCursor {
    fn advance(&mut self, len: usize) -> bool {
        match self.state {
            EnumeratorState::NotStarted => self.index = 0,
            EnumeratorState::Active => self.index += 1,
            EnumeratorState::Exhausted => return false,
        }
        if self.index < len {
            self.state = EnumeratorState::Active;
            true
        } else {
            self.state = EnumeratorState::Exhausted;
            false
        }
    }

    fn position(&self) -> Option<usize> {
        self.state.is_active().then_some(self.index)
    }
}

// ── Contiguous ──────────────────────────────────────────────────────

/// Owned contiguous array source.
#[derive(Clone, Debug)]
pub struct ArrayEnumerable<T> {
    items: Arc<[T]>,
}

impl<T> ArrayEnumerable<T> {
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<Vec<T>> for ArrayEnumerable<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Enumerator over an [`ArrayEnumerable`]. Holds its own handle to the array.
#[derive(Clone, Debug)]
pub struct ArrayEnumerator<T> {
    items: Arc<[T]>,
    cursor: IndexCursor,
}

impl<T> RefEnumerator for ArrayEnumerator<T> {
    type Item = T;

    fn try_move_next(&mut self) -> bool {
        self.cursor.advance(self.items.len())
    }

    fn current(&self) -> Option<&T> {
        self.cursor.position().and_then(|i| self.items.get(i))
    }

    fn dispose(&mut self) {
        self.cursor.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.cursor.state
    }
}

impl<T> RefEnumerable for ArrayEnumerable<T> {
    type Item = T;
    type Enumerator = ArrayEnumerator<T>;

    fn get_enumerator(&self) -> ArrayEnumerator<T> {
        ArrayEnumerator {
            items: Arc::clone(&self.items),
            cursor: IndexCursor::default(),
        }
    }

    fn caps(&self) -> SourceCaps {
        SourceCaps::RANDOM_ACCESS
    }

    fn long_count(&self) -> u64 {
        self.items.len() as u64
    }

    fn get(&self, index: u64) -> Option<&T> {
        usize::try_from(index).ok().and_then(|i| self.items.get(i))
    }
}

// ── External buffer ─────────────────────────────────────────────────

/// View over memory owned by the caller.
///
/// The wrapper never frees the buffer. `'buf` ties every derived view and
/// enumerator to the caller's allocation.
#[derive(Clone, Copy, Debug)]
pub struct NativeEnumerable<'buf, T> {
    buffer: &'buf [T],
}

impl<'buf, T> NativeEnumerable<'buf, T> {
    pub fn new(buffer: &'buf [T]) -> Self {
        Self { buffer }
    }

    #[inline]
    pub fn as_slice(&self) -> &'buf [T] {
        self.buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Enumerator over a [`NativeEnumerable`].
#[derive(Clone, Copy, Debug)]
pub struct NativeEnumerator<'buf, T> {
    buffer: &'buf [T],
    cursor: IndexCursor,
}

impl<'buf, T> RefEnumerator for NativeEnumerator<'buf, T> {
    type Item = T;

    fn try_move_next(&mut self) -> bool {
        self.cursor.advance(self.buffer.len())
    }

    fn current(&self) -> Option<&T> {
        self.cursor.position().and_then(|i| self.buffer.get(i))
    }

    fn dispose(&mut self) {
        self.cursor.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.cursor.state
    }
}

impl<'buf, T> RefEnumerable for NativeEnumerable<'buf, T> {
    type Item = T;
    type Enumerator = NativeEnumerator<'buf, T>;

    fn get_enumerator(&self) -> NativeEnumerator<'buf, T> {
        NativeEnumerator {
            buffer: self.buffer,
            cursor: IndexCursor::default(),
        }
    }

    fn caps(&self) -> SourceCaps {
        SourceCaps::RANDOM_ACCESS
    }

    fn long_count(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn get(&self, index: u64) -> Option<&T> {
        usize::try_from(index).ok().and_then(|i| self.buffer.get(i))
    }
}

#[cfg(test)]
mod tests;

//! Enumerator and enumerable contracts.

use bitflags::bitflags;

// ── Enumerator state ────────────────────────────────────────────────

/// Lifecycle of a single enumerator.
///
/// `NotStarted → Active → Exhausted`. `Exhausted` is terminal: once an
/// enumerator reports failure or is disposed it never yields again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EnumeratorState {
    #[default]
    NotStarted,
    Active,
    Exhausted,
}

impl EnumeratorState {
    /// Whether the current element may be read.
    #[inline]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Whether further advancing is pointless.
    #[inline]
    pub fn is_exhausted(self) -> bool {
        self == Self::Exhausted
    }
}

// ── Capabilities ────────────────────────────────────────────────────

bitflags! {
    /// Optional capabilities a source advertises to operator lowering.
    ///
    /// A source with both flags lets generated code count in O(1) and
    /// address elements by index instead of scanning forward.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct SourceCaps: u8 {
        /// `long_count` is O(1).
        const FAST_COUNT = 1 << 0;
        /// `get(index)` is O(1).
        const INDEX_ACCESS = 1 << 1;

        /// Both capabilities.
        const RANDOM_ACCESS = Self::FAST_COUNT.bits() | Self::INDEX_ACCESS.bits();
    }
}

impl SourceCaps {
    /// Whether a reverse index scan is available.
    #[inline]
    pub fn supports_reverse_scan(self) -> bool {
        self.contains(Self::RANDOM_ACCESS)
    }
}

// ── Enumerator ──────────────────────────────────────────────────────

/// Advance-and-test enumerator.
///
/// While [`try_move_next`](Self::try_move_next) keeps returning `true`,
/// [`current`](Self::current) yields a reference to the element. After the
/// first `false` the enumerator is exhausted and every further call keeps
/// returning `false`.
pub trait RefEnumerator {
    type Item;

    /// Advance to the next element and report whether one exists.
    fn try_move_next(&mut self) -> bool;

    /// The element the enumerator is positioned on, if any.
    fn current(&self) -> Option<&Self::Item>;

    /// Release what this enumerator owns. Idempotent; safe after exhaustion.
    /// Never releases the source it was obtained from.
    fn dispose(&mut self);

    /// Current lifecycle state.
    fn state(&self) -> EnumeratorState;

    /// Advance and yield the element in one call.
    ///
    /// Used by composition code that cannot keep a live borrow of the
    /// current element across calls.
    fn try_get_next(&mut self) -> Option<Self::Item>
    where
        Self::Item: Clone,
    {
        if self.try_move_next() {
            self.current().cloned()
        } else {
            None
        }
    }
}

impl<E: RefEnumerator + ?Sized> RefEnumerator for Box<E> {
    type Item = E::Item;

    #[inline]
    fn try_move_next(&mut self) -> bool {
        (**self).try_move_next()
    }

    #[inline]
    fn current(&self) -> Option<&Self::Item> {
        (**self).current()
    }

    #[inline]
    fn dispose(&mut self) {
        (**self).dispose();
    }

    #[inline]
    fn state(&self) -> EnumeratorState {
        (**self).state()
    }
}

// ── Enumerable ──────────────────────────────────────────────────────

/// A logically immutable source of enumerators.
///
/// Every call to [`get_enumerator`](Self::get_enumerator) returns an
/// independent enumerator positioned before the first element.
pub trait RefEnumerable {
    type Item;
    type Enumerator: RefEnumerator<Item = Self::Item>;

    fn get_enumerator(&self) -> Self::Enumerator;

    /// Capabilities this source advertises. Scan-only by default.
    fn caps(&self) -> SourceCaps {
        SourceCaps::empty()
    }

    #[inline]
    fn can_fast_count(&self) -> bool {
        self.caps().contains(SourceCaps::FAST_COUNT)
    }

    #[inline]
    fn can_index_access(&self) -> bool {
        self.caps().contains(SourceCaps::INDEX_ACCESS)
    }

    /// Number of elements. Scans unless the source overrides it.
    fn long_count(&self) -> u64 {
        let mut e = self.get_enumerator();
        let mut count = 0u64;
        while e.try_move_next() {
            count += 1;
        }
        e.dispose();
        count
    }

    /// Random access for sources that advertise [`SourceCaps::INDEX_ACCESS`].
    fn get(&self, _index: u64) -> Option<&Self::Item> {
        None
    }
}

/// A borrowed source is a source.
///
/// This is how a view holds a large generic source by reference rather
/// than copying it.
impl<S: RefEnumerable + ?Sized> RefEnumerable for &S {
    type Item = S::Item;
    type Enumerator = S::Enumerator;

    #[inline]
    fn get_enumerator(&self) -> Self::Enumerator {
        (**self).get_enumerator()
    }

    #[inline]
    fn caps(&self) -> SourceCaps {
        (**self).caps()
    }

    #[inline]
    fn long_count(&self) -> u64 {
        (**self).long_count()
    }

    #[inline]
    fn get(&self, index: u64) -> Option<&Self::Item> {
        (**self).get(index)
    }
}

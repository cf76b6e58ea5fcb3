use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Allocator, EnumeratorState, EqualityComparer, RefEnumerable, RefEnumerator};

/// `Distinct` view: first occurrence of each element under `comparer`.
#[derive(Clone, Debug)]
pub struct DistinctEnumerable<S, C> {
    source: S,
    comparer: C,
    allocator: Allocator,
}

impl<S, C> DistinctEnumerable<S, C> {
    pub fn new(source: S, comparer: C, allocator: Allocator) -> Self {
        Self {
            source,
            comparer,
            allocator,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn allocator(&self) -> Allocator {
        self.allocator
    }
}

/// Elements already yielded, bucketed by hash.
type SeenSet<T> = FxHashMap<u64, SmallVec<[T; 2]>>;

pub struct DistinctEnumerator<E: RefEnumerator, C> {
    inner: E,
    comparer: C,
    seen: SeenSet<E::Item>,
    state: EnumeratorState,
}

impl<E, C> RefEnumerator for DistinctEnumerator<E, C>
where
    E: RefEnumerator,
    E::Item: Clone,
    C: EqualityComparer<E::Item>,
{
    type Item = E::Item;

    fn try_move_next(&mut self) -> bool {
        if self.state.is_exhausted() {
            return false;
        }
        while self.inner.try_move_next() {
            let Some(x) = self.inner.current() else {
                continue;
            };
            let bucket = self.seen.entry(self.comparer.hash_of(x)).or_default();
            if bucket.iter().any(|y| self.comparer.equals(y, x)) {
                continue;
            }
            bucket.push(x.clone());
            self.state = EnumeratorState::Active;
            return true;
        }
        self.state = EnumeratorState::Exhausted;
        false
    }

    fn current(&self) -> Option<&E::Item> {
        if self.state.is_active() {
            self.inner.current()
        } else {
            None
        }
    }

    fn dispose(&mut self) {
        self.inner.dispose();
        self.seen = SeenSet::default();
        self.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.state
    }
}

impl<S, C> RefEnumerable for DistinctEnumerable<S, C>
where
    S: RefEnumerable,
    S::Item: Clone,
    C: EqualityComparer<S::Item> + Clone,
{
    type Item = S::Item;
    type Enumerator = DistinctEnumerator<S::Enumerator, C>;

    fn get_enumerator(&self) -> Self::Enumerator {
        let mut seen = SeenSet::default();
        seen.reserve(self.allocator.initial_capacity());
        DistinctEnumerator {
            inner: self.source.get_enumerator(),
            comparer: self.comparer.clone(),
            seen,
            state: EnumeratorState::NotStarted,
        }
    }
}

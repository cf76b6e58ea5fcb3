use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::{Allocator, EnumeratorState, KeyOrd, RefEnumerable, RefEnumerator, RefFunc};

/// `MinBy` / `MaxBy` view.
///
/// Yields every element whose key equals the extreme key, in source order.
/// The source is scanned the first time an enumerator is advanced, never
/// when the view is built.
pub struct MinMaxByEnumerable<S, F, K> {
    source: S,
    key_selector: F,
    is_max: bool,
    allocator: Allocator,
    _key: PhantomData<fn() -> K>,
}

impl<S: Clone, F: Clone, K> Clone for MinMaxByEnumerable<S, F, K> {
    fn clone(&self) -> Self {
        Self::new(
            self.source.clone(),
            self.key_selector.clone(),
            self.is_max,
            self.allocator,
        )
    }
}

impl<S, F, K> MinMaxByEnumerable<S, F, K> {
    pub fn new(source: S, key_selector: F, is_max: bool, allocator: Allocator) -> Self {
        Self {
            source,
            key_selector,
            is_max,
            allocator,
            _key: PhantomData,
        }
    }

    pub fn is_max(&self) -> bool {
        self.is_max
    }
}

pub struct MinMaxByEnumerator<E: RefEnumerator, F, K> {
    inner: E,
    key_selector: F,
    is_max: bool,
    extremes: Vec<E::Item>,
    index: usize,
    state: EnumeratorState,
    _key: PhantomData<fn() -> K>,
}

impl<E, F, K> MinMaxByEnumerator<E, F, K>
where
    E: RefEnumerator,
    E::Item: Clone,
    F: RefFunc<E::Item, K>,
    K: KeyOrd,
{
    fn scan(&mut self) {
        let better = if self.is_max {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        let mut best: Option<K> = None;
        while self.inner.try_move_next() {
            let Some(x) = self.inner.current() else {
                continue;
            };
            let key = self.key_selector.calc(x);
            let ord = match &best {
                None => better,
                Some(b) => key.key_cmp(b),
            };
            if ord == better {
                self.extremes.clear();
                self.extremes.push(x.clone());
                best = Some(key);
            } else if ord == Ordering::Equal {
                self.extremes.push(x.clone());
            }
        }
        self.inner.dispose();
    }
}

impl<E, F, K> RefEnumerator for MinMaxByEnumerator<E, F, K>
where
    E: RefEnumerator,
    E::Item: Clone,
    F: RefFunc<E::Item, K>,
    K: KeyOrd,
{
    type Item = E::Item;

    fn try_move_next(&mut self) -> bool {
        match self.state {
            EnumeratorState::NotStarted => {
                self.scan();
                self.index = 0;
            }
            EnumeratorState::Active => self.index += 1,
            EnumeratorState::Exhausted => return false,
        }
        if self.index < self.extremes.len() {
            self.state = EnumeratorState::Active;
            true
        } else {
            self.state = EnumeratorState::Exhausted;
            false
        }
    }

    fn current(&self) -> Option<&E::Item> {
        if self.state.is_active() {
            self.extremes.get(self.index)
        } else {
            None
        }
    }

    fn dispose(&mut self) {
        self.inner.dispose();
        self.extremes = Vec::new();
        self.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.state
    }
}

impl<S, F, K> RefEnumerable for MinMaxByEnumerable<S, F, K>
where
    S: RefEnumerable,
    S::Item: Clone,
    F: RefFunc<S::Item, K> + Clone,
    K: KeyOrd,
{
    type Item = S::Item;
    type Enumerator = MinMaxByEnumerator<S::Enumerator, F, K>;

    fn get_enumerator(&self) -> Self::Enumerator {
        MinMaxByEnumerator {
            inner: self.source.get_enumerator(),
            key_selector: self.key_selector.clone(),
            is_max: self.is_max,
            extremes: Vec::with_capacity(self.allocator.initial_capacity()),
            index: 0,
            state: EnumeratorState::NotStarted,
            _key: PhantomData,
        }
    }
}

use crate::{EnumeratorState, RefEnumerable, RefEnumerator, SourceCaps};

/// `Concat` view: every element of `first`, then every element of `second`.
#[derive(Clone, Debug)]
pub struct ConcatEnumerable<A, B> {
    first: A,
    second: B,
}

impl<A, B> ConcatEnumerable<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

pub struct ConcatEnumerator<E1, E2> {
    first: E1,
    second: E2,
    on_second: bool,
    state: EnumeratorState,
}

impl<E1, E2> RefEnumerator for ConcatEnumerator<E1, E2>
where
    E1: RefEnumerator,
    E2: RefEnumerator<Item = E1::Item>,
{
    type Item = E1::Item;

    fn try_move_next(&mut self) -> bool {
        if self.state.is_exhausted() {
            return false;
        }
        if !self.on_second {
            if self.first.try_move_next() {
                self.state = EnumeratorState::Active;
                return true;
            }
            self.first.dispose();
            self.on_second = true;
        }
        if self.second.try_move_next() {
            self.state = EnumeratorState::Active;
            true
        } else {
            self.state = EnumeratorState::Exhausted;
            false
        }
    }

    fn current(&self) -> Option<&E1::Item> {
        match (self.state, self.on_second) {
            (EnumeratorState::Active, false) => self.first.current(),
            (EnumeratorState::Active, true) => self.second.current(),
            _ => None,
        }
    }

    fn dispose(&mut self) {
        self.first.dispose();
        self.second.dispose();
        self.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.state
    }
}

impl<A, B> RefEnumerable for ConcatEnumerable<A, B>
where
    A: RefEnumerable,
    B: RefEnumerable<Item = A::Item>,
{
    type Item = A::Item;
    type Enumerator = ConcatEnumerator<A::Enumerator, B::Enumerator>;

    fn get_enumerator(&self) -> Self::Enumerator {
        ConcatEnumerator {
            first: self.first.get_enumerator(),
            second: self.second.get_enumerator(),
            on_second: false,
            state: EnumeratorState::NotStarted,
        }
    }

    fn caps(&self) -> SourceCaps {
        // Counting stays O(1) when both halves count in O(1); indexing does not compose.
        self.first.caps() & self.second.caps() & SourceCaps::FAST_COUNT
    }

    fn long_count(&self) -> u64 {
        self.first.long_count() + self.second.long_count()
    }
}

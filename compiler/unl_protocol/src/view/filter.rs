use crate::{EnumeratorState, RefEnumerable, RefEnumerator, RefFunc};

/// `Where` view.
#[derive(Clone, Debug)]
pub struct WhereEnumerable<S, P> {
    source: S,
    predicate: P,
}

impl<S, P> WhereEnumerable<S, P> {
    pub fn new(source: S, predicate: P) -> Self {
        Self { source, predicate }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

pub struct WhereEnumerator<E, P> {
    inner: E,
    predicate: P,
    state: EnumeratorState,
}

impl<E, P> RefEnumerator for WhereEnumerator<E, P>
where
    E: RefEnumerator,
    P: RefFunc<E::Item, bool>,
{
    type Item = E::Item;

    fn try_move_next(&mut self) -> bool {
        if self.state.is_exhausted() {
            return false;
        }
        while self.inner.try_move_next() {
            if let Some(x) = self.inner.current() {
                if self.predicate.calc(x) {
                    self.state = EnumeratorState::Active;
                    return true;
                }
            }
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
        self.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.state
    }
}

impl<S, P> RefEnumerable for WhereEnumerable<S, P>
where
    S: RefEnumerable,
    P: RefFunc<S::Item, bool> + Clone,
{
    type Item = S::Item;
    type Enumerator = WhereEnumerator<S::Enumerator, P>;

    fn get_enumerator(&self) -> Self::Enumerator {
        WhereEnumerator {
            inner: self.source.get_enumerator(),
            predicate: self.predicate.clone(),
            state: EnumeratorState::NotStarted,
        }
    }
}

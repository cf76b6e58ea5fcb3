use std::marker::PhantomData;

use crate::{EnumeratorState, RefEnumerable, RefEnumerator, RefFunc};

/// `Select` view. The mapped element is materialized per step so it can be
/// handed out by reference.
pub struct SelectEnumerable<S, F, R> {
    source: S,
    selector: F,
    _result: PhantomData<fn() -> R>,
}

impl<S: Clone, F: Clone, R> Clone for SelectEnumerable<S, F, R> {
    fn clone(&self) -> Self {
        Self::new(self.source.clone(), self.selector.clone())
    }
}

impl<S, F, R> SelectEnumerable<S, F, R> {
    pub fn new(source: S, selector: F) -> Self {
        Self {
            source,
            selector,
            _result: PhantomData,
        }
    }
}

pub struct SelectEnumerator<E, F, R> {
    inner: E,
    selector: F,
    current: Option<R>,
    state: EnumeratorState,
}

impl<E, F, R> RefEnumerator for SelectEnumerator<E, F, R>
where
    E: RefEnumerator,
    F: RefFunc<E::Item, R>,
{
    type Item = R;

    fn try_move_next(&mut self) -> bool {
        if self.state.is_exhausted() {
            return false;
        }
        if self.inner.try_move_next() {
            self.current = self.inner.current().map(|x| self.selector.calc(x));
            self.state = EnumeratorState::Active;
            true
        } else {
            self.current = None;
            self.state = EnumeratorState::Exhausted;
            false
        }
    }

    fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn dispose(&mut self) {
        self.inner.dispose();
        self.current = None;
        self.state = EnumeratorState::Exhausted;
    }

    fn state(&self) -> EnumeratorState {
        self.state
    }
}

impl<S, F, R> RefEnumerable for SelectEnumerable<S, F, R>
where
    S: RefEnumerable,
    F: RefFunc<S::Item, R> + Clone,
{
    type Item = R;
    type Enumerator = SelectEnumerator<S::Enumerator, F, R>;

    fn get_enumerator(&self) -> Self::Enumerator {
        SelectEnumerator {
            inner: self.source.get_enumerator(),
            selector: self.selector.clone(),
            current: None,
            state: EnumeratorState::NotStarted,
        }
    }
}

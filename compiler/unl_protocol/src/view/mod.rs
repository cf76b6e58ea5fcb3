//! Lazy views.
//!
//! A view stores its source(s) and operator parameters and is itself a
//! [`RefEnumerable`]. Nothing is scanned until an enumerator obtained from
//! the view is advanced. Sources are held by value; pass `&source` to hold
//! a large source by reference instead.
//!
//! Union is not a separate type: it is `Distinct(Concat(first, second))`.

mod concat;
mod distinct;
mod filter;
mod min_max_by;
mod select;

use std::hash::Hash;

pub use concat::{ConcatEnumerable, ConcatEnumerator};
pub use distinct::{DistinctEnumerable, DistinctEnumerator};
pub use filter::{WhereEnumerable, WhereEnumerator};
pub use min_max_by::{MinMaxByEnumerable, MinMaxByEnumerator};
pub use select::{SelectEnumerable, SelectEnumerator};

use crate::{
    Allocator, DefaultEqualityComparer, EqualityComparer, KeyOrd, RefEnumerable, RefFunc,
};

/// `Distinct(Concat(A, B))`.
pub type UnionEnumerable<A, B, C> = DistinctEnumerable<ConcatEnumerable<A, B>, C>;

/// View-building combinators available on every source.
pub trait LinqExt: RefEnumerable + Sized {
    /// `Where`: elements satisfying `predicate`, in source order.
    fn filter<P>(self, predicate: P) -> WhereEnumerable<Self, P>
    where
        P: RefFunc<Self::Item, bool> + Clone,
    {
        WhereEnumerable::new(self, predicate)
    }

    /// `Select`: each element mapped through `selector`.
    fn select<R, F>(self, selector: F) -> SelectEnumerable<Self, F, R>
    where
        F: RefFunc<Self::Item, R> + Clone,
    {
        SelectEnumerable::new(self, selector)
    }

    fn concat<B>(self, second: B) -> ConcatEnumerable<Self, B>
    where
        B: RefEnumerable<Item = Self::Item>,
    {
        ConcatEnumerable::new(self, second)
    }

    fn distinct(self) -> DistinctEnumerable<Self, DefaultEqualityComparer>
    where
        Self::Item: Eq + Hash + Clone,
    {
        DistinctEnumerable::new(self, DefaultEqualityComparer, Allocator::Temp)
    }

    fn distinct_with<C>(self, comparer: C, allocator: Allocator) -> DistinctEnumerable<Self, C>
    where
        C: EqualityComparer<Self::Item> + Clone,
        Self::Item: Clone,
    {
        DistinctEnumerable::new(self, comparer, allocator)
    }

    fn union<B>(self, second: B) -> UnionEnumerable<Self, B, DefaultEqualityComparer>
    where
        B: RefEnumerable<Item = Self::Item>,
        Self::Item: Eq + Hash + Clone,
    {
        self.concat(second).distinct()
    }

    fn min_by<K, F>(self, key_selector: F) -> MinMaxByEnumerable<Self, F, K>
    where
        F: RefFunc<Self::Item, K> + Clone,
        K: KeyOrd,
    {
        MinMaxByEnumerable::new(self, key_selector, false, Allocator::Temp)
    }

    fn max_by<K, F>(self, key_selector: F) -> MinMaxByEnumerable<Self, F, K>
    where
        F: RefFunc<Self::Item, K> + Clone,
        K: KeyOrd,
    {
        MinMaxByEnumerable::new(self, key_selector, true, Allocator::Temp)
    }
}

impl<S: RefEnumerable> LinqExt for S {}

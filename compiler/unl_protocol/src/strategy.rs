//! Strategy traits held by value inside views and eager operators.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Function strategy over a borrowed argument.
pub trait RefFunc<A, R> {
    fn calc(&self, arg: &A) -> R;
}

impl<A, R, F> RefFunc<A, R> for F
where
    F: Fn(&A) -> R,
{
    #[inline]
    fn calc(&self, arg: &A) -> R {
        self(arg)
    }
}

/// Combining strategy that updates a caller-owned accumulator in place.
pub trait RefAction<A, B> {
    fn execute(&self, acc: &mut A, item: &B);
}

impl<A, B, F> RefAction<A, B> for F
where
    F: Fn(&mut A, &B),
{
    #[inline]
    fn execute(&self, acc: &mut A, item: &B) {
        self(acc, item);
    }
}

/// Equality plus a hash consistent with it.
///
/// `equals(a, b)` must imply `hash_of(a) == hash_of(b)`.
pub trait EqualityComparer<T> {
    fn equals(&self, a: &T, b: &T) -> bool;
    fn hash_of(&self, value: &T) -> u64;
}

/// `Eq` + `Hash` comparer using `FxHasher`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultEqualityComparer;

impl<T: Eq + Hash> EqualityComparer<T> for DefaultEqualityComparer {
    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn hash_of(&self, value: &T) -> u64 {
        let mut hasher = FxHasher::default();
        value.hash(&mut hasher);
        hasher.finish()
    }
}

/// Total order over `MinBy`/`MaxBy` keys.
///
/// Floating-point keys order NaN below every other value and equal to
/// itself, and treat `-0.0` and `0.0` as equal.
pub trait KeyOrd {
    fn key_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! impl_key_ord_int {
    ($($t:ty),*) => {$(
        impl KeyOrd for $t {
            #[inline]
            fn key_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    )*};
}

macro_rules! impl_key_ord_float {
    ($($t:ty),*) => {$(
        impl KeyOrd for $t {
            fn key_cmp(&self, other: &Self) -> Ordering {
                match (self.is_nan(), other.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => self.partial_cmp(other).unwrap_or(Ordering::Equal),
                }
            }
        }
    )*};
}

impl_key_ord_int!(i32, u32, i64, u64);
impl_key_ord_float!(f32, f64);

/// Allocation class a view uses for its internal buffers.
///
/// The discriminants are the constants generated code passes as the
/// `allocator` default parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Allocator {
    None = 1,
    #[default]
    Temp = 2,
    TempJob = 3,
    Persistent = 4,
}

impl Allocator {
    /// Decode a raw allocator constant. Unknown values map to `None`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            2 => Self::Temp,
            3 => Self::TempJob,
            4 => Self::Persistent,
            _ => Self::None,
        }
    }

    #[inline]
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Starting capacity for buffers owned by a view.
    pub(crate) fn initial_capacity(self) -> usize {
        match self {
            Self::None => 0,
            Self::Temp | Self::TempJob => 16,
            Self::Persistent => 64,
        }
    }
}

//! Eager terminal operators written directly against the protocol.
//!
//! These are the behavioral reference for the generated method bodies:
//! every generated variant must produce the same result as the function
//! here for the same content.

use crate::{RefAction, RefEnumerable, RefEnumerator, RefFunc};

// ── Average ─────────────────────────────────────────────────────────

/// Element types `try_get_average` supports, with their divide policy.
///
/// 32-bit integers accumulate in 64 bits and narrow back after dividing.
/// 64-bit integers accumulate in their own width (wrapping). Floats stay in
/// their own domain.
pub trait AverageElement: Copy {
    type Acc: Copy;

    fn widen(self) -> Self::Acc;
    fn accumulate(acc: Self::Acc, value: Self) -> Self::Acc;
    fn divide(sum: Self::Acc, count: u64) -> Self;
}

macro_rules! int_average {
    ($($t:ty => $acc:ty, $(#[$attr:meta])* |$sum:ident, $count:ident| $mean:expr;)*) => {
        $(
            impl AverageElement for $t {
                type Acc = $acc;

                #[inline]
                fn widen(self) -> $acc {
                    <$acc>::from(self)
                }

                #[inline]
                fn accumulate(acc: $acc, value: Self) -> $acc {
                    acc.wrapping_add(<$acc>::from(value))
                }

                $(#[$attr])*
                #[inline]
                fn divide($sum: $acc, $count: u64) -> Self {
                    $mean
                }
            }
        )*
    };
}

int_average! {
    i32 => i64,
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "the mean of 32-bit values fits in 32 bits; counts stay below i64::MAX"
    )]
    |sum, count| (sum / count as i64) as i32;
    u32 => u64,
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the mean of 32-bit values fits in 32 bits"
    )]
    |sum, count| (sum / count) as u32;
    i64 => i64,
    #[expect(clippy::cast_possible_wrap, reason = "counts stay below i64::MAX")]
    |sum, count| sum / count as i64;
    u64 => u64,
    |sum, count| sum / count;
}

macro_rules! float_average {
    ($($t:ty),* $(,)?) => {
        $(
            impl AverageElement for $t {
                type Acc = $t;

                #[inline]
                fn widen(self) -> $t {
                    self
                }

                #[inline]
                fn accumulate(acc: $t, value: Self) -> $t {
                    acc + value
                }

                #[expect(
                    clippy::cast_precision_loss,
                    reason = "float averages divide in the float domain"
                )]
                #[inline]
                fn divide(sum: $t, count: u64) -> Self {
                    sum / count as $t
                }
            }
        )*
    };
}

float_average!(f32, f64);

/// Mean of the source, or `None` when it is empty.
///
/// Sources with random access are summed by index and divided by the known
/// length. Other sources pull the first element, then keep a running count.
pub fn try_get_average<S>(source: &S) -> Option<S::Item>
where
    S: RefEnumerable,
    S::Item: AverageElement,
{
    if source.caps().supports_reverse_scan() {
        let len = source.long_count();
        if len == 0 {
            return None;
        }
        let mut sum = source.get(0)?.widen();
        for i in 1..len {
            sum = S::Item::accumulate(sum, *source.get(i)?);
        }
        return Some(S::Item::divide(sum, len));
    }

    let mut e = source.get_enumerator();
    let Some(first) = e.try_get_next() else {
        e.dispose();
        return None;
    };
    let mut sum = first.widen();
    let mut count = 1u64;
    while let Some(x) = e.try_get_next() {
        sum = S::Item::accumulate(sum, x);
        count += 1;
    }
    e.dispose();
    Some(S::Item::divide(sum, count))
}

// ── Last / first ────────────────────────────────────────────────────

/// Last element satisfying `predicate`.
///
/// Uses a reverse index scan when the source counts and indexes in O(1),
/// otherwise one forward scan.
pub fn try_get_last<S, P>(source: &S, predicate: &P) -> Option<S::Item>
where
    S: RefEnumerable,
    S::Item: Clone,
    P: RefFunc<S::Item, bool>,
{
    if source.caps().supports_reverse_scan() {
        try_get_last_reverse(source, predicate)
    } else {
        try_get_last_forward(source, predicate)
    }
}

/// Reverse index scan: the first match from the end is the last match.
pub fn try_get_last_reverse<S, P>(source: &S, predicate: &P) -> Option<S::Item>
where
    S: RefEnumerable,
    S::Item: Clone,
    P: RefFunc<S::Item, bool>,
{
    let mut i = source.long_count();
    while i > 0 {
        i -= 1;
        if let Some(x) = source.get(i) {
            if predicate.calc(x) {
                return Some(x.clone());
            }
        }
    }
    None
}

/// Forward scan keeping the most recent match.
pub fn try_get_last_forward<S, P>(source: &S, predicate: &P) -> Option<S::Item>
where
    S: RefEnumerable,
    S::Item: Clone,
    P: RefFunc<S::Item, bool>,
{
    let mut e = source.get_enumerator();
    let mut found = None;
    while e.try_move_next() {
        if let Some(x) = e.current() {
            if predicate.calc(x) {
                found = Some(x.clone());
            }
        }
    }
    e.dispose();
    found
}

/// First element satisfying `predicate`.
pub fn try_get_first<S, P>(source: &S, predicate: &P) -> Option<S::Item>
where
    S: RefEnumerable,
    S::Item: Clone,
    P: RefFunc<S::Item, bool>,
{
    let mut e = source.get_enumerator();
    let mut found = None;
    while e.try_move_next() {
        if let Some(x) = e.current() {
            if predicate.calc(x) {
                found = Some(x.clone());
                break;
            }
        }
    }
    e.dispose();
    found
}

/// Number of elements satisfying `predicate`.
pub fn long_count_where<S, P>(source: &S, predicate: &P) -> u64
where
    S: RefEnumerable,
    P: RefFunc<S::Item, bool>,
{
    let mut e = source.get_enumerator();
    let mut count = 0;
    while e.try_move_next() {
        if e.current().is_some_and(|x| predicate.calc(x)) {
            count += 1;
        }
    }
    e.dispose();
    count
}

// ── Aggregate ───────────────────────────────────────────────────────

/// Fold every element into a caller-owned accumulator.
pub fn aggregate<S, A, F>(source: &S, accumulate: &mut A, func: &F)
where
    S: RefEnumerable,
    F: RefAction<A, S::Item>,
{
    let mut e = source.get_enumerator();
    while e.try_move_next() {
        if let Some(x) = e.current() {
            func.execute(accumulate, x);
        }
    }
    e.dispose();
}

/// Fold, then project the accumulator.
pub fn aggregate_with_result<S, A, R, F, G>(source: &S, accumulate: &mut A, func: &F, result: &G) -> R
where
    S: RefEnumerable,
    F: RefAction<A, S::Item>,
    G: RefFunc<A, R>,
{
    aggregate(source, accumulate, func);
    result.calc(accumulate)
}

#[cfg(test)]
mod tests;

use pretty_assertions::assert_eq;

use super::*;
use crate::{ArrayEnumerable, LinqExt, NativeEnumerable};

#[test]
fn average_int32_widens_before_dividing() {
    let src = ArrayEnumerable::from(vec![i32::MAX, i32::MAX, i32::MAX]);
    assert_eq!(try_get_average(&src), Some(i32::MAX));
}

#[test]
fn average_truncates_toward_zero() {
    let src = ArrayEnumerable::from(vec![-1, -2]);
    assert_eq!(try_get_average(&src), Some(-1));
    let src = ArrayEnumerable::from(vec![1u32, 2]);
    assert_eq!(try_get_average(&src), Some(1));
}

#[test]
fn average_of_empty_fails() {
    let src = ArrayEnumerable::<f64>::from(Vec::new());
    assert_eq!(try_get_average(&src), None);
    let filtered = ArrayEnumerable::from(vec![1i64]).filter(|x: &i64| *x > 5);
    assert_eq!(try_get_average(&filtered), None);
}

#[test]
fn average_scan_path_counts_elements() {
    // A filtered view has no random access, so this takes the counting path.
    let view = ArrayEnumerable::from(vec![1.0f32, 2.0, 3.0, 100.0]).filter(|x: &f32| *x < 10.0);
    assert_eq!(try_get_average(&view), Some(2.0));
}

#[test]
fn average_unsigned_64() {
    let buffer = [u64::MAX, 1];
    let src = NativeEnumerable::new(&buffer);
    // Wrapping sum: u64::MAX + 1 == 0.
    assert_eq!(try_get_average(&src), Some(0));
}

#[test]
fn last_paths_agree() {
    let src = ArrayEnumerable::from(vec![4, 7, 2, 9, 6]);
    let odd = |x: &i32| x % 2 == 1;
    assert_eq!(try_get_last_reverse(&src, &odd), Some(9));
    assert_eq!(try_get_last_forward(&src, &odd), Some(9));
    assert_eq!(try_get_last(&src, &odd), Some(9));

    let none = |x: &i32| *x > 100;
    assert_eq!(try_get_last_reverse(&src, &none), None);
    assert_eq!(try_get_last_forward(&src, &none), None);
}

#[test]
fn first_stops_at_first_match() {
    let src = ArrayEnumerable::from(vec![4, 7, 2, 9]);
    assert_eq!(try_get_first(&src, &|x: &i32| x % 2 == 1), Some(7));
    assert_eq!(try_get_first(&src, &|x: &i32| *x < 0), None);
}

#[test]
fn count_matching() {
    let src = ArrayEnumerable::from(vec![1, 2, 3, 4, 5]);
    assert_eq!(long_count_where(&src, &|x: &i32| *x >= 3), 3);
}

#[test]
fn aggregate_folds_in_place() {
    let src = ArrayEnumerable::from(vec![1, 2, 3]);
    let mut acc = 10i64;
    aggregate(&src, &mut acc, &|a: &mut i64, x: &i32| *a += i64::from(*x));
    assert_eq!(acc, 16);

    let mut acc = 0i64;
    let doubled = aggregate_with_result(
        &src,
        &mut acc,
        &|a: &mut i64, x: &i32| *a += i64::from(*x),
        &|a: &i64| a * 2,
    );
    assert_eq!(doubled, 12);
    assert_eq!(acc, 6);
}

use pretty_assertions::assert_eq;

use super::*;

fn drain<E: RefEnumerator>(e: &mut E) -> Vec<E::Item>
where
    E::Item: Clone,
{
    let mut out = Vec::new();
    while let Some(x) = e.try_get_next() {
        out.push(x);
    }
    out
}

#[test]
fn array_yields_in_order() {
    let src = ArrayEnumerable::from(vec![1, 2, 3]);
    let mut e = src.get_enumerator();
    assert_eq!(e.state(), EnumeratorState::NotStarted);
    assert_eq!(drain(&mut e), vec![1, 2, 3]);
    assert_eq!(e.state(), EnumeratorState::Exhausted);
}

#[test]
fn current_is_none_before_start_and_after_end() {
    let src = ArrayEnumerable::from(vec![7]);
    let mut e = src.get_enumerator();
    assert_eq!(e.current(), None);
    assert!(e.try_move_next());
    assert_eq!(e.current(), Some(&7));
    assert!(!e.try_move_next());
    assert_eq!(e.current(), None);
}

#[test]
fn exhausted_stays_exhausted() {
    let src = ArrayEnumerable::<i32>::from(Vec::new());
    let mut e = src.get_enumerator();
    for _ in 0..4 {
        assert!(!e.try_move_next());
    }
    e.dispose();
    e.dispose();
    assert!(!e.try_move_next());
}

#[test]
fn dispose_mid_iteration_terminates() {
    let src = ArrayEnumerable::from(vec![1, 2, 3]);
    let mut e = src.get_enumerator();
    assert!(e.try_move_next());
    e.dispose();
    assert_eq!(e.state(), EnumeratorState::Exhausted);
    assert!(!e.try_move_next());
}

#[test]
fn fresh_enumerators_are_independent() {
    let src = ArrayEnumerable::from(vec![1, 2]);
    let mut a = src.get_enumerator();
    assert!(a.try_move_next());
    assert!(a.try_move_next());
    let mut b = src.get_enumerator();
    assert_eq!(b.try_get_next(), Some(1));
    assert_eq!(a.current(), Some(&2));
}

#[test]
fn wrappers_report_random_access() {
    let owned = ArrayEnumerable::from(vec![10, 20, 30]);
    assert!(owned.can_fast_count());
    assert!(owned.can_index_access());
    assert_eq!(owned.long_count(), 3);
    assert_eq!(owned.get(2), Some(&30));
    assert_eq!(owned.get(3), None);

    let buffer = [4u8, 5];
    let native = NativeEnumerable::new(&buffer);
    assert!(native.caps().supports_reverse_scan());
    assert_eq!(native.long_count(), 2);
    assert_eq!(native.get(1), Some(&5));
}

#[test]
fn native_enumerator_reads_caller_buffer() {
    let buffer = vec![1.5f32, 2.5];
    let native = NativeEnumerable::new(&buffer);
    let mut e = native.get_enumerator();
    assert_eq!(drain(&mut e), vec![1.5, 2.5]);
}

#[test]
fn borrowed_source_delegates() {
    let src = ArrayEnumerable::from(vec![3, 4]);
    let by_ref = &src;
    assert_eq!(by_ref.long_count(), 2);
    assert_eq!(by_ref.get(0), Some(&3));
    let mut e = by_ref.get_enumerator();
    assert_eq!(drain(&mut e), vec![3, 4]);
}

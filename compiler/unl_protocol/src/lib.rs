//! Iteration protocol for allocation-free sequence operators.
//!
//! This crate provides:
//!
//! - **The protocol** ([`RefEnumerator`], [`RefEnumerable`]) — advance-and-test
//!   enumeration with by-reference access to the current element, an
//!   alternate pull form, idempotent disposal, and capability flags
//!   ([`SourceCaps`]) that unlock O(1) counting and random access.
//!
//! - **Sources** ([`ArrayEnumerable`], [`NativeEnumerable`]) — the canonical
//!   wrappers for owned contiguous arrays and caller-owned buffers.
//!
//! - **Views** ([`view`]) — lazy operator results (`Where`, `Select`,
//!   `Concat`, `Distinct`, `MinBy`/`MaxBy`) that hold their sources and
//!   strategies and themselves satisfy the protocol.
//!
//! - **Eager operators** ([`eager`]) — `TryGetAverage`, `TryGetLast`,
//!   `TryGetFirst`, `LongCount` and `Aggregate` written directly against
//!   the protocol. Generated code must agree with these.
//!
//! - **Member names** ([`names`]) — the method and type names generated
//!   code calls into.
//!
//! # Resource model
//!
//! Enumerators are single-owner and single-pass: advancing takes
//! `&mut self`. Fresh enumerators from the same source are independent.
//! A [`NativeEnumerable`] borrows its buffer for `'buf`, so every view and
//! enumerator built on top of it carries that lifetime and the buffer cannot
//! be released while any of them is alive.

pub mod eager;
mod enumerator;
pub mod names;
mod source;
mod strategy;
pub mod view;

pub use enumerator::{EnumeratorState, RefEnumerable, RefEnumerator, SourceCaps};
pub use source::{ArrayEnumerable, ArrayEnumerator, NativeEnumerable, NativeEnumerator};
pub use strategy::{
    Allocator, DefaultEqualityComparer, EqualityComparer, KeyOrd, RefAction, RefFunc,
};
pub use view::LinqExt;

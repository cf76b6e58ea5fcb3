//! Stack machine for generated sequence operator bodies.
//!
//! This crate runs the [`MethodBody`](unl_ir::MethodBody) a generator
//! produced against host stand-ins for the runtime library:
//!
//! - **Values** ([`Value`], [`Place`]) — scalars, object handles and
//!   managed references to argument, local, element or cell storage.
//!
//! - **Heap** ([`Heap`]) — arrays, materialized sources and Views,
//!   enumerator cursors, delegates and boxed cells.
//!
//! - **Machine** ([`Machine`]) — the instruction loop, with a fuel limit
//!   per call and by-reference parameters read back through [`Outcome`].
//!
//! # Usage
//!
//! ```text
//! let mut vm = Machine::new();
//! let xs = vm.array([Value::I32(1), Value::I32(2)]);
//! let out = vm.run(&method.function, &method.body, vec![xs, Value::I32(0)])?;
//! assert_eq!(out.value, Value::Bool(true));
//! ```
//!
//! The machine is a verification harness, not a runtime: objects are never
//! freed and Views are built eagerly.

mod error;
mod heap;
mod host;
mod machine;
mod value;

pub use error::EvalError;
pub use heap::{ActionFn, Cursor, Delegate, FuncFn, Heap, HeapObject, ObjId};
pub use machine::{Machine, Outcome, DEFAULT_FUEL};
pub use value::{Place, Value};

//! Host objects generated bodies operate on.
//!
//! Arrays, sources and Views all reduce to a vector of elements; enumerators
//! are cursors into one. Objects are never freed while the machine lives, so
//! an [`ObjId`] (and any [`Place`](crate::Place) naming heap storage) stays
//! valid across calls.

use std::fmt;
use std::rc::Rc;

use unl_protocol::EnumeratorState;

use crate::error::{invalid_place, mismatch, EvalError};
use crate::value::Value;

/// Index of an object on the [`Heap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u32);

impl ObjId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// `Func<T, TResult>` / `RefFunc<T, TResult>`: the argument arrives
/// dereferenced.
pub type FuncFn = Rc<dyn Fn(&Value) -> Value>;

/// `RefAction<TAccumulate, T>`: updates the accumulator in place.
pub type ActionFn = Rc<dyn Fn(&mut Value, &Value)>;

/// A host callback standing in for a managed delegate.
#[derive(Clone)]
pub enum Delegate {
    Func(FuncFn),
    Action(ActionFn),
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Func(_) => f.write_str("Delegate::Func"),
            Self::Action(_) => f.write_str("Delegate::Action"),
        }
    }
}

/// Enumeration state over one sequence object.
#[derive(Clone, Debug)]
pub struct Cursor {
    seq: ObjId,
    pos: usize,
    state: EnumeratorState,
    disposed: bool,
}

impl Cursor {
    fn new(seq: ObjId) -> Self {
        Self {
            seq,
            pos: 0,
            state: EnumeratorState::NotStarted,
            disposed: false,
        }
    }

    #[inline]
    pub fn seq(&self) -> ObjId {
        self.seq
    }

    #[inline]
    pub fn state(&self) -> EnumeratorState {
        self.state
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Advance over a sequence of `len` elements. Once exhausted, stays
    /// exhausted.
    pub(crate) fn advance(&mut self, len: usize) -> bool {
        match self.state {
            EnumeratorState::Exhausted => return false,
            EnumeratorState::NotStarted => self.pos = 0,
            EnumeratorState::Active => self.pos += 1,
        }
        if self.pos < len {
            self.state = EnumeratorState::Active;
            true
        } else {
            self.state = EnumeratorState::Exhausted;
            false
        }
    }

    /// Index of the current element while active.
    pub(crate) fn current(&self) -> Option<usize> {
        self.state.is_active().then_some(self.pos)
    }

    /// Idempotent.
    pub(crate) fn dispose(&mut self) {
        self.state = EnumeratorState::Exhausted;
        self.disposed = true;
    }
}

#[derive(Clone, Debug)]
pub enum HeapObject {
    /// `T[]` or `NativeArray<T>` storage.
    Array(Vec<Value>),
    /// A source or View, materialized when constructed.
    Seq(Vec<Value>),
    Enumerator(Cursor),
    Delegate(Delegate),
    /// A boxed value behind a reference.
    Cell(Value),
}

#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "a test heap never holds u32::MAX objects"
    )]
    pub fn alloc(&mut self, obj: HeapObject) -> ObjId {
        let id = ObjId::new(self.objects.len() as u32);
        self.objects.push(obj);
        id
    }

    pub fn get(&self, id: ObjId) -> Result<&HeapObject, EvalError> {
        self.objects
            .get(id.index())
            .ok_or_else(|| invalid_place(format!("no object #{}", id.raw())))
    }

    fn get_mut(&mut self, id: ObjId) -> Result<&mut HeapObject, EvalError> {
        self.objects
            .get_mut(id.index())
            .ok_or_else(|| invalid_place(format!("no object #{}", id.raw())))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Elements of an array or sequence.
    pub fn items(&self, id: ObjId) -> Result<&[Value], EvalError> {
        match self.get(id)? {
            HeapObject::Array(items) | HeapObject::Seq(items) => Ok(items),
            other => Err(mismatch("array or sequence", other)),
        }
    }

    pub fn element(&self, id: ObjId, index: usize) -> Result<Value, EvalError> {
        let items = self.items(id)?;
        items.get(index).copied().ok_or(EvalError::IndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len: items.len(),
        })
    }

    pub fn set_element(&mut self, id: ObjId, index: usize, value: Value) -> Result<(), EvalError> {
        match self.get_mut(id)? {
            HeapObject::Array(items) | HeapObject::Seq(items) => {
                let len = items.len();
                let slot = items.get_mut(index).ok_or(EvalError::IndexOutOfRange {
                    index: i64::try_from(index).unwrap_or(i64::MAX),
                    len,
                })?;
                *slot = value;
                Ok(())
            }
            other => Err(mismatch("array or sequence", other)),
        }
    }

    pub fn cell(&self, id: ObjId) -> Result<Value, EvalError> {
        match self.get(id)? {
            HeapObject::Cell(v) => Ok(*v),
            other => Err(mismatch("cell", other)),
        }
    }

    pub fn set_cell(&mut self, id: ObjId, value: Value) -> Result<(), EvalError> {
        match self.get_mut(id)? {
            HeapObject::Cell(v) => {
                *v = value;
                Ok(())
            }
            other => Err(mismatch("cell", other)),
        }
    }

    pub fn cursor(&self, id: ObjId) -> Result<&Cursor, EvalError> {
        match self.get(id)? {
            HeapObject::Enumerator(c) => Ok(c),
            other => Err(mismatch("enumerator", other)),
        }
    }

    pub(crate) fn cursor_mut(&mut self, id: ObjId) -> Result<&mut Cursor, EvalError> {
        match self.get_mut(id)? {
            HeapObject::Enumerator(c) => Ok(c),
            other => Err(mismatch("enumerator", other)),
        }
    }

    pub(crate) fn open(&mut self, seq: ObjId) -> Result<ObjId, EvalError> {
        self.items(seq)?;
        Ok(self.alloc(HeapObject::Enumerator(Cursor::new(seq))))
    }

    pub fn delegate(&self, id: ObjId) -> Result<Delegate, EvalError> {
        match self.get(id)? {
            HeapObject::Delegate(d) => Ok(d.clone()),
            other => Err(mismatch("delegate", other)),
        }
    }

    /// Enumerators opened and never disposed.
    pub fn live_enumerators(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| matches!(o, HeapObject::Enumerator(c) if !c.is_disposed()))
            .count()
    }
}

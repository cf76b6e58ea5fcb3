//! The interpreter loop.
//!
//! One [`Frame`] per call: argument slots, local slots and the evaluation
//! stack. By-reference parameters are boxed into heap cells on entry so the
//! caller can read `out`/`ref` results back from the [`Outcome`].

use unl_ir::{MethodBody, Op, ParamMode, SeqFunction, TypeRef, VarKind};

use crate::error::{mismatch, EvalError};
use crate::heap::{Delegate, Heap, HeapObject, ObjId};
use crate::host;
use crate::value::{arith, compare, convert, Arith, Compare, Place, Value};

/// Instructions a single call may execute before it is abandoned.
pub const DEFAULT_FUEL: u64 = 1_000_000;

// ── Frames ──────────────────────────────────────────────────────────

pub(crate) struct Frame<'b> {
    args: Vec<Value>,
    arg_types: Vec<&'b TypeRef>,
    locals: Vec<Value>,
    local_types: &'b [TypeRef],
    stack: Vec<Value>,
}

impl<'b> Frame<'b> {
    fn new(args: Vec<Value>, arg_types: Vec<&'b TypeRef>, local_types: &'b [TypeRef]) -> Self {
        Self {
            args,
            arg_types,
            locals: local_types.iter().map(Value::default_of).collect(),
            local_types,
            stack: Vec::new(),
        }
    }

    fn arg(&self, index: u16) -> Result<Value, EvalError> {
        self.args
            .get(usize::from(index))
            .copied()
            .ok_or(EvalError::BadSlot {
                kind: "argument",
                index: usize::from(index),
            })
    }

    fn local(&self, index: u16) -> Result<Value, EvalError> {
        self.locals
            .get(usize::from(index))
            .copied()
            .ok_or(EvalError::BadSlot {
                kind: "local",
                index: usize::from(index),
            })
    }

    /// Read through a reference.
    pub(crate) fn load(&self, heap: &Heap, place: Place) -> Result<Value, EvalError> {
        match place {
            Place::Arg(i) => self.arg(i),
            Place::Local(i) => self.local(i),
            Place::Element { obj, index } => heap.element(obj, index),
            Place::Cell(id) => heap.cell(id),
        }
    }

    /// Write through a reference, fitting the value to frame slot types.
    pub(crate) fn store(
        &mut self,
        heap: &mut Heap,
        place: Place,
        value: Value,
    ) -> Result<(), EvalError> {
        match place {
            Place::Arg(i) => {
                let index = usize::from(i);
                let ty = self.arg_types.get(index).ok_or(EvalError::BadSlot {
                    kind: "argument",
                    index,
                })?;
                let value = value.coerce(ty)?;
                if let Some(slot) = self.args.get_mut(index) {
                    *slot = value;
                }
                Ok(())
            }
            Place::Local(i) => {
                let index = usize::from(i);
                let ty = self
                    .local_types
                    .get(index)
                    .ok_or(EvalError::BadSlot { kind: "local", index })?;
                let value = value.coerce(ty)?;
                if let Some(slot) = self.locals.get_mut(index) {
                    *slot = value;
                }
                Ok(())
            }
            Place::Element { obj, index } => heap.set_element(obj, index, value),
            Place::Cell(id) => heap.set_cell(id, value),
        }
    }

    /// The value itself, or what a reference points at.
    pub(crate) fn deref(&self, heap: &Heap, value: Value) -> Result<Value, EvalError> {
        match value {
            Value::Ref(p) => self.load(heap, p),
            other => Ok(other),
        }
    }

    /// The object a receiver or argument names, directly or by reference.
    pub(crate) fn object(&self, heap: &Heap, value: Value) -> Result<ObjId, EvalError> {
        self.deref(heap, value)?.as_obj()
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self, at: usize) -> Result<Value, EvalError> {
        self.stack.pop().ok_or(EvalError::StackUnderflow { at })
    }

    fn pop_n(&mut self, n: usize, at: usize) -> Result<Vec<Value>, EvalError> {
        let start = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or(EvalError::StackUnderflow { at })?;
        Ok(self.stack.split_off(start))
    }
}

fn reference(value: Value) -> Result<Place, EvalError> {
    match value {
        Value::Ref(p) => Ok(p),
        other => Err(mismatch("managed reference", &other)),
    }
}

fn index(value: Value, len: usize) -> Result<usize, EvalError> {
    let i = value.as_i64()?;
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or(EvalError::IndexOutOfRange { index: i, len })
}

// ── Machine ─────────────────────────────────────────────────────────

/// Result of one call.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Return value; [`Value::Unit`] for `void` methods.
    pub value: Value,
    /// Final value of every parameter, in declaration order. By-reference
    /// parameters hold what the body wrote through them.
    pub params: Vec<Value>,
}

impl Outcome {
    pub fn param(&self, index: usize) -> Option<Value> {
        self.params.get(index).copied()
    }
}

/// Executes lowered bodies against host-provided sources and delegates.
pub struct Machine {
    heap: Heap,
    fuel: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self {
            heap: Heap::new(),
            fuel: DEFAULT_FUEL,
        }
    }

    /// Limit each call to `fuel` instructions.
    #[must_use]
    pub fn with_fuel(mut self, fuel: u64) -> Self {
        self.fuel = fuel;
        self
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// A `T[]` or `NativeArray<T>` argument.
    pub fn array(&mut self, items: impl IntoIterator<Item = Value>) -> Value {
        Value::Obj(self.heap.alloc(HeapObject::Array(items.into_iter().collect())))
    }

    /// An already-built source or View argument, as passed to the methods
    /// specialized for stub sources.
    pub fn sequence(&mut self, items: impl IntoIterator<Item = Value>) -> Value {
        Value::Obj(self.heap.alloc(HeapObject::Seq(items.into_iter().collect())))
    }

    /// A `Func`/`RefFunc` delegate argument.
    pub fn func(&mut self, f: impl Fn(&Value) -> Value + 'static) -> Value {
        Value::Obj(
            self.heap
                .alloc(HeapObject::Delegate(Delegate::Func(std::rc::Rc::new(f)))),
        )
    }

    /// A `RefAction` delegate argument.
    pub fn action(&mut self, f: impl Fn(&mut Value, &Value) + 'static) -> Value {
        Value::Obj(
            self.heap
                .alloc(HeapObject::Delegate(Delegate::Action(std::rc::Rc::new(f)))),
        )
    }

    /// Contents of an array, source or View a call returned.
    pub fn items(&self, value: Value) -> Result<Vec<Value>, EvalError> {
        Ok(self.heap.items(value.as_obj()?)?.to_vec())
    }

    /// Enumerators opened and never disposed, across every call so far.
    pub fn live_enumerators(&self) -> usize {
        self.heap.live_enumerators()
    }

    /// Call a generated method: `func` supplies the signature, `body` the
    /// instructions.
    pub fn run(
        &mut self,
        func: &SeqFunction,
        body: &MethodBody,
        args: Vec<Value>,
    ) -> Result<Outcome, EvalError> {
        let mut params: Vec<_> = func
            .params()
            .filter_map(|v| match &v.kind {
                VarKind::Param { index, mode, .. } => Some((*index, *mode, &v.ty)),
                VarKind::Local => None,
            })
            .collect();
        params.sort_by_key(|(index, _, _)| *index);
        if params.len() != args.len() {
            return Err(EvalError::ArgumentCount {
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut slots = Vec::with_capacity(args.len());
        let mut cells = Vec::with_capacity(args.len());
        for (&(_, mode, ty), arg) in params.iter().zip(args) {
            let value = arg.coerce(ty)?;
            if mode == ParamMode::Value {
                slots.push(value);
                cells.push(None);
            } else {
                let cell = self.heap.alloc(HeapObject::Cell(value));
                slots.push(Value::Ref(Place::Cell(cell)));
                cells.push(Some(cell));
            }
        }

        let arg_types = params.iter().map(|(_, _, ty)| *ty).collect();
        let mut frame = Frame::new(slots, arg_types, &body.locals);
        let value = self.execute(&mut frame, body, &func.return_type)?;

        let params = frame
            .args
            .iter()
            .zip(cells)
            .map(|(&arg, cell)| match cell {
                Some(id) => self.heap.cell(id),
                None => Ok(arg),
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(function = %func.name, %value, "call returned");
        Ok(Outcome { value, params })
    }

    fn execute(
        &mut self,
        frame: &mut Frame<'_>,
        body: &MethodBody,
        return_type: &TypeRef,
    ) -> Result<Value, EvalError> {
        let mut fuel = self.fuel;
        let mut pc = 0usize;
        loop {
            fuel = fuel.checked_sub(1).ok_or(EvalError::OutOfFuel)?;
            let at = pc;
            let op = body.ops.get(at).ok_or(EvalError::BadJump { target: at })?;
            pc += 1;
            tracing::trace!(at, %op, depth = frame.stack.len(), "step");

            match op {
                Op::LdArg(i) => {
                    let v = frame.arg(*i)?;
                    frame.push(v);
                }
                Op::LdArgA(i) => {
                    frame.arg(*i)?;
                    frame.push(Value::Ref(Place::Arg(*i)));
                }
                Op::StArg(i) => {
                    let v = frame.pop(at)?;
                    frame.store(&mut self.heap, Place::Arg(*i), v)?;
                }
                Op::LdLoc(i) => {
                    let v = frame.local(*i)?;
                    frame.push(v);
                }
                Op::LdLocA(i) => {
                    frame.local(*i)?;
                    frame.push(Value::Ref(Place::Local(*i)));
                }
                Op::StLoc(i) => {
                    let v = frame.pop(at)?;
                    frame.store(&mut self.heap, Place::Local(*i), v)?;
                }
                Op::LdcI4(v) => frame.push(Value::I32(*v)),
                Op::LdcI8(v) => frame.push(Value::I64(*v)),
                Op::LdcR4(v) => frame.push(Value::F32(*v)),
                Op::LdcR8(v) => frame.push(Value::F64(*v)),
                Op::LdNull => frame.push(Value::Null),

                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::DivUn => {
                    let kind = match op {
                        Op::Add => Arith::Add,
                        Op::Sub => Arith::Sub,
                        Op::Mul => Arith::Mul,
                        Op::Div => Arith::Div,
                        _ => Arith::DivUn,
                    };
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(arith(kind, a, b)?);
                }
                Op::Clt | Op::Cgt | Op::Ceq => {
                    let kind = match op {
                        Op::Clt => Compare::Lt,
                        Op::Cgt => Compare::Gt,
                        _ => Compare::Eq,
                    };
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(compare(kind, a, b)?);
                }
                Op::Conv(to) => {
                    let v = frame.pop(at)?;
                    frame.push(convert(v, *to)?);
                }

                Op::LdLen => {
                    let array = frame.pop(at)?.as_obj()?;
                    let len = self.heap.items(array)?.len();
                    frame.push(Value::U64(u64::try_from(len).unwrap_or(u64::MAX)));
                }
                Op::LdElem(_) | Op::LdElemA(_) => {
                    let i = frame.pop(at)?;
                    let array = frame.pop(at)?.as_obj()?;
                    let i = index(i, self.heap.items(array)?.len())?;
                    frame.push(if matches!(op, Op::LdElem(_)) {
                        self.heap.element(array, i)?
                    } else {
                        Value::Ref(Place::Element { obj: array, index: i })
                    });
                }
                Op::LdObj(_) => {
                    let p = reference(frame.pop(at)?)?;
                    let v = frame.load(&self.heap, p)?;
                    frame.push(v);
                }
                Op::StObj(ty) => {
                    let v = frame.pop(at)?.coerce(ty)?;
                    let p = reference(frame.pop(at)?)?;
                    frame.store(&mut self.heap, p, v)?;
                }
                Op::InitObj(ty) => {
                    let p = reference(frame.pop(at)?)?;
                    frame.store(&mut self.heap, p, Value::default_of(ty))?;
                }

                Op::Call(m) | Op::CallVirt(m) => {
                    let args = frame.pop_n(m.pops(), at)?;
                    let v = host::call(&mut self.heap, frame, m, &args)?;
                    if !m.ret.is_void() {
                        frame.push(v);
                    }
                }
                Op::NewObj(ctor) => {
                    let args = frame.pop_n(ctor.arity, at)?;
                    let v = host::construct(&mut self.heap, frame, ctor, &args)?;
                    frame.push(v);
                }

                Op::Dup => {
                    let v = frame.pop(at)?;
                    frame.push(v);
                    frame.push(v);
                }
                Op::Pop => {
                    frame.pop(at)?;
                }
                Op::Br(l) => pc = l.index(),
                Op::BrTrue(l) | Op::BrFalse(l) => {
                    let taken = frame.pop(at)?.truthy()? == matches!(op, Op::BrTrue(_));
                    if taken {
                        pc = l.index();
                    }
                }
                Op::Ret => {
                    return if return_type.is_void() {
                        Ok(Value::Unit)
                    } else {
                        frame.pop(at)?.coerce(return_type)
                    };
                }
                Op::ThrowArgumentNull(param) => {
                    return Err(EvalError::ArgumentNull {
                        param: param.clone(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;

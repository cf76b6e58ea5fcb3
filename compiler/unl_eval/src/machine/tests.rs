use pretty_assertions::assert_eq;
use unl_ir::{lower, BinOp, Const, MethodRef, Operand, ScalarType, SeqBuilder, SeqValue};
use unl_protocol::names;

use super::*;

fn long() -> TypeRef {
    ScalarType::I64.into()
}

fn boolean() -> TypeRef {
    ScalarType::Bool.into()
}

fn element() -> TypeRef {
    TypeRef::param("T")
}

fn instance(owner: TypeRef, name: &str, arity: usize, ret: TypeRef) -> MethodRef {
    MethodRef {
        owner,
        name: name.to_owned(),
        arity,
        has_this: true,
        is_virtual: false,
        ret,
    }
}

fn compile(b: SeqBuilder, name: &str, ret: TypeRef) -> (SeqFunction, MethodBody) {
    let func = b.finish(name, ret).unwrap_or_else(|e| panic!("{e}"));
    let body = lower(&func).unwrap_or_else(|e| panic!("{e}"));
    (func, body)
}

fn run(vm: &mut Machine, f: &(SeqFunction, MethodBody), args: Vec<Value>) -> Outcome {
    vm.run(&f.0, &f.1, args).unwrap_or_else(|e| panic!("{e}"))
}

/// `long Sum(long[] xs)` as an index loop.
fn sum() -> (SeqFunction, MethodBody) {
    let mut b = SeqBuilder::new();
    let xs = b.param("xs", TypeRef::array(long()), ParamMode::Value);
    let total = b.emit_let(long(), SeqValue::Const(Const::I64(0)));
    let i = b.emit_let(long(), SeqValue::Const(Const::I64(0)));
    let one = b.emit_let(long(), SeqValue::Const(Const::I64(1)));
    let len = b.emit_let(long(), SeqValue::Length(xs));
    let header = b.new_block();
    let body = b.new_block();
    let exit = b.new_block();
    b.terminate_jump(header);

    b.position_at(header);
    let more = b.emit_let(boolean(), SeqValue::Binary { op: BinOp::Lt, lhs: i, rhs: len });
    b.terminate_branch(more, body, exit);

    b.position_at(body);
    let x = b.emit_let(long(), SeqValue::Element { array: xs, index: i });
    b.emit_assign(total, SeqValue::Binary { op: BinOp::Add, lhs: total, rhs: x });
    b.emit_assign(i, SeqValue::Binary { op: BinOp::Add, lhs: i, rhs: one });
    b.terminate_jump(header);

    b.position_at(exit);
    b.terminate_return(Some(total));
    compile(b, "Sum", long())
}

#[test]
fn index_loop_over_array() {
    let f = sum();
    let mut vm = Machine::new();
    let xs = vm.array([1, 2, 3, 4].map(Value::I64));
    assert_eq!(run(&mut vm, &f, vec![xs]).value, Value::I64(10));
    let empty = vm.array(Vec::<Value>::new());
    assert_eq!(run(&mut vm, &f, vec![empty]).value, Value::I64(0));
}

#[test]
fn out_parameter_is_read_back() {
    let mut b = SeqBuilder::new();
    let value = b.param("value", long(), ParamMode::Out);
    b.emit_assign(value, SeqValue::Const(Const::I64(42)));
    let ok = b.emit_let(boolean(), SeqValue::Const(Const::Bool(true)));
    b.terminate_return(Some(ok));
    let f = compile(b, "Store", boolean());

    let mut vm = Machine::new();
    let out = run(&mut vm, &f, vec![Value::I64(0)]);
    assert_eq!(out.value, Value::Bool(true));
    assert_eq!(out.param(0), Some(Value::I64(42)));
}

#[test]
fn init_default_resets_through_reference() {
    let mut b = SeqBuilder::new();
    let value = b.param("value", ScalarType::F64.into(), ParamMode::Out);
    b.emit_init_default(value);
    b.terminate_return(None);
    let f = compile(b, "Reset", TypeRef::Void);

    let mut vm = Machine::new();
    let out = run(&mut vm, &f, vec![Value::F64(9.5)]);
    assert_eq!(out.value, Value::Unit);
    assert_eq!(out.params, vec![Value::F64(0.0)]);
}

#[test]
fn null_argument_throws() {
    let mut b = SeqBuilder::new();
    let func = b.param("func", TypeRef::named(names::REF_FUNC, vec![]), ParamMode::Value);
    let is_null = b.emit_let(boolean(), SeqValue::IsNull(func));
    let throw = b.new_block();
    let ok = b.new_block();
    b.terminate_branch(is_null, throw, ok);
    b.position_at(throw);
    b.terminate_throw_argument_null("func");
    b.position_at(ok);
    b.terminate_return(None);
    let f = compile(b, "Check", TypeRef::Void);

    let mut vm = Machine::new();
    assert_eq!(
        vm.run(&f.0, &f.1, vec![Value::Null]),
        Err(EvalError::ArgumentNull {
            param: "func".to_owned()
        })
    );
    let d = vm.func(|x| *x);
    assert!(vm.run(&f.0, &f.1, vec![d]).is_ok());
}

#[test]
fn runaway_loop_runs_out_of_fuel() {
    let mut b = SeqBuilder::new();
    let spin = b.new_block();
    b.terminate_jump(spin);
    b.position_at(spin);
    b.terminate_jump(spin);
    let f = compile(b, "Spin", TypeRef::Void);

    let mut vm = Machine::new().with_fuel(100);
    assert_eq!(vm.run(&f.0, &f.1, vec![]), Err(EvalError::OutOfFuel));
}

#[test]
fn argument_count_is_checked() {
    let f = sum();
    let mut vm = Machine::new();
    assert_eq!(
        vm.run(&f.0, &f.1, vec![]),
        Err(EvalError::ArgumentCount {
            expected: 1,
            found: 0
        })
    );
}

/// `long Count(in S source)` by pulling every element.
fn pull_count() -> (SeqFunction, MethodBody) {
    let src_ty = TypeRef::named(names::REPEAT_ENUMERABLE, vec![element()]);
    let en_ty = src_ty.clone().nested(names::ENUMERATOR);
    let mut b = SeqBuilder::new();
    let src = b.param("this", src_ty.clone(), ParamMode::In);
    let open = instance(src_ty, names::GET_ENUMERATOR, 0, en_ty.clone());
    let e = b
        .emit_call_value(open, vec![Operand::Addr(src)])
        .unwrap_or_else(|e| panic!("{e}"));
    let n = b.emit_let(long(), SeqValue::Const(Const::I64(0)));
    let one = b.emit_let(long(), SeqValue::Const(Const::I64(1)));
    let header = b.new_block();
    let body = b.new_block();
    let exit = b.new_block();
    b.terminate_jump(header);

    b.position_at(header);
    let next = instance(en_ty.clone(), names::TRY_MOVE_NEXT, 0, boolean());
    let more = b
        .emit_call_value(next, vec![Operand::Addr(e)])
        .unwrap_or_else(|e| panic!("{e}"));
    b.terminate_branch(more, body, exit);

    b.position_at(body);
    b.emit_assign(n, SeqValue::Binary { op: BinOp::Add, lhs: n, rhs: one });
    b.terminate_jump(header);

    b.position_at(exit);
    let dispose = instance(en_ty, names::DISPOSE, 0, TypeRef::Void);
    b.emit_call_void(dispose, vec![Operand::Addr(e)]);
    b.terminate_return(Some(n));
    compile(b, "Count", long())
}

#[test]
fn enumerator_protocol_through_host() {
    let f = pull_count();
    let mut vm = Machine::new();
    let src = vm.sequence([7, 7, 7].map(Value::I32));
    assert_eq!(run(&mut vm, &f, vec![src]).value, Value::I64(3));
    let none = vm.sequence(Vec::<Value>::new());
    assert_eq!(run(&mut vm, &f, vec![none]).value, Value::I64(0));
    assert_eq!(vm.live_enumerators(), 0);
}

#[test]
fn ref_action_updates_accumulator() {
    let action_ty = TypeRef::named(names::REF_ACTION, vec![long(), long()]);
    let mut b = SeqBuilder::new();
    let acc = b.param("accumulate", long(), ParamMode::Ref);
    let func = b.param("func", action_ty.clone(), ParamMode::Value);
    let x = b.emit_let(long(), SeqValue::Const(Const::I64(5)));
    let invoke = MethodRef {
        is_virtual: true,
        ..instance(action_ty, names::INVOKE, 2, TypeRef::Void)
    };
    b.emit_call_void(
        invoke,
        vec![Operand::Var(func), Operand::Addr(acc), Operand::Var(x)],
    );
    b.terminate_return(None);
    let f = compile(b, "Step", TypeRef::Void);

    let mut vm = Machine::new();
    let add = vm.action(|acc, x| {
        if let (Value::I64(a), Value::I64(b)) = (*acc, *x) {
            *acc = Value::I64(a * 10 + b);
        }
    });
    let out = run(&mut vm, &f, vec![Value::I64(3), add]);
    assert_eq!(out.param(0), Some(Value::I64(35)));
}

#[test]
fn constructor_runs_in_place() {
    let arr_ty = TypeRef::array(element());
    let wrapper = TypeRef::named(names::ARRAY_ENUMERABLE, vec![element()]);
    let mut b = SeqBuilder::new();
    let xs = b.param("this", arr_ty, ParamMode::Value);
    let target = b.local(wrapper.clone());
    let ctor = instance(wrapper.clone(), names::CTOR, 1, TypeRef::Void);
    b.emit_init_in_place(target, ctor, vec![Operand::Var(xs)]);
    let count = instance(wrapper, names::LONG_COUNT, 0, long());
    let n = b
        .emit_call_value(count, vec![Operand::Addr(target)])
        .unwrap_or_else(|e| panic!("{e}"));
    b.terminate_return(Some(n));
    let f = compile(b, "Wrap", long());

    let mut vm = Machine::new();
    let xs = vm.array([1, 2].map(Value::I32));
    assert_eq!(run(&mut vm, &f, vec![xs]).value, Value::I64(2));
}

#[test]
fn element_out_of_range() {
    let mut b = SeqBuilder::new();
    let xs = b.param("xs", TypeRef::array(long()), ParamMode::Value);
    let i = b.emit_let(long(), SeqValue::Const(Const::I64(3)));
    let x = b.emit_let(long(), SeqValue::Element { array: xs, index: i });
    b.terminate_return(Some(x));
    let f = compile(b, "At", long());

    let mut vm = Machine::new();
    let xs = vm.array([Value::I64(1)]);
    assert_eq!(
        vm.run(&f.0, &f.1, vec![xs]),
        Err(EvalError::IndexOutOfRange { index: 3, len: 1 })
    );
}

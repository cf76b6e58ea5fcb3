use pretty_assertions::assert_eq;

use crate::ir::{SeqTerminator, VarKind};
use crate::test_helpers::{b, boolean, instance, long, v};
use crate::types::ScalarType;

use super::*;

#[test]
fn builder_creates_entry_block() {
    let builder = SeqBuilder::new();
    assert_eq!(builder.current_block(), b(0));
    assert_eq!(builder.entry_block(), b(0));
    assert!(!builder.is_terminated());
}

#[test]
fn params_and_locals_share_id_space() {
    let mut builder = SeqBuilder::new();
    let p0 = builder.param("this", TypeRef::array(long()), ParamMode::Value);
    let l = builder.local(long());
    let p1 = builder.param("value", long(), ParamMode::Out);
    assert_eq!((p0, l, p1), (v(0), v(1), v(2)));
    builder.terminate_return(None);

    let func = builder.finish("F", TypeRef::Void).unwrap_or_else(|e| panic!("{e}"));
    let params: Vec<_> = func.params().map(|p| p.id).collect();
    assert_eq!(params, vec![v(0), v(2)]);
    assert!(matches!(
        func.var(p1).map(|p| &p.kind),
        Some(VarKind::Param {
            index: 1,
            mode: ParamMode::Out,
            ..
        })
    ));
}

#[test]
fn default_param_is_recorded() {
    let mut builder = SeqBuilder::new();
    let a = builder.param_with_default("allocator", ScalarType::I32.into(), Const::I32(2));
    builder.terminate_return(None);
    let func = builder.finish("F", TypeRef::Void).unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(
        func.var(a).map(|p| &p.kind),
        Some(VarKind::Param {
            default: Some(Const::I32(2)),
            ..
        })
    ));
}

#[test]
fn emit_call_binds_only_non_void_results() {
    let mut builder = SeqBuilder::new();
    let e = builder.local(TypeRef::param("TEnumerator"));
    let next = instance(TypeRef::param("TEnumerator"), "TryMoveNext", 0, boolean());
    let dispose = instance(TypeRef::param("TEnumerator"), "Dispose", 0, TypeRef::Void);
    let ok = builder.emit_call(next, vec![Operand::Addr(e)]);
    let none = builder.emit_call(dispose.clone(), vec![Operand::Addr(e)]);
    assert!(ok.is_some());
    assert_eq!(none, None);
    assert!(matches!(
        builder.emit_call_value(dispose, vec![Operand::Addr(e)]),
        Err(LowerError::VoidResult { .. })
    ));
}

#[test]
fn construct_types_destination_by_owner() {
    let mut builder = SeqBuilder::new();
    let owner = TypeRef::named("ArrayEnumerable", vec![TypeRef::param("T")]);
    let xs = builder.param("this", TypeRef::array(TypeRef::param("T")), ParamMode::Value);
    let ctor = instance(owner.clone(), ".ctor", 1, TypeRef::Void);
    let wrapped = builder.emit_construct(ctor, vec![Operand::Var(xs)]);
    assert_eq!(builder.var_type(wrapped), Some(&owner));
}

#[test]
fn finish_rejects_unterminated_block() {
    let mut builder = SeqBuilder::new();
    let dangling = builder.new_block();
    builder.terminate_jump(dangling);
    let err = builder.finish("Broken", TypeRef::Void);
    assert_eq!(
        err,
        Err(LowerError::UnterminatedBlock {
            function: "Broken".to_owned(),
            block: 1,
        })
    );
}

#[test]
fn branch_and_throw_terminators() {
    let mut builder = SeqBuilder::new();
    let f = builder.param("func", TypeRef::named("RefFunc", vec![]), ParamMode::Value);
    let throw = builder.new_block();
    let ok = builder.new_block();
    let is_null = builder.emit_let(boolean(), SeqValue::IsNull(f));
    builder.terminate_branch(is_null, throw, ok);
    builder.position_at(throw);
    builder.terminate_throw_argument_null("func");
    builder.position_at(ok);
    builder.terminate_return(None);

    let func = builder.finish("Check", TypeRef::Void).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(func.blocks[0].terminator.successors().to_vec(), vec![b(1), b(2)]);
    assert_eq!(
        func.blocks[1].terminator,
        SeqTerminator::ThrowArgumentNull {
            param: "func".to_owned()
        }
    );
}

//! `Aggregate`: eager fold with a caller-owned accumulator.
//!
//! Three overload shapes, each its own holder:
//!
//! | Shape | Accumulator | Returns |
//! |-------|-------------|---------|
//! | `RefValue1Ref` | `ref TAccumulate accumulate` | nothing |
//! | `Value1Func` | `TAccumulate seed` | the folded seed |
//! | `RefValue2Refs` | `ref TAccumulate accumulate` | `resultFunc(ref accumulate)` |
//!
//! When the open-generic placeholder is enabled for a shape, one more method
//! is emitted over any `in TEnumerable` bound through protocol interfaces.

use unl_ir::{lower, GenericParam, Operand, ParamMode, SeqBuilder, TypeRef, VarId};
use unl_protocol::names;

use super::{
    adapt, boolean, collect_unary, delegate, element, element_param, finish, invoke_method,
    method_generics, non_empty, null_check, OperatorGenerator, Protocol,
};
use crate::context::GenContext;
use crate::descriptor::{op, OperatorSpec, OPEN_GENERIC};
use crate::error::GenError;
use crate::module::{ref_enumerable, ref_enumerator, GeneratedMethod, HolderType};
use crate::registry::{ResolvedSource, SourceKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateShape {
    RefValue1Ref,
    Value1Func,
    RefValue2Refs,
}

impl AggregateShape {
    fn operator(self) -> &'static str {
        match self {
            Self::RefValue1Ref => op::AGGREGATE_REF_VALUE_1_REF,
            Self::Value1Func => op::AGGREGATE_VALUE_1_FUNC,
            Self::RefValue2Refs => op::AGGREGATE_REF_VALUE_2_REFS,
        }
    }

    fn has_result_func(self) -> bool {
        matches!(self, Self::RefValue2Refs)
    }
}

pub struct AggregateGenerator {
    spec: OperatorSpec,
    shape: AggregateShape,
}

fn accumulate() -> TypeRef {
    TypeRef::param("TAccumulate")
}

fn result() -> TypeRef {
    TypeRef::param("TResult")
}

impl AggregateGenerator {
    pub fn new(shape: AggregateShape) -> Self {
        let name = shape.operator();
        Self {
            spec: OperatorSpec::new(name, "Aggregate", format!("{name}Helper"))
                .describe("Eagerly fold every element into a caller-owned accumulator"),
            shape,
        }
    }

    fn return_type(&self) -> TypeRef {
        match self.shape {
            AggregateShape::RefValue1Ref => TypeRef::Void,
            AggregateShape::Value1Func => accumulate(),
            AggregateShape::RefValue2Refs => result(),
        }
    }

    fn leading_generics(&self) -> Vec<GenericParam> {
        let mut generics = vec![element_param(), GenericParam::new("TAccumulate")];
        if self.shape.has_result_func() {
            generics.push(GenericParam::new("TResult"));
        }
        generics
    }

    /// Specialized for one resolved source.
    fn method(&self, cx: &GenContext<'_>, src: &ResolvedSource) -> Result<GeneratedMethod, GenError> {
        let generics = method_generics(self.leading_generics(), &[src]);
        let mut b = SeqBuilder::new();
        let this = b.param("this", src.base.clone(), src.param_mode());
        let null_checked_this = matches!(src.kind, SourceKind::Contiguous);
        self.emit(cx, &mut b, this, null_checked_this, &Protocol::of(src), |b| {
            adapt(b, cx, src, this)
        })?;
        finish(b, self.spec.method, self.return_type(), &[src], generics)
    }

    /// Over any `TEnumerable : IRefEnumerable<TEnumerator, T>`.
    fn open_generic_method(&self, cx: &GenContext<'_>) -> Result<GeneratedMethod, GenError> {
        let t = element();
        let enumerable = TypeRef::param("TEnumerable");
        let enumerator = TypeRef::param("TEnumerator");
        let mut generics = vec![
            element_param(),
            GenericParam::unmanaged("TEnumerator").with_constraint(ref_enumerator(t.clone())),
            GenericParam::unmanaged("TEnumerable")
                .with_constraint(ref_enumerable(enumerator.clone(), t.clone())),
        ];
        generics.extend(self.leading_generics().into_iter().skip(1));

        let proto = Protocol::open_generic(enumerable.clone(), enumerator, t);
        let mut b = SeqBuilder::new();
        let this = b.param("this", enumerable, ParamMode::In);
        self.emit(cx, &mut b, this, false, &proto, |_| Ok(this))?;

        let function = b.finish(self.spec.method, self.return_type())?;
        let body = lower(&function)?;
        Ok(GeneratedMethod::new(
            vec![OPEN_GENERIC.to_owned()],
            generics,
            function,
            body,
        ))
    }

    /// ```text
    /// check func (and resultFunc, and an array source) for null
    /// e = GetEnumerator
    /// loop { ref x = e.TryGetNext(out ok); if !ok break; func(ref acc, ref x) }
    /// e.Dispose
    /// return per shape
    /// ```
    fn emit(
        &self,
        cx: &GenContext<'_>,
        b: &mut SeqBuilder,
        this: VarId,
        null_checked_this: bool,
        proto: &Protocol,
        enumerable_of: impl FnOnce(&mut SeqBuilder) -> Result<VarId, GenError>,
    ) -> Result<(), GenError> {
        let t = element();
        let acc = match self.shape {
            AggregateShape::Value1Func => b.param("seed", accumulate(), ParamMode::Value),
            AggregateShape::RefValue1Ref | AggregateShape::RefValue2Refs => {
                b.param("accumulate", accumulate(), ParamMode::Ref)
            }
        };
        let func_ty = delegate(names::REF_ACTION, accumulate(), t);
        let func = b.param("func", func_ty.clone(), ParamMode::Value);
        let result_func = if self.shape.has_result_func() {
            let ty = delegate(names::REF_FUNC, accumulate(), result());
            Some((b.param("resultFunc", ty.clone(), ParamMode::Value), ty))
        } else {
            None
        };

        if null_checked_this {
            null_check(b, this, "this");
        }
        null_check(b, func, "func");
        if let Some((rf, _)) = &result_func {
            null_check(b, *rf, "resultFunc");
        }

        let enumerable = enumerable_of(b)?;
        let e = proto.open(cx, b, enumerable)?;
        let ok = b.local(boolean());
        let combine = invoke_method(cx, &func_ty, 2)?;
        let header = b.new_block();
        let body = b.new_block();
        let exit = b.new_block();
        b.terminate_jump(header);

        b.position_at(header);
        let x = proto.try_get_next(cx, b, e, ok)?;
        b.terminate_branch(ok, body, exit);

        b.position_at(body);
        b.emit_call_void(
            combine,
            vec![Operand::Var(func), Operand::Addr(acc), Operand::Var(x)],
        );
        b.terminate_jump(header);

        b.position_at(exit);
        proto.dispose(cx, b, e)?;
        match (self.shape, result_func) {
            (AggregateShape::RefValue2Refs, Some((rf, ty))) => {
                let project = invoke_method(cx, &ty, 1)?;
                let r = b.emit_call_value(project, vec![Operand::Var(rf), Operand::Addr(acc)])?;
                b.terminate_return(Some(r));
            }
            (AggregateShape::Value1Func, _) => b.terminate_return(Some(acc)),
            _ => b.terminate_return(None),
        }
        Ok(())
    }
}

impl OperatorGenerator for AggregateGenerator {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn generate(&self, cx: &GenContext<'_>) -> Result<Option<HolderType>, GenError> {
        if !self.spec.is_active(cx.matrix()) {
            return Ok(None);
        }
        let mut holder = HolderType::new(self.spec.holder.clone(), self.spec.name);
        collect_unary(cx, &self.spec, &mut holder, &element(), |src| {
            self.method(cx, src)
        })?;
        if cx.matrix().is_enabled(self.spec.name, OPEN_GENERIC) {
            holder.push(self.open_generic_method(cx)?);
        }
        Ok(non_empty(holder))
    }
}

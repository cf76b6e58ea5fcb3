use pretty_assertions::assert_eq;
use unl_ir::{lower, SeqBuilder};

use super::*;

fn t() -> TypeRef {
    TypeRef::param("T")
}

#[test]
fn find_method_substitutes_owner_arguments() {
    let template = TemplateModule::standard();
    let owner = TypeRef::named(names::ARRAY_ENUMERABLE, vec![ScalarType::I32.into()]);
    let get = template
        .find_method(&owner, names::GET_ENUMERATOR, 0)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(get.ret.to_string(), "ArrayEnumerable<int>.Enumerator");
    assert!(get.has_this);
}

#[test]
fn nested_enumerator_methods_use_outer_arguments() {
    let template = TemplateModule::standard();
    let en = TypeRef::named(names::NATIVE_ENUMERABLE, vec![t()]).nested(names::ENUMERATOR);
    let current = template
        .find_method(&en, names::GET_CURRENT, 0)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(current.ret, t().by_ref());
}

#[test]
fn missing_member_names_owner_and_member() {
    let template = TemplateModule::standard();
    let owner = TypeRef::named(names::WHERE_ENUMERABLE, vec![t(), t(), t(), t()]);
    assert_eq!(
        template.find_method(&owner, names::GET_ITEM, 1),
        Err(GenError::MissingMember {
            owner: "WhereEnumerable<T, T, T, T>".to_owned(),
            member: "get_Item".to_owned(),
        })
    );
}

#[test]
fn wrong_type_argument_count_is_rejected() {
    let template = TemplateModule::standard();
    let owner = TypeRef::named(names::ARRAY_ENUMERABLE, vec![]);
    assert!(matches!(
        template.find_method(&owner, names::CTOR, 1),
        Err(GenError::Configuration { .. })
    ));
}

#[test]
fn constrained_call_binds_to_parameter() {
    let template = TemplateModule::standard();
    let iface = ref_enumerable(TypeRef::param("TEnumerator"), t());
    let m = template
        .find_constrained(&TypeRef::param("TEnumerable"), &iface, names::GET_ENUMERATOR, 0)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(m.owner, TypeRef::param("TEnumerable"));
    assert_eq!(m.ret, TypeRef::param("TEnumerator"));
}

#[test]
fn delegate_invoke_is_virtual() {
    let template = TemplateModule::standard();
    let f = TypeRef::named(names::REF_FUNC, vec![t(), ScalarType::Bool.into()]);
    let invoke = template
        .find_method(&f, names::INVOKE, 1)
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(invoke.is_virtual);
    assert_eq!(invoke.ret, ScalarType::Bool.into());
}

fn trivial_method(name: &str) -> GeneratedMethod {
    let mut b = SeqBuilder::new();
    b.param("this", TypeRef::array(t()), ParamMode::Value);
    b.param_with_default("allocator", ScalarType::I32.into(), Const::I32(2));
    b.terminate_return(None);
    let func = b.finish(name, TypeRef::Void).unwrap_or_else(|e| panic!("{e}"));
    let body = lower(&func).unwrap_or_else(|e| panic!("{e}"));
    GeneratedMethod::new(
        vec!["T[]".to_owned()],
        vec![GenericParam::unmanaged("T")],
        func,
        body,
    )
}

#[test]
fn generated_method_signature() {
    let m = trivial_method("Touch");
    assert_eq!(
        m.to_string(),
        "[AggressiveInlining] public static void Touch<T>(this T[] this, int allocator = 2) where T : unmanaged"
    );
    assert_eq!(m.param("allocator").map(|p| p.default), Some(Some(Const::I32(2))));
}

#[test]
fn holder_names_are_unique() {
    let mut module = ExtendedModule::new(TemplateModule::standard());
    let mut h = HolderType::new("TouchHelper", "Touch");
    h.push(trivial_method("Touch"));
    assert!(module.push_holder(h.clone()).is_ok());
    assert!(matches!(
        module.push_holder(h),
        Err(GenError::Configuration { .. })
    ));
    // Holders may not shadow template types either.
    assert!(module
        .push_holder(HolderType::new(names::ALLOCATOR, "Touch"))
        .is_err());
    assert_eq!(module.method_count(), 1);
}

#[test]
fn holder_finds_method_by_sources() {
    let mut h = HolderType::new("TouchHelper", "Touch");
    h.push(trivial_method("Touch"));
    assert!(h.method_for(&["T[]"]).is_some());
    assert!(h.method_for(&["NativeArray<T>"]).is_none());
    assert!(h.method_for(&["T[]", "T[]"]).is_none());
}

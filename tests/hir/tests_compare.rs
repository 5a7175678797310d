//! Type comparison tests: primitive widening, structural equality and
//! convertibility through class hierarchies.

use dresolve::hir::{
    DeducedTypeDictionary, IMPLICIT_WIDENING, Symbol, SymbolKind, SymbolValue, TemplateArgument,
    TemplateParameterSymbol, arguments_equal, is_equal, is_implicitly_convertible, is_implicitly_convertible_deducing,
    is_primitive_implicitly_convertible,
};
use dresolve::syntax::{AstBuilder, BasicType, TemplateParameterKind, TypeDecl};
use rstest::rstest;

use crate::helpers::resolve_helpers::*;
use crate::helpers::symbol_assertions::*;

// =============================================================================
// PRIMITIVES
// =============================================================================

#[test]
fn test_widening_table_is_antisymmetric() {
    for &(from, to) in IMPLICIT_WIDENING {
        assert!(is_primitive_implicitly_convertible(from, to), "{:?} -> {:?}", from, to);
        assert!(!is_primitive_implicitly_convertible(to, from), "{:?} -> {:?}", to, from);
    }
}

#[rstest]
#[case(BasicType::Ubyte, BasicType::Uint, true)]
#[case(BasicType::Int, BasicType::Long, true)]
#[case(BasicType::Float, BasicType::Real, true)]
#[case(BasicType::Char, BasicType::Dchar, true)]
#[case(BasicType::Long, BasicType::Int, false)]
#[case(BasicType::Int, BasicType::Uint, false)]
#[case(BasicType::Double, BasicType::Float, false)]
fn test_primitive_conversions(#[case] from: BasicType, #[case] to: BasicType, #[case] expected: bool) {
    assert_eq!(is_implicitly_convertible(&basic(from), &basic(to)), expected);
}

// =============================================================================
// EQUALITY
// =============================================================================

#[test]
fn test_structurally_equal_tuples_are_equal() {
    let items = || {
        vec![
            TemplateArgument::Type(basic(BasicType::Int)),
            TemplateArgument::Value(SymbolValue::int(3)),
            TemplateArgument::Type(Symbol::string()),
        ]
    };
    let first = Symbol::tuple(items());
    let second = Symbol::tuple(items());
    assert!(is_equal(&first, &second));

    let mut shorter = items();
    shorter.pop();
    assert!(!is_equal(&first, &Symbol::tuple(shorter)));

    let mut swapped = items();
    swapped.swap(0, 2);
    assert!(!is_equal(&first, &Symbol::tuple(swapped)));
}

#[test]
fn test_value_arguments_compare_by_value() {
    let three = TemplateArgument::Value(SymbolValue::int(3));
    assert!(arguments_equal(&three, &TemplateArgument::Value(SymbolValue::int(3))));
    assert!(!arguments_equal(&three, &TemplateArgument::Value(SymbolValue::int(4))));
    assert!(!arguments_equal(&three, &TemplateArgument::Type(basic(BasicType::Int))));
}

#[test]
fn test_arrays_compare_by_element() {
    let ints = Symbol::array(Some(basic(BasicType::Int)));
    assert!(is_equal(&ints, &Symbol::array(Some(basic(BasicType::Int)))));
    assert!(!is_equal(&ints, &Symbol::array(Some(basic(BasicType::Long)))));
    assert!(!is_equal(&ints, &Symbol::pointer(Some(basic(BasicType::Int)))));
}

// =============================================================================
// CONVERTIBILITY
// =============================================================================

#[test]
fn test_derived_class_converts_to_base_and_interface() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let base = b.class(m, "Base", vec![]);
    let iface = b.interface(m, "Shape", vec![]);
    b.class(m, "Circle", vec![TypeDecl::ident("Base"), TypeDecl::ident("Shape")]);
    let cache = dresolve::project::ParseCache::new(b.finish());

    let circle = resolve_name(&cache, m, None, "Circle").remove(0);
    let base_sym = resolve_name(&cache, m, None, "Base").remove(0);
    let shape = resolve_name(&cache, m, None, "Shape").remove(0);
    assert_defined_by(&base_sym, base);
    assert_defined_by(&shape, iface);

    assert!(is_implicitly_convertible(&circle, &base_sym));
    assert!(is_implicitly_convertible(&circle, &shape));
    assert!(!is_implicitly_convertible(&base_sym, &circle));
}

#[test]
fn test_string_literal_converts_to_char_pointer() {
    let pointer = Symbol::pointer(Some(basic(BasicType::Char)));
    assert!(is_implicitly_convertible(&Symbol::string(), &pointer));
    assert!(!is_implicitly_convertible(&Symbol::array(Some(basic(BasicType::Int))), &pointer));
}

#[test]
fn test_anything_converts_to_void_pointer() {
    let void_ptr = Symbol::pointer(Some(basic(BasicType::Void)));
    assert!(is_implicitly_convertible(&Symbol::pointer(Some(basic(BasicType::Double))), &void_ptr));
}

#[test]
fn test_fixed_array_converts_to_dynamic_but_not_to_other_length() {
    let three = Symbol::fixed_array(Some(basic(BasicType::Int)), 3);
    assert!(is_implicitly_convertible(&three, &Symbol::array(Some(basic(BasicType::Int)))));
    assert!(!is_implicitly_convertible(&three, &Symbol::fixed_array(Some(basic(BasicType::Int)), 4)));
}

#[test]
fn test_conversion_into_unbound_parameter_binds_it() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let f = b.method(m, "f", None);
    let param = b.template_parameter(f, "T", TemplateParameterKind::plain_type());
    let _ = b.finish();

    let target = Symbol::template_parameter(TemplateParameterSymbol::unbound(param));
    let mut deduced = DeducedTypeDictionary::for_parameters(&[param]);
    assert!(is_implicitly_convertible_deducing(&basic(BasicType::Short), &target, &mut deduced));
    let bound = deduced.get(param).and_then(|tp| tp.base.as_deref());
    assert_eq!(bound, Some(&basic(BasicType::Short)));

    // Once bound, a different type must match the binding.
    let array = Symbol::array(Some(target.clone()));
    assert!(is_implicitly_convertible_deducing(
        &Symbol::array(Some(basic(BasicType::Short))),
        &array,
        &mut deduced
    ));
    assert!(!is_implicitly_convertible_deducing(
        &Symbol::array(Some(basic(BasicType::Double))),
        &array,
        &mut deduced
    ));
    assert!(matches!(target.kind, SymbolKind::TemplateParameter(_)));
}

// tests/filter_tests.rs

use std::sync::Arc;

use mace::ast::{AstFilter, ComparisonOp};
use mace::context::{Symbol, TranslationContext};
use mace::expr::{Expr, KnownMethod};
use mace::output::to_json;
use mace::serializer::{
    ArraySerializer, DocumentSerializer, Int32Serializer, Int64Serializer, Serializer,
    SerializerRegistry, StringSerializer,
};
use mace::translator::{TranslationError, translate_filter};
use mace::value::Value;

fn person() -> Arc<dyn Serializer> {
    Arc::new(
        DocumentSerializer::new()
            .field("Age", Arc::new(Int32Serializer))
            .field("Qty", Arc::new(Int32Serializer))
            .field("Name", Arc::new(StringSerializer))
            .field("Active", Arc::new(mace::serializer::BooleanSerializer))
            .field("Flags", Arc::new(Int64Serializer))
            .field(
                "Tags",
                Arc::new(ArraySerializer::new(Arc::new(StringSerializer))),
            )
            .field(
                "Scores",
                Arc::new(ArraySerializer::new(Arc::new(Int32Serializer))),
            ),
    )
}

fn ctx() -> TranslationContext {
    TranslationContext::new(Arc::new(SerializerRegistry::default()))
        .with_current_symbol(Symbol::new("p", "", person()))
}

fn p_field(name: &str) -> Expr {
    Expr::field(Expr::parameter("p"), name)
}

fn rendered(expr: &Expr) -> String {
    let filter = translate_filter(expr, &ctx()).unwrap();
    to_json(&filter.render())
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_equality_renders_shorthand() {
    assert_eq!(rendered(&Expr::eq(p_field("Age"), 2)), r#"{"Age":2}"#);
}

#[test]
fn test_comparison_operators_render_canonical_shape() {
    assert_eq!(
        rendered(&Expr::ne(p_field("Age"), 2)),
        r#"{"Age":{"$ne":2}}"#
    );
    assert_eq!(
        rendered(&Expr::gt(p_field("Age"), 2)),
        r#"{"Age":{"$gt":2}}"#
    );
    assert_eq!(
        rendered(&Expr::gte(p_field("Age"), 2)),
        r#"{"Age":{"$gte":2}}"#
    );
    assert_eq!(
        rendered(&Expr::lt(p_field("Age"), 2)),
        r#"{"Age":{"$lt":2}}"#
    );
    assert_eq!(
        rendered(&Expr::lte(p_field("Age"), 2)),
        r#"{"Age":{"$lte":2}}"#
    );
}

#[test]
fn test_literal_on_left_mirrors_operator() {
    // 2 < p.Age still renders field-first
    assert_eq!(
        rendered(&Expr::lt(2, p_field("Age"))),
        r#"{"Age":{"$gt":2}}"#
    );
}

#[test]
fn test_comparison_literal_serialized_through_field_serializer() {
    // Age is an int32 field; a 64-bit literal narrows
    let filter = translate_filter(&Expr::eq(p_field("Age"), 2i64), &ctx()).unwrap();
    assert!(matches!(
        filter,
        AstFilter::Compare {
            value: Value::Int32(2),
            ..
        }
    ));
}

#[test]
fn test_mismatched_literal_fails_translation() {
    let result = translate_filter(&Expr::eq(p_field("Age"), "two"), &ctx());
    assert!(matches!(result, Err(TranslationError::Serialization(_))));
}

#[test]
fn test_field_to_field_comparison_uses_expr() {
    assert_eq!(
        rendered(&Expr::gt(p_field("Age"), p_field("Qty"))),
        r#"{"$expr":{"$gt":["$Age","$Qty"]}}"#
    );
}

// ============================================================================
// Logical connectives
// ============================================================================

#[test]
fn test_and_chain_flattens() {
    let expr = Expr::and(
        Expr::and(Expr::gt(p_field("Age"), 1), Expr::gt(p_field("Age"), 2)),
        Expr::gt(p_field("Age"), 3),
    );
    let filter = translate_filter(&expr, &ctx()).unwrap();
    match &filter {
        AstFilter::And(parts) => assert_eq!(parts.len(), 3),
        other => panic!("expected flat conjunction, got {:?}", other),
    }
    assert_eq!(
        to_json(&filter.render()),
        r#"{"$and":[{"Age":{"$gt":1}},{"Age":{"$gt":2}},{"Age":{"$gt":3}}]}"#
    );
}

#[test]
fn test_or_chain_flattens() {
    let expr = Expr::or(
        Expr::or(Expr::eq(p_field("Age"), 1), Expr::eq(p_field("Age"), 2)),
        Expr::eq(p_field("Age"), 3),
    );
    let filter = translate_filter(&expr, &ctx()).unwrap();
    match &filter {
        AstFilter::Or(parts) => assert_eq!(parts.len(), 3),
        other => panic!("expected flat disjunction, got {:?}", other),
    }
}

#[test]
fn test_mixed_connectives_do_not_flatten_across_operators() {
    let expr = Expr::and(
        Expr::or(Expr::eq(p_field("Age"), 1), Expr::eq(p_field("Age"), 2)),
        Expr::eq(p_field("Age"), 3),
    );
    let filter = translate_filter(&expr, &ctx()).unwrap();
    match filter {
        AstFilter::And(parts) => {
            assert_eq!(parts.len(), 2);
            assert!(matches!(parts[0], AstFilter::Or(_)));
        }
        other => panic!("expected conjunction, got {:?}", other),
    }
}

#[test]
fn test_double_negation_stays_structural() {
    let expr = Expr::not(Expr::not(Expr::eq(p_field("Age"), 2)));
    let filter = translate_filter(&expr, &ctx()).unwrap();
    assert!(matches!(&filter, AstFilter::Not(inner) if matches!(**inner, AstFilter::Not(_))));
    assert_eq!(
        to_json(&filter.render()),
        r#"{"$nor":[{"$nor":[{"Age":2}]}]}"#
    );
}

// ============================================================================
// Implicit is-true
// ============================================================================

#[test]
fn test_bare_boolean_field_compares_to_true() {
    assert_eq!(rendered(&p_field("Active")), r#"{"Active":true}"#);
}

#[test]
fn test_boolean_constant_falls_back_to_expr() {
    assert_eq!(
        rendered(&Expr::constant(true)),
        r#"{"$expr":{"$eq":[true,true]}}"#
    );
}

// ============================================================================
// Recognized predicate methods
// ============================================================================

#[test]
fn test_string_starts_with() {
    let expr = Expr::call(
        KnownMethod::StringStartsWith,
        p_field("Name"),
        vec![Expr::constant("Bo")],
    );
    assert_eq!(
        rendered(&expr),
        r#"{"Name":{"$regex":"^Bo","$options":""}}"#
    );
}

#[test]
fn test_string_ends_with() {
    let expr = Expr::call(
        KnownMethod::StringEndsWith,
        p_field("Name"),
        vec![Expr::constant("ob")],
    );
    assert_eq!(
        rendered(&expr),
        r#"{"Name":{"$regex":"ob$","$options":""}}"#
    );
}

#[test]
fn test_string_contains_escapes_metacharacters() {
    let expr = Expr::call(
        KnownMethod::StringContains,
        p_field("Name"),
        vec![Expr::constant("a.b")],
    );
    assert_eq!(
        rendered(&expr),
        r#"{"Name":{"$regex":"a\\.b","$options":""}}"#
    );
}

#[test]
fn test_regex_match_passes_pattern_and_options_verbatim() {
    let expr = Expr::call(
        KnownMethod::RegexIsMatch,
        p_field("Name"),
        vec![Expr::constant("^B.b$"), Expr::constant("i")],
    );
    assert_eq!(
        rendered(&expr),
        r#"{"Name":{"$regex":"^B.b$","$options":"i"}}"#
    );
}

#[test]
fn test_regex_constant_carries_its_own_options() {
    let expr = Expr::call(
        KnownMethod::RegexIsMatch,
        p_field("Name"),
        vec![Expr::constant(Value::Regex {
            pattern: "^bob".to_string(),
            options: "im".to_string(),
        })],
    );
    assert_eq!(
        rendered(&expr),
        r#"{"Name":{"$regex":"^bob","$options":"im"}}"#
    );
}

#[test]
fn test_invalid_regex_pattern_is_rejected() {
    let expr = Expr::call(
        KnownMethod::RegexIsMatch,
        p_field("Name"),
        vec![Expr::constant("(")],
    );
    let result = translate_filter(&expr, &ctx());
    assert!(matches!(
        result,
        Err(TranslationError::UnsupportedPattern { .. })
    ));
}

#[test]
fn test_is_null_or_empty_is_a_disjunction() {
    let expr = Expr::call(KnownMethod::StringIsNullOrEmpty, p_field("Name"), vec![]);
    assert_eq!(rendered(&expr), r#"{"$or":[{"Name":null},{"Name":""}]}"#);
}

#[test]
fn test_has_flag_lowers_to_bitmask() {
    let expr = Expr::call(KnownMethod::HasFlag, p_field("Flags"), vec![Expr::constant(6)]);
    assert_eq!(rendered(&expr), r#"{"Flags":{"$bitsAllSet":6}}"#);
}

#[test]
fn test_constant_set_containment_lowers_to_in() {
    let set = Value::Array(vec![Value::from("Bob"), Value::from("Eve")]);
    let expr = Expr::call(
        KnownMethod::SequenceContains,
        Expr::constant(set),
        vec![p_field("Name")],
    );
    assert_eq!(rendered(&expr), r#"{"Name":{"$in":["Bob","Eve"]}}"#);
}

#[test]
fn test_array_field_containment_lowers_to_element_equality() {
    let expr = Expr::call(
        KnownMethod::SequenceContains,
        p_field("Scores"),
        vec![Expr::constant(5)],
    );
    assert_eq!(rendered(&expr), r#"{"Scores":5}"#);
}

#[test]
fn test_contains_all_lowers_to_all() {
    let set = Value::Array(vec![Value::from("a"), Value::from("b")]);
    let expr = Expr::call(
        KnownMethod::SequenceContainsAll,
        p_field("Tags"),
        vec![Expr::constant(set)],
    );
    assert_eq!(rendered(&expr), r#"{"Tags":{"$all":["a","b"]}}"#);
}

// ============================================================================
// Quantifiers
// ============================================================================

fn order() -> Arc<dyn Serializer> {
    let item = DocumentSerializer::new().field("Qty", Arc::new(Int32Serializer));
    Arc::new(
        DocumentSerializer::new()
            // The outer document also maps a Qty member, under a different
            // wire name, so shadowing failures are visible in the output
            .field_named("Qty", "OuterQty", Arc::new(Int32Serializer))
            .field("Items", Arc::new(ArraySerializer::new(Arc::new(item)))),
    )
}

#[test]
fn test_any_lowers_to_elem_match() {
    let expr = Expr::call(
        KnownMethod::SequenceAny,
        Expr::field(Expr::parameter("c"), "Items"),
        vec![Expr::lambda(
            "i",
            Expr::gt(Expr::field(Expr::parameter("i"), "Qty"), 5),
        )],
    );
    let ctx = TranslationContext::new(Arc::new(SerializerRegistry::default()))
        .with_current_symbol(Symbol::new("c", "", order()));
    let filter = translate_filter(&expr, &ctx).unwrap();
    assert_eq!(
        to_json(&filter.render()),
        r#"{"Items":{"$elemMatch":{"Qty":{"$gt":5}}}}"#
    );
}

#[test]
fn test_all_lowers_to_negated_elem_match() {
    let expr = Expr::call(
        KnownMethod::SequenceAll,
        Expr::field(Expr::parameter("c"), "Items"),
        vec![Expr::lambda(
            "i",
            Expr::gt(Expr::field(Expr::parameter("i"), "Qty"), 5),
        )],
    );
    let ctx = TranslationContext::new(Arc::new(SerializerRegistry::default()))
        .with_current_symbol(Symbol::new("c", "", order()));
    let filter = translate_filter(&expr, &ctx).unwrap();
    assert_eq!(
        to_json(&filter.render()),
        r#"{"$nor":[{"Items":{"$elemMatch":{"$nor":[{"Qty":{"$gt":5}}]}}}]}"#
    );
}

#[test]
fn test_inner_quantifier_parameter_shadows_outer() {
    // The quantifier reuses the outer parameter's name; the inner binding
    // must win, so the element's Qty renders, not the outer OuterQty
    let expr = Expr::call(
        KnownMethod::SequenceAny,
        Expr::field(Expr::parameter("c"), "Items"),
        vec![Expr::lambda(
            "c",
            Expr::gt(Expr::field(Expr::parameter("c"), "Qty"), 5),
        )],
    );
    let ctx = TranslationContext::new(Arc::new(SerializerRegistry::default()))
        .with_current_symbol(Symbol::new("c", "", order()));
    let filter = translate_filter(&expr, &ctx).unwrap();
    assert_eq!(
        to_json(&filter.render()),
        r#"{"Items":{"$elemMatch":{"Qty":{"$gt":5}}}}"#
    );
}

#[test]
fn test_quantifier_body_uses_current_element() {
    // A scalar-array quantifier can test the current element directly
    let expr = Expr::call(
        KnownMethod::SequenceAny,
        p_field("Scores"),
        vec![Expr::lambda("s", Expr::gt(Expr::parameter("s"), 90))],
    );
    let filter = translate_filter(&expr, &ctx()).unwrap();
    assert_eq!(
        to_json(&filter.render()),
        r#"{"Scores":{"$elemMatch":{"$expr":{"$gt":["$$CURRENT",90]}}}}"#
    );
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_unregistered_method_is_unsupported_in_filter_context() {
    // to_upper is a value construct; boolean-context dispatch rejects it
    let expr = Expr::call(KnownMethod::StringToUpper, p_field("Name"), vec![]);
    let result = translate_filter(&expr, &ctx());
    assert!(matches!(
        result,
        Err(TranslationError::UnsupportedConstruct { .. })
    ));
}

#[test]
fn test_unsupported_error_carries_offending_and_enclosing_nodes() {
    let call = Expr::call(KnownMethod::StringToUpper, p_field("Name"), vec![]);
    let expr = Expr::and(Expr::eq(p_field("Age"), 2), call.clone());
    match translate_filter(&expr, &ctx()) {
        Err(TranslationError::UnsupportedConstruct { node, enclosing }) => {
            assert_eq!(*node, call);
            assert_eq!(*enclosing, expr);
        }
        other => panic!("expected unsupported construct, got {:?}", other),
    }
}

#[test]
fn test_no_partial_ast_on_failure() {
    // One bad operand poisons the whole conjunction
    let expr = Expr::and(
        Expr::eq(p_field("Age"), 2),
        Expr::call(KnownMethod::StringToUpper, p_field("Name"), vec![]),
    );
    assert!(translate_filter(&expr, &ctx()).is_err());
}

#[test]
fn test_exists_filter_renders() {
    // Pipeline builders construct existence tests directly on the AST
    let filter = AstFilter::Exists {
        field: "Name".to_string(),
        exists: true,
    };
    assert_eq!(to_json(&filter.render()), r#"{"Name":{"$exists":true}}"#);
}

#[test]
fn test_comparison_shorthand_chosen_over_expr_form() {
    let filter = translate_filter(&Expr::eq(p_field("Name"), "Bob"), &ctx()).unwrap();
    assert!(matches!(
        filter,
        AstFilter::Compare {
            op: ComparisonOp::Eq,
            ..
        }
    ));
}

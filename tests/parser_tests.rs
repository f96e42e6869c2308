// tests/parser_tests.rs

use tine_lang::ast::{BinOp, Expr, StringPart, TokenKind};
use tine_lang::parser::{ParseError, Parser};
use tine_lang::value::Value;

fn parse(source: &str) -> Expr {
    Parser::from_source(source)
        .and_then(|mut p| p.parse_program())
        .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", source, e))
}

fn parse_err(source: &str) -> ParseError {
    match Parser::from_source(source).and_then(|mut p| p.parse_program()) {
        Ok(expr) => panic!("expected {:?} to fail, got {:?}", source, expr),
        Err(e) => e,
    }
}

fn num(n: f64) -> Expr {
    Expr::Literal(Value::Number(n))
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn index(target: Expr, key: Expr) -> Expr {
    Expr::Index {
        target: Box::new(target),
        key: Box::new(key),
    }
}

// ============================================================================
// Simple tests
// ============================================================================

#[test]
fn test_identity() {
    assert_eq!(parse("."), Expr::Identity);
}

#[test]
fn test_recursive_descent() {
    assert_eq!(parse(".."), Expr::RecursiveDescent);
}

#[test]
fn test_literals() {
    assert_eq!(parse("42"), num(42.0));
    assert_eq!(parse("\"hi\""), Expr::string("hi"));
    assert_eq!(parse("true"), Expr::Literal(Value::Boolean(true)));
    assert_eq!(parse("false"), Expr::Literal(Value::Boolean(false)));
    assert_eq!(parse("null"), Expr::Literal(Value::Null));
}

#[test]
fn test_negative_literal_folds() {
    assert_eq!(parse("-2.5"), num(-2.5));
}

#[test]
fn test_negation_of_path() {
    assert_eq!(parse("-.a"), Expr::Neg(Box::new(Expr::field("a"))));
}

#[test]
fn test_comparison() {
    assert!(matches!(
        parse(".price > 100"),
        Expr::Binary {
            op: BinOp::GreaterThan,
            ..
        }
    ));
}

#[test]
fn test_parentheses() {
    // Should be: Multiply(Add(1, 2), 3)
    assert_eq!(
        parse("(1 + 2) * 3"),
        binary(
            BinOp::Multiply,
            binary(BinOp::Add, num(1.0), num(2.0)),
            num(3.0)
        )
    );
}

// ============================================================================
// Paths and suffixes
// ============================================================================

#[test]
fn test_field_chain() {
    assert_eq!(
        parse(".a.b"),
        index(Expr::field("a"), Expr::string("b"))
    );
}

#[test]
fn test_quoted_field() {
    assert_eq!(parse(".\"a b\""), Expr::field("a b"));
}

#[test]
fn test_iterate() {
    assert_eq!(parse(".[]"), Expr::Iterate(Box::new(Expr::Identity)));
    assert_eq!(
        parse(".items[]"),
        Expr::Iterate(Box::new(Expr::field("items")))
    );
}

#[test]
fn test_index_expression() {
    assert_eq!(parse(".[0]"), index(Expr::Identity, num(0.0)));
    assert_eq!(
        parse("$row[.col]"),
        index(Expr::Variable("row".to_string()), Expr::field("col"))
    );
}

#[test]
fn test_slices() {
    assert_eq!(
        parse(".[1:3]"),
        Expr::Slice {
            target: Box::new(Expr::Identity),
            from: Some(Box::new(num(1.0))),
            to: Some(Box::new(num(3.0))),
        }
    );
    assert_eq!(
        parse(".[:2]"),
        Expr::Slice {
            target: Box::new(Expr::Identity),
            from: None,
            to: Some(Box::new(num(2.0))),
        }
    );
    assert_eq!(
        parse(".[-2:]"),
        Expr::Slice {
            target: Box::new(Expr::Identity),
            from: Some(Box::new(num(-2.0))),
            to: None,
        }
    );
}

#[test]
fn test_optional_suffix() {
    assert_eq!(
        parse(".a?"),
        Expr::Try {
            body: Box::new(Expr::field("a")),
            handler: None,
        }
    );
}

#[test]
fn test_suffix_run() {
    // .a[0][]? applies each suffix to the result so far
    let expected = Expr::Try {
        body: Box::new(Expr::Iterate(Box::new(index(
            Expr::field("a"),
            num(0.0),
        )))),
        handler: None,
    };
    assert_eq!(parse(".a[0][]?"), expected);
}

// ============================================================================
// Pipes, commas and precedence
// ============================================================================

#[test]
fn test_pipe_is_right_nested() {
    assert_eq!(
        parse(".a | .b | .c"),
        Expr::pipe(
            Expr::field("a"),
            Expr::pipe(Expr::field("b"), Expr::field("c"))
        )
    );
}

#[test]
fn test_comma_flattens() {
    assert_eq!(
        parse("1, 2, 3"),
        Expr::Comma(vec![num(1.0), num(2.0), num(3.0)])
    );
}

#[test]
fn test_comma_binds_tighter_than_pipe() {
    assert_eq!(
        parse("1, 2 | .a"),
        Expr::pipe(Expr::Comma(vec![num(1.0), num(2.0)]), Expr::field("a"))
    );
}

#[test]
fn test_mul_binds_tighter_than_add() {
    assert_eq!(
        parse("1 + 2 * 3"),
        binary(
            BinOp::Add,
            num(1.0),
            binary(BinOp::Multiply, num(2.0), num(3.0))
        )
    );
}

#[test]
fn test_subtraction_left_assoc() {
    assert_eq!(
        parse("5 - 2 - 1"),
        binary(
            BinOp::Subtract,
            binary(BinOp::Subtract, num(5.0), num(2.0)),
            num(1.0)
        )
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = parse(".a or .b and .c");
    let Expr::Binary { op, rhs, .. } = expr else {
        panic!("expected binary");
    };
    assert_eq!(op, BinOp::Or);
    assert!(matches!(*rhs, Expr::Binary { op: BinOp::And, .. }));
}

#[test]
fn test_alternative_is_right_assoc() {
    assert_eq!(
        parse(".a // .b // 1"),
        binary(
            BinOp::Alternative,
            Expr::field("a"),
            binary(BinOp::Alternative, Expr::field("b"), num(1.0))
        )
    );
}

#[test]
fn test_comparison_below_arithmetic() {
    assert_eq!(
        parse(".a + 1 == 2"),
        binary(
            BinOp::Equal,
            binary(BinOp::Add, Expr::field("a"), num(1.0)),
            num(2.0)
        )
    );
}

// ============================================================================
// Update-assignment
// ============================================================================

#[test]
fn test_update() {
    assert_eq!(
        parse(".a |= . + 1"),
        Expr::Update {
            target: Box::new(Expr::field("a")),
            value: Box::new(binary(BinOp::Add, Expr::Identity, num(1.0))),
        }
    );
}

#[test]
fn test_compound_update_desugars() {
    assert_eq!(
        parse(".a += 2"),
        Expr::Update {
            target: Box::new(Expr::field("a")),
            value: Box::new(binary(BinOp::Add, Expr::Identity, num(2.0))),
        }
    );
    assert_eq!(
        parse(".a //= 0"),
        Expr::Update {
            target: Box::new(Expr::field("a")),
            value: Box::new(binary(BinOp::Alternative, Expr::Identity, num(0.0))),
        }
    );
}

#[test]
fn test_update_binds_looser_than_alternative() {
    let Expr::Update { value, .. } = parse(".a |= .b // 1") else {
        panic!("expected update");
    };
    assert!(matches!(*value, Expr::Binary { op: BinOp::Alternative, .. }));
}

// ============================================================================
// Constructors
// ============================================================================

#[test]
fn test_arrays() {
    assert_eq!(parse("[]"), Expr::Array(None));
    assert_eq!(
        parse("[1, 2]"),
        Expr::Array(Some(Box::new(Expr::Comma(vec![num(1.0), num(2.0)]))))
    );
}

#[test]
fn test_object_fields() {
    assert_eq!(
        parse("{a: 1, \"b\": .x}"),
        Expr::Object(vec![
            (Expr::string("a"), num(1.0)),
            (Expr::string("b"), Expr::field("x")),
        ])
    );
}

#[test]
fn test_object_shorthand() {
    assert_eq!(
        parse("{a, $v}"),
        Expr::Object(vec![
            (Expr::string("a"), Expr::field("a")),
            (Expr::string("v"), Expr::Variable("v".to_string())),
        ])
    );
}

#[test]
fn test_object_keyword_key() {
    assert_eq!(
        parse("{if: 1}"),
        Expr::Object(vec![(Expr::string("if"), num(1.0))])
    );
}

#[test]
fn test_object_computed_key() {
    assert_eq!(
        parse("{(.k): .v}"),
        Expr::Object(vec![(Expr::field("k"), Expr::field("v"))])
    );
}

#[test]
fn test_object_value_stops_at_comma() {
    // a comma ends the field value rather than fanning it out
    let Expr::Object(fields) = parse("{a: 1, b: 2}") else {
        panic!("expected object");
    };
    assert_eq!(fields.len(), 2);
}

#[test]
fn test_object_value_pipe() {
    assert_eq!(
        parse("{a: .x | .y}"),
        Expr::Object(vec![(
            Expr::string("a"),
            Expr::pipe(Expr::field("x"), Expr::field("y"))
        )])
    );
}

// ============================================================================
// Strings and formats
// ============================================================================

#[test]
fn test_interpolated_string() {
    assert_eq!(
        parse(r#""id: \(.id)!""#),
        Expr::Str {
            parts: vec![
                StringPart::Literal("id: ".to_string()),
                StringPart::Interp(Expr::field("id")),
                StringPart::Literal("!".to_string()),
            ],
            format: None,
        }
    );
}

#[test]
fn test_bare_format() {
    assert_eq!(parse("@csv"), Expr::Format("csv".to_string()));
}

#[test]
fn test_format_with_string() {
    assert_eq!(
        parse(r#"@base64 "x\(.)""#),
        Expr::Str {
            parts: vec![
                StringPart::Literal("x".to_string()),
                StringPart::Interp(Expr::Identity),
            ],
            format: Some("base64".to_string()),
        }
    );
}

// ============================================================================
// Calls, definitions and control flow
// ============================================================================

#[test]
fn test_calls() {
    assert_eq!(parse("length"), Expr::call("length", vec![]));
    assert_eq!(
        parse("range(1; 5)"),
        Expr::call("range", vec![num(1.0), num(5.0)])
    );
}

#[test]
fn test_call_argument_can_be_pipe() {
    assert_eq!(
        parse("map(.a | .b)"),
        Expr::call(
            "map",
            vec![Expr::pipe(Expr::field("a"), Expr::field("b"))]
        )
    );
}

#[test]
fn test_def() {
    let Expr::Define { def, rest } = parse("def inc(f; $n): f + $n; inc(.a; 1)") else {
        panic!("expected define");
    };
    assert_eq!(def.name, "inc");
    assert_eq!(def.arity(), 2);
    assert!(!def.params[0].by_value);
    assert!(def.params[1].by_value);
    assert_eq!(def.params[1].name, "n");
    assert!(matches!(*rest, Expr::Call { ref name, ref args } if name == "inc" && args.len() == 2));
}

#[test]
fn test_bind() {
    assert_eq!(
        parse(".a as $x | $x"),
        Expr::Bind {
            source: Box::new(Expr::field("a")),
            name: "x".to_string(),
            body: Box::new(Expr::Variable("x".to_string())),
        }
    );
}

#[test]
fn test_reduce() {
    assert_eq!(
        parse("reduce .[] as $x (0; . + $x)"),
        Expr::Reduce {
            source: Box::new(Expr::Iterate(Box::new(Expr::Identity))),
            name: "x".to_string(),
            init: Box::new(num(0.0)),
            update: Box::new(binary(
                BinOp::Add,
                Expr::Identity,
                Expr::Variable("x".to_string())
            )),
        }
    );
}

#[test]
fn test_foreach_with_extract() {
    let Expr::Foreach { extract, .. } = parse("foreach .[] as $x (0; . + $x; [$x, .])") else {
        panic!("expected foreach");
    };
    assert!(extract.is_some());

    let Expr::Foreach { extract, .. } = parse("foreach .[] as $x (0; . + $x)") else {
        panic!("expected foreach");
    };
    assert!(extract.is_none());
}

#[test]
fn test_if_elif_else() {
    assert_eq!(
        parse("if .a then 1 elif .b then 2 else 3 end"),
        Expr::If {
            cond: Box::new(Expr::field("a")),
            then: Box::new(num(1.0)),
            otherwise: Some(Box::new(Expr::If {
                cond: Box::new(Expr::field("b")),
                then: Box::new(num(2.0)),
                otherwise: Some(Box::new(num(3.0))),
            })),
        }
    );
}

#[test]
fn test_if_without_else() {
    assert_eq!(
        parse("if .a then 1 end"),
        Expr::If {
            cond: Box::new(Expr::field("a")),
            then: Box::new(num(1.0)),
            otherwise: None,
        }
    );
}

#[test]
fn test_try_catch() {
    assert_eq!(
        parse("try .a catch \"oops\""),
        Expr::Try {
            body: Box::new(Expr::field("a")),
            handler: Some(Box::new(Expr::string("oops"))),
        }
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unclosed_paren() {
    let err = parse_err("(1 + 2");
    assert!(matches!(err, ParseError::Expected { ref expected, .. } if expected == "')'"));
}

#[test]
fn test_missing_end() {
    let err = parse_err("if . then 1");
    assert!(matches!(
        err,
        ParseError::Expected {
            found: TokenKind::Eof,
            ..
        }
    ));
}

#[test]
fn test_missing_colon_in_object() {
    let err = parse_err("{(.a)}");
    assert!(matches!(err, ParseError::Expected { ref expected, .. } if expected == "':'"));
}

#[test]
fn test_trailing_tokens() {
    let err = parse_err(".a )");
    assert!(matches!(
        err,
        ParseError::UnexpectedToken {
            found: TokenKind::RParen,
            offset: 3
        }
    ));
}

#[test]
fn test_dangling_operator() {
    assert!(matches!(parse_err(". +"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_import_rejected() {
    assert!(matches!(
        parse_err("import \"m\" as m; ."),
        ParseError::Unsupported { .. }
    ));
}

#[test]
fn test_lex_error_surfaces() {
    let err = parse_err(".a = 1");
    assert!(matches!(err, ParseError::Lex(_)));
    assert_eq!(err.offset(), 3);
}

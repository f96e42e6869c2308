// tests/builtin_tests.rs

use tine_lang::{Value, builtins, compile, to_json};

fn json(text: &str) -> Value {
    Value::from_json_str(text).unwrap()
}

fn run_json(filter: &str, input: &str) -> String {
    compile(filter)
        .unwrap_or_else(|e| panic!("compile failed for {:?}: {}", filter, e))
        .run_all(json(input))
        .unwrap_or_else(|e| panic!("{:?} failed: {}", filter, e))
        .iter()
        .map(to_json)
        .collect::<Vec<_>>()
        .join(" ")
}

fn run_err(filter: &str, input: &str) -> String {
    match compile(filter).unwrap().run_all(json(input)) {
        Ok(values) => panic!("expected {:?} to fail, got {:?}", filter, values),
        Err(e) => e.to_string(),
    }
}

// ============================================================================
// Types and conversions
// ============================================================================

#[test]
fn test_type() {
    assert_eq!(
        run_json("[.[] | type]", r#"[null, true, 1, "s", [], {}]"#),
        r#"["null","boolean","number","string","array","object"]"#
    );
}

#[test]
fn test_length() {
    assert_eq!(
        run_json("[.[] | length]", r#"[null, -5, "héllo", [1, 2], {"a": 1}]"#),
        "[0,5,5,2,1]"
    );
    assert_eq!(run_err("length", "true"), "boolean (true) has no length");
}

#[test]
fn test_utf8bytelength() {
    assert_eq!(run_json("utf8bytelength", r#""héllo""#), "6");
}

#[test]
fn test_tostring_and_tojson() {
    assert_eq!(run_json("[.[] | tostring]", r#"["a", 1, [1], null]"#), r#"["a","1","[1]","null"]"#);
    assert_eq!(run_json("tojson", r#""a""#), r#""\"a\"""#);
}

#[test]
fn test_tonumber() {
    assert_eq!(run_json("[.[] | tonumber]", r#"["42", " 1.5 ", 7]"#), "[42,1.5,7]");
    assert_eq!(run_err("tonumber", r#""abc""#), "Cannot parse 'abc' as a number");
    assert!(run_err("tonumber", "[]").contains("cannot be parsed as a number"));
}

#[test]
fn test_fromjson() {
    assert_eq!(run_json("fromjson", r#""{\"a\": [1, 2]}""#), r#"{"a":[1,2]}"#);
    assert!(run_err("fromjson", r#""{""#).contains("while parsing"));
}

#[test]
fn test_type_selectors() {
    let input = r#"[null, true, 1, "s", [], {}]"#;
    assert_eq!(run_json("[.[] | numbers]", input), "[1]");
    assert_eq!(run_json("[.[] | strings]", input), r#"["s"]"#);
    assert_eq!(run_json("[.[] | booleans]", input), "[true]");
    assert_eq!(run_json("[.[] | nulls]", input), "[null]");
    assert_eq!(run_json("[.[] | arrays]", input), "[[]]");
    assert_eq!(run_json("[.[] | objects]", input), "[{}]");
    assert_eq!(run_json("[.[] | iterables]", input), "[[],{}]");
    assert_eq!(run_json("[.[] | scalars]", input), r#"[null,true,1,"s"]"#);
    assert_eq!(run_json("[.[] | values]", input), r#"[true,1,"s",[],{}]"#);
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_rounding() {
    assert_eq!(run_json("[.[] | floor]", "[1.5, -1.5]"), "[1,-2]");
    assert_eq!(run_json("[.[] | ceil]", "[1.2, -1.2]"), "[2,-1]");
    assert_eq!(run_json("[.[] | round]", "[1.5, 2.4]"), "[2,2]");
    assert_eq!(run_json("sqrt", "16"), "4");
    assert_eq!(run_json("[.[] | fabs, abs]", "[-3]"), "[3,3]");
    assert!(run_err("floor", r#""x""#).contains("number required"));
}

#[test]
fn test_special_numbers() {
    assert_eq!(run_json("[nan | isnan, isinfinite]", "null"), "[true,false]");
    assert_eq!(run_json("infinite", "null"), "1.7976931348623157e+308");
    assert_eq!(run_json("-infinite", "null"), "-1.7976931348623157e+308");
    assert_eq!(run_json("nan", "null"), "null");
    assert_eq!(run_json("[nan] | sort | .[0] < 0", "null"), "true");
}

#[test]
fn test_range() {
    assert_eq!(run_json("[range(4)]", "null"), "[0,1,2,3]");
    assert_eq!(run_json("[range(2; 5)]", "null"), "[2,3,4]");
    assert_eq!(run_json("[range(0; 10; 3)]", "null"), "[0,3,6,9]");
    assert_eq!(run_json("[range(5; 0; -2)]", "null"), "[5,3,1]");
    assert_eq!(run_json("[range(0; 3; 0)]", "null"), "[]");
    assert_eq!(run_json("[range(0, 1; 3)]", "null"), "[0,1,2,1,2]");
    assert_eq!(run_err("range(\"a\")", "null"), "Range bounds must be numeric");
}

// ============================================================================
// Generators and quantifiers
// ============================================================================

#[test]
fn test_empty_and_error() {
    assert_eq!(run_json("[1, empty, 2]", "null"), "[1,2]");
    assert_eq!(run_err("error(\"bad\")", "null"), "bad");
    assert_eq!(run_err("error", r#"{"x": 1}"#), r#"{"x":1} (not a string)"#);
}

#[test]
fn test_any_all() {
    assert_eq!(run_json("any", "[false, 1]"), "true");
    assert_eq!(run_json("all", "[true, 1]"), "true");
    assert_eq!(run_json("all", "[]"), "true");
    assert_eq!(run_json("any", "[]"), "false");
    assert_eq!(run_json("any(. > 2)", "[1, 3]"), "true");
    assert_eq!(run_json("all(. > 2)", "[1, 3]"), "false");
    assert_eq!(run_json("any(.[]; . == 2)", "[1, 2]"), "true");
    assert_eq!(run_json("all(.[]; . < 2)", "[1, 2]"), "false");
}

#[test]
fn test_first_last_nth() {
    assert_eq!(run_json("first, last", "[1, 2, 3]"), "1 3");
    assert_eq!(run_json("first(range(10; 20))", "null"), "10");
    assert_eq!(run_json("last(range(5))", "null"), "4");
    assert_eq!(run_json("[first(empty)]", "null"), "[]");
    assert_eq!(run_json("nth(1)", "[1, 2, 3]"), "2");
    assert_eq!(run_json("nth(2; range(10))", "null"), "2");
    assert!(run_err("nth(-1; 1)", "null").contains("Out of bounds"));
}

#[test]
fn test_limit() {
    assert_eq!(run_json("[limit(2; .[])]", "[1, 2, 3]"), "[1,2]");
    assert_eq!(run_json("[limit(0; .[])]", "[1, 2, 3]"), "[]");
    assert_eq!(run_json("[limit(5; .[])]", "[1]"), "[1]");
}

#[test]
fn test_isempty() {
    assert_eq!(run_json("isempty(empty)", "null"), "true");
    assert_eq!(run_json("isempty(1, error(\"never\"))", "null"), "false");
}

#[test]
fn test_loops() {
    assert_eq!(run_json("[while(. < 10; . + 3)]", "1"), "[1,4,7]");
    assert_eq!(run_json("until(. > 100; . * 2)", "1"), "128");
    assert_eq!(run_json("[recurse(if . < 3 then . + 1 else empty end)]", "0"), "[0,1,2,3]");
    assert_eq!(run_json("[recurse(.a; . != null)]", r#"{"a": {"a": null}}"#), r#"[{"a":{"a":null}},{"a":null}]"#);
    assert_eq!(run_json("[recurse | numbers]", "[1, [2]]"), "[1,2]");
}

#[test]
fn test_debug_passes_through() {
    assert_eq!(run_json("debug | . + 1", "1"), "2");
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_case_and_trim() {
    assert_eq!(run_json("ascii_downcase", r#""AbC-É""#), r#""abc-É""#);
    assert_eq!(run_json("ascii_upcase", r#""abc""#), r#""ABC""#);
    assert_eq!(run_json("trim, ltrim, rtrim", r#""  x  ""#), r#""x" "x  " "  x""#);
}

#[test]
fn test_split_and_join() {
    assert_eq!(run_json(r#"split(", ")"#, r#""a, b, c""#), r#"["a","b","c"]"#);
    assert_eq!(run_json(r#"split("")"#, r#""ab""#), r#"["a","b"]"#);
    assert_eq!(run_json(r#"split(",")"#, r#""""#), "[]");
    assert_eq!(run_json(r#"join("-")"#, r#"["a", 1, null, true]"#), r#""a-1--true""#);
    assert!(run_err(r#"join("-")"#, r#"[[1]]"#).contains("Cannot join with array"));
}

#[test]
fn test_affixes() {
    assert_eq!(run_json(r#"startswith("ab"), endswith("z")"#, r#""abc""#), "true false");
    assert_eq!(run_json(r#"ltrimstr("ab"), rtrimstr("bc")"#, r#""abc""#), r#""c" "a""#);
    assert_eq!(run_json(r#"ltrimstr("x")"#, "1"), "1");
    assert!(run_err(r#"startswith("a")"#, "1").contains("startswith"));
}

#[test]
fn test_explode_implode() {
    assert_eq!(run_json("explode", r#""aé""#), "[97,233]");
    assert_eq!(run_json("implode", "[104, 105]"), r#""hi""#);
    assert_eq!(run_json("explode | implode", r#""😀x""#), r#""😀x""#);
}

#[test]
fn test_implode_rejects_invalid_codepoints() {
    assert!(run_err("implode", "[-1]").contains("is not a valid codepoint"));
    assert!(run_err("implode", "[1.5]").contains("is not a valid codepoint"));
    assert!(run_err("implode", "[1114112]").contains("is not a valid codepoint"));
    assert!(run_err("implode", "[55296]").contains("is not a valid codepoint"));
}

#[test]
fn test_regex_test() {
    assert_eq!(run_json(r#"test("a.c")"#, r#""abc""#), "true");
    assert_eq!(run_json(r#"test("ABC"; "i")"#, r#""abc""#), "true");
    assert_eq!(run_json(r#"test("a c"; "x")"#, r#""ac""#), "true");
    assert_eq!(run_json(r#"[.[] | test("^\\d+$")]"#, r#"["12", "1a"]"#), "[true,false]");
    assert!(run_err(r#"test("(")"#, r#""x""#).contains("is not a valid regex"));
    assert!(run_err(r#"test("a"; "q")"#, r#""a""#).contains("is not a valid modifier string"));
}

// ============================================================================
// Arrays and objects
// ============================================================================

#[test]
fn test_keys() {
    assert_eq!(run_json("keys", r#"{"b": 1, "a": 2}"#), r#"["a","b"]"#);
    assert_eq!(run_json("keys_unsorted", r#"{"b": 1, "a": 2}"#), r#"["b","a"]"#);
    assert_eq!(run_json("keys", "[5, 6]"), "[0,1]");
    assert!(run_err("keys", "1").contains("has no keys"));
}

#[test]
fn test_has_and_in() {
    assert_eq!(run_json(r#"has("a"), has("z")"#, r#"{"a": null}"#), "true false");
    assert_eq!(run_json("has(1), has(2)", "[0, 1]"), "true false");
    assert_eq!(run_json(r#".[] | in({"a": 1})"#, r#"["a", "b"]"#), "true false");
    assert!(run_err("has(0)", r#"{"a": 1}"#).contains("Cannot check whether object has a number key"));
}

#[test]
fn test_add() {
    assert_eq!(run_json("add", "[1, 2, 3]"), "6");
    assert_eq!(run_json("add", r#"["a", "b"]"#), r#""ab""#);
    assert_eq!(run_json("add", "[[1], [2]]"), "[1,2]");
    assert_eq!(run_json("add", "[]"), "null");
    assert_eq!(run_json("add", r#"{"a": 1, "b": 2}"#), "3");
    assert_eq!(run_json("add(.[].n)", r#"[{"n": 1}, {"n": 2}]"#), "3");
}

#[test]
fn test_sorting() {
    assert_eq!(run_json("sort", "[3, 1, 2]"), "[1,2,3]");
    assert_eq!(
        run_json("sort_by(.n)", r#"[{"n": 2, "i": 0}, {"n": 1, "i": 1}, {"n": 2, "i": 2}]"#),
        r#"[{"n":1,"i":1},{"n":2,"i":0},{"n":2,"i":2}]"#
    );
    assert_eq!(
        run_json("sort_by(.a, .b) | map(.b)", r#"[{"a": 1, "b": 2}, {"a": 1, "b": 1}]"#),
        "[1,2]"
    );
    assert!(run_err("sort", "{}").contains("cannot be sorted, as it is not an array"));
}

#[test]
fn test_grouping() {
    assert_eq!(
        run_json("group_by(.k) | map(map(.v))", r#"[{"k": "b", "v": 1}, {"k": "a", "v": 2}, {"k": "b", "v": 3}]"#),
        "[[2],[1,3]]"
    );
    assert_eq!(run_json("unique", "[3, 1, 3, 2, 1]"), "[1,2,3]");
    assert_eq!(run_json("unique_by(length)", r#"["ab", "c", "de", "f"]"#), r#"["c","ab"]"#);
}

#[test]
fn test_min_max() {
    assert_eq!(run_json("min, max", "[3, 1, 2]"), "1 3");
    assert_eq!(run_json("min, max", "[]"), "null null");
    assert_eq!(
        run_json("min_by(.x), max_by(.x)", r#"[{"x": 2}, {"x": 1}, {"x": 3}]"#),
        r#"{"x":1} {"x":3}"#
    );
    assert_eq!(run_json("min_by(.x)", "[]"), "null");
}

#[test]
fn test_reverse_and_flatten() {
    assert_eq!(run_json("reverse", "[1, 2, 3]"), "[3,2,1]");
    assert_eq!(run_json("reverse", r#""abc""#), r#""cba""#);
    assert_eq!(run_json("reverse", "null"), "[]");
    assert_eq!(run_json("flatten", "[1, [2, [3, [4]]]]"), "[1,2,3,4]");
    assert_eq!(run_json("flatten(1)", "[1, [2, [3]]]"), "[1,2,[3]]");
    assert!(run_err("flatten(-1)", "[]").contains("negative"));
}

#[test]
fn test_toarray() {
    assert_eq!(run_json("[.[] | toarray]", "[1, [2]]"), "[[1],[2]]");
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_builtin_names_cover_required_set() {
    let names = builtins::names();
    for required in [
        "length/0", "keys/0", "has/1", "in/1", "contains/1", "inside/1", "to_entries/0",
        "from_entries/0", "type/0", "range/1", "range/2", "range/3", "any/0", "any/1", "any/2",
        "all/0", "all/1", "all/2", "add/0", "tonumber/0", "tostring/0", "sort/0", "sort_by/1",
        "explode/0", "implode/0", "split/1", "join/1", "select/1", "path/1", "empty/0", "map/1",
        "map_values/1", "del/1", "with_entries/1", "arrays/0", "objects/0", "booleans/0",
        "strings/0", "numbers/0", "nulls/0",
    ] {
        assert!(names.iter().any(|n| n == required), "missing builtin {}", required);
    }
}

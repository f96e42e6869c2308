//! Builtins defined in the filter language itself.

use std::sync::OnceLock;

use tracing::{debug, error};

use crate::{
    ast::{Expr, FuncDef},
    parser::{ParseError, Parser},
};

const SOURCE: &str = r#"
def select(f): if f then . else empty end;
def values: select(. != null);
def nulls: select(. == null);
def booleans: select(type == "boolean");
def numbers: select(type == "number");
def strings: select(type == "string");
def arrays: select(type == "array");
def objects: select(type == "object");
def iterables: select(type == "array" or type == "object");
def scalars: select(type != "array" and type != "object");

def map(f): [.[] | f];
def map_values(f): .[] |= f;
def with_entries(f): to_entries | map(f) | from_entries;
def add(f): reduce f as $x (null; . + $x);

def recurse(f): def r: ., (f | r); r;
def recurse(f; cond): def r: ., (f | select(cond) | r); r;
def recurse: recurse(.[]?);
def walk(f): def w: if type == "object" then map_values(w) elif type == "array" then map(w) else . end | f; w;

def del(f): delpaths([path(f)]);
def paths: path(..) | select(length > 0);
def paths(node_filter): . as $dot | paths | select(. as $p | $dot | getpath($p) | node_filter);
def leaf_paths: paths(scalars);
def pick(pathexps): . as $top | reduce path(pathexps) as $p (null; setpath($p; $top | getpath($p)));

def in(xs): . as $x | xs | has($x);
def inside(xs): . as $x | xs | contains($x);

def first: .[0];
def last: .[-1];
def nth($n): .[$n];
def nth($n; f): if $n < 0 then error("Out of bounds negative array index") else last(limit($n + 1; f)) end;

def while(cond; update): def _while: if cond then ., (update | _while) else empty end; _while;
def until(cond; update): def _until: if cond then . else (update | _until) end; _until;
def repeat(f): def _repeat: ., (f | _repeat); _repeat;

def abs: if type == "number" and . < 0 then - . else . end;
def toarray: if type == "array" then . else [.] end;
.
"#;

static PRELUDE: OnceLock<Vec<FuncDef>> = OnceLock::new();

fn parse() -> Result<Vec<FuncDef>, ParseError> {
    let mut expr = Parser::from_source(SOURCE)?.parse_program()?;
    let mut defs = Vec::new();
    while let Expr::Define { def, rest } = expr {
        defs.push(def);
        expr = *rest;
    }
    Ok(defs)
}

fn prelude() -> &'static [FuncDef] {
    PRELUDE.get_or_init(|| match parse() {
        Ok(defs) => {
            debug!(count = defs.len(), "loaded prelude");
            defs
        }
        Err(e) => {
            error!(error = %e, "prelude failed to parse");
            Vec::new()
        }
    })
}

/// Prelude definition for `name/arity`, if any.
pub fn prelude_def(name: &str, arity: usize) -> Option<&'static FuncDef> {
    prelude()
        .iter()
        .find(|def| def.name == name && def.arity() == arity)
}

pub(super) fn names() -> impl Iterator<Item = String> {
    prelude()
        .iter()
        .map(|def| format!("{}/{}", def.name, def.arity()))
}

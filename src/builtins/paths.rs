//! Natives that read and write paths.

use crate::{
    evaluator::{EvalError, PathIter, ValueIter, flat_map_ok, once},
    path::{self, path_from_value, path_to_value},
    value::Value,
};

use super::{Args, Native, Run};

pub(super) const NATIVES: &[Native] = &[
    Native::new("path", 1, Run::Generator(path_of)),
    Native::new("getpath", 1, Run::Unary(getpath)).with_paths(getpath_paths),
    Native::new("setpath", 2, Run::Binary(setpath)),
    Native::new("delpaths", 1, Run::Unary(delpaths)),
];

/// `path(f)`: the locations `f` addresses, as arrays.
fn path_of<'a>(args: Args<'a>, input: Value) -> ValueIter<'a> {
    Box::new(
        args.paths(0, input)
            .map(|item| item.map(|(p, _)| path_to_value(&p))),
    )
}

fn getpath(input: &Value, p: Value) -> Result<Value, EvalError> {
    path::get_path(input, &path_from_value(&p)?)
}

fn getpath_paths<'a>(args: Args<'a>, input: Value) -> PathIter<'a> {
    let targets = args.values(0, input.clone());
    flat_map_ok(targets, move |p| {
        let found = path_from_value(&p)
            .and_then(|p| path::get_path(&input, &p).map(|value| (p, value)));
        once(found)
    })
}

fn setpath(input: &Value, p: Value, value: Value) -> Result<Value, EvalError> {
    let p = path_from_value(&p)?;
    let mut doc = input.clone();
    path::set_path(&mut doc, &p, value)?;
    Ok(doc)
}

fn delpaths(input: &Value, paths: Value) -> Result<Value, EvalError> {
    let Value::Array(items) = &paths else {
        return Err(EvalError::Type(format!(
            "Paths must be specified as an array, got {}",
            paths.type_name()
        )));
    };
    let paths = items
        .iter()
        .map(path_from_value)
        .collect::<Result<Vec<_>, _>>()?;
    let mut doc = input.clone();
    path::delete_paths(&mut doc, paths)?;
    Ok(doc)
}

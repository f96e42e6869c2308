//! Update-assignment (`lhs |= rhs` and the arithmetic `op=` forms).

use tracing::trace;

use crate::{
    ast::Expr,
    env::Env,
    path::{self, Path},
    value::Value,
};

use super::EvalError;

/// Rewrite every location `target` addresses in `input`.
///
/// Locations are collected up front, then visited in order against the
/// evolving document: each is replaced by the first value `value` produces
/// from its current content. Locations for which `value` produces nothing
/// are deleted together once all replacements are done.
pub(super) fn update<'a>(
    target: &'a Expr,
    value: &'a Expr,
    input: Value,
    env: &Env<'a>,
) -> Result<Value, EvalError> {
    let paths = target
        .paths(input.clone(), env)
        .map(|item| item.map(|(p, _)| p))
        .collect::<Result<Vec<Path>, _>>()?;

    let mut doc = input;
    let mut doomed = Vec::new();
    for p in paths {
        let current = path::get_path(&doc, &p)?;
        match value.values(current, env).next() {
            Some(Ok(new)) => {
                trace!(path = %path::path_to_value(&p), "updating location");
                path::set_path(&mut doc, &p, new)?;
            }
            Some(Err(e)) => return Err(e),
            None => doomed.push(p),
        }
    }

    if !doomed.is_empty() {
        trace!(count = doomed.len(), "deleting locations with no replacement");
        path::delete_paths(&mut doc, doomed)?;
    }
    Ok(doc)
}

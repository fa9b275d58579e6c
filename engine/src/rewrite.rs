//! Subquery rewriting.
//!
//! A `SubqueryCount` predicate is evaluated once per element of a collection.
//! Before it can be compiled, the collection must be identified and every path
//! through it re-rooted at the bound iteration variable `$col<N>`:
//!
//! ```text
//! dogs.age > 5   =>   SUBQUERY(dogs, $col1, $col1.age > 5)
//! ```

use crate::{error::Result, Error, KeyPathOptions, QueryNode};
use tracing::trace;

/// Find the iterated collection in `node` and re-root its paths at `$col<counter>`.
///
/// Returns the collection name and the rewritten tree. Nested subqueries are
/// left untouched; the compiler rewrites them with their own counter.
pub fn rewrite_subquery(node: &QueryNode, counter: usize) -> Result<(String, QueryNode)> {
    let variable = format!("$col{counter}");
    let mut collection = None;
    let rewritten = rewrite(node, &variable, &mut collection)?;
    let collection = collection.ok_or(Error::SubqueryWithoutCollection)?;

    trace!(%collection, %variable, "rewrote subquery");
    Ok((collection, rewritten))
}

fn rewrite(node: &QueryNode, variable: &str, collection: &mut Option<String>) -> Result<QueryNode> {
    match node {
        QueryNode::KeyPath { segments, options } if options.is_collection => {
            let root = segments.first().ok_or(Error::SubqueryWithoutCollection)?;
            match collection {
                None => *collection = Some(root.clone()),
                Some(first) if first == root => {}
                Some(first) => {
                    return Err(Error::SubqueryMultipleCollections {
                        first: first.clone(),
                        second: root.clone(),
                    })
                }
            }

            let mut renamed = segments.clone();
            renamed[0] = variable.to_string();
            // The variable binds a single element.
            Ok(QueryNode::KeyPath {
                segments: renamed,
                options: KeyPathOptions::NONE,
            })
        }
        QueryNode::KeyPath { .. } | QueryNode::Constant { .. } | QueryNode::SubqueryCount { .. } => {
            Ok(node.clone())
        }
        QueryNode::Not { child } => Ok(QueryNode::not(rewrite(child, variable, collection)?)),
        QueryNode::Comparison {
            op,
            lhs,
            rhs,
            options,
        } => Ok(QueryNode::Comparison {
            op: *op,
            lhs: Box::new(rewrite(lhs, variable, collection)?),
            rhs: Box::new(rewrite(rhs, variable, collection)?),
            options: *options,
        }),
        QueryNode::Between {
            subject,
            lower,
            upper,
        } => Ok(QueryNode::between(
            rewrite(subject, variable, collection)?,
            rewrite(lower, variable, collection)?,
            rewrite(upper, variable, collection)?,
        )),
        QueryNode::MapSubscript { .. } => Err(Error::SubqueryMapSubscript),
        QueryNode::GeoWithin { key_path, shape } => Ok(QueryNode::geo_within(
            rewrite(key_path, variable, collection)?,
            rewrite(shape, variable, collection)?,
        )),
    }
}

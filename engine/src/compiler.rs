//! Compilation of a [`QueryNode`] tree into a parameterized filter string.
//!
//! The compiler walks the tree once, left to right. Every constant becomes a
//! placeholder in the filter and an entry in the argument list, in visit
//! order, so the two outputs always line up.
//!
//! ## Fresh predicates
//!
//! A node is rendered in *fresh* position when it must stand on its own as a
//! boolean clause: the root of the tree, both operands of `&&`/`||`, and the
//! body of a subquery. A bare key path in fresh position is a boolean property
//! and is rendered as an explicit `path == true` (`path == false` under `NOT`).

use crate::{
    error::Result, node::check_operands, rewrite::rewrite_subquery, AnyValue, Error, KeyPathOptions,
    QueryNode, Value,
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use tracing::debug;

/// Placeholder style used for arguments in the compiled filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placeholder {
    /// `%@`, resolved in argument order
    #[default]
    Object,
    /// `$0`, `$1`, ... indexing into the argument list
    Positional,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub placeholder: Placeholder,
}

impl CompileOptions {
    pub fn positional() -> Self {
        Self {
            placeholder: Placeholder::Positional,
        }
    }
}

/// Output of a compilation: the filter and its ordered arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledPredicate {
    pub filter: String,
    pub arguments: Vec<Value>,
}

impl CompiledPredicate {
    /// Substitute every placeholder with its argument rendered as a literal.
    ///
    /// For logs and diagnostics only; the external engine always receives the
    /// parameterized form.
    pub fn render_inline(&self) -> String {
        let mut out = String::with_capacity(self.filter.len());
        let mut next = 0;
        let mut chars = self.filter.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '%' if chars.peek() == Some(&'@') => {
                    chars.next();
                    self.write_argument(&mut out, next);
                    next += 1;
                }
                '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                    let mut index = 0usize;
                    while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                        index = index.saturating_mul(10).saturating_add(digit as usize);
                        chars.next();
                    }
                    self.write_argument(&mut out, index);
                }
                other => out.push(other),
            }
        }
        out
    }

    fn write_argument(&self, out: &mut String, index: usize) {
        match self.arguments.get(index) {
            Some(value) => {
                let _ = write!(out, "{value}");
            }
            None => out.push_str("<missing>"),
        }
    }

    /// Arguments in the external representation.
    pub fn arguments_to_any(&self) -> Result<Vec<AnyValue>> {
        self.arguments.iter().map(Value::to_any).collect()
    }
}

/// Compiles node trees. Holds only options, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn compile(&self, node: &QueryNode) -> Result<CompiledPredicate> {
        let mut state = CompileState {
            placeholder: self.options.placeholder,
            filter: String::new(),
            arguments: Vec::new(),
            subqueries: 0,
        };
        state.build(node, true)?;

        debug!(
            filter = %state.filter,
            arguments = state.arguments.len(),
            subqueries = state.subqueries,
            "compiled predicate"
        );

        Ok(CompiledPredicate {
            filter: state.filter,
            arguments: state.arguments,
        })
    }
}

/// Compile with default options.
pub fn compile(node: &QueryNode) -> Result<CompiledPredicate> {
    Compiler::default().compile(node)
}

/// Per-call accumulator. The subquery counter restarts with every compile.
struct CompileState {
    placeholder: Placeholder,
    filter: String,
    arguments: Vec<Value>,
    subqueries: usize,
}

impl CompileState {
    fn build(&mut self, node: &QueryNode, fresh: bool) -> Result<()> {
        match node {
            QueryNode::KeyPath { segments, options } => {
                if fresh {
                    self.boolean_key_path(segments, *options, true)
                } else {
                    self.key_path(segments, *options);
                    Ok(())
                }
            }
            QueryNode::Constant { value } => {
                self.argument(value.clone());
                Ok(())
            }
            QueryNode::Not { child } if fresh => match child.as_ref() {
                QueryNode::KeyPath { segments, options } => {
                    self.boolean_key_path(segments, *options, false)
                }
                QueryNode::MapSubscript { key_path, key } => {
                    self.map_subscript(key_path, key, Some(false))
                }
                // The inner negation renders `path == false`, which needs grouping.
                QueryNode::Not { child: inner } if is_implicit_boolean(inner) => {
                    self.filter.push_str("NOT (");
                    self.build(child, true)?;
                    self.filter.push(')');
                    Ok(())
                }
                QueryNode::Not { .. } => {
                    self.filter.push_str("NOT ");
                    self.build(child, true)
                }
                other => {
                    self.filter.push_str("NOT ");
                    self.build(other, false)
                }
            },
            QueryNode::Not { child } => {
                self.filter.push_str("NOT ");
                self.build(child, false)
            }
            QueryNode::Comparison {
                op,
                lhs,
                rhs,
                options,
            } => {
                check_operands(*op, lhs, rhs)?;
                self.filter.push('(');
                if op.is_logical() {
                    self.build(lhs, true)?;
                    let _ = write!(self.filter, " {op} ");
                    self.build(rhs, true)?;
                } else {
                    self.build(lhs, false)?;
                    let _ = write!(self.filter, " {op}{} ", options.modifier());
                    self.build(rhs, false)?;
                }
                self.filter.push(')');
                Ok(())
            }
            QueryNode::Between {
                subject,
                lower,
                upper,
            } => {
                self.filter.push('(');
                self.build(subject, false)?;
                self.filter.push_str(" BETWEEN {");
                self.build(lower, false)?;
                self.filter.push_str(", ");
                self.build(upper, false)?;
                self.filter.push_str("})");
                Ok(())
            }
            QueryNode::SubqueryCount { inner } => {
                self.subqueries += 1;
                let counter = self.subqueries;
                let (collection, rewritten) = rewrite_subquery(inner, counter)?;
                let _ = write!(self.filter, "SUBQUERY({collection}, $col{counter}, ");
                self.build(&rewritten, true)?;
                self.filter.push_str(").@count");
                Ok(())
            }
            QueryNode::MapSubscript { key_path, key } => {
                self.map_subscript(key_path, key, fresh.then_some(true))
            }
            QueryNode::GeoWithin { key_path, shape } => {
                self.filter.push('(');
                self.build(key_path, false)?;
                self.filter.push_str(" GEOWITHIN ");
                self.build(shape, false)?;
                self.filter.push(')');
                Ok(())
            }
        }
    }

    /// A key path standing alone as a clause: `path == true|false`.
    fn boolean_key_path(
        &mut self,
        segments: &[String],
        options: KeyPathOptions,
        expected: bool,
    ) -> Result<()> {
        // Aggregates and key sets never produce a boolean.
        let dangling = segments.is_empty()
            || segments.iter().any(|s| {
                matches!(
                    s.as_str(),
                    "@min" | "@max" | "@avg" | "@sum" | "@count" | "@allKeys"
                )
            });
        if dangling {
            return Err(Error::DanglingKeyPath(render_segments(segments)));
        }
        self.key_path(segments, options);
        let _ = write!(self.filter, " == {expected}");
        Ok(())
    }

    /// `path[key]`, compared against `expected` when it stands alone.
    fn map_subscript(
        &mut self,
        key_path: &QueryNode,
        key: &Value,
        expected: Option<bool>,
    ) -> Result<()> {
        self.build(key_path, false)?;
        self.filter.push('[');
        self.argument(key.clone());
        self.filter.push(']');
        if let Some(expected) = expected {
            let _ = write!(self.filter, " == {expected}");
        }
        Ok(())
    }

    fn key_path(&mut self, segments: &[String], options: KeyPathOptions) {
        if options.requires_any {
            self.filter.push_str("ANY ");
        }
        self.filter.push_str(&render_segments(segments));
    }

    fn argument(&mut self, value: Value) {
        match self.placeholder {
            Placeholder::Object => self.filter.push_str("%@"),
            Placeholder::Positional => {
                let _ = write!(self.filter, "${}", self.arguments.len());
            }
        }
        self.arguments.push(value);
    }
}

/// Nodes that only become predicates through an explicit `== true|false`.
fn is_implicit_boolean(node: &QueryNode) -> bool {
    matches!(node, QueryNode::KeyPath { .. } | QueryNode::MapSubscript { .. })
}

fn render_segments(segments: &[String]) -> String {
    if segments.is_empty() {
        "SELF".to_string()
    } else {
        segments.join(".")
    }
}

impl fmt::Display for QueryNode {
    /// The compiled filter with arguments substituted inline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match compile(self) {
            Ok(compiled) => f.write_str(&compiled.render_inline()),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Operator, StringOptions};

    fn kp(path: &str) -> QueryNode {
        QueryNode::key_path(path.split('.'), KeyPathOptions::NONE)
    }

    fn collection(path: &str) -> QueryNode {
        QueryNode::key_path(path.split('.'), KeyPathOptions::QUANTIFIED)
    }

    fn cmp(op: Operator, lhs: QueryNode, rhs: QueryNode) -> QueryNode {
        QueryNode::comparison(op, lhs, rhs, StringOptions::NONE).unwrap()
    }

    fn and(lhs: QueryNode, rhs: QueryNode) -> QueryNode {
        cmp(Operator::And, lhs, rhs)
    }

    #[test]
    fn scenario_a_single_comparison() {
        let node = cmp(Operator::GreaterThan, kp("age"), QueryNode::constant(21));
        let compiled = compile(&node).unwrap();
        assert_eq!(compiled.filter, "(age > %@)");
        assert_eq!(compiled.arguments, vec![Value::Int(21)]);
    }

    #[test]
    fn scenario_b_disjunction() {
        let node = cmp(
            Operator::Or,
            cmp(Operator::Equal, kp("name"), QueryNode::constant("Foo")),
            cmp(Operator::Equal, kp("name"), QueryNode::constant("Bar")),
        );
        let compiled = compile(&node).unwrap();
        assert_eq!(compiled.filter, "((name == %@) || (name == %@))");
        assert_eq!(
            compiled.arguments,
            vec![Value::from("Foo"), Value::from("Bar")]
        );
    }

    #[test]
    fn scenario_c_aggregate_path() {
        let avg = collection("dogs.age")
            .append_aggregate(crate::Aggregate::Avg)
            .unwrap();
        let node = cmp(Operator::GreaterThanEqual, avg, QueryNode::constant(0));
        let compiled = compile(&node).unwrap();
        assert_eq!(compiled.filter, "(dogs.@avg.age >= %@)");
        assert_eq!(compiled.arguments, vec![Value::Int(0)]);
    }

    #[test]
    fn scenario_d_ranges() {
        let half_open = and(
            cmp(Operator::GreaterThanEqual, kp("x"), QueryNode::constant(1)),
            cmp(Operator::LessThan, kp("x"), QueryNode::constant(10)),
        );
        let compiled = compile(&half_open).unwrap();
        assert_eq!(compiled.filter, "((x >= %@) && (x < %@))");
        assert_eq!(compiled.arguments, vec![Value::Int(1), Value::Int(10)]);

        let closed = QueryNode::between(kp("x"), QueryNode::constant(1), QueryNode::constant(10));
        let compiled = compile(&closed).unwrap();
        assert_eq!(compiled.filter, "(x BETWEEN {%@, %@})");
        assert_eq!(compiled.arguments, vec![Value::Int(1), Value::Int(10)]);
    }

    #[test]
    fn scenario_e_bare_boolean_in_compound() {
        let node = and(
            kp("isActive"),
            cmp(Operator::GreaterThan, kp("age"), QueryNode::constant(3)),
        );
        assert_eq!(
            compile(&node).unwrap().filter,
            "(isActive == true && (age > %@))"
        );

        let node = and(QueryNode::not(kp("isActive")), kp("isAdmin"));
        assert_eq!(
            compile(&node).unwrap().filter,
            "(isActive == false && isAdmin == true)"
        );
    }

    #[test]
    fn bare_boolean_at_root() {
        assert_eq!(compile(&kp("isActive")).unwrap().filter, "isActive == true");
        assert_eq!(
            compile(&QueryNode::not(kp("isActive"))).unwrap().filter,
            "isActive == false"
        );
    }

    #[test]
    fn double_negation_of_bare_boolean() {
        let node = QueryNode::not(QueryNode::not(kp("isActive")));
        assert_eq!(compile(&node).unwrap().filter, "NOT (isActive == false)");

        let node = and(
            QueryNode::not(QueryNode::not(kp("isActive"))),
            cmp(Operator::GreaterThan, kp("age"), QueryNode::constant(1)),
        );
        assert_eq!(
            compile(&node).unwrap().filter,
            "(NOT (isActive == false) && (age > %@))"
        );

        let node = QueryNode::not(QueryNode::not(QueryNode::not(kp("isActive"))));
        assert_eq!(compile(&node).unwrap().filter, "NOT NOT (isActive == false)");
    }

    #[test]
    fn not_of_compound() {
        let node = QueryNode::not(and(kp("a"), kp("b")));
        assert_eq!(compile(&node).unwrap().filter, "NOT (a == true && b == true)");

        let node = QueryNode::not(cmp(Operator::Equal, kp("x"), QueryNode::constant(1)));
        assert_eq!(compile(&node).unwrap().filter, "NOT (x == %@)");
    }

    #[test]
    fn lone_constant() {
        let compiled = compile(&QueryNode::constant(7)).unwrap();
        assert_eq!(compiled.filter, "%@");
        assert_eq!(compiled.arguments, vec![Value::Int(7)]);

        let compiled = compile(&QueryNode::constant(Value::Null)).unwrap();
        assert_eq!(compiled.filter, "%@");
        assert!(compiled.arguments[0].is_null());
    }

    #[test]
    fn string_modifiers() {
        let node = QueryNode::comparison(
            Operator::Like,
            kp("name"),
            QueryNode::constant("a*"),
            StringOptions::CASE_INSENSITIVE | StringOptions::DIACRITIC_INSENSITIVE,
        )
        .unwrap();
        assert_eq!(compile(&node).unwrap().filter, "(name LIKE[cd] %@)");
    }

    #[test]
    fn any_quantifier() {
        let node = cmp(Operator::Equal, collection("dogs.name"), QueryNode::constant("Rex"));
        assert_eq!(compile(&node).unwrap().filter, "(ANY dogs.name == %@)");
    }

    #[test]
    fn self_reference() {
        let node = cmp(Operator::GreaterThan, QueryNode::root(), QueryNode::constant(1));
        assert_eq!(compile(&node).unwrap().filter, "(SELF > %@)");
    }

    #[test]
    fn subquery_counters_increase() {
        let first = QueryNode::subquery_count(cmp(
            Operator::GreaterThan,
            collection("dogs.age"),
            QueryNode::constant(1),
        ));
        let second = QueryNode::subquery_count(cmp(
            Operator::Equal,
            collection("cats.name"),
            QueryNode::constant("Tom"),
        ));
        let node = and(
            cmp(Operator::GreaterThan, first, QueryNode::constant(0)),
            cmp(Operator::Equal, second, QueryNode::constant(2)),
        );

        let compiled = compile(&node).unwrap();
        assert_eq!(
            compiled.filter,
            "((SUBQUERY(dogs, $col1, ($col1.age > %@)).@count > %@) && \
             (SUBQUERY(cats, $col2, ($col2.name == %@)).@count == %@))"
        );
        assert_eq!(compiled.arguments.len(), 4);
    }

    #[test]
    fn nested_subqueries() {
        let inner = QueryNode::subquery_count(cmp(
            Operator::Equal,
            collection("toys.color"),
            QueryNode::constant("red"),
        ));
        let outer = QueryNode::subquery_count(and(
            cmp(Operator::GreaterThan, collection("dogs.age"), QueryNode::constant(1)),
            cmp(Operator::GreaterThan, inner, QueryNode::constant(0)),
        ));
        let node = cmp(Operator::GreaterThan, outer, QueryNode::constant(0));

        assert_eq!(
            compile(&node).unwrap().filter,
            "(SUBQUERY(dogs, $col1, (($col1.age > %@) && \
             (SUBQUERY(toys, $col2, ($col2.color == %@)).@count > %@))).@count > %@)"
        );
    }

    #[test]
    fn subquery_requires_collection() {
        let node = QueryNode::subquery_count(cmp(
            Operator::GreaterThan,
            kp("age"),
            QueryNode::constant(1),
        ));
        assert_eq!(compile(&node).unwrap_err(), Error::SubqueryWithoutCollection);
    }

    #[test]
    fn map_subscript() {
        let scores = QueryNode::key_path(["scores"], KeyPathOptions::COLLECTION);
        let node = cmp(
            Operator::GreaterThan,
            QueryNode::map_subscript(scores, "math"),
            QueryNode::constant(5),
        );
        let compiled = compile(&node).unwrap();
        assert_eq!(compiled.filter, "(scores[%@] > %@)");
        assert_eq!(compiled.arguments, vec![Value::from("math"), Value::Int(5)]);
    }

    #[test]
    fn bare_map_subscript() {
        let flags = || QueryNode::key_path(["flags"], KeyPathOptions::COLLECTION);

        let compiled = compile(&QueryNode::map_subscript(flags(), "x")).unwrap();
        assert_eq!(compiled.filter, "flags[%@] == true");
        assert_eq!(compiled.arguments, vec![Value::from("x")]);

        let negated = QueryNode::not(QueryNode::map_subscript(flags(), "x"));
        assert_eq!(compile(&negated).unwrap().filter, "flags[%@] == false");

        let node = and(negated, kp("isActive"));
        assert_eq!(
            compile(&node).unwrap().filter,
            "(flags[%@] == false && isActive == true)"
        );
    }

    #[test]
    fn positional_placeholders() {
        let node = and(
            cmp(Operator::Equal, kp("name"), QueryNode::constant("a")),
            QueryNode::between(kp("age"), QueryNode::constant(1), QueryNode::constant(9)),
        );
        let compiled = Compiler::new(CompileOptions::positional())
            .compile(&node)
            .unwrap();
        assert_eq!(
            compiled.filter,
            "((name == $0) && (age BETWEEN {$1, $2}))"
        );
        assert_eq!(compiled.render_inline(), r#"((name == "a") && (age BETWEEN {1, 9}))"#);
    }

    #[test]
    fn inline_rendering_keeps_subquery_variables() {
        let node = cmp(
            Operator::GreaterThan,
            QueryNode::subquery_count(cmp(
                Operator::Equal,
                collection("dogs.name"),
                QueryNode::constant("Rex"),
            )),
            QueryNode::constant(1),
        );
        assert_eq!(
            node.to_string(),
            r#"(SUBQUERY(dogs, $col1, ($col1.name == "Rex")).@count > 1)"#
        );
    }

    #[test]
    fn dangling_key_paths() {
        let count = QueryNode::key_path(["dogs", "@count"], KeyPathOptions::COLLECTION);
        assert!(matches!(compile(&count), Err(Error::DanglingKeyPath(p)) if p == "dogs.@count"));
        assert!(matches!(
            compile(&QueryNode::root()),
            Err(Error::DanglingKeyPath(p)) if p == "SELF"
        ));
    }

    #[test]
    fn collection_operands_rejected_at_compile() {
        // Bypass the checked constructor to reach the compiler's own check.
        let node = QueryNode::Comparison {
            op: Operator::Equal,
            lhs: Box::new(collection("dogs.age")),
            rhs: Box::new(collection("cats.age")),
            options: StringOptions::NONE,
        };
        assert!(matches!(compile(&node), Err(Error::CollectionComparison { .. })));
    }

    #[test]
    fn geo_within() {
        let shape = crate::GeoBox::new(
            crate::GeoPoint::new(0.0, 0.0).unwrap(),
            crate::GeoPoint::new(1.0, 1.0).unwrap(),
        );
        let node = QueryNode::geo_within(kp("location"), QueryNode::constant(shape));
        let compiled = compile(&node).unwrap();
        assert_eq!(compiled.filter, "(location GEOWITHIN %@)");
        assert_eq!(
            compiled.render_inline(),
            "(location GEOWITHIN geoBox([0, 0], [1, 1]))"
        );
    }

    #[test]
    fn compiled_predicate_json() {
        let node = cmp(Operator::Equal, kp("age"), QueryNode::constant(3));
        let compiled = compile(&node).unwrap();
        let json = serde_json::to_value(&compiled).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filter": "(age == %@)",
                "arguments": [{"type": "int", "value": 3}]
            })
        );
        assert_eq!(
            compiled.arguments_to_any().unwrap(),
            vec![serde_json::json!({"type": "int", "value": 3})]
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn scalar() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<i64>().prop_map(Value::Int),
                any::<bool>().prop_map(Value::Bool),
                "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
                proptest::collection::vec(any::<u8>(), 0..8).prop_map(Value::Binary),
            ]
        }

        fn segment() -> impl Strategy<Value = String> {
            "[a-z][a-zA-Z0-9]{0,6}"
        }

        fn leaf() -> impl Strategy<Value = QueryNode> {
            (segment(), scalar(), 2usize..8).prop_map(|(name, value, op)| {
                let ops = [
                    Operator::Equal,
                    Operator::NotEqual,
                    Operator::LessThan,
                    Operator::LessThanEqual,
                    Operator::GreaterThan,
                    Operator::GreaterThanEqual,
                ];
                QueryNode::Comparison {
                    op: ops[op % ops.len()],
                    lhs: Box::new(QueryNode::key_path([name], KeyPathOptions::NONE)),
                    rhs: Box::new(QueryNode::constant(value)),
                    options: StringOptions::NONE,
                }
            })
        }

        fn tree() -> impl Strategy<Value = QueryNode> {
            leaf().prop_recursive(4, 32, 2, |inner| {
                prop_oneof![
                    (inner.clone(), inner.clone(), any::<bool>()).prop_map(|(l, r, is_and)| {
                        QueryNode::Comparison {
                            op: if is_and { Operator::And } else { Operator::Or },
                            lhs: Box::new(l),
                            rhs: Box::new(r),
                            options: StringOptions::NONE,
                        }
                    }),
                    inner.prop_map(QueryNode::not),
                ]
            })
        }

        fn count_constants(node: &QueryNode) -> usize {
            match node {
                QueryNode::Constant { .. } => 1,
                QueryNode::Not { child } => count_constants(child),
                QueryNode::Comparison { lhs, rhs, .. } => count_constants(lhs) + count_constants(rhs),
                _ => 0,
            }
        }

        proptest! {
            #[test]
            fn single_constant_compiles_to_one_placeholder(value in scalar()) {
                let compiled = compile(&QueryNode::constant(value.clone())).unwrap();
                prop_assert_eq!(compiled.filter, "%@");
                prop_assert_eq!(compiled.arguments, vec![value]);
            }

            #[test]
            fn equality_inlines_the_argument(value in scalar()) {
                let node = QueryNode::comparison(
                    Operator::Equal,
                    QueryNode::key_path(["x"], KeyPathOptions::NONE),
                    QueryNode::constant(value.clone()),
                    StringOptions::NONE,
                ).unwrap();
                let compiled = compile(&node).unwrap();
                prop_assert_eq!(compiled.render_inline(), format!("(x == {value})"));
            }

            #[test]
            fn compilation_is_idempotent(node in tree()) {
                let first = compile(&node).unwrap();
                let second = compile(&node).unwrap();
                prop_assert_eq!(&first.filter, &second.filter);
                prop_assert_eq!(first.arguments, second.arguments);
            }

            #[test]
            fn arguments_follow_visit_order(node in tree()) {
                let compiled = compile(&node).unwrap();
                prop_assert_eq!(compiled.arguments.len(), count_constants(&node));
                prop_assert_eq!(compiled.filter.matches("%@").count(), compiled.arguments.len());
            }

            #[test]
            fn two_collections_are_always_rejected(
                left in proptest::collection::vec(segment(), 1..4),
                right in proptest::collection::vec(segment(), 1..4),
                op in 0usize..13,
            ) {
                let ops = [
                    Operator::Or, Operator::And, Operator::Equal, Operator::NotEqual,
                    Operator::LessThan, Operator::LessThanEqual, Operator::GreaterThan,
                    Operator::GreaterThanEqual, Operator::In, Operator::Contains,
                    Operator::BeginsWith, Operator::EndsWith, Operator::Like,
                ];
                let result = QueryNode::comparison(
                    ops[op],
                    QueryNode::key_path(left, KeyPathOptions::COLLECTION),
                    QueryNode::key_path(right, KeyPathOptions::QUANTIFIED),
                    StringOptions::NONE,
                );
                let rejected = matches!(result, Err(Error::CollectionComparison { .. }));
                prop_assert!(rejected);
            }
        }
    }
}

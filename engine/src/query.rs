//! Typed, fluent predicate builder.
//!
//! A [`Query<T>`] wraps a [`QueryNode`] together with the type of the value it
//! produces. Property access narrows `T`, and only the operations legal for
//! `T` are available:
//!
//! ```
//! use quarry_engine::{persisted_object, List, Query};
//!
//! struct Person;
//! struct Dog;
//! persisted_object!(Person, Dog);
//!
//! let person = Query::<Person>::root();
//! let adult = person.property::<i64>("age").unwrap().ge(18);
//! let named = person
//!     .property::<String>("name")
//!     .unwrap()
//!     .starts_with("A", Default::default());
//! let dogs = person.property::<List<Dog>>("dogs").unwrap();
//! let old_dogs = dogs.element().property::<i64>("age").unwrap().gt(10).count().gt(1);
//!
//! let compiled = adult.and(named).unwrap().and(old_dogs).unwrap().compile().unwrap();
//! assert_eq!(
//!     compiled.filter,
//!     "(((age >= %@) && (name BEGINSWITH %@)) && \
//!      (SUBQUERY(dogs, $col1, ($col1.age > %@)).@count > %@))"
//! );
//! ```

use crate::{
    compiler::{CompileOptions, CompiledPredicate, Compiler},
    error::Result,
    geo::{GeoPoint, GeoShape},
    node::Aggregate,
    persisted::{Comparable, Equatable, List, Map, Numeric, Object, Persisted, Set, StringLike, Textual},
    KeyPathOptions, ObjectRef, Operator, QueryNode, StringOptions, Value,
};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Range, RangeInclusive};

/// A predicate expression producing a value of type `T`.
pub struct Query<T> {
    node: QueryNode,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.node).finish()
    }
}

impl<T> Query<T> {
    /// The element being filtered. Renders as `SELF`.
    pub fn root() -> Self {
        Self::from_node(QueryNode::root())
    }

    /// Wrap an existing node. The caller vouches that it produces a `T`.
    pub fn from_node(node: QueryNode) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub fn node(&self) -> &QueryNode {
        &self.node
    }

    pub fn into_node(self) -> QueryNode {
        self.node
    }

    fn constant_comparison(&self, op: Operator, value: Value, options: StringOptions) -> Query<bool> {
        // A constant operand can never be a collection key path.
        Query::from_node(QueryNode::Comparison {
            op,
            lhs: Box::new(self.node.clone()),
            rhs: Box::new(QueryNode::Constant { value }),
            options,
        })
    }

    fn field_comparison<U>(&self, op: Operator, other: &Query<U>) -> Result<Query<bool>> {
        QueryNode::comparison(op, self.node.clone(), other.node.clone(), StringOptions::NONE)
            .map(Query::from_node)
    }

    fn aggregate<U>(&self, aggregate: Aggregate) -> Result<Query<U>> {
        self.node.append_aggregate(aggregate).map(Query::from_node)
    }
}

impl<T: Object> Query<T> {
    /// Traverse to a property of this object.
    ///
    /// Collection-typed properties flag the path as a collection; the flag
    /// carries over to every segment appended later.
    pub fn property<V: Persisted>(&self, name: &str) -> Result<Query<V>> {
        self.node
            .append_key_path(name, V::KEY_PATH_OPTIONS)
            .map(Query::from_node)
    }

    /// The link points at `object`.
    pub fn links_to(&self, object: ObjectRef) -> Query<bool> {
        self.constant_comparison(Operator::Equal, object.into(), StringOptions::NONE)
    }

    /// The link is not set.
    pub fn is_unlinked(&self) -> Query<bool> {
        self.constant_comparison(Operator::Equal, Value::Null, StringOptions::NONE)
    }
}

impl<T: Equatable> Query<T> {
    pub fn eq(&self, value: impl Into<T>) -> Query<bool> {
        self.constant_comparison(Operator::Equal, literal::<T, _>(value), StringOptions::NONE)
    }

    pub fn ne(&self, value: impl Into<T>) -> Query<bool> {
        self.constant_comparison(Operator::NotEqual, literal::<T, _>(value), StringOptions::NONE)
    }

    /// The value is one of `values`.
    pub fn in_list<I, V>(&self, values: I) -> Query<bool>
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        let list = Value::List(values.into_iter().map(literal::<T, V>).collect());
        self.constant_comparison(Operator::In, list, StringOptions::NONE)
    }

    pub fn eq_field(&self, other: &Query<T>) -> Result<Query<bool>> {
        self.field_comparison(Operator::Equal, other)
    }

    pub fn ne_field(&self, other: &Query<T>) -> Result<Query<bool>> {
        self.field_comparison(Operator::NotEqual, other)
    }
}

impl<T: Comparable> Query<T> {
    pub fn lt(&self, value: impl Into<T>) -> Query<bool> {
        self.constant_comparison(Operator::LessThan, literal::<T, _>(value), StringOptions::NONE)
    }

    pub fn le(&self, value: impl Into<T>) -> Query<bool> {
        self.constant_comparison(Operator::LessThanEqual, literal::<T, _>(value), StringOptions::NONE)
    }

    pub fn gt(&self, value: impl Into<T>) -> Query<bool> {
        self.constant_comparison(Operator::GreaterThan, literal::<T, _>(value), StringOptions::NONE)
    }

    pub fn ge(&self, value: impl Into<T>) -> Query<bool> {
        self.constant_comparison(Operator::GreaterThanEqual, literal::<T, _>(value), StringOptions::NONE)
    }

    pub fn lt_field(&self, other: &Query<T>) -> Result<Query<bool>> {
        self.field_comparison(Operator::LessThan, other)
    }

    pub fn le_field(&self, other: &Query<T>) -> Result<Query<bool>> {
        self.field_comparison(Operator::LessThanEqual, other)
    }

    pub fn gt_field(&self, other: &Query<T>) -> Result<Query<bool>> {
        self.field_comparison(Operator::GreaterThan, other)
    }

    pub fn ge_field(&self, other: &Query<T>) -> Result<Query<bool>> {
        self.field_comparison(Operator::GreaterThanEqual, other)
    }

    /// Inclusive range test.
    pub fn between(&self, lower: impl Into<T>, upper: impl Into<T>) -> Query<bool> {
        Query::from_node(QueryNode::between(
            self.node.clone(),
            QueryNode::constant(literal::<T, _>(lower)),
            QueryNode::constant(literal::<T, _>(upper)),
        ))
    }

    /// `a..b` tests `>= a && < b`; `a..=b` becomes a `BETWEEN`.
    pub fn in_range(&self, range: impl QueryRange<T>) -> Query<bool> {
        match range.into_bounds() {
            Bounds::HalfOpen(lower, upper) => Query::from_node(QueryNode::Comparison {
                op: Operator::And,
                lhs: Box::new(self.ge(lower).into_node()),
                rhs: Box::new(self.lt(upper).into_node()),
                options: StringOptions::NONE,
            }),
            Bounds::Closed(lower, upper) => self.between(lower, upper),
        }
    }
}

impl<T: Numeric> Query<T> {
    /// Minimum across the collection this path traverses.
    pub fn min(&self) -> Result<Query<T>> {
        self.aggregate(Aggregate::Min)
    }

    pub fn max(&self) -> Result<Query<T>> {
        self.aggregate(Aggregate::Max)
    }

    pub fn avg(&self) -> Result<Query<T>> {
        self.aggregate(Aggregate::Avg)
    }

    pub fn sum(&self) -> Result<Query<T>> {
        self.aggregate(Aggregate::Sum)
    }
}

impl<T: StringLike> Query<T> {
    pub fn contains(&self, value: impl Into<T>, options: StringOptions) -> Query<bool> {
        self.constant_comparison(Operator::Contains, literal::<T, _>(value), options)
    }

    pub fn starts_with(&self, value: impl Into<T>, options: StringOptions) -> Query<bool> {
        self.constant_comparison(Operator::BeginsWith, literal::<T, _>(value), options)
    }

    pub fn ends_with(&self, value: impl Into<T>, options: StringOptions) -> Query<bool> {
        self.constant_comparison(Operator::EndsWith, literal::<T, _>(value), options)
    }

    pub fn equals(&self, value: impl Into<T>, options: StringOptions) -> Query<bool> {
        self.constant_comparison(Operator::Equal, literal::<T, _>(value), options)
    }

    pub fn not_equals(&self, value: impl Into<T>, options: StringOptions) -> Query<bool> {
        self.constant_comparison(Operator::NotEqual, literal::<T, _>(value), options)
    }
}

impl<T: Textual> Query<T> {
    /// Wildcard match: `?` matches one character, `*` any run.
    pub fn like(&self, pattern: impl Into<T>, case_insensitive: bool) -> Query<bool> {
        let options = if case_insensitive {
            StringOptions::CASE_INSENSITIVE
        } else {
            StringOptions::NONE
        };
        self.constant_comparison(Operator::Like, literal::<T, _>(pattern), options)
    }
}

impl<T: Persisted> Query<Option<T>> {
    pub fn is_null(&self) -> Query<bool> {
        self.constant_comparison(Operator::Equal, Value::Null, StringOptions::NONE)
    }

    pub fn is_not_null(&self) -> Query<bool> {
        self.constant_comparison(Operator::NotEqual, Value::Null, StringOptions::NONE)
    }
}

impl Query<bool> {
    pub fn and(self, other: Query<bool>) -> Result<Query<bool>> {
        QueryNode::comparison(Operator::And, self.node, other.node, StringOptions::NONE)
            .map(Query::from_node)
    }

    pub fn or(self, other: Query<bool>) -> Result<Query<bool>> {
        QueryNode::comparison(Operator::Or, self.node, other.node, StringOptions::NONE)
            .map(Query::from_node)
    }

    /// Number of collection elements matching this predicate.
    ///
    /// The predicate must reference exactly one collection; the compiler
    /// rejects it otherwise.
    pub fn count(self) -> Query<i64> {
        Query::from_node(QueryNode::subquery_count(self.node))
    }

    pub fn compile(&self) -> Result<CompiledPredicate> {
        Compiler::default().compile(&self.node)
    }

    pub fn compile_with(&self, options: CompileOptions) -> Result<CompiledPredicate> {
        Compiler::new(options).compile(&self.node)
    }
}

impl std::ops::Not for Query<bool> {
    type Output = Query<bool>;

    fn not(self) -> Query<bool> {
        Query::from_node(QueryNode::not(self.node))
    }
}

macro_rules! collection_queries {
    ($($collection:ident),*) => {
        $(
            impl<T: Persisted> Query<$collection<T>> {
                /// Address the elements; comparisons match when any element does.
                pub fn element(&self) -> Query<T> {
                    Query::from_node(self.node.quantified())
                }

                pub fn count(&self) -> Result<Query<i64>> {
                    self.aggregate(Aggregate::Count)
                }
            }

            impl<T: Equatable> Query<$collection<T>> {
                /// The collection holds `value`.
                pub fn contains_value(&self, value: impl Into<T>) -> Query<bool> {
                    Query::from_node(QueryNode::Comparison {
                        op: Operator::In,
                        lhs: Box::new(QueryNode::constant(literal::<T, _>(value))),
                        rhs: Box::new(self.node.clone()),
                        options: StringOptions::NONE,
                    })
                }

                /// The collection holds at least one of `values`.
                pub fn contains_any_in<I, V>(&self, values: I) -> Query<bool>
                where
                    I: IntoIterator<Item = V>,
                    V: Into<T>,
                {
                    let list = Value::List(values.into_iter().map(literal::<T, V>).collect());
                    self.element().constant_comparison(Operator::In, list, StringOptions::NONE)
                }
            }
        )*
    };
}

collection_queries!(List, Set);

impl<V: Persisted> Query<Map<V>> {
    /// The entry stored under `key`.
    pub fn get(&self, key: impl Into<String>) -> Query<V> {
        Query::from_node(QueryNode::map_subscript(self.node.clone(), key.into()))
    }

    pub fn keys(&self) -> Result<Query<String>> {
        self.node
            .append_key_path("@allKeys", KeyPathOptions::QUANTIFIED)
            .map(Query::from_node)
    }

    pub fn values(&self) -> Result<Query<V>> {
        self.node
            .append_key_path("@allValues", KeyPathOptions::QUANTIFIED)
            .map(Query::from_node)
    }

    pub fn count(&self) -> Result<Query<i64>> {
        self.aggregate(Aggregate::Count)
    }
}

impl<V: Equatable> Query<Map<V>> {
    /// Some entry of the map holds `value`.
    pub fn contains_value(&self, value: impl Into<V>) -> Query<bool> {
        Query::from_node(QueryNode::Comparison {
            op: Operator::In,
            lhs: Box::new(QueryNode::constant(literal::<V, _>(value))),
            rhs: Box::new(self.node.clone()),
            options: StringOptions::NONE,
        })
    }
}

impl Query<GeoPoint> {
    /// The location lies within `shape`.
    pub fn geo_within(&self, shape: impl Into<GeoShape>) -> Query<bool> {
        Query::from_node(QueryNode::geo_within(
            self.node.clone(),
            QueryNode::constant(Value::Geo(shape.into())),
        ))
    }
}

/// Ranges accepted by [`Query::in_range`].
pub trait QueryRange<T> {
    fn into_bounds(self) -> Bounds<T>;
}

/// Bounds of a range test.
pub enum Bounds<T> {
    HalfOpen(T, T),
    Closed(T, T),
}

impl<T> QueryRange<T> for Range<T> {
    fn into_bounds(self) -> Bounds<T> {
        Bounds::HalfOpen(self.start, self.end)
    }
}

impl<T> QueryRange<T> for RangeInclusive<T> {
    fn into_bounds(self) -> Bounds<T> {
        let (start, end) = self.into_inner();
        Bounds::Closed(start, end)
    }
}

/// Convert through the tracked type so `T`'s conversion rules apply.
fn literal<T: Into<Value>, V: Into<T>>(value: V) -> Value {
    let typed: T = value.into();
    typed.into()
}

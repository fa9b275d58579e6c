//! # Quarry Engine
//!
//! A typed predicate builder and compiler for embedded object stores.
//!
//! Calling code describes the objects it wants as a strongly-typed boolean
//! expression. The engine compiles it into a parameterized filter string and
//! a positional argument list, which a separate query-execution engine runs
//! against the store.
//!
//! ## Design Principles
//!
//! - **No IO**: The engine never touches storage; it only produces filters
//! - **Deterministic**: The same tree always compiles to the same output
//! - **Checked early**: Invalid shapes fail when built, not when executed
//! - **Portable**: Runs anywhere Rust runs, with a C boundary for bindings
//!
//! ## Core Concepts
//!
//! ### Values
//!
//! A [`Value`] is a literal operand: numbers, strings, binary, timestamps,
//! decimals, UUIDs, object references, geo shapes and lists of those.
//! [`Value::Null`] is a NaN-like sentinel that never equals anything.
//!
//! ### Node Tree
//!
//! A [`QueryNode`] is an immutable, unevaluated predicate: key paths,
//! constants, comparisons, negation, ranges, subquery counts, map subscripts
//! and geospatial containment.
//!
//! ### Typed Builder
//!
//! [`Query<T>`] tracks the type a key path produces, so only legal operations
//! are offered: ordering on [`Comparable`] types, `contains` on
//! [`StringLike`] types, aggregates on [`Numeric`] types, and `&&`/`||` on
//! booleans.
//!
//! ### Compiler
//!
//! The [`Compiler`] walks a tree once and emits a [`CompiledPredicate`].
//! Subqueries are re-rooted at bound variables by [`rewrite_subquery`].
//!
//! ## Quick Start
//!
//! ```rust
//! use quarry_engine::{persisted_object, List, Query, Value};
//!
//! struct Person;
//! struct Dog;
//! persisted_object!(Person, Dog);
//!
//! let person = Query::<Person>::root();
//! let age = person.property::<i64>("age").unwrap();
//! let dogs = person.property::<List<Dog>>("dogs").unwrap();
//!
//! let predicate = age
//!     .in_range(18..65)
//!     .and(dogs.element().property::<String>("name").unwrap().eq("Rex"))
//!     .unwrap();
//!
//! let compiled = predicate.compile().unwrap();
//! assert_eq!(
//!     compiled.filter,
//!     "(((age >= %@) && (age < %@)) && (ANY dogs.name == %@))"
//! );
//! assert_eq!(
//!     compiled.arguments,
//!     vec![Value::Int(18), Value::Int(65), Value::from("Rex")]
//! );
//! ```
//!
//! ## Schemas
//!
//! A [`Schema`] maps public property names to persisted names and derives
//! collection flags for untyped trees, such as those read from JSON
//! [`PredicateDocument`]s.
//!
//! ## FFI
//!
//! The [`ffi`] module provides C-compatible functions for use from other
//! languages. All data is exchanged as JSON strings.

pub mod compiler;
pub mod document;
pub mod error;
pub mod ffi;
pub mod geo;
pub mod node;
pub mod persisted;
pub mod query;
pub mod rewrite;
pub mod schema;
pub mod value;

// Re-export main types at crate root
pub use compiler::{compile, CompileOptions, CompiledPredicate, Compiler, Placeholder};
pub use document::PredicateDocument;
pub use error::{Error, ValueParseError};
pub use geo::{Distance, GeoBox, GeoCircle, GeoPoint, GeoPolygon, GeoShape};
pub use node::{Aggregate, KeyPathOptions, Operator, QueryNode, StringOptions};
pub use persisted::{
    Comparable, Equatable, List, Map, Numeric, Object, Persisted, Set, StringLike, Textual,
};
pub use query::{Bounds, Query, QueryRange};
pub use rewrite::rewrite_subquery;
pub use schema::{
    CollectionKind, ObjectSchema, PropertyDef, PropertyType, ResolvedKeyPath, Schema,
};
pub use value::{AnyValue, ObjectRef, Value};

/// Type aliases for clarity
pub type ClassName = String;
pub type SchemaVersion = u32;

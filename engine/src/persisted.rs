//! Marker traits describing what a property type allows in a predicate.
//!
//! [`Query<T>`](crate::Query) exposes an operation only when `T` carries the
//! matching marker, so asking for `starts_with` on an integer property or an
//! ordering comparison on a boolean does not compile.

use crate::{geo::GeoPoint, KeyPathOptions, ObjectRef, Value};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use uuid::Uuid;

/// Any type a property can have.
pub trait Persisted {
    /// Flags a key path gains when it passes through a property of this type.
    const KEY_PATH_OPTIONS: KeyPathOptions = KeyPathOptions::NONE;
}

/// Supports `==`, `!=` and `IN`.
pub trait Equatable: Persisted + Into<Value> {}

/// Supports ordering comparisons and range tests.
pub trait Comparable: Equatable {}

/// Supports `@min`, `@max`, `@avg` and `@sum` across a collection.
pub trait Numeric: Comparable {}

/// Supports `CONTAINS`, `BEGINSWITH`, `ENDSWITH` and string-option equality.
pub trait StringLike: Equatable {}

/// Supports `LIKE`.
pub trait Textual: StringLike {}

/// A model type whose properties can be traversed.
///
/// Implement it (together with [`Persisted`]) with [`persisted_object!`](crate::persisted_object).
pub trait Object: Persisted {}

/// To-many list property.
pub struct List<T>(PhantomData<fn() -> T>);

/// To-many set property.
pub struct Set<T>(PhantomData<fn() -> T>);

/// String-keyed map property.
pub struct Map<V>(PhantomData<fn() -> V>);

impl<T: Persisted> Persisted for List<T> {
    const KEY_PATH_OPTIONS: KeyPathOptions = KeyPathOptions::COLLECTION;
}

impl<T: Persisted> Persisted for Set<T> {
    const KEY_PATH_OPTIONS: KeyPathOptions = KeyPathOptions::COLLECTION;
}

impl<V: Persisted> Persisted for Map<V> {
    const KEY_PATH_OPTIONS: KeyPathOptions = KeyPathOptions::COLLECTION;
}

impl<T: Persisted> Persisted for Option<T> {
    const KEY_PATH_OPTIONS: KeyPathOptions = T::KEY_PATH_OPTIONS;
}

impl<T: Equatable> Equatable for Option<T> {}
impl<T: Comparable> Comparable for Option<T> {}
impl<T: Numeric> Numeric for Option<T> {}
impl<T: StringLike> StringLike for Option<T> {}
impl<T: Textual> Textual for Option<T> {}

impl Persisted for GeoPoint {}

macro_rules! persisted {
    ($($t:ty => [$($marker:ident),*]);* $(;)?) => {
        $(
            impl Persisted for $t {}
            $(impl $marker for $t {})*
        )*
    };
}

persisted! {
    i8 => [Equatable, Comparable, Numeric];
    i16 => [Equatable, Comparable, Numeric];
    i32 => [Equatable, Comparable, Numeric];
    i64 => [Equatable, Comparable, Numeric];
    f32 => [Equatable, Comparable, Numeric];
    f64 => [Equatable, Comparable, Numeric];
    Decimal => [Equatable, Comparable, Numeric];
    DateTime<Utc> => [Equatable, Comparable];
    bool => [Equatable];
    String => [Equatable, StringLike, Textual];
    Vec<u8> => [Equatable, StringLike];
    Uuid => [Equatable];
    ObjectRef => [Equatable];
    // Mixed properties accept every operation; the engine checks types at runtime.
    Value => [Equatable, Comparable, Numeric, StringLike, Textual];
}

/// Declare model types usable as [`Query`](crate::Query) roots and link targets.
///
/// ```
/// use quarry_engine::{persisted_object, Query};
///
/// struct Person;
/// struct Dog;
/// persisted_object!(Person, Dog);
///
/// let age = Query::<Person>::root().property::<i64>("age").unwrap();
/// assert_eq!(age.gt(21).compile().unwrap().filter, "(age > %@)");
/// ```
#[macro_export]
macro_rules! persisted_object {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::Persisted for $t {}
            impl $crate::Object for $t {}
        )+
    };
}

//! Object schema and key path resolution.
//!
//! Predicates are written against public property names. A schema maps them
//! to the names the store persists, follows links between object types and
//! derives the collection flags every key path needs.

use crate::{error::Result, ClassName, Error, KeyPathOptions, QueryNode, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Property types supported in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Bool,
    Int,
    Float,
    Double,
    String,
    Data,
    Date,
    Decimal,
    Uuid,
    /// Any persisted value
    Mixed,
    /// Link to another object type
    Object,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::Bool => write!(f, "Bool"),
            PropertyType::Int => write!(f, "Int"),
            PropertyType::Float => write!(f, "Float"),
            PropertyType::Double => write!(f, "Double"),
            PropertyType::String => write!(f, "String"),
            PropertyType::Data => write!(f, "Data"),
            PropertyType::Date => write!(f, "Date"),
            PropertyType::Decimal => write!(f, "Decimal"),
            PropertyType::Uuid => write!(f, "UUID"),
            PropertyType::Mixed => write!(f, "Mixed"),
            PropertyType::Object => write!(f, "Object"),
        }
    }
}

/// Kind of a to-many property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    List,
    Set,
    /// String-keyed dictionary
    Map,
}

/// Definition of a property of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDef {
    /// Name used in predicates
    pub name: String,
    /// Name stored by the engine, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted_name: Option<String>,
    /// Element type
    pub property_type: PropertyType,
    /// Set for to-many properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionKind>,
    /// Target object type of a link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<ClassName>,
    #[serde(default)]
    pub optional: bool,
}

impl PropertyDef {
    /// A single-valued property.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            persisted_name: None,
            property_type,
            collection: None,
            object_type: None,
            optional: false,
        }
    }

    pub fn list(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(name, property_type).in_collection(CollectionKind::List)
    }

    pub fn set(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(name, property_type).in_collection(CollectionKind::Set)
    }

    pub fn map(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(name, property_type).in_collection(CollectionKind::Map)
    }

    /// A to-one link. Links are always optional.
    pub fn link(name: impl Into<String>, object_type: impl Into<ClassName>) -> Self {
        Self {
            object_type: Some(object_type.into()),
            optional: true,
            ..Self::new(name, PropertyType::Object)
        }
    }

    /// A to-many link.
    pub fn link_list(name: impl Into<String>, object_type: impl Into<ClassName>) -> Self {
        Self {
            object_type: Some(object_type.into()),
            ..Self::list(name, PropertyType::Object)
        }
    }

    /// Store the property under a different name.
    pub fn persisted_as(mut self, persisted_name: impl Into<String>) -> Self {
        self.persisted_name = Some(persisted_name.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.optional = true;
        self
    }

    fn in_collection(mut self, kind: CollectionKind) -> Self {
        self.collection = Some(kind);
        self
    }

    pub fn persisted_name(&self) -> &str {
        self.persisted_name.as_deref().unwrap_or(&self.name)
    }

    /// Flags a key path gains when it passes through this property.
    pub fn key_path_options(&self) -> KeyPathOptions {
        if self.collection.is_some() {
            KeyPathOptions::COLLECTION
        } else {
            KeyPathOptions::NONE
        }
    }
}

/// Schema for one object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    pub name: ClassName,
    pub properties: Vec<PropertyDef>,
}

impl ObjectSchema {
    pub fn new(name: impl Into<ClassName>, properties: Vec<PropertyDef>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Look a property up by its public name.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A key path translated to persisted names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKeyPath {
    pub segments: Vec<String>,
    pub options: KeyPathOptions,
    /// The last property on the path; `None` for the empty path
    pub property: Option<PropertyDef>,
}

/// Schema for every object type the predicates can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Schema version
    pub version: SchemaVersion,
    /// Object schemas by class name
    pub objects: HashMap<ClassName, ObjectSchema>,
}

impl Schema {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            objects: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: ObjectSchema) -> &mut Self {
        self.objects.insert(object.name.clone(), object);
        self
    }

    /// Builder-style method to add an object type.
    pub fn with_object(mut self, object: ObjectSchema) -> Self {
        self.add_object(object);
        self
    }

    pub fn get_object(&self, name: &str) -> Option<&ObjectSchema> {
        self.objects.get(name)
    }

    /// Check that every link targets a known object type.
    pub fn validate(&self) -> Result<()> {
        for object in self.objects.values() {
            for property in &object.properties {
                match (&property.property_type, &property.object_type) {
                    (PropertyType::Object, Some(target)) if !self.objects.contains_key(target) => {
                        return Err(Error::ClassNotFound(target.clone()));
                    }
                    (PropertyType::Object, None) => {
                        return Err(Error::NotALink {
                            class: object.name.clone(),
                            property: property.name.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Translate a key path on `class` to persisted names and flags.
    ///
    /// Segments starting with `@` (aggregates, `@allKeys`, `@allValues`) are
    /// kept verbatim. A path that continues past a to-many property needs an
    /// `ANY` quantifier unless an aggregate settles it.
    pub fn resolve_key_path<S: AsRef<str>>(
        &self,
        class: &str,
        segments: &[S],
    ) -> Result<ResolvedKeyPath> {
        let mut owner = self
            .get_object(class)
            .ok_or_else(|| Error::ClassNotFound(class.to_string()))?;
        let mut resolved = Vec::with_capacity(segments.len());
        let mut options = KeyPathOptions::NONE;
        let mut last: Option<&PropertyDef> = None;
        let mut aggregated = false;

        for segment in segments.iter().map(AsRef::as_ref) {
            if segment.starts_with('@') {
                aggregated |= is_aggregate(segment);
                resolved.push(segment.to_string());
                continue;
            }

            if let Some(previous) = last {
                let target = previous.object_type.as_deref().ok_or_else(|| Error::NotALink {
                    class: owner.name.clone(),
                    property: previous.name.clone(),
                })?;
                if previous.collection.is_some() {
                    options.requires_any = true;
                }
                owner = self
                    .get_object(target)
                    .ok_or_else(|| Error::ClassNotFound(target.to_string()))?;
            }

            let property = owner.property(segment).ok_or_else(|| Error::PropertyNotFound {
                class: owner.name.clone(),
                property: segment.to_string(),
            })?;
            resolved.push(property.persisted_name().to_string());
            options = options.union(property.key_path_options());
            last = Some(property);
        }

        if aggregated {
            options.requires_any = false;
        }

        Ok(ResolvedKeyPath {
            segments: resolved,
            options,
            property: last.cloned(),
        })
    }

    /// Resolve every key path of a predicate on `class`.
    ///
    /// An `ANY` quantifier already set on a path is kept unless the path
    /// contains an aggregate.
    pub fn resolve_node(&self, class: &str, node: &QueryNode) -> Result<QueryNode> {
        let resolve = |n: &QueryNode| self.resolve_node(class, n).map(Box::new);

        Ok(match node {
            QueryNode::KeyPath { segments, options } => {
                let resolved = self.resolve_key_path(class, segments.as_slice())?;
                let aggregated = segments.iter().any(|s| is_aggregate(s));
                let mut merged = resolved.options.union(*options);
                if aggregated {
                    merged.requires_any = false;
                }
                QueryNode::KeyPath {
                    segments: resolved.segments,
                    options: merged,
                }
            }
            QueryNode::Constant { .. } => node.clone(),
            QueryNode::Not { child } => QueryNode::Not {
                child: resolve(child)?,
            },
            QueryNode::Comparison {
                op,
                lhs,
                rhs,
                options,
            } => {
                let lhs = self.resolve_node(class, lhs)?;
                let rhs = self.resolve_node(class, rhs)?;
                QueryNode::comparison(*op, lhs, rhs, *options)?
            }
            QueryNode::Between {
                subject,
                lower,
                upper,
            } => QueryNode::Between {
                subject: resolve(subject)?,
                lower: resolve(lower)?,
                upper: resolve(upper)?,
            },
            QueryNode::SubqueryCount { inner } => QueryNode::SubqueryCount {
                inner: resolve(inner)?,
            },
            QueryNode::MapSubscript { key_path, key } => QueryNode::MapSubscript {
                key_path: resolve(key_path)?,
                key: key.clone(),
            },
            QueryNode::GeoWithin { key_path, shape } => QueryNode::GeoWithin {
                key_path: resolve(key_path)?,
                shape: resolve(shape)?,
            },
        })
    }
}

fn is_aggregate(segment: &str) -> bool {
    matches!(segment, "@min" | "@max" | "@avg" | "@sum" | "@count")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, Operator, StringOptions};
    use serde_json::json;

    fn test_schema() -> Schema {
        Schema::new(1)
            .with_object(ObjectSchema::new(
                "Person",
                vec![
                    PropertyDef::new("name", PropertyType::String),
                    PropertyDef::new("age", PropertyType::Int).persisted_as("_age"),
                    PropertyDef::new("isActive", PropertyType::Bool),
                    PropertyDef::list("scores", PropertyType::Int),
                    PropertyDef::map("ratings", PropertyType::Double),
                    PropertyDef::link("bestFriend", "Dog"),
                    PropertyDef::link_list("dogs", "Dog"),
                ],
            ))
            .with_object(ObjectSchema::new(
                "Dog",
                vec![
                    PropertyDef::new("name", PropertyType::String),
                    PropertyDef::new("age", PropertyType::Int),
                    PropertyDef::link("owner", "Person"),
                ],
            ))
    }

    fn path(segments: &[&str], options: KeyPathOptions) -> QueryNode {
        QueryNode::key_path(segments.iter().copied(), options)
    }

    #[test]
    fn resolve_plain_and_persisted_names() {
        let schema = test_schema();

        let name = schema.resolve_key_path("Person", &["name"]).unwrap();
        assert_eq!(name.segments, vec!["name"]);
        assert_eq!(name.options, KeyPathOptions::NONE);
        assert_eq!(name.property.unwrap().property_type, PropertyType::String);

        let age = schema.resolve_key_path("Person", &["age"]).unwrap();
        assert_eq!(age.segments, vec!["_age"]);
    }

    #[test]
    fn resolve_through_links() {
        let schema = test_schema();

        let owner = schema
            .resolve_key_path("Person", &["bestFriend", "owner", "age"])
            .unwrap();
        assert_eq!(owner.segments, vec!["bestFriend", "owner", "_age"]);
        assert_eq!(owner.options, KeyPathOptions::NONE);

        let dog_names = schema.resolve_key_path("Person", &["dogs", "name"]).unwrap();
        assert_eq!(dog_names.options, KeyPathOptions::QUANTIFIED);

        let dogs = schema.resolve_key_path("Person", &["dogs"]).unwrap();
        assert_eq!(dogs.options, KeyPathOptions::COLLECTION);
    }

    #[test]
    fn aggregates_pass_through() {
        let schema = test_schema();

        let avg = schema
            .resolve_key_path("Person", &["dogs", "@avg", "age"])
            .unwrap();
        assert_eq!(avg.segments, vec!["dogs", "@avg", "age"]);
        assert_eq!(avg.options, KeyPathOptions::COLLECTION);

        let keys = schema
            .resolve_key_path("Person", &["ratings", "@allKeys"])
            .unwrap();
        assert_eq!(keys.options, KeyPathOptions::COLLECTION);
    }

    #[test]
    fn resolve_errors() {
        let schema = test_schema();

        let result = schema.resolve_key_path("Cat", &["name"]);
        assert!(matches!(result, Err(Error::ClassNotFound(c)) if c == "Cat"));

        let result = schema.resolve_key_path("Person", &["height"]);
        assert!(
            matches!(result, Err(Error::PropertyNotFound { class, property }) if class == "Person" && property == "height")
        );

        let result = schema.resolve_key_path("Person", &["name", "length"]);
        assert!(matches!(result, Err(Error::NotALink { property, .. }) if property == "name"));
    }

    #[test]
    fn resolve_node_rewrites_tree() {
        let schema = test_schema();
        let node = QueryNode::comparison(
            Operator::And,
            QueryNode::comparison(
                Operator::GreaterThan,
                path(&["age"], KeyPathOptions::NONE),
                QueryNode::constant(18),
                StringOptions::NONE,
            )
            .unwrap(),
            QueryNode::comparison(
                Operator::Equal,
                path(&["dogs", "name"], KeyPathOptions::NONE),
                QueryNode::constant("Rex"),
                StringOptions::NONE,
            )
            .unwrap(),
            StringOptions::NONE,
        )
        .unwrap();

        let resolved = schema.resolve_node("Person", &node).unwrap();
        assert_eq!(
            compile(&resolved).unwrap().filter,
            "((_age > %@) && (ANY dogs.name == %@))"
        );
    }

    #[test]
    fn resolve_node_keeps_subquery_shape() {
        let schema = test_schema();
        let inner = QueryNode::comparison(
            Operator::GreaterThan,
            path(&["dogs", "age"], KeyPathOptions::NONE),
            QueryNode::constant(3),
            StringOptions::NONE,
        )
        .unwrap();
        let node = QueryNode::comparison(
            Operator::GreaterThanEqual,
            QueryNode::subquery_count(inner),
            QueryNode::constant(2),
            StringOptions::NONE,
        )
        .unwrap();

        let resolved = schema.resolve_node("Person", &node).unwrap();
        assert_eq!(
            compile(&resolved).unwrap().filter,
            "(SUBQUERY(dogs, $col1, ($col1.age > %@)).@count >= %@)"
        );
    }

    #[test]
    fn resolve_node_detects_collection_comparison() {
        let schema = test_schema();
        let node = QueryNode::Comparison {
            op: Operator::Equal,
            lhs: Box::new(path(&["scores"], KeyPathOptions::NONE)),
            rhs: Box::new(path(&["dogs", "age"], KeyPathOptions::NONE)),
            options: StringOptions::NONE,
        };
        let result = schema.resolve_node("Person", &node);
        assert!(matches!(result, Err(Error::CollectionComparison { .. })));
    }

    #[test]
    fn validate_links() {
        assert!(test_schema().validate().is_ok());

        let dangling = test_schema().with_object(ObjectSchema::new(
            "Cat",
            vec![PropertyDef::link("owner", "Human")],
        ));
        assert!(matches!(dangling.validate(), Err(Error::ClassNotFound(c)) if c == "Human"));
    }

    #[test]
    fn property_type_display() {
        assert_eq!(PropertyType::String.to_string(), "String");
        assert_eq!(PropertyType::Uuid.to_string(), "UUID");
        assert_eq!(PropertyType::Mixed.to_string(), "Mixed");
    }

    #[test]
    fn schema_serialization() {
        let schema = test_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn schema_from_minimal_json() {
        let schema: Schema = serde_json::from_value(json!({
            "version": 2,
            "objects": {
                "Person": {
                    "name": "Person",
                    "properties": [
                        {"name": "age", "propertyType": "int", "persistedName": "_age"},
                        {"name": "tags", "propertyType": "string", "collection": "set"}
                    ]
                }
            }
        }))
        .unwrap();

        let person = schema.get_object("Person").unwrap();
        assert_eq!(person.property("age").unwrap().persisted_name(), "_age");
        assert_eq!(
            person.property("tags").unwrap().collection,
            Some(CollectionKind::Set)
        );
        assert!(!person.property("age").unwrap().optional);
    }
}

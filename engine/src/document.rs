//! JSON predicate documents, the input format of the FFI and the CLI.
//!
//! ```json
//! {
//!   "class": "Person",
//!   "placeholder": "positional",
//!   "predicate": {"kind": "comparison", "op": "greaterThan", ...}
//! }
//! ```

use crate::{
    compiler::{CompileOptions, CompiledPredicate, Compiler, Placeholder},
    error::Result,
    ClassName, Error, QueryNode, Schema,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PredicateDocument {
    /// Object type the predicate filters; required when a schema is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassName>,
    /// Overrides the caller's default placeholder style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
    pub predicate: QueryNode,
}

impl PredicateDocument {
    pub fn new(predicate: QueryNode) -> Self {
        Self {
            class: None,
            placeholder: None,
            predicate,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Resolve against `schema` when given, then compile.
    pub fn compile(&self, schema: Option<&Schema>, defaults: CompileOptions) -> Result<CompiledPredicate> {
        let options = CompileOptions {
            placeholder: self.placeholder.unwrap_or(defaults.placeholder),
        };

        match schema {
            Some(schema) => {
                let class = self.class.as_deref().ok_or_else(|| {
                    Error::InvalidDocument("a document compiled against a schema must name its class".into())
                })?;
                debug!(class, "resolving predicate against schema");
                let resolved = schema.resolve_node(class, &self.predicate)?;
                Compiler::new(options).compile(&resolved)
            }
            None => Compiler::new(options).compile(&self.predicate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectSchema, PropertyDef, PropertyType, Value};
    use serde_json::json;

    fn document() -> String {
        json!({
            "class": "Person",
            "predicate": {
                "kind": "comparison",
                "op": "greaterThan",
                "lhs": {"kind": "keyPath", "segments": ["age"]},
                "rhs": {"kind": "constant", "value": {"type": "int", "value": 21}}
            }
        })
        .to_string()
    }

    #[test]
    fn compile_without_schema() {
        let doc = PredicateDocument::from_json(&document()).unwrap();
        let compiled = doc.compile(None, CompileOptions::default()).unwrap();
        assert_eq!(compiled.filter, "(age > %@)");
        assert_eq!(compiled.arguments, vec![Value::Int(21)]);
    }

    #[test]
    fn compile_with_schema() {
        let schema = Schema::new(1).with_object(ObjectSchema::new(
            "Person",
            vec![PropertyDef::new("age", PropertyType::Int).persisted_as("years")],
        ));
        let doc = PredicateDocument::from_json(&document()).unwrap();
        let compiled = doc.compile(Some(&schema), CompileOptions::positional()).unwrap();
        assert_eq!(compiled.filter, "(years > $0)");
    }

    #[test]
    fn document_placeholder_wins() {
        let mut doc = PredicateDocument::from_json(&document()).unwrap();
        doc.placeholder = Some(Placeholder::Positional);
        let compiled = doc.compile(None, CompileOptions::default()).unwrap();
        assert_eq!(compiled.filter, "(age > $0)");
    }

    #[test]
    fn schema_requires_class() {
        let mut doc = PredicateDocument::from_json(&document()).unwrap();
        doc.class = None;
        let result = doc.compile(Some(&Schema::new(1)), CompileOptions::default());
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            PredicateDocument::from_json("{"),
            Err(Error::InvalidDocument(_))
        ));
        assert!(matches!(
            PredicateDocument::from_json(r#"{"predicate": {"kind": "bogus"}}"#),
            Err(Error::InvalidDocument(_))
        ));
        assert!(matches!(
            PredicateDocument::from_json(r#"{"predicate": {"kind": "constant", "value": {"type": "int", "value": 1}}, "extra": 1}"#),
            Err(Error::InvalidDocument(_))
        ));
    }
}

//! OpenAPI document model.
//!
//! Only the parts that drive request resolution and response synthesis are
//! modelled; everything else in the document is ignored on deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A loaded (and dereferenced) OpenAPI description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// OpenAPI version; absent for Swagger 2.0 documents
    #[serde(default)]
    pub openapi: Option<String>,

    /// Swagger version, kept only to tell the two formats apart
    #[serde(default)]
    pub swagger: Option<String>,

    /// Base URLs the API is served from
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Path templates to per-method operations, in declaration order
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
}

impl Document {
    /// Whether this is an OpenAPI 3.x document (the only kind that resolves requests).
    pub fn is_openapi(&self) -> bool {
        self.openapi.is_some()
    }
}

/// A server entry as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Operations available on a single path template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub put: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
    #[serde(default)]
    pub delete: Option<Operation>,
    #[serde(default)]
    pub options: Option<Operation>,
    #[serde(default)]
    pub head: Option<Operation>,
    #[serde(default)]
    pub patch: Option<Operation>,
    #[serde(default)]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Look up the operation for a lower-cased HTTP method.
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        match method {
            "get" => self.get.as_ref(),
            "put" => self.put.as_ref(),
            "post" => self.post.as_ref(),
            "delete" => self.delete.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            "patch" => self.patch.as_ref(),
            "trace" => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// A method-scoped operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, rename = "operationId")]
    pub operation_id: Option<String>,

    /// Deprecated operations never match
    #[serde(default)]
    pub deprecated: bool,

    /// Status code key (`200`, `4XX`, `default`) to response
    #[serde(default)]
    pub responses: IndexMap<String, ResponseSpec>,
}

/// A single declared response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub description: String,

    /// Media type to body definition, in declaration order
    #[serde(default)]
    pub content: Option<IndexMap<String, MediaType>>,
}

impl ResponseSpec {
    /// The first declared media type, if any.
    pub fn first_content(&self) -> Option<(&str, &MediaType)> {
        self.content
            .as_ref()
            .and_then(|content| content.first())
            .map(|(name, media)| (name.as_str(), media))
    }
}

/// Body definition for one media type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub example: Option<serde_json::Value>,
    #[serde(default)]
    pub examples: Option<serde_json::Value>,
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// The subset of JSON schema used for synthesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, rename = "type")]
    pub schema_type: Option<SchemaType>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub items: Option<Box<Schema>>,
    #[serde(default)]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(default)]
    pub xml: Option<XmlObject>,
    #[serde(default)]
    pub example: Option<serde_json::Value>,
}

/// `type` is a single name in 3.0 and may be a list in 3.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// The type used for synthesis: the first non-`null` entry.
    pub fn primary(&self) -> Option<&str> {
        match self {
            SchemaType::Single(name) => Some(name.as_str()),
            SchemaType::Multiple(names) => names
                .iter()
                .map(String::as_str)
                .find(|name| *name != "null"),
        }
    }
}

/// XML serialization hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XmlObject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attribute: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let yaml = r#"
openapi: 3.0.0
servers:
  - url: https://petstore.swagger.io/v2
paths:
  /pet/{petId}:
    get:
      operationId: getPetById
      responses:
        "200":
          description: successful operation
          content:
            application/xml:
              schema:
                type: object
            application/json:
              schema:
                type: object
        "404":
          description: Pet not found
    delete:
      deprecated: true
      responses:
        "400":
          description: Invalid ID supplied
"#;
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert!(doc.is_openapi());
        assert_eq!(doc.servers[0].url, "https://petstore.swagger.io/v2");

        let item = &doc.paths["/pet/{petId}"];
        let get = item.operation("get").unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("getPetById"));
        assert_eq!(get.responses.keys().collect::<Vec<_>>(), ["200", "404"]);
        assert_eq!(get.responses["200"].first_content().unwrap().0, "application/xml");
        assert!(get.responses["404"].first_content().is_none());

        assert!(item.operation("delete").unwrap().deprecated);
        assert!(item.operation("post").is_none());
    }

    #[test]
    fn test_swagger_document_is_not_openapi() {
        let doc: Document = serde_yaml::from_str("swagger: '2.0'\npaths: {}\n").unwrap();
        assert!(!doc.is_openapi());
    }

    #[test]
    fn test_schema_type_primary() {
        let schema: Schema = serde_yaml::from_str("type: [\"null\", integer]").unwrap();
        assert_eq!(schema.schema_type.unwrap().primary(), Some("integer"));

        let schema: Schema = serde_yaml::from_str("type: string\nxml:\n  attribute: true").unwrap();
        assert_eq!(schema.schema_type.unwrap().primary(), Some("string"));
        assert!(schema.xml.unwrap().attribute);
    }
}

//! Response body synthesis from examples and schemas.

use crate::document::{MediaType, Schema};
use crate::error::{MockError, Result};
use crate::generator::Generator;
use serde_json::{Map, Number, Value};

/// Generated arrays hold between this many items...
pub const MIN_ARRAY_ITEMS: i64 = 2;
/// ...and this many, inclusive.
pub const MAX_ARRAY_ITEMS: i64 = 7;

/// Key prefix marking an XML attribute in a synthesized object.
pub const ATTRIBUTE_PREFIX: &str = "@_";

/// Produce a body value for a media type.
///
/// `examples` wins over `example`, which wins over the schema. `Ok(None)`
/// means the definition yields no value at all (e.g. an untyped schema);
/// callers must tolerate it.
pub fn synthesize(media: &MediaType, generator: &dyn Generator) -> Result<Option<Value>> {
    if let Some(examples) = &media.examples {
        return Ok(Some(examples.clone()));
    }
    if let Some(example) = &media.example {
        return Ok(Some(example.clone()));
    }
    match &media.schema {
        Some(schema) => from_schema(schema, generator),
        None => Ok(None),
    }
}

/// Produce a value for a schema.
pub fn from_schema(schema: &Schema, generator: &dyn Generator) -> Result<Option<Value>> {
    if let Some(example) = &schema.example {
        return Ok(Some(example.clone()));
    }
    if let Some(values) = schema.enum_values.as_ref().filter(|v| !v.is_empty()) {
        let value = values
            .get(generator.index(values.len()))
            .ok_or_else(|| MockError::Synthesis("generator index out of range".to_string()))?;
        return Ok(Some(value.clone()));
    }

    let Some(schema_type) = schema.schema_type.as_ref().and_then(|t| t.primary()) else {
        return Ok(None);
    };

    let value = match schema_type {
        "boolean" => Value::Bool(generator.boolean()),
        "integer" => Value::from(generator.integer()),
        "number" => Number::from_f64(generator.double())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "string" => Value::String(match schema.format.as_deref() {
            Some("date") => generator.date(),
            Some("date-time") => format!("{}T{}Z", generator.date(), generator.time()),
            _ => generator.string(),
        }),
        "array" => {
            let items = schema
                .items
                .as_deref()
                .ok_or_else(|| MockError::Synthesis("array schema without items".to_string()))?;
            let count = generator.integer_between(MIN_ARRAY_ITEMS, MAX_ARRAY_ITEMS);
            let values = (0..count)
                .map(|_| from_schema(items, generator).map(|v| v.unwrap_or(Value::Null)))
                .collect::<Result<Vec<_>>>()?;
            Value::Array(values)
        }
        "object" => {
            let mut object = Map::new();
            for (name, property) in schema.properties.iter().flatten() {
                let is_attribute = property.xml.as_ref().is_some_and(|xml| xml.attribute);
                let key = if is_attribute {
                    format!("{ATTRIBUTE_PREFIX}{name}")
                } else {
                    name.clone()
                };
                // An undefined property is left out of the object entirely
                if let Some(value) = from_schema(property, generator)? {
                    object.insert(key, value);
                }
            }
            Value::Object(object)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RandomGenerator;
    use serde_json::json;

    fn media(yaml: &str) -> MediaType {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_examples_before_example_before_schema() {
        let generator = RandomGenerator::seeded(1);
        let both = media("examples: {a: {value: 1}}\nexample: {b: 2}\nschema: {type: integer}");
        assert_eq!(synthesize(&both, &generator).unwrap(), Some(json!({"a": {"value": 1}})));

        let example = media("example: {b: 2}\nschema: {type: integer}");
        assert_eq!(synthesize(&example, &generator).unwrap(), Some(json!({"b": 2})));

        let schema = media("schema: {type: string, example: doggie}");
        assert_eq!(synthesize(&schema, &generator).unwrap(), Some(json!("doggie")));
    }

    #[test]
    fn test_enum_choice() {
        let generator = RandomGenerator::seeded(5);
        let schema: Schema = serde_yaml::from_str("type: string\nenum: [available, pending, sold]").unwrap();
        for _ in 0..20 {
            let value = from_schema(&schema, &generator).unwrap().unwrap();
            assert!(["available", "pending", "sold"].contains(&value.as_str().unwrap()));
        }
    }

    /// Random values, except for an index past the end.
    struct PastTheEnd(RandomGenerator);

    impl Generator for PastTheEnd {
        fn boolean(&self) -> bool {
            self.0.boolean()
        }
        fn integer(&self) -> i64 {
            self.0.integer()
        }
        fn integer_between(&self, min: i64, max: i64) -> i64 {
            self.0.integer_between(min, max)
        }
        fn double(&self) -> f64 {
            self.0.double()
        }
        fn string(&self) -> String {
            self.0.string()
        }
        fn date(&self) -> String {
            self.0.date()
        }
        fn time(&self) -> String {
            self.0.time()
        }
        fn index(&self, len: usize) -> usize {
            len
        }
    }

    #[test]
    fn test_enum_with_bad_generator_index() {
        let generator = PastTheEnd(RandomGenerator::seeded(5));
        let schema: Schema = serde_yaml::from_str("type: string\nenum: [available, sold]").unwrap();
        let err = from_schema(&schema, &generator).unwrap_err();
        assert!(matches!(err, MockError::Synthesis(_)));
    }

    #[test]
    fn test_scalar_types() {
        let generator = RandomGenerator::seeded(9);
        let value = |yaml: &str| {
            let schema: Schema = serde_yaml::from_str(yaml).unwrap();
            from_schema(&schema, &generator).unwrap().unwrap()
        };

        assert!(value("type: boolean").is_boolean());
        assert!(value("type: integer").is_i64());
        assert!(value("type: number").is_f64());
        assert!(value("type: string").is_string());

        let date = value("type: string\nformat: date");
        assert_eq!(date.as_str().unwrap().len(), 10);

        let date_time = value("type: string\nformat: date-time");
        let text = date_time.as_str().unwrap();
        assert_eq!(text.len(), 20);
        assert_eq!(&text[10..11], "T");
        assert!(text.ends_with('Z'));
    }

    #[test]
    fn test_array_length() {
        let generator = RandomGenerator::seeded(2);
        let schema: Schema = serde_yaml::from_str("type: array\nitems: {type: integer}").unwrap();
        for _ in 0..20 {
            let value = from_schema(&schema, &generator).unwrap().unwrap();
            let len = value.as_array().unwrap().len() as i64;
            assert!((MIN_ARRAY_ITEMS..=MAX_ARRAY_ITEMS).contains(&len));
        }
    }

    #[test]
    fn test_array_without_items_fails() {
        let generator = RandomGenerator::seeded(2);
        let schema: Schema = serde_yaml::from_str("type: array").unwrap();
        assert!(matches!(
            from_schema(&schema, &generator),
            Err(MockError::Synthesis(_))
        ));
    }

    #[test]
    fn test_object_with_xml_attribute() {
        let generator = RandomGenerator::seeded(4);
        let schema: Schema = serde_yaml::from_str(
            r#"
type: object
properties:
  id:
    type: integer
    xml:
      attribute: true
  name:
    type: string
    example: doggie
  untyped: {}
"#,
        )
        .unwrap();
        let value = from_schema(&schema, &generator).unwrap().unwrap();
        let object = value.as_object().unwrap();
        assert!(object["@_id"].is_i64());
        assert_eq!(object["name"], "doggie");
        assert!(!object.contains_key("id"));
        assert!(!object.contains_key("untyped"));
    }

    #[test]
    fn test_untyped_schema_is_undefined() {
        let generator = RandomGenerator::seeded(0);
        assert_eq!(from_schema(&Schema::default(), &generator).unwrap(), None);
        assert_eq!(synthesize(&MediaType::default(), &generator).unwrap(), None);

        let unknown: Schema = serde_yaml::from_str("type: file").unwrap();
        assert_eq!(from_schema(&unknown, &generator).unwrap(), None);
    }
}

//! Property tests for agentspec
//!
//! Castability between typed values, JSON Schema conversion, and template placeholders.
//!
mod common;
use common::*;
use agentspec::prelude::*;
use agentspec::property::{cast_mismatch, find_property, is_castable, is_type_castable};
use agentspec::templating::{placeholder_names, placeholder_properties};
use serde_json::json;

fn person(fields: Vec<Property>) -> Property {
    Property::object("person", fields)
}

#[cfg(test)]
mod castability_tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert!(is_castable(&Property::integer("n"), &Property::float("n")));
        assert!(is_castable(&Property::boolean("b"), &Property::integer("b")));
        assert!(!is_castable(&Property::float("n"), &Property::integer("n")));
        assert!(!is_castable(&Property::integer("n"), &Property::boolean("n")));
    }

    #[test]
    fn test_strings_are_never_parsed() {
        assert!(!is_castable(&Property::string("n"), &Property::integer("n")));
        assert!(!is_castable(&Property::integer("n"), &Property::string("n")));
        assert!(is_castable(&Property::string("s"), &Property::string("t")));
    }

    #[test]
    fn test_any_target_accepts_everything() {
        let target = Property::any("anything");
        for source in [
            Property::string("s"),
            Property::null("n"),
            Property::list("l", JsonType::Integer),
            person(vec![Property::string("name")]),
        ] {
            assert!(is_castable(&source, &target), "{} should cast to any", source.title());
        }
    }

    #[test]
    fn test_collections_are_covariant() {
        assert!(is_type_castable(
            &JsonType::array(JsonType::Integer),
            &JsonType::array(JsonType::Number)
        ));
        assert!(!is_type_castable(
            &JsonType::array(JsonType::Number),
            &JsonType::array(JsonType::Integer)
        ));
        assert!(is_type_castable(
            &JsonType::dict(JsonType::Boolean),
            &JsonType::dict(JsonType::Integer)
        ));
        assert!(!is_type_castable(
            &JsonType::dict(JsonType::String),
            &JsonType::array(JsonType::String)
        ));
    }

    #[test]
    fn test_objects_use_width_subtyping() {
        let wide = person(vec![
            Property::string("name"),
            Property::integer("age"),
            Property::string("email"),
        ]);
        let narrow = person(vec![Property::string("name"), Property::float("age")]);

        assert!(is_castable(&wide, &narrow));
        assert!(!is_castable(&narrow, &wide));
    }

    #[test]
    fn test_missing_object_field_with_default_is_allowed() {
        let source = person(vec![Property::string("name")]);
        let target = person(vec![
            Property::string("name"),
            Property::string("nickname").with_default(json!("")),
        ]);

        assert!(is_castable(&source, &target));
    }

    #[test]
    fn test_union_rules() {
        let nullable = JsonType::Union(vec![JsonType::Integer, JsonType::Null]);

        assert!(is_type_castable(&JsonType::Integer, &nullable));
        assert!(is_type_castable(&nullable, &JsonType::Union(vec![
            JsonType::Number,
            JsonType::Null
        ])));
        assert!(!is_type_castable(&nullable, &JsonType::Integer));
    }

    #[test]
    fn test_mismatch_names_both_types() {
        let (expected, found) =
            cast_mismatch(&Property::list("l", JsonType::String), &Property::string("s")).unwrap();

        assert_eq!(expected, "string");
        assert_eq!(found, "array[string]");
    }
}

#[cfg(test)]
mod schema_tests {
    use super::*;

    #[test]
    fn test_dict_schema_uses_additional_properties() {
        let property = Property::dict("scores", JsonType::Number).with_description("Per player");

        let schema = property.to_json_schema();
        assert_eq!(
            schema,
            json!({
                "title": "scores",
                "description": "Per player",
                "type": "object",
                "additionalProperties": {"type": "number"}
            })
        );
        assert_eq!(Property::from_json_schema(&schema).unwrap(), property);
    }

    #[test]
    fn test_union_schema_uses_any_of() {
        let property = Property::union("maybe_count", vec![JsonType::Integer, JsonType::Null])
            .with_default(json!(null));

        let schema = property.to_json_schema();
        assert_eq!(schema["anyOf"], json!([{"type": "integer"}, {"type": "null"}]));
        assert_eq!(schema["default"], json!(null));
        assert_eq!(Property::from_json_schema(&schema).unwrap(), property);
    }

    #[test]
    fn test_empty_schema_is_any() {
        let property = Property::from_json_schema(&json!({"title": "payload"})).unwrap();

        assert_eq!(property.json_type(), &JsonType::Any);
        assert_eq!(property.to_json_schema(), json!({"title": "payload"}));
    }

    #[test]
    fn test_object_without_properties_is_a_dict_of_any() {
        let property =
            Property::from_json_schema(&json!({"title": "blob", "type": "object"})).unwrap();

        assert_eq!(property.json_type(), &JsonType::dict(JsonType::Any));
    }

    #[test]
    fn test_type_list_keeps_item_type() {
        let property = Property::from_json_schema(&json!({
            "title": "tags",
            "type": ["array", "null"],
            "items": {"type": "string"}
        }))
        .unwrap();

        assert_eq!(
            property.json_type(),
            &JsonType::Union(vec![JsonType::array(JsonType::String), JsonType::Null])
        );
    }

    #[test]
    fn test_type_list_keeps_object_fields() {
        let property = Property::from_json_schema(&json!({
            "title": "owner",
            "type": ["object", "null"],
            "properties": {"name": {"type": "string"}}
        }))
        .unwrap();

        assert_eq!(
            property.json_type(),
            &JsonType::Union(vec![
                JsonType::Object(vec![Property::string("name")]),
                JsonType::Null
            ])
        );
    }

    #[test]
    fn test_schema_without_title_is_rejected() {
        assert!(matches!(
            Property::from_json_schema(&json!({"type": "string"})),
            Err(PropertyError::InvalidField { .. })
        ));
        assert!(matches!(
            Property::from_json_schema(&json!("string")),
            Err(PropertyError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_find_property_by_title() {
        let properties = vec![Property::string("city"), Property::integer("days")];

        assert_eq!(
            find_property(&properties, "days").map(Property::json_type),
            Some(&JsonType::Integer)
        );
        assert!(find_property(&properties, "country").is_none());
    }
}

#[cfg(test)]
mod placeholder_tests {
    use super::*;

    #[test]
    fn test_placeholders_in_order_of_appearance() {
        assert_eq!(
            placeholder_names("Plan a trip from {{ origin }} to {{destination}} in {{origin}}"),
            vec!["origin", "destination"]
        );
    }

    #[test]
    fn test_placeholder_properties_are_strings() {
        let properties = placeholder_properties(["{{url_part}}", "{{ token }} and {{url_part}}"]);

        assert_eq!(
            properties,
            vec![Property::string("url_part"), Property::string("token")]
        );
    }

    #[test]
    fn test_llm_node_inputs_follow_prompt_placeholders() {
        let node = Node::llm(
            "summarize",
            vllm_config("summary-llm"),
            "Summarize {{text}} in {{language}}",
        )
        .build()
        .unwrap();

        let titles: Vec<&str> = node.inputs().iter().map(Property::title).collect();
        assert_eq!(titles, vec!["text", "language"]);
    }
}

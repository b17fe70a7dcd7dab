//! Serialization tests for agentspec
//!
//! Round trips through JSON and YAML, placement of shared components, and the errors raised on
//! malformed documents.
//!
mod common;
use common::*;
use agentspec::flows::GENERATED_TEXT;
use agentspec::prelude::*;
use std::result::Result;
use serde_json::{Value, json};
use std::sync::Arc;

fn subflow_of(node: &Node) -> &Arc<Flow> {
    match node.kind() {
        NodeKind::Flow { subflow }
        | NodeKind::Map { subflow, .. }
        | NodeKind::ParallelMap { subflow, .. }
        | NodeKind::CatchException { subflow } => subflow,
        other => panic!("Expected a node with a subflow, got {:?}", other),
    }
}

fn load_record(record: &Value) -> Result<Component, DeserializationError> {
    Deserializer::new()
        .from_record(record, None, false)
        .map(|loaded| loaded.into_component().expect("regular document"))
}

#[cfg(test)]
mod round_trip_tests {
    use super::*;

    #[test]
    fn test_haiku_flow_json_round_trip() {
        let flow = create_haiku_flow();
        let component = Component::from(flow.clone());

        let json = Serializer::new()
            .to_json(&component, None)
            .expect("Failed to serialize flow");
        let loaded = Deserializer::new()
            .component_from_json(&json, None)
            .expect("Failed to load flow");

        assert_eq!(loaded, component);
        assert_eq!(loaded.component_type(), "Flow");
        assert_eq!(loaded.id(), "haiku-flow");
    }

    #[test]
    fn test_haiku_flow_yaml_round_trip() {
        let component = Component::from(create_haiku_flow());

        let yaml = Serializer::new()
            .to_yaml(&component, None)
            .expect("Failed to serialize flow");
        assert!(yaml.starts_with("component_type: Flow\nid: haiku-flow\n"));

        let loaded = Deserializer::new()
            .component_from_yaml(&yaml, None)
            .expect("Failed to load flow");
        assert_eq!(loaded, component);
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let component = Component::from(create_shared_subflow_flow().0);
        let serializer = Serializer::new();

        let first = serializer.to_json(&component, None).unwrap();
        let loaded = Deserializer::new().component_from_json(&first, None).unwrap();
        let second = serializer.to_json(&loaded, None).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_data_flow_edges_round_trip() {
        let llm = vllm_config("llm");
        let start = Node::start("start")
            .with_inputs(vec![Property::string("topic")])
            .build()
            .unwrap();
        let write = Node::llm("write", llm, "Write about {{topic}}").build().unwrap();
        let end = Node::end("end")
            .with_outputs(vec![Property::string("poem")])
            .build()
            .unwrap();
        let flow = Flow::builder("poet", &start)
            .with_nodes([&start, &write, &end])
            .with_control_flow_edges([
                ControlFlowEdge::new("start_to_write", &start, &write),
                ControlFlowEdge::new("write_to_end", &write, &end),
            ])
            .with_data_flow_edges([
                DataFlowEdge::new("topic", &start, "topic", &write, "topic").unwrap(),
                DataFlowEdge::new("poem", &write, GENERATED_TEXT, &end, "poem").unwrap(),
            ])
            .build()
            .unwrap();
        let component = Component::from(flow);

        let record = Serializer::new().to_record(&component, None).unwrap();
        assert_eq!(record["data_flow_connections"].as_array().unwrap().len(), 2);
        assert_eq!(
            record["data_flow_connections"][1]["source_output"],
            json!(GENERATED_TEXT)
        );

        let loaded = load_record(&record).unwrap();
        assert_eq!(loaded, component);
        let loaded_flow = loaded.as_flow().unwrap();
        assert_eq!(loaded_flow.data_flow_connections().unwrap().len(), 2);
    }

    #[test]
    fn test_agent_with_tools_round_trip() {
        let tool = create_weather_tool("weather-tool");
        let agent = Arc::new(
            Agent::new("forecaster", vllm_config("llm"), "You answer about {{city}}")
                .with_tools(vec![tool]),
        );
        let component = Component::from(agent);

        let json = Serializer::new().to_json(&component, None).unwrap();
        let loaded = Deserializer::new().component_from_json(&json, None).unwrap();

        assert_eq!(loaded, component);
        let loaded_agent = loaded.as_agent().unwrap();
        assert_eq!(loaded_agent.inputs[0].title(), "city");
        assert_eq!(loaded_agent.tools[0].component_type(), "ServerTool");
    }

    #[test]
    fn test_metadata_is_not_scanned_for_references() {
        let mut metadata = serde_json::Map::new();
        metadata.insert("note".to_string(), json!({"$component_ref": "not-a-component"}));
        let tool = Arc::new(Tool::client(
            ComponentBase::new("ask_user").with_metadata(metadata.clone()),
        ));
        let component = Component::from(tool);

        let record = Serializer::new().to_record(&component, None).unwrap();
        let loaded = load_record(&record).expect("metadata must be loaded verbatim");

        assert_eq!(loaded.base().metadata, Some(metadata));
    }

    #[test]
    fn test_loaded_components_are_pinned_to_document_version() {
        let component = Component::from(create_haiku_flow());
        let record = Serializer::new()
            .to_record(&component, Some(AgentSpecVersion::V26_1_0))
            .unwrap();

        let loaded = load_record(&record).unwrap();

        assert_eq!(
            loaded.base().min_agentspec_version,
            Some(AgentSpecVersion::V26_1_0)
        );
        let again = Serializer::new().to_record(&loaded, None).unwrap();
        assert_eq!(again["agentspec_version"], json!("26.1.0"));
    }
}

#[cfg(test)]
mod record_layout_tests {
    use super::*;

    #[test]
    fn test_root_record_key_order() {
        let record = Serializer::new()
            .to_record(&Component::from(create_haiku_flow()), None)
            .unwrap();

        let keys: Vec<&String> = record.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            vec![
                "component_type",
                "id",
                "name",
                "description",
                "inputs",
                "outputs",
                "start_node",
                "nodes",
                "control_flow_connections",
                "data_flow_connections",
                "$referenced_components",
                "agentspec_version",
            ]
        );
        assert_eq!(record["agentspec_version"], json!("25.4.1"));
        assert_eq!(record["description"], Value::Null);
        assert_eq!(record["data_flow_connections"], Value::Null);
    }

    #[test]
    fn test_nodes_are_written_once_and_referenced() {
        let record = Serializer::new()
            .to_record(&Component::from(create_haiku_flow()), None)
            .unwrap();

        let table = record["$referenced_components"].as_object().unwrap();
        let ids: Vec<&String> = table.keys().collect();
        assert_eq!(ids, vec!["haiku-start", "haiku-write", "haiku-end"]);

        assert_eq!(record["start_node"], json!({"$component_ref": "haiku-start"}));
        assert_eq!(record["nodes"][1], json!({"$component_ref": "haiku-write"}));
        let edge = &record["control_flow_connections"][0];
        assert_eq!(edge["component_type"], json!("ControlFlowEdge"));
        assert_eq!(edge["from_node"], json!({"$component_ref": "haiku-start"}));
        assert_eq!(edge["from_branch"], Value::Null);
        assert_eq!(edge["to_node"], json!({"$component_ref": "haiku-write"}));

        // Used once, so written inline.
        assert_eq!(
            table["haiku-write"]["llm_config"]["component_type"],
            json!("VllmConfig")
        );
    }

    #[test]
    fn test_shared_subflow_is_written_once() {
        let (outer, _) = create_shared_subflow_flow();
        let serializer = Serializer::new();
        let component = Component::from(outer);

        let record = serializer.to_record(&component, None).unwrap();
        let table = record["$referenced_components"].as_object().unwrap();
        assert_eq!(table["inner-flow"]["component_type"], json!("Flow"));
        assert_eq!(table["first-node"]["subflow"], json!({"$component_ref": "inner-flow"}));
        assert_eq!(table["second-node"]["subflow"], json!({"$component_ref": "inner-flow"}));

        let inner_table = table["inner-flow"]["$referenced_components"].as_object().unwrap();
        assert!(inner_table.contains_key("inner-start"));
        assert!(inner_table.contains_key("inner-end"));

        let json = serializer.to_json(&component, None).unwrap();
        assert_eq!(count(&json, "\"component_type\": \"Flow\""), 2);
        assert_eq!(count(&json, "\"id\": \"inner-flow\""), 1);
        assert_eq!(count(&json, "\"$component_ref\": \"inner-flow\""), 2);
    }

    #[test]
    fn test_component_shared_by_agent_and_node_is_hoisted_to_flow() {
        let llm = vllm_config("shared-llm");
        let agent = Arc::new(Agent::new("assistant", llm.clone(), "Help the user"));
        let start = Node::start("start").build().unwrap();
        let ask = Node::agent("ask", agent).build().unwrap();
        let summarize = Node::llm("summarize", llm, "Summarize the conversation").build().unwrap();
        let end = Node::end("end").build().unwrap();
        let flow = Flow::builder(ComponentBase::new("chat").with_id("chat-flow"), &start)
            .with_nodes([&start, &ask, &summarize, &end])
            .with_control_flow_edges([
                ControlFlowEdge::new("start_to_ask", &start, &ask),
                ControlFlowEdge::new("ask_to_summarize", &ask, &summarize),
                ControlFlowEdge::new("summarize_to_end", &summarize, &end),
            ])
            .build()
            .unwrap();

        let record = Serializer::new().to_record(&Component::from(flow), None).unwrap();
        let table = record["$referenced_components"].as_object().unwrap();
        assert_eq!(table["shared-llm"]["component_type"], json!("VllmConfig"));

        let loaded = load_record(&record).unwrap();
        let loaded_flow = loaded.as_flow().unwrap();
        let agent_llm = match loaded_flow.nodes()[1].kind() {
            NodeKind::Agent { agent } => agent.llm_config.clone(),
            other => panic!("Expected an agent node, got {:?}", other),
        };
        let node_llm = match loaded_flow.nodes()[2].kind() {
            NodeKind::Llm { llm_config, .. } => llm_config.clone(),
            other => panic!("Expected an LLM node, got {:?}", other),
        };
        assert!(Arc::ptr_eq(&agent_llm, &node_llm));
    }
}

#[cfg(test)]
mod sharing_tests {
    use super::*;

    #[test]
    fn test_shared_subflow_is_loaded_as_one_instance() {
        let (outer, _) = create_shared_subflow_flow();
        let json = Serializer::new().to_json(&Component::from(outer), None).unwrap();

        let loaded = Deserializer::new().component_from_json(&json, None).unwrap();
        let flow = loaded.as_flow().expect("Expected a flow");
        let first = subflow_of(&flow.nodes()[1]);
        let second = subflow_of(&flow.nodes()[2]);

        assert!(Arc::ptr_eq(first, second));
        assert!(Arc::ptr_eq(&flow.nodes()[0], flow.start_node()));
        assert!(Arc::ptr_eq(
            &flow.control_flow_connections()[0].to_node,
            &flow.nodes()[1]
        ));
    }

    #[test]
    fn test_nested_flow_writes_every_subflow_once() {
        let flow = create_nested_flow(4);
        let component = Component::from(flow.clone());

        let yaml = Serializer::new().to_yaml(&component, None).unwrap();
        assert_eq!(count(&yaml, "ID_Flow_4_b"), 1);
        assert_eq!(count(&yaml, "ID_Flow_0_a"), 1);

        let loaded = Deserializer::new().component_from_yaml(&yaml, None).unwrap();
        assert_eq!(loaded, component);
    }

    #[test]
    fn test_deeply_nested_flow_shares_start_node() {
        let depth = 12;
        let component = Component::from(create_nested_flow(depth));

        let json = Serializer::new().to_json(&component, None).unwrap();
        assert_eq!(count(&json, "ID_Flow_12_b"), 1);
        assert_eq!(count(&json, "\"id\": \"ID_start\""), 1);

        let loaded = Deserializer::new().component_from_json(&json, None).unwrap();
        assert_eq!(loaded, component);
        let mut flow = loaded.as_flow().unwrap().clone();
        let start = flow.start_node().clone();
        for _ in 0..=depth {
            let next = subflow_of(&flow.nodes()[1]).clone();
            assert!(Arc::ptr_eq(next.start_node(), &start));
            flow = next;
        }
    }
}

#[cfg(test)]
mod equality_tests {
    use super::*;

    #[test]
    fn test_separately_built_graphs_are_equal() {
        assert_eq!(create_nested_flow(12), create_nested_flow(12));
    }

    #[test]
    fn test_difference_at_the_deepest_level_is_found() {
        let shallow = create_nested_flow(3);
        let deep = create_nested_flow(4);

        assert_eq!(shallow.nodes()[1].id(), deep.nodes()[1].id());
        assert_ne!(shallow, deep);
        assert_ne!(shallow.nodes()[1], deep.nodes()[1]);
    }

    #[test]
    fn test_edges_compare_their_endpoints() {
        let first = create_haiku_flow();
        let second = create_haiku_flow();
        assert_eq!(
            first.control_flow_connections()[0],
            second.control_flow_connections()[0]
        );
        assert_ne!(
            first.control_flow_connections()[0],
            second.control_flow_connections()[1]
        );
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    fn record_of_shared_subflow_flow() -> Value {
        let (outer, _) = create_shared_subflow_flow();
        Serializer::new().to_record(&Component::from(outer), None).unwrap()
    }

    #[test]
    fn test_component_containing_its_own_id_is_circular() {
        let start = Node::start("start").build().unwrap();
        let end = Node::end("end").build().unwrap();
        let inner = Flow::builder(ComponentBase::new("inner").with_id("loop"), &start)
            .with_nodes([&start, &end])
            .with_control_flow_edges([ControlFlowEdge::new("start_to_end", &start, &end)])
            .build()
            .unwrap();
        let wrapper = Node::flow("wrapper", inner).build().unwrap();
        let outer_start = Node::start("outer_start").build().unwrap();
        let outer_end = Node::end("outer_end").build().unwrap();
        let outer = Flow::builder(ComponentBase::new("outer").with_id("loop"), &outer_start)
            .with_nodes([&outer_start, &wrapper, &outer_end])
            .with_control_flow_edges([
                ControlFlowEdge::new("to_wrapper", &outer_start, &wrapper),
                ControlFlowEdge::new("to_end", &wrapper, &outer_end),
            ])
            .build()
            .unwrap();

        match Serializer::new().to_record(&Component::from(outer), None) {
            Err(SerializationError::CircularDependency { id }) => assert_eq!(id, "loop"),
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_to_enclosing_component_is_circular() {
        let mut record = record_of_shared_subflow_flow();
        record["$referenced_components"]["first-node"]["subflow"] =
            json!({"$component_ref": "outer-flow"});

        match load_record(&record) {
            Err(DeserializationError::CircularDependency { id }) => assert_eq!(id, "outer-flow"),
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_references_are_reported_once() {
        let mut record = record_of_shared_subflow_flow();
        record["$referenced_components"]
            .as_object_mut()
            .unwrap()
            .remove("inner-flow");

        match load_record(&record) {
            Err(DeserializationError::MissingReferences(ids)) => {
                assert_eq!(ids, vec!["inner-flow".to_string()])
            }
            other => panic!("Expected MissingReferences, got {:?}", other),
        }
    }

    #[test]
    fn test_same_id_at_two_levels_is_ambiguous() {
        let mut record = record_of_shared_subflow_flow();
        let outer_start = record["$referenced_components"]["outer-start"].clone();
        record["$referenced_components"]["inner-flow"]["$referenced_components"]
            .as_object_mut()
            .unwrap()
            .insert("outer-start".to_string(), outer_start);

        match load_record(&record) {
            Err(DeserializationError::AmbiguousReferences(ids)) => {
                assert_eq!(ids, vec!["outer-start".to_string()])
            }
            other => panic!("Expected AmbiguousReferences, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_to_wrong_component_type() {
        let mut record = record_of_shared_subflow_flow();
        record["start_node"] = json!({"$component_ref": "inner-flow"});

        match load_record(&record) {
            Err(DeserializationError::TypeMismatch {
                reference,
                expected,
                found,
            }) => {
                assert_eq!(reference, "inner-flow");
                assert_eq!(expected, "Node");
                assert_eq!(found, "Flow");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_component_type() {
        let mut record = record_of_shared_subflow_flow();
        record["component_type"] = json!("Workflow");

        match load_record(&record) {
            Err(DeserializationError::UnknownComponentType(component_type)) => {
                assert_eq!(component_type, "Workflow")
            }
            other => panic!("Expected UnknownComponentType, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_flow_is_rejected_on_load() {
        let mut record = record_of_shared_subflow_flow();
        record["control_flow_connections"]
            .as_array_mut()
            .unwrap()
            .remove(0);

        match load_record(&record) {
            Err(DeserializationError::Validation(ValidationError::StartNodeOutgoingEdges {
                flow_name,
                node_name,
                count,
            })) => {
                assert_eq!(flow_name, "outer");
                assert_eq!(node_name, "start");
                assert_eq!(count, 0);
            }
            other => panic!("Expected StartNodeOutgoingEdges, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_input_is_a_decoding_error() {
        let deserializer = Deserializer::new();
        assert!(matches!(
            deserializer.component_from_json("{not json", None),
            Err(DeserializationError::Decoding { format: "JSON", .. })
        ));
        assert!(matches!(
            deserializer.from_record(&json!([1, 2]), None, false),
            Err(DeserializationError::Decoding { format: "record", .. })
        ));
    }
}

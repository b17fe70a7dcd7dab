//! Versioning tests for agentspec
//!
//! Version floors of component types, version pins, and the version declared by documents.
//!
mod common;
use common::*;
use agentspec::prelude::*;
use std::result::Result;
use agentspec::version::resolve_version_bounds;
use serde_json::{Value, json};
use std::sync::Arc;

/// A flow whose only work is a `CatchExceptionNode` around a passthrough subflow.
fn guarded_flow() -> Arc<Flow> {
    let subflow = create_passthrough_flow("guarded");
    let start = Node::start("start").build().unwrap();
    let guard = Node::catch_exception(ComponentBase::new("guard").with_id("guard-node"), subflow)
        .build()
        .unwrap();
    let recover = Node::end_with_branch("recover", "recovered").build().unwrap();
    let end = Node::end("end").build().unwrap();
    Flow::builder("guarded_flow", &start)
        .with_nodes([&start, &guard, &recover, &end])
        .with_control_flow_edges([
            ControlFlowEdge::new("start_to_guard", &start, &guard),
            ControlFlowEdge::new("guard_ok", &guard, &end),
            ControlFlowEdge::new("guard_failed", &guard, &recover)
                .with_branch(agentspec::flows::CAUGHT_EXCEPTION_BRANCH),
        ])
        .build()
        .unwrap()
}

fn load(record: &Value) -> Result<Component, DeserializationError> {
    Deserializer::new()
        .from_record(record, None, false)
        .map(|loaded| loaded.into_component().expect("regular document"))
}

#[cfg(test)]
mod bounds_tests {
    use super::*;

    #[test]
    fn test_plain_graph_uses_lowest_version() {
        let bounds = resolve_version_bounds(&Component::from(create_haiku_flow())).unwrap();

        assert_eq!(bounds.min, AgentSpecVersion::DEFAULT_MIN);
        assert_eq!(bounds.max, AgentSpecVersion::CURRENT);
        assert!(bounds.contains(AgentSpecVersion::V26_1_0));
        assert!(!bounds.contains(AgentSpecVersion::V25_3_1));
    }

    #[test]
    fn test_catch_exception_node_raises_floor() {
        let flow = Component::from(guarded_flow());

        let bounds = resolve_version_bounds(&flow).unwrap();
        assert_eq!(bounds.min, AgentSpecVersion::V26_2_0);
        assert_eq!(bounds.min_component.id, "guard-node");

        let record = Serializer::new().to_record(&flow, None).unwrap();
        assert_eq!(record["agentspec_version"], json!("26.2.0"));
    }

    #[test]
    fn test_requesting_version_below_floor_names_component() {
        let flow = Component::from(guarded_flow());

        match Serializer::new().to_record(&flow, Some(AgentSpecVersion::V26_1_0)) {
            Err(SerializationError::Version(VersionError::BelowMinimum {
                requested,
                min,
                component,
                component_id,
            })) => {
                assert_eq!(requested, AgentSpecVersion::V26_1_0);
                assert_eq!(min, AgentSpecVersion::V26_2_0);
                assert_eq!(component, "guard");
                assert_eq!(component_id, "guard-node");
            }
            other => panic!("Expected BelowMinimum, got {:?}", other),
        }
    }

    #[test]
    fn test_min_pin_raises_export_version() {
        let llm = Arc::new(LlmConfig::vllm(
            ComponentBase::new("pinned").with_min_version(AgentSpecVersion::V26_1_0),
            "http://localhost:8000",
            "model",
        ));
        let agent = Component::from(Arc::new(Agent::new("agent", llm, "Hello")));

        let record = Serializer::new().to_record(&agent, None).unwrap();
        assert_eq!(record["agentspec_version"], json!("26.1.0"));
    }

    #[test]
    fn test_min_pin_cannot_lower_type_floor() {
        let node = Node::catch_exception(
            ComponentBase::new("guard").with_min_version(AgentSpecVersion::V25_4_1),
            create_passthrough_flow("guarded"),
        )
        .build()
        .unwrap();

        let bounds = resolve_version_bounds(&Component::from(node)).unwrap();
        assert_eq!(bounds.min, AgentSpecVersion::V26_2_0);
    }

    #[test]
    fn test_max_pin_caps_export_version() {
        let start = Node::start(
            ComponentBase::new("start")
                .with_id("capped-start")
                .with_max_version(AgentSpecVersion::V25_4_2),
        )
        .build()
        .unwrap();
        let end = Node::end("end").build().unwrap();
        let flow = Flow::builder("capped", &start)
            .with_nodes([&start, &end])
            .with_control_flow_edges([ControlFlowEdge::new("start_to_end", &start, &end)])
            .build()
            .unwrap();
        let component = Component::from(flow);

        assert!(Serializer::new()
            .to_record(&component, Some(AgentSpecVersion::V25_4_2))
            .is_ok());
        match Serializer::new().to_record(&component, Some(AgentSpecVersion::V26_1_0)) {
            Err(SerializationError::Version(VersionError::AboveMaximum {
                max,
                component,
                component_id,
                ..
            })) => {
                assert_eq!(max, AgentSpecVersion::V25_4_2);
                assert_eq!(component, "start");
                assert_eq!(component_id, "capped-start");
            }
            other => panic!("Expected AboveMaximum, got {:?}", other),
        }
    }

    #[test]
    fn test_incompatible_bounds_across_references() {
        let llm = Arc::new(LlmConfig::vllm(
            ComponentBase::new("future_llm")
                .with_id("future-llm")
                .with_min_version(AgentSpecVersion::V26_1_0),
            "http://localhost:8000",
            "model",
        ));
        let node = Node::llm(
            ComponentBase::new("legacy_node")
                .with_id("legacy-node")
                .with_max_version(AgentSpecVersion::V25_4_2),
            llm,
            "Hello",
        )
        .build()
        .unwrap();

        match resolve_version_bounds(&Component::from(node)) {
            Err(VersionError::IncompatibleBounds {
                min,
                min_component,
                min_component_id,
                max,
                max_component,
                max_component_id,
            }) => {
                assert_eq!(min, AgentSpecVersion::V26_1_0);
                assert_eq!(min_component, "future_llm");
                assert_eq!(min_component_id, "future-llm");
                assert_eq!(max, AgentSpecVersion::V25_4_2);
                assert_eq!(max_component, "legacy_node");
                assert_eq!(max_component_id, "legacy-node");
            }
            other => panic!("Expected IncompatibleBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_contradictory_pins_on_one_component() {
        let tool = Arc::new(Tool::server(
            ComponentBase::new("confused")
                .with_min_version(AgentSpecVersion::V26_2_0)
                .with_max_version(AgentSpecVersion::V25_4_2),
        ));

        assert!(matches!(
            resolve_version_bounds(&Component::from(tool)),
            Err(VersionError::InvalidComponentBounds { .. })
        ));
    }
}

#[cfg(test)]
mod document_version_tests {
    use super::*;

    fn haiku_record() -> Value {
        Serializer::new()
            .to_record(&Component::from(create_haiku_flow()), None)
            .unwrap()
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let mut record = haiku_record();
        record.as_object_mut().unwrap().remove("agentspec_version");

        assert!(matches!(load(&record), Err(DeserializationError::MissingVersion)));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let mut record = haiku_record();
        record["agentspec_version"] = json!("24.1.0");

        match load(&record) {
            Err(DeserializationError::Version(VersionError::UnknownVersion(raw))) => {
                assert_eq!(raw, "24.1.0")
            }
            other => panic!("Expected UnknownVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_version_field_name_is_accepted() {
        let mut record = haiku_record();
        let map = record.as_object_mut().unwrap();
        let version = map.remove("agentspec_version").unwrap();
        map.insert("air_version".to_string(), version);

        let loaded = load(&record).expect("air_version must be accepted");
        assert_eq!(loaded, Component::from(create_haiku_flow()));
    }

    #[test]
    fn test_pre_release_version_is_loaded_as_first_release() {
        let mut record = haiku_record();
        record["agentspec_version"] = json!("25.4.0");

        let loaded = load(&record).expect("pre-release documents must load");
        assert_eq!(
            loaded.base().min_agentspec_version,
            Some(AgentSpecVersion::V25_4_1)
        );
        let again = Serializer::new().to_record(&loaded, None).unwrap();
        assert_eq!(again["agentspec_version"], json!("25.4.1"));
    }

    #[test]
    fn test_versions_before_first_release_are_rejected() {
        let mut record = haiku_record();
        record["agentspec_version"] = json!("25.3.1");

        assert!(matches!(
            load(&record),
            Err(DeserializationError::Version(VersionError::BelowMinimum { .. }))
        ));
    }

    #[test]
    fn test_document_declaring_too_old_version_for_its_components() {
        let mut record = Serializer::new()
            .to_record(&Component::from(guarded_flow()), None)
            .unwrap();
        record["agentspec_version"] = json!("25.4.2");

        match load(&record) {
            Err(DeserializationError::Version(VersionError::BelowMinimum {
                requested,
                component,
                component_id,
                ..
            })) => {
                assert_eq!(requested, AgentSpecVersion::V25_4_2);
                assert_eq!(component, "guard");
                assert_eq!(component_id, "guard-node");
            }
            other => panic!("Expected BelowMinimum, got {:?}", other),
        }
    }

    #[test]
    fn test_every_version_round_trips_a_plain_flow() {
        let component = Component::from(create_haiku_flow());
        for version in AgentSpecVersion::ALL
            .into_iter()
            .filter(|version| *version >= AgentSpecVersion::DEFAULT_MIN)
        {
            let record = Serializer::new()
                .to_record(&component, Some(version))
                .unwrap();
            assert_eq!(record["agentspec_version"], json!(version.as_str()));
            let loaded = load(&record).unwrap();
            assert_eq!(loaded, component);
        }
    }
}

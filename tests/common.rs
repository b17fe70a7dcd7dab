//! Common test utilities for building component graphs with stable ids.
use agentspec::prelude::*;
use std::sync::Arc;

/// A vLLM configuration with a fixed id.
#[allow(dead_code)]
pub fn vllm_config(id: &str) -> Arc<LlmConfig> {
    Arc::new(LlmConfig::vllm(
        ComponentBase::new("llama").with_id(id),
        "http://localhost:8000",
        "meta-llama/Llama-3.1-8B-Instruct",
    ))
}

/// Creates a simple, valid flow: `Start(topic) -> LlmNode -> End(generated_text)`.
#[allow(dead_code)]
pub fn create_haiku_flow() -> Arc<Flow> {
    let llm = vllm_config("haiku-llm");
    let start = Node::start(ComponentBase::new("start").with_id("haiku-start"))
        .with_inputs(vec![Property::string("topic")])
        .build()
        .expect("start node");
    let write = Node::llm(
        ComponentBase::new("write").with_id("haiku-write"),
        llm,
        "Write a haiku about {{topic}}",
    )
    .build()
    .expect("llm node");
    let end = Node::end(ComponentBase::new("end").with_id("haiku-end"))
        .with_outputs(vec![Property::string("generated_text")])
        .build()
        .expect("end node");

    Flow::builder(ComponentBase::new("haiku").with_id("haiku-flow"), &start)
        .with_nodes([&start, &write, &end])
        .with_control_flow_edges([
            ControlFlowEdge::new(
                ComponentBase::new("start_to_write").with_id("haiku-edge-1"),
                &start,
                &write,
            ),
            ControlFlowEdge::new(
                ComponentBase::new("write_to_end").with_id("haiku-edge-2"),
                &write,
                &end,
            ),
        ])
        .build()
        .expect("haiku flow")
}

/// A `Start -> End` flow whose components carry ids prefixed by `prefix`.
#[allow(dead_code)]
pub fn create_passthrough_flow(prefix: &str) -> Arc<Flow> {
    let start = Node::start(ComponentBase::new("start").with_id(format!("{}-start", prefix)))
        .build()
        .expect("start node");
    let end = Node::end(ComponentBase::new("end").with_id(format!("{}-end", prefix)))
        .build()
        .expect("end node");
    Flow::builder(
        ComponentBase::new(prefix).with_id(format!("{}-flow", prefix)),
        &start,
    )
    .with_nodes([&start, &end])
    .with_control_flow_edges([ControlFlowEdge::new(
        ComponentBase::new("start_to_end").with_id(format!("{}-edge", prefix)),
        &start,
        &end,
    )])
    .build()
    .expect("passthrough flow")
}

/// Creates `Start -> first -> second -> End` where both `FlowNode`s wrap the same subflow.
///
/// The outer flow has id `outer-flow`, the subflow `inner-flow`, the flow nodes `first-node` and
/// `second-node`.
#[allow(dead_code)]
pub fn create_shared_subflow_flow() -> (Arc<Flow>, Arc<Flow>) {
    let inner = create_passthrough_flow("inner");
    let start = Node::start(ComponentBase::new("start").with_id("outer-start"))
        .build()
        .expect("start node");
    let first = Node::flow(ComponentBase::new("first").with_id("first-node"), inner.clone())
        .build()
        .expect("first flow node");
    let second = Node::flow(ComponentBase::new("second").with_id("second-node"), inner.clone())
        .build()
        .expect("second flow node");
    let end = Node::end(ComponentBase::new("end").with_id("outer-end"))
        .build()
        .expect("end node");

    let outer = Flow::builder(ComponentBase::new("outer").with_id("outer-flow"), &start)
        .with_nodes([&start, &first, &second, &end])
        .with_control_flow_edges([
            ControlFlowEdge::new(ComponentBase::new("e1").with_id("outer-edge-1"), &start, &first),
            ControlFlowEdge::new(ComponentBase::new("e2").with_id("outer-edge-2"), &first, &second),
            ControlFlowEdge::new(ComponentBase::new("e3").with_id("outer-edge-3"), &second, &end),
        ])
        .build()
        .expect("outer flow");
    (outer, inner)
}

/// Creates a flow nested `depth + 1` levels deep in which every level reuses the three flow
/// nodes of the level below, and every flow shares one start node and one end node.
///
/// Flows are named `ID_Flow_<level>_<a|b|c>`, the outermost one `ID_Flow_Omega`.
#[allow(dead_code)]
pub fn create_nested_flow(depth: usize) -> Arc<Flow> {
    let start = Node::start(ComponentBase::new("start").with_id("ID_start"))
        .build()
        .expect("start node");
    let end = Node::end(ComponentBase::new("end").with_id("ID_end"))
        .build()
        .expect("end node");

    let mut level: Vec<Arc<Node>> = ["a", "b", "c"]
        .iter()
        .map(|x| {
            let subflow = Flow::builder(
                ComponentBase::new(format!("Flow_{}_{}", depth, x))
                    .with_id(format!("ID_Flow_{}_{}", depth, x)),
                &start,
            )
            .with_nodes([&start, &end])
            .with_control_flow_edges([ControlFlowEdge::new(
                ComponentBase::new("edge").with_id(format!("ID_edge_{}_{}", depth, x)),
                &start,
                &end,
            )])
            .build()
            .expect("leaf flow");
            Node::flow(
                ComponentBase::new("node").with_id(format!("ID_FlowNode_{}_{}", depth, x)),
                subflow,
            )
            .build()
            .expect("leaf flow node")
        })
        .collect();

    for i in (0..depth).rev() {
        level = ["a", "b", "c"]
            .iter()
            .map(|x| {
                let subflow = chain_flow(
                    ComponentBase::new(format!("Flow_{}_{}", i, x))
                        .with_id(format!("ID_Flow_{}_{}", i, x)),
                    &format!("ID_edge_{}_{}", i, x),
                    &start,
                    &level,
                    &end,
                );
                Node::flow(
                    ComponentBase::new("node").with_id(format!("ID_FlowNode_{}_{}", i, x)),
                    subflow,
                )
                .build()
                .expect("flow node")
            })
            .collect();
    }

    chain_flow(
        ComponentBase::new("Flow_Omega").with_id("ID_Flow_Omega"),
        "ID_edge_omega",
        &start,
        &level,
        &end,
    )
}

/// `start -> middle[0] -> middle[1] -> ... -> end`.
#[allow(dead_code)]
fn chain_flow(
    base: ComponentBase,
    edge_prefix: &str,
    start: &Arc<Node>,
    middle: &[Arc<Node>],
    end: &Arc<Node>,
) -> Arc<Flow> {
    let path: Vec<&Arc<Node>> = std::iter::once(start)
        .chain(middle.iter())
        .chain(std::iter::once(end))
        .collect();
    let edges: Vec<ControlFlowEdge> = path
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            ControlFlowEdge::new(
                ComponentBase::new("edge").with_id(format!("{}_{}", edge_prefix, i + 1)),
                pair[0],
                pair[1],
            )
        })
        .collect();
    Flow::builder(base, start)
        .with_nodes(path.iter().copied())
        .with_control_flow_edges(edges)
        .build()
        .expect("chain flow")
}

/// Creates `Start(city) -> ToolNode -> End(forecast)` around `tool`.
#[allow(dead_code)]
pub fn create_tool_flow(tool: Arc<Tool>) -> Arc<Flow> {
    let start = Node::start(ComponentBase::new("start").with_id("tool-start"))
        .with_inputs(vec![Property::string("city")])
        .build()
        .expect("start node");
    let call = Node::tool(ComponentBase::new("call").with_id("tool-node"), tool)
        .build()
        .expect("tool node");
    let end = Node::end(ComponentBase::new("end").with_id("tool-end"))
        .with_outputs(vec![Property::string("forecast")])
        .build()
        .expect("end node");
    Flow::builder(ComponentBase::new("weather").with_id("tool-flow"), &start)
        .with_nodes([&start, &call, &end])
        .with_control_flow_edges([
            ControlFlowEdge::new(ComponentBase::new("start_to_call").with_id("tool-edge-1"), &start, &call),
            ControlFlowEdge::new(ComponentBase::new("call_to_end").with_id("tool-edge-2"), &call, &end),
        ])
        .build()
        .expect("tool flow")
}

/// A server tool with `city -> forecast`.
#[allow(dead_code)]
pub fn create_weather_tool(id: &str) -> Arc<Tool> {
    Arc::new(
        Tool::server(ComponentBase::new("get_weather").with_id(id))
            .with_inputs(vec![Property::string("city")])
            .with_outputs(vec![Property::string("forecast")]),
    )
}

/// Counts the occurrences of `needle` in `haystack`.
#[allow(dead_code)]
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

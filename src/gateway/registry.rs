//! Immutable registry of the tools discovered at startup.
//!
//! Built exactly once by discovery and handed to the serving handler; the
//! tool set is fixed for the lifetime of the process. Agents that join the
//! fleet later, or change their schema, are picked up on the next restart.

use std::collections::HashMap;

use rmcp::model::Tool;

use crate::gateway::schema::CallSignature;

/// One public tool: the agent's name and descriptor plus the synthesized
/// call signature it is served under.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub name: String,
    pub signature: CallSignature,
    pub public: Tool,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a tool, keeping registration order. Returns false when the
    /// name is already taken; the first registration wins.
    pub(crate) fn register(&mut self, tool: RegisteredTool) -> bool {
        if self.index.contains_key(&tool.name) {
            return false;
        }
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        true
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&at| &self.tools[at])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.iter()
    }

    /// Clone the public descriptors for a tools/list response.
    pub fn public_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|tool| tool.public.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::schema;
    use serde_json::json;
    use std::sync::Arc;

    fn tool(name: &str) -> RegisteredTool {
        let descriptor = Tool {
            name: name.to_string().into(),
            title: None,
            description: None,
            input_schema: Arc::new(
                json!({"type": "object", "properties": {}})
                    .as_object()
                    .expect("object")
                    .clone(),
            ),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        };
        let signature = schema::synthesize(&descriptor);
        RegisteredTool {
            name: name.to_string(),
            signature,
            public: descriptor,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(tool("get_cpuinfo")));
        assert!(registry.register(tool("read_file")));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("read_file"));
        assert!(registry.get("get_cpuinfo").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(tool("get_cpuinfo")));
        assert!(!registry.register(tool("get_cpuinfo")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_public_tools_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("zeta"));
        registry.register(tool("alpha"));

        let names: Vec<String> = registry
            .public_tools()
            .iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}

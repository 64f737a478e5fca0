//! Frozen snapshot of the upstream tool catalog.

use std::collections::HashSet;

use {mentionbot_mcp::McpToolDef, tracing::warn};

/// Tool descriptors keyed by name, in discovery order.
///
/// Built once at startup and never mutated; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    tools: Vec<McpToolDef>,
}

impl CapabilityRegistry {
    /// Freeze a discovered catalog. When a name repeats, the first
    /// descriptor wins.
    pub fn from_tools(discovered: Vec<McpToolDef>) -> Self {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(discovered.len());
        for tool in discovered {
            if seen.insert(tool.name.clone()) {
                tools.push(tool);
            } else {
                warn!(tool = %tool.name, "duplicate tool name in upstream catalog, keeping first");
            }
        }
        Self { tools }
    }

    pub fn tools(&self) -> &[McpToolDef] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&McpToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, description: &str) -> McpToolDef {
        McpToolDef {
            name: name.into(),
            description: Some(description.into()),
            input_schema: serde_json::json!({"type": "object"}),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn keeps_discovery_order() {
        let registry = CapabilityRegistry::from_tools(vec![tool("b", "1"), tool("a", "2")]);
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn first_duplicate_wins() {
        let registry = CapabilityRegistry::from_tools(vec![
            tool("coingecko.answer", "first"),
            tool("coingecko.answer", "second"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .get("coingecko.answer")
                .and_then(|t| t.description.as_deref()),
            Some("first")
        );
    }

    #[test]
    fn unknown_name_is_none() {
        let registry = CapabilityRegistry::from_tools(vec![]);
        assert!(registry.is_empty());
        assert!(registry.get("missing").is_none());
    }
}

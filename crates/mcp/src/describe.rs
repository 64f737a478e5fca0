//! Render tool descriptors for readers that only see a description string.

use crate::types::McpToolDef;

/// The tool description with its input schema appended, for consumers (such
/// as LLM agents) that never look at `inputSchema` directly.
pub fn describe_with_schema(tool: &McpToolDef) -> String {
    let description = tool
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map_or_else(|| format!("MCP tool: {}", tool.name), str::to_string);
    format!(
        "{description}\nInput JSON must match schema: {}",
        tool.input_schema
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(description: Option<&str>) -> McpToolDef {
        McpToolDef {
            name: "twitter.post_reply".into(),
            description: description.map(str::to_string),
            input_schema: serde_json::json!({"type": "object", "required": ["text"]}),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn appends_compact_schema() {
        assert_eq!(
            describe_with_schema(&tool(Some("Post a reply"))),
            "Post a reply\nInput JSON must match schema: {\"required\":[\"text\"],\"type\":\"object\"}"
        );
    }

    #[test]
    fn falls_back_to_tool_name() {
        let rendered = describe_with_schema(&tool(None));
        assert!(rendered.starts_with("MCP tool: twitter.post_reply\n"));
    }
}

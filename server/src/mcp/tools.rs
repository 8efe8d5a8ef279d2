//! MCP Tool Definitions
//!
//! Document search, agent memory and the integer-list helper.

use super::protocol::{PropertySchema, Tool, ToolInputSchema};
use recall_memory::MemoryKind;
use std::collections::HashMap;

pub const SEARCH_DOCUMENTS: &str = "search_documents";
pub const MEMORY_ADD: &str = "memory_add";
pub const MEMORY_SEARCH: &str = "memory_search";
pub const MEMORY_STATS: &str = "memory_stats";
pub const INT_LIST_TO_EXPONENTIAL_SUM: &str = "int_list_to_exponential_sum";

/// Get all available tools
pub fn get_all_tools() -> Vec<Tool> {
    vec![
        search_documents_tool(),
        memory_add_tool(),
        memory_search_tool(),
        memory_stats_tool(),
        int_list_to_exponential_sum_tool(),
    ]
}

fn prop(property_type: &str, description: &str) -> PropertySchema {
    PropertySchema {
        property_type: property_type.to_string(),
        description: Some(description.to_string()),
        default: None,
        enum_values: None,
        items: None,
        minimum: None,
        maximum: None,
    }
}

fn string_prop(description: &str) -> PropertySchema {
    prop("string", description)
}

fn integer_prop(description: &str, default: u64, minimum: f64) -> PropertySchema {
    PropertySchema {
        default: Some(serde_json::json!(default)),
        minimum: Some(minimum),
        ..prop("integer", description)
    }
}

fn kind_prop(description: &str) -> PropertySchema {
    PropertySchema {
        enum_values: Some(MemoryKind::ALL.iter().map(|k| k.to_string()).collect()),
        ..string_prop(description)
    }
}

fn array_prop(description: &str, item_type: &str) -> PropertySchema {
    PropertySchema {
        items: Some(Box::new(PropertySchema {
            description: None,
            ..prop(item_type, "")
        })),
        ..prop("array", description)
    }
}

fn object_schema(properties: HashMap<String, PropertySchema>, required: &[&str]) -> ToolInputSchema {
    ToolInputSchema {
        schema_type: "object".to_string(),
        properties: Some(properties),
        required: Some(required.iter().map(|r| r.to_string()).collect()),
    }
}

fn search_documents_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "query".to_string(),
        string_prop("Natural-language search query"),
    );

    Tool {
        name: SEARCH_DOCUMENTS.to_string(),
        description: Some("Search for relevant content from uploaded documents. Returns matching chunks with their source document and chunk id.".to_string()),
        input_schema: object_schema(properties, &["query"]),
    }
}

fn memory_add_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert("text".to_string(), string_prop("Content to remember"));
    properties.insert(
        "kind".to_string(),
        kind_prop("Category of the memory (default: fact)"),
    );
    properties.insert(
        "tags".to_string(),
        array_prop("Tags for later filtering", "string"),
    );
    properties.insert(
        "session_id".to_string(),
        string_prop("Session to file the memory under (default: general)"),
    );
    properties.insert(
        "tool_name".to_string(),
        string_prop("Tool that produced this content, for tool outputs"),
    );
    properties.insert(
        "user_query".to_string(),
        string_prop("Query that led to this content"),
    );

    Tool {
        name: MEMORY_ADD.to_string(),
        description: Some("Stores a memory item for future sessions. USE WHEN: a preference, fact or tool result is worth recalling later.".to_string()),
        input_schema: object_schema(properties, &["text"]),
    }
}

fn memory_search_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "query".to_string(),
        string_prop("Search query - supports natural language"),
    );
    properties.insert(
        "top_k".to_string(),
        integer_prop("Maximum results to return", 3, 0.0),
    );
    properties.insert("kind".to_string(), kind_prop("Only return this kind"));
    properties.insert(
        "tags".to_string(),
        array_prop("Only return memories sharing at least one tag", "string"),
    );
    properties.insert(
        "session_id".to_string(),
        string_prop("Only return memories from this session"),
    );

    Tool {
        name: MEMORY_SEARCH.to_string(),
        description: Some("Searches stored memories by semantic similarity with optional kind, tag and session filters.".to_string()),
        input_schema: object_schema(properties, &["query"]),
    }
}

fn memory_stats_tool() -> Tool {
    Tool {
        name: MEMORY_STATS.to_string(),
        description: Some("Counts of stored memories and indexed document chunks by kind and tag.".to_string()),
        input_schema: object_schema(HashMap::new(), &[]),
    }
}

fn int_list_to_exponential_sum_tool() -> Tool {
    let mut properties = HashMap::new();
    properties.insert(
        "int_list".to_string(),
        PropertySchema {
            items: Some(Box::new(PropertySchema {
                description: None,
                ..prop("integer", "")
            })),
            ..prop(
                "array",
                "Integers, as a JSON array or a string such as \"[1, 2, 3]\"",
            )
        },
    );

    Tool {
        name: INT_LIST_TO_EXPONENTIAL_SUM.to_string(),
        description: Some("Returns the sum of e^i over a list of integers.".to_string()),
        input_schema: object_schema(properties, &["int_list"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_all_tools_count() {
        assert_eq!(get_all_tools().len(), 5);
    }

    #[test]
    fn test_tools_have_required_fields() {
        for tool in get_all_tools() {
            assert!(!tool.name.is_empty(), "Tool name should not be empty");
            assert!(
                tool.description.is_some(),
                "Tool {} should have description",
                tool.name
            );
            let properties = tool.input_schema.properties.as_ref().unwrap();
            for required in tool.input_schema.required.as_ref().unwrap() {
                assert!(
                    properties.contains_key(required),
                    "Tool {} requires undeclared {}",
                    tool.name,
                    required
                );
            }
        }
    }

    #[test]
    fn test_tool_names_are_unique() {
        let tools = get_all_tools();
        let names: std::collections::HashSet<_> = tools.iter().map(|t| &t.name).collect();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_kind_enum_lists_every_kind() {
        let tool = memory_add_tool();
        let kind = &tool.input_schema.properties.unwrap()["kind"];
        let values = kind.enum_values.as_ref().unwrap();
        assert_eq!(values.len(), MemoryKind::ALL.len());
        assert!(values.contains(&"document_chunk".to_string()));
    }
}

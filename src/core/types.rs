//! Shared types used across StockBot modules
//!
//! Contains message structures, tool definitions, and common data types.

use serde::{Deserialize, Serialize};

/// Role of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Wire name shared by OpenAI and Ollama
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message (absent on pure tool-request turns)
    pub content: Option<String>,
    /// Tool invocations requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_invocations: Option<Vec<ToolInvocation>>,
    /// Id of the invocation this tool message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result_id: Option<String>,
    /// Capability name on tool messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_invocations: None,
            tool_result_id: None,
            name: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// Create an assistant message that requests tool invocations
    pub fn assistant_tool_request(
        content: Option<String>,
        invocations: Vec<ToolInvocation>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_invocations: Some(invocations),
            tool_result_id: None,
            name: None,
        }
    }

    /// Create a tool-result message answering `invocation_id`
    pub fn tool_result(
        invocation_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_invocations: None,
            tool_result_id: Some(invocation_id.into()),
            name: Some(name.into()),
        }
    }

    /// Content as text, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Invocations carried by this message, empty when none
    pub fn invocations(&self) -> &[ToolInvocation] {
        self.tool_invocations.as_deref().unwrap_or(&[])
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque id assigned by the model service
    pub id: String,
    /// Name of the capability to invoke
    pub name: String,
    /// JSON arguments for the capability
    pub arguments: serde_json::Value,
}

impl ToolInvocation {
    /// Create a new tool invocation
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Decode arguments sent as a JSON-encoded string.
    ///
    /// Undecodable input is kept verbatim as a string value so that schema
    /// validation rejects it and the model gets to see the problem.
    pub fn from_encoded(
        id: impl Into<String>,
        name: impl Into<String>,
        encoded_arguments: &str,
    ) -> Self {
        let arguments = if encoded_arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(encoded_arguments)
                .unwrap_or_else(|_| serde_json::Value::String(encoded_arguments.to_string()))
        };
        Self::new(id, name, arguments)
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Name of the described function
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

//! Tool contract for `create_design`.
//!
//! This module declares the callable surface of the tool: its name and discovery text, the
//! parameter and result shapes, the JSON Schemas advertised to MCP clients, and the structural
//! validators that turn untrusted JSON into those shapes.
//!
//! Every schema property carries a `description`. Agents have no other source of semantic
//! guidance for the tool, so a property without one is a contract bug (see the tests below).

use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const TOOL_NAME: &str = "create_design";

pub const TOOL_DESCRIPTION: &str = "Creates a new design pattern using the Magic Patterns API \
based on the provided prompt, design system, and styling preferences.";

pub const DEFAULT_PRESET_ID: &str = "html-tailwind";

/// Built-in preset combinations accepted by the API (custom configuration IDs are also valid).
const BUILTIN_PRESETS: &[&str] = &[
    "html-tailwind",
    "shadcn-tailwind",
    "chakraUi-inline",
    "mantine-inline",
];

const PROMPT_DESCRIPTION: &str = "The prompt for the new design. BE AGGRESSIVE with your prompt - \
provide as much context and detail as possible! Include full React code if modifying existing \
components, detailed specifications, styling requirements, behavior descriptions, or any other \
relevant context. The more information you provide, the better the result. No prompt is too long \
or too detailed.";

const MODE_DESCRIPTION: &str = "The mode to use for the new design. 'best' provides higher quality \
results and should be preferred unless you need a quick fix for simple changes. 'fast' is for \
time-sensitive, easy design fixes only. Defaults to 'best'.";

const PRESET_DESCRIPTION: &str = "If nothing is provided, then html-tailwind is used. Can be either \
a default combination ('html-tailwind', 'shadcn-tailwind', 'chakraUi-inline', 'mantine-inline') \
or a custom configuration ID.";

/// Declares a closed set of wire literals.
///
/// Generates the enum, its serde names, and the lookup helpers used by the validators.
macro_rules! wire_literal {
    (
        $(#[$meta:meta])* $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [&'static str] = &[$($wire),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_literal! {
    /// Generation quality/speed trade-off.
    #[derive(Default)]
    DesignMode { Fast => "fast", #[default] Best => "best" }
}

wire_literal! {
    SourceFileType { Javascript => "javascript", Css => "css", Asset => "asset" }
}

wire_literal! {
    CompiledFileType { Javascript => "javascript", Css => "css", Font => "font" }
}

wire_literal! {
    ContentBlockType { Text => "text" }
}

/// Validated arguments of one `create_design` call.
///
/// Optional fields are kept as given; defaults are applied by the request adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolParameters {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DesignMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
}

impl ToolParameters {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            mode: None,
            preset_id: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DesignMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_preset_id(mut self, preset_id: impl Into<String>) -> Self {
        self.preset_id = Some(preset_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: SourceFileType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledFile {
    pub id: String,
    pub file_name: String,
    pub hosted_url: String,
    #[serde(rename = "type")]
    pub kind: CompiledFileType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: ContentBlockType,
    pub text: String,
}

/// Message content: either a plain string or an ordered list of content blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    Plain(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatContent,
}

/// Success value of `create_design`: one generated design bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignResult {
    pub id: String,
    pub source_files: Vec<SourceFile>,
    pub compiled_files: Vec<CompiledFile>,
    pub editor_url: String,
    pub preview_url: String,
    pub chat_messages: Vec<ChatMessage>,
}

/// First structural mismatch found while validating a JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.path, .message))]
pub struct ValidationError {
    /// Location of the offending value (`sourceFiles[1].type`); empty for the root.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

fn render(path: &str, message: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("{path}: {message}")
    }
}

type Validated<T> = std::result::Result<T, ValidationError>;

/// Validate raw tool arguments.
///
/// Structural checks only: types, enum membership, requiredness, and a non-empty `prompt`.
/// Unknown keys are ignored. No defaults are substituted.
///
/// # Errors
///
/// Returns the first mismatch found.
pub fn validate_parameters(raw: &Value) -> Validated<ToolParameters> {
    let obj = object(raw, "")?;

    let prompt = string(required(obj, "prompt", "")?, "prompt")?;
    if prompt.is_empty() {
        return Err(ValidationError::new("prompt", "must not be empty"));
    }

    let mode = obj
        .get("mode")
        .map(|v| literal(v, "mode", DesignMode::ALL, DesignMode::from_wire))
        .transpose()?;

    let preset_id = obj
        .get("presetId")
        .map(|v| string(v, "presetId"))
        .transpose()?;

    Ok(ToolParameters {
        prompt,
        mode,
        preset_id,
    })
}

/// Validate a response body from the design API.
///
/// Extra fields are ignored at every level; anything else that deviates from the declared
/// shape is rejected as a whole.
///
/// # Errors
///
/// Returns the first mismatch found, in field declaration order.
pub fn validate_result(raw: &Value) -> Validated<DesignResult> {
    let obj = object(raw, "")?;

    let id = string(required(obj, "id", "")?, "id")?;
    let source_files = items(required(obj, "sourceFiles", "")?, "sourceFiles", source_file)?;
    let compiled_files = items(
        required(obj, "compiledFiles", "")?,
        "compiledFiles",
        compiled_file,
    )?;
    let editor_url = string(required(obj, "editorUrl", "")?, "editorUrl")?;
    let preview_url = string(required(obj, "previewUrl", "")?, "previewUrl")?;
    let chat_messages = items(
        required(obj, "chatMessages", "")?,
        "chatMessages",
        chat_message,
    )?;

    Ok(DesignResult {
        id,
        source_files,
        compiled_files,
        editor_url,
        preview_url,
        chat_messages,
    })
}

fn source_file(v: &Value, path: &str) -> Validated<SourceFile> {
    let obj = object(v, path)?;
    Ok(SourceFile {
        id: string(required(obj, "id", path)?, &child(path, "id"))?,
        name: string(required(obj, "name", path)?, &child(path, "name"))?,
        code: string(required(obj, "code", path)?, &child(path, "code"))?,
        kind: literal(
            required(obj, "type", path)?,
            &child(path, "type"),
            SourceFileType::ALL,
            SourceFileType::from_wire,
        )?,
    })
}

fn compiled_file(v: &Value, path: &str) -> Validated<CompiledFile> {
    let obj = object(v, path)?;
    Ok(CompiledFile {
        id: string(required(obj, "id", path)?, &child(path, "id"))?,
        file_name: string(required(obj, "fileName", path)?, &child(path, "fileName"))?,
        hosted_url: string(required(obj, "hostedUrl", path)?, &child(path, "hostedUrl"))?,
        kind: literal(
            required(obj, "type", path)?,
            &child(path, "type"),
            CompiledFileType::ALL,
            CompiledFileType::from_wire,
        )?,
    })
}

fn chat_message(v: &Value, path: &str) -> Validated<ChatMessage> {
    let obj = object(v, path)?;
    let role = string(required(obj, "role", path)?, &child(path, "role"))?;

    let content_path = child(path, "content");
    let raw_content = required(obj, "content", path)?;
    let content = match raw_content {
        Value::String(s) => ChatContent::Plain(s.clone()),
        Value::Array(_) => ChatContent::Blocks(items(raw_content, &content_path, content_block)?),
        other => {
            return Err(ValidationError::new(
                &content_path,
                format!(
                    "expected a string or an array of content blocks, got {}",
                    json_type(other)
                ),
            ));
        }
    };

    Ok(ChatMessage { role, content })
}

fn content_block(v: &Value, path: &str) -> Validated<ContentBlock> {
    let obj = object(v, path)?;
    Ok(ContentBlock {
        kind: literal(
            required(obj, "type", path)?,
            &child(path, "type"),
            ContentBlockType::ALL,
            ContentBlockType::from_wire,
        )?,
        text: string(required(obj, "text", path)?, &child(path, "text"))?,
    })
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn object<'a>(v: &'a Value, path: &str) -> Validated<&'a Map<String, Value>> {
    v.as_object().ok_or_else(|| {
        ValidationError::new(path, format!("expected an object, got {}", json_type(v)))
    })
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Validated<&'a Value> {
    obj.get(key)
        .ok_or_else(|| ValidationError::new(&child(path, key), "missing required field"))
}

fn string(v: &Value, path: &str) -> Validated<String> {
    v.as_str().map(str::to_string).ok_or_else(|| {
        ValidationError::new(path, format!("expected a string, got {}", json_type(v)))
    })
}

fn literal<T>(
    v: &Value,
    path: &str,
    allowed: &[&str],
    parse: impl Fn(&str) -> Option<T>,
) -> Validated<T> {
    let expected = allowed
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    match v.as_str() {
        Some(s) => parse(s).ok_or_else(|| {
            ValidationError::new(path, format!("expected one of {expected}, got \"{s}\""))
        }),
        None => Err(ValidationError::new(
            path,
            format!("expected one of {expected}, got {}", json_type(v)),
        )),
    }
}

fn items<T>(v: &Value, path: &str, item: fn(&Value, &str) -> Validated<T>) -> Validated<Vec<T>> {
    let arr = v.as_array().ok_or_else(|| {
        ValidationError::new(path, format!("expected an array, got {}", json_type(v)))
    })?;
    arr.iter()
        .enumerate()
        .map(|(i, v)| item(v, &format!("{path}[{i}]")))
        .collect()
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON Schema of the tool arguments.
#[must_use]
pub fn input_schema() -> JsonObject {
    into_object(json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "minLength": 1,
                "description": PROMPT_DESCRIPTION,
            },
            "mode": {
                "type": "string",
                "enum": DesignMode::ALL,
                "default": DesignMode::default().as_str(),
                "description": MODE_DESCRIPTION,
            },
            "presetId": {
                "type": "string",
                "default": DEFAULT_PRESET_ID,
                "examples": BUILTIN_PRESETS,
                "description": PRESET_DESCRIPTION,
            },
        },
        "required": ["prompt"],
    }))
}

/// JSON Schema of the structured success result.
#[must_use]
pub fn output_schema() -> JsonObject {
    let source_file = object_schema(
        &[
            ("id", string_schema("Unique identifier for the source file")),
            ("name", string_schema("Name of the source file")),
            ("code", string_schema("The actual source code content")),
            (
                "type",
                literal_schema(SourceFileType::ALL, "The type of source file"),
            ),
        ],
    );

    let compiled_file = object_schema(
        &[
            (
                "id",
                string_schema("Unique identifier for the compiled file"),
            ),
            ("fileName", string_schema("Name of the compiled file")),
            (
                "hostedUrl",
                url_schema("URL where the compiled file is hosted"),
            ),
            (
                "type",
                literal_schema(CompiledFileType::ALL, "The type of compiled file"),
            ),
        ],
    );

    let content_block = object_schema(
        &[
            (
                "type",
                literal_schema(ContentBlockType::ALL, "The type of content block"),
            ),
            ("text", string_schema("The text content of the block")),
        ],
    );

    let chat_message = object_schema(
        &[
            (
                "role",
                string_schema("The role of the message sender (e.g. user, assistant)"),
            ),
            (
                "content",
                json!({
                    "anyOf": [
                        { "type": "string" },
                        { "type": "array", "items": content_block },
                    ],
                    "description": "The content of the message - can be a string or array of content blocks",
                }),
            ),
        ],
    );

    into_object(object_schema(
        &[
            ("id", string_schema("The unique ID of the created design")),
            (
                "sourceFiles",
                array_schema(source_file, "The source files for the design"),
            ),
            (
                "compiledFiles",
                array_schema(compiled_file, "The compiled/processed files for the design"),
            ),
            ("editorUrl", url_schema("URL to access the editor interface")),
            (
                "previewUrl",
                url_schema("URL to preview the generated design"),
            ),
            (
                "chatMessages",
                array_schema(chat_message, "The conversation history for this design"),
            ),
        ],
    ))
}

fn string_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn url_schema(description: &str) -> Value {
    json!({ "type": "string", "format": "uri", "description": description })
}

fn literal_schema(values: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}

fn array_schema(items: Value, description: &str) -> Value {
    json!({ "type": "array", "items": items, "description": description })
}

fn object_schema(properties: &[(&str, Value)]) -> Value {
    let props: Map<String, Value> = properties
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect();
    let required: Vec<&str> = properties.iter().map(|(k, _)| *k).collect();

    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

fn into_object(v: Value) -> JsonObject {
    match v {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

/// Capability hints: the tool creates a design (side effect) but never deletes anything.
#[must_use]
pub fn annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(false),
        destructive_hint: Some(false),
        // Every call creates a new design.
        idempotent_hint: Some(false),
        open_world_hint: Some(true),
    }
}

/// The complete MCP tool declaration.
#[must_use]
pub fn tool() -> Tool {
    let mut tool = Tool::new(TOOL_NAME, TOOL_DESCRIPTION, Arc::new(input_schema()));
    tool.output_schema = Some(Arc::new(output_schema()));
    tool.annotations = Some(annotations());
    tool
}

#[cfg(test)]
mod tests {
    use super::*;
    use magic_patterns_test_support::design_result_fixture;

    fn assert_described(schema: &Value, path: &str) {
        if let Some(props) = schema.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                let p = format!("{path}.{name}");
                let desc = prop.get("description").and_then(Value::as_str);
                assert!(
                    desc.is_some_and(|d| !d.trim().is_empty()),
                    "{p} has no description"
                );
                assert_described(prop, &p);
            }
        }
        if let Some(items) = schema.get("items") {
            assert_described(items, &format!("{path}[]"));
        }
        if let Some(any_of) = schema.get("anyOf").and_then(Value::as_array) {
            for alt in any_of {
                assert_described(alt, path);
            }
        }
    }

    #[test]
    fn every_schema_property_has_a_description() {
        assert_described(&Value::Object(input_schema()), "input");
        assert_described(&Value::Object(output_schema()), "output");
    }

    #[test]
    fn input_schema_requires_prompt_and_documents_defaults() {
        let schema = Value::Object(input_schema());
        assert_eq!(schema["required"], json!(["prompt"]));
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["fast", "best"]));
        assert_eq!(schema["properties"]["mode"]["default"], json!("best"));
        assert_eq!(DesignMode::default(), DesignMode::Best);
        assert_eq!(
            schema["properties"]["presetId"]["default"],
            json!("html-tailwind")
        );
    }

    #[test]
    fn preset_schema_lists_builtin_presets() {
        let schema = Value::Object(input_schema());
        let preset = &schema["properties"]["presetId"];
        assert_eq!(preset["examples"], json!(BUILTIN_PRESETS));
        assert!(BUILTIN_PRESETS.contains(&DEFAULT_PRESET_ID));
        for name in BUILTIN_PRESETS {
            assert!(PRESET_DESCRIPTION.contains(name), "{name} not documented");
        }
    }

    #[test]
    fn prompt_schema_and_validator_agree() {
        let schema = Value::Object(input_schema());
        let min_len = schema["properties"]["prompt"]["minLength"]
            .as_u64()
            .expect("minLength");

        for prompt in ["", " ", "   ", "a"] {
            let schema_accepts = prompt.chars().count() as u64 >= min_len;
            let validator_accepts = validate_parameters(&json!({ "prompt": prompt })).is_ok();
            assert_eq!(schema_accepts, validator_accepts, "prompt {prompt:?}");
        }

        let params = validate_parameters(&json!({ "prompt": " " })).expect("whitespace prompt");
        assert_eq!(params.prompt, " ");
    }

    #[test]
    fn tool_is_not_read_only_and_not_destructive() {
        let tool = tool();
        assert_eq!(tool.name, TOOL_NAME);
        let annotations = tool.annotations.expect("annotations");
        assert_eq!(annotations.read_only_hint, Some(false));
        assert_eq!(annotations.destructive_hint, Some(false));
        assert!(tool.output_schema.is_some());
    }

    #[test]
    fn validate_parameters_leaves_optional_fields_unset() {
        let params = validate_parameters(&json!({ "prompt": "a pricing page" })).expect("valid");
        assert_eq!(params, ToolParameters::new("a pricing page"));
    }

    #[test]
    fn validate_parameters_reads_all_fields() {
        let params = validate_parameters(&json!({
            "prompt": "a login form",
            "mode": "fast",
            "presetId": "shadcn-tailwind",
            "extra": true,
        }))
        .expect("valid");
        assert_eq!(params.mode, Some(DesignMode::Fast));
        assert_eq!(params.preset_id.as_deref(), Some("shadcn-tailwind"));
    }

    #[test]
    fn validate_parameters_rejects_missing_or_blank_prompt() {
        let err = validate_parameters(&json!({})).unwrap_err();
        assert_eq!(err.path, "prompt");
        assert_eq!(err.message, "missing required field");

        let err = validate_parameters(&json!({ "prompt": "" })).unwrap_err();
        assert_eq!(err.to_string(), "prompt: must not be empty");

        let err = validate_parameters(&json!({ "prompt": 7 })).unwrap_err();
        assert_eq!(err.to_string(), "prompt: expected a string, got number");
    }

    #[test]
    fn validate_parameters_rejects_unknown_mode_and_bad_types() {
        let err = validate_parameters(&json!({ "prompt": "x", "mode": "slow" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"mode: expected one of "fast", "best", got "slow""#
        );

        let err = validate_parameters(&json!({ "prompt": "x", "presetId": null })).unwrap_err();
        assert_eq!(err.to_string(), "presetId: expected a string, got null");

        let err = validate_parameters(&json!(["prompt"])).unwrap_err();
        assert_eq!(err.to_string(), "expected an object, got array");
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn validate_result_roundtrip_preserves_fields_and_order() {
        let fixture = design_result_fixture();
        let result = validate_result(&fixture).expect("fixture is valid");

        assert_eq!(result.source_files.len(), 2);
        assert_eq!(result.compiled_files.len(), 1);
        assert_eq!(result.chat_messages.len(), 3);
        assert!(matches!(
            result.chat_messages[1].content,
            ChatContent::Blocks(ref b) if b.len() == 2
        ));

        let back = serde_json::to_value(&result).expect("serialize");
        assert_eq!(back, fixture);
    }

    #[test]
    fn validate_result_ignores_unknown_fields() {
        let mut fixture = design_result_fixture();
        fixture["createdAt"] = json!("2024-01-01");
        fixture["sourceFiles"][0]["size"] = json!(12);
        let result = validate_result(&fixture).expect("extra fields are ignored");
        let back = serde_json::to_value(&result).expect("serialize");
        assert!(back.get("createdAt").is_none());
    }

    #[test]
    fn validate_result_reports_first_mismatch_with_path() {
        let mut missing = design_result_fixture();
        missing
            .as_object_mut()
            .expect("object")
            .remove("editorUrl");
        let err = validate_result(&missing).unwrap_err();
        assert_eq!(err.to_string(), "editorUrl: missing required field");

        let mut wrong_literal = design_result_fixture();
        wrong_literal["sourceFiles"][1]["type"] = json!("html");
        let err = validate_result(&wrong_literal).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"sourceFiles[1].type: expected one of "javascript", "css", "asset", got "html""#
        );

        let mut wrong_block = design_result_fixture();
        wrong_block["chatMessages"][1]["content"][0]["type"] = json!("image");
        let err = validate_result(&wrong_block).unwrap_err();
        assert_eq!(err.path, "chatMessages[1].content[0].type");

        let mut wrong_content = design_result_fixture();
        wrong_content["chatMessages"][0]["content"] = json!(42);
        let err = validate_result(&wrong_content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "chatMessages[0].content: expected a string or an array of content blocks, got number"
        );

        let mut wrong_element = design_result_fixture();
        wrong_element["compiledFiles"][0] = json!("bundle.js");
        let err = validate_result(&wrong_element).unwrap_err();
        assert_eq!(err.to_string(), "compiledFiles[0]: expected an object, got string");
    }
}

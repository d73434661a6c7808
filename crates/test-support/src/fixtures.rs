use serde_json::{Value, json};

/// A well-formed design API response: 2 source files, 1 compiled file, 3 chat messages (the
/// second one with block content).
#[must_use]
pub fn design_result_fixture() -> Value {
    json!({
        "id": "design-fixture",
        "sourceFiles": [
            {
                "id": "src-1",
                "name": "App.tsx",
                "code": "export default function App() { return <main className=\"p-4\" />; }",
                "type": "javascript"
            },
            {
                "id": "src-2",
                "name": "index.css",
                "code": "@tailwind base;",
                "type": "css"
            }
        ],
        "compiledFiles": [
            {
                "id": "out-1",
                "fileName": "bundle.js",
                "hostedUrl": "https://cdn.example.com/designs/design-fixture/bundle.js",
                "type": "javascript"
            }
        ],
        "editorUrl": "https://www.magicpatterns.com/c/design-fixture",
        "previewUrl": "https://preview.example.com/design-fixture",
        "chatMessages": [
            { "role": "user", "content": "A pricing page with three tiers" },
            {
                "role": "assistant",
                "content": [
                    { "type": "text", "text": "Here is your pricing page." },
                    { "type": "text", "text": "I used a three-column grid." }
                ]
            },
            { "role": "assistant", "content": "Let me know if you want changes." }
        ]
    })
}

/// A minimal valid response tagged with `id` whose first chat message echoes `prompt`.
#[must_use]
pub fn design_result_for(id: &str, prompt: &str) -> Value {
    json!({
        "id": id,
        "sourceFiles": [],
        "compiledFiles": [],
        "editorUrl": format!("https://www.magicpatterns.com/c/{id}"),
        "previewUrl": format!("https://preview.example.com/{id}"),
        "chatMessages": [
            { "role": "user", "content": prompt }
        ]
    })
}

//! Reply extraction
//!
//! The Responses API and compatible gateways do not agree on where the reply
//! text lives. Extraction tries an ordered list of strategies over the raw
//! JSON body; the first one that yields non-empty text wins.
//!
//! Order:
//! 1. `output_text`
//! 2. `output[].content[].text`, then `output[].text`
//! 3. `choices[0].message.content` (Chat Completions shape)
//! 4. `refusal`, anywhere a message would carry it
//! 5. the longest string found under `output`

use serde_json::Value;

type Strategy = fn(&Value) -> Option<String>;

/// Named strategies in the order they are tried
const STRATEGIES: &[(&str, Strategy)] = &[
    ("output_text", output_text),
    ("output_content", output_content),
    ("chat_choices", chat_choices),
    ("refusal", refusal),
    ("longest_output_string", longest_output_string),
];

/// Extracts the reply text from a response body
///
/// Returns `None` when no strategy matched.
pub fn extract_reply(body: &Value) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let reply = strategy(body)?;
        tracing::trace!(strategy = *name, "Reply extracted");
        Some(reply)
    })
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn output_text(body: &Value) -> Option<String> {
    body.get("output_text").and_then(Value::as_str).and_then(non_empty)
}

fn output_content(body: &Value) -> Option<String> {
    let output = body.get("output")?.as_array()?;

    let from_content: Vec<&str> = output
        .iter()
        .filter_map(|item| item.get("content")?.as_array())
        .flatten()
        .filter_map(|part| part.get("text")?.as_str())
        .collect();
    if let Some(text) = non_empty(&from_content.join("")) {
        return Some(text);
    }

    output
        .iter()
        .filter_map(|item| item.get("text")?.as_str())
        .find_map(non_empty)
}

fn chat_choices(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .and_then(non_empty)
}

fn refusal(body: &Value) -> Option<String> {
    let direct = body.get("refusal").and_then(Value::as_str);
    let in_choice = || body.pointer("/choices/0/message/refusal").and_then(Value::as_str);
    let in_output = || {
        body.get("output")?
            .as_array()?
            .iter()
            .filter_map(|item| item.get("content")?.as_array())
            .flatten()
            .find_map(|part| part.get("refusal")?.as_str())
    };

    let reason = direct.or_else(in_choice).or_else(in_output)?;
    non_empty(reason).map(|r| format!("I can't help with that request: {r}"))
}

fn longest_output_string(body: &Value) -> Option<String> {
    let mut longest: Option<&str> = None;
    collect_longest(body.get("output")?, &mut longest);
    longest.and_then(non_empty)
}

fn collect_longest<'a>(value: &'a Value, longest: &mut Option<&'a str>) {
    match value {
        Value::String(s) => {
            if longest.map_or(true, |l| s.trim().len() > l.trim().len()) {
                *longest = Some(s.as_str());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_longest(v, longest)),
        Value::Object(map) => map
            .iter()
            // Identifiers and enum tags are never the reply
            .filter(|(k, _)| !matches!(k.as_str(), "id" | "type" | "role" | "status" | "model"))
            .for_each(|(_, v)| collect_longest(v, longest)),
        _ => {}
    }
}

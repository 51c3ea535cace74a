// Shared prompt fragments for structured completions.
// Each agent module keeps its own prompts.rs; this file only holds the
// schema wrappers the gateway appends to every structured call.

use crate::llm_client::schema::OutputSchema;

/// Default system prompt for structured calls when the caller gives none.
pub const STRUCTURED_SYSTEM: &str = "You are a helpful assistant that always responds \
    with valid JSON matching the requested schema.";

/// System prompt for the stricter re-prompt after an unparseable response.
pub const STRICT_SYSTEM: &str = "You must respond with only valid JSON matching the schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Appends the schema description to `prompt` for the first structured attempt.
pub fn schema_prompt(prompt: &str, schema: &OutputSchema) -> String {
    format!(
        "{prompt}\n\n\
        Important: Provide your response in valid JSON format following this schema:\n\
        {}\n\
        Ensure the response is a properly formatted JSON object with no trailing commas or comments.",
        schema.describe()
    )
}

/// Builds the more directive prompt used once after a parse failure.
pub fn strict_schema_prompt(prompt: &str, schema: &OutputSchema) -> String {
    format!(
        "{prompt}\n\n\
        CRITICAL: Your response MUST be a valid JSON object. \
        Do not include any additional text, markdown, or explanations. \
        Use exactly this structure:\n{}",
        schema.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_prompt_embeds_field_names() {
        let schema = OutputSchema::new()
            .scalar("summary", "string")
            .list("skills", "list of skills");
        let prompt = schema_prompt("Analyze this CV", &schema);
        assert!(prompt.starts_with("Analyze this CV"));
        assert!(prompt.contains("\"summary\""));
        assert!(prompt.contains("\"skills\""));
        assert!(prompt.contains("valid JSON"));
    }

    #[test]
    fn test_strict_prompt_is_more_directive() {
        let schema = OutputSchema::new().scalar("score", "number between 0 and 100");
        let prompt = strict_schema_prompt("Rate it", &schema);
        assert!(prompt.contains("CRITICAL"));
        assert!(prompt.contains("\"score\""));
    }
}

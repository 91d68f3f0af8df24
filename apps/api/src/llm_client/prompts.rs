// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompts.rs next to it; only cross-cutting pieces live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Safety line appended to every customer-facing health prompt.
pub const HEALTH_SAFETY_INSTRUCTION: &str = "\
    Never diagnose a condition and never present advice as a replacement for \
    medical care. Recommend a professional consultation for serious, chronic, \
    or worsening symptoms.";

/// Builds a system prompt from a role line plus the JSON-only constraint.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_keeps_role_first() {
        let system = json_system("You are a herbal product classifier.");
        assert!(system.starts_with("You are a herbal product classifier."));
        assert!(system.contains("valid JSON only"));
    }
}

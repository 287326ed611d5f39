// Cross-cutting prompt fragments shared by the generation functions.
// Each generator keeps its own templates in generation/prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prose prompt so the output can be pasted as-is.
pub const PLAIN_TEXT_INSTRUCTION: &str = "\
    Return only the final text, ready to send. \
    No title, no markdown, no placeholders in square brackets, no commentary.";

/// Keeps generated material grounded in what the user actually provided.
pub const FACTUALITY_INSTRUCTION: &str = "\
    Use only the facts supplied by the user. Do NOT invent employers, degrees, \
    dates, figures or certifications. If a detail is missing, leave it out.";

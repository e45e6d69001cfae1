//! Prompt assembly for the classifier gateway.

use taxonomy::Candidate;

/// Assembles classification and clarification prompts.
pub struct PromptAssembler;

impl PromptAssembler {
    /// System prompt for choosing one department among the current options.
    pub fn classification_system_prompt() -> String {
        let mut prompt = String::new();

        prompt.push_str("You are a classification assistant for a grievance routing system.\n\n");
        prompt.push_str("Your task:\n");
        prompt.push_str(
            "- Classify the user's grievance into exactly one of the department options listed for the current level.\n",
        );
        prompt.push_str("- Use the query, the options with their summaries, and the conversation so far.\n");
        prompt.push_str(
            "- If no option clearly matches, answer \"not found\" with a null department.\n",
        );
        prompt.push_str("- Copy the chosen department id exactly as listed.\n\n");
        prompt.push_str("Respond ONLY with this JSON object:\n");
        prompt.push_str("{\n");
        prompt.push_str("  \"classified_department\": \"<department id or null>\",\n");
        prompt.push_str("  \"status\": \"found\" or \"not found\"\n");
        prompt.push_str("}\n");

        prompt
    }

    /// System prompt for asking the user a narrowing question.
    pub fn clarification_system_prompt() -> String {
        let mut prompt = String::new();

        prompt.push_str("You are an assistant in a grievance routing system.\n\n");
        prompt.push_str(
            "The user's grievance is not specific enough to choose one of the department options below. ",
        );
        prompt.push_str(
            "Write one clear, concise, friendly question that gets exactly the detail needed to pick an option.\n",
        );
        prompt.push_str("Focus only on the options provided for this level.\n\n");
        prompt.push_str("Respond ONLY with this JSON object:\n");
        prompt.push_str("{\n");
        prompt.push_str("  \"clarifying_question\": \"<your follow-up question>\"\n");
        prompt.push_str("}\n");

        prompt
    }

    /// The per-level user turn: the query plus the options to choose from.
    pub fn level_prompt(query: &str, candidates: &[Candidate]) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("User Query: {}\n\n", query));
        prompt.push_str("Current Level Department Options (id and summary):\n");

        if candidates.is_empty() {
            prompt.push_str("(no options available at this level)\n");
        }
        for candidate in candidates {
            if candidate.summary.is_empty() {
                prompt.push_str(&format!("- {}\n", candidate.id));
            } else {
                prompt.push_str(&format!("- {}: {}\n", candidate.id, candidate.summary));
            }
        }

        prompt
    }
}

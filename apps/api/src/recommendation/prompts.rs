// Prompt text for the health quiz advice call.

use crate::llm_client::prompts::HEALTH_SAFETY_INSTRUCTION;
use crate::models::quiz::HealthQuizInput;

/// Role line for the advice system prompt.
pub const QUIZ_ADVICE_ROLE: &str =
    "You are a knowledgeable herbalist and wellness advisor for a retailer of \
    high-quality herbal products.";

/// Response schema and guidelines appended after the customer details.
const QUIZ_ADVICE_SCHEMA: &str = r#"
Based on this information, provide personalized recommendations as a JSON object with this EXACT schema:
{
  "general_advice": [
    "Evidence-based general health advice point 1",
    "Evidence-based general health advice point 2",
    "Evidence-based general health advice point 3"
  ],
  "herbal_categories": [
    "Category 1 of herbs that might be helpful",
    "Category 2 of herbs that might be helpful"
  ],
  "lifestyle_suggestions": [
    "Dietary suggestion",
    "Exercise or lifestyle suggestion",
    "Stress management suggestion"
  ],
  "follow_up_questions": [
    "Question to help them think deeper about their health",
    "Question about potential underlying causes"
  ],
  "consultation_needed": false,
  "reasoning": "Brief explanation of the recommendations"
}

Guidelines:
- Provide evidence-based, safe recommendations
- Focus on herbal and natural approaches
- Be specific and actionable
- Consider what they have already tried to avoid repetition
"#;

/// Builds the user prompt for one quiz. Optional fields are only included
/// when present.
pub fn build_quiz_advice_prompt(quiz: &HealthQuizInput) -> String {
    let mut prompt = format!(
        "A customer has provided the following information about their health concerns:\n\n\
         Health Issue: {}\n\n",
        quiz.health_issue_description.trim()
    );

    if let Some(tried) = &quiz.tried_already {
        prompt.push_str(&format!("What they've tried before: {tried}\n\n"));
    }
    if let Some(main) = quiz.main_area() {
        prompt.push_str(&format!("Primary health focus: {main}\n"));
    }
    let others = quiz.primary_health_areas.get(1..).unwrap_or_default();
    if !others.is_empty() {
        prompt.push_str(&format!("Additional health focus: {}\n", others.join(", ")));
    }
    if let Some(age) = &quiz.age_range {
        prompt.push_str(&format!("Age range: {age}\n"));
    }
    if let Some(severity) = quiz.severity_level {
        prompt.push_str(&format!("Severity level (1-10): {severity}\n"));
    }
    if let Some(lifestyle) = &quiz.lifestyle_factors {
        prompt.push_str(&format!("Lifestyle: {lifestyle}\n"));
    }

    prompt.push_str(QUIZ_ADVICE_SCHEMA);
    prompt.push_str("- ");
    prompt.push_str(HEALTH_SAFETY_INSTRUCTION.trim());
    prompt.push('\n');
    prompt
}

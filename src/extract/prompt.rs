use crate::bundle::ExtractionContext;
use crate::extract::streaming::NOTE_MARKER;
use std::fmt::Write;

/// Shared output contract appended to every recipe prompt. The wording is not
/// part of the subsystem contract, but its structural effect is: numeric
/// amounts, a confidence score, and a JSON `error` object when no recipe is
/// identifiable.
const OUTPUT_CONTRACT: &str = r#"Respond with a single JSON object:
{
  "title": string,
  "description": string (optional),
  "ingredients": [{"name": string, "amount": number, "unit": string, "optional": boolean (optional)}],
  "instructions": [string],
  "servings": number (optional),
  "prepTime": string (optional),
  "cookTime": string (optional),
  "difficulty": string (optional),
  "cuisine": string (optional),
  "category": string (optional),
  "tags": [string] (optional),
  "confidence": number between 0 and 1
}
Convert all amounts to numbers: fractions become decimals ("1/2" -> 0.5) and
number words become digits ("two" -> 2). Estimate any missing amount instead
of omitting the ingredient. Use confidence 0.85 or higher when the source
documents the recipe well, and 0.5 to 0.7 when you had to reconstruct steps.
If no recipe can be identified at all, respond with exactly:
{"error": "brief reason", "confidence": 0}"#;

fn evidence_summary(context: &ExtractionContext) -> String {
    let mut summary = String::from("Available evidence: text context below");
    if context.used_video {
        summary.push_str(", plus the attached source video");
    } else if !context.media_parts.is_empty() {
        summary.push_str(", plus an attached thumbnail image");
    }
    summary.push('.');
    summary
}

fn authority_rule(context: &ExtractionContext) -> &'static str {
    if context.caption_is_authoritative {
        "The caption contains the recipe. Treat the caption as the primary source; \
         use video or image content only to fill gaps the caption leaves open."
    } else {
        "Prefer the video or image content when it conflicts with the text; \
         the text evidence is secondary."
    }
}

/// Prompt for the non-streaming extraction call.
#[must_use]
pub fn batch_prompt(context: &ExtractionContext) -> String {
    let mut prompt = String::from(
        "You are a recipe extraction engine. Extract one complete recipe from the \
         evidence below.\n\n",
    );
    let _ = writeln!(prompt, "{}", evidence_summary(context));
    let _ = writeln!(prompt, "{}\n", authority_rule(context));
    let _ = writeln!(prompt, "{}\n", context.context_text());
    prompt.push_str(OUTPUT_CONTRACT);
    prompt
}

/// Prompt for the streaming variant: same extraction contract, preceded by
/// the line protocol the [`StreamScanner`](crate::extract::StreamScanner)
/// understands.
#[must_use]
pub fn streaming_prompt(context: &ExtractionContext) -> String {
    let mut prompt = String::from(
        "You are a recipe extraction engine. Extract one complete recipe from the \
         evidence below.\n\n\
         While you work, narrate short observations, one per line, each line \
         starting with \"",
    );
    prompt.push_str(NOTE_MARKER);
    prompt.push_str(
        "\" (for example \">> spotting the ingredient list in the caption\"). \
         When you are done observing, output the final JSON inside a ```json \
         fenced block and nothing after it.\n\n",
    );
    let _ = writeln!(prompt, "{}", evidence_summary(context));
    let _ = writeln!(prompt, "{}\n", authority_rule(context));
    let _ = writeln!(prompt, "{}\n", context.context_text());
    prompt.push_str(OUTPUT_CONTRACT);
    prompt
}

/// Prompt for the portion/image-analysis variant.
#[must_use]
pub fn portion_prompt() -> String {
    r#"Analyze the attached photo of a plated dish. Respond with a single JSON object:
{
  "detectedItems": [{"name": string, "estimatedCalories": number, "portion": string (optional)}],
  "suggestedServings": number,
  "totalEstimatedCalories": number,
  "recommendations": [string]
}
Estimate calories per visible item. If no food is visible, respond with exactly:
{"error": "brief reason", "confidence": 0}"#
        .to_string()
}

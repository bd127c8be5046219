use regex::Regex;
use std::sync::LazyLock;

/// Captions shorter than this cannot carry a full recipe.
pub const MIN_AUTHORITATIVE_CAPTION_CHARS: usize = 80;

/// Quantity+unit tokens, an "ingredients" header, or fraction+unit tokens.
static INGREDIENT_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \d+\s*(cups?|tbsps?|tablespoons?|tsps?|teaspoons?|oz|ounces?|lbs?|pounds?|grams?|g|kgs?|mls?|litres?|liters?|l|cloves?|sticks?|pinch(es)?)\b
        | \bingredients?\b\s*:?
        | ([\u{00bc}\u{00bd}\u{00be}\u{2153}\u{2154}\u{215b}]|\d+\s*/\s*\d+)\s*(cups?|tbsps?|tsps?|oz|grams?|g)\b
        ",
    )
    .expect("ingredient signal pattern is valid")
});

/// Step/direction/method headers or cooking action verbs.
static INSTRUCTION_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \b(steps?|directions?|instructions?|method)\b\s*:?
        | \b(preheat|saut[e\u{00e9}]|simmer|bake|roast|grill|broil|whisk|stir|chop|dice|mince|slice|knead|fold|sear|boil|fry|season|marinate|drizzle|garnish|combine|sprinkle)\b
        ",
    )
    .expect("instruction signal pattern is valid")
});

/// Decide whether a caption is the authoritative evidence source.
///
/// A caption wins over video only when it is long enough to plausibly hold a
/// recipe AND shows both an ingredient signal and an instruction signal.
/// Either signal alone is insufficient: ingredient lists without method text
/// are routinely pasted under videos whose steps differ from the caption.
#[must_use]
pub fn caption_is_authoritative(caption: Option<&str>) -> bool {
    let Some(caption) = caption else {
        return false;
    };
    if caption.chars().count() < MIN_AUTHORITATIVE_CAPTION_CHARS {
        return false;
    }
    INGREDIENT_SIGNAL.is_match(caption) && INSTRUCTION_SIGNAL.is_match(caption)
}

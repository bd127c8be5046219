use serde::{Deserialize, Serialize};

/// A single recipe ingredient. `amount` is always numeric: the prompt
/// contract makes the model convert fractions and number words before
/// emitting JSON, and this subsystem does not re-validate that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// A fully parsed extraction result. A model payload carrying an `error`
/// field never deserializes into this; it collapses to `None` upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Always in `[0, 1]` per the prompt contract.
    pub confidence: f64,
}

/// One food item detected in a portion-analysis photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    pub name: String,
    #[serde(default)]
    pub estimated_calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion: Option<String>,
}

/// Portion analysis of a plate photo. This result feeds a screen that must
/// always render something, hence the [`PortionAnalysis::empty`] sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortionAnalysis {
    #[serde(default)]
    pub detected_items: Vec<DetectedItem>,
    #[serde(default)]
    pub suggested_servings: u32,
    #[serde(default)]
    pub total_estimated_calories: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl PortionAnalysis {
    /// The safe empty sentinel returned when every analysis attempt fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            detected_items: Vec::new(),
            suggested_servings: 0,
            total_estimated_calories: 0.0,
            recommendations: vec![
                "We couldn't analyze this photo. Try a closer shot with better lighting.".into(),
            ],
        }
    }

    /// Sanity defaulting for model output: at least one serving, and a
    /// non-positive calorie total is recomputed from the detected items.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.suggested_servings = self.suggested_servings.max(1);
        if self.total_estimated_calories <= 0.0 && !self.detected_items.is_empty() {
            self.total_estimated_calories = self
                .detected_items
                .iter()
                .map(|item| item.estimated_calories)
                .sum();
        }
        self
    }
}

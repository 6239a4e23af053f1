use std::collections::HashMap;
use std::convert::TryFrom;

use serde::ser::SerializeMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ClassifierError;
use crate::taxonomy::{CategoryId, CATEGORY_COUNT};

/// A listing ad as submitted for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdInput {
    pub title: String,
    pub description: String,
}

impl AdInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// The text both predictors classify: title and description joined by one space.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// One score per taxonomy category, indexed by `CategoryId`.
///
/// Serialises as a JSON object keyed by slug, in taxonomy order. Because the
/// storage is a fixed array, a value of this type always carries exactly one
/// entry for each of the nine categories.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(try_from = "HashMap<String, f32>")]
pub struct CategoryScores([f32; CATEGORY_COUNT]);

impl CategoryScores {
    pub fn new(scores: [f32; CATEGORY_COUNT]) -> Self {
        Self(scores)
    }

    /// Every category set to `value`.
    pub fn filled(value: f32) -> Self {
        Self([value; CATEGORY_COUNT])
    }

    /// Builds scores from a slice in taxonomy order.
    ///
    /// # Errors
    /// - `PredictionError` if the slice does not hold exactly one score per category
    pub fn from_slice(scores: &[f32]) -> Result<Self, ClassifierError> {
        let array: [f32; CATEGORY_COUNT] = scores.try_into().map_err(|_| {
            ClassifierError::PredictionError(format!(
                "Expected {} scores, got {}",
                CATEGORY_COUNT,
                scores.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn get(&self, category: CategoryId) -> f32 {
        self.0[category.index()]
    }

    pub fn set(&mut self, category: CategoryId, score: f32) {
        self.0[category.index()] = score;
    }

    /// Score for `slug`, or `None` when the slug is not in the taxonomy.
    pub fn get_slug(&self, slug: &str) -> Option<f32> {
        slug.parse::<CategoryId>().ok().map(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, f32)> + '_ {
        CategoryId::ALL.iter().map(move |&id| (id, self.0[id.index()]))
    }

    pub fn len(&self) -> usize {
        CATEGORY_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Highest scoring category. Ties go to the earlier category.
    pub fn argmax(&self) -> CategoryId {
        let mut best = 0;
        for (i, &score) in self.0.iter().enumerate().skip(1) {
            if score > self.0[best] {
                best = i;
            }
        }
        CategoryId::ALL[best]
    }

    pub fn as_array(&self) -> &[f32; CATEGORY_COUNT] {
        &self.0
    }
}

impl Serialize for CategoryScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CATEGORY_COUNT))?;
        for (id, score) in self.iter() {
            map.serialize_entry(id.slug(), &score)?;
        }
        map.end()
    }
}

impl TryFrom<HashMap<String, f32>> for CategoryScores {
    type Error = ClassifierError;

    fn try_from(map: HashMap<String, f32>) -> Result<Self, Self::Error> {
        let mut scores = [0.0; CATEGORY_COUNT];
        let mut seen = [false; CATEGORY_COUNT];
        for (slug, score) in map {
            let id: CategoryId = slug.parse()?;
            scores[id.index()] = score;
            seen[id.index()] = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(ClassifierError::ValidationError(format!(
                "Missing score for category '{}'",
                CategoryId::ALL[missing]
            )));
        }
        Ok(Self(scores))
    }
}

/// The response shape shared by every predictor.
///
/// Built through [`PredictionResult::new`], which derives the display name
/// and the confidence from the category and the scores, so
/// `confidence == all_predictions[category]` holds. Deserialisation checks
/// the same relation and rejects results that break it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub category: CategoryId,
    pub category_name: String,
    pub confidence: f32,
    pub all_predictions: CategoryScores,
}

impl PredictionResult {
    pub fn new(category: CategoryId, all_predictions: CategoryScores) -> Self {
        Self {
            category,
            category_name: category.display_name().to_string(),
            confidence: all_predictions.get(category),
            all_predictions,
        }
    }
}

impl<'de> Deserialize<'de> for PredictionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Fields {
            category: CategoryId,
            category_name: String,
            confidence: f32,
            all_predictions: CategoryScores,
        }

        let fields = Fields::deserialize(deserializer)?;
        let result = PredictionResult::new(fields.category, fields.all_predictions);
        if fields.category_name != result.category_name {
            return Err(D::Error::custom(format!(
                "category_name '{}' does not belong to '{}'",
                fields.category_name, result.category
            )));
        }
        if fields.confidence != result.confidence {
            return Err(D::Error::custom(format!(
                "confidence {} differs from the '{}' score {}",
                fields.confidence, result.category, result.confidence
            )));
        }
        Ok(result)
    }
}

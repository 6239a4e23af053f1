use log::debug;

use super::error::ClassifierError;
use super::prediction::{AdInput, CategoryScores, PredictionResult};
use super::predictor::Predictor;
use crate::taxonomy::CategoryId;

/// Confidence reported when at least one keyword matched.
pub const MATCH_CONFIDENCE: f32 = 0.8;
/// Confidence reported when nothing matched and the fallback category is used.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;
/// Score given to every category that was not predicted.
pub const FLOOR_SCORE: f32 = 0.1;
/// Category predicted when no keyword matched.
pub const FALLBACK_CATEGORY: CategoryId = CategoryId::ApartmentRent;

/// Keywords that mark an ad as belonging to `category`.
///
/// Several keywords are shared between categories (e.g. "مغازه" for both shop
/// categories); taxonomy order decides between them.
pub fn keywords(category: CategoryId) -> &'static [&'static str] {
    match category {
        CategoryId::ShopRent => &["اجاره", "مغازه", "غرفه", "دکان"],
        CategoryId::ShopSale => &["فروش", "مغازه", "غرفه", "دکان"],
        CategoryId::OfficeRent => &["اجاره", "دفتر", "اداری", "مطب", "اتاق کار", "کلینیک"],
        CategoryId::Industrial => &["صنعتی", "کشاورزی", "تجاری", "کارخانه"],
        CategoryId::ApartmentRent => &["اجاره", "آپارتمان", "سوئیت"],
        CategoryId::ApartmentSale => &["فروش", "آپارتمان", "سوئیت"],
        CategoryId::VillaRent => &["اجاره", "ویلا", "خانه", "خانه ویلایی"],
        CategoryId::VillaSale => &["فروش", "ویلا", "خانه", "خانه ویلایی"],
        CategoryId::Land => &["زمین", "پارکینگ", "انباری"],
    }
}

/// Returns every category with at least one keyword in the ad, in taxonomy order.
///
/// An empty title yields no matches without looking at the description.
pub fn suggest_categories(title: &str, description: &str) -> Vec<CategoryId> {
    if title.is_empty() {
        return Vec::new();
    }

    let text = format!("{} {}", title, description).to_lowercase();
    CategoryId::ALL
        .iter()
        .copied()
        .filter(|&category| keywords(category).iter().any(|keyword| text.contains(keyword)))
        .collect()
}

/// Keyword-matching predictor that needs no model artifact.
///
/// The first matching category in taxonomy order wins with confidence 0.8;
/// without any match the ad is filed under `apartment_rent` with confidence
/// 0.3. `all_predictions` gives the winner its confidence and every other
/// category 0.1, so unlike the model's output it does not sum to 1.
///
/// ```
/// use ad_classifier::{AdInput, CategoryId, HeuristicPredictor, Predictor};
///
/// let predictor = HeuristicPredictor::new();
/// let result = predictor.predict(&AdInput::new("اجاره مغازه در مرکز شهر", "مغازه 50 متری"))?;
/// assert_eq!(result.category, CategoryId::ShopRent);
/// assert_eq!(result.confidence, 0.8);
/// # Ok::<(), ad_classifier::ClassifierError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor;

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for HeuristicPredictor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn predict(&self, ad: &AdInput) -> Result<PredictionResult, ClassifierError> {
        let matches = suggest_categories(&ad.title, &ad.description);

        let (category, confidence) = match matches.first() {
            Some(&first) => (first, MATCH_CONFIDENCE),
            None => (FALLBACK_CATEGORY, FALLBACK_CONFIDENCE),
        };
        debug!(
            "Keyword matches {:?}, predicting {} ({})",
            matches, category, confidence
        );

        let mut scores = CategoryScores::filled(FLOOR_SCORE);
        scores.set(category, confidence);
        Ok(PredictionResult::new(category, scores))
    }
}

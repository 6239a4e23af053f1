//! The closed set of ad categories.
//!
//! `CategoryId::ALL` is the only place the category order is written down.
//! The model-backed predictor decodes its logits positionally against that
//! order, and the heuristic predictor walks it for its first-match rule, so
//! every table in the crate is keyed by `CategoryId` rather than by a
//! parallel list of slugs.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Number of categories in the taxonomy.
pub const CATEGORY_COUNT: usize = 9;

/// Identifier of one of the nine ad categories.
///
/// Serialises as its slug, e.g. `CategoryId::ShopRent` <-> `"shop_rent"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    ShopRent,
    ShopSale,
    OfficeRent,
    Industrial,
    ApartmentRent,
    ApartmentSale,
    VillaRent,
    VillaSale,
    Land,
}

impl CategoryId {
    /// All categories in taxonomy order. Index `i` is label `i` of the model.
    pub const ALL: [CategoryId; CATEGORY_COUNT] = [
        CategoryId::ShopRent,
        CategoryId::ShopSale,
        CategoryId::OfficeRent,
        CategoryId::Industrial,
        CategoryId::ApartmentRent,
        CategoryId::ApartmentSale,
        CategoryId::VillaRent,
        CategoryId::VillaSale,
        CategoryId::Land,
    ];

    /// Position of this category in the taxonomy.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Category at position `index`, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Stable machine-readable identifier.
    pub fn slug(self) -> &'static str {
        match self {
            Self::ShopRent => "shop_rent",
            Self::ShopSale => "shop_sale",
            Self::OfficeRent => "office_rent",
            Self::Industrial => "industrial",
            Self::ApartmentRent => "apartment_rent",
            Self::ApartmentSale => "apartment_sale",
            Self::VillaRent => "villa_rent",
            Self::VillaSale => "villa_sale",
            Self::Land => "land",
        }
    }

    /// Persian display name shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ShopRent => "اجاره مغازه و غرفه",
            Self::ShopSale => "فروش مغازه و غرفه",
            Self::OfficeRent => "اجاره دفتر، اتاق اداری، مطب",
            Self::Industrial => "دفتر صنعتی، کشاورزی، تجاری",
            Self::ApartmentRent => "اجاره آپارتمان",
            Self::ApartmentSale => "فروش آپارتمان",
            Self::VillaRent => "اجاره ویلا",
            Self::VillaSale => "فروش ویلا",
            Self::Land => "زمین",
        }
    }

    pub fn category(self) -> Category {
        Category {
            slug: self.slug(),
            name: self.display_name(),
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for CategoryId {
    type Err = ClassifierError;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.slug() == slug)
            .ok_or_else(|| ClassifierError::UnknownCategory(slug.to_string()))
    }
}

/// A taxonomy entry as exposed by the category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub slug: &'static str,
    pub name: &'static str,
}

lazy_static! {
    static ref CATEGORIES: Vec<Category> = CategoryId::ALL.iter().map(|id| id.category()).collect();
}

/// Returns every category in taxonomy order.
pub fn list_categories() -> &'static [Category] {
    &CATEGORIES
}

/// Looks up the display name for `slug`.
///
/// # Errors
/// - `UnknownCategory` if `slug` is not one of the nine taxonomy slugs
pub fn display_name_of(slug: &str) -> Result<&'static str, ClassifierError> {
    slug.parse::<CategoryId>().map(CategoryId::display_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fixed_order() {
        let slugs: Vec<&str> = list_categories().iter().map(|c| c.slug).collect();
        assert_eq!(
            slugs,
            vec![
                "shop_rent",
                "shop_sale",
                "office_rent",
                "industrial",
                "apartment_rent",
                "apartment_sale",
                "villa_rent",
                "villa_sale",
                "land",
            ]
        );
    }

    #[test]
    fn test_slugs_unique() {
        let unique: HashSet<&str> = list_categories().iter().map(|c| c.slug).collect();
        assert_eq!(unique.len(), CATEGORY_COUNT);
    }

    #[test]
    fn test_index_round_trip() {
        for (i, id) in CategoryId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(CategoryId::from_index(i), Some(*id));
        }
        assert_eq!(CategoryId::from_index(CATEGORY_COUNT), None);
    }

    #[test]
    fn test_display_name_lookup() {
        assert_eq!(display_name_of("land").unwrap(), "زمین");
        assert_eq!(display_name_of("apartment_rent").unwrap(), "اجاره آپارتمان");
        assert!(matches!(
            display_name_of("castle_sale"),
            Err(ClassifierError::UnknownCategory(slug)) if slug == "castle_sale"
        ));
    }

    #[test]
    fn test_serde_uses_slug() {
        let json = serde_json::to_string(&CategoryId::OfficeRent).unwrap();
        assert_eq!(json, "\"office_rent\"");
        let back: CategoryId = serde_json::from_str("\"villa_sale\"").unwrap();
        assert_eq!(back, CategoryId::VillaSale);
    }
}

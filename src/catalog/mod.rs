//! Product-reference catalog
//!
//! Cross-reference collaborator for scanned products. Lookups are read-only,
//! simulate non-zero latency, and may legitimately come back empty — callers
//! must treat every answer as advisory.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Broad product grouping used by category lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Snack,
    Dairy,
    Grain,
    Beverage,
}

/// Per-serving nutrient figures for a catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct ProductNutrients {
    pub calories: u32,
    /// grams
    pub protein: f32,
    /// grams
    pub carbohydrates: f32,
    /// grams
    pub sugar: f32,
    /// grams
    pub fat: f32,
    /// milligrams
    pub sodium: f32,
}

/// A known product in the reference catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub category: ProductCategory,
    pub serving_size: String,
    pub nutrients: ProductNutrients,
}

/// Read-only product lookup collaborator
///
/// Implementations must match names by case-insensitive substring
/// containment: a query matches when a catalog entry's name contains the
/// case-folded query.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up a product whose name contains `name` (case-folded)
    ///
    /// # Errors
    ///
    /// Returns error if the lookup itself fails (e.g. timeout)
    async fn find_by_name(&self, name: &str) -> Result<Option<ProductRecord>>;

    /// List all products in a category
    ///
    /// # Errors
    ///
    /// Returns error if the lookup itself fails
    async fn find_by_category(&self, category: ProductCategory) -> Result<Vec<ProductRecord>>;
}

/// In-memory reference catalog seeded with FSSAI-style records
///
/// Stands in for a remote product database; each lookup sleeps for the
/// configured latency before answering.
pub struct ReferenceCatalog {
    entries: Vec<ProductRecord>,
    latency: Duration,
}

impl ReferenceCatalog {
    /// Create a catalog over the given entries
    #[must_use]
    pub fn new(entries: Vec<ProductRecord>, latency: Duration) -> Self {
        Self { entries, latency }
    }

    /// Catalog seeded with the bundled FSSAI-style dataset
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(bundled_records(), Duration::from_millis(500))
    }

    /// Same dataset without the simulated latency, for tests
    #[must_use]
    pub fn bundled_instant() -> Self {
        Self::new(bundled_records(), Duration::ZERO)
    }
}

#[async_trait]
impl ProductCatalog for ReferenceCatalog {
    async fn find_by_name(&self, name: &str) -> Result<Option<ProductRecord>> {
        tokio::time::sleep(self.latency).await;
        let query = name.to_lowercase();
        tracing::debug!(query = %query, "catalog name lookup");
        Ok(self
            .entries
            .iter()
            .find(|p| p.name.to_lowercase().contains(&query))
            .cloned())
    }

    async fn find_by_category(&self, category: ProductCategory) -> Result<Vec<ProductRecord>> {
        tokio::time::sleep(self.latency).await;
        tracing::debug!(?category, "catalog category lookup");
        Ok(self
            .entries
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }
}

/// The bundled mock dataset, mirroring common Indian packaged foods
fn bundled_records() -> Vec<ProductRecord> {
    vec![
        ProductRecord {
            id: "1".to_string(),
            name: "Parle-G Biscuit".to_string(),
            category: ProductCategory::Snack,
            serving_size: "10 biscuits (56g)".to_string(),
            nutrients: ProductNutrients {
                calories: 250,
                protein: 4.0,
                carbohydrates: 42.0,
                sugar: 14.0,
                fat: 8.0,
                sodium: 150.0,
            },
        },
        ProductRecord {
            id: "2".to_string(),
            name: "Amul Butter".to_string(),
            category: ProductCategory::Dairy,
            serving_size: "1 tbsp (14g)".to_string(),
            nutrients: ProductNutrients {
                calories: 100,
                protein: 0.0,
                carbohydrates: 0.0,
                sugar: 0.0,
                fat: 11.0,
                sodium: 90.0,
            },
        },
        ProductRecord {
            id: "3".to_string(),
            name: "Aashirvaad Atta".to_string(),
            category: ProductCategory::Grain,
            serving_size: "1/4 cup (30g)".to_string(),
            nutrients: ProductNutrients {
                calories: 100,
                protein: 3.0,
                carbohydrates: 22.0,
                sugar: 0.0,
                fat: 0.5,
                sodium: 0.0,
            },
        },
        ProductRecord {
            id: "4".to_string(),
            name: "Real Fruit Juice - Mixed".to_string(),
            category: ProductCategory::Beverage,
            serving_size: "200ml".to_string(),
            nutrients: ProductNutrients {
                calories: 110,
                protein: 0.2,
                carbohydrates: 27.0,
                sugar: 25.0,
                fat: 0.0,
                sodium: 10.0,
            },
        },
    ]
}

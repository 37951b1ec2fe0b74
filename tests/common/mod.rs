//! Shared test doubles for the scan and chat pipelines

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use nutriscan::catalog::{ProductCatalog, ProductCategory, ProductRecord};
use nutriscan::scan::{CameraDevice, CameraStream, GenerationService, ImagePayload};
use nutriscan::{Error, Result};

/// Generation service returning a canned response, counting invocations
pub struct MockGeneration {
    response: Mutex<std::result::Result<String, String>>,
    pub calls: Arc<AtomicUsize>,
}

impl MockGeneration {
    pub fn ok(json: &str) -> Self {
        Self {
            response: Mutex::new(Ok(json.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Mutex::new(Err(message.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl GenerationService for MockGeneration {
    async fn generate_structured(
        &self,
        _payload: &ImagePayload,
        _instruction: &str,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::Provider)
    }
}

/// How a mock catalog lookup should behave
#[derive(Clone, Copy)]
pub enum CatalogBehavior {
    /// Substring match against the bundled Parle-G record
    Match,
    /// Lookup succeeds but finds nothing
    Miss,
    /// Lookup fails, e.g. a timeout
    Timeout,
}

/// Catalog double with scripted behavior and an invocation counter
pub struct MockCatalog {
    behavior: CatalogBehavior,
    pub calls: Arc<AtomicUsize>,
}

impl MockCatalog {
    pub fn new(behavior: CatalogBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn find_by_name(&self, name: &str) -> Result<Option<ProductRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            CatalogBehavior::Match => {
                let record = ProductRecord {
                    id: "1".to_string(),
                    name: "Parle-G Biscuit".to_string(),
                    category: ProductCategory::Snack,
                    serving_size: "10 biscuits (56g)".to_string(),
                    nutrients: nutriscan::catalog::ProductNutrients {
                        calories: 250,
                        protein: 4.0,
                        carbohydrates: 42.0,
                        sugar: 14.0,
                        fat: 8.0,
                        sodium: 150.0,
                    },
                };
                Ok(record
                    .name
                    .to_lowercase()
                    .contains(&name.to_lowercase())
                    .then_some(record))
            }
            CatalogBehavior::Miss => Ok(None),
            CatalogBehavior::Timeout => Err(Error::Catalog("lookup timed out".to_string())),
        }
    }

    async fn find_by_category(&self, _category: ProductCategory) -> Result<Vec<ProductRecord>> {
        Ok(Vec::new())
    }
}

/// Camera stream double counting how many times it was stopped
pub struct StubStream {
    frame: Option<Vec<u8>>,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl CameraStream for StubStream {
    async fn capture_frame(&mut self) -> Result<Vec<u8>> {
        self.frame
            .take()
            .ok_or_else(|| Error::Capture("no frame".to_string()))
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Camera device double producing [`StubStream`]s
pub struct StubCamera {
    frame: Vec<u8>,
    pub stops: Arc<AtomicUsize>,
}

impl StubCamera {
    pub fn new(frame: Vec<u8>) -> Self {
        Self {
            frame,
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl CameraDevice for StubCamera {
    async fn open(&self) -> Result<Box<dyn CameraStream>> {
        Ok(Box::new(StubStream {
            frame: Some(self.frame.clone()),
            stops: Arc::clone(&self.stops),
        }))
    }
}

/// A well-formed analysis response for the Parle-G scenario
pub const PARLE_G_RESPONSE: &str = r#"{
    "productName": "Parle-G Biscuit",
    "nutrients": [
        {"name": "Sugar", "value": "14g", "dv": "N/A", "score": "high"}
    ],
    "allergens": ["Gluten"],
    "summary": "A tasty treat, enjoy in moderation!"
}"#;

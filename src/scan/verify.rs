//! Advisory product verification
//!
//! Cross-references an extracted product name against the reference catalog.
//! Never fails the pipeline: misses, timeouts, and lookup errors all fold
//! into `false`.

use std::sync::Arc;

use crate::catalog::ProductCatalog;

/// Flags whether a scanned product exists in the reference catalog
pub struct ProductVerifier {
    catalog: Arc<dyn ProductCatalog>,
}

impl ProductVerifier {
    /// Create a verifier over the given catalog
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    /// Check whether the catalog knows this product name
    ///
    /// Returns `true` iff the lookup succeeds with a match.
    pub async fn verify(&self, product_name: &str) -> bool {
        match self.catalog.find_by_name(product_name).await {
            Ok(Some(record)) => {
                tracing::debug!(product = %record.name, "product verified against catalog");
                true
            }
            Ok(None) => {
                tracing::debug!(query = %product_name, "product not in catalog");
                false
            }
            Err(e) => {
                tracing::warn!(query = %product_name, error = %e, "catalog lookup failed");
                false
            }
        }
    }
}

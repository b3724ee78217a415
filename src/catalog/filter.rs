//! In-memory product filtering

use crate::catalog::types::Product;

/// Predicates applied to a product collection; all given predicates must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or description
    pub text: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Inclusive lower bound, `0` when absent
    pub min_price: Option<f64>,
    /// Inclusive upper bound, unbounded when absent
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn brand(mut self, brand: &str) -> Self {
        self.brand = Some(brand.to_string());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// True when no predicate is set
    pub fn is_empty(&self) -> bool {
        self.search_text().is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    fn search_text(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether a single product passes every predicate
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_with(product, self.search_text().as_deref())
    }

    fn matches_with(&self, product: &Product, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let in_name = product.name.to_lowercase().contains(needle);
            let in_description = product
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }

        if let Some(brand) = &self.brand {
            if &product.brand != brand {
                return false;
            }
        }

        let min = self.min_price.unwrap_or(0.0);
        let max = self.max_price.unwrap_or(f64::INFINITY);
        product.price >= min && product.price <= max
    }

    /// Products passing the filter, in source order
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let needle = self.search_text();
        products
            .iter()
            .filter(|p| self.matches_with(p, needle.as_deref()))
            .cloned()
            .collect()
    }

    /// Query parameters for a server-side search with the same predicates
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            pairs.push(("q".to_string(), text.to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category".to_string(), category.clone()));
        }
        if let Some(brand) = &self.brand {
            pairs.push(("brand".to_string(), brand.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice".to_string(), max.to_string()));
        }
        pairs
    }
}

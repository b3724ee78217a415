//! Two-way binding between catalog filters and URL query parameters.
//!
//! Filters live in the URL so a filtered view can be bookmarked or shared.
//! Only the recognized keys are ever touched; the path and any other
//! parameters pass through unchanged.

use url::{form_urlencoded, Url};

use crate::catalog::ProductFilter;
use crate::error::{Error, Result};

pub const PARAM_SEARCH: &str = "q";
pub const PARAM_BRAND: &str = "brand";
pub const PARAM_MIN_PRICE: &str = "minPrice";
pub const PARAM_MAX_PRICE: &str = "maxPrice";

/// Every query key owned by the binder
pub const FILTER_PARAMS: [&str; 4] = [PARAM_SEARCH, PARAM_BRAND, PARAM_MIN_PRICE, PARAM_MAX_PRICE];

/// Filter state as carried in the query string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FilterParams {
    /// Decode from a raw query string (without the leading `?`).
    ///
    /// Empty values and prices that do not parse are treated as absent, and
    /// so are negative prices. An inverted range drops both bounds. Decoded
    /// state is always something the setters could have produced.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                PARAM_SEARCH => params.q = Some(value.to_string()),
                PARAM_BRAND => params.brand = Some(value.to_string()),
                PARAM_MIN_PRICE => params.min_price = parse_price(value),
                PARAM_MAX_PRICE => params.max_price = parse_price(value),
                _ => {}
            }
        }
        if let (Some(lo), Some(hi)) = (params.min_price, params.max_price) {
            if lo > hi {
                params.min_price = None;
                params.max_price = None;
            }
        }
        params
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_query_string(url.query().unwrap_or(""))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Recognized parameters in canonical order: `q`, `brand`, `minPrice`, `maxPrice`
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = &self.q {
            pairs.push((PARAM_SEARCH, q.clone()));
        }
        if let Some(brand) = &self.brand {
            pairs.push((PARAM_BRAND, brand.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push((PARAM_MIN_PRICE, min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push((PARAM_MAX_PRICE, max.to_string()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_query_pairs())
            .finish()
    }

    pub fn to_product_filter(&self) -> ProductFilter {
        ProductFilter {
            text: self.q.clone(),
            category: None,
            brand: self.brand.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

fn parse_price(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Replace the given keys in `url`, leaving every other parameter in place.
/// `None` removes the key.
fn replace_params(url: &mut Url, updates: &[(&str, Option<String>)]) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !updates.iter().any(|(k, _)| *k == key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let added = updates
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())));

    let all: Vec<(String, String)> = kept.into_iter().chain(added).collect();
    if all.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(all);
    }
}

/// Keeps a URL and the filter state seeded from it in step
#[derive(Debug, Clone)]
pub struct FilterBinder {
    url: Url,
    params: FilterParams,
}

impl FilterBinder {
    pub fn new(url: Url) -> Self {
        let params = FilterParams::from_url(&url);
        Self { url, params }
    }

    pub fn parse(url: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Follow a navigation, reseeding the state from the new URL
    pub fn navigate(&mut self, url: Url) {
        self.params = FilterParams::from_url(&url);
        self.url = url;
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Path plus query, as used for in-app navigation
    pub fn location(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    pub fn set_search(&mut self, text: &str) {
        let text = text.trim();
        self.params.q = (!text.is_empty()).then(|| text.to_string());
        replace_params(&mut self.url, &[(PARAM_SEARCH, self.params.q.clone())]);
    }

    pub fn set_brand(&mut self, brand: &str) {
        let brand = brand.trim();
        self.params.brand = (!brand.is_empty()).then(|| brand.to_string());
        replace_params(&mut self.url, &[(PARAM_BRAND, self.params.brand.clone())]);
    }

    /// Set both price bounds; `None` leaves that side open
    pub fn set_price_range(&mut self, min: Option<f64>, max: Option<f64>) -> Result<()> {
        for bound in [min, max].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(Error::validation("Price bounds must be non-negative numbers"));
            }
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(Error::validation("Minimum price cannot exceed maximum price"));
            }
        }

        self.params.min_price = min;
        self.params.max_price = max;
        replace_params(
            &mut self.url,
            &[
                (PARAM_MIN_PRICE, min.map(|v| v.to_string())),
                (PARAM_MAX_PRICE, max.map(|v| v.to_string())),
            ],
        );
        Ok(())
    }

    pub fn clear_search(&mut self) {
        self.params.q = None;
        replace_params(&mut self.url, &[(PARAM_SEARCH, None)]);
    }

    pub fn clear_brand(&mut self) {
        self.params.brand = None;
        replace_params(&mut self.url, &[(PARAM_BRAND, None)]);
    }

    pub fn clear_price_range(&mut self) {
        self.params.min_price = None;
        self.params.max_price = None;
        replace_params(&mut self.url, &[(PARAM_MIN_PRICE, None), (PARAM_MAX_PRICE, None)]);
    }

    /// Remove every recognized filter parameter, keeping the path
    pub fn clear_all(&mut self) {
        self.params = FilterParams::default();
        let updates: Vec<(&str, Option<String>)> = FILTER_PARAMS.iter().map(|k| (*k, None)).collect();
        replace_params(&mut self.url, &updates);
    }
}

mod common;

use serde_json::json;
use storefront_client::catalog::ProductFilter;
use storefront_client::error::Error;
use storefront_client::query::FilterBinder;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::storefront;

fn products() -> serde_json::Value {
    json!([
        { "_id": "1", "name": "iPhone 15", "brand": "Apple", "category": "phones", "price": 899 },
        { "_id": "2", "name": "Galaxy S24", "brand": "Samsung", "category": "phones", "price": 799 },
        { "_id": "3", "name": "AirPods Pro", "brand": "Apple", "category": "audio", "price": 249 },
        { "_id": "4", "name": "Pixel Buds", "brand": "Google", "category": "audio", "price": 179 }
    ])
}

#[tokio::test]
async fn test_catalog_is_fetched_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let catalog = shop.catalog();

    assert_eq!(catalog.load().await.unwrap().len(), 4);
    assert_eq!(catalog.brands().await.unwrap(), ["Apple", "Google", "Samsung"]);
    assert_eq!(catalog.categories().await.unwrap(), ["audio", "phones"]);
    assert_eq!(catalog.price_bounds().await.unwrap(), Some((179.0, 899.0)));

    let apple = catalog.filter(&ProductFilter::new().brand("Apple")).await.unwrap();
    let ids: Vec<_> = apple.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["1", "3"]);
}

#[tokio::test]
async fn test_filter_from_url_matches_catalog() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": products() })))
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let mut binder = FilterBinder::parse("http://shop.test/products?q=pro&sort=price").unwrap();
    binder.set_brand("Apple");

    let filter = binder.params().to_product_filter();
    let found = shop.catalog().filter(&filter).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "AirPods Pro");
    assert!(binder.location().contains("sort=price"));
}

#[tokio::test]
async fn test_server_search_sends_filter_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("q", "buds"))
        .and(query_param("brand", "Google"))
        .and(query_param("minPrice", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "4", "name": "Pixel Buds", "brand": "Google", "category": "audio", "price": 179 }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let filter = ProductFilter::new()
        .text("buds")
        .brand("Google")
        .price_range(Some(100.0), None);

    let found = shop.catalog().list(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_get_missing_product() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Product not found" })))
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let err = shop.catalog().get("missing").await.unwrap_err();

    match err {
        Error::NotFound(msg) => assert_eq!(msg, "Product missing not found"),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_product_id_stays_one_path_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "a/b?c", "name": "Odd", "brand": "Acme", "category": "misc", "price": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (shop, _) = storefront(&mock_server);
    let product = shop.catalog().get("a/b?c").await.unwrap();
    assert_eq!(product.id, "a/b?c");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.path(), "/api/products/a%2Fb%3Fc");
    assert_eq!(requests[0].url.query(), None);
}

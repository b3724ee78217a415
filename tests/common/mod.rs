#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use storefront_client::auth::{MemoryStorage, Role, Session, SessionStorage, User};
use storefront_client::config::StorefrontConfig;
use storefront_client::Storefront;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: "Test User".to_string(),
        email: format!("{}@example.com", id),
        phone: None,
        address: None,
        role,
    }
}

/// A client pointed at the mock server, with its storage exposed
pub fn storefront(server: &MockServer) -> (Storefront, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let config = StorefrontConfig::new(&server.uri()).unwrap();
    let shop = Storefront::with_storage(config, storage.clone() as Arc<dyn SessionStorage>).unwrap();
    (shop, storage)
}

/// A client with a signed-in user
pub async fn signed_in(server: &MockServer, role: Role) -> Storefront {
    let (shop, _) = storefront(server);
    shop.session()
        .set(Session::new(user("u1", role), TOKEN.to_string(), Duration::from_secs(3600)))
        .await
        .unwrap();
    shop
}

pub fn bearer() -> String {
    format!("Bearer {}", TOKEN)
}

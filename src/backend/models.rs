//! Wire models for the application backend.
//!
//! Decoding is tolerant: collections default to empty and optional columns to
//! `None`, so a partially populated store never fails the whole aggregated
//! load.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One catalog listing (marketplace-wide or store-owned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,

    /// Some backend rows carry `name` instead of `title`.
    #[serde(alias = "name")]
    pub title: String,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Merchant store profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProfile {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default, alias = "name")]
    pub store_name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// One cart line, referencing a catalog item by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: String,

    #[serde(default)]
    pub quantity: u32,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub title: Option<String>,
}

/// The aggregated dataset: four correlated collections fetched in one round
/// trip so cross-references (cart entry -> catalog id) are always consistent
/// within a render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub all_items: Vec<CatalogItem>,

    #[serde(default)]
    pub store_info: Option<StoreProfile>,

    #[serde(default)]
    pub store_items: Vec<CatalogItem>,

    #[serde(default)]
    pub cart_items: Vec<CartEntry>,
}

impl UserData {
    /// Look up the catalog item a cart entry points at, if loaded.
    pub fn catalog_item(&self, product_id: &str) -> Option<&CatalogItem> {
        self.all_items.iter().find(|item| item.id == product_id)
    }
}

/// Source for the multipart `create_item` upload.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub user_id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    /// Original client-side path of the chosen image (backend stores it
    /// alongside the upload).
    pub file_path: String,
    /// Raw image bytes.
    pub file: Bytes,
}

/// Payload of `POST /exchange_public_token`. Anything other than
/// `status == "ok"` is a rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub item_id: Option<String>,
}

impl ExchangeResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_data_decoding() {
        let body = r#"{
            "all_items": [
                { "id": "p1", "title": "Widget", "price": 9.5,
                  "description": "A widget", "image_url": "https://cdn/x.png",
                  "created_at": "2026-01-10T12:00:00Z" },
                { "id": "p2", "name": "Gadget", "price": 19.0 }
            ],
            "store_info": { "id": "s1", "user_id": "u1", "name": "Alice's Shop" },
            "store_items": [
                { "id": "p2", "name": "Gadget", "price": 19.0 }
            ],
            "cart_items": [
                { "product_id": "p1", "quantity": 2, "price": 9.5 }
            ]
        }"#;

        let data: UserData = serde_json::from_str(body).unwrap();

        assert_eq!(data.all_items.len(), 2);
        assert_eq!(data.all_items[1].title, "Gadget");
        assert_eq!(data.store_info.as_ref().unwrap().store_name, "Alice's Shop");
        assert_eq!(data.cart_items[0].product_id, "p1");

        let referenced = data.catalog_item("p1").unwrap();
        assert_eq!(referenced.title, "Widget");
    }

    #[test]
    fn test_user_data_tolerates_missing_collections() {
        let data: UserData = serde_json::from_str(r#"{ "all_items": [] }"#).unwrap();
        assert!(data.store_info.is_none());
        assert!(data.cart_items.is_empty());
        assert!(data.catalog_item("p1").is_none());
    }

    #[test]
    fn test_exchange_status_check() {
        let ok: ExchangeResponse = serde_json::from_str(r#"{ "status": "ok" }"#).unwrap();
        assert!(ok.is_ok());

        let rejected: ExchangeResponse =
            serde_json::from_str(r#"{ "status": "item_locked" }"#).unwrap();
        assert!(!rejected.is_ok());

        let empty: ExchangeResponse = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_ok());
    }
}

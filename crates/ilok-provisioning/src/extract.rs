//! License Item Extraction
//!
//! Walks an order's line items and keeps the ones that can actually be
//! provisioned: a resolvable product, a valid SKU GUID and a licensing
//! account id. Everything else is skipped with a trace, never an error.

use ilok_commerce::{ItemId, LineItem, Order};

use crate::validate::{validate_account_id, validate_sku_guid};

/// Item-level and product-level key carrying the catalog SKU GUID
pub const SKU_GUID_KEY: &str = "_ilok_sku_guid";

/// Item-level key carrying the buyer's licensing account, as checkout labels it
pub const ACCOUNT_ID_KEY: &str = "iLok User ID";

/// Internal fallback key for the licensing account
pub const ACCOUNT_ID_FALLBACK_KEY: &str = "_ilok_user_id";

/// A line item that qualifies for license provisioning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LicensableItem {
    pub item_id: ItemId,
    pub sku_guid: String,
    pub account_id: String,
    pub quantity: u32,
}

/// Resolve an item's SKU GUID: item-level override first, then the product
///
/// Resolution picks the first non-empty value; validation happens once on
/// whatever was picked, so a malformed override is not rescued by a valid
/// product value.
pub fn item_sku_guid(item: &LineItem) -> Option<String> {
    let raw = item
        .meta(SKU_GUID_KEY)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            item.product
                .as_ref()
                .and_then(|p| p.meta(SKU_GUID_KEY))
        })?;

    validate_sku_guid(raw)
}

/// Resolve an item's licensing account id, trying both metadata spellings
pub fn item_account_id(item: &LineItem) -> Option<String> {
    let raw = item
        .meta(ACCOUNT_ID_KEY)
        .filter(|v| !v.is_empty())
        .or_else(|| item.meta(ACCOUNT_ID_FALLBACK_KEY))?;

    validate_account_id(raw)
}

/// Collect the licensable items of an order, preserving item order
pub fn licensable_items(order: &Order) -> Vec<LicensableItem> {
    let mut items = Vec::new();

    for item in &order.items {
        if item.product.is_none() {
            tracing::debug!(
                order_id = order.id,
                item_id = item.id,
                "Item has no resolvable product, skipping"
            );
            continue;
        }

        let Some(sku_guid) = item_sku_guid(item) else {
            tracing::warn!(
                order_id = order.id,
                item_id = item.id,
                "No valid SKU GUID for item, skipping"
            );
            continue;
        };

        let Some(account_id) = item_account_id(item) else {
            tracing::warn!(
                order_id = order.id,
                item_id = item.id,
                "Missing iLok User ID for item"
            );
            continue;
        };

        items.push(LicensableItem {
            item_id: item.id,
            sku_guid,
            account_id,
            quantity: item.quantity,
        });
    }

    items
}

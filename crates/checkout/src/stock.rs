//! Stock reservation and restoration over order items.

use std::sync::Arc;

use domain::OrderItem;
use store::{ProductStore, StoreError};

use crate::error::CheckoutError;

/// Reserves stock for every item, all-or-nothing.
///
/// Items are decremented one by one with the store's atomic conditional
/// decrement; if a later item fails (a concurrent checkout drained the
/// size), the items already reserved are restored before the error is
/// returned, so a failed checkout never leaves inventory partially held.
pub(crate) async fn reserve_items(
    products: &Arc<dyn ProductStore>,
    items: &[OrderItem],
) -> Result<(), CheckoutError> {
    for (index, item) in items.iter().enumerate() {
        let reserved = products
            .reserve_stock(&item.product_id, &item.size, item.quantity)
            .await;

        if let Err(err) = reserved {
            for held in &items[..index] {
                if let Err(restore_err) = products
                    .restore_stock(&held.product_id, &held.size, held.quantity)
                    .await
                {
                    tracing::error!(
                        product_id = %held.product_id,
                        size = %held.size,
                        error = %restore_err,
                        "failed to roll back stock reservation"
                    );
                }
            }
            return Err(map_reserve_error(err));
        }
    }
    Ok(())
}

/// Restores the stock an order reserved: quantity back onto the size,
/// quantity off the sold counter. Products deleted since the order was
/// placed are skipped silently by the store.
pub(crate) async fn restore_items(
    products: &Arc<dyn ProductStore>,
    items: &[OrderItem],
) -> Result<(), CheckoutError> {
    for item in items {
        products
            .restore_stock(&item.product_id, &item.size, item.quantity)
            .await?;
    }
    Ok(())
}

fn map_reserve_error(err: StoreError) -> CheckoutError {
    match err {
        StoreError::NotFound { id, .. } => CheckoutError::ProductUnavailable { product_id: id },
        StoreError::UnknownSize { product_id, size } => {
            CheckoutError::UnknownSize { product_id, size }
        }
        StoreError::InsufficientStock {
            product_id,
            size,
            requested,
            available,
        } => CheckoutError::InsufficientStock {
            product_id,
            size,
            requested,
            available,
        },
        other => CheckoutError::Store(other),
    }
}

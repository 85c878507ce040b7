//! Staging catalog items into the remote cart collection.

use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use crate::catalog::CatalogItem;
use crate::error::CartWriteError;
use crate::notify::{Alert, Notifier};

/// Append-only destination for cart documents.
pub trait CartSink: Send + Sync {
  /// Create a new document from `fields`, returning its store-assigned id.
  fn append(
    &self,
    fields: Map<String, Value>,
  ) -> impl Future<Output = Result<String, CartWriteError>> + Send;
}

/// A successfully written cart document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartReceipt {
  /// Id of the new cart document, unrelated to the item id
  pub document_id: String,
}

pub struct CartWriter<S: CartSink, N: Notifier> {
  sink: S,
  notifier: N,
  deadline: Duration,
}

impl<S: CartSink, N: Notifier> CartWriter<S, N> {
  pub fn new(sink: S, notifier: N, deadline: Duration) -> Self {
    Self {
      sink,
      notifier,
      deadline,
    }
  }

  /// Write a copy of `item` to the cart and tell the user how it went.
  ///
  /// Every call creates a new document; nothing is deduplicated.
  pub async fn add_to_cart(&self, item: &CatalogItem) -> Result<CartReceipt, CartWriteError> {
    match self.write(item).await {
      Ok(receipt) => {
        info!(item = %item.id, document = %receipt.document_id, "added to cart");
        self.notifier.notify(Alert::new(
          "Added to Cart",
          format!("{} added to cart.", item.name),
        ));
        Ok(receipt)
      }
      Err(e) => {
        error!(item = %item.id, error = %e, "error adding item to cart");
        self
          .notifier
          .notify(Alert::new("Error", "Failed to add item to cart."));
        Err(e)
      }
    }
  }

  async fn write(&self, item: &CatalogItem) -> Result<CartReceipt, CartWriteError> {
    let fields = item.to_fields()?;
    let document_id = tokio::time::timeout(self.deadline, self.sink.append(fields))
      .await
      .map_err(|_| CartWriteError::Timeout(self.deadline))??;
    Ok(CartReceipt { document_id })
  }
}

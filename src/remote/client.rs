use reqwest::{RequestBuilder, Response};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::wire::{
  decode_fields, encode_fields, ApiDocument, ApiErrorResponse, ApiListResponse, ApiWriteRequest,
};
use crate::cart::CartSink;
use crate::catalog::{CatalogItem, CatalogSource};
use crate::config::StoreConfig;
use crate::error::{CartWriteError, FetchError};

/// Documents requested per page when listing a collection.
const PAGE_SIZE: u32 = 300;

/// Document store REST client.
#[derive(Clone)]
pub struct DocumentClient {
  inner: Arc<DocumentClientInner>,
}

struct DocumentClientInner {
  http: reqwest::Client,
  /// `.../documents/`, collections are joined onto it
  documents_url: Url,
  api_key: Option<String>,
  id_token: Option<String>,
  books_collection: String,
  cart_collection: String,
}

impl DocumentClient {
  pub fn new(config: &StoreConfig, id_token: Option<String>) -> Result<Self, url::ParseError> {
    let documents_url = Url::parse(&format!(
      "{}/v1/projects/{}/databases/{}/documents/",
      config.base_url.trim_end_matches('/'),
      config.project_id,
      config.database,
    ))?;

    Ok(Self {
      inner: Arc::new(DocumentClientInner {
        http: reqwest::Client::new(),
        documents_url,
        api_key: config.api_key.clone(),
        id_token,
        books_collection: config.books_collection.clone(),
        cart_collection: config.cart_collection.clone(),
      }),
    })
  }

  fn collection_url(&self, collection: &str) -> Result<Url, url::ParseError> {
    let mut url = self.inner.documents_url.join(collection)?;
    if let Some(key) = &self.inner.api_key {
      url.query_pairs_mut().append_pair("key", key);
    }
    Ok(url)
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.inner.id_token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  /// Read every document in `collection`, following page tokens to the end.
  ///
  /// A token that comes back twice fails the listing rather than looping.
  pub async fn list_documents(&self, collection: &str) -> Result<Vec<ApiDocument>, FetchError> {
    let mut all_documents = Vec::new();
    let mut page_token: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    loop {
      let mut url = self.collection_url(collection)?;
      {
        let mut query = url.query_pairs_mut();
        query.append_pair("pageSize", &PAGE_SIZE.to_string());
        if let Some(token) = &page_token {
          query.append_pair("pageToken", token);
        }
      }

      let response = self.authorize(self.inner.http.get(url)).send().await?;
      let response = check_status(response)
        .await
        .map_err(|(status, message)| FetchError::Status { status, message })?;
      let page: ApiListResponse = response.json().await?;

      debug!(collection, count = page.documents.len(), "fetched page");
      all_documents.extend(page.documents);

      match page.next_page_token {
        Some(token) if token.is_empty() => break,
        Some(token) if !seen_tokens.insert(token.clone()) => {
          return Err(FetchError::RepeatedPageToken(token));
        }
        Some(token) => page_token = Some(token),
        None => break,
      }
    }

    Ok(all_documents)
  }

  /// Create a document in `collection` with a store-assigned id.
  pub async fn create_document(
    &self,
    collection: &str,
    fields: &Map<String, Value>,
  ) -> Result<String, CartWriteError> {
    let url = self.collection_url(collection)?;
    let body = ApiWriteRequest {
      fields: encode_fields(fields),
    };

    let response = self
      .authorize(self.inner.http.post(url))
      .json(&body)
      .send()
      .await?;
    let response = check_status(response)
      .await
      .map_err(|(status, message)| CartWriteError::Status { status, message })?;
    let created: ApiDocument = response.json().await?;

    Ok(created.id().to_string())
  }
}

/// Pass successful responses through; turn the rest into `(status, message)`.
async fn check_status(response: Response) -> Result<Response, (u16, String)> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
    Ok(parsed) if parsed.error.status.is_empty() => parsed.error.message,
    Ok(parsed) => format!("{}: {}", parsed.error.status, parsed.error.message),
    Err(_) => body,
  };
  Err((status.as_u16(), message))
}

impl CatalogSource for DocumentClient {
  async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, FetchError> {
    let documents = self.list_documents(&self.inner.books_collection).await?;

    documents
      .into_iter()
      .map(|doc| {
        let id = doc.id().to_string();
        CatalogItem::from_document(&id, decode_fields(doc.fields))
          .map_err(|source| FetchError::Decode { id, source })
      })
      .collect()
  }
}

impl CartSink for DocumentClient {
  async fn append(&self, fields: Map<String, Value>) -> Result<String, CartWriteError> {
    self
      .create_document(&self.inner.cart_collection, &fields)
      .await
  }
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Document};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;
use crate::types::{Decodable, Encodable};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Duplicate key {key} in {collection}")]
    DuplicateKey { collection: String, key: String },
}

/// Sort, skip and limit for [`Repository::find`]. `sort` maps field names to
/// `1` (ascending) or `-1` (descending), applied in document order.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(sort: Document) -> Self {
        Self {
            sort: Some(sort),
            ..Default::default()
        }
    }

    pub fn page(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }
}

/// Document store keyed by collection name and equality filter documents
#[async_trait]
pub trait Repository: Send + Sync {
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), RepositoryError>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, RepositoryError>;

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, RepositoryError>;

    /// Replace the first match; false when nothing matched
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<bool, RepositoryError>;

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<bool, RepositoryError>;

    async fn count(&self, collection: &str, filter: Document) -> Result<u64, RepositoryError>;
}

/// Process-local store backing the server binary and the tests
#[derive(Debug, Default)]
pub struct MemoryRepository {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

// Equality after numeric widening, so Int32(1) matches Int64(1)
fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(actual) => DynamicValue::from_bson(actual.clone()) == DynamicValue::from_bson(expected.clone()),
        None => matches!(expected, Bson::Null),
    })
}

fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (DynamicValue::from_bson(a.clone()), DynamicValue::from_bson(b.clone())),
    };
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.string_value().cmp(&b.string_value()),
    }
}

fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|left, right| {
        for (field, direction) in sort {
            let descending = DynamicValue::from_bson(direction.clone()).int_value() < 0;
            let ordering = compare_bson(left.get(field), right.get(field));
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        if let Some(id) = document.get("_id") {
            if documents.iter().any(|existing| existing.get("_id") == Some(id)) {
                return Err(RepositoryError::DuplicateKey {
                    collection: collection.to_string(),
                    key: id.to_string(),
                });
            }
        }

        documents.push(document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| matches_filter(doc, &filter)).cloned()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, RepositoryError> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(collection)
            .map(|documents| documents.iter().filter(|doc| matches_filter(doc, &filter)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &options.sort {
            sort_documents(&mut found, sort);
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> Result<bool, RepositoryError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match documents.iter_mut().find(|doc| matches_filter(doc, &filter)) {
            Some(slot) => {
                *slot = replacement;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<bool, RepositoryError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match documents.iter().position(|doc| matches_filter(doc, &filter)) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: &str, filter: Document) -> Result<u64, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| documents.iter().filter(|doc| matches_filter(doc, &filter)).count() as u64)
            .unwrap_or(0))
    }
}

/// Typed view of one collection, converting through [`DynamicValue`]
pub struct Collection<T> {
    name: &'static str,
    store: Arc<dyn Repository>,
    _phantom: PhantomData<T>,
}

impl<T> Collection<T>
where
    T: Encodable + Decodable,
{
    pub fn new(name: &'static str, store: Arc<dyn Repository>) -> Self {
        Self {
            name,
            store,
            _phantom: PhantomData,
        }
    }

    fn decode(document: Document) -> Result<T, ApiError> {
        T::decode(&DynamicValue::from_document(document))
    }

    pub async fn insert(&self, record: &T) -> Result<(), ApiError> {
        let document = record.encode().to_document(&[])?;
        self.store.insert_one(self.name, document).await?;
        Ok(())
    }

    pub async fn select_any(&self, filter: Document, options: FindOptions) -> Result<Vec<T>, ApiError> {
        self.store
            .find(self.name, filter, options)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn select_one(&self, filter: Document) -> Result<Option<T>, ApiError> {
        self.store
            .find_one(self.name, filter)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn select_404(&self, filter: Document, message: &str) -> Result<T, ApiError> {
        self.select_one(filter)
            .await?
            .ok_or_else(|| ApiError::not_found(message))
    }

    /// Replace the record matching `filter`; 404 when nothing matched
    pub async fn replace(&self, filter: Document, record: &T, message: &str) -> Result<(), ApiError> {
        let document = record.encode().to_document(&[])?;
        if self.store.replace_one(self.name, filter, document).await? {
            Ok(())
        } else {
            Err(ApiError::not_found(message))
        }
    }

    pub async fn count(&self, filter: Document) -> Result<u64, ApiError> {
        Ok(self.store.count(self.name, filter).await?)
    }
}

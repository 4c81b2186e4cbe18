//! Generic CRUD over one admin API collection

use std::marker::PhantomData;
use tfplug::Context;

use super::client::Client;
use super::common::{AppgateApiResource, ListFilter, ListResponse};
use super::error::ApiError;
use super::shape::WireShape;

/// CRUD handle for the collection holding `T`. Request bodies are shaped
/// for the client's active revision before they are sent.
pub struct Collection<'a, T> {
    client: &'a Client,
    shape: &'static WireShape,
    _marker: PhantomData<T>,
}

impl<'a, T: AppgateApiResource> Collection<'a, T> {
    pub fn new(client: &'a Client, shape: &'static WireShape) -> Self {
        Self {
            client,
            shape,
            _marker: PhantomData,
        }
    }

    pub fn client(&self) -> &'a Client {
        self.client
    }

    pub fn shape(&self) -> &'static WireShape {
        self.shape
    }

    pub async fn list(&self, ctx: &Context, filter: &ListFilter) -> Result<Vec<T>, ApiError> {
        let response: ListResponse<T> = self
            .client
            .get_with_params(ctx, T::api_path(), &filter.to_query_params())
            .await?;
        Ok(response.data)
    }

    /// Lists with a query and keeps exact name matches only
    pub async fn find_by_name(&self, ctx: &Context, name: &str) -> Result<Vec<T>, ApiError> {
        let items = self
            .list(ctx, &ListFilter::new().with_query(name))
            .await?;
        Ok(items.into_iter().filter(|item| item.name() == name).collect())
    }

    pub async fn get(&self, ctx: &Context, id: &str) -> Result<T, ApiError> {
        self.client.get(ctx, &T::resource_path(id)).await
    }

    /// The item must already carry its client-generated id
    pub async fn post(&self, ctx: &Context, item: &T) -> Result<T, ApiError> {
        let body = self.encode(item)?;
        self.client.post(ctx, T::api_path(), &body).await
    }

    /// Full replacement of the object with the item's id
    pub async fn put(&self, ctx: &Context, item: &T) -> Result<T, ApiError> {
        let body = self.encode(item)?;
        self.client
            .put(ctx, &T::resource_path(item.id()), &body)
            .await
    }

    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<(), ApiError> {
        self.client.delete(ctx, &T::resource_path(id)).await
    }

    fn encode(&self, item: &T) -> Result<serde_json::Value, ApiError> {
        let mut body = serde_json::to_value(item)
            .map_err(|e| ApiError::Parse(format!("failed to encode {}: {}", T::api_path(), e)))?;
        self.shape.encode(self.client.revision(), &mut body);
        Ok(body)
    }
}

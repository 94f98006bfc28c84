use crate::{
    common::item::AttributeMap,
    store::{
        BatchGetRequest, DeleteRequest, GetRequest, PutRequest, QueryRequest, ScanRequest,
        StoreClient, StoreError, UpdateRequest,
    },
};

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    error::{DisplayErrorContext, SdkError},
    types,
};
use std::{error, fmt};

/// Flatten an SDK error into a store error carrying the full service message.
fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: error::Error + 'static,
    R: fmt::Debug + 'static,
{
    DisplayErrorContext(&err).to_string().into()
}

/// apply projection settings to a read builder
macro_rules! apply_projection {
    ($builder:expr, $request:expr) => {
        $builder
            .set_expression_attribute_names($request.expression_attribute_names)
            .set_projection_expression($request.projection_expression)
            .table_name($request.table_name)
    };
}

#[async_trait]
impl StoreClient for Client {
    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn get_item(&self, request: GetRequest) -> Result<Option<AttributeMap>, StoreError> {
        let builder = Client::get_item(self).set_key(Some(request.key));
        let output = apply_projection!(builder, request)
            .send()
            .await
            .map_err(store_error)?;
        Ok(output.item)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn put_item(&self, request: PutRequest) -> Result<(), StoreError> {
        Client::put_item(self)
            .set_item(Some(request.item))
            .table_name(request.table_name)
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn update_item(&self, request: UpdateRequest) -> Result<(), StoreError> {
        Client::update_item(self)
            .set_expression_attribute_names(request.expression_attribute_names)
            .set_expression_attribute_values(request.expression_attribute_values)
            .set_key(Some(request.key))
            .table_name(request.table_name)
            .update_expression(request.update_expression)
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn delete_item(&self, request: DeleteRequest) -> Result<(), StoreError> {
        Client::delete_item(self)
            .set_key(Some(request.key))
            .table_name(request.table_name)
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn query(&self, request: QueryRequest) -> Result<Vec<AttributeMap>, StoreError> {
        let builder = Client::query(self)
            .set_expression_attribute_values(request.expression_attribute_values)
            .set_index_name(request.index.index_name().map(str::to_string))
            .key_condition_expression(request.key_condition_expression);
        let output = apply_projection!(builder, request)
            .send()
            .await
            .map_err(store_error)?;
        Ok(output.items.unwrap_or_default())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn scan(&self, request: ScanRequest) -> Result<Vec<AttributeMap>, StoreError> {
        let output = apply_projection!(Client::scan(self), request)
            .send()
            .await
            .map_err(store_error)?;
        Ok(output.items.unwrap_or_default())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table_name), err)]
    async fn batch_get_item(
        &self,
        request: BatchGetRequest,
    ) -> Result<Vec<AttributeMap>, StoreError> {
        let keys_and_attributes = types::KeysAndAttributes::builder()
            .set_keys(Some(request.keys))
            .build()?;
        let output = Client::batch_get_item(self)
            .request_items(request.table_name.clone(), keys_and_attributes)
            .send()
            .await
            .map_err(store_error)?;
        let items = output
            .responses
            .and_then(|mut responses| responses.remove(&request.table_name))
            .unwrap_or_default();
        Ok(items)
    }
}

use std::collections::HashMap;

use futures::future::{self, try_join_all, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    column::{DecodeError, Template},
    expr::TokenId,
};

/// A raw result row as the driver returns it, keyed by output column name.
pub type RawRow = Map<String, Value>;

/// Turns raw rows back into the shape of the compiled view's template.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    template: Template,
    names: HashMap<TokenId, String>,
}

impl RowDecoder {
    pub(crate) fn new(template: Template, names: impl IntoIterator<Item = (TokenId, String)>) -> Self {
        Self { template, names: names.into_iter().collect() }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Output column name a template token was selected under.
    pub fn name_of(&self, token: TokenId) -> Option<&str> {
        self.names.get(&token).map(String::as_str)
    }

    /// Decodes every column of the row concurrently and assembles the result
    /// once all of them are done. The first failing column fails the row.
    pub async fn decode(&self, raw: &RawRow) -> Result<Value, DecodeError> {
        let pending = self.template.columns().into_iter().map(|c| {
            let name = self.names.get(&c.token().id()).map(String::as_str).unwrap_or_default();
            match raw.get(name) {
                Some(v) => c.decode(name, v.clone()),
                None => future::ready(Err(DecodeError::MissingColumn { column: name.to_string() })).boxed(),
            }
        });
        let values = try_join_all(pending).await?;
        Ok(self.template.assemble(&mut values.into_iter()))
    }
}

/// SQL text, its parameters in placeholder order, and the matching decoder.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
    pub decoder: RowDecoder,
}

impl CompiledQuery {
    pub async fn decode_row(&self, raw: &RawRow) -> Result<Value, DecodeError> {
        self.decoder.decode(raw).await
    }

    /// Rows are decoded concurrently; the first failure is returned and the
    /// remaining rows are abandoned.
    pub async fn decode_rows(&self, raws: &[RawRow]) -> Result<Vec<Value>, DecodeError> {
        try_join_all(raws.iter().map(|r| self.decoder.decode(r))).await
    }

    /// For aggregate queries: decodes the first row and fails when there is none.
    pub async fn decode_one(&self, raws: &[RawRow]) -> Result<Value, DecodeError> {
        match raws.first() {
            Some(r) => self.decoder.decode(r).await,
            None => Err(DecodeError::EmptyAggregate),
        }
    }

    pub async fn decode_rows_as<T: DeserializeOwned>(&self, raws: &[RawRow]) -> Result<Vec<T>, DecodeError> {
        self.decode_rows(raws)
            .await?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| DecodeError::Deserialize(e.to_string())))
            .collect()
    }

    pub async fn decode_one_as<T: DeserializeOwned>(&self, raws: &[RawRow]) -> Result<T, DecodeError> {
        let v = self.decode_one(raws).await?;
        serde_json::from_value(v).map_err(|e| DecodeError::Deserialize(e.to_string()))
    }
}

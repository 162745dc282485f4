use std::{fmt, future::Future};

use futures::future::{self, FutureExt};
use serde_json::Value;

use crate::{
    column::{DecodeError, DecodeFuture, Decoder},
    expr::{Emitter, Fragment, Segment, Token},
    view::ViewError,
};

/// One output value of a row: an expression token, whether it may be NULL,
/// and how to decode what the driver returns for it.
///
/// Columns are immutable. Every transformation returns a new column that
/// shares the token, so two columns built from the same expression still
/// select a single item.
#[derive(Clone)]
pub struct Column {
    token: Token,
    nullable: bool,
    decoder: Decoder,
    tag: Option<String>,
}

impl Column {
    pub fn new(token: Token, nullable: bool) -> Self {
        Self { token, nullable, decoder: Decoder::identity(), tag: None }
    }

    /// A computed column over a fresh token.
    pub fn expr(nullable: bool, fragment: impl Into<Fragment>) -> Self {
        Self::new(Token::new(fragment), nullable)
    }

    /// A computed column written with the placeholder resolver.
    pub fn sql<F>(nullable: bool, build: F) -> Self
    where
        F: FnOnce(&mut Emitter) -> String,
    {
        Self::expr(nullable, Fragment::sql(build))
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn with_null(&self, nullable: bool) -> Column {
        Column { nullable, ..self.clone() }
    }

    /// Only ever turns nullability on.
    pub fn widen(&self, nullable: bool) -> Column {
        self.with_null(self.nullable || nullable)
    }

    pub fn format<F>(&self, f: F) -> Column
    where
        F: Fn(Value) -> Result<Value, DecodeError> + Send + Sync + 'static,
    {
        Column { decoder: self.decoder.then(f), ..self.clone() }
    }

    pub fn format_async<F, Fut>(&self, f: F) -> Column
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DecodeError>> + Send + 'static,
    {
        Column { decoder: self.decoder.then_async(f), ..self.clone() }
    }

    pub fn with_tag(&self, tag: impl Into<String>) -> Column {
        Column { tag: Some(tag.into()), ..self.clone() }
    }

    /// Checks the column went through the step that sets `expected` and
    /// stamps it with `new`.
    pub fn assert_tag(&self, expected: &str, new: impl Into<String>) -> Result<Column, ViewError> {
        if self.tag.as_deref() != Some(expected) {
            return Err(ViewError::TagMismatch {
                expected: expected.to_string(),
                found: self.tag.clone(),
            });
        }
        Ok(self.with_tag(new))
    }

    /// Decodes the raw value selected for this column under `name`.
    pub fn decode(&self, name: &str, raw: Value) -> DecodeFuture {
        if raw.is_null() {
            let out = if self.nullable {
                Ok(Value::Null)
            } else {
                Err(DecodeError::UnexpectedNull { column: name.to_string() })
            };
            return future::ready(out).boxed();
        }
        self.decoder.run(raw)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("token", &self.token)
            .field("nullable", &self.nullable)
            .field("tag", &self.tag)
            .finish()
    }
}

impl From<&Column> for Segment {
    fn from(column: &Column) -> Self {
        Segment::Token(column.token.clone())
    }
}

impl From<&Column> for Fragment {
    fn from(column: &Column) -> Self {
        Fragment::from(column.token.clone())
    }
}

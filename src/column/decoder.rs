use std::{future::Future, sync::Arc};

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::column::DecodeError;

pub type DecodeFuture = BoxFuture<'static, Result<Value, DecodeError>>;

type DecodeFn = dyn Fn(Value) -> DecodeFuture + Send + Sync;

/// Chain of conversions from a raw scalar to the value handed to callers.
/// Steps may be synchronous or asynchronous; either way the chain runs as one future.
#[derive(Clone)]
pub struct Decoder(Arc<DecodeFn>);

impl Decoder {
    pub fn identity() -> Self {
        Self(Arc::new(|raw: Value| -> DecodeFuture { future::ready(Ok(raw)).boxed() }))
    }

    pub fn then<F>(&self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, DecodeError> + Send + Sync + 'static,
    {
        let prev = self.clone();
        let f = Arc::new(f);
        Self(Arc::new(move |raw: Value| -> DecodeFuture {
            let step = prev.run(raw);
            let f = Arc::clone(&f);
            async move { f(step.await?) }.boxed()
        }))
    }

    pub fn then_async<F, Fut>(&self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DecodeError>> + Send + 'static,
    {
        let prev = self.clone();
        let f = Arc::new(f);
        Self(Arc::new(move |raw: Value| -> DecodeFuture {
            let step = prev.run(raw);
            let f = Arc::clone(&f);
            async move { f(step.await?).await }.boxed()
        }))
    }

    pub fn run(&self, raw: Value) -> DecodeFuture {
        (self.0)(raw)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::identity()
    }
}

//! BoxModelProvider -- object-safe dynamic dispatch wrapper for ModelProvider.
//!
//! Pattern:
//! 1. Define an object-safe `ModelProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ModelProviderDyn` for all `T: ModelProvider`
//! 3. `BoxModelProvider` wraps `Box<dyn ModelProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use scanflow_types::model::ModelError;

use super::provider::ModelProvider;

/// Object-safe version of [`ModelProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch (`dyn
/// ModelProviderDyn`). A blanket implementation is provided for all
/// types implementing `ModelProvider`.
pub trait ModelProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn cost_per_token(&self) -> f64;

    fn invoke_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>>;
}

/// Blanket implementation: any `ModelProvider` automatically implements
/// `ModelProviderDyn`.
impl<T: ModelProvider> ModelProviderDyn for T {
    fn name(&self) -> &str {
        ModelProvider::name(self)
    }

    fn cost_per_token(&self) -> f64 {
        ModelProvider::cost_per_token(self)
    }

    fn invoke_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>> {
        Box::pin(self.invoke(prompt))
    }
}

/// Type-erased model provider for runtime fallback lists.
///
/// Since `ModelProvider` uses RPITIT, it cannot be used as a trait
/// object directly. `BoxModelProvider` provides equivalent methods that
/// delegate to the inner `ModelProviderDyn` trait object.
pub struct BoxModelProvider {
    inner: Box<dyn ModelProviderDyn + Send + Sync>,
}

impl BoxModelProvider {
    /// Wrap a concrete `ModelProvider` in a type-erased box.
    pub fn new<T: ModelProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Provider key used in usage logs.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Approximate cost per output token in dollars.
    pub fn cost_per_token(&self) -> f64 {
        self.inner.cost_per_token()
    }

    /// Send a prompt and receive the full text response.
    pub async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        self.inner.invoke_boxed(prompt).await
    }
}

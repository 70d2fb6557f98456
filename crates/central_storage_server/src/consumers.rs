use central_storage_core::traits::ConsumerStore;
use std::collections::HashMap;
use std::sync::Arc;

/// A fixed set of consumer keys and secrets.
#[derive(Clone, Default)]
pub struct StaticConsumers {
    secrets: Arc<HashMap<String, String>>,
}

impl StaticConsumers {
    pub fn new<I, K, S>(consumers: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<String>,
    {
        Self {
            secrets: Arc::new(
                consumers
                    .into_iter()
                    .map(|(key, secret)| (key.into(), secret.into()))
                    .collect(),
            ),
        }
    }
}

impl ConsumerStore for StaticConsumers {
    async fn secret_for(&self, key: &str) -> Option<String> {
        self.secrets.get(key).cloned()
    }
}

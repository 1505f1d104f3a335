use crate::backend_trait::GenerationBackend;
use promocast_core::GenerationError;
use std::collections::HashMap;

pub struct BackendRegistry {
    factories: HashMap<String, fn() -> Box<dyn GenerationBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("gemini", || Box::new(crate::gemini_backend::GeminiBackend::new()));
        registry.register("null", || Box::new(crate::null_backend::NullBackend::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn GenerationBackend>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn GenerationBackend>, GenerationError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| GenerationError::BackendNotFound(name.to_string()))
    }

    /// Create and initialise a backend in one step.
    pub async fn build(
        &self,
        name: &str,
        config: toml::Value,
    ) -> Result<Box<dyn GenerationBackend>, GenerationError> {
        let mut backend = self.create(name)?;
        backend.initialize(config).await?;
        Ok(backend)
    }

    pub fn list_backends(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullBackend;

    #[test]
    fn test_registry_new_has_builtin_backends() {
        let registry = BackendRegistry::new();
        assert_eq!(registry.list_backends(), vec!["gemini", "null"]);
    }

    #[test]
    fn test_registry_create_returns_correct_name() {
        let registry = BackendRegistry::new();
        assert_eq!(registry.create("gemini").unwrap().name(), "gemini");
        assert_eq!(registry.create("null").unwrap().name(), "null");
    }

    #[test]
    fn test_registry_create_unknown_returns_error() {
        let registry = BackendRegistry::new();
        match registry.create("nope") {
            Err(GenerationError::BackendNotFound(name)) => assert_eq!(name, "nope"),
            _ => panic!("expected BackendNotFound error"),
        }
    }

    #[test]
    fn test_registry_register_custom_backend() {
        let mut registry = BackendRegistry::new();
        registry.register("offline", || Box::new(NullBackend::new()));
        // NullBackend is used as the factory, so name is "null"
        assert_eq!(registry.create("offline").unwrap().name(), "null");
    }

    #[tokio::test]
    async fn test_registry_build_initializes() {
        let registry = BackendRegistry::new();
        let backend = registry
            .build("null", toml::Value::Table(Default::default()))
            .await
            .unwrap();
        assert_eq!(backend.name(), "null");
    }
}

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const URL_PREFIX: &str = "blob:promocast/";

/// A registered in-memory asset.
#[derive(Debug, Clone)]
pub struct Resource {
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Default)]
struct Entries {
    next_id: u64,
    map: HashMap<u64, Resource>,
}

/// Process-wide table of generated media, addressable through
/// `blob:promocast/<n>` locators. Cloning shares the same table.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    entries: Arc<Mutex<Entries>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Single insert/remove per lock, so a poisoned map is still coherent.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn register(&self, content_type: &str, bytes: Vec<u8>) -> ResourceHandle {
        let mut entries = self.lock();
        entries.next_id += 1;
        let id = entries.next_id;
        let len = bytes.len();
        entries.map.insert(
            id,
            Resource {
                content_type: content_type.to_string(),
                bytes: bytes.into(),
            },
        );
        drop(entries);

        let handle = ResourceHandle {
            id,
            url: format!("{URL_PREFIX}{id}"),
            content_type: content_type.to_string(),
            registry: self.clone(),
            released: false,
        };
        tracing::debug!(url = %handle.url, content_type, bytes = len, "resource registered");
        handle
    }

    pub fn resolve(&self, url: &str) -> Option<Resource> {
        let id = parse_url(url)?;
        self.lock().map.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) -> bool {
        self.lock().map.remove(&id).is_some()
    }
}

fn parse_url(url: &str) -> Option<u64> {
    url.strip_prefix(URL_PREFIX)?.parse().ok()
}

/// Owned reference to a registered resource. The entry is removed from the
/// registry by [`release`](Self::release) or when the handle is dropped.
#[derive(Debug)]
pub struct ResourceHandle {
    id: u64,
    url: String,
    content_type: String,
    registry: ResourceRegistry,
    released: bool,
}

impl ResourceHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.registry.resolve(&self.url).map(|r| r.bytes)
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let bytes = self.bytes().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("resource {} is no longer registered", self.url),
            )
        })?;
        std::fs::write(path, &bytes[..])
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            if self.registry.remove(self.id) {
                tracing::debug!(url = %self.url, "resource released");
            }
        }
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let registry = ResourceRegistry::new();
        let handle = registry.register("audio/wav", vec![1, 2, 3]);
        assert!(handle.url().starts_with("blob:promocast/"));
        assert_eq!(handle.content_type(), "audio/wav");

        let resource = registry.resolve(handle.url()).unwrap();
        assert_eq!(resource.content_type, "audio/wav");
        assert_eq!(&resource.bytes[..], &[1, 2, 3]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_urls_are_unique() {
        let registry = ResourceRegistry::new();
        let a = registry.register("audio/wav", vec![]);
        let b = registry.register("audio/wav", vec![]);
        assert_ne!(a.url(), b.url());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_explicit_release_removes_entry() {
        let registry = ResourceRegistry::new();
        let handle = registry.register("video/mp4", vec![0; 8]);
        let url = handle.url().to_string();
        handle.release();
        assert!(registry.resolve(&url).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_releases_entry() {
        let registry = ResourceRegistry::new();
        {
            let _handle = registry.register("video/mp4", vec![0; 8]);
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = ResourceRegistry::new();
        let other = registry.clone();
        let handle = registry.register("audio/wav", vec![9]);
        assert!(other.resolve(handle.url()).is_some());
    }

    #[test]
    fn test_resolve_unknown_url() {
        let registry = ResourceRegistry::new();
        assert!(registry.resolve("blob:promocast/999").is_none());
        assert!(registry.resolve("https://example.com/x").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let dir = std::env::temp_dir().join("promocast_resource_write");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.bin");

        let registry = ResourceRegistry::new();
        let handle = registry.register("audio/wav", vec![7, 8, 9]);
        handle.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![7, 8, 9]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_registry_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResourceRegistry>();
        assert_send_sync::<ResourceHandle>();
    }
}

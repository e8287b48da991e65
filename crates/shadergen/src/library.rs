use std::collections::BTreeMap;

use crate::ffp::{COMMON_LIBRARY_WGSL, FFP_LIB_COMMON};

/// Named WGSL snippets that programs declare as dependencies.
#[derive(Debug, Clone, Default)]
pub struct LibraryRegistry {
    libraries: BTreeMap<String, String>,
}

impl LibraryRegistry {
    /// Registry holding the built-in common library.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(FFP_LIB_COMMON, COMMON_LIBRARY_WGSL);
        registry
    }

    pub fn register(&mut self, name: &str, source: &str) {
        self.libraries.insert(name.into(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.libraries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }
}

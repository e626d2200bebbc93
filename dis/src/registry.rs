use std::{collections::HashMap, sync::Arc};

use log::debug;
use parking_lot::RwLock;

use crate::ModuleImage;

/// Loaded-module registry. Owned by the composition root and passed by
/// reference to whatever loads or links modules; never a hidden static.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: RwLock<HashMap<Arc<str>, Arc<ModuleImage>>>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an image under its own name. A later registration
    /// shadows an earlier one of the same name.
    pub fn register(&self, image: Arc<ModuleImage>) -> Arc<ModuleImage> {
        debug!("register module {}", image.name);
        self.modules
            .write()
            .insert(image.name.clone(), Arc::clone(&image));
        image
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<ModuleImage>> {
        self.modules.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

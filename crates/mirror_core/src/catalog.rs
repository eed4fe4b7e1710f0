//! Statically registered plugin kinds.

use std::{collections::HashSet, fmt, sync::Arc};

use shared::domain::{PluginCategory, PluginId};
use tracing::debug;

use crate::{
    error::MirrorError,
    plugin::{Plugin, PluginContext},
};

pub type PluginFactory = Arc<dyn Fn(PluginContext) -> Box<dyn Plugin> + Send + Sync>;

/// Immutable descriptor of a widget or app kind.
#[derive(Clone)]
pub struct PluginKind {
    id: PluginId,
    display_name: String,
    category: PluginCategory,
    factory: PluginFactory,
}

impl PluginKind {
    pub fn widget(id: impl Into<String>, display_name: impl Into<String>) -> PluginKindBuilder {
        PluginKindBuilder::new(id, display_name, PluginCategory::Widget)
    }

    pub fn app(id: impl Into<String>, display_name: impl Into<String>) -> PluginKindBuilder {
        PluginKindBuilder::new(id, display_name, PluginCategory::App)
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> PluginCategory {
        self.category
    }

    pub fn instantiate(&self, context: PluginContext) -> Box<dyn Plugin> {
        (self.factory)(context)
    }

    pub fn factory(&self) -> PluginFactory {
        Arc::clone(&self.factory)
    }
}

impl fmt::Debug for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginKind")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

pub struct PluginKindBuilder {
    id: PluginId,
    display_name: String,
    category: PluginCategory,
    factory: Option<PluginFactory>,
}

impl PluginKindBuilder {
    fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        category: PluginCategory,
    ) -> Self {
        Self {
            id: PluginId::new(id),
            display_name: display_name.into(),
            category,
            factory: None,
        }
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(PluginContext) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Result<PluginKind, MirrorError> {
        let Some(factory) = self.factory else {
            return Err(MirrorError::MissingCapability {
                id: self.id,
                capability: "factory",
            });
        };
        Ok(PluginKind {
            id: self.id,
            display_name: self.display_name,
            category: self.category,
            factory,
        })
    }
}

/// Every known kind, in registration order.
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    kinds: Vec<PluginKind>,
}

impl PluginCatalog {
    /// Builds the catalog, failing on the first kind without a factory or with a reused id.
    pub fn new<I>(kinds: I) -> Result<Self, MirrorError>
    where
        I: IntoIterator<Item = PluginKindBuilder>,
    {
        let mut seen = HashSet::new();
        let mut built = Vec::new();
        for builder in kinds {
            let kind = builder.build()?;
            if !seen.insert(kind.id.clone()) {
                return Err(MirrorError::DuplicateId(kind.id));
            }
            debug!(plugin = %kind.id, category = ?kind.category, "registered plugin kind");
            built.push(kind);
        }
        Ok(Self { kinds: built })
    }

    pub fn kinds(&self) -> &[PluginKind] {
        &self.kinds
    }

    pub fn list_widget_kinds(&self) -> impl Iterator<Item = &PluginKind> + '_ {
        self.of_category(PluginCategory::Widget)
    }

    pub fn list_app_kinds(&self) -> impl Iterator<Item = &PluginKind> + '_ {
        self.of_category(PluginCategory::App)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&PluginKind> {
        self.kinds.iter().find(|kind| kind.id.as_str() == id)
    }

    fn of_category(&self, category: PluginCategory) -> impl Iterator<Item = &PluginKind> + '_ {
        self.kinds
            .iter()
            .filter(move |kind| kind.category == category)
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::app::CapabilitySet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigDefId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Text(String),
    Flag(bool),
    Mask(CapabilitySet),
}

impl ParamValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
            ParamValue::Flag(_) => "flag",
            ParamValue::Mask(_) => "mask",
        }
    }
}

/// Immutable tuning for one archetype. Shared by every behavior built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationAsset {
    id: ConfigDefId,
    def_name: String,
    label: String,
    capabilities: CapabilitySet,
    params: BTreeMap<String, ParamValue>,
}

impl ConfigurationAsset {
    pub fn id(&self) -> ConfigDefId {
        self.id
    }

    pub fn def_name(&self) -> &str {
        &self.def_name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        match self.params.get(key) {
            Some(ParamValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(ParamValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.params.get(key) {
            Some(ParamValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn mask(&self, key: &str) -> Option<CapabilitySet> {
        match self.params.get(key) {
            Some(ParamValue::Mask(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn param_keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}

/// Assembles a [`ConfigurationAsset`] outside the XML compiler, mainly for
/// tests and tools. The id is assigned when the asset joins a database.
#[derive(Debug, Clone)]
pub struct ConfigurationAssetBuilder {
    asset: ConfigurationAsset,
}

impl ConfigurationAssetBuilder {
    pub fn new(def_name: impl Into<String>) -> Self {
        let def_name = def_name.into();
        Self {
            asset: ConfigurationAsset {
                id: ConfigDefId(0),
                label: def_name.clone(),
                def_name,
                capabilities: CapabilitySet::EMPTY,
                params: BTreeMap::new(),
            },
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.asset.label = label.into();
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.asset.capabilities = capabilities;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.asset.params.insert(key.into(), value);
        self
    }

    pub fn float(self, key: impl Into<String>, value: f32) -> Self {
        self.param(key, ParamValue::Float(value))
    }

    pub fn text(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.param(key, ParamValue::Text(value.into()))
    }

    pub fn flag(self, key: impl Into<String>, value: bool) -> Self {
        self.param(key, ParamValue::Flag(value))
    }

    pub fn mask(self, key: impl Into<String>, value: CapabilitySet) -> Self {
        self.param(key, ParamValue::Mask(value))
    }

    pub fn build(self) -> ConfigurationAsset {
        self.asset
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConfigDatabase {
    assets: Vec<Arc<ConfigurationAsset>>,
    ids_by_name: HashMap<String, ConfigDefId>,
}

impl ConfigDatabase {
    /// Ids follow the order of `assets`; the compiler passes them sorted by
    /// def name so ids are stable across runs.
    pub fn from_assets(assets: Vec<ConfigurationAsset>) -> Self {
        let mut ids_by_name = HashMap::with_capacity(assets.len());
        let assets = assets
            .into_iter()
            .enumerate()
            .map(|(idx, mut asset)| {
                let id = ConfigDefId(idx as u32);
                asset.id = id;
                ids_by_name.insert(asset.def_name.clone(), id);
                Arc::new(asset)
            })
            .collect();
        Self {
            assets,
            ids_by_name,
        }
    }

    pub fn load_configuration(&self, def_name: &str) -> Option<Arc<ConfigurationAsset>> {
        self.def_id_by_name(def_name)
            .and_then(|id| self.asset(id))
            .cloned()
    }

    pub fn def_id_by_name(&self, def_name: &str) -> Option<ConfigDefId> {
        self.ids_by_name.get(def_name).copied()
    }

    pub fn asset(&self, id: ConfigDefId) -> Option<&Arc<ConfigurationAsset>> {
        self.assets.get(id.0 as usize)
    }

    pub fn assets(&self) -> &[Arc<ConfigurationAsset>] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

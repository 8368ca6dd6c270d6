//! Configuration-driven instantiation and bootstrap-state gathering.
//!
//! RULE: A configurable type lists its instances under
//! `<PREFIX>.instances` and reads its fields from `<PREFIX>.<name>.<field>`.
//! Fields a type reports from bootstrap_state() are recorded so a later run
//! can rebuild the same instances from the recorded layer.

use crate::{
    config::{ConfigLayer, ConfigStore, InstanceView},
    error::EvResult,
};
use serde_json::Value;

/// The contract every configuration-built type fulfills.
pub trait ConfigurableInstance: Sized {
    /// Key prefix, e.g. `evcustomer.customers.evSocialClass`.
    const PREFIX: &'static str;

    fn instance_name(&self) -> &str;

    fn from_config(name: &str, view: &InstanceView<'_>) -> EvResult<Self>;

    /// Field name → value pairs to persist for bootstrap restore.
    /// Fields with no value yet are left out.
    fn bootstrap_state(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }
}

/// Receives configuration items as they are gathered.
pub trait ConfigurationRecorder {
    fn record_item(&mut self, key: &str, value: Value);
}

pub struct Configurator;

impl Configurator {
    /// Build every instance listed under `<T::PREFIX>.instances`, in list order.
    /// A missing instance list yields no instances.
    pub fn configure_instances<T: ConfigurableInstance>(store: &ConfigStore) -> EvResult<Vec<T>> {
        let names = store
            .get_list(&format!("{}.instances", T::PREFIX))?
            .unwrap_or_default();
        let mut out = Vec::with_capacity(names.len());
        for name in &names {
            let view = store.instance(T::PREFIX, name);
            out.push(T::from_config(name, &view)?);
        }
        log::debug!("configured {} instance(s) of {}", out.len(), T::PREFIX);
        Ok(out)
    }

    /// Record the bootstrap fields of a single target as `<PREFIX>.<field>`.
    pub fn gather_bootstrap_state<T: ConfigurableInstance>(
        target: &T,
        recorder: &mut dyn ConfigurationRecorder,
    ) {
        for (field, value) in target.bootstrap_state() {
            recorder.record_item(&format!("{}.{field}", T::PREFIX), value);
        }
    }

    /// Record the instance list plus `<PREFIX>.<name>.<field>` for every
    /// target, so the recorded items replay through configure_instances().
    pub fn gather_instances_bootstrap_state<T: ConfigurableInstance>(
        targets: &[T],
        recorder: &mut dyn ConfigurationRecorder,
    ) {
        let names: Vec<Value> = targets
            .iter()
            .map(|t| Value::String(t.instance_name().to_string()))
            .collect();
        recorder.record_item(&format!("{}.instances", T::PREFIX), Value::Array(names));
        for target in targets {
            for (field, value) in target.bootstrap_state() {
                recorder.record_item(
                    &format!("{}.{}.{field}", T::PREFIX, target.instance_name()),
                    value,
                );
            }
        }
    }
}

/// In-memory recorder; keeps items in recording order and replaces a key
/// recorded twice.
#[derive(Debug, Clone, Default)]
pub struct BootstrapRecorder {
    items: Vec<(String, Value)>,
}

impl BootstrapRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn items(&self) -> &[(String, Value)] {
        &self.items
    }

    pub fn into_layer(self, source: impl Into<String>) -> ConfigLayer {
        let mut layer = ConfigLayer::new(source);
        for (k, v) in self.items {
            layer.set(k, v);
        }
        layer
    }
}

impl ConfigurationRecorder for BootstrapRecorder {
    fn record_item(&mut self, key: &str, value: Value) {
        match self.items.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.items.push((key.to_string(), value)),
        }
    }
}

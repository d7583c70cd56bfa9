use std::collections::BTreeMap;

use crate::foundation::core::{ArrayModifierId, PropertyId};
use crate::foundation::error::{FlowError, FlowResult};
use crate::value::runtime::Value;

/// Raw (timeline or literal) and computed (after graphs) value of a single property.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PropertyValue {
    /// Value from the property's own source.
    pub raw_value: Value,
    /// Value after graph evaluation; equals `raw_value` when nothing writes the property.
    pub computed_value: Value,
}

impl PropertyValue {
    /// Entry whose computed value starts as its raw value.
    pub fn passthrough(raw_value: Value) -> Self {
        Self {
            computed_value: raw_value.clone(),
            raw_value,
        }
    }
}

/// Per single property, its raw and computed value.
pub type PropertyValueMap = BTreeMap<PropertyId, PropertyValue>;

/// Per property, one computed value per array-modifier instance.
pub type ArrayModifierPropertyValueMap = BTreeMap<PropertyId, Vec<Value>>;

/// Read/write access to computed property values during a pass.
pub trait PropertySink {
    /// Current computed value of a single property.
    fn read(&self, id: &PropertyId) -> FlowResult<Value>;
    /// Replace the computed value of a single property.
    fn write(&mut self, id: &PropertyId, value: Value) -> FlowResult<()>;
}

impl PropertySink for PropertyValueMap {
    fn read(&self, id: &PropertyId) -> FlowResult<Value> {
        self.get(id)
            .map(|v| v.computed_value.clone())
            .ok_or_else(|| FlowError::invariant(format!("no value staged for property {id}")))
    }

    fn write(&mut self, id: &PropertyId, value: Value) -> FlowResult<()> {
        let entry = self
            .get_mut(id)
            .ok_or_else(|| FlowError::invariant(format!("no value staged for property {id}")))?;
        entry.computed_value = value;
        Ok(())
    }
}

/// Sink for one array-modifier instance: writes land in an overlay, reads see the overlay first
/// and the main pass results second.
pub struct InstanceSink<'a> {
    base: &'a PropertyValueMap,
    overlay: BTreeMap<PropertyId, Value>,
}

impl<'a> InstanceSink<'a> {
    /// Empty overlay over `base`.
    pub fn new(base: &'a PropertyValueMap) -> Self {
        Self {
            base,
            overlay: BTreeMap::new(),
        }
    }

    /// Values written by this instance.
    pub fn into_written(self) -> BTreeMap<PropertyId, Value> {
        self.overlay
    }
}

impl PropertySink for InstanceSink<'_> {
    fn read(&self, id: &PropertyId) -> FlowResult<Value> {
        match self.overlay.get(id) {
            Some(v) => Ok(v.clone()),
            None => self.base.read(id),
        }
    }

    fn write(&mut self, id: &PropertyId, value: Value) -> FlowResult<()> {
        if !self.base.contains_key(id) {
            return Err(FlowError::invariant(format!(
                "no value staged for property {id}"
            )));
        }
        self.overlay.insert(id.clone(), value);
        Ok(())
    }
}

/// The shared property store. Replaced wholesale at the end of every successful pass.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PropertyStore {
    values: PropertyValueMap,
    array_values: BTreeMap<ArrayModifierId, ArrayModifierPropertyValueMap>,
}

impl PropertyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw and computed value of a single property.
    pub fn value(&self, id: &PropertyId) -> Option<&PropertyValue> {
        self.values.get(id)
    }

    /// Computed value of a single property.
    pub fn computed(&self, id: &PropertyId) -> Option<&Value> {
        self.values.get(id).map(|v| &v.computed_value)
    }

    /// Raw value of a single property.
    pub fn raw(&self, id: &PropertyId) -> Option<&Value> {
        self.values.get(id).map(|v| &v.raw_value)
    }

    /// Every single property's values.
    pub fn values(&self) -> &PropertyValueMap {
        &self.values
    }

    /// Per-instance values written by one array modifier's graph.
    pub fn array_values(&self, modifier: &ArrayModifierId) -> Option<&ArrayModifierPropertyValueMap> {
        self.array_values.get(modifier)
    }

    /// Value of `property` for instance `index` of `modifier`.
    pub fn instance_value(
        &self,
        modifier: &ArrayModifierId,
        property: &PropertyId,
        index: usize,
    ) -> Option<&Value> {
        self.array_values.get(modifier)?.get(property)?.get(index)
    }

    pub(crate) fn commit(
        &mut self,
        values: PropertyValueMap,
        array_values: BTreeMap<ArrayModifierId, ArrayModifierPropertyValueMap>,
    ) {
        self.values = values;
        self.array_values = array_values;
    }

    pub(crate) fn commit_values(&mut self, entries: impl IntoIterator<Item = (PropertyId, PropertyValue)>) {
        self.values.extend(entries);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/store.rs"]
mod tests;

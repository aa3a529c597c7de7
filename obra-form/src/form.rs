//! Form state holder.
//!
//! Each registered field is `Untouched` (the server keeps its value),
//! `Edited` (sent as entered) or `Cleared` (sent empty so the server drops
//! it). Setting a field back to its original value still counts as an edit
//! and sends the original, never an empty string.

use std::collections::BTreeMap;

use obra_core::{FieldErrors, MultipartPayload};
use serde_json::{Map, Value};

use crate::error::{FormError, FormResult};
use crate::field::{is_blank, ClearPolicy, FieldRegistry, FieldSpec};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldStatus {
    Untouched,
    Edited(Value),
    Cleared,
}

#[derive(Debug, Clone)]
pub struct FormState {
    registry: FieldRegistry,
    original: Map<String, Value>,
    status: BTreeMap<String, FieldStatus>,
    errors: FieldErrors,
}

impl FormState {
    /// Form over an existing record. Keys the registry does not know are
    /// ignored.
    pub fn seed(registry: FieldRegistry, record: &Value) -> Self {
        let original = record
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(k, _)| registry.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            registry,
            original,
            status: BTreeMap::new(),
            errors: FieldErrors::new(),
        }
    }

    /// Form for a record that does not exist yet.
    pub fn blank(registry: FieldRegistry) -> Self {
        Self::seed(registry, &Value::Null)
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    fn spec(&self, name: &str) -> FormResult<&FieldSpec> {
        self.registry.get(name).ok_or_else(|| FormError::unknown_field(name))
    }

    /// Set a field. A blank value counts as clearing it.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> FormResult<()> {
        let value = self.spec(name)?.normalize(value.into());
        if is_blank(&value) {
            return self.clear(name);
        }
        self.status.insert(name.to_string(), FieldStatus::Edited(value));
        self.errors_mut_remove(name);
        Ok(())
    }

    /// Set a field from raw text, parsed according to its kind.
    pub fn set_input(&mut self, name: &str, raw: &str) -> FormResult<()> {
        let value = self
            .spec(name)?
            .parse_input(raw)
            .map_err(|msg| FormError::invalid_input(name, msg))?;
        self.set(name, value)
    }

    pub fn clear(&mut self, name: &str) -> FormResult<()> {
        self.spec(name)?;
        self.status.insert(name.to_string(), FieldStatus::Cleared);
        self.errors_mut_remove(name);
        Ok(())
    }

    /// Forget any edit; the field goes back to `Untouched`.
    pub fn reset(&mut self, name: &str) -> FormResult<()> {
        self.spec(name)?;
        self.status.remove(name);
        Ok(())
    }

    fn errors_mut_remove(&mut self, name: &str) {
        if self.errors.contains(name) {
            let mut kept = FieldErrors::new();
            for (field, messages) in self.errors.iter().filter(|(f, _)| *f != name) {
                for m in messages {
                    kept.push_field(field, m.clone());
                }
            }
            self.errors = kept;
        }
    }

    pub fn status(&self, name: &str) -> FieldStatus {
        self.status.get(name).cloned().unwrap_or(FieldStatus::Untouched)
    }

    pub fn original(&self, name: &str) -> Option<&Value> {
        self.original.get(name)
    }

    /// Value the field will have after submit.
    pub fn value(&self, name: &str) -> Option<Value> {
        match self.status.get(name) {
            Some(FieldStatus::Edited(v)) => Some(v.clone()),
            Some(FieldStatus::Cleared) => None,
            _ => self.original.get(name).filter(|v| !v.is_null()).cloned(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.status.is_empty()
    }

    /// Required checks and per-field rules. Does not touch stored errors.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for spec in self.registry.iter() {
            let status = self.status(&spec.name);
            if status == FieldStatus::Cleared && spec.clear_policy == ClearPolicy::Never {
                if let Some(msg) = &spec.required {
                    errors.push_field(&spec.name, msg.clone());
                }
                continue;
            }
            match self.value(&spec.name) {
                Some(v) if !is_blank(&v) => {
                    for msg in spec.check(&v) {
                        errors.push_field(&spec.name, msg);
                    }
                }
                _ => {
                    if let Some(msg) = &spec.required {
                        errors.push_field(&spec.name, msg.clone());
                    }
                }
            }
        }
        errors
    }

    /// Keep errors (usually from the server) for re-display.
    pub fn apply_server_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.first(field)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors = FieldErrors::new();
    }

    /// Scalar parts in registry order. Untouched fields are omitted.
    pub fn push_scalar_parts(&self, payload: &mut MultipartPayload) {
        for spec in self.registry.iter() {
            match self.status.get(&spec.name) {
                None | Some(FieldStatus::Untouched) => {}
                Some(FieldStatus::Cleared) => payload.push_text(spec.name.clone(), ""),
                Some(FieldStatus::Edited(v)) => payload.push_text(spec.name.clone(), spec.to_text(v)),
            }
        }
    }

    /// JSON body with only the fields that changed.
    pub fn json_body(&self) -> Value {
        let mut body = Map::new();
        for spec in self.registry.iter() {
            match self.status.get(&spec.name) {
                None | Some(FieldStatus::Untouched) => {}
                Some(FieldStatus::Cleared) => {
                    body.insert(spec.name.clone(), Value::String(String::new()));
                }
                Some(FieldStatus::Edited(v)) => {
                    body.insert(spec.name.clone(), v.clone());
                }
            }
        }
        Value::Object(body)
    }
}

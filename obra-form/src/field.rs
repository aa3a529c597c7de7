//! Typed field registry.
//!
//! Each entity form declares its scalar fields up front: kind, whether the
//! field is required, whether it may be cleared, the checks it runs and how
//! raw input is normalised. Nothing is bound by matching names at runtime.

use serde_json::Value;

use crate::validate::{is_email, is_url};

pub const REQUIRED_MESSAGE: &str = "Este campo es obligatorio.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Bool,
    /// Object sent as a compact JSON string
    Json,
    Choice(Vec<String>),
}

/// What clearing a field means for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Send an empty string so the server drops the value
    SendEmpty,
    /// The field may not be left empty
    Never,
}

#[derive(Debug, Clone)]
pub enum FieldRule {
    MinLength(usize),
    MaxLength(usize),
    Email,
    Url,
    Range { min: i64, max: i64 },
    Custom(fn(&Value) -> Result<(), String>),
}

impl FieldRule {
    fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            FieldRule::MinLength(min) => match value.as_str() {
                Some(s) if s.chars().count() < *min => {
                    Err(format!("Debe tener al menos {} caracteres.", min))
                }
                _ => Ok(()),
            },
            FieldRule::MaxLength(max) => match value.as_str() {
                Some(s) if s.chars().count() > *max => {
                    Err(format!("No puede superar {} caracteres.", max))
                }
                _ => Ok(()),
            },
            FieldRule::Email => match value.as_str() {
                Some(s) if !is_email(s) => Err("Formato de correo inválido.".to_string()),
                _ => Ok(()),
            },
            FieldRule::Url => match value.as_str() {
                Some(s) if !is_url(s) => Err("Debe ser una URL válida.".to_string()),
                _ => Ok(()),
            },
            FieldRule::Range { min, max } => match value.as_i64() {
                Some(n) if n < *min || n > *max => {
                    Err(format!("Debe estar entre {} y {}.", min, max))
                }
                _ => Ok(()),
            },
            FieldRule::Custom(f) => f(value),
        }
    }
}

/// Normalisation applied when a value is set.
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    None,
    Trim,
    Custom(fn(Value) -> Value),
}

impl Transform {
    fn apply(&self, value: Value) -> Value {
        match self {
            Transform::None => value,
            Transform::Trim => match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other,
            },
            Transform::Custom(f) => f(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: Option<String>,
    pub clear_policy: ClearPolicy,
    pub rules: Vec<FieldRule>,
    pub transform: Transform,
}

impl FieldSpec {
    pub fn new<S: Into<String>>(name: S, kind: FieldKind) -> Self {
        let transform = match kind {
            FieldKind::Text => Transform::Trim,
            _ => Transform::None,
        };
        Self {
            name: name.into(),
            kind,
            required: None,
            clear_policy: ClearPolicy::SendEmpty,
            rules: Vec::new(),
            transform,
        }
    }

    pub fn text<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn json<S: Into<String>>(name: S) -> Self {
        Self::new(name, FieldKind::Json)
    }

    pub fn choice<S: Into<String>>(name: S, options: &[&str]) -> Self {
        Self::new(name, FieldKind::Choice(options.iter().map(|o| o.to_string()).collect()))
    }

    /// Required with the default message. Required fields cannot be cleared.
    pub fn required(self) -> Self {
        self.required_with(REQUIRED_MESSAGE)
    }

    pub fn required_with<S: Into<String>>(mut self, message: S) -> Self {
        self.required = Some(message.into());
        self.clear_policy = ClearPolicy::Never;
        self
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn max_length(self, max: usize) -> Self {
        self.rule(FieldRule::MaxLength(max))
    }

    pub fn email(self) -> Self {
        self.rule(FieldRule::Email)
    }

    pub fn url(self) -> Self {
        self.rule(FieldRule::Url)
    }

    pub fn range(self, min: i64, max: i64) -> Self {
        self.rule(FieldRule::Range { min, max })
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }

    pub(crate) fn normalize(&self, value: Value) -> Value {
        self.transform.apply(value)
    }

    /// Parse text typed by a user (or passed on a command line).
    pub fn parse_input(&self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        match &self.kind {
            FieldKind::Text | FieldKind::Choice(_) => Ok(Value::String(raw.to_string())),
            _ if trimmed.is_empty() => Ok(Value::String(String::new())),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| "Debe ser un número entero.".to_string()),
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "si" | "sí" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err("Debe ser verdadero o falso.".to_string()),
            },
            FieldKind::Json => match serde_json::from_str::<Value>(trimmed) {
                Ok(v @ Value::Object(_)) => Ok(v),
                Ok(_) => Err("Debe ser un objeto JSON.".to_string()),
                Err(_) => Err("JSON inválido.".to_string()),
            },
        }
    }

    /// Multipart text for a value of this field.
    pub fn to_text(&self, value: &Value) -> String {
        match (&self.kind, value) {
            (_, Value::Null) => String::new(),
            (_, Value::String(s)) => s.clone(),
            (FieldKind::Bool, Value::Bool(b)) => b.to_string(),
            (_, other) => other.to_string(),
        }
    }

    /// Problems with a value that is present (non-empty).
    pub(crate) fn check(&self, value: &Value) -> Vec<String> {
        let mut out = Vec::new();
        match (&self.kind, value) {
            (FieldKind::Choice(options), Value::String(s)) if !options.iter().any(|o| o == s) => {
                out.push(format!("'{}' no es una opción válida.", s));
            }
            (FieldKind::Integer, v) if !v.is_i64() && !v.is_u64() => {
                out.push("Debe ser un número entero.".to_string());
            }
            (FieldKind::Json, v) if !v.is_object() => {
                out.push("Debe ser un objeto JSON.".to_string());
            }
            _ => {}
        }
        for rule in &self.rules {
            if let Err(msg) = rule.check(value) {
                out.push(msg);
            }
        }
        out
    }
}

/// True for values that count as "nothing entered".
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Ordered set of field specs for one entity form.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldSpec>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_input_follows_kind() {
        assert_eq!(FieldSpec::integer("year").parse_input(" 2024 "), Ok(json!(2024)));
        assert!(FieldSpec::integer("year").parse_input("dos mil").is_err());
        assert_eq!(FieldSpec::boolean("is_featured").parse_input("sí"), Ok(json!(true)));
        assert_eq!(
            FieldSpec::json("extra_info").parse_input(r#"{"Pisos": "3"}"#),
            Ok(json!({"Pisos": "3"}))
        );
        assert!(FieldSpec::json("extra_info").parse_input("[1]").is_err());
        assert_eq!(FieldSpec::integer("year").parse_input(""), Ok(json!("")));
    }

    #[test]
    fn to_text_is_what_the_server_expects() {
        assert_eq!(FieldSpec::boolean("is_featured").to_text(&json!(false)), "false");
        assert_eq!(FieldSpec::integer("year").to_text(&json!(2021)), "2021");
        assert_eq!(FieldSpec::json("extra_info").to_text(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(FieldSpec::text("location").to_text(&Value::Null), "");
    }

    #[test]
    fn checks_cover_choices_and_rules() {
        let status = FieldSpec::choice("status", &["en_proceso", "entregado"]);
        assert!(status.check(&json!("entregado")).is_empty());
        assert_eq!(status.check(&json!("archivado")).len(), 1);

        let year = FieldSpec::integer("year").range(1900, 2100);
        assert_eq!(year.check(&json!(1800)), vec!["Debe estar entre 1900 y 2100.".to_string()]);

        let email = FieldSpec::text("email").email();
        assert!(email.check(&json!("ventas@obra.pe")).is_empty());
        assert!(!email.check(&json!("ventas")).is_empty());
    }

    #[test]
    fn required_fields_cannot_be_cleared() {
        let name = FieldSpec::text("name").required();
        assert_eq!(name.clear_policy, ClearPolicy::Never);
        assert_eq!(FieldSpec::text("location").clear_policy, ClearPolicy::SendEmpty);
    }

    #[test]
    fn registry_keeps_declaration_order() {
        let registry = FieldRegistry::new()
            .field(FieldSpec::text("name"))
            .field(FieldSpec::integer("category"))
            .field(FieldSpec::text("name").required());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["category", "name"]);
        assert!(registry.get("name").unwrap().is_required());
    }
}

//! Terminal rendering: one summary line per record, or pretty JSON.

use anyhow::Result;
use obra_auth::User;
use obra_core::field_errors::SCHEMA_KEY;
use obra_core::{FieldErrors, Page, PageMeta};
use obra_rest::models::{Category, ClientLogo, ContactMessage, Project, Service};
use serde::Serialize;

/// Short, single-line description of a record.
pub trait Summary {
    fn summary(&self) -> String;
}

impl Summary for Project {
    fn summary(&self) -> String {
        let featured = if self.is_featured { " ★" } else { "" };
        format!(
            "{:<28} {:<30} {:<11} {}i/{}v{}",
            self.slug,
            self.name,
            self.status.label(),
            self.images.len(),
            self.videos.len(),
            featured
        )
    }
}

impl Summary for Category {
    fn summary(&self) -> String {
        format!("{:>4}  {}", self.id, self.name)
    }
}

impl Summary for Service {
    fn summary(&self) -> String {
        format!("{:>4}  {}", self.id, self.name)
    }
}

impl Summary for ClientLogo {
    fn summary(&self) -> String {
        format!("{:>4}  {:<30} {}", self.id, self.name, self.image)
    }
}

impl Summary for ContactMessage {
    fn summary(&self) -> String {
        let mark = if self.is_read { " " } else { "●" };
        format!(
            "{mark} {:>4}  {}  {:<24} {}",
            self.id,
            self.created_at.format("%Y-%m-%d"),
            self.sender(),
            self.subject.as_deref().unwrap_or("(sin asunto)")
        )
    }
}

impl Summary for User {
    fn summary(&self) -> String {
        let role = if self.is_superuser {
            "superuser"
        } else if self.is_staff {
            "staff"
        } else {
            "user"
        };
        format!("{} <{}> ({role})", self.display_name(), self.email)
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn page_footer(meta: Option<&PageMeta>) -> Option<String> {
    let meta = meta?;
    match (meta.page, meta.total_pages) {
        (Some(page), Some(total)) => Some(format!(
            "página {page} de {total} · {} registros",
            meta.total_records
        )),
        _ => Some(format!("{} registros", meta.total_records)),
    }
}

pub fn print_page<T: Serialize + Summary>(page: &Page<T>, json: bool) -> Result<()> {
    if json {
        return print_json(&page.data);
    }
    if page.data.is_empty() {
        println!("(sin resultados)");
    }
    for record in &page.data {
        println!("{}", record.summary());
    }
    if let Some(footer) = page_footer(page.meta.as_ref()) {
        println!("{footer}");
    }
    Ok(())
}

/// Field errors as `field: message` lines; form-wide errors come first.
pub fn field_error_lines(errors: &FieldErrors) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .get(SCHEMA_KEY)
        .unwrap_or_default()
        .iter()
        .cloned()
        .collect();
    for (field, messages) in errors.iter().filter(|(f, _)| *f != SCHEMA_KEY) {
        for message in messages {
            lines.push(format!("{field}: {message}"));
        }
    }
    lines
}

pub fn print_field_errors(errors: &FieldErrors) {
    for line in field_error_lines(errors) {
        eprintln!("  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_come_first() {
        let mut errors = FieldErrors::new();
        errors.push_field("name", "El nombre del proyecto es obligatorio.");
        errors.push_schema("Credenciales inválidas");
        errors.push_field("area", "Máximo 50 caracteres");

        assert_eq!(
            field_error_lines(&errors),
            vec![
                "Credenciales inválidas",
                "area: Máximo 50 caracteres",
                "name: El nombre del proyecto es obligatorio.",
            ]
        );
    }

    #[test]
    fn footer_uses_page_numbers_when_present() {
        let meta = PageMeta {
            page: Some(2),
            total_pages: Some(5),
            total_records: 48,
            next: None,
            previous: None,
        };
        assert_eq!(page_footer(Some(&meta)).unwrap(), "página 2 de 5 · 48 registros");
        assert_eq!(page_footer(None), None);
    }
}

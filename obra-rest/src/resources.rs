//! One handle per API collection.
//!
//! | handle                 | path                | key  | methods                      |
//! |------------------------|---------------------|------|------------------------------|
//! | `projects()`           | `projects/`         | slug | CRUD                         |
//! | `categories()`         | `categories/`       | id   | CRUD                         |
//! | `services()`           | `company/services/` | id   | CRUD                         |
//! | `clients()`            | `company/clients/`  | id   | CRUD                         |
//! | `messages()`           | `contact/messages/` | id   | find, get, create, `is_read` |
//! | `company_info()`       | `company/info/`     | -    | get, patch                   |
//! | `about()`              | `company/about/`    | -    | get, patch                   |

use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;
use obra_core::{
    ListQuery, ObraError, ObraResource, Page, RequestBody, ResourceCapabilities, ResourceMethod,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use crate::client::ApiClient;
use crate::models::{
    AboutUs, Category, ClientLogo, CompanyInfo, ContactMessage, ContactMessageRequest, Project, ProjectStatus,
    Service,
};

fn method_name(method: &ResourceMethod) -> &'static str {
    match method {
        ResourceMethod::Find => "find",
        ResourceMethod::Get => "get",
        ResourceMethod::Create => "create",
        ResourceMethod::Patch => "patch",
        ResourceMethod::Remove => "remove",
        ResourceMethod::Custom(name) => *name,
    }
}

/// A keyed REST collection.
pub struct Collection<R> {
    client: ApiClient,
    path: &'static str,
    capabilities: ResourceCapabilities,
    patch_fields: Option<&'static [&'static str]>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Collection<R> {
    pub fn new(client: ApiClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            capabilities: ResourceCapabilities::standard_crud(),
            patch_fields: None,
            _record: PhantomData,
        }
    }

    pub fn with_capabilities(mut self, capabilities: ResourceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Restrict JSON patches to these keys.
    pub fn with_patch_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.patch_fields = Some(fields);
        self
    }

    fn ensure(&self, method: ResourceMethod) -> Result<()> {
        if self.capabilities.allows(&method) {
            Ok(())
        } else {
            Err(ObraError::method_not_allowed(format!(
                "{} does not support {}",
                self.path,
                method_name(&method)
            ))
            .into_anyhow())
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.path, id.trim_matches('/'))
    }

    fn check_patch_body(&self, body: &RequestBody) -> Result<()> {
        let Some(allowed) = self.patch_fields else {
            return Ok(());
        };
        let names: Vec<String> = match body {
            RequestBody::Json(value) => value
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default(),
            RequestBody::Multipart(payload) => payload.parts().iter().map(|p| p.name.clone()).collect(),
        };
        match names.iter().find(|name| !allowed.contains(&name.as_str())) {
            Some(name) => Err(ObraError::bad_request(format!("{} cannot patch '{}'", self.path, name)).into_anyhow()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R> ObraResource<R> for Collection<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    fn path(&self) -> &str {
        self.path
    }

    fn capabilities(&self) -> ResourceCapabilities {
        self.capabilities.clone()
    }

    #[instrument(skip(self, query), fields(path = self.path))]
    async fn find(&self, query: &ListQuery) -> Result<Page<R>> {
        self.ensure(ResourceMethod::Find)?;
        self.client.list(self.path, query).await
    }

    async fn get(&self, id: &str) -> Result<R> {
        self.ensure(ResourceMethod::Get)?;
        self.client.get(&self.item_path(id)).await
    }

    #[instrument(skip(self, body), fields(path = self.path))]
    async fn create(&self, body: RequestBody) -> Result<R> {
        self.ensure(ResourceMethod::Create)?;
        self.client.post(self.path, body).await
    }

    #[instrument(skip(self, body), fields(path = self.path))]
    async fn patch(&self, id: Option<&str>, body: RequestBody) -> Result<R> {
        self.ensure(ResourceMethod::Patch)?;
        let Some(id) = id else {
            return Err(ObraError::bad_request(format!("{} needs a record key to patch", self.path)).into_anyhow());
        };
        self.check_patch_body(&body)?;
        self.client.patch(&self.item_path(id), body).await
    }

    #[instrument(skip(self), fields(path = self.path))]
    async fn remove(&self, id: &str) -> Result<()> {
        self.ensure(ResourceMethod::Remove)?;
        self.client.delete(&self.item_path(id)).await
    }
}

impl Collection<ContactMessage> {
    /// Public contact form submission.
    pub async fn send_message(&self, message: &ContactMessageRequest) -> Result<ContactMessage> {
        self.create(RequestBody::Json(serde_json::to_value(message)?)).await
    }

    pub async fn mark_read(&self, id: u64, is_read: bool) -> Result<ContactMessage> {
        self.patch(Some(&id.to_string()), RequestBody::Json(json!({ "is_read": is_read })))
            .await
    }
}

impl Collection<Project> {
    pub async fn find_filtered(
        &self,
        query: ListQuery,
        category: Option<u64>,
        status: Option<ProjectStatus>,
        featured: Option<bool>,
    ) -> Result<Page<Project>> {
        let query = Project::filters(category, status, featured)
            .into_iter()
            .fold(query, |q, (key, value)| q.filter(key, value));
        self.find(&query).await
    }
}

/// An endpoint with exactly one record (`company/info/`).
pub struct Singleton<R> {
    client: ApiClient,
    path: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> Singleton<R> {
    pub fn new(client: ApiClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R> ObraResource<R> for Singleton<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    fn path(&self) -> &str {
        self.path
    }

    fn capabilities(&self) -> ResourceCapabilities {
        ResourceCapabilities::singleton()
    }

    /// The id is ignored.
    async fn get(&self, _id: &str) -> Result<R> {
        self.client.get(self.path).await
    }

    #[instrument(skip(self, _id, body), fields(path = self.path))]
    async fn patch(&self, _id: Option<&str>, body: RequestBody) -> Result<R> {
        self.client.patch(self.path, body).await
    }
}

impl<R> Singleton<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    pub async fn load(&self) -> Result<R> {
        self.get("").await
    }
}

impl ApiClient {
    pub fn projects(&self) -> Collection<Project> {
        Collection::new(self.clone(), "projects/")
    }

    pub fn categories(&self) -> Collection<Category> {
        Collection::new(self.clone(), "categories/")
    }

    pub fn services(&self) -> Collection<Service> {
        Collection::new(self.clone(), "company/services/")
    }

    pub fn clients(&self) -> Collection<ClientLogo> {
        Collection::new(self.clone(), "company/clients/")
    }

    pub fn messages(&self) -> Collection<ContactMessage> {
        use ResourceMethod::*;
        Collection::new(self.clone(), "contact/messages/")
            .with_capabilities(ResourceCapabilities::from_methods(vec![Find, Get, Create, Patch]))
            .with_patch_fields(&["is_read"])
    }

    pub fn company_info(&self) -> Singleton<CompanyInfo> {
        Singleton::new(self.clone(), "company/info/")
    }

    pub fn about(&self) -> Singleton<AboutUs> {
        Singleton::new(self.clone(), "company/about/")
    }
}

use anyhow::Result;
use async_trait::async_trait;

use crate::envelope::Normalized;
use crate::errors::ObraError;
use crate::payload::RequestBody;
use crate::query::ListQuery;

/// One page of records plus whatever pagination metadata came with it.
pub type Page<R> = Normalized<Vec<R>>;

/// Standard resource methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceMethod {
    Find,
    Get,
    Create,
    Patch,
    Remove,
    Custom(&'static str),
}

/// Which methods an endpoint accepts, so callers can hide actions the
/// server would refuse anyway.
#[derive(Debug, Clone)]
pub struct ResourceCapabilities {
    pub allowed_methods: Vec<ResourceMethod>,
}

impl ResourceCapabilities {
    pub fn standard_crud() -> Self {
        use ResourceMethod::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Patch, Remove],
        }
    }

    /// Singleton endpoints (`company/info/`): read and patch only.
    pub fn singleton() -> Self {
        use ResourceMethod::*;
        Self {
            allowed_methods: vec![Get, Patch],
        }
    }

    pub fn from_methods(methods: Vec<ResourceMethod>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: &ResourceMethod) -> bool {
        self.allowed_methods.contains(method)
    }
}

/// A REST collection seen from the client:
///
/// - `find`   → `GET    {path}?page=..`
/// - `get`    → `GET    {path}{id}/`
/// - `create` → `POST   {path}`
/// - `patch`  → `PATCH  {path}{id}/` (or `{path}` for singletons)
/// - `remove` → `DELETE {path}{id}/`
///
/// Every method defaults to "not implemented", so a resource overrides only
/// what its endpoint supports.
#[async_trait]
pub trait ObraResource<R>: Send + Sync
where
    R: Send + 'static,
{
    /// Collection path relative to the API root, with trailing slash.
    fn path(&self) -> &str;

    fn capabilities(&self) -> ResourceCapabilities {
        ResourceCapabilities::standard_crud()
    }

    async fn find(&self, _query: &ListQuery) -> Result<Page<R>> {
        Err(ObraError::not_implemented("Method not implemented: find").into_anyhow())
    }

    async fn get(&self, _id: &str) -> Result<R> {
        Err(ObraError::not_implemented("Method not implemented: get").into_anyhow())
    }

    async fn create(&self, _body: RequestBody) -> Result<R> {
        Err(ObraError::not_implemented("Method not implemented: create").into_anyhow())
    }

    /// Partial update. `id` is `None` for singleton endpoints.
    async fn patch(&self, _id: Option<&str>, _body: RequestBody) -> Result<R> {
        Err(ObraError::not_implemented("Method not implemented: patch").into_anyhow())
    }

    async fn remove(&self, _id: &str) -> Result<()> {
        Err(ObraError::not_implemented("Method not implemented: remove").into_anyhow())
    }
}

use std::collections::BTreeMap;

/// Page size used when a query does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the server honours.
pub const MAX_PAGE_SIZE: u32 = 100;

/// List parameters shared by every collection endpoint.
///
/// `no_page` asks for the full list and suppresses `page`/`page_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub no_page: bool,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            no_page: false,
            search: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full, unpaginated list.
    pub fn all() -> Self {
        Self {
            no_page: true,
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = Some(term).filter(|t| !t.trim().is_empty());
        self
    }

    /// Add an equality filter. Empty values and the `ALL` sentinel are
    /// dropped, the server treats a missing filter as "any".
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() && value != "ALL" {
            self.filters.insert(key.into(), value);
        }
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if self.no_page {
            out.push(("no_page".to_string(), "true".to_string()));
        } else {
            out.push(("page".to_string(), self.page.max(1).to_string()));
            out.push((
                "page_size".to_string(),
                self.page_size.clamp(1, MAX_PAGE_SIZE).to_string(),
            ));
        }
        if let Some(search) = &self.search {
            out.push(("search".to_string(), search.clone()));
        }
        for (k, v) in &self.filters {
            out.push((k.clone(), v.clone()));
        }
        out
    }
}

// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE: i64 = 1_000_000;

/// Query string padrão das listagens: `?page=1&pageSize=20&search=...`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[validate(range(min = 1, max = 1_000_000, message = "page deve estar entre 1 e 1000000."))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "pageSize deve estar entre 1 e 100."))]
    pub page_size: Option<i64>,

    /// Busca livre (nome, e-mail...), quando o recurso suporta.
    pub search: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }

    /// Padrão ILIKE pronto para bind (`%termo%`), ou None.
    /// `%`, `_` e `\` do termo são buscados literalmente.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

/// Escapa os curingas do LIKE com o escape padrão do Postgres (`\`).
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, query: &PageQuery) -> Self {
        Self {
            data,
            total,
            page: query.page(),
            page_size: query.page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), 20);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.search_pattern(), None);
    }

    #[test]
    fn computes_offset_and_search_pattern() {
        let q = PageQuery {
            page: Some(3),
            page_size: Some(10),
            search: Some("  acme ".into()),
        };
        assert_eq!(q.offset(), 20);
        assert_eq!(q.search_pattern().as_deref(), Some("%acme%"));
    }

    #[test]
    fn huge_page_is_rejected_and_offset_stays_bounded() {
        let q = PageQuery {
            page: Some(i64::MAX / 2),
            page_size: Some(20),
            search: None,
        };
        assert!(q.validate().is_err());
        assert_eq!(q.offset(), (MAX_PAGE - 1) * 20);
    }

    #[test]
    fn search_wildcards_are_matched_literally() {
        let q = PageQuery {
            page: None,
            page_size: None,
            search: Some("100%_off\\".into()),
        };
        assert_eq!(q.search_pattern().as_deref(), Some("%100\\%\\_off\\\\%"));
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        let q = PageQuery {
            page: Some(1),
            page_size: Some(500),
            search: None,
        };
        assert!(q.validate().is_err());
    }
}

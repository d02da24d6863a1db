use crate::catalog::{sync, ProductFeed};
use crate::cms::entity::Entity;
use crate::cms::{CatalogApi, Product};
use crate::control::{render_template, Response};
use actix_web::get;
use actix_web::web::Data;
use actix_web::HttpRequest;
use askama::Template;
use std::sync::Arc;
use url::form_urlencoded;

/// One entry of a filter dropdown.
#[derive(Clone)]
pub struct UiOption {
    pub slug: String,
    pub name: String,
    pub selected: bool,
}

fn ui_options<T: Entity>(entries: &[T], selected: Option<&str>) -> Vec<UiOption> {
    entries
        .iter()
        .map(|e| UiOption {
            slug: e.slug().to_string(),
            name: e.name().to_string(),
            selected: selected == Some(e.slug()),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "catalog.html")]
pub struct CatalogPage {
    categories: Vec<UiOption>,
    subcategories: Vec<UiOption>,
    third_subcategories: Vec<UiOption>,
    brands: Vec<UiOption>,
    models: Vec<UiOption>,
    modifications: Vec<UiOption>,
    products: Vec<Product>,
    search: String,
    error: Option<String>,
    filters_unavailable: bool,
    page: u32,
    total_pages: u64,
    total_docs: u64,
    /// Canonical filter query plus a trailing `&` when non-empty, so
    /// pagination links can always append `page=N`.
    page_base: String,
}

impl CatalogPage {
    fn has_prev(&self) -> bool {
        self.page > 1
    }

    fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }
}

/// Pagination never travels through the URL synchronization layer; the page
/// parameter is read here, session-local.
fn page_param(query: &str) -> u32 {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

#[get("/catalog")]
pub async fn browse(api: Data<Arc<dyn CatalogApi>>, req: HttpRequest) -> Response {
    let mut feed = ProductFeed::new(api.get_ref().clone());
    let filters_unavailable = match feed.load_references().await {
        Ok(()) => false,
        Err(err) => {
            log::warn!("Unable to load filter reference data: {err:#}");
            true
        }
    };

    feed.restore(req.query_string());
    let page = page_param(req.query_string());
    if page > 1 {
        feed.update(|s| s.set_page(page));
    }
    feed.refresh().await;

    let options = feed.options();
    let selection = feed.selection();
    let canonical = sync::encode(selection);
    let page_base = if canonical.is_empty() {
        String::new()
    } else {
        format!("{canonical}&")
    };

    render_template(CatalogPage {
        categories: ui_options(&options.categories, selection.category.as_deref()),
        subcategories: ui_options(&options.subcategories, selection.subcategory.as_deref()),
        third_subcategories: ui_options(
            &options.third_subcategories,
            selection.thirdsubcategory.as_deref(),
        ),
        brands: ui_options(&options.brands, selection.brand.as_deref()),
        models: ui_options(&options.models, selection.model.as_deref()),
        modifications: ui_options(&options.modifications, selection.modification.as_deref()),
        products: feed.state().products().to_vec(),
        search: selection.search.clone().unwrap_or_default(),
        error: feed.state().error().map(str::to_string),
        filters_unavailable,
        page: selection.page,
        total_pages: feed.state().total_pages(),
        total_docs: feed.state().total_docs(),
        page_base,
    })
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn page_parameter_is_read_outside_the_sync_layer() {
        assert_eq!(3, page_param("category=batteries&page=3"));
        assert_eq!(1, page_param("category=batteries"));
        assert_eq!(1, page_param("page=0"));
        assert_eq!(1, page_param("page=abc"));
    }
}

use crate::catalog::feed::product_query;
use crate::catalog::FilterSelection;
use crate::cms::entity::{Brand, Category};
use crate::cms::{CatalogApi, Product};
use crate::control::{render_template, Response};
use actix_web::get;
use actix_web::web::Data;
use askama::Template;
use std::sync::Arc;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    categories: Vec<Category>,
    brands: Vec<Brand>,
    products: Vec<Product>,
    categories_failed: bool,
    brands_failed: bool,
    products_failed: bool,
}

/// Landing page: category and brand shortcuts plus the latest products. Each
/// section loads independently and shows its own failure note; one broken CMS
/// collection never takes the whole page down.
#[get("/")]
pub async fn index(api: Data<Arc<dyn CatalogApi>>) -> Response {
    let query = product_query(&FilterSelection::default());
    let (categories, brands, products) =
        tokio::join!(api.categories(), api.brands(), api.products(&query));

    let (categories, categories_failed) = match categories {
        Ok(categories) => (categories, false),
        Err(err) => {
            log::warn!("Unable to load categories for the landing page: {err:#}");
            (vec![], true)
        }
    };
    let (brands, brands_failed) = match brands {
        Ok(brands) => (brands, false),
        Err(err) => {
            log::warn!("Unable to load brands for the landing page: {err:#}");
            (vec![], true)
        }
    };
    let (products, products_failed) = match products {
        Ok(page) => (page.docs, false),
        Err(err) => {
            log::warn!("Unable to load products for the landing page: {err:#}");
            (vec![], true)
        }
    };

    render_template(IndexPage {
        categories,
        brands,
        products,
        categories_failed,
        brands_failed,
        products_failed,
    })
}

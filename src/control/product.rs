use crate::cms::{CatalogApi, Product};
use crate::control::{render_template, ControllerError, Response};
use actix_web::get;
use actix_web::web::{Data, Path};
use askama::Template;
use std::sync::Arc;

#[derive(Template)]
#[template(path = "product.html")]
pub struct ProductPage {
    product: Product,
    category_name: String,
    vehicle_name: String,
}

/// Renders "Brand Model Modification" from whatever relations the product
/// carries, skipping bare-id placeholders.
fn vehicle_name(product: &Product) -> String {
    let mut parts = vec![];
    if let Some(brand) = product.brand.as_ref().and_then(|b| b.full()) {
        parts.push(brand.name.as_str());
    }
    if let Some(model) = product.model.as_ref().and_then(|m| m.full()) {
        parts.push(model.name.as_str());
    }
    if let Some(modification) = product.modification.as_ref().and_then(|m| m.full()) {
        parts.push(modification.name.as_str());
    }
    parts.join(" ")
}

fn category_name(product: &Product) -> String {
    product
        .thirdsubcategory
        .as_ref()
        .and_then(|c| c.full().map(|c| c.name.clone()))
        .or_else(|| {
            product
                .subcategory
                .as_ref()
                .and_then(|c| c.full().map(|c| c.name.clone()))
        })
        .or_else(|| {
            product
                .category
                .as_ref()
                .and_then(|c| c.full().map(|c| c.name.clone()))
        })
        .unwrap_or_default()
}

#[get("/item/{slug}")]
pub async fn view(slug: Path<String>, api: Data<Arc<dyn CatalogApi>>) -> Response {
    let product = api
        .product_by_slug(&slug.into_inner())
        .await?
        .ok_or(ControllerError::NotFound)?;

    render_template(ProductPage {
        category_name: category_name(&product),
        vehicle_name: vehicle_name(&product),
        product,
    })
}

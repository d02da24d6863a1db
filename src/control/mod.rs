use actix_web::http::header::ContentType;
use actix_web::web::{Form, Json};
use actix_web::{Either, HttpResponse};
use anyhow::anyhow;
use askama::Template;
use derive_more::{Display, Error};
use log_error::LogError;

pub mod catalog;
pub mod landing;
pub mod leads;
pub mod pages;
pub mod product;

pub type Response = Result<HttpResponse, ControllerError>;
pub type InputData<T> = Either<Form<T>, Json<T>>;

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    NotFound,
    #[error(ignore)]
    InternalServerError(anyhow::Error),
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn error_response(&self) -> HttpResponse {
        log::warn!("{self:?}\n");
        use ControllerError::*;
        match self {
            NotFound => NotFoundPage {}
                .render()
                .log_error("Unable to render error template")
                .map(|res| {
                    HttpResponse::NotFound()
                        .content_type(ContentType::html())
                        .body(res)
                })
                .unwrap_or_else(|| HttpResponse::NotFound().body(())),
            InternalServerError(err) => InternalServerErrorPage {
                error: err.to_string(),
            }
            .render()
            .log_error("Unable to render error template")
            .map(|res| {
                HttpResponse::InternalServerError()
                    .content_type(ContentType::html())
                    .body(res)
            })
            .unwrap_or_else(|| HttpResponse::InternalServerError().body(err.to_string())),
        }
    }
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundPage {}

#[derive(Template)]
#[template(path = "500.html")]
pub struct InternalServerErrorPage {
    error: String,
}

pub async fn not_found() -> Response {
    render_template(NotFoundPage {})
}

pub fn render_template(t: impl Template) -> Result<HttpResponse, ControllerError> {
    let result = t
        .render()
        .map_err(|x| ControllerError::InternalServerError(anyhow!(x)))?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(result))
}

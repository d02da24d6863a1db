use crate::cms::entity::{CustomPage, NewsArticle};
use crate::cms::CatalogApi;
use crate::control::{render_template, ControllerError, Response};
use crate::{plain_text, trim_to};
use actix_web::get;
use actix_web::web::{Data, Path, Query};
use askama::Template;
use serde::Deserialize;
use std::sync::Arc;

const NEWS_PAGE_SIZE: u32 = 10;
const EXCERPT_LEN: usize = 200;

pub struct NewsCard {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub published_on: String,
}

#[derive(Template)]
#[template(path = "news.html")]
pub struct NewsIndexPage {
    articles: Vec<NewsCard>,
    page: u32,
    total_pages: u64,
    failed: bool,
}

impl NewsIndexPage {
    fn has_prev(&self) -> bool {
        self.page > 1
    }

    fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsParams {
    pub page: Option<u32>,
}

fn card(article: NewsArticle) -> NewsCard {
    let excerpt = article
        .excerpt
        .clone()
        .unwrap_or_else(|| trim_to(&plain_text(article.body.as_deref().unwrap_or_default()), EXCERPT_LEN));
    NewsCard {
        published_on: article.published_on(),
        title: article.title,
        slug: article.slug,
        excerpt,
    }
}

#[get("/news")]
pub async fn news_index(api: Data<Arc<dyn CatalogApi>>, params: Query<NewsParams>) -> Response {
    let page = params.page.unwrap_or(1).max(1);
    let (articles, total_pages, failed) = match api.news(page, NEWS_PAGE_SIZE).await {
        Ok(listing) => (
            listing.docs.into_iter().map(card).collect(),
            listing.total_pages,
            false,
        ),
        Err(err) => {
            log::warn!("Unable to load news: {err:#}");
            (vec![], 0, true)
        }
    };

    render_template(NewsIndexPage {
        articles,
        page,
        total_pages,
        failed,
    })
}

#[derive(Template)]
#[template(path = "news_article.html")]
pub struct NewsArticlePage {
    title: String,
    published_on: String,
    body: String,
}

#[get("/news/{slug}")]
pub async fn news_article(slug: Path<String>, api: Data<Arc<dyn CatalogApi>>) -> Response {
    let article = api
        .news_by_slug(&slug.into_inner())
        .await?
        .ok_or(ControllerError::NotFound)?;

    render_template(NewsArticlePage {
        published_on: article.published_on(),
        title: article.title,
        body: article.body.unwrap_or_default(),
    })
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct CustomPageView {
    title: String,
    body: String,
}

impl From<CustomPage> for CustomPageView {
    fn from(page: CustomPage) -> Self {
        CustomPageView {
            title: page.title,
            body: page.body.unwrap_or_default(),
        }
    }
}

#[get("/page/{slug}")]
pub async fn custom_page(slug: Path<String>, api: Data<Arc<dyn CatalogApi>>) -> Response {
    let page = api
        .page_by_slug(&slug.into_inner())
        .await?
        .ok_or(ControllerError::NotFound)?;
    render_template(CustomPageView::from(page))
}

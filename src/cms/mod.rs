use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::form_urlencoded;

pub mod entity;

pub use entity::{
    Brand, Category, CustomPage, Modification, NewsArticle, Product, Subcategory,
    ThirdSubcategory, VehicleModel,
};

/// High enough to approximate "all documents" for reference collections.
pub const REFERENCE_LIMIT: u32 = 1000;

/// One page of a CMS collection listing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub total_pages: u64,
    pub page: u64,
    pub limit: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Page {
            docs: vec![],
            total_docs: 0,
            total_pages: 0,
            page: 1,
            limit: 0,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}

/// Builds the `where[<field>][<operator>]=<value>` query strings the CMS
/// understands, plus the pagination and population knobs.
#[derive(Debug, Clone, Default)]
pub struct CollectionQuery {
    pairs: Vec<(String, String)>,
}

impl CollectionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter(mut self, field: &str, operator: &str, value: &str) -> Self {
        self.pairs
            .push((format!("where[{field}][{operator}]"), value.to_string()));
        self
    }

    pub fn where_equals(self, field: &str, value: &str) -> Self {
        self.filter(field, "equals", value)
    }

    pub fn where_like(self, field: &str, value: &str) -> Self {
        self.filter(field, "like", value)
    }

    pub fn where_gte(self, field: &str, value: &str) -> Self {
        self.filter(field, "greater_than_equal", value)
    }

    pub fn where_lte(self, field: &str, value: &str) -> Self {
        self.filter(field, "less_than_equal", value)
    }

    pub fn depth(mut self, depth: u8) -> Self {
        self.pairs.push(("depth".to_string(), depth.to_string()));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.pairs.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.pairs.push(("page".to_string(), page.to_string()));
        self
    }

    pub fn sort(mut self, order: &str) -> Self {
        self.pairs.push(("sort".to_string(), order.to_string()));
        self
    }

    pub fn encode(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            out.append_pair(k, v);
        }
        out.finish()
    }
}

/// The catalog read query the browsing surface issues: zero or more axis
/// constraints, optional free text, pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub thirdsubcategory: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub modification: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ProductQuery {
    fn to_collection_query(&self) -> CollectionQuery {
        let mut query = CollectionQuery::new();
        let axes = [
            ("category.slug", &self.category),
            ("subcategory.slug", &self.subcategory),
            ("thirdsubcategory.slug", &self.thirdsubcategory),
            ("brand.slug", &self.brand),
            ("model.slug", &self.model),
            ("modification.slug", &self.modification),
        ];
        for (field, value) in axes {
            if let Some(value) = value {
                query = query.where_equals(field, value);
            }
        }
        if let Some(search) = &self.search {
            query = query.where_like("searchText", search);
        }
        query.depth(2).page(self.page.max(1)).limit(self.limit)
    }
}

/// Read access to the remote catalog. Controllers and the product feed only
/// see this trait so tests can substitute an in-memory catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn categories(&self) -> anyhow::Result<Vec<Category>>;
    async fn subcategories(&self) -> anyhow::Result<Vec<Subcategory>>;
    async fn third_subcategories(&self) -> anyhow::Result<Vec<ThirdSubcategory>>;
    async fn brands(&self) -> anyhow::Result<Vec<Brand>>;
    async fn models(&self) -> anyhow::Result<Vec<VehicleModel>>;
    async fn modifications(&self) -> anyhow::Result<Vec<Modification>>;
    async fn products(&self, query: &ProductQuery) -> anyhow::Result<Page<Product>>;
    async fn product_by_slug(&self, slug: &str) -> anyhow::Result<Option<Product>>;
    async fn news(&self, page: u32, limit: u32) -> anyhow::Result<Page<NewsArticle>>;
    async fn news_by_slug(&self, slug: &str) -> anyhow::Result<Option<NewsArticle>>;
    async fn page_by_slug(&self, slug: &str) -> anyhow::Result<Option<CustomPage>>;
}

/// HTTP client for the headless CMS. Any non-success response surfaces as an
/// error; there is no retry here, callers render their own failure state.
pub struct CmsClient {
    http: reqwest::Client,
    base: url::Url,
}

impl CmsClient {
    pub fn new(http: reqwest::Client, base: &str) -> anyhow::Result<Self> {
        let base = url::Url::parse(base.trim_end_matches('/'))
            .with_context(|| format!("Invalid CMS base url: {base}"))?;
        Ok(Self { http, base })
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &CollectionQuery,
    ) -> anyhow::Result<Page<T>> {
        let mut url = url::Url::parse(&format!(
            "{}/{collection}",
            self.base.as_str().trim_end_matches('/')
        ))
        .with_context(|| format!("Invalid CMS collection path: {collection}"))?;
        url.set_query(Some(&query.encode()));

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("CMS request to {collection} failed"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("CMS returned {status} for {collection}"));
        }
        response
            .json::<Page<T>>()
            .await
            .with_context(|| format!("Unable to decode CMS response for {collection}"))
    }

    async fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> anyhow::Result<Vec<T>> {
        let query = CollectionQuery::new().depth(1).limit(REFERENCE_LIMIT).page(1);
        Ok(self.fetch_page::<T>(collection, &query).await?.docs)
    }

    async fn fetch_one_by_slug<T: DeserializeOwned>(
        &self,
        collection: &str,
        slug: &str,
    ) -> anyhow::Result<Option<T>> {
        let query = CollectionQuery::new()
            .where_equals("slug", slug)
            .depth(2)
            .limit(1)
            .page(1);
        Ok(self
            .fetch_page::<T>(collection, &query)
            .await?
            .docs
            .into_iter()
            .next())
    }
}

#[async_trait]
impl CatalogApi for CmsClient {
    async fn categories(&self) -> anyhow::Result<Vec<Category>> {
        self.fetch_all("categories").await
    }

    async fn subcategories(&self) -> anyhow::Result<Vec<Subcategory>> {
        self.fetch_all("subcategories").await
    }

    async fn third_subcategories(&self) -> anyhow::Result<Vec<ThirdSubcategory>> {
        self.fetch_all("third-subcategories").await
    }

    async fn brands(&self) -> anyhow::Result<Vec<Brand>> {
        self.fetch_all("brands").await
    }

    async fn models(&self) -> anyhow::Result<Vec<VehicleModel>> {
        self.fetch_all("models").await
    }

    async fn modifications(&self) -> anyhow::Result<Vec<Modification>> {
        self.fetch_all("modifications").await
    }

    async fn products(&self, query: &ProductQuery) -> anyhow::Result<Page<Product>> {
        self.fetch_page("products", &query.to_collection_query())
            .await
    }

    async fn product_by_slug(&self, slug: &str) -> anyhow::Result<Option<Product>> {
        self.fetch_one_by_slug("products", slug).await
    }

    async fn news(&self, page: u32, limit: u32) -> anyhow::Result<Page<NewsArticle>> {
        let query = CollectionQuery::new()
            .sort("-publishedAt")
            .depth(1)
            .limit(limit)
            .page(page.max(1));
        self.fetch_page("news", &query).await
    }

    async fn news_by_slug(&self, slug: &str) -> anyhow::Result<Option<NewsArticle>> {
        self.fetch_one_by_slug("news", slug).await
    }

    async fn page_by_slug(&self, slug: &str) -> anyhow::Result<Option<CustomPage>> {
        self.fetch_one_by_slug("pages", slug).await
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn encodes_filter_operators() {
        let query = CollectionQuery::new()
            .where_equals("category.slug", "batteries")
            .where_like("searchText", "bosch s4")
            .where_gte("price", "100")
            .where_lte("price", "5000")
            .depth(2)
            .limit(12)
            .page(3);
        let encoded = query.encode();
        assert!(encoded.contains("where%5Bcategory.slug%5D%5Bequals%5D=batteries"));
        assert!(encoded.contains("where%5BsearchText%5D%5Blike%5D=bosch+s4"));
        assert!(encoded.contains("where%5Bprice%5D%5Bgreater_than_equal%5D=100"));
        assert!(encoded.contains("where%5Bprice%5D%5Bless_than_equal%5D=5000"));
        assert!(encoded.contains("depth=2"));
        assert!(encoded.contains("limit=12"));
        assert!(encoded.contains("page=3"));
    }

    #[test]
    fn product_query_maps_axes_to_slug_filters() {
        let query = ProductQuery {
            category: Some("batteries".to_string()),
            brand: Some("bmw".to_string()),
            search: Some("agm".to_string()),
            page: 2,
            limit: 12,
            ..ProductQuery::default()
        };
        let encoded = query.to_collection_query().encode();
        assert!(encoded.contains("where%5Bcategory.slug%5D%5Bequals%5D=batteries"));
        assert!(encoded.contains("where%5Bbrand.slug%5D%5Bequals%5D=bmw"));
        assert!(encoded.contains("where%5BsearchText%5D%5Blike%5D=agm"));
        assert!(!encoded.contains("subcategory"));
        assert!(encoded.contains("page=2"));
    }

    #[test]
    fn page_zero_is_clamped_to_one() {
        let query = ProductQuery {
            limit: 12,
            ..ProductQuery::default()
        };
        assert!(query.to_collection_query().encode().contains("page=1"));
    }

    #[test]
    fn decodes_page_envelope() {
        let page: Page<Category> = serde_json::from_str(
            r#"{
                "docs": [{ "id": "c1", "name": "Batteries", "slug": "batteries" }],
                "totalDocs": 1,
                "totalPages": 1,
                "page": 1,
                "limit": 12,
                "hasNextPage": false,
                "hasPrevPage": false
            }"#,
        )
        .expect("page envelope");
        assert_eq!(1, page.docs.len());
        assert_eq!("batteries", page.docs[0].slug);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::catalog::options::{derive_options, OptionSet, ReferenceData};
use crate::catalog::selection::FilterSelection;
use crate::catalog::sync;
use crate::cms::entity::Product;
use crate::cms::{CatalogApi, Page, ProductQuery};

static PAGE_SIZE: Lazy<u32> =
    Lazy::new(|| crate::env_u64("CATALOG_PAGE_SIZE", 12) as u32);

/// What the catalog surface currently shows for the product grid.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    /// No fetch has completed yet.
    #[default]
    Idle,
    Loaded {
        products: Vec<Product>,
        total_docs: u64,
        total_pages: u64,
    },
    /// The fetch failed; the grid renders an error and an empty list.
    Failed { message: String },
}

impl ViewState {
    pub fn products(&self) -> &[Product] {
        match self {
            ViewState::Loaded { products, .. } => products,
            _ => &[],
        }
    }

    pub fn total_docs(&self) -> u64 {
        match self {
            ViewState::Loaded { total_docs, .. } => *total_docs,
            _ => 0,
        }
    }

    pub fn total_pages(&self) -> u64 {
        match self {
            ViewState::Loaded { total_pages, .. } => *total_pages,
            _ => 0,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Drives product fetches for one catalog view: owns the selection, the last
/// result, and a request generation counter.
///
/// Overlapping fetches are neither deduplicated nor cancelled; instead every
/// fetch is tagged with a monotonically increasing generation and a response
/// carrying a stale generation is discarded, so the newest request always
/// determines the displayed state.
pub struct ProductFeed {
    api: Arc<dyn CatalogApi>,
    refs: Option<Arc<ReferenceData>>,
    selection: FilterSelection,
    state: ViewState,
    issued: AtomicU64,
    committed: u64,
    synced: bool,
}

impl ProductFeed {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        ProductFeed {
            api,
            refs: None,
            selection: FilterSelection::default(),
            state: ViewState::Idle,
            issued: AtomicU64::new(0),
            committed: 0,
            synced: false,
        }
    }

    /// Loads the six reference lists jointly. Derivation never runs before
    /// this has completed once; afterwards the lists are kept for the
    /// lifetime of the feed.
    pub async fn load_references(&mut self) -> anyhow::Result<()> {
        if self.refs.is_some() {
            return Ok(());
        }
        let (categories, subcategories, third_subcategories, brands, models, modifications) = tokio::join!(
            self.api.categories(),
            self.api.subcategories(),
            self.api.third_subcategories(),
            self.api.brands(),
            self.api.models(),
            self.api.modifications(),
        );
        self.refs = Some(Arc::new(ReferenceData {
            categories: categories?,
            subcategories: subcategories?,
            third_subcategories: third_subcategories?,
            brands: brands?,
            models: models?,
            modifications: modifications?,
        }));
        Ok(())
    }

    pub fn references(&self) -> Option<&ReferenceData> {
        self.refs.as_deref()
    }

    /// URL → state, on first load. Unlocks fetching: before this has run a
    /// refresh is a no-op, so default state never triggers a redundant query.
    pub fn restore(&mut self, query: &str) {
        self.selection = sync::decode(query);
        self.synced = true;
    }

    /// URL → state after an external navigation; a changed search text drops
    /// the structural filters for this cycle.
    pub fn navigate(&mut self, query: &str) {
        let last_search = self.selection.search.clone();
        self.selection = sync::decode_following(query, last_search.as_deref());
        self.synced = true;
    }

    pub fn update(&mut self, transition: impl FnOnce(FilterSelection) -> FilterSelection) {
        self.selection = transition(self.selection.clone());
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// State → URL; the caller compares with `sync::is_current` before
    /// navigating so equivalent addresses cause no movement.
    pub fn query_string(&self) -> String {
        sync::encode(&self.selection)
    }

    /// Tags a new request. Fetching and committing are split so callers (and
    /// tests) can hold several requests in flight at once.
    pub fn begin_fetch(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies a response unless a newer request already landed. Returns
    /// whether the response was applied.
    pub fn commit(&mut self, generation: u64, outcome: anyhow::Result<Page<Product>>) -> bool {
        if generation <= self.committed {
            return false;
        }
        self.committed = generation;
        self.state = match outcome {
            Ok(page) => ViewState::Loaded {
                products: page.docs,
                total_docs: page.total_docs,
                total_pages: page.total_pages,
            },
            Err(err) => {
                log::warn!("Product fetch failed: {err:#}");
                ViewState::Failed {
                    message: err.to_string(),
                }
            }
        };
        true
    }

    /// Issues a fetch for the current selection and applies the result.
    pub async fn refresh(&mut self) -> &ViewState {
        if !self.synced {
            return &self.state;
        }
        let generation = self.begin_fetch();
        let query = product_query(&self.selection);
        let outcome = self.api.products(&query).await;
        self.commit(generation, outcome);
        &self.state
    }

    /// Option lists for the six dropdowns, derived from the reference data,
    /// the selection and the latest result set.
    pub fn options(&self) -> OptionSet {
        match &self.refs {
            Some(refs) => derive_options(refs, &self.selection, self.state.products()),
            None => OptionSet::default(),
        }
    }
}

/// Maps the selection to the remote query: slugs become equals-filters, the
/// search text becomes a like-filter over the product search fields.
pub fn product_query(selection: &FilterSelection) -> ProductQuery {
    ProductQuery {
        category: selection.category.clone(),
        subcategory: selection.subcategory.clone(),
        thirdsubcategory: selection.thirdsubcategory.clone(),
        brand: selection.brand.clone(),
        model: selection.model.clone(),
        modification: selection.modification.clone(),
        search: selection.search.clone(),
        page: selection.page,
        limit: *PAGE_SIZE,
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::cms::entity::{
        Brand, Category, CustomPage, Modification, NewsArticle, Subcategory, ThirdSubcategory,
        VehicleModel,
    };
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct StubCatalog {
        products: Vec<Product>,
        total_docs: u64,
        fail_products: bool,
        product_calls: AtomicUsize,
        last_query: std::sync::Mutex<Option<ProductQuery>>,
    }

    fn product(id: &str) -> Product {
        serde_json::from_str(&format!(
            r#"{{ "id": "{id}", "name": "{id}", "slug": "{id}" }}"#
        ))
        .expect("product stub")
    }

    #[async_trait]
    impl CatalogApi for StubCatalog {
        async fn categories(&self) -> anyhow::Result<Vec<Category>> {
            Ok(vec![])
        }
        async fn subcategories(&self) -> anyhow::Result<Vec<Subcategory>> {
            Ok(vec![])
        }
        async fn third_subcategories(&self) -> anyhow::Result<Vec<ThirdSubcategory>> {
            Ok(vec![])
        }
        async fn brands(&self) -> anyhow::Result<Vec<Brand>> {
            Ok(vec![])
        }
        async fn models(&self) -> anyhow::Result<Vec<VehicleModel>> {
            Ok(vec![])
        }
        async fn modifications(&self) -> anyhow::Result<Vec<Modification>> {
            Ok(vec![])
        }
        async fn products(&self, query: &ProductQuery) -> anyhow::Result<Page<Product>> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().expect("query lock") = Some(query.clone());
            if self.fail_products {
                return Err(anyhow!("catalog unreachable"));
            }
            Ok(Page {
                docs: self.products.clone(),
                total_docs: self.total_docs,
                total_pages: 1,
                page: query.page as u64,
                limit: query.limit as u64,
                has_next_page: false,
                has_prev_page: false,
            })
        }
        async fn product_by_slug(&self, _slug: &str) -> anyhow::Result<Option<Product>> {
            Ok(None)
        }
        async fn news(&self, _page: u32, _limit: u32) -> anyhow::Result<Page<NewsArticle>> {
            Ok(Page::empty())
        }
        async fn news_by_slug(&self, _slug: &str) -> anyhow::Result<Option<NewsArticle>> {
            Ok(None)
        }
        async fn page_by_slug(&self, _slug: &str) -> anyhow::Result<Option<CustomPage>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn no_fetch_before_url_state_sync() {
        let stub = Arc::new(StubCatalog::default());
        let mut feed = ProductFeed::new(stub.clone());
        feed.refresh().await;
        assert_eq!(0, stub.product_calls.load(Ordering::SeqCst));

        feed.restore("category=batteries");
        feed.refresh().await;
        assert_eq!(1, stub.product_calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn restore_maps_url_to_query_parameters() {
        let stub = Arc::new(StubCatalog::default());
        let mut feed = ProductFeed::new(stub.clone());
        feed.restore("category=batteries&brand=bmw&search=agm");
        feed.update(|s| s.set_page(3));
        feed.refresh().await;

        let query = stub
            .last_query
            .lock()
            .expect("query lock")
            .clone()
            .expect("a query was issued");
        assert_eq!(Some("batteries".to_string()), query.category);
        assert_eq!(Some("bmw".to_string()), query.brand);
        assert_eq!(Some("agm".to_string()), query.search);
        assert_eq!(3, query.page);
        assert_eq!(*PAGE_SIZE, query.limit);
    }

    #[tokio::test]
    async fn stale_generation_is_discarded() {
        let stub = Arc::new(StubCatalog {
            total_docs: 2,
            products: vec![product("new")],
            ..StubCatalog::default()
        });
        let mut feed = ProductFeed::new(stub.clone());
        feed.restore("");

        // two overlapping requests: the older one resolves last
        let first = feed.begin_fetch();
        let second = feed.begin_fetch();

        let newer = stub.products(&product_query(feed.selection())).await;
        assert!(feed.commit(second, newer));
        let slow_page = Page {
            docs: vec![product("old")],
            total_docs: 1,
            total_pages: 1,
            page: 1,
            limit: 12,
            has_next_page: false,
            has_prev_page: false,
        };
        assert!(!feed.commit(first, Ok(slow_page)));

        assert_eq!(1, feed.state().products().len());
        assert_eq!("new", feed.state().products()[0].slug);
    }

    #[tokio::test]
    async fn failed_fetch_stores_error_and_empty_list() {
        let stub = Arc::new(StubCatalog {
            fail_products: true,
            ..StubCatalog::default()
        });
        let mut feed = ProductFeed::new(stub);
        feed.restore("brand=bmw");
        feed.refresh().await;

        assert!(feed.state().error().is_some());
        assert!(feed.state().products().is_empty());
    }

    #[tokio::test]
    async fn navigation_with_new_search_drops_filters() {
        let stub = Arc::new(StubCatalog::default());
        let mut feed = ProductFeed::new(stub);
        feed.restore("category=batteries&brand=bmw");
        feed.navigate("category=batteries&brand=bmw&search=pads");

        assert_eq!(Some("pads".to_string()), feed.selection().search);
        assert!(!feed.selection().has_axis_filter());
    }

    #[tokio::test]
    async fn options_are_empty_until_references_load() {
        let stub = Arc::new(StubCatalog::default());
        let mut feed = ProductFeed::new(stub);
        feed.restore("");
        assert!(feed.options().categories.is_empty());
        feed.load_references().await.expect("stub references");
        assert!(feed.references().is_some());
    }
}

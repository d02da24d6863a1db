/// The user's current position in the catalog: one optional slug per filter
/// axis, optional free-text search, current page.
///
/// Every transition returns a new, fully consistent value. Selecting an
/// upstream axis clears everything that depends on it, so no caller ever has
/// to remember the cascade order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub thirdsubcategory: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub modification: Option<String>,
    pub search: Option<String>,
    pub page: u32,
}

impl Default for FilterSelection {
    fn default() -> Self {
        FilterSelection {
            category: None,
            subcategory: None,
            thirdsubcategory: None,
            brand: None,
            model: None,
            modification: None,
            search: None,
            page: 1,
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FilterSelection {
    pub fn set_category(mut self, category: Option<String>) -> Self {
        self.category = normalize(category);
        self.subcategory = None;
        self.thirdsubcategory = None;
        self.page = 1;
        self
    }

    pub fn set_subcategory(mut self, subcategory: Option<String>) -> Self {
        self.subcategory = normalize(subcategory);
        self.thirdsubcategory = None;
        self.page = 1;
        self
    }

    pub fn set_thirdsubcategory(mut self, thirdsubcategory: Option<String>) -> Self {
        self.thirdsubcategory = normalize(thirdsubcategory);
        self.page = 1;
        self
    }

    pub fn set_brand(mut self, brand: Option<String>) -> Self {
        self.brand = normalize(brand);
        self.model = None;
        self.modification = None;
        self.page = 1;
        self
    }

    pub fn set_model(mut self, model: Option<String>) -> Self {
        self.model = normalize(model);
        self.modification = None;
        self.page = 1;
        self
    }

    pub fn set_modification(mut self, modification: Option<String>) -> Self {
        self.modification = normalize(modification);
        self.page = 1;
        self
    }

    /// A new search text is a new query, not a refinement: changing it drops
    /// every structural selection. Setting the same text again is a no-op.
    pub fn set_search(self, search: Option<String>) -> Self {
        let search = normalize(search);
        if search == self.search {
            return self;
        }
        FilterSelection {
            search,
            page: 1,
            ..FilterSelection::default()
        }
    }

    pub fn set_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn has_axis_filter(&self) -> bool {
        self.category.is_some()
            || self.subcategory.is_some()
            || self.thirdsubcategory.is_some()
            || self.brand.is_some()
            || self.model.is_some()
            || self.modification.is_some()
    }

    pub fn is_filtered(&self) -> bool {
        self.has_axis_filter() || self.search.is_some()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn full_selection() -> FilterSelection {
        FilterSelection::default()
            .set_category(Some("batteries".to_string()))
            .set_subcategory(Some("starter".to_string()))
            .set_thirdsubcategory(Some("agm".to_string()))
            .set_brand(Some("bmw".to_string()))
            .set_model(Some("e60".to_string()))
            .set_modification(Some("530d".to_string()))
            .set_page(4)
    }

    #[test]
    fn changing_category_clears_taxonomy_descendants() {
        let sel = full_selection().set_category(Some("oils".to_string()));
        assert_eq!(Some("oils".to_string()), sel.category);
        assert_eq!(None, sel.subcategory);
        assert_eq!(None, sel.thirdsubcategory);
        // vehicle axes are independent of the taxonomy cascade
        assert_eq!(Some("bmw".to_string()), sel.brand);
        assert_eq!(Some("e60".to_string()), sel.model);
        assert_eq!(1, sel.page);
    }

    #[test]
    fn changing_brand_clears_model_and_modification() {
        let sel = full_selection().set_brand(Some("audi".to_string()));
        assert_eq!(Some("audi".to_string()), sel.brand);
        assert_eq!(None, sel.model);
        assert_eq!(None, sel.modification);
        assert_eq!(Some("batteries".to_string()), sel.category);
        assert_eq!(1, sel.page);
    }

    #[test]
    fn changing_model_clears_only_modification() {
        let sel = full_selection().set_model(Some("f10".to_string()));
        assert_eq!(Some("f10".to_string()), sel.model);
        assert_eq!(None, sel.modification);
        assert_eq!(Some("bmw".to_string()), sel.brand);
    }

    #[test]
    fn new_search_clears_all_structural_filters_and_resets_page() {
        let sel = full_selection()
            .set_search(Some("filter".to_string()))
            .set_page(3)
            .set_search(Some("brake pads".to_string()));
        assert_eq!(Some("brake pads".to_string()), sel.search);
        assert!(!sel.has_axis_filter());
        assert_eq!(1, sel.page);
    }

    #[test]
    fn repeating_the_same_search_keeps_structural_filters() {
        let sel = full_selection();
        // no search set yet, so "no search -> no search" must not clear anything
        let sel = sel.set_search(None);
        assert!(sel.has_axis_filter());
        assert_eq!(4, sel.page);
    }

    #[test]
    fn empty_and_whitespace_values_unset_the_axis() {
        let sel = full_selection()
            .set_modification(Some("  ".to_string()))
            .set_subcategory(Some(String::new()));
        assert_eq!(None, sel.modification);
        assert_eq!(None, sel.subcategory);
    }

    #[test]
    fn page_is_never_zero() {
        assert_eq!(1, FilterSelection::default().set_page(0).page);
    }
}

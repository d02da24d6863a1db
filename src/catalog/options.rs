use std::collections::HashSet;

use crate::catalog::selection::FilterSelection;
use crate::cms::entity::{
    Brand, Category, Entity, Modification, Product, Related, Subcategory, ThirdSubcategory,
    VehicleModel,
};

/// Full reference lists for every filter axis, loaded once from the CMS
/// before the first derivation runs.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub third_subcategories: Vec<ThirdSubcategory>,
    pub brands: Vec<Brand>,
    pub models: Vec<VehicleModel>,
    pub modifications: Vec<Modification>,
}

impl ReferenceData {
    pub fn subcategory_by_slug(&self, slug: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.slug == slug)
    }

    pub fn third_subcategory_by_slug(&self, slug: &str) -> Option<&ThirdSubcategory> {
        self.third_subcategories.iter().find(|s| s.slug == slug)
    }
}

/// What each of the six dropdowns is allowed to offer right now. Purely a
/// rendering input, recomputed whenever the selection or the result set
/// changes.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub third_subcategories: Vec<ThirdSubcategory>,
    pub brands: Vec<Brand>,
    pub models: Vec<VehicleModel>,
    pub modifications: Vec<Modification>,
}

/// Slugs and ids present in the current product result set, one bucket per
/// axis. Bare-id relations contribute their id so shallow population still
/// cross-filters.
#[derive(Debug, Default)]
struct Presence {
    categories: HashSet<String>,
    subcategories: HashSet<String>,
    third_subcategories: HashSet<String>,
    brands: HashSet<String>,
    models: HashSet<String>,
    modifications: HashSet<String>,
}

fn record<T: Entity>(bucket: &mut HashSet<String>, relation: &Option<Related<T>>) {
    if let Some(relation) = relation {
        bucket.insert(relation.id().to_string());
        if let Some(slug) = relation.slug() {
            bucket.insert(slug.to_string());
        }
    }
}

impl Presence {
    fn collect(products: &[Product]) -> Self {
        let mut p = Presence::default();
        for product in products {
            record(&mut p.categories, &product.category);
            record(&mut p.subcategories, &product.subcategory);
            record(&mut p.third_subcategories, &product.thirdsubcategory);
            record(&mut p.brands, &product.brand);
            record(&mut p.models, &product.model);
            record(&mut p.modifications, &product.modification);
        }
        p
    }
}

/// Walks one reference list in its original order and keeps an entry when it
/// passes the immediate-parent constraint and, if narrowing is on, occurs in
/// the result set. The currently selected value always stays in its own list
/// so the UI never silently deselects the user's choice.
fn narrow<T, P>(
    reference: &[T],
    selected: Option<&str>,
    parent_ok: P,
    present: Option<&HashSet<String>>,
) -> Vec<T>
where
    T: Entity + Clone,
    P: Fn(&T) -> bool,
{
    reference
        .iter()
        .filter(|entry| {
            if selected == Some(entry.slug()) {
                return true;
            }
            if !parent_ok(entry) {
                return false;
            }
            match present {
                Some(set) => set.contains(entry.slug()) || set.contains(entry.id()),
                None => true,
            }
        })
        .cloned()
        .collect()
}

fn parent_matches<T: Entity>(relation: &Related<T>, selected: Option<&str>) -> bool {
    match selected {
        Some(slug) => relation.matches(slug),
        None => true,
    }
}

/// Recomputes the six option lists from the reference data, the current
/// selection and the products returned for that selection.
///
/// With any filter or search active and an empty result set, every list is
/// empty: no point offering choices known to yield zero results. Downstream
/// axes only ever consult their immediate parent (a modification is filtered
/// by model, never by brand directly).
pub fn derive_options(
    refs: &ReferenceData,
    selection: &FilterSelection,
    products: &[Product],
) -> OptionSet {
    if selection.is_filtered() && products.is_empty() {
        return OptionSet::default();
    }

    let presence = selection.is_filtered().then(|| Presence::collect(products));
    let p = presence.as_ref();

    OptionSet {
        categories: narrow(
            &refs.categories,
            selection.category.as_deref(),
            |_| true,
            p.map(|p| &p.categories),
        ),
        subcategories: narrow(
            &refs.subcategories,
            selection.subcategory.as_deref(),
            |s: &Subcategory| parent_matches(&s.category, selection.category.as_deref()),
            p.map(|p| &p.subcategories),
        ),
        third_subcategories: narrow(
            &refs.third_subcategories,
            selection.thirdsubcategory.as_deref(),
            |t: &ThirdSubcategory| parent_matches(&t.subcategory, selection.subcategory.as_deref()),
            p.map(|p| &p.third_subcategories),
        ),
        brands: narrow(
            &refs.brands,
            selection.brand.as_deref(),
            |_| true,
            p.map(|p| &p.brands),
        ),
        models: narrow(
            &refs.models,
            selection.model.as_deref(),
            |m: &VehicleModel| parent_matches(&m.brand, selection.brand.as_deref()),
            p.map(|p| &p.models),
        ),
        modifications: narrow(
            &refs.modifications,
            selection.modification.as_deref(),
            |m: &Modification| parent_matches(&m.model, selection.model.as_deref()),
            p.map(|p| &p.modifications),
        ),
    }
}

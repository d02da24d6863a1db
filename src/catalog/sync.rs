use url::form_urlencoded;

use crate::catalog::selection::FilterSelection;

/// Canonical query parameter names, in the order they are emitted.
const AXES: [&str; 6] = [
    "category",
    "subcategory",
    "thirdsubcategory",
    "brand",
    "model",
    "modification",
];

/// Older shared links used shorter parameter names; they are still accepted
/// on read but never written back.
fn canonical_name(raw: &str) -> Option<&'static str> {
    match raw {
        "category" => Some("category"),
        "subcategory" | "subcat" => Some("subcategory"),
        "thirdsubcategory" | "thirdsubcat" => Some("thirdsubcategory"),
        "brand" => Some("brand"),
        "model" => Some("model"),
        "modification" | "mod" => Some("modification"),
        "search" => Some("search"),
        _ => None,
    }
}

/// Reads a selection out of a query string, as on first load: everything a
/// shared link carries is kept, including search combined with structural
/// filters. Page is never read from the URL; pagination is session-local.
pub fn decode(query: &str) -> FilterSelection {
    let mut selection = FilterSelection::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match canonical_name(&key) {
            Some("category") => selection.category = Some(value.to_string()),
            Some("subcategory") => selection.subcategory = Some(value.to_string()),
            Some("thirdsubcategory") => selection.thirdsubcategory = Some(value.to_string()),
            Some("brand") => selection.brand = Some(value.to_string()),
            Some("model") => selection.model = Some(value.to_string()),
            Some("modification") => selection.modification = Some(value.to_string()),
            Some("search") => selection.search = Some(value.to_string()),
            _ => {}
        }
    }
    selection
}

/// Reads a selection after an external navigation. `last_search` is the
/// search text of the previously observed state; when the incoming text
/// differs, the structural filters in the query are dropped for this cycle
/// and the page resets, mirroring the reducer's search semantics.
pub fn decode_following(query: &str, last_search: Option<&str>) -> FilterSelection {
    let selection = decode(query);
    if selection.search.as_deref() != last_search {
        return FilterSelection {
            search: selection.search,
            ..FilterSelection::default()
        };
    }
    selection
}

/// Serializes a selection back into the canonical query string. Page is
/// intentionally left out, so a shared link always opens on page one.
pub fn encode(selection: &FilterSelection) -> String {
    let values = [
        &selection.category,
        &selection.subcategory,
        &selection.thirdsubcategory,
        &selection.brand,
        &selection.model,
        &selection.modification,
    ];
    let mut out = form_urlencoded::Serializer::new(String::new());
    for (name, value) in AXES.iter().zip(values) {
        if let Some(value) = value {
            out.append_pair(name, value);
        }
    }
    if let Some(search) = &selection.search {
        out.append_pair("search", search);
    }
    out.finish()
}

/// True when navigating to `selection` would produce the address already
/// shown; used to avoid redundant navigation and the loops it causes.
pub fn is_current(selection: &FilterSelection, query: &str) -> bool {
    encode(selection) == encode(&decode(query))
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn selection() -> FilterSelection {
        FilterSelection {
            category: Some("batteries".to_string()),
            subcategory: Some("starter".to_string()),
            thirdsubcategory: Some("agm".to_string()),
            brand: Some("bmw".to_string()),
            model: Some("e60".to_string()),
            modification: Some("530d".to_string()),
            search: None,
            page: 7,
        }
    }

    #[test]
    fn round_trip_preserves_everything_but_page() {
        let original = selection();
        let decoded = decode(&encode(&original));
        assert_eq!(original.category, decoded.category);
        assert_eq!(original.subcategory, decoded.subcategory);
        assert_eq!(original.thirdsubcategory, decoded.thirdsubcategory);
        assert_eq!(original.brand, decoded.brand);
        assert_eq!(original.model, decoded.model);
        assert_eq!(original.modification, decoded.modification);
        assert_eq!(original.search, decoded.search);
        assert_eq!(1, decoded.page);
    }

    #[test]
    fn round_trip_with_search_text() {
        let original = FilterSelection::default().set_search(Some("brake pads".to_string()));
        let decoded = decode(&encode(&original));
        assert_eq!(Some("brake pads".to_string()), decoded.search);
        assert!(!decoded.has_axis_filter());
    }

    #[test]
    fn legacy_aliases_are_accepted_on_read() {
        let decoded = decode("subcat=starter&thirdsubcat=agm&mod=530d");
        assert_eq!(Some("starter".to_string()), decoded.subcategory);
        assert_eq!(Some("agm".to_string()), decoded.thirdsubcategory);
        assert_eq!(Some("530d".to_string()), decoded.modification);
    }

    #[test]
    fn aliases_are_not_written_back() {
        let encoded = encode(&decode("subcat=starter&mod=530d"));
        assert_eq!("subcategory=starter&modification=530d", encoded);
    }

    #[test]
    fn changed_search_drops_structural_filters_on_navigation() {
        let decoded = decode_following(
            "category=batteries&brand=bmw&search=pads",
            Some("filters"),
        );
        assert_eq!(Some("pads".to_string()), decoded.search);
        assert_eq!(None, decoded.category);
        assert_eq!(None, decoded.brand);
        assert_eq!(1, decoded.page);
    }

    #[test]
    fn newly_introduced_search_also_drops_structural_filters() {
        let decoded = decode_following("category=batteries&search=agm", None);
        assert_eq!(Some("agm".to_string()), decoded.search);
        assert_eq!(None, decoded.category);
    }

    #[test]
    fn initial_load_keeps_search_and_filters_together() {
        // nothing observed before, so a shared link with both survives intact
        let decoded = decode("category=batteries&search=agm");
        assert_eq!(Some("batteries".to_string()), decoded.category);
        assert_eq!(Some("agm".to_string()), decoded.search);
    }

    #[test]
    fn unchanged_search_keeps_structural_filters() {
        let decoded = decode_following("category=batteries&search=agm", Some("agm"));
        assert_eq!(Some("batteries".to_string()), decoded.category);
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let decoded = decode("category=batteries&utm_source=mail&page=9");
        assert_eq!(Some("batteries".to_string()), decoded.category);
        assert_eq!(1, decoded.page);
    }

    #[test]
    fn is_current_detects_equivalent_addresses() {
        let sel = decode("subcat=starter&brand=bmw");
        assert!(is_current(&sel, "brand=bmw&subcategory=starter"));
        assert!(is_current(&sel, "subcat=starter&brand=bmw"));
        assert!(!is_current(&sel, "brand=audi&subcategory=starter"));
    }
}

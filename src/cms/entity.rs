use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

/// Shown instead of a name when the CMS returned a bare id because the
/// population depth was too shallow.
pub const UNRESOLVED_NAME: &str = "—";

/// Common accessors for taxonomy and vehicle reference entities.
pub trait Entity {
    fn id(&self) -> &str;
    fn slug(&self) -> &str;
    fn name(&self) -> &str;
}

/// A related document from the CMS. Depending on the requested population
/// depth the API returns either the full object or just its id, so both
/// shapes have to decode.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Related<T> {
    Full(T),
    Id(String),
}

impl<T: Entity> Related<T> {
    pub fn full(&self) -> Option<&T> {
        match self {
            Related::Full(t) => Some(t),
            Related::Id(_) => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Related::Full(t) => t.id(),
            Related::Id(id) => id,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.full().map(Entity::slug)
    }

    pub fn name(&self) -> &str {
        match self {
            Related::Full(t) => t.name(),
            Related::Id(_) => UNRESOLVED_NAME,
        }
    }

    /// Matches a slug when the document is populated, the raw id otherwise.
    pub fn matches(&self, value: &str) -> bool {
        self.slug() == Some(value) || self.id() == value
    }
}

macro_rules! impl_entity {
    ($t:ty) => {
        impl Entity for $t {
            fn id(&self) -> &str {
                &self.id
            }
            fn slug(&self) -> &str {
                &self.slug
            }
            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: Related<Category>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThirdSubcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub subcategory: Related<Subcategory>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VehicleModel {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub brand: Related<Brand>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Modification {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub model: Related<VehicleModel>,
}

impl_entity!(Category);
impl_entity!(Subcategory);
impl_entity!(ThirdSubcategory);
impl_entity!(Brand);
impl_entity!(VehicleModel);
impl_entity!(Modification);

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MarketplaceLink {
    pub marketplace: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributorListing {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub oem_code: Option<String>,
    #[serde(default)]
    pub search_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Related<Category>>,
    #[serde(default)]
    pub subcategory: Option<Related<Subcategory>>,
    #[serde(default)]
    pub thirdsubcategory: Option<Related<ThirdSubcategory>>,
    #[serde(default)]
    pub brand: Option<Related<Brand>>,
    #[serde(default)]
    pub model: Option<Related<VehicleModel>>,
    #[serde(default)]
    pub modification: Option<Related<Modification>>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
    #[serde(default)]
    pub marketplace_links: Vec<MarketplaceLink>,
    #[serde(default)]
    pub distributors: Vec<DistributorListing>,
}

impl Product {
    pub fn cover_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl NewsArticle {
    pub fn published_on(&self) -> String {
        self.published_at
            .map(|d| d.date().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CustomPage {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: Option<String>,
}

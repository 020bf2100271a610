//! Client-side table projection: sort then paginate.
//!
//! These are pure functions over an in-memory product list. The reactive
//! plumbing that decides *when* to recompute lives in the admin crate.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::product::Product;

/// Column a product table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Sku,
    Name,
    Cost,
}

impl SortField {
    /// Column key as used in query strings and column configs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Sku => "sku",
            Self::Name => "name",
            Self::Cost => "cost",
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "sku" => Ok(Self::Sku),
            "name" => Ok(Self::Name),
            "cost" => Ok(Self::Cost),
            _ => Err(format!("invalid sort field: {s}")),
        }
    }
}

/// Sort direction. `None` means "not sorted" and leaves the list untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    None,
    Asc,
    Desc,
}

impl SortDirection {
    /// Query-string form; the unsorted direction is the empty string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Next direction when a column header is clicked repeatedly.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::None => Self::Asc,
            Self::Asc => Self::Desc,
            Self::Desc => Self::None,
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("invalid sort direction: {s}")),
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    pub active: Option<SortField>,
    pub direction: SortDirection,
}

impl Sort {
    /// No sorting.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            active: None,
            direction: SortDirection::None,
        }
    }

    /// Sort by `field` in `direction`.
    #[must_use]
    pub const fn by(field: SortField, direction: SortDirection) -> Self {
        Self {
            active: Some(field),
            direction,
        }
    }

    /// True when sorting would reorder anything.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some() && !matches!(self.direction, SortDirection::None)
    }
}

/// Requested page of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: usize,
    pub page_size: usize,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }
}

/// Three-way comparison of two products on a single column.
#[must_use]
pub fn compare_by(field: SortField, a: &Product, b: &Product) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Sku => a.sku.cmp(&b.sku),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Cost => a.cost.cmp(&b.cost),
    }
}

/// Sort `products` in place. Stable: equal keys keep their relative order.
pub fn sort_products(products: &mut [Product], sort: Sort) {
    let Some(field) = sort.active else {
        return;
    };
    match sort.direction {
        SortDirection::None => {}
        SortDirection::Asc => products.sort_by(|a, b| compare_by(field, a, b)),
        SortDirection::Desc => products.sort_by(|a, b| compare_by(field, a, b).reverse()),
    }
}

/// Slice out one page. Out-of-range pages are empty, never an error.
#[must_use]
pub fn paginate(products: &[Product], page: PageRequest) -> &[Product] {
    let start = page.page_index.saturating_mul(page.page_size);
    if start >= products.len() {
        return &[];
    }
    let end = start.saturating_add(page.page_size).min(products.len());
    products.get(start..end).unwrap_or(&[])
}

/// The rows to render: `paginate(sort(products))`.
#[must_use]
pub fn project(products: &[Product], sort: Sort, page: PageRequest) -> Vec<Product> {
    let mut sorted = products.to_vec();
    sort_products(&mut sorted, sort);
    paginate(&sorted, page).to_vec()
}

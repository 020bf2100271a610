//! Product table route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use catalog_console_core::{Product, ProductId, Sort, SortDirection, SortField};
use serde::Deserialize;
use tracing::instrument;

use super::{ToastView, take_toasts};
use crate::components::{DataTableConfig, products_table_config};
use crate::error::AppError;
use crate::middleware::RequireToken;
use crate::products::{ConfirmRequest, EditorRequest};
use crate::services::drafts::ResolvedDialog;
use crate::state::AppState;

/// Table query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl TableQuery {
    /// Requested sort, if the query names one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown column or direction.
    pub fn sort(&self) -> Result<Option<Sort>, AppError> {
        let Some(field) = self.sort.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(self
                .sort
                .as_ref()
                .or(self.direction.as_ref())
                .map(|_| Sort::none()));
        };
        let field: SortField = field.parse().map_err(AppError::BadRequest)?;
        let direction: SortDirection = self
            .direction
            .as_deref()
            .unwrap_or("asc")
            .parse()
            .map_err(AppError::BadRequest)?;
        Ok(Some(Sort::by(field, direction)))
    }
}

/// Header cell of the table.
#[derive(Debug, Clone)]
pub struct ColumnView {
    pub label: String,
    /// Link that applies the next sort direction, for sortable columns.
    pub sort_url: Option<String>,
    /// Arrow for the active sort column.
    pub indicator: &'static str,
}

/// Product row for templates.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub cost: String,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.map(|id| id.to_string()).unwrap_or_default(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            cost: format!("{:.2}", product.cost),
        }
    }
}

/// Paginator controls for templates.
#[derive(Debug, Clone)]
pub struct PagerView {
    pub page_number: usize,
    pub page_count: usize,
    pub length: usize,
    pub page_size: usize,
    pub page_size_options: Vec<PageSizeOption>,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    /// Query string of the current sort, kept by the page size selector.
    pub sort: String,
    pub direction: String,
}

/// Entry of the page size selector.
#[derive(Debug, Clone)]
pub struct PageSizeOption {
    pub value: usize,
    pub selected: bool,
}

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub table_id: String,
    pub columns: Vec<ColumnView>,
    pub rows: Vec<ProductRowView>,
    pub pager: PagerView,
    pub empty_title: String,
    pub empty_description: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub toasts: Vec<ToastView>,
}

/// Delete confirmation dialog template.
#[derive(Template, WebTemplate)]
#[template(path = "products/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub product_id: String,
    pub title: String,
    pub message: String,
    pub toasts: Vec<ToastView>,
}

/// Confirmation dialog answer.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: String,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/new", get(new_product))
        .route("/products/{id}", get(view_product))
        .route("/products/{id}/edit", get(edit_product))
        .route(
            "/products/{id}/delete",
            get(confirm_delete_page).post(confirm_delete),
        )
}

fn table_url(sort: Sort, page: usize, size: usize) -> String {
    match sort.active {
        Some(field) if sort.is_active() => format!(
            "/products?sort={field}&direction={}&page={page}&size={size}",
            sort.direction.as_str()
        ),
        // Empty parameters clear the stored sort.
        _ => format!("/products?sort=&direction=&page={page}&size={size}"),
    }
}

fn column_views(config: &DataTableConfig, sort: Sort, page_size: usize) -> Vec<ColumnView> {
    config
        .columns
        .iter()
        .map(|column| {
            let active = column.sort_field.is_some() && column.sort_field == sort.active;
            let sort_url = column.sort_field.map(|field| {
                let direction = if active {
                    sort.direction.cycle()
                } else {
                    SortDirection::Asc
                };
                table_url(Sort::by(field, direction), 0, page_size)
            });
            let indicator = match (active, sort.direction) {
                (true, SortDirection::Asc) => "▲",
                (true, SortDirection::Desc) => "▼",
                _ => "",
            };

            ColumnView {
                label: column.label.clone(),
                sort_url,
                indicator,
            }
        })
        .collect()
}

/// Products list page handler.
///
/// GET /products
#[instrument(skip(state))]
async fn index(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.products();
    let config = products_table_config();

    if let Some(sort) = query.sort()?
        && sort != view.sort_header().sort()
    {
        view.sort_by(sort);
    }
    if let Some(size) = query.size
        && size != view.paginator().page().page_size
    {
        if !config.page_size_options.contains(&size) {
            return Err(AppError::BadRequest(format!("unsupported page size: {size}")));
        }
        view.paginator().set_page_size(size);
    }
    if let Some(page) = query.page {
        view.paginator().set_page_index(page);
    }

    view.load_products().await;

    let paginator = view.paginator();
    let page = paginator.page();
    let sort = view.sort_header().sort();
    let rows = view.rows()?;

    let pager = PagerView {
        page_number: page.page_index + 1,
        page_count: paginator.page_count(),
        length: paginator.length(),
        page_size: page.page_size,
        page_size_options: config
            .page_size_options
            .iter()
            .map(|&value| PageSizeOption {
                value,
                selected: value == page.page_size,
            })
            .collect(),
        previous_url: paginator
            .has_previous_page()
            .then(|| table_url(sort, page.page_index - 1, page.page_size)),
        next_url: paginator
            .has_next_page()
            .then(|| table_url(sort, page.page_index + 1, page.page_size)),
        sort: sort.active.map(|f| f.as_str().to_string()).unwrap_or_default(),
        direction: sort.direction.as_str().to_string(),
    };

    Ok(ProductsIndexTemplate {
        table_id: config.table_id.clone(),
        columns: column_views(&config, sort, page.page_size),
        rows: rows.iter().map(ProductRowView::from).collect(),
        pager,
        empty_title: config.empty_title.clone(),
        empty_description: config.empty_description.clone(),
        loading: view.is_loading(),
        error: view.error(),
        toasts: take_toasts(state.toasts()),
    })
}

/// Look up a product in the loaded list, loading it first if needed.
pub(crate) async fn find_product(state: &AppState, id: ProductId) -> Result<Product, AppError> {
    let source = state.products().data_source();
    if let Some(product) = source.find(id) {
        return Ok(product);
    }

    state.products().load_products().await;
    source
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

async fn open_editor(state: &AppState, request: EditorRequest) -> Redirect {
    let draft = state.drafts().open(request).await;
    Redirect::to(&format!("/editor/{draft}"))
}

/// GET /products/new
#[instrument(skip_all)]
async fn new_product(RequireToken(_): RequireToken, State(state): State<AppState>) -> Redirect {
    open_editor(&state, EditorRequest::Create).await
}

/// GET /products/{id}
#[instrument(skip(state))]
async fn view_product(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let product = find_product(&state, id).await?;
    Ok(open_editor(&state, EditorRequest::View(product)).await)
}

/// GET /products/{id}/edit
#[instrument(skip(state))]
async fn edit_product(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let product = find_product(&state, id).await?;
    Ok(open_editor(&state, EditorRequest::Edit(product)).await)
}

/// GET /products/{id}/delete
#[instrument(skip(state))]
async fn confirm_delete_page(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<ConfirmDeleteTemplate, AppError> {
    let product = find_product(&state, id).await?;
    let request = ConfirmRequest::delete(&product);

    Ok(ConfirmDeleteTemplate {
        product_id: id.to_string(),
        title: request.title,
        message: request.message,
        toasts: take_toasts(state.toasts()),
    })
}

/// POST /products/{id}/delete
#[instrument(skip(state, form))]
async fn confirm_delete(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<ConfirmForm>,
) -> Result<Redirect, AppError> {
    let product = find_product(&state, id).await?;
    let answer = ResolvedDialog::confirmed(form.confirm == "yes");
    let outcome = state.products().confirm_delete(&product, &answer).await;
    tracing::debug!(?outcome, "Delete dialog resolved");
    Ok(Redirect::to("/products"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{ConsoleConfig, LogFormat, ProductApiConfig, parse_base_url};
    use crate::services::auth::{AuthStore, MemoryTokenStorage};

    #[test]
    fn test_query_sort_parsing() {
        let query = TableQuery {
            sort: Some("name".to_string()),
            direction: Some("desc".to_string()),
            ..TableQuery::default()
        };
        assert_eq!(
            query.sort().unwrap(),
            Some(Sort::by(SortField::Name, SortDirection::Desc))
        );

        assert_eq!(TableQuery::default().sort().unwrap(), None);

        let bad = TableQuery {
            sort: Some("price".to_string()),
            ..TableQuery::default()
        };
        assert!(matches!(bad.sort(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_column_headers_cycle_direction() {
        let config = products_table_config();
        let sort = Sort::by(SortField::Name, SortDirection::Asc);
        let columns = column_views(&config, sort, 10);

        assert_eq!(
            columns[0].sort_url.as_deref(),
            Some("/products?sort=id&direction=asc&page=0&size=10")
        );
        assert_eq!(
            columns[2].sort_url.as_deref(),
            Some("/products?sort=name&direction=desc&page=0&size=10")
        );
        assert_eq!(columns[2].indicator, "▲");
        assert!(columns[4].sort_url.is_none());
    }

    #[test]
    fn test_cleared_sort_sends_empty_parameters() {
        assert_eq!(
            table_url(Sort::by(SortField::Cost, SortDirection::None), 2, 5),
            "/products?sort=&direction=&page=2&size=5"
        );

        let cleared = TableQuery {
            sort: Some(String::new()),
            direction: Some(String::new()),
            ..TableQuery::default()
        };
        assert_eq!(cleared.sort().unwrap(), Some(Sort::none()));
    }

    #[tokio::test]
    async fn test_third_header_click_clears_sort() {
        let config = ConsoleConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            api: ProductApiConfig {
                base_url: parse_base_url("http://127.0.0.1:9").unwrap(),
                timeout: Duration::from_secs(1),
            },
            token_path: PathBuf::from("unused"),
            page_size: 10,
            log_format: LogFormat::Text,
            sentry: None,
        };
        let state = AppState::with_auth(
            config,
            AuthStore::new(MemoryTokenStorage::with_token("secret-key")),
        )
        .unwrap();

        let response = crate::app(state.clone())
            .oneshot(
                Request::get("/products?sort=name&direction=desc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sort = state.products().sort_header().sort();
        assert_eq!(sort, Sort::by(SortField::Name, SortDirection::Desc));

        let columns = column_views(&products_table_config(), sort, 10);
        let clear_url = columns[2].sort_url.clone().unwrap();
        let response = crate::app(state.clone())
            .oneshot(Request::get(clear_url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.products().sort_header().sort(), Sort::none());
        assert_eq!(state.products().paginator().page().page_index, 0);
    }

    #[test]
    fn test_row_formats_cost() {
        let product = Product::new("A1", "Chair", rust_decimal::Decimal::from(20))
            .with_id(ProductId::new(1));
        let row = ProductRowView::from(&product);
        assert_eq!(row.id, "1");
        assert_eq!(row.cost, "20.00");
    }
}

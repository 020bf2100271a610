//! Product commands.
//!
//! These drive the same list view as the web console, so sorting, paging,
//! notifications and the delete flow behave identically.

use catalog_console_admin::products::view::{DELETE_FAILED_MESSAGE, LOAD_FAILED_MESSAGE};
use catalog_console_admin::products::{
    ActionOutcome, ConfirmRequest, Dialogs, EditorOutcome, EditorRequest,
};
use catalog_console_admin::state::AppState;
use catalog_console_core::{Product, ProductId, Sort, SortDirection, SortField};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::CliError;

/// Options of `products list`.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub sort: Option<String>,
    pub direction: String,
    pub page: usize,
    pub page_size: Option<usize>,
}

impl ListOptions {
    fn sort(&self) -> Result<Option<Sort>, CliError> {
        let Some(field) = self.sort.as_deref() else {
            return Ok(None);
        };
        let field: SortField = field.parse().map_err(CliError::InvalidArgument)?;
        let direction: SortDirection = self
            .direction
            .parse()
            .map_err(CliError::InvalidArgument)?;
        Ok(Some(Sort::by(field, direction)))
    }
}

/// Confirmation prompts on the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalDialogs {
    assume_yes: bool,
}

impl TerminalDialogs {
    #[must_use]
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

/// Whether a prompt answer means yes.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl Dialogs for TerminalDialogs {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut stdout = tokio::io::stdout();
        let prompt = format!("{}: {} [y/N] ", request.title, request.message);
        if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read confirmation");
                false
            }
        }
    }

    async fn open_editor(&self, request: EditorRequest) -> Option<EditorOutcome> {
        tracing::warn!(mode = request.mode().as_str(), "Editing is only available in the web console");
        None
    }
}

/// Render one table row.
fn format_row(product: &Product) -> String {
    let id = product.id.map(|id| id.to_string()).unwrap_or_default();
    format!(
        "{id:>6}  {:<20}  {:<50}  {:>10.2}",
        product.sku, product.name, product.cost
    )
}

/// List one page of products.
///
/// # Errors
///
/// Returns an error for an invalid sort or page size, or when loading fails.
#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState, options: &ListOptions) -> Result<(), CliError> {
    let view = state.products();

    if let Some(sort) = options.sort()? {
        view.sort_by(sort);
    }
    if let Some(size) = options.page_size {
        if size == 0 {
            return Err(CliError::InvalidArgument("page size must be greater than zero".to_string()));
        }
        view.paginator().set_page_size(size);
    }
    view.paginator().set_page_index(options.page);

    if view.load_products().await == ActionOutcome::Failed {
        return Err(CliError::Failed(LOAD_FAILED_MESSAGE));
    }

    let rows = view.rows()?;
    let paginator = view.paginator();

    println!("{:>6}  {:<20}  {:<50}  {:>10}", "ID", "SKU", "Name", "Cost");
    for product in &rows {
        println!("{}", format_row(product));
    }
    if rows.is_empty() {
        println!("No products found");
    }
    println!(
        "Page {} of {} ({} products)",
        paginator.page().page_index + 1,
        paginator.page_count(),
        paginator.length()
    );
    Ok(())
}

/// Delete the product with `id` after confirmation.
///
/// # Errors
///
/// Returns an error if the product does not exist or the delete fails.
pub async fn delete(state: &AppState, id: i64, yes: bool) -> Result<(), CliError> {
    let view = state.products();
    let id = ProductId::new(id);

    if view.load_products().await == ActionOutcome::Failed {
        return Err(CliError::Failed(LOAD_FAILED_MESSAGE));
    }
    let product = view.data_source().find(id).ok_or(CliError::NotFound(id))?;

    match view.confirm_delete(&product, &TerminalDialogs::new(yes)).await {
        ActionOutcome::Failed => Err(CliError::Failed(DELETE_FAILED_MESSAGE)),
        ActionOutcome::Cancelled => {
            tracing::info!("Delete cancelled");
            Ok(())
        }
        ActionOutcome::Succeeded | ActionOutcome::Abandoned => Ok(()),
    }
}

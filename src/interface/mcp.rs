//! MCP Server for library-catalog
//!
//! MCP Protocol (stdio) <-> application::CatalogService
//!
//! 5 tools: book_add, book_delete, book_find, book_list, book_status

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::error::AppError;
use crate::application::service::CatalogService;
use crate::domain::model::book::{Book, BookId};
use crate::domain::model::catalog::BookQuery;
use crate::infra::json_store::JsonCatalogRepository;

type Service = CatalogService<JsonCatalogRepository>;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。fileは目録のJSONファイル。
pub async fn run(file: PathBuf) -> anyhow::Result<()> {
    let svc = CatalogService::open(JsonCatalogRepository::new(file));
    if let Some(warning) = svc.load_warning() {
        tracing::warn!(%warning, "catalog load fell back to empty");
    }
    tracing::info!(
        location = %svc.location(),
        books = svc.list().len(),
        "serving catalog over MCP stdio"
    );

    let server = CatalogMcpServer::new(svc);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

/// 操作は Mutex で直列化する（同時に走る操作は常に1つ）。
#[derive(Clone)]
struct CatalogMcpServer {
    svc: Arc<Mutex<Service>>,
    tool_router: ToolRouter<Self>,
}

impl CatalogMcpServer {
    fn new(svc: Service) -> Self {
        Self {
            svc: Arc::new(Mutex::new(svc)),
            tool_router: Self::tool_router(),
        }
    }

    fn with_service<T>(
        &self,
        op: impl FnOnce(&mut Service) -> Result<T, AppError>,
    ) -> Result<T, McpError> {
        let mut guard = self
            .svc
            .lock()
            .map_err(|_| McpError::internal_error("Lock poisoned", None))?;
        op(&mut *guard).map_err(Self::to_mcp_error)
    }

    fn to_mcp_error(e: AppError) -> McpError {
        match e {
            AppError::Domain(_) => McpError::invalid_params(format!("{e}"), None),
            AppError::Persistence(_) => {
                tracing::error!(error = %e, "failed to persist catalog");
                McpError::internal_error(format!("{e}"), None)
            }
        }
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for CatalogMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "library-catalog".to_string(),
                title: Some("Library Catalog".to_string()),
                description: Some(
                    "Single-user book catalog: add, delete, find, list, check out / return."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Manage a library catalog of books (title, author, year, status).\n\
                 \n\
                 Tools: `book_list` / `book_find` to look up IDs → \
                 `book_status` to check out or return, `book_delete` to remove. \
                 `book_add` for new books."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = %request.name, "tool call");
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

fn parse_book_id(raw: u64) -> Result<BookId, McpError> {
    BookId::new(raw)
        .ok_or_else(|| McpError::invalid_params(format!("Invalid book id: {raw}"), None))
}

/// `id: title (author, year) - status` を1行ずつ。
fn format_books(books: &[Book]) -> String {
    books
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookAddRequest {
    #[schemars(description = "Book title (required, non-empty)")]
    pub title: String,
    #[schemars(description = "Book author (required, non-empty)")]
    pub author: String,
    #[schemars(description = "Publication year")]
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookDeleteRequest {
    #[schemars(description = "Book ID from `book_list` / `book_find` output")]
    pub id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
struct McpBookFindRequest {
    #[schemars(description = "Case-insensitive substring of the title. Omit to match any.")]
    pub title: Option<String>,
    #[schemars(description = "Case-insensitive substring of the author. Omit to match any.")]
    pub author: Option<String>,
    #[schemars(description = "Exact publication year. Omit to match any.")]
    pub year: Option<i32>,
}

impl From<McpBookFindRequest> for BookQuery {
    fn from(req: McpBookFindRequest) -> Self {
        BookQuery {
            title: req.title,
            author: req.author,
            year: req.year,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookListRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookStatusRequest {
    #[schemars(description = "Book ID from `book_list` / `book_find` output")]
    pub id: u64,
    #[schemars(
        description = "New status: 'available' or 'checked out'. Omit to toggle (check out ⇄ return)."
    )]
    pub status: Option<String>,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl CatalogMcpServer {
    #[tool(
        name = "book_add",
        description = "Add a new book. The ID is assigned automatically and the book starts as 'available'.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn book_add(
        &self,
        Parameters(req): Parameters<McpBookAddRequest>,
    ) -> Result<CallToolResult, McpError> {
        let book = self.with_service(|svc| svc.add(&req.title, &req.author, req.year))?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Added: {book}"
        ))]))
    }

    #[tool(
        name = "book_delete",
        description = "Delete a book by ID.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn book_delete(
        &self,
        Parameters(req): Parameters<McpBookDeleteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(req.id)?;
        let deleted = self.with_service(|svc| svc.delete(id))?;
        let text = if deleted {
            format!("Deleted: {id}")
        } else {
            format!("No book with ID {id}.")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "book_find",
        description = "Find books. Title and author match case-insensitive substrings, year matches exactly. All given filters must match.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn book_find(
        &self,
        Parameters(req): Parameters<McpBookFindRequest>,
    ) -> Result<CallToolResult, McpError> {
        let query = BookQuery::from(req);
        let books = self.with_service(|svc| Ok(svc.find(&query)))?;
        let text = if books.is_empty() {
            "No books found.".to_string()
        } else {
            format!("# Found {} books\n\n{}", books.len(), format_books(&books))
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "book_list",
        description = "List every book in the catalog in insertion order.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn book_list(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpBookListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let books = self.with_service(|svc| Ok(svc.list().to_vec()))?;
        let text = if books.is_empty() {
            "The catalog is empty. Use `book_add` to add a book.".to_string()
        } else {
            format!("# Catalog ({} books)\n\n{}", books.len(), format_books(&books))
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "book_status",
        description = "Set a book's status to 'available' or 'checked out'. Omit status to toggle.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn book_status(
        &self,
        Parameters(req): Parameters<McpBookStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(req.id)?;
        let book = self.with_service(|svc| {
            let found = match req.status.as_deref() {
                Some(status) => svc.update_status_str(id, status)?,
                None => svc.toggle_status(id)?.is_some(),
            };
            Ok(if found { svc.get(id).cloned() } else { None })
        })?;
        let text = match book {
            Some(book) => format!("Updated: {book}"),
            None => format!("No book with ID {id}."),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

// =============================================================================
// Tests
// =============================================================================

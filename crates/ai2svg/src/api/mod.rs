//! REST API server for Adobe Illustrator to SVG conversion.
//!
//! This module provides an Axum-based HTTP server that accepts `.ai` uploads and
//! returns one SVG document per page.
//!
//! # Endpoints
//!
//! - `POST /convert` - Convert an uploaded `.ai` file (multipart field `file`)
//! - `GET /health` - Health check, including converter availability
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use ai2svg::{ServiceConfig, api::serve};
//!
//! #[tokio::main]
//! async fn main() -> ai2svg::Result<()> {
//!     serve(ServiceConfig::default()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use ai2svg::{ServiceConfig, api::create_router};
//! use axum::Router;
//!
//! let config = ServiceConfig::default();
//! let app: Router = Router::new().nest("/api", create_router(config));
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Convert a document
//! curl -F "file=@artwork.ai" http://localhost:3000/convert
//!
//! # Health check
//! curl http://localhost:3000/health
//! ```

mod error;
mod handlers;
mod rate_limit;
mod server;
mod types;

pub use error::ApiError;
pub use handlers::UPLOAD_FIELD;
pub use rate_limit::ClientRateLimiter;
pub use server::{create_router, create_router_with_converter, serve, serve_with_converter};
pub use types::{ApiState, ConvertResponse, ConverterHealth, ErrorResponse, HealthResponse};

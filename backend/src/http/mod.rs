//! HTTP server module.
//!
//! An axum router over the analysis services. Handlers read the shared
//! baseline and export stores from [`AppState`] and run CPU-bound work on the
//! blocking pool.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and validation                         │
//! │  - CSV downloads, CORS, compression, error mapping        │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services/)                                │
//! │  - Box plots, yield thresholds, repeatability             │
//! │  - Device selection and export snapshots                  │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Models (models/)                                         │
//! │  - Row validation and grouping                            │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;

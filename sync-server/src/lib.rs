//! Salon sync server — appointment-to-commerce order synchronization
//!
//! # Architecture
//!
//! Receives booking/cancellation events from the scheduling platform and
//! payment events from the commerce platform, reconciles them into one
//! durable order per appointment, computes tiered sales commissions, and
//! drives draft-sale creation/cancellation in the commerce platform.
//!
//! # Module structure
//!
//! ```text
//! sync-server/src/
//! ├── api/       # HTTP routes and handlers (webhooks + admin)
//! ├── commerce/  # Commerce platform bridge (catalog, drafts, matching)
//! ├── store/     # Persistence (SyncStore trait, PgStore, MemStore)
//! ├── sync/      # Reconciliation engine (normalizer, commission, state machine)
//! ├── payroll.rs # Pay period calculator
//! ├── config.rs  # Environment configuration
//! ├── state.rs   # Shared application state
//! └── error.rs   # Service-layer error bridge
//! ```

pub mod api;
pub mod commerce;
pub mod config;
pub mod error;
pub mod payroll;
pub mod state;
pub mod store;
pub mod sync;

// Re-export public types
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
pub use sync::{SyncEngine, SyncOutcome};

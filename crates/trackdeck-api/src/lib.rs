//! Async client for the Trackdeck project service.
//!
//! Two surfaces:
//!
//! - **[`ProjectsClient`]** — typed REST calls for the project collection
//!   (filtered/paginated list, get/create/update/delete by id) plus the
//!   current-user and owners lookups. Stateless; errors map HTTP status
//!   codes onto a small [`Error`] taxonomy.
//! - **[`FeedHandle`]** — websocket change-feed subscription delivering
//!   [`ChangeEvent`]s (insert/update/delete) as refetch hints. Reconnects
//!   with backoff; torn down via `CancellationToken`.

pub mod client;
pub mod error;
pub mod feed;
pub mod transport;
pub mod types;

pub use client::ProjectsClient;
pub use error::Error;
pub use feed::{FeedHandle, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    ChangeEvent, ChangeKind, CreateProjectInput, ListQuery, OwnerSummary, PageInfo, Project,
    ProjectPage, ProjectStatus, ProjectView, UpdateProjectInput,
};

//! Coordination layer for the Trackdeck project dashboard.
//!
//! Keeps a paginated, filtered project list consistent in the presence of
//! local mutations, server-authoritative pagination, debounced filter
//! changes, and asynchronous change-feed pushes from other sessions:
//!
//! - **[`ListController`]** — filter/pagination/mutation/realtime
//!   reconciliation state machine. Filter changes debounce into a page-1
//!   refetch; mutations refetch explicitly while a filter is active and
//!   defer to the push feed otherwise; push events are suppressed entirely
//!   under active filters.
//! - **[`DetailController`]** — single-resource fetch/edit/delete
//!   lifecycle for one project id.
//! - **[`Notifications`]** — transient success/error/info messages with
//!   5-second auto-expiry and manual dismissal.
//! - **[`FeedSubscriber`]** — enabled-gated change-feed subscription:
//!   exactly one live subscription while enabled, zero while disabled.
//!
//! Controllers expose their state through `tokio::sync::watch` snapshots;
//! the presentation layer is an external concern. Collaborators (client,
//! feed, notification queue) are injected at construction.

pub mod detail;
pub mod error;
pub mod list;
pub mod model;
pub mod notify;
pub mod subscriber;

pub use detail::{DetailController, DetailState};
pub use error::CoreError;
pub use list::{ListController, ListState};
pub use model::{DEBOUNCE, Filters, NOTIFICATION_TTL, StatusFilter};
pub use notify::{Notification, Notifications, Severity};
pub use subscriber::{ChangeCallback, FeedHandlers, FeedSubscriber};

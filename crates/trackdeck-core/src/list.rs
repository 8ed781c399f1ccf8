// ── List controller ──
//
// Owns the paginated, filtered project list: filter state with debounced
// refetch, server-authoritative pagination mirrored into state, mutations
// with conditional refetch, and push-driven reconciliation that is
// suppressed whenever a filter is active.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use trackdeck_api::{
    CreateProjectInput, FeedHandle, OwnerSummary, PageInfo, ProjectView, ProjectsClient,
    UpdateProjectInput,
};

use crate::error::CoreError;
use crate::model::{DEBOUNCE, Filters, StatusFilter};
use crate::notify::Notifications;
use crate::subscriber::{ChangeCallback, FeedHandlers, FeedSubscriber};

/// Everything the dashboard renders from, replaced wholesale on change.
#[derive(Debug, Clone)]
pub struct ListState {
    /// The current page of results only.
    pub projects: Vec<ProjectView>,
    pub loading: bool,
    pub current_user_id: String,
    /// Selectable owner summaries for the assignee filter control.
    pub owners: Vec<OwnerSummary>,
    pub filters: Filters,
    /// Mirrored verbatim from the last successful fetch.
    pub pagination: PageInfo,
    pub modal_open: bool,
    pub editing: Option<ProjectView>,
    pub deletion_target: Option<ProjectView>,
    pub deleting: bool,
}

impl ListState {
    fn initial(page_size: u32) -> Self {
        Self {
            projects: Vec::new(),
            loading: true,
            current_user_id: String::new(),
            owners: Vec::new(),
            filters: Filters::default(),
            pagination: PageInfo::empty(page_size),
            modal_open: false,
            editing: None,
            deletion_target: None,
            deleting: false,
        }
    }

    /// Whether the session's user may edit/delete this row. Mirrors the
    /// server-side ownership check to decide which controls to expose.
    pub fn can_modify(&self, view: &ProjectView) -> bool {
        !self.current_user_id.is_empty() && view.project.assigned_to == self.current_user_id
    }
}

/// The list coordination state machine. Cheaply cloneable.
///
/// Constructed with its collaborators passed in (client, feed,
/// notification queue) rather than looked up ambiently.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<ListInner>,
}

struct ListInner {
    client: ProjectsClient,
    notify: Notifications,
    state: watch::Sender<Arc<ListState>>,
    /// At most one pending debounce timer; replacing aborts the old one.
    debounce: Mutex<Option<JoinHandle<()>>>,
    subscriber: FeedSubscriber,
    cancel: CancellationToken,
    /// Fixed for the lifetime of the controller.
    page_size: u32,
}

impl ListController {
    /// Build the controller and wire the change feed: every event, while
    /// no filter is active, refetches the current page ("refetch over
    /// merge"). The subscriber starts enabled since filters start at
    /// their defaults.
    pub fn new(
        client: ProjectsClient,
        feed: FeedHandle,
        notify: Notifications,
        page_size: u32,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(ListState::initial(page_size)));
        let cancel = CancellationToken::new();

        let inner = Arc::new_cyclic(|weak: &Weak<ListInner>| {
            let handlers = FeedHandlers {
                on_insert: Some(refetch_current_page(weak.clone())),
                on_update: Some(refetch_current_page(weak.clone())),
                on_delete: Some(refetch_current_page(weak.clone())),
            };
            let subscriber = FeedSubscriber::spawn(feed, handlers, true, cancel.child_token());

            ListInner {
                client,
                notify,
                state,
                debounce: Mutex::new(None),
                subscriber,
                cancel,
                page_size,
            }
        });

        Self { inner }
    }

    // ── State observation ────────────────────────────────────────

    /// Current state snapshot (cheap `Arc` clone).
    pub fn state(&self) -> Arc<ListState> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<Arc<ListState>> {
        self.inner.state.subscribe()
    }

    /// State changes as an async stream, for reactive rendering.
    pub fn state_stream(&self) -> WatchStream<Arc<ListState>> {
        WatchStream::new(self.inner.state.subscribe())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Resolve the session's user and the assignable owners, then fetch
    /// the first page. Lookup failures are surfaced but not fatal.
    pub async fn bootstrap(&self) {
        let (user, owners) = tokio::join!(
            self.inner.client.current_user(),
            self.inner.client.list_owners(),
        );

        match user {
            Ok(user) => self.update_state(|s| s.current_user_id = user.id),
            Err(e) => {
                warn!(error = %e, "current user lookup failed");
                self.inner.notify.error("Failed to resolve current user");
            }
        }
        match owners {
            Ok(owners) => self.update_state(|s| s.owners = owners),
            Err(e) => warn!(error = %e, "owners lookup failed (assignee filter stays empty)"),
        }

        self.fetch(1).await;
    }

    /// Cancel the debounce timer, the feed subscription, and the feed
    /// itself.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.subscriber.shutdown();
        if let Some(timer) = self.lock_debounce().take() {
            timer.abort();
        }
    }

    // ── Filters ──────────────────────────────────────────────────

    pub fn set_search(&self, text: impl Into<String>) {
        self.update_state(|s| s.filters.search = text.into());
        self.filters_changed();
    }

    pub fn set_status_filter(&self, status: StatusFilter) {
        self.update_state(|s| s.filters.status = status);
        self.filters_changed();
    }

    pub fn set_assignee(&self, assignee: impl Into<String>) {
        self.update_state(|s| s.filters.assignee = assignee.into());
        self.filters_changed();
    }

    /// Re-gate the push subscription and restart the debounce window.
    /// Filter changes always land on page 1: the current page position
    /// is meaningless under new filters.
    fn filters_changed(&self) {
        let filter_active = self.state().filters.is_active();
        self.inner.subscriber.set_enabled(!filter_active);

        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(DEBOUNCE) => ctrl.fetch(1).await,
            }
        });

        if let Some(previous) = self.lock_debounce().replace(timer) {
            previous.abort();
        }
    }

    // ── Fetching ─────────────────────────────────────────────────

    /// Fetch one page under the current filters. On success, projects
    /// and pagination are replaced atomically; on failure the prior page
    /// stays intact and an error notification is pushed.
    pub async fn fetch(&self, page: u32) {
        self.update_state(|s| s.loading = true);

        let query = self.state().filters.to_query(page, self.inner.page_size);
        match self.inner.client.list(&query).await {
            Ok(result) => {
                debug!(
                    page = result.pagination.page,
                    total = result.pagination.total,
                    "project page fetched"
                );
                self.update_state(|s| {
                    s.projects = result.data;
                    s.pagination = result.pagination;
                    s.loading = false;
                });
            }
            Err(e) => {
                warn!(error = %e, page, "project list fetch failed");
                self.inner.notify.error("Failed to load projects");
                self.update_state(|s| s.loading = false);
            }
        }
    }

    /// Explicit pagination: immediate, no debounce.
    pub async fn change_page(&self, page: u32) {
        self.fetch(page).await;
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Create a project. Under active filters the new row is surfaced by
    /// an explicit page-1 refetch; otherwise the push feed covers it.
    /// Failure re-raises so the form stays open for retry.
    pub async fn create(&self, input: CreateProjectInput) -> Result<(), CoreError> {
        match self.inner.client.create(&input).await {
            Ok(created) => {
                debug!(id = created.id(), "project created");
                self.update_state(|s| {
                    s.modal_open = false;
                    s.editing = None;
                });
                self.inner.notify.success("Project created");
                if self.state().filters.is_active() {
                    self.fetch(1).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "project create failed");
                self.inner.notify.error("Failed to create project");
                Err(e.into())
            }
        }
    }

    /// Update the current editing target. No-op without one. Success
    /// closes the modal; failure keeps it open and re-raises.
    pub async fn update(&self, input: UpdateProjectInput) -> Result<(), CoreError> {
        let Some(target) = self.state().editing.clone() else {
            return Ok(());
        };

        match self.inner.client.update(target.id(), &input).await {
            Ok(_) => {
                self.update_state(|s| {
                    s.modal_open = false;
                    s.editing = None;
                });
                self.inner.notify.success("Project updated");
                if self.state().filters.is_active() {
                    let page = self.state().pagination.page;
                    self.fetch(page).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id = target.id(), "project update failed");
                self.inner.notify.error("Failed to update project");
                Err(e.into())
            }
        }
    }

    /// Delete the current deletion target. No-op without one.
    ///
    /// Under active filters, deleting the sole row of a page > 1 refetches
    /// the previous page (keeps the list non-empty when possible); any
    /// other case refetches the same page. Without filters the push feed
    /// reconciles. Failure keeps the target set so the confirmation UI
    /// can retry. `deleting` is cleared in all paths.
    pub async fn confirm_delete(&self) -> Result<(), CoreError> {
        let Some(target) = self.state().deletion_target.clone() else {
            return Ok(());
        };

        self.update_state(|s| s.deleting = true);

        let outcome = match self.inner.client.delete(target.id()).await {
            Ok(()) => {
                self.update_state(|s| s.deletion_target = None);
                self.inner.notify.success("Project deleted");

                let state = self.state();
                if state.filters.is_active() {
                    let page = state.pagination.page;
                    if state.projects.len() == 1 && page > 1 {
                        self.fetch(page - 1).await;
                    } else {
                        self.fetch(page).await;
                    }
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id = target.id(), "project delete failed");
                self.inner.notify.error("Failed to delete project");
                Err(e.into())
            }
        };

        self.update_state(|s| s.deleting = false);
        outcome
    }

    // ── Modal lifecycle ──────────────────────────────────────────
    //
    // Closed → (open_add | open_edit) → Open → (save success | cancel)
    // → Closed. Save failure keeps the modal open so user input is not
    // discarded on transient failure.

    pub fn open_add_modal(&self) {
        self.update_state(|s| {
            s.editing = None;
            s.modal_open = true;
        });
    }

    pub fn open_edit_modal(&self, project: ProjectView) {
        self.update_state(|s| {
            s.editing = Some(project);
            s.modal_open = true;
        });
    }

    pub fn close_modal(&self) {
        self.update_state(|s| {
            s.modal_open = false;
            s.editing = None;
        });
    }

    pub fn set_deletion_target(&self, target: Option<ProjectView>) {
        self.update_state(|s| s.deletion_target = target);
    }

    // ── Private helpers ──────────────────────────────────────────

    fn update_state(&self, mutate: impl FnOnce(&mut ListState)) {
        self.inner.state.send_modify(|current| {
            let mut next = (**current).clone();
            mutate(&mut next);
            *current = Arc::new(next);
        });
    }

    fn lock_debounce(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Feed handler: refetch whatever page is current. Only ever invoked
/// while the subscription is enabled, i.e. while no filter is active.
fn refetch_current_page(weak: Weak<ListInner>) -> ChangeCallback {
    Box::new(move |event| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        debug!(kind = %event.kind, "change event received, refetching");
        let ctrl = ListController { inner };
        tokio::spawn(async move {
            let page = ctrl.state().pagination.page;
            ctrl.fetch(page).await;
        });
    })
}

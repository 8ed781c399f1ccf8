// ── Detail controller ──
//
// Fetch/edit/delete lifecycle for a single project, independent of the
// list. Navigation after a successful delete belongs to the caller.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use trackdeck_api::{ProjectView, ProjectsClient, UpdateProjectInput};

use crate::error::CoreError;
use crate::notify::Notifications;

/// Renderable state for one project page.
///
/// "Not found" is `!loading && project.is_none()`.
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub project: Option<ProjectView>,
    pub loading: bool,
    pub current_user_id: String,
    pub modal_open: bool,
    pub deletion_target: Option<ProjectView>,
    pub deleting: bool,
}

impl DetailState {
    /// Ownership mirror for control visibility; the server enforces the
    /// real check.
    pub fn can_modify(&self) -> bool {
        self.project.as_ref().is_some_and(|view| {
            !self.current_user_id.is_empty() && view.project.assigned_to == self.current_user_id
        })
    }
}

/// Single-resource controller, bound to one project id for its lifetime.
#[derive(Clone)]
pub struct DetailController {
    inner: Arc<DetailInner>,
}

struct DetailInner {
    id: String,
    client: ProjectsClient,
    notify: Notifications,
    state: watch::Sender<Arc<DetailState>>,
}

impl DetailController {
    pub fn new(id: impl Into<String>, client: ProjectsClient, notify: Notifications) -> Self {
        let (state, _) = watch::channel(Arc::new(DetailState {
            loading: true,
            ..DetailState::default()
        }));
        Self {
            inner: Arc::new(DetailInner {
                id: id.into(),
                client,
                notify,
                state,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    // ── State observation ────────────────────────────────────────

    pub fn state(&self) -> Arc<DetailState> {
        self.inner.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<Arc<DetailState>> {
        self.inner.state.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Resolve the session's user, then fetch the project.
    pub async fn bootstrap(&self) {
        match self.inner.client.current_user().await {
            Ok(user) => self.update_state(|s| s.current_user_id = user.id),
            Err(e) => warn!(error = %e, "current user lookup failed"),
        }
        self.refetch().await;
    }

    /// Fetch the project. Failure clears it to absent (the presentation
    /// renders not-found) and pushes an error notification.
    pub async fn refetch(&self) {
        self.update_state(|s| s.loading = true);

        match self.inner.client.get(&self.inner.id).await {
            Ok(view) => self.update_state(|s| {
                s.project = Some(view);
                s.loading = false;
            }),
            Err(e) => {
                warn!(error = %e, id = %self.inner.id, "project fetch failed");
                self.inner.notify.error("Failed to load project");
                self.update_state(|s| {
                    s.project = None;
                    s.loading = false;
                });
            }
        }
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Update the loaded project, then refetch it (no pagination to
    /// reconcile here). No-op when nothing is loaded. Failure keeps the
    /// modal open and re-raises.
    pub async fn update(&self, input: UpdateProjectInput) -> Result<(), CoreError> {
        let Some(current) = self.state().project.clone() else {
            return Ok(());
        };

        match self.inner.client.update(current.id(), &input).await {
            Ok(_) => {
                self.update_state(|s| s.modal_open = false);
                self.inner.notify.success("Project updated");
                self.refetch().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id = current.id(), "project update failed");
                self.inner.notify.error("Failed to update project");
                Err(e.into())
            }
        }
    }

    /// Delete the deletion target. On success the caller navigates away;
    /// on failure the target stays set and the error re-raises so the
    /// caller does not navigate. `deleting` is cleared in all paths.
    pub async fn confirm_delete(&self) -> Result<(), CoreError> {
        let Some(target) = self.state().deletion_target.clone() else {
            return Ok(());
        };

        self.update_state(|s| s.deleting = true);

        let outcome = match self.inner.client.delete(target.id()).await {
            Ok(()) => {
                self.update_state(|s| s.deletion_target = None);
                self.inner.notify.success("Project deleted");
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

    pub fn open_edit_modal(&self) {
        self.update_state(|s| s.modal_open = true);
    }

    pub fn close_modal(&self) {
        self.update_state(|s| s.modal_open = false);
    }

    pub fn set_deletion_target(&self, target: Option<ProjectView>) {
        self.update_state(|s| s.deletion_target = target);
    }

    // ── Private helpers ──────────────────────────────────────────

    fn update_state(&self, mutate: impl FnOnce(&mut DetailState)) {
        self.inner.state.send_modify(|current| {
            let mut next = (**current).clone();
            mutate(&mut next);
            *current = Arc::new(next);
        });
    }
}

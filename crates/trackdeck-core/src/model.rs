// ── Filter and timing domain model ──

use std::time::Duration;

use trackdeck_api::{ListQuery, ProjectStatus};

/// Quiet period before a filter change triggers a page-1 refetch.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// How long a notification lives unless dismissed first.
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

/// Status filter: the project status enum plus `All`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    OnHold,
    Completed,
}

impl StatusFilter {
    /// The wire value, or `None` for `All` (the param is omitted).
    pub fn as_param(self) -> Option<ProjectStatus> {
        match self {
            Self::All => None,
            Self::Active => Some(ProjectStatus::Active),
            Self::OnHold => Some(ProjectStatus::OnHold),
            Self::Completed => Some(ProjectStatus::Completed),
        }
    }
}

impl From<ProjectStatus> for StatusFilter {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Active => Self::Active,
            ProjectStatus::OnHold => Self::OnHold,
            ProjectStatus::Completed => Self::Completed,
        }
    }
}

/// The list controller's filter slice: free-text search, status, assignee.
/// Empty string means "no filter" for search and assignee.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Filters {
    pub search: String,
    pub status: StatusFilter,
    pub assignee: String,
}

impl Filters {
    /// True when any field deviates from its default.
    ///
    /// While a filter is active, push events are ignored entirely and
    /// mutations refetch explicitly; see the list controller.
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.status != StatusFilter::All || !self.assignee.is_empty()
    }

    pub(crate) fn to_query(&self, page: u32, limit: u32) -> ListQuery {
        ListQuery {
            page,
            limit,
            status: self.status.as_param(),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            assignee: (!self.assignee.is_empty()).then(|| self.assignee.clone()),
        }
    }
}

// ── Wire types for the project service ──
//
// Row fields are snake_case on the wire; the pagination block is
// camelCase. `ProjectView` is the read shape (row + denormalized owner);
// writes use the input structs, never the view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Status ─────────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    OnHold,
    Completed,
}

// ── Entities ───────────────────────────────────────────────────────

/// A project row as stored by the service.
///
/// `created_at`/`updated_at` are server-assigned and never sent on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub deadline: NaiveDate,
    /// Owner reference: the user this project is assigned to. Determines
    /// edit/delete eligibility (mirrored client-side; enforced server-side).
    pub assigned_to: String,
    pub budget: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner summary joined onto a project at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
}

/// A project enriched with its owner summary. Display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub assigned_user: Option<OwnerSummary>,
}

impl ProjectView {
    pub fn id(&self) -> &str {
        &self.project.id
    }
}

// ── Write payloads ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Defaults to `active` server-side when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    pub deadline: NaiveDate,
    /// Defaults to 0 server-side when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

/// Partial update: only present fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

// ── Pagination ─────────────────────────────────────────────────────

/// Server-computed pagination block, mirrored verbatim into controller
/// state after every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    /// The empty first page, used before any fetch completes.
    pub fn empty(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
            has_next: false,
            has_prev: false,
        }
    }
}

/// Response envelope of the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPage {
    pub data: Vec<ProjectView>,
    pub pagination: PageInfo,
}

/// Query for the list endpoint. Optional fields are omitted from the
/// request entirely when unset.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
    pub assignee: Option<String>,
}

impl ListQuery {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        if let Some(ref search) = self.search {
            params.push(("search", search.clone()));
        }
        if let Some(ref assignee) = self.assignee {
            params.push(("assignee", assignee.clone()));
        }
        params
    }
}

// ── Change feed ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One collection change pushed by the service.
///
/// The id is advisory: consumers reconcile by refetching, never by
/// applying the payload directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "event")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_names() {
        let json = serde_json::to_string(&ProjectStatus::OnHold).expect("serialize");
        assert_eq!(json, "\"on_hold\"");
        assert_eq!(ProjectStatus::OnHold.to_string(), "on_hold");
    }

    #[test]
    fn list_query_omits_unset_filters() {
        let query = ListQuery {
            page: 2,
            limit: 10,
            status: None,
            search: None,
            assignee: None,
        };
        let params = query.to_params();
        assert_eq!(
            params,
            vec![("page", "2".to_owned()), ("limit", "10".to_owned())]
        );
    }

    #[test]
    fn list_query_includes_active_filters() {
        let query = ListQuery {
            page: 1,
            limit: 10,
            status: Some(ProjectStatus::Completed),
            search: Some("api".into()),
            assignee: Some("user-1".into()),
        };
        let params = query.to_params();
        assert!(params.contains(&("status", "completed".to_owned())));
        assert!(params.contains(&("search", "api".to_owned())));
        assert!(params.contains(&("assignee", "user-1".to_owned())));
    }

    #[test]
    fn change_event_parses_wire_frame() {
        let event: ChangeEvent =
            serde_json::from_str(r#"{"event":"delete","id":"p1"}"#).expect("parse");
        assert_eq!(event.kind, ChangeKind::Delete);
        assert_eq!(event.id.as_deref(), Some("p1"));
    }

    #[test]
    fn change_event_id_is_optional() {
        let event: ChangeEvent = serde_json::from_str(r#"{"event":"insert"}"#).expect("parse");
        assert_eq!(event.kind, ChangeKind::Insert);
        assert!(event.id.is_none());
    }

    #[test]
    fn update_input_serializes_only_present_fields() {
        let input = UpdateProjectInput {
            name: Some("Renamed".into()),
            ..UpdateProjectInput::default()
        };
        let json = serde_json::to_value(&input).expect("serialize");
        assert_eq!(json, serde_json::json!({ "name": "Renamed" }));
    }
}

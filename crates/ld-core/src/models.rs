//! # Domain Models
//!
//! These structs represent the core entities of the lab helpdesk.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three kinds of people who touch a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Students reporting lab issues
    Reporter,
    /// Network-team staff working the queue
    Resolver,
    /// Faculty viewing aggregate outcomes
    Observer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reporter => "reporter",
            Role::Resolver => "resolver",
            Role::Observer => "observer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts both the canonical names and the legacy account roles
    /// (`student`, `network_team`, `faculty`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reporter" | "student" => Ok(Role::Reporter),
            "resolver" | "network_team" | "network" => Ok(Role::Resolver),
            "observer" | "faculty" => Ok(Role::Observer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Identity and role of whoever is invoking a core operation.
///
/// Passed explicitly into every operation; the core never reads ambient
/// session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn reporter(id: Uuid) -> Self {
        Self::new(id, Role::Reporter)
    }

    pub fn resolver(id: Uuid) -> Self {
        Self::new(id, Role::Resolver)
    }

    pub fn observer(id: Uuid) -> Self {
        Self::new(id, Role::Observer)
    }

    /// Every notification scope this actor receives: their own inbox and
    /// their role's broadcast channel.
    pub fn scopes(&self) -> [RecipientScope; 2] {
        [RecipientScope::User(self.id), RecipientScope::Role(self.role)]
    }

    pub fn owns_scope(&self, scope: &RecipientScope) -> bool {
        match scope {
            RecipientScope::User(id) => *id == self.id,
            RecipientScope::Role(role) => *role == self.role,
        }
    }
}

/// Ticket workflow state. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
        }
    }

    /// The single legal successor, if any.
    pub fn next(&self) -> Option<TicketStatus> {
        match self {
            TicketStatus::Open => Some(TicketStatus::InProgress),
            TicketStatus::InProgress => Some(TicketStatus::Resolved),
            TicketStatus::Resolved => None,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Open" => Ok(TicketStatus::Open),
            "In Progress" | "InProgress" => Ok(TicketStatus::InProgress),
            "Resolved" => Ok(TicketStatus::Resolved),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// The fixed set of issue categories a reporter can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    Hardware,
    Software,
    Network,
    Other,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Hardware => "Hardware",
            IssueCategory::Software => "Software",
            IssueCategory::Network => "Network",
            IssueCategory::Other => "Other",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Hardware" => Ok(IssueCategory::Hardware),
            "Software" => Ok(IssueCategory::Software),
            "Network" => Ok(IssueCategory::Network),
            "Other" => Ok(IssueCategory::Other),
            other => Err(format!(
                "unknown issue category '{other}' (expected Hardware, Software, Network or Other)"
            )),
        }
    }
}

/// A reported lab issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    /// Owner; set at creation and never changed
    pub reporter_id: Uuid,
    /// Free-text workstation label (e.g. "PC-14")
    pub pc_label: Option<String>,
    /// Network address of the reporting machine, captured by the transport
    pub source_address: String,
    pub issue_category: IssueCategory,
    pub description: String,
    pub status: TicketStatus,
    pub is_urgent: bool,
    /// Who escalated the ticket, when it has been escalated
    pub escalated_by: Option<Uuid>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Present iff `status == Resolved`
    pub resolved_at: Option<DateTime<Utc>>,
    /// 1..=5, set at most once after resolution
    pub rating: Option<u8>,
    pub feedback_text: Option<String>,
}

impl Ticket {
    /// Where the issue was reported from, preferring the workstation label.
    pub fn location(&self) -> &str {
        match self.pc_label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => &self.source_address,
        }
    }
}

/// Reporter-supplied fields for a new ticket.
///
/// The category arrives as raw text so an unknown value is reported as a
/// validation failure rather than a decoding error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    #[serde(default, alias = "pcNumber")]
    pub pc_label: Option<String>,
    #[serde(alias = "issueType")]
    pub issue_category: String,
    pub description: String,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum RecipientScope {
    /// A single user's inbox
    User(Uuid),
    /// Every member of a role
    Role(Role),
}

impl RecipientScope {
    /// Flat string form used by storage plugins, e.g. `user:<uuid>` or
    /// `role:resolver`.
    pub fn key(&self) -> String {
        match self {
            RecipientScope::User(id) => format!("user:{id}"),
            RecipientScope::Role(role) => format!("role:{role}"),
        }
    }
}

impl FromStr for RecipientScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("user", id)) => Uuid::parse_str(id)
                .map(RecipientScope::User)
                .map_err(|e| format!("bad user scope '{s}': {e}")),
            Some(("role", role)) => role.parse().map(RecipientScope::Role),
            _ => Err(format!("malformed recipient scope '{s}'")),
        }
    }
}

/// A message generated by the engine for a recipient scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub scope: RecipientScope,
    pub message: String,
    /// Whether the recipient viewing this record has read it.
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_moves_forward() {
        assert_eq!(TicketStatus::Open.next(), Some(TicketStatus::InProgress));
        assert_eq!(TicketStatus::InProgress.next(), Some(TicketStatus::Resolved));
        assert_eq!(TicketStatus::Resolved.next(), None);
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: TicketStatus = serde_json::from_str("\"InProgress\"").unwrap();
        assert_eq!(parsed, TicketStatus::InProgress);
        assert_eq!("In Progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
    }

    #[test]
    fn test_role_accepts_legacy_names() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Reporter);
        assert_eq!("network_team".parse::<Role>().unwrap(), Role::Resolver);
        assert_eq!("Faculty".parse::<Role>().unwrap(), Role::Observer);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert_eq!("Hardware".parse::<IssueCategory>().unwrap(), IssueCategory::Hardware);
        assert!("Printer".parse::<IssueCategory>().is_err());
    }

    #[test]
    fn test_scope_key_parses_back() {
        let id = Uuid::now_v7();
        let user = RecipientScope::User(id);
        assert_eq!(user.key().parse::<RecipientScope>().unwrap(), user);
        let role = RecipientScope::Role(Role::Resolver);
        assert_eq!(role.key(), "role:resolver");
        assert!("team:x".parse::<RecipientScope>().is_err());
    }

    #[test]
    fn test_actor_scope_ownership() {
        let actor = Actor::resolver(Uuid::now_v7());
        assert!(actor.owns_scope(&RecipientScope::User(actor.id)));
        assert!(actor.owns_scope(&RecipientScope::Role(Role::Resolver)));
        assert!(!actor.owns_scope(&RecipientScope::Role(Role::Reporter)));
        assert!(!actor.owns_scope(&RecipientScope::User(Uuid::now_v7())));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tables this service reads from and writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    TalentProfiles,
    SponsorProfiles,
    ContactSubmissions,
}

impl Table {
    pub const ALL: [Table; 3] = [
        Table::TalentProfiles,
        Table::SponsorProfiles,
        Table::ContactSubmissions,
    ];

    /// Table name used for writes and change notifications.
    pub const fn name(self) -> &'static str {
        match self {
            Table::TalentProfiles => "talent_profiles",
            Table::SponsorProfiles => "sponsor_profiles",
            Table::ContactSubmissions => "contact_submissions",
        }
    }

    /// Relation the dashboard reads from; contacts go through a view.
    pub const fn read_source(self) -> &'static str {
        match self {
            Table::ContactSubmissions => "contact_submissions_view",
            other => other.name(),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Table::TalentProfiles => "talent",
            Table::SponsorProfiles => "sponsors",
            Table::ContactSubmissions => "contacts",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        let value = value.trim();
        let value = value.rsplit('.').next().unwrap_or(value);
        Table::ALL.into_iter().find(|table| {
            table.name() == value || table.read_source() == value || table.label() == value
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }

    /// Parse the event type names used by the change feed (`INSERT`, `UPDATE`, `DELETE`).
    pub fn from_event_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// Client-side record of a pushed change; only kept for notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealtimeChange {
    pub table: Table,
    pub kind: ChangeKind,
    pub received_at: DateTime<Utc>,
}

impl RealtimeChange {
    pub fn new(table: Table, kind: ChangeKind) -> Self {
        Self {
            table,
            kind,
            received_at: Utc::now(),
        }
    }

    pub fn describe(&self) -> String {
        let noun = match self.table {
            Table::TalentProfiles => "talent profile",
            Table::SponsorProfiles => "sponsor profile",
            Table::ContactSubmissions => "contact message",
        };
        let verb = match self.kind {
            ChangeKind::Insert => "received",
            ChangeKind::Update => "updated",
            ChangeKind::Delete => "removed",
        };
        format!("A {noun} was {verb}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_resolve_from_feed_payloads() {
        assert_eq!(
            Table::from_name("public.talent_profiles"),
            Some(Table::TalentProfiles)
        );
        assert_eq!(
            Table::from_name("contact_submissions_view"),
            Some(Table::ContactSubmissions)
        );
        assert_eq!(Table::from_name("sponsors"), Some(Table::SponsorProfiles));
        assert_eq!(Table::from_name("audit_log"), None);
    }

    #[test]
    fn event_types_are_case_insensitive() {
        assert_eq!(ChangeKind::from_event_type("insert"), Some(ChangeKind::Insert));
        assert_eq!(ChangeKind::from_event_type("DELETE"), Some(ChangeKind::Delete));
        assert_eq!(ChangeKind::from_event_type("TRUNCATE"), None);
    }

    #[test]
    fn describe_names_table_and_kind() {
        let change = RealtimeChange::new(Table::ContactSubmissions, ChangeKind::Insert);
        assert_eq!(change.describe(), "A contact message was received");
    }
}

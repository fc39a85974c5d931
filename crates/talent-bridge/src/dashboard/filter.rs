use std::str::FromStr;

use crate::domain::{
    ContactStatus, ContactSubmission, ReviewStatus, SponsorProfile, TalentProfile, UnknownStatus,
};

/// Row type the dashboard can search and filter by status.
pub trait Searchable {
    type Status: Copy + PartialEq;

    /// Text the free-text search looks at, in no particular order.
    fn search_fields(&self) -> Vec<&str>;

    fn status(&self) -> Self::Status;
}

impl Searchable for TalentProfile {
    type Status = ReviewStatus;

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.headline.as_str(),
            self.industry.as_str(),
        ]
    }

    fn status(&self) -> ReviewStatus {
        self.status
    }
}

impl Searchable for SponsorProfile {
    type Status = ReviewStatus;

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.organization.as_str(),
            self.sponsor_type.as_str(),
        ]
    }

    fn status(&self) -> ReviewStatus {
        self.status
    }
}

impl Searchable for ContactSubmission {
    type Status = ContactStatus;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.name.as_str(),
            self.email.as_str(),
            self.inquiry_type.as_str(),
            self.message.as_str(),
        ];
        if let Some(organization) = &self.organization {
            fields.push(organization.as_str());
        }
        fields
    }

    fn status(&self) -> ContactStatus {
        self.status
    }
}

/// Free-text search combined with an optional status; `None` means all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFilter<S> {
    pub search: Option<String>,
    pub status: Option<S>,
}

impl<S> Default for CollectionFilter<S> {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
        }
    }
}

impl<S> CollectionFilter<S>
where
    S: FromStr<Err = UnknownStatus>,
{
    /// Build from raw query values; `all` or an empty status selects every row.
    pub fn parse(search: Option<String>, status: Option<&str>) -> Result<Self, UnknownStatus> {
        let status = match status.map(str::trim) {
            None | Some("") => None,
            Some(value) if value.eq_ignore_ascii_case("all") => None,
            Some(value) => Some(value.parse()?),
        };
        Ok(Self { search, status })
    }
}

impl<S: Copy + PartialEq> CollectionFilter<S> {
    pub fn matches<T>(&self, row: &T) -> bool
    where
        T: Searchable<Status = S>,
    {
        if let Some(status) = self.status {
            if row.status() != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let needle = term.to_lowercase();
                row.search_fields()
                    .into_iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Rows passing `filter`, in snapshot order.
pub fn filter_rows<T>(rows: &[T], filter: &CollectionFilter<T::Status>) -> Vec<T>
where
    T: Searchable + Clone,
{
    rows.iter()
        .filter(|row| filter.matches(*row))
        .cloned()
        .collect()
}

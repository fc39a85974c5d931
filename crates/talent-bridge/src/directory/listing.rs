use serde::{Deserialize, Serialize};

use crate::domain::TalentProfile;

/// Industry filter value that matches every entry.
pub const ALL_INDUSTRIES: &str = "All";

/// Public summary of an approved talent profile. Contact details stay out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub title: String,
    pub industry: String,
    pub seniority: Option<String>,
    pub years_of_experience: Option<u32>,
    pub expertise: Vec<String>,
    pub achievements: Vec<String>,
    pub languages: Vec<String>,
}

impl From<TalentProfile> for DirectoryEntry {
    fn from(profile: TalentProfile) -> Self {
        let mut expertise = profile.functions;
        for skill in profile.skills {
            if !expertise.contains(&skill) {
                expertise.push(skill);
            }
        }

        Self {
            id: profile.id.0,
            title: profile.headline,
            industry: profile.industry,
            seniority: profile.seniority,
            years_of_experience: profile.years_of_experience,
            expertise,
            achievements: profile.achievements,
            languages: profile.languages,
        }
    }
}

impl DirectoryEntry {
    fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .expertise
                .iter()
                .chain(self.achievements.iter())
                .any(|item| item.to_lowercase().contains(needle))
    }
}

/// Search term plus industry selector, as sent by the directory page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryFilter {
    pub search: Option<String>,
    pub industry: Option<String>,
}

impl DirectoryFilter {
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        let industry_ok = match self.industry.as_deref().map(str::trim) {
            None | Some("") | Some(ALL_INDUSTRIES) => true,
            Some(industry) => entry.industry == industry,
        };
        if !industry_ok {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => entry.mentions(&term.to_lowercase()),
        }
    }

    pub fn apply<'a>(&self, entries: &'a [DirectoryEntry]) -> Vec<&'a DirectoryEntry> {
        entries.iter().filter(|entry| self.matches(entry)).collect()
    }
}

/// Selector options: `All` followed by each distinct industry in sorted order.
pub fn industries(entries: &[DirectoryEntry]) -> Vec<String> {
    let mut distinct: Vec<String> = entries
        .iter()
        .map(|entry| entry.industry.clone())
        .filter(|industry| !industry.is_empty())
        .collect();
    distinct.sort();
    distinct.dedup();

    let mut options = Vec::with_capacity(distinct.len() + 1);
    options.push(ALL_INDUSTRIES.to_string());
    options.extend(distinct);
    options
}

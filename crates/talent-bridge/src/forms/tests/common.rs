use std::sync::Arc;

use crate::forms::{Attachment, ContactForm, SponsorForm, SubmissionService, TalentForm};
use crate::remote::{InMemoryDataService, SharedRemote};

pub(super) const CV_BUCKET: &str = "cvs";

pub(super) fn talent_form() -> TalentForm {
    TalentForm {
        name: "Ada Obi".to_string(),
        email: "Ada.Obi@Example.org".to_string(),
        headline: "Product lead for fintech".to_string(),
        bio: "Ten years building payment products across West Africa and Europe, most recently leading a platform team."
            .to_string(),
        industry: "Fintech".to_string(),
        seniority: "Senior".to_string(),
        years_of_experience: Some(10),
        functions: vec!["Product".to_string()],
        skills: vec!["Payments".to_string(), " Payments ".to_string(), "Strategy".to_string()],
        languages: vec!["English".to_string()],
        achievements: Vec::new(),
        linkedin_url: None,
        portfolio_url: Some("   ".to_string()),
        website_url: Some("".to_string()),
        consent: true,
    }
}

pub(super) fn sponsor_form() -> SponsorForm {
    SponsorForm {
        name: "Grace Mensah".to_string(),
        email: "grace@acme.example".to_string(),
        organization: "Acme Ventures".to_string(),
        role_title: Some("Partner".to_string()),
        website: Some("https://acme.example".to_string()),
        sponsor_type: "Mentor".to_string(),
        focus_areas: vec!["Fintech".to_string()],
        message: None,
        pledge_accepted: true,
        consent: true,
    }
}

pub(super) fn contact_form() -> ContactForm {
    ContactForm {
        name: "Sam Doe".to_string(),
        email: "sam@example.org".to_string(),
        inquiry_type: "Partnership".to_string(),
        organization: None,
        message: "We would like to discuss a partnership.".to_string(),
    }
}

pub(super) fn pdf(name: &str) -> Attachment {
    Attachment::new(name, Some("application/pdf".to_string()), b"%PDF-1.4".to_vec())
}

pub(super) fn build_service() -> (Arc<InMemoryDataService>, SubmissionService) {
    let remote = Arc::new(InMemoryDataService::new());
    let shared: SharedRemote = remote.clone();
    (remote, SubmissionService::new(shared, CV_BUCKET))
}

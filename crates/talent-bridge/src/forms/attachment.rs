use chrono::{DateTime, Utc};

/// Field name attachment errors are reported under.
pub const ATTACHMENT_FIELD: &str = "cv";

pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// File uploaded alongside a profile (a CV).
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Declared content type, or one guessed from the file extension.
    pub fn resolved_content_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty() && *value != "application/octet-stream")
            .map(str::to_string)
            .or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first_raw()
                    .map(str::to_string)
            })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bytes.is_empty() {
            return Err("The selected file is empty".to_string());
        }
        if self.bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err("CV must be 5 MB or smaller".to_string());
        }
        match self.resolved_content_type() {
            Some(content_type) if ACCEPTED_CONTENT_TYPES.contains(&content_type.as_str()) => Ok(()),
            _ => Err("CV must be a PDF or Word document".to_string()),
        }
    }

    /// Object path: `{email}/{timestamp}-{file name}` with unsafe characters replaced.
    pub fn storage_path(&self, email: &str, now: DateTime<Utc>) -> String {
        format!(
            "{}/{}-{}",
            sanitize(&email.to_lowercase()),
            now.timestamp_millis(),
            sanitize(&self.file_name)
        )
    }
}

fn sanitize(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn content_type_is_inferred_from_extension() {
        let attachment = Attachment::new("resume.PDF", None, vec![1]);
        assert_eq!(
            attachment.resolved_content_type().as_deref(),
            Some("application/pdf")
        );

        let declared = Attachment::new(
            "resume",
            Some("application/octet-stream".to_string()),
            vec![1],
        );
        assert_eq!(declared.resolved_content_type(), None);
    }

    #[test]
    fn rejects_oversized_and_unsupported_files() {
        let big = Attachment::new("cv.pdf", None, vec![0; MAX_ATTACHMENT_BYTES + 1]);
        assert_eq!(big.validate(), Err("CV must be 5 MB or smaller".to_string()));

        let image = Attachment::new("cv.png", None, vec![1, 2, 3]);
        assert!(image.validate().is_err());

        let docx = Attachment::new("cv.docx", None, vec![1, 2, 3]);
        assert!(docx.validate().is_ok());
    }

    #[test]
    fn storage_path_is_safe() {
        let attachment = Attachment::new("My CV (final).pdf", None, vec![1]);
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid time");
        assert_eq!(
            attachment.storage_path("Ada@Example.org", now),
            format!("ada_example.org/{}-My_CV__final_.pdf", now.timestamp_millis())
        );
    }
}

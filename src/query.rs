// query.rs - User-supplied input for a single invocation

use crate::error::ValidationError;
use crate::tools::{InputKind, ToolSpec};

/// Raw value collected from the form or the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Text(String),
    Upload { bytes: Vec<u8>, filename: Option<String> },
    ImageUrl(String),
}

/// Query after validation, ready to hand to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidQuery {
    Text(String),
    Image(ImageSource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Url(String),
}

impl Query {
    pub fn text(value: impl Into<String>) -> Self {
        Query::Text(value.into())
    }

    /// Short form used in logs; uploads are not echoed
    pub fn describe(&self) -> String {
        match self {
            Query::Text(s) => s.trim().to_string(),
            Query::ImageUrl(url) => url.trim().to_string(),
            Query::Upload { bytes, filename } => format!(
                "{} ({} bytes)",
                filename.as_deref().unwrap_or("upload"),
                bytes.len()
            ),
        }
    }

    /// Reject blank input and input of the wrong kind for the tool
    pub fn validate(&self, spec: &ToolSpec) -> Result<ValidQuery, ValidationError> {
        let missing = || ValidationError::new(spec.messages.missing_input);

        match (spec.input, self) {
            (InputKind::Image, Query::Upload { bytes, .. }) => {
                if bytes.is_empty() {
                    return Err(missing());
                }
                Ok(ValidQuery::Image(ImageSource::Bytes(bytes.clone())))
            }
            (InputKind::Image, Query::ImageUrl(url)) | (InputKind::Image, Query::Text(url)) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(missing());
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ValidationError::new(
                        "Please enter an http(s) image URL or upload a file.",
                    ));
                }
                Ok(ValidQuery::Image(ImageSource::Url(url.to_string())))
            }
            (_, Query::Text(value)) => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(missing());
                }
                // Would reach command-line tools as an option, not a value
                if value.starts_with('-') {
                    return Err(ValidationError::new(format!(
                        "{} does not accept values starting with '-'.",
                        spec.label
                    )));
                }
                Ok(ValidQuery::Text(value.to_string()))
            }
            (_, Query::ImageUrl(value)) if value.trim().is_empty() => Err(missing()),
            (_, Query::Upload { bytes, .. }) if bytes.is_empty() => Err(missing()),
            _ => Err(ValidationError::new(format!(
                "{} expects a text value, not an image.",
                spec.label
            ))),
        }
    }
}

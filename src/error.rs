//! Error taxonomy and the user-facing notifications built from it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to turn a byte stream into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing %PDF- header")]
    MissingHeader,
    #[error("missing %%EOF trailer, file looks truncated")]
    Truncated,
    #[error("document has no pages")]
    NoPages,
    #[error("decoder failed: {0}")]
    Backend(String),
}

/// Errors surfaced by a document load request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Wrong file type; nothing was changed
    #[error("expected application/pdf, got {}", media_type.as_deref().unwrap_or("no content type"))]
    InvalidInput { media_type: Option<String> },
    /// Corrupt or unreadable document; the previous document is gone
    #[error("failed to decode document: {0}")]
    Decode(#[from] DecodeError),
    /// A newer load request replaced this one before it finished
    #[error("load superseded by a newer document")]
    Superseded,
}

/// Out-of-range configuration value; the prior value is retained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("total duration must be positive, got {0}")]
    TotalDuration(i64),
    #[error("countdown duration must be positive, got {0}")]
    CountdownDuration(i64),
}

/// Errors from talking to the presenter task
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenterError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Config(#[from] ConfigValidationError),
    #[error("presenter task is not running")]
    Unavailable,
}

/// A message in Japanese and English
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedMessage {
    pub ja: String,
    pub en: String,
}

impl LocalizedMessage {
    pub fn new(ja: &str, en: &str) -> Self {
        Self {
            ja: ja.to_string(),
            en: en.to_string(),
        }
    }
}

/// Entry on the single user notification channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub code: String,
    pub message: LocalizedMessage,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(code: &str, message: LocalizedMessage, detail: String) -> Self {
        Self {
            code: code.to_string(),
            message,
            detail,
            timestamp: Utc::now(),
        }
    }
}

impl DocumentError {
    /// User-facing notification, `None` for outcomes the user should not see
    pub fn notification(&self) -> Option<Notification> {
        match self {
            DocumentError::InvalidInput { .. } => Some(Notification::new(
                "invalid_input",
                LocalizedMessage::new(
                    "PDFファイルのみドロップしてください。",
                    "Please drop PDF files only.",
                ),
                self.to_string(),
            )),
            DocumentError::Decode(_) => Some(Notification::new(
                "decode_failed",
                LocalizedMessage::new("PDFの読み込みに失敗しました。", "Failed to load PDF."),
                self.to_string(),
            )),
            DocumentError::Superseded => None,
        }
    }
}

impl ConfigValidationError {
    pub fn notification(&self) -> Notification {
        Notification::new(
            "invalid_config",
            LocalizedMessage::new(
                "設定値には正の数を入力してください。",
                "Please enter a positive number.",
            ),
            self.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_notification_is_bilingual() {
        let err = DocumentError::InvalidInput {
            media_type: Some("image/png".to_string()),
        };
        let note = err.notification().expect("visible");
        assert_eq!(note.code, "invalid_input");
        assert_eq!(
            note.message,
            LocalizedMessage::new(
                "PDFファイルのみドロップしてください。",
                "Please drop PDF files only."
            )
        );
        assert!(note.detail.contains("image/png"));
    }

    #[test]
    fn superseded_load_is_silent() {
        assert!(DocumentError::Superseded.notification().is_none());
    }

    #[test]
    fn decode_error_converts_into_document_error() {
        let err: DocumentError = DecodeError::NoPages.into();
        assert_eq!(err, DocumentError::Decode(DecodeError::NoPages));
        assert_eq!(err.notification().expect("visible").message.en, "Failed to load PDF.");
    }
}

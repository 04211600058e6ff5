//! Multipart request builder for the AI chat endpoint.

use reqwest::multipart::{Form, Part};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatRequestError {
    #[error("chat message must not be empty")]
    EmptyMessage,
    #[error("attachment file name must not be empty")]
    EmptyAttachmentName,
    #[error("attachment mime type is invalid: {0}")]
    InvalidMimeType(String),
}

#[derive(Debug, Clone)]
pub struct ChatAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Chat turn sent to `POST /api/v1/ai/chat`: text, optional chat identifier
/// to continue an existing conversation, optional file attachments.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub chat_id: Option<String>,
    pub attachments: Vec<ChatAttachment>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            chat_id: None,
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: ChatAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn validate(&self) -> Result<(), ChatRequestError> {
        if self.message.trim().is_empty() {
            return Err(ChatRequestError::EmptyMessage);
        }
        for attachment in &self.attachments {
            if attachment.file_name.trim().is_empty() {
                return Err(ChatRequestError::EmptyAttachmentName);
            }
        }
        Ok(())
    }

    /// Multipart layout: `message` text part, optional `chat_id` text part,
    /// one `files` part per attachment.
    pub fn into_form(self) -> Result<Form, ChatRequestError> {
        self.validate()?;
        let mut form = Form::new().text("message", self.message);
        if let Some(chat_id) = self.chat_id {
            form = form.text("chat_id", chat_id);
        }
        for attachment in self.attachments {
            let part = Part::bytes(attachment.bytes)
                .file_name(attachment.file_name)
                .mime_str(&attachment.mime_type)
                .map_err(|_| ChatRequestError::InvalidMimeType(attachment.mime_type))?;
            form = form.part("files", part);
        }
        Ok(form)
    }
}

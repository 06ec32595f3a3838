use thiserror::Error;

/// Failures of a single assistant turn.
#[derive(Debug, Error)]
pub enum AssistError {
    /// The provider credential is not configured. Holds the variable name.
    #[error("{0} is not set")]
    MissingCredential(String),

    /// Transport, HTTP status or stream failure talking to the model provider.
    #[error("model provider error: {0}")]
    Provider(String),

    #[error("record store error: {0}")]
    RecordStore(String),
}

impl From<sqlx::Error> for AssistError {
    fn from(e: sqlx::Error) -> Self {
        Self::RecordStore(e.to_string())
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(e: reqwest::Error) -> Self {
        Self::Provider(e.without_url().to_string())
    }
}

impl AssistError {
    /// The error text with any phone number or email address masked out.
    pub fn redacted(&self) -> String {
        retail_pii::mask(&self.to_string()).0
    }

    /// The single apology shown to the end user in place of a reply.
    pub fn user_message(&self) -> String {
        let hint = match self {
            Self::MissingCredential(var) => format!("Please make sure your {var} is set in the .env file."),
            Self::Provider(_) => "Please check the model provider credentials and your network connection, then try again.".to_string(),
            Self::RecordStore(_) => "Please check that the customer database is available.".to_string(),
        };
        format!("I apologize, but I encountered an error: {}\n\n{}", self.redacted(), hint)
    }
}

//! Personalized, privacy-preserving replies for the coffee-shop assistant.
//!
//! [`ContextAssembler`] ties the record store, the retrieval index and the
//! model together for a single turn. Phone numbers and email addresses are
//! masked before anything leaves the process and restored in the reply.

pub mod assembler;
pub mod error;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod records;

pub use assembler::{ContextAssembler, PreparedTurn, Retriever};
pub use error::AssistError;
pub use llm::{GroqClient, LlmClient};
pub use records::{RecordStore, SqliteRecordStore};

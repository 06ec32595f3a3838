//! One assistant turn: records, masking, retrieval, prompt, model, unmasking.

use async_trait::async_trait;
use std::sync::Arc;

use retail_core::geo::{self, RankedFacility};
use retail_pii::SubstitutionTable;
use retail_vector::VectorIndex;

use crate::error::AssistError;
use crate::llm::LlmClient;
use crate::prompt::{self, PromptContext};
use crate::records::RecordStore;

pub const DEFAULT_TOP_K: usize = 4;

/// Source of knowledge snippets for a (masked) query.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
impl Retriever for VectorIndex {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<String>> {
        let hits = self.search(query, k).await?;
        Ok(hits.into_iter().map(|h| h.content).collect())
    }
}

/// Masked prompt for one turn plus the table that undoes the masking.
#[derive(Debug)]
pub struct PreparedTurn {
    pub system: String,
    pub user: String,
    pub table: SubstitutionTable,
    pub facility: Option<RankedFacility>,
    pub retrieved: Vec<String>,
}

pub struct ContextAssembler {
    records: Arc<dyn RecordStore>,
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    top_k: usize,
}

impl ContextAssembler {
    pub fn new(records: Arc<dyn RecordStore>, retriever: Arc<dyn Retriever>, llm: Arc<dyn LlmClient>) -> Self {
        Self { records, retriever, llm, top_k: DEFAULT_TOP_K }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Gather context and render the masked prompt without calling the model.
    ///
    /// The user message is masked first and the customer's phone and email
    /// after it, all into one table. Retrieval only ever sees the masked
    /// message; a retrieval failure leaves the knowledge section out.
    pub async fn prepare_turn(&self, customer_id: Option<i64>, message: &str) -> Result<PreparedTurn, AssistError> {
        let customer = match customer_id {
            Some(id) => {
                let found = self.records.get_customer(id).await?;
                if found.is_none() {
                    tracing::warn!("customer {id} not found; answering without a profile");
                }
                found
            }
            None => None,
        };
        let facilities = self.records.get_facilities().await?;
        let facility = match &customer {
            Some(c) => geo::nearest_for_customer(c, &facilities),
            None => geo::nearest(None, &facilities),
        };

        let mut table = SubstitutionTable::new();
        let masked_message = retail_pii::mask_into(message, &mut table);
        let masked_customer = customer.as_ref().map(|c| retail_pii::mask_record_into(c, &mut table));

        let retrieved = match self.retriever.retrieve(&masked_message, self.top_k).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!("continuing without retrieved context: {}", retail_pii::mask(&format!("{e:#}")).0);
                Vec::new()
            }
        };

        let user = prompt::render_user_prompt(&PromptContext {
            customer: masked_customer.as_ref(),
            facility: facility.as_ref(),
            documents: &retrieved,
            message: &masked_message,
        });
        tracing::info!(
            "turn prepared: {} masked value(s), {} document(s), store {}",
            table.len(),
            retrieved.len(),
            facility.as_ref().map_or("none", |f| f.facility.name.as_str())
        );

        Ok(PreparedTurn { system: prompt::SYSTEM_PROMPT.to_string(), user, table, facility, retrieved })
    }

    /// Run a turn and return the unmasked reply, or the error that stopped it.
    pub async fn try_respond(&self, customer_id: Option<i64>, message: &str) -> Result<String, AssistError> {
        let turn = self.prepare_turn(customer_id, message).await?;
        let reply = self.llm.complete(&turn.system, &turn.user).await?;
        Ok(retail_pii::unmask(&reply, &turn.table))
    }

    /// Run a turn. Failures become a single apology with no PII in it.
    pub async fn respond(&self, customer_id: Option<i64>, message: &str) -> String {
        match self.try_respond(customer_id, message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("turn failed: {}", e.redacted());
                e.user_message()
            }
        }
    }
}

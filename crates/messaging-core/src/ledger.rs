//! Basket queries over a wallet's ledger outputs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

/// SPV envelope accompanying a ledger output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEnvelope {
    /// Raw carrying transaction, hex encoded.
    pub raw_tx: String,
    /// Input envelopes, when the wallet tracks them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,
    /// Merkle proof, once the transaction is mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<serde_json::Value>,
}

/// One output returned by a basket query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerOutput {
    /// SPV envelope, present when the query asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<TokenEnvelope>,
    /// Locking script, hex encoded.
    pub output_script: String,
    pub txid: String,
    pub vout: u32,
    /// Face value in satoshis.
    pub amount: u64,
    /// Raw JSON metadata attached when the output was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

/// Filter for listing basketed outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputQuery {
    /// Basket to list.
    pub basket: String,
    /// Only outputs that are still spendable.
    pub spendable_only: bool,
    /// Attach SPV envelopes to the results.
    pub include_envelope: bool,
    /// Outputs must carry every listed tag.
    pub tags: Vec<String>,
}

impl OutputQuery {
    /// Query every output in a basket.
    pub fn new(basket: impl Into<String>) -> Self {
        Self {
            basket: basket.into(),
            ..Default::default()
        }
    }

    /// Restrict to outputs that have not been spent.
    pub fn spendable_only(mut self) -> Self {
        self.spendable_only = true;
        self
    }

    /// Ask the ledger to attach SPV envelopes.
    pub fn include_envelope(mut self) -> Self {
        self.include_envelope = true;
        self
    }

    /// Require a tag on every returned output.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Queries and maintenance over a wallet's basketed outputs.
///
/// Object-safe so clients can hold `Arc<dyn OutputLedger>`.
#[async_trait]
pub trait OutputLedger: Send + Sync {
    /// List outputs matching the query, in the ledger's native order
    /// (oldest first).
    async fn list_outputs(&self, query: &OutputQuery)
        -> Result<Vec<LedgerOutput>, MessagingError>;

    /// Drop an output from a basket without spending it.
    ///
    /// The removal route for tokens that can be read but not redeemed.
    async fn unbasket_output(
        &self,
        txid: &str,
        vout: u32,
        basket: &str,
    ) -> Result<(), MessagingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builder_accumulates_tags() {
        let query = OutputQuery::new("email")
            .spendable_only()
            .include_envelope()
            .with_tag("email_outgoing");
        assert_eq!(query.basket, "email");
        assert!(query.spendable_only);
        assert!(query.include_envelope);
        assert_eq!(query.tags, vec!["email_outgoing".to_string()]);
    }

    #[test]
    fn ledger_output_round_trips_camel_case() {
        let output = LedgerOutput {
            envelope: Some(TokenEnvelope {
                raw_tx: "beef".to_string(),
                inputs: None,
                proof: None,
            }),
            output_script: "ac".to_string(),
            txid: "aa".repeat(32),
            vout: 3,
            amount: 1,
            custom_instructions: Some("{\"recipient\":\"02aa\"}".to_string()),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["outputScript"], "ac");
        assert_eq!(json["envelope"]["rawTx"], "beef");
        let back: LedgerOutput = serde_json::from_value(json).unwrap();
        assert_eq!(back.vout, 3);
        assert_eq!(back.custom_instructions, output.custom_instructions);
    }
}

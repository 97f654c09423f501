//! In-memory basket ledger for one wallet.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use messaging_core::{LedgerOutput, MessagingError, OutputLedger, OutputQuery};

/// A basketed output plus the wallet-side bookkeeping queries filter on.
#[derive(Debug, Clone)]
pub struct StoredOutput {
    pub basket: String,
    pub tags: Vec<String>,
    pub spendable: bool,
    /// Whether this wallet holds the key the output is locked to.
    pub owned: bool,
    pub output: LedgerOutput,
}

/// In-memory output store. Clones share the underlying outputs.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    outputs: Arc<Mutex<Vec<StoredOutput>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Basket an output.
    pub fn insert(&self, output: StoredOutput) -> Result<(), MessagingError> {
        self.lock()?.push(output);
        Ok(())
    }

    /// Mark an output spent. Returns whether it was found still spendable.
    pub fn mark_spent(&self, txid: &str, vout: u32) -> Result<bool, MessagingError> {
        let mut outputs = self.lock()?;
        for stored in outputs.iter_mut() {
            if stored.output.txid == txid && stored.output.vout == vout && stored.spendable {
                stored.spendable = false;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Ownership of an output; `None` when the output is unknown.
    pub fn ownership(&self, txid: &str, vout: u32) -> Result<Option<bool>, MessagingError> {
        let outputs = self.lock()?;
        Ok(outputs
            .iter()
            .find(|stored| stored.output.txid == txid && stored.output.vout == vout)
            .map(|stored| stored.owned))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredOutput>>, MessagingError> {
        self.outputs.lock().map_err(|_| MessagingError::MutexPoisoned)
    }
}

#[async_trait]
impl OutputLedger for MemoryLedger {
    async fn list_outputs(
        &self,
        query: &OutputQuery,
    ) -> Result<Vec<LedgerOutput>, MessagingError> {
        let outputs = self.lock()?;
        Ok(outputs
            .iter()
            .filter(|stored| stored.basket == query.basket)
            .filter(|stored| !query.spendable_only || stored.spendable)
            .filter(|stored| query.tags.iter().all(|tag| stored.tags.contains(tag)))
            .map(|stored| {
                let mut output = stored.output.clone();
                if !query.include_envelope {
                    output.envelope = None;
                }
                output
            })
            .collect())
    }

    async fn unbasket_output(
        &self,
        txid: &str,
        vout: u32,
        basket: &str,
    ) -> Result<(), MessagingError> {
        let mut outputs = self.lock()?;
        let before = outputs.len();
        outputs.retain(|stored| {
            !(stored.basket == basket && stored.output.txid == txid && stored.output.vout == vout)
        });
        if outputs.len() == before {
            return Err(MessagingError::UnknownToken {
                txid: txid.to_string(),
                vout,
            });
        }
        Ok(())
    }
}

//! In-memory wallet, ledger, and relay for testing tokenized messaging.
//!
//! [`RelayHub`] stands in for the store-and-forward relay, [`MemoryLedger`]
//! for the wallet's basket store, and [`MemoryWallet`] ties both together
//! behind the `TokenMessenger` trait. Wallets attached to the same hub can
//! message each other hermetically, which is all integration tests need:
//!
//! ```rust,ignore
//! let hub = RelayHub::new();
//! let alice = MemoryWallet::new("02aa".into(), hub.clone(), config.clone());
//! let bob = MemoryWallet::new("03bb".into(), hub, config);
//!
//! alice.send_token(token, &tags).await?;
//! let received = bob.receive_tokens().await?;
//! ```

mod ledger;
mod relay;
mod wallet;

pub use ledger::{MemoryLedger, StoredOutput};
pub use relay::{QueuedMessage, RelayHub, TokenTransfer};
pub use wallet::MemoryWallet;

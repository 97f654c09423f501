//! Two wallets exchanging email through an in-memory relay.
//!
//! Run with: cargo run --example send_and_read

use std::sync::Arc;

use mock_wallet::{MemoryWallet, RelayHub};
use token_mail::{EmailClient, EmailConfig, EmailMessage, EmailRecord};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("token_mail=debug".parse().unwrap())
                .add_directive("mock_wallet=debug".parse().unwrap()),
        )
        .init();

    let hub = RelayHub::new();
    let config = EmailConfig::default();

    let alice_wallet = MemoryWallet::new("02alice".into(), hub.clone(), config.messaging());
    let bob_wallet = MemoryWallet::new("03bob".into(), hub, config.messaging());

    let alice = EmailClient::new(
        config.clone(),
        alice_wallet.clone(),
        Arc::new(alice_wallet.ledger()),
        alice_wallet.cipher(),
    );
    let bob = EmailClient::new(
        config,
        bob_wallet.clone(),
        Arc::new(bob_wallet.ledger()),
        bob_wallet.cipher(),
    );

    let receipt = alice
        .send_email(EmailMessage::new(
            "03bob",
            "Hello",
            "First email over tokens!",
        ))
        .await?;
    println!("queued message {} (txid {})", receipt.message_id, receipt.txid);

    let received = bob.check_email().await?;
    println!("bob received {} message(s)", received.len());

    for record in bob.read_email(false).await? {
        match record {
            EmailRecord::Email(email) => {
                println!("[{}] {}: {}", email.date_sent, email.subject, email.body);
                bob.delete_email(&email.token).await?;
                println!("deleted token {}", email.token.txid);
            }
            EmailRecord::Unreadable(bad) => {
                println!("unreadable token {}: {}", bad.output.txid, bad.note);
            }
        }
    }

    Ok(())
}

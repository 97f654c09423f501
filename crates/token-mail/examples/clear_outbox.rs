//! Inspect and clear the outgoing mail basket.
//!
//! Run with: cargo run --example clear_outbox
//!
//! Sends a few emails, lists the sender's tagged copies, then deletes
//! them. The copies are locked to their recipients, so deletion goes
//! through the unbasket route rather than a spend.

use std::sync::Arc;

use mock_wallet::{MemoryWallet, RelayHub};
use token_mail::{EmailClient, EmailConfig, EmailMessage, EmailRecord};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hub = RelayHub::new();
    let config = EmailConfig::default();

    let wallet = MemoryWallet::new("02sender".into(), hub, config.messaging());
    let mail = EmailClient::new(
        config,
        wallet.clone(),
        Arc::new(wallet.ledger()),
        wallet.cipher(),
    );

    for (subject, body) in [
        ("Invoice", "Attached as discussed."),
        ("Follow-up", "Any news on the invoice?"),
        ("Ping", "Bumping this to the top of your inbox."),
    ] {
        mail.send_email(EmailMessage::new("03recipient", subject, body))
            .await?;
    }

    let outbox = mail.read_email(true).await?;
    println!("outbox holds {} email(s), newest first:", outbox.len());
    for record in &outbox {
        match record {
            EmailRecord::Email(email) => {
                println!("  [{}] {}", email.date_sent.format("%H:%M:%S"), email.subject);
            }
            EmailRecord::Unreadable(bad) => println!("  (unreadable: {})", bad.note),
        }
    }

    for record in &outbox {
        if let Some(token) = record.token() {
            mail.delete_email(token).await?;
        }
    }
    println!(
        "outbox cleared, {} email(s) remain",
        mail.read_email(true).await?.len()
    );

    Ok(())
}

//! Energy trading ledger walkthrough
//!
//! Run with `RUST_LOG=debug` to see every span the ledger opens.

use prosumer_ledger::units::{format_ether, parse_ether};
use prosumer_ledger::utils::MemoryStorage;
use prosumer_ledger::{Address, Ledger, LedgerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    let recorder = Address::parse("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")?;
    let prosumer1 = Address::parse("0x70997970c51812dc3a010c7d01b50e0d17dc79c8")?;
    let prosumer2 = Address::parse("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc")?;

    let mut ledger = Ledger::new(MemoryStorage::new(), recorder.clone());
    println!("Recorder: {}", ledger.recorder());

    // 1. Prosumers join and fund their accounts
    ledger.register_prosumer(&prosumer1).await?;
    ledger.register_prosumer(&prosumer2).await?;
    ledger.deposit(&prosumer1, parse_ether("1")?).await?;
    ledger.deposit(&prosumer2, parse_ether("0.5")?).await?;

    // 2. The recorder reports metered positions
    ledger
        .update_energy_status(&recorder, &prosumer1, -1)
        .await?;
    ledger.update_energy_status(&recorder, &prosumer2, 1).await?;

    // 3. Anyone else is turned away
    match ledger.update_energy_status(&prosumer1, &prosumer1, 5).await {
        Err(LedgerError::Unauthorized { caller }) => {
            println!("Rejected status update from {}", caller)
        }
        other => println!("Unexpected outcome: {:?}", other),
    }

    // 4. Withdraw part of a balance
    ledger.withdraw(&prosumer2, parse_ether("0.2")?).await?;

    println!();
    for account in ledger.members().await? {
        println!(
            "{}  balance {:>6} ETH  energy {:>3}",
            account.address,
            format_ether(account.balance),
            account.energy_status
        );
    }
    println!(
        "Total custody: {} ETH",
        format_ether(ledger.total_custody().await?)
    );

    let report = ledger.validate_integrity().await?;
    println!("Integrity valid: {}", report.is_valid);
    for issue in &report.issues {
        println!("  ! {}", issue);
    }

    Ok(())
}

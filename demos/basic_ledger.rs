//! Basic token ledger usage example

use token_ledger::utils::MemoryStorage;
use token_ledger::{Instruction, LedgerConfig, Principal, TokenLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🪙 Token Ledger - Basic Example\n");

    // Permissive policy, same as an empty config file
    let config = LedgerConfig::from_toml_str("authorization = \"permissive\"")?;
    let ledger = TokenLedger::from_config(MemoryStorage::new(), &config)?;

    let alice = Principal::from("alice");
    let bob = Principal::from("bob");
    let shop = Principal::from("shop");

    // 1. Mint initial supply
    println!("💰 Minting...");
    ledger.try_mint(&alice, 1_000).await?;
    println!("  ✓ Minted 1,000 to {}", alice);

    // 2. Direct transfer
    ledger.try_transfer(&alice, &bob, 250).await?;
    println!("  ✓ {} sent 250 to {}", alice, bob);

    // 3. Delegated spending
    println!("\n🤝 Allowances...");
    ledger.try_approve(&shop, 100, &alice).await?;
    println!(
        "  ✓ {} lets {} spend up to {}",
        alice,
        shop,
        ledger.allowance_of(&alice, &shop).await
    );

    ledger.try_transfer_from(&alice, &shop, 60).await?;
    println!("  ✓ {} pulled 60 from {}", shop, alice);

    match ledger.try_transfer_from(&alice, &shop, 60).await {
        Ok(_) => println!("  ✗ unexpected success"),
        Err(e) => println!("  ✓ second pull rejected [{}]: {}", e.code(), e),
    }

    // 4. Wire-form instruction
    let instruction = Instruction::from_json(
        r#"{"op":"transfer","from":"bob","to":"shop","amount":"25"}"#,
    )?;
    let receipt = ledger.execute(instruction).await?;
    println!("\n📨 Executed instruction as receipt #{}", receipt.sequence);

    // 5. Balances and integrity
    println!("\n📊 Balances:");
    for account in ledger.list_accounts().await? {
        println!("  {:<8} {:>6}", account.owner, account.balance);
    }
    println!("  total    {:>6}", ledger.total_supply().await?);

    let report = ledger.validate_integrity().await?;
    println!(
        "\n🔍 Integrity: {} ({} receipts)",
        if report.is_valid { "ok" } else { "FAILED" },
        report.receipt_count
    );
    for issue in &report.issues {
        println!("  - {}", issue);
    }

    Ok(())
}

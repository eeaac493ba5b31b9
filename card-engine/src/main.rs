use anyhow::Context;
use card_engine::{
    CardSession, CommitStorage, LocalCommitLog, OperationRegistry, RuleManager, SortKey,
    setup_environment,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment().context("failed to prepare work dir")?;

    // 2. 打开本地提交日志
    let storage = CommitStorage::open(config.database_path())
        .with_context(|| format!("failed to open {}", config.database_path().display()))?;
    let registry = Arc::new(OperationRegistry::with_builtins());
    let log = LocalCommitLog::new(storage.clone(), Arc::clone(&registry));

    tracing::info!(
        terminal_id = %config.terminal_id,
        user = %config.user,
        operations = registry.len(),
        "🦀 Card engine ready"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("list") => {
            let stats = storage.get_stats()?;
            println!("{} cards, {} commits", stats.cards, stats.commits);

            let session = CardSession::new(log, registry, Arc::new(RuleManager::new()), &config);
            let store = session.store();
            let mut store = store.write();
            store.set_cards(storage.get_all_cards()?);
            for card in store.view().sorted(SortKey::TimeDesc) {
                let status = if card.is_closed() { "closed" } else { "open" };
                println!("{:<38} {:>10} {:<6} {}", card.id, card.balance(), status, card.display());
            }
        }
        Some("show") => {
            let card_id = args.get(1).context("usage: card-engine show <card-id>")?;
            let session = CardSession::new(log, registry, Arc::new(RuleManager::new()), &config);
            let card = session.open(card_id).await?;
            println!("{} balance={}", card.display(), card.balance());
            for entry in session.store().read().history() {
                println!(
                    "{:<38} {:<16} {:<10} {}",
                    entry.commit_id.as_deref().unwrap_or("-"),
                    entry.action.action_type,
                    entry.user.as_deref().unwrap_or("-"),
                    entry.action.data
                );
            }
        }
        Some("demo") => {
            let session = CardSession::new(log, registry, Arc::new(RuleManager::new()), &config);
            let card_id = session.new_card();
            session.dispatch(&card_id, "SET_CARD_TAG", json!({"name": "Name", "value": "Table 4"}))?;
            session.dispatch(&card_id, "SET_CARD_TAG", json!({"name": "Coffee", "debit": 3.5, "quantity": 2}))?;
            let report = session.commit().await?;
            println!(
                "committed {} ({} actions, balance {})",
                card_id,
                report.superseded.len(),
                session.current_card().map(|c| c.balance()).unwrap_or_default()
            );
        }
        Some(other) => anyhow::bail!("unknown command: {other} (expected list, show, demo)"),
    }

    Ok(())
}

use capewatch_core::{
    validate_amount, CalendarDate, FileStore, Ledger, LedgerConfig, LedgerStore, Pipeline,
    PortfolioEntry, PortfolioSummary,
};
use serde::Serialize;
use serde_json::json;

use crate::cli::{LedgerAddArgs, LedgerCommand};
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponseData {
    #[serde(flatten)]
    summary: PortfolioSummary,
    current_price: f64,
}

pub async fn run(
    command: &LedgerCommand,
    pipeline: &Pipeline,
    config: &LedgerConfig,
) -> Result<CommandResult, CliError> {
    let mut ledger = Ledger::open(FileStore::new(config.dir.as_path()), config.key.as_str())?;

    match command {
        LedgerCommand::Add(args) => add(&mut ledger, args, pipeline).await,
        LedgerCommand::Delete(args) => delete(&mut ledger, args.id),
        LedgerCommand::List => list(&ledger),
        LedgerCommand::Summary => {
            let snapshot = pipeline.run().await?;
            summary(&ledger, snapshot.current_price)
        }
    }
}

async fn add<S: LedgerStore>(
    ledger: &mut Ledger<S>,
    args: &LedgerAddArgs,
    pipeline: &Pipeline,
) -> Result<CommandResult, CliError> {
    // Reject malformed input before spending a network round trip.
    check_add_args(args)?;

    let snapshot = pipeline.run().await?;
    let entry = ledger.add(&args.date, args.amount, &snapshot)?;

    Ok(CommandResult::new(serde_json::to_value(entry)?).with_line(entry_line("added", &entry)))
}

fn check_add_args(args: &LedgerAddArgs) -> Result<(), CliError> {
    CalendarDate::parse(&args.date)?;
    validate_amount(args.amount)?;
    Ok(())
}

fn delete<S: LedgerStore>(ledger: &mut Ledger<S>, id: u64) -> Result<CommandResult, CliError> {
    let deleted = ledger.delete(id)?;
    let line = if deleted {
        format!("deleted #{id}")
    } else {
        format!("no entry #{id}; nothing changed")
    };

    Ok(CommandResult::new(json!({ "id": id, "deleted": deleted })).with_line(line))
}

fn list<S: LedgerStore>(ledger: &Ledger<S>) -> Result<CommandResult, CliError> {
    let entries = ledger.entries_newest_first();
    let data = serde_json::to_value(&entries)?;

    let lines = if entries.is_empty() {
        vec![String::from("no purchases recorded")]
    } else {
        entries.iter().map(|entry| entry_line("", entry)).collect()
    };

    Ok(CommandResult::new(data).with_lines(lines))
}

fn summary<S: LedgerStore>(
    ledger: &Ledger<S>,
    current_price: f64,
) -> Result<CommandResult, CliError> {
    let summary = ledger.summary(current_price);
    let data = serde_json::to_value(SummaryResponseData {
        summary,
        current_price,
    })?;

    Ok(CommandResult::new(data).with_lines([
        format!("entries       : {}", summary.entry_count),
        format!("total_invested: {:.2}", summary.total_invested),
        format!("holdings      : {:.5}", summary.total_quantity),
        format!("current_price : {current_price:.2}"),
        format!("current_value : {:.2}", summary.current_value),
        format!("roi           : {:.2}%", summary.roi_percent),
    ]))
}

fn entry_line(prefix: &str, entry: &PortfolioEntry) -> String {
    let line = format!(
        "#{}  {}  invested {:.2} @ {:.2}  qty {:.5}",
        entry.id,
        entry.date,
        entry.amount_invested,
        entry.price_at_purchase,
        entry.quantity_acquired
    );
    if prefix.is_empty() {
        line
    } else {
        format!("{prefix} {line}")
    }
}

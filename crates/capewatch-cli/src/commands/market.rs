use capewatch_core::{MarketSnapshot, Pipeline};

use crate::error::CliError;

use super::CommandResult;

/// Trailing history rows shown in table output.
const TABLE_TAIL: usize = 8;

pub async fn run(pipeline: &Pipeline) -> Result<CommandResult, CliError> {
    let snapshot = pipeline.run().await?;
    let data = serde_json::to_value(&snapshot)?;
    Ok(CommandResult::new(data).with_lines(table_lines(&snapshot)))
}

fn table_lines(snapshot: &MarketSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("records      : {}", snapshot.history.len()),
        format!("current_price: {:.2}", snapshot.current_price),
        format!("latest_cape  : {:.1}", snapshot.latest_metric),
        format!("signal       : {}", snapshot.signal().label()),
        String::new(),
        format!("{:<10}  {:>12}  {:>10}  {:>6}", "date", "btc", "nvda", "cape"),
    ];

    let skip = snapshot.history.len().saturating_sub(TABLE_TAIL);
    lines.extend(snapshot.history.iter().skip(skip).map(|record| {
        let secondary = record
            .secondary_value
            .map_or_else(|| String::from("-"), |value| format!("{value:.2}"));
        format!(
            "{}  {:>12.2}  {:>10}  {:>6.1}",
            record.date, record.primary_value, secondary, record.metric_value
        )
    }));
    lines
}

#[cfg(test)]
mod tests {
    use capewatch_core::{CalendarDate, MergedRecord};

    use super::*;

    #[test]
    fn table_shows_header_and_blank_for_missing_secondary() {
        let snapshot = MarketSnapshot {
            history: vec![MergedRecord {
                date: CalendarDate::parse("2024-01-01").expect("valid"),
                primary_value: 42_283.58,
                secondary_value: None,
                metric_value: 31.87,
            }],
            current_price: 42_283.58,
            latest_metric: 31.87,
        };

        let lines = table_lines(&snapshot);
        assert_eq!(lines[2], "latest_cape  : 31.9");
        assert_eq!(lines[3], "signal       : HOLD (neutral)");
        assert!(lines[6].starts_with("2024-01-01"));
        assert!(lines[6].contains("42283.58"));
        assert!(lines[6].contains(" - "));
    }
}

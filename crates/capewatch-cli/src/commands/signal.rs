use capewatch_core::{Pipeline, Signal};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignalResponseData {
    signal: Signal,
    label: &'static str,
    latest_cape: f64,
    current_price: f64,
}

pub async fn run(pipeline: &Pipeline) -> Result<CommandResult, CliError> {
    let snapshot = pipeline.run().await?;
    let signal = snapshot.signal();

    let data = serde_json::to_value(SignalResponseData {
        signal,
        label: signal.label(),
        latest_cape: snapshot.latest_metric,
        current_price: snapshot.current_price,
    })?;

    Ok(CommandResult::new(data)
        .with_line(format!("signal       : {}", signal.label()))
        .with_line(format!("latest_cape  : {:.1}", snapshot.latest_metric))
        .with_line(format!("current_price: {:.2}", snapshot.current_price)))
}

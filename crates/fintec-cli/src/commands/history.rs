use std::sync::Arc;

use fintec_core::{RateHistory, RateServices, RateSource};
use serde_json::json;

use crate::cli::{HistoryArgs, SourceArgs};
use crate::error::CliError;

use super::CommandResult;

fn history_for(services: &RateServices, source: RateSource) -> Result<&Arc<RateHistory>, CliError> {
    services.history(source).ok_or_else(|| {
        CliError::Command(format!(
            "{source} rate history is unavailable; check FINTEC_HOME"
        ))
    })
}

pub async fn run(args: &HistoryArgs, services: &RateServices) -> Result<CommandResult, CliError> {
    let history = history_for(services, args.source)?;
    let records = history.get_historical_rates(args.days).await?;

    let mut result = CommandResult::ok(json!({
        "source": args.source,
        "days": args.days,
        "records": records,
    }));
    if records.is_empty() {
        result = result.with_warning(format!(
            "no {} rates stored in the last {} days",
            args.source, args.days
        ));
    }
    Ok(result)
}

pub async fn trends(args: &SourceArgs, services: &RateServices) -> Result<CommandResult, CliError> {
    let history = history_for(services, args.source)?;
    let daily = history.day_over_day_trends()?;
    let periods = match args.source {
        RateSource::Bcv => services.bcv.trends().await,
        RateSource::Binance => services.binance.trends().await,
    };

    let mut result = CommandResult::ok(json!({
        "source": args.source,
        "daily": daily,
        "periods": periods,
    }));
    if daily.is_none() {
        result = result.with_warning("day-over-day trend needs rates for today and yesterday");
    }
    Ok(result)
}

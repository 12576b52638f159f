use fintec_core::{
    calculate_average_rate_difference, calculate_eur_usd_rate_difference,
    format_percentage_difference, RateServices, RateSource,
};
use serde_json::json;

use crate::error::CliError;

use super::{fallback_warning, CommandResult};

pub async fn run(services: &RateServices) -> Result<CommandResult, CliError> {
    let (bcv, binance) = tokio::join!(services.bcv.fetch_rates(), services.binance.fetch_rates());
    let (sell, buy) = (binance.sell_rate.avg, binance.buy_rate.avg);

    let usd = calculate_average_rate_difference(bcv.usd, sell, buy)?;
    let eur = bcv
        .eur
        .map(|eur| calculate_eur_usd_rate_difference(eur, sell, buy))
        .transpose()?;

    let data = json!({
        "usd": usd,
        "usdBadge": format_percentage_difference(usd.percentage_difference, usd.is_bcv_higher),
        "eur": eur,
        "bcv": bcv,
        "binance": binance,
    });

    let warnings = [
        fallback_warning(RateSource::Bcv, &bcv.provenance),
        fallback_warning(RateSource::Binance, &binance.provenance),
    ];
    Ok(CommandResult::ok(data).with_warnings(warnings.into_iter().flatten()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintec_core::RateServicesBuilder;

    #[tokio::test]
    async fn static_rates_compare_against_the_binance_midpoint() {
        let services = RateServicesBuilder::default()
            .with_offline_mode()
            .without_history()
            .build();

        let result = run(&services).await.expect("compare");

        assert!(result.data["usd"]["comparisonText"].is_string());
        assert!(result.data["eur"].is_object());
        assert_eq!(result.warnings.len(), 2);
    }
}

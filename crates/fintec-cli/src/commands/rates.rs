use fintec_core::{FallbackReason, RateServices, RateSource, STATIC_RATES_AS_OF};

use crate::cli::SourceArgs;
use crate::error::CliError;

use super::{fallback_warning, CommandResult};

pub async fn run(args: &SourceArgs, services: &RateServices) -> Result<CommandResult, CliError> {
    let (data, provenance) = match args.source {
        RateSource::Bcv => {
            let rates = services.bcv.fetch_rates().await;
            (serde_json::to_value(&rates)?, rates.provenance)
        }
        RateSource::Binance => {
            let rates = services.binance.fetch_rates().await;
            (serde_json::to_value(&rates)?, rates.provenance)
        }
    };

    let mut result = CommandResult::ok(data);
    if let Some(warning) = fallback_warning(args.source, &provenance) {
        result = result.with_warning(warning);
    }
    if provenance.fallback_reason == Some(FallbackReason::Static) {
        result = result.with_warning(format!("static rates are as of {STATIC_RATES_AS_OF}"));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintec_core::RateServicesBuilder;

    #[tokio::test]
    async fn offline_rates_fall_back_to_static_values_with_warnings() {
        let services = RateServicesBuilder::default()
            .with_offline_mode()
            .without_history()
            .build();

        let result = run(
            &SourceArgs {
                source: RateSource::Bcv,
            },
            &services,
        )
        .await
        .expect("rates never fail");

        assert_eq!(result.data["usd"], 57.5);
        assert_eq!(result.data["fallbackReason"], "static");
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[1].contains(STATIC_RATES_AS_OF));
    }
}

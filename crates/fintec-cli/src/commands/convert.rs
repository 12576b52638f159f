use fintec_core::{validate_code, RateServices};
use serde_json::json;

use crate::cli::ConvertArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &ConvertArgs, services: &RateServices) -> Result<CommandResult, CliError> {
    let from = validate_code(&args.from)?;
    let to = validate_code(&args.to)?;

    let rates = services.converter.fetch_exchange_rates().await;
    let converted = services
        .converter
        .convert_currency(args.amount, &from, &to)
        .await?;

    let mut result = CommandResult::ok(json!({
        "amount": args.amount,
        "from": from,
        "to": to,
        "result": converted,
        "rates": rates,
    }));
    if let Some(bcv) = services.bcv.cached_rates().await {
        if bcv.provenance.is_fallback() {
            result = result.with_warning(format!(
                "conversion uses fallback BCV rates from {}",
                bcv.provenance.source
            ));
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintec_core::RateServicesBuilder;

    fn offline() -> RateServices {
        RateServicesBuilder::default()
            .with_offline_mode()
            .without_history()
            .build()
    }

    #[tokio::test]
    async fn dollars_convert_to_bolivars_at_the_bcv_rate() {
        let args = ConvertArgs {
            amount: 100.0,
            from: String::from("usd"),
            to: String::from("VES"),
        };

        let result = run(&args, &offline()).await.expect("convert");

        assert_eq!(result.data["from"], "USD");
        assert_eq!(result.data["result"], 5_750.0);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn unregistered_currencies_are_rejected() {
        let args = ConvertArgs {
            amount: 100.0,
            from: String::from("USD"),
            to: String::from("JPY"),
        };

        let error = run(&args, &offline()).await.err().expect("no JPY rate");

        assert!(matches!(error, CliError::Conversion(_)));
    }
}

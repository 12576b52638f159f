use fintec_core::{
    requires_bcv_validation, validate_code, validate_ves_amount, FormatOptions, Money,
    RateServices, VesFormatOptions, VesFormatter,
};
use serde_json::json;

use crate::cli::FormatArgs;
use crate::error::CliError;

use super::CommandResult;

/// `services` is only consulted for the VES dollar annotation.
pub async fn run(
    args: &FormatArgs,
    services: Option<&RateServices>,
) -> Result<CommandResult, CliError> {
    let code = validate_code(&args.code)?;
    let money = Money::from_minor(args.amount_minor, &code);
    let mut warnings = Vec::new();

    let formatted = if requires_bcv_validation(&code) {
        if !validate_ves_amount(args.amount_minor) {
            warnings.push(String::from(
                "bolívar amounts are expected between 0.01 and 100,000,000",
            ));
        }
        let mut formatter = VesFormatter::new();
        if let Some(services) = services {
            formatter.set_bcv_rates(services.bcv.fetch_rates().await);
        }
        let mut options = VesFormatOptions {
            show_usd_equivalent: args.usd_equivalent,
            ..VesFormatOptions::default()
        };
        if let Some(locale) = &args.locale {
            options.locale = locale.clone();
        }
        formatter.format_ves(args.amount_minor, &options)
    } else {
        if args.usd_equivalent {
            warnings.push(String::from("--usd-equivalent only applies to VES amounts"));
        }
        let mut options = FormatOptions::default().with_code(args.code_suffix);
        if let Some(locale) = &args.locale {
            options = options.with_locale(locale.as_str());
        }
        money.format(&options)
    };

    Ok(CommandResult::ok(json!({
        "formatted": formatted,
        "money": money,
        "majorAmount": money.major_amount(),
    }))
    .with_warnings(warnings))
}

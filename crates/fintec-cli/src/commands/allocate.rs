use fintec_core::{validate_code, FormatOptions, Money};
use serde_json::json;

use crate::cli::AllocateArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &AllocateArgs) -> Result<CommandResult, CliError> {
    let code = validate_code(&args.code)?;
    let total = Money::from_minor(args.amount_minor, &code);
    let parts = total.allocate(&args.ratios)?;

    let options = FormatOptions::default();
    let rendered: Vec<_> = parts
        .iter()
        .zip(&args.ratios)
        .map(|(part, ratio)| {
            json!({
                "ratio": ratio,
                "money": part,
                "formatted": part.format(&options),
            })
        })
        .collect();

    Ok(CommandResult::ok(json!({
        "total": total,
        "parts": rendered,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_cents_go_to_the_first_parts() {
        let args = AllocateArgs {
            amount_minor: 10_000,
            code: String::from("USD"),
            ratios: vec![1.0, 1.0, 1.0],
        };

        let result = run(&args).expect("allocate");
        let minors: Vec<i64> = (0..3)
            .map(|index| {
                result.data["parts"][index]["money"]["amountMinor"]
                    .as_i64()
                    .expect("minor units")
            })
            .collect();

        assert_eq!(minors, vec![3334, 3333, 3333]);
    }

    #[test]
    fn zero_ratios_are_rejected() {
        let args = AllocateArgs {
            amount_minor: 500,
            code: String::from("EUR"),
            ratios: vec![0.0, 0.0],
        };

        let error = run(&args).err().expect("zero total");

        assert!(matches!(error, CliError::Money(_)));
    }
}

use fintec_assistant::{
    confirmation_message, detect_correction, missing_parameters_message, IntentionDetector,
    ReplyClass,
};
use serde_json::json;

use crate::cli::MessageArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &MessageArgs, detector: &IntentionDetector) -> Result<CommandResult, CliError> {
    let intention = detector.detect(&args.message);
    let correction = detect_correction(&args.message);

    let prompt = if !intention.missing_parameters.is_empty() {
        Some(missing_parameters_message(
            intention.action_type,
            &intention.missing_parameters,
        ))
    } else if intention.requires_confirmation {
        Some(confirmation_message(
            intention.action_type,
            &intention.parameters,
        ))
    } else {
        None
    };
    let validation = intention.is_action().then(|| {
        detector
            .confirmer()
            .validate_action_parameters(intention.action_type, &intention.parameters)
    });

    let mut data = json!({
        "intention": intention,
        "prompt": prompt,
        "validation": validation,
    });
    if correction.is_correction {
        data["correction"] = serde_json::to_value(&correction)?;
    }
    Ok(CommandResult::ok(data))
}

pub fn reply(args: &MessageArgs, detector: &IntentionDetector) -> Result<CommandResult, CliError> {
    let class = detector.confirmer().classify_response(&args.message);
    Ok(CommandResult::ok(json!({
        "reply": args.message,
        "classification": class,
        "proceed": class == ReplyClass::Confirmed,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> MessageArgs {
        MessageArgs {
            message: text.to_owned(),
        }
    }

    #[test]
    fn transfers_prompt_for_missing_accounts() {
        let result = run(&message("transferir 200 euros"), &IntentionDetector::default())
            .expect("intent");

        assert_eq!(result.data["intention"]["actionType"], "CREATE_TRANSFER");
        assert_eq!(result.data["intention"]["requiresConfirmation"], true);
        assert_eq!(
            result.data["prompt"],
            "Para realizar esta transferencia, necesito que especifiques: cuenta de origen, cuenta de destino."
        );
        assert_eq!(result.data["validation"]["valid"], false);
        assert!(result.data.get("correction").is_none());
    }

    #[test]
    fn queries_have_no_prompt_or_validation() {
        let result = run(&message("cuánto tengo en mi cuenta"), &IntentionDetector::default())
            .expect("intent");

        assert_eq!(result.data["intention"]["type"], "QUERY");
        assert!(result.data["prompt"].is_null());
        assert!(result.data["validation"].is_null());
    }

    #[test]
    fn corrections_are_reported_alongside_the_intention() {
        let result = run(&message("pero te pedí solo 5"), &IntentionDetector::default())
            .expect("intent");

        assert_eq!(result.data["correction"]["correctedValue"], 5);
    }

    #[test]
    fn replies_are_classified() {
        let detector = IntentionDetector::default();

        let yes = reply(&message("sí, adelante"), &detector).expect("reply");
        let no = reply(&message("mejor no"), &detector).expect("reply");
        let unsure = reply(&message("tal vez"), &detector).expect("reply");

        assert_eq!(yes.data["classification"], "confirmed");
        assert_eq!(yes.data["proceed"], true);
        assert_eq!(no.data["classification"], "rejected");
        assert_eq!(unsure.data["classification"], "ambiguous");
    }
}

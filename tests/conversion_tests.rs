//! Whole-conversion round-trip and facade tests

use anyhow::Result;
use qti_learnosity_sdk::{
    ChoiceOption, ConvertError, Converter, Item, McqQuestion, Question, QuestionData, ScoringType,
    Validation,
};

fn option(label: &str, value: &str) -> ChoiceOption {
    ChoiceOption {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn mcq_item(reference: &str, validation: Validation) -> Item {
    let mut item = Item::new(reference);
    item.questions.push(Question::new(
        format!("{reference}_R1"),
        QuestionData::Mcq(McqQuestion {
            stimulus: "Pick one".to_string(),
            options: vec![option("Alpha", "A"), option("Beta", "B")],
            validation: Some(validation),
            ..Default::default()
        }),
    ));
    item
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_exact_match_score_survives_export_and_import() -> Result<()> {
        let item = mcq_item(
            "item-1",
            Validation::exact_match(2.5, serde_json::json!(["B"])),
        );
        let mut converter = Converter::new();

        let exported =
            converter.convert_learnosity_to_qti_item(&serde_json::to_value(&item)?)?;
        assert!(exported.messages.is_empty());

        let imported = converter.convert_qti_item_to_learnosity(&exported.xml)?;
        assert!(imported.errors.is_empty());

        let validation = imported.item.questions[0].validation().unwrap();
        assert_eq!(validation.scoring_type, ScoringType::ExactMatch);
        assert!((validation.valid_response.score - 2.5).abs() < 1e-6);
        assert_eq!(validation.valid_response.value, serde_json::json!(["B"]));
        Ok(())
    }

    #[test]
    fn test_unit_score_round_trips_through_template_form() -> Result<()> {
        let item = mcq_item(
            "item-2",
            Validation::exact_match(1.0, serde_json::json!(["A"])),
        );
        let mut converter = Converter::new();

        let exported =
            converter.convert_learnosity_to_qti_item(&serde_json::to_value(&item)?)?;
        assert!(exported.xml.contains("rptemplates/match_correct"));

        let imported = converter.convert_qti_item_to_learnosity(&exported.xml)?;
        let validation = imported.item.questions[0].validation().unwrap();
        assert!((validation.valid_response.score - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_partial_match_score_round_trips_through_mapping() -> Result<()> {
        let item = mcq_item(
            "item-3",
            Validation::partial_match(3.0, serde_json::json!(["A", "B"])),
        );
        let mut converter = Converter::new();

        let exported =
            converter.convert_learnosity_to_qti_item(&serde_json::to_value(&item)?)?;
        assert!(exported.xml.contains("rptemplates/map_response"));

        let imported = converter.convert_qti_item_to_learnosity(&exported.xml)?;
        let validation = imported.item.questions[0].validation().unwrap();
        assert_eq!(validation.scoring_type, ScoringType::PartialMatch);
        assert!((validation.valid_response.score - 3.0).abs() < 1e-6);
        assert_eq!(
            validation.valid_response.value,
            serde_json::json!(["A", "B"])
        );
        Ok(())
    }

    #[test]
    fn test_question_reference_is_stable_across_round_trip() -> Result<()> {
        let item = mcq_item(
            "item-4",
            Validation::exact_match(1.0, serde_json::json!(["A"])),
        );
        let mut converter = Converter::new();

        let exported =
            converter.convert_learnosity_to_qti_item(&serde_json::to_value(&item)?)?;
        let imported = converter.convert_qti_item_to_learnosity(&exported.xml)?;

        assert_eq!(imported.item.questions[0].reference, "item-4_R1");
        Ok(())
    }
}

mod facade_tests {
    use super::*;

    #[test]
    fn test_bare_question_data_is_wrapped_in_an_item() -> Result<()> {
        let json = serde_json::json!({
            "type": "mcq",
            "options": [{"label": "Alpha", "value": "A"}],
            "multiple_responses": false,
            "shuffle_options": false,
        });

        let mut converter = Converter::new();
        let result = converter.convert_learnosity_to_qti_item(&json)?;
        assert!(result.xml.contains("choiceInteraction"));
        assert!(result.xml.contains(r#"identifier="question""#));
        Ok(())
    }

    #[test]
    fn test_nbsp_is_rewritten_before_marshalling() -> Result<()> {
        let json = serde_json::json!({
            "reference": "q-1",
            "data": {"type": "longtextV2", "stimulus": "Essay&nbsp;time"},
        });

        let mut converter = Converter::new();
        let result = converter.convert_learnosity_to_qti_item(&json)?;
        assert!(result.xml.contains("Essay&#160;time"));
        assert!(!result.xml.contains("&nbsp;"));
        Ok(())
    }

    #[test]
    fn test_produced_xml_parses_back_cleanly() -> Result<()> {
        let item = mcq_item(
            "item-5",
            Validation::exact_match(1.0, serde_json::json!(["A"])),
        );
        let mut converter = Converter::new();

        converter.convert_learnosity_to_qti_item(&serde_json::to_value(&item)?)?;
        assert!(
            !converter
                .diagnostics()
                .messages()
                .iter()
                .any(|m| m.contains("does not parse back"))
        );
        Ok(())
    }

    #[test]
    fn test_unrecognizable_json_shape_is_a_mapping_error() {
        let mut converter = Converter::new();
        let err = converter
            .convert_learnosity_to_qti_item(&serde_json::json!({"foo": 1}))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Mapping(_)));
    }

    #[test]
    fn test_schema_failure_message_is_sanitized() {
        let mut converter = Converter::new();
        let err = converter
            .convert_qti_item_to_learnosity("<manifest>not an item</manifest>")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("could not be validated"));
        assert!(!message.contains("://"));
    }
}

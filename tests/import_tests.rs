//! QTI to Learnosity import tests

use qti_learnosity_sdk::{ConvertError, Converter, QuestionData, ScoringType};

mod template_import_tests {
    use super::*;

    const MATCH_CORRECT_ITEM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<assessmentItem xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1" identifier="item-1" title="Letters">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse>
      <value>B</value>
    </correctResponse>
  </responseDeclaration>
  <itemBody>
    <p>Pick one.</p>
    <choiceInteraction responseIdentifier="RESPONSE" maxChoices="1">
      <prompt>Which letter?</prompt>
      <simpleChoice identifier="A">Letter A</simpleChoice>
      <simpleChoice identifier="B">Letter B</simpleChoice>
    </choiceInteraction>
  </itemBody>
  <responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct"/>
</assessmentItem>"#;

    #[test]
    fn test_match_correct_choice_becomes_scored_mcq() {
        let mut converter = Converter::new();
        let result = converter
            .convert_qti_item_to_learnosity(MATCH_CORRECT_ITEM)
            .unwrap();

        assert!(result.errors.is_empty());
        assert_eq!(result.item.reference, "item-1");
        assert_eq!(result.item.questions.len(), 1);

        let question = &result.item.questions[0];
        assert_eq!(question.reference, "item-1_RESPONSE");
        let QuestionData::Mcq(mcq) = &question.data else {
            panic!("expected mcq, got {}", question.type_tag());
        };
        assert_eq!(mcq.stimulus, "Which letter?");
        assert_eq!(mcq.options.len(), 2);

        let validation = mcq.validation.as_ref().unwrap();
        assert_eq!(validation.scoring_type, ScoringType::ExactMatch);
        assert_eq!(validation.valid_response.score, 1.0);
        assert_eq!(validation.valid_response.value, serde_json::json!(["B"]));

        assert!(result.item.content.contains("question-item-1_RESPONSE"));
        assert!(!result.item.content.contains("{{interaction:"));
    }

    #[test]
    fn test_map_response_text_entry_keeps_entry_order_and_scores() {
        let xml = r#"<assessmentItem identifier="item-2" title="Capitals">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="string">
    <mapping defaultValue="0">
      <mapEntry mapKey="york" mappedValue="1" caseSensitive="false"/>
      <mapEntry mapKey="York" mappedValue="0.5" caseSensitive="true"/>
    </mapping>
  </responseDeclaration>
  <itemBody>
    <p>Capital: <textEntryInteraction responseIdentifier="RESPONSE" expectedLength="15"/></p>
  </itemBody>
  <responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/map_response"/>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();
        let QuestionData::ShortText(question) = &result.item.questions[0].data else {
            panic!("expected shorttext");
        };

        assert_eq!(question.max_length, Some(15));
        assert!(question.case_sensitive);

        let validation = question.validation.as_ref().unwrap();
        assert_eq!(validation.scoring_type, ScoringType::ExactMatch);
        assert_eq!(validation.valid_response.value, serde_json::json!("york"));
        assert_eq!(validation.valid_response.score, 1.0);
        assert_eq!(validation.alt_responses.len(), 1);
        assert_eq!(validation.alt_responses[0].score, 0.5);
    }

    #[test]
    fn test_missing_processing_falls_back_to_declared_correct_response() {
        let xml = r#"<assessmentItem identifier="item-3" title="Fallback">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse><value>A</value></correctResponse>
  </responseDeclaration>
  <itemBody>
    <choiceInteraction responseIdentifier="RESPONSE" maxChoices="1">
      <simpleChoice identifier="A">Yes</simpleChoice>
    </choiceInteraction>
  </itemBody>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();
        let validation = result.item.questions[0].validation().unwrap();
        assert_eq!(validation.valid_response.value, serde_json::json!(["A"]));
        assert!(!converter.diagnostics().is_empty());
    }
}

mod builtin_rules_tests {
    use super::*;

    #[test]
    fn test_custom_rule_tree_merges_branches_under_first_identifier() {
        let xml = r#"<assessmentItem identifier="item-4" title="Custom">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="string">
    <correctResponse><value>dog</value></correctResponse>
  </responseDeclaration>
  <itemBody>
    <p><textEntryInteraction responseIdentifier="RESPONSE"/></p>
  </itemBody>
  <responseProcessing>
    <responseCondition>
      <responseIf>
        <match><variable identifier="RESPONSE"/><correct identifier="RESPONSE"/></match>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">2</baseValue></setOutcomeValue>
      </responseIf>
      <responseElseIf>
        <equal toleranceMode="exact"><variable identifier="RESPONSE"/><baseValue baseType="string">cat</baseValue></equal>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">1</baseValue></setOutcomeValue>
      </responseElseIf>
      <responseElse>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">0</baseValue></setOutcomeValue>
      </responseElse>
    </responseCondition>
  </responseProcessing>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();
        let validation = result.item.questions[0].validation().unwrap();

        // The equal-branch literal leads, then the declared correct
        // response scored by the match branch.
        assert_eq!(validation.scoring_type, ScoringType::ExactMatch);
        assert_eq!(validation.valid_response.value, serde_json::json!("cat"));
        assert_eq!(validation.valid_response.score, 1.0);
        assert_eq!(validation.alt_responses.len(), 1);
        assert_eq!(validation.alt_responses[0].value, serde_json::json!("dog"));
        assert_eq!(validation.alt_responses[0].score, 2.0);
    }

    #[test]
    fn test_unattempted_only_tree_yields_no_validation() {
        let xml = r#"<assessmentItem identifier="item-5" title="Null only">
  <itemBody>
    <p><textEntryInteraction responseIdentifier="RESPONSE"/></p>
  </itemBody>
  <responseProcessing>
    <responseCondition>
      <responseIf>
        <isNull><variable identifier="RESPONSE"/></isNull>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">0</baseValue></setOutcomeValue>
      </responseIf>
    </responseCondition>
  </responseProcessing>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.item.questions[0].validation().is_none());
    }

    #[test]
    fn test_unsupported_expressions_are_logged_not_fatal() {
        let xml = r#"<assessmentItem identifier="item-6" title="Weird">
  <itemBody>
    <p><textEntryInteraction responseIdentifier="RESPONSE"/></p>
  </itemBody>
  <responseProcessing>
    <responseCondition>
      <responseIf>
        <stringMatch substring="false"><variable identifier="RESPONSE"/></stringMatch>
        <setOutcomeValue identifier="SCORE"><baseValue baseType="float">1</baseValue></setOutcomeValue>
      </responseIf>
    </responseCondition>
  </responseProcessing>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.item.questions[0].validation().is_none());
        assert!(
            converter
                .diagnostics()
                .messages()
                .iter()
                .any(|m| m.contains("stringMatch"))
        );
    }
}

mod degradation_tests {
    use super::*;

    #[test]
    fn test_unsupported_interaction_yields_partial_item() {
        let xml = r#"<assessmentItem identifier="item-7" title="Mixed">
  <responseDeclaration identifier="R1" cardinality="single" baseType="identifier">
    <correctResponse><value>A</value></correctResponse>
  </responseDeclaration>
  <itemBody>
    <choiceInteraction responseIdentifier="R1" maxChoices="1">
      <simpleChoice identifier="A">Yes</simpleChoice>
    </choiceInteraction>
    <drawingInteraction responseIdentifier="R2">
      <object data="canvas.png" type="image/png"/>
    </drawingInteraction>
  </itemBody>
  <responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct"/>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();

        assert_eq!(result.item.questions.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].to_string().contains("drawingInteraction"));
        assert!(!result.item.content.contains("{{interaction:R2}}"));
    }

    #[test]
    fn test_class_hint_overrides_element_guess() {
        let xml = r#"<assessmentItem identifier="item-8" title="Hinted">
  <itemBody>
    <choiceInteraction class="orderlist" responseIdentifier="R1">
      <simpleChoice identifier="A">First</simpleChoice>
      <simpleChoice identifier="B">Second</simpleChoice>
    </choiceInteraction>
  </itemBody>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();
        assert_eq!(result.item.questions[0].type_tag(), "orderlist");
    }

    #[test]
    fn test_non_assessment_item_document_is_rejected_wholesale() {
        let mut converter = Converter::new();
        let err = converter
            .convert_qti_item_to_learnosity("<questestinterop/>")
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidQti(_)));
    }

    #[test]
    fn test_item_json_excludes_question_bodies() {
        let xml = r#"<assessmentItem identifier="item-9" title="Shape">
  <itemBody>
    <p><extendedTextInteraction responseIdentifier="R1"/></p>
  </itemBody>
</assessmentItem>"#;

        let mut converter = Converter::new();
        let result = converter.convert_qti_item_to_learnosity(xml).unwrap();

        let item_json = result.item_json();
        assert_eq!(item_json["questionReferences"][0], "item-9_R1");
        assert!(item_json.get("questions").is_none());

        let questions = result.questions_json();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0]["data"]["type"], "longtextV2");
    }
}

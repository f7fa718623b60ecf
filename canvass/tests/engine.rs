//! Integration tests for the canvass engine: declarations, validation,
//! evaluation, and rename propagation working against one tree.

use canvass::{
    ChoiceOption, ComponentKey, Evaluator, Expression, FunctionName, GroupItem, ItemKey, ItemKind,
    ItemResponse, QuestionItem, ResponseGroup, Survey, SurveyContext, SurveyItem, SurveyResponses,
    TemplateValue, Validation, ValueType, collect_usages, find_invalid_reference_usages,
    rename_component, rename_item, survey_value_references,
};

/// A question with one plain option and one text-input option under a
/// single choice group "scg".
fn choice_question(full_key: &str) -> SurveyItem {
    let key = ItemKey::from_full_key(full_key);
    let group = ResponseGroup::new(ComponentKey::from_full_key("scg", key.clone()))
        .with_option(ChoiceOption::new(ComponentKey::from_full_key(
            "scg.yes",
            key.clone(),
        )))
        .with_option(ChoiceOption::with_input(
            ComponentKey::from_full_key("scg.other", key.clone()),
            ValueType::String,
        ));
    SurveyItem::new(
        key,
        ItemKind::Question(QuestionItem::new(ValueType::String).with_response_group(group)),
    )
}

fn intake_survey() -> Survey {
    let mut survey = Survey::new();
    survey
        .insert_item(SurveyItem::new(
            "intake",
            ItemKind::Group(GroupItem::with_items(vec![
                "intake.consent".to_owned(),
                "intake.age".to_owned(),
                "intake.symptoms".to_owned(),
            ])),
        ))
        .unwrap();
    survey
        .insert_item(SurveyItem::question("intake.consent", ValueType::Boolean))
        .unwrap();
    survey
        .insert_item(
            SurveyItem::question("intake.age", ValueType::Number).with_display_condition(
                Expression::function(
                    FunctionName::Eq,
                    vec![
                        Expression::response_variable("intake.consent...get"),
                        Expression::constant(true),
                    ],
                ),
            ),
        )
        .unwrap();
    survey
        .insert_item(
            choice_question("intake.symptoms")
                .with_display_condition(Expression::function(
                    FunctionName::InRange,
                    vec![
                        Expression::response_variable("intake.age...get"),
                        Expression::constant(0),
                        Expression::constant(120),
                        Expression::constant(true),
                    ],
                ))
                .with_validation(Validation::new(
                    "v1",
                    Expression::response_variable("intake.symptoms...isDefined"),
                ))
                .with_template_value(TemplateValue::new(
                    "scg.other",
                    Expression::response_variable("intake.age...get"),
                )),
        )
        .unwrap();
    survey
}

#[test]
fn declarations_cover_items_and_input_options() {
    let survey = intake_survey();
    let declared = survey_value_references(&survey);

    assert_eq!(declared.len(), 8);
    assert_eq!(
        declared.get("intake.consent...get"),
        Some(&ValueType::Boolean)
    );
    assert_eq!(declared.get("intake.age...get"), Some(&ValueType::Number));
    assert_eq!(
        declared.get("intake.symptoms...get...scg.other"),
        Some(&ValueType::String)
    );
    assert_eq!(
        declared.get("intake.symptoms...isDefined...scg.other"),
        Some(&ValueType::Boolean)
    );
    // The plain option contributes nothing beyond the question's own pair.
    assert!(!declared.contains_key("intake.symptoms...get...scg.yes"));
}

#[test]
fn used_references_validate_against_declarations() {
    let mut survey = intake_survey();
    assert!(find_invalid_reference_usages(&survey).is_empty());

    survey
        .insert_item(
            SurveyItem::question("followup", ValueType::String).with_display_condition(
                Expression::response_variable("intake.missing...get"),
            ),
        )
        .unwrap();

    let invalid = find_invalid_reference_usages(&survey);
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].item_full_key, "followup");
    assert_eq!(
        invalid[0].value_reference.to_string(),
        "intake.missing...get"
    );
}

#[test]
fn conditions_evaluate_against_responses() {
    let survey = intake_survey();
    let context = SurveyContext::default();

    let mut responses = SurveyResponses::new();
    responses.insert_value("intake.consent", true);
    responses.insert_value("intake.age", 34);
    let evaluator = Evaluator::new(&responses, &context);

    let age_condition = survey
        .item("intake.age")
        .unwrap()
        .cloned_display_condition()
        .unwrap();
    assert!(evaluator.evaluate_condition(&age_condition).unwrap());

    let symptoms_condition = survey
        .item("intake.symptoms")
        .unwrap()
        .cloned_display_condition()
        .unwrap();
    assert!(evaluator.evaluate_condition(&symptoms_condition).unwrap());

    // Without a recorded age, in_range sees undefined and is false.
    let mut partial = SurveyResponses::new();
    partial.insert_value("intake.consent", true);
    let evaluator = Evaluator::new(&partial, &context);
    assert!(!evaluator.evaluate_condition(&symptoms_condition).unwrap());
}

#[test]
fn slot_scoped_references_read_option_inputs() {
    let survey = intake_survey();
    let context = SurveyContext::default();

    let mut responses = SurveyResponses::new();
    responses.insert(
        "intake.symptoms",
        ItemResponse::new("other").with_slot("scg.other", "sore throat"),
    );
    let evaluator = Evaluator::new(&responses, &context);

    let declared = survey_value_references(&survey);
    assert!(declared.contains_key("intake.symptoms...get...scg.other"));

    let slot_read = Expression::response_variable("intake.symptoms...get...scg.other");
    assert_eq!(
        evaluator.evaluate(&slot_read).unwrap().unwrap().as_str(),
        Some("sore throat")
    );
}

#[test]
fn group_rename_updates_keys_children_and_references_in_one_step() {
    let mut survey = intake_survey();
    let summary = rename_item(&mut survey, "intake", "screening").unwrap();

    // The group and its three children were renamed together.
    assert_eq!(summary.pairs.len(), 4);
    for key in [
        "screening",
        "screening.consent",
        "screening.age",
        "screening.symptoms",
    ] {
        assert!(survey.contains(key), "missing {key}");
    }

    let ItemKind::Group(group) = survey.item("screening").unwrap().kind() else {
        panic!("expected a group");
    };
    assert_eq!(
        group.items,
        vec![
            "screening.consent".to_owned(),
            "screening.age".to_owned(),
            "screening.symptoms".to_owned(),
        ]
    );

    // Every expression in the tree now points at the new keys, so the
    // declared/used cross-check still comes up clean.
    assert!(find_invalid_reference_usages(&survey).is_empty());

    let usages = collect_usages(&survey, None);
    assert!(
        usages
            .iter()
            .all(|usage| !usage.value_reference.to_string().starts_with("intake"))
    );

    // Component keys beneath the renamed items were re-anchored.
    let ItemKind::Question(symptoms) = survey.item("screening.symptoms").unwrap().kind() else {
        panic!("expected a question");
    };
    let response_group = symptoms.response_group.as_ref().unwrap();
    assert_eq!(
        response_group.key.parent_item_key().full_key(),
        "screening.symptoms"
    );
}

#[test]
fn scoped_usage_collection() {
    let survey = intake_survey();
    let scope = ItemKey::from_full_key("intake.symptoms");
    let usages = collect_usages(&survey, Some(&scope));
    assert_eq!(usages.len(), 3);
    assert!(usages.iter().all(|usage| usage.item_full_key == "intake.symptoms"));
}

#[test]
fn component_rename_keeps_the_tree_consistent() {
    let mut survey = intake_survey();
    survey
        .insert_item(
            SurveyItem::question("followup", ValueType::String).with_display_condition(
                Expression::response_variable("intake.symptoms...isDefined...scg.other"),
            ),
        )
        .unwrap();
    assert!(find_invalid_reference_usages(&survey).is_empty());

    let rewritten =
        rename_component(&mut survey, "intake.symptoms", "scg.other", "scg.free").unwrap();
    assert_eq!(rewritten, 1);

    assert_eq!(
        survey
            .item("followup")
            .unwrap()
            .cloned_display_condition()
            .unwrap()
            .response_variable_refs()[0]
            .to_string(),
        "intake.symptoms...isDefined...scg.free"
    );
    assert!(find_invalid_reference_usages(&survey).is_empty());
}

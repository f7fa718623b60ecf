use canvass_types::{Expression, ItemKey, Survey, ValueReference};

use crate::declarations::survey_value_references;

/// The kind of site a value reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageType {
    DisplayConditions,
    DisabledConditions,
    Validations,
    TemplateValues,
}

/// One occurrence of a value reference inside an item's expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    /// Full key of the item the expression lives on.
    pub item_full_key: String,

    /// Full key of the component the expression is attached to, for
    /// component conditions and template values.
    pub component_full_key: Option<String>,

    /// The kind of site the reference was found in.
    pub usage_type: UsageType,

    /// The reference that is read.
    pub value_reference: ValueReference,
}

/// Collect every value reference used anywhere in the tree, tagged with
/// its originating site, in arena order.
///
/// With a `scope`, only the item whose key equals the scope key and its
/// segment-exact descendants are visited.
pub fn collect_usages(survey: &Survey, scope: Option<&ItemKey>) -> Vec<Usage> {
    let mut usages = Vec::new();
    for item in survey.items() {
        if let Some(scope) = scope
            && !scope.is_prefix_of(item.key())
        {
            continue;
        }
        let item_full_key = item.key().full_key();
        if let Some(root) = item.display_conditions().root() {
            push_expression_usages(
                &mut usages,
                item_full_key,
                None,
                UsageType::DisplayConditions,
                root,
            );
        }
        for (component, expression) in item.display_conditions().components() {
            push_expression_usages(
                &mut usages,
                item_full_key,
                Some(component),
                UsageType::DisplayConditions,
                expression,
            );
        }
        for (component, expression) in item.disabled_conditions().components() {
            push_expression_usages(
                &mut usages,
                item_full_key,
                Some(component),
                UsageType::DisabledConditions,
                expression,
            );
        }
        for validation in item.validations() {
            push_expression_usages(
                &mut usages,
                item_full_key,
                None,
                UsageType::Validations,
                &validation.rule,
            );
        }
        for template in item.template_values() {
            push_expression_usages(
                &mut usages,
                item_full_key,
                Some(&template.key),
                UsageType::TemplateValues,
                &template.expression,
            );
        }
    }
    usages
}

fn push_expression_usages(
    usages: &mut Vec<Usage>,
    item_full_key: &str,
    component_full_key: Option<&str>,
    usage_type: UsageType,
    expression: &Expression,
) {
    for value_reference in expression.response_variable_refs() {
        usages.push(Usage {
            item_full_key: item_full_key.to_owned(),
            component_full_key: component_full_key.map(str::to_owned),
            usage_type,
            value_reference,
        });
    }
}

/// Usages whose reference is not declared by any component in the tree.
///
/// These are lint findings, not failures: a dangling reference simply
/// evaluates to undefined.
pub fn find_invalid_reference_usages(survey: &Survey) -> Vec<Usage> {
    let declared = survey_value_references(survey);
    collect_usages(survey, None)
        .into_iter()
        .filter(|usage| !declared.contains_key(&usage.value_reference.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvass_types::{FunctionName, SurveyItem, TemplateValue, Validation, ValueType};

    fn survey_with_usages() -> Survey {
        let mut survey = Survey::new();
        survey
            .insert_item(SurveyItem::question("q1", ValueType::String))
            .unwrap();
        survey
            .insert_item(
                SurveyItem::question("q2", ValueType::Number)
                    .with_display_condition(Expression::response_variable("q1...isDefined"))
                    .with_validation(Validation::new(
                        "v1",
                        Expression::function(
                            FunctionName::And,
                            vec![
                                Expression::response_variable("q1...get"),
                                Expression::response_variable("q2...get"),
                            ],
                        ),
                    ))
                    .with_template_value(TemplateValue::new(
                        "title",
                        Expression::response_variable("q1...get"),
                    )),
            )
            .unwrap();
        survey
    }

    #[test]
    fn collects_every_site_with_tags() {
        let survey = survey_with_usages();
        let usages = collect_usages(&survey, None);
        assert_eq!(usages.len(), 4);

        assert_eq!(usages[0].usage_type, UsageType::DisplayConditions);
        assert_eq!(usages[0].item_full_key, "q2");
        assert_eq!(usages[0].value_reference.to_string(), "q1...isDefined");

        assert_eq!(usages[1].usage_type, UsageType::Validations);
        assert_eq!(usages[2].usage_type, UsageType::Validations);

        assert_eq!(usages[3].usage_type, UsageType::TemplateValues);
        assert_eq!(usages[3].component_full_key.as_deref(), Some("title"));
    }

    #[test]
    fn scoped_collection_visits_only_the_subtree() {
        let mut survey = Survey::new();
        survey
            .insert_item(
                SurveyItem::question("g.q1", ValueType::String)
                    .with_display_condition(Expression::response_variable("other...get")),
            )
            .unwrap();
        survey
            .insert_item(
                SurveyItem::question("g10.q1", ValueType::String)
                    .with_display_condition(Expression::response_variable("other...get")),
            )
            .unwrap();

        let scope = ItemKey::from_full_key("g");
        let usages = collect_usages(&survey, Some(&scope));
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].item_full_key, "g.q1");
    }

    #[test]
    fn invalid_references_are_reported() {
        let mut survey = survey_with_usages();
        survey
            .insert_item(
                SurveyItem::question("q3", ValueType::String).with_validation(Validation::new(
                    "v1",
                    Expression::response_variable("missing...get"),
                )),
            )
            .unwrap();

        let invalid = find_invalid_reference_usages(&survey);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].item_full_key, "q3");
        assert_eq!(invalid[0].value_reference.to_string(), "missing...get");
    }

    #[test]
    fn invalid_reference_check_is_idempotent() {
        let survey = survey_with_usages();
        let first = find_invalid_reference_usages(&survey);
        let second = find_invalid_reference_usages(&survey);
        assert_eq!(first, second);
        assert!(first.is_empty());
    }
}

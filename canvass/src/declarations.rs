use indexmap::IndexMap;

use canvass_types::{ItemKind, RefMethod, Survey, SurveyItem, ValueReference, ValueType};

/// The value references one item is capable of producing, keyed by
/// canonical reference string and tagged with the expected value type.
///
/// Declarations are a pure function of current tree shape: recomputed on
/// every call, never cached, so they can never go stale across edits.
///
/// A question declares its own unscoped `get`/`isDefined` pair. A plain
/// choice option contributes nothing (its existence is implicit in the
/// parent's pair); an option carrying a nested input additionally
/// declares a `get`/`isDefined` pair scoped to the option's component
/// key. Groups and display items declare nothing.
pub fn response_value_references(item: &SurveyItem) -> IndexMap<String, ValueType> {
    let mut references = IndexMap::new();
    let ItemKind::Question(question) = item.kind() else {
        return references;
    };
    let item_key = item.key();
    references.insert(
        ValueReference::from_parts(item_key.clone(), RefMethod::Get, None).to_string(),
        question.value_type,
    );
    references.insert(
        ValueReference::from_parts(item_key.clone(), RefMethod::IsDefined, None).to_string(),
        ValueType::Boolean,
    );
    if let Some(group) = &question.response_group {
        for option in &group.options {
            let Some(input) = &option.input else {
                continue;
            };
            references.insert(
                ValueReference::from_parts(
                    item_key.clone(),
                    RefMethod::Get,
                    Some(option.key.clone()),
                )
                .to_string(),
                input.value_type,
            );
            references.insert(
                ValueReference::from_parts(
                    item_key.clone(),
                    RefMethod::IsDefined,
                    Some(option.key.clone()),
                )
                .to_string(),
                ValueType::Boolean,
            );
        }
    }
    references
}

/// The union of every item's declared references, in tree order.
/// Reference strings are unique per component by construction, so the
/// union cannot collide.
pub fn survey_value_references(survey: &Survey) -> IndexMap<String, ValueType> {
    let mut references = IndexMap::new();
    for item in survey.items() {
        references.extend(response_value_references(item));
    }
    references
}

/// Declared references filtered by expected value type.
pub fn survey_value_references_of_type(
    survey: &Survey,
    value_type: ValueType,
) -> IndexMap<String, ValueType> {
    survey_value_references(survey)
        .into_iter()
        .filter(|(_, declared)| *declared == value_type)
        .collect()
}

use std::collections::HashSet;
use std::mem;

use indexmap::IndexMap;

use canvass_types::{ComponentKey, ItemKey, ItemKind, Survey, SurveyError};

/// Summary of an item rename: every (old, new) key pair that was applied
/// (the item itself plus, for groups, each descendant) and the number of
/// value references rewritten across the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamedItem {
    pub pairs: Vec<(ItemKey, ItemKey)>,
    pub rewritten_references: usize,
}

/// Rename an item, propagating the change through the whole tree in one
/// logical step:
///
/// 1. the item's own key (and, for groups, every descendant key, with
///    the new prefix spliced onto unchanged local segments),
/// 2. the item anchor of every component key beneath the renamed items,
/// 3. group child-key lists anywhere in the tree,
/// 4. every value reference in every expression in the tree that points
///    at one of the renamed items — matched on parsed key equality,
///    never on raw string prefixes.
///
/// Fails with [`SurveyError::ItemNotFound`] when `old_full_key` does not
/// exist and [`SurveyError::DuplicateKey`] when any resulting key is
/// already taken. Renaming a key to itself is a no-op.
pub fn rename_item(
    survey: &mut Survey,
    old_full_key: &str,
    new_full_key: &str,
) -> Result<RenamedItem, SurveyError> {
    if !survey.contains(old_full_key) {
        return Err(SurveyError::ItemNotFound(old_full_key.to_owned()));
    }
    if old_full_key == new_full_key {
        return Ok(RenamedItem {
            pairs: Vec::new(),
            rewritten_references: 0,
        });
    }
    let old_key = ItemKey::from_full_key(old_full_key);
    let new_key = ItemKey::from_full_key(new_full_key);

    let mut pairs = Vec::new();
    for item in survey.items() {
        if let Some(renamed) = item.key().splice_prefix(&old_key, &new_key) {
            pairs.push((item.key().clone(), renamed));
        }
    }

    let renamed_old_keys: HashSet<&str> = pairs.iter().map(|(old, _)| old.full_key()).collect();
    for (_, renamed) in &pairs {
        if survey.contains(renamed.full_key()) && !renamed_old_keys.contains(renamed.full_key()) {
            return Err(SurveyError::DuplicateKey(renamed.full_key().to_owned()));
        }
    }

    let items = mem::take(survey).into_items();
    let mut rebuilt = IndexMap::with_capacity(items.len());
    for (full_key, mut item) in items {
        if let Some((_, renamed)) = pairs.iter().find(|(old, _)| old.full_key() == full_key) {
            item.set_key(renamed.clone());
        }
        if let ItemKind::Group(group) = item.kind_mut() {
            for child in &mut group.items {
                if let Some((_, renamed)) =
                    pairs.iter().find(|(old, _)| old.full_key() == child.as_str())
                {
                    *child = renamed.full_key().to_owned();
                }
            }
        }
        rebuilt.insert(item.key().full_key().to_owned(), item);
    }
    *survey = Survey::from_items(rebuilt);

    let mut rewritten_references = 0;
    for item in survey.items_mut() {
        for expression in item.expressions_mut() {
            for (old, new) in &pairs {
                rewritten_references += expression.update_item_key_references(old, new);
            }
        }
    }

    Ok(RenamedItem {
        pairs,
        rewritten_references,
    })
}

/// Rename a component within one item, propagating the change to every
/// key and reference scoped by the component's full key:
///
/// 1. the component tree's own keys (the component and its segment-exact
///    descendants; the item anchor is untouched),
/// 2. the item's component-keyed display/disabled condition entries and
///    template-value keys,
/// 3. every value reference in the tree anchored at this item whose slot
///    matches the renamed component.
///
/// Returns the number of rewritten references. Fails with
/// [`SurveyError::ItemNotFound`] when the item does not exist and
/// [`SurveyError::ComponentNotFound`] when nothing in the item matches
/// the old component key.
pub fn rename_component(
    survey: &mut Survey,
    item_full_key: &str,
    old_component_full_key: &str,
    new_component_full_key: &str,
) -> Result<usize, SurveyError> {
    let Some(item) = survey.item_mut(item_full_key) else {
        return Err(SurveyError::ItemNotFound(item_full_key.to_owned()));
    };
    if old_component_full_key == new_component_full_key {
        return Ok(0);
    }
    let item_key = item.key().clone();
    let mut matched = 0;

    if let ItemKind::Question(question) = item.kind_mut()
        && let Some(group) = &mut question.response_group
    {
        if let Some(spliced) = ComponentKey::splice_full_key(
            &group.key.full_key(),
            old_component_full_key,
            new_component_full_key,
        ) {
            group.key = ComponentKey::from_full_key(&spliced, item_key.clone());
            matched += 1;
        }
        for option in &mut group.options {
            if let Some(spliced) = ComponentKey::splice_full_key(
                &option.key.full_key(),
                old_component_full_key,
                new_component_full_key,
            ) {
                option.key = ComponentKey::from_full_key(&spliced, item_key.clone());
                matched += 1;
            }
        }
    }

    matched += item
        .display_conditions_mut()
        .rekey_components(old_component_full_key, new_component_full_key);
    matched += item
        .disabled_conditions_mut()
        .rekey_components(old_component_full_key, new_component_full_key);
    for template in item.template_values_mut() {
        if let Some(spliced) = ComponentKey::splice_full_key(
            &template.key,
            old_component_full_key,
            new_component_full_key,
        ) {
            template.key = spliced;
            matched += 1;
        }
    }

    if matched == 0 {
        return Err(SurveyError::ComponentNotFound {
            item: item_full_key.to_owned(),
            component: old_component_full_key.to_owned(),
        });
    }

    let mut rewritten_references = 0;
    for item in survey.items_mut() {
        for expression in item.expressions_mut() {
            rewritten_references += expression.update_component_key_references(
                &item_key,
                old_component_full_key,
                new_component_full_key,
            );
        }
    }
    Ok(rewritten_references)
}

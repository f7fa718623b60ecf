use indexmap::IndexMap;

use crate::{ComponentKey, Expression, ItemKey, ValueType};

/// A single item in a survey: a question, a group of items, or an
/// information-only display block.
///
/// Read accessors hand out live references for inspection; callers that
/// mutate outside the editor's commit path must clone first (see
/// [`SurveyItem::cloned_display_condition`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyItem {
    /// The path of this item in the survey tree.
    key: ItemKey,

    /// What kind of item this is (determines what it declares).
    kind: ItemKind,

    /// When the item (or one of its components) is shown.
    display_conditions: DisplayConditions,

    /// When individual components are disabled.
    disabled_conditions: DisabledConditions,

    /// Validation rules checked against collected responses.
    validations: Vec<Validation>,

    /// Derived values rendered into component templates.
    template_values: Vec<TemplateValue>,
}

impl SurveyItem {
    /// Create a new item of the given kind.
    pub fn new(key: impl Into<ItemKey>, kind: ItemKind) -> Self {
        Self {
            key: key.into(),
            kind,
            display_conditions: DisplayConditions::default(),
            disabled_conditions: DisabledConditions::default(),
            validations: Vec::new(),
            template_values: Vec::new(),
        }
    }

    /// Create a question item with no choice group.
    pub fn question(key: impl Into<ItemKey>, value_type: ValueType) -> Self {
        Self::new(key, ItemKind::Question(QuestionItem::new(value_type)))
    }

    /// Create a group item with no children.
    pub fn group(key: impl Into<ItemKey>) -> Self {
        Self::new(key, ItemKind::Group(GroupItem::new()))
    }

    /// Create an information-only display item.
    pub fn display(key: impl Into<ItemKey>) -> Self {
        Self::new(key, ItemKind::Display)
    }

    /// Set the root display condition.
    pub fn with_display_condition(mut self, expression: Expression) -> Self {
        self.display_conditions.set_root(expression);
        self
    }

    /// Add a validation rule.
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    /// Add a template value.
    pub fn with_template_value(mut self, template_value: TemplateValue) -> Self {
        self.template_values.push(template_value);
        self
    }

    /// Get the item key.
    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    /// Replace this item's key and re-anchor every component key beneath
    /// it (component-local keys are untouched). Callers must keep the
    /// arena entry for this item in sync; prefer `rename_item` for
    /// whole-tree renames.
    pub fn set_key(&mut self, key: ItemKey) {
        if let ItemKind::Question(question) = &mut self.kind
            && let Some(group) = &mut question.response_group
        {
            group.key = group.key.with_parent_item_key(key.clone());
            for option in &mut group.options {
                option.key = option.key.with_parent_item_key(key.clone());
            }
        }
        self.key = key;
    }

    /// Get the item kind.
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Get a mutable reference to the item kind.
    pub fn kind_mut(&mut self) -> &mut ItemKind {
        &mut self.kind
    }

    /// Get the display conditions.
    pub fn display_conditions(&self) -> &DisplayConditions {
        &self.display_conditions
    }

    /// Get a mutable reference to the display conditions.
    pub fn display_conditions_mut(&mut self) -> &mut DisplayConditions {
        &mut self.display_conditions
    }

    /// A defensive clone of the root display condition.
    pub fn cloned_display_condition(&self) -> Option<Expression> {
        self.display_conditions.root().cloned()
    }

    /// Get the disabled conditions.
    pub fn disabled_conditions(&self) -> &DisabledConditions {
        &self.disabled_conditions
    }

    /// Get a mutable reference to the disabled conditions.
    pub fn disabled_conditions_mut(&mut self) -> &mut DisabledConditions {
        &mut self.disabled_conditions
    }

    /// Get the validation rules.
    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    /// Add a validation rule.
    pub fn add_validation(&mut self, validation: Validation) {
        self.validations.push(validation);
    }

    /// Get the template values.
    pub fn template_values(&self) -> &[TemplateValue] {
        &self.template_values
    }

    /// Get a mutable reference to the template values.
    pub fn template_values_mut(&mut self) -> &mut Vec<TemplateValue> {
        &mut self.template_values
    }

    /// Every expression stored on this item, across all sites.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        self.display_conditions
            .root
            .iter()
            .chain(self.display_conditions.components.values())
            .chain(self.disabled_conditions.components.values())
            .chain(self.validations.iter().map(|validation| &validation.rule))
            .chain(
                self.template_values
                    .iter()
                    .map(|template| &template.expression),
            )
    }

    /// Mutable access to every expression stored on this item.
    pub fn expressions_mut(&mut self) -> impl Iterator<Item = &mut Expression> {
        self.display_conditions
            .root
            .iter_mut()
            .chain(self.display_conditions.components.values_mut())
            .chain(self.disabled_conditions.components.values_mut())
            .chain(
                self.validations
                    .iter_mut()
                    .map(|validation| &mut validation.rule),
            )
            .chain(
                self.template_values
                    .iter_mut()
                    .map(|template| &mut template.expression),
            )
    }
}

/// The kind of survey item, determining what it declares.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// A response-capable question.
    Question(QuestionItem),

    /// A group of items (children listed by full key).
    Group(GroupItem),

    /// Information only; declares nothing.
    Display,
}

impl ItemKind {
    /// Check if this is a question.
    pub fn is_question(&self) -> bool {
        matches!(self, Self::Question(_))
    }

    /// Check if this is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// A response-capable question item.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionItem {
    /// The type of the question's own primary response value.
    pub value_type: ValueType,

    /// The choice-group component tree, if the question has one.
    pub response_group: Option<ResponseGroup>,
}

impl QuestionItem {
    /// Create a question with the given primary value type.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            response_group: None,
        }
    }

    /// Attach a choice group.
    pub fn with_response_group(mut self, response_group: ResponseGroup) -> Self {
        self.response_group = Some(response_group);
        self
    }
}

/// A group item holding an ordered list of child item full keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupItem {
    /// Child item full keys, in display order.
    pub items: Vec<String>,
}

impl GroupItem {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group with the given children.
    pub fn with_items(items: Vec<String>) -> Self {
        Self { items }
    }

    /// Append a child full key.
    pub fn add_item(&mut self, full_key: impl Into<String>) {
        self.items.push(full_key.into());
    }
}

/// A choice-group component within a question.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseGroup {
    /// The group's component key (e.g. local key "scg").
    pub key: ComponentKey,

    /// The selectable options.
    pub options: Vec<ChoiceOption>,
}

impl ResponseGroup {
    /// Create an empty choice group.
    pub fn new(key: ComponentKey) -> Self {
        Self {
            key,
            options: Vec::new(),
        }
    }

    /// Append an option.
    pub fn with_option(mut self, option: ChoiceOption) -> Self {
        self.options.push(option);
        self
    }
}

/// One selectable option in a choice group.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    /// The option's component key.
    pub key: ComponentKey,

    /// A nested free-text/number/date input carried by the option.
    pub input: Option<OptionInput>,
}

impl ChoiceOption {
    /// Create a plain option.
    pub fn new(key: ComponentKey) -> Self {
        Self { key, input: None }
    }

    /// Create an option carrying a nested input of the given type.
    pub fn with_input(key: ComponentKey, value_type: ValueType) -> Self {
        Self {
            key,
            input: Some(OptionInput { value_type }),
        }
    }
}

/// A nested input carried by a choice option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionInput {
    /// The type of value the input collects.
    pub value_type: ValueType,
}

/// When an item and its components are shown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayConditions {
    root: Option<Expression>,
    components: IndexMap<String, Expression>,
}

impl DisplayConditions {
    /// The condition for the item as a whole.
    pub fn root(&self) -> Option<&Expression> {
        self.root.as_ref()
    }

    /// Set the condition for the item as a whole.
    pub fn set_root(&mut self, expression: Expression) {
        self.root = Some(expression);
    }

    /// Remove the root condition.
    pub fn clear_root(&mut self) {
        self.root = None;
    }

    /// Per-component conditions, keyed by component full key, in
    /// insertion order.
    pub fn components(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.components.iter().map(|(key, expr)| (key.as_str(), expr))
    }

    /// Set the condition for one component.
    pub fn set_component(&mut self, component_full_key: impl Into<String>, expression: Expression) {
        self.components.insert(component_full_key.into(), expression);
    }

    /// Re-key every component entry whose key is `old_prefix` or a
    /// segment-exact descendant of it, preserving order. Returns the
    /// number of re-keyed entries.
    pub fn rekey_components(&mut self, old_prefix: &str, new_prefix: &str) -> usize {
        rekey_component_map(&mut self.components, old_prefix, new_prefix)
    }
}

/// When individual components are disabled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisabledConditions {
    components: IndexMap<String, Expression>,
}

impl DisabledConditions {
    /// Per-component conditions, keyed by component full key, in
    /// insertion order.
    pub fn components(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.components.iter().map(|(key, expr)| (key.as_str(), expr))
    }

    /// Set the condition for one component.
    pub fn set_component(&mut self, component_full_key: impl Into<String>, expression: Expression) {
        self.components.insert(component_full_key.into(), expression);
    }

    /// Re-key every component entry whose key is `old_prefix` or a
    /// segment-exact descendant of it, preserving order. Returns the
    /// number of re-keyed entries.
    pub fn rekey_components(&mut self, old_prefix: &str, new_prefix: &str) -> usize {
        rekey_component_map(&mut self.components, old_prefix, new_prefix)
    }
}

fn rekey_component_map(
    components: &mut IndexMap<String, Expression>,
    old_prefix: &str,
    new_prefix: &str,
) -> usize {
    let mut rekeyed = 0;
    let entries = std::mem::take(components);
    for (key, expression) in entries {
        match ComponentKey::splice_full_key(&key, old_prefix, new_prefix) {
            Some(new_key) => {
                components.insert(new_key, expression);
                rekeyed += 1;
            }
            None => {
                components.insert(key, expression);
            }
        }
    }
    rekeyed
}

/// A validation rule attached to an item.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Identifies the rule within the item (e.g. "v1").
    pub key: String,

    /// The rule; the item is valid when this evaluates to true.
    pub rule: Expression,
}

impl Validation {
    /// Create a validation rule.
    pub fn new(key: impl Into<String>, rule: Expression) -> Self {
        Self {
            key: key.into(),
            rule,
        }
    }
}

/// A derived value rendered into a component's template, keyed by the
/// component's full key.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateValue {
    /// Full key of the component the value is rendered into.
    pub key: String,

    /// The expression producing the value.
    pub expression: Expression,
}

impl TemplateValue {
    /// Create a template value.
    pub fn new(key: impl Into<String>, expression: Expression) -> Self {
        Self {
            key: key.into(),
            expression,
        }
    }
}

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value as PlainData;

use crate::{ComponentKey, ExpressionError, ItemKey, ReferenceError, Value, ValueReference, ValueType};

/// An expression embedded in a survey item: a display condition, a
/// disable condition, a validation rule, or a template value.
///
/// Expressions are value objects: freely cloneable, mutated in place only
/// by the rename propagator. The plain-data form is a tagged record
/// (`type` discriminator); see [`Expression::from_data`] and
/// [`Expression::to_data`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expression {
    /// A literal value (or no value at all).
    Const(ConstExpression),

    /// A reference to another item's response, by value-reference string.
    ResponseVariable(ResponseVariableExpression),

    /// A value from the caller-supplied evaluation context.
    ContextVariable(ContextVariableExpression),

    /// A function applied to argument expressions.
    Function(FunctionExpression),
}

/// Tag strings of the plain-data `type` discriminator.
const CONST_TAG: &str = "const";
const RESPONSE_VARIABLE_TAG: &str = "responseVariable";
const CONTEXT_VARIABLE_TAG: &str = "contextVariable";
const FUNCTION_TAG: &str = "function";

impl Expression {
    /// A constant expression holding the given value.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Const(ConstExpression {
            value: Some(value.into()),
            editor_config: None,
        })
    }

    /// A constant expression holding no value.
    pub fn undefined() -> Self {
        Self::Const(ConstExpression::default())
    }

    /// A response-variable expression from a raw reference string.
    pub fn response_variable(variable_ref: impl Into<String>) -> Self {
        Self::ResponseVariable(ResponseVariableExpression::new(variable_ref))
    }

    /// A function expression over the given arguments.
    pub fn function(function_name: FunctionName, arguments: Vec<Expression>) -> Self {
        Self::Function(FunctionExpression {
            function_name,
            arguments,
            editor_config: None,
        })
    }

    /// Decode an expression from its plain-data form.
    ///
    /// Total over the four recognized `type` discriminators; any other
    /// tag fails with [`ExpressionError::InvalidType`] naming the tag
    /// that was actually found.
    pub fn from_data(data: &PlainData) -> Result<Self, ExpressionError> {
        match expression_tag(data)? {
            CONST_TAG => ConstExpression::from_data(data).map(Self::Const),
            RESPONSE_VARIABLE_TAG => {
                ResponseVariableExpression::from_data(data).map(Self::ResponseVariable)
            }
            CONTEXT_VARIABLE_TAG => {
                ContextVariableExpression::from_data(data).map(Self::ContextVariable)
            }
            FUNCTION_TAG => FunctionExpression::from_data(data).map(Self::Function),
            other => Err(ExpressionError::InvalidType {
                actual: other.to_owned(),
            }),
        }
    }

    /// Encode this expression to its plain-data form, the structural
    /// inverse of [`Expression::from_data`].
    pub fn to_data(&self) -> Result<PlainData, ExpressionError> {
        serde_json::to_value(self).map_err(|e| ExpressionError::Malformed(e.to_string()))
    }

    /// Every value reference read anywhere in this subtree, deduplicated
    /// by canonical string form with first-seen order preserved.
    /// Computed on demand; reference strings that do not parse are
    /// skipped (they cannot name a target).
    pub fn response_variable_refs(&self) -> Vec<ValueReference> {
        let mut seen = IndexSet::new();
        let mut refs = Vec::new();
        self.collect_response_variable_refs(&mut seen, &mut refs);
        refs
    }

    fn collect_response_variable_refs(
        &self,
        seen: &mut IndexSet<String>,
        refs: &mut Vec<ValueReference>,
    ) {
        match self {
            Self::Const(_) => {}
            Self::ResponseVariable(variable) => {
                if let Ok(reference) = variable.reference()
                    && seen.insert(reference.to_string())
                {
                    refs.push(reference);
                }
            }
            Self::ContextVariable(context) => {
                if let ContextVariableKind::CustomExpression { arguments, .. } = &context.kind {
                    for argument in arguments {
                        argument.collect_response_variable_refs(seen, refs);
                    }
                }
            }
            Self::Function(function) => {
                for argument in &function.arguments {
                    argument.collect_response_variable_refs(seen, refs);
                }
            }
        }
    }

    fn for_each_response_variable_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut ResponseVariableExpression),
    {
        match self {
            Self::Const(_) => {}
            Self::ResponseVariable(variable) => f(variable),
            Self::ContextVariable(context) => {
                if let ContextVariableKind::CustomExpression { arguments, .. } = &mut context.kind {
                    for argument in arguments {
                        argument.for_each_response_variable_mut(f);
                    }
                }
            }
            Self::Function(function) => {
                for argument in &mut function.arguments {
                    argument.for_each_response_variable_mut(f);
                }
            }
        }
    }

    /// Rewrite every reference in this subtree whose item key equals
    /// `old` exactly (segment equality, never substring matching) to
    /// point at `new`, preserving method and component suffix.
    /// Returns the number of rewritten references.
    pub fn update_item_key_references(&mut self, old: &ItemKey, new: &ItemKey) -> usize {
        let mut rewritten = 0;
        self.for_each_response_variable_mut(&mut |variable| {
            if let Ok(reference) = variable.reference()
                && reference.item_key() == old
            {
                let updated = ValueReference::from_parts(
                    new.clone(),
                    reference.method(),
                    reference.slot_key().cloned(),
                );
                variable.variable_ref = updated.to_string();
                rewritten += 1;
            }
        });
        rewritten
    }

    /// Rewrite every reference in this subtree that is anchored at
    /// `item_key` and whose slot full key is `old_component_full_key` or
    /// a segment-exact descendant of it. Returns the number of rewritten
    /// references.
    pub fn update_component_key_references(
        &mut self,
        item_key: &ItemKey,
        old_component_full_key: &str,
        new_component_full_key: &str,
    ) -> usize {
        let mut rewritten = 0;
        self.for_each_response_variable_mut(&mut |variable| {
            let Ok(reference) = variable.reference() else {
                return;
            };
            if reference.item_key() != item_key {
                return;
            }
            let Some(slot) = reference.slot_key() else {
                return;
            };
            let Some(spliced) = ComponentKey::splice_full_key(
                &slot.full_key(),
                old_component_full_key,
                new_component_full_key,
            ) else {
                return;
            };
            let updated = ValueReference::from_parts(
                reference.item_key().clone(),
                reference.method(),
                Some(ComponentKey::from_full_key(
                    &spliced,
                    reference.item_key().clone(),
                )),
            );
            variable.variable_ref = updated.to_string();
            rewritten += 1;
        });
        rewritten
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = PlainData::deserialize(deserializer)?;
        Self::from_data(&data).map_err(serde::de::Error::custom)
    }
}

/// A literal value, optionally absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstExpression {
    /// The stored value; `None` evaluates to undefined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_config: Option<EditorConfig>,
}

impl ConstExpression {
    /// Decode a `const`-tagged plain-data node. Fails with
    /// [`ExpressionError::InvalidType`] naming the actual tag when the
    /// node is tagged otherwise.
    pub fn from_data(data: &PlainData) -> Result<Self, ExpressionError> {
        expect_tag(data, CONST_TAG)?;
        let value = match data.get("value") {
            None | Some(PlainData::Null) => None,
            Some(raw) => Some(serde_json::from_value(raw.clone()).map_err(|e| {
                ExpressionError::Malformed(format!("invalid const value: {e}"))
            })?),
        };
        Ok(Self {
            value,
            editor_config: decode_editor_config(data)?,
        })
    }
}

/// A raw value-reference string, parsed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseVariableExpression {
    /// The reference string, e.g. `"intake.q1...get...scg.other"`.
    pub variable_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_config: Option<EditorConfig>,
}

impl ResponseVariableExpression {
    /// Create a response-variable expression from a reference string.
    pub fn new(variable_ref: impl Into<String>) -> Self {
        Self {
            variable_ref: variable_ref.into(),
            editor_config: None,
        }
    }

    /// Parse the stored reference string.
    pub fn reference(&self) -> Result<ValueReference, ReferenceError> {
        ValueReference::parse(&self.variable_ref)
    }

    /// Decode a `responseVariable`-tagged plain-data node.
    pub fn from_data(data: &PlainData) -> Result<Self, ExpressionError> {
        expect_tag(data, RESPONSE_VARIABLE_TAG)?;
        let variable_ref = data
            .get("variableRef")
            .and_then(PlainData::as_str)
            .ok_or_else(|| {
                ExpressionError::Malformed(
                    "responseVariable node is missing variableRef".to_owned(),
                )
            })?;
        Ok(Self {
            variable_ref: variable_ref.to_owned(),
            editor_config: decode_editor_config(data)?,
        })
    }
}

/// A value from the caller-supplied evaluation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextVariableExpression {
    #[serde(flatten)]
    pub kind: ContextVariableKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_config: Option<EditorConfig>,
}

impl ContextVariableExpression {
    /// Create a context-variable expression of the given kind.
    pub fn new(kind: ContextVariableKind) -> Self {
        Self {
            kind,
            editor_config: None,
        }
    }

    /// Decode a `contextVariable`-tagged plain-data node.
    pub fn from_data(data: &PlainData) -> Result<Self, ExpressionError> {
        expect_tag(data, CONTEXT_VARIABLE_TAG)?;
        serde_json::from_value(data.clone())
            .map_err(|e| ExpressionError::Malformed(format!("invalid contextVariable node: {e}")))
    }
}

/// The context slot a [`ContextVariableExpression`] reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContextVariableKind {
    /// The evaluation locale.
    Locale,

    /// A participant flag, looked up by string key.
    ParticipantFlag { key: String },

    /// A caller-supplied value with a declared expected type; a stored
    /// value of a different type evaluates to undefined.
    CustomValue { key: String, expected: ValueType },

    /// A caller-supplied callback invoked with unevaluated argument
    /// expressions.
    CustomExpression {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<Expression>,
    },
}

/// A function applied to argument expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionExpression {
    pub function_name: FunctionName,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Expression>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_config: Option<EditorConfig>,
}

impl FunctionExpression {
    /// Decode a `function`-tagged plain-data node. An unrecognized
    /// `functionName` fails with [`ExpressionError::UnsupportedFunction`]
    /// naming the actual name.
    pub fn from_data(data: &PlainData) -> Result<Self, ExpressionError> {
        expect_tag(data, FUNCTION_TAG)?;
        let name = data
            .get("functionName")
            .and_then(PlainData::as_str)
            .ok_or_else(|| {
                ExpressionError::Malformed("function node is missing functionName".to_owned())
            })?;
        let function_name =
            serde_json::from_value(PlainData::String(name.to_owned()))
                .map_err(|_| ExpressionError::UnsupportedFunction(name.to_owned()))?;
        let arguments = match data.get("arguments") {
            None | Some(PlainData::Null) => Vec::new(),
            Some(PlainData::Array(items)) => items
                .iter()
                .map(Expression::from_data)
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ExpressionError::Malformed(
                    "function arguments must be an array".to_owned(),
                ));
            }
        };
        Ok(Self {
            function_name,
            arguments,
            editor_config: decode_editor_config(data)?,
        })
    }
}

/// The closed set of expression functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionName {
    And,
    Or,
    Not,
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    StrEq,
    ListContains,
    Sum,
    Min,
    Max,
    InRange,
    Locale,
    ParticipantFlag,
}

impl FunctionName {
    /// The exact string form used in the plain-data format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::StrEq => "str_eq",
            Self::ListContains => "list_contains",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::InRange => "in_range",
            Self::Locale => "locale",
            Self::ParticipantFlag => "participant_flag",
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Editor metadata carried by any expression node; round-trips through
/// the plain-data format but is opaque to evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_template: Option<String>,
}

fn expression_tag(data: &PlainData) -> Result<&str, ExpressionError> {
    data.get("type")
        .and_then(PlainData::as_str)
        .ok_or_else(|| ExpressionError::Malformed("expression node has no type tag".to_owned()))
}

fn expect_tag(data: &PlainData, expected: &str) -> Result<(), ExpressionError> {
    let actual = expression_tag(data)?;
    if actual == expected {
        Ok(())
    } else {
        Err(ExpressionError::InvalidType {
            actual: actual.to_owned(),
        })
    }
}

fn decode_editor_config(data: &PlainData) -> Result<Option<EditorConfig>, ExpressionError> {
    match data.get("editorConfig") {
        None | Some(PlainData::Null) => Ok(None),
        Some(config) => serde_json::from_value(config.clone())
            .map(Some)
            .map_err(|e| ExpressionError::Malformed(format!("invalid editorConfig: {e}"))),
    }
}

//! Core types for the canvass crate.
//!
//! This crate provides the foundational types for survey logic:
//! - `ItemKey` and `ComponentKey` - dot-segmented paths into the survey tree
//! - `ValueReference` - string pointers naming one evaluable value
//! - `Expression` - the condition/validation/template expression AST
//! - `Survey` and `SurveyItem` - the item arena and its expression sites
//! - `SurveyResponses` - the per-evaluation response snapshot

mod item_key;
pub use item_key::ItemKey;

mod component_key;
pub use component_key::ComponentKey;

mod value;
pub use value::{Value, ValueType};

mod value_reference;
pub use value_reference::{REF_SEPARATOR, RefMethod, ValueReference};

mod expression;
pub use expression::{
    ConstExpression, ContextVariableExpression, ContextVariableKind, EditorConfig, Expression,
    FunctionExpression, FunctionName, ResponseVariableExpression,
};

mod item;
pub use item::{
    ChoiceOption, DisabledConditions, DisplayConditions, GroupItem, ItemKind, OptionInput,
    QuestionItem, ResponseGroup, SurveyItem, TemplateValue, Validation,
};

mod survey;
pub use survey::Survey;

mod responses;
pub use responses::{ItemResponse, SurveyResponses};

mod error;
pub use error::{ExpressionError, ReferenceError, SurveyError};

use std::collections::HashMap;
use std::fmt;

use canvass_types::{Expression, Value};

/// A caller-supplied expression callback.
///
/// Invoked with the UNEVALUATED argument expressions; the callback
/// decides whether and how to evaluate them. Errors are contained by the
/// evaluator: a failing callback makes the expression evaluate to
/// undefined instead of propagating.
pub type CustomExpressionFn = Box<dyn Fn(&[Expression]) -> anyhow::Result<Option<Value>>>;

/// The caller-supplied evaluation context: locale, participant flags,
/// typed custom values, and custom expression callbacks.
pub struct SurveyContext {
    locale: String,
    participant_flags: HashMap<String, String>,
    custom_values: HashMap<String, Value>,
    custom_expressions: HashMap<String, CustomExpressionFn>,
}

impl SurveyContext {
    /// Create a context with the given locale and nothing else.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            participant_flags: HashMap::new(),
            custom_values: HashMap::new(),
            custom_expressions: HashMap::new(),
        }
    }

    /// The evaluation locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Add a participant flag.
    pub fn with_participant_flag(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.participant_flags.insert(key.into(), value.into());
        self
    }

    /// Look up a participant flag.
    pub fn participant_flag(&self, key: &str) -> Option<&str> {
        self.participant_flags.get(key).map(String::as_str)
    }

    /// Add a custom value.
    pub fn with_custom_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_values.insert(key.into(), value.into());
        self
    }

    /// Look up a custom value.
    pub fn custom_value(&self, key: &str) -> Option<&Value> {
        self.custom_values.get(key)
    }

    /// Register a custom expression callback.
    pub fn with_custom_expression<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&[Expression]) -> anyhow::Result<Option<Value>> + 'static,
    {
        self.custom_expressions
            .insert(name.into(), Box::new(callback));
        self
    }

    /// Look up a custom expression callback.
    pub fn custom_expression(&self, name: &str) -> Option<&CustomExpressionFn> {
        self.custom_expressions.get(name)
    }
}

impl Default for SurveyContext {
    fn default() -> Self {
        Self::new("en")
    }
}

impl fmt::Debug for SurveyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurveyContext")
            .field("locale", &self.locale)
            .field("participant_flags", &self.participant_flags)
            .field("custom_values", &self.custom_values)
            .field(
                "custom_expressions",
                &self.custom_expressions.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

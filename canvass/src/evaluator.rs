use std::cmp::Ordering;
use std::fmt;

use canvass_types::{
    ContextVariableKind, Expression, FunctionExpression, FunctionName, RefMethod, ReferenceError,
    ResponseVariableExpression, SurveyResponses, Value,
};

use crate::SurveyContext;

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, count) = match self {
            Self::Exactly(count) => ("", *count),
            Self::AtLeast(count) => ("at least ", *count),
        };
        let plural = if count == 1 { "" } else { "s" };
        write!(f, "{prefix}{count} argument{plural}")
    }
}

/// Error type for expression evaluation.
///
/// These are author errors surfaced synchronously to the caller. Missing
/// data never errors: an absent response, an absent context entry, a
/// type-mismatched custom value, or a failing custom-expression callback
/// all degrade to undefined instead.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// A function was applied to the wrong number of arguments.
    #[error("{function} expects {expected}, got {got}")]
    ArityMismatch {
        function: FunctionName,
        expected: Arity,
        got: usize,
    },

    /// An argument evaluated to a value of the wrong type.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// A response variable carries an unparseable reference string.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// A stateless expression evaluator over one response snapshot and one
/// evaluation context.
///
/// Evaluation is a synchronous recursive walk; `None` results mean
/// "undefined" and are treated as falsy by the condition helpers.
#[derive(Debug)]
pub struct Evaluator<'a> {
    responses: &'a SurveyResponses,
    context: &'a SurveyContext,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over the given snapshot and context.
    pub fn new(responses: &'a SurveyResponses, context: &'a SurveyContext) -> Self {
        Self { responses, context }
    }

    /// Evaluate an expression to a value, or `None` for undefined.
    pub fn evaluate(&self, expression: &Expression) -> Result<Option<Value>, EvalError> {
        match expression {
            Expression::Const(constant) => Ok(constant.value.clone()),
            Expression::ResponseVariable(variable) => self.evaluate_response_variable(variable),
            Expression::ContextVariable(variable) => {
                Ok(self.evaluate_context_variable(&variable.kind))
            }
            Expression::Function(function) => self.evaluate_function(function),
        }
    }

    /// Evaluate an expression as a condition: true iff it evaluates to
    /// exactly `Bool(true)`.
    pub fn evaluate_condition(&self, expression: &Expression) -> Result<bool, EvalError> {
        Ok(self
            .evaluate(expression)?
            .is_some_and(|value| value.is_true()))
    }

    fn evaluate_response_variable(
        &self,
        variable: &ResponseVariableExpression,
    ) -> Result<Option<Value>, EvalError> {
        let reference = variable.reference()?;
        let Some(response) = self.responses.get(reference.item_key().full_key()) else {
            return Ok(None);
        };
        let slot = reference.slot_key().map(|slot| slot.full_key());
        let value = response.get(slot.as_deref());
        Ok(match reference.method() {
            RefMethod::Get => value.cloned(),
            RefMethod::IsDefined => Some(Value::Bool(value.is_some())),
        })
    }

    fn evaluate_context_variable(&self, kind: &ContextVariableKind) -> Option<Value> {
        match kind {
            ContextVariableKind::Locale => Some(Value::from(self.context.locale())),
            ContextVariableKind::ParticipantFlag { key } => {
                self.context.participant_flag(key).map(Value::from)
            }
            ContextVariableKind::CustomValue { key, expected } => self
                .context
                .custom_value(key)
                .filter(|value| value.matches(*expected))
                .cloned(),
            ContextVariableKind::CustomExpression { name, arguments } => self
                .context
                .custom_expression(name)
                .and_then(|callback| callback(arguments).ok().flatten()),
        }
    }

    fn evaluate_function(&self, function: &FunctionExpression) -> Result<Option<Value>, EvalError> {
        let arguments = &function.arguments;
        match function.function_name {
            FunctionName::And => self.evaluate_and(arguments),
            FunctionName::Or => self.evaluate_or(arguments),
            FunctionName::Not => self.evaluate_not(arguments),
            FunctionName::Eq => self.evaluate_eq(arguments),
            FunctionName::Gt => self.evaluate_comparison(FunctionName::Gt, arguments, |ordering| {
                ordering == Ordering::Greater
            }),
            FunctionName::Gte => {
                self.evaluate_comparison(FunctionName::Gte, arguments, |ordering| {
                    ordering != Ordering::Less
                })
            }
            FunctionName::Lt => self.evaluate_comparison(FunctionName::Lt, arguments, |ordering| {
                ordering == Ordering::Less
            }),
            FunctionName::Lte => {
                self.evaluate_comparison(FunctionName::Lte, arguments, |ordering| {
                    ordering != Ordering::Greater
                })
            }
            FunctionName::StrEq => self.evaluate_str_eq(arguments),
            FunctionName::ListContains => self.evaluate_list_contains(arguments),
            FunctionName::Sum => self.evaluate_sum(arguments),
            FunctionName::Min => {
                self.evaluate_extremum(FunctionName::Min, arguments, |candidate, best| {
                    candidate < best
                })
            }
            FunctionName::Max => {
                self.evaluate_extremum(FunctionName::Max, arguments, |candidate, best| {
                    candidate > best
                })
            }
            FunctionName::InRange => self.evaluate_in_range(arguments),
            FunctionName::Locale => {
                require_exactly(FunctionName::Locale, arguments, 0)?;
                Ok(Some(Value::from(self.context.locale())))
            }
            FunctionName::ParticipantFlag => self.evaluate_participant_flag(arguments),
        }
    }

    /// False as soon as one argument evaluates to anything other than
    /// `Bool(true)`; remaining arguments are not evaluated.
    fn evaluate_and(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_at_least(FunctionName::And, arguments, 1)?;
        for argument in arguments {
            if !self.evaluate(argument)?.is_some_and(|value| value.is_true()) {
                return Ok(Some(Value::Bool(false)));
            }
        }
        Ok(Some(Value::Bool(true)))
    }

    /// True as soon as one argument evaluates to `Bool(true)`; remaining
    /// arguments are not evaluated.
    fn evaluate_or(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_at_least(FunctionName::Or, arguments, 1)?;
        for argument in arguments {
            if self.evaluate(argument)?.is_some_and(|value| value.is_true()) {
                return Ok(Some(Value::Bool(true)));
            }
        }
        Ok(Some(Value::Bool(false)))
    }

    fn evaluate_not(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_exactly(FunctionName::Not, arguments, 1)?;
        let truthy = self
            .evaluate(&arguments[0])?
            .is_some_and(|value| value.is_true());
        Ok(Some(Value::Bool(!truthy)))
    }

    fn evaluate_eq(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_exactly(FunctionName::Eq, arguments, 2)?;
        match (self.evaluate(&arguments[0])?, self.evaluate(&arguments[1])?) {
            (Some(left), Some(right)) => Ok(Some(Value::Bool(left == right))),
            _ => Ok(Some(Value::Bool(false))),
        }
    }

    fn evaluate_comparison<F>(
        &self,
        function: FunctionName,
        arguments: &[Expression],
        predicate: F,
    ) -> Result<Option<Value>, EvalError>
    where
        F: Fn(Ordering) -> bool,
    {
        require_exactly(function, arguments, 2)?;
        let (Some(left), Some(right)) =
            (self.evaluate(&arguments[0])?, self.evaluate(&arguments[1])?)
        else {
            return Ok(Some(Value::Bool(false)));
        };
        let matched = compare_values(&left, &right)?.is_some_and(&predicate);
        Ok(Some(Value::Bool(matched)))
    }

    fn evaluate_str_eq(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_exactly(FunctionName::StrEq, arguments, 2)?;
        let (Some(left), Some(right)) =
            (self.evaluate(&arguments[0])?, self.evaluate(&arguments[1])?)
        else {
            return Ok(Some(Value::Bool(false)));
        };
        let (Value::Str(left), Value::Str(right)) = (&left, &right) else {
            let got = if left.as_str().is_none() {
                left.type_name()
            } else {
                right.type_name()
            };
            return Err(EvalError::TypeMismatch {
                expected: "String",
                got,
            });
        };
        Ok(Some(Value::Bool(left == right)))
    }

    fn evaluate_list_contains(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_exactly(FunctionName::ListContains, arguments, 2)?;
        let (Some(list), Some(needle)) =
            (self.evaluate(&arguments[0])?, self.evaluate(&arguments[1])?)
        else {
            return Ok(Some(Value::Bool(false)));
        };
        let Value::List(items) = &list else {
            return Err(EvalError::TypeMismatch {
                expected: "List",
                got: list.type_name(),
            });
        };
        Ok(Some(Value::Bool(items.contains(&needle))))
    }

    /// Undefined arguments are skipped, not treated as zero; a defined
    /// non-numeric argument is an error. All arguments undefined yields
    /// undefined.
    fn evaluate_sum(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_at_least(FunctionName::Sum, arguments, 1)?;
        let mut int_total: i64 = 0;
        let mut float_total = 0.0;
        let mut saw_float = false;
        let mut defined = 0usize;
        for argument in arguments {
            match self.evaluate(argument)? {
                None => {}
                Some(Value::Int(int)) => {
                    int_total += int;
                    defined += 1;
                }
                Some(Value::Float(float)) => {
                    float_total += float;
                    saw_float = true;
                    defined += 1;
                }
                Some(other) => {
                    return Err(EvalError::TypeMismatch {
                        expected: "Number",
                        got: other.type_name(),
                    });
                }
            }
        }
        if defined == 0 {
            return Ok(None);
        }
        Ok(Some(if saw_float {
            Value::Float(int_total as f64 + float_total)
        } else {
            Value::Int(int_total)
        }))
    }

    fn evaluate_extremum<F>(
        &self,
        function: FunctionName,
        arguments: &[Expression],
        replaces: F,
    ) -> Result<Option<Value>, EvalError>
    where
        F: Fn(f64, f64) -> bool,
    {
        require_at_least(function, arguments, 1)?;
        let mut best: Option<(f64, Value)> = None;
        for argument in arguments {
            let Some(value) = self.evaluate(argument)? else {
                continue;
            };
            let Some(candidate) = value.as_f64() else {
                return Err(EvalError::TypeMismatch {
                    expected: "Number",
                    got: value.type_name(),
                });
            };
            let replace = match &best {
                None => true,
                Some((best_number, _)) => replaces(candidate, *best_number),
            };
            if replace {
                best = Some((candidate, value));
            }
        }
        Ok(best.map(|(_, value)| value))
    }

    fn evaluate_in_range(&self, arguments: &[Expression]) -> Result<Option<Value>, EvalError> {
        require_exactly(FunctionName::InRange, arguments, 4)?;
        let (Some(value), Some(low), Some(high), Some(inclusive)) = (
            self.evaluate(&arguments[0])?,
            self.evaluate(&arguments[1])?,
            self.evaluate(&arguments[2])?,
            self.evaluate(&arguments[3])?,
        ) else {
            return Ok(Some(Value::Bool(false)));
        };
        let value = require_number(&value)?;
        let low = require_number(&low)?;
        let high = require_number(&high)?;
        let Value::Bool(inclusive) = inclusive else {
            return Err(EvalError::TypeMismatch {
                expected: "Bool",
                got: inclusive.type_name(),
            });
        };
        let inside = if inclusive {
            low <= value && value <= high
        } else {
            low < value && value < high
        };
        Ok(Some(Value::Bool(inside)))
    }

    fn evaluate_participant_flag(
        &self,
        arguments: &[Expression],
    ) -> Result<Option<Value>, EvalError> {
        require_exactly(FunctionName::ParticipantFlag, arguments, 1)?;
        let Some(key) = self.evaluate(&arguments[0])? else {
            return Ok(None);
        };
        let Value::Str(key) = &key else {
            return Err(EvalError::TypeMismatch {
                expected: "String",
                got: key.type_name(),
            });
        };
        Ok(self.context.participant_flag(key).map(Value::from))
    }
}

/// Compare two values of the same comparable type. `Ok(None)` means the
/// values are numerically unordered (NaN); mixed or unordered types are
/// an error.
fn compare_values(left: &Value, right: &Value) -> Result<Option<Ordering>, EvalError> {
    if let (Some(left_number), Some(right_number)) = (left.as_f64(), right.as_f64()) {
        return Ok(left_number.partial_cmp(&right_number));
    }
    match (left, right) {
        (Value::Str(left), Value::Str(right)) => Ok(Some(left.cmp(right))),
        (Value::Date(left), Value::Date(right)) => Ok(Some(left.cmp(right))),
        _ => Err(EvalError::TypeMismatch {
            expected: left.type_name(),
            got: right.type_name(),
        }),
    }
}

fn require_exactly(
    function: FunctionName,
    arguments: &[Expression],
    expected: usize,
) -> Result<(), EvalError> {
    if arguments.len() == expected {
        Ok(())
    } else {
        Err(EvalError::ArityMismatch {
            function,
            expected: Arity::Exactly(expected),
            got: arguments.len(),
        })
    }
}

fn require_at_least(
    function: FunctionName,
    arguments: &[Expression],
    minimum: usize,
) -> Result<(), EvalError> {
    if arguments.len() >= minimum {
        Ok(())
    } else {
        Err(EvalError::ArityMismatch {
            function,
            expected: Arity::AtLeast(minimum),
            got: arguments.len(),
        })
    }
}

fn require_number(value: &Value) -> Result<f64, EvalError> {
    value.as_f64().ok_or(EvalError::TypeMismatch {
        expected: "Number",
        got: value.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvass_types::{ContextVariableExpression, ItemResponse, ValueType};

    fn function(name: FunctionName, arguments: Vec<Expression>) -> Expression {
        Expression::function(name, arguments)
    }

    fn evaluate_with(
        responses: &SurveyResponses,
        context: &SurveyContext,
        expression: &Expression,
    ) -> Result<Option<Value>, EvalError> {
        Evaluator::new(responses, context).evaluate(expression)
    }

    fn evaluate(expression: &Expression) -> Result<Option<Value>, EvalError> {
        evaluate_with(&SurveyResponses::new(), &SurveyContext::default(), expression)
    }

    #[test]
    fn const_returns_stored_value() {
        assert_eq!(evaluate(&Expression::constant(5)).unwrap(), Some(Value::Int(5)));
        assert_eq!(evaluate(&Expression::undefined()).unwrap(), None);
    }

    #[test]
    fn response_variable_get_and_is_defined() {
        let mut responses = SurveyResponses::new();
        responses.insert(
            "q1",
            ItemResponse::new("yes").with_slot("scg.other", "free text"),
        );
        let context = SurveyContext::default();

        let get = Expression::response_variable("q1...get");
        assert_eq!(
            evaluate_with(&responses, &context, &get).unwrap(),
            Some(Value::from("yes"))
        );

        let slot_get = Expression::response_variable("q1...get...scg.other");
        assert_eq!(
            evaluate_with(&responses, &context, &slot_get).unwrap(),
            Some(Value::from("free text"))
        );

        let is_defined = Expression::response_variable("q1...isDefined");
        assert_eq!(
            evaluate_with(&responses, &context, &is_defined).unwrap(),
            Some(Value::Bool(true))
        );

        let missing_slot = Expression::response_variable("q1...isDefined...scg.missing");
        assert_eq!(
            evaluate_with(&responses, &context, &missing_slot).unwrap(),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn absent_item_response_is_undefined_for_either_method() {
        assert_eq!(
            evaluate(&Expression::response_variable("missing...get")).unwrap(),
            None
        );
        assert_eq!(
            evaluate(&Expression::response_variable("missing...isDefined")).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_reference_is_an_error() {
        let err = evaluate(&Expression::response_variable("garbage")).unwrap_err();
        assert!(matches!(err, EvalError::Reference(_)));
    }

    #[test]
    fn and_short_circuits_on_undefined() {
        let expression = function(
            FunctionName::And,
            vec![
                Expression::response_variable("a...get"),
                Expression::constant(false),
            ],
        );
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn or_short_circuits() {
        let expression = function(
            FunctionName::Or,
            vec![
                Expression::constant(true),
                // Would error if evaluated: and with zero arguments.
                function(FunctionName::And, vec![]),
            ],
        );
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn not_inverts_truthiness() {
        let expression = function(FunctionName::Not, vec![Expression::constant(true)]);
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Bool(false)));

        let undefined = function(FunctionName::Not, vec![Expression::undefined()]);
        assert_eq!(evaluate(&undefined).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn eq_is_false_on_undefined() {
        let expression = function(
            FunctionName::Eq,
            vec![Expression::undefined(), Expression::constant(1)],
        );
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn comparisons() {
        let greater = function(
            FunctionName::Gt,
            vec![Expression::constant(5), Expression::constant(3)],
        );
        assert_eq!(evaluate(&greater).unwrap(), Some(Value::Bool(true)));

        let mixed = function(
            FunctionName::Gte,
            vec![Expression::constant(5), Expression::constant(5.0)],
        );
        assert_eq!(evaluate(&mixed).unwrap(), Some(Value::Bool(true)));

        let strings = function(
            FunctionName::Lt,
            vec![Expression::constant("a"), Expression::constant("b")],
        );
        assert_eq!(evaluate(&strings).unwrap(), Some(Value::Bool(true)));

        let undefined_side = function(
            FunctionName::Lte,
            vec![Expression::undefined(), Expression::constant(1)],
        );
        assert_eq!(evaluate(&undefined_side).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn comparing_mismatched_types_is_an_error() {
        let expression = function(
            FunctionName::Gt,
            vec![Expression::constant("a"), Expression::constant(1)],
        );
        assert!(matches!(
            evaluate(&expression).unwrap_err(),
            EvalError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn date_comparison() {
        let earlier = "2026-01-01T00:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap();
        let later = "2026-06-01T00:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap();
        let expression = function(
            FunctionName::Lt,
            vec![Expression::constant(earlier), Expression::constant(later)],
        );
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn str_eq() {
        let equal = function(
            FunctionName::StrEq,
            vec![Expression::constant("en"), Expression::constant("en")],
        );
        assert_eq!(evaluate(&equal).unwrap(), Some(Value::Bool(true)));

        let wrong_type = function(
            FunctionName::StrEq,
            vec![Expression::constant("en"), Expression::constant(1)],
        );
        let err = evaluate(&wrong_type).unwrap_err();
        assert_eq!(
            err,
            EvalError::TypeMismatch {
                expected: "String",
                got: "Int"
            }
        );
    }

    #[test]
    fn list_contains() {
        let list = Expression::constant(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let hit = function(
            FunctionName::ListContains,
            vec![list.clone(), Expression::constant(2)],
        );
        assert_eq!(evaluate(&hit).unwrap(), Some(Value::Bool(true)));

        let miss = function(
            FunctionName::ListContains,
            vec![list, Expression::constant(9)],
        );
        assert_eq!(evaluate(&miss).unwrap(), Some(Value::Bool(false)));

        let not_a_list = function(
            FunctionName::ListContains,
            vec![Expression::constant(1), Expression::constant(1)],
        );
        assert!(matches!(
            evaluate(&not_a_list).unwrap_err(),
            EvalError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn sum_skips_undefined() {
        let expression = function(
            FunctionName::Sum,
            vec![
                Expression::constant(1),
                Expression::response_variable("missing...get"),
                Expression::constant(3),
            ],
        );
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Int(4)));
    }

    #[test]
    fn sum_rejects_non_numbers() {
        let expression = function(
            FunctionName::Sum,
            vec![Expression::constant(1), Expression::constant("x")],
        );
        let err = evaluate(&expression).unwrap_err();
        assert_eq!(
            err,
            EvalError::TypeMismatch {
                expected: "Number",
                got: "String"
            }
        );
    }

    #[test]
    fn sum_of_only_undefined_is_undefined() {
        let expression = function(
            FunctionName::Sum,
            vec![Expression::response_variable("missing...get")],
        );
        assert_eq!(evaluate(&expression).unwrap(), None);
    }

    #[test]
    fn min_with_no_arguments_is_an_arity_error() {
        let expression = function(FunctionName::Min, vec![]);
        let err = evaluate(&expression).unwrap_err();
        assert_eq!(err.to_string(), "min expects at least 1 argument, got 0");
    }

    #[test]
    fn min_and_max() {
        let min = function(
            FunctionName::Min,
            vec![
                Expression::constant(4),
                Expression::response_variable("missing...get"),
                Expression::constant(2),
            ],
        );
        assert_eq!(evaluate(&min).unwrap(), Some(Value::Int(2)));

        let max = function(
            FunctionName::Max,
            vec![Expression::constant(4.5), Expression::constant(2)],
        );
        assert_eq!(evaluate(&max).unwrap(), Some(Value::Float(4.5)));
    }

    #[test]
    fn in_range_boundaries() {
        let inclusive = function(
            FunctionName::InRange,
            vec![
                Expression::constant(5),
                Expression::constant(1),
                Expression::constant(10),
                Expression::constant(true),
            ],
        );
        assert_eq!(evaluate(&inclusive).unwrap(), Some(Value::Bool(true)));

        let exclusive_boundary = function(
            FunctionName::InRange,
            vec![
                Expression::constant(1),
                Expression::constant(1),
                Expression::constant(10),
                Expression::constant(false),
            ],
        );
        assert_eq!(
            evaluate(&exclusive_boundary).unwrap(),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn in_range_arity() {
        let expression = function(
            FunctionName::InRange,
            vec![Expression::constant(1), Expression::constant(2)],
        );
        let err = evaluate(&expression).unwrap_err();
        assert_eq!(
            err,
            EvalError::ArityMismatch {
                function: FunctionName::InRange,
                expected: Arity::Exactly(4),
                got: 2
            }
        );
    }

    #[test]
    fn in_range_undefined_value_is_false() {
        let expression = function(
            FunctionName::InRange,
            vec![
                Expression::response_variable("missing...get"),
                Expression::constant(1),
                Expression::constant(10),
                Expression::constant(true),
            ],
        );
        assert_eq!(evaluate(&expression).unwrap(), Some(Value::Bool(false)));
    }

    #[test]
    fn locale_and_participant_flag_functions() {
        let responses = SurveyResponses::new();
        let context = SurveyContext::new("nl").with_participant_flag("cohort", "b");

        let locale = function(FunctionName::Locale, vec![]);
        assert_eq!(
            evaluate_with(&responses, &context, &locale).unwrap(),
            Some(Value::from("nl"))
        );

        let flag = function(
            FunctionName::ParticipantFlag,
            vec![Expression::constant("cohort")],
        );
        assert_eq!(
            evaluate_with(&responses, &context, &flag).unwrap(),
            Some(Value::from("b"))
        );

        let missing = function(
            FunctionName::ParticipantFlag,
            vec![Expression::constant("missing")],
        );
        assert_eq!(evaluate_with(&responses, &context, &missing).unwrap(), None);
    }

    #[test]
    fn context_variable_kinds() {
        let responses = SurveyResponses::new();
        let context = SurveyContext::new("de")
            .with_participant_flag("isChild", "true")
            .with_custom_value("age", 12);

        let locale = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::Locale,
        ));
        assert_eq!(
            evaluate_with(&responses, &context, &locale).unwrap(),
            Some(Value::from("de"))
        );

        let flag = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::ParticipantFlag {
                key: "isChild".to_owned(),
            },
        ));
        assert_eq!(
            evaluate_with(&responses, &context, &flag).unwrap(),
            Some(Value::from("true"))
        );

        let typed = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::CustomValue {
                key: "age".to_owned(),
                expected: ValueType::Number,
            },
        ));
        assert_eq!(
            evaluate_with(&responses, &context, &typed).unwrap(),
            Some(Value::Int(12))
        );

        let mistyped = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::CustomValue {
                key: "age".to_owned(),
                expected: ValueType::String,
            },
        ));
        assert_eq!(evaluate_with(&responses, &context, &mistyped).unwrap(), None);
    }

    #[test]
    fn custom_expression_receives_unevaluated_arguments() {
        let responses = SurveyResponses::new();
        let context = SurveyContext::default().with_custom_expression("argument_count", |args| {
            assert!(matches!(args[0], Expression::Function(_)));
            Ok(Some(Value::Int(args.len() as i64)))
        });

        let expression = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::CustomExpression {
                name: "argument_count".to_owned(),
                arguments: vec![function(FunctionName::And, vec![])],
            },
        ));
        assert_eq!(
            evaluate_with(&responses, &context, &expression).unwrap(),
            Some(Value::Int(1))
        );
    }

    #[test]
    fn failing_custom_expression_degrades_to_undefined() {
        let responses = SurveyResponses::new();
        let context = SurveyContext::default()
            .with_custom_expression("boom", |_| anyhow::bail!("callback failed"));

        let expression = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::CustomExpression {
                name: "boom".to_owned(),
                arguments: vec![],
            },
        ));
        assert_eq!(evaluate_with(&responses, &context, &expression).unwrap(), None);

        let unregistered = Expression::ContextVariable(ContextVariableExpression::new(
            ContextVariableKind::CustomExpression {
                name: "missing".to_owned(),
                arguments: vec![],
            },
        ));
        assert_eq!(
            evaluate_with(&responses, &context, &unregistered).unwrap(),
            None
        );
    }

    #[test]
    fn evaluate_condition_treats_undefined_as_false() {
        let responses = SurveyResponses::new();
        let context = SurveyContext::default();
        let evaluator = Evaluator::new(&responses, &context);
        let undefined = Expression::response_variable("missing...get");
        assert!(!evaluator.evaluate_condition(&undefined).unwrap());
        assert!(evaluator.evaluate_condition(&Expression::constant(true)).unwrap());
    }
}

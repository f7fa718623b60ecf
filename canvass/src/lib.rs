//! # canvass
//!
//! Survey expression and reference-resolution engine.
//!
//! A survey is a tree of items (questions, groups, display blocks) whose
//! display, validation, and derived-value logic is expressed through a
//! small expression language. Expressions point at other items' answers
//! via string value references (`item...get`, `item...isDefined`,
//! optionally scoped to a component slot), and the engine keeps those
//! pointers honest:
//!
//! - [`Evaluator`] walks an [`Expression`] against a response snapshot
//!   and an evaluation context, degrading missing data to undefined.
//! - [`response_value_references`] / [`survey_value_references`] list
//!   the references each component is capable of producing.
//! - [`collect_usages`] / [`find_invalid_reference_usages`] list the
//!   references actually read, and flag the dangling ones.
//! - [`rename_item`] / [`rename_component`] restructure the tree while
//!   rewriting every affected reference in one logical step.
//!
//! ## Example
//!
//! ```rust
//! use canvass::{Evaluator, Expression, FunctionName, SurveyContext, SurveyResponses};
//!
//! let mut responses = SurveyResponses::new();
//! responses.insert_value("intake.age", 34);
//!
//! let condition = Expression::function(
//!     FunctionName::Gte,
//!     vec![
//!         Expression::response_variable("intake.age...get"),
//!         Expression::constant(18),
//!     ],
//! );
//!
//! let context = SurveyContext::default();
//! let evaluator = Evaluator::new(&responses, &context);
//! assert!(evaluator.evaluate_condition(&condition)?);
//! # Ok::<(), canvass::EvalError>(())
//! ```
//!
//! The survey tree is a single owned arena with exclusive access during
//! mutation; every operation here is synchronous and performs no I/O.
//! Editors layering undo/redo on top wrap each rename call in one
//! history entry.

// Re-export all types from canvass-types
pub use canvass_types::*;

mod context;
pub use context::{CustomExpressionFn, SurveyContext};

mod evaluator;
pub use evaluator::{Arity, EvalError, Evaluator};

mod declarations;
pub use declarations::{
    response_value_references, survey_value_references, survey_value_references_of_type,
};

mod usages;
pub use usages::{Usage, UsageType, collect_usages, find_invalid_reference_usages};

mod rename;
pub use rename::{RenamedItem, rename_component, rename_item};

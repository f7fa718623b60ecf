/// Error type for value-reference parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// The reference string does not follow the
    /// `item...method[...component]` grammar.
    #[error("malformed value reference: {0}")]
    Malformed(String),

    /// The method part is not `get` or `isDefined`.
    #[error("unknown reference method: {0}")]
    UnknownMethod(String),
}

/// Error type for plain-data expression decoding and encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// The node carries a `type` tag this deserializer does not accept.
    /// Names the tag that was actually found.
    #[error("invalid expression type: {actual}")]
    InvalidType { actual: String },

    /// A function node names a function outside the closed set.
    #[error("unsupported function: {0}")]
    UnsupportedFunction(String),

    /// The node is structurally malformed (missing or mistyped fields).
    #[error("malformed expression data: {0}")]
    Malformed(String),
}

/// Error type for survey-tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurveyError {
    /// No item with the given full key exists in the tree.
    #[error("no item with key: {0}")]
    ItemNotFound(String),

    /// Inserting or renaming would produce two items with the same key.
    #[error("duplicate item key: {0}")]
    DuplicateKey(String),

    /// No component with the given full key exists in the item.
    #[error("no component with key '{component}' in item '{item}'")]
    ComponentNotFound { item: String, component: String },
}

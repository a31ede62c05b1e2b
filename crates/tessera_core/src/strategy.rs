//! Output strategies: how packets affect rows and cardinality.

use serde::{Deserialize, Serialize};

/// How packet data is written into the row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputMode {
    /// Only the workspace is updated.
    #[default]
    Ignore,
    /// Data is assigned to a single column.
    Column,
    /// Object data is shallow-merged into the row; other values are ignored.
    Merge,
}

/// Output strategy for one step: write mode, explosion and target column.
///
/// # Examples
///
/// ```
/// use tessera_core::{OutputMode, OutputStrategy};
///
/// let strategy = OutputStrategy::builder()
///     .mode(OutputMode::Column)
///     .explode(true)
///     .build()
///     .unwrap();
/// assert_eq!(strategy.column_for("search"), "search");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
pub struct OutputStrategy {
    /// Row write mode
    #[serde(default)]
    mode: OutputMode,
    /// One item per packet instead of one aggregated item
    #[serde(default)]
    explode: bool,
    /// Target column for `column` mode; defaults to the namespace
    #[serde(default)]
    #[builder(setter(into, strip_option))]
    column_name: Option<String>,
}

impl OutputStrategy {
    /// Creates a new strategy builder.
    pub fn builder() -> OutputStrategyBuilder {
        OutputStrategyBuilder::default()
    }

    /// Column written in `column` mode.
    pub fn column_for<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.column_name.as_deref().unwrap_or(namespace)
    }
}

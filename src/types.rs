use std::fmt;

use serde::Deserialize;

/// How a pipeline step reacts to reloads.
///
/// - `Background`: started on the first generation and left running across
///   reloads (e.g. a database or a CSS watcher).
/// - `Once`: runs to completion on the first generation only.
/// - `Blocking`: runs to completion on every generation; later steps wait.
/// - `Primary`: the application under development. Restarted on every
///   generation after the previous instance has been torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Background,
    Once,
    Blocking,
    Primary,
}

impl StepKind {
    /// Whether this step takes part in generations after the first one.
    pub fn runs_on_reload(self) -> bool {
        matches!(self, StepKind::Blocking | StepKind::Primary)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Background => "background",
            StepKind::Once => "once",
            StepKind::Blocking => "blocking",
            StepKind::Primary => "primary",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

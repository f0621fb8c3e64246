use std::fmt;
use std::path::PathBuf;

/// Why a step has to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirtyReason {
    /// The caller asked for the step to run regardless of its record.
    Forced,
    /// There is no usable record, so the step has never run successfully
    /// (or its record was lost).
    FreshBuild,
    /// A declared output no longer exists.
    MissingOutput { path: PathBuf },
    /// The digest of the inputs differs from the recorded one.
    InputsChanged { old: String, new: String },
}

impl DirtyReason {
    pub fn is_fresh_build(&self) -> bool {
        matches!(self, DirtyReason::FreshBuild)
    }
}

impl fmt::Display for DirtyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirtyReason::Forced => f.write_str("forced"),
            DirtyReason::FreshBuild => f.write_str("no previous record"),
            DirtyReason::MissingOutput { path } => {
                write!(f, "output `{}` is missing", path.display())
            }
            DirtyReason::InputsChanged { .. } => f.write_str("inputs changed"),
        }
    }
}

use redraft_model::ModelError;
use redraft_patch::PatchError;
use redraft_transform::StepError;
use thiserror::Error;

/// Why a diff attempt was abandoned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiffError {
    /// The remaining patch never produced a schema-valid document.
    #[error("no valid diff possible")]
    NoValidDiff,
    /// A validated patch batch could not be turned into an applicable step.
    #[error("no valid step found")]
    NoValidStep,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("documents differ in more than their marks")]
    Misaligned,
    #[error("recreated steps do not reproduce the target document")]
    ResultMismatch,
}

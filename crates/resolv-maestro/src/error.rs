use thiserror::Error;

use crate::DataField;

#[derive(Debug, Error)]
pub enum MaestroError {
    #[error("bad requirement: `{0}`")]
    BadRequirement(String),

    #[error("requirement `{0}` has not been filed")]
    UnknownRequirement(String),

    #[error("data field `{1}` is already set for requirement `{0}`")]
    DataSlotInUse(String, DataField),

    #[error(
        "no version of `{package}` satisfies the filed constraints ({constraints}); \
         available versions: {available}"
    )]
    VersionConflict {
        package: String,
        constraints: String,
        available: String,
    },
}

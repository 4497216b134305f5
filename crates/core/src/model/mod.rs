mod descriptor;
mod ids;
mod outcome;
mod summary;
mod word;

pub use descriptor::{LaunchParamError, SessionDescriptor};
pub use ids::{GroupId, ParseIdError, SessionId, WordId};
pub use outcome::ItemOutcome;
pub use summary::{SessionSummary, SessionSummaryError};
pub use word::{WordError, WordItem};

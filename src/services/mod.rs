pub mod annotations;
pub mod persistence;
pub mod roster;
pub mod session;

pub use annotations::{AnnotationStore, Stroke};
pub use roster::StudentRoster;
pub use session::{Cursor, GradingSession, ScoreTensor, SessionState, StepOutcome};

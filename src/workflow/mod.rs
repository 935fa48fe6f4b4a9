pub mod cursor;
pub mod grading_flow;

pub use cursor::GradeCtx;
pub use grading_flow::GradingFlow;

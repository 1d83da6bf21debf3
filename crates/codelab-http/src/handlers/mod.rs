//! Route handlers.

pub mod evaluation;
pub mod execution;
pub mod profile;
pub mod progress;

pub use evaluation::{
    challenges_handler, evaluate_output_handler, EvaluateRequest, EvaluateResponse,
};
pub use execution::{run_handler, RunRequest, RunResponse};
pub use profile::{get_profile_by_username_handler, get_profile_handler, save_profile_handler};
pub use progress::{get_progress_handler, save_progress_handler};

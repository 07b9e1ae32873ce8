pub mod artifacts;
pub mod control;
pub mod jobs;
pub mod status;
pub mod ws;

// Debug and diagnostics for detection runs

pub mod pipeline_tracer;

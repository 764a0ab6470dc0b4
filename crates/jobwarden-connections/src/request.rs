//! The fully-expanded, connection-agnostic description of one command run.

use std::collections::HashMap;

/// Everything a connection needs to run one task attempt. Templates are
/// already expanded by the caller; a connection never sees `{{ }}` syntax.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub command: String,
    pub env: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
}

/// What a completed (successful or not) command produced.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub combined_output: Vec<u8>,
}

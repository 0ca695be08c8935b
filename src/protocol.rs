// protocol.rs — JSON documents printed by the inference CLI.
//
// Exactly one of these is written to stdout per invocation, as a single line.

use std::io::Write;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    pub dimension: usize,
}

impl EmbedResponse {
    pub fn new(embedding: Vec<f32>) -> Self {
        let dimension = embedding.len();
        Self { embedding, dimension }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self { error: error.to_string() }
    }
}

/// Serialize `value` as one line and flush.
pub fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

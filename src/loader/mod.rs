use crate::error::EncoderError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

mod parameters;
#[cfg(test)]
mod tests;

pub use parameters::{
    CellWeights, EmbeddingWeights, EncoderWeights, GruWeights, LstmWeights,
    MultiplicativeWeights, TensorSource,
};

/// Recurrent cell variant used for one encoder direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CellType {
    /// Gated recurrent unit
    Gru,
    /// LSTM with a separate memory channel
    Lstm,
    /// Multiplicative LSTM
    Mlstm,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Gru => "gru",
            CellType::Lstm => "lstm",
            CellType::Mlstm => "mlstm",
        }
    }
}

impl FromStr for CellType {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gru" | "gated-recurrent" => Ok(CellType::Gru),
            "lstm" | "memory-cell" => Ok(CellType::Lstm),
            "mlstm" | "multiplicative-gated" => Ok(CellType::Mlstm),
            _ => Err(EncoderError::UnknownCellType(s.to_string())),
        }
    }
}

impl TryFrom<String> for CellType {
    type Error = EncoderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CellType> for String {
    fn from(cell: CellType) -> Self {
        cell.as_str().to_string()
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder section of the model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(rename = "enc-cell", default = "default_cell")]
    pub forward_cell: CellType,
    #[serde(rename = "enc-cell-r", default = "default_cell")]
    pub backward_cell: CellType,
}

fn default_cell() -> CellType {
    CellType::Gru
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            forward_cell: default_cell(),
            backward_cell: default_cell(),
        }
    }
}

impl EncoderConfig {
    pub fn new(forward_cell: CellType, backward_cell: CellType) -> Self {
        Self {
            forward_cell,
            backward_cell,
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse encoder config")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text)
    }
}

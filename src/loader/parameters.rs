use super::{CellType, EncoderConfig};
use crate::error::{EncoderError, Result};
use crate::model::UNK_ID;
use crate::tensor::{Tensor1, Tensor2, TensorView2};
use std::collections::HashMap;
use std::sync::Arc;

/// Named read-only tensors a model was loaded into.
///
/// Biases are stored as single-row tensors.
pub trait TensorSource {
    fn tensor(&self, name: &str) -> Option<TensorView2<'_>>;
}

impl TensorSource for HashMap<String, Tensor2> {
    fn tensor(&self, name: &str) -> Option<TensorView2<'_>> {
        self.get(name).map(|t| t.view())
    }
}

fn check_shape(name: &str, t: &Tensor2, expected: (usize, usize)) -> Result<()> {
    if t.dim() != expected {
        return Err(EncoderError::ShapeMismatch {
            name: name.to_string(),
            expected,
            found: t.dim(),
        });
    }
    Ok(())
}

fn check_len(name: &str, b: &Tensor1, expected: usize) -> Result<()> {
    if b.len() != expected {
        return Err(EncoderError::ShapeMismatch {
            name: name.to_string(),
            expected: (1, expected),
            found: (1, b.len()),
        });
    }
    Ok(())
}

fn fetch(source: &impl TensorSource, name: &str) -> Result<Tensor2> {
    source
        .tensor(name)
        .map(|t| t.to_owned())
        .ok_or_else(|| EncoderError::MissingWeight(name.to_string()))
}

fn fetch_bias(source: &impl TensorSource, name: &str) -> Result<Tensor1> {
    let t = source
        .tensor(name)
        .ok_or_else(|| EncoderError::MissingWeight(name.to_string()))?;
    if t.nrows() != 1 {
        return Err(EncoderError::ShapeMismatch {
            name: name.to_string(),
            expected: (1, t.ncols()),
            found: t.dim(),
        });
    }
    Ok(t.row(0).to_owned())
}

/// One embedding table per factor, in factor order.
#[derive(Debug, Clone)]
pub struct EmbeddingWeights {
    pub tables: Vec<Tensor2>, // each [vocab_size, width]
}

impl EmbeddingWeights {
    pub fn new(tables: Vec<Tensor2>) -> Result<Self> {
        let weights = Self { tables };
        weights.validate()?;
        Ok(weights)
    }

    /// At least one table, each holding the reserved unknown row.
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(EncoderError::InvalidConfig(
                "model has no embedding tables".to_string(),
            ));
        }
        for (factor, table) in self.tables.iter().enumerate() {
            if table.nrows() <= UNK_ID as usize {
                return Err(EncoderError::InvalidEmbeddingTable {
                    factor,
                    rows: table.nrows(),
                });
            }
        }
        Ok(())
    }

    pub fn factor_count(&self) -> usize {
        self.tables.len()
    }

    /// Width of a concatenated embedded row
    pub fn width(&self) -> usize {
        self.tables.iter().map(|t| t.ncols()).sum()
    }

    /// Tables are named `Wemb`, `Wemb1`, `Wemb2`, ... in factor order.
    pub fn load(source: &impl TensorSource) -> Result<Self> {
        let mut tables = vec![fetch(source, "Wemb")?];
        let mut factor = 1;
        while let Some(table) = source.tensor(&format!("Wemb{}", factor)) {
            tables.push(table.to_owned());
            factor += 1;
        }
        Self::new(tables)
    }
}

/// GRU parameters
#[derive(Debug, Clone)]
pub struct GruWeights {
    pub w: Tensor2,   // [input_size, 2 * hidden_size], reset and update gates
    pub b: Tensor1,   // [2 * hidden_size]
    pub u: Tensor2,   // [hidden_size, 2 * hidden_size]
    pub wx: Tensor2,  // [input_size, hidden_size]
    pub bx: Tensor1,  // [hidden_size]
    pub ux: Tensor2,  // [hidden_size, hidden_size]
    pub bx2: Tensor1, // [hidden_size], applied to h @ Ux before the reset gate
}

impl GruWeights {
    pub fn new(
        w: Tensor2,
        b: Tensor1,
        u: Tensor2,
        wx: Tensor2,
        bx: Tensor1,
        ux: Tensor2,
        bx2: Option<Tensor1>,
    ) -> Result<Self> {
        let bx2 = bx2.unwrap_or_else(|| Tensor1::zeros(u.nrows()));
        let weights = Self {
            w,
            b,
            u,
            wx,
            bx,
            ux,
            bx2,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Shapes must agree with `hidden_size` (rows of `U`) and `input_size` (rows of `W`).
    pub fn validate(&self) -> Result<()> {
        let hidden = self.hidden_size();
        let input = self.input_size();
        check_shape("W", &self.w, (input, 2 * hidden))?;
        check_len("b", &self.b, 2 * hidden)?;
        check_shape("U", &self.u, (hidden, 2 * hidden))?;
        check_shape("Wx", &self.wx, (input, hidden))?;
        check_len("bx", &self.bx, hidden)?;
        check_shape("Ux", &self.ux, (hidden, hidden))?;
        check_len("bx2", &self.bx2, hidden)
    }

    pub fn hidden_size(&self) -> usize {
        self.u.nrows()
    }

    pub fn input_size(&self) -> usize {
        self.w.nrows()
    }

    fn load(source: &impl TensorSource, prefix: &str) -> Result<Self> {
        let bx2 = match source.tensor(&format!("{}bx2", prefix)) {
            Some(_) => Some(fetch_bias(source, &format!("{}bx2", prefix))?),
            None => None,
        };
        Self::new(
            fetch(source, &format!("{}W", prefix))?,
            fetch_bias(source, &format!("{}b", prefix))?,
            fetch(source, &format!("{}U", prefix))?,
            fetch(source, &format!("{}Wx", prefix))?,
            fetch_bias(source, &format!("{}bx", prefix))?,
            fetch(source, &format!("{}Ux", prefix))?,
            bx2,
        )
    }
}

/// LSTM parameters, gate blocks ordered input, forget, output, candidate
#[derive(Debug, Clone)]
pub struct LstmWeights {
    pub w: Tensor2, // [input_size, 4 * hidden_size]
    pub b: Tensor1, // [4 * hidden_size]
    pub u: Tensor2, // [hidden_size, 4 * hidden_size]
}

impl LstmWeights {
    pub fn new(w: Tensor2, b: Tensor1, u: Tensor2) -> Result<Self> {
        let weights = Self { w, b, u };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        let hidden = self.hidden_size();
        check_shape("W", &self.w, (self.input_size(), 4 * hidden))?;
        check_len("b", &self.b, 4 * hidden)?;
        check_shape("U", &self.u, (hidden, 4 * hidden))
    }

    pub fn hidden_size(&self) -> usize {
        self.u.nrows()
    }

    pub fn input_size(&self) -> usize {
        self.w.nrows()
    }

    fn load(source: &impl TensorSource, prefix: &str) -> Result<Self> {
        Self::new(
            fetch(source, &format!("{}W", prefix))?,
            fetch_bias(source, &format!("{}b", prefix))?,
            fetch(source, &format!("{}U", prefix))?,
        )
    }
}

/// Multiplicative projection wrapped around an LSTM
#[derive(Debug, Clone)]
pub struct MultiplicativeWeights {
    pub wm: Tensor2, // [input_size, hidden_size]
    pub bm: Tensor1, // [hidden_size]
    pub um: Tensor2, // [hidden_size, hidden_size]
    pub inner: Arc<LstmWeights>,
}

impl MultiplicativeWeights {
    pub fn new(wm: Tensor2, bm: Tensor1, um: Tensor2, inner: LstmWeights) -> Result<Self> {
        let weights = Self {
            wm,
            bm,
            um,
            inner: Arc::new(inner),
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        self.inner.validate()?;
        let hidden = self.inner.hidden_size();
        check_shape("Wm", &self.wm, (self.inner.input_size(), hidden))?;
        check_len("bm", &self.bm, hidden)?;
        check_shape("Um", &self.um, (hidden, hidden))
    }

    fn load(source: &impl TensorSource, prefix: &str) -> Result<Self> {
        let inner = LstmWeights::load(source, prefix)?;
        Self::new(
            fetch(source, &format!("{}Wm", prefix))?,
            fetch_bias(source, &format!("{}bm", prefix))?,
            fetch(source, &format!("{}Um", prefix))?,
            inner,
        )
    }
}

/// Parameters for one direction's cell
#[derive(Debug, Clone)]
pub enum CellWeights {
    Gru(Arc<GruWeights>),
    Lstm(Arc<LstmWeights>),
    Mlstm(Arc<MultiplicativeWeights>),
}

impl CellWeights {
    pub fn cell_type(&self) -> CellType {
        match self {
            CellWeights::Gru(_) => CellType::Gru,
            CellWeights::Lstm(_) => CellType::Lstm,
            CellWeights::Mlstm(_) => CellType::Mlstm,
        }
    }

    pub fn input_size(&self) -> usize {
        match self {
            CellWeights::Gru(w) => w.input_size(),
            CellWeights::Lstm(w) => w.input_size(),
            CellWeights::Mlstm(w) => w.inner.input_size(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CellWeights::Gru(w) => w.validate(),
            CellWeights::Lstm(w) => w.validate(),
            CellWeights::Mlstm(w) => w.validate(),
        }
    }

    pub fn load(source: &impl TensorSource, prefix: &str, cell: CellType) -> Result<Self> {
        Ok(match cell {
            CellType::Gru => CellWeights::Gru(Arc::new(GruWeights::load(source, prefix)?)),
            CellType::Lstm => CellWeights::Lstm(Arc::new(LstmWeights::load(source, prefix)?)),
            CellType::Mlstm => {
                CellWeights::Mlstm(Arc::new(MultiplicativeWeights::load(source, prefix)?))
            }
        })
    }
}

/// All encoder parameters. Read-only once built; clones share the same tensors.
#[derive(Debug, Clone)]
pub struct EncoderWeights {
    pub embeddings: Arc<EmbeddingWeights>,
    pub forward: CellWeights,
    pub backward: CellWeights,
}

impl EncoderWeights {
    pub const FORWARD_PREFIX: &'static str = "encoder_";
    pub const BACKWARD_PREFIX: &'static str = "encoder_r_";

    pub fn new(
        embeddings: EmbeddingWeights,
        forward: CellWeights,
        backward: CellWeights,
    ) -> Result<Self> {
        let weights = Self {
            embeddings: Arc::new(embeddings),
            forward,
            backward,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Check every tensor and that both cells accept the embedded width.
    ///
    /// Fields are public, so `Encoder::new` runs this again on whatever it is handed.
    pub fn validate(&self) -> Result<()> {
        self.embeddings.validate()?;
        let width = self.embeddings.width();
        for (name, cell) in [("forward", &self.forward), ("backward", &self.backward)] {
            cell.validate()?;
            if cell.input_size() != width {
                return Err(EncoderError::InvalidConfig(format!(
                    "{} cell expects input width {}, embeddings produce {}",
                    name,
                    cell.input_size(),
                    width
                )));
            }
        }
        Ok(())
    }

    /// Pick the tensors the configured cells need out of `source`.
    pub fn load(source: &impl TensorSource, config: &EncoderConfig) -> Result<Self> {
        let embeddings = EmbeddingWeights::load(source)?;
        let forward = CellWeights::load(source, Self::FORWARD_PREFIX, config.forward_cell)?;
        let backward = CellWeights::load(source, Self::BACKWARD_PREFIX, config.backward_cell)?;
        Self::new(embeddings, forward, backward)
    }
}

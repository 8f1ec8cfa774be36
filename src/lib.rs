pub mod error;
pub mod kernels;
pub mod loader;
pub mod model;
pub mod tensor;

pub use error::{EncoderError, Result};
pub use loader::{CellType, EncoderConfig, EncoderWeights, TensorSource};
pub use model::{Encoder, EncoderOutput, FactorBundle, Sentence, Sentences, Word};

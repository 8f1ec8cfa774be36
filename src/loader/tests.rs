use super::*;
use crate::error::EncoderError;
use crate::tensor::Tensor2;
use ndarray::Array2;
use std::collections::HashMap;

fn filled(rows: usize, cols: usize, value: f32) -> Tensor2 {
    Array2::from_elem((rows, cols), value)
}

fn insert_gru(t: &mut HashMap<String, Tensor2>, prefix: &str, input: usize, dim: usize) {
    t.insert(format!("{}W", prefix), filled(input, 2 * dim, 0.1));
    t.insert(format!("{}b", prefix), filled(1, 2 * dim, 0.0));
    t.insert(format!("{}U", prefix), filled(dim, 2 * dim, 0.1));
    t.insert(format!("{}Wx", prefix), filled(input, dim, 0.1));
    t.insert(format!("{}bx", prefix), filled(1, dim, 0.0));
    t.insert(format!("{}Ux", prefix), filled(dim, dim, 0.1));
}

fn insert_lstm(t: &mut HashMap<String, Tensor2>, prefix: &str, input: usize, dim: usize) {
    t.insert(format!("{}W", prefix), filled(input, 4 * dim, 0.1));
    t.insert(format!("{}b", prefix), filled(1, 4 * dim, 0.0));
    t.insert(format!("{}U", prefix), filled(dim, 4 * dim, 0.1));
}

fn insert_mlstm(t: &mut HashMap<String, Tensor2>, prefix: &str, input: usize, dim: usize) {
    insert_lstm(t, prefix, input, dim);
    t.insert(format!("{}Wm", prefix), filled(input, dim, 0.1));
    t.insert(format!("{}bm", prefix), filled(1, dim, 0.0));
    t.insert(format!("{}Um", prefix), filled(dim, dim, 0.1));
}

#[test]
fn test_cell_type_parsing() {
    assert_eq!("gru".parse::<CellType>().unwrap(), CellType::Gru);
    assert_eq!("LSTM".parse::<CellType>().unwrap(), CellType::Lstm);
    assert_eq!("mlstm".parse::<CellType>().unwrap(), CellType::Mlstm);
    assert_eq!("gated-recurrent".parse::<CellType>().unwrap(), CellType::Gru);
    assert_eq!("memory-cell".parse::<CellType>().unwrap(), CellType::Lstm);
    assert_eq!(
        "multiplicative-gated".parse::<CellType>().unwrap(),
        CellType::Mlstm
    );
}

#[test]
fn test_unknown_cell_type() {
    let err = "tree-lstm".parse::<CellType>().unwrap_err();
    assert!(matches!(err, EncoderError::UnknownCellType(ref name) if name == "tree-lstm"));
}

#[test]
fn test_config_deserialization() {
    let json = r#"{ "enc-cell": "lstm", "enc-cell-r": "mlstm" }"#;
    let config = EncoderConfig::from_json(json).unwrap();

    assert_eq!(config.forward_cell, CellType::Lstm);
    assert_eq!(config.backward_cell, CellType::Mlstm);
}

#[test]
fn test_config_defaults_to_gru() {
    let config = EncoderConfig::from_json("{}").unwrap();
    assert_eq!(config, EncoderConfig::default());
    assert_eq!(config.forward_cell, CellType::Gru);
    assert_eq!(config.backward_cell, CellType::Gru);
}

#[test]
fn test_config_rejects_unknown_cell() {
    let err = EncoderConfig::from_json(r#"{ "enc-cell": "transformer" }"#).unwrap_err();
    assert!(format!("{:#}", err).contains("transformer"));
}

#[test]
fn test_config_round_trip_uses_short_names() {
    let config = EncoderConfig::new(CellType::Mlstm, CellType::Gru);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""enc-cell":"mlstm""#));
    assert_eq!(EncoderConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("seqenc-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "enc-cell-r": "lstm" }"#).unwrap();

    let config = EncoderConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.forward_cell, CellType::Gru);
    assert_eq!(config.backward_cell, CellType::Lstm);
}

#[test]
fn test_config_from_missing_file() {
    let err = EncoderConfig::from_file("/nonexistent/seqenc/config.json").unwrap_err();
    assert!(format!("{}", err).contains("Failed to read config file"));
}

#[test]
fn test_embeddings_detect_factors() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(10, 4, 0.0));
    tensors.insert("Wemb1".to_string(), filled(5, 2, 0.0));
    tensors.insert("Wemb2".to_string(), filled(3, 1, 0.0));
    // gap: Wemb4 is never reached
    tensors.insert("Wemb4".to_string(), filled(3, 8, 0.0));

    let embeddings = EmbeddingWeights::load(&tensors).unwrap();

    assert_eq!(embeddings.factor_count(), 3);
    assert_eq!(embeddings.width(), 7);
}

#[test]
fn test_embedding_table_needs_unknown_row() {
    let err = EmbeddingWeights::new(vec![filled(1, 4, 0.0)]).unwrap_err();
    assert!(matches!(
        err,
        EncoderError::InvalidEmbeddingTable { factor: 0, rows: 1 }
    ));
}

#[test]
fn test_load_gru_encoder() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 4, 0.0));
    insert_gru(&mut tensors, "encoder_", 4, 6);
    insert_gru(&mut tensors, "encoder_r_", 4, 6);

    let weights = EncoderWeights::load(&tensors, &EncoderConfig::default()).unwrap();

    assert_eq!(weights.forward.cell_type(), CellType::Gru);
    assert_eq!(weights.backward.cell_type(), CellType::Gru);
    match &weights.forward {
        CellWeights::Gru(gru) => {
            assert_eq!(gru.hidden_size(), 6);
            // bx2 defaults to zeros
            assert!(gru.bx2.iter().all(|&v| v == 0.0));
        }
        other => panic!("unexpected cell weights {:?}", other.cell_type()),
    }
}

#[test]
fn test_load_gru_with_second_bias() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 4, 0.0));
    insert_gru(&mut tensors, "encoder_", 4, 6);
    insert_gru(&mut tensors, "encoder_r_", 4, 6);
    tensors.insert("encoder_bx2".to_string(), filled(1, 6, 0.25));

    let weights = EncoderWeights::load(&tensors, &EncoderConfig::default()).unwrap();

    match (&weights.forward, &weights.backward) {
        (CellWeights::Gru(fw), CellWeights::Gru(bw)) => {
            assert!(fw.bx2.iter().all(|&v| v == 0.25));
            assert!(bw.bx2.iter().all(|&v| v == 0.0));
        }
        _ => panic!("expected GRU weights in both directions"),
    }
}

#[test]
fn test_load_mixed_cells() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 3, 0.0));
    tensors.insert("Wemb1".to_string(), filled(8, 2, 0.0));
    insert_lstm(&mut tensors, "encoder_", 5, 6);
    insert_mlstm(&mut tensors, "encoder_r_", 5, 4);

    let config = EncoderConfig::new(CellType::Lstm, CellType::Mlstm);
    let weights = EncoderWeights::load(&tensors, &config).unwrap();

    assert_eq!(weights.forward.cell_type(), CellType::Lstm);
    assert_eq!(weights.backward.cell_type(), CellType::Mlstm);
    assert_eq!(weights.forward.input_size(), 5);
    assert_eq!(weights.backward.input_size(), 5);
}

#[test]
fn test_load_missing_weight() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 4, 0.0));
    insert_gru(&mut tensors, "encoder_", 4, 6);
    insert_gru(&mut tensors, "encoder_r_", 4, 6);
    tensors.remove("encoder_r_Ux");

    let err = EncoderWeights::load(&tensors, &EncoderConfig::default()).unwrap_err();
    assert!(matches!(err, EncoderError::MissingWeight(ref name) if name == "encoder_r_Ux"));
}

#[test]
fn test_load_rejects_bad_bias_shape() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 4, 0.0));
    insert_gru(&mut tensors, "encoder_", 4, 6);
    insert_gru(&mut tensors, "encoder_r_", 4, 6);
    tensors.insert("encoder_b".to_string(), filled(2, 12, 0.0));

    let err = EncoderWeights::load(&tensors, &EncoderConfig::default()).unwrap_err();
    assert!(matches!(err, EncoderError::ShapeMismatch { ref name, .. } if name == "encoder_b"));
}

#[test]
fn test_load_rejects_wrong_gate_width() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 4, 0.0));
    insert_gru(&mut tensors, "encoder_", 4, 6);
    insert_gru(&mut tensors, "encoder_r_", 4, 6);
    tensors.insert("encoder_U".to_string(), filled(6, 6, 0.0));

    let err = EncoderWeights::load(&tensors, &EncoderConfig::default()).unwrap_err();
    assert!(matches!(err, EncoderError::ShapeMismatch { .. }));
}

#[test]
fn test_load_rejects_input_width_mismatch() {
    let mut tensors = HashMap::new();
    tensors.insert("Wemb".to_string(), filled(20, 4, 0.0));
    insert_gru(&mut tensors, "encoder_", 3, 6);
    insert_gru(&mut tensors, "encoder_r_", 4, 6);

    let err = EncoderWeights::load(&tensors, &EncoderConfig::default()).unwrap_err();
    assert!(matches!(err, EncoderError::InvalidConfig(_)));
}

#[test]
fn test_validate_hand_built_embeddings() {
    let empty = EmbeddingWeights { tables: Vec::new() };
    assert!(matches!(empty.validate(), Err(EncoderError::InvalidConfig(_))));

    let tiny = EmbeddingWeights {
        tables: vec![filled(4, 2, 0.0), filled(1, 2, 0.0)],
    };
    assert!(matches!(
        tiny.validate(),
        Err(EncoderError::InvalidEmbeddingTable { factor: 1, rows: 1 })
    ));
}

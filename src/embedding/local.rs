//! ONNX Runtime embedder for all-MiniLM-L6-v2.
//!
//! Tokenizes one text, runs the model, mean-pools token embeddings under the
//! attention mask, and L2-normalizes the result.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Longest token sequence fed to the model (it was trained at 256).
const MAX_TOKENS: usize = 256;

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Tokenizer is Send+Sync; the Session is only reached through the Mutex.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = cache_dir.join("model.onnx");
        let tokenizer_path = cache_dir.join("tokenizer.json");

        for required in [&model_path, &tokenizer_path] {
            anyhow::ensure!(
                required.exists(),
                "{} not found. Run `memdash model download` first, or set [embedding] provider = \"hashed\".",
                required.display()
            );
        }

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        tracing::info!(
            model = %config.model,
            dir = %cache_dir.display(),
            "local embedding model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Run the model and return the flat `[seq_len * EMBEDDING_DIM]` token embeddings.
    fn token_embeddings(&self, ids: &[i64], mask: &[i64]) -> Result<(usize, Vec<f32>)> {
        let shape = vec![1i64, ids.len() as i64];
        let input_ids = Tensor::from_array((shape.clone(), ids.to_vec().into_boxed_slice()))?;
        let attention = Tensor::from_array((shape.clone(), mask.to_vec().into_boxed_slice()))?;
        let segments = Tensor::from_array((shape, vec![0i64; ids.len()].into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention,
            "token_type_ids" => segments,
        })?;

        let value = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);
        let (dims, data) = value
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;

        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected model output shape {dims:?}"
        );
        Ok((dims[1] as usize, data.to_vec()))
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&i| i as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();

        let (seq_len, data) = self.token_embeddings(&ids, &mask)?;
        let mut pooled = mean_pool(&data, &mask, seq_len);
        l2_normalize(&mut pooled);
        Ok(pooled)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Average the token rows whose attention mask is set.
fn mean_pool(data: &[f32], mask: &[i64], seq_len: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; EMBEDDING_DIM];
    let mut count = 0.0f32;
    for (s, row) in data.chunks(EMBEDDING_DIM).take(seq_len).enumerate() {
        if mask.get(s).copied().unwrap_or(0) == 0 {
            continue;
        }
        sum.iter_mut().zip(row).for_each(|(acc, x)| *acc += x);
        count += 1.0;
    }
    if count > 0.0 {
        sum.iter_mut().for_each(|x| *x /= count);
    }
    sum
}

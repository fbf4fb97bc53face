//! Semantic Similarity Scorer: cosine similarity over externally supplied embeddings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::embedding_client::{EmbeddingError, EmbeddingProvider};

/// Cosine similarity rescaled from [-1, 1] to [0, 1] via `(cos + 1) / 2`.
///
/// Returns `None` when either vector is absent, empty, zero-length or the
/// dimensions disagree: an undefined signal, not a zero one.
pub fn semantic_score(a: Option<&[f32]>, b: Option<&[f32]>) -> Option<f64> {
    let (a, b) = (a?, b?);
    if a.len() != b.len() {
        warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; semantic score undefined"
        );
        return None;
    }
    if a.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let cos = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    Some((cos + 1.0) / 2.0)
}

/// A profile's embedding input: a stored vector if the row has one, else the text to embed.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub stored: Option<Vec<f32>>,
    pub text: String,
}

/// Resolves embeddings under a per-call deadline. Timeouts and provider
/// failures degrade to an absent vector instead of failing the caller.
#[derive(Clone)]
pub struct EmbeddingResolver {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    limiter: Arc<Semaphore>,
}

impl EmbeddingResolver {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            provider,
            timeout,
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub async fn resolve(&self, input: EmbeddingInput) -> Option<Vec<f32>> {
        if let Some(stored) = input.stored.filter(|v| !v.is_empty()) {
            return Some(stored);
        }
        let _permit = self.limiter.acquire().await.ok()?;
        let outcome = match tokio::time::timeout(self.timeout, self.provider.embed(&input.text)).await {
            Ok(result) => result,
            Err(_) => Err(EmbeddingError::Timeout(self.timeout)),
        };
        match outcome {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Embedding unavailable, falling back to skill-only scoring: {e}");
                None
            }
        }
    }

    /// Resolves many inputs concurrently; output order matches input order.
    pub async fn resolve_all(&self, inputs: Vec<EmbeddingInput>) -> Vec<Option<Vec<f32>>> {
        let mut results = vec![None; inputs.len()];
        let mut tasks = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let resolver = self.clone();
            tasks.spawn(async move { (index, resolver.resolve(input).await) });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, vector)) => results[index] = vector,
                Err(e) => warn!("Embedding task failed: {e}"),
            }
        }
        results
    }
}

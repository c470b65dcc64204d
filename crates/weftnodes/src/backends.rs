use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tokio::sync::RwLock;
use weftcore::{
    ChatParameters, ChatService, EmbeddingService, ScoredDocument, ServiceError, Value, VectorStore,
};

/// Brute-force cosine similarity index held in memory
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<String, (Vec<f32>, Value)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>, ServiceError> {
        let entries = self.entries.read().await;
        let mut scored = Vec::with_capacity(entries.len());
        for (document_id, (stored, payload)) in entries.iter() {
            if stored.len() != embedding.len() {
                return Err(ServiceError::invalid_request(
                    "vector store",
                    format!(
                        "query has {} dimensions, '{}' has {}",
                        embedding.len(),
                        document_id,
                        stored.len()
                    ),
                ));
            }
            scored.push(ScoredDocument {
                document_id: document_id.clone(),
                score: cosine_similarity(embedding, stored),
                payload: Some(payload.clone()),
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn upsert(&self, document_id: &str, embedding: Vec<f32>, payload: Value) -> Result<(), ServiceError> {
        if embedding.is_empty() {
            return Err(ServiceError::invalid_request("vector store", "empty embedding"));
        }
        self.entries
            .write()
            .await
            .insert(document_id.to_string(), (embedding, payload));
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Deterministic bag-of-words embeddings via feature hashing.
///
/// Good enough for offline retrieval and tests; texts sharing words score
/// higher than unrelated ones.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Offline chat backend that answers with the prompt it was given
pub struct EchoChatService;

#[async_trait]
impl ChatService for EchoChatService {
    async fn complete(&self, prompt: &str, parameters: &ChatParameters) -> Result<String, ServiceError> {
        let mut response = String::new();
        if let Some(system) = &parameters.system_prompt {
            response.push_str(&format!("[{}] ", system));
        }
        response.push_str("Echo: ");
        response.push_str(prompt);

        if let Some(max_tokens) = parameters.max_tokens {
            let words: Vec<&str> = response.split_whitespace().collect();
            if words.len() > max_tokens as usize {
                response = words[..max_tokens as usize].join(" ");
            }
        }
        Ok(response)
    }
}

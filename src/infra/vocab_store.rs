// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds and persists the word-level vocabulary the text branch
// tokenises with.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. The workable approach is to build the
// tokenizer JSON manually in the HuggingFace format and load it
// back, bypassing the trainer type mismatch entirely.
//
// The vocabulary is frequency-ranked words from the training
// corpus, lowercased, with two reserved ids:
//   [PAD] = 0   padding positions
//   [UNK] = 1   out-of-vocabulary words
//
// The same tokenizer.json is reloaded at inference time, so
// training and prediction always share one vocabulary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::domain::errors::PipelineError;

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn tokenizer_path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn exists(&self) -> bool {
        self.tokenizer_path().exists()
    }

    /// Load a previously saved tokenizer.
    pub fn load(&self) -> Result<Tokenizer, PipelineError> {
        let path = self.tokenizer_path();
        Tokenizer::from_file(&path).map_err(|e| PipelineError::ModelIo {
            path:   path.clone(),
            reason: format!("cannot load tokenizer: {e}"),
        })
    }

    /// Build a word-level vocabulary from the corpus and write a
    /// valid tokenizer JSON, then load it back as a Tokenizer.
    pub fn build_and_save(
        &self,
        texts:      &[String],
        vocab_size: usize,
    ) -> Result<Tokenizer, PipelineError> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: Rank words by corpus frequency ────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace() {
                let w = word.to_lowercase();
                let w = w.trim_matches(|c: char| !c.is_alphanumeric());
                if !w.is_empty() {
                    *freq.entry(w.to_string()).or_insert(0) += 1;
                }
            }
        }

        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        // Reserve 2 ids for the special tokens
        words.truncate(vocab_size.saturating_sub(2));

        // ── Step 2: Assign ids, specials first ────────────────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]": 0,
            "[UNK]": 1,
        });
        let mut next_id = 2usize;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let path = self.tokenizer_path();
        let body = serde_json::to_string_pretty(&tokenizer_json).map_err(|e| {
            PipelineError::ModelIo { path: path.clone(), reason: e.to_string() }
        })?;
        std::fs::write(&path, body).map_err(|e| PipelineError::ModelIo {
            path:   path.clone(),
            reason: format!("cannot write tokenizer JSON: {e}"),
        })?;

        tracing::info!(
            "Vocabulary built: {} entries, saved to '{}'",
            next_id,
            path.display()
        );

        self.load()
    }
}

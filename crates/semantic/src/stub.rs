use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::SemanticConfig;

/// Deterministic stand-in for a sentence encoder.
///
/// Each lowercase alphanumeric token is hashed into one of `cfg.stub_dim` buckets with a
/// hash-derived sign (feature hashing). Identical texts map to identical vectors, texts with
/// no shared vocabulary land close to orthogonal, and text without any token yields the zero
/// vector.
pub(crate) fn make_stub_embedding(text: &str, cfg: &SemanticConfig) -> Vec<f32> {
    let dim = cfg.stub_dim.max(1);
    let mut v = vec![0f32; dim];
    for token in tokens(text) {
        let h = hash64(token.as_bytes());
        let bucket = (h % dim as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign;
    }
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(normalize: bool) -> SemanticConfig {
        SemanticConfig {
            normalize,
            ..SemanticConfig::stub()
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn uses_configured_dimension() {
        let cfg = SemanticConfig {
            stub_dim: 32,
            ..cfg(false)
        };
        assert_eq!(make_stub_embedding("hello world", &cfg).len(), 32);
        assert_eq!(make_stub_embedding("hello world", &SemanticConfig::stub()).len(), 384);
    }

    #[test]
    fn deterministic() {
        let a = make_stub_embedding("The cat sat on the mat.", &cfg(true));
        let b = make_stub_embedding("The cat sat on the mat.", &cfg(true));
        assert_eq!(a, b);
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let a = make_stub_embedding("The cat sat on the mat.", &cfg(false));
        let b = make_stub_embedding("the CAT sat, on the mat", &cfg(false));
        assert_eq!(a, b);
    }

    #[test]
    fn counts_repeated_tokens() {
        let v = make_stub_embedding("echo echo echo", &cfg(false));
        let total: f32 = v.iter().map(|x| x.abs()).sum();
        assert_eq!(total, 3.0);
    }

    #[test]
    fn disjoint_vocabulary_is_nearly_orthogonal() {
        let a = make_stub_embedding(
            "Photosynthesis converts light into chemical energy in plants.",
            &cfg(true),
        );
        let b = make_stub_embedding("Bananas are yellow and curved.", &cfg(true));
        assert!(cosine(&a, &b).abs() < 0.5);
    }

    #[test]
    fn normalized_output_has_unit_length() {
        let v = make_stub_embedding("a few words here", &cfg(true));
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tokenless_text_is_zero_vector() {
        let v = make_stub_embedding("?!... --", &cfg(true));
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn unicode_tokens_hash() {
        let v = make_stub_embedding("Hello 世界", &cfg(false));
        assert!(v.iter().any(|&x| x != 0.0));
    }
}

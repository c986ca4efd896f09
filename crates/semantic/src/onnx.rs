use onnxruntime::ndarray::{Array, Array2};
use onnxruntime::session::Session;
use std::cell::RefCell;
use tokenizers::{Tokenizer, TruncationParams};

use crate::cache::CachedModel;
use crate::SemanticError;

/// Runs one padded batch through the cached session and returns one sentence vector per text.
///
/// Sentence-transformer exports emit token embeddings shaped `[batch, seq, hidden]`; those are
/// mean-pooled over the attention mask. Exports that already pool (`[batch, hidden]`) pass
/// through unchanged.
pub(crate) fn run_onnx_embeddings<T>(
    handle: &CachedModel,
    texts: &[T],
) -> Result<Vec<Vec<f32>>, SemanticError>
where
    T: AsRef<str>,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let (encoded, max_len) = encode_documents(&handle.tokenizer, texts)?;
    let (input_ids, attn_mask) = build_padded_arrays(encoded, max_len)?;
    let mask = attn_mask.clone();
    let (shape, flat) = execute_session(&handle.session, input_ids, attn_mask)?;
    pool_output(&shape, &flat, &mask)
}

/// Caps encodings at `max_sequence_length` tokens. The tokenizer reserves room for the
/// special tokens its post-processor adds, so `[CLS]`/`[SEP]` survive truncation.
pub(crate) fn limit_sequence_length(
    tokenizer: &mut Tokenizer,
    max_sequence_length: usize,
) -> Result<(), SemanticError> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_sequence_length,
            ..Default::default()
        }))
        .map_err(|e| SemanticError::InvalidConfig(format!("tokenizer truncation: {e}")))?;
    Ok(())
}

struct EncodedDoc {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

fn encode_documents<T>(
    tokenizer: &Tokenizer,
    texts: &[T],
) -> Result<(Vec<EncodedDoc>, usize), SemanticError>
where
    T: AsRef<str>,
{
    let mut encoded = Vec::with_capacity(texts.len());
    let mut max_len = 0usize;

    for text in texts {
        let encoding = tokenizer
            .encode(text.as_ref(), true)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        max_len = max_len.max(ids.len());
        encoded.push(EncodedDoc { ids, mask });
    }

    Ok((encoded, max_len))
}

fn build_padded_arrays(
    encoded: Vec<EncodedDoc>,
    max_len: usize,
) -> Result<(Array2<i64>, Array2<i64>), SemanticError> {
    let seq_len = max_len.max(1);
    let batch = encoded.len();
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedDoc { ids, mask } in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        let pad = seq_len.saturating_sub(ids.len());
        id_storage.extend(ids);
        mask_storage.extend(mask);
        id_storage.extend(std::iter::repeat_n(0, pad));
        mask_storage.extend(std::iter::repeat_n(0, pad));
    }

    let input_ids = Array::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attn_mask = Array::from_shape_vec((batch, seq_len), mask_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    Ok((input_ids, attn_mask))
}

/// Feeds the session and returns the first output as `(shape, row-major values)`.
fn execute_session(
    session: &RefCell<Session<'static>>,
    input_ids: Array2<i64>,
    attn_mask: Array2<i64>,
) -> Result<(Vec<usize>, Vec<f32>), SemanticError> {
    let (batch, seq_len) = input_ids.dim();
    let mut guard = session.borrow_mut();
    let session_ref = &mut *guard;
    let mut runtime_inputs = Vec::with_capacity(session_ref.inputs.len());
    let mut input_ids_tensor = Some(input_ids);
    let mut attn_mask_tensor = Some(attn_mask);

    for input in &session_ref.inputs {
        let tensor = match input.name.as_str() {
            "input_ids" => input_ids_tensor.take(),
            "attention_mask" => attn_mask_tensor.take(),
            "token_type_ids" => Some(Array::from_elem((batch, seq_len), 0_i64)),
            other => {
                return Err(SemanticError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        }
        .ok_or_else(|| {
            SemanticError::InvalidConfig(format!("model requested `{}` twice", input.name))
        })?;
        runtime_inputs.push(tensor.into_dyn());
    }

    if runtime_inputs.is_empty() {
        return Err(SemanticError::Inference(
            "model did not declare any inputs".into(),
        ));
    }

    let outputs = session_ref
        .run::<i64, f32, _>(runtime_inputs)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let output_tensor = outputs
        .into_iter()
        .next()
        .ok_or_else(|| SemanticError::Inference("model returned no outputs".into()))?;

    let shape = output_tensor.shape().to_vec();
    let flat: Vec<f32> = output_tensor.iter().copied().collect();
    Ok((shape, flat))
}

fn pool_output(
    shape: &[usize],
    flat: &[f32],
    mask: &Array2<i64>,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let expected: usize = shape.iter().product();
    if expected != flat.len() {
        return Err(SemanticError::Inference(format!(
            "model output has {} values for shape {shape:?}",
            flat.len()
        )));
    }

    match *shape {
        [batch, hidden] => Ok(flat
            .chunks(hidden.max(1))
            .take(batch)
            .map(<[f32]>::to_vec)
            .collect()),
        [batch, seq_len, hidden] => {
            if mask.dim() != (batch, seq_len) {
                return Err(SemanticError::Inference(format!(
                    "attention mask {:?} does not match output shape {shape:?}",
                    mask.dim()
                )));
            }
            let mut pooled = Vec::with_capacity(batch);
            for b in 0..batch {
                let mut sum = vec![0f32; hidden];
                let mut count = 0f32;
                for t in 0..seq_len {
                    if mask[[b, t]] == 0 {
                        continue;
                    }
                    let offset = (b * seq_len + t) * hidden;
                    for (acc, value) in sum.iter_mut().zip(&flat[offset..offset + hidden]) {
                        *acc += value;
                    }
                    count += 1.0;
                }
                let denom = count.max(1e-9);
                sum.iter_mut().for_each(|v| *v /= denom);
                pooled.push(sum);
            }
            Ok(pooled)
        }
        _ => Err(SemanticError::Inference(format!(
            "unsupported model output shape {shape:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    // Word-level vocabulary with BERT-style [CLS] ... [SEP] wrapping.
    const TINY_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": {
            "type": "BertProcessing",
            "sep": ["[SEP]", 2],
            "cls": ["[CLS]", 1]
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[UNK]": 0, "[CLS]": 1, "[SEP]": 2, "a": 3, "b": 4, "c": 5 },
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn truncation_keeps_closing_separator() {
        let mut tokenizer = Tokenizer::from_str(TINY_TOKENIZER).unwrap();
        limit_sequence_length(&mut tokenizer, 4).unwrap();

        let (encoded, max_len) = encode_documents(&tokenizer, &["a b c a b", "c"][..]).unwrap();
        assert_eq!(max_len, 4);
        assert_eq!(encoded[0].ids, vec![1, 3, 4, 2]);
        assert_eq!(encoded[0].mask, vec![1, 1, 1, 1]);
        assert_eq!(encoded[1].ids, vec![1, 5, 2]);
    }

    #[test]
    fn pads_to_longest_sequence() {
        let docs = vec![
            EncodedDoc {
                ids: vec![101, 7, 102],
                mask: vec![1, 1, 1],
            },
            EncodedDoc {
                ids: vec![101, 102],
                mask: vec![1, 1],
            },
        ];
        let (ids, mask) = build_padded_arrays(docs, 3).unwrap();
        assert_eq!(ids.dim(), (2, 3));
        assert_eq!(ids[[1, 2]], 0);
        assert_eq!(mask[[1, 2]], 0);
        assert_eq!(mask[[0, 2]], 1);
    }

    #[test]
    fn rejects_mismatched_id_and_mask() {
        let docs = vec![EncodedDoc {
            ids: vec![1, 2],
            mask: vec![1],
        }];
        assert!(build_padded_arrays(docs, 2).is_err());
    }

    #[test]
    fn mean_pools_only_attended_tokens() {
        // batch 1, seq 3, hidden 2; last token is padding.
        let flat = vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let mask = Array::from_shape_vec((1, 3), vec![1, 1, 0]).unwrap();
        let pooled = pool_output(&[1, 3, 2], &flat, &mask).unwrap();
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn pooled_outputs_pass_through() {
        let flat = vec![0.1, 0.2, 0.3, 0.4];
        let mask = Array::from_shape_vec((2, 1), vec![1, 1]).unwrap();
        let pooled = pool_output(&[2, 2], &flat, &mask).unwrap();
        assert_eq!(pooled, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn rejects_unknown_output_rank() {
        let mask = Array::from_shape_vec((1, 1), vec![1]).unwrap();
        assert!(pool_output(&[4], &[0.0; 4], &mask).is_err());
        assert!(pool_output(&[1, 2], &[0.0; 3], &mask).is_err());
    }
}

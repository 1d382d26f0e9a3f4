use super::*;

fn numbered_document(id: &str, token_count: usize) -> Document {
    let text = (0..token_count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ");
    Document {
        id: id.to_string(),
        text,
        metadata: BTreeMap::from([("source".to_string(), "https://example.com".to_string())]),
    }
}

fn chunk_tokens(chunk: &Chunk) -> Vec<String> {
    chunk.text.split_whitespace().map(String::from).collect()
}

#[test]
fn small_document_yields_single_chunk() {
    let doc = numbered_document("doc1", 500);
    let chunks = split_documents(&[doc], 800, 100).expect("split should succeed");

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].token_count, 500);
    assert_eq!(chunks[0].source_document_id, "doc1");
}

#[test]
fn windows_respect_max_tokens_and_overlap() {
    let doc = numbered_document("doc1", 1000);
    let chunks = split_documents(&[doc], 800, 100).expect("split should succeed");

    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.token_count <= 800));
    assert_eq!(chunks[0].token_count, 800);
    assert_eq!(chunks[1].token_count, 300);

    // The second window starts max - overlap tokens in, so its first
    // overlap tokens repeat the end of the first window.
    let first = chunk_tokens(&chunks[0]);
    let second = chunk_tokens(&chunks[1]);
    assert_eq!(first[700..800], second[..100]);
    assert_eq!(second[0], "w700");
}

#[test]
fn chunks_reconstruct_the_token_stream() {
    let doc = numbered_document("doc1", 2500);
    let original: Vec<String> = doc.text.split_whitespace().map(String::from).collect();
    let chunks = split_documents(&[doc], 800, 100).expect("split should succeed");

    let mut reconstructed: Vec<String> = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let tokens = chunk_tokens(chunk);
        if i == 0 {
            reconstructed.extend(tokens);
        } else {
            reconstructed.extend(tokens.into_iter().skip(100));
        }
    }

    assert_eq!(reconstructed, original);
}

#[test]
fn splitting_is_deterministic() {
    let doc = numbered_document("doc1", 1234);
    let first = split_documents(std::slice::from_ref(&doc), 300, 40).expect("split should succeed");
    let second = split_documents(&[doc], 300, 40).expect("split should succeed");

    assert_eq!(first, second);
}

#[test]
fn overlap_equal_to_max_is_rejected() {
    let doc = numbered_document("doc1", 100);
    let result = split_documents(&[doc], 50, 50);

    assert!(matches!(result, Err(AnswerError::Configuration(_))));
}

#[test]
fn overlap_larger_than_max_is_rejected() {
    let doc = numbered_document("doc1", 100);
    let result = split_documents(&[doc], 50, 80);

    assert!(matches!(result, Err(AnswerError::Configuration(_))));
}

#[test]
fn zero_chunk_size_is_rejected() {
    let doc = numbered_document("doc1", 100);
    let result = split_documents(&[doc], 0, 0);

    assert!(matches!(result, Err(AnswerError::Configuration(_))));
}

#[test]
fn empty_document_yields_no_chunks() {
    let doc = Document {
        id: "doc1".to_string(),
        text: "   \n\t ".to_string(),
        metadata: BTreeMap::new(),
    };
    let chunks = split_documents(&[doc], 800, 100).expect("split should succeed");

    assert!(chunks.is_empty());
}

#[test]
fn chunk_indices_restart_per_document() {
    let docs = vec![numbered_document("doc1", 1000), numbered_document("doc2", 1000)];
    let chunks = split_documents(&docs, 800, 100).expect("split should succeed");

    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[1].chunk_index, 1);
    assert_eq!(chunks[2].chunk_index, 0);
    assert_eq!(chunks[3].chunk_index, 1);
    assert_eq!(chunks[0].source_document_id, "doc1");
    assert_eq!(chunks[2].source_document_id, "doc2");
}

#[test]
fn metadata_is_copied_and_extended() {
    let doc = numbered_document("doc1", 1000);
    let chunks = split_documents(&[doc], 800, 100).expect("split should succeed");

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(
            chunk.metadata.get("source"),
            Some(&"https://example.com".to_string())
        );
        assert_eq!(
            chunk.metadata.get(METADATA_CHUNK_INDEX),
            Some(&i.to_string())
        );
    }
}

#[test]
fn whitespace_is_normalized_within_chunks() {
    let doc = Document {
        id: "doc1".to_string(),
        text: "alpha\n\nbeta\t gamma   delta".to_string(),
        metadata: BTreeMap::new(),
    };
    let chunks = split_documents(&[doc], 800, 100).expect("split should succeed");

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "alpha beta gamma delta");
    assert_eq!(chunks[0].token_count, 4);
}

#[test]
fn token_count_matches_splitter_tokenization() {
    assert_eq!(token_count("one two  three\nfour"), 4);
    assert_eq!(token_count("   "), 0);
}

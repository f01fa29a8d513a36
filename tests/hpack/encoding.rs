//! Tests for HPACK encoding

use h2_embedded::hpack::{Decoder, Encoder};
use h2_embedded::HeaderList;

fn list(pairs: &[(&str, &str)]) -> HeaderList {
    let mut headers = HeaderList::new(16);
    for (name, value) in pairs {
        headers.add(name, value).unwrap();
    }
    headers
}

fn encode(encoder: &mut Encoder, headers: &HeaderList) -> Vec<u8> {
    let mut out = Vec::new();
    encoder.encode(headers, &mut out);
    out
}

#[test]
fn test_encode_and_decode_request() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(4096);

    let headers = list(&[
        (":method", "GET"),
        (":path", "/index.html"),
        (":scheme", "https"),
        (":authority", "example.com"),
        ("accept", "*/*"),
    ]);
    let block = encode(&mut encoder, &headers);

    let mut decoded = HeaderList::new(16);
    decoder.decode(&block, &mut decoded).unwrap();
    assert_eq!(decoded, headers);
}

#[test]
fn test_encode_status_only_response() {
    let mut encoder = Encoder::new(4096);
    // :status 200 is static index 8.
    assert_eq!(encode(&mut encoder, &list(&[(":status", "200")])), [0x88]);
}

#[test]
fn test_encoder_and_decoder_tables_stay_in_step() {
    let mut encoder = Encoder::new(256);
    let mut decoder = Decoder::new(256);

    for i in 0..20 {
        let value = format!("value-{i}");
        let headers = list(&[(":status", "200"), ("x-request-id", &value)]);
        let block = encode(&mut encoder, &headers);

        let mut decoded = HeaderList::new(16);
        decoder.decode(&block, &mut decoded).unwrap();
        assert_eq!(decoded, headers);
        assert_eq!(decoder.table().size(), encoder.table().size());
        assert_eq!(decoder.table().len(), encoder.table().len());
        assert!(encoder.table().size() <= 256);
    }
}

#[test]
fn test_peer_table_size_is_followed_by_decoder() {
    let mut encoder = Encoder::new(4096);
    let mut decoder = Decoder::new(4096);
    let headers = list(&[("x-custom", "one")]);

    let block = encode(&mut encoder, &headers);
    let mut decoded = HeaderList::new(4);
    decoder.decode(&block, &mut decoded).unwrap();
    assert!(!decoder.table().is_empty());

    // Shrinking to zero flushes both tables.
    encoder.set_max_table_size(0);
    let block = encode(&mut encoder, &headers);
    let mut decoded = HeaderList::new(4);
    decoder.decode(&block, &mut decoded).unwrap();
    assert_eq!(decoded.get("x-custom"), Some("one"));
    assert!(decoder.table().is_empty());
    assert!(encoder.table().is_empty());
}

#[test]
fn test_encode_appends_to_existing_buffer() {
    let mut encoder = Encoder::new(4096);
    let mut out = vec![0xaa];
    let written = encoder.encode(&list(&[(":method", "POST")]), &mut out);
    assert_eq!(written, 1);
    assert_eq!(out, [0xaa, 0x83]);
}

//! Tests for HPACK decoding

use h2_embedded::hpack::Decoder;
use h2_embedded::{HeaderList, HpackError};

fn decode(decoder: &mut Decoder, block: &[u8]) -> Result<HeaderList, HpackError> {
    let mut headers = HeaderList::new(16);
    decoder.decode(block, &mut headers)?;
    Ok(headers)
}

#[test]
fn test_decode_indexed_headers() {
    let mut decoder = Decoder::new(4096);

    // 0x82 = :method: GET, 0x86 = :scheme: http, 0x84 = :path: /
    let headers = decode(&mut decoder, &[0x82, 0x86, 0x84]).unwrap();

    assert_eq!(headers.count(), 3);
    let first = headers.get_by_index(0).unwrap();
    assert_eq!((first.name.as_str(), first.value.as_str()), (":method", "GET"));
    assert_eq!(headers.get(":scheme"), Some("http"));
    assert_eq!(headers.get(":path"), Some("/"));
}

#[test]
fn test_decode_custom_key_header_block() {
    let mut decoder = Decoder::new(4096);
    let block = [
        0x40, 0x0a, b'c', b'u', b's', b't', b'o', b'm', b'-', b'k', b'e', b'y', 0x0d, b'c', b'u',
        b's', b't', b'o', b'm', b'-', b'h', b'e', b'a', b'd', b'e', b'r',
    ];
    let mut headers = HeaderList::new(16);
    assert_eq!(decoder.decode(&block, &mut headers).unwrap(), 26);
    assert_eq!(headers.get("custom-key"), Some("custom-header"));
    assert_eq!(decoder.table().len(), 1);

    // The new entry is now addressable as index 62.
    let headers = decode(&mut decoder, &[0xbe]).unwrap();
    assert_eq!(headers.get("custom-key"), Some("custom-header"));
}

#[test]
fn test_decode_without_indexing_new_name() {
    let mut decoder = Decoder::new(4096);
    let block = [0, 4, b'h', b'o', b'l', b'a', 3, b'v', b'a', b'l'];
    let mut headers = HeaderList::new(16);
    assert_eq!(decoder.decode(&block, &mut headers).unwrap(), 10);
    assert_eq!(headers.get("hola"), Some("val"));
    assert!(decoder.table().is_empty());
}

#[test]
fn test_repeated_name_is_merged() {
    let mut decoder = Decoder::new(4096);
    // cookie (32) twice, without indexing.
    let block = [0x0f, 0x11, 0x01, b'a', 0x0f, 0x11, 0x01, b'b'];
    let headers = decode(&mut decoder, &block).unwrap();
    assert_eq!(headers.count(), 1);
    assert_eq!(headers.get("cookie"), Some("a,b"));
    assert!(headers.validate().is_err());
}

#[test]
fn test_dynamic_table_persists_across_blocks() {
    let mut decoder = Decoder::new(4096);
    decode(&mut decoder, &[0x40, 0x01, b'a', 0x01, b'1']).unwrap();
    decode(&mut decoder, &[0x40, 0x01, b'b', 0x01, b'2']).unwrap();

    // Newest first: b at 62, a at 63.
    let headers = decode(&mut decoder, &[0xbe, 0xbf]).unwrap();
    assert_eq!(headers.get_by_index(0).unwrap().name, "b");
    assert_eq!(headers.get_by_index(1).unwrap().name, "a");
}

#[test]
fn test_eviction_drops_oldest_index() {
    // Room for one 34-byte entry.
    let mut decoder = Decoder::new(40);
    decode(&mut decoder, &[0x40, 0x01, b'a', 0x01, b'1']).unwrap();
    decode(&mut decoder, &[0x40, 0x01, b'b', 0x01, b'2']).unwrap();
    assert_eq!(decoder.table().len(), 1);
    assert_eq!(decode(&mut decoder, &[0xbf]), Err(HpackError::InvalidIndex(63)));
}

#[test]
fn test_decode_errors() {
    let mut decoder = Decoder::new(4096);
    assert_eq!(decode(&mut decoder, &[0x80]), Err(HpackError::InvalidIndex(0)));
    assert_eq!(
        decode(&mut decoder, &[0x84, 0x3f, 0xe1, 0x1f]),
        Err(HpackError::LateSizeUpdate)
    );
    // Index beyond the static table with an empty dynamic table.
    assert_eq!(decode(&mut decoder, &[0xff, 0x00]), Err(HpackError::InvalidIndex(127)));
    // Integer continuation that never terminates.
    assert_eq!(decode(&mut decoder, &[0xff, 0x80]), Err(HpackError::Truncated));
}

#[cfg(feature = "huffman")]
#[test]
fn test_decode_huffman_padding_errors() {
    let mut decoder = Decoder::new(4096);
    // Literal without indexing, indexed name :path, Huffman value.
    // 'a' is 00011; padding of zeros is invalid.
    assert_eq!(
        decode(&mut decoder, &[0x04, 0x81, 0x18]),
        Err(HpackError::InvalidPadding)
    );
    // EOS (30 ones) inside a string.
    assert_eq!(
        decode(&mut decoder, &[0x04, 0x84, 0xff, 0xff, 0xff, 0xff]),
        Err(HpackError::EosInString)
    );
}

#[test]
fn test_header_list_limits_surface_as_errors() {
    let mut decoder = Decoder::new(4096);
    let mut headers = HeaderList::with_limits(4, 4, 4);
    let block = [0, 5, b'l', b'o', b'n', b'g', b'n', 1, b'v'];
    assert!(matches!(
        decoder.decode(&block, &mut headers),
        Err(HpackError::Headers(_))
    ));
    assert!(headers.is_empty());
}

//! Tests for the 9-byte frame header

use h2_embedded::{flags, frame_type, FrameHeader, FRAME_HEADER_SIZE};

#[test]
fn test_header_layout() {
    let header = FrameHeader::new(frame_type::HEADERS, flags::END_HEADERS, 3, 0x01_02_03);
    assert_eq!(
        header.to_bytes(),
        [0x01, 0x02, 0x03, 0x01, 0x04, 0x00, 0x00, 0x00, 0x03]
    );
    assert_eq!(header.total_size(), FRAME_HEADER_SIZE + 0x01_02_03);
}

#[test]
fn test_header_parse_selected_values() {
    let cases = [
        FrameHeader::new(frame_type::DATA, flags::END_STREAM, 1, 0),
        FrameHeader::new(frame_type::SETTINGS, flags::ACK, 0, 0),
        FrameHeader::new(frame_type::WINDOW_UPDATE, 0, 0x7fff_ffff, 4),
        FrameHeader::new(frame_type::CONTINUATION, flags::END_HEADERS, 5, 16_777_215),
    ];
    for header in cases {
        assert_eq!(FrameHeader::from_bytes(&header.to_bytes()), Some(header));
    }
}

#[test]
fn test_header_needs_nine_bytes() {
    assert_eq!(FrameHeader::from_bytes(&[0; 8]), None);
    assert!(FrameHeader::from_bytes(&[0; 9]).is_some());
}

#[test]
fn test_reserved_bit_ignored() {
    let bytes = [0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x07];
    let header = FrameHeader::from_bytes(&bytes).unwrap();
    assert_eq!(header.stream_id, 7);
}

#[test]
fn test_flag_helpers() {
    let header = FrameHeader::new(
        frame_type::HEADERS,
        flags::END_STREAM | flags::END_HEADERS,
        1,
        0,
    );
    assert!(header.is_end_stream());
    assert!(header.is_end_headers());
    assert!(!header.has_flag(flags::PADDED));

    // ACK shares the END_STREAM bit.
    let ack = FrameHeader::new(frame_type::PING, flags::ACK, 0, 8);
    assert!(ack.is_ack());
}

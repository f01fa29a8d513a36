//! Connection and stream errors

use h2_embedded::{
    flags, frame_type, settings_id, Connection, ErrorCode, Frame, H2Error, Request, Response,
    Settings,
};

use super::{data_frame, echo_server, frames, handshake, headers_frame, raw_frame, GET_ROOT};

/// Feeds `input` and expects a connection error with `code`, answered by
/// GOAWAY.
fn expect_connection_error(server: &mut Connection, input: &[u8], code: ErrorCode) {
    let err = server.recv(input).unwrap_err();
    assert_eq!(err.code(), code, "{err}");
    assert!(!err.is_stream_error());
    assert!(server.is_closed());
    let out = frames(&server.take_pending_send());
    match out.last() {
        Some(Frame::GoAway { error_code, .. }) => assert_eq!(*error_code, code),
        other => panic!("expected GOAWAY, got {other:?}"),
    }
    assert!(matches!(server.recv(&[]), Err(H2Error::Closed)));
}

/// Feeds `input` and expects RST_STREAM on `stream_id` with `code`; the
/// connection stays up.
fn expect_stream_error(server: &mut Connection, input: &[u8], stream_id: u32, code: ErrorCode) {
    server.recv(input).unwrap();
    assert!(!server.is_closed());
    let out = frames(&server.take_pending_send());
    assert_eq!(
        out.last(),
        Some(&Frame::RstStream {
            stream_id,
            error_code: code
        })
    );
}

fn ready_server() -> Connection {
    let mut server = echo_server();
    handshake(&mut server, Vec::new());
    server
}

#[test]
fn test_data_on_idle_stream() {
    let mut server = ready_server();
    expect_connection_error(&mut server, &data_frame(1, b"x", true), ErrorCode::ProtocolError);
}

#[test]
fn test_data_on_closed_stream() {
    let mut server = ready_server();
    server.recv(&headers_frame(1, &GET_ROOT, true)).unwrap();
    server.take_pending_send();
    expect_stream_error(
        &mut server,
        &data_frame(1, b"late", false),
        1,
        ErrorCode::StreamClosed,
    );
}

#[test]
fn test_even_stream_id_rejected() {
    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &headers_frame(2, &GET_ROOT, true),
        ErrorCode::ProtocolError,
    );
}

#[test]
fn test_decreasing_stream_id_rejected() {
    let mut server = ready_server();
    server.recv(&headers_frame(5, &GET_ROOT, true)).unwrap();
    server.take_pending_send();
    expect_connection_error(
        &mut server,
        &headers_frame(3, &GET_ROOT, true),
        ErrorCode::ProtocolError,
    );
}

#[test]
fn test_stream_frames_on_stream_zero() {
    for kind in [frame_type::DATA, frame_type::HEADERS, frame_type::RST_STREAM] {
        let mut server = ready_server();
        let payload = if kind == frame_type::RST_STREAM {
            vec![0; 4]
        } else {
            vec![0x82]
        };
        expect_connection_error(
            &mut server,
            &raw_frame(kind, flags::END_HEADERS, 0, &payload),
            ErrorCode::ProtocolError,
        );
    }
}

#[test]
fn test_push_promise_rejected() {
    let mut server = ready_server();
    let push = Frame::PushPromise {
        stream_id: 1,
        promised_stream_id: 2,
    };
    expect_connection_error(&mut server, &push.to_vec(), ErrorCode::ProtocolError);
}

#[test]
fn test_invalid_settings_values() {
    let cases = [
        (settings_id::ENABLE_PUSH, 2, ErrorCode::ProtocolError),
        (settings_id::INITIAL_WINDOW_SIZE, 1 << 31, ErrorCode::FlowControlError),
        (settings_id::MAX_FRAME_SIZE, 100, ErrorCode::ProtocolError),
        (settings_id::MAX_FRAME_SIZE, 1 << 24, ErrorCode::ProtocolError),
    ];
    for (id, value, code) in cases {
        let mut server = ready_server();
        let settings = Frame::Settings {
            ack: false,
            params: vec![(id, value)],
        };
        expect_connection_error(&mut server, &settings.to_vec(), code);
    }
}

#[test]
fn test_unknown_setting_ignored() {
    let mut server = ready_server();
    let before = *server.remote_settings();
    let settings = Frame::Settings {
        ack: false,
        params: vec![(0x99, 7)],
    };
    server.recv(&settings.to_vec()).unwrap();
    assert_eq!(*server.remote_settings(), before);
}

#[test]
fn test_malformed_settings_frames() {
    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &raw_frame(frame_type::SETTINGS, 0, 0, &[0; 5]),
        ErrorCode::FrameSizeError,
    );

    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &raw_frame(frame_type::SETTINGS, flags::ACK, 0, &[0; 6]),
        ErrorCode::FrameSizeError,
    );

    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &raw_frame(frame_type::SETTINGS, 0, 1, &[]),
        ErrorCode::ProtocolError,
    );
}

#[test]
fn test_wrong_fixed_lengths() {
    let cases = [
        (frame_type::PING, 0, 7),
        (frame_type::WINDOW_UPDATE, 0, 5),
        (frame_type::RST_STREAM, 1, 3),
    ];
    for (kind, stream_id, len) in cases {
        let mut server = ready_server();
        expect_connection_error(
            &mut server,
            &raw_frame(kind, 0, stream_id, &vec![1; len]),
            ErrorCode::FrameSizeError,
        );
    }
}

#[test]
fn test_short_priority_is_stream_error() {
    let mut server = ready_server();
    expect_stream_error(
        &mut server,
        &raw_frame(frame_type::PRIORITY, 0, 1, &[0; 4]),
        1,
        ErrorCode::FrameSizeError,
    );
}

#[test]
fn test_zero_window_increment() {
    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &raw_frame(frame_type::WINDOW_UPDATE, 0, 0, &[0; 4]),
        ErrorCode::ProtocolError,
    );

    let mut server = ready_server();
    server.recv(&headers_frame(1, &GET_ROOT, false)).unwrap();
    expect_stream_error(
        &mut server,
        &raw_frame(frame_type::WINDOW_UPDATE, 0, 1, &[0; 4]),
        1,
        ErrorCode::ProtocolError,
    );
    assert!(server.stream().is_idle());
}

#[test]
fn test_window_overflow() {
    let mut server = ready_server();
    let update = Frame::WindowUpdate {
        stream_id: 0,
        increment: 0x7fff_ffff,
    };
    expect_connection_error(&mut server, &update.to_vec(), ErrorCode::FlowControlError);

    let mut server = ready_server();
    server.recv(&headers_frame(1, &GET_ROOT, false)).unwrap();
    let update = Frame::WindowUpdate {
        stream_id: 1,
        increment: 0x7fff_ffff,
    };
    expect_stream_error(&mut server, &update.to_vec(), 1, ErrorCode::FlowControlError);
}

#[test]
fn test_window_update_on_idle_stream() {
    let mut server = ready_server();
    let update = Frame::WindowUpdate {
        stream_id: 9,
        increment: 10,
    };
    expect_connection_error(&mut server, &update.to_vec(), ErrorCode::ProtocolError);
}

#[test]
fn test_rst_stream_on_idle_stream() {
    let mut server = ready_server();
    let rst = Frame::RstStream {
        stream_id: 7,
        error_code: ErrorCode::Cancel,
    };
    expect_connection_error(&mut server, &rst.to_vec(), ErrorCode::ProtocolError);
}

#[test]
fn test_data_beyond_local_window() {
    let settings = Settings {
        initial_window_size: 100,
        ..Settings::default()
    };
    let mut server = Connection::server_with_settings(settings, |_: &Request<'_>| {
        Response::new(204)
    });
    handshake(&mut server, Vec::new());
    server.recv(&headers_frame(1, &GET_ROOT, false)).unwrap();
    expect_connection_error(
        &mut server,
        &data_frame(1, &[0; 200], false),
        ErrorCode::FlowControlError,
    );
}

#[test]
fn test_frame_inside_header_block() {
    let mut server = ready_server();
    let mut input = Frame::Headers {
        stream_id: 1,
        fragment: vec![0x82],
        end_stream: true,
        end_headers: false,
    }
    .to_vec();
    Frame::Ping {
        ack: false,
        data: [0; 8],
    }
    .encode(&mut input);
    expect_connection_error(&mut server, &input, ErrorCode::ProtocolError);
}

#[test]
fn test_continuation_on_other_stream() {
    let mut server = ready_server();
    let mut input = Frame::Headers {
        stream_id: 1,
        fragment: vec![0x82],
        end_stream: true,
        end_headers: false,
    }
    .to_vec();
    Frame::Continuation {
        stream_id: 3,
        fragment: vec![0x84],
        end_headers: true,
    }
    .encode(&mut input);
    expect_connection_error(&mut server, &input, ErrorCode::ProtocolError);
}

#[test]
fn test_continuation_without_headers() {
    let mut server = ready_server();
    let continuation = Frame::Continuation {
        stream_id: 1,
        fragment: vec![0x82],
        end_headers: true,
    };
    expect_connection_error(&mut server, &continuation.to_vec(), ErrorCode::ProtocolError);
}

#[test]
fn test_bad_header_block_is_compression_error() {
    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &headers_frame(1, &[0x80], true),
        ErrorCode::CompressionError,
    );
}

#[test]
fn test_invalid_padding_is_protocol_error() {
    let mut server = ready_server();
    expect_connection_error(
        &mut server,
        &raw_frame(frame_type::HEADERS, flags::PADDED | flags::END_HEADERS, 1, &[9, 0x82]),
        ErrorCode::ProtocolError,
    );
}

#[test]
fn test_request_missing_path() {
    let mut server = ready_server();
    // :method GET, :scheme http
    expect_stream_error(
        &mut server,
        &headers_frame(1, &[0x82, 0x86], true),
        1,
        ErrorCode::ProtocolError,
    );
    assert!(server.stream().is_idle());

    // The connection keeps serving.
    server.recv(&headers_frame(3, &GET_ROOT, true)).unwrap();
    assert!(matches!(
        frames(&server.take_pending_send())[..],
        [Frame::Headers { stream_id: 3, .. }]
    ));
}

#[test]
fn test_repeated_pseudo_header_is_malformed() {
    let mut server = ready_server();
    // :path / twice merges into "/,/".
    expect_stream_error(
        &mut server,
        &headers_frame(1, &[0x82, 0x86, 0x84, 0x84], true),
        1,
        ErrorCode::ProtocolError,
    );
}

#[test]
fn test_header_list_over_advertised_size() {
    let settings = Settings {
        max_header_list_size: 100,
        ..Settings::default()
    };
    let mut server = Connection::server_with_settings(settings, |_: &Request<'_>| {
        Response::new(200)
    });
    handshake(&mut server, Vec::new());
    expect_stream_error(
        &mut server,
        &headers_frame(1, &GET_ROOT, true),
        1,
        ErrorCode::ProtocolError,
    );
}

#[test]
fn test_oversized_response_body_resets_stream() {
    let mut server = Connection::server(|_: &Request<'_>| {
        Response::new(200).with_body(vec![0; 70 * 1024])
    });
    handshake(&mut server, Vec::new());
    expect_stream_error(
        &mut server,
        &headers_frame(1, &GET_ROOT, true),
        1,
        ErrorCode::InternalError,
    );
    assert!(server.stream().is_idle());
}

#[test]
fn test_oversized_request_body_rejected() {
    let mut client = Connection::client();
    let mut headers = h2_embedded::HeaderList::new(4);
    headers.add(":method", "POST").unwrap();
    let err = client.send_request(&headers, &vec![0; 70 * 1024]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert!(client.stream().is_idle());
}

#[test]
fn test_client_rejects_unsolicited_headers() {
    let mut client = Connection::client();
    client.take_pending_send();
    let err = client.recv(&headers_frame(2, &[0x88], true)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProtocolError);
    assert!(client.is_closed());
}

#[test]
fn test_server_cannot_send_requests() {
    let mut server = ready_server();
    let headers = h2_embedded::HeaderList::new(4);
    assert!(server.send_request(&headers, &[]).is_err());
}

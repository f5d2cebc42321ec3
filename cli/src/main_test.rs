use super::*;

#[test]
fn data_line_carries_length_and_hex() {
    let line = serde_json::to_string(&Output::data(&[0, 0xab, 0x10])).expect("render");
    assert_eq!(line, r#"{"event":"data","len":3,"hex":"00ab10"}"#);
}

#[test]
fn close_line_carries_code_and_reason() {
    let event = CloseEvent::new(4000, "bye");
    let line = serde_json::to_string(&Output::Close(&event)).expect("render");
    assert_eq!(line, r#"{"event":"close","code":4000,"reason":"bye"}"#);
}

#[test]
fn connect_arguments_parse() {
    let cli = Cli::try_parse_from([
        "coordinator-cli",
        "--host",
        "localhost",
        "--transport",
        "tcp",
        "connect",
        "--app-id",
        "app-1",
        "--session-id",
        "a1",
        "--token",
        "tok",
        "--keepalive-secs",
        "5",
    ])
    .expect("parse");

    assert_eq!(cli.host.as_deref(), Some("localhost"));
    assert_eq!(cli.transport, Some(TransportKind::Tcp));
    let Command::Connect(args) = cli.command else { panic!("expected connect") };
    assert_eq!(args.session_id.wire_value(), 361);
    assert_eq!(args.keepalive_secs, Some(5));
}

#[test]
fn malformed_session_id_is_rejected() {
    let parsed = Cli::try_parse_from(["coordinator-cli", "encode", "not-valid"]);
    assert!(parsed.is_err());
}

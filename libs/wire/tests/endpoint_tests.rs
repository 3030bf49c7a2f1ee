use std::path::PathBuf;

use zenith_wire::error::Error;
use zenith_wire::Endpoint;

#[test]
fn parses_tcp_uri() {
    let endpoint: Endpoint = "tcp://127.0.0.1:5000".parse().unwrap();
    assert_eq!(endpoint, Endpoint::Tcp("127.0.0.1:5000".parse().unwrap()));
}

#[test]
fn parses_bare_address_as_tcp() {
    let endpoint: Endpoint = "127.0.0.1:5000".parse().unwrap();
    assert_eq!(endpoint, Endpoint::Tcp("127.0.0.1:5000".parse().unwrap()));
}

#[test]
fn parses_unix_uri() {
    let endpoint: Endpoint = "unix:///tmp/zenith.sock".parse().unwrap();
    assert_eq!(endpoint, Endpoint::Unix(PathBuf::from("/tmp/zenith.sock")));
}

#[test]
fn rejects_garbage() {
    for input in ["", "tcp://not-an-address", "unix://", "ftp://127.0.0.1:1"] {
        match input.parse::<Endpoint>() {
            Err(Error::InvalidEndpoint(_)) => {}
            other => panic!("Expected InvalidEndpoint for {input:?}, got {other:?}"),
        }
    }
}

#[test]
fn display_round_trips() {
    for input in ["tcp://127.0.0.1:5000", "unix:///tmp/zenith.sock"] {
        let endpoint: Endpoint = input.parse().unwrap();
        assert_eq!(endpoint.to_string(), input);
    }
}

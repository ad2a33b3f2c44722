use crate::base::classify::{
    classify_generic_error, classify_quic_handshake_error, classify_resolver_error,
    classify_tls_handshake_error, Classifier,
};
use crate::base::errwrapper::WrappedError;
use crate::base::failure::Failure;
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use std::net::IpAddr;

const CLASSIFIERS: [Classifier; 4] = [
    classify_generic_error,
    classify_resolver_error,
    classify_tls_handshake_error,
    classify_quic_handshake_error,
];

#[test]
fn test_unknown_failures_never_leak_addresses() {
    let messages = [
        "dial tcp 192.0.2.1:443: something odd",
        "read udp [2001:db8::1]:53: strange",
        "from 2001:db8::1 via 198.51.100.7 and fe80::1%eth0",
        "write tcp 10.0.0.1:1234->203.0.113.9:80: odd",
    ];
    for msg in messages {
        for classify in CLASSIFIERS {
            let failure = classify(&NetError::Other(msg.to_string()));
            assert!(failure.is_unknown());
            for word in failure.as_str().split(|c: char| c.is_whitespace() || c == '>') {
                let candidate = word
                    .trim_end_matches(':')
                    .trim_start_matches('-')
                    .trim_matches(|c| c == '[' || c == ']');
                assert!(
                    candidate.parse::<IpAddr>().is_err(),
                    "{} leaks {candidate}",
                    failure
                );
            }
        }
    }
}

#[test]
fn test_classification_is_stable_across_layers() {
    // A failure observed while connecting keeps both its kind and its
    // attribution while read, write and close wrappers pile on top.
    let mut err = NetError::Wrapped(WrappedError::new(
        classify_generic_error,
        Operation::Connect,
        NetError::Timeout,
    ));
    for op in [Operation::Read, Operation::Write, Operation::Close, Operation::TopLevel] {
        for classify in CLASSIFIERS {
            err = NetError::Wrapped(WrappedError::new(classify, op, err));
        }
    }
    let wrapped = err.as_wrapped().expect("wrapped");
    assert_eq!(wrapped.failure(), &Failure::GenericTimeout);
    assert_eq!(wrapped.operation(), Operation::Connect);
}

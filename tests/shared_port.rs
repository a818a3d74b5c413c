//! Coverage of the shared-port listening facility worker processes rely on
//! to distribute accepted connections across the cohort (spec §4.2).

#[cfg(unix)]
#[tokio::test]
async fn a_second_bind_to_the_same_address_succeeds() {
    assert!(sparrow::server::tcp::supports_port_sharing());

    let first = sparrow::server::tcp::bind("127.0.0.1:0".parse().unwrap())
        .expect("first bind should succeed");
    let addr = first.local_addr().unwrap();

    let second = sparrow::server::tcp::bind(addr);
    assert!(
        second.is_ok(),
        "SO_REUSEPORT should allow a sibling worker to bind the same address"
    );
}

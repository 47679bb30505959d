use crate::error::ConfigError;
use crate::net::{Ipv4Cidr, MacAddr, apply_mask, mask_of};
use std::net::Ipv4Addr;

#[test]
fn mask_of_covers_edges() {
    assert_eq!(mask_of(0), 0);
    assert_eq!(mask_of(8), 0xff00_0000);
    assert_eq!(mask_of(24), 0xffff_ff00);
    assert_eq!(mask_of(32), u32::MAX);
}

#[test]
fn apply_mask_zeroes_host_bits() {
    let ip = Ipv4Addr::new(10, 1, 1, 77);
    assert_eq!(apply_mask(ip, 24), Ipv4Addr::new(10, 1, 1, 0));
    assert_eq!(apply_mask(ip, 16), Ipv4Addr::new(10, 1, 0, 0));
    assert_eq!(apply_mask(ip, 0), Ipv4Addr::UNSPECIFIED);
}

#[test]
fn cidr_parses_with_and_without_prefix() {
    let c: Ipv4Cidr = "10.1.1.0/24".parse().unwrap();
    assert_eq!(c.address, Ipv4Addr::new(10, 1, 1, 0));
    assert_eq!(c.prefix_len, 24);

    let host: Ipv4Cidr = "122.1.1.1".parse().unwrap();
    assert_eq!(host.prefix_len, 32);
    assert_eq!(host.to_string(), "122.1.1.1/32");
}

#[test]
fn cidr_rejects_bad_input() {
    assert_eq!(
        "10.1.1.0/33".parse::<Ipv4Cidr>(),
        Err(ConfigError::InvalidPrefix(33))
    );
    assert!(matches!(
        "10.1.1/24".parse::<Ipv4Cidr>(),
        Err(ConfigError::InvalidAddress(_))
    ));
    assert!(matches!(
        "10.1.1.0/x".parse::<Ipv4Cidr>(),
        Err(ConfigError::InvalidCidr(_))
    ));
}

#[test]
fn random_mac_is_unicast_and_local() {
    for _ in 0..64 {
        let mac = MacAddr::random();
        assert!(!mac.is_broadcast());
        assert_eq!(mac.0[0] & 0x01, 0, "multicast bit set in {mac}");
        assert_eq!(mac.0[0] & 0x02, 0x02, "local bit missing in {mac}");
    }
    assert_eq!(MacAddr::BROADCAST.to_string(), "ff:ff:ff:ff:ff:ff");
}

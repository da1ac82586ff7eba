//! Tests for access policies.

use std::net::IpAddr;

use regex::Regex;

use super::{
    AccessError, AccessPolicy, HttpRequest, IpNetwork, NetworkAccessPolicy, Unrestricted,
    private_networks,
};

fn request(url: &str) -> HttpRequest {
    HttpRequest::get(url::Url::parse(url).unwrap())
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

mod ip_network {
    use super::*;

    #[test]
    fn parses_cidr_notation() {
        let net: IpNetwork = "10.0.0.0/8".parse().unwrap();

        assert!(net.contains(ip("10.1.2.3")));
        assert!(!net.contains(ip("11.0.0.1")));
        assert_eq!(net.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn bare_address_is_single_host() {
        let net: IpNetwork = "192.0.2.7".parse().unwrap();

        assert!(net.contains(ip("192.0.2.7")));
        assert!(!net.contains(ip("192.0.2.8")));
        assert_eq!(net.to_string(), "192.0.2.7/32");
    }

    #[test]
    fn zero_prefix_contains_everything_in_family() {
        let net: IpNetwork = "0.0.0.0/0".parse().unwrap();

        assert!(net.contains(ip("203.0.113.9")));
        assert!(!net.contains(ip("2001:db8::1")));
    }

    #[test]
    fn ipv6_networks_match() {
        let net: IpNetwork = "fe80::/10".parse().unwrap();

        assert!(net.contains(ip("fe80::1")));
        assert!(net.contains(ip("febf::1")));
        assert!(!net.contains(ip("fec0::1")));
    }

    #[test]
    fn ipv4_mapped_ipv6_matches_ipv4_network() {
        let net: IpNetwork = "127.0.0.0/8".parse().unwrap();

        assert!(net.contains(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn ipv4_compatible_ipv6_matches_ipv4_network() {
        let net: IpNetwork = "127.0.0.0/8".parse().unwrap();

        assert!(net.contains(ip("::7f00:1")));
        assert!(net.contains(ip("::127.0.0.1")));
    }

    #[test]
    fn ipv6_loopback_still_matches_ipv6_network() {
        let net: IpNetwork = "::1".parse().unwrap();

        assert!(net.contains(ip("::1")));
        assert!(!net.contains(ip("::2")));
    }

    #[test]
    fn rejects_invalid_input() {
        for input in ["", "10.0.0.0/33", "::/129", "not-an-ip", "10.0.0.0/x"] {
            assert!(input.parse::<IpNetwork>().is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn private_preset_covers_metadata_and_loopback() {
        let nets = private_networks();
        let denied = |addr: &str| nets.iter().any(|n| n.contains(ip(addr)));

        assert!(denied("169.254.169.254"));
        assert!(denied("127.0.0.1"));
        assert!(denied("10.0.0.1"));
        assert!(denied("172.31.255.255"));
        assert!(denied("192.168.1.1"));
        assert!(denied("::1"));
        assert!(denied("fd00::1"));
        assert!(denied("192.0.0.170"));
        assert!(denied("198.19.255.1"));
        assert!(denied("224.0.0.251"));
        assert!(denied("239.255.255.250"));
        assert!(denied("240.0.0.1"));
        assert!(denied("255.255.255.255"));
        assert!(denied("64:ff9b::a9fe:a9fe"));
        assert!(denied("::7f00:1"));
        assert!(denied("ff02::1"));
        assert!(!denied("93.184.216.34"));
        assert!(!denied("198.20.0.1"));
        assert!(!denied("192.0.2.1"));
        assert!(!denied("172.32.0.1"));
        assert!(!denied("2606:2800:220:1::1"));
    }
}

mod unrestricted {
    use super::*;

    #[tokio::test]
    async fn allows_everything() {
        assert!(Unrestricted.allow(&request("http://127.0.0.1/")).await.unwrap());
    }
}

mod network_policy {
    use super::*;

    #[tokio::test]
    async fn empty_policy_allows_without_resolving() {
        let policy = NetworkAccessPolicy::new();

        assert!(policy.is_empty());
        assert!(
            policy
                .allow(&request("https://unresolvable.invalid/"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn denies_metadata_address() {
        let policy = NetworkAccessPolicy::private();

        let allowed = policy
            .allow(&request("http://169.254.169.254/latest/meta-data/"))
            .await
            .unwrap();

        assert!(!allowed);
    }

    #[tokio::test]
    async fn denies_ipv6_loopback_literal() {
        let policy = NetworkAccessPolicy::private();

        assert!(!policy.allow(&request("http://[::1]:8080/")).await.unwrap());
    }

    #[tokio::test]
    async fn allows_public_ip_literal() {
        let policy = NetworkAccessPolicy::private();

        assert!(policy.allow(&request("https://93.184.216.34/")).await.unwrap());
    }

    #[tokio::test]
    async fn denies_host_matching_pattern() {
        let policy = NetworkAccessPolicy::new()
            .with_host_pattern(Regex::new(r"(^|\.)internal\.example$").unwrap());

        assert!(
            !policy
                .allow(&request("https://api.internal.example/"))
                .await
                .unwrap()
        );
        assert!(
            policy
                .allow(&request("https://public.example/"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn host_patterns_match_lowercase() {
        let policy =
            NetworkAccessPolicy::new().with_host_pattern(Regex::new("^metadata$").unwrap());

        assert!(!policy.allow(&request("http://METADATA/")).await.unwrap());
    }

    #[tokio::test]
    async fn url_without_host_is_an_error() {
        let policy = NetworkAccessPolicy::private();

        let result = policy.allow(&request("mailto:ops@example.com")).await;

        assert!(matches!(result, Err(AccessError::MissingHost(_))));
    }

    #[test]
    fn builder_accumulates_rules() {
        let policy = NetworkAccessPolicy::new()
            .with_network("10.0.0.0/8".parse().unwrap())
            .with_networks(["192.168.0.0/16".parse().unwrap()])
            .with_host_pattern(Regex::new("^a$").unwrap());

        assert_eq!(policy.networks().len(), 2);
        assert_eq!(policy.host_pattern_count(), 1);
        assert!(!policy.is_empty());
    }
}

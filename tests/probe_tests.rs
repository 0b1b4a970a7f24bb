//! Probe plan integration tests
//!
//! Builds the full plan from TOML and sends it through a mock sender.

use std::net::Ipv4Addr;

use frag_probe::fragment::find_overlaps;
use frag_probe::infrastructure::packet::Packet;
use frag_probe::infrastructure::socket::MockSocket;
use frag_probe::{Fragment, ProbeConfig, ProbeKind, ProbePlan, ProbeRunner};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CONFIG: &str = r#"
target = "172.19.0.3"
source = "172.19.0.2"
fragment_size = 16
size_policy = "strict"
overlap_benign = "AAAAAAAAAAAAAAAAAAAA"
identification = 4242
"#;

#[test]
fn test_plan_from_toml() {
    let config = ProbeConfig::from_toml(CONFIG).expect("Failed to parse config");
    let plan = ProbePlan::build(&config, &mut StdRng::seed_from_u64(3)).expect("Failed to build plan");

    // 1 SYN + ceil(86/16) 分片 + 2 重叠分片 + 5 TTL
    assert_eq!(plan.packet_count(), 1 + 6 + 2 + 5);

    let syn = &plan.step(ProbeKind::SynReference).unwrap().packets[0];
    let packet = Packet::parse(&syn.bytes).expect("Failed to parse SYN");
    assert_eq!(packet.ip_header.src_ip, Ipv4Addr::new(172, 19, 0, 2));
    assert_eq!(packet.ip_header.dst_ip, Ipv4Addr::new(172, 19, 0, 3));
    assert!(packet.tcp_header.src_port >= 1024);
    assert!(packet.verify_checksums().is_ok());
}

#[test]
fn test_overlap_step_really_overlaps() {
    let config = ProbeConfig::from_toml(CONFIG).unwrap();
    let plan = ProbePlan::build(&config, &mut StdRng::seed_from_u64(3)).unwrap();

    let step = plan.step(ProbeKind::OverlappingFragments).unwrap();
    let fragments: Vec<Fragment> = step
        .packets
        .iter()
        .map(|p| Fragment::parse(&p.bytes).unwrap())
        .collect();

    // 20 字节 TCP 头 + 20 字节填充，覆盖 8..40
    let overlaps = find_overlaps(&fragments);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].bytes, 8..40);
}

#[test]
fn test_runner_sends_plan_to_target() {
    let config = ProbeConfig::from_toml(CONFIG).unwrap();
    let plan = ProbePlan::build(&config, &mut StdRng::seed_from_u64(3)).unwrap();
    let socket = MockSocket::new();

    let report = ProbeRunner::new(socket.clone()).run(&plan).expect("Run failed");

    assert_eq!(report.packets_sent(), plan.packet_count());
    let sent = socket.sent();
    assert!(sent.iter().all(|d| d.dest == Ipv4Addr::new(172, 19, 0, 3)));

    let total: usize = report.steps.iter().map(|s| s.bytes_sent).sum();
    assert_eq!(total, sent.iter().map(|d| d.data.len()).sum::<usize>());
}

#[test]
fn test_different_seeds_change_ports_only() {
    let config = ProbeConfig::from_toml(CONFIG).unwrap();
    let a = ProbePlan::build(&config, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = ProbePlan::build(&config, &mut StdRng::seed_from_u64(2)).unwrap();

    assert_eq!(a.packet_count(), b.packet_count());
    // 重叠分片使用固定端口和固定标识，与种子无关
    assert_eq!(
        a.step(ProbeKind::OverlappingFragments),
        b.step(ProbeKind::OverlappingFragments)
    );
}

use std::fmt;
use std::net::Ipv4Addr;

use bytes::Bytes;
use rand::Rng;
use tracing::debug;

use super::ProbeError;
use crate::config::ProbeConfig;
use crate::fragment::{Fragment, FragmentBuilder};
use crate::infrastructure::packet::{Packet, TcpFlags, TcpPacketBuilder};

/// 探测类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// 未分片的 SYN，作为对照
    SynReference,
    /// 切成小分片的 HTTP 请求段
    FragmentedHttp,
    /// 偏移 0 与偏移 1 的重叠分片对
    OverlappingFragments,
    /// 不同 TTL 的 SYN
    TtlSweep,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeKind::SynReference => "syn-reference",
            ProbeKind::FragmentedHttp => "fragmented-http",
            ProbeKind::OverlappingFragments => "overlapping-fragments",
            ProbeKind::TtlSweep => "ttl-sweep",
        };
        f.write_str(name)
    }
}

/// 一个待发送的数据报 (或分片)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePacket {
    pub destination: Ipv4Addr,
    pub ttl: u8,
    /// 含 IP 头的完整线上字节
    pub bytes: Bytes,
    /// 是否预期目标回应 (分片探测不等待回应)
    pub expects_reply: bool,
}

impl WirePacket {
    fn from_packet(packet: &Packet) -> Result<Self, ProbeError> {
        Ok(Self {
            destination: packet.ip_header.dst_ip,
            ttl: packet.ip_header.ttl,
            bytes: Bytes::from(packet.to_bytes()?),
            expects_reply: true,
        })
    }

    fn from_fragment(fragment: &Fragment) -> Result<Self, ProbeError> {
        Ok(Self {
            destination: fragment.header().destination,
            ttl: fragment.header().ttl,
            bytes: fragment.to_bytes()?,
            expects_reply: false,
        })
    }
}

/// 计划中的一步，包内顺序即发送顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStep {
    pub kind: ProbeKind,
    pub packets: Vec<WirePacket>,
}

/// 完整的探测计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePlan {
    pub steps: Vec<ProbeStep>,
}

impl ProbePlan {
    /// 根据配置构造计划
    ///
    /// 源端口和 IP 标识 (未配置时) 取自 `rng`；同一个种子得到同一份计划。
    pub fn build<R: Rng + ?Sized>(config: &ProbeConfig, rng: &mut R) -> Result<Self, ProbeError> {
        config.validate()?;

        let identification = config.identification.unwrap_or_else(|| rng.gen());
        let steps = vec![
            syn_reference(config, rng)?,
            fragmented_http(config, rng, identification)?,
            overlapping_fragments(config, identification.wrapping_add(1))?,
            ttl_sweep(config, rng)?,
        ];

        debug!(
            target_ip = %config.target,
            steps = steps.len(),
            packets = steps.iter().map(|s| s.packets.len()).sum::<usize>(),
            "built probe plan"
        );
        Ok(Self { steps })
    }

    pub fn step(&self, kind: ProbeKind) -> Option<&ProbeStep> {
        self.steps.iter().find(|step| step.kind == kind)
    }

    pub fn packet_count(&self) -> usize {
        self.steps.iter().map(|step| step.packets.len()).sum()
    }
}

/// 与 nmap/scapy 一致：随机源端口避开保留端口
fn random_port<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.gen_range(1024..=u16::MAX)
}

fn syn_reference<R: Rng + ?Sized>(config: &ProbeConfig, rng: &mut R) -> Result<ProbeStep, ProbeError> {
    let tcp_header = TcpPacketBuilder::new(random_port(rng), config.dst_port)
        .flags(TcpFlags::SYN)
        .build();
    let packet = Packet::new(config.source, config.target, tcp_header, Vec::new());

    Ok(ProbeStep {
        kind: ProbeKind::SynReference,
        packets: vec![WirePacket::from_packet(&packet)?],
    })
}

fn fragmented_http<R: Rng + ?Sized>(
    config: &ProbeConfig,
    rng: &mut R,
    identification: u16,
) -> Result<ProbeStep, ProbeError> {
    let tcp_header = TcpPacketBuilder::new(random_port(rng), config.dst_port)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .build();
    let packet = Packet::new(
        config.source,
        config.target,
        tcp_header,
        config.http_payload.as_bytes().to_vec(),
    );

    let fragments = FragmentBuilder::new(config.source, config.target)
        .policy(config.size_policy)
        .build_fragments(&packet.segment_bytes(), config.fragment_size, identification)?;

    let packets = fragments
        .iter()
        .map(WirePacket::from_fragment)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProbeStep {
        kind: ProbeKind::FragmentedHttp,
        packets,
    })
}

fn overlapping_fragments(config: &ProbeConfig, identification: u16) -> Result<ProbeStep, ProbeError> {
    let segment = |payload: &str| {
        let tcp_header = TcpPacketBuilder::new(config.overlap_src_port, config.dst_port)
            .flags(TcpFlags::SYN)
            .build();
        Packet::new(config.source, config.target, tcp_header, payload.as_bytes().to_vec())
            .segment_bytes()
    };

    let (first, second) = FragmentBuilder::new(config.source, config.target).build_overlapping_pair(
        &segment(&config.overlap_benign),
        &segment(&config.overlap_evil),
        identification,
    );

    Ok(ProbeStep {
        kind: ProbeKind::OverlappingFragments,
        packets: vec![
            WirePacket::from_fragment(&first)?,
            WirePacket::from_fragment(&second)?,
        ],
    })
}

/// 构造一个指定 TTL 的 SYN 探测
///
/// TTL 在 IDS 与目标之间耗尽时，IDS 看到的报文集合与目标实际收到的不同。
pub fn ttl_probe(source: Ipv4Addr, destination: Ipv4Addr, src_port: u16, dst_port: u16, ttl: u8) -> Packet {
    let tcp_header = TcpPacketBuilder::new(src_port, dst_port)
        .flags(TcpFlags::SYN)
        .build();
    let mut packet = Packet::new(source, destination, tcp_header, Vec::new());
    packet.ip_header.ttl = ttl;
    packet
}

fn ttl_sweep<R: Rng + ?Sized>(config: &ProbeConfig, rng: &mut R) -> Result<ProbeStep, ProbeError> {
    let packets = config
        .ttl_sweep
        .iter()
        .map(|&ttl| {
            let probe = ttl_probe(
                config.source,
                config.target,
                random_port(rng),
                config.dst_port,
                ttl,
            );
            WirePacket::from_packet(&probe)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProbeStep {
        kind: ProbeKind::TtlSweep,
        packets,
    })
}

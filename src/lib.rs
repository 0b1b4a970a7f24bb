//! IPv4 fragmentation, overlapping-fragment and TTL probes for exercising
//! an intrusion-detection sensor.
//!
//! [`fragment`] holds the pure fragment builder; [`probe`] turns a
//! [`config::ProbeConfig`] into the wire bytes of a full probe run and hands
//! them to a [`infrastructure::socket::PacketSender`].

pub mod config;
pub mod fragment;
pub mod infrastructure;
pub mod probe;

pub use config::{ConfigError, ProbeConfig};
pub use fragment::{
    build_fragments, build_overlapping_pair, find_overlaps, reassemble, Fragment, FragmentBuilder,
    FragmentError, FragmentSizePolicy, InvalidArgument, IpFragmentHeader, OverlapPolicy,
};
pub use probe::{ttl_probe, ProbeError, ProbeKind, ProbePlan, ProbeRunner};

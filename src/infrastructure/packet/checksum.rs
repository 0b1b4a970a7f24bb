use std::net::Ipv4Addr;

/// Internet 校验和 (RFC 1071)
fn internet_checksum(chunks: &[&[u8]]) -> u16 {
    let mut sum: u32 = 0;
    let mut carry: Option<u8> = None;

    // 多段数据按一个连续字节流处理，奇数字节跨段配对
    for chunk in chunks {
        for &byte in chunk.iter() {
            match carry.take() {
                Some(high) => sum += u16::from_be_bytes([high, byte]) as u32,
                None => carry = Some(byte),
            }
        }
    }
    if let Some(high) = carry {
        sum += (high as u32) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// 计算 IP 头部校验和 (checksum 字段须为 0)
pub fn compute_ip_checksum(ip_header: &[u8]) -> u16 {
    internet_checksum(&[ip_header])
}

/// 验证 IP 头部校验和
pub fn verify_ip_checksum(ip_header: &[u8]) -> bool {
    internet_checksum(&[ip_header]) == 0
}

/// 计算 TCP 校验和 (包含伪头部)
///
/// `tcp_header` 中的 checksum 字段须为 0
pub fn compute_tcp_checksum(
    src_ip: &Ipv4Addr,
    dst_ip: &Ipv4Addr,
    tcp_header: &[u8],
    payload: &[u8],
) -> u16 {
    let tcp_len = (tcp_header.len() + payload.len()) as u16;
    let len_bytes = tcp_len.to_be_bytes();
    let pseudo = [
        0,
        6, // TCP
        len_bytes[0],
        len_bytes[1],
    ];

    internet_checksum(&[
        &src_ip.octets()[..],
        &dst_ip.octets()[..],
        &pseudo[..],
        tcp_header,
        payload,
    ])
}

/// 验证 TCP 校验和
pub fn verify_tcp_checksum(
    src_ip: &Ipv4Addr,
    dst_ip: &Ipv4Addr,
    tcp_header: &[u8],
    payload: &[u8],
    expected_checksum: u16,
) -> bool {
    let mut tcp_header_copy = tcp_header.to_vec();
    if tcp_header_copy.len() >= 18 {
        tcp_header_copy[16] = 0;
        tcp_header_copy[17] = 0;
    }

    compute_tcp_checksum(src_ip, dst_ip, &tcp_header_copy, payload) == expected_checksum
}

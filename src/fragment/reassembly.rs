//! 重组模拟
//!
//! 不同协议栈对重叠分片的处理不同：有的保留先到的数据，有的用后到的覆盖。
//! IDS 与目标主机若选择不同，看到的就是两份不同的数据报。

use bytes::Bytes;

use super::{Fragment, ReassemblyError};

/// 重叠字节的取舍方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// 先到的分片优先
    First,
    /// 后到的分片覆盖先到的
    Last,
}

/// 按到达顺序重组分片
///
/// 数据报长度由 MF=0 的分片决定；有多个时取最先到达的那个。
pub fn reassemble(fragments: &[Fragment], policy: OverlapPolicy) -> Result<Bytes, ReassemblyError> {
    let first = fragments.first().ok_or(ReassemblyError::Empty)?;
    let identification = first.header().identification;
    if fragments
        .iter()
        .any(|f| f.header().identification != identification)
    {
        return Err(ReassemblyError::MixedIdentification);
    }

    let total_len = fragments
        .iter()
        .find(|f| !f.more_fragments())
        .map(|f| f.byte_range().end)
        .ok_or(ReassemblyError::MissingLastFragment)?;

    let mut data = vec![0u8; total_len];
    let mut filled = vec![false; total_len];

    for fragment in fragments {
        let range = fragment.byte_range();
        if range.end > total_len {
            return Err(ReassemblyError::BeyondEnd {
                offset: range.start.max(total_len),
            });
        }

        for (pos, &byte) in range.zip(fragment.payload().iter()) {
            if policy == OverlapPolicy::Last || !filled[pos] {
                data[pos] = byte;
                filled[pos] = true;
            }
        }
    }

    if let Some(offset) = filled.iter().position(|&covered| !covered) {
        return Err(ReassemblyError::Hole { offset });
    }

    Ok(Bytes::from(data))
}

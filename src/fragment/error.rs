use thiserror::Error;

/// 分片构造错误
///
/// 构造过程不做 I/O，所有错误都是参数错误，直接返回给调用方
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
}

/// 具体的参数错误
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("payload is empty")]
    EmptyPayload,

    #[error("fragment size must be positive")]
    ZeroFragmentSize,

    #[error("fragment size {size} is not a multiple of 8")]
    UnalignedFragmentSize { size: usize },

    #[error("payload of {len} bytes exceeds the {max} bytes an IPv4 datagram can carry")]
    PayloadTooLarge { len: usize, max: usize },
}

/// 重组错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReassemblyError {
    #[error("No fragments to reassemble")]
    Empty,

    #[error("Fragments belong to different datagrams")]
    MixedIdentification,

    #[error("No fragment with MF cleared, datagram length unknown")]
    MissingLastFragment,

    #[error("Fragment data at byte {offset} lies beyond the end of the datagram")]
    BeyondEnd { offset: usize },

    #[error("No fragment covers byte {offset}")]
    Hole { offset: usize },
}

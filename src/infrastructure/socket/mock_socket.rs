use super::{PacketSender, SocketError};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

/// 已发送的一个数据报
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDatagram {
    pub dest: Ipv4Addr,
    pub data: Vec<u8>,
}

/// Mock Socket 用于测试
///
/// 记录每一次发送，可以模拟发送失败
#[derive(Clone, Default)]
pub struct MockSocket {
    /// 已发送的数据报，按发送顺序
    sent: Arc<Mutex<Vec<SentDatagram>>>,
    /// 第 N 次发送 (从 0 开始) 起失败
    fail_from: Arc<Mutex<Option<usize>>>,
}

impl MockSocket {
    pub fn new() -> Self {
        Self::default()
    }

    fn sent_guard(&self) -> MutexGuard<'_, Vec<SentDatagram>> {
        // 锁中毒只会发生在测试线程 panic 之后，此时继续读取记录即可
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 获取所有已发送的数据报
    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent_guard().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent_guard().len()
    }

    /// 设置是否模拟发送失败
    pub fn set_fail_send(&self, fail: bool) {
        self.set_fail_from(if fail { Some(0) } else { None });
    }

    /// 从第 `index` 次发送开始模拟失败
    pub fn set_fail_from(&self, index: Option<usize>) {
        *self
            .fail_from
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = index;
    }
}

impl PacketSender for MockSocket {
    fn send_raw(&self, data: &[u8], dest: Ipv4Addr) -> Result<usize, SocketError> {
        let fail_from = *self
            .fail_from
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut sent = self.sent_guard();
        if fail_from.is_some_and(|index| sent.len() >= index) {
            return Err(SocketError::SendFailed {
                reason: "Mock send failure".to_string(),
            });
        }

        sent.push(SentDatagram {
            dest,
            data: data.to_vec(),
        });
        Ok(data.len())
    }
}

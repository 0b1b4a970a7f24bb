use tracing::{debug, info, warn};

use super::{ProbeError, ProbeKind, ProbePlan, ProbeStep};
use crate::infrastructure::socket::PacketSender;

/// 单步的发送结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub kind: ProbeKind,
    pub packets_sent: usize,
    pub bytes_sent: usize,
}

/// 整个计划的发送结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub steps: Vec<StepReport>,
}

impl ProbeReport {
    pub fn packets_sent(&self) -> usize {
        self.steps.iter().map(|s| s.packets_sent).sum()
    }
}

/// 按计划顺序把数据报交给发送器
///
/// 接收和解析回应不在这里处理。任何一次发送失败都会中止剩余的步骤。
pub struct ProbeRunner<S: PacketSender> {
    sender: S,
}

impl<S: PacketSender> ProbeRunner<S> {
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn run(&self, plan: &ProbePlan) -> Result<ProbeReport, ProbeError> {
        let mut report = ProbeReport::default();

        for step in &plan.steps {
            let step_report = self.run_step(step).inspect_err(|e| {
                warn!(kind = %step.kind, error = %e, "probe step failed");
            })?;
            report.steps.push(step_report);
        }

        info!(
            steps = report.steps.len(),
            packets = report.packets_sent(),
            "probe plan sent"
        );
        Ok(report)
    }

    pub fn run_step(&self, step: &ProbeStep) -> Result<StepReport, ProbeError> {
        info!(kind = %step.kind, packets = step.packets.len(), "sending probe step");

        let mut bytes_sent = 0;
        for (index, packet) in step.packets.iter().enumerate() {
            let sent = self.sender.send_raw(&packet.bytes, packet.destination)?;
            debug!(
                kind = %step.kind,
                index,
                len = sent,
                ttl = packet.ttl,
                dest = %packet.destination,
                "sent"
            );
            bytes_sent += sent;
        }

        Ok(StepReport {
            kind: step.kind,
            packets_sent: step.packets.len(),
            bytes_sent,
        })
    }
}

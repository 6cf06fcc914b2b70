//! 取帧引擎：DMA Ring 借用语义、丢帧策略与 One-Shot

use firecam_core::builder::CapturePolicy;
use firecam_core::error::{CameraError, Result};
use firecam_core::frame::{FrameTicket, RawFrame};
use firecam_core::traits::CameraDevice;

use crate::image::Image;
use crate::pipeline::Pipeline;

/// 从驱动借出的一个 DMA 槽位
///
/// 正常路径通过 [`BorrowedFrame::release`] 归还；提前返回 (错误路径) 时由 Drop 归还，
/// 保证每个槽位恰好归还一次。
pub(crate) struct BorrowedFrame<'d> {
    device: &'d mut dyn CameraDevice,
    ticket: FrameTicket,
    returned: bool,
}

impl<'d> BorrowedFrame<'d> {
    /// 出队一帧；Ring 为空 (Poll) 或等待超时 (Wait) 时返回 None
    pub(crate) fn dequeue(
        device: &'d mut dyn CameraDevice,
        policy: CapturePolicy,
    ) -> Result<Option<Self>> {
        let ticket = match device.dequeue(policy) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Ok(None),
            // 阻塞等待超时不是采集错误
            Err(CameraError::Timeout) => {
                tracing::debug!(target: "firecam::acquisition", "Timed out waiting for a frame");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(Some(Self {
            device,
            ticket,
            returned: false,
        }))
    }

    pub(crate) fn ticket(&self) -> FrameTicket {
        self.ticket
    }

    pub(crate) fn frame(&self) -> Result<RawFrame<'_>> {
        self.device.frame(self.ticket.slot)
    }

    /// 丢弃积压，只保留最新的一帧；返回丢弃的帧数
    pub(crate) fn skip_to_newest(&mut self) -> Result<u32> {
        let mut skipped = 0;
        while self.ticket.frames_behind > 0 {
            let Some(next) = self.device.dequeue(CapturePolicy::Poll)? else {
                break;
            };
            let stale = std::mem::replace(&mut self.ticket, next);
            self.device.enqueue(stale.slot)?;
            skipped += 1;
        }
        if skipped > 0 {
            tracing::debug!(target: "firecam::acquisition", "Dropped {} stale frames", skipped);
        }
        Ok(skipped)
    }

    /// 归还槽位
    pub(crate) fn release(mut self) -> Result<()> {
        self.returned = true;
        self.device.enqueue(self.ticket.slot)
    }
}

impl Drop for BorrowedFrame<'_> {
    fn drop(&mut self) {
        if self.returned {
            return;
        }
        match self.device.enqueue(self.ticket.slot) {
            Ok(()) => tracing::warn!(
                target: "firecam::acquisition",
                "DMA slot {} returned from an error path",
                self.ticket.slot
            ),
            Err(e) => tracing::error!(
                target: "firecam::acquisition",
                "Failed to return DMA slot {}: {}",
                self.ticket.slot,
                e
            ),
        }
    }
}

/// 清空 Ring 中所有待处理的帧，返回丢弃数量
pub(crate) fn flush(device: &mut dyn CameraDevice) -> Result<usize> {
    let mut drained = 0;
    while let Some(ticket) = device.dequeue(CapturePolicy::Poll)? {
        device.enqueue(ticket.slot)?;
        drained += 1;
    }
    if drained > 0 {
        tracing::debug!(target: "firecam::acquisition", "Flushed {} queued frames", drained);
    }
    Ok(drained)
}

/// 取一帧并经过流水线写入输出图像
///
/// 返回 Ok(false) 表示当前没有可用的帧 (非阻塞) 或等待超时 (阻塞)。
pub(crate) fn grab(
    device: &mut dyn CameraDevice,
    policy: CapturePolicy,
    drop_frames: bool,
    pipeline: &Pipeline,
    outputs: &mut [&mut Image],
) -> Result<bool> {
    // 1. 借出
    let Some(mut borrowed) = BorrowedFrame::dequeue(device, policy)? else {
        return Ok(false);
    };

    // 2. 丢帧策略
    if drop_frames {
        borrowed.skip_to_newest()?;
    }

    // 3. 解码并写入
    {
        let frame = borrowed.frame()?;
        let planes = pipeline.run(&frame)?;
        if planes.len() < outputs.len() {
            return Err(CameraError::GrabFailed(format!(
                "pipeline produced {} images, {} requested",
                planes.len(),
                outputs.len()
            )));
        }
        for (plane, img) in planes.iter().zip(outputs.iter_mut()) {
            plane.write_to(img)?;
        }
        tracing::trace!(
            target: "firecam::acquisition",
            "Frame #{} (slot {}) decoded",
            frame.sequence,
            borrowed.ticket().slot
        );
    }

    // 4. 归还
    borrowed.release()?;
    Ok(true)
}

/// One-Shot 单帧采集：关闭连续传输、清空 Ring、触发并等待这一帧
pub(crate) fn grab_still(
    device: &mut dyn CameraDevice,
    pipeline: &Pipeline,
    outputs: &mut [&mut Image],
) -> Result<bool> {
    if device.transmission()? {
        device.set_transmission(false)?;
    }
    flush(device)?;
    device.one_shot()?;
    grab(device, CapturePolicy::Wait, false, pipeline, outputs)
}

//! 模拟 DMA Ring Buffer
//!
//! 固定数量的槽位在两个有界通道之间流转：
//! 空闲池 (free) -> 生产者填充 -> 就绪队列 (ready) -> 消费者借出 -> 归还空闲池。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use firecam_core::builder::CapturePolicy;
use firecam_core::pixel_format::ColorCoding;

/// 已填充的槽位
#[derive(Debug)]
pub(crate) struct FilledBuffer {
    pub(crate) slot: usize,
    pub(crate) data: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) coding: ColorCoding,
    pub(crate) sequence: u64,
    pub(crate) timestamp: Duration,
}

/// 帧形状，由生产者在填充数据时一并给出
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameShape {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) coding: ColorCoding,
}

#[derive(Debug)]
pub(crate) struct DmaRing {
    depth: usize,
    ready_tx: Sender<FilledBuffer>,
    ready_rx: Receiver<FilledBuffer>,
    free_tx: Sender<(usize, Vec<u8>)>,
    free_rx: Receiver<(usize, Vec<u8>)>,
    /// 被覆盖或丢弃的帧
    dropped: AtomicU64,
    sequence: AtomicU64,
    // 同一时刻只允许一个生产者
    producer: Mutex<()>,
}

impl DmaRing {
    pub(crate) fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        let (ready_tx, ready_rx) = bounded(depth);
        let (free_tx, free_rx) = bounded(depth);
        for slot in 0..depth {
            // 通道容量恰好等于槽位数，这里不会失败
            let _ = free_tx.send((slot, Vec::new()));
        }
        Self {
            depth,
            ready_tx,
            ready_rx,
            free_tx,
            free_rx,
            dropped: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            producer: Mutex::new(()),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// 写入一帧
    ///
    /// 优先使用空闲槽位；没有空闲槽位时覆盖最旧的未消费帧；
    /// 所有槽位都被消费者借出时丢弃本帧。返回是否写入成功。
    pub(crate) fn push<F>(&self, fill: F) -> bool
    where
        F: FnOnce(&mut Vec<u8>, u64) -> FrameShape,
    {
        let _guard = match self.producer.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        let (slot, mut data) = match self.free_rx.try_recv() {
            Ok(free) => free,
            Err(_) => match self.ready_rx.try_recv() {
                Ok(oldest) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        target: "firecam::sim",
                        "DMA ring full, overwriting frame #{}",
                        oldest.sequence
                    );
                    (oldest.slot, oldest.data)
                }
                Err(_) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(target: "firecam::sim", "All DMA slots held by consumer, frame discarded");
                    return false;
                }
            },
        };

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        data.clear();
        let shape = fill(&mut data, sequence);

        let filled = FilledBuffer {
            slot,
            data,
            width: shape.width,
            height: shape.height,
            coding: shape.coding,
            sequence,
            // 模拟 30fps 的总线时间
            timestamp: Duration::from_micros(sequence * 33_333),
        };

        self.ready_tx.send(filled).is_ok()
    }

    /// 取出最旧的一帧
    pub(crate) fn pop(&self, policy: CapturePolicy, timeout: Duration) -> Option<FilledBuffer> {
        match policy {
            CapturePolicy::Poll => self.ready_rx.try_recv().ok(),
            CapturePolicy::Wait => self.ready_rx.recv_timeout(timeout).ok(),
        }
    }

    /// 归还槽位
    pub(crate) fn recycle(&self, slot: usize, data: Vec<u8>) {
        let _ = self.free_tx.send((slot, data));
    }

    /// 就绪队列中等待消费的帧数
    pub(crate) fn queued(&self) -> usize {
        self.ready_rx.len()
    }

    /// 空闲池中的槽位数
    pub(crate) fn free_slots(&self) -> usize {
        self.free_rx.len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_seq(buf: &mut Vec<u8>, seq: u64) -> FrameShape {
        buf.push(seq as u8);
        FrameShape {
            width: 1,
            height: 1,
            coding: ColorCoding::Mono8,
        }
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let ring = DmaRing::new(4);
        for _ in 0..6 {
            assert!(ring.push(fill_seq));
        }
        assert_eq!(ring.queued(), 4);
        assert_eq!(ring.dropped(), 2);

        let first = ring.pop(CapturePolicy::Poll, Duration::ZERO).unwrap();
        assert_eq!(first.sequence, 2);
    }

    #[test]
    fn discards_when_every_slot_is_borrowed() {
        let ring = DmaRing::new(2);
        ring.push(fill_seq);
        ring.push(fill_seq);
        let a = ring.pop(CapturePolicy::Poll, Duration::ZERO).unwrap();
        let b = ring.pop(CapturePolicy::Poll, Duration::ZERO).unwrap();

        assert!(!ring.push(fill_seq));
        assert_eq!(ring.dropped(), 1);

        ring.recycle(a.slot, a.data);
        ring.recycle(b.slot, b.data);
        assert_eq!(ring.free_slots(), 2);
        assert!(ring.push(fill_seq));
    }

    #[test]
    fn wait_times_out_on_empty_ring() {
        let ring = DmaRing::new(4);
        assert!(ring
            .pop(CapturePolicy::Wait, Duration::from_millis(5))
            .is_none());
    }
}

use crate::pixel_format::ColorCoding;
use std::time::Duration;

/// DMA Ring 中一个已出队槽位的凭据
///
/// 出队 (dequeue) 得到凭据，处理完毕后必须且只能归还 (enqueue) 一次，
/// 否则 Ring 会被永久耗尽。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    /// 槽位编号
    pub slot: usize,
    /// 出队时 Ring 中排在它后面、尚未被取走的帧数
    pub frames_behind: u32,
}

/// 核心帧结构体
/// 使用生命周期 'a 绑定到驱动的 DMA 槽位，实现零拷贝。
#[derive(Debug)]
pub struct RawFrame<'a> {
    /// 原始图像数据切片
    pub data: &'a [u8],

    /// 图像宽度 (Pixels)
    pub width: u32,

    /// 图像高度 (Pixels)
    pub height: u32,

    /// 跨距/步长 (Bytes per line)
    pub stride: usize,

    /// 驱动报告的颜色编码
    pub coding: ColorCoding,

    /// 帧序号 (用于丢帧统计)
    pub sequence: u64,

    /// 驱动时间戳 (总线周期计数换算)
    pub timestamp: Duration,
}

impl RawFrame<'_> {
    /// 有效像素数据的字节数 (不含行尾 Padding)
    pub fn payload_len(&self) -> usize {
        self.coding.frame_bytes(self.width, self.height)
    }

    /// 逐行拷贝，去掉 stride 带来的行尾 Padding
    pub fn packed(&self) -> Vec<u8> {
        let row = self.payload_len() / self.height.max(1) as usize;
        if self.stride == row {
            return self.data[..self.payload_len().min(self.data.len())].to_vec();
        }
        let mut out = Vec::with_capacity(self.payload_len());
        for r in 0..self.height as usize {
            let start = r * self.stride;
            let end = (start + row).min(self.data.len());
            if start >= end {
                break;
            }
            out.extend_from_slice(&self.data[start..end]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: &[u8], width: u32, height: u32, stride: usize) -> RawFrame<'_> {
        RawFrame {
            data,
            width,
            height,
            stride,
            coding: ColorCoding::Mono8,
            sequence: 0,
            timestamp: Duration::ZERO,
        }
    }

    #[test]
    fn packed_strips_row_padding() {
        let data = [1, 2, 0, 0, 3, 4, 0, 0];
        let f = frame(&data, 2, 2, 4);
        assert_eq!(f.packed(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn packed_is_identity_without_padding() {
        let data = [9, 8, 7, 6];
        assert_eq!(frame(&data, 2, 2, 2).packed(), data.to_vec());
    }
}

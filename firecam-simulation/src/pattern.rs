//! 模拟帧的测试图案

use firecam_core::pixel_format::ColorCoding;

/// Test pattern types for simulated frame generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestPattern {
    /// 每个字节都等于帧序号的低 8 位，便于断言拿到的是哪一帧
    #[default]
    Sequence,
    /// 水平渐变，每行从暗到亮
    Gradient,
    /// 纯色
    Solid(u8),
    /// 字节交替 (a, b, a, b, ...)：16-bit 立体帧中左右两路分别为 a 与 b
    Pairs(u8, u8),
}

/// 按编码与尺寸生成一帧数据
pub(crate) fn generate(
    buf: &mut Vec<u8>,
    pattern: TestPattern,
    width: u32,
    height: u32,
    coding: ColorCoding,
    sequence: u64,
) {
    let len = coding.frame_bytes(width, height);
    buf.resize(len, 0);

    match pattern {
        TestPattern::Sequence => buf.fill(sequence as u8),
        TestPattern::Solid(v) => buf.fill(v),
        TestPattern::Pairs(a, b) => {
            for (i, byte) in buf.iter_mut().enumerate() {
                *byte = if i % 2 == 0 { a } else { b };
            }
        }
        TestPattern::Gradient => {
            let row = (len / height.max(1) as usize).max(1);
            for (i, byte) in buf.iter_mut().enumerate() {
                let x = i % row;
                *byte = ((x * 255) / row.saturating_sub(1).max(1)) as u8;
            }
        }
    }
}

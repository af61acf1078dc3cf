//! MSLUT 压缩寄存器镜像
//!
//! TMC2130 只保存四分之一周期的正弦表，并以差分方式压缩：
//!
//! - `MSLUT0..7`：256 个 bit，每个 bit 在当前段的两个 delta 中二选一
//! - `MSLUTSEL`：4 个段宽度 W0..W3 与 3 个段起点 X1..X3
//! - `MSLUTSTART`：表起点值 START_SIN 与 90° 处的 START_SIN90
//!
//! 宽度 W 对应的 delta 取值为 `{W-1, W}`，因此相邻两项的差必须落在 `-1..=3`，
//! 且整张表最多切换 3 次 delta 区间。

use crate::ProtocolError;
use crate::constants::{AMPLITUDE, SIN0, WAVE_TABLE_LEN};
use crate::registers::Register;
use crate::wave::WaveTable;
use bilge::prelude::*;

/// MSLUTSEL 寄存器（0x68）
///
/// - Bit 0-7: W0..W3（每个 2 bit）
/// - Bit 8-15: X1
/// - Bit 16-23: X2
/// - Bit 24-31: X3
#[bitsize(32)]
#[derive(FromBits, DebugBits, PartialEq, Clone, Copy)]
pub struct MslutSel {
    pub w0: u2,
    pub w1: u2,
    pub w2: u2,
    pub w3: u2,
    pub x1: u8,
    pub x2: u8,
    pub x3: u8,
}

impl MslutSel {
    /// 段宽度数组
    pub fn widths(&self) -> [u8; 4] {
        [
            self.w0().value(),
            self.w1().value(),
            self.w2().value(),
            self.w3().value(),
        ]
    }

    /// 段起点数组
    pub fn bounds(&self) -> [u8; 3] {
        [self.x1(), self.x2(), self.x3()]
    }
}

/// MSLUTSTART 寄存器（0x69）
///
/// - Bit 0-7: START_SIN
/// - Bit 16-23: START_SIN90
#[bitsize(32)]
#[derive(FromBits, DebugBits, PartialEq, Clone, Copy)]
pub struct MslutStart {
    pub start_sin: u8,
    pub unused_low: u8,
    pub start_sin90: u8,
    pub unused_high: u8,
}

/// 完整的 MSLUT 寄存器镜像
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MslutImage {
    /// MSLUT0..MSLUT7
    pub words: [u32; 8],
    pub select: MslutSel,
    pub start: MslutStart,
}

impl MslutImage {
    /// 将 A 相波表压缩为寄存器镜像
    ///
    /// # 错误
    ///
    /// - `MslutDelta`：相邻两项之差超出 `-1..=3`
    /// - `MslutSegments`：需要超过 4 个段
    pub fn encode(table: &WaveTable) -> Result<Self, ProtocolError> {
        let mut words = [0u32; 8];
        let mut widths = [1u8; 4];
        let mut bounds = [u8::MAX; 3];
        let mut segment = 0usize;
        // 当前段 bit=0 对应的 delta（W - 1）
        let mut base: i16 = 0;
        let mut previous = i16::from(SIN0);

        for (index, value) in table.iter().enumerate() {
            let delta = i16::from(value) - previous;
            previous = i16::from(value);

            let bit = match delta - base {
                0 => false,
                1 => true,
                _ => {
                    if !(-1..=3).contains(&delta) {
                        return Err(ProtocolError::MslutDelta { index, delta });
                    }
                    if segment == 3 {
                        return Err(ProtocolError::MslutSegments { index });
                    }

                    // 向下切换时 delta 成为新区间的低值，向上切换时成为高值
                    let (new_base, bit) = if delta < base {
                        (delta, false)
                    } else {
                        (delta - 1, true)
                    };

                    segment += 1;
                    widths[segment] = (new_base + 1) as u8;
                    bounds[segment - 1] = index as u8;
                    base = new_base;
                    bit
                },
            };

            if bit {
                words[index / 32] |= 1 << (index % 32);
            }
        }

        // 未使用的段沿用最后一段的宽度，X=255 的占位边界不会改变解码结果
        for k in segment + 1..widths.len() {
            widths[k] = widths[segment];
        }

        let select = MslutSel::new(
            u2::new(widths[0]),
            u2::new(widths[1]),
            u2::new(widths[2]),
            u2::new(widths[3]),
            bounds[0],
            bounds[1],
            bounds[2],
        );

        Ok(Self {
            words,
            select,
            start: MslutStart::new(SIN0, 0, AMPLITUDE, 0),
        })
    }

    /// 从寄存器镜像还原波表
    pub fn decode(&self) -> WaveTable {
        let widths = self.select.widths();
        let bounds = self.select.bounds();
        let mut value = i16::from(self.start.start_sin());
        let mut table = [0u8; WAVE_TABLE_LEN];

        for (index, slot) in table.iter_mut().enumerate() {
            let segment = bounds.iter().filter(|&&x| index >= usize::from(x)).count();
            let base = i16::from(widths[segment]) - 1;
            let bit = ((self.words[index / 32] >> (index % 32)) & 1) as i16;
            value += base + bit;
            *slot = value.clamp(0, 255) as u8;
        }

        WaveTable::from_array(table)
    }

    /// 按写入顺序列出 (寄存器, 值)
    pub fn registers(&self) -> [(Register, u32); 10] {
        let mut regs = [(Register::MslutStart, u32::from(self.start)); 10];
        for (i, reg) in Register::MSLUT.iter().enumerate() {
            regs[i] = (*reg, self.words[i]);
        }
        regs[8] = (Register::MslutSel, u32::from(self.select));
        regs
    }

    /// 使用的段数
    pub fn segment_count(&self) -> usize {
        1 + self
            .select
            .bounds()
            .iter()
            .filter(|&&x| x != u8::MAX)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::CorrectionFactor;
    use crate::wave::generate;

    #[test]
    fn test_mslut_sel_bit_layout() {
        let sel = MslutSel::new(u2::new(2), u2::new(1), u2::new(0), u2::new(3), 10, 20, 30);
        let raw = u32::from(sel);
        assert_eq!(raw & 0xFF, 0b11_00_01_10);
        assert_eq!((raw >> 8) & 0xFF, 10);
        assert_eq!((raw >> 16) & 0xFF, 20);
        assert_eq!(raw >> 24, 30);
        assert_eq!(sel.widths(), [2, 1, 0, 3]);
    }

    #[test]
    fn test_mslut_start_bit_layout() {
        let start = MslutStart::new(SIN0, 0, AMPLITUDE, 0);
        assert_eq!(u32::from(start), 248 << 16);
    }

    #[test]
    fn test_encode_generated_tables() {
        for millis in [1000, 1050, 1100, 1150, 1200] {
            let pair = generate(CorrectionFactor::from_millis(millis).unwrap());
            let image = MslutImage::encode(&pair.sine)
                .unwrap_or_else(|e| panic!("factor {} failed: {}", millis, e));
            assert_eq!(image.decode(), pair.sine, "factor {}", millis);
            assert!(image.segment_count() <= 4);
        }
    }

    #[test]
    fn test_encode_linear_ramp() {
        // 0, 1, 2, ... 首项 delta = 0，其余 delta = 1，都在 W0 = 1 的区间内
        let mut values = [0u8; WAVE_TABLE_LEN];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as u8;
        }
        let table = WaveTable::from_array(values);
        let image = MslutImage::encode(&table).unwrap();

        assert_eq!(image.select.widths(), [1, 1, 1, 1]);
        assert_eq!(image.segment_count(), 1);
        assert_eq!(image.words[0], 0xFFFF_FFFE);
        assert_eq!(image.words[7], 0xFFFF_FFFF);
        assert_eq!(image.decode(), table);
    }

    #[test]
    fn test_encode_rejects_large_delta() {
        let mut values = [0u8; WAVE_TABLE_LEN];
        values[10] = 5;
        for v in values.iter_mut().skip(11) {
            *v = 5;
        }
        let err = MslutImage::encode(&WaveTable::from_array(values)).unwrap_err();
        assert_eq!(err, ProtocolError::MslutDelta { index: 10, delta: 5 });
    }

    #[test]
    fn test_encode_rejects_too_many_segments() {
        // delta 序列 0,2,0,2,0 需要不断切换区间
        let mut values = [0u8; WAVE_TABLE_LEN];
        let mut level = 0u8;
        for (i, v) in values.iter_mut().enumerate() {
            if i % 2 == 1 && i < 20 {
                level += 2;
            }
            *v = level;
        }
        let err = MslutImage::encode(&WaveTable::from_array(values)).unwrap_err();
        assert!(matches!(err, ProtocolError::MslutSegments { .. }), "{:?}", err);
    }

    #[test]
    fn test_register_order() {
        let pair = generate(CorrectionFactor::NONE);
        let image = MslutImage::encode(&pair.sine).unwrap();
        let regs = image.registers();
        assert_eq!(regs[0].0, Register::Mslut0);
        assert_eq!(regs[7].0, Register::Mslut7);
        assert_eq!(regs[8], (Register::MslutSel, u32::from(image.select)));
        assert_eq!(regs[9], (Register::MslutStart, u32::from(image.start)));
    }
}

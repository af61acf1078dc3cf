//! 恒力矩波表生成
//!
//! 生成四分之一周期内 A 相（正弦）与 B 相（余弦）的电流幅值表，
//! 使每个微步位置上两相电流的合成幅值恒为 [`AMPLITUDE`]。
//!
//! # 算法
//!
//! θ(i) = i / 256 · π/2。
//!
//! - 第一相（i < 128）：A 相取幂律校正曲线 `g · sin(θ)^k`，
//!   B 相由约束解出 `sqrt(amp² − A²)`。
//! - 第二相（i ≥ 128）：角色互换，B 相取 `g · cos(θ)^k`，A 相由约束解出。
//!
//! 幂律校正总是作用在当前接近过零点的那一相上，避免在另一相接近峰值、
//! 数值接近零的位置放大量化噪声。
//!
//! 增益 `g = amp · (1/√2)^(1−k)` 使两相在 θ = π/4（i = 128）处都恰好等于
//! `amp/√2`，因此两段曲线在切换点连续，且 k = 1 时退化为标准正弦/余弦表。
//! 求解侧始终使用 `sqrt(max(0, amp² − x²))`，从不做除法。

use crate::constants::{AMPLITUDE, PHASE_SPLIT, WAVE_TABLE_LEN};
use crate::factor::CorrectionFactor;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};
use std::ops::Index;

/// 线圈相位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// 正弦相
    A,
    /// 余弦相
    B,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::A, Phase::B];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::A => f.write_str("A"),
            Phase::B => f.write_str("B"),
        }
    }
}

/// 单相波表（256 个 8 bit 幅值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaveTable([u8; WAVE_TABLE_LEN]);

impl WaveTable {
    /// 从原始数组创建
    pub fn from_array(values: [u8; WAVE_TABLE_LEN]) -> Self {
        Self(values)
    }

    /// 原始数组
    pub fn as_array(&self) -> &[u8; WAVE_TABLE_LEN] {
        &self.0
    }

    /// 迭代所有幅值
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// 日志中使用的采样值（0, 32, 64, 96, 127, 128, 160, 192, 224, 255）
    pub fn samples(&self) -> [u8; 10] {
        [0, 32, 64, 96, 127, 128, 160, 192, 224, 255].map(|i| self.0[i])
    }
}

impl Index<usize> for WaveTable {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// 一个轴的两相波表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavePair {
    /// 生成该表所用的校正因子
    pub factor: CorrectionFactor,
    /// A 相（正弦）
    pub sine: WaveTable,
    /// B 相（余弦）
    pub cosine: WaveTable,
}

impl WavePair {
    /// 按相位取表
    pub fn phase(&self, phase: Phase) -> &WaveTable {
        match phase {
            Phase::A => &self.sine,
            Phase::B => &self.cosine,
        }
    }

    /// 第 `index` 个位置的合成幅值 `sqrt(A² + B²)`
    pub fn magnitude(&self, index: usize) -> f64 {
        f64::from(self.sine[index]).hypot(f64::from(self.cosine[index]))
    }
}

/// 生成恒力矩波表
///
/// 纯函数：相同的因子总是得到逐位相同的结果。
pub fn generate(factor: CorrectionFactor) -> WavePair {
    let exponent = factor.exponent();
    let amplitude = f64::from(AMPLITUDE);
    let gain = amplitude * FRAC_1_SQRT_2.powf(1.0 - exponent);

    let mut sine = [0u8; WAVE_TABLE_LEN];
    let mut cosine = [0u8; WAVE_TABLE_LEN];

    for i in 0..WAVE_TABLE_LEN {
        let theta = i as f64 / WAVE_TABLE_LEN as f64 * FRAC_PI_2;

        let (a, b) = if i < PHASE_SPLIT {
            let a = gain * theta.sin().powf(exponent);
            (a, solve_constant_torque(amplitude, a))
        } else {
            let b = gain * theta.cos().powf(exponent);
            (solve_constant_torque(amplitude, b), b)
        };

        sine[i] = quantize(a);
        cosine[i] = quantize(b);
    }

    WavePair {
        factor,
        sine: WaveTable(sine),
        cosine: WaveTable(cosine),
    }
}

/// 已知一相幅值，求满足 `x² + other² = amplitude²` 的另一相
fn solve_constant_torque(amplitude: f64, other: f64) -> f64 {
    (amplitude * amplitude - other * other).max(0.0).sqrt()
}

fn quantize(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(millis: i64) -> CorrectionFactor {
        CorrectionFactor::from_millis(millis).unwrap()
    }

    #[test]
    fn test_constant_torque_within_rounding() {
        for millis in [1000, 1050, 1100, 1150, 1200] {
            let pair = generate(factor(millis));
            for i in 0..WAVE_TABLE_LEN {
                let magnitude = pair.magnitude(i);
                assert!(
                    (magnitude - f64::from(AMPLITUDE)).abs() <= 1.0,
                    "factor {} index {}: A={} B={} |v|={}",
                    millis,
                    i,
                    pair.sine[i],
                    pair.cosine[i],
                    magnitude
                );
            }
        }
    }

    #[test]
    fn test_identity_factor_is_plain_sine() {
        let pair = generate(CorrectionFactor::NONE);
        for i in 0..WAVE_TABLE_LEN {
            let theta = i as f64 / 256.0 * FRAC_PI_2;
            let sin = (248.0 * theta.sin()).round() as i32;
            let cos = (248.0 * theta.cos()).round() as i32;
            assert!((i32::from(pair.sine[i]) - sin).abs() <= 1, "sine index {}", i);
            assert!((i32::from(pair.cosine[i]) - cos).abs() <= 1, "cosine index {}", i);
        }
    }

    #[test]
    fn test_endpoints() {
        for millis in [1000, 1100, 1200] {
            let pair = generate(factor(millis));
            assert_eq!(pair.sine[0], 0);
            assert_eq!(pair.cosine[0], AMPLITUDE);
            assert!(pair.sine[255] >= AMPLITUDE - 1);
            assert!(pair.cosine[255] <= 2);
        }
    }

    #[test]
    fn test_phase_split_continuity() {
        // i = 128 处两相都为 amp/√2 ≈ 175.36
        for millis in [1000, 1100, 1200] {
            let pair = generate(factor(millis));
            assert_eq!(pair.sine[128], 175);
            assert_eq!(pair.cosine[128], 175);
        }
    }

    #[test]
    fn test_monotonic_branches() {
        for millis in [1000, 1050, 1100, 1150, 1200] {
            let pair = generate(factor(millis));
            for i in 1..WAVE_TABLE_LEN {
                assert!(pair.sine[i] >= pair.sine[i - 1], "sine not monotonic at {}", i);
                assert!(pair.cosine[i] <= pair.cosine[i - 1], "cosine not monotonic at {}", i);
            }
        }
    }

    #[test]
    fn test_correction_lowers_low_index_current() {
        let plain = generate(CorrectionFactor::NONE);
        let corrected = generate(CorrectionFactor::MAX);
        // 幂律 k > 1 在过零点附近压低曲线，在切换点处汇合
        assert!(corrected.sine[16] < plain.sine[16]);
        assert_eq!(corrected.sine[128], plain.sine[128]);
        assert!(corrected.cosine[240] < plain.cosine[240]);
    }

    #[test]
    fn test_deterministic() {
        let a = generate(factor(1130));
        let b = generate(factor(1130));
        assert_eq!(a, b);
        assert_eq!(a.phase(Phase::A), &a.sine);
        assert_eq!(a.phase(Phase::B), &a.cosine);
    }

    #[test]
    fn test_samples() {
        let pair = generate(CorrectionFactor::NONE);
        let samples = pair.sine.samples();
        assert_eq!(samples[0], 0);
        assert_eq!(samples[5], pair.sine[128]);
        assert_eq!(samples[9], pair.sine[255]);
    }
}

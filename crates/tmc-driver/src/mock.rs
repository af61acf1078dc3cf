//! Mock 单轴硬件
//!
//! 在内存中模拟 TMC 驱动器的微步计数器、方向线与波表存储，
//! 并支持故障注入（丢脉冲、读数不可用、写入失败），用于无硬件测试与仿真。

use crate::hardware::{HardwareError, MicrostepCounter, StepDirection, WaveTableWriter};
use std::time::Duration;
use tmc_protocol::{
    AxisId, MSCNT_MASK, MicrostepPosition, MicrostepResolution, MslutImage, Phase, WaveTable,
};

/// 模拟单轴驱动器
#[derive(Debug, Clone)]
pub struct MockAxisHardware {
    /// MSCNT（1/256 微步）
    mscnt: u16,
    resolution: MicrostepResolution,
    /// 当前方向线电平
    direction_level: Option<bool>,
    /// 接线反转：为 true 时低电平才是计数器递增方向
    inverted_wiring: bool,

    // 记录
    tables: Vec<(Phase, WaveTable)>,
    mslut: Option<MslutImage>,
    pulses: u32,
    direction_changes: u32,
    reads: u32,

    // 故障注入
    dropped_pulses: u32,
    readback_failures: u32,
    readback_disabled: bool,
    write_failure: bool,
    /// 再经过多少次写入后失败一次
    write_fault_in: Option<u32>,
}

impl MockAxisHardware {
    pub fn new(resolution: MicrostepResolution) -> Self {
        Self {
            mscnt: 0,
            resolution,
            direction_level: None,
            inverted_wiring: false,
            tables: Vec::new(),
            mslut: None,
            pulses: 0,
            direction_changes: 0,
            reads: 0,
            dropped_pulses: 0,
            readback_failures: 0,
            readback_disabled: false,
            write_failure: false,
            write_fault_in: None,
        }
    }

    /// 设置初始位置（当前分辨率下的微步）
    pub fn with_position(mut self, position: u32) -> Self {
        self.set_position(MicrostepPosition::wrapping(position, self.resolution));
        self
    }

    /// 接线反转（方向电平与计数方向相反）
    pub fn with_inverted_wiring(mut self, inverted: bool) -> Self {
        self.inverted_wiring = inverted;
        self
    }

    pub fn set_position(&mut self, position: MicrostepPosition) {
        self.mscnt = (position.value() << self.resolution.mres()) & MSCNT_MASK;
    }

    /// 当前分辨率下的位置
    pub fn position(&self) -> MicrostepPosition {
        MicrostepPosition::from_mscnt(self.mscnt, self.resolution)
    }

    pub fn mscnt(&self) -> u16 {
        self.mscnt
    }

    /// 实际生效的脉冲数（不含被丢弃的）
    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    pub fn direction_changes(&self) -> u32 {
        self.direction_changes
    }

    pub fn direction_level(&self) -> Option<bool> {
        self.direction_level
    }

    /// 成功的计数器读取次数
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// 按写入顺序记录的波表
    pub fn written_tables(&self) -> &[(Phase, WaveTable)] {
        &self.tables
    }

    /// 某相最近一次写入的波表
    pub fn last_table(&self, phase: Phase) -> Option<&WaveTable> {
        self.tables
            .iter()
            .rev()
            .find(|(p, _)| *p == phase)
            .map(|(_, table)| table)
    }

    pub fn mslut(&self) -> Option<&MslutImage> {
        self.mslut.as_ref()
    }

    /// 丢弃接下来的 `count` 个脉冲
    pub fn drop_next_pulses(&mut self, count: u32) {
        self.dropped_pulses = count;
    }

    /// 接下来的 `count` 次读数超时
    pub fn fail_next_reads(&mut self, count: u32) {
        self.readback_failures = count;
    }

    /// 永久关闭读数
    pub fn set_readback_available(&mut self, available: bool) {
        self.readback_disabled = !available;
    }

    pub fn set_write_failure(&mut self, fail: bool) {
        self.write_failure = fail;
    }

    /// 让之后第 `index` 次写入（波表或 MSLUT，从 0 开始计数）失败一次
    pub fn fail_write_at(&mut self, index: u32) {
        self.write_fault_in = Some(index);
    }

    fn check_write(&mut self) -> Result<(), HardwareError> {
        if self.write_failure {
            return Err(HardwareError::Device("simulated write failure".to_string()));
        }
        match self.write_fault_in {
            Some(0) => {
                self.write_fault_in = None;
                Err(HardwareError::Device("simulated write failure".to_string()))
            },
            Some(n) => {
                self.write_fault_in = Some(n - 1);
                Ok(())
            },
            None => Ok(()),
        }
    }
}

impl WaveTableWriter for MockAxisHardware {
    fn write_wave_table(
        &mut self,
        _axis: &AxisId,
        phase: Phase,
        table: &WaveTable,
    ) -> Result<(), HardwareError> {
        self.check_write()?;
        self.tables.push((phase, *table));
        Ok(())
    }

    fn write_mslut(&mut self, _axis: &AxisId, image: &MslutImage) -> Result<(), HardwareError> {
        self.check_write()?;
        self.mslut = Some(*image);
        Ok(())
    }
}

impl StepDirection for MockAxisHardware {
    fn set_direction(&mut self, _axis: &AxisId, level: bool) -> Result<(), HardwareError> {
        if self.direction_level != Some(level) {
            self.direction_changes += 1;
        }
        self.direction_level = Some(level);
        Ok(())
    }

    fn pulse(&mut self, _axis: &AxisId) -> Result<(), HardwareError> {
        let level = self.direction_level.ok_or(HardwareError::NotReady)?;

        if self.dropped_pulses > 0 {
            self.dropped_pulses -= 1;
            return Ok(());
        }

        let step = 1u16 << self.resolution.mres();
        let cycle = MSCNT_MASK + 1;
        self.mscnt = if level != self.inverted_wiring {
            (self.mscnt + step) & MSCNT_MASK
        } else {
            (self.mscnt + cycle - step) & MSCNT_MASK
        };
        self.pulses += 1;
        Ok(())
    }
}

impl MicrostepCounter for MockAxisHardware {
    fn read_microstep_counter(
        &mut self,
        _axis: &AxisId,
        _timeout: Duration,
    ) -> Result<u16, HardwareError> {
        if self.readback_disabled {
            return Err(HardwareError::Timeout);
        }
        if self.readback_failures > 0 {
            self.readback_failures -= 1;
            return Err(HardwareError::Timeout);
        }
        self.reads += 1;
        Ok(self.mscnt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> AxisId {
        AxisId::new("X").unwrap()
    }

    #[test]
    fn test_pulse_moves_counter() {
        let mut hw = MockAxisHardware::new(MicrostepResolution::FULL).with_position(1023);
        hw.set_direction(&axis(), true).unwrap();
        hw.pulse(&axis()).unwrap();
        assert_eq!(hw.position().value(), 0);

        hw.set_direction(&axis(), false).unwrap();
        hw.pulse(&axis()).unwrap();
        hw.pulse(&axis()).unwrap();
        assert_eq!(hw.position().value(), 1022);
        assert_eq!(hw.direction_changes(), 2);
        assert_eq!(hw.pulses(), 3);
    }

    #[test]
    fn test_pulse_without_direction_is_rejected() {
        let mut hw = MockAxisHardware::new(MicrostepResolution::FULL);
        assert!(matches!(hw.pulse(&axis()), Err(HardwareError::NotReady)));
    }

    #[test]
    fn test_reduced_resolution_counter() {
        let sixteen = MicrostepResolution::new(16).unwrap();
        let mut hw = MockAxisHardware::new(sixteen).with_position(63);
        assert_eq!(hw.mscnt(), 1008);
        hw.set_direction(&axis(), true).unwrap();
        hw.pulse(&axis()).unwrap();
        assert_eq!(hw.mscnt(), 0);
        assert_eq!(hw.position().value(), 0);
    }

    #[test]
    fn test_fault_injection() {
        let mut hw = MockAxisHardware::new(MicrostepResolution::FULL);
        hw.fail_next_reads(1);
        assert!(hw.read_microstep_counter(&axis(), Duration::ZERO).is_err());
        assert_eq!(hw.read_microstep_counter(&axis(), Duration::ZERO).unwrap(), 0);

        hw.set_direction(&axis(), true).unwrap();
        hw.drop_next_pulses(2);
        for _ in 0..3 {
            hw.pulse(&axis()).unwrap();
        }
        assert_eq!(hw.position().value(), 1);

        hw.set_write_failure(true);
        let table = WaveTable::from_array([0; 256]);
        assert!(hw.write_wave_table(&axis(), Phase::A, &table).is_err());
        assert!(hw.written_tables().is_empty());
    }

    #[test]
    fn test_single_write_fault() {
        let mut hw = MockAxisHardware::new(MicrostepResolution::FULL);
        let table = WaveTable::from_array([0; 256]);
        hw.fail_write_at(1);

        assert!(hw.write_wave_table(&axis(), Phase::A, &table).is_ok());
        assert!(hw.write_wave_table(&axis(), Phase::B, &table).is_err());
        assert!(hw.write_wave_table(&axis(), Phase::B, &table).is_ok());
        assert_eq!(hw.written_tables().len(), 2);
    }
}

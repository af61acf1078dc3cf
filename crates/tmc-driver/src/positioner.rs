//! 微步定位
//!
//! 把步进电机移动到电周期内的指定微步位置：
//!
//! ```text
//! ReadCurrent -> ComputeDelta -> Pulse -> Verify -> Done
//!                                  ^         |
//!                                  +- retry -+ (有限次) -> Failed
//! ```
//!
//! 方向与步数在下发前就已确定，下发给硬件的步数永远非负。
//! 微步位置每次操作都重新从硬件读取，不做缓存。

use crate::error::DriverError;
use crate::hardware::{AxisHardware, HardwareError, MicrostepCounter, StepDirection};
use std::time::Duration;
use tmc_protocol::{
    AxisId, Direction, DirectionMode, MAX_RETRIES_LIMIT, MicrostepPosition, MicrostepResolution,
};
use tracing::{debug, info, trace, warn};

/// 定位器配置
///
/// # Example
///
/// ```
/// use tmc_driver::PositionerConfig;
/// use std::time::Duration;
///
/// // 默认：1µs 方向建立时间，1000µs 步进间隔，重试 1 次
/// let config = PositionerConfig::default();
///
/// // 仿真时去掉所有延时
/// let config = PositionerConfig {
///     step_interval: Duration::ZERO,
///     ..config
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionerConfig {
    /// 方向信号反转（与方向电平异或）
    pub invert_dir: bool,
    /// 微步分辨率
    pub resolution: MicrostepResolution,
    /// 方向切换后到第一个脉冲的建立时间
    pub dir_setup: Duration,
    /// 每个脉冲沿之后的稳定时间
    pub pulse_width: Duration,
    /// 相邻脉冲之间的间隔
    pub step_interval: Duration,
    /// 校验失败后的重试次数（上限 [`MAX_RETRIES_LIMIT`]）
    pub max_retries: u8,
    /// 读取微步计数器的超时
    pub readback_timeout: Duration,
}

impl Default for PositionerConfig {
    fn default() -> Self {
        Self {
            invert_dir: false,
            resolution: MicrostepResolution::FULL,
            dir_setup: Duration::from_micros(1),
            pulse_width: Duration::from_micros(2),
            step_interval: Duration::from_micros(1000),
            max_retries: 1,
            readback_timeout: Duration::from_millis(50),
        }
    }
}

impl PositionerConfig {
    /// 去掉所有脉冲延时（仿真硬件使用）
    pub fn without_delays(self) -> Self {
        Self {
            dir_setup: Duration::ZERO,
            pulse_width: Duration::ZERO,
            step_interval: Duration::ZERO,
            ..self
        }
    }
}

// ============================================================================
// 请求与计划
// ============================================================================

/// 当前位置的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readback {
    /// 必须从硬件读取，读取失败即中止
    #[default]
    Required,
    /// 读取失败时假定为给定位置，并跳过到位校验（仅算法模式）
    Assume(MicrostepPosition),
}

/// 定位请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositioningRequest {
    pub target: MicrostepPosition,
    pub mode: DirectionMode,
    pub readback: Readback,
}

impl PositioningRequest {
    pub fn new(target: MicrostepPosition, mode: DirectionMode) -> Self {
        Self {
            target,
            mode,
            readback: Readback::Required,
        }
    }

    /// 允许在读数不可用时以 `position` 作为当前位置
    pub fn assume_current(mut self, position: MicrostepPosition) -> Self {
        self.readback = Readback::Assume(position);
        self
    }
}

/// 一次移动的方向与步数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub current: MicrostepPosition,
    pub target: MicrostepPosition,
    pub direction: Direction,
    pub steps: u16,
}

impl MovePlan {
    /// 计算移动计划
    ///
    /// - `Forward`：正向距离 `(target - current) mod cycle`
    /// - `Backward`：反向距离 `cycle - forward`（对周期取模）
    /// - `Auto`：取较短者，距离相等（半周期）时取正向
    pub fn compute(
        current: MicrostepPosition,
        target: MicrostepPosition,
        mode: DirectionMode,
        resolution: MicrostepResolution,
    ) -> Self {
        let cycle = resolution.cycle();
        let forward = current.forward_distance_to(target, resolution);
        let backward = (cycle - forward) % cycle;

        let (direction, steps) = match mode {
            DirectionMode::Forward => (Direction::Forward, forward),
            DirectionMode::Backward => (Direction::Backward, backward),
            DirectionMode::Auto if forward <= backward => (Direction::Forward, forward),
            DirectionMode::Auto => (Direction::Backward, backward),
        };

        Self {
            current,
            target,
            direction,
            steps,
        }
    }

    /// 是否已经在目标位置
    pub fn is_noop(&self) -> bool {
        self.steps == 0
    }
}

/// 定位结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// 首次计划
    pub plan: MovePlan,
    /// 最终位置（未校验时为计划目标）
    pub position: MicrostepPosition,
    /// 实际发送的脉冲总数（含重试）
    pub pulses: u32,
    pub retries: u8,
    /// 是否经过硬件读数确认
    pub verified: bool,
}

// ============================================================================
// 定位器
// ============================================================================

/// 单轴微步定位器
///
/// 定位器本身不持有硬件；调用方在整个 `move_to` 期间独占该轴的硬件句柄
/// （`&mut H`），因此同一轴的两次定位不可能交错，不同轴之间互不影响。
#[derive(Debug, Clone)]
pub struct StepPositioner {
    axis: AxisId,
    config: PositionerConfig,
}

impl StepPositioner {
    pub fn new(axis: AxisId, config: PositionerConfig) -> Self {
        Self { axis, config }
    }

    pub fn axis(&self) -> &AxisId {
        &self.axis
    }

    pub fn config(&self) -> &PositionerConfig {
        &self.config
    }

    /// 读取当前位置，返回 (MSCNT 原始值, 当前分辨率下的位置)
    pub fn read_position<H>(&self, hw: &mut H) -> Result<(u16, MicrostepPosition), HardwareError>
    where
        H: MicrostepCounter + ?Sized,
    {
        let raw = hw.read_microstep_counter(&self.axis, self.config.readback_timeout)?;
        Ok((raw, MicrostepPosition::from_mscnt(raw, self.config.resolution)))
    }

    /// 移动到目标位置
    ///
    /// 校验发现偏差后，修正移动总是按 [`DirectionMode::Auto`] 从实际位置重新规划，
    /// 与请求的方向模式无关：`Forward` 请求在重试时也可能发出反向脉冲。
    ///
    /// # 错误
    ///
    /// - `ReadbackUnavailable`：读数失败且请求未提供假定位置，或校验时读数失败
    /// - `StepSignal`：方向/脉冲信号发送失败
    /// - `PositionMismatch`：重试 `max_retries` 次后仍未到位
    pub fn move_to<H>(
        &self,
        hw: &mut H,
        request: &PositioningRequest,
    ) -> Result<MoveReport, DriverError>
    where
        H: AxisHardware + ?Sized,
    {
        let resolution = self.config.resolution;
        let target = request.target;

        let (current, verify) = match (self.read_position(hw), request.readback) {
            (Ok((raw, current)), _) => {
                debug!(axis = %self.axis, mscnt = raw, "Read microstep counter");
                (current, true)
            },
            (Err(e), Readback::Assume(assumed)) => {
                warn!(
                    axis = %self.axis,
                    assumed = %assumed,
                    "Microstep counter unavailable ({}), planning from assumed position without verification",
                    e
                );
                (assumed, false)
            },
            (Err(source), Readback::Required) => {
                return Err(DriverError::ReadbackUnavailable {
                    axis: self.axis.clone(),
                    target,
                    source,
                });
            },
        };

        let plan = MovePlan::compute(current, target, request.mode, resolution);
        info!(
            axis = %self.axis,
            current = %plan.current,
            target = %plan.target,
            steps = plan.steps,
            direction = %plan.direction,
            mode = %request.mode,
            resolution = resolution.microsteps(),
            "Positioning"
        );

        let mut pulses = self.execute(hw, &plan)?;

        if !verify {
            return Ok(MoveReport {
                plan,
                position: target,
                pulses,
                retries: 0,
                verified: false,
            });
        }

        let mut retries = 0u8;
        loop {
            let (raw, actual) =
                self.read_position(hw)
                    .map_err(|source| DriverError::ReadbackUnavailable {
                        axis: self.axis.clone(),
                        target,
                        source,
                    })?;

            if actual == target {
                debug!(axis = %self.axis, mscnt = raw, position = %actual, "Position verified");
                return Ok(MoveReport {
                    plan,
                    position: actual,
                    pulses,
                    retries,
                    verified: true,
                });
            }

            if retries >= self.config.max_retries.min(MAX_RETRIES_LIMIT) {
                return Err(DriverError::PositionMismatch {
                    axis: self.axis.clone(),
                    expected: target,
                    actual,
                    retries,
                });
            }

            retries += 1;
            let correction = MovePlan::compute(actual, target, DirectionMode::Auto, resolution);
            warn!(
                axis = %self.axis,
                expected = %target,
                actual = %actual,
                retry = retries,
                steps = correction.steps,
                direction = %correction.direction,
                "Position mismatch, correcting"
            );
            pulses += self.execute(hw, &correction)?;
        }
    }

    /// 按计划发送方向与脉冲，返回发送的脉冲数
    fn execute<H>(&self, hw: &mut H, plan: &MovePlan) -> Result<u32, DriverError>
    where
        H: StepDirection + ?Sized,
    {
        if plan.is_noop() {
            return Ok(0);
        }

        let level = plan.direction.signal(self.config.invert_dir);
        hw.set_direction(&self.axis, level)
            .map_err(|source| self.step_error(0, source))?;
        pause(self.config.dir_setup);

        let total = u32::from(plan.steps);
        for sent in 0..total {
            hw.pulse(&self.axis)
                .map_err(|source| self.step_error(sent, source))?;
            pause(self.config.pulse_width);

            if sent < 2 || sent + 2 >= total {
                trace!(axis = %self.axis, pulse = sent + 1, total, "Step pulse");
            }

            if sent + 1 < total {
                pause(self.config.step_interval);
            }
        }

        Ok(total)
    }

    fn step_error(&self, pulses_sent: u32, source: HardwareError) -> DriverError {
        DriverError::StepSignal {
            axis: self.axis.clone(),
            pulses_sent,
            source,
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        spin_sleep::sleep(duration);
    }
}

//! 单轴线性度控制
//!
//! [`LinearityAxis`] 持有一个轴的硬件句柄、当前校正因子和最近一次写入的波表：
//!
//! - `apply` / `set_factor` / `set_wave`：生成恒力矩波表并写入驱动器
//! - `set_step` / `move_to`：移动到电周期内的指定微步位置
//!
//! 因子只有在两相波表都写入成功之后才会更新；参数校验失败时硬件不会被访问，
//! 当前波表保持不变。

use crate::error::LinearityError;
use std::fmt;
use std::time::Duration;
use tmc_driver::{
    AxisHardware, DriverError, MoveReport, PositionerConfig, PositioningRequest, StepPositioner,
    WaveTableWriter,
};
use tmc_protocol::{
    AMPLITUDE, AxisId, CorrectionFactor, DirectionMode, MicrostepPosition, MicrostepResolution,
    MslutImage, Phase, SIN0, WavePair, generate,
};
use tmc_tools::{PositioningConfig, ResolvedAxis};
use tracing::{debug, error, info, warn};

/// 从配置构造定位器参数
pub fn positioner_config(axis: &ResolvedAxis, positioning: &PositioningConfig) -> PositionerConfig {
    PositionerConfig {
        invert_dir: axis.invert_dir,
        resolution: axis.resolution,
        dir_setup: Duration::from_micros(positioning.dir_setup_us),
        pulse_width: Duration::from_micros(positioning.pulse_width_us),
        step_interval: Duration::from_micros(positioning.step_interval_us),
        max_retries: positioning.max_retries,
        readback_timeout: Duration::from_millis(positioning.readback_timeout_ms),
    }
}

/// 单轴线性度控制器
pub struct LinearityAxis<H> {
    hardware: H,
    factor: CorrectionFactor,
    tables: Option<WavePair>,
    positioner: StepPositioner,
}

impl<H: AxisHardware> LinearityAxis<H> {
    /// 创建轴（因子为 1.000，尚未写入波表）
    pub fn new(axis: AxisId, hardware: H, config: PositionerConfig) -> Self {
        Self {
            hardware,
            factor: CorrectionFactor::NONE,
            tables: None,
            positioner: StepPositioner::new(axis, config),
        }
    }

    /// 从校验后的配置创建
    pub fn from_config(resolved: &ResolvedAxis, positioning: &PositioningConfig, hardware: H) -> Self {
        let config = positioner_config(resolved, positioning);
        Self::new(resolved.axis.clone(), hardware, config).with_factor(resolved.factor)
    }

    /// 设置初始因子（不写入硬件，调用 [`apply`](Self::apply) 生效）
    pub fn with_factor(mut self, factor: CorrectionFactor) -> Self {
        self.factor = factor;
        self
    }

    pub fn axis(&self) -> &AxisId {
        self.positioner.axis()
    }

    /// 当前生效（或待生效）的因子
    pub fn factor(&self) -> CorrectionFactor {
        self.factor
    }

    /// 最近一次成功写入的波表
    pub fn tables(&self) -> Option<&WavePair> {
        self.tables.as_ref()
    }

    pub fn resolution(&self) -> MicrostepResolution {
        self.positioner.config().resolution
    }

    pub fn positioner(&self) -> &StepPositioner {
        &self.positioner
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn into_hardware(self) -> H {
        self.hardware
    }

    // ========================================================================
    // 波表
    // ========================================================================

    /// 按当前因子生成并写入波表
    pub fn apply(&mut self) -> Result<&WavePair, LinearityError> {
        self.set_factor(self.factor)
    }

    /// 切换到新的因子并写入波表
    ///
    /// 写入中途失败时驱动器里可能已有一部分新波表，此时重新写入上一组波表：
    ///
    /// - 恢复成功：因子与波表记录保持不变，返回原始写入错误
    /// - 恢复失败或没有上一组波表：波表记录清空（驱动器内容未知），
    ///   返回 [`LinearityError::WaveRollback`]，需要再次 [`apply`](Self::apply)
    pub fn set_factor(&mut self, factor: CorrectionFactor) -> Result<&WavePair, LinearityError> {
        let axis = self.positioner.axis().clone();
        info!(
            axis = %axis,
            factor = %factor,
            amplitude = AMPLITUDE,
            sin0 = SIN0,
            "Applying constant torque wave"
        );

        let pair = generate(factor);
        if let Err(e) = write_pair(&mut self.hardware, &axis, &pair) {
            error!(axis = %axis, factor = %factor, "Failed to write wave table: {}", e);
            return Err(self.restore_tables(&axis, e));
        }

        info!(axis = %axis, "Sample wave values A: {:?}", pair.sine.samples());
        debug!(axis = %axis, "Sample wave values B: {:?}", pair.cosine.samples());

        self.factor = factor;
        Ok(&*self.tables.insert(pair))
    }

    /// 写入失败后把上一组波表写回驱动器
    fn restore_tables(&mut self, axis: &AxisId, source: DriverError) -> LinearityError {
        let Some(previous) = self.tables.take() else {
            warn!(axis = %axis, "No previous wave table to restore, driver contents unknown");
            return LinearityError::WaveRollback {
                axis: axis.clone(),
                source,
                restore: None,
            };
        };

        match write_pair(&mut self.hardware, axis, &previous) {
            Ok(()) => {
                warn!(axis = %axis, factor = %previous.factor, "Restored previous wave table");
                self.tables = Some(previous);
                source.into()
            },
            Err(restore) => {
                error!(axis = %axis, "Failed to restore previous wave table: {}", restore);
                LinearityError::WaveRollback {
                    axis: axis.clone(),
                    source,
                    restore: Some(restore),
                }
            },
        }
    }

    /// "set wave" 命令：因子 = 1000 + offset
    pub fn set_wave(&mut self, offset: i64) -> Result<WaveOutcome, LinearityError> {
        let factor =
            CorrectionFactor::from_offset(offset).map_err(|source| LinearityError::InvalidWave {
                axis: self.axis().clone(),
                requested: offset,
                current: self.factor,
                source,
            })?;

        self.set_factor(factor)?;
        Ok(WaveOutcome {
            axis: self.axis().clone(),
            factor,
        })
    }

    // ========================================================================
    // 定位
    // ========================================================================

    /// "set step" 命令：原始目标按当前分辨率的周期掩码
    pub fn set_step(&mut self, raw: i64, mode: DirectionMode) -> Result<StepOutcome, LinearityError> {
        let resolution = self.resolution();
        let target = MicrostepPosition::from_step_command(raw, resolution).map_err(|source| {
            LinearityError::InvalidStep {
                axis: self.axis().clone(),
                requested: raw,
                source,
            }
        })?;

        let report = self.move_to(&PositioningRequest::new(target, mode))?;
        Ok(StepOutcome {
            axis: self.axis().clone(),
            requested: raw,
            resolution,
            report,
        })
    }

    /// 执行定位请求
    ///
    /// 持有 `&mut self` 即独占该轴硬件，直到定位完成或失败。
    pub fn move_to(&mut self, request: &PositioningRequest) -> Result<MoveReport, LinearityError> {
        let report = self.positioner.move_to(&mut self.hardware, request)?;
        if !report.verified {
            warn!(axis = %self.axis(), position = %report.position, "Move completed without readback verification");
        }
        Ok(report)
    }
}

/// 写入两相波表，再写入 MSLUT 压缩镜像
fn write_pair<H: WaveTableWriter + ?Sized>(
    hardware: &mut H,
    axis: &AxisId,
    pair: &WavePair,
) -> Result<(), DriverError> {
    for phase in Phase::ALL {
        hardware
            .write_wave_table(axis, phase, pair.phase(phase))
            .map_err(|source| DriverError::WaveWrite {
                axis: axis.clone(),
                phase,
                source,
            })?;
    }

    // 压缩失败不影响原始波表，只记录警告
    match MslutImage::encode(&pair.sine) {
        Ok(image) => {
            let sel = image.select;
            info!(
                axis = %axis,
                "MSLUTSEL w={:?} x={:?}",
                sel.widths(),
                sel.bounds()
            );
            for (register, value) in image.registers() {
                debug!(axis = %axis, "{}=0x{:08x}", register.name(), value);
            }
            hardware
                .write_mslut(axis, &image)
                .map_err(|source| DriverError::MslutWrite {
                    axis: axis.clone(),
                    source,
                })?;
        },
        Err(e) => warn!(axis = %axis, "Wave table not representable as MSLUT image: {}", e),
    }

    Ok(())
}

// ============================================================================
// 命令结果
// ============================================================================

/// "set wave" 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveOutcome {
    pub axis: AxisId,
    pub factor: CorrectionFactor,
}

impl fmt::Display for WaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TMC2130 linearity factor for {} set to {} (offset: {})",
            self.axis,
            self.factor,
            self.factor.offset()
        )
    }
}

/// "set step" 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub axis: AxisId,
    /// 命令中的原始目标
    pub requested: i64,
    pub resolution: MicrostepResolution,
    pub report: MoveReport,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TMC2130 {} moved to microstep position {} (requested: {}, resolution: {})",
            self.axis,
            self.report.position,
            self.requested,
            self.resolution.microsteps()
        )?;
        if !self.report.verified {
            f.write_str(" [unverified]")?;
        }
        Ok(())
    }
}

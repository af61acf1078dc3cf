//! 多轴控制器
//!
//! 每个轴由独立的 `Mutex` 保护：同一轴上的操作串行执行，
//! 不同轴之间可以在不同线程中并发执行。

use crate::axis::{LinearityAxis, StepOutcome, WaveOutcome};
use crate::command::{CommandSpec, LinearityCommand, command_catalogue};
use crate::error::LinearityError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tmc_driver::AxisHardware;
use tmc_protocol::AxisId;
use tmc_tools::{LinearityConfig, ResolvedAxis};
use tracing::{debug, error, info};

/// 共享的单轴句柄
pub type SharedAxis<H> = Arc<Mutex<LinearityAxis<H>>>;

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Wave(WaveOutcome),
    Step(StepOutcome),
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Wave(outcome) => fmt::Display::fmt(outcome, f),
            CommandOutcome::Step(outcome) => fmt::Display::fmt(outcome, f),
        }
    }
}

/// 多轴线性度控制器
pub struct LinearityController<H> {
    axes: BTreeMap<AxisId, SharedAxis<H>>,
}

impl<H: AxisHardware> Default for LinearityController<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: AxisHardware> LinearityController<H> {
    pub fn new() -> Self {
        Self {
            axes: BTreeMap::new(),
        }
    }

    /// 按配置创建所有轴
    ///
    /// `make_hardware` 为每个校验后的轴提供硬件句柄。
    pub fn from_config<F>(config: &LinearityConfig, mut make_hardware: F) -> Result<Self, LinearityError>
    where
        F: FnMut(&ResolvedAxis) -> H,
    {
        let mut controller = Self::new();
        for resolved in config.resolved_axes()? {
            let hardware = make_hardware(&resolved);
            controller.add_axis(LinearityAxis::from_config(
                &resolved,
                &config.positioning,
                hardware,
            ))?;
        }
        Ok(controller)
    }

    /// 注册一个轴
    pub fn add_axis(&mut self, axis: LinearityAxis<H>) -> Result<(), LinearityError> {
        let id = axis.axis().clone();
        if self.axes.contains_key(&id) {
            return Err(LinearityError::DuplicateAxis(id));
        }
        debug!(axis = %id, factor = %axis.factor(), "Registered axis");
        self.axes.insert(id, Arc::new(Mutex::new(axis)));
        Ok(())
    }

    pub fn axis(&self, id: &AxisId) -> Option<SharedAxis<H>> {
        self.axes.get(id).cloned()
    }

    pub fn axis_ids(&self) -> impl Iterator<Item = &AxisId> {
        self.axes.keys()
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// 按各轴当前因子写入波表（启动时调用）
    ///
    /// 单个轴失败不影响其他轴，返回第一个错误。
    pub fn apply_all(&self) -> Result<(), LinearityError> {
        let mut first_error = None;
        for (id, axis) in &self.axes {
            let mut axis = axis.lock();
            match axis.apply() {
                Ok(pair) => info!(axis = %id, factor = %pair.factor, "Linearity correction initialized"),
                Err(e) => {
                    error!(axis = %id, "Failed to apply linearity correction: {}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                },
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// 执行已解析的命令
    pub fn dispatch(&self, command: &LinearityCommand) -> Result<CommandOutcome, LinearityError> {
        let shared = self
            .axes
            .get(command.axis())
            .ok_or_else(|| LinearityError::UnknownAxis(command.axis().clone()))?;

        // 持锁直到命令完成：同一轴上的定位不会交错
        let mut axis = shared.lock();
        match command {
            LinearityCommand::SetWave { offset, .. } => axis.set_wave(*offset).map(CommandOutcome::Wave),
            LinearityCommand::SetStep { target, mode, .. } => {
                axis.set_step(*target, *mode).map(CommandOutcome::Step)
            },
        }
    }

    /// 解析并执行一行命令，返回响应文本
    pub fn execute(&self, line: &str) -> Result<String, LinearityError> {
        let command = LinearityCommand::parse(line)?;
        debug!(command = %command, "Executing");

        match self.dispatch(&command) {
            Ok(outcome) => Ok(outcome.to_string()),
            Err(e) => {
                error!(command = %command, "Command failed: {}", e);
                Err(e)
            },
        }
    }

    /// 所有已注册轴的命令目录
    pub fn catalogue(&self) -> Vec<CommandSpec> {
        self.axes.keys().flat_map(command_catalogue).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmc_driver::{MockAxisHardware, PositionerConfig};
    use tmc_protocol::MicrostepResolution;

    fn controller(labels: &[&str]) -> LinearityController<MockAxisHardware> {
        let mut controller = LinearityController::new();
        for label in labels {
            controller
                .add_axis(LinearityAxis::new(
                    AxisId::new(label).unwrap(),
                    MockAxisHardware::new(MicrostepResolution::FULL),
                    PositionerConfig::default().without_delays(),
                ))
                .unwrap();
        }
        controller
    }

    #[test]
    fn test_execute_responses() {
        let controller = controller(&["X", "E"]);

        assert_eq!(
            controller.execute("TMC_SET_WAVE_X100").unwrap(),
            "TMC2130 linearity factor for X set to 1.100 (offset: 100)"
        );
        assert_eq!(
            controller.execute("TMC_SET_STEP_E1050").unwrap(),
            "TMC2130 E moved to microstep position 26 (requested: 1050, resolution: 256)"
        );

        let x = controller.axis(&AxisId::new("X").unwrap()).unwrap();
        assert_eq!(x.lock().factor().millis(), 1100);
    }

    #[test]
    fn test_unknown_axis() {
        let controller = controller(&["X"]);
        let err = controller.execute("TMC_SET_WAVE_Y100").unwrap_err();
        assert!(matches!(err, LinearityError::UnknownAxis(ref id) if id.as_str() == "Y"));
    }

    #[test]
    fn test_duplicate_axis() {
        let mut controller = controller(&["X"]);
        let err = controller
            .add_axis(LinearityAxis::new(
                AxisId::new("x").unwrap(),
                MockAxisHardware::new(MicrostepResolution::FULL),
                PositionerConfig::default(),
            ))
            .unwrap_err();
        assert!(matches!(err, LinearityError::DuplicateAxis(_)));
        assert_eq!(controller.len(), 1);
    }

    #[test]
    fn test_apply_all_continues_after_failure() {
        let controller = controller(&["X", "Y"]);
        controller
            .axis(&AxisId::new("X").unwrap())
            .unwrap()
            .lock()
            .hardware_mut()
            .set_write_failure(true);

        assert!(controller.apply_all().is_err());

        let y = controller.axis(&AxisId::new("Y").unwrap()).unwrap();
        assert!(y.lock().tables().is_some());
        let x = controller.axis(&AxisId::new("X").unwrap()).unwrap();
        assert!(x.lock().tables().is_none());
    }

    #[test]
    fn test_from_config() {
        let config = LinearityConfig::from_toml_str(
            r#"
[axes.stepper_x]
linearity_factor = 1.1

[axes.stepper_y]
microsteps = 16
"#,
        )
        .unwrap();

        let controller = LinearityController::from_config(&config, |resolved| {
            MockAxisHardware::new(resolved.resolution)
        })
        .unwrap();

        let ids: Vec<_> = controller.axis_ids().map(AxisId::as_str).collect();
        assert_eq!(ids, ["X", "Y"]);
        assert_eq!(controller.catalogue().len(), 2 * (21 + 526));

        let y = controller.axis(&AxisId::new("Y").unwrap()).unwrap();
        assert_eq!(y.lock().resolution().microsteps(), 16);
    }
}

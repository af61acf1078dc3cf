//! 协议常量定义

/// 波表峰值幅值（AN-026 推荐上限）
pub const AMPLITUDE: u8 = 248;

/// 波表起点值（MSLUTSTART.START_SIN）
pub const SIN0: u8 = 0;

/// 四分之一周期的波表长度
pub const WAVE_TABLE_LEN: usize = 256;

/// 相位切换点：`0..128` 为第一相，`128..256` 为第二相
pub const PHASE_SPLIT: usize = 128;

/// 校正因子下限（千分制，1.000 = 不校正）
pub const MIN_LINEARITY_FACTOR: u16 = 1000;

/// 校正因子上限（千分制，1.200）
pub const MAX_LINEARITY_FACTOR: u16 = 1200;

/// "set wave" 命令的偏移步长
pub const FACTOR_OFFSET_STEP: u16 = 10;

/// "set wave" 命令的最大偏移
pub const MAX_FACTOR_OFFSET: u16 = MAX_LINEARITY_FACTOR - MIN_LINEARITY_FACTOR;

/// 满分辨率（256 微步）下一个电周期的微步数
pub const FULL_CYCLE: u16 = 1024;

/// MSCNT 寄存器有效位（10 bit）
pub const MSCNT_MASK: u16 = 0x3FF;

/// "set step" 命令允许的最大原始目标值
///
/// 外部 G-code 生成器固定发出到 1050，超出周期的部分按掩码折回。
pub const MAX_STEP_COMMAND: u16 = 1050;

/// "set step" 命令的目标步长
pub const STEP_COMMAND_STEP: u16 = 2;

/// 定位校验失败后允许配置的最大重试次数
pub const MAX_RETRIES_LIMIT: u8 = 3;

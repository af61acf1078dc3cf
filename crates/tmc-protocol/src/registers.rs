//! TMC2130 寄存器地址

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 与线性度校正相关的寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    Mslut0 = 0x60,
    Mslut1 = 0x61,
    Mslut2 = 0x62,
    Mslut3 = 0x63,
    Mslut4 = 0x64,
    Mslut5 = 0x65,
    Mslut6 = 0x66,
    Mslut7 = 0x67,
    /// 段宽度 W0..W3 与段边界 X1..X3
    MslutSel = 0x68,
    /// START_SIN / START_SIN90
    MslutStart = 0x69,
    /// 微步计数器（只读，10 bit）
    Mscnt = 0x6A,
    /// 斩波配置（含 MRES 微步分辨率）
    Chopconf = 0x6C,
}

impl Register {
    /// MSLUT0..MSLUT7 按下标顺序
    pub const MSLUT: [Register; 8] = [
        Register::Mslut0,
        Register::Mslut1,
        Register::Mslut2,
        Register::Mslut3,
        Register::Mslut4,
        Register::Mslut5,
        Register::Mslut6,
        Register::Mslut7,
    ];

    /// 寄存器名称（与数据手册一致）
    pub fn name(self) -> &'static str {
        match self {
            Register::Mslut0 => "MSLUT0",
            Register::Mslut1 => "MSLUT1",
            Register::Mslut2 => "MSLUT2",
            Register::Mslut3 => "MSLUT3",
            Register::Mslut4 => "MSLUT4",
            Register::Mslut5 => "MSLUT5",
            Register::Mslut6 => "MSLUT6",
            Register::Mslut7 => "MSLUT7",
            Register::MslutSel => "MSLUTSEL",
            Register::MslutStart => "MSLUTSTART",
            Register::Mscnt => "MSCNT",
            Register::Chopconf => "CHOPCONF",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_addresses() {
        assert_eq!(u8::from(Register::Mslut0), 0x60);
        assert_eq!(u8::from(Register::Mslut7), 0x67);
        assert_eq!(u8::from(Register::MslutSel), 0x68);
        assert_eq!(u8::from(Register::MslutStart), 0x69);
        assert_eq!(u8::from(Register::Mscnt), 0x6A);
    }

    #[test]
    fn test_register_try_from() {
        assert_eq!(Register::try_from(0x6A).unwrap(), Register::Mscnt);
        assert!(Register::try_from(0x6B).is_err());

        for (i, reg) in Register::MSLUT.iter().enumerate() {
            assert_eq!(u8::from(*reg), 0x60 + i as u8);
        }
    }
}

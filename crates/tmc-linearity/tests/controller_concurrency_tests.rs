//! 多轴并发测试
//!
//! 不同轴在不同线程中并发执行；同一轴上的命令由轴锁串行化。

use std::sync::Arc;
use std::thread;
use tmc_driver::MockAxisHardware;
use tmc_linearity::prelude::*;

fn controller(labels: &[&str]) -> Arc<LinearityController<MockAxisHardware>> {
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
    Arc::new(controller)
}

#[test]
fn test_independent_axes_in_parallel() {
    let controller = controller(&["X", "Y", "Z", "E"]);

    let handles: Vec<_> = ["X", "Y", "Z", "E"]
        .into_iter()
        .enumerate()
        .map(|(n, label)| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let offset = 50 * n;
                controller
                    .execute(&format!("TMC_SET_WAVE_{}{}", label, offset))
                    .unwrap();
                for step in (0..=1050).step_by(50 + 2 * n) {
                    controller
                        .execute(&format!("TMC_SET_STEP_{}{}", label, step))
                        .unwrap();
                }
                controller
                    .execute(&format!("TMC_SET_STEP_{}{}", label, 2 * n))
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for (n, label) in ["X", "Y", "Z", "E"].into_iter().enumerate() {
        let axis = controller.axis(&AxisId::new(label).unwrap()).unwrap();
        let axis = axis.lock();
        assert_eq!(axis.factor().offset(), 50 * n as u16);
        assert_eq!(axis.hardware().position().value(), 2 * n as u16);
    }
}

#[test]
fn test_same_axis_commands_do_not_interleave() {
    let controller = controller(&["X"]);

    let handles: Vec<_> = [100i64, 700]
        .into_iter()
        .map(|target| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for _ in 0..20 {
                    // 每条命令都在持锁期间完成读取、脉冲和校验
                    let response = controller
                        .execute(&format!("TMC_SET_STEP_X{}", target))
                        .unwrap();
                    assert!(response.contains(&format!("position {}", target)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let axis = controller.axis(&AxisId::new("X").unwrap()).unwrap();
    let position = axis.lock().hardware().position().value();
    assert!(position == 100 || position == 700);
}

//! modes 命令
//!
//! 列出所有控制模式及其原始值，并标出已实现控制律的模式。

use biped_fsm::{ControlMode, StateName};

pub fn execute() {
    println!("{:<20} {:>5}  {}", "MODE", "VALUE", "STATE");
    for mode in ControlMode::ALL {
        let state = StateName::ALL
            .into_iter()
            .find(|state| state.mode() == mode)
            .map(|state| state.as_str())
            .unwrap_or("-");
        println!("{:<20} {:>5}  {}", mode.name(), mode.as_raw(), state);
    }
}

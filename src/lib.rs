pub const REGISTERS_W1: [&str; 4] = ["AX", "BX", "CX", "DX"];
pub const REGISTERS_W0_HIGH: [&str; 4] = ["AH", "BH", "CH", "DH"];
pub const REGISTERS_W0_LOW: [&str; 4] = ["AL", "BL", "CL", "DL"];

pub mod error;
pub mod instruction;
pub mod processor;
pub mod register;
pub mod session;

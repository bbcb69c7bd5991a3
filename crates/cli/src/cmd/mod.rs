mod export;
mod generate;
mod push;

pub use export::cmd_export;
pub use generate::{GenerateArgs, cmd_generate};
pub use push::cmd_push;

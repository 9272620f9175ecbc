use clap::Parser;

use crate::common::Result;

/// Print the factory bytecode
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Print the creation code instead of the runtime code
    #[arg(long = "init")]
    pub init: bool,
}

impl Cmd {
    /// Execute the factory-code command
    pub fn run(&self) -> Result<()> {
        let code =
            if self.init { create3::factory_init_code() } else { create3::factory_runtime_code() };
        println!("{code}");
        Ok(())
    }
}

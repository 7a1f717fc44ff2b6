pub mod board;
pub mod detect;
pub mod serve;

use anyhow::Result;

pub(crate) fn print_json<T: serde::Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

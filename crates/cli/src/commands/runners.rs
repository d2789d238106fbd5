use anyhow::Result;
use envrunner_core::runners::registry;

pub fn runners_command(json: bool) -> Result<()> {
    let names = registry::global().list_registered();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

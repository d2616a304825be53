use esmdev_core::version::version_string;
use miette::Result;

pub fn run(json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "name": "esmdev",
            "version": esmdev_core::VERSION,
        });
        println!("{value}");
    } else {
        println!("{}", version_string());
    }
    Ok(())
}

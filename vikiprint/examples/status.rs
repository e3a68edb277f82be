//! Link check and status query example

use tracing_subscriber::EnvFilter;
use vikiprint::{Device, Event};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let port = std::env::var("VIKI_PORT").unwrap_or_else(|_| "/dev/ttyACM0".to_string());

    let mut device = Device::new(port, 57600);
    let mut events = device.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Event::Unsolicited(response) = event {
                println!("Unsolicited: {}", response);
            }
        }
    });

    device.open().await?;

    device.check_link().await?;
    println!("Link OK");

    let status = device.status_flags().await?;
    println!("Status: {}", status);

    if !status.fatal.is_empty() {
        println!("Fatal errors: {:?}", status.fatal);
        println!("Error info: {:?}", device.error_info().await?);
    }

    device.close().await?;

    Ok(())
}

//! Single-item sale example

use tracing_subscriber::EnvFilter;
use vikiprint::{Amount, Device, DocumentType, PaymentKind, SaleItem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let port = std::env::var("VIKI_PORT").unwrap_or_else(|_| "/dev/ttyACM0".to_string());
    let cashier = std::env::var("VIKI_CASHIER").unwrap_or_else(|_| "Кассир".to_string());

    let mut device = Device::new(port, 57600).with_cashier(cashier);
    device.open().await?;

    let status = device.status_flags().await?;
    if status.document.is_open() {
        println!("Annulating unfinished document ({})", status);
        device.annulate_document().await?;
    }

    let price: Amount = "10.00".parse()?;
    let quantity: Amount = "1".parse()?;

    device.open_document(DocumentType::Income).await?;

    let result = device
        .add_item(&SaleItem::new("Чай черный", "A1", quantity, price))
        .await?;
    if let Some(tax) = result.tax {
        println!("Tax: {}", tax);
    }

    device.add_payment(PaymentKind::Cash, price).await?;

    let receipt = device.close_document().await?;
    println!("Receipt: {}", receipt);

    device.close().await?;

    Ok(())
}

//! Typed register commands
//!
//! Thin wrappers over [`Device::send_and_await`] and [`Device::send`] that
//! build the FS-separated payload each command expects and unpack the
//! reply. A reply carrying a device error code becomes [`Error::Device`].

use bytes::Bytes;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use vikiprint_core::{Command, PayloadBuilder, Response};
use vikiprint_types::{
    AddItemResult, Amount, ClosedDocument, DocumentType, ErrorInfo, PaymentKind, SaleItem,
    StatusReport,
};

use crate::device::Device;
use crate::error::{Error, Result};

/// Cut flag for close document: do not cut
const NO_CUT: &str = "5";

/// Tax rate slot used for every item (0%)
const TAX_RATE: &str = "3";

impl Device {
    /// Query fatal status, current flags and document state (0x00)
    pub async fn status_flags(&self) -> Result<StatusReport> {
        match self.call(Command::StatusFlags, Bytes::new()).await? {
            Response::StatusFlags(report) => Ok(report),
            other => Err(unexpected(Command::StatusFlags, &other)),
        }
    }

    /// Query the extended code of the last error (0x06)
    pub async fn error_info(&self) -> Result<ErrorInfo> {
        let payload = PayloadBuilder::new().text("1").build();
        match self.call(Command::ErrorInfo, payload).await? {
            Response::ErrorInfo(info) => Ok(info),
            other => Err(unexpected(Command::ErrorInfo, &other)),
        }
    }

    /// Start work with the given clock (0x10)
    pub async fn start_work(&self, at: NaiveDateTime) -> Result<()> {
        info!("Starting work at {}", at);
        let payload = PayloadBuilder::new()
            .field(at.format("%d%m%y").to_string())
            .field(at.format("%H%M%S").to_string())
            .build();
        self.send(Command::StartWork, payload).await
    }

    /// Start work with the local clock
    pub async fn start_work_now(&self) -> Result<()> {
        self.start_work(Local::now().naive_local()).await
    }

    /// Open a shift (0x23)
    pub async fn open_shift(&self) -> Result<()> {
        info!("Opening shift for {:?}", self.config().cashier);
        self.send(Command::OpenShift, self.cashier_payload().build()).await
    }

    /// Print the Z report and close the shift (0x21)
    pub async fn close_shift(&self) -> Result<()> {
        info!("Closing shift");
        let payload = self.cashier_payload().field("0").build();
        self.send(Command::CloseShift, payload).await
    }

    /// Print the X report (0x20)
    pub async fn x_report(&self) -> Result<()> {
        self.send(Command::XReport, self.cashier_payload().build()).await
    }

    /// Open a document of the given type in department 1 (0x30)
    pub async fn open_document(&self, kind: DocumentType) -> Result<Response> {
        debug!("Opening document {:?}", kind);
        let payload = PayloadBuilder::new()
            .field(kind.code().to_string())
            .field("1")
            .field(&self.config().cashier)
            .empty() // document number, assigned by the register
            .empty() // taxation system
            .build();
        self.call(Command::OpenDocument, payload).await
    }

    /// Add a sale item to the open document (0x42)
    pub async fn add_item(&self, item: &SaleItem) -> Result<AddItemResult> {
        item.validate()?;
        debug!("Adding item {:?} x {}", item.name, item.quantity);

        let discount_type = if item.discount.is_zero() { "0" } else { "2" };
        let payload = PayloadBuilder::new()
            .field(&item.name)
            .field(&item.article)
            .field(item.quantity.to_string())
            .field(item.price.to_string())
            .field(TAX_RATE)
            .empty() // position number
            .empty() // section
            .field(discount_type)
            .empty()
            .field(item.discount.to_string())
            .field(item.settlement.code().to_string())
            .field(item.kind.code().to_string())
            .field("000") // country of origin
            .empty() // customs declaration
            .field("0") // excise
            .build();

        match self.call(Command::AddItem, payload).await? {
            Response::AddItem(result) => Ok(result),
            other => Err(unexpected(Command::AddItem, &other)),
        }
    }

    /// Register a payment (0x47)
    pub async fn add_payment(&self, kind: PaymentKind, sum: Amount) -> Result<()> {
        debug!("Payment {:?} {}", kind, sum);
        let payload = PayloadBuilder::new()
            .field(kind.code().to_string())
            .field(sum.to_string())
            .empty()
            .build();
        self.send(Command::Payment, payload).await
    }

    /// Close the open document without cutting (0x31)
    pub async fn close_document(&self) -> Result<ClosedDocument> {
        let payload = PayloadBuilder::new()
            .field(NO_CUT)
            .empty() // buyer address
            .field("0")
            .empties(7)
            .build();

        match self.call(Command::CloseDocument, payload).await? {
            Response::CloseDocument(document) => {
                info!("Closed document {}", document.document_number);
                Ok(document)
            }
            other => Err(unexpected(Command::CloseDocument, &other)),
        }
    }

    /// Cancel the open document (0x32)
    pub async fn annulate_document(&self) -> Result<()> {
        info!("Annulating document");
        self.send(Command::AnnulateDocument, Bytes::new()).await
    }

    async fn call(&self, command: Command, payload: Bytes) -> Result<Response> {
        match self.send_and_await(command, payload).await? {
            Response::Error {
                error_code, data, ..
            } => Err(Error::Device {
                command,
                code: error_code,
                message: data,
            }),
            response => Ok(response),
        }
    }

    fn cashier_payload(&self) -> PayloadBuilder {
        PayloadBuilder::new().field(&self.config().cashier)
    }
}

fn unexpected(command: Command, response: &Response) -> Error {
    Error::InvalidResponse(format!("{command} answered with {response}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use vikiprint_core::Frame;
    use vikiprint_transport::MemoryTransport;
    use vikiprint_types::SettlementMethod;

    async fn open_device() -> (Device, DuplexStream) {
        let (transport, register) = MemoryTransport::pair(4096);
        let mut device = Device::with_transport(transport).with_cashier("Иванова");
        device.open().await.unwrap();
        (device, register)
    }

    async fn read_request(register: &mut DuplexStream) -> Frame {
        let mut buf = vec![0u8; 1024];
        let n = register.read(&mut buf).await.unwrap();
        Frame::decode_request(&buf[..n]).unwrap()
    }

    /// Payload fields as text, trailing separator dropped
    fn fields(frame: &Frame) -> Vec<String> {
        let text = frame.text();
        let mut fields: Vec<String> = text.split('\u{1c}').map(str::to_owned).collect();
        if fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        fields
    }

    async fn answer(register: &mut DuplexStream, command: u8, error_code: u8, data: &str) {
        let bytes = Frame::reply(command, error_code, data.as_bytes().to_vec()).encode_reply();
        register.write_all(&bytes).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_item_payload() {
        let (mut device, mut register) = open_device().await;
        let item = SaleItem::new(
            "ITEM",
            "A1",
            Amount::from_units(2).unwrap(),
            "10.5".parse().unwrap(),
        )
        .with_discount(Amount::from_units(1).unwrap())
        .with_settlement(SettlementMethod::FullPayment);

        let register_side = async {
            let request = read_request(&mut register).await;
            assert_eq!(request.command, 0x42);
            assert_eq!(
                fields(&request),
                vec![
                    "ITEM",
                    "A1",
                    "2.000000000",
                    "10.500000000",
                    "3",
                    "",
                    "",
                    "2",
                    "",
                    "1.000000000",
                    "4",
                    "1",
                    "000",
                    "",
                    "0",
                ]
            );
            answer(&mut register, 0x42, 0, "").await;
        };

        let (result, ()) = tokio::join!(device.add_item(&item), register_side);
        assert_eq!(result.unwrap(), AddItemResult { tax: None });

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_error_mapped() {
        let (mut device, mut register) = open_device().await;

        let register_side = async {
            read_request(&mut register).await;
            answer(&mut register, 0x00, 0x01, "").await;
        };

        let (result, ()) = tokio::join!(device.status_flags(), register_side);
        match result {
            Err(Error::Device { command, code, .. }) => {
                assert_eq!(command, Command::StatusFlags);
                assert_eq!(code, 0x01);
            }
            other => panic!("unexpected {other:?}"),
        }

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_open_document_detection() {
        let (mut device, mut register) = open_device().await;

        for (data, open) in [("0\u{1c}0\u{1c}2\u{1c}", false), ("0\u{1c}4\u{1c}18\u{1c}", true)] {
            let register_side = async {
                read_request(&mut register).await;
                answer(&mut register, 0x00, 0, data).await;
            };

            let (report, ()) = tokio::join!(device.status_flags(), register_side);
            let report = report.unwrap();
            assert_eq!(report.document.kind, Some(DocumentType::Income));
            assert_eq!(report.document.is_open(), open);
        }

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_document() {
        let (mut device, mut register) = open_device().await;

        let register_side = async {
            let request = read_request(&mut register).await;
            assert_eq!(request.command, 0x31);
            assert_eq!(&request.payload[..], b"5\x1c\x1c0\x1c\x1c\x1c\x1c\x1c\x1c\x1c\x1c");
            let data = [
                "12", "3", "FD:1 FP:99", "1", "99", "2", "5", "010325", "101500", "",
            ]
            .join("\u{1c}");
            answer(&mut register, 0x31, 0, &data).await;
        };

        let (result, ()) = tokio::join!(device.close_document(), register_side);
        let document = result.unwrap();
        assert_eq!(document.document_number, 12);
        assert_eq!(document.shift_number, 2);

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_shift_uses_cashier() {
        let (mut device, mut register) = open_device().await;

        device.open_shift().await.unwrap();

        let request = read_request(&mut register).await;
        assert_eq!(request.command, 0x23);
        assert_eq!(fields(&request), vec!["Иванова"]);

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_work_clock_format() {
        let (mut device, mut register) = open_device().await;
        let at = NaiveDateTime::parse_from_str("2024-03-15 09:05:07", "%Y-%m-%d %H:%M:%S").unwrap();

        device.start_work(at).await.unwrap();

        let request = read_request(&mut register).await;
        assert_eq!(request.command, 0x10);
        assert_eq!(fields(&request), vec!["150324", "090507"]);

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_payment_payload() {
        let (mut device, mut register) = open_device().await;

        device
            .add_payment(PaymentKind::Electronic, "20".parse().unwrap())
            .await
            .unwrap();

        let request = read_request(&mut register).await;
        assert_eq!(request.command, 0x47);
        assert_eq!(fields(&request), vec!["1", "20.000000000", ""]);

        device.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_item_rejected_before_sending() {
        let (mut device, _register) = open_device().await;
        let item = SaleItem::new("", "A1", Amount::ZERO, Amount::ZERO);

        assert!(matches!(device.add_item(&item).await, Err(Error::Types(_))));

        device.close().await.unwrap();
    }
}

//! Decoding replies into typed responses

use std::fmt;

use tracing::trace;
use vikiprint_types::{
    AddItemResult, ClosedDocument, DocumentStatus, ErrorInfo, FatalFlags, StatusFlags,
    StatusReport,
};

use crate::{
    command::Command,
    error::{Error, Result},
    fields::Fields,
    frame::Frame,
};

/// A decoded reply
///
/// Exactly one variant is produced per frame. A non-zero error code always
/// yields [`Response::Error`], whatever the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The register rejected the command
    Error {
        command: u8,
        data: String,
        error_code: u8,
    },

    /// Reply to [`Command::StatusFlags`]
    StatusFlags(StatusReport),

    /// Reply to [`Command::ErrorInfo`]
    ErrorInfo(ErrorInfo),

    /// Reply to [`Command::AddItem`]
    AddItem(AddItemResult),

    /// Reply to [`Command::CloseDocument`]
    CloseDocument(ClosedDocument),

    /// Any other command; payload left as text
    Unknown { command: u8, data: String },
}

impl Response {
    /// Decode a frame into a response
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPayload`] when a recognized reply does not
    /// have the fields its command defines. Unrecognized commands never fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use vikiprint_core::{Frame, Response};
    ///
    /// let frame = Frame::reply(0x00, 0, &b"0\x1c0\x1c2\x1c"[..]);
    /// let response = Response::decode(&frame).unwrap();
    ///
    /// match response {
    ///     Response::StatusFlags(report) => assert!(!report.has_fatal_errors()),
    ///     other => panic!("unexpected {other:?}"),
    /// }
    /// ```
    pub fn decode(frame: &Frame) -> Result<Self> {
        let data = frame.text();

        if frame.is_error() {
            return Ok(Self::Error {
                command: frame.command,
                data,
                error_code: frame.error_code,
            });
        }

        let response = match frame.command() {
            Ok(command @ Command::StatusFlags) => Self::StatusFlags(decode_status(command, &data)?),
            Ok(command @ Command::ErrorInfo) => Self::ErrorInfo(decode_error_info(command, &data)?),
            Ok(command @ Command::AddItem) => Self::AddItem(decode_add_item(command, &data)?),
            Ok(command @ Command::CloseDocument) => {
                Self::CloseDocument(decode_close_document(command, &data)?)
            }
            _ => Self::Unknown {
                command: frame.command,
                data,
            },
        };

        trace!("Decoded response: {}", response);

        Ok(response)
    }

    /// Raw command code the reply belongs to
    pub fn command_code(&self) -> u8 {
        match self {
            Self::Error { command, .. } | Self::Unknown { command, .. } => *command,
            Self::StatusFlags(_) => Command::StatusFlags.into(),
            Self::ErrorInfo(_) => Command::ErrorInfo.into(),
            Self::AddItem(_) => Command::AddItem.into(),
            Self::CloseDocument(_) => Command::CloseDocument.into(),
        }
    }

    pub fn command(&self) -> Option<Command> {
        Command::try_from(self.command_code()).ok()
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Error code reported by the register, if any
    pub fn error_code(&self) -> Option<u8> {
        match self {
            Self::Error { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }
}

fn decode_status(command: Command, data: &str) -> Result<StatusReport> {
    let mut fields = Fields::new(command, data);

    let fatal = fields.uint::<u32>("fatal status")?;
    let flags = fields.uint::<u32>("current flags")?;
    let document = fields.uint::<u32>("document status")?;

    let document = DocumentStatus::from_raw(document)
        .map_err(|e| Error::malformed(command, e.to_string()))?;

    Ok(StatusReport {
        fatal: FatalFlags::from_bits_retain(fatal),
        flags: StatusFlags::from_bits_retain(flags),
        document,
    })
}

fn decode_error_info(command: Command, data: &str) -> Result<ErrorInfo> {
    let mut fields = Fields::new(command, data);

    let request = fields.uint::<u32>("request number")?;
    let info = match request {
        1 => ErrorInfo::Extended {
            code: fields.uint("extended error code")?,
            text: fields.string("error text")?,
        },
        2 => ErrorInfo::FnLocks {
            mask: fields.uint("lock mask")?,
        },
        _ => ErrorInfo::Other {
            request,
            fields: fields.rest(),
        },
    };

    Ok(info)
}

fn decode_add_item(command: Command, data: &str) -> Result<AddItemResult> {
    let mut fields = Fields::new(command, data);

    if fields.is_empty() {
        return Ok(AddItemResult { tax: None });
    }

    Ok(AddItemResult {
        tax: Some(fields.amount("tax amount")?),
    })
}

fn decode_close_document(command: Command, data: &str) -> Result<ClosedDocument> {
    let mut fields = Fields::new(command, data);

    Ok(ClosedDocument {
        document_number: fields.uint("document number")?,
        operational_counter: fields.string("operational counter")?,
        fd_fp: fields.string("FD/FP line")?,
        fiscal_document_number: fields.uint("fiscal document number")?,
        fiscal_sign: fields.uint("fiscal sign")?,
        shift_number: fields.uint("shift number")?,
        shift_document_number: fields.uint("document number in shift")?,
        issued_at: fields.date_time("document date", "document time")?,
    })
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error {
                command,
                data,
                error_code,
            } => write!(f, "Error[0x{command:02X}](code={error_code}, data={data:?})"),
            Self::StatusFlags(report) => write!(f, "{report}"),
            Self::ErrorInfo(info) => write!(f, "ErrorInfo[{info:?}]"),
            Self::AddItem(result) => match result.tax {
                Some(tax) => write!(f, "AddItem[tax={tax}]"),
                None => write!(f, "AddItem[]"),
            },
            Self::CloseDocument(document) => write!(f, "{document}"),
            Self::Unknown { command, data } => write!(f, "Unknown[0x{command:02X}]({data:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vikiprint_types::{Amount, DocumentState, DocumentType};

    fn reply(command: u8, error_code: u8, data: &str) -> Frame {
        Frame::reply(command, error_code, data.as_bytes().to_vec())
    }

    #[test]
    fn test_status_flags_closed_sale() {
        let response = Response::decode(&reply(0x00, 0, "0\u{1c}0\u{1c}2\u{1c}")).unwrap();

        let Response::StatusFlags(report) = response else {
            panic!("expected status flags, got {response:?}");
        };
        assert!(report.fatal.is_empty());
        assert!(report.flags.is_empty());
        assert_eq!(report.document.kind, Some(DocumentType::Income));
        assert_eq!(report.document.state, DocumentState::Closed);
    }

    #[test]
    fn test_status_flags_bits() {
        let response = Response::decode(&reply(0x00, 0, "4\u{1c}12\u{1c}18\u{1c}")).unwrap();

        let Response::StatusFlags(report) = response else {
            panic!("expected status flags");
        };
        assert_eq!(report.fatal, FatalFlags::FN_UNREACHABLE);
        assert_eq!(report.flags, StatusFlags::SHIFT_OPEN | StatusFlags::SHIFT_OVER_24H);
        assert_eq!(report.document.state, DocumentState::Opened);
    }

    #[test]
    fn test_status_flags_malformed() {
        let err = Response::decode(&reply(0x00, 0, "0\u{1c}abc\u{1c}2")).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPayload { command: Command::StatusFlags, .. }
        ));

        let err = Response::decode(&reply(0x00, 0, "0\u{1c}0")).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn test_device_error_passthrough() {
        for command in [0x00, 0x31, 0x42, 0x99] {
            let response = Response::decode(&reply(command, 0x01, "bad")).unwrap();
            assert_eq!(
                response,
                Response::Error {
                    command,
                    data: "bad".into(),
                    error_code: 0x01,
                }
            );
            assert_eq!(response.error_code(), Some(0x01));
            assert_eq!(response.command_code(), command);
        }
    }

    #[test]
    fn test_error_info_extended() {
        let response = Response::decode(&reply(0x06, 0, "1\u{1c}23\u{1c}Paper out\u{1c}")).unwrap();
        assert_eq!(
            response,
            Response::ErrorInfo(ErrorInfo::Extended {
                code: 23,
                text: "Paper out".into(),
            })
        );
    }

    #[test]
    fn test_error_info_locks_and_other() {
        let response = Response::decode(&reply(0x06, 0, "2\u{1c}5\u{1c}")).unwrap();
        assert_eq!(response, Response::ErrorInfo(ErrorInfo::FnLocks { mask: 5 }));

        let response = Response::decode(&reply(0x06, 0, "7\u{1c}x\u{1c}")).unwrap();
        assert_eq!(
            response,
            Response::ErrorInfo(ErrorInfo::Other {
                request: 7,
                fields: vec!["x".into()],
            })
        );
    }

    #[test]
    fn test_add_item() {
        let response = Response::decode(&reply(0x42, 0, "1.5\u{1c}")).unwrap();
        assert_eq!(
            response,
            Response::AddItem(AddItemResult {
                tax: Some("1.5".parse::<Amount>().unwrap()),
            })
        );

        let response = Response::decode(&reply(0x42, 0, "")).unwrap();
        assert_eq!(response, Response::AddItem(AddItemResult { tax: None }));

        assert!(Response::decode(&reply(0x42, 0, "n/a\u{1c}")).is_err());
    }

    #[test]
    fn test_close_document() {
        let data = [
            "120", "55", "FD:7 FP:123", "7", "3054678912", "4", "17", "150324", "134501", "",
        ]
        .join("\u{1c}");
        let response = Response::decode(&reply(0x31, 0, &data)).unwrap();

        let Response::CloseDocument(document) = response else {
            panic!("expected closed document");
        };
        assert_eq!(document.document_number, 120);
        assert_eq!(document.operational_counter, "55");
        assert_eq!(document.fd_fp, "FD:7 FP:123");
        assert_eq!(document.fiscal_document_number, 7);
        assert_eq!(document.fiscal_sign, 3_054_678_912);
        assert_eq!(document.shift_number, 4);
        assert_eq!(document.shift_document_number, 17);
        assert_eq!(document.issued_at.to_string(), "2024-03-15 13:45:01");
    }

    #[test]
    fn test_close_document_truncated() {
        let err = Response::decode(&reply(0x31, 0, "120\u{1c}55\u{1c}")).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPayload { command: Command::CloseDocument, .. }
        ));
    }

    #[test]
    fn test_unknown_command_fallback() {
        let response = Response::decode(&reply(0x30, 0, "anything\u{1c}")).unwrap();
        assert_eq!(
            response,
            Response::Unknown {
                command: 0x30,
                data: "anything\u{1c}".into(),
            }
        );

        let response = Response::decode(&reply(0xEE, 0, "")).unwrap();
        assert_eq!(response.command(), None);
        assert!(!response.is_error());
    }
}

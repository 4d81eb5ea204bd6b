//! Tracer Common Library
//!
//! スキャン分類・チェックイン状態・QR生成リストなど、I/Oを持たないロジック

pub mod types;
pub mod error;
pub mod codec;
pub mod classifier;
pub mod checkin;
pub mod qr_list;

pub use error::{Error, InputError, Result};
pub use codec::{decode_student, encode_student};
pub use classifier::{classify, Classification, ScanEvent};
pub use checkin::{CheckIn, PendingCheckIn};
pub use qr_list::{range_labels, EncodingMode, QrItem, QrList, MAX_RANGE_ITEMS};
pub use types::{
    ErrorBody, LinkRequest, LinkResponse, LogEntry, LogsResponse, MessageResponse,
    RentalRemoveRequest, RentalStatus, RentalsAddRequest, StatusResponse, WriteRequest,
    parse_rental_names,
};

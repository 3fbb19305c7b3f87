mod operator;
mod request_seq;

pub use operator::Operator;
pub use request_seq::{REQUEST_SEQ_HEADER, RequestSeq};

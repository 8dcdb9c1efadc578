pub mod access_log;
pub mod request_id;

pub use access_log::AccessLogMiddleware;
pub use request_id::{REQUEST_ID_HEADER, RequestIdMiddleware};

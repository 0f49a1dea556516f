pub mod proxy_headers;
pub mod request_id;

pub use proxy_headers::{proxy_headers_middleware, ClientIp, ForwardedScheme};
pub use request_id::{
    current_request_id, request_id_middleware, scope_request_id, RequestId, REQUEST_ID_HEADER,
};

pub mod cache;
pub mod config;
pub mod exception;
pub mod extract;
pub mod html;
pub mod model;
pub mod net;
pub mod param;
pub mod portal;
pub mod request;
pub mod response;
pub mod router;
pub mod service;
pub mod util;

pub use cache::ResultCache;
pub use exception::Exception;
pub use param::{CacheKind, HttpEncoding, HttpRequestMethod, HttpVersion, InstitutionVariant};
pub use portal::{Credential, PortalClient};
pub use request::Request;
pub use response::Response;
pub use service::AttendanceService;

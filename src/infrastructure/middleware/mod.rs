// ViewerContext Middleware - separates authentication from business logic

pub mod request_extractors;
pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use request_extractors::{ApiJson, ApiPath, ApiQuery};
pub use viewer_context_extractor::Vc;
pub use viewer_context_middleware::{viewer_context_middleware, HasTokenIssuer};

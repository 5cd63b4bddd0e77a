use hyper::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

#[derive(Clone)]
pub struct InstanceRequestSpan {
    env: String,
}

impl InstanceRequestSpan {
    pub fn new(env: &str) -> Self {
        Self {
            env: env.to_string(),
        }
    }
}

impl<B> MakeSpan<B> for InstanceRequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            env = %self.env,
            method = %request.method(),
            path = %request.uri().path(),
        )
    }
}

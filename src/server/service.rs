use super::request::parse_request;
use crate::dispatcher::Dispatcher;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;

/// `may_minihttp` service that hands every request to a [`Dispatcher`].
///
/// Cloned once per connection; clones share the dispatcher.
#[derive(Debug, Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req)?;
        parsed.with_incoming(|incoming| self.dispatcher.serve(incoming, res));
        Ok(())
    }
}

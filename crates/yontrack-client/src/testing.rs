//! Scripted transport for unit tests.

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::transport::{Request, Response, Transport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use yontrack_config::Config;

pub(crate) type Recorded = Rc<RefCell<Vec<Request>>>;

#[derive(Default)]
pub(crate) struct FakeTransport {
    replies: RefCell<VecDeque<Result<Response>>>,
    requests: Recorded,
}

impl FakeTransport {
    pub(crate) fn respond(self, status: u16, body: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(Response {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub(crate) fn refuse(self) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Err(ClientError::Connection("connection refused".into())));
        self
    }

    pub(crate) fn requests(&self) -> Recorded {
        Rc::clone(&self.requests)
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        self.requests.borrow_mut().push(request.clone());
        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Ok(Response {
                status: 200,
                body: r#"{"data":{}}"#.to_string(),
            })
        })
    }
}

pub(crate) fn test_config() -> Config {
    Config::new("test", "http://ontrack.test/").with_token("token")
}

/// A client answering with `body`, plus the requests it sends.
pub(crate) fn client_replying(body: &str) -> (Client, Recorded) {
    let fake = FakeTransport::default().respond(200, body);
    let requests = fake.requests();
    (Client::with_transport(test_config(), fake), requests)
}

pub(crate) fn last_body(requests: &Recorded) -> serde_json::Value {
    requests
        .borrow()
        .last()
        .map(|r| r.body.clone())
        .unwrap_or_default()
}

pub(crate) fn last_query(requests: &Recorded) -> String {
    last_body(requests)["query"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

use crate::error::{ClientError, ErrorList, GraphError, Result, check_data_errors};
use crate::transport::{Auth, HttpTransport, Request, Response, Transport};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use yontrack_config::Config;

/// Client bound to one server configuration.
pub struct Client {
    config: Config,
    transport: Box<dyn Transport>,
}

/// Bare error document returned instead of a GraphQL response.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphResponse<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Option<Vec<GraphError>>,
}

/// The `errors` field shared by every mutation payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub errors: Option<Vec<GraphError>>,
}

impl Payload {
    pub fn check(&self) -> Result<()> {
        check_data_errors(self.errors.as_deref().unwrap_or_default())
    }
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }

    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.config.url.trim_end_matches('/'))
    }

    /// Runs a query and decodes its `data` into `D`.
    ///
    /// A disabled configuration returns `D::default()` without any network
    /// activity.
    pub fn call<D>(&self, query: &str, variables: Value) -> Result<D>
    where
        D: DeserializeOwned + Default,
    {
        if self.config.disabled {
            debug!(config = %self.config.name, "configuration disabled, skipping call");
            return Ok(D::default());
        }

        let request = Request {
            url: self.graphql_url(),
            auth: Auth::from_config(&self.config),
            body: json!({ "query": query, "variables": variables }),
        };
        debug!(url = %request.url, query, variables = %request.body["variables"], "GraphQL request");

        let response = self.send(&request)?;
        debug!(status = response.status, body = %response.body, "GraphQL response");
        parse_response(&response)
    }

    /// Runs a mutation and checks the payload errors of each node in `nodes`.
    pub fn mutate(&self, query: &str, variables: Value, nodes: &[&str]) -> Result<()> {
        let data: HashMap<String, Option<Payload>> = self.call(query, variables)?;
        for node in nodes {
            if let Some(Some(payload)) = data.get(*node) {
                payload.check()?;
            }
        }
        Ok(())
    }

    fn send(&self, request: &Request) -> Result<Response> {
        let retry = self.config.retry;
        let mut attempt = 0;
        loop {
            match self.transport.send(request) {
                Err(ClientError::Connection(message)) if attempt < retry.retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        retries = retry.retries,
                        wait = retry.wait,
                        %message,
                        "cannot reach server, retrying"
                    );
                    thread::sleep(Duration::from_secs(retry.wait));
                }
                other => return other,
            }
        }
    }
}

fn parse_response<D>(response: &Response) -> Result<D>
where
    D: DeserializeOwned + Default,
{
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&response.body)
        && envelope.status != 0
    {
        return Err(ClientError::Http {
            status: envelope.status,
            message: envelope.message,
        });
    }

    let graph: GraphResponse<D> = match serde_json::from_str(&response.body) {
        Ok(graph) => graph,
        Err(_) if !(200..300).contains(&response.status) => {
            return Err(ClientError::Http {
                status: i64::from(response.status),
                message: response.body.trim().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let errors = graph.errors.unwrap_or_default();
    if !errors.is_empty() {
        return Err(ClientError::GraphQL(ErrorList::from(errors.as_slice())));
    }
    Ok(graph.data.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, client_replying, last_body, test_config};
    use yontrack_config::ConnectionRetry;

    #[derive(Debug, Default, Deserialize)]
    struct Projects {
        projects: Vec<Name>,
    }

    #[derive(Debug, Default, Deserialize)]
    struct Name {
        name: String,
    }

    #[test]
    fn test_graphql_url_trims_slash() {
        let (client, _) = client_replying("{}");
        assert_eq!(client.graphql_url(), "http://ontrack.test/graphql");
    }

    #[test]
    fn test_call_decodes_data() {
        let (client, requests) =
            client_replying(r#"{"data":{"projects":[{"name":"a"},{"name":"b"}]}}"#);
        let data: Projects = client
            .call("{ projects { name } }", json!({"x": 1}))
            .unwrap();
        let names: Vec<_> = data.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);

        let recorded = requests.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].url, "http://ontrack.test/graphql");
        assert_eq!(recorded[0].auth, Auth::Token("token".into()));
        assert_eq!(recorded[0].body["variables"]["x"], 1);
        assert_eq!(recorded[0].body["query"], "{ projects { name } }");
    }

    #[test]
    fn test_call_aggregates_errors() {
        let (client, _) = client_replying(
            r#"{"data":null,"errors":[{"message":"first"},{"message":"second"}]}"#,
        );
        let err = client.call::<Projects>("{}", json!({})).unwrap_err();
        assert!(matches!(err, ClientError::GraphQL(_)));
        assert_eq!(err.to_string(), "1) first\n2) second\n");
    }

    #[test]
    fn test_call_http_error_envelope() {
        let (client, _) = client_replying(r#"{"status":401,"message":"Unauthorized"}"#);
        let err = client.call::<Projects>("{}", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 401 Unauthorized");
    }

    #[test]
    fn test_call_non_json_error_page() {
        let fake = FakeTransport::default().respond(502, "Bad Gateway\n");
        let client = Client::with_transport(test_config(), fake);
        let err = client.call::<Projects>("{}", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_call_disabled_skips_network() {
        let fake = FakeTransport::default().respond(500, "boom");
        let requests = fake.requests();
        let client = Client::with_transport(test_config().disabled(true), fake);
        let data: Projects = client.call("{ projects { name } }", json!({})).unwrap();
        assert!(data.projects.is_empty());
        assert!(requests.borrow().is_empty());
    }

    #[test]
    fn test_missing_data_is_default() {
        let (client, _) = client_replying("{}");
        let data: Projects = client.call("{}", json!({})).unwrap();
        assert!(data.projects.is_empty());
    }

    #[test]
    fn test_mutate_reports_payload_errors() {
        let (client, _) = client_replying(
            r#"{"data":{"createProjectOrGet":{"errors":[{"message":"Name is invalid"}]}}}"#,
        );
        let err = client
            .mutate("mutation", json!({}), &["createProjectOrGet"])
            .unwrap_err();
        assert!(matches!(err, ClientError::Payload(_)));
        assert_eq!(err.to_string(), "1) Name is invalid\n");
    }

    #[test]
    fn test_mutate_ignores_unchecked_nodes() {
        let (client, requests) = client_replying(
            r#"{"data":{"a":{"errors":[]},"b":{"errors":[{"message":"x"}]},"c":null}}"#,
        );
        client.mutate("mutation", json!({}), &["a", "c"]).unwrap();
        assert_eq!(last_body(&requests)["query"], "mutation");
    }

    #[test]
    fn test_retries_connection_errors() {
        let fake = FakeTransport::default()
            .refuse()
            .refuse()
            .respond(200, r#"{"data":{"projects":[]}}"#);
        let requests = fake.requests();
        let config = test_config().with_retry(ConnectionRetry {
            retries: 2,
            wait: 0,
        });
        let client = Client::with_transport(config, fake);
        client.call::<Projects>("{}", json!({})).unwrap();
        assert_eq!(requests.borrow().len(), 3);
    }

    #[test]
    fn test_gives_up_after_retries() {
        let fake = FakeTransport::default().refuse().refuse();
        let requests = fake.requests();
        let config = test_config().with_retry(ConnectionRetry {
            retries: 1,
            wait: 0,
        });
        let client = Client::with_transport(config, fake);
        let err = client.call::<Projects>("{}", json!({})).unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
        assert_eq!(requests.borrow().len(), 2);
    }

    #[test]
    fn test_graphql_errors_are_not_retried() {
        let fake = FakeTransport::default().respond(200, r#"{"errors":[{"message":"bad"}]}"#);
        let requests = fake.requests();
        let config = test_config().with_retry(ConnectionRetry {
            retries: 3,
            wait: 0,
        });
        let client = Client::with_transport(config, fake);
        assert!(client.call::<Projects>("{}", json!({})).is_err());
        assert_eq!(requests.borrow().len(), 1);
    }
}

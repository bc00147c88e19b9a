//! HTTP transport for `the-form`.
//!
//! Relative form actions resolve against a base URL the way a browser
//! resolves them against the document. `GET` submissions carry the payload in
//! the query string, every other method sends it as `multipart/form-data`.
//! The reply body is decoded as JSON whatever the HTTP status, since servers
//! answer validation failures with a `fail` body on a 4xx.

use futures_util::{
  FutureExt,
  future,
};
use reqwest::{
  Client,
  Method,
  RequestBuilder,
  multipart,
};
use the_form::{
  FormData,
  ServerReply,
  SubmitRequest,
  Transport,
  TransportError,
  TransportFuture,
};
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
  base:   Url,
}

impl HttpTransport {
  pub fn new(base: Url) -> Self {
    Self::with_client(Client::new(), base)
  }

  /// Sends through `client`, for callers sharing a configured client.
  pub fn with_client(client: Client, base: Url) -> Self {
    Self { client, base }
  }

  pub fn base(&self) -> &Url {
    &self.base
  }

  /// The absolute target of a form action. An empty action targets the base.
  pub fn resolve(&self, action: &str) -> Result<Url, TransportError> {
    self
      .base
      .join(action.trim())
      .map_err(|_| TransportError::InvalidAction(action.to_string()))
  }

  fn build(&self, request: SubmitRequest) -> Result<RequestBuilder, TransportError> {
    let mut url = self.resolve(&request.action)?;
    let method = Method::from_bytes(request.method.as_bytes()).map_err(request_error)?;

    let builder = if method == Method::GET {
      url
        .query_pairs_mut()
        .clear()
        .extend_pairs(request.data.iter());
      self.client.request(method, url)
    } else {
      self
        .client
        .request(method, url)
        .multipart(multipart_form(&request.data))
    };

    Ok(
      request
        .headers
        .iter()
        .fold(builder, |builder, (name, value)| {
          builder.header(name.as_str(), value.as_str())
        }),
    )
  }
}

fn multipart_form(data: &FormData) -> multipart::Form {
  data
    .iter()
    .fold(multipart::Form::new(), |form, (name, value)| {
      form.text(name.to_string(), value.to_string())
    })
}

fn request_error(err: impl std::error::Error + Send + Sync + 'static) -> TransportError {
  TransportError::Request(Box::new(err))
}

impl Transport for HttpTransport {
  fn name(&self) -> &'static str {
    "http"
  }

  fn send(&self, request: SubmitRequest) -> TransportFuture {
    let builder = match self.build(request) {
      Ok(builder) => builder,
      Err(err) => return future::ready(Err(err)).boxed_local(),
    };

    async move {
      let response = builder.send().await.map_err(request_error)?;
      let status = response.status();
      let url = response.url().clone();
      let body = response.bytes().await.map_err(request_error)?;
      log::debug!("{url} answered {status} with {} bytes", body.len());
      ServerReply::from_json(&body)
    }
    .boxed_local()
  }
}

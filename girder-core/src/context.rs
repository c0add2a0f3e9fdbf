// Per-request framework context

use crate::Error;
use crate::engine::standard::{Request, Response};
use http::{Extensions, StatusCode, header};
use serde::Serialize;
use smallvec::SmallVec;

/// Path parameters, inline for the common case of a few.
pub type Params = SmallVec<[(String, String); 4]>;

/// What a handler sees of the current request.
///
/// Borrows the pooled request and response for the duration of the call and
/// carries the matched route, its path parameters and typed values that
/// middleware pass down the chain.
pub struct Context<'a> {
    request: &'a Request,
    response: &'a Response,
    path: String,
    params: Params,
    extensions: Extensions,
}

impl<'a> Context<'a> {
    pub fn new(request: &'a Request, response: &'a Response) -> Self {
        Self {
            request,
            response,
            path: String::new(),
            params: Params::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn response(&self) -> &'a Response {
        self.response
    }

    /// The registered route pattern that matched, e.g. `/users/:id`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_route(&mut self, path: &str, params: Params) {
        self.path.clear();
        self.path.push_str(path);
        self.params = params;
    }

    /// Value of a path parameter. A trailing wildcard is available as `*`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.request.url().query_param(name)
    }

    pub fn form_value(&self, name: &str) -> Option<String> {
        self.request.form_value(name)
    }

    /// Store a value for handlers further down the chain.
    pub fn set<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Send a body with the given status and content type.
    pub fn blob(&self, status: StatusCode, content_type: &str, body: &[u8]) -> Result<(), Error> {
        self.response
            .header()
            .set(header::CONTENT_TYPE.as_str(), content_type)?;
        self.response.write_header(status);
        self.response.write(body)?;
        Ok(())
    }

    pub fn string(&self, status: StatusCode, body: &str) -> Result<(), Error> {
        self.blob(status, "text/plain; charset=utf-8", body.as_bytes())
    }

    pub fn html(&self, status: StatusCode, body: &str) -> Result<(), Error> {
        self.blob(status, "text/html; charset=utf-8", body.as_bytes())
    }

    pub fn json<T: Serialize + ?Sized>(&self, status: StatusCode, value: &T) -> Result<(), Error> {
        let body = serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        self.blob(status, "application/json", &body)
    }

    pub fn no_content(&self, status: StatusCode) -> Result<(), Error> {
        self.response.write_header(status);
        Ok(())
    }

    /// Redirect with a 3xx status.
    pub fn redirect(&self, status: StatusCode, location: &str) -> Result<(), Error> {
        if !status.is_redirection() {
            return Err(Error::BadRequest(format!(
                "invalid redirect status {}",
                status.as_u16()
            )));
        }
        self.response
            .header()
            .set(header::LOCATION.as_str(), location)?;
        self.response.write_header(status);
        Ok(())
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct User(&'static str);

    #[test]
    fn test_params_and_route() {
        let (req, res) = (Request::default(), Response::default());
        let mut c = Context::new(&req, &res);
        let mut params = Params::new();
        params.push(("id".into(), "42".into()));
        params.push(("*".into(), "rest/of/it".into()));
        c.set_route("/users/:id/*", params);

        assert_eq!(c.path(), "/users/:id/*");
        assert_eq!(c.param("id"), Some("42"));
        assert_eq!(c.param("*"), Some("rest/of/it"));
        assert_eq!(c.param("missing"), None);
        assert_eq!(c.params().len(), 2);
    }

    #[test]
    fn test_extensions() {
        let (req, res) = (Request::default(), Response::default());
        let mut c = Context::new(&req, &res);
        assert!(c.get::<User>().is_none());
        c.set(User("ada"));
        assert_eq!(c.get::<User>(), Some(&User("ada")));
    }

    #[test]
    fn test_unbound_response_write_fails() {
        let (req, res) = (Request::default(), Response::default());
        let c = Context::new(&req, &res);
        assert!(matches!(c.string(StatusCode::OK, "x"), Err(Error::Io(_))));
    }

    #[test]
    fn test_redirect_requires_3xx() {
        let (req, res) = (Request::default(), Response::default());
        let c = Context::new(&req, &res);
        assert!(matches!(
            c.redirect(StatusCode::OK, "/elsewhere"),
            Err(Error::BadRequest(_))
        ));
    }
}

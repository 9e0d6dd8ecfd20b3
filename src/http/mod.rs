mod cookies;
mod reqwest_transport;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use cookies::SessionCookies;
pub use reqwest_transport::ReqwestTransport;
pub use transport::{
    CookieScope, FormPart, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportError,
};

use actix_web::{http, web, HttpRequest, HttpResponse};
use anyhow::{Context, Result};
use log::*;

use crate::error::WebError;

/// Runs blocking store work off the async executor, the way every handler
/// talks to the pool.
pub(crate) async fn in_pool<R, F>(f: F) -> Result<R, WebError>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    trace!("in_pool from {:?}", ::std::thread::current().name());
    let res = web::block(f)
        .await
        .map_err(|e| anyhow::anyhow!("blocking task failed: {}", e))?;
    Ok(res?)
}

fn see_other(url: &str) -> HttpResponse {
    debug!("Redirecting to: {}", url);
    HttpResponse::SeeOther()
        .insert_header((http::header::LOCATION, url))
        .finish()
}

/// Redirects to a named route. The router builds the URL, so path
/// elements come out percent-encoded.
pub(crate) fn redirect_to<U, I>(
    req: &HttpRequest,
    name: &str,
    elements: U,
) -> Result<HttpResponse, WebError>
where
    U: IntoIterator<Item = I>,
    I: AsRef<str>,
{
    let url = req
        .url_for(name, elements)
        .with_context(|| format!("url for {}", name))?;
    Ok(see_other(url.as_str()))
}

pub(crate) fn redirect_home(req: &HttpRequest) -> Result<HttpResponse, WebError> {
    let url = req.url_for_static("index").context("url for index")?;
    Ok(see_other(url.as_str()))
}

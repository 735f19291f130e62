use std::fmt;

use actix_web::HttpResponse;
use anyhow::Context;
use lazy_static::lazy_static;
use log::*;
use serde::Serialize;
use tera::Tera;

use crate::error::WebError;

const TEXT_HTML: &str = "text/html; charset=utf-8";

macro_rules! static_template {
    ($fname: expr) => {
        ($fname, include_str!(concat!("../templates/", $fname)))
    };
}

lazy_static! {
    pub static ref TERA: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            static_template!("base.html"),
            static_template!("index.html"),
            static_template!("recipe/show.html"),
            static_template!("recipe/ingredient/list.html"),
            static_template!("recipe/ingredient/show.html"),
            static_template!("recipe/ingredient/form.html"),
        ])
        .expect("built-in templates");
        tera
    };
}

#[derive(Debug)]
pub struct WithTemplate<T> {
    name: &'static str,
    value: T,
}

impl<T> WithTemplate<T> {
    pub fn new(name: &'static str, value: T) -> Self {
        WithTemplate { name, value }
    }
}

pub fn render<T: Serialize + fmt::Debug>(template: WithTemplate<T>) -> Result<HttpResponse, WebError> {
    let context = tera::Context::from_serialize(&template.value)
        .with_context(|| format!("template context for {}", template.name))?;
    let res = TERA.render(template.name, &context);

    trace!("Render: {:?} => {:?}", template, res);
    match res {
        Ok(html) => Ok(HttpResponse::Ok().content_type(TEXT_HTML).body(html)),
        Err(e) => {
            error!("Could not render template {}: {:?}", template.name, e);
            Err(anyhow::Error::from(e)
                .context(format!("render {}", template.name))
                .into())
        }
    }
}

//! Request handlers following the pre-process / process / post-process contract

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;

/// Request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    params: HashMap<String, String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn module(&self) -> &str {
        self.get("module").unwrap_or_default()
    }
}

impl From<HashMap<String, String>> for Request {
    fn from(params: HashMap<String, String>) -> Self {
        Request { params }
    }
}

/// What a view produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Output {
    pub header: Option<String>,
    pub body: String,
    pub footer: Option<String>,
}

/// Index-view pre-processing: render the page header unless `display` is off
pub fn index_pre_process(req: &Request, out: &mut Output, display: bool) {
    if display {
        out.header = Some(req.module().to_string());
    }
}

/// Index-view post-processing: close the page
pub fn index_post_process(req: &Request, out: &mut Output) {
    out.footer = Some(req.module().to_string());
}

pub trait View {
    fn pre_process(&self, req: &Request, out: &mut Output, display: bool) -> Result<()> {
        index_pre_process(req, out, display);
        Ok(())
    }

    fn process(&self, req: &Request, out: &mut Output) -> Result<()>;

    fn post_process(&self, req: &Request, out: &mut Output) -> Result<()> {
        index_post_process(req, out);
        Ok(())
    }
}

/// Run all three phases
pub fn dispatch(view: &dyn View, req: &Request) -> Result<Output> {
    let mut out = Output::default();
    view.pre_process(req, &mut out, true)?;
    view.process(req, &mut out)?;
    view.post_process(req, &mut out)?;
    Ok(out)
}

/// A configuration check run on behalf of a view
pub trait ConfigCheck: Send + Sync {
    fn run(&self, req: &Request) -> Result<String>;
}

/// Mail configuration check page
///
/// Renders no header or footer; the body is whatever the check produces.
pub struct CheckConfigView<C> {
    check: C,
}

impl<C: ConfigCheck> CheckConfigView<C> {
    pub fn new(check: C) -> Self {
        CheckConfigView { check }
    }
}

impl<C: ConfigCheck> View for CheckConfigView<C> {
    fn pre_process(&self, req: &Request, out: &mut Output, _display: bool) -> Result<()> {
        index_pre_process(req, out, false);
        Ok(())
    }

    fn process(&self, req: &Request, out: &mut Output) -> Result<()> {
        out.body = self.check.run(req)?;
        Ok(())
    }

    fn post_process(&self, _req: &Request, _out: &mut Output) -> Result<()> {
        Ok(())
    }
}

/// Reports which required mail settings are set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailSettingsCheck {
    settings: Vec<(String, Option<String>)>,
}

impl MailSettingsCheck {
    pub fn new(settings: Vec<(String, Option<String>)>) -> Self {
        MailSettingsCheck { settings }
    }

    /// Read the named settings from the environment
    pub fn from_env(keys: &[&str]) -> Self {
        Self::new(
            keys.iter()
                .map(|k| (k.to_string(), std::env::var(k).ok().filter(|v| !v.is_empty())))
                .collect(),
        )
    }

    pub fn missing(&self) -> Vec<&str> {
        self.settings
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

impl ConfigCheck for MailSettingsCheck {
    fn run(&self, _req: &Request) -> Result<String> {
        let lines: Vec<String> = self
            .settings
            .iter()
            .map(|(k, v)| format!("{}: {}", k, if v.is_some() { "OK" } else { "missing" }))
            .collect();
        Ok(lines.join("\n"))
    }
}

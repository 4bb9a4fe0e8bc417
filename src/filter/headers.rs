//! Request header filters.

use axum::http::{HeaderName, HeaderValue};

use crate::filter::{Filter, FilterError, FilterOutcome};
use crate::http::GatewayRequest;

fn header_name(filter: &'static str, name: &str) -> Result<HeaderName, FilterError> {
    HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| FilterError::InvalidConfig {
        filter,
        reason: format!("{:?} is not a valid header name", name),
    })
}

fn header_value(filter: &'static str, value: &str) -> Result<HeaderValue, FilterError> {
    HeaderValue::from_str(value).map_err(|_| FilterError::InvalidConfig {
        filter,
        reason: format!("{:?} is not a valid header value", value),
    })
}

/// Appends a value, keeping any the client sent.
#[derive(Debug, Clone)]
pub struct AddRequestHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl AddRequestHeader {
    pub fn new(name: &str, value: &str) -> Result<Self, FilterError> {
        Ok(Self {
            name: header_name("add_request_header", name)?,
            value: header_value("add_request_header", value)?,
        })
    }
}

impl Filter for AddRequestHeader {
    fn name(&self) -> &'static str {
        "add_request_header"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        Ok(FilterOutcome::Continue(
            request
                .clone()
                .with_appended_header(self.name.clone(), self.value.clone()),
        ))
    }
}

/// Replaces all values of a header.
#[derive(Debug, Clone)]
pub struct SetRequestHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl SetRequestHeader {
    pub fn new(name: &str, value: &str) -> Result<Self, FilterError> {
        Ok(Self {
            name: header_name("set_request_header", name)?,
            value: header_value("set_request_header", value)?,
        })
    }
}

impl Filter for SetRequestHeader {
    fn name(&self) -> &'static str {
        "set_request_header"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        Ok(FilterOutcome::Continue(
            request.clone().with_header(self.name.clone(), self.value.clone()),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct RemoveRequestHeader {
    name: HeaderName,
}

impl RemoveRequestHeader {
    pub fn new(name: &str) -> Result<Self, FilterError> {
        Ok(Self {
            name: header_name("remove_request_header", name)?,
        })
    }
}

impl Filter for RemoveRequestHeader {
    fn name(&self) -> &'static str {
        "remove_request_header"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        Ok(FilterOutcome::Continue(request.clone().without_header(&self.name)))
    }
}

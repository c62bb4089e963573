use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encoding selected by the `responseType` request field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Raw JSON string for programmatic chaining (`"toAPI"`).
    Api,
    #[default]
    Http,
}

impl ResponseType {
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("toAPI") => ResponseType::Api,
            _ => ResponseType::Http,
        }
    }
}

/// `{"status": <int>, "data": <payload>}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub status: u16,
    pub data: Value,
}

impl ResponseBody {
    pub fn new(status: u16, data: impl Into<Value>) -> Self {
        Self {
            status,
            data: data.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "status": self.status, "data": self.data }).to_string()
    }

    pub fn encode(self, response_type: ResponseType) -> Response {
        let body = self.to_json();
        match response_type {
            ResponseType::Api => Response::Raw(body),
            ResponseType::Http => Response::Http(HttpResponse {
                status: self.status,
                content_type: JSON_CONTENT_TYPE.to_string(),
                body,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Raw(String),
    Http(HttpResponse),
}

impl Response {
    /// Serialized `{status, data}` document.
    pub fn body(&self) -> &str {
        match self {
            Response::Raw(body) => body,
            Response::Http(response) => &response.body,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            Response::Raw(_) => None,
            Response::Http(response) => Some(&response.content_type),
        }
    }

    /// Status recorded in the body.
    pub fn status(&self) -> u16 {
        match self {
            Response::Http(response) => response.status,
            Response::Raw(body) => serde_json::from_str::<ResponseBody>(body)
                .map(|parsed| parsed.status)
                .unwrap_or(500),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

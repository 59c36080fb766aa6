use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonResponse {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A wrapper for HTTP responses with convenient constructors for the few
/// shapes the webhook server answers with.
pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    pub fn ok() -> Self {
        Self::common(StatusCode::OK, None)
    }

    pub fn json<T: Serialize>(data: T) -> Self {
        Self {
            http_response: HttpResponse::Ok().json(data),
        }
    }

    pub fn bad_request(message: impl AsRef<str>) -> Self {
        let message = format!("Bad request: {}", message.as_ref());
        Self::common(StatusCode::BAD_REQUEST, Some(message))
    }

    pub fn not_found(message: impl AsRef<str>) -> Self {
        Self::common(StatusCode::NOT_FOUND, Some(message.as_ref().to_string()))
    }

    pub fn error(message: impl AsRef<str>) -> Self {
        let message = format!("Server error: {}", message.as_ref());
        Self::common(StatusCode::INTERNAL_SERVER_ERROR, Some(message))
    }

    fn common(code: StatusCode, message: Option<String>) -> Self {
        let body = CommonResponse {
            code: code.into(),
            message,
        };
        Self {
            http_response: HttpResponse::build(code).json(body),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(resp: Response) -> Self {
        resp.http_response
    }
}

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult, ValidationFieldError};

/// Result of checking a request body against its validation rules
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<T> {
    Ok(T),
    Invalid(Vec<ValidationFieldError>),
}

impl<T: Validate> ValidationOutcome<T> {
    pub fn check(value: T) -> Self {
        match value.validate() {
            Ok(()) => ValidationOutcome::Ok(value),
            Err(errors) => match AppError::from(errors) {
                AppError::ValidationErrors { errors } => ValidationOutcome::Invalid(errors),
                _ => ValidationOutcome::Invalid(Vec::new()),
            },
        }
    }
}

impl<T> ValidationOutcome<T> {
    pub fn into_result(self) -> AppResult<T> {
        match self {
            ValidationOutcome::Ok(value) => Ok(value),
            ValidationOutcome::Invalid(errors) => Err(AppError::ValidationErrors { errors }),
        }
    }
}

/// JSON body extractor that runs `validator` rules before the handler sees it
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest {
                message: rejection.body_text(),
            })?;
        ValidationOutcome::check(value).into_result().map(ValidatedJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate, PartialEq)]
    struct SignupBody {
        #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
        name: String,
        #[validate(email(message = "must be a valid email address"))]
        email: String,
        #[validate(length(min = 8, max = 72, message = "must be between 8 and 72 characters"))]
        password: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_outcome_ok_keeps_value() {
        let body = SignupBody {
            name: "alice".into(),
            email: "a@x.com".into(),
            password: "pw123456".into(),
        };
        assert!(matches!(ValidationOutcome::check(body), ValidationOutcome::Ok(_)));
    }

    #[test]
    fn test_outcome_invalid_lists_fields_sorted() {
        let body = SignupBody {
            name: String::new(),
            email: "nope".into(),
            password: "short".into(),
        };
        match ValidationOutcome::check(body) {
            ValidationOutcome::Invalid(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "name", "password"]);
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_json_body() {
        let request = json_request(r#"{"name":"alice","email":"a@x.com","password":"pw123456"}"#);
        let ValidatedJson(body) = ValidatedJson::<SignupBody>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.name, "alice");
    }

    #[tokio::test]
    async fn test_password_too_long() {
        let password = "x".repeat(73);
        let request = json_request(&format!(
            r#"{{"name":"alice","email":"a@x.com","password":"{}"}}"#,
            password
        ));
        match ValidatedJson::<SignupBody>::from_request(request, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "password");
                assert!(errors[0].message.contains("between 8 and 72"));
            }
            other => panic!("Expected ValidationErrors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request(r#"{"name":"alice","#);
        let result = ValidatedJson::<SignupBody>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/users")
            .body(Body::from(r#"{"name":"alice"}"#))
            .unwrap();
        let result = ValidatedJson::<SignupBody>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }
}

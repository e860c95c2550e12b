use std::fmt;

use actix_web::{
    HttpResponse, Responder, ResponseError, get,
    http::{StatusCode, header::ContentType},
    post, web,
};
use log::debug;
use machine_learning::MlErr;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::AppState;

pub const GREETING: &str = "<!-- hello --> <b> Hello, World!</b>";
pub const SAME_DIGIT: &str = "Both the given images belong to the same digit";
pub const DIFFERENT_DIGIT: &str = "The given images do not belong to the same digit";

/// Registers every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(sum).service(predict);
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(GREETING)
}

/// A JSON number that stays an integer while it can.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }
}

impl std::ops::Add for Num {
    type Output = Num;

    fn add(self, rhs: Num) -> Num {
        match (self, rhs) {
            (Num::Int(a), Num::Int(b)) => match a.checked_add(b) {
                Some(total) => Num::Int(total),
                None => Num::Float(a as f64 + b as f64),
            },
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SumRequest {
    pub x: Num,
    pub y: Num,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SumResponse {
    pub sum: Num,
}

#[post("/sum")]
async fn sum(body: web::Json<SumRequest>) -> impl Responder {
    let SumRequest { x, y } = body.into_inner();
    web::Json(SumResponse { sum: x + y })
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub image1: Vec<f64>,
    pub image2: Vec<f64>,
}

/// A prediction that couldn't be made.
#[derive(Debug)]
pub struct PredictErr(MlErr);

impl fmt::Display for PredictErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PredictErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<MlErr> for PredictErr {
    fn from(value: MlErr) -> Self {
        Self(value)
    }
}

impl ResponseError for PredictErr {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            MlErr::SizeMismatch { .. } | MlErr::Shape(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[post("/predict")]
async fn predict(
    state: web::Data<AppState>,
    body: web::Json<PredictRequest>,
) -> Result<HttpResponse, PredictErr> {
    let first = state.model.predict(ArrayView1::from(&body.image1))?;
    let second = state.model.predict(ArrayView1::from(&body.image2))?;
    debug!("predicted labels {first} and {second}");

    let answer = if first == second {
        SAME_DIGIT
    } else {
        DIFFERENT_DIGIT
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(answer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_add_as_integers() {
        assert_eq!(Num::Int(2) + Num::Int(3), Num::Int(5));
    }

    #[test]
    fn any_float_makes_a_float() {
        assert_eq!(Num::Int(2) + Num::Float(0.5), Num::Float(2.5));
        assert_eq!(Num::Float(1.5) + Num::Float(1.5), Num::Float(3.0));
    }

    #[test]
    fn overflow_falls_back_to_float() {
        assert_eq!(
            Num::Int(i64::MAX) + Num::Int(1),
            Num::Float(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn infinite_sums_serialize_as_null() {
        let response = SumResponse {
            sum: Num::Float(1e308) + Num::Float(1e308),
        };
        assert_eq!(response.sum, Num::Float(f64::INFINITY));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"sum":null}"#
        );
    }

    #[test]
    fn shape_errors_are_bad_requests() {
        let err = PredictErr::from(MlErr::SizeMismatch {
            a: "sample",
            b: "model",
            got: 3,
            expected: 64,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PredictErr::from(MlErr::EmptyDataset).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

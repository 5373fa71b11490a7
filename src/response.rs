use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

/// Uniform success envelope: `{statusCode, data, message, success}`.
pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "statusCode": 200,
        "data": data,
        "message": message,
        "success": true,
    }))
}

pub fn created<T: Serialize>(data: T, message: &str) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "statusCode": 201,
        "data": data,
        "message": message,
        "success": true,
    }))
}

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::shared::format::format_number;

/// Одна строка консольного журнала запросов
struct RequestLogLine<'a> {
    timestamp: DateTime<Utc>,
    duration: Duration,
    /// None, если тело ответа не удалось прочитать
    size: Option<usize>,
    status: StatusCode,
    method: &'a Method,
    path: &'a str,
}

impl RequestLogLine<'_> {
    fn render(&self) -> String {
        // голубой для 200, коричневый для остальных
        let color_code = if self.status == StatusCode::OK && self.size.is_some() {
            "36"
        } else {
            "33"
        };
        // время MSK, UTC+3
        let local = self.timestamp + chrono::Duration::hours(3);
        let size = self
            .size
            .map(format_number)
            .unwrap_or_else(|| "error".to_string());

        format!(
            "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
            color_code,
            local.format("%H:%M:%S"),
            self.duration.as_millis(),
            size,
            self.status.as_u16(),
            self.method.as_str(),
            self.path
        )
    }
}

/// Middleware для логирования HTTP запросов
///
/// Пишет в консоль время, длительность, размер ответа, статус, метод и путь.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = to_bytes(body, usize::MAX).await.ok();

    let line = RequestLogLine {
        timestamp: Utc::now(),
        duration: start.elapsed(),
        size: bytes.as_ref().map(|b| b.len()),
        status: parts.status,
        method: &method,
        path: uri.path(),
    };
    println!("{}", line.render());

    match bytes {
        Some(bytes) => Response::from_parts(parts, Body::from(bytes)),
        None => Response::from_parts(parts, Body::default()),
    }
}

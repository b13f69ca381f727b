//! HTTP handlers and routing
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/api/employee/login` | [`employee::login`] |
//! | POST | `/api/employee/register` | [`employee::register`] |
//! | GET | `/api/employee/{employee_id}` | [`employee::get_by_id`] (supervisors) |
//! | GET | `/health` | [`health`](crate::health::health) |
//! | GET | `/ready` | [`readiness`](crate::health::readiness) |

pub mod employee;
pub mod session;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{health, state::AppState};

pub use employee::{status_for, LoginForm};
pub use session::Session;

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/employee/login", post(employee::login))
        .route("/api/employee/register", post(employee::register))
        .route("/api/employee/{employee_id}", get(employee::get_by_id))
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .with_state(state)
}
